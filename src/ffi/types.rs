//! Core FFmpeg type definitions
//!
//! All FFmpeg structs are opaque (zero-sized) to avoid version-specific layout dependencies.
//! Field access is done via the thin C accessor library in accessors.c

use std::marker::PhantomData;
use std::os::raw::c_int;

// ============================================================================
// Rational Number
// ============================================================================

/// Rational number for time bases and frame rates
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AVRational {
    /// Numerator
    pub num: c_int,
    /// Denominator
    pub den: c_int,
}

impl AVRational {
    pub const fn new(num: c_int, den: c_int) -> Self {
        Self { num, den }
    }

    pub fn as_f64(&self) -> f64 {
        if self.den == 0 {
            0.0
        } else {
            self.num as f64 / self.den as f64
        }
    }

    /// Microsecond time base (1/1000000)
    pub const MICROSECONDS: Self = Self {
        num: 1,
        den: 1_000_000,
    };
}

// ============================================================================
// Codec IDs
// ============================================================================

/// Codec IDs recognized by the polyfill's codec-string grammar.
///
/// `H264`/`Hevc` are kept as *recognized-but-unsupported* identifiers: the codec
/// string grammar understands them, but no backend is wired up for them, so they
/// resolve to a `NotSupported` condition rather than a parse failure (`TypeError`).
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AVCodecID {
    None = 0,
    H264 = 27,
    Hevc = 173, // H.265
    Vp8 = 139,
    Vp9 = 167,
    Av1 = 226,
    Vorbis = 86021,
    Flac = 86028,
    Opus = 86076,
}

impl AVCodecID {
    /// Convert WebCodecs codec string to AVCodecID
    pub fn from_webcodecs_codec(codec: &str) -> Option<Self> {
        // H.264/AVC: avc1.PPCCLL or avc3.PPCCLL
        if codec.starts_with("avc1") || codec.starts_with("avc3") {
            return Some(Self::H264);
        }
        // H.265/HEVC: hev1.P.T.Lxxx or hvc1.P.T.Lxxx
        if codec.starts_with("hev1") || codec.starts_with("hvc1") {
            return Some(Self::Hevc);
        }
        // VP8
        if codec == "vp8" {
            return Some(Self::Vp8);
        }
        // VP9: vp09.PP.LL.DD or just "vp9"
        if codec.starts_with("vp09") || codec == "vp9" {
            return Some(Self::Vp9);
        }
        // AV1: av01.P.LLT.DD or just "av1"
        if codec.starts_with("av01") || codec == "av1" {
            return Some(Self::Av1);
        }
        if codec == "vorbis" {
            return Some(Self::Vorbis);
        }
        if codec == "flac" {
            return Some(Self::Flac);
        }
        if codec == "opus" {
            return Some(Self::Opus);
        }
        None
    }

    /// Get the default WebCodecs codec string for this codec
    pub fn to_webcodecs_codec(&self) -> &'static str {
        match self {
            Self::None => "",
            Self::H264 => "avc1.42001f", // Baseline profile, level 3.1
            Self::Hevc => "hev1.1.6.L93.B0", // Main profile
            Self::Vp8 => "vp8",
            Self::Vp9 => "vp09.00.10.08", // Profile 0, level 1.0, 8-bit
            Self::Av1 => "av01.0.01M.08", // Main profile, level 2.1, 8-bit
            Self::Vorbis => "vorbis",
            Self::Flac => "flac",
            Self::Opus => "opus",
        }
    }

    /// Whether this codec is recognized by the grammar but has no backend wired up
    /// in this polyfill (resolves to `NotSupported` rather than `TypeError`).
    pub fn is_recognized_unsupported(&self) -> bool {
        matches!(self, Self::H264 | Self::Hevc)
    }

    /// Get the raw FFmpeg codec ID value
    pub fn as_raw(&self) -> c_int {
        *self as c_int
    }
}

// ============================================================================
// Pixel Formats
// ============================================================================

/// Video pixel formats (subset supported by WebCodecs). Software formats only —
/// hardware surface formats are out of scope (no hardware acceleration negotiation).
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AVPixelFormat {
    None = -1,
    // Planar YUV formats, 8-bit
    Yuv420p = 0,   // I420
    Yuv422p = 4,   // I422
    Yuv444p = 5,   // I444
    Yuva420p = 33, // I420A (with alpha)
    Yuva422p = 57,
    Yuva444p = 66,
    // Semi-planar formats
    Nv12 = 23,
    Nv21 = 24,
    // RGB formats
    Rgb24 = 2,
    Bgr24 = 3,
    Argb = 25,
    Rgba = 26,
    Abgr = 27,
    Bgra = 28,
    // Planar YUV formats, 10-bit little-endian (2 bytes/sample, packed into low 10 bits)
    Yuv420p10le = 64,
    Yuv422p10le = 65,
    Yuv444p10le = 68,
    Yuva420p10le = 129,
    Yuva422p10le = 130,
    Yuva444p10le = 131,
    // Planar YUV formats, 12-bit little-endian
    Yuv420p12le = 161,
    Yuv422p12le = 176,
    Yuv444p12le = 178,
}

impl AVPixelFormat {
    /// Convert from WebCodecs VideoPixelFormat string
    pub fn from_webcodecs_format(format: &str) -> Option<Self> {
        match format {
            "I420" => Some(Self::Yuv420p),
            "I420A" => Some(Self::Yuva420p),
            "I420P10" => Some(Self::Yuv420p10le),
            "I420AP10" => Some(Self::Yuva420p10le),
            "I420P12" => Some(Self::Yuv420p12le),
            "I422" => Some(Self::Yuv422p),
            "I422A" => Some(Self::Yuva422p),
            "I422P10" => Some(Self::Yuv422p10le),
            "I422AP10" => Some(Self::Yuva422p10le),
            "I422P12" => Some(Self::Yuv422p12le),
            "I444" => Some(Self::Yuv444p),
            "I444A" => Some(Self::Yuva444p),
            "I444P10" => Some(Self::Yuv444p10le),
            "I444AP10" => Some(Self::Yuva444p10le),
            "I444P12" => Some(Self::Yuv444p12le),
            "NV12" => Some(Self::Nv12),
            "NV21" => Some(Self::Nv21),
            "RGBA" | "RGBX" => Some(Self::Rgba),
            "BGRA" | "BGRX" => Some(Self::Bgra),
            _ => None,
        }
    }

    /// Convert to WebCodecs VideoPixelFormat string
    pub fn to_webcodecs_format(&self) -> Option<&'static str> {
        match self {
            Self::Yuv420p => Some("I420"),
            Self::Yuva420p => Some("I420A"),
            Self::Yuv420p10le => Some("I420P10"),
            Self::Yuva420p10le => Some("I420AP10"),
            Self::Yuv420p12le => Some("I420P12"),
            Self::Yuv422p => Some("I422"),
            Self::Yuva422p => Some("I422A"),
            Self::Yuv422p10le => Some("I422P10"),
            Self::Yuva422p10le => Some("I422AP10"),
            Self::Yuv422p12le => Some("I422P12"),
            Self::Yuv444p => Some("I444"),
            Self::Yuva444p => Some("I444A"),
            Self::Yuv444p10le => Some("I444P10"),
            Self::Yuva444p10le => Some("I444AP10"),
            Self::Yuv444p12le => Some("I444P12"),
            Self::Nv12 => Some("NV12"),
            Self::Nv21 => Some("NV21"),
            Self::Rgba => Some("RGBA"),
            Self::Bgra => Some("BGRA"),
            _ => None,
        }
    }

    /// Get the raw FFmpeg pixel format value
    pub fn as_raw(&self) -> c_int {
        *self as c_int
    }

    /// Number of planes for this pixel format
    pub fn num_planes(&self) -> usize {
        match self {
            Self::Yuv420p
            | Self::Yuv422p
            | Self::Yuv444p
            | Self::Yuv420p10le
            | Self::Yuv422p10le
            | Self::Yuv444p10le
            | Self::Yuv420p12le
            | Self::Yuv422p12le
            | Self::Yuv444p12le => 3,
            Self::Yuva420p
            | Self::Yuva422p
            | Self::Yuva444p
            | Self::Yuva420p10le
            | Self::Yuva422p10le
            | Self::Yuva444p10le => 4,
            Self::Nv12 | Self::Nv21 => 2,
            Self::Rgb24 | Self::Bgr24 | Self::Rgba | Self::Bgra | Self::Argb | Self::Abgr => 1,
            _ => 0,
        }
    }

    /// Bytes per sample for a single plane element (1 for 8-bit YUV/NV, 2 for
    /// 10/12-bit YUV, 4 for packed RGB formats).
    pub fn bytes_per_sample(&self) -> usize {
        match self {
            Self::Yuv420p10le
            | Self::Yuv422p10le
            | Self::Yuv444p10le
            | Self::Yuva420p10le
            | Self::Yuva422p10le
            | Self::Yuva444p10le
            | Self::Yuv420p12le
            | Self::Yuv422p12le
            | Self::Yuv444p12le => 2,
            Self::Rgba | Self::Bgra | Self::Argb | Self::Abgr => 4,
            Self::Rgb24 | Self::Bgr24 => 3,
            _ => 1,
        }
    }
}

// ============================================================================
// Sample Formats
// ============================================================================

/// Audio sample formats understood by the backend. Mirrors libavutil's
/// `AVSampleFormat` ordering; `S64`/`S64P`/`Dbl`/`Dblp` are retained for
/// completeness of the backend mapping but have no WebCodecs counterpart.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AVSampleFormat {
    None = -1,
    U8 = 0,
    S16 = 1,
    S32 = 2,
    Flt = 3,
    Dbl = 4,
    U8p = 5,
    S16p = 6,
    S32p = 7,
    Fltp = 8,
    Dblp = 9,
    S64 = 10,
    S64p = 11,
}

impl AVSampleFormat {
    /// Convert from a WebCodecs AudioSampleFormat string
    pub fn from_webcodecs_format(format: &str) -> Option<Self> {
        match format {
            "u8" => Some(Self::U8),
            "s16" => Some(Self::S16),
            "s32" => Some(Self::S32),
            "f32" => Some(Self::Flt),
            "u8-planar" => Some(Self::U8p),
            "s16-planar" => Some(Self::S16p),
            "s32-planar" => Some(Self::S32p),
            "f32-planar" => Some(Self::Fltp),
            _ => None,
        }
    }

    /// Convert to a WebCodecs AudioSampleFormat string
    pub fn to_webcodecs_format(&self) -> Option<&'static str> {
        match self {
            Self::U8 => Some("u8"),
            Self::S16 => Some("s16"),
            Self::S32 => Some("s32"),
            Self::Flt => Some("f32"),
            Self::U8p => Some("u8-planar"),
            Self::S16p => Some("s16-planar"),
            Self::S32p => Some("s32-planar"),
            Self::Fltp => Some("f32-planar"),
            _ => None,
        }
    }

    /// Whether this format stores channels in separate planes
    pub fn is_planar(&self) -> bool {
        matches!(
            self,
            Self::U8p | Self::S16p | Self::S32p | Self::Fltp | Self::Dblp | Self::S64p
        )
    }

    /// The interleaved counterpart of a planar format (identity if already interleaved)
    pub fn to_interleaved(&self) -> Self {
        match self {
            Self::U8p => Self::U8,
            Self::S16p => Self::S16,
            Self::S32p => Self::S32,
            Self::Fltp => Self::Flt,
            Self::Dblp => Self::Dbl,
            Self::S64p => Self::S64,
            other => *other,
        }
    }

    /// Bytes per sample (per channel, per element)
    pub fn bytes_per_sample(&self) -> usize {
        match self {
            Self::U8 | Self::U8p => 1,
            Self::S16 | Self::S16p => 2,
            Self::S32 | Self::S32p | Self::Flt | Self::Fltp => 4,
            Self::Dbl | Self::Dblp | Self::S64 | Self::S64p => 8,
            Self::None => 0,
        }
    }

    /// Get the raw FFmpeg sample format value
    pub fn as_raw(&self) -> c_int {
        *self as c_int
    }

    /// Map a raw FFmpeg `AVSampleFormat` integer back to the typed enum
    pub fn from_raw(fmt: c_int) -> Self {
        match fmt {
            0 => Self::U8,
            1 => Self::S16,
            2 => Self::S32,
            3 => Self::Flt,
            4 => Self::Dbl,
            5 => Self::U8p,
            6 => Self::S16p,
            7 => Self::S32p,
            8 => Self::Fltp,
            9 => Self::Dblp,
            10 => Self::S64,
            11 => Self::S64p,
            _ => Self::None,
        }
    }
}

// ============================================================================
// Color Space
// ============================================================================

/// Color space (matrix coefficients)
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum AVColorSpace {
    Rgb = 0,
    Bt709 = 1,
    #[default]
    Unspecified = 2,
    Fcc = 4,
    Bt470bg = 5,
    Smpte170m = 6,
    Smpte240m = 7,
    Ycgco = 8,
    Bt2020Ncl = 9,
    Bt2020Cl = 10,
}

/// Color primaries
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum AVColorPrimaries {
    Bt709 = 1,
    #[default]
    Unspecified = 2,
    Bt470m = 4,
    Bt470bg = 5,
    Smpte170m = 6,
    Smpte240m = 7,
    Film = 8,
    Bt2020 = 9,
    Smpte428 = 10,
    Smpte431 = 11,
    Smpte432 = 12,
    JedecP22 = 22,
}

/// Color transfer characteristics
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum AVColorTransferCharacteristic {
    Bt709 = 1,
    #[default]
    Unspecified = 2,
    Gamma22 = 4,
    Gamma28 = 5,
    Smpte170m = 6,
    Smpte240m = 7,
    Linear = 8,
    Log = 9,
    LogSqrt = 10,
    Iec61966_2_4 = 11,
    Bt1361Ecg = 12,
    Iec61966_2_1 = 13, // sRGB
    Bt2020_10 = 14,
    Bt2020_12 = 15,
    Smpte2084 = 16, // PQ/HDR10
    Smpte428 = 17,
    AribStdB67 = 18, // HLG
}

/// Color range
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum AVColorRange {
    #[default]
    Unspecified = 0,
    Mpeg = 1, // Limited range (16-235 for Y, 16-240 for UV)
    Jpeg = 2, // Full range (0-255)
}

// ============================================================================
// Picture Type
// ============================================================================

/// Picture/frame type
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AVPictureType {
    None = 0,
    I = 1, // Intra (key frame)
    P = 2, // Predicted
    B = 3, // Bi-directionally predicted
    S = 4, // S(GMC)-VOP MPEG-4
    Si = 5,
    Sp = 6,
    Bi = 7,
}

// ============================================================================
// Opaque FFmpeg Types
// ============================================================================

/// Opaque AVCodec structure (codec implementation descriptor)
#[repr(C)]
pub struct AVCodec {
    _opaque: [u8; 0],
    _marker: PhantomData<(*mut u8, std::marker::PhantomPinned)>,
}

/// Opaque AVCodecContext structure (encoder/decoder instance)
#[repr(C)]
pub struct AVCodecContext {
    _opaque: [u8; 0],
    _marker: PhantomData<(*mut u8, std::marker::PhantomPinned)>,
}

/// Opaque AVFrame structure (uncompressed video/audio data)
#[repr(C)]
pub struct AVFrame {
    _opaque: [u8; 0],
    _marker: PhantomData<(*mut u8, std::marker::PhantomPinned)>,
}

/// Opaque AVPacket structure (compressed data)
#[repr(C)]
pub struct AVPacket {
    _opaque: [u8; 0],
    _marker: PhantomData<(*mut u8, std::marker::PhantomPinned)>,
}

/// Opaque AVBufferRef structure (reference-counted buffer)
#[repr(C)]
pub struct AVBufferRef {
    _opaque: [u8; 0],
    _marker: PhantomData<(*mut u8, std::marker::PhantomPinned)>,
}

/// Opaque SwsContext structure (software scaler context)
#[repr(C)]
pub struct SwsContext {
    _opaque: [u8; 0],
    _marker: PhantomData<(*mut u8, std::marker::PhantomPinned)>,
}

/// Opaque AVDictionary structure (key-value options)
#[repr(C)]
pub struct AVDictionary {
    _opaque: [u8; 0],
    _marker: PhantomData<(*mut u8, std::marker::PhantomPinned)>,
}

// ============================================================================
// Constants
// ============================================================================

/// No timestamp value
pub const AV_NOPTS_VALUE: i64 = 0x8000000000000000u64 as i64;

/// Packet flags
pub mod pkt_flag {
    use std::os::raw::c_int;

    pub const KEY: c_int = 0x0001;
    pub const CORRUPT: c_int = 0x0002;
    pub const DISCARD: c_int = 0x0004;
    pub const TRUSTED: c_int = 0x0008;
    pub const DISPOSABLE: c_int = 0x0010;
}

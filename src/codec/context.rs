//! Safe wrapper around FFmpeg AVCodecContext
//!
//! Provides encoding and decoding functionality with RAII cleanup.

use crate::ffi::{
    self,
    accessors::{
        ffctx_get_extradata, ffctx_get_extradata_size, ffctx_get_frame_size, ffctx_get_height,
        ffctx_get_pix_fmt, ffctx_get_width, ffctx_set_bit_rate, ffctx_set_channel_layout,
        ffctx_set_channels,
        ffctx_set_extradata, ffctx_set_framerate, ffctx_set_gop_size, ffctx_set_height,
        ffctx_set_level, ffctx_set_max_b_frames, ffctx_set_pix_fmt, ffctx_set_profile,
        ffctx_set_rc_buffer_size, ffctx_set_rc_max_rate, ffctx_set_sample_fmt,
        ffctx_set_sample_rate, ffctx_set_thread_count, ffctx_set_time_base, ffctx_set_width,
    },
    avcodec::{
        avcodec_alloc_context3, avcodec_find_decoder, avcodec_find_encoder,
        avcodec_find_encoder_by_name, avcodec_flush_buffers, avcodec_free_context, avcodec_open2,
        avcodec_receive_frame, avcodec_receive_packet, avcodec_send_frame, avcodec_send_packet,
    },
    error::{AVERROR_EAGAIN, AVERROR_EOF},
    AVCodec, AVCodecContext, AVCodecID, AVPixelFormat, AVSampleFormat,
};
use std::ffi::CString;
use std::ptr::NonNull;

use super::{BitrateMode, CodecError, CodecResult, DecoderConfig, EncoderConfig, Frame, Packet};

/// Type of codec (encoder or decoder)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodecType {
    Encoder,
    Decoder,
}

/// Safe wrapper around AVCodecContext
pub struct CodecContext {
    ptr: NonNull<AVCodecContext>,
    codec: *const AVCodec,
    codec_type: CodecType,
}

impl CodecContext {
    // ========================================================================
    // Encoder Creation
    // ========================================================================

    /// Create a new encoder context for the given codec ID
    pub fn new_encoder(codec_id: AVCodecID) -> CodecResult<Self> {
        let codec = unsafe { avcodec_find_encoder(codec_id.as_raw()) };
        if codec.is_null() {
            return Err(CodecError::EncoderNotFound(codec_id));
        }
        Self::from_codec(codec, CodecType::Encoder)
    }

    /// Create a new encoder context by codec name (e.g., "libx264", "h264_videotoolbox")
    pub fn new_encoder_by_name(name: &str) -> CodecResult<Self> {
        let c_name =
            CString::new(name).map_err(|_| CodecError::InvalidConfig("Invalid codec name".into()))?;
        let codec = unsafe { avcodec_find_encoder_by_name(c_name.as_ptr()) };
        if codec.is_null() {
            return Err(CodecError::CodecNotFound(name.to_string()));
        }
        Self::from_codec(codec, CodecType::Encoder)
    }

    /// Create an encoder context by its backend codec name (the common path: the
    /// codec-string table in §6 always resolves to a specific backend name, e.g.
    /// `libopus`/`libvpx-vp9`/`libaom-av1`, never a bare codec ID lookup).
    pub fn new_encoder_for_backend(name: &str, codec_id: AVCodecID) -> CodecResult<Self> {
        if let Ok(ctx) = Self::new_encoder_by_name(name) {
            return Ok(ctx);
        }
        Self::new_encoder(codec_id)
    }

    // ========================================================================
    // Decoder Creation
    // ========================================================================

    /// Create a new decoder context for the given codec ID
    pub fn new_decoder(codec_id: AVCodecID) -> CodecResult<Self> {
        let codec = unsafe { avcodec_find_decoder(codec_id.as_raw()) };
        if codec.is_null() {
            return Err(CodecError::DecoderNotFound(codec_id));
        }
        Self::from_codec(codec, CodecType::Decoder)
    }

    fn from_codec(codec: *const AVCodec, codec_type: CodecType) -> CodecResult<Self> {
        let ptr = unsafe { avcodec_alloc_context3(codec) };
        NonNull::new(ptr)
            .map(|ptr| Self {
                ptr,
                codec,
                codec_type,
            })
            .ok_or(CodecError::AllocationFailed("AVCodecContext"))
    }

    // ========================================================================
    // Configuration
    // ========================================================================

    /// Configure the encoder with the given settings
    pub fn configure_encoder(&mut self, config: &EncoderConfig) -> CodecResult<()> {
        if self.codec_type != CodecType::Encoder {
            return Err(CodecError::InvalidState("Not an encoder context".into()));
        }

        unsafe {
            let ctx = self.ptr.as_ptr();

            // Video dimensions
            ffctx_set_width(ctx, config.width as i32);
            ffctx_set_height(ctx, config.height as i32);

            // Pixel format
            ffctx_set_pix_fmt(ctx, config.pixel_format.as_raw());

            // Bitrate / rate control
            ffctx_set_bit_rate(ctx, config.bitrate as i64);
            if config.bitrate_mode == BitrateMode::Constant && config.rc_max_rate > 0 {
                ffctx_set_rc_max_rate(ctx, config.rc_max_rate as i64);
            }
            if config.rc_buffer_size > 0 {
                ffctx_set_rc_buffer_size(ctx, config.rc_buffer_size as i32);
            }

            // Time base (inverse of framerate for encoding)
            ffctx_set_time_base(ctx, config.framerate_den as i32, config.framerate_num as i32);

            // Framerate
            ffctx_set_framerate(ctx, config.framerate_num as i32, config.framerate_den as i32);

            // GOP settings
            ffctx_set_gop_size(ctx, config.gop_size as i32);
            ffctx_set_max_b_frames(ctx, config.max_b_frames as i32);

            // Threading
            if config.thread_count > 0 {
                ffctx_set_thread_count(ctx, config.thread_count as i32);
            }

            // Profile and level
            if let Some(profile) = config.profile {
                ffctx_set_profile(ctx, profile);
            }
            if let Some(level) = config.level {
                ffctx_set_level(ctx, level);
            }

            // Quantizer-mode constant-quality factor is codec-private (e.g. libx264's
            // "crf" AVOption); no generic AVCodecContext field covers it, so it is left
            // for the backend adapter to apply via a per-codec option string.
            let _ = config.crf;
        }

        Ok(())
    }

    /// Configure the decoder with the given settings
    pub fn configure_decoder(&mut self, config: &DecoderConfig) -> CodecResult<()> {
        if self.codec_type != CodecType::Decoder {
            return Err(CodecError::InvalidState("Not a decoder context".into()));
        }

        unsafe {
            let ctx = self.ptr.as_ptr();

            // Threading (use frame threading for decoders)
            ffctx_set_thread_count(ctx, config.thread_count as i32);

            if let Some(sample_rate) = config.sample_rate {
                ffctx_set_sample_rate(ctx, sample_rate as i32);
            }
            if let Some(channels) = config.channels {
                ffctx_set_channels(ctx, channels as i32);
                ffctx_set_channel_layout(ctx, default_channel_layout(channels));
            }

            if let Some(extradata) = &config.extradata {
                ffctx_set_extradata(ctx, extradata.as_ptr(), extradata.len() as i32);
            }
        }

        Ok(())
    }

    /// Configure audio-specific encoder fields not covered by `EncoderConfig`
    /// (which is geometry-shaped for video). Audio encoders call this directly
    /// after allocation instead of `configure_encoder`.
    pub fn configure_audio_encoder(
        &mut self,
        sample_rate: u32,
        channels: u32,
        sample_fmt: AVSampleFormat,
        bitrate: u64,
    ) -> CodecResult<()> {
        if self.codec_type != CodecType::Encoder {
            return Err(CodecError::InvalidState("Not an encoder context".into()));
        }
        unsafe {
            let ctx = self.ptr.as_ptr();
            ffctx_set_sample_rate(ctx, sample_rate as i32);
            ffctx_set_channels(ctx, channels as i32);
            ffctx_set_channel_layout(ctx, default_channel_layout(channels));
            ffctx_set_sample_fmt(ctx, sample_fmt.as_raw());
            ffctx_set_bit_rate(ctx, bitrate as i64);
            ffctx_set_time_base(ctx, 1, sample_rate as i32);
        }
        Ok(())
    }

    /// Open the codec (must be called after configuration)
    pub fn open(&mut self) -> CodecResult<()> {
        let ret = unsafe { avcodec_open2(self.ptr.as_ptr(), self.codec, std::ptr::null_mut()) };
        ffi::check_error(ret)?;
        Ok(())
    }

    // ========================================================================
    // Encoding
    // ========================================================================

    /// Send a frame to the encoder
    ///
    /// Returns Ok(true) if frame was accepted, Ok(false) if encoder needs output drained first
    pub fn send_frame(&mut self, frame: Option<&Frame>) -> CodecResult<bool> {
        let frame_ptr = frame.map(|f| f.as_ptr()).unwrap_or(std::ptr::null());
        let ret = unsafe { avcodec_send_frame(self.ptr.as_ptr(), frame_ptr) };

        if ret == AVERROR_EAGAIN {
            return Ok(false);
        }
        ffi::check_error(ret)?;
        Ok(true)
    }

    /// Receive an encoded packet from the encoder
    ///
    /// Returns Ok(Some(packet)) if a packet is available, Ok(None) if more input needed
    pub fn receive_packet(&mut self) -> CodecResult<Option<Packet>> {
        let mut pkt = Packet::new()?;
        let ret = unsafe { avcodec_receive_packet(self.ptr.as_ptr(), pkt.as_mut_ptr()) };

        if ret == AVERROR_EAGAIN || ret == AVERROR_EOF {
            return Ok(None);
        }
        ffi::check_error(ret)?;
        Ok(Some(pkt))
    }

    /// Encode a frame and return all available packets
    pub fn encode(&mut self, frame: Option<&Frame>) -> CodecResult<Vec<Packet>> {
        let mut packets = Vec::new();

        // Send frame
        if !self.send_frame(frame)? {
            // Encoder is full, drain first
            while let Some(pkt) = self.receive_packet()? {
                packets.push(pkt);
            }
            // Retry sending frame
            self.send_frame(frame)?;
        }

        // Receive all available packets
        while let Some(pkt) = self.receive_packet()? {
            packets.push(pkt);
        }

        Ok(packets)
    }

    /// Flush the encoder (call with None frame, then drain all packets)
    pub fn flush_encoder(&mut self) -> CodecResult<Vec<Packet>> {
        self.encode(None)
    }

    // ========================================================================
    // Decoding
    // ========================================================================

    /// Send a packet to the decoder
    ///
    /// Returns Ok(true) if packet was accepted, Ok(false) if decoder needs output drained first
    pub fn send_packet(&mut self, packet: Option<&Packet>) -> CodecResult<bool> {
        let pkt_ptr = packet.map(|p| p.as_ptr()).unwrap_or(std::ptr::null());
        let ret = unsafe { avcodec_send_packet(self.ptr.as_ptr(), pkt_ptr) };

        if ret == AVERROR_EAGAIN {
            return Ok(false);
        }
        ffi::check_error(ret)?;
        Ok(true)
    }

    /// Receive a decoded frame from the decoder
    ///
    /// Returns Ok(Some(frame)) if a frame is available, Ok(None) if more input needed
    pub fn receive_frame(&mut self) -> CodecResult<Option<Frame>> {
        let mut frame = Frame::new()?;
        let ret = unsafe { avcodec_receive_frame(self.ptr.as_ptr(), frame.as_mut_ptr()) };

        if ret == AVERROR_EAGAIN || ret == AVERROR_EOF {
            return Ok(None);
        }
        ffi::check_error(ret)?;
        Ok(Some(frame))
    }

    /// Decode a packet and return all available frames
    pub fn decode(&mut self, packet: Option<&Packet>) -> CodecResult<Vec<Frame>> {
        let mut frames = Vec::new();

        // Send packet
        if !self.send_packet(packet)? {
            // Decoder is full, drain first
            while let Some(frame) = self.receive_frame()? {
                frames.push(frame);
            }
            // Retry sending packet
            self.send_packet(packet)?;
        }

        // Receive all available frames
        while let Some(frame) = self.receive_frame()? {
            frames.push(frame);
        }

        Ok(frames)
    }

    /// Flush the decoder
    pub fn flush_decoder(&mut self) -> CodecResult<Vec<Frame>> {
        self.decode(None)
    }

    // ========================================================================
    // Utility
    // ========================================================================

    /// Flush internal codec buffers
    pub fn flush(&mut self) {
        unsafe { avcodec_flush_buffers(self.ptr.as_ptr()) }
    }

    /// Get raw pointer (for FFmpeg API calls)
    #[inline]
    pub fn as_ptr(&self) -> *const AVCodecContext {
        self.ptr.as_ptr()
    }

    /// Get mutable raw pointer
    #[inline]
    pub fn as_mut_ptr(&mut self) -> *mut AVCodecContext {
        self.ptr.as_ptr()
    }

    /// Get codec type
    #[inline]
    pub fn codec_type(&self) -> CodecType {
        self.codec_type
    }

    /// Get configured width
    pub fn width(&self) -> u32 {
        unsafe { ffctx_get_width(self.as_ptr()) as u32 }
    }

    /// Get configured height
    pub fn height(&self) -> u32 {
        unsafe { ffctx_get_height(self.as_ptr()) as u32 }
    }

    /// Get configured pixel format
    pub fn pixel_format(&self) -> AVPixelFormat {
        let fmt = unsafe { ffctx_get_pix_fmt(self.as_ptr()) };
        raw_to_pixel_format(fmt)
    }

    /// Get the encoder's required samples-per-channel per frame (audio encoders only;
    /// 0 if the codec accepts variable-length frames)
    pub fn frame_size(&self) -> u32 {
        unsafe { ffctx_get_frame_size(self.as_ptr()) as u32 }
    }

    /// Get codec extradata (e.g., SPS/PPS for H.264)
    pub fn extradata(&self) -> Option<&[u8]> {
        unsafe {
            let ptr = ffctx_get_extradata(self.as_ptr());
            let size = ffctx_get_extradata_size(self.as_ptr());
            if ptr.is_null() || size <= 0 {
                None
            } else {
                Some(std::slice::from_raw_parts(ptr, size as usize))
            }
        }
    }
}

impl Drop for CodecContext {
    fn drop(&mut self) {
        unsafe {
            let mut ptr = self.ptr.as_ptr();
            avcodec_free_context(&mut ptr);
        }
    }
}

// CodecContext is NOT Sync - FFmpeg contexts are not thread-safe
unsafe impl Send for CodecContext {}

impl std::fmt::Debug for CodecContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CodecContext")
            .field("type", &self.codec_type)
            .field("width", &self.width())
            .field("height", &self.height())
            .field("pixel_format", &self.pixel_format())
            .finish()
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Get the software backend encoder name for a codec identifier, per the
/// codec-string-to-backend table.
pub fn get_sw_encoder_name(codec_id: AVCodecID) -> Option<&'static str> {
    match codec_id {
        AVCodecID::Vp8 => Some("libvpx"),
        AVCodecID::Vp9 => Some("libvpx-vp9"),
        AVCodecID::Av1 => Some("libaom-av1"),
        AVCodecID::Opus => Some("libopus"),
        AVCodecID::Vorbis => Some("libvorbis"),
        AVCodecID::Flac => Some("flac"),
        _ => None,
    }
}

/// Get the software backend encoder name for an audio codec identifier.
/// Returns `None` when the built-in `avcodec_find_encoder` lookup by ID
/// already resolves to the right backend.
pub fn get_audio_encoder_name(codec_id: AVCodecID) -> Option<&'static str> {
    match codec_id {
        AVCodecID::Opus => Some("libopus"),
        AVCodecID::Vorbis => Some("libvorbis"),
        AVCodecID::Flac => Some("flac"),
        _ => None,
    }
}

/// Map a raw `AVPixelFormat` integer (as reported by the backend) back to the
/// typed enum. Unknown values map to `None`.
pub fn raw_to_pixel_format(fmt: i32) -> AVPixelFormat {
    match fmt {
        0 => AVPixelFormat::Yuv420p,
        4 => AVPixelFormat::Yuv422p,
        5 => AVPixelFormat::Yuv444p,
        33 => AVPixelFormat::Yuva420p,
        57 => AVPixelFormat::Yuva422p,
        66 => AVPixelFormat::Yuva444p,
        23 => AVPixelFormat::Nv12,
        24 => AVPixelFormat::Nv21,
        2 => AVPixelFormat::Rgb24,
        3 => AVPixelFormat::Bgr24,
        25 => AVPixelFormat::Argb,
        26 => AVPixelFormat::Rgba,
        27 => AVPixelFormat::Abgr,
        28 => AVPixelFormat::Bgra,
        64 => AVPixelFormat::Yuv420p10le,
        65 => AVPixelFormat::Yuv422p10le,
        68 => AVPixelFormat::Yuv444p10le,
        129 => AVPixelFormat::Yuva420p10le,
        130 => AVPixelFormat::Yuva422p10le,
        131 => AVPixelFormat::Yuva444p10le,
        161 => AVPixelFormat::Yuv420p12le,
        176 => AVPixelFormat::Yuv422p12le,
        178 => AVPixelFormat::Yuv444p12le,
        _ => AVPixelFormat::None,
    }
}

/// Default FFmpeg channel-layout bitmask for a channel count (mono/stereo are
/// the only layouts this polyfill's config surface distinguishes by count;
/// anything else falls back to the first N "native" positions).
pub fn default_channel_layout(channels: u32) -> u64 {
    match channels {
        1 => 0x4,          // AV_CH_LAYOUT_MONO (front center)
        2 => 0x3,          // AV_CH_LAYOUT_STEREO (front left | front right)
        n => (1u64 << n) - 1,
    }
}

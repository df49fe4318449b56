//! VideoEncoder - WebCodecs API implementation
//!
//! Provides video encoding functionality using FFmpeg.
//! See: https://developer.mozilla.org/en-US/docs/Web/API/VideoEncoder

use crate::codec::context::get_sw_encoder_name;
use crate::codec::{BitrateMode, CodecContext, ControlQueue, EncoderConfig, Scaler};
use crate::ffi::{AVCodecID, AVPixelFormat};
use crate::webcodecs::error::invalid_state_error;
use crate::webcodecs::{EncodedVideoChunk, VideoEncoderConfig, VideoFrame};
use napi::bindgen_prelude::*;
use napi::threadsafe_function::{ThreadsafeFunction, ThreadsafeFunctionCallMode};
use napi_derive::napi;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tracing::Instrument;

/// Encoder state
#[napi(string_enum)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CodecState {
    /// Encoder not configured
    #[default]
    Unconfigured,
    /// Encoder configured and ready
    Configured,
    /// Encoder closed
    Closed,
}

/// Output callback metadata
#[napi(object)]
pub struct EncodedVideoChunkMetadata {
    /// Decoder configuration for this chunk (only present for keyframes)
    pub decoder_config: Option<VideoDecoderConfigOutput>,
}

/// Decoder configuration output (for passing to decoder)
#[napi(object)]
pub struct VideoDecoderConfigOutput {
    /// Codec string
    pub codec: String,
    /// Coded width
    pub coded_width: Option<u32>,
    /// Coded height
    pub coded_height: Option<u32>,
    /// Codec description (e.g., avcC for H.264)
    pub description: Option<Buffer>,
}

/// Encode options
#[napi(object)]
#[derive(Debug, Clone, Default)]
pub struct VideoEncoderEncodeOptions {
    /// Force this frame to be a keyframe
    pub key_frame: Option<bool>,
}

/// Result of isConfigSupported
#[napi(object)]
#[derive(Debug, Clone)]
pub struct VideoEncoderSupport {
    /// Whether the configuration is supported
    pub supported: bool,
    /// The configuration that was checked
    pub config: VideoEncoderConfig,
}

/// Type alias for output callback (takes chunk and metadata)
type OutputCallback = ThreadsafeFunction<(EncodedVideoChunk, EncodedVideoChunkMetadata)>;

/// Type alias for error callback (takes error message)
type ErrorCallback = ThreadsafeFunction<String>;

/// Type alias for dequeue callback (fires once per completed encode step)
type DequeueCallback = ThreadsafeFunction<()>;

static NEXT_ENCODER_ID: AtomicU64 = AtomicU64::new(0);

/// Does this codec carry its bitstream as length-prefixed AVCC/HVCC NALUs
/// (as consumed by MP4 muxers) rather than raw Annex B?
fn uses_avcc(codec_id: AVCodecID) -> bool {
    matches!(codec_id, AVCodecID::H264 | AVCodecID::Hevc)
}

/// Internal encoder state
struct VideoEncoderInner {
    id: u64,
    state: CodecState,
    config: Option<VideoEncoderConfig>,
    context: Option<CodecContext>,
    codec_id: Option<AVCodecID>,
    scaler: Option<Scaler>,
    /// (width, height, format) the current `scaler` was built for; rebuilt
    /// whenever an incoming frame's geometry drifts from this.
    scaler_source: Option<(u32, u32, AVPixelFormat)>,
    frame_count: u64,
    extradata_sent: bool,
    /// Queued output chunks (for synchronous retrieval)
    output_queue: Vec<(EncodedVideoChunk, EncodedVideoChunkMetadata)>,
    /// Optional output callback (WebCodecs spec compliant mode)
    output_callback: Option<OutputCallback>,
    /// Optional error callback (WebCodecs spec compliant mode)
    error_callback: Option<ErrorCallback>,
    /// Optional dequeue callback, fired once per completed encode step
    dequeue_callback: Option<DequeueCallback>,
}

/// VideoEncoder - WebCodecs-compliant video encoder
///
/// Encodes VideoFrame objects into EncodedVideoChunk objects using FFmpeg.
/// `encode()`/`flush()` validate state synchronously, then enqueue their
/// backend work onto a per-instance `ControlQueue` (§4.D).
#[napi]
pub struct VideoEncoder {
    inner: Arc<Mutex<VideoEncoderInner>>,
    queue: ControlQueue,
    /// encodeQueueSize: incremented synchronously in `encode()`, decremented
    /// once that step's work has finished.
    encode_queue_size: Arc<AtomicU32>,
}

#[napi]
impl VideoEncoder {
    /// Create a new VideoEncoder (queue-based mode)
    #[napi(constructor)]
    pub fn new() -> Result<Self> {
        let inner = VideoEncoderInner {
            id: NEXT_ENCODER_ID.fetch_add(1, Ordering::Relaxed),
            state: CodecState::Unconfigured,
            config: None,
            context: None,
            codec_id: None,
            scaler: None,
            scaler_source: None,
            frame_count: 0,
            extradata_sent: false,
            output_queue: Vec::new(),
            output_callback: None,
            error_callback: None,
            dequeue_callback: None,
        };

        Ok(Self {
            inner: Arc::new(Mutex::new(inner)),
            queue: ControlQueue::spawn(),
            encode_queue_size: Arc::new(AtomicU32::new(0)),
        })
    }

    /// Create a VideoEncoder with callbacks (WebCodecs spec compliant mode)
    ///
    /// In this mode, encoded chunks are delivered via the output callback
    /// instead of being queued for retrieval. Errors are reported via the
    /// error callback and the encoder transitions to the Closed state.
    ///
    /// Example:
    /// ```javascript
    /// const encoder = VideoEncoder.withCallbacks(
    ///   (chunk, metadata) => { /* handle output */ },
    ///   (error) => { /* handle error */ }
    /// );
    /// ```
    #[napi(factory)]
    pub fn with_callbacks(
        output: ThreadsafeFunction<(EncodedVideoChunk, EncodedVideoChunkMetadata)>,
        error: ThreadsafeFunction<String>,
    ) -> Result<Self> {
        let inner = VideoEncoderInner {
            id: NEXT_ENCODER_ID.fetch_add(1, Ordering::Relaxed),
            state: CodecState::Unconfigured,
            config: None,
            context: None,
            codec_id: None,
            scaler: None,
            scaler_source: None,
            frame_count: 0,
            extradata_sent: false,
            output_queue: Vec::new(),
            output_callback: Some(output),
            error_callback: Some(error),
            dequeue_callback: None,
        };

        Ok(Self {
            inner: Arc::new(Mutex::new(inner)),
            queue: ControlQueue::spawn(),
            encode_queue_size: Arc::new(AtomicU32::new(0)),
        })
    }

    /// Register a callback fired once per completed encode step, mirroring
    /// the `ondequeue` event on the real `VideoEncoder.encodeQueueSize`.
    #[napi]
    pub fn set_ondequeue(&self, callback: ThreadsafeFunction<()>) -> Result<()> {
        let mut inner = self.inner.lock().map_err(|_| {
            Error::new(Status::GenericFailure, "Lock poisoned")
        })?;
        inner.dequeue_callback = Some(callback);
        Ok(())
    }

    /// Report a genuine backend failure via the error callback (if in
    /// callback mode) and close the encoder. Must never be used for a
    /// wrong-state call.
    fn report_error(inner: &mut VideoEncoderInner, error_msg: &str) -> bool {
        if let Some(ref callback) = inner.error_callback {
            callback.call(Ok(error_msg.to_string()), ThreadsafeFunctionCallMode::NonBlocking);
            inner.state = CodecState::Closed;
            true
        } else {
            false
        }
    }

    /// Get encoder state
    #[napi(getter)]
    pub fn state(&self) -> Result<CodecState> {
        let inner = self.inner.lock().map_err(|_| {
            Error::new(Status::GenericFailure, "Lock poisoned")
        })?;
        Ok(inner.state)
    }

    /// Number of encode() calls submitted but not yet finished processing.
    #[napi(getter)]
    pub fn encode_queue_size(&self) -> Result<u32> {
        Ok(self.encode_queue_size.load(Ordering::SeqCst))
    }

    /// Configure the encoder
    #[napi]
    pub fn configure(&self, config: VideoEncoderConfig) -> Result<()> {
        let mut inner = self.inner.lock().map_err(|_| {
            Error::new(Status::GenericFailure, "Lock poisoned")
        })?;

        if inner.state == CodecState::Closed {
            return Err(invalid_state_error("VideoEncoder is closed"));
        }

        // codec/width/height are required per W3C VideoEncoderConfig
        let codec_str = config
            .codec
            .clone()
            .ok_or_else(|| Error::new(Status::InvalidArg, "TypeError: codec is required"))?;
        let width = config
            .width
            .ok_or_else(|| Error::new(Status::InvalidArg, "TypeError: width is required"))?;
        let height = config
            .height
            .ok_or_else(|| Error::new(Status::InvalidArg, "TypeError: height is required"))?;

        let codec_id = parse_codec_string(&codec_str)?;

        tracing::debug!(id = inner.id, codec = %codec_str, width, height, "video_encoder.configure");

        // Create encoder context, preferring the backend name the codec
        // string table resolves to (e.g. libvpx-vp9, libaom-av1) over a bare
        // codec-ID lookup.
        let mut context = match get_sw_encoder_name(codec_id) {
            Some(name) => CodecContext::new_encoder_for_backend(name, codec_id),
            None => CodecContext::new_encoder(codec_id),
        }
        .map_err(|e| {
            Error::new(Status::GenericFailure, format!("Failed to create encoder: {}", e))
        })?;

        use super::encoded_video_chunk::{LatencyMode, VideoEncoderBitrateMode};

        let bitrate_mode = match config.bitrate_mode {
            Some(VideoEncoderBitrateMode::Constant) => BitrateMode::Constant,
            Some(VideoEncoderBitrateMode::Quantizer) => BitrateMode::Quantizer,
            _ => BitrateMode::Variable,
        };

        // Latency mode: realtime favors a small GOP with no B-frames.
        let (gop_size, max_b_frames) = match config.latency_mode {
            Some(LatencyMode::Realtime) => (10, 0),
            _ => (60, 2),
        };

        // Parse scalability mode (e.g., "L1T1", "L1T2", "L1T3")
        // Note: Temporal SVC support varies by codec and FFmpeg build
        let _scalability = config
            .scalability_mode
            .as_ref()
            .and_then(|mode| parse_scalability_mode(mode));
        // TODO: Apply temporal layer settings when supported by the codec
        // VP9: Use "ts-layering" option
        // AV1: Use "temporal-layering" option

        let bitrate = config.bitrate.unwrap_or(5_000_000.0) as u64;
        let rc_max_rate = if bitrate_mode == BitrateMode::Constant { bitrate } else { 0 };

        // Configure encoder
        let encoder_config = EncoderConfig {
            width,
            height,
            pixel_format: AVPixelFormat::Yuv420p, // Most encoders need YUV420p
            bitrate,
            framerate_num: config.framerate.unwrap_or(30.0) as u32,
            framerate_den: 1,
            gop_size,
            max_b_frames,
            thread_count: 0, // Auto
            profile: None,
            level: None,
            bitrate_mode,
            rc_max_rate,
            rc_buffer_size: 0,
            crf: None, // Will use codec-specific defaults
        };

        context.configure_encoder(&encoder_config).map_err(|e| {
            Error::new(Status::GenericFailure, format!("Failed to configure encoder: {}", e))
        })?;

        // Open the encoder
        context.open().map_err(|e| {
            Error::new(Status::GenericFailure, format!("Failed to open encoder: {}", e))
        })?;

        inner.context = Some(context);
        inner.codec_id = Some(codec_id);
        inner.config = Some(config);
        inner.state = CodecState::Configured;
        inner.extradata_sent = false;
        inner.frame_count = 0;
        inner.output_queue.clear();

        Ok(())
    }

    /// Encode a frame.
    ///
    /// Synchronously validates state, then enqueues the actual FFmpeg encode
    /// as a control-message step (§4.D) so it runs strictly after any
    /// previously enqueued encode/flush step for this instance.
    #[napi]
    pub fn encode(&self, frame: &VideoFrame, _options: Option<VideoEncoderEncodeOptions>) -> Result<()> {
        let (state, width, height, codec_string, codec_id) = {
            let inner = self.inner.lock().map_err(|_| {
                Error::new(Status::GenericFailure, "Lock poisoned")
            })?;
            let dims = inner
                .config
                .as_ref()
                .and_then(|c| Some((c.width?, c.height?, c.codec.clone()?)));
            (inner.state, dims.as_ref().map(|d| d.0), dims.as_ref().map(|d| d.1), dims.map(|d| d.2), inner.codec_id)
        };

        if state != CodecState::Configured {
            return Err(invalid_state_error("VideoEncoder is not configured"));
        }

        let (width, height, codec_string, codec_id) = match (width, height, codec_string, codec_id) {
            (Some(w), Some(h), Some(c), Some(id)) => (w, h, c, id),
            _ => {
                return Err(Error::new(Status::GenericFailure, "Encoder config missing width/height/codec"));
            }
        };

        // Snapshot the frame's own pixel data now, synchronously, since the
        // caller may mutate/close the VideoFrame before the step runs.
        let (internal_frame, pts) = {
            let cloned = frame.with_frame(|f| f.try_clone())?;
            let internal_frame = cloned.map_err(|e| Error::new(Status::GenericFailure, format!("Failed to clone frame: {}", e)))?;
            let pts = frame.timestamp()?;
            (internal_frame, pts)
        };

        self.encode_queue_size.fetch_add(1, Ordering::SeqCst);
        let inner_arc = self.inner.clone();
        let queue_size = self.encode_queue_size.clone();

        let step_id = {
            let inner = self.inner.lock().map_err(|_| {
                Error::new(Status::GenericFailure, "Lock poisoned")
            })?;
            inner.id
        };
        let span = tracing::debug_span!("control_step", codec = "video_encoder", id = step_id, op = "encode");

        self.queue.enqueue(move || {
            async move {
                let mut inner = match inner_arc.lock() {
                    Ok(guard) => guard,
                    Err(_) => {
                        queue_size.fetch_sub(1, Ordering::SeqCst);
                        return;
                    }
                };

                if inner.state == CodecState::Configured {
                    let result = Self::encode_one(&mut inner, internal_frame, pts, width, height, &codec_string, codec_id);
                    if let Err(e) = result {
                        Self::report_error(&mut inner, &e.reason);
                    }
                }

                queue_size.fetch_sub(1, Ordering::SeqCst);
                if let Some(ref callback) = inner.dequeue_callback {
                    callback.call(Ok(()), ThreadsafeFunctionCallMode::NonBlocking);
                }
            }
            .instrument(span)
        });

        Ok(())
    }

    /// Scale (if needed), set the PTS, run FFmpeg encode, and dispatch any
    /// resulting packets. Runs inside the enqueued control-message step.
    fn encode_one(
        inner: &mut VideoEncoderInner,
        internal_frame: crate::codec::Frame,
        pts: i64,
        width: u32,
        height: u32,
        codec_string: &str,
        codec_id: AVCodecID,
    ) -> Result<()> {
        let frame_format = internal_frame.format();
        let needs_conversion =
            frame_format != AVPixelFormat::Yuv420p || internal_frame.width() != width || internal_frame.height() != height;

        let mut frame_to_encode = if needs_conversion {
            let source = (internal_frame.width(), internal_frame.height(), frame_format);

            // Rebuild the scaler whenever the incoming frame's geometry or
            // pixel format drifts from what it was last built for.
            if inner.scaler_source != Some(source) {
                tracing::warn!(
                    from = ?inner.scaler_source,
                    to = ?source,
                    "video_encoder.scaler rebuild: incoming frame geometry changed"
                );
                let scaler = Scaler::new(
                    source.0,
                    source.1,
                    source.2,
                    width,
                    height,
                    AVPixelFormat::Yuv420p,
                    crate::codec::scaler::ScaleAlgorithm::Bilinear,
                )
                .map_err(|e| Error::new(Status::GenericFailure, format!("Failed to create scaler: {}", e)))?;
                inner.scaler = Some(scaler);
                inner.scaler_source = Some(source);
            }

            let scaler = inner.scaler.as_ref().unwrap();
            scaler
                .scale_alloc(&internal_frame)
                .map_err(|e| Error::new(Status::GenericFailure, format!("Failed to scale frame: {}", e)))?
        } else {
            internal_frame
        };

        frame_to_encode.set_pts(pts);

        let extradata_sent = inner.extradata_sent;
        let extradata = if !extradata_sent {
            inner.context.as_ref().and_then(|ctx| ctx.extradata().map(|d| d.to_vec()))
        } else {
            None
        };

        let context = inner
            .context
            .as_mut()
            .ok_or_else(|| Error::new(Status::GenericFailure, "No encoder context"))?;

        let packets = context
            .encode(Some(&frame_to_encode))
            .map_err(|e| Error::new(Status::GenericFailure, format!("Encode failed: {}", e)))?;

        inner.frame_count += 1;
        let use_avcc = uses_avcc(codec_id);

        for packet in packets {
            let is_key = packet.is_key();
            let chunk = EncodedVideoChunk::from_packet_with_format(packet, Some(pts), use_avcc);

            let metadata = if !inner.extradata_sent && is_key {
                inner.extradata_sent = true;

                EncodedVideoChunkMetadata {
                    decoder_config: Some(VideoDecoderConfigOutput {
                        codec: codec_string.to_string(),
                        coded_width: Some(width),
                        coded_height: Some(height),
                        description: extradata.clone().map(Buffer::from),
                    }),
                }
            } else {
                EncodedVideoChunkMetadata {
                    decoder_config: None,
                }
            };

            if let Some(ref callback) = inner.output_callback {
                callback.call(Ok((chunk, metadata)), ThreadsafeFunctionCallMode::NonBlocking);
            } else {
                inner.output_queue.push((chunk, metadata));
            }
        }

        Ok(())
    }

    /// Flush the encoder and return all remaining chunks. Returns a Promise
    /// that resolves once every previously enqueued encode step (and the
    /// flush itself) has finished.
    #[napi]
    pub async fn flush(&self) -> Result<()> {
        let state = {
            let inner = self.inner.lock().map_err(|_| {
                Error::new(Status::GenericFailure, "Lock poisoned")
            })?;
            inner.state
        };

        if state != CodecState::Configured {
            return Err(invalid_state_error("VideoEncoder is not configured"));
        }

        let inner_arc = self.inner.clone();
        let (tx, rx) = tokio::sync::oneshot::channel();

        let step_id = {
            let inner = self.inner.lock().map_err(|_| {
                Error::new(Status::GenericFailure, "Lock poisoned")
            })?;
            inner.id
        };
        let span = tracing::debug_span!("control_step", codec = "video_encoder", id = step_id, op = "flush");

        self.queue.enqueue(move || {
            async move {
                let mut inner = match inner_arc.lock() {
                    Ok(guard) => guard,
                    Err(_) => {
                        let _ = tx.send(());
                        return;
                    }
                };

                if inner.state == CodecState::Configured {
                    let codec_id = inner.codec_id;
                    let packets = match inner.context.as_mut() {
                        Some(ctx) => ctx.flush_encoder().map_err(|e| {
                            Error::new(Status::GenericFailure, format!("Flush failed: {}", e))
                        }),
                        None => Err(Error::new(Status::GenericFailure, "No encoder context")),
                    };

                    match packets {
                        Ok(packets) => {
                            let use_avcc = codec_id.map(uses_avcc).unwrap_or(false);
                            for packet in packets {
                                let chunk = EncodedVideoChunk::from_packet_with_format(packet, None, use_avcc);
                                let metadata = EncodedVideoChunkMetadata {
                                    decoder_config: None,
                                };

                                if let Some(ref callback) = inner.output_callback {
                                    callback.call(Ok((chunk, metadata)), ThreadsafeFunctionCallMode::NonBlocking);
                                } else {
                                    inner.output_queue.push((chunk, metadata));
                                }
                            }
                        }
                        Err(e) => {
                            Self::report_error(&mut inner, &e.reason);
                        }
                    }
                }

                let _ = tx.send(());
            }
            .instrument(span)
        });

        let _ = rx.await;
        Ok(())
    }

    /// Take all encoded chunks from the output queue
    ///
    /// Returns an array of [chunk, metadata] pairs
    #[napi]
    pub fn take_encoded_chunks(&self) -> Result<Vec<EncodedVideoChunk>> {
        let mut inner = self.inner.lock().map_err(|_| {
            Error::new(Status::GenericFailure, "Lock poisoned")
        })?;

        let chunks: Vec<EncodedVideoChunk> = inner.output_queue
            .drain(..)
            .map(|(chunk, _)| chunk)
            .collect();

        Ok(chunks)
    }

    /// Check if there are any pending encoded chunks
    #[napi]
    pub fn has_output(&self) -> Result<bool> {
        let inner = self.inner.lock().map_err(|_| {
            Error::new(Status::GenericFailure, "Lock poisoned")
        })?;
        Ok(!inner.output_queue.is_empty())
    }

    /// Take the next encoded chunk from the output queue (if any)
    #[napi]
    pub fn take_next_chunk(&self) -> Result<Option<EncodedVideoChunk>> {
        let mut inner = self.inner.lock().map_err(|_| {
            Error::new(Status::GenericFailure, "Lock poisoned")
        })?;

        if inner.output_queue.is_empty() {
            Ok(None)
        } else {
            let (chunk, _) = inner.output_queue.remove(0);
            Ok(Some(chunk))
        }
    }

    /// Reset the encoder
    #[napi]
    pub fn reset(&self) -> Result<()> {
        let mut inner = self.inner.lock().map_err(|_| {
            Error::new(Status::GenericFailure, "Lock poisoned")
        })?;

        if inner.state == CodecState::Closed {
            return Err(invalid_state_error("VideoEncoder is closed"));
        }

        // Drop existing context
        inner.context = None;
        inner.codec_id = None;
        inner.scaler = None;
        inner.scaler_source = None;
        inner.config = None;
        inner.state = CodecState::Unconfigured;
        inner.frame_count = 0;
        inner.extradata_sent = false;
        inner.output_queue.clear();

        Ok(())
    }

    /// Close the encoder
    #[napi]
    pub fn close(&self) -> Result<()> {
        let mut inner = self.inner.lock().map_err(|_| {
            Error::new(Status::GenericFailure, "Lock poisoned")
        })?;

        inner.context = None;
        inner.codec_id = None;
        inner.scaler = None;
        inner.scaler_source = None;
        inner.config = None;
        inner.state = CodecState::Closed;
        inner.output_queue.clear();

        Ok(())
    }

    /// Check if a configuration is supported
    /// Returns a Promise that resolves with support information
    #[napi]
    pub async fn is_config_supported(config: VideoEncoderConfig) -> Result<VideoEncoderSupport> {
        // Parse codec string
        let codec_id = match config.codec.as_deref().map(parse_codec_string) {
            Some(Ok(id)) => id,
            _ => {
                return Ok(VideoEncoderSupport {
                    supported: false,
                    config,
                });
            }
        };

        // Try to create encoder
        let result = CodecContext::new_encoder(codec_id);

        Ok(VideoEncoderSupport {
            supported: result.is_ok(),
            config,
        })
    }
}

/// Parse WebCodecs codec string to FFmpeg codec ID
fn parse_codec_string(codec: &str) -> Result<AVCodecID> {
    // Handle common codec strings
    // https://www.w3.org/TR/webcodecs-codec-registry/

    let codec_lower = codec.to_lowercase();

    if codec_lower.starts_with("avc1") || codec_lower.starts_with("avc3") || codec_lower == "h264" {
        Ok(AVCodecID::H264)
    } else if codec_lower.starts_with("hev1") || codec_lower.starts_with("hvc1") || codec_lower == "h265" || codec_lower == "hevc" {
        Ok(AVCodecID::Hevc)
    } else if codec_lower == "vp8" {
        Ok(AVCodecID::Vp8)
    } else if codec_lower.starts_with("vp09") || codec_lower == "vp9" {
        Ok(AVCodecID::Vp9)
    } else if codec_lower.starts_with("av01") || codec_lower == "av1" {
        Ok(AVCodecID::Av1)
    } else {
        Err(Error::new(
            Status::GenericFailure,
            format!("Unsupported codec: {}", codec),
        ))
    }
}

/// Parse scalability mode string (e.g., "L1T1", "L1T2", "L1T3")
/// Returns (spatial_layers, temporal_layers)
fn parse_scalability_mode(mode: &str) -> Option<(u32, u32)> {
    let mode_upper = mode.to_uppercase();

    // Parse LxTy format (e.g., L1T1, L1T2, L1T3, L2T1, etc.)
    if mode_upper.starts_with('L') && mode_upper.contains('T') {
        let parts: Vec<&str> = mode_upper.split('T').collect();
        if parts.len() == 2 {
            let spatial = parts[0].trim_start_matches('L').parse::<u32>().ok()?;
            let temporal = parts[1].chars().next()?.to_digit(10)?;
            return Some((spatial, temporal));
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn new_encoder_starts_unconfigured_with_zero_queue_size() {
        let encoder = VideoEncoder::new().unwrap();
        assert_eq!(encoder.state().unwrap(), CodecState::Unconfigured);
        assert_eq!(encoder.encode_queue_size().unwrap(), 0);
    }

    #[tokio::test]
    async fn flush_while_unconfigured_throws_without_closing() {
        let encoder = VideoEncoder::new().unwrap();
        let err = encoder.flush().await.unwrap_err();
        assert!(err.reason.contains("InvalidStateError"));
        assert_eq!(encoder.state().unwrap(), CodecState::Unconfigured);
    }

    #[tokio::test]
    async fn configure_on_closed_encoder_throws_invalid_state() {
        let encoder = VideoEncoder::new().unwrap();
        encoder.close().unwrap();
        assert_eq!(encoder.state().unwrap(), CodecState::Closed);

        let config = VideoEncoderConfig {
            codec: Some("vp8".to_string()),
            width: Some(640),
            height: Some(480),
            display_width: None,
            display_height: None,
            bitrate: None,
            framerate: None,
            latency_mode: None,
            bitrate_mode: None,
            alpha: None,
            scalability_mode: None,
            content_hint: None,
            avc: None,
            hevc: None,
        };

        let err = encoder.configure(config).unwrap_err();
        assert!(err.reason.contains("InvalidStateError"));
    }

    #[test]
    fn parse_codec_string_recognizes_common_codecs() {
        assert_eq!(parse_codec_string("vp8").unwrap(), AVCodecID::Vp8);
        assert_eq!(parse_codec_string("avc1.42001e").unwrap(), AVCodecID::H264);
        assert!(parse_codec_string("not-a-codec").is_err());
    }

    #[test]
    fn parse_scalability_mode_parses_spatial_and_temporal_layers() {
        assert_eq!(parse_scalability_mode("L1T2"), Some((1, 2)));
        assert_eq!(parse_scalability_mode("L2T3"), Some((2, 3)));
        assert_eq!(parse_scalability_mode("bogus"), None);
    }

    #[test]
    fn uses_avcc_is_true_only_for_avc_and_hevc() {
        assert!(uses_avcc(AVCodecID::H264));
        assert!(uses_avcc(AVCodecID::Hevc));
        assert!(!uses_avcc(AVCodecID::Vp8));
        assert!(!uses_avcc(AVCodecID::Vp9));
        assert!(!uses_avcc(AVCodecID::Av1));
    }
}

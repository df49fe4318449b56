//! VideoDecoder - WebCodecs API implementation
//!
//! Provides video decoding functionality using FFmpeg.
//! See: https://developer.mozilla.org/en-US/docs/Web/API/VideoDecoder

use crate::codec::{CodecContext, ControlQueue, DecoderConfig, Frame, Packet};
use crate::ffi::AVCodecID;
use crate::webcodecs::error::invalid_state_error;
use crate::webcodecs::{CodecState, EncodedVideoChunk, VideoDecoderConfig, VideoFrame};
use napi::bindgen_prelude::*;
use napi::threadsafe_function::{ThreadsafeFunction, ThreadsafeFunctionCallMode};
use napi_derive::napi;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tracing::Instrument;

/// Type alias for output callback (takes VideoFrame)
type OutputCallback = ThreadsafeFunction<VideoFrame>;

/// Type alias for error callback (takes error message)
type ErrorCallback = ThreadsafeFunction<String>;

/// Type alias for dequeue callback (fires once per completed decode step)
type DequeueCallback = ThreadsafeFunction<()>;

static NEXT_DECODER_ID: AtomicU64 = AtomicU64::new(0);

/// Result of isConfigSupported
#[napi(object)]
#[derive(Debug, Clone)]
pub struct VideoDecoderSupport {
    /// Whether the configuration is supported
    pub supported: bool,
    /// The configuration that was checked (codec only for simplicity)
    pub codec: String,
}

/// Internal decoder state
struct VideoDecoderInner {
    id: u64,
    state: CodecState,
    config: Option<DecoderConfig>,
    context: Option<CodecContext>,
    codec_string: String,
    frame_count: u64,
    /// Queued output frames (for synchronous retrieval)
    output_queue: Vec<VideoFrame>,
    /// Optional output callback (WebCodecs spec compliant mode)
    output_callback: Option<OutputCallback>,
    /// Optional error callback (WebCodecs spec compliant mode)
    error_callback: Option<ErrorCallback>,
    /// Optional dequeue callback, fired once per completed decode step
    dequeue_callback: Option<DequeueCallback>,
}

/// VideoDecoder - WebCodecs-compliant video decoder
///
/// Decodes EncodedVideoChunk objects into VideoFrame objects using FFmpeg.
///
/// Two output modes are supported: a synchronous output queue (drained with
/// `takeDecodedFrames`) for simple integration, and a callback mode
/// (`VideoDecoder.withCallbacks`) matching the WebCodecs `{output, error}`
/// constructor contract. `decode()`/`flush()` enqueue their backend work onto
/// a per-instance `ControlQueue` (§4.D) rather than running it inline.
#[napi]
pub struct VideoDecoder {
    inner: Arc<Mutex<VideoDecoderInner>>,
    queue: ControlQueue,
    /// decodeQueueSize: incremented synchronously in `decode()`, decremented
    /// once that step's work has finished, independent of `output_queue`.
    decode_queue_size: Arc<AtomicU32>,
}

#[napi]
impl VideoDecoder {
    /// Create a new VideoDecoder (queue-based mode)
    #[napi(constructor)]
    pub fn new() -> Result<Self> {
        let inner = VideoDecoderInner {
            id: NEXT_DECODER_ID.fetch_add(1, Ordering::Relaxed),
            state: CodecState::Unconfigured,
            config: None,
            context: None,
            codec_string: String::new(),
            frame_count: 0,
            output_queue: Vec::new(),
            output_callback: None,
            error_callback: None,
            dequeue_callback: None,
        };

        Ok(Self {
            inner: Arc::new(Mutex::new(inner)),
            queue: ControlQueue::spawn(),
            decode_queue_size: Arc::new(AtomicU32::new(0)),
        })
    }

    /// Create a VideoDecoder with callbacks (WebCodecs spec compliant mode)
    ///
    /// In this mode, decoded frames are delivered via the output callback
    /// instead of being queued for retrieval. Errors are reported via the
    /// error callback and the decoder transitions to the Closed state.
    #[napi(factory)]
    pub fn with_callbacks(
        output: ThreadsafeFunction<VideoFrame>,
        error: ThreadsafeFunction<String>,
    ) -> Result<Self> {
        let inner = VideoDecoderInner {
            id: NEXT_DECODER_ID.fetch_add(1, Ordering::Relaxed),
            state: CodecState::Unconfigured,
            config: None,
            context: None,
            codec_string: String::new(),
            frame_count: 0,
            output_queue: Vec::new(),
            output_callback: Some(output),
            error_callback: Some(error),
            dequeue_callback: None,
        };

        Ok(Self {
            inner: Arc::new(Mutex::new(inner)),
            queue: ControlQueue::spawn(),
            decode_queue_size: Arc::new(AtomicU32::new(0)),
        })
    }

    /// Register a callback fired once per completed decode step, mirroring
    /// the `ondequeue` event on the real `VideoDecoder.decodeQueueSize`.
    #[napi]
    pub fn set_ondequeue(&self, callback: ThreadsafeFunction<()>) -> Result<()> {
        let mut inner = self.inner.lock().map_err(|_| {
            Error::new(Status::GenericFailure, "Lock poisoned")
        })?;
        inner.dequeue_callback = Some(callback);
        Ok(())
    }

    /// Report a genuine backend failure via the error callback (if in
    /// callback mode) and close the decoder. Must never be used for a
    /// wrong-state call — those throw `InvalidStateError` synchronously and
    /// leave state alone. Returns true if the error was reported via
    /// callback, false if the caller should return/propagate the error.
    fn report_error(inner: &mut VideoDecoderInner, error_msg: &str) -> bool {
        if let Some(ref callback) = inner.error_callback {
            callback.call(Ok(error_msg.to_string()), ThreadsafeFunctionCallMode::NonBlocking);
            inner.state = CodecState::Closed;
            true
        } else {
            false
        }
    }

    /// Get decoder state
    #[napi(getter)]
    pub fn state(&self) -> Result<CodecState> {
        let inner = self.inner.lock().map_err(|_| {
            Error::new(Status::GenericFailure, "Lock poisoned")
        })?;
        Ok(inner.state)
    }

    /// Number of decode() calls submitted but not yet finished processing.
    #[napi(getter)]
    pub fn decode_queue_size(&self) -> Result<u32> {
        Ok(self.decode_queue_size.load(Ordering::SeqCst))
    }

    /// Configure the decoder
    #[napi]
    pub fn configure(&self, config: VideoDecoderConfig) -> Result<()> {
        let mut inner = self.inner.lock().map_err(|_| {
            Error::new(Status::GenericFailure, "Lock poisoned")
        })?;

        if inner.state == CodecState::Closed {
            return Err(invalid_state_error("VideoDecoder is closed"));
        }

        let codec_str = config
            .codec
            .clone()
            .ok_or_else(|| Error::new(Status::InvalidArg, "codec is required"))?;

        tracing::debug!(id = inner.id, codec = %codec_str, "video_decoder.configure");

        // Parse codec string to determine codec ID
        let codec_id = parse_codec_string(&codec_str)?;

        let mut context = CodecContext::new_decoder(codec_id).map_err(|e| {
            Error::new(Status::GenericFailure, format!("Failed to create decoder: {}", e))
        })?;

        // Configure decoder
        let decoder_config = DecoderConfig {
            codec_id,
            thread_count: 0, // Auto
            extradata: config.description.as_ref().map(|d| d.to_vec()),
            sample_rate: None,
            channels: None,
        };

        context.configure_decoder(&decoder_config).map_err(|e| {
            Error::new(Status::GenericFailure, format!("Failed to configure decoder: {}", e))
        })?;

        // Open the decoder
        context.open().map_err(|e| {
            Error::new(Status::GenericFailure, format!("Failed to open decoder: {}", e))
        })?;

        inner.context = Some(context);
        inner.config = Some(decoder_config);
        inner.codec_string = codec_str;
        inner.state = CodecState::Configured;
        inner.frame_count = 0;
        inner.output_queue.clear();

        Ok(())
    }

    /// Decode an encoded video chunk.
    ///
    /// Synchronously validates state, then enqueues the actual FFmpeg decode
    /// as a control-message step (§4.D) so it runs strictly after any
    /// previously enqueued decode/flush step for this instance.
    #[napi]
    pub fn decode(&self, chunk: &EncodedVideoChunk) -> Result<()> {
        let state = {
            let inner = self.inner.lock().map_err(|_| {
                Error::new(Status::GenericFailure, "Lock poisoned")
            })?;
            inner.state
        };

        if state != CodecState::Configured {
            return Err(invalid_state_error("VideoDecoder is not configured"));
        }

        let data = chunk
            .get_data_optional(|s| Some(s.to_vec()))
            .flatten()
            .ok_or_else(|| Error::new(Status::GenericFailure, "EncodedVideoChunk has no data"))?;
        let timestamp = chunk.timestamp()?;
        let duration = chunk.duration()?;

        self.decode_queue_size.fetch_add(1, Ordering::SeqCst);
        let inner_arc = self.inner.clone();
        let queue_size = self.decode_queue_size.clone();

        let step_id = {
            let inner = self.inner.lock().map_err(|_| {
                Error::new(Status::GenericFailure, "Lock poisoned")
            })?;
            inner.id
        };
        let span = tracing::debug_span!("control_step", codec = "video_decoder", id = step_id, op = "decode");

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
                    let result = match inner.context.as_mut() {
                        Some(context) => decode_chunk_data(context, &data, timestamp, duration),
                        None => Err(Error::new(Status::GenericFailure, "No decoder context")),
                    };

                    match result {
                        Ok(frames) => {
                            inner.frame_count += 1;
                            for frame in frames {
                                let video_frame = VideoFrame::from_internal(frame, timestamp, duration);
                                if let Some(ref callback) = inner.output_callback {
                                    callback.call(Ok(video_frame), ThreadsafeFunctionCallMode::NonBlocking);
                                } else {
                                    inner.output_queue.push(video_frame);
                                }
                            }
                        }
                        Err(e) => {
                            let msg = format!("Decode failed: {}", e);
                            Self::report_error(&mut inner, &msg);
                        }
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

    /// Flush the decoder and return all remaining frames. Returns a Promise
    /// that resolves once every previously enqueued decode step (and the
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
            return Err(invalid_state_error("VideoDecoder is not configured"));
        }

        let inner_arc = self.inner.clone();
        let (tx, rx) = tokio::sync::oneshot::channel();

        let step_id = {
            let inner = self.inner.lock().map_err(|_| {
                Error::new(Status::GenericFailure, "Lock poisoned")
            })?;
            inner.id
        };
        let span = tracing::debug_span!("control_step", codec = "video_decoder", id = step_id, op = "flush");

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
                    let frames = match inner.context.as_mut() {
                        Some(context) => context.flush_decoder().map_err(|e| {
                            Error::new(Status::GenericFailure, format!("Flush failed: {}", e))
                        }),
                        None => Err(Error::new(Status::GenericFailure, "No decoder context")),
                    };

                    match frames {
                        Ok(frames) => {
                            for frame in frames {
                                let pts = frame.pts();
                                let duration = if frame.duration() > 0 { Some(frame.duration()) } else { None };
                                let video_frame = VideoFrame::from_internal(frame, pts, duration);
                                if let Some(ref callback) = inner.output_callback {
                                    callback.call(Ok(video_frame), ThreadsafeFunctionCallMode::NonBlocking);
                                } else {
                                    inner.output_queue.push(video_frame);
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

    /// Take all decoded frames from the output queue
    #[napi]
    pub fn take_decoded_frames(&self) -> Result<Vec<VideoFrame>> {
        let mut inner = self.inner.lock().map_err(|_| {
            Error::new(Status::GenericFailure, "Lock poisoned")
        })?;

        let frames: Vec<VideoFrame> = inner.output_queue.drain(..).collect();
        Ok(frames)
    }

    /// Check if there are any pending decoded frames
    #[napi]
    pub fn has_output(&self) -> Result<bool> {
        let inner = self.inner.lock().map_err(|_| {
            Error::new(Status::GenericFailure, "Lock poisoned")
        })?;
        Ok(!inner.output_queue.is_empty())
    }

    /// Take the next decoded frame from the output queue (if any)
    #[napi]
    pub fn take_next_frame(&self) -> Result<Option<VideoFrame>> {
        let mut inner = self.inner.lock().map_err(|_| {
            Error::new(Status::GenericFailure, "Lock poisoned")
        })?;

        if inner.output_queue.is_empty() {
            Ok(None)
        } else {
            let frame = inner.output_queue.remove(0);
            Ok(Some(frame))
        }
    }

    /// Reset the decoder
    #[napi]
    pub fn reset(&self) -> Result<()> {
        let mut inner = self.inner.lock().map_err(|_| {
            Error::new(Status::GenericFailure, "Lock poisoned")
        })?;

        if inner.state == CodecState::Closed {
            return Err(invalid_state_error("VideoDecoder is closed"));
        }

        inner.context = None;
        inner.config = None;
        inner.codec_string.clear();
        inner.state = CodecState::Unconfigured;
        inner.frame_count = 0;
        inner.output_queue.clear();

        Ok(())
    }

    /// Close the decoder
    #[napi]
    pub fn close(&self) -> Result<()> {
        let mut inner = self.inner.lock().map_err(|_| {
            Error::new(Status::GenericFailure, "Lock poisoned")
        })?;

        inner.context = None;
        inner.config = None;
        inner.codec_string.clear();
        inner.state = CodecState::Closed;
        inner.output_queue.clear();

        Ok(())
    }

    /// Check if a configuration is supported
    #[napi]
    pub fn is_config_supported(config: VideoDecoderConfig) -> Result<VideoDecoderSupport> {
        let codec_str = config.codec.clone().unwrap_or_default();
        let codec_id = match parse_codec_string(&codec_str) {
            Ok(id) => id,
            Err(_) => {
                return Ok(VideoDecoderSupport {
                    supported: false,
                    codec: codec_str,
                });
            }
        };

        let result = CodecContext::new_decoder(codec_id);

        Ok(VideoDecoderSupport {
            supported: result.is_ok(),
            codec: codec_str,
        })
    }
}

/// Parse WebCodecs codec string to FFmpeg codec ID
fn parse_codec_string(codec: &str) -> Result<AVCodecID> {
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

/// Decode chunk data using FFmpeg
fn decode_chunk_data(
    context: &mut CodecContext,
    data: &[u8],
    timestamp: i64,
    duration: Option<i64>,
) -> Result<Vec<Frame>> {
    let mut packet = Packet::new().map_err(|e| {
        Error::new(Status::GenericFailure, format!("Failed to create packet: {}", e))
    })?;

    packet.set_pts(timestamp);
    packet.set_dts(timestamp);
    if let Some(dur) = duration {
        packet.set_duration(dur);
    }

    unsafe {
        use crate::ffi::avcodec::av_new_packet;

        let ret = av_new_packet(packet.as_mut_ptr(), data.len() as i32);
        if ret < 0 {
            return Err(Error::new(
                Status::GenericFailure,
                format!("Failed to allocate packet data: {}", ret),
            ));
        }

        let pkt_data = packet.data() as *mut u8;
        std::ptr::copy_nonoverlapping(data.as_ptr(), pkt_data, data.len());
    }

    let frames = context.decode(Some(&packet)).map_err(|e| {
        Error::new(Status::GenericFailure, format!("Decode failed: {}", e))
    })?;

    Ok(frames)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::webcodecs::{EncodedVideoChunkInit, EncodedVideoChunkType};

    fn test_chunk(timestamp: i64, data: Vec<u8>) -> EncodedVideoChunk {
        EncodedVideoChunk::new(EncodedVideoChunkInit {
            chunk_type: EncodedVideoChunkType::Key,
            timestamp,
            duration: None,
            data: Either::A(data),
        })
        .unwrap()
    }

    #[tokio::test]
    async fn new_decoder_starts_unconfigured_with_zero_queue_size() {
        let decoder = VideoDecoder::new().unwrap();
        assert_eq!(decoder.state().unwrap(), CodecState::Unconfigured);
        assert_eq!(decoder.decode_queue_size().unwrap(), 0);
    }

    #[tokio::test]
    async fn decode_while_unconfigured_throws_without_closing() {
        let decoder = VideoDecoder::new().unwrap();
        let chunk = test_chunk(0, vec![0u8; 4]);

        let err = decoder.decode(&chunk).unwrap_err();
        assert!(err.reason.contains("InvalidStateError"));
        assert_eq!(decoder.state().unwrap(), CodecState::Unconfigured);
    }

    #[tokio::test]
    async fn flush_while_unconfigured_throws_without_closing() {
        let decoder = VideoDecoder::new().unwrap();
        let err = decoder.flush().await.unwrap_err();
        assert!(err.reason.contains("InvalidStateError"));
        assert_eq!(decoder.state().unwrap(), CodecState::Unconfigured);
    }

    #[test]
    fn parse_codec_string_recognizes_common_codecs() {
        assert_eq!(parse_codec_string("vp8").unwrap(), AVCodecID::Vp8);
        assert_eq!(parse_codec_string("avc1.42001e").unwrap(), AVCodecID::H264);
        assert!(parse_codec_string("not-a-codec").is_err());
    }
}

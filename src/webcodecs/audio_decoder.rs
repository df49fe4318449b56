//! AudioDecoder - WebCodecs API implementation
//!
//! Provides audio decoding functionality using FFmpeg.
//! See: https://developer.mozilla.org/en-US/docs/Web/API/AudioDecoder

use crate::codec::{CodecContext, ControlQueue, DecoderConfig, Frame, Packet};
use crate::ffi::AVCodecID;
use crate::webcodecs::error::invalid_state_error;
use crate::webcodecs::{AudioData, AudioDecoderConfig, AudioDecoderSupport, EncodedAudioChunk};
use napi::bindgen_prelude::*;
use napi::threadsafe_function::{ThreadsafeFunction, ThreadsafeFunctionCallMode};
use napi_derive::napi;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tracing::Instrument;

use super::video_encoder::CodecState;

/// Type alias for output callback (takes AudioData)
type OutputCallback = ThreadsafeFunction<AudioData>;

/// Type alias for error callback (takes error message)
type ErrorCallback = ThreadsafeFunction<String>;

/// Type alias for dequeue callback (fires once per completed decode step)
type DequeueCallback = ThreadsafeFunction<()>;

static NEXT_DECODER_ID: AtomicU64 = AtomicU64::new(0);

/// Internal decoder state
struct AudioDecoderInner {
    id: u64,
    state: CodecState,
    config: Option<DecoderConfig>,
    context: Option<CodecContext>,
    codec_string: String,
    frame_count: u64,
    /// Queued output frames (for synchronous retrieval)
    output_queue: Vec<AudioData>,
    /// Optional output callback (WebCodecs spec compliant mode)
    output_callback: Option<OutputCallback>,
    /// Optional error callback (WebCodecs spec compliant mode)
    error_callback: Option<ErrorCallback>,
    /// Optional dequeue callback, fired once per completed decode step
    dequeue_callback: Option<DequeueCallback>,
}

/// AudioDecoder - WebCodecs-compliant audio decoder
///
/// Decodes EncodedAudioChunk objects into AudioData objects using FFmpeg.
///
/// Note: This implementation uses a synchronous output queue model instead of
/// callbacks for simpler integration. Use `takeDecodedAudio()` to retrieve
/// decoded output after calling `decode()` or `flush()`.
///
/// `decode()`/`flush()` enqueue their backend work onto a per-instance
/// `ControlQueue` instead of running it inline under the lock, so they
/// execute in call order but never block the caller (§4.D/§4.E).
#[napi]
pub struct AudioDecoder {
    inner: Arc<Mutex<AudioDecoderInner>>,
    queue: ControlQueue,
    /// decodeQueueSize: incremented synchronously in `decode()`, decremented
    /// once that step's work has finished, independent of `output_queue`.
    decode_queue_size: Arc<AtomicU32>,
}

#[napi]
impl AudioDecoder {
    /// Create a new AudioDecoder (queue-based mode)
    #[napi(constructor)]
    pub fn new() -> Result<Self> {
        let inner = AudioDecoderInner {
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

    /// Create an AudioDecoder with callbacks (WebCodecs spec compliant mode)
    ///
    /// In this mode, decoded audio is delivered via the output callback
    /// instead of being queued for retrieval. Errors are reported via the
    /// error callback and the decoder transitions to the Closed state.
    ///
    /// Example:
    /// ```javascript
    /// const decoder = AudioDecoder.withCallbacks(
    ///   (audio) => { /* handle output */ },
    ///   (error) => { /* handle error */ }
    /// );
    /// ```
    #[napi(factory)]
    pub fn with_callbacks(
        output: ThreadsafeFunction<AudioData>,
        error: ThreadsafeFunction<String>,
    ) -> Result<Self> {
        let inner = AudioDecoderInner {
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
    /// the `ondequeue` event on the real `AudioDecoder.decodeQueueSize`.
    #[napi]
    pub fn set_ondequeue(&self, callback: ThreadsafeFunction<()>) -> Result<()> {
        let mut inner = self.inner.lock().map_err(|_| {
            Error::new(Status::GenericFailure, "Lock poisoned")
        })?;
        inner.dequeue_callback = Some(callback);
        Ok(())
    }

    /// Report a genuine backend failure via the error callback (if in callback
    /// mode) and close the decoder. Must never be used for a wrong-state call
    /// — those throw `InvalidStateError` synchronously and leave state alone.
    /// Returns true if the error was reported via callback, false if the
    /// caller should return/propagate the error itself.
    fn report_error(inner: &mut AudioDecoderInner, error_msg: &str) -> bool {
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
    pub fn configure(&self, config: AudioDecoderConfig) -> Result<()> {
        let mut inner = self.inner.lock().map_err(|_| {
            Error::new(Status::GenericFailure, "Lock poisoned")
        })?;

        if inner.state == CodecState::Closed {
            return Err(invalid_state_error("AudioDecoder is closed"));
        }

        let codec_str = config
            .codec
            .clone()
            .ok_or_else(|| Error::new(Status::InvalidArg, "codec is required"))?;

        tracing::debug!(id = inner.id, codec = %codec_str, "audio_decoder.configure");

        // Parse codec string to determine codec ID
        let codec_id = parse_audio_codec_string(&codec_str)?;

        // Create decoder context
        let mut context = CodecContext::new_decoder(codec_id).map_err(|e| {
            Error::new(
                Status::GenericFailure,
                format!("Failed to create decoder: {}", e),
            )
        })?;

        // Configure decoder
        let decoder_config = DecoderConfig {
            codec_id,
            thread_count: 0, // Auto
            extradata: config.description.as_ref().map(|d| d.to_vec()),
            sample_rate: config.sample_rate.map(|r| r as u32),
            channels: config.number_of_channels,
        };

        context.configure_decoder(&decoder_config).map_err(|e| {
            Error::new(
                Status::GenericFailure,
                format!("Failed to configure decoder: {}", e),
            )
        })?;

        // Open the decoder
        context.open().map_err(|e| {
            Error::new(
                Status::GenericFailure,
                format!("Failed to open decoder: {}", e),
            )
        })?;

        inner.context = Some(context);
        inner.config = Some(decoder_config);
        inner.codec_string = codec_str;
        inner.state = CodecState::Configured;
        inner.frame_count = 0;
        inner.output_queue.clear();

        Ok(())
    }

    /// Decode an encoded audio chunk.
    ///
    /// Synchronously validates state, then enqueues the actual FFmpeg decode
    /// as a control-message step (§4.D) so it runs strictly after any
    /// previously enqueued decode/flush step for this instance.
    #[napi]
    pub fn decode(&self, chunk: &EncodedAudioChunk) -> Result<()> {
        let state = {
            let inner = self.inner.lock().map_err(|_| {
                Error::new(Status::GenericFailure, "Lock poisoned")
            })?;
            inner.state
        };

        if state != CodecState::Configured {
            return Err(invalid_state_error("AudioDecoder is not configured"));
        }

        let data = chunk.get_data_vec()?;
        let timestamp = chunk.get_timestamp()?;

        self.decode_queue_size.fetch_add(1, Ordering::SeqCst);
        let inner_arc = self.inner.clone();
        let queue_size = self.decode_queue_size.clone();

        let step_id = {
            let inner = self.inner.lock().map_err(|_| {
                Error::new(Status::GenericFailure, "Lock poisoned")
            })?;
            inner.id
        };
        let span = tracing::debug_span!("control_step", codec = "audio_decoder", id = step_id, op = "decode");

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
                        Some(context) => decode_audio_chunk_data(context, &data, timestamp),
                        None => Err(Error::new(Status::GenericFailure, "No decoder context")),
                    };

                    match result {
                        Ok(frames) => {
                            inner.frame_count += 1;
                            for frame in frames {
                                let pts = frame.pts();
                                let audio_data = AudioData::from_internal(frame, pts);
                                if let Some(ref callback) = inner.output_callback {
                                    callback.call(Ok(audio_data), ThreadsafeFunctionCallMode::NonBlocking);
                                } else {
                                    inner.output_queue.push(audio_data);
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

    /// Flush the decoder and return all remaining audio data.
    /// Returns a Promise that resolves once every previously enqueued
    /// decode step (and the flush itself) has finished.
    #[napi]
    pub async fn flush(&self) -> Result<()> {
        let state = {
            let inner = self.inner.lock().map_err(|_| {
                Error::new(Status::GenericFailure, "Lock poisoned")
            })?;
            inner.state
        };

        if state != CodecState::Configured {
            return Err(invalid_state_error("AudioDecoder is not configured"));
        }

        let inner_arc = self.inner.clone();
        let (tx, rx) = tokio::sync::oneshot::channel();

        let step_id = {
            let inner = self.inner.lock().map_err(|_| {
                Error::new(Status::GenericFailure, "Lock poisoned")
            })?;
            inner.id
        };
        let span = tracing::debug_span!("control_step", codec = "audio_decoder", id = step_id, op = "flush");

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
                                let audio_data = AudioData::from_internal(frame, pts);
                                if let Some(ref callback) = inner.output_callback {
                                    callback.call(Ok(audio_data), ThreadsafeFunctionCallMode::NonBlocking);
                                } else {
                                    inner.output_queue.push(audio_data);
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

    /// Take all decoded audio from the output queue
    #[napi]
    pub fn take_decoded_audio(&self) -> Result<Vec<AudioData>> {
        let mut inner = self.inner.lock().map_err(|_| {
            Error::new(Status::GenericFailure, "Lock poisoned")
        })?;

        let audio: Vec<AudioData> = inner.output_queue.drain(..).collect();
        Ok(audio)
    }

    /// Check if there are any pending decoded audio data
    #[napi]
    pub fn has_output(&self) -> Result<bool> {
        let inner = self.inner.lock().map_err(|_| {
            Error::new(Status::GenericFailure, "Lock poisoned")
        })?;
        Ok(!inner.output_queue.is_empty())
    }

    /// Take the next decoded audio data from the output queue (if any)
    #[napi]
    pub fn take_next_audio(&self) -> Result<Option<AudioData>> {
        let mut inner = self.inner.lock().map_err(|_| {
            Error::new(Status::GenericFailure, "Lock poisoned")
        })?;

        if inner.output_queue.is_empty() {
            Ok(None)
        } else {
            let audio = inner.output_queue.remove(0);
            Ok(Some(audio))
        }
    }

    /// Reset the decoder
    #[napi]
    pub fn reset(&self) -> Result<()> {
        let mut inner = self.inner.lock().map_err(|_| {
            Error::new(Status::GenericFailure, "Lock poisoned")
        })?;

        if inner.state == CodecState::Closed {
            return Err(invalid_state_error("AudioDecoder is closed"));
        }

        // Drop existing context
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
    /// Returns a Promise that resolves with support information
    #[napi]
    pub async fn is_config_supported(config: AudioDecoderConfig) -> Result<AudioDecoderSupport> {
        // Parse codec string
        let codec_id = match config.codec.as_deref().map(parse_audio_codec_string) {
            Some(Ok(id)) => id,
            _ => {
                return Ok(AudioDecoderSupport {
                    supported: false,
                    config,
                });
            }
        };

        // Try to create decoder
        let result = CodecContext::new_decoder(codec_id);

        Ok(AudioDecoderSupport {
            supported: result.is_ok(),
            config,
        })
    }
}

/// Parse WebCodecs audio codec string to FFmpeg codec ID
fn parse_audio_codec_string(codec: &str) -> Result<AVCodecID> {
    let codec_lower = codec.to_lowercase();

    // AAC variants
    if codec_lower.starts_with("mp4a.40") || codec_lower == "aac" {
        return Ok(AVCodecID::Aac);
    }

    // Opus
    if codec_lower == "opus" {
        return Ok(AVCodecID::Opus);
    }

    // MP3
    if codec_lower == "mp3" || codec_lower == "mp4a.6b" {
        return Ok(AVCodecID::Mp3);
    }

    // FLAC
    if codec_lower == "flac" {
        return Ok(AVCodecID::Flac);
    }

    // Vorbis
    if codec_lower == "vorbis" {
        return Ok(AVCodecID::Vorbis);
    }

    // PCM variants
    if codec_lower == "pcm-s16" || codec_lower == "pcm_s16le" {
        return Ok(AVCodecID::PcmS16le);
    }
    if codec_lower == "pcm-f32" || codec_lower == "pcm_f32le" {
        return Ok(AVCodecID::PcmF32le);
    }

    // AC3/E-AC3
    if codec_lower == "ac3" || codec_lower == "ac-3" {
        return Ok(AVCodecID::Ac3);
    }

    // ALAC (Apple Lossless)
    if codec_lower == "alac" {
        return Ok(AVCodecID::Alac);
    }

    Err(Error::new(
        Status::GenericFailure,
        format!("Unsupported audio codec: {}", codec),
    ))
}

/// Decode audio chunk data using FFmpeg
fn decode_audio_chunk_data(
    context: &mut CodecContext,
    data: &[u8],
    timestamp: i64,
) -> Result<Vec<Frame>> {
    // Create a packet and fill it with data
    let mut packet = Packet::new().map_err(|e| {
        Error::new(
            Status::GenericFailure,
            format!("Failed to create packet: {}", e),
        )
    })?;

    // Set packet timestamps
    packet.set_pts(timestamp);
    packet.set_dts(timestamp);

    // Allocate packet data
    unsafe {
        use crate::ffi::avcodec::av_new_packet;

        let ret = av_new_packet(packet.as_mut_ptr(), data.len() as i32);
        if ret < 0 {
            return Err(Error::new(
                Status::GenericFailure,
                format!("Failed to allocate packet data: {}", ret),
            ));
        }

        // Copy data to packet
        let pkt_data = packet.data() as *mut u8;
        std::ptr::copy_nonoverlapping(data.as_ptr(), pkt_data, data.len());
    }

    // Decode
    let frames = context.decode(Some(&packet)).map_err(|e| {
        Error::new(Status::GenericFailure, format!("Decode failed: {}", e))
    })?;

    Ok(frames)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::webcodecs::{EncodedAudioChunkInit, EncodedAudioChunkType};

    fn test_chunk(timestamp: i64, data: Vec<u8>) -> EncodedAudioChunk {
        EncodedAudioChunk::new(EncodedAudioChunkInit {
            chunk_type: EncodedAudioChunkType::Key,
            timestamp,
            duration: None,
            data,
        })
        .unwrap()
    }

    #[tokio::test]
    async fn new_decoder_starts_unconfigured_with_zero_queue_size() {
        let decoder = AudioDecoder::new().unwrap();
        assert_eq!(decoder.state().unwrap(), CodecState::Unconfigured);
        assert_eq!(decoder.decode_queue_size().unwrap(), 0);
    }

    #[tokio::test]
    async fn decode_while_unconfigured_throws_without_closing() {
        let decoder = AudioDecoder::new().unwrap();
        let chunk = test_chunk(0, vec![0u8; 4]);

        let err = decoder.decode(&chunk).unwrap_err();
        assert!(err.reason.contains("InvalidStateError"));
        // A wrong-state call must not transition the instance to Closed.
        assert_eq!(decoder.state().unwrap(), CodecState::Unconfigured);
    }

    #[tokio::test]
    async fn flush_while_unconfigured_throws_without_closing() {
        let decoder = AudioDecoder::new().unwrap();
        let err = decoder.flush().await.unwrap_err();
        assert!(err.reason.contains("InvalidStateError"));
        assert_eq!(decoder.state().unwrap(), CodecState::Unconfigured);
    }

    #[tokio::test]
    async fn configure_on_closed_decoder_throws_invalid_state() {
        let decoder = AudioDecoder::new().unwrap();
        decoder.close().unwrap();
        assert_eq!(decoder.state().unwrap(), CodecState::Closed);

        let config = AudioDecoderConfig {
            codec: Some("opus".to_string()),
            sample_rate: Some(48000.0),
            number_of_channels: Some(2),
            description: None,
        };
        let err = decoder.configure(config).unwrap_err();
        assert!(err.reason.contains("InvalidStateError"));
    }

    #[tokio::test]
    async fn decode_increments_then_decrements_queue_size() {
        let decoder = AudioDecoder::new().unwrap();
        let config = AudioDecoderConfig {
            codec: Some("opus".to_string()),
            sample_rate: Some(48000.0),
            number_of_channels: Some(2),
            description: None,
        };
        decoder.configure(config).unwrap();

        let chunk = test_chunk(0, vec![0u8; 8]);

        decoder.decode(&chunk).unwrap();
        // The step runs asynchronously on the control queue; give it a chance
        // to drain before asserting the counter returned to zero.
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        assert_eq!(decoder.decode_queue_size().unwrap(), 0);
    }

    #[test]
    fn parse_audio_codec_string_recognizes_common_codecs() {
        assert_eq!(parse_audio_codec_string("opus").unwrap(), AVCodecID::Opus);
        assert_eq!(parse_audio_codec_string("mp4a.40.2").unwrap(), AVCodecID::Aac);
        assert_eq!(parse_audio_codec_string("flac").unwrap(), AVCodecID::Flac);
        assert!(parse_audio_codec_string("not-a-codec").is_err());
    }
}

//! AudioEncoder - WebCodecs API implementation
//!
//! Provides audio encoding functionality using FFmpeg.
//! See: https://developer.mozilla.org/en-US/docs/Web/API/AudioEncoder

use crate::codec::{context::get_audio_encoder_name, AudioSampleBuffer, CodecContext, ControlQueue, Resampler};
use crate::ffi::{AVCodecID, AVSampleFormat};
use crate::webcodecs::error::invalid_state_error;
use crate::webcodecs::{AudioData, AudioEncoderConfig, AudioEncoderSupport, EncodedAudioChunk};
use napi::bindgen_prelude::*;
use napi::threadsafe_function::{ThreadsafeFunction, ThreadsafeFunctionCallMode};
use napi_derive::napi;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tracing::Instrument;

use super::video_encoder::CodecState;

/// Type alias for output callback (takes chunk and metadata)
type OutputCallback = ThreadsafeFunction<(EncodedAudioChunk, EncodedAudioChunkMetadata)>;

/// Type alias for error callback (takes error message)
type ErrorCallback = ThreadsafeFunction<String>;

/// Type alias for dequeue callback (fires once per completed encode step)
type DequeueCallback = ThreadsafeFunction<()>;

static NEXT_ENCODER_ID: AtomicU64 = AtomicU64::new(0);

/// Output callback metadata for audio
#[napi(object)]
pub struct EncodedAudioChunkMetadata {
    /// Decoder configuration for this chunk
    pub decoder_config: Option<AudioDecoderConfigOutput>,
}

/// Decoder configuration output (for passing to decoder)
#[napi(object)]
pub struct AudioDecoderConfigOutput {
    /// Codec string
    pub codec: String,
    /// Sample rate
    pub sample_rate: Option<u32>,
    /// Number of channels
    pub number_of_channels: Option<u32>,
    /// Codec description (e.g., AudioSpecificConfig for AAC)
    pub description: Option<Buffer>,
}

/// Encode options for audio
#[napi(object)]
#[derive(Debug, Clone, Default)]
pub struct AudioEncoderEncodeOptions {
    // Currently no options defined in WebCodecs spec for audio
}

/// Internal encoder state
struct AudioEncoderInner {
    id: u64,
    state: CodecState,
    config: Option<AudioEncoderConfig>,
    context: Option<CodecContext>,
    resampler: Option<Resampler>,
    sample_buffer: Option<AudioSampleBuffer>,
    frame_count: u64,
    /// Monotonic output PTS, in microseconds, per §4.F.1. Seeded once from
    /// the first encoded frame's source timestamp; every subsequent frame's
    /// timestamp is derived by advancing this cursor by that frame's sample
    /// count, never by recomputing from the raw `AudioData.timestamp` of
    /// whichever `encode()` call happened to produce it.
    pts_cursor: Option<i64>,
    extradata_sent: bool,
    /// Target sample format for encoder
    target_format: AVSampleFormat,
    /// Queued output chunks
    output_queue: Vec<(EncodedAudioChunk, EncodedAudioChunkMetadata)>,
    /// Optional output callback (WebCodecs spec compliant mode)
    output_callback: Option<OutputCallback>,
    /// Optional error callback (WebCodecs spec compliant mode)
    error_callback: Option<ErrorCallback>,
    /// Optional dequeue callback, fired once per completed encode step
    dequeue_callback: Option<DequeueCallback>,
}

/// AudioEncoder - WebCodecs-compliant audio encoder
///
/// Encodes AudioData objects into EncodedAudioChunk objects using FFmpeg.
/// `encode()`/`flush()` validate state synchronously, then enqueue their
/// backend work onto a per-instance `ControlQueue` (§4.D).
#[napi]
pub struct AudioEncoder {
    inner: Arc<Mutex<AudioEncoderInner>>,
    queue: ControlQueue,
    /// encodeQueueSize: incremented synchronously in `encode()`, decremented
    /// once that step's work has finished.
    encode_queue_size: Arc<AtomicU32>,
}

#[napi]
impl AudioEncoder {
    /// Create a new AudioEncoder (queue-based mode)
    #[napi(constructor)]
    pub fn new() -> Result<Self> {
        let inner = AudioEncoderInner {
            id: NEXT_ENCODER_ID.fetch_add(1, Ordering::Relaxed),
            state: CodecState::Unconfigured,
            config: None,
            context: None,
            resampler: None,
            sample_buffer: None,
            frame_count: 0,
            pts_cursor: None,
            extradata_sent: false,
            target_format: AVSampleFormat::Fltp,
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

    /// Create an AudioEncoder with callbacks (WebCodecs spec compliant mode)
    ///
    /// In this mode, encoded chunks are delivered via the output callback
    /// instead of being queued for retrieval. Errors are reported via the
    /// error callback and the encoder transitions to the Closed state.
    ///
    /// Example:
    /// ```javascript
    /// const encoder = AudioEncoder.withCallbacks(
    ///   (chunk, metadata) => { /* handle output */ },
    ///   (error) => { /* handle error */ }
    /// );
    /// ```
    #[napi(factory)]
    pub fn with_callbacks(
        output: ThreadsafeFunction<(EncodedAudioChunk, EncodedAudioChunkMetadata)>,
        error: ThreadsafeFunction<String>,
    ) -> Result<Self> {
        let inner = AudioEncoderInner {
            id: NEXT_ENCODER_ID.fetch_add(1, Ordering::Relaxed),
            state: CodecState::Unconfigured,
            config: None,
            context: None,
            resampler: None,
            sample_buffer: None,
            frame_count: 0,
            pts_cursor: None,
            extradata_sent: false,
            target_format: AVSampleFormat::Fltp,
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
    /// the `ondequeue` event on the real `AudioEncoder.encodeQueueSize`.
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
    fn report_error(inner: &mut AudioEncoderInner, error_msg: &str) -> bool {
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
    pub fn configure(&self, config: AudioEncoderConfig) -> Result<()> {
        let mut inner = self.inner.lock().map_err(|_| {
            Error::new(Status::GenericFailure, "Lock poisoned")
        })?;

        if inner.state == CodecState::Closed {
            return Err(invalid_state_error("AudioEncoder is closed"));
        }

        // Parse codec string to determine codec ID
        let codec_str = config
            .codec
            .clone()
            .ok_or_else(|| Error::new(Status::InvalidArg, "TypeError: codec is required"))?;
        let codec_id = parse_audio_codec_string(&codec_str)?;

        tracing::debug!(id = inner.id, codec = %codec_str, "audio_encoder.configure");

        // Get encoder name (prefer external libraries for better quality)
        let encoder_name = get_audio_encoder_name(codec_id);

        // Create encoder context
        let mut context = if let Some(name) = encoder_name {
            CodecContext::new_encoder_by_name(name).or_else(|_| CodecContext::new_encoder(codec_id))
        } else {
            CodecContext::new_encoder(codec_id)
        }
        .map_err(|e| {
            Error::new(
                Status::GenericFailure,
                format!("Failed to create encoder: {}", e),
            )
        })?;

        // Determine target sample format based on codec
        let target_format = get_encoder_sample_format(codec_id);

        // Configure encoder
        let sample_rate = config.sample_rate.unwrap_or(48000.0) as u32;
        let channels = config.number_of_channels.unwrap_or(2);
        let bitrate = config.bitrate.unwrap_or(128_000.0) as u64;

        context
            .configure_audio_encoder(sample_rate, channels, target_format, bitrate)
            .map_err(|e| {
                Error::new(
                    Status::GenericFailure,
                    format!("Failed to configure encoder: {}", e),
                )
            })?;

        // Open the encoder
        context.open().map_err(|e| {
            Error::new(
                Status::GenericFailure,
                format!("Failed to open encoder: {}", e),
            )
        })?;

        // Get the actual frame size from the encoder
        let frame_size = context.frame_size();
        let frame_size = if frame_size == 0 {
            // Some encoders don't set frame_size, use codec default
            AudioSampleBuffer::frame_size_for_codec(&codec_str)
        } else {
            frame_size as usize
        };

        // Create sample buffer
        let sample_buffer = AudioSampleBuffer::new(frame_size, channels, sample_rate, target_format);

        inner.context = Some(context);
        inner.config = Some(config);
        inner.sample_buffer = Some(sample_buffer);
        inner.target_format = target_format;
        inner.state = CodecState::Configured;
        inner.extradata_sent = false;
        inner.frame_count = 0;
        inner.pts_cursor = None;
        inner.resampler = None;
        inner.output_queue.clear();

        Ok(())
    }

    /// Encode audio data.
    ///
    /// Synchronously validates state, then enqueues the actual FFmpeg encode
    /// as a control-message step (§4.D) so it runs strictly after any
    /// previously enqueued encode/flush step for this instance.
    #[napi]
    pub fn encode(&self, data: &AudioData) -> Result<()> {
        let state = {
            let inner = self.inner.lock().map_err(|_| {
                Error::new(Status::GenericFailure, "Lock poisoned")
            })?;
            inner.state
        };

        if state != CodecState::Configured {
            return Err(invalid_state_error("AudioEncoder is not configured"));
        }

        // Snapshot everything we need from the AudioData synchronously,
        // since the step itself runs later on the control queue.
        let src_format = data
            .format()?
            .ok_or_else(|| Error::new(Status::GenericFailure, "AudioData has no format"))?;
        let src_sample_rate = data.sample_rate()? as u32;
        let src_channels = data.number_of_channels()?;
        let timestamp = data.timestamp()?;
        let frame = data
            .with_frame(|f| f.try_clone())?
            .map_err(|e| Error::new(Status::GenericFailure, format!("Failed to clone frame: {}", e)))?;

        self.encode_queue_size.fetch_add(1, Ordering::SeqCst);
        let inner_arc = self.inner.clone();
        let queue_size = self.encode_queue_size.clone();

        let step_id = {
            let inner = self.inner.lock().map_err(|_| {
                Error::new(Status::GenericFailure, "Lock poisoned")
            })?;
            inner.id
        };
        let span = tracing::debug_span!("control_step", codec = "audio_encoder", id = step_id, op = "encode");

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
                    let result = Self::encode_one(&mut inner, frame, src_format.to_av_format(), src_sample_rate, src_channels, timestamp);
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

    /// Resample if needed, buffer, and drain every full frame through the
    /// encoder. Runs inside the enqueued control-message step.
    fn encode_one(
        inner: &mut AudioEncoderInner,
        frame: crate::codec::Frame,
        src_format: AVSampleFormat,
        src_sample_rate: u32,
        src_channels: u32,
        timestamp: i64,
    ) -> Result<()> {
        let (target_sample_rate, target_channels, codec_string) = match inner.config.as_ref() {
            Some(config) => (
                config.sample_rate.unwrap_or(48000.0) as u32,
                config.number_of_channels.unwrap_or(2),
                config.codec.clone().unwrap_or_default(),
            ),
            None => return Err(Error::new(Status::GenericFailure, "No encoder config")),
        };

        let needs_resampling =
            src_sample_rate != target_sample_rate || src_channels != target_channels || src_format != inner.target_format;

        // Detect drift against the resampler already in place, draining its
        // tail before swapping it out for one matching the new source shape.
        let drifted = match inner.resampler.as_ref() {
            Some(r) => r.src_channels() != src_channels || r.src_sample_rate() != src_sample_rate || r.src_format() != src_format,
            None => false,
        };

        if drifted {
            if let Some(mut old) = inner.resampler.take() {
                tracing::debug!(
                    id = inner.id,
                    src_channels,
                    src_sample_rate,
                    "audio_encoder.resampler rebuild: incoming AudioData source changed"
                );
                let target_channels_n = old.dst_channels();
                let target_sample_rate_n = old.dst_sample_rate();
                let target_format_n = old.dst_format();
                if let Ok(mut tail) = crate::codec::Frame::new_audio(1024, target_channels_n, target_sample_rate_n, target_format_n) {
                    if let Ok(drained) = old.flush(&mut tail) {
                        if drained > 0 {
                            if let Some(ref mut sample_buffer) = inner.sample_buffer {
                                if let Err(e) = sample_buffer.add_frame(&tail) {
                                    tracing::warn!(id = inner.id, error = %e, "audio_encoder.resampler: failed to buffer drained tail");
                                }
                            }
                        }
                    }
                }
            }
        }

        // Create resampler if needed and not already created
        if needs_resampling && inner.resampler.is_none() {
            let resampler = Resampler::new(
                src_channels,
                src_sample_rate,
                src_format,
                target_channels,
                target_sample_rate,
                inner.target_format,
            )
            .map_err(|e| Error::new(Status::GenericFailure, format!("Failed to create resampler: {}", e)))?;
            inner.resampler = Some(resampler);
        } else if !needs_resampling {
            inner.resampler = None;
        }

        // Resample if needed
        let frame_to_add = if let Some(ref mut resampler) = inner.resampler {
            resampler
                .convert_alloc(&frame)
                .map_err(|e| Error::new(Status::GenericFailure, format!("Resampling failed: {}", e)))?
        } else {
            frame
        };

        // Add frame to sample buffer
        {
            let sample_buffer = inner
                .sample_buffer
                .as_mut()
                .ok_or_else(|| Error::new(Status::GenericFailure, "No sample buffer"))?;

            sample_buffer
                .add_frame(&frame_to_add)
                .map_err(|e| Error::new(Status::GenericFailure, format!("Failed to add samples: {}", e)))?;
        }

        // Get extradata before encoding first frame
        let extradata = if !inner.extradata_sent {
            inner.context.as_ref().and_then(|ctx| ctx.extradata().map(|d| d.to_vec()))
        } else {
            None
        };

        // Process complete frames
        loop {
            let (has_frame, frame_size, sample_rate) = match inner.sample_buffer.as_ref() {
                Some(buf) => (buf.has_full_frame(), buf.frame_size() as i64, buf.sample_rate() as i64),
                None => return Err(Error::new(Status::GenericFailure, "No sample buffer")),
            };

            if !has_frame {
                break;
            }

            let mut frame_to_encode = {
                let sample_buffer = inner
                    .sample_buffer
                    .as_mut()
                    .ok_or_else(|| Error::new(Status::GenericFailure, "No sample buffer"))?;
                sample_buffer
                    .take_frame()
                    .map_err(|e| Error::new(Status::GenericFailure, format!("Failed to get frame: {}", e)))?
                    .ok_or_else(|| Error::new(Status::GenericFailure, "No frame available"))?
            };

            // §4.F.1: seed the cursor from the first frame's source
            // timestamp, then advance it monotonically by this frame's
            // sample duration. Never recompute from a later call's raw
            // `timestamp` argument.
            let frame_timestamp = inner.pts_cursor.unwrap_or(timestamp);
            frame_to_encode.set_pts(frame_timestamp);
            inner.pts_cursor = Some(frame_timestamp + (frame_size * 1_000_000) / sample_rate);

            let context = inner
                .context
                .as_mut()
                .ok_or_else(|| Error::new(Status::GenericFailure, "No encoder context"))?;

            let packets = context
                .encode(Some(&frame_to_encode))
                .map_err(|e| Error::new(Status::GenericFailure, format!("Encode failed: {}", e)))?;

            inner.frame_count += 1;

            let duration_us = (frame_size * 1_000_000) / sample_rate;

            for packet in packets {
                let chunk = EncodedAudioChunk::from_packet(&packet, Some(duration_us), Some(frame_timestamp));

                let metadata = if !inner.extradata_sent {
                    inner.extradata_sent = true;

                    EncodedAudioChunkMetadata {
                        decoder_config: Some(AudioDecoderConfigOutput {
                            codec: codec_string.clone(),
                            sample_rate: Some(target_sample_rate),
                            number_of_channels: Some(target_channels),
                            description: extradata.clone().map(Buffer::from),
                        }),
                    }
                } else {
                    EncodedAudioChunkMetadata {
                        decoder_config: None,
                    }
                };

                if let Some(ref callback) = inner.output_callback {
                    callback.call(Ok((chunk, metadata)), ThreadsafeFunctionCallMode::NonBlocking);
                } else {
                    inner.output_queue.push((chunk, metadata));
                }
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
            return Err(invalid_state_error("AudioEncoder is not configured"));
        }

        let inner_arc = self.inner.clone();
        let (tx, rx) = tokio::sync::oneshot::channel();

        let step_id = {
            let inner = self.inner.lock().map_err(|_| {
                Error::new(Status::GenericFailure, "Lock poisoned")
            })?;
            inner.id
        };
        let span = tracing::debug_span!("control_step", codec = "audio_encoder", id = step_id, op = "flush");

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
                    if let Err(e) = Self::flush_one(&mut inner) {
                        Self::report_error(&mut inner, &e.reason);
                    }
                }

                let _ = tx.send(());
            }
            .instrument(span)
        });

        let _ = rx.await;
        Ok(())
    }

    /// Drain the sample buffer's residual partial frame (if any) and the
    /// encoder's own internal delay line. Runs inside the enqueued step.
    fn flush_one(inner: &mut AudioEncoderInner) -> Result<()> {
        // Flush any remaining samples in buffer
        if let Some(ref mut sample_buffer) = inner.sample_buffer {
            if let Ok(Some(mut frame)) = sample_buffer.flush() {
                let sample_rate = sample_buffer.sample_rate() as i64;
                let frame_timestamp = inner.pts_cursor.unwrap_or(0);
                frame.set_pts(frame_timestamp);
                let nb_samples = frame.nb_samples() as i64;
                inner.pts_cursor = Some(frame_timestamp + (nb_samples * 1_000_000) / sample_rate);

                let context = inner
                    .context
                    .as_mut()
                    .ok_or_else(|| Error::new(Status::GenericFailure, "No encoder context"))?;

                if let Ok(packets) = context.encode(Some(&frame)) {
                    let duration_us = (nb_samples * 1_000_000) / sample_rate;
                    for packet in packets {
                        let chunk = EncodedAudioChunk::from_packet(&packet, Some(duration_us), Some(frame_timestamp));
                        let metadata = EncodedAudioChunkMetadata {
                            decoder_config: None,
                        };
                        if let Some(ref callback) = inner.output_callback {
                            callback.call(Ok((chunk, metadata)), ThreadsafeFunctionCallMode::NonBlocking);
                        } else {
                            inner.output_queue.push((chunk, metadata));
                        }
                    }
                }
            }
        }

        // Flush encoder's internal delay line
        let context = inner
            .context
            .as_mut()
            .ok_or_else(|| Error::new(Status::GenericFailure, "No encoder context"))?;

        let packets = context
            .flush_encoder()
            .map_err(|e| Error::new(Status::GenericFailure, format!("Flush failed: {}", e)))?;

        for packet in packets {
            let chunk = EncodedAudioChunk::from_packet(&packet, None, None);
            let metadata = EncodedAudioChunkMetadata {
                decoder_config: None,
            };
            if let Some(ref callback) = inner.output_callback {
                callback.call(Ok((chunk, metadata)), ThreadsafeFunctionCallMode::NonBlocking);
            } else {
                inner.output_queue.push((chunk, metadata));
            }
        }

        Ok(())
    }

    /// Take all encoded chunks from the output queue
    #[napi]
    pub fn take_encoded_chunks(&self) -> Result<Vec<EncodedAudioChunk>> {
        let mut inner = self.inner.lock().map_err(|_| {
            Error::new(Status::GenericFailure, "Lock poisoned")
        })?;

        let chunks: Vec<EncodedAudioChunk> = inner
            .output_queue
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
    pub fn take_next_chunk(&self) -> Result<Option<EncodedAudioChunk>> {
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
            return Err(invalid_state_error("AudioEncoder is closed"));
        }

        // Drop existing context
        inner.context = None;
        inner.resampler = None;
        inner.sample_buffer = None;
        inner.config = None;
        inner.state = CodecState::Unconfigured;
        inner.frame_count = 0;
        inner.pts_cursor = None;
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
        inner.resampler = None;
        inner.sample_buffer = None;
        inner.config = None;
        inner.state = CodecState::Closed;
        inner.output_queue.clear();

        Ok(())
    }

    /// Check if a configuration is supported
    /// Returns a Promise that resolves with support information
    #[napi]
    pub async fn is_config_supported(config: AudioEncoderConfig) -> Result<AudioEncoderSupport> {
        // Parse codec string
        let codec_id = match config.codec.as_deref().map(parse_audio_codec_string) {
            Some(Ok(id)) => id,
            _ => {
                return Ok(AudioEncoderSupport {
                    supported: false,
                    config,
                });
            }
        };

        // Try to find encoder
        let encoder_name = get_audio_encoder_name(codec_id);
        let result = if let Some(name) = encoder_name {
            CodecContext::new_encoder_by_name(name).or_else(|_| CodecContext::new_encoder(codec_id))
        } else {
            CodecContext::new_encoder(codec_id)
        };

        Ok(AudioEncoderSupport {
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

/// Get the preferred sample format for an encoder
fn get_encoder_sample_format(codec_id: AVCodecID) -> AVSampleFormat {
    match codec_id {
        AVCodecID::Aac => AVSampleFormat::Fltp,  // AAC prefers float planar
        AVCodecID::Opus => AVSampleFormat::Flt,  // Opus prefers float interleaved
        AVCodecID::Mp3 => AVSampleFormat::S16p,  // MP3 prefers s16 planar
        AVCodecID::Flac => AVSampleFormat::S16,  // FLAC prefers s16
        AVCodecID::Vorbis => AVSampleFormat::Fltp, // Vorbis prefers float planar
        AVCodecID::PcmS16le => AVSampleFormat::S16,
        AVCodecID::PcmS16be => AVSampleFormat::S16,
        AVCodecID::PcmF32le => AVSampleFormat::Flt,
        AVCodecID::PcmF32be => AVSampleFormat::Flt,
        AVCodecID::Ac3 => AVSampleFormat::Fltp,
        AVCodecID::Alac => AVSampleFormat::S16p,
        _ => AVSampleFormat::Fltp, // Default to float planar
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn new_encoder_starts_unconfigured_with_zero_queue_size() {
        let encoder = AudioEncoder::new().unwrap();
        assert_eq!(encoder.state().unwrap(), CodecState::Unconfigured);
        assert_eq!(encoder.encode_queue_size().unwrap(), 0);
    }

    #[tokio::test]
    async fn flush_while_unconfigured_throws_without_closing() {
        let encoder = AudioEncoder::new().unwrap();
        let err = encoder.flush().await.unwrap_err();
        assert!(err.reason.contains("InvalidStateError"));
        assert_eq!(encoder.state().unwrap(), CodecState::Unconfigured);
    }

    #[tokio::test]
    async fn configure_on_closed_encoder_throws_invalid_state() {
        let encoder = AudioEncoder::new().unwrap();
        encoder.close().unwrap();
        assert_eq!(encoder.state().unwrap(), CodecState::Closed);

        let config = AudioEncoderConfig {
            codec: Some("opus".to_string()),
            sample_rate: Some(48000.0),
            number_of_channels: Some(2),
            bitrate: None,
            bitrate_mode: None,
            opus: None,
            aac: None,
            flac: None,
        };

        let err = encoder.configure(config).unwrap_err();
        assert!(err.reason.contains("InvalidStateError"));
    }

    #[test]
    fn parse_audio_codec_string_recognizes_common_codecs() {
        assert_eq!(parse_audio_codec_string("opus").unwrap(), AVCodecID::Opus);
        assert_eq!(parse_audio_codec_string("mp4a.40.2").unwrap(), AVCodecID::Aac);
        assert!(parse_audio_codec_string("not-a-codec").is_err());
    }

    #[test]
    fn pts_cursor_starts_unset_and_seeds_from_first_frame() {
        let inner_cursor: Option<i64> = None;
        assert_eq!(inner_cursor.unwrap_or(12345), 12345);
    }
}

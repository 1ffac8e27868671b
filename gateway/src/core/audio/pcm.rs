use std::io;
use std::time::Duration;

use bytes::{BufMut, Bytes, BytesMut};
use futures::{Stream, StreamExt};
use tokio::sync::mpsc;
use tracing::{debug, error, warn};

use crate::core::engine::AudioChunkStream;
use crate::core::synthesis::JobContext;

/// Multiplier from the [-1.0, 1.0] float range to the signed 16-bit range.
pub const PCM16_SCALE: f32 = 32768.0;

/// Convert one float sample to signed 16-bit PCM.
///
/// Truncates toward zero; out-of-range input saturates at the i16 bounds.
#[inline]
pub fn sample_to_i16(sample: f32) -> i16 {
    (sample * PCM16_SCALE) as i16
}

/// Encode samples as little-endian signed 16-bit PCM.
pub fn encode_pcm16_le(samples: &[f32]) -> Bytes {
    let mut buf = BytesMut::with_capacity(samples.len() * 2);
    for &sample in samples {
        buf.put_i16_le(sample_to_i16(sample));
    }
    buf.freeze()
}

/// Render an engine chunk stream as an open-ended stream of PCM frames.
///
/// Chunks are pulled by a detached task and pushed through a bounded channel of
/// `buffer` frames, so a slow client applies backpressure to the engine. Once the
/// receiving side is gone (client disconnected, body dropped) the task stops
/// pulling chunks and drops the engine stream.
///
/// A client that stays connected but stops reading is given `stall_timeout` to
/// make room for the next frame. After that the engine stream is dropped, which
/// frees the engine for other jobs, and the body ends with an error.
///
/// An engine failure mid-stream is logged and surfaced as a body error, which
/// aborts the chunked response.
pub fn stream_pcm(
    chunks: AudioChunkStream,
    buffer: usize,
    stall_timeout: Duration,
    context: JobContext,
) -> impl Stream<Item = Result<Bytes, io::Error>> + Send + 'static {
    let (tx, mut rx) = mpsc::channel::<Result<Bytes, io::Error>>(buffer.max(1));

    tokio::spawn(async move {
        let mut chunks = chunks;
        let mut frames = 0usize;
        let mut samples = 0usize;

        loop {
            if tx.is_closed() {
                debug!(%context, frames, "Client disconnected, stopping synthesis");
                break;
            }

            let Some(item) = chunks.next().await else {
                debug!(%context, frames, samples, "PCM stream complete");
                break;
            };

            match item {
                Ok(chunk) => {
                    samples += chunk.len();
                    frames += 1;
                    let frame = encode_pcm16_le(chunk.samples());
                    match tokio::time::timeout(stall_timeout, tx.send(Ok(frame))).await {
                        Ok(Ok(())) => {}
                        Ok(Err(_)) => {
                            debug!(%context, frames, "Client disconnected, stopping synthesis");
                            break;
                        }
                        Err(_) => {
                            warn!(
                                %context,
                                frames,
                                stall_ms = stall_timeout.as_millis() as u64,
                                "Client stopped reading, releasing engine"
                            );
                            drop(chunks);
                            let _ = tx
                                .send(Err(io::Error::new(
                                    io::ErrorKind::TimedOut,
                                    "client stopped reading the audio stream",
                                )))
                                .await;
                            return;
                        }
                    }
                }
                Err(e) => {
                    error!(%context, error = %e, "Synthesis failed while streaming");
                    drop(chunks);
                    let _ = tx
                        .send(Err(io::Error::other("speech synthesis failed")))
                        .await;
                    return;
                }
            }
        }
    });

    async_stream::stream! {
        while let Some(frame) = rx.recv().await {
            yield frame;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::engine::{AudioChunk, EngineError};
    use crate::core::synthesis::SynthesisMode;

    const STALL: Duration = Duration::from_secs(5);

    fn context() -> JobContext {
        JobContext::new(SynthesisMode::Speaker)
    }

    #[test]
    fn test_sample_to_i16_truncates() {
        assert_eq!(sample_to_i16(0.5), 16384);
        assert_eq!(sample_to_i16(-1.0), -32768);
        assert_eq!(sample_to_i16(0.0), 0);
        // 0.00003 * 32768 = 0.983..., truncated rather than rounded
        assert_eq!(sample_to_i16(0.00003), 0);
        assert_eq!(sample_to_i16(-0.00003), 0);
        assert_eq!(sample_to_i16(0.25), 8192);
    }

    #[test]
    fn test_sample_to_i16_saturates() {
        assert_eq!(sample_to_i16(1.0), i16::MAX);
        assert_eq!(sample_to_i16(1.5), i16::MAX);
        assert_eq!(sample_to_i16(-2.0), i16::MIN);
        assert_eq!(sample_to_i16(f32::NAN), 0);
    }

    #[test]
    fn test_encode_pcm16_le_layout() {
        let bytes = encode_pcm16_le(&[0.5, -1.0, 0.0]);
        assert_eq!(bytes.len(), 6);
        assert_eq!(&bytes[..], &[0x00, 0x40, 0x00, 0x80, 0x00, 0x00]);
    }

    #[tokio::test]
    async fn test_stream_pcm_emits_one_frame_per_chunk() {
        let chunks: AudioChunkStream = Box::pin(futures::stream::iter(vec![
            Ok(AudioChunk::new(vec![0.5; 10])),
            Ok(AudioChunk::new(vec![-0.5; 3])),
        ]));

        let frames: Vec<_> = stream_pcm(chunks, 2, STALL, context()).collect().await;
        assert_eq!(frames.len(), 2);
        let lengths: Vec<usize> = frames
            .into_iter()
            .map(|f| f.expect("frame should be ok").len())
            .collect();
        assert_eq!(lengths, vec![20, 6]);
    }

    #[tokio::test]
    async fn test_stream_pcm_surfaces_engine_error() {
        let chunks: AudioChunkStream = Box::pin(futures::stream::iter(vec![
            Ok(AudioChunk::new(vec![0.1; 4])),
            Err(EngineError::Synthesis("boom".to_string())),
            Ok(AudioChunk::new(vec![0.1; 4])),
        ]));

        let frames: Vec<_> = stream_pcm(chunks, 4, STALL, context()).collect().await;
        assert_eq!(frames.len(), 2);
        assert!(frames[0].is_ok());
        let err = frames[1].as_ref().unwrap_err();
        // Engine internals stay server-side
        assert!(!err.to_string().contains("boom"));
    }

    #[tokio::test]
    async fn test_stream_pcm_stops_when_consumer_drops() {
        use std::sync::Arc;
        use std::sync::atomic::{AtomicUsize, Ordering};

        let pulled = Arc::new(AtomicUsize::new(0));
        let counter = pulled.clone();
        let chunks: AudioChunkStream = Box::pin(futures::stream::iter(0..10_000).map(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(AudioChunk::new(vec![0.0; 16]))
        }));

        let mut stream = Box::pin(stream_pcm(chunks, 1, STALL, context()));
        let first = stream.next().await;
        assert!(first.is_some());
        drop(stream);

        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        assert!(pulled.load(Ordering::SeqCst) < 10_000);
    }

    #[tokio::test]
    async fn test_stream_pcm_releases_engine_when_consumer_stalls() {
        use std::sync::Arc;

        let engine_token = Arc::new(());
        let held = engine_token.clone();
        let chunks: AudioChunkStream = Box::pin(futures::stream::repeat_with(move || {
            let _token = Arc::clone(&held);
            Ok(AudioChunk::new(vec![0.1; 16]))
        }));

        // Nothing reads from the body after the first frame
        let mut stream = Box::pin(stream_pcm(
            chunks,
            1,
            Duration::from_millis(50),
            context(),
        ));
        assert!(stream.next().await.is_some());

        let released = tokio::time::timeout(Duration::from_secs(5), async {
            while Arc::strong_count(&engine_token) > 1 {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await;
        assert!(released.is_ok(), "engine stream was kept by a stalled consumer");

        // The buffered frame drains, then the body ends in an error
        let mut frames = Vec::new();
        while let Some(frame) = stream.next().await {
            frames.push(frame);
        }
        let last = frames.pop().expect("at least the error frame");
        assert_eq!(last.unwrap_err().kind(), io::ErrorKind::TimedOut);
        assert!(frames.iter().all(Result::is_ok));
    }
}

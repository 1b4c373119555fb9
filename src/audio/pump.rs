//! Dedicated worker thread feeding a playback stream.
//!
//! A [`RateStream`] is single-owner by design; the pump is the one place
//! that owns it while audio flows. Producers hand interleaved client-domain
//! chunks to [`StreamPump::feed`] over a bounded channel, the worker drives
//! [`RateStream::write_frames`] until each chunk is fully converted, and
//! [`StreamPump::finish`] joins the worker and hands the stream back.

use std::thread;
use std::time::Duration;

use flume::{Receiver, Sender};
use tracing::{Level, debug, span};

use crate::audio::constants::{PUMP_IDLE_MS, PUMP_QUEUE_CHUNKS};
use crate::audio::stream::{RateStream, StreamDirection};
use crate::audio::transfer::Transport;
use crate::common::errors::{RateError, RateResult};

/// Totals from a finished pump worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PumpReport {
    pub chunks: usize,
    pub client_frames: usize,
}

/// Feed handle for a stream running on its own thread.
pub struct StreamPump<T> {
    chunk_tx: Sender<Vec<u8>>,
    worker: thread::JoinHandle<(RateResult<PumpReport>, RateStream<T>)>,
}

impl<T: Transport + Send + 'static> StreamPump<T> {
    /// Move a configured playback stream onto its own worker thread.
    pub fn spawn(mut stream: RateStream<T>) -> RateResult<Self> {
        if stream.direction() != StreamDirection::Playback {
            return Err(RateError::DirectionMismatch);
        }
        let params = stream.client_params().ok_or(RateError::NotConfigured)?;
        let frame_bytes = params.format.width() * params.channels;

        let (chunk_tx, chunk_rx): (Sender<Vec<u8>>, Receiver<Vec<u8>>) =
            flume::bounded(PUMP_QUEUE_CHUNKS);
        let name = match stream.name() {
            Some(name) => format!("pump-{name}"),
            None => "pump".into(),
        };
        let worker = thread::Builder::new().name(name).spawn(move || {
            let _span = span!(Level::DEBUG, "stream_pump").entered();
            let mut report = PumpReport::default();
            let mut failure = None;

            'chunks: while let Ok(chunk) = chunk_rx.recv() {
                debug_assert_eq!(
                    chunk.len() % frame_bytes,
                    0,
                    "chunk does not hold whole frames"
                );
                let frames = chunk.len() / frame_bytes;
                let mut done = 0;
                while done < frames {
                    match stream.write_frames(&chunk, done, frames - done) {
                        // slave side full: wait for it to drain
                        Ok(0) => thread::sleep(Duration::from_millis(PUMP_IDLE_MS)),
                        Ok(written) => done += written,
                        Err(err) => {
                            failure = Some(err);
                            break 'chunks;
                        }
                    }
                }
                report.chunks += 1;
                report.client_frames += done;
            }

            debug!(
                "pump finished: {} chunks, {} client frames",
                report.chunks, report.client_frames
            );
            match failure {
                Some(err) => (Err(err), stream),
                None => (Ok(report), stream),
            }
        })?;

        Ok(Self { chunk_tx, worker })
    }

    /// Queue one chunk of whole interleaved client frames. Blocks while the
    /// queue is full; returns `false` once the worker is gone.
    pub fn feed(&self, chunk: Vec<u8>) -> bool {
        self.chunk_tx.send(chunk).is_ok()
    }

    /// Close the feed, wait for the worker to drain its queue and get the
    /// stream back alongside the totals.
    pub fn finish(self) -> (RateResult<PumpReport>, RateStream<T>) {
        drop(self.chunk_tx);
        match self.worker.join() {
            Ok(outcome) => outcome,
            Err(panic) => std::panic::resume_unwind(panic),
        }
    }
}

/*
[INPUT]:  Raw text frames from the socket task
[OUTPUT]: Ordered frames for the dispatch loop
[POS]:    WebSocket layer - bounded FIFO decoupling receipt from processing
[UPDATE]: When changing the backpressure policy or frame metadata
*/

use crate::error::{KucoinError, Result};
use std::time::Instant;
use tokio::sync::mpsc;

/// One raw inbound frame with its enqueue timestamp
#[derive(Debug)]
pub struct InboundFrame {
    pub payload: String,
    pub received_at: Instant,
}

/// Create a bounded frame queue.
///
/// This is the single backpressure point between network I/O and message
/// processing. Policy: the producer awaits capacity (block), frames are
/// never dropped and the buffer never grows past `capacity`.
pub(crate) fn frame_queue(capacity: usize) -> (FrameSender, FrameReceiver) {
    let (tx, rx) = mpsc::channel(capacity);
    (FrameSender { tx }, FrameReceiver { rx })
}

/// Producer half, owned by the socket task
#[derive(Debug, Clone)]
pub(crate) struct FrameSender {
    tx: mpsc::Sender<InboundFrame>,
}

impl FrameSender {
    /// Enqueue one frame, waiting for capacity if the queue is full.
    ///
    /// Fails only when the consumer side has been dropped.
    pub async fn push(&self, payload: String) -> Result<()> {
        let frame = InboundFrame { payload, received_at: Instant::now() };
        self.tx.send(frame).await.map_err(|_| KucoinError::QueueClosed)
    }
}

/// Consumer half, owned by the dispatch loop
#[derive(Debug)]
pub(crate) struct FrameReceiver {
    rx: mpsc::Receiver<InboundFrame>,
}

impl FrameReceiver {
    /// Pop the next frame in FIFO order.
    ///
    /// After the producer is dropped, remaining frames drain first and then
    /// `None` signals end-of-stream; no spurious errors.
    pub async fn pop(&mut self) -> Option<InboundFrame> {
        self.rx.recv().await
    }
}

//! Per-instance control-message queue
//!
//! Every codec-facing class (`VideoDecoder`, `VideoEncoder`, `AudioDecoder`,
//! `AudioEncoder`) funnels its `decode`/`encode`/`flush` calls through one of
//! these queues. The WebCodecs spec requires that control messages execute in
//! the order they were enqueued and that processing one message (including
//! invoking `output`/`error` callbacks) never runs concurrently with another
//! message from the same instance, even though the public methods themselves
//! return immediately. `configure`/`reset`/`close` are synchronous per the
//! real WebCodecs API (they don't return a Promise) and run inline rather
//! than through this queue.
//!
//! A queue is a single `tokio::spawn`ed task reading an unbounded MPSC channel
//! of boxed steps. Enqueuing never blocks the caller; the task drains the
//! channel strictly in order, awaiting each step (which may itself wrap a
//! blocking FFmpeg call in `tokio::task::spawn_blocking`) before moving to the
//! next. Dropping the `ControlQueue` drops the sender, which ends the task
//! once anything still in flight finishes draining.

use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::sync::mpsc;

type Step = Box<dyn FnOnce() -> Pin<Box<dyn Future<Output = ()> + Send>> + Send>;

/// FIFO control-message queue for one codec instance.
///
/// Cloning shares the same underlying worker task and channel; all clones
/// enqueue onto the same ordered stream.
#[derive(Clone)]
pub struct ControlQueue {
  sender: mpsc::UnboundedSender<Step>,
  pending: Arc<AtomicUsize>,
}

impl ControlQueue {
  /// Spawn the worker task and return a handle to it.
  pub fn spawn() -> Self {
    let (sender, mut receiver) = mpsc::unbounded_channel::<Step>();
    let pending = Arc::new(AtomicUsize::new(0));
    let pending_worker = pending.clone();

    tokio::spawn(async move {
      while let Some(step) = receiver.recv().await {
        step().await;
        pending_worker.fetch_sub(1, Ordering::SeqCst);
      }
    });

    Self { sender, pending }
  }

  /// Enqueue a unit of work. The future it returns runs strictly after every
  /// previously enqueued step has completed, and strictly before any step
  /// enqueued afterward.
  ///
  /// Silently dropped if the worker task has already shut down (the instance
  /// is being torn down); callers that enqueue a close step should not expect
  /// it to run in that case, since close has effectively already happened.
  pub fn enqueue<F, Fut>(&self, step: F)
  where
    F: FnOnce() -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send + 'static,
  {
    self.pending.fetch_add(1, Ordering::SeqCst);
    let boxed: Step = Box::new(move || Box::pin(step()));
    if self.sender.send(boxed).is_err() {
      self.pending.fetch_sub(1, Ordering::SeqCst);
    }
  }

  /// Number of steps enqueued but not yet finished running. Diagnostic only:
  /// `decodeQueueSize`/`encodeQueueSize` are tracked by a dedicated counter
  /// per codec instance instead, since those must count only decode/encode
  /// steps and never configure/reset/close steps that also run on this queue.
  pub fn depth(&self) -> usize {
    self.pending.load(Ordering::SeqCst)
  }
}

impl std::fmt::Debug for ControlQueue {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("ControlQueue")
      .field("depth", &self.depth())
      .finish()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::time::Duration;

  #[tokio::test]
  async fn steps_run_in_order() {
    let queue = ControlQueue::spawn();
    let order = Arc::new(tokio::sync::Mutex::new(Vec::new()));

    for i in 0..5 {
      let order = order.clone();
      queue.enqueue(move || async move {
        order.lock().await.push(i);
      });
    }

    // give the worker task a chance to drain
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(*order.lock().await, vec![0, 1, 2, 3, 4]);
  }

  #[tokio::test]
  async fn depth_tracks_pending_steps() {
    let queue = ControlQueue::spawn();
    assert_eq!(queue.depth(), 0);

    let gate = Arc::new(tokio::sync::Notify::new());
    let gate_clone = gate.clone();
    queue.enqueue(move || async move {
      gate_clone.notified().await;
    });
    queue.enqueue(|| async move {});

    tokio::time::sleep(Duration::from_millis(10)).await;
    assert_eq!(queue.depth(), 2);

    gate.notify_one();
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(queue.depth(), 0);
  }
}

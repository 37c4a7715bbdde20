//! Marshals terminal callbacks from worker threads onto the consumer's thread.
//!
//! Workers only ever enqueue closures; the consumer runs them when it drains
//! its [`CallbackQueue`], so callback bodies never race with each other or with
//! the consumer's own state mutation.

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

/// A unit of work to run against the consumer's state.
pub type Callback<V> = Box<dyn FnOnce(&mut V) + Send>;

/// Sending half, cloned into every worker.
pub struct Dispatcher<V> {
    tx: UnboundedSender<Callback<V>>,
}

impl<V> Clone for Dispatcher<V> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
        }
    }
}

impl<V: 'static> Dispatcher<V> {
    /// Enqueues `callback`. Returns `false` when the consumer is gone.
    pub fn dispatch<F>(&self, callback: F) -> bool
    where
        F: FnOnce(&mut V) + Send + 'static,
    {
        self.tx.send(Box::new(callback)).is_ok()
    }
}

/// Receiving half, owned by the consumer's thread.
pub struct CallbackQueue<V> {
    rx: UnboundedReceiver<Callback<V>>,
}

impl<V> CallbackQueue<V> {
    /// Runs every callback already queued, in order, without blocking.
    pub fn drain(&mut self, target: &mut V) -> usize {
        let mut delivered = 0;
        while let Ok(callback) = self.rx.try_recv() {
            callback(target);
            delivered += 1;
        }
        delivered
    }

    /// Waits for the next callback. `None` once every dispatcher is dropped.
    pub async fn recv(&mut self) -> Option<Callback<V>> {
        self.rx.recv().await
    }
}

/// Creates a connected dispatcher / queue pair.
pub fn callback_channel<V>() -> (Dispatcher<V>, CallbackQueue<V>) {
    // Unbounded so a worker never blocks on a slow consumer.
    let (tx, rx) = mpsc::unbounded_channel();
    (Dispatcher { tx }, CallbackQueue { rx })
}

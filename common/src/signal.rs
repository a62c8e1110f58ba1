use std::future::poll_fn;
use std::task::Poll;

use tokio::signal::unix::{Signal, SignalKind};

/// Fans multiple unix signals into a single `recv` call.
pub struct SignalHandler {
    signals: Vec<(SignalKind, Signal)>,
}

impl Default for SignalHandler {
    fn default() -> Self {
        Self {
            signals: Vec::new(),
        }
    }
}

impl SignalHandler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_signal(mut self, kind: SignalKind) -> Self {
        let signal = tokio::signal::unix::signal(kind).expect("failed to create signal");
        self.signals.push((kind, signal));
        self
    }

    /// Resolves with the first registered signal that fires. Pending
    /// forever when no signals are registered.
    pub async fn recv(&mut self) -> SignalKind {
        poll_fn(|cx| {
            for (kind, signal) in &mut self.signals {
                if signal.poll_recv(cx).is_ready() {
                    return Poll::Ready(*kind);
                }
            }

            Poll::Pending
        })
        .await
    }
}

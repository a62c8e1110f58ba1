use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// A cancellation context handed to long-running tasks. Tasks hold a clone
/// and await `done()`; the owning `Handler` cancels them all and then waits
/// until every clone has been dropped.
#[derive(Clone)]
pub struct Context {
    token: CancellationToken,
    _alive: mpsc::Sender<()>,
}

pub struct Handler {
    token: CancellationToken,
    alive: mpsc::Receiver<()>,
}

impl Context {
    #[must_use]
    pub fn new() -> (Self, Handler) {
        let token = CancellationToken::new();
        // The channel is never sent on. Receiving `None` on the handler side
        // means every Context clone has been dropped.
        let (alive_tx, alive_rx) = mpsc::channel(1);

        (
            Self {
                token: token.clone(),
                _alive: alive_tx,
            },
            Handler {
                token,
                alive: alive_rx,
            },
        )
    }

    /// Resolves once the handler has requested shutdown.
    pub async fn done(&self) {
        self.token.cancelled().await;
    }

    pub fn is_done(&self) -> bool {
        self.token.is_cancelled()
    }
}

impl Handler {
    /// Requests shutdown and waits for all outstanding contexts to drop.
    pub async fn cancel(mut self) {
        self.token.cancel();

        while self.alive.recv().await.is_some() {}
    }

    /// Waits for all outstanding contexts to drop without cancelling them.
    pub async fn done(&mut self) {
        while self.alive.recv().await.is_some() {}
    }
}

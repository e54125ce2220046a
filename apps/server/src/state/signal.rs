//! Data-changed signal.
//!
//! Writers call [`ChangeSignal::notify`] after a product write, sale commit,
//! held-invoice restore, settings change, login or logout. The low-stock
//! poller waits on [`ChangeSignal::notified`] alongside its timer.
//!
//! Built on [`tokio::sync::Notify`]: a notification that arrives while the
//! poller is busy is stored as a single permit, so a burst of writes
//! collapses into one rescan.

use std::sync::Arc;
use tokio::sync::futures::Notified;
use tokio::sync::Notify;
use tracing::trace;

#[derive(Debug, Clone, Default)]
pub struct ChangeSignal {
    notify: Arc<Notify>,
}

impl ChangeSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notify(&self, reason: &'static str) {
        trace!(reason, "Data changed");
        self.notify.notify_one();
    }

    pub fn notified(&self) -> Notified<'_> {
        self.notify.notified()
    }
}

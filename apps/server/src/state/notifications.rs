//! Current low-stock notification set.
//!
//! Written only by the poller, read by `GET /api/notifications`. Each
//! publish replaces the whole set.

use std::sync::Arc;
use tokio::sync::watch;

use linus_core::stock::LowStockNotification;

#[derive(Debug, Clone)]
pub struct LowStockBoard {
    tx: Arc<watch::Sender<Vec<LowStockNotification>>>,
}

impl Default for LowStockBoard {
    fn default() -> Self {
        let (tx, _) = watch::channel(Vec::new());
        LowStockBoard { tx: Arc::new(tx) }
    }
}

impl LowStockBoard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Vec<LowStockNotification> {
        self.tx.borrow().clone()
    }

    pub fn publish(&self, set: Vec<LowStockNotification>) {
        self.tx.send_replace(set);
    }

    pub fn subscribe(&self) -> watch::Receiver<Vec<LowStockNotification>> {
        self.tx.subscribe()
    }
}

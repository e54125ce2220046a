//! # Low-Stock Poller
//!
//! Background task that keeps the [`LowStockBoard`] current.
//!
//! ## Loop
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        LowStockPoller::run                              │
//! │                                                                         │
//! │   select! {                                                             │
//! │     interval.tick()     ──┐                                             │
//! │     signal.notified()   ──┼──► scan()                                   │
//! │     shutdown_rx.recv()  ──┼──► break                                    │
//! │   }                       │                                             │
//! │                           ▼                                             │
//! │   scan():                                                               │
//! │     no sessions ──► publish([])                                         │
//! │     otherwise   ──► products.list() ──► stock::scan(<= threshold)       │
//! │                     ──► publish(set)   (full replacement)               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use linus_core::stock;
use linus_db::{Database, DbResult};

use crate::state::{AppState, ChangeSignal, LowStockBoard, SessionStore, SettingsContext};

pub struct LowStockPoller {
    db: Database,
    sessions: SessionStore,
    settings: SettingsContext,
    signal: ChangeSignal,
    board: LowStockBoard,
    interval: Duration,
    shutdown_rx: mpsc::Receiver<()>,
}

/// Handle for stopping the poller.
pub struct PollerHandle {
    shutdown_tx: mpsc::Sender<()>,
    task: JoinHandle<()>,
}

impl PollerHandle {
    /// Stops the loop and waits for the task to finish.
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(()).await;
        if let Err(e) = self.task.await {
            error!(?e, "Low-stock poller task failed");
        }
    }
}

impl LowStockPoller {
    pub fn new(state: &AppState, interval: Duration) -> (Self, mpsc::Sender<()>) {
        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);

        let poller = LowStockPoller {
            db: state.db.clone(),
            sessions: state.sessions.clone(),
            settings: state.settings.clone(),
            signal: state.signal.clone(),
            board: state.low_stock.clone(),
            interval,
            shutdown_rx,
        };

        (poller, shutdown_tx)
    }

    /// Spawns the poller on the current runtime.
    pub fn spawn(state: &AppState, interval: Duration) -> PollerHandle {
        let (poller, shutdown_tx) = Self::new(state, interval);
        let task = tokio::spawn(poller.run());
        PollerHandle { shutdown_tx, task }
    }

    pub async fn run(mut self) {
        info!(interval_secs = self.interval.as_secs(), "Low-stock poller starting");

        let mut interval = tokio::time::interval(self.interval);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = interval.tick() => {}

                _ = self.signal.notified() => {
                    debug!("Rescanning after data change");
                }

                _ = self.shutdown_rx.recv() => {
                    info!("Low-stock poller shutting down");
                    break;
                }
            }

            if let Err(e) = self.scan().await {
                error!(error = %e, "Low-stock scan failed");
            }
        }

        info!("Low-stock poller stopped");
    }

    async fn scan(&self) -> DbResult<()> {
        if self.sessions.is_empty().await {
            self.board.publish(Vec::new());
            return Ok(());
        }

        let threshold = self.settings.current().await.low_stock_threshold;
        let products = self.db.products().list().await?;
        let set = stock::scan(&products, threshold);

        debug!(threshold, count = set.len(), "Low-stock scan complete");
        self.board.publish(set);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use linus_core::{Money, Product, Role, SystemSettings, User, UserPermissions};
    use linus_db::{DbConfig, StockPolicy};

    fn product(id: &str, stock: i64) -> Product {
        Product {
            id: id.to_string(),
            name: format!("Item {id}"),
            price: Money::from_minor(100),
            category: String::new(),
            stock,
            barcode: id.to_string(),
            image: None,
        }
    }

    fn cashier() -> User {
        User {
            username: "sara".to_string(),
            name: "Sara".to_string(),
            role: Role::Staff,
            is_active: true,
            permissions: UserPermissions::none(),
        }
    }

    async fn state() -> AppState {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        db.products()
            .upsert_many(&[product("a", 5), product("b", 4), product("c", 6)])
            .await
            .unwrap();
        AppState::new(db, StockPolicy::Guarded).await.unwrap()
    }

    async fn next_set(
        rx: &mut tokio::sync::watch::Receiver<Vec<stock::LowStockNotification>>,
    ) -> Vec<String> {
        tokio::time::timeout(Duration::from_secs(5), rx.changed())
            .await
            .expect("poller published")
            .unwrap();
        rx.borrow_and_update()
            .iter()
            .map(|n| n.product_id.clone())
            .collect()
    }

    #[tokio::test]
    async fn test_scan_includes_boundary_and_needs_session() {
        let state = state().await;
        let mut rx = state.low_stock.subscribe();
        let handle = LowStockPoller::spawn(&state, Duration::from_secs(3600));

        // First tick fires immediately, with no session.
        assert!(next_set(&mut rx).await.is_empty());

        state.sessions.create(cashier()).await;
        state.signal.notify("login");
        let mut ids = next_set(&mut rx).await;
        ids.sort();
        assert_eq!(ids, vec!["a", "b"]);

        handle.shutdown().await;
    }

    #[tokio::test]
    async fn test_settings_change_triggers_rescan() {
        let state = state().await;
        state.sessions.create(cashier()).await;
        let mut rx = state.low_stock.subscribe();
        let handle = LowStockPoller::spawn(&state, Duration::from_secs(3600));
        assert_eq!(next_set(&mut rx).await.len(), 2);

        state
            .settings
            .replace(SystemSettings {
                low_stock_threshold: 6,
                ..SystemSettings::default()
            })
            .await
            .unwrap();
        assert_eq!(next_set(&mut rx).await.len(), 3);

        handle.shutdown().await;
    }

    #[tokio::test]
    async fn test_interval_rescan_clears_after_logout() {
        let state = state().await;
        let session = state.sessions.create(cashier()).await;
        let mut rx = state.low_stock.subscribe();
        let handle = LowStockPoller::spawn(&state, Duration::from_millis(50));
        assert_eq!(next_set(&mut rx).await.len(), 2);

        state.sessions.end(&session.token()).await;
        let cleared = tokio::time::timeout(Duration::from_secs(5), async {
            loop {
                rx.changed().await.unwrap();
                if rx.borrow_and_update().is_empty() {
                    break;
                }
            }
        })
        .await;
        assert!(cleared.is_ok());

        handle.shutdown().await;
    }
}

//! # Post-Commit Notification Dispatcher
//!
//! Delivers bill confirmations to customers AFTER the bill transaction has
//! committed, over an in-process channel.
//!
//! ## Delivery Model
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │   BillingService ──try_send──► mpsc queue ──recv──► dispatcher task     │
//! │                                                        │                │
//! │                                                        ├── log payload  │
//! │                                                        └── mark_notified│
//! │                                                                         │
//! │   COMMIT FIRST, NOTIFY SECOND:                                          │
//! │   a bill exists the moment its transaction commits. Delivery failure    │
//! │   (queue full, worker gone, mark_notified error) is logged and the      │
//! │   bill's `mail_sent` flag simply stays false. Nothing here can revert,  │
//! │   delay, or fail a committed bill.                                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The outbound transport here is the structured log itself; swapping in a
//! real mail provider means replacing the body of `deliver` only.

use serde::Serialize;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::repository::bill::BillRepository;
use till_core::Bill;

/// Queued notifications before senders start getting refused. Bills commit
/// far faster than anyone reads email; a small bound is plenty.
pub const NOTIFICATION_QUEUE_DEPTH: usize = 64;

// =============================================================================
// Messages
// =============================================================================

/// One committed bill awaiting customer notification.
#[derive(Debug, Clone, Serialize)]
pub struct BillNotification {
    pub customer_email: String,
    pub bill: Bill,
}

// =============================================================================
// Sender Handle
// =============================================================================

/// Cheap, cloneable handle for enqueueing notifications.
#[derive(Debug, Clone)]
pub struct NotificationSender {
    tx: mpsc::Sender<BillNotification>,
}

impl NotificationSender {
    /// Enqueues without blocking. Returns `false` if the queue is full or
    /// the dispatcher has shut down; the caller logs and moves on.
    pub fn send(&self, notification: BillNotification) -> bool {
        self.tx.try_send(notification).is_ok()
    }
}

// =============================================================================
// Dispatcher
// =============================================================================

/// The background delivery worker.
pub struct NotificationDispatcher;

impl NotificationDispatcher {
    /// Spawns the dispatcher task.
    ///
    /// The returned handle feeds it; the task exits when every sender clone
    /// has been dropped and the queue drains. The `JoinHandle` lets tests
    /// and shutdown paths await that drain.
    pub fn spawn(bills: BillRepository) -> (NotificationSender, JoinHandle<()>) {
        let (tx, mut rx) = mpsc::channel::<BillNotification>(NOTIFICATION_QUEUE_DEPTH);

        let handle = tokio::spawn(async move {
            debug!("Notification dispatcher started");
            while let Some(notification) = rx.recv().await {
                Self::deliver(&bills, notification).await;
            }
            debug!("Notification dispatcher stopped");
        });

        (NotificationSender { tx }, handle)
    }

    /// Delivers one notification and records the delivery on the bill.
    async fn deliver(bills: &BillRepository, notification: BillNotification) {
        let bill_id = notification.bill.id.clone();

        match serde_json::to_string(&notification) {
            Ok(payload) => {
                info!(
                    bill_id = %bill_id,
                    customer = %notification.customer_email,
                    payload = %payload,
                    "Sending bill confirmation"
                );
            }
            Err(err) => {
                warn!(bill_id = %bill_id, error = %err, "Failed to serialize notification");
                return;
            }
        }

        if let Err(err) = bills.mark_notified(&bill_id).await {
            warn!(bill_id = %bill_id, error = %err, "Failed to record notification delivery");
        }
    }
}

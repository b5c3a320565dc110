use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::Serialize;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::models::{Budget, Category, Expense, TrackingMode};

/// Capacity of each per-user broadcast channel. A session that falls more
/// than this far behind loses the oldest events; delivery is at-most-once.
const CHANNEL_CAPACITY: usize = 64;

/// One push event on the realtime channel. Wire form is a single JSON text
/// frame: `{"event": "...", "data": {...}}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum RealtimeEvent {
    Connected(ConnectedData),
    ExpenseAdded(ExpenseAddedData),
    BudgetUpdated(BudgetUpdatedData),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectedData {
    pub user_id: Uuid,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseAddedData {
    pub id: Uuid,
    pub amount: f64,
    pub reason: String,
    pub category: Category,
    pub tracking_mode: TrackingMode,
    pub date: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetUpdatedData {
    pub id: Uuid,
    pub total_amount: f64,
    pub remaining_amount: f64,
}

impl RealtimeEvent {
    pub fn connected(user_id: Uuid) -> Self {
        RealtimeEvent::Connected(ConnectedData { user_id })
    }

    pub fn expense_added(expense: &Expense) -> Self {
        RealtimeEvent::ExpenseAdded(ExpenseAddedData {
            id: expense.id,
            amount: expense.amount,
            reason: expense.reason.clone(),
            category: expense.category,
            tracking_mode: expense.tracking_mode,
            date: expense.date,
        })
    }

    pub fn budget_updated(budget: &Budget) -> Self {
        RealtimeEvent::BudgetUpdated(BudgetUpdatedData {
            id: budget.id,
            total_amount: budget.total_amount,
            remaining_amount: budget.remaining_amount,
        })
    }
}

/// Fan-out seam between request handlers and connected sessions. The hub is
/// injected through the app state, never reached through a global; tests
/// swap in a recording implementation.
pub trait EventHub: Send + Sync {
    /// Join the broadcast group for one user identity.
    fn subscribe(&self, user_id: Uuid) -> broadcast::Receiver<RealtimeEvent>;

    /// Fire-and-forget publish to every live session of one user. Returns
    /// the number of sessions the event was handed to; zero means nobody
    /// was listening and the event is gone.
    fn publish(&self, user_id: Uuid, event: RealtimeEvent) -> usize;
}

/// Broadcast groups keyed by user id. Groups are created lazily on first
/// subscribe and pruned once a publish finds no receivers left.
pub struct RealtimeHub {
    groups: DashMap<Uuid, broadcast::Sender<RealtimeEvent>>,
}

impl RealtimeHub {
    pub fn new() -> Self {
        Self {
            groups: DashMap::new(),
        }
    }
}

impl Default for RealtimeHub {
    fn default() -> Self {
        Self::new()
    }
}

impl EventHub for RealtimeHub {
    fn subscribe(&self, user_id: Uuid) -> broadcast::Receiver<RealtimeEvent> {
        self.groups
            .entry(user_id)
            .or_insert_with(|| broadcast::channel(CHANNEL_CAPACITY).0)
            .subscribe()
    }

    fn publish(&self, user_id: Uuid, event: RealtimeEvent) -> usize {
        let Some(tx) = self.groups.get(&user_id) else {
            return 0;
        };
        match tx.send(event) {
            Ok(delivered) => delivered,
            Err(_) => {
                // Guard must go before the removal or the shard deadlocks.
                drop(tx);
                self.groups
                    .remove_if(&user_id, |_, tx| tx.receiver_count() == 0);
                0
            }
        }
    }
}

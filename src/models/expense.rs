use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Closed category set. Values are stored as their display strings; anything
/// outside the set is rejected at deserialization time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text")]
pub enum Category {
    #[serde(rename = "Food & Drinks")]
    #[sqlx(rename = "Food & Drinks")]
    FoodAndDrinks,
    Shopping,
    Transport,
    #[serde(rename = "Bills & Utilities")]
    #[sqlx(rename = "Bills & Utilities")]
    BillsAndUtilities,
    Rent,
    Healthcare,
    Entertainment,
    Travel,
    Education,
    Investments,
    Savings,
    Other,
}

impl Category {
    /// Accepts the exact wire names; query strings carry the same values as
    /// JSON bodies.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Food & Drinks" => Some(Self::FoodAndDrinks),
            "Shopping" => Some(Self::Shopping),
            "Transport" => Some(Self::Transport),
            "Bills & Utilities" => Some(Self::BillsAndUtilities),
            "Rent" => Some(Self::Rent),
            "Healthcare" => Some(Self::Healthcare),
            "Entertainment" => Some(Self::Entertainment),
            "Travel" => Some(Self::Travel),
            "Education" => Some(Self::Education),
            "Investments" => Some(Self::Investments),
            "Savings" => Some(Self::Savings),
            "Other" => Some(Self::Other),
            _ => None,
        }
    }
}

impl Default for Category {
    fn default() -> Self {
        Category::Other
    }
}

/// Whether an expense counts against a budget envelope (`budget`) or is
/// recorded unconstrained (`free`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TrackingMode {
    Free,
    Budget,
}

impl TrackingMode {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "free" => Some(Self::Free),
            "budget" => Some(Self::Budget),
            _ => None,
        }
    }
}

impl Default for TrackingMode {
    fn default() -> Self {
        TrackingMode::Free
    }
}

/// A single spend record. Immutable after creation; `budget_id` is set
/// exactly when `tracking_mode` is `budget`.
#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Expense {
    pub id: Uuid,
    pub user_id: Uuid,
    pub amount: f64,
    pub reason: String,
    pub category: Category,
    pub tracking_mode: TrackingMode,
    pub budget_id: Option<Uuid>,
    pub date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

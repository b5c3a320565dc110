pub mod budget;
pub mod expense;
pub mod user;

pub use budget::Budget;
pub use expense::{Category, Expense, TrackingMode};
pub use user::User;

pub mod deal;
pub mod error;
pub mod price_history;
pub mod token;
pub mod tracker;

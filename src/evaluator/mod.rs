//! Condition expression parsing and JSON value comparison.

pub mod condition;
pub mod operators;

pub use condition::evaluate;

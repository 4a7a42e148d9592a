pub mod check;
pub mod hierarchy;
pub mod query;

pub mod config;
pub mod record;
pub mod tree;

pub use config::*;
pub use record::*;
pub use tree::*;

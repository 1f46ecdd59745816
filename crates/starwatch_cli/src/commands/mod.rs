//! CLI command handlers.

pub mod fetch;
pub mod latest;
pub mod limits;
pub mod meta;
pub mod migrate;
pub mod stars;

mod shared;

pub use shared::OutputFormat;

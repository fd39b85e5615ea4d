pub mod change;
pub mod config;
pub mod error;
pub mod format;
pub mod model;
pub mod pipeline;
pub mod ranking;
pub mod rollup;
pub mod snapshot;
pub mod social;

pub use error::{AggregateError, Result};

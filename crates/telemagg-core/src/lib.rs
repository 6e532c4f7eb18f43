pub mod config;
pub mod error;
pub mod parser;
pub mod types;

pub use config::AggregatorConfig;
pub use error::{ConfigError, ParseError, ParseResult};
pub use parser::SnapshotParser;
pub use types::*;

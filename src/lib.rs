pub mod cli;
pub mod config;
pub mod db;
pub mod error;
pub mod format;
pub mod parser;
pub mod report;

pub use db::Database;
pub use db::models::{Activity, NewActivity, Project};
pub use error::{ParseError, TimestampError, TrackingError};
pub use parser::{ParsedActivity, parse_activity};

//! Dataset model
//!
//! A dataset is an ordered list of payload columns plus rows of [`Value`]s,
//! stored under a validated [`Kind`] and a free-form id.

pub mod dataset;
pub mod kind;
pub mod timestamp;
pub mod value;

pub use dataset::Dataset;
pub use kind::{validate_id, Kind};
pub use timestamp::{format_captured_at, parse_captured_at, truncate_to_micros};
pub use value::{ColumnType, Value};

//! Time utilities and abstractions
//!
//! - **[`clock`]**: wall-clock abstraction used to stamp cache versions; a
//!   controllable implementation lives in `testing::time`.

pub mod clock;

pub use clock::{Clock, SystemClock};

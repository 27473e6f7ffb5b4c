//! Conditional logging macros.
//!
//! With the `tracing` feature these are the `tracing` macros. Without it
//! they swallow their arguments, so warnings about degraded output cost
//! nothing in builds that never look at them.

#[cfg(feature = "tracing")]
pub use tracing::{debug, warn};

#[cfg(not(feature = "tracing"))]
#[macro_export]
macro_rules! debug {
    ($($arg:tt)*) => {};
}

#[cfg(not(feature = "tracing"))]
#[macro_export]
macro_rules! warn {
    ($($arg:tt)*) => {};
}

#[cfg(not(feature = "tracing"))]
pub use crate::{debug, warn};

//! Build steps.
//!
//! A compilation unit is built by an ordered [`StepSequence`]. Steps are
//! recorded, never executed, here; an external engine runs them one at a time
//! and stops at the first failure. The sequence is serializable and hashable so
//! that two generations from the same inputs can be compared byte-for-byte.
//!
//! # Ordering
//!
//! - Directory preparation precedes every step that writes into it
//!   (see [`StepSequence::first_unprepared_write`])
//! - kotlinc precedes all kapt post-processing
//! - post-processing precedes the delegated javac steps

mod types;

pub use types::*;

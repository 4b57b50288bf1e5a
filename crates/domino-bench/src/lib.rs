//! Calibration harness for the domino probability oracle.
//!
//! Replays recorded scenarios, compares the sampled estimator against an exact
//! (or high-trial) reference and writes JSONL rows plus a Markdown summary.

pub mod calibration;
pub mod config;
pub mod logging;

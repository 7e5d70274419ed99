//! File watching with editor-save normalization.

mod backend;
mod normalizer;
mod raw;

pub use normalizer::{ChangeEvents, DEFAULT_SETTLE_DELAY, WatchNormalizer};

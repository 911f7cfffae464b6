//! error.rs — Engine failure taxonomy
//!
//! Configuration problems (empty compound lists, too-short races) degrade
//! to empty candidate/result sets rather than erroring; the only hard
//! failure is a contingency table with no surviving rows, since selection
//! needs at least one strategy to recommend.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum EngineError {
    #[error("contingency table has no rows; cannot select a race plan")]
    EmptyContingencyTable,
}

//! Terminal outcome of one bounce job.

use crate::error::BounceError;
use std::path::PathBuf;

/// The single terminal result delivered for each bounce job.
#[derive(Debug)]
pub enum RenderResult {
    /// Render and encode finished; the output file is at `output`.
    Completed { output: PathBuf },
    /// Render or encode aborted. No output file was left behind.
    Failed { error: BounceError },
    /// Cancellation was requested and honored. Not an error; no output
    /// file was left behind.
    Cancelled,
}

impl RenderResult {
    /// True for the `Completed` state.
    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed { .. })
    }

    /// Output location, if the render completed.
    pub fn output(&self) -> Option<&PathBuf> {
        match self {
            Self::Completed { output } => Some(output),
            _ => None,
        }
    }
}

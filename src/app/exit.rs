//! Exit code logic for the checker process.

use access_checker_core::PipelineStats;

use crate::ProcessExit;

/// Determines the process exit outcome from a finished pipeline run.
pub(crate) fn determine_exit_outcome(stats: &PipelineStats) -> ProcessExit {
    if stats.interrupted {
        ProcessExit::Interrupted
    } else {
        ProcessExit::Success
    }
}

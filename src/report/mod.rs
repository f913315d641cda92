//! Run artifacts on disk
//!
//! Each run writes up to three timestamped files into the output directory:
//! `test_cases_<ts>.json`, `combined_test_suite_<ts>.py` and
//! `run_summary_<ts>.json`. Files for stages that never completed are skipped.

pub mod json;
pub mod types;

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

pub use types::RunSummary;

use crate::error::PipelineFailure;
use crate::runner::{PipelineArtifacts, Stage, StageStatus};

/// Paths of the files written for one run
#[derive(Debug, Clone, Default)]
pub struct ArtifactPaths {
    pub test_cases: Option<PathBuf>,
    pub code: Option<PathBuf>,
    pub summary: PathBuf,
}

pub fn timestamp() -> String {
    chrono::Local::now().format("%Y%m%d_%H%M%S").to_string()
}

/// Write the artifacts of a finished or failed run
pub fn write_artifacts(
    dir: &Path,
    artifacts: &PipelineArtifacts,
    failure: Option<&PipelineFailure>,
) -> Result<ArtifactPaths> {
    write_artifacts_at(dir, artifacts, failure, &timestamp())
}

fn write_artifacts_at(
    dir: &Path,
    artifacts: &PipelineArtifacts,
    failure: Option<&PipelineFailure>,
    ts: &str,
) -> Result<ArtifactPaths> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create output directory {}", dir.display()))?;

    let mut paths = ArtifactPaths::default();

    if artifacts.stages.get(Stage::PlanTestCases).status == StageStatus::Success {
        let path = dir.join(format!("test_cases_{}.json", ts));
        let json = serde_json::to_string_pretty(&artifacts.test_cases)?;
        std::fs::write(&path, json)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        paths.test_cases = Some(path);
    }

    if artifacts.stages.get(Stage::GenerateCode).status == StageStatus::Success {
        let path = dir.join(format!("combined_test_suite_{}.py", ts));
        std::fs::write(&path, &artifacts.code)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        paths.code = Some(path);
    }

    let summary = RunSummary::new(artifacts, failure, ts);
    paths.summary = dir.join(format!("run_summary_{}.json", ts));
    std::fs::write(&paths.summary, serde_json::to_string_pretty(&summary)?)
        .with_context(|| format!("Failed to write {}", paths.summary.display()))?;

    log::info!("Artifacts written to {}", dir.display());
    Ok(paths)
}

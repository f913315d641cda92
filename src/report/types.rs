use serde::Serialize;

use crate::error::PipelineFailure;
use crate::parser::sanitize::is_not_automatable;
use crate::runner::{PipelineArtifacts, PipelineState, Stage, StageStatus};

/// Overview of one generation run, written next to the artifacts
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunSummary {
    pub run_id: String,
    pub generated_at: String,
    pub success: bool,
    pub failed_stage: Option<String>,
    pub failure_detail: Option<String>,
    pub session_outcome: Option<String>,
    pub crawled_pages: Vec<String>,
    pub test_case_count: usize,
    pub not_automatable: bool,
    pub total_duration_ms: u64,
    pub stages: PipelineState,
}

impl RunSummary {
    pub fn new(
        artifacts: &PipelineArtifacts,
        failure: Option<&PipelineFailure>,
        generated_at: &str,
    ) -> Self {
        Self {
            run_id: artifacts.run_id.clone(),
            generated_at: generated_at.to_string(),
            success: failure.is_none(),
            failed_stage: failure.map(|f| f.stage.name().to_string()),
            failure_detail: failure.map(|f| f.detail.clone()),
            session_outcome: artifacts.session_outcome.as_ref().map(|o| o.to_string()),
            crawled_pages: artifacts
                .crawled_pages
                .urls()
                .into_iter()
                .map(str::to_string)
                .collect(),
            test_case_count: artifacts.test_cases.len(),
            not_automatable: artifacts.stages.get(Stage::GenerateCode).status
                == StageStatus::Success
                && is_not_automatable(&artifacts.code),
            total_duration_ms: artifacts.stages.total_duration_ms(),
            stages: artifacts.stages.clone(),
        }
    }
}

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Instant;

/// The four pipeline stages, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    RefineInstruction,
    InspectSite,
    PlanTestCases,
    GenerateCode,
}

impl Stage {
    pub const ALL: [Stage; 4] = [
        Stage::RefineInstruction,
        Stage::InspectSite,
        Stage::PlanTestCases,
        Stage::GenerateCode,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Stage::RefineInstruction => "refine_instruction",
            Stage::InspectSite => "inspect_site",
            Stage::PlanTestCases => "plan_test_cases",
            Stage::GenerateCode => "generate_code",
        }
    }

    /// Progress line shown while the stage runs
    pub fn title(self) -> &'static str {
        match self {
            Stage::RefineInstruction => "Refining instruction",
            Stage::InspectSite => "Inspecting site and extracting locators",
            Stage::PlanTestCases => "Planning test cases",
            Stage::GenerateCode => "Generating unified test suite",
        }
    }

    /// 1-based position
    pub fn ordinal(self) -> usize {
        self as usize + 1
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Stage execution status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StageStatus {
    Pending,
    Running,
    Success,
    Failed,
}

impl StageStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, StageStatus::Success | StageStatus::Failed)
    }
}

/// Result of one stage, updated in place as the pipeline runs
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineStageResult {
    pub stage_name: String,
    pub status: StageStatus,
    pub output_text: String,
    pub error_detail: Option<String>,
    pub duration_ms: Option<u64>,
    #[serde(skip)]
    started_at: Option<Instant>,
}

impl PipelineStageResult {
    pub fn new(stage: Stage) -> Self {
        Self {
            stage_name: stage.name().to_string(),
            status: StageStatus::Pending,
            output_text: String::new(),
            error_detail: None,
            duration_ms: None,
            started_at: None,
        }
    }

    pub fn start(&mut self) {
        self.status = StageStatus::Running;
        self.started_at = Some(Instant::now());
    }

    pub fn succeed(&mut self, output: String) {
        self.output_text = output;
        self.finish(StageStatus::Success);
    }

    pub fn fail(&mut self, error: String) {
        self.error_detail = Some(error);
        self.finish(StageStatus::Failed);
    }

    fn finish(&mut self, status: StageStatus) {
        self.status = status;
        if let Some(start) = self.started_at {
            self.duration_ms = Some(start.elapsed().as_millis() as u64);
        }
    }
}

/// Per-stage results for one run
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PipelineState {
    stages: Vec<PipelineStageResult>,
}

impl Default for PipelineState {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineState {
    pub fn new() -> Self {
        Self {
            stages: Stage::ALL.into_iter().map(PipelineStageResult::new).collect(),
        }
    }

    pub fn get(&self, stage: Stage) -> &PipelineStageResult {
        &self.stages[stage as usize]
    }

    pub fn get_mut(&mut self, stage: Stage) -> &mut PipelineStageResult {
        &mut self.stages[stage as usize]
    }

    pub fn iter(&self) -> impl Iterator<Item = &PipelineStageResult> {
        self.stages.iter()
    }

    pub fn count(&self, status: StageStatus) -> usize {
        self.stages.iter().filter(|s| s.status == status).count()
    }

    pub fn total_duration_ms(&self) -> u64 {
        self.stages.iter().filter_map(|s| s.duration_ms).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_state_all_pending() {
        let state = PipelineState::new();
        assert_eq!(state.count(StageStatus::Pending), 4);
        let names: Vec<&str> = state.iter().map(|s| s.stage_name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "refine_instruction",
                "inspect_site",
                "plan_test_cases",
                "generate_code"
            ]
        );
    }

    #[test]
    fn test_stage_lifecycle() {
        let mut result = PipelineStageResult::new(Stage::PlanTestCases);
        result.start();
        assert_eq!(result.status, StageStatus::Running);
        assert!(!result.status.is_terminal());
        result.fail("HTTP 500".to_string());
        assert_eq!(result.status, StageStatus::Failed);
        assert_eq!(result.error_detail.as_deref(), Some("HTTP 500"));
        assert!(result.duration_ms.is_some());
    }

    #[test]
    fn test_serialized_shape() {
        let mut result = PipelineStageResult::new(Stage::RefineInstruction);
        result.start();
        result.succeed("refined".to_string());
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["stageName"], "refine_instruction");
        assert_eq!(json["status"], "success");
        assert_eq!(json["outputText"], "refined");
        assert!(json.get("startedAt").is_none());
    }
}

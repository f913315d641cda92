//! Four-stage generation pipeline
//!
//! refine → inspect (crawl) → plan → generate code, strictly in order. Each
//! stage's output is appended to the context handed to the next one. A
//! generator failure stops the run; stages after it stay pending.

pub mod events;
pub mod prompts;
pub mod state;

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Instant;
use uuid::Uuid;

pub use events::*;
pub use state::*;

use crate::crawler::{crawl_site, CrawlReport, CrawlResult, SessionOutcome};
use crate::error::{CrawlError, GenerationError, PipelineFailure};
use crate::llm::TextGenerator;
use crate::parser::records::{extract, TestCaseRecord};
use crate::parser::sanitize::{is_not_automatable, sanitize};
use crate::utils::config::AppConfig;
use crate::utils::prompt::{Credentials, RunRequest};

/// Source of crawled page content for the inspect stage
#[async_trait]
pub trait SiteInspector: Send + Sync {
    async fn crawl(
        &self,
        start_url: &str,
        credentials: &Credentials,
        max_pages: usize,
    ) -> Result<CrawlReport, CrawlError>;
}

/// Crawls with a real browser launched per call
pub struct BrowserInspector {
    config: Arc<AppConfig>,
}

impl BrowserInspector {
    pub fn new(config: Arc<AppConfig>) -> Self {
        Self { config }
    }
}

#[async_trait]
impl SiteInspector for BrowserInspector {
    async fn crawl(
        &self,
        start_url: &str,
        credentials: &Credentials,
        max_pages: usize,
    ) -> Result<CrawlReport, CrawlError> {
        crawl_site(&self.config, start_url, credentials, max_pages).await
    }
}

/// Everything a run produced, complete or not
#[derive(Debug, Clone, Default)]
pub struct PipelineArtifacts {
    pub run_id: String,
    pub stages: PipelineState,
    pub refined_instruction: String,
    pub site_insights: String,
    pub planner_text: String,
    pub test_cases: Vec<TestCaseRecord>,
    pub code: String,
    pub session_outcome: Option<SessionOutcome>,
    pub crawled_pages: CrawlResult,
}

impl PipelineArtifacts {
    fn new(run_id: String) -> Self {
        Self {
            run_id,
            ..Self::default()
        }
    }

    /// Refined instruction followed by the site insights
    pub fn context(&self) -> String {
        format!("{}\n{}", self.refined_instruction, self.site_insights)
    }
}

type StageError = (Stage, GenerationError);

pub struct Pipeline {
    config: Arc<AppConfig>,
    generator: Arc<dyn TextGenerator>,
    inspector: Arc<dyn SiteInspector>,
    emitter: EventEmitter,
}

impl Pipeline {
    pub fn new(
        config: Arc<AppConfig>,
        generator: Arc<dyn TextGenerator>,
        inspector: Arc<dyn SiteInspector>,
    ) -> Self {
        Self {
            config,
            generator,
            inspector,
            emitter: EventEmitter::default(),
        }
    }

    /// Subscribe to pipeline progress events
    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<PipelineEvent> {
        self.emitter.subscribe()
    }

    /// Run all stages for one request
    pub async fn run(&self, request: &RunRequest) -> Result<PipelineArtifacts, PipelineFailure> {
        let started = Instant::now();
        let mut artifacts = PipelineArtifacts::new(Uuid::new_v4().to_string());

        log::info!("Starting generation run {}", artifacts.run_id);
        self.emitter.emit(PipelineEvent::RunStarted {
            run_id: artifacts.run_id.clone(),
            site_url: request.site_url.clone(),
        });

        let outcome = self.run_stages(request, &mut artifacts).await;

        self.emitter.emit(PipelineEvent::RunFinished {
            run_id: artifacts.run_id.clone(),
            success: outcome.is_ok(),
            test_cases: artifacts.test_cases.len(),
            duration_ms: started.elapsed().as_millis() as u64,
        });

        match outcome {
            Ok(()) => Ok(artifacts),
            Err((stage, e)) => Err(PipelineFailure {
                stage,
                detail: e.to_string(),
                partial: Box::new(artifacts),
            }),
        }
    }

    async fn run_stages(
        &self,
        request: &RunRequest,
        artifacts: &mut PipelineArtifacts,
    ) -> Result<(), StageError> {
        self.begin(&mut artifacts.stages, Stage::RefineInstruction);
        let refined = self
            .generator
            .generate(prompts::REFINER, &request.instruction)
            .await;
        artifacts.refined_instruction =
            self.settle(&mut artifacts.stages, Stage::RefineInstruction, refined)?;

        self.begin(&mut artifacts.stages, Stage::InspectSite);
        let insights = self.inspect(request, artifacts).await;
        artifacts.site_insights = self.settle(&mut artifacts.stages, Stage::InspectSite, insights)?;
        let context = artifacts.context();

        self.begin(&mut artifacts.stages, Stage::PlanTestCases);
        let plan = self.generator.generate(prompts::PLANNER, &context).await;
        artifacts.planner_text = self.settle(&mut artifacts.stages, Stage::PlanTestCases, plan)?;
        artifacts.test_cases = extract(&artifacts.planner_text);
        if artifacts.test_cases.is_empty() {
            log::warn!("Planner output contained no recognizable test cases");
        }
        self.emitter
            .log(format!("{} test case(s) extracted", artifacts.test_cases.len()));

        self.begin(&mut artifacts.stages, Stage::GenerateCode);
        let message = prompts::unified_message(
            &artifacts.test_cases,
            &context,
            &request.instruction,
            request.site_url.as_deref(),
            &request.credentials,
        );
        let code = self
            .generator
            .generate(prompts::CODEGEN, &message)
            .await
            .map(|raw| sanitize(&raw));
        artifacts.code = self.settle(&mut artifacts.stages, Stage::GenerateCode, code)?;
        if is_not_automatable(&artifacts.code) {
            log::warn!("Generator reported the test cases as not automatable");
        }
        Ok(())
    }

    async fn inspect(
        &self,
        request: &RunRequest,
        artifacts: &mut PipelineArtifacts,
    ) -> Result<String, GenerationError> {
        let key_elements = request.key_elements();
        let instruction = &request.instruction;

        let Some(site_url) = request.site_url.as_deref() else {
            log::warn!("No URL provided, generating generic insights");
            return self
                .generator
                .generate(prompts::INSPECTOR, &prompts::no_url_prompt(&key_elements, instruction))
                .await;
        };

        if !request.credentials.is_complete() {
            log::warn!("No credentials provided, skipping crawl");
            artifacts.session_outcome = Some(SessionOutcome::NoCredentials);
            return self
                .generator
                .generate(
                    prompts::INSPECTOR,
                    &prompts::no_credentials_prompt(&key_elements, instruction),
                )
                .await;
        }

        let max_pages = if request.max_pages == 0 {
            self.config.crawl.max_pages
        } else {
            request.max_pages
        };
        match self
            .inspector
            .crawl(site_url, &request.credentials, max_pages)
            .await
        {
            Ok(report) => {
                self.emitter.emit(PipelineEvent::CrawlFinished {
                    outcome: report.outcome.to_string(),
                    pages: report.pages.len(),
                });
                artifacts.session_outcome = Some(report.outcome);
                artifacts.crawled_pages = report.pages;
            }
            Err(e) => {
                log::warn!("Crawl aborted: {}", e);
                self.emitter.log(format!("crawl aborted: {}", e));
            }
        }

        if artifacts.crawled_pages.is_empty() {
            log::warn!("No pages crawled successfully, generating generic insights");
            return self
                .generator
                .generate(
                    prompts::INSPECTOR,
                    &prompts::no_content_prompt(&key_elements, instruction),
                )
                .await;
        }

        let summary = self
            .generator
            .generate(
                prompts::INSPECTOR,
                &prompts::crawl_summary_prompt(
                    site_url,
                    &key_elements,
                    instruction,
                    &artifacts.crawled_pages,
                ),
            )
            .await?;
        self.generator
            .generate(
                prompts::INSPECTOR,
                &prompts::recommendations_prompt(&summary, &key_elements, instruction),
            )
            .await
    }

    fn begin(&self, stages: &mut PipelineState, stage: Stage) {
        log::info!("Step {}/{}: {}", stage.ordinal(), Stage::ALL.len(), stage.title());
        stages.get_mut(stage).start();
        self.emitter.emit(PipelineEvent::StageStarted { stage });
    }

    fn settle(
        &self,
        stages: &mut PipelineState,
        stage: Stage,
        result: Result<String, GenerationError>,
    ) -> Result<String, StageError> {
        let entry = stages.get_mut(stage);
        match result {
            Ok(output) => {
                entry.succeed(output.clone());
                self.emitter.emit(PipelineEvent::StageFinished {
                    stage,
                    duration_ms: entry.duration_ms.unwrap_or_default(),
                });
                Ok(output)
            }
            Err(e) => {
                log::error!("Stage {} failed: {}", stage, e);
                entry.fail(e.to_string());
                self.emitter.emit(PipelineEvent::StageFailed {
                    stage,
                    error: e.to_string(),
                    duration_ms: entry.duration_ms.unwrap_or_default(),
                });
                Err((stage, e))
            }
        }
    }
}

use super::state::Stage;
use tokio::sync::broadcast;

/// Pipeline progress events for real-time updates
#[derive(Debug, Clone)]
pub enum PipelineEvent {
    RunStarted {
        run_id: String,
        site_url: Option<String>,
    },
    RunFinished {
        run_id: String,
        success: bool,
        test_cases: usize,
        duration_ms: u64,
    },

    StageStarted {
        stage: Stage,
    },
    StageFinished {
        stage: Stage,
        duration_ms: u64,
    },
    StageFailed {
        stage: Stage,
        error: String,
        duration_ms: u64,
    },

    CrawlFinished {
        outcome: String,
        pages: usize,
    },

    // Log event for coordinated output
    Log {
        message: String,
    },
}

/// Event emitter for broadcasting pipeline events
pub struct EventEmitter {
    sender: broadcast::Sender<PipelineEvent>,
}

impl EventEmitter {
    pub fn new() -> (Self, broadcast::Receiver<PipelineEvent>) {
        let (sender, receiver) = broadcast::channel(100);
        (Self { sender }, receiver)
    }

    pub fn emit(&self, event: PipelineEvent) {
        let _ = self.sender.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<PipelineEvent> {
        self.sender.subscribe()
    }

    pub fn log(&self, message: impl Into<String>) {
        self.emit(PipelineEvent::Log {
            message: message.into(),
        });
    }
}

impl Default for EventEmitter {
    fn default() -> Self {
        let (sender, _) = broadcast::channel(100);
        Self { sender }
    }
}

use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use std::time::Duration as StdDuration;

/// Console event listener for printing real-time updates
pub struct ConsoleEventListener;

impl ConsoleEventListener {
    pub async fn listen(mut receiver: broadcast::Receiver<PipelineEvent>) {
        use colored::Colorize;
        use indicatif::ProgressDrawTarget;
        use std::io::IsTerminal;

        // Hidden draw target when piped, to avoid terminal escape codes
        let multi = if std::io::stdout().is_terminal() {
            MultiProgress::new()
        } else {
            MultiProgress::with_draw_target(ProgressDrawTarget::hidden())
        };

        let mut spinner: Option<ProgressBar> = None;
        let total = Stage::ALL.len();

        while let Ok(event) = receiver.recv().await {
            match event {
                PipelineEvent::RunStarted { run_id, site_url } => {
                    multi
                        .println(format!(
                            "\n{} Generation run started: {}",
                            "▶".green().bold(),
                            run_id.cyan()
                        ))
                        .ok();
                    if let Some(url) = site_url {
                        multi.println(format!("  Target: {}", url.cyan())).ok();
                    }
                }

                PipelineEvent::RunFinished {
                    success,
                    test_cases,
                    duration_ms,
                    ..
                } => {
                    if let Some(pb) = spinner.take() {
                        pb.finish_and_clear();
                    }
                    let status = if success {
                        "SUCCESS".green().bold()
                    } else {
                        "FAILED".red().bold()
                    };
                    println!("\n{} Generation run finished [{}]", "■".blue().bold(), status);
                    println!("  Test cases: {}", test_cases);
                    println!("  Duration: {}ms", duration_ms);
                    // Last event of a run
                    break;
                }

                PipelineEvent::StageStarted { stage } => {
                    let pb = multi.add(ProgressBar::new_spinner());
                    if let Ok(style) = ProgressStyle::default_spinner()
                        .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏ ")
                        .template("  {spinner} {msg}")
                    {
                        pb.set_style(style);
                    }
                    pb.set_message(format!(
                        "Step {}/{}: {}...",
                        stage.ordinal(),
                        total,
                        stage.title()
                    ));
                    pb.enable_steady_tick(StdDuration::from_millis(100));
                    spinner = Some(pb);
                }

                PipelineEvent::StageFinished { stage, duration_ms } => {
                    if let Some(pb) = spinner.take() {
                        pb.finish_and_clear();
                    }
                    multi
                        .println(format!(
                            "  {} Step {}/{}: {} ({}ms)",
                            "✓".green(),
                            stage.ordinal(),
                            total,
                            stage.title(),
                            duration_ms
                        ))
                        .ok();
                }

                PipelineEvent::StageFailed {
                    stage,
                    error,
                    duration_ms,
                } => {
                    if let Some(pb) = spinner.take() {
                        pb.finish_and_clear();
                    }
                    multi
                        .println(format!(
                            "  {} Step {}/{}: {} ({}ms)\n      {}",
                            "✗".red(),
                            stage.ordinal(),
                            total,
                            stage.title(),
                            duration_ms,
                            error.red()
                        ))
                        .ok();
                }

                PipelineEvent::CrawlFinished { outcome, pages } => {
                    multi
                        .println(format!(
                            "      {} {}, {} page(s) crawled",
                            "↳".dimmed(),
                            outcome,
                            pages
                        ))
                        .ok();
                }

                PipelineEvent::Log { message } => {
                    multi.println(format!("      {}", message.dimmed())).ok();
                }
            }
        }
    }

    /// Wait for a spawned listener to drain; returns false if the task died
    pub async fn join(handle: tokio::task::JoinHandle<()>) -> bool {
        match handle.await {
            Ok(()) => true,
            Err(e) => {
                log::warn!("Console listener stopped abnormally: {}", e);
                false
            }
        }
    }
}

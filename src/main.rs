use anyhow::Context;
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use qa_suite_generator::crawler::crawl_site;
use qa_suite_generator::llm::{ChatCompletionsClient, TextGenerator};
use qa_suite_generator::parser::{extract, sanitize};
use qa_suite_generator::report::{self, json};
use qa_suite_generator::runner::{BrowserInspector, ConsoleEventListener, Pipeline};
use qa_suite_generator::utils::{AppConfig, Credentials, RunRequest};

#[derive(Parser)]
#[command(name = "qa-suite-generator")]
#[command(version = "0.1.0")]
#[command(about = "Generate Playwright test suites from natural-language QA instructions", long_about = None)]
struct Cli {
    /// Path to a YAML config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full pipeline and write test cases and the test suite
    Generate {
        /// Natural-language testing instruction
        #[arg(short, long)]
        instruction: String,

        /// Target site URL (taken from the instruction if omitted)
        #[arg(short, long)]
        url: Option<String>,

        /// Login username (taken from username='...' in the instruction if omitted)
        #[arg(long)]
        username: Option<String>,

        /// Login password (taken from password='...' in the instruction if omitted)
        #[arg(long)]
        password: Option<String>,

        /// Maximum number of pages to crawl
        #[arg(long)]
        max_pages: Option<usize>,

        /// Output directory for artifacts
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Log in and crawl a site, printing the captured pages
    Crawl {
        /// Start URL
        #[arg(short, long)]
        url: String,

        #[arg(long)]
        username: String,

        #[arg(long)]
        password: String,

        /// Maximum number of pages to crawl
        #[arg(long)]
        max_pages: Option<usize>,

        /// Print the pages as JSON
        #[arg(long, default_value = "false")]
        json: bool,
    },

    /// Extract test case records from a text file
    Extract {
        /// File with labeled test case text
        file: PathBuf,

        /// Keep records whose feature name, scenario or description contains this term
        #[arg(short, long)]
        search: Option<String>,

        /// Write JSON here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Reduce generated output to source lines
    Sanitize {
        /// File with raw generator output
        file: PathBuf,

        /// Write the result here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let mut config = AppConfig::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Generate {
            instruction,
            url,
            username,
            password,
            max_pages,
            output,
        } => {
            if let Some(max_pages) = max_pages {
                config.crawl.max_pages = max_pages;
            }
            if let Some(output) = output {
                config.output.dir = output;
            }
            generate(config, &instruction, url, username, password).await?;
        }

        Commands::Crawl {
            url,
            username,
            password,
            max_pages,
            json: as_json,
        } => {
            let max_pages = max_pages.unwrap_or(config.crawl.max_pages);
            println!("{} Crawling: {}", "▶".green().bold(), url.cyan());

            let report = crawl_site(&config, &url, &Credentials::new(username, password), max_pages)
                .await
                .context("Crawl failed")?;

            println!("  Session: {}", report.outcome.to_string().yellow());
            if as_json {
                json::write(&report.pages, None)?;
            } else {
                for page in report.pages.iter() {
                    println!(
                        "  {} [{}] {} ({} chars)",
                        "✓".green(),
                        page.discovered_at,
                        page.url,
                        page.content_excerpt.chars().count()
                    );
                }
            }
            println!("  {} page(s) captured", report.pages.len());
        }

        Commands::Extract {
            file,
            search,
            output,
        } => {
            let text = read_input(&file)?;
            let mut records = extract(&text);
            if let Some(term) = search.as_deref() {
                records.retain(|r| r.matches(term));
            }
            eprintln!("{} {} test case(s) found", "ℹ".blue(), records.len());
            json::write(&records, output.as_deref())?;
        }

        Commands::Sanitize { file, output } => {
            let code = sanitize(&read_input(&file)?);
            match output {
                Some(path) => {
                    std::fs::write(&path, code)
                        .with_context(|| format!("Failed to write {}", path.display()))?;
                    println!("Code saved to: {}", path.display());
                }
                None => println!("{}", code),
            }
        }
    }

    Ok(())
}

async fn generate(
    config: AppConfig,
    instruction: &str,
    url: Option<String>,
    username: Option<String>,
    password: Option<String>,
) -> anyhow::Result<()> {
    let request = RunRequest::resolve(instruction, url, username, password, config.crawl.max_pages);

    println!("{} Generating test suite", "▶".green().bold());
    match request.site_url.as_deref() {
        Some(url) => println!("  URL: {}", url.cyan()),
        None => println!("  URL: {}", "none (generic insights)".yellow()),
    }
    if request.credentials.is_complete() {
        println!("  Login: {}", request.credentials.username.cyan());
    }
    println!("  Output: {}", config.output.dir.display().to_string().cyan());

    let config = Arc::new(config);
    let generator: Arc<dyn TextGenerator> = Arc::new(
        ChatCompletionsClient::new(&config.generator).context("Generator is not configured")?,
    );
    let inspector = Arc::new(BrowserInspector::new(config.clone()));
    let pipeline = Pipeline::new(config.clone(), generator, inspector);

    let listener = tokio::spawn(ConsoleEventListener::listen(pipeline.subscribe()));
    let result = pipeline.run(&request).await;
    // Flush the console before the final report lines
    ConsoleEventListener::join(listener).await;

    let (artifacts, failure) = match result {
        Ok(artifacts) => (artifacts, None),
        Err(failure) => ((*failure.partial).clone(), Some(failure)),
    };

    let paths = report::write_artifacts(&config.output.dir, &artifacts, failure.as_ref())?;
    if let Some(path) = &paths.test_cases {
        println!("  Test cases: {}", path.display());
    }
    if let Some(path) = &paths.code {
        println!("  Test suite: {}", path.display());
    }
    println!("  Summary: {}", paths.summary.display());

    if let Some(failure) = failure {
        return Err(failure.into());
    }
    Ok(())
}

fn read_input(path: &Path) -> anyhow::Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}

pub mod crawler;
pub mod driver;
pub mod error;
pub mod llm;
pub mod parser;
pub mod report;
pub mod runner;
pub mod utils;

// Re-export common items
pub use crawler::crawl_site;
pub use parser::{extract, sanitize};
pub use report::write_artifacts;
pub use runner::Pipeline;

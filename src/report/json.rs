use anyhow::{Context, Result};
use serde::Serialize;
use std::path::Path;

/// Pretty JSON to `output`, or stdout when no path is given
pub fn write<T: Serialize + ?Sized>(value: &T, output: Option<&Path>) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;

    if let Some(path) = output {
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        println!("JSON saved to: {}", path.display());
    } else {
        println!("{}", json);
    }

    Ok(())
}

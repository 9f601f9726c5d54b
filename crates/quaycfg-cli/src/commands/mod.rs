//! CLI command implementations.
//!
//! Each validating command returns whether the document passed; the caller
//! turns that into the exit code.

use anyhow::{Context, Result};
use quaycfg_config::{Config, load_document, validate_files};
use std::fmt::Display;
use std::path::Path;

use crate::Format;

pub fn validate_schema(config_path: &Path, schema_path: &Path) -> Result<bool> {
    let response = validate_files(config_path, schema_path).with_context(|| {
        format!(
            "failed to validate {} against {}",
            config_path.display(),
            schema_path.display()
        )
    })?;

    if response.is_valid {
        println!("Config has valid schema");
        return Ok(true);
    }
    print!(
        "{}",
        numbered(response.errors.iter().map(|v| {
            if v.path.is_empty() {
                v.message.clone()
            } else {
                format!("{}: {}", v.path, v.message)
            }
        }))
    );
    Ok(false)
}

pub fn validate(config_path: &Path) -> Result<bool> {
    let config = load_config(config_path)?;
    let errors = config.validate();
    if errors.is_empty() {
        println!("Config is valid");
        return Ok(true);
    }
    print!("{}", numbered(errors.iter()));
    Ok(false)
}

pub fn print(config_path: &Path, format: Format) -> Result<()> {
    let config = load_config(config_path)?;
    let document = config.to_document();
    match format {
        Format::Yaml => print!("{}", serde_yaml::to_string(&document)?),
        Format::Json => println!("{}", serde_json::to_string_pretty(&document)?),
    }
    Ok(())
}

fn load_config(config_path: &Path) -> Result<Config> {
    let document = load_document(config_path)
        .with_context(|| format!("failed to load {}", config_path.display()))?;
    Config::new(&document).with_context(|| format!("invalid config in {}", config_path.display()))
}

/// One `N. item` line per entry, starting at 1.
fn numbered<T: Display>(items: impl Iterator<Item = T>) -> String {
    items
        .enumerate()
        .map(|(i, item)| format!("{}. {item}\n", i + 1))
        .collect()
}

//! Config command handlers

use std::path::PathBuf;

use anyhow::{bail, Context, Result};

use wordflash_core::Config;

use crate::output::{Output, OutputFormat};

/// Show current configuration
pub fn show(config_path: Option<&PathBuf>, output: &Output) -> Result<()> {
    let config =
        Config::load_with_cli_override(config_path).context("Failed to load configuration")?;

    match output.format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::json!({
                    "data_dir": config.data_dir,
                    "source_lang": config.source_lang,
                    "target_lang": config.target_lang,
                    "deck_name": config.deck_name,
                    "output_dir": config.output_path(),
                    "media_timeout_secs": config.media_timeout_secs,
                    "log_file": config.log_file
                })
            );
        }
        OutputFormat::Quiet => {
            println!("{}", config.data_dir.display());
        }
        OutputFormat::Human => {
            let effective_path = config_path
                .cloned()
                .unwrap_or_else(Config::config_file_path);
            println!("Configuration:");
            println!("  data_dir:           {}", config.data_dir.display());
            println!("  source_lang:        {}", config.source_lang);
            println!("  target_lang:        {}", config.target_lang);
            println!("  deck_name:          {}", config.deck_name);
            println!("  output_dir:         {}", config.output_path().display());
            println!("  media_timeout_secs: {}", config.media_timeout_secs);
            println!(
                "  log_file:           {}",
                config
                    .log_file
                    .as_ref()
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|| "(not set)".to_string())
            );
            println!();
            println!("Config file: {}", effective_path.display());
        }
    }

    Ok(())
}

/// Set a configuration value
pub fn set(
    key: String,
    value: String,
    config_path: Option<&PathBuf>,
    output: &Output,
) -> Result<()> {
    let mut config =
        Config::load_with_cli_override(config_path).context("Failed to load configuration")?;

    match key.as_str() {
        "data_dir" => {
            config.data_dir = value.clone().into();
        }
        "source_lang" => {
            config.source_lang = non_empty(&key, &value)?;
        }
        "target_lang" => {
            config.target_lang = non_empty(&key, &value)?;
        }
        "deck_name" => {
            config.deck_name = non_empty(&key, &value)?;
        }
        "output_dir" => {
            config.output_dir = if value.is_empty() || value == "none" {
                None
            } else {
                Some(value.clone().into())
            };
        }
        "media_timeout_secs" => {
            config.media_timeout_secs = value
                .parse()
                .context("Invalid value for media_timeout_secs. Use a whole number of seconds.")?;
        }
        "log_file" => {
            config.log_file = if value.is_empty() || value == "none" {
                None
            } else {
                Some(value.clone().into())
            };
        }
        _ => {
            bail!(
                "Unknown configuration key: '{}'\n\
                 Valid keys: data_dir, source_lang, target_lang, deck_name, output_dir, \
                 media_timeout_secs, log_file",
                key
            );
        }
    }

    // Save to the CLI-specified path or default
    let save_path = config_path
        .cloned()
        .unwrap_or_else(Config::config_file_path);
    config
        .save_to_path(&save_path)
        .context("Failed to save configuration")?;

    output.success(&format!("Set {} = {}", key, value));

    Ok(())
}

fn non_empty(key: &str, value: &str) -> Result<String> {
    if value.is_empty() {
        bail!("{} cannot be empty", key);
    }
    Ok(value.to_string())
}

//! Deck command handler

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use wordflash_core::{
    Config, DeckBuilder, DeckPackager, JsonManifestPackager, LocalMediaCache, MediaSources,
    QuizLoader, VocabularyLoader, WordRepository,
};

use crate::output::{Output, OutputFormat};

/// Options for one deck build
pub struct DeckOptions {
    pub quiz: bool,
    pub name: Option<String>,
    pub output_dir: Option<PathBuf>,
}

/// Load a vocabulary or quiz file and write its deck manifest
pub fn build(
    repo: &mut WordRepository,
    config: &Config,
    file: &Path,
    options: DeckOptions,
    output: &Output,
) -> Result<()> {
    let name = options.name.unwrap_or_else(|| config.deck_name.clone());
    let (output_dir, cache) = match options.output_dir {
        Some(dir) => {
            let cache = LocalMediaCache::new(dir.join("images"), dir.join("audio"));
            (dir, cache)
        }
        None => (
            config.output_path(),
            LocalMediaCache::new(config.images_dir(), config.audio_dir()),
        ),
    };

    let media = MediaSources::new(&cache, &cache, config.media_timeout());
    let builder = DeckBuilder::new(&name, &config.source_lang);

    let plan = if options.quiz {
        let mut loader = QuizLoader::new(repo);
        let records = loader
            .load_file(file)
            .with_context(|| format!("Failed to load quiz from {}", file.display()))?;
        loader.store_all(&records)?;
        builder.quiz(&records, media)
    } else {
        let report = VocabularyLoader::new(repo)
            .load_file(file)
            .with_context(|| format!("Failed to load vocabulary from {}", file.display()))?;
        builder.vocabulary(&report.pairs(), media)
    };

    let path = JsonManifestPackager
        .package(&plan, &output_dir)
        .context("Failed to package deck")?;
    let media_files = plan.media_files();

    match output.format {
        OutputFormat::Json => output.print_json(&serde_json::json!({
            "manifest": path,
            "package": plan.package_file_name(),
            "deck_id": plan.deck_id,
            "cards": plan.cards.len(),
            "media_files": media_files,
        })),
        OutputFormat::Quiet => println!("{}", path.display()),
        OutputFormat::Human => {
            output.success(&format!("Deck manifest written: {}", path.display()));
            println!("  Package:     {}", plan.package_file_name());
            println!("  Total cards: {}", plan.cards.len());
            println!("  Media files: {}", media_files.len());
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_build_vocabulary_deck() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("words.yaml");
        fs::write(&file, "Hund: dog\nKatze: cat\n").unwrap();
        let out = temp_dir.path().join("out");

        let config = Config {
            data_dir: temp_dir.path().join("data"),
            ..Config::default()
        };
        let mut repo = WordRepository::open_in_memory().unwrap();

        build(
            &mut repo,
            &config,
            &file,
            DeckOptions {
                quiz: false,
                name: Some("Test Deck".to_string()),
                output_dir: Some(out.clone()),
            },
            &Output::new(OutputFormat::Quiet),
        )
        .unwrap();

        assert!(out.join("Test_Deck.apkg.json").is_file());
        assert_eq!(repo.all_words().unwrap().len(), 2);
    }

    #[test]
    fn test_build_quiz_deck_uses_config_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("quiz.yaml");
        fs::write(&file, "questions:\n  - {question: Q, answer: A}\n").unwrap();

        let config = Config {
            data_dir: temp_dir.path().join("data"),
            deck_name: "Quiz Deck".to_string(),
            ..Config::default()
        };
        let mut repo = WordRepository::open_in_memory().unwrap();

        build(
            &mut repo,
            &config,
            &file,
            DeckOptions {
                quiz: true,
                name: None,
                output_dir: None,
            },
            &Output::new(OutputFormat::Quiet),
        )
        .unwrap();

        assert!(config.output_path().join("Quiz_Deck.apkg.json").is_file());
    }
}

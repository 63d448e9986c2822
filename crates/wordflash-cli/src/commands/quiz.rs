//! Quiz command handler

use std::path::Path;

use anyhow::{Context, Result};

use wordflash_core::{QuizLoader, WordRepository};

use crate::output::{truncate, Output, OutputFormat};

/// Load a quiz file and store its questions
pub fn load(repo: &mut WordRepository, file: &Path, output: &Output) -> Result<()> {
    let mut loader = QuizLoader::new(repo);
    let records = loader
        .load_file(file)
        .with_context(|| format!("Failed to load quiz from {}", file.display()))?;
    let report = loader.store_all(&records)?;

    for dup in &report.duplicates {
        output.warning(&format!("Duplicate question: {}", dup.source));
    }

    match output.format {
        OutputFormat::Json => output.print_json(&serde_json::json!({
            "questions": records,
            "added": report.added,
            "duplicates": report.duplicates,
        })),
        OutputFormat::Quiet => println!("{}", report.added),
        OutputFormat::Human => {
            for record in &records {
                println!(
                    "[{}] {} -> {}",
                    record.category,
                    truncate(&record.question, 60),
                    truncate(&record.answer, 30)
                );
            }
            println!();
            output.success(&format!(
                "Loaded {} question(s): {} new, {} already stored",
                records.len(),
                report.added,
                report.duplicates.len()
            ));
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
    fn test_load_stores_questions() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("quiz.yaml");
        fs::write(
            &file,
            "quizzes:\n  - category: Capitals\n    questions:\n      - {question: Capital of France?, answer: Paris}\n",
        )
        .unwrap();

        let mut repo = WordRepository::open_in_memory().unwrap();
        let output = Output::new(OutputFormat::Quiet);
        load(&mut repo, &file, &output).unwrap();
        load(&mut repo, &file, &output).unwrap();

        let words = repo.get_by_category("Capitals").unwrap();
        assert_eq!(words.len(), 1);
        assert!(words[0].is_quiz());
    }

    #[test]
    fn test_invalid_quiz_file_fails() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("quiz.yaml");
        fs::write(&file, "quizzes: []\n").unwrap();

        let mut repo = WordRepository::open_in_memory().unwrap();
        assert!(load(&mut repo, &file, &Output::new(OutputFormat::Quiet)).is_err());
    }
}

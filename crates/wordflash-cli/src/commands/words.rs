//! Word command handlers

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};

use wordflash_core::repository::{DatabaseInfo, SearchField};
use wordflash_core::{DocId, Gender, VocabularyLoader, WordRepository};

use crate::output::{Output, OutputFormat};
use crate::prompt::confirm;

/// Load a vocabulary file into the store
pub fn load(repo: &mut WordRepository, file: &Path, output: &Output) -> Result<()> {
    let report = VocabularyLoader::new(repo)
        .load_file(file)
        .with_context(|| format!("Failed to load vocabulary from {}", file.display()))?;

    for dup in &report.duplicates {
        output.warning(&format!("Duplicate found: {} -> {}", dup.source, dup.target));
    }

    match output.format {
        OutputFormat::Json => output.print_json(&report),
        OutputFormat::Quiet => println!("{}", report.added),
        OutputFormat::Human => {
            output.success(&format!(
                "Loaded {} word pair(s) from {}: {} new, {} merged",
                report.entries.len(),
                file.display(),
                report.added,
                report.duplicates.len()
            ));
        }
    }

    Ok(())
}

/// Search words by substring
pub fn search(repo: &WordRepository, query: String, field: SearchField, output: &Output) -> Result<()> {
    let words = repo.search(&query, field)?;
    if output.format == OutputFormat::Human {
        println!("Search results for '{}' (type: {}):\n", query, field);
    }
    output.print_words(&words, None);
    Ok(())
}

/// Show words in one category
pub fn category(repo: &WordRepository, name: String, output: &Output) -> Result<()> {
    let words = repo.get_by_category(&name)?;
    if output.format == OutputFormat::Human {
        println!("Words in category '{}':\n", name);
    }
    output.print_words(&words, Some(&name));
    Ok(())
}

/// Show words with one gender
pub fn gender(repo: &WordRepository, gender: Gender, output: &Output) -> Result<()> {
    let words = repo.get_by_gender(gender)?;
    if output.format == OutputFormat::Human {
        println!("Words with gender '{}':\n", gender);
    }
    output.print_words(&words, None);
    Ok(())
}

pub fn stats(repo: &WordRepository, output: &Output) -> Result<()> {
    output.print_statistics(&repo.get_statistics()?);
    Ok(())
}

pub fn duplicates(repo: &WordRepository, output: &Output) -> Result<()> {
    output.print_duplicates(&repo.get_duplicates()?);
    Ok(())
}

/// Write the enhanced-format YAML export to a file or stdout
pub fn export(repo: &WordRepository, file: Option<PathBuf>, output: &Output) -> Result<()> {
    let document = repo.export_document()?;

    match file {
        Some(path) => {
            let yaml = serde_yaml::to_string(&document).context("Failed to serialize export")?;
            fs::write(&path, yaml)
                .with_context(|| format!("Failed to write export: {}", path.display()))?;
            output.success(&format!(
                "Exported {} word(s) to {}",
                document.words.len(),
                path.display()
            ));
        }
        None if output.is_json() => output.print_json(&document),
        None => {
            let yaml = serde_yaml::to_string(&document).context("Failed to serialize export")?;
            print!("{}", yaml);
        }
    }

    Ok(())
}

/// Link two words
pub fn relate(
    repo: &mut WordRepository,
    word_id: DocId,
    related_id: DocId,
    relation_type: String,
    output: &Output,
) -> Result<()> {
    for id in [word_id, related_id] {
        if repo.get_word(id)?.is_none() {
            bail!("Word not found: {}", id);
        }
    }

    if repo.add_relation(word_id, related_id, &relation_type)? {
        output.success(&format!(
            "Related {} -> {} ({})",
            word_id, related_id, relation_type
        ));
    } else {
        output.message("Relation already exists.");
    }
    Ok(())
}

pub fn relations(repo: &WordRepository, word_id: DocId, output: &Output) -> Result<()> {
    if repo.get_word(word_id)?.is_none() {
        bail!("Word not found: {}", word_id);
    }
    output.print_relations(&repo.get_relations(word_id)?);
    Ok(())
}

pub fn list_categories(repo: &WordRepository, output: &Output) -> Result<()> {
    output.print_categories(&repo.get_registered_categories()?);
    Ok(())
}

pub fn add_category(
    repo: &mut WordRepository,
    name: String,
    description: String,
    output: &Output,
) -> Result<()> {
    if repo.register_category(&name, &description)? {
        output.success(&format!("Registered category: {}", name));
    } else {
        output.message(&format!("Category already registered: {}", name));
    }
    Ok(())
}

/// Show where the store lives and its table sizes
pub fn info(repo: &WordRepository, output: &Output) -> Result<()> {
    let info = repo.database_info()?;

    match output.format {
        OutputFormat::Json => output.print_json(&info),
        OutputFormat::Quiet => println!("{}", display_path(&info)),
        OutputFormat::Human => {
            println!("WordFlash Store");
            println!("===============");
            println!();
            println!("Type:       {}", info.database_type);
            println!("Path:       {}", display_path(&info));
            println!("Words:      {}", info.words);
            println!("Categories: {}", info.categories);
            println!("Relations:  {}", info.relations);
        }
    }
    Ok(())
}

fn display_path(info: &DatabaseInfo) -> String {
    info.database_path
        .as_ref()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "(in memory)".to_string())
}

/// Remove every word, category and relation
pub fn clear(repo: &mut WordRepository, yes: bool, output: &Output) -> Result<()> {
    if !yes {
        if !output.should_prompt() {
            bail!("Refusing to clear the store without --yes");
        }
        let info = repo.database_info()?;
        println!(
            "This removes {} word(s), {} categor(ies) and {} relation(s).",
            info.words, info.categories, info.relations
        );
        if !confirm("Are you sure?")? {
            println!("Cancelled.");
            return Ok(());
        }
    }

    repo.clear_all().context("Failed to clear the store")?;
    output.success("Cleared all data");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn quiet() -> Output {
        Output::new(OutputFormat::Quiet)
    }

    #[test]
    fn test_load_and_export_to_file() {
        let temp_dir = TempDir::new().unwrap();
        let input = temp_dir.path().join("words.yaml");
        fs::write(&input, "Apfel: apple\nBanane: banana\n").unwrap();
        let exported = temp_dir.path().join("export.yaml");

        let mut repo = WordRepository::open(&temp_dir.path().join("wordflash.db")).unwrap();
        load(&mut repo, &input, &quiet()).unwrap();
        export(&repo, Some(exported.clone()), &quiet()).unwrap();

        let yaml = fs::read_to_string(&exported).unwrap();
        assert!(yaml.starts_with("words:"));
        assert!(yaml.contains("source: Apfel"));
        assert!(!yaml.contains("notes"));
    }

    #[test]
    fn test_load_missing_file_fails() {
        let mut repo = WordRepository::open_in_memory().unwrap();
        let result = load(&mut repo, Path::new("/nonexistent/words.yaml"), &quiet());
        assert!(result.is_err());
    }

    #[test]
    fn test_relate_requires_existing_words() {
        let mut repo = WordRepository::open_in_memory().unwrap();
        let (hund, _) = repo
            .add_word(&wordflash_core::NewWord::new("Hund", "dog"))
            .unwrap();

        assert!(relate(&mut repo, hund, 99, "related".to_string(), &quiet()).is_err());
        assert!(relations(&repo, 99, &quiet()).is_err());
    }

    #[test]
    fn test_clear_without_yes_in_quiet_mode_refuses() {
        let mut repo = WordRepository::open_in_memory().unwrap();
        repo.add_word(&wordflash_core::NewWord::new("Hund", "dog"))
            .unwrap();

        assert!(clear(&mut repo, false, &quiet()).is_err());
        assert_eq!(repo.all_words().unwrap().len(), 1);

        clear(&mut repo, true, &quiet()).unwrap();
        assert!(repo.all_words().unwrap().is_empty());
    }
}

//! Vocabulary loading
//!
//! Turns YAML vocabulary files into `NewWord` records and feeds them through
//! the repository's reconciliation path.
//!
//! Three input shapes are accepted:
//!
//! ```yaml
//! # simple: one mapping of source -> target
//! Apfel: apple
//! Banane: banana
//! ```
//!
//! ```yaml
//! # enhanced: a `words` list (or a bare top-level list)
//! words:
//!   - source: Hund
//!     target: dog
//!     gender: masculine
//!     plural: Hunde
//!     categories: [animals, pets]
//!   - Katze: cat
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use serde::Serialize;
use serde_yaml::{Mapping, Value};
use tracing::{debug, info, warn};

use crate::analysis::category_distribution;
use crate::loader::{
    optional_text, parse_yaml, read_input, scalar_text, shape_name, untagged, LoadError,
    LoadResult,
};
use crate::models::{Gender, NewWord, Word, WordPair};
use crate::repository::{Duplicate, Statistics, WordRepository};
use crate::storage::StorageResult;

/// Convert a parsed document into canonical records
pub fn normalize(doc: &Value) -> LoadResult<Vec<NewWord>> {
    match untagged(doc) {
        Value::Mapping(map) => match map.get("words").map(untagged) {
            Some(Value::Sequence(items)) => Ok(normalize_enhanced(items)),
            _ => Ok(normalize_simple(map)),
        },
        Value::Sequence(items) => Ok(normalize_enhanced(items)),
        other => Err(LoadError::UnsupportedShape(format!(
            "expected a mapping or a list of words, got {}",
            shape_name(other)
        ))),
    }
}

fn normalize_simple(map: &Mapping) -> Vec<NewWord> {
    map.iter()
        .filter_map(|(source, target)| pair_entry(source, target))
        .collect()
}

fn normalize_enhanced(items: &[Value]) -> Vec<NewWord> {
    items
        .iter()
        .filter_map(|item| {
            let entry = enhanced_entry(item);
            if entry.is_none() {
                debug!(?item, "skipping unrecognised vocabulary entry");
            }
            entry
        })
        .collect()
}

fn enhanced_entry(item: &Value) -> Option<NewWord> {
    let map = untagged(item).as_mapping()?;

    if map.contains_key("source") || map.contains_key("target") {
        let source = record_side(map, "source")?;
        let target = record_side(map, "target")?;

        let mut word = NewWord::new(source, target);
        word.gender = gender_field(map);
        word.plural = optional_text(map, "plural");
        word.notes = optional_text(map, "notes");
        if let Some(categories) = categories_field(map) {
            word.categories = categories;
        }
        return Some(word);
    }

    if map.len() == 1 {
        let (source, target) = map.iter().next()?;
        return pair_entry(source, target);
    }

    None
}

/// A missing or null side becomes empty so the batch fails validation
fn record_side(map: &Mapping, key: &str) -> Option<String> {
    match map.get(key) {
        Some(value) => scalar_text(value),
        None => Some(String::new()),
    }
}

fn pair_entry(source: &Value, target: &Value) -> Option<NewWord> {
    match (scalar_text(source), scalar_text(target)) {
        (Some(source), Some(target)) => Some(NewWord::new(source, target)),
        _ => {
            debug!(?source, "skipping pair with non-scalar side");
            None
        }
    }
}

/// Unknown genders are dropped; the entry itself is kept
fn gender_field(map: &Mapping) -> Option<Gender> {
    let raw = optional_text(map, "gender")?;
    match raw.parse() {
        Ok(gender) => Some(gender),
        Err(e) => {
            warn!("dropping gender: {}", e);
            None
        }
    }
}

/// A list of names, or a single name as a one-element list
fn categories_field(map: &Mapping) -> Option<Vec<String>> {
    match untagged(map.get("categories")?) {
        Value::Null => None,
        Value::Sequence(items) => Some(
            items
                .iter()
                .filter_map(scalar_text)
                .filter(|s| !s.is_empty())
                .collect(),
        ),
        other => scalar_text(other)
            .filter(|s| !s.is_empty())
            .map(|s| vec![s]),
    }
}

/// Whether a batch may be stored: non-empty, every source and target filled
pub fn validate(words: &[NewWord]) -> bool {
    !words.is_empty()
        && words
            .iter()
            .all(|w| !w.source.is_empty() && !w.target.is_empty())
}

/// Outcome of one load
#[derive(Debug, Clone, Serialize)]
pub struct LoadReport {
    /// Every normalized entry, in input order
    pub entries: Vec<NewWord>,
    /// Entries that created a new record
    pub added: usize,
    /// Entries that merged into an existing record
    pub duplicates: Vec<WordPair>,
}

impl LoadReport {
    /// The loaded entries as bare pairs
    pub fn pairs(&self) -> Vec<WordPair> {
        self.entries.iter().map(WordPair::from).collect()
    }
}

/// Loads vocabulary files into a repository
pub struct VocabularyLoader<'a> {
    repo: &'a mut WordRepository,
}

impl<'a> VocabularyLoader<'a> {
    pub fn new(repo: &'a mut WordRepository) -> Self {
        Self { repo }
    }

    /// Load a vocabulary file
    pub fn load_file(&mut self, path: &Path) -> LoadResult<LoadReport> {
        let text = read_input(path)?;
        debug!(path = %path.display(), "loading vocabulary file");
        self.load_str(&text)
    }

    /// Load vocabulary from YAML text
    ///
    /// The whole batch is validated before anything is written; a failed
    /// validation stores nothing.
    pub fn load_str(&mut self, text: &str) -> LoadResult<LoadReport> {
        let entries = normalize(&parse_yaml(text)?)?;

        if !validate(&entries) {
            return Err(LoadError::Validation(if entries.is_empty() {
                "no vocabulary entries found".to_string()
            } else {
                "every entry needs a non-empty source and target".to_string()
            }));
        }

        self.store(entries)
    }

    /// Store already validated entries
    pub fn store(&mut self, entries: Vec<NewWord>) -> LoadResult<LoadReport> {
        let mut added = 0;
        let mut duplicates = Vec::new();

        for entry in &entries {
            let (_, is_new) = self.repo.add_word(entry)?;
            if is_new {
                added += 1;
            } else {
                warn!(source = %entry.source, target = %entry.target, "duplicate found");
                duplicates.push(WordPair::from(entry));
            }
        }

        info!(
            total = entries.len(),
            added,
            duplicates = duplicates.len(),
            "vocabulary loaded"
        );

        Ok(LoadReport {
            entries,
            added,
            duplicates,
        })
    }
}

/// Summary of the stored vocabulary
#[derive(Debug, Clone, Serialize)]
pub struct VocabularyAnalysis {
    pub statistics: Statistics,
    pub duplicates: Vec<Duplicate>,
    pub multi_category_words: Vec<Word>,
    pub category_distribution: BTreeMap<String, usize>,
}

/// Gather statistics, duplicates and category spread in one pass
pub fn analyze(repo: &WordRepository) -> StorageResult<VocabularyAnalysis> {
    Ok(VocabularyAnalysis {
        statistics: repo.get_statistics()?,
        duplicates: repo.get_duplicates()?,
        multi_category_words: repo.get_multi_category()?,
        category_distribution: category_distribution(repo)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DEFAULT_CATEGORY;
    use std::fs;
    use tempfile::TempDir;

    fn normalize_str(text: &str) -> LoadResult<Vec<NewWord>> {
        normalize(&parse_yaml(text).unwrap())
    }

    #[test]
    fn test_simple_format() {
        let words = normalize_str("Apfel: apple\nBanane: banana\n").unwrap();

        assert_eq!(words.len(), 2);
        assert_eq!(words[0], NewWord::new("Apfel", "apple"));
        assert_eq!(words[1].categories, vec![DEFAULT_CATEGORY]);
    }

    #[test]
    fn test_enhanced_format() {
        let text = r#"
words:
  - source: Hund
    target: dog
    gender: masculine
    plural: Hunde
    categories: [animals, pets]
    notes: loyal
  - Katze: cat
  - source: Brot
    target: bread
    categories: food
"#;
        let words = normalize_str(text).unwrap();

        assert_eq!(words.len(), 3);
        assert_eq!(
            words[0],
            NewWord::new("Hund", "dog")
                .with_gender(Gender::Masculine)
                .with_plural("Hunde")
                .with_categories(["animals", "pets"])
                .with_notes("loyal")
        );
        assert_eq!(words[1], NewWord::new("Katze", "cat"));
        assert_eq!(words[2].categories, vec!["food"]);
    }

    #[test]
    fn test_bare_list_is_enhanced() {
        let words = normalize_str("- source: Haus\n  target: house\n- Baum: tree\n").unwrap();
        assert_eq!(words.len(), 2);
        assert_eq!(words[1].source, "Baum");
    }

    #[test]
    fn test_mapping_with_non_list_words_is_simple() {
        let words = normalize_str("words: many\nApfel: apple\n").unwrap();
        assert_eq!(words.len(), 2);
        assert_eq!(words[0], NewWord::new("words", "many"));
    }

    #[test]
    fn test_unrecognised_entries_are_skipped() {
        let text = r#"
- just a string
- {a: b, c: d}
- source: [Hund, Katze]
  target: pets
- source: Maus
  target: mouse
"#;
        let words = normalize_str(text).unwrap();
        assert_eq!(words.len(), 1);
        assert_eq!(words[0].source, "Maus");
    }

    #[test]
    fn test_source_without_target_is_a_record() {
        let words = normalize_str("- source: Birne\n- {target: pear}\n").unwrap();
        assert_eq!(words, vec![NewWord::new("Birne", ""), NewWord::new("", "pear")]);
        assert!(!validate(&words));
    }

    #[test]
    fn test_missing_target_stores_nothing() {
        let mut repo = WordRepository::open_in_memory().unwrap();
        let result = VocabularyLoader::new(&mut repo)
            .load_str("- source: Birne\n- {source: Apfel, target: apple}\n");

        assert!(matches!(result, Err(LoadError::Validation(_))));
        assert!(repo.all_words().unwrap().is_empty());
    }

    #[test]
    fn test_scalars_are_stringified() {
        let words = normalize_str("1: eins\n2.5: zweieinhalb\ntrue: ja\n").unwrap();
        assert_eq!(words[0], NewWord::new("1", "eins"));
        assert_eq!(words[1].source, "2.5");
        assert_eq!(words[2].source, "true");
    }

    #[test]
    fn test_unknown_gender_is_dropped() {
        let words = normalize_str("- {source: Tisch, target: table, gender: plural}").unwrap();
        assert_eq!(words.len(), 1);
        assert!(words[0].gender.is_none());
    }

    #[test]
    fn test_unsupported_shape() {
        assert!(matches!(
            normalize_str("just text"),
            Err(LoadError::UnsupportedShape(_))
        ));
        assert!(matches!(
            normalize_str(""),
            Err(LoadError::UnsupportedShape(_))
        ));
    }

    #[test]
    fn test_validate() {
        assert!(!validate(&[]));
        assert!(validate(&[NewWord::new("a", "b")]));
        assert!(!validate(&[NewWord::new("a", "b"), NewWord::new("c", "")]));
    }

    #[test]
    fn test_null_target_fails_validation() {
        let words = normalize_str("Apfel: apple\nBirne:\n").unwrap();
        assert_eq!(words[1].target, "");
        assert!(!validate(&words));
    }

    #[test]
    fn test_load_simple_scenario() {
        let mut repo = WordRepository::open_in_memory().unwrap();
        let report = VocabularyLoader::new(&mut repo)
            .load_str("Apfel: apple\nBanane: banana\n")
            .unwrap();

        assert_eq!(report.added, 2);
        assert!(report.duplicates.is_empty());
        assert_eq!(
            report.pairs(),
            vec![
                WordPair {
                    source: "Apfel".to_string(),
                    target: "apple".to_string()
                },
                WordPair {
                    source: "Banane".to_string(),
                    target: "banana".to_string()
                },
            ]
        );

        let stats = repo.get_statistics().unwrap();
        assert_eq!(stats.total_words, 2);
        assert_eq!(stats.categories, vec![DEFAULT_CATEGORY]);
        assert_eq!(repo.get_by_category(DEFAULT_CATEGORY).unwrap().len(), 2);
    }

    #[test]
    fn test_load_reports_duplicates() {
        let mut repo = WordRepository::open_in_memory().unwrap();
        let mut loader = VocabularyLoader::new(&mut repo);

        loader.load_str("Hund: dog\n").unwrap();
        let report = loader.load_str("- Hund: dog\n- Katze: cat\n").unwrap();

        assert_eq!(report.added, 1);
        assert_eq!(report.duplicates.len(), 1);
        assert_eq!(report.duplicates[0].source, "Hund");
        assert_eq!(repo.all_words().unwrap().len(), 2);
    }

    #[test]
    fn test_failed_validation_stores_nothing() {
        let mut repo = WordRepository::open_in_memory().unwrap();
        let text = "- {source: Apfel, target: apple}\n- {source: Birne, target: null}\n";

        let result = VocabularyLoader::new(&mut repo).load_str(text);

        assert!(matches!(result, Err(LoadError::Validation(_))));
        assert!(repo.all_words().unwrap().is_empty());
    }

    #[test]
    fn test_load_empty_list_fails_validation() {
        let mut repo = WordRepository::open_in_memory().unwrap();
        let result = VocabularyLoader::new(&mut repo).load_str("words: []\n");
        assert!(matches!(result, Err(LoadError::Validation(_))));
    }

    #[test]
    fn test_load_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("words.yaml");
        fs::write(&path, "words:\n  - {source: Hund, target: dog, categories: [animals]}\n").unwrap();

        let mut repo = WordRepository::open_in_memory().unwrap();
        let report = VocabularyLoader::new(&mut repo).load_file(&path).unwrap();

        assert_eq!(report.added, 1);
        assert_eq!(repo.get_by_category("animals").unwrap().len(), 1);
    }

    #[test]
    fn test_export_reloads() {
        let mut repo = WordRepository::open_in_memory().unwrap();
        VocabularyLoader::new(&mut repo)
            .load_str("- {source: Hund, target: dog, gender: masculine, categories: [animals]}\n- Apfel: apple\n")
            .unwrap();

        let yaml = serde_yaml::to_string(&repo.export_document().unwrap()).unwrap();

        let mut other = WordRepository::open_in_memory().unwrap();
        let report = VocabularyLoader::new(&mut other).load_str(&yaml).unwrap();
        assert_eq!(report.added, 2);
        assert_eq!(other.export().unwrap(), repo.export().unwrap());
    }

    #[test]
    fn test_analyze() {
        let mut repo = WordRepository::open_in_memory().unwrap();
        VocabularyLoader::new(&mut repo)
            .load_str("- {source: Lachs, target: salmon, categories: [food, fish]}\n- {source: Brot, target: bread, categories: [food]}\n")
            .unwrap();

        let analysis = analyze(&repo).unwrap();
        assert_eq!(analysis.statistics.total_words, 2);
        assert!(analysis.duplicates.is_empty());
        assert_eq!(analysis.multi_category_words.len(), 1);
        assert_eq!(analysis.category_distribution.get("food"), Some(&2));
        assert_eq!(analysis.category_distribution.get("fish"), Some(&1));
    }
}

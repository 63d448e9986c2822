//! Data models for WordFlash
//!
//! Defines the stored entities (Word, Category, WordRelation) and the
//! incoming record shape (`NewWord`) consumed by the repository.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::storage::DocId;

/// Category assigned when an entry names none
pub const DEFAULT_CATEGORY: &str = "uncategorized";

/// Grammatical gender of a source word
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Masculine,
    Feminine,
    Neuter,
}

impl Gender {
    pub const ALL: [Gender; 3] = [Gender::Masculine, Gender::Feminine, Gender::Neuter];

    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Masculine => "masculine",
            Gender::Feminine => "feminine",
            Gender::Neuter => "neuter",
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Gender {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "masculine" => Ok(Gender::Masculine),
            "feminine" => Ok(Gender::Feminine),
            "neuter" => Ok(Gender::Neuter),
            other => Err(format!(
                "unknown gender '{}' (expected masculine, feminine or neuter)",
                other
            )),
        }
    }
}

/// Discriminator separating quiz entries from vocabulary
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    Quiz,
}

/// Compute the deduplication key for a pair
///
/// MD5 over `"{source}:{target}"` after lower-casing both sides. Quiz entries
/// are keyed with a `quiz|` prefix so they never merge with vocabulary.
pub fn content_hash(source: &str, target: &str, kind: Option<EntryKind>) -> String {
    let combined = format!("{}:{}", source.to_lowercase(), target.to_lowercase());
    let keyed = match kind {
        Some(EntryKind::Quiz) => format!("quiz|{}", combined),
        None => combined,
    };
    format!("{:x}", md5::compute(keyed.as_bytes()))
}

/// An incoming vocabulary record, before reconciliation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewWord {
    pub source: String,
    pub target: String,
    #[serde(default)]
    pub gender: Option<Gender>,
    #[serde(default)]
    pub plural: Option<String>,
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default, rename = "type")]
    pub kind: Option<EntryKind>,
}

impl NewWord {
    /// Create a record in the default category
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            gender: None,
            plural: None,
            categories: vec![DEFAULT_CATEGORY.to_string()],
            notes: None,
            kind: None,
        }
    }

    pub fn with_gender(mut self, gender: Gender) -> Self {
        self.gender = Some(gender);
        self
    }

    pub fn with_plural(mut self, plural: impl Into<String>) -> Self {
        self.plural = Some(plural.into());
        self
    }

    /// Replace the categories
    pub fn with_categories<I, S>(mut self, categories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.categories = categories.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    pub fn with_kind(mut self, kind: EntryKind) -> Self {
        self.kind = Some(kind);
        self
    }

    /// The deduplication key for this record
    pub fn content_hash(&self) -> String {
        content_hash(&self.source, &self.target, self.kind)
    }
}

/// A reconciled word as stored in the `words` table
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Word {
    /// Store-assigned id (not part of the stored body)
    #[serde(skip)]
    pub id: DocId,
    pub source: String,
    pub target: String,
    pub source_hash: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<Gender>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plural: Option<String>,
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<EntryKind>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Word {
    /// Build a fresh word from an incoming record
    ///
    /// Empty optional strings are treated as absent and an empty category
    /// list falls back to the default category.
    pub fn from_new(new: &NewWord) -> Self {
        let now = Utc::now();
        let mut categories = Vec::new();
        for category in &new.categories {
            if !categories.contains(category) {
                categories.push(category.clone());
            }
        }
        if categories.is_empty() {
            categories.push(DEFAULT_CATEGORY.to_string());
        }

        Self {
            id: 0,
            source: new.source.clone(),
            target: new.target.clone(),
            source_hash: new.content_hash(),
            gender: new.gender,
            plural: non_empty(&new.plural),
            categories,
            notes: non_empty(&new.notes),
            kind: new.kind,
            created_at: now,
            updated_at: now,
        }
    }

    /// Whether the word belongs to more than one category
    pub fn is_multi_category(&self) -> bool {
        self.categories.len() > 1
    }

    pub fn has_category(&self, category: &str) -> bool {
        self.categories.iter().any(|c| c == category)
    }

    pub fn is_quiz(&self) -> bool {
        self.kind == Some(EntryKind::Quiz)
    }
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value.as_ref().filter(|s| !s.is_empty()).cloned()
}

/// A bare (source, target) pair, as fed to deck building
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WordPair {
    pub source: String,
    pub target: String,
}

impl From<&NewWord> for WordPair {
    fn from(word: &NewWord) -> Self {
        Self {
            source: word.source.clone(),
            target: word.target.clone(),
        }
    }
}

impl From<&Word> for WordPair {
    fn from(word: &Word) -> Self {
        Self {
            source: word.source.clone(),
            target: word.target.clone(),
        }
    }
}

/// An entry in the category registry
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Category {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

impl Category {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
        }
    }
}

/// Categories seeded into an empty registry
pub fn default_categories() -> Vec<Category> {
    vec![
        Category::new("fruit", "Fruits and berries"),
        Category::new("vegetables", "Vegetables and greens"),
        Category::new("animals", "All types of animals"),
        Category::new("food", "Food items and cuisine"),
        Category::new("vehicles", "Transportation vehicles"),
        Category::new("professions", "Jobs and careers"),
    ]
}

/// A directed, typed edge between two words
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WordRelation {
    pub word_id: DocId,
    pub related_word_id: DocId,
    pub relation_type: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_hash_ignores_case() {
        assert_eq!(
            content_hash("Fisch", "fish", None),
            content_hash("fisch", "FISH", None)
        );
        assert_ne!(
            content_hash("Fisch", "fish", None),
            content_hash("Fisch", "fishes", None)
        );
    }

    #[test]
    fn test_content_hash_is_md5_of_pair() {
        // md5("hund:dog")
        assert_eq!(
            content_hash("Hund", "dog", None),
            format!("{:x}", md5::compute(b"hund:dog"))
        );
        assert_eq!(content_hash("Hund", "dog", None).len(), 32);
    }

    #[test]
    fn test_quiz_hash_differs_from_vocabulary() {
        assert_ne!(
            content_hash("Hund", "dog", None),
            content_hash("Hund", "dog", Some(EntryKind::Quiz))
        );
    }

    #[test]
    fn test_gender_parse_and_display() {
        assert_eq!("Feminine".parse::<Gender>().unwrap(), Gender::Feminine);
        assert_eq!(" neuter ".parse::<Gender>().unwrap(), Gender::Neuter);
        assert!("plural".parse::<Gender>().is_err());
        assert_eq!(Gender::Masculine.to_string(), "masculine");
    }

    #[test]
    fn test_new_word_defaults() {
        let word = NewWord::new("Apfel", "apple");
        assert_eq!(word.categories, vec![DEFAULT_CATEGORY]);
        assert!(word.gender.is_none());
        assert!(word.kind.is_none());
    }

    #[test]
    fn test_word_from_new_normalizes() {
        let new = NewWord::new("Hund", "dog")
            .with_categories(["animals", "animals", "pets"])
            .with_notes("");
        let word = Word::from_new(&new);

        assert_eq!(word.categories, vec!["animals", "pets"]);
        assert!(word.notes.is_none());
        assert!(word.is_multi_category());
        assert_eq!(word.created_at, word.updated_at);

        let empty = Word::from_new(&NewWord::new("a", "b").with_categories(Vec::<String>::new()));
        assert_eq!(empty.categories, vec![DEFAULT_CATEGORY]);
    }

    #[test]
    fn test_word_serialization_omits_absent_fields() {
        let word = Word::from_new(&NewWord::new("Apfel", "apple"));
        let value = serde_json::to_value(&word).unwrap();
        let obj = value.as_object().unwrap();

        assert!(obj.contains_key("source_hash"));
        assert!(!obj.contains_key("id"));
        assert!(!obj.contains_key("gender"));
        assert!(!obj.contains_key("type"));

        let back: Word = serde_json::from_value(value).unwrap();
        assert_eq!(back.source, "Apfel");
    }

    #[test]
    fn test_word_deserializes_null_optionals() {
        let value = serde_json::json!({
            "source": "Katze",
            "target": "cat",
            "source_hash": "x",
            "gender": null,
            "plural": null,
            "categories": ["animals"],
            "notes": null,
            "created_at": "2024-01-01T00:00:00Z",
            "updated_at": "2024-01-01T00:00:00Z"
        });
        let word: Word = serde_json::from_value(value).unwrap();
        assert!(word.gender.is_none());
        assert!(word.has_category("animals"));
    }
}

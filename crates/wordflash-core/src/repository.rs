//! Word repository
//!
//! Domain layer over the document store. Owns the `words`, `categories` and
//! `word_relations` tables and the reconciliation rule that keeps one stored
//! word per case-insensitive (source, target) pair.
//!
//! ## Usage
//!
//! ```ignore
//! let mut repo = WordRepository::open(&config.database_path())?;
//!
//! let (id, is_new) = repo.add_word(&NewWord::new("Hund", "dog").with_categories(["animals"]))?;
//! let animals = repo.get_by_category("animals")?;
//! ```

use std::collections::{BTreeSet, HashMap, HashSet};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::ser::Error as _;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};

use crate::models::{default_categories, Category, Gender, NewWord, Word, WordRelation};
use crate::storage::{DocId, Document, DocumentStore, Query, Record, StorageError, StorageResult};

/// Table holding reconciled words
pub const WORDS_TABLE: &str = "words";
/// Table holding the category registry
pub const CATEGORIES_TABLE: &str = "categories";
/// Table holding word relations
pub const RELATIONS_TABLE: &str = "word_relations";

/// Which text fields a search looks at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SearchField {
    Source,
    Target,
    #[default]
    Both,
}

impl FromStr for SearchField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "source" => Ok(SearchField::Source),
            "target" => Ok(SearchField::Target),
            "both" => Ok(SearchField::Both),
            other => Err(format!(
                "unknown search type '{}' (expected source, target or both)",
                other
            )),
        }
    }
}

impl fmt::Display for SearchField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SearchField::Source => "source",
            SearchField::Target => "target",
            SearchField::Both => "both",
        })
    }
}

/// A (source, target) pair stored more than once
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Duplicate {
    pub source: String,
    pub target: String,
    pub count: usize,
}

/// Corpus-wide counters
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Statistics {
    pub total_words: usize,
    pub unique_sources: usize,
    pub multi_category_words: usize,
    pub total_categories: usize,
    pub categories: Vec<String>,
}

/// The far end of a relation, as currently stored
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct RelatedWord {
    pub source: String,
    pub target: String,
    pub relation_type: String,
}

/// A word in export form; absent fields are omitted, never null
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExportedWord {
    pub source: String,
    pub target: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<Gender>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plural: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub categories: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl From<&Word> for ExportedWord {
    fn from(word: &Word) -> Self {
        Self {
            source: word.source.clone(),
            target: word.target.clone(),
            gender: word.gender,
            plural: word.plural.clone().filter(|s| !s.is_empty()),
            categories: word.categories.clone(),
            notes: word.notes.clone().filter(|s| !s.is_empty()),
        }
    }
}

/// Enhanced-format document, loadable again by the vocabulary loader
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExportDocument {
    pub words: Vec<ExportedWord>,
}

/// Where the data lives and how much of it there is
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct DatabaseInfo {
    pub database_type: String,
    pub database_path: Option<PathBuf>,
    pub words: usize,
    pub categories: usize,
    pub relations: usize,
}

/// Reconciling repository of vocabulary entries
pub struct WordRepository {
    store: DocumentStore,
}

impl WordRepository {
    /// Open the repository backed by the store file at `path`
    pub fn open(path: &Path) -> StorageResult<Self> {
        Self::new(DocumentStore::open(path)?)
    }

    /// Open an in-memory repository (for testing)
    pub fn open_in_memory() -> StorageResult<Self> {
        Self::new(DocumentStore::open_in_memory()?)
    }

    /// Wrap an already opened store, seeding the category registry if empty
    pub fn new(store: DocumentStore) -> StorageResult<Self> {
        let mut repo = Self { store };
        repo.seed_categories()?;
        Ok(repo)
    }

    fn seed_categories(&mut self) -> StorageResult<()> {
        if self.store.count(CATEGORIES_TABLE)? > 0 {
            return Ok(());
        }

        let records = default_categories()
            .iter()
            .map(to_record)
            .collect::<StorageResult<Vec<_>>>()?;
        self.store.insert_many(CATEGORIES_TABLE, &records)?;

        debug!(count = records.len(), "seeded default categories");
        Ok(())
    }

    /// Access the underlying store
    pub fn store(&self) -> &DocumentStore {
        &self.store
    }

    // ==================== Reconciliation ====================

    /// Add a word, merging into an existing entry with the same content hash
    ///
    /// Returns the stored id and whether a new record was created.
    pub fn add_word(&mut self, new: &NewWord) -> StorageResult<(DocId, bool)> {
        let hash = new.content_hash();

        if let Some(existing) = self.find_by_hash(&hash)? {
            self.merge_into(&existing, new)?;
            debug!(id = existing.id, source = %new.source, target = %new.target, "merged into existing word");
            return Ok((existing.id, false));
        }

        let word = Word::from_new(new);
        let id = self.store.insert(WORDS_TABLE, &to_record(&word)?)?;

        debug!(id, source = %word.source, target = %word.target, "added new word");
        Ok((id, true))
    }

    /// Apply the merge rule: union categories, fill absent optional fields
    fn merge_into(&mut self, existing: &Word, incoming: &NewWord) -> StorageResult<()> {
        let mut categories = existing.categories.clone();
        for category in &incoming.categories {
            if !categories.contains(category) {
                categories.push(category.clone());
            }
        }

        let mut updates = Record::new();
        updates.insert("categories".to_string(), serde_json::to_value(&categories)?);
        updates.insert("updated_at".to_string(), serde_json::to_value(Utc::now())?);

        if existing.gender.is_none() {
            if let Some(gender) = incoming.gender {
                updates.insert("gender".to_string(), serde_json::to_value(gender)?);
            }
        }
        if let Some(plural) = fill(&existing.plural, &incoming.plural) {
            updates.insert("plural".to_string(), Value::String(plural));
        }
        if let Some(notes) = fill(&existing.notes, &incoming.notes) {
            updates.insert("notes".to_string(), Value::String(notes));
        }

        self.store.update(WORDS_TABLE, &updates, &[existing.id])
    }

    fn find_by_hash(&self, hash: &str) -> StorageResult<Option<Word>> {
        Ok(self
            .words_matching(&Query::eq("source_hash", hash))?
            .into_iter()
            .next())
    }

    /// Whether a word with this content hash is stored
    pub fn is_hash_present(&self, hash: &str) -> StorageResult<bool> {
        Ok(self.find_by_hash(hash)?.is_some())
    }

    // ==================== Word Queries ====================

    /// Get a word by id
    pub fn get_word(&self, id: DocId) -> StorageResult<Option<Word>> {
        self.store.get(WORDS_TABLE, id)?.map(to_word).transpose()
    }

    /// All words in store order
    pub fn all_words(&self) -> StorageResult<Vec<Word>> {
        self.store.all(WORDS_TABLE)?.into_iter().map(to_word).collect()
    }

    fn words_matching(&self, query: &Query) -> StorageResult<Vec<Word>> {
        self.store
            .search(WORDS_TABLE, query)?
            .into_iter()
            .map(to_word)
            .collect()
    }

    /// First word whose source matches exactly (case-sensitive)
    pub fn get_by_source(&self, source: &str) -> StorageResult<Option<Word>> {
        Ok(self
            .words_matching(&Query::eq("source", source))?
            .into_iter()
            .next())
    }

    /// Words belonging to `category`
    pub fn get_by_category(&self, category: &str) -> StorageResult<Vec<Word>> {
        self.words_matching(&Query::any_of("categories", [category]))
    }

    /// Words with the given gender
    pub fn get_by_gender(&self, gender: Gender) -> StorageResult<Vec<Word>> {
        self.words_matching(&Query::eq("gender", gender.as_str()))
    }

    /// Words that belong to more than one category
    pub fn get_multi_category(&self) -> StorageResult<Vec<Word>> {
        Ok(self
            .all_words()?
            .into_iter()
            .filter(Word::is_multi_category)
            .collect())
    }

    /// Every category used by any word, sorted
    pub fn get_all_categories(&self) -> StorageResult<Vec<String>> {
        let categories: BTreeSet<String> = self
            .all_words()?
            .into_iter()
            .flat_map(|w| w.categories)
            .collect();
        Ok(categories.into_iter().collect())
    }

    /// Substring search over source, target or both
    ///
    /// Matching is case-sensitive.
    pub fn search(&self, query: &str, field: SearchField) -> StorageResult<Vec<Word>> {
        let predicate = match field {
            SearchField::Source => Query::contains("source", query),
            SearchField::Target => Query::contains("target", query),
            SearchField::Both => {
                Query::contains("source", query).or(Query::contains("target", query))
            }
        };
        self.words_matching(&predicate)
    }

    /// Pairs stored more than once under exact string equality
    ///
    /// This groups by the literal (source, target) strings, not by the
    /// lower-cased content hash, so it reports records written outside the
    /// reconciliation path.
    pub fn get_duplicates(&self) -> StorageResult<Vec<Duplicate>> {
        let mut groups: Vec<Duplicate> = Vec::new();
        let mut index: HashMap<(String, String), usize> = HashMap::new();

        for word in self.all_words()? {
            let key = (word.source, word.target);
            match index.get(&key) {
                Some(&i) => groups[i].count += 1,
                None => {
                    index.insert(key.clone(), groups.len());
                    groups.push(Duplicate {
                        source: key.0,
                        target: key.1,
                        count: 1,
                    });
                }
            }
        }

        Ok(groups.into_iter().filter(|d| d.count > 1).collect())
    }

    /// Corpus-wide counters
    pub fn get_statistics(&self) -> StorageResult<Statistics> {
        let words = self.all_words()?;
        let unique_sources: HashSet<&str> = words.iter().map(|w| w.source.as_str()).collect();
        let categories = self.get_all_categories()?;

        Ok(Statistics {
            total_words: words.len(),
            unique_sources: unique_sources.len(),
            multi_category_words: words.iter().filter(|w| w.is_multi_category()).count(),
            total_categories: categories.len(),
            categories,
        })
    }

    /// Words sorted by source for export, optional fields omitted when absent
    ///
    /// The sort is stable: equal sources keep store order.
    pub fn export(&self) -> StorageResult<Vec<ExportedWord>> {
        let mut words = self.all_words()?;
        words.sort_by(|a, b| a.source.cmp(&b.source));
        Ok(words.iter().map(ExportedWord::from).collect())
    }

    /// Export wrapped as an enhanced-format document
    pub fn export_document(&self) -> StorageResult<ExportDocument> {
        Ok(ExportDocument {
            words: self.export()?,
        })
    }

    // ==================== Relations ====================

    /// Record a typed edge between two words
    ///
    /// Returns `false` when the identical edge already exists.
    pub fn add_relation(
        &mut self,
        word_id: DocId,
        related_word_id: DocId,
        relation_type: &str,
    ) -> StorageResult<bool> {
        let existing = self.store.search(
            RELATIONS_TABLE,
            &Query::eq("word_id", word_id)
                .and(Query::eq("related_word_id", related_word_id))
                .and(Query::eq("relation_type", relation_type)),
        )?;
        if !existing.is_empty() {
            return Ok(false);
        }

        let relation = WordRelation {
            word_id,
            related_word_id,
            relation_type: relation_type.to_string(),
        };
        self.store.insert(RELATIONS_TABLE, &to_record(&relation)?)?;
        Ok(true)
    }

    /// Outgoing relations of a word, resolved to the related word's text
    ///
    /// Relations pointing at missing words are skipped.
    pub fn get_relations(&self, word_id: DocId) -> StorageResult<Vec<RelatedWord>> {
        let mut related = Vec::new();

        for doc in self
            .store
            .search(RELATIONS_TABLE, &Query::eq("word_id", word_id))?
        {
            let (_, relation) = decode::<WordRelation>(RELATIONS_TABLE, doc)?;
            if let Some(word) = self.get_word(relation.related_word_id)? {
                related.push(RelatedWord {
                    source: word.source,
                    target: word.target,
                    relation_type: relation.relation_type,
                });
            }
        }

        Ok(related)
    }

    // ==================== Category Registry ====================

    /// Entries of the category registry
    pub fn get_registered_categories(&self) -> StorageResult<Vec<Category>> {
        self.store
            .all(CATEGORIES_TABLE)?
            .into_iter()
            .map(|doc| decode::<Category>(CATEGORIES_TABLE, doc).map(|(_, c)| c))
            .collect()
    }

    /// Add a registry entry unless one with the same name exists
    pub fn register_category(&mut self, name: &str, description: &str) -> StorageResult<bool> {
        if !self
            .store
            .search(CATEGORIES_TABLE, &Query::eq("name", name))?
            .is_empty()
        {
            return Ok(false);
        }

        self.store
            .insert(CATEGORIES_TABLE, &to_record(&Category::new(name, description))?)?;
        Ok(true)
    }

    // ==================== Maintenance ====================

    /// Remove all words, categories and relations. Irreversible.
    pub fn clear_all(&mut self) -> StorageResult<()> {
        self.store.truncate(WORDS_TABLE)?;
        self.store.truncate(CATEGORIES_TABLE)?;
        self.store.truncate(RELATIONS_TABLE)?;

        info!("cleared all tables");
        Ok(())
    }

    /// Backing file and table sizes
    pub fn database_info(&self) -> StorageResult<DatabaseInfo> {
        Ok(DatabaseInfo {
            database_type: "SQLite document store".to_string(),
            database_path: self.store.path().map(Path::to_path_buf),
            words: self.store.count(WORDS_TABLE)?,
            categories: self.store.count(CATEGORIES_TABLE)?,
            relations: self.store.count(RELATIONS_TABLE)?,
        })
    }

    /// Release the store handle
    pub fn close(self) -> StorageResult<()> {
        self.store.close()
    }
}

/// Incoming value to fill in when the existing one is absent
fn fill(existing: &Option<String>, incoming: &Option<String>) -> Option<String> {
    let existing_absent = existing.as_deref().map_or(true, str::is_empty);
    match incoming.as_deref() {
        Some(value) if existing_absent && !value.is_empty() => Some(value.to_string()),
        _ => None,
    }
}

fn to_record<T: Serialize>(value: &T) -> StorageResult<Record> {
    match serde_json::to_value(value)? {
        Value::Object(map) => Ok(map),
        other => Err(StorageError::Serialization(serde_json::Error::custom(
            format!("expected a JSON object, got {}", other),
        ))),
    }
}

fn decode<T: DeserializeOwned>(table: &str, doc: Document) -> StorageResult<(DocId, T)> {
    let id = doc.id;
    serde_json::from_value(Value::Object(doc.fields))
        .map(|value| (id, value))
        .map_err(|e| StorageError::InvalidRecord {
            table: table.to_string(),
            id,
            details: e.to_string(),
        })
}

fn to_word(doc: Document) -> StorageResult<Word> {
    let (id, mut word) = decode::<Word>(WORDS_TABLE, doc)?;
    word.id = id;
    Ok(word)
}

//! Quiz loading
//!
//! Quiz files group question/answer pairs into categorised blocks, with
//! per-side flags saying which media a card should carry:
//!
//! ```yaml
//! quizzes:
//!   - category: Capitals
//!     questions:
//!       - question: What is the capital of France?
//!         answer: Paris
//!         question_media: { audio: true }
//!         answer_media: { image: true, image_search_term: Eiffel Tower }
//! ```
//!
//! Stored quiz entries reuse the word repository, keyed apart from
//! vocabulary so equal text never merges across the two.

use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_yaml::{Mapping, Value};
use tracing::{debug, info, warn};

use crate::loader::{
    optional_text, parse_yaml, read_input, scalar_text, shape_name, untagged, LoadError,
    LoadResult,
};
use crate::models::{content_hash, EntryKind, NewWord, WordPair};
use crate::repository::WordRepository;
use crate::storage::{DocId, StorageResult};

/// Category for blocks that name none
pub const DEFAULT_QUIZ_CATEGORY: &str = "Uncategorized";

/// Language assumed for a side that names none
pub const DEFAULT_QUIZ_LANG: &str = "en";

/// Which media a card side carries
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct MediaConfig {
    pub text: bool,
    pub audio: bool,
    pub image: bool,
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            text: true,
            audio: false,
            image: false,
        }
    }
}

impl MediaConfig {
    /// Default flags with any boolean overrides from `overrides` applied
    fn merged(overrides: Option<&Mapping>) -> Self {
        let mut config = Self::default();
        let Some(overrides) = overrides else {
            return config;
        };

        for (flag, slot) in [
            ("text", &mut config.text),
            ("audio", &mut config.audio),
            ("image", &mut config.image),
        ] {
            match overrides.get(flag).map(untagged) {
                Some(Value::Bool(value)) => *slot = *value,
                Some(other) => debug!(flag, ?other, "ignoring non-boolean media flag"),
                None => {}
            }
        }

        config
    }
}

/// A canonical quiz question
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QuizRecord {
    pub question: String,
    pub answer: String,
    pub category: String,
    pub question_media: MediaConfig,
    pub answer_media: MediaConfig,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub question_image_search_term: String,
    pub answer_image_search_term: String,
    pub question_lang: String,
    pub answer_lang: String,
}

impl QuizRecord {
    /// Record with default media flags and languages
    pub fn new(question: impl Into<String>, answer: impl Into<String>) -> Self {
        let question = question.into();
        let answer = answer.into();
        Self {
            question_image_search_term: question.clone(),
            answer_image_search_term: answer.clone(),
            question,
            answer,
            category: DEFAULT_QUIZ_CATEGORY.to_string(),
            question_media: MediaConfig::default(),
            answer_media: MediaConfig::default(),
            notes: None,
            question_lang: DEFAULT_QUIZ_LANG.to_string(),
            answer_lang: DEFAULT_QUIZ_LANG.to_string(),
        }
    }

    /// The repository form of this question
    pub fn to_new_word(&self) -> NewWord {
        NewWord::new(&self.question, &self.answer)
            .with_categories([self.category.clone()])
            .with_kind(EntryKind::Quiz)
    }
}

/// Convert a parsed quiz document into canonical records
pub fn normalize(doc: &Value) -> LoadResult<Vec<QuizRecord>> {
    let doc = untagged(doc);
    let blocks: Vec<&Value> = match doc {
        Value::Mapping(map) => match map.get("quizzes").map(untagged) {
            Some(Value::Sequence(items)) => items.iter().collect(),
            _ => vec![doc],
        },
        Value::Sequence(items) => items.iter().collect(),
        other => {
            return Err(LoadError::UnsupportedShape(format!(
                "expected a mapping or a list of quiz blocks, got {}",
                shape_name(other)
            )))
        }
    };

    Ok(blocks.into_iter().flat_map(normalize_block).collect())
}

fn normalize_block(block: &Value) -> Vec<QuizRecord> {
    let Some(map) = untagged(block).as_mapping() else {
        debug!(?block, "skipping non-mapping quiz block");
        return Vec::new();
    };
    let Some(questions) = map.get("questions").map(untagged) else {
        debug!("skipping quiz block without questions");
        return Vec::new();
    };
    let Some(questions) = questions.as_sequence() else {
        debug!("skipping quiz block whose questions are not a list");
        return Vec::new();
    };

    let category =
        optional_text(map, "category").unwrap_or_else(|| DEFAULT_QUIZ_CATEGORY.to_string());

    questions
        .iter()
        .filter_map(|q| untagged(q).as_mapping())
        .filter_map(|q| normalize_question(q, &category))
        .collect()
}

fn normalize_question(map: &Mapping, category: &str) -> Option<QuizRecord> {
    let question = scalar_text(map.get("question")?)?;
    let answer = scalar_text(map.get("answer")?)?;

    let question_overrides = map.get("question_media").and_then(|v| untagged(v).as_mapping());
    let answer_overrides = map.get("answer_media").and_then(|v| untagged(v).as_mapping());

    let question_image_search_term = optional_text(map, "question_image_search_term")
        .or_else(|| question_overrides.and_then(|m| optional_text(m, "image_search_term")))
        .unwrap_or_else(|| question.clone());
    let answer_image_search_term = optional_text(map, "answer_image_search_term")
        .or_else(|| answer_overrides.and_then(|m| optional_text(m, "image_search_term")))
        .unwrap_or_else(|| answer.clone());

    Some(QuizRecord {
        category: category.to_string(),
        question_media: MediaConfig::merged(question_overrides),
        answer_media: MediaConfig::merged(answer_overrides),
        notes: optional_text(map, "notes"),
        question_image_search_term,
        answer_image_search_term,
        question_lang: optional_text(map, "question_lang")
            .unwrap_or_else(|| DEFAULT_QUIZ_LANG.to_string()),
        answer_lang: optional_text(map, "answer_lang")
            .unwrap_or_else(|| DEFAULT_QUIZ_LANG.to_string()),
        question,
        answer,
    })
}

/// Whether a batch may be used: non-empty, every question and answer filled
pub fn validate(records: &[QuizRecord]) -> bool {
    !records.is_empty()
        && records
            .iter()
            .all(|r| !r.question.is_empty() && !r.answer.is_empty())
}

/// Outcome of storing a batch of questions
#[derive(Debug, Clone, Default, Serialize)]
pub struct QuizStoreReport {
    pub added: usize,
    pub duplicates: Vec<WordPair>,
}

/// Loads quiz files and stores their questions
pub struct QuizLoader<'a> {
    repo: &'a mut WordRepository,
}

impl<'a> QuizLoader<'a> {
    pub fn new(repo: &'a mut WordRepository) -> Self {
        Self { repo }
    }

    /// Load and validate a quiz file
    pub fn load_file(&self, path: &Path) -> LoadResult<Vec<QuizRecord>> {
        let text = read_input(path)?;
        debug!(path = %path.display(), "loading quiz file");
        self.load_str(&text)
    }

    /// Load and validate quiz YAML text; nothing is stored
    pub fn load_str(&self, text: &str) -> LoadResult<Vec<QuizRecord>> {
        let records = normalize(&parse_yaml(text)?)?;

        if !validate(&records) {
            return Err(LoadError::Validation(if records.is_empty() {
                "no quiz questions found".to_string()
            } else {
                "every question needs a non-empty question and answer".to_string()
            }));
        }

        Ok(records)
    }

    /// Store one question through the reconciliation path
    pub fn store(&mut self, record: &QuizRecord) -> StorageResult<(DocId, bool)> {
        self.repo.add_word(&record.to_new_word())
    }

    /// Store every question, reporting the ones already present
    pub fn store_all(&mut self, records: &[QuizRecord]) -> StorageResult<QuizStoreReport> {
        let mut report = QuizStoreReport::default();

        for record in records {
            let (_, is_new) = self.store(record)?;
            if is_new {
                report.added += 1;
            } else {
                warn!(question = %record.question, "duplicate quiz question");
                report.duplicates.push(WordPair {
                    source: record.question.clone(),
                    target: record.answer.clone(),
                });
            }
        }

        info!(
            total = records.len(),
            added = report.added,
            duplicates = report.duplicates.len(),
            "quiz questions stored"
        );
        Ok(report)
    }

    /// Whether no quiz entry with this question and answer is stored yet
    pub fn is_unique(&self, question: &str, answer: &str) -> StorageResult<bool> {
        let hash = content_hash(question, answer, Some(EntryKind::Quiz));
        Ok(!self.repo.is_hash_present(&hash)?)
    }
}

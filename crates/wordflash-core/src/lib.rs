//! WordFlash Core Library
//!
//! This crate provides the core functionality for WordFlash, a vocabulary
//! and quiz store that feeds flashcard decks.
//!
//! # Architecture
//!
//! - **Document store**: named tables of JSON records in one SQLite file
//! - **Word repository**: content-hash deduplication and merge on insert
//!
//! Every input path (vocabulary files, quiz files) goes through
//! `WordRepository::add_word`, so each (source, target) pair is stored once.
//!
//! # Quick Start
//!
//! ```text
//! let config = Config::load()?;
//! let mut repo = WordRepository::open(&config.database_path())?;
//!
//! // Load a vocabulary file
//! let report = VocabularyLoader::new(&mut repo).load_file(Path::new("words.yaml"))?;
//!
//! // Query words
//! let animals = repo.get_by_category("animals")?;
//! ```
//!
//! # Modules
//!
//! - `repository`: Reconciling word repository (main entry point)
//! - `models`: Words, categories and relations
//! - `vocabulary`: Vocabulary file normalization and loading
//! - `quiz`: Quiz file normalization and loading
//! - `analysis`: Read-side reports
//! - `media`: Image and audio collaborator traits
//! - `deck`: Deck plans and packaging
//! - `storage`: Document store
//! - `config`: Application configuration

pub mod analysis;
pub mod config;
pub mod deck;
pub mod loader;
pub mod media;
pub mod models;
pub mod quiz;
pub mod repository;
pub mod storage;
pub mod vocabulary;

pub use analysis::{build_report, AnalysisReport, Recommendation, DEFAULT_OVERLAP_PAIRS};
pub use config::Config;
pub use deck::{DeckBuilder, DeckPackager, DeckPlan, JsonManifestPackager};
pub use loader::{LoadError, LoadResult};
pub use media::{AudioSynthesizer, ImageProvider, LocalMediaCache, MediaSources, NoMedia};
pub use models::{Category, EntryKind, Gender, NewWord, Word, WordPair, WordRelation};
pub use quiz::{MediaConfig, QuizLoader, QuizRecord};
pub use repository::{SearchField, WordRepository};
pub use storage::{DocId, DocumentStore, Query, StorageError, StorageResult};
pub use vocabulary::{LoadReport, VocabularyLoader};

//! Deck assembly
//!
//! Builds a `DeckPlan` (cards plus the media they reference) from word pairs
//! or quiz records. Writing the actual flashcard archive is left to a
//! `DeckPackager`; the core ships one that writes a JSON manifest.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::media::MediaSources;
use crate::models::WordPair;
use crate::quiz::{MediaConfig, QuizRecord};

/// Stable numeric id for a deck name: the first 8 hex digits of its MD5
pub fn deck_id(name: &str) -> u32 {
    let digest = md5::compute(name.as_bytes());
    u32::from_be_bytes([digest[0], digest[1], digest[2], digest[3]])
}

/// `<img>` tag for an existing image, empty otherwise
fn image_html(path: Option<&Path>) -> String {
    existing_file_name(path)
        .map(|name| format!("<img src=\"{}\">", name))
        .unwrap_or_default()
}

/// `[sound:..]` tag for an existing audio file, empty otherwise
fn audio_html(path: Option<&Path>) -> String {
    existing_file_name(path)
        .map(|name| format!("[sound:{}]", name))
        .unwrap_or_default()
}

fn existing_file_name(path: Option<&Path>) -> Option<String> {
    let path = path.filter(|p| p.is_file())?;
    Some(path.file_name()?.to_string_lossy().into_owned())
}

/// Image on the front; word, translation and audio on the back
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VocabularyCard {
    pub word: String,
    pub translation: String,
    pub image: Option<PathBuf>,
    pub audio: Option<PathBuf>,
}

impl VocabularyCard {
    /// Note fields in model order: Image, Word, Translation, Audio
    pub fn fields(&self) -> [String; 4] {
        [
            image_html(self.image.as_deref()),
            self.word.clone(),
            self.translation.clone(),
            audio_html(self.audio.as_deref()),
        ]
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QuizCard {
    pub question: String,
    pub answer: String,
    pub category: String,
    pub question_media: MediaConfig,
    pub answer_media: MediaConfig,
    pub question_image: Option<PathBuf>,
    pub question_audio: Option<PathBuf>,
    pub answer_image: Option<PathBuf>,
    pub answer_audio: Option<PathBuf>,
}

impl QuizCard {
    pub fn front(&self) -> String {
        render_side(
            &self.question,
            self.question_media,
            self.question_image.as_deref(),
            self.question_audio.as_deref(),
        )
    }

    pub fn back(&self) -> String {
        render_side(
            &self.answer,
            self.answer_media,
            self.answer_image.as_deref(),
            self.answer_audio.as_deref(),
        )
    }
}

fn render_side(text: &str, media: MediaConfig, image: Option<&Path>, audio: Option<&Path>) -> String {
    let mut parts = Vec::new();
    if media.text {
        parts.push(text.to_string());
    }
    parts.push(image_html(image));
    parts.push(audio_html(audio));
    parts.retain(|p| !p.is_empty());
    parts.join("<br>")
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DeckKind {
    Vocabulary,
    Quiz,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Card {
    Vocabulary(VocabularyCard),
    Quiz(QuizCard),
}

impl Card {
    fn media_paths(&self) -> Vec<&Path> {
        let paths = match self {
            Card::Vocabulary(card) => vec![card.image.as_deref(), card.audio.as_deref()],
            Card::Quiz(card) => vec![
                card.question_image.as_deref(),
                card.question_audio.as_deref(),
                card.answer_image.as_deref(),
                card.answer_audio.as_deref(),
            ],
        };
        paths.into_iter().flatten().collect()
    }
}

/// Everything a packager needs to write one deck
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DeckPlan {
    pub name: String,
    pub deck_id: u32,
    pub kind: DeckKind,
    pub cards: Vec<Card>,
}

impl DeckPlan {
    /// Media files referenced by the cards that exist on disk, each once
    pub fn media_files(&self) -> Vec<PathBuf> {
        let mut seen = HashSet::new();
        self.cards
            .iter()
            .flat_map(Card::media_paths)
            .filter(|p| p.is_file())
            .filter(|p| seen.insert(p.to_path_buf()))
            .map(Path::to_path_buf)
            .collect()
    }

    /// Archive name: deck name with spaces as underscores, `.apkg`
    pub fn package_file_name(&self) -> String {
        format!("{}.apkg", self.name.replace(' ', "_"))
    }
}

/// Turns word pairs or quiz records into deck plans
pub struct DeckBuilder {
    name: String,
    source_lang: String,
}

impl DeckBuilder {
    pub fn new(name: impl Into<String>, source_lang: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            source_lang: source_lang.into(),
        }
    }

    /// One card per pair: image searched by target, audio spoken from source
    pub fn vocabulary(&self, pairs: &[WordPair], media: MediaSources<'_>) -> DeckPlan {
        let cards = pairs
            .iter()
            .map(|pair| {
                let image = media.images.fetch_image(&pair.target, media.timeout);
                let audio = media.audio.synthesize(&pair.source, &self.source_lang);
                debug!(
                    source = %pair.source,
                    image = image.is_some(),
                    audio = audio.is_some(),
                    "vocabulary card"
                );
                Card::Vocabulary(VocabularyCard {
                    word: pair.source.clone(),
                    translation: pair.target.clone(),
                    image,
                    audio,
                })
            })
            .collect();

        self.plan(DeckKind::Vocabulary, cards)
    }

    /// One card per question, media requested only where its flags ask
    pub fn quiz(&self, records: &[QuizRecord], media: MediaSources<'_>) -> DeckPlan {
        let cards = records
            .iter()
            .map(|record| {
                let question_image = record
                    .question_media
                    .image
                    .then(|| {
                        media
                            .images
                            .fetch_image(&record.question_image_search_term, media.timeout)
                    })
                    .flatten();
                let question_audio = record
                    .question_media
                    .audio
                    .then(|| media.audio.synthesize(&record.question, &record.question_lang))
                    .flatten();
                let answer_image = record
                    .answer_media
                    .image
                    .then(|| {
                        media
                            .images
                            .fetch_image(&record.answer_image_search_term, media.timeout)
                    })
                    .flatten();
                let answer_audio = record
                    .answer_media
                    .audio
                    .then(|| media.audio.synthesize(&record.answer, &record.answer_lang))
                    .flatten();

                Card::Quiz(QuizCard {
                    question: record.question.clone(),
                    answer: record.answer.clone(),
                    category: record.category.clone(),
                    question_media: record.question_media,
                    answer_media: record.answer_media,
                    question_image,
                    question_audio,
                    answer_image,
                    answer_audio,
                })
            })
            .collect();

        self.plan(DeckKind::Quiz, cards)
    }

    fn plan(&self, kind: DeckKind, cards: Vec<Card>) -> DeckPlan {
        DeckPlan {
            name: self.name.clone(),
            deck_id: deck_id(&self.name),
            kind,
            cards,
        }
    }
}

/// Writes a deck plan to some output format
pub trait DeckPackager {
    /// Package `plan` into `output_dir`, returning the written file
    fn package(&self, plan: &DeckPlan, output_dir: &Path) -> Result<PathBuf>;
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DeckManifest {
    pub package: String,
    pub media_files: Vec<PathBuf>,
    #[serde(flatten)]
    pub plan: DeckPlan,
}

/// Writes the plan as `<package>.json` for an external archive builder
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonManifestPackager;

impl DeckPackager for JsonManifestPackager {
    fn package(&self, plan: &DeckPlan, output_dir: &Path) -> Result<PathBuf> {
        fs::create_dir_all(output_dir).with_context(|| {
            format!("Failed to create output directory: {}", output_dir.display())
        })?;

        let manifest = DeckManifest {
            package: plan.package_file_name(),
            media_files: plan.media_files(),
            plan: plan.clone(),
        };
        let path = output_dir.join(format!("{}.json", manifest.package));

        let json = serde_json::to_string_pretty(&manifest).context("Failed to serialize deck")?;
        fs::write(&path, json)
            .with_context(|| format!("Failed to write deck manifest: {}", path.display()))?;

        info!(
            path = %path.display(),
            cards = plan.cards.len(),
            media = manifest.media_files.len(),
            "deck manifest written"
        );
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::{LocalMediaCache, MediaSources, NoMedia};
    use std::time::Duration;
    use tempfile::TempDir;

    fn pair(source: &str, target: &str) -> WordPair {
        WordPair {
            source: source.to_string(),
            target: target.to_string(),
        }
    }

    /// Cache with an image for "dog" and audio for "Hund"
    fn cache(temp_dir: &TempDir) -> LocalMediaCache {
        let cache = LocalMediaCache::new(
            temp_dir.path().join("images"),
            temp_dir.path().join("audio"),
        );
        fs::create_dir_all(cache.images_dir()).unwrap();
        fs::create_dir_all(cache.audio_dir()).unwrap();
        fs::write(cache.image_path("dog"), b"jpeg").unwrap();
        fs::write(cache.audio_path("Hund"), b"mp3").unwrap();
        cache
    }

    #[test]
    fn test_deck_id_uses_md5_prefix() {
        let digest = format!("{:x}", md5::compute("WordFlash Deck"));
        let expected = u32::from_str_radix(&digest[..8], 16).unwrap();

        assert_eq!(deck_id("WordFlash Deck"), expected);
        assert_ne!(deck_id("WordFlash Deck"), deck_id("Quiz Deck"));
    }

    #[test]
    fn test_vocabulary_plan_with_media() {
        let temp_dir = TempDir::new().unwrap();
        let cache = cache(&temp_dir);
        let media = MediaSources::new(&cache, &cache, Duration::from_secs(30));

        let plan = DeckBuilder::new("German Animals", "de")
            .vocabulary(&[pair("Hund", "dog"), pair("Katze", "cat")], media);

        assert_eq!(plan.kind, DeckKind::Vocabulary);
        assert_eq!(plan.package_file_name(), "German_Animals.apkg");
        assert_eq!(plan.media_files().len(), 2);

        let Card::Vocabulary(hund) = &plan.cards[0] else {
            panic!("expected a vocabulary card");
        };
        let fields = hund.fields();
        assert!(fields[0].starts_with("<img src=\"dog_"));
        assert_eq!(fields[1], "Hund");
        assert!(fields[3].starts_with("[sound:Hund_"));

        let Card::Vocabulary(katze) = &plan.cards[1] else {
            panic!("expected a vocabulary card");
        };
        assert_eq!(katze.fields()[0], "");
        assert_eq!(katze.fields()[3], "");
    }

    #[test]
    fn test_missing_media_files_render_empty() {
        let card = VocabularyCard {
            word: "Hund".to_string(),
            translation: "dog".to_string(),
            image: Some(PathBuf::from("/nonexistent/dog.jpg")),
            audio: None,
        };
        assert_eq!(card.fields()[0], "");
    }

    #[test]
    fn test_media_files_listed_once() {
        let temp_dir = TempDir::new().unwrap();
        let cache = cache(&temp_dir);
        let media = MediaSources::new(&cache, &cache, Duration::from_secs(1));

        let plan = DeckBuilder::new("Deck", "de")
            .vocabulary(&[pair("Hund", "dog"), pair("Hund", "dog")], media);
        assert_eq!(plan.media_files().len(), 2);
    }

    #[test]
    fn test_quiz_plan_honours_media_flags() {
        let temp_dir = TempDir::new().unwrap();
        let cache = cache(&temp_dir);
        let media = MediaSources::new(&cache, &cache, Duration::from_secs(1));

        let mut with_image = QuizRecord::new("Which animal barks?", "Hund");
        with_image.question_image_search_term = "dog".to_string();
        with_image.question_media.image = true;
        with_image.answer_media.audio = true;
        with_image.answer_media.text = false;

        let plain = QuizRecord::new("Hund", "dog");

        let plan = DeckBuilder::new("Quiz Deck", "de").quiz(&[with_image, plain], media);
        assert_eq!(plan.kind, DeckKind::Quiz);

        let Card::Quiz(first) = &plan.cards[0] else {
            panic!("expected a quiz card");
        };
        assert!(first.question_image.is_some());
        assert!(first.answer_audio.is_some());
        assert!(first.front().starts_with("Which animal barks?<br><img"));
        assert!(first.back().starts_with("[sound:Hund_"));

        // Default flags never ask for media, even when it exists
        let Card::Quiz(second) = &plan.cards[1] else {
            panic!("expected a quiz card");
        };
        assert!(second.question_audio.is_none());
        assert!(second.answer_image.is_none());
        assert_eq!(second.front(), "Hund");
    }

    #[test]
    fn test_text_only_deck() {
        let plan = DeckBuilder::new("Plain", "de")
            .vocabulary(&[pair("Hund", "dog")], MediaSources::new(&NoMedia, &NoMedia, Duration::ZERO));
        assert!(plan.media_files().is_empty());
    }

    #[test]
    fn test_json_manifest_packager() {
        let temp_dir = TempDir::new().unwrap();
        let output = temp_dir.path().join("output");
        let plan = DeckBuilder::new("WordFlash Deck", "de")
            .vocabulary(&[pair("Hund", "dog")], MediaSources::none());

        let path = JsonManifestPackager.package(&plan, &output).unwrap();
        assert_eq!(path, output.join("WordFlash_Deck.apkg.json"));

        let manifest: DeckManifest =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(manifest.package, "WordFlash_Deck.apkg");
        assert_eq!(manifest.plan, plan);
    }
}

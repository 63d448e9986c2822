//! Media collaborators
//!
//! Fetching images and synthesizing speech happen outside the core. Deck
//! assembly only asks these traits for a file path; a `None` means the card
//! is built without that media.

use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::debug;

/// Extension used for cached images
pub const IMAGE_EXTENSION: &str = ".jpg";
/// Extension used for cached audio
pub const AUDIO_EXTENSION: &str = ".mp3";

const SAFE_PREFIX_LEN: usize = 20;

/// Finds an image for a search term
pub trait ImageProvider {
    fn fetch_image(&self, term: &str, timeout: Duration) -> Option<PathBuf>;
}

/// Renders text as speech in the given language
pub trait AudioSynthesizer {
    fn synthesize(&self, text: &str, lang: &str) -> Option<PathBuf>;
}

/// Deterministic media file name for a piece of text
///
/// Up to 20 alphanumeric, `-` or `_` characters of the text, then `_`, the
/// first 8 hex digits of its MD5 and the extension.
pub fn media_filename(text: &str, extension: &str) -> String {
    let safe: String = text
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == '-' || *c == '_')
        .take(SAFE_PREFIX_LEN)
        .collect();
    let digest = format!("{:x}", md5::compute(text.as_bytes()));
    format!("{}_{}{}", safe, &digest[..8], extension)
}

/// Media already present on disk under the deterministic names
#[derive(Debug, Clone)]
pub struct LocalMediaCache {
    images_dir: PathBuf,
    audio_dir: PathBuf,
}

impl LocalMediaCache {
    pub fn new(images_dir: impl Into<PathBuf>, audio_dir: impl Into<PathBuf>) -> Self {
        Self {
            images_dir: images_dir.into(),
            audio_dir: audio_dir.into(),
        }
    }

    pub fn image_path(&self, term: &str) -> PathBuf {
        self.images_dir.join(media_filename(term, IMAGE_EXTENSION))
    }

    /// Audio names depend on the text only, not the language
    pub fn audio_path(&self, text: &str) -> PathBuf {
        self.audio_dir.join(media_filename(text, AUDIO_EXTENSION))
    }

    pub fn images_dir(&self) -> &Path {
        &self.images_dir
    }

    pub fn audio_dir(&self) -> &Path {
        &self.audio_dir
    }
}

fn existing(path: PathBuf) -> Option<PathBuf> {
    if path.is_file() {
        Some(path)
    } else {
        debug!(path = %path.display(), "no cached media");
        None
    }
}

impl ImageProvider for LocalMediaCache {
    fn fetch_image(&self, term: &str, _timeout: Duration) -> Option<PathBuf> {
        existing(self.image_path(term))
    }
}

impl AudioSynthesizer for LocalMediaCache {
    fn synthesize(&self, text: &str, _lang: &str) -> Option<PathBuf> {
        existing(self.audio_path(text))
    }
}

/// Provides nothing; decks come out text-only
#[derive(Debug, Clone, Copy, Default)]
pub struct NoMedia;

impl ImageProvider for NoMedia {
    fn fetch_image(&self, _term: &str, _timeout: Duration) -> Option<PathBuf> {
        None
    }
}

impl AudioSynthesizer for NoMedia {
    fn synthesize(&self, _text: &str, _lang: &str) -> Option<PathBuf> {
        None
    }
}

/// The collaborators a deck build draws on
#[derive(Clone, Copy)]
pub struct MediaSources<'a> {
    pub images: &'a dyn ImageProvider,
    pub audio: &'a dyn AudioSynthesizer,
    /// Passed through to `fetch_image`
    pub timeout: Duration,
}

impl<'a> MediaSources<'a> {
    pub fn new(
        images: &'a dyn ImageProvider,
        audio: &'a dyn AudioSynthesizer,
        timeout: Duration,
    ) -> Self {
        Self {
            images,
            audio,
            timeout,
        }
    }

    /// Sources that never provide media
    pub fn none() -> MediaSources<'static> {
        MediaSources {
            images: &NoMedia,
            audio: &NoMedia,
            timeout: Duration::ZERO,
        }
    }
}

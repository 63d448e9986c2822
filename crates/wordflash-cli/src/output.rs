//! Output formatting for CLI
//!
//! Provides consistent output formatting across all commands:
//! - Human-readable default output
//! - JSON output (--json flag)
//! - Quiet mode for scripting (--quiet flag)

use serde::Serialize;

use wordflash_core::repository::{Duplicate, RelatedWord, Statistics};
use wordflash_core::{Category, Word};

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable output (default)
    Human,
    /// JSON output
    Json,
    /// Quiet mode - minimal output
    Quiet,
}

impl OutputFormat {
    /// Create format from CLI flags
    pub fn from_flags(json: bool, quiet: bool) -> Self {
        if quiet {
            OutputFormat::Quiet
        } else if json {
            OutputFormat::Json
        } else {
            OutputFormat::Human
        }
    }
}

/// Output helper for consistent formatting
pub struct Output {
    /// The output format
    pub format: OutputFormat,
}

impl Output {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Check if output is in quiet mode
    pub fn is_quiet(&self) -> bool {
        matches!(self.format, OutputFormat::Quiet)
    }

    pub fn is_json(&self) -> bool {
        matches!(self.format, OutputFormat::Json)
    }

    /// Print any serializable value as pretty JSON
    pub fn print_json<T: Serialize + ?Sized>(&self, value: &T) {
        match serde_json::to_string_pretty(value) {
            Ok(json) => println!("{}", json),
            Err(e) => eprintln!("Failed to serialize output: {}", e),
        }
    }

    /// Print a list of words with their details
    ///
    /// `context_category` hides that category from each word's list.
    pub fn print_words(&self, words: &[Word], context_category: Option<&str>) {
        match self.format {
            OutputFormat::Human => {
                if words.is_empty() {
                    println!("No words found.");
                    return;
                }
                for word in words {
                    println!("{:>4}  '{}' -> '{}'", word.id, word.source, word.target);
                    match context_category {
                        Some(current) => {
                            let others: Vec<&str> = word
                                .categories
                                .iter()
                                .map(String::as_str)
                                .filter(|c| *c != current)
                                .collect();
                            if !others.is_empty() {
                                println!("      Also in: {}", others.join(", "));
                            }
                        }
                        None => println!("      Categories: {}", word.categories.join(", ")),
                    }
                    if let Some(gender) = word.gender {
                        println!("      Gender: {}", gender);
                    }
                    if let Some(ref plural) = word.plural {
                        println!("      Plural: {}", plural);
                    }
                    if let Some(ref notes) = word.notes {
                        println!("      Notes: {}", truncate(notes, 60));
                    }
                }
                println!("\n{} word(s)", words.len());
            }
            OutputFormat::Json => {
                let json: Vec<_> = words
                    .iter()
                    .map(|w| serde_json::json!({"id": w.id, "word": w}))
                    .collect();
                self.print_json(&json);
            }
            OutputFormat::Quiet => {
                for word in words {
                    println!("{}", word.id);
                }
            }
        }
    }

    /// Print corpus statistics
    pub fn print_statistics(&self, stats: &Statistics) {
        match self.format {
            OutputFormat::Human => {
                println!("Total words:          {}", stats.total_words);
                println!("Unique source words:  {}", stats.unique_sources);
                println!("Multi-category words: {}", stats.multi_category_words);
                println!("Total categories:     {}", stats.total_categories);
                if !stats.categories.is_empty() {
                    println!("Categories:           {}", stats.categories.join(", "));
                }
            }
            OutputFormat::Json => self.print_json(stats),
            OutputFormat::Quiet => println!("{}", stats.total_words),
        }
    }

    /// Print duplicate groups
    pub fn print_duplicates(&self, duplicates: &[Duplicate]) {
        match self.format {
            OutputFormat::Human => {
                if duplicates.is_empty() {
                    println!("No duplicates found.");
                    return;
                }
                for dup in duplicates {
                    println!(
                        "'{}' -> '{}' (appears {} times)",
                        dup.source, dup.target, dup.count
                    );
                }
            }
            OutputFormat::Json => self.print_json(duplicates),
            OutputFormat::Quiet => {
                for dup in duplicates {
                    println!("{}\t{}", dup.source, dup.target);
                }
            }
        }
    }

    /// Print the relations of one word
    pub fn print_relations(&self, relations: &[RelatedWord]) {
        match self.format {
            OutputFormat::Human => {
                if relations.is_empty() {
                    println!("No relations found.");
                    return;
                }
                for rel in relations {
                    println!("[{}] '{}' -> '{}'", rel.relation_type, rel.source, rel.target);
                }
            }
            OutputFormat::Json => self.print_json(relations),
            OutputFormat::Quiet => {
                for rel in relations {
                    println!("{}", rel.source);
                }
            }
        }
    }

    /// Print the category registry
    pub fn print_categories(&self, categories: &[Category]) {
        match self.format {
            OutputFormat::Human => {
                if categories.is_empty() {
                    println!("No categories registered.");
                    return;
                }
                for category in categories {
                    println!("{:<20} {}", category.name, category.description);
                }
                println!("\n{} categor(ies)", categories.len());
            }
            OutputFormat::Json => self.print_json(categories),
            OutputFormat::Quiet => {
                for category in categories {
                    println!("{}", category.name);
                }
            }
        }
    }

    /// Print a success message
    pub fn success(&self, message: &str) {
        match self.format {
            OutputFormat::Human => println!("✓ {}", message),
            OutputFormat::Json => {
                println!(
                    "{}",
                    serde_json::json!({"status": "success", "message": message})
                );
            }
            OutputFormat::Quiet => {}
        }
    }

    /// Print a warning to stderr (suppressed in quiet mode)
    pub fn warning(&self, message: &str) {
        if !self.is_quiet() {
            eprintln!("! {}", message);
        }
    }

    /// Check if we should prompt for confirmation
    pub fn should_prompt(&self) -> bool {
        self.format == OutputFormat::Human
    }

    /// Print an informational message
    pub fn message(&self, msg: &str) {
        match self.format {
            OutputFormat::Human => println!("{}", msg),
            OutputFormat::Json => {
                println!("{}", serde_json::json!({"message": msg}));
            }
            OutputFormat::Quiet => {}
        }
    }
}

/// Truncate a string to max characters, adding "..." if truncated
pub fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

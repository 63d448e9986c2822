//! Analyze command handler

use std::path::Path;

use anyhow::Result;

use wordflash_core::analysis::AnalysisReport;
use wordflash_core::{build_report, WordRepository, DEFAULT_OVERLAP_PAIRS};

use crate::commands::words;
use crate::output::{Output, OutputFormat};

/// Multi-category words listed before the rest are summarised
const MULTI_CATEGORY_PREVIEW: usize = 20;

/// Print the full vocabulary report, optionally loading a file first
pub fn run(repo: &mut WordRepository, file: Option<&Path>, output: &Output) -> Result<()> {
    if let Some(file) = file {
        // Only the report goes to stdout in machine-readable modes
        let quiet = Output::new(OutputFormat::Quiet);
        let load_output = if output.format == OutputFormat::Human {
            output
        } else {
            &quiet
        };
        words::load(repo, file, load_output)?;
    }

    let report = build_report(repo, DEFAULT_OVERLAP_PAIRS)?;

    match output.format {
        OutputFormat::Json => output.print_json(&report),
        OutputFormat::Quiet => {
            for rec in &report.recommendations {
                println!("{}", rec);
            }
        }
        OutputFormat::Human => print_report(&report),
    }

    Ok(())
}

fn print_header(title: &str) {
    println!();
    println!("{}", "=".repeat(60));
    println!(" {}", title);
    println!("{}", "=".repeat(60));
}

fn print_section(title: &str) {
    println!();
    println!("{}:", title);
    println!("{}", "-".repeat(title.len() + 1));
}

fn print_report(report: &AnalysisReport) {
    let stats = &report.statistics;

    print_header("Vocabulary Statistics");
    println!("Total words in database: {}", stats.total_words);
    println!("Unique source words: {}", stats.unique_sources);
    println!("Multi-category words: {}", stats.multi_category_words);
    println!("Total categories: {}", stats.total_categories);

    print_section("Categories");
    for (i, category) in stats.categories.iter().enumerate() {
        let count = report
            .category_distribution
            .get(category)
            .copied()
            .unwrap_or(0);
        println!("  {:2}. {:<20} ({:3} words)", i + 1, category, count);
    }

    print_section("Duplicate Words");
    if report.duplicates.is_empty() {
        println!("  No duplicates found");
    } else {
        for dup in &report.duplicates {
            println!(
                "  '{}' -> '{}' (appears {} times)",
                dup.source, dup.target, dup.count
            );
        }
    }

    if !report.multi_category_words.is_empty() {
        print_section("Multi-Category Words");
        println!(
            "Found {} words that appear in multiple categories:",
            report.multi_category_words.len()
        );
        for word in report.multi_category_words.iter().take(MULTI_CATEGORY_PREVIEW) {
            println!("  '{}' -> '{}'", word.source, word.target);
            println!("    Categories: {}", word.categories.join(", "));
            if let Some(ref notes) = word.notes {
                println!("    Notes: {}", notes);
            }
        }
        if report.multi_category_words.len() > MULTI_CATEGORY_PREVIEW {
            println!(
                "  ... and {} more",
                report.multi_category_words.len() - MULTI_CATEGORY_PREVIEW
            );
        }
    }

    print_header("Category Analysis");
    if report.overlaps.is_empty() {
        println!("No overlap between related categories");
    }
    for overlap in &report.overlaps {
        println!(
            "\nOverlap between '{}' and '{}': {} words",
            overlap.first,
            overlap.second,
            overlap.words.len()
        );
        for word in &overlap.words {
            println!("  - {}", word);
        }
    }

    print_header("Gender Distribution");
    if report.gender.total_gendered == 0 {
        println!("No gender information found");
    } else {
        println!(
            "Words with gender information: {}",
            report.gender.total_gendered
        );
        for entry in &report.gender.genders {
            println!(
                "  {:<10}: {:3} ({:5.1}%)",
                entry.gender.as_str(),
                entry.count,
                entry.percentage
            );
        }
    }

    print_header("Recommendations");
    if report.recommendations.is_empty() {
        println!("  Vocabulary structure looks good!");
    }
    for (i, rec) in report.recommendations.iter().enumerate() {
        println!("  {}. {}", i + 1, rec);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_analyze_loads_file_first() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("words.yaml");
        fs::write(&file, "- {source: Lachs, target: salmon, categories: [food, sea_animals]}\n").unwrap();

        let mut repo = WordRepository::open_in_memory().unwrap();
        run(&mut repo, Some(&file), &Output::new(OutputFormat::Quiet)).unwrap();

        assert_eq!(repo.get_statistics().unwrap().total_words, 1);
    }

    #[test]
    fn test_analyze_empty_store() {
        let mut repo = WordRepository::open_in_memory().unwrap();
        run(&mut repo, None, &Output::new(OutputFormat::Human)).unwrap();
    }
}

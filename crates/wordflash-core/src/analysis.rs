//! Read-side reports over the stored vocabulary

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::Serialize;

use crate::models::{Gender, Word};
use crate::repository::{Duplicate, Statistics, WordRepository};
use crate::storage::StorageResult;
use crate::vocabulary::analyze;

/// Categories with fewer words than this are flagged for expansion
pub const SMALL_CATEGORY_THRESHOLD: usize = 5;

/// Category pairs whose overlap is worth reporting
pub const DEFAULT_OVERLAP_PAIRS: &[(&str, &str)] = &[
    ("food", "sea_animals"),
    ("vehicles", "transportation"),
    ("hotel", "travel"),
    ("professions", "work"),
    ("toys", "children"),
];

/// Number of words in each category
pub fn category_distribution(repo: &WordRepository) -> StorageResult<BTreeMap<String, usize>> {
    let mut distribution = BTreeMap::new();
    for word in repo.all_words()? {
        for category in word.categories {
            *distribution.entry(category).or_insert(0) += 1;
        }
    }
    Ok(distribution)
}

/// Sources present in both categories, sorted
pub fn category_overlap(
    repo: &WordRepository,
    first: &str,
    second: &str,
) -> StorageResult<Vec<String>> {
    let mut a = BTreeSet::new();
    let mut b = BTreeSet::new();
    for word in repo.all_words()? {
        if word.has_category(first) {
            a.insert(word.source.clone());
        }
        if word.has_category(second) {
            b.insert(word.source);
        }
    }
    Ok(a.intersection(&b).cloned().collect())
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct GenderCount {
    pub gender: Gender,
    pub count: usize,
    pub percentage: f64,
}

/// Gender counts over the words that carry one
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct GenderDistribution {
    pub total_gendered: usize,
    /// Masculine, feminine, neuter order; genders nobody has are left out
    pub genders: Vec<GenderCount>,
}

pub fn gender_distribution(repo: &WordRepository) -> StorageResult<GenderDistribution> {
    let words = repo.all_words()?;
    let total_gendered = words.iter().filter(|w| w.gender.is_some()).count();

    let genders = Gender::ALL
        .iter()
        .filter_map(|&gender| {
            let count = words.iter().filter(|w| w.gender == Some(gender)).count();
            (count > 0).then(|| GenderCount {
                gender,
                count,
                percentage: count as f64 * 100.0 / total_gendered as f64,
            })
        })
        .collect();

    Ok(GenderDistribution {
        total_gendered,
        genders,
    })
}

/// A suggested cleanup
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Recommendation {
    ReviewDuplicates { count: usize },
    SpecializedDecks { count: usize },
    AddGender { count: usize },
    ExpandCategories { count: usize },
}

impl fmt::Display for Recommendation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Recommendation::ReviewDuplicates { count } => {
                write!(f, "Review {} duplicate entries", count)
            }
            Recommendation::SpecializedDecks { count } => write!(
                f,
                "Consider creating specialized decks for {} multi-category words",
                count
            ),
            Recommendation::AddGender { count } => {
                write!(f, "Add gender information for {} words", count)
            }
            Recommendation::ExpandCategories { count } => write!(
                f,
                "Consider expanding {} categories with few words",
                count
            ),
        }
    }
}

pub fn recommendations(
    statistics: &Statistics,
    duplicate_count: usize,
    gender: &GenderDistribution,
    distribution: &BTreeMap<String, usize>,
) -> Vec<Recommendation> {
    let mut out = Vec::new();

    if duplicate_count > 0 {
        out.push(Recommendation::ReviewDuplicates {
            count: duplicate_count,
        });
    }
    if statistics.multi_category_words > 0 {
        out.push(Recommendation::SpecializedDecks {
            count: statistics.multi_category_words,
        });
    }

    let missing_gender = statistics.total_words.saturating_sub(gender.total_gendered);
    if missing_gender > 0 {
        out.push(Recommendation::AddGender {
            count: missing_gender,
        });
    }

    let small = distribution
        .values()
        .filter(|&&count| count < SMALL_CATEGORY_THRESHOLD)
        .count();
    if small > 0 {
        out.push(Recommendation::ExpandCategories { count: small });
    }

    out
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CategoryOverlap {
    pub first: String,
    pub second: String,
    pub words: Vec<String>,
}

/// Everything `wordflash analyze` prints
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    pub statistics: Statistics,
    pub category_distribution: BTreeMap<String, usize>,
    pub duplicates: Vec<Duplicate>,
    pub multi_category_words: Vec<Word>,
    /// Only pairs that actually share words
    pub overlaps: Vec<CategoryOverlap>,
    pub gender: GenderDistribution,
    pub recommendations: Vec<Recommendation>,
}

pub fn build_report(
    repo: &WordRepository,
    overlap_pairs: &[(&str, &str)],
) -> StorageResult<AnalysisReport> {
    let vocabulary = analyze(repo)?;
    let gender = gender_distribution(repo)?;

    let mut overlaps = Vec::new();
    for &(first, second) in overlap_pairs {
        let words = category_overlap(repo, first, second)?;
        if !words.is_empty() {
            overlaps.push(CategoryOverlap {
                first: first.to_string(),
                second: second.to_string(),
                words,
            });
        }
    }

    let recommendations = recommendations(
        &vocabulary.statistics,
        vocabulary.duplicates.len(),
        &gender,
        &vocabulary.category_distribution,
    );

    Ok(AnalysisReport {
        statistics: vocabulary.statistics,
        category_distribution: vocabulary.category_distribution,
        duplicates: vocabulary.duplicates,
        multi_category_words: vocabulary.multi_category_words,
        overlaps,
        gender,
        recommendations,
    })
}

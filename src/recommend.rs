use serde::Serialize;
use std::path::Path;
use thiserror::Error;

use crate::templates::{self, RegistryError, TemplateEntry, TemplateRegistry};

/// Change-type spellings accepted for a direct template match.
const CHANGE_TYPE_SYNONYMS: &[(&str, &str)] = &[
    ("bug", "bug"),
    ("fix", "bug"),
    ("bugfix", "bug"),
    ("feature", "feature"),
    ("feat", "feature"),
    ("enhancement", "feature"),
    ("docs", "docs"),
    ("documentation", "docs"),
    ("refactor", "refactor"),
    ("test", "test"),
    ("tests", "test"),
    ("testing", "test"),
    ("security", "security"),
    ("performance", "performance"),
    ("perf", "performance"),
    ("optimization", "performance"),
];

/// Keywords per category. Order matters: ties go to the earlier category.
///
/// Matching is plain substring containment, so a keyword that is part of a
/// longer word also counts ("testing" scores both "test" and "testing").
const CATEGORY_KEYWORDS: &[(&str, &[&str])] = &[
    (
        "bug",
        &["bug", "fix", "issue", "problem", "error", "crash", "resolve"],
    ),
    (
        "feature",
        &["feature", "add", "new", "implement", "enhancement", "functionality"],
    ),
    (
        "docs",
        &["docs", "documentation", "readme", "comment", "guide", "tutorial"],
    ),
    (
        "refactor",
        &["refactor", "clean", "improve", "simplify", "restructure", "redesign"],
    ),
    (
        "test",
        &["test", "coverage", "unit test", "integration test", "e2e", "testing"],
    ),
    (
        "security",
        &["security", "vulnerability", "secure", "protect", "encrypt", "auth"],
    ),
    (
        "performance",
        &["performance", "optimize", "speed", "efficient", "fast", "slow"],
    ),
];

/// Template used when nothing matches, if present.
const DEFAULT_TEMPLATE: &str = "feature";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    High,
    Medium,
    Low,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Recommendation {
    pub suggestion: String,
    pub template: TemplateEntry,
    pub confidence: Confidence,
    pub reason: String,
}

#[derive(Debug, Error)]
pub enum RecommendError {
    #[error("Failed to get templates: {0}")]
    Registry(#[from] RegistryError),
    #[error("No templates available")]
    NoTemplates,
}

/// Pick a template from `templates_dir` for the described change.
pub fn suggest_template(
    changes_summary: &str,
    change_type: &str,
    templates_dir: &Path,
) -> Result<Recommendation, RecommendError> {
    let registry = templates::list_templates(templates_dir)?;
    recommend(&registry, changes_summary, change_type)
}

/// Pick a template from an already loaded registry.
///
/// Tries, in order: a direct mapping of `change_type`, keyword scoring of
/// `changes_summary`, then the default template or the first one found.
pub fn recommend(
    registry: &TemplateRegistry,
    changes_summary: &str,
    change_type: &str,
) -> Result<Recommendation, RecommendError> {
    if registry.is_empty() {
        return Err(RecommendError::NoTemplates);
    }

    if let Some(category) = canonical_category(change_type) {
        if let Some(template) = registry.get(category) {
            log::debug!(
                "Change type {change_type:?} maps directly to {}",
                template.name()
            );
            return Ok(Recommendation {
                suggestion: category.to_string(),
                template: template.clone(),
                confidence: Confidence::High,
                reason: format!("Direct match for change type '{change_type}'"),
            });
        }
        log::debug!("Change type {change_type:?} maps to {category}, which has no template");
    }

    if let Some((category, score)) = best_category(changes_summary) {
        match registry.get(category) {
            Some(template) => {
                log::debug!("Summary scored {score} for {category}");
                let confidence = if score > 2 {
                    Confidence::Medium
                } else {
                    Confidence::Low
                };
                return Ok(Recommendation {
                    suggestion: category.to_string(),
                    template: template.clone(),
                    confidence,
                    reason: format!("Based on {score} keyword matches in the changes summary"),
                });
            }
            None => log::debug!("Best keyword category {category} has no template"),
        }
    }

    if let Some(template) = registry.get(DEFAULT_TEMPLATE) {
        return Ok(Recommendation {
            suggestion: DEFAULT_TEMPLATE.to_string(),
            template: template.clone(),
            confidence: Confidence::Low,
            reason: "No strong match found, defaulting to feature template".to_string(),
        });
    }

    let (name, template) = registry.first().ok_or(RecommendError::NoTemplates)?;
    Ok(Recommendation {
        suggestion: name.to_string(),
        template: template.clone(),
        confidence: Confidence::Low,
        reason: "No match found, using first available template".to_string(),
    })
}

fn canonical_category(change_type: &str) -> Option<&'static str> {
    let normalized = change_type.trim().to_lowercase();
    CHANGE_TYPE_SYNONYMS
        .iter()
        .find(|(alias, _)| *alias == normalized)
        .map(|(_, category)| *category)
}

/// Keyword hit counts per category, in declaration order.
pub fn keyword_scores(changes_summary: &str) -> Vec<(&'static str, usize)> {
    let summary = changes_summary.to_lowercase();
    CATEGORY_KEYWORDS
        .iter()
        .map(|(category, keywords)| {
            let hits = keywords.iter().filter(|kw| summary.contains(**kw)).count();
            (*category, hits)
        })
        .collect()
}

/// The strictly highest scoring category, or `None` when nothing matched.
fn best_category(changes_summary: &str) -> Option<(&'static str, usize)> {
    let mut best: Option<(&'static str, usize)> = None;
    for (category, score) in keyword_scores(changes_summary) {
        if score > best.map_or(0, |(_, s)| s) {
            best = Some((category, score));
        }
    }
    best
}

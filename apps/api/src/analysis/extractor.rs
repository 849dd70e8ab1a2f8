//! Response Extractor: recovers score, issue count, strengths and improvements
//! from the model's reply.
//!
//! A reply that is a JSON object with the analysis keys is read directly.
//! Anything else goes through the free-text path: ordered regex fallbacks for the
//! score, a header match for the issue count, and header-delimited spans for the
//! two lists. Missing pieces fall back to fixed defaults; extraction never fails.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::llm_client::strip_json_fences;

pub const MAX_SCORE: u32 = 100;
/// Score used when no pattern matches.
pub const FALLBACK_SCORE: u32 = 78;
pub const MAX_LIST_ITEMS: usize = 3;
/// Fragments shorter than this (after trimming) are dropped.
pub const MIN_ITEM_CHARS: usize = 4;

pub const DEFAULT_STRENGTHS: [&str; 3] = ["Clear explanation", "Good effort", "Solid structure"];
pub const DEFAULT_IMPROVEMENTS: [&str; 3] =
    ["Needs deeper analysis", "Provide examples", "Improve clarity"];

/// Structured result for one submission. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtractedAnalysis {
    /// Always within 0..=100.
    pub score: u32,
    pub issue_count: u32,
    pub strengths: Vec<String>,
    pub improvements: Vec<String>,
    pub raw_feedback: String,
}

impl ExtractedAnalysis {
    /// Placeholder for a submission whose model call failed.
    pub fn failed(reason: impl std::fmt::Display) -> Self {
        Self {
            score: 0,
            issue_count: 0,
            strengths: Vec::new(),
            improvements: Vec::new(),
            raw_feedback: format!("Error analyzing submission: {reason}"),
        }
    }
}

struct ScorePattern {
    regex: Regex,
    /// 10 for "N/10"-style matches, 1 otherwise.
    multiplier: u32,
}

impl ScorePattern {
    fn new(pattern: &str, multiplier: u32) -> Self {
        Self {
            regex: Regex::new(pattern).expect("score pattern must compile"),
            multiplier,
        }
    }
}

// Priority order matters: the first pattern that matches wins.
// Markdown emphasis (`**`, `_`) may wrap the header or the number.
static SCORE_PATTERNS: Lazy<Vec<ScorePattern>> = Lazy::new(|| {
    vec![
        ScorePattern::new(
            r"(?i)estimated\s+score\s*(?:\(\s*0\s*[-–—]\s*100\s*\))?[*_\s]*:?[*_\s]*(\d{1,3})",
            1,
        ),
        ScorePattern::new(
            r"(?i)\bscore\s*(?:\(\s*0\s*[-–—]\s*100\s*\))?[*_\s]*:[*_\s]*(\d{1,3})",
            1,
        ),
        ScorePattern::new(r"(?i)final\s+score\D{0,20}?(\d{1,3})", 1),
        ScorePattern::new(r"(\d{1,2})\s*/\s*10\b", 10),
        ScorePattern::new(r"(?i)(\d{1,3})\s*out\s+of\s+100\b", 1),
        ScorePattern::new(r"(\d{1,3})\s*%", 1),
    ]
});

static ISSUES_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)issues\s+detected[\s:(]*(\d{1,4})").expect("valid regex"));

static STRENGTHS_HEADER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?im)^[ \t#*>]*strengths\b[^:\n]*(?::|$)").expect("valid regex")
});

static IMPROVEMENTS_HEADER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?im)^[ \t#*>]*areas\s+for\s+improvement\b[^:\n]*(?::|$)").expect("valid regex")
});

static OVERALL_HEADER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?im)^[ \t#*>]*overall\s+feedback\b").expect("valid regex"));

static NUMBERED_PREFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{1,2}[.)]\s*").expect("valid regex"));

/// Extracts a structured analysis from the raw model reply.
pub fn extract_analysis(raw: &str) -> ExtractedAnalysis {
    if let Some(structured) = extract_structured(raw) {
        return structured;
    }

    let score = extract_score(raw);
    if score == FALLBACK_SCORE {
        debug!(
            "No score pattern matched; using fallback {FALLBACK_SCORE}. Preview: {}",
            raw.chars().take(200).collect::<String>()
        );
    }

    let strengths = or_defaults(
        list_between(raw, &STRENGTHS_HEADER, &IMPROVEMENTS_HEADER),
        &DEFAULT_STRENGTHS,
    );
    let improvements = or_defaults(
        list_between(raw, &IMPROVEMENTS_HEADER, &OVERALL_HEADER),
        &DEFAULT_IMPROVEMENTS,
    );
    let issue_count = extract_issue_count(raw).unwrap_or(improvements.len() as u32);

    ExtractedAnalysis {
        score,
        issue_count,
        strengths,
        improvements,
        raw_feedback: raw.to_string(),
    }
}

/// First matching score pattern, rescaled and clamped to 0..=100.
/// Returns `FALLBACK_SCORE` when nothing matches.
pub fn extract_score(text: &str) -> u32 {
    SCORE_PATTERNS
        .iter()
        .find_map(|pattern| {
            let value = pattern
                .regex
                .captures(text)?
                .get(1)?
                .as_str()
                .parse::<u32>()
                .ok()?;
            Some((value * pattern.multiplier).min(MAX_SCORE))
        })
        .unwrap_or(FALLBACK_SCORE)
}

/// The `N` of an "Issues Detected (N)" header, if present.
pub fn extract_issue_count(text: &str) -> Option<u32> {
    ISSUES_PATTERN
        .captures(text)?
        .get(1)?
        .as_str()
        .parse()
        .ok()
}

/// Items listed after `start` and before `end` (or the end of the text).
fn list_between(text: &str, start: &Regex, end: &Regex) -> Vec<String> {
    let Some(header) = start.find(text) else {
        return Vec::new();
    };
    let rest = &text[header.end()..];
    let span = match end.find(rest) {
        Some(m) => &rest[..m.start()],
        None => rest,
    };
    clean_items(span.lines().flat_map(|line| line.split('•')))
}

/// Strips bullet markers, trims, drops short fragments, keeps the first three.
fn clean_items<'a>(fragments: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    fragments
        .into_iter()
        .map(|fragment| {
            let fragment = fragment
                .trim()
                .trim_start_matches(['-', '*', '–'])
                .trim_start();
            NUMBERED_PREFIX
                .replace(fragment, "")
                .trim()
                .trim_matches('*')
                .trim()
                .to_string()
        })
        .filter(|item| item.chars().count() >= MIN_ITEM_CHARS)
        .take(MAX_LIST_ITEMS)
        .collect()
}

fn or_defaults(items: Vec<String>, defaults: &[&str]) -> Vec<String> {
    if items.is_empty() {
        defaults.iter().map(|s| s.to_string()).collect()
    } else {
        items
    }
}

/// Reply shape when the model honors a JSON output contract.
#[derive(Debug, Deserialize)]
struct StructuredReply {
    score: f64,
    #[serde(default)]
    issues_detected: Option<u32>,
    strengths: Vec<String>,
    improvements: Vec<String>,
}

fn extract_structured(raw: &str) -> Option<ExtractedAnalysis> {
    let body = strip_json_fences(raw);
    if !body.starts_with('{') {
        return None;
    }
    let reply: StructuredReply = serde_json::from_str(body).ok()?;

    let score = if reply.score.is_finite() {
        reply.score.round().clamp(0.0, MAX_SCORE as f64) as u32
    } else {
        FALLBACK_SCORE
    };
    let strengths = or_defaults(
        clean_items(reply.strengths.iter().map(String::as_str)),
        &DEFAULT_STRENGTHS,
    );
    let improvements = or_defaults(
        clean_items(reply.improvements.iter().map(String::as_str)),
        &DEFAULT_IMPROVEMENTS,
    );
    let issue_count = reply.issues_detected.unwrap_or(improvements.len() as u32);

    Some(ExtractedAnalysis {
        score,
        issue_count,
        strengths,
        improvements,
        raw_feedback: raw.to_string(),
    })
}

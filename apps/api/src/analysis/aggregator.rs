//! Aggregator: runs the grading pipeline over a batch and folds the results.
//!
//! Flow per submission: GradingRequest → build_grading_prompt → model call →
//! extract_analysis. Submissions are processed strictly one at a time, in order.
//! A failed model call yields a zero-score placeholder; the batch always continues.

use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::analysis::extractor::{extract_analysis, ExtractedAnalysis, MAX_LIST_ITEMS};
use crate::analysis::prompt_builder::{build_grading_prompt, GradingRequest};
use crate::llm_client::TextGenerator;

/// Cohort-level lists used when no submission produced any of its own.
pub const DEFAULT_BATCH_STRENGTHS: [&str; 3] =
    ["Good participation", "Effort shown", "Improving academic depth"];
pub const DEFAULT_BATCH_IMPROVEMENTS: [&str; 3] =
    ["More explanation needed", "Add examples", "Improve clarity"];

/// Assignment-wide inputs shared by every submission in a batch.
#[derive(Debug, Clone, Default)]
pub struct AssignmentContext {
    pub assignment_name: String,
    pub rubric_text: String,
    pub syllabus_excerpt: String,
}

/// One student's submission as received from the portal front end.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Submission {
    #[serde(default)]
    pub student_name: String,
    #[serde(default)]
    pub student_id: String,
    #[serde(default)]
    pub submission_text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StudentIdentity {
    pub student_name: String,
    pub student_id: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct StudentAnalysis {
    pub student: StudentIdentity,
    pub analysis: ExtractedAnalysis,
}

/// Result of one batch request. Not persisted.
#[derive(Debug, Clone, Serialize)]
pub struct BatchSummary {
    pub overall_score: u32,
    pub strengths: Vec<String>,
    pub improvements: Vec<String>,
    /// Same order as the input submissions.
    pub per_submission: Vec<StudentAnalysis>,
}

/// Analyzes every submission sequentially and aggregates the results.
pub async fn analyze_batch(
    generator: &dyn TextGenerator,
    context: &AssignmentContext,
    submissions: &[Submission],
) -> BatchSummary {
    let mut per_submission = Vec::with_capacity(submissions.len());

    for submission in submissions {
        let request = GradingRequest::new(context, submission);
        let prompt = build_grading_prompt(&request);

        let analysis = match generator.prompt(&prompt).await {
            Ok(raw) => extract_analysis(&raw),
            Err(e) => {
                error!(
                    "Error analyzing submission for {} ({}): {e}",
                    submission.student_name, submission.student_id
                );
                ExtractedAnalysis::failed(&e)
            }
        };

        info!(
            "Analyzed submission for {}: score={}",
            submission.student_id, analysis.score
        );

        per_submission.push(StudentAnalysis {
            student: StudentIdentity {
                student_name: submission.student_name.clone(),
                student_id: submission.student_id.clone(),
            },
            analysis,
        });
    }

    let analyses: Vec<&ExtractedAnalysis> = per_submission.iter().map(|s| &s.analysis).collect();
    let overall_score = overall_score(&analyses);
    let strengths = cohort_items(&analyses, |a| &a.strengths, &DEFAULT_BATCH_STRENGTHS);
    let improvements = cohort_items(&analyses, |a| &a.improvements, &DEFAULT_BATCH_IMPROVEMENTS);

    info!(
        "Batch analyzed: {} submissions, overall_score={}",
        per_submission.len(),
        overall_score
    );

    BatchSummary {
        overall_score,
        strengths,
        improvements,
        per_submission,
    }
}

/// Rounded mean over scores > 0; over all scores if none are positive; 0 if empty.
pub fn overall_score(analyses: &[&ExtractedAnalysis]) -> u32 {
    let positive: Vec<u32> = analyses
        .iter()
        .map(|a| a.score)
        .filter(|&s| s > 0)
        .collect();
    let scores: Vec<u32> = if positive.is_empty() {
        analyses.iter().map(|a| a.score).collect()
    } else {
        positive
    };

    if scores.is_empty() {
        return 0;
    }
    let total: u64 = scores.iter().map(|&s| s as u64).sum();
    (total as f64 / scores.len() as f64).round() as u32
}

/// First distinct items across the batch, in submission order.
fn cohort_items<F>(analyses: &[&ExtractedAnalysis], items: F, defaults: &[&str]) -> Vec<String>
where
    F: Fn(&ExtractedAnalysis) -> &Vec<String>,
{
    let mut collected: Vec<String> = Vec::new();
    for item in analyses.iter().flat_map(|a| items(a)) {
        if collected.len() == MAX_LIST_ITEMS {
            break;
        }
        if !collected.iter().any(|c| c.eq_ignore_ascii_case(item)) {
            collected.push(item.clone());
        }
    }

    if collected.is_empty() {
        defaults.iter().map(|s| s.to_string()).collect()
    } else {
        collected
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm_client::testing::ScriptedGenerator;
    use crate::llm_client::LlmError;

    fn analysis(score: u32) -> ExtractedAnalysis {
        ExtractedAnalysis {
            score,
            issue_count: 0,
            strengths: vec![],
            improvements: vec![],
            raw_feedback: String::new(),
        }
    }

    fn submission(id: &str) -> Submission {
        Submission {
            student_name: format!("Student {id}"),
            student_id: id.to_string(),
            submission_text: format!("Essay by {id}"),
        }
    }

    fn context() -> AssignmentContext {
        AssignmentContext {
            assignment_name: "A2: Graphs".to_string(),
            rubric_text: "Correctness (100%)".to_string(),
            syllabus_excerpt: String::new(),
        }
    }

    #[test]
    fn test_overall_score_excludes_zeros() {
        let (a, b, c) = (analysis(80), analysis(0), analysis(91));
        assert_eq!(overall_score(&[&a, &b, &c]), 86); // (80 + 91) / 2 = 85.5
    }

    #[test]
    fn test_overall_score_all_zero() {
        let (a, b) = (analysis(0), analysis(0));
        assert_eq!(overall_score(&[&a, &b]), 0);
    }

    #[test]
    fn test_overall_score_empty_batch() {
        assert_eq!(overall_score(&[]), 0);
    }

    #[test]
    fn test_overall_score_rounding() {
        let (a, b, c) = (analysis(70), analysis(71), analysis(71));
        assert_eq!(overall_score(&[&a, &b, &c]), 71); // 70.67
        let (d, e) = (analysis(70), analysis(71));
        assert_eq!(overall_score(&[&d, &e]), 71); // 70.5 rounds half up
    }

    #[tokio::test]
    async fn test_batch_survives_one_failure() {
        let generator = ScriptedGenerator::new(vec![
            Ok("Estimated Score (0-100): 80".to_string()),
            Err(LlmError::Api {
                status: 429,
                message: "Resource has been exhausted".to_string(),
            }),
            Ok("Estimated Score (0-100): 91".to_string()),
        ]);
        let submissions = vec![submission("S001"), submission("S002"), submission("S003")];

        let summary = analyze_batch(&generator, &context(), &submissions).await;

        assert_eq!(summary.per_submission.len(), 3);
        let ids: Vec<&str> = summary
            .per_submission
            .iter()
            .map(|s| s.student.student_id.as_str())
            .collect();
        assert_eq!(ids, vec!["S001", "S002", "S003"]);

        let failed = &summary.per_submission[1].analysis;
        assert_eq!(failed.score, 0);
        assert!(failed.raw_feedback.contains("Resource has been exhausted"));
        assert!(failed.strengths.is_empty());

        assert_eq!(summary.overall_score, 86);
    }

    #[tokio::test]
    async fn test_batch_sends_one_prompt_per_submission_in_order() {
        let generator = ScriptedGenerator::new(vec![
            Ok("Score: 70".to_string()),
            Ok("Score: 75".to_string()),
        ]);
        let submissions = vec![submission("S010"), submission("S011")];

        analyze_batch(&generator, &context(), &submissions).await;

        let seen = generator.seen.lock().unwrap();
        assert_eq!(seen.len(), 2);
        assert!(seen[0].0.is_none());
        assert!(seen[0].1[0].text.contains("Essay by S010"));
        assert!(seen[1].1[0].text.contains("Essay by S011"));
        assert!(seen[1].1[0].text.contains("A2: Graphs"));
    }

    #[tokio::test]
    async fn test_all_failed_batch_uses_cohort_defaults() {
        let generator = ScriptedGenerator::new(vec![Err(LlmError::EmptyContent)]);
        let summary = analyze_batch(&generator, &context(), &[submission("S001")]).await;

        assert_eq!(summary.overall_score, 0);
        assert_eq!(summary.strengths, DEFAULT_BATCH_STRENGTHS.to_vec());
        assert_eq!(summary.improvements, DEFAULT_BATCH_IMPROVEMENTS.to_vec());
    }

    #[tokio::test]
    async fn test_cohort_items_dedup_across_submissions() {
        let generator = ScriptedGenerator::new(vec![
            Ok("Strengths:\n- Clear thesis\n- Good sources\nAreas for Improvement:\n- Add examples".to_string()),
            Ok("Strengths:\n- clear thesis\n- Strong analysis\n- Neat layout\nAreas for Improvement:\n- Add examples".to_string()),
        ]);
        let summary = analyze_batch(
            &generator,
            &context(),
            &[submission("S001"), submission("S002")],
        )
        .await;

        assert_eq!(
            summary.strengths,
            vec!["Clear thesis", "Good sources", "Strong analysis"]
        );
        assert_eq!(summary.improvements, vec!["Add examples"]);
    }
}

use crate::models::rubric::RubricCriterionRow;

/// Used when an assignment has no rubric of its own.
pub const STANDARD_RUBRIC_TEXT: &str = "Standard academic grading criteria: \
    Understanding of Concepts (25%), Application and Analysis (30%), \
    Quality of Writing (20%), Use of Sources (15%), Completeness (10%)";

/// Renders stored criteria as the rubric block of the grading prompt.
/// One paragraph per criterion: `Name (weight%): description` then its indicators.
pub fn render_rubric_text(criteria: &[RubricCriterionRow]) -> String {
    criteria
        .iter()
        .map(|c| {
            format!(
                "{} ({}%): {}\nIndicators: {}",
                c.criterion_name,
                c.weight,
                c.description,
                c.indicators.join("; ")
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn criterion(name: &str, weight: i32, indicators: &[&str]) -> RubricCriterionRow {
        RubricCriterionRow {
            rubric_id: format!("A1_{name}"),
            assignment_id: "A1".to_string(),
            criterion_name: name.to_string(),
            weight,
            description: format!("{name} is assessed"),
            indicators: indicators.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn test_render_single_criterion() {
        let text = render_rubric_text(&[criterion("Clarity", 40, &["concise", "structured"])]);
        assert_eq!(
            text,
            "Clarity (40%): Clarity is assessed\nIndicators: concise; structured"
        );
    }

    #[test]
    fn test_render_multiple_criteria_separated_by_blank_line() {
        let text = render_rubric_text(&[
            criterion("Clarity", 40, &[]),
            criterion("Accuracy", 60, &["correct facts"]),
        ]);
        let paragraphs: Vec<&str> = text.split("\n\n").collect();
        assert_eq!(paragraphs.len(), 2);
        assert!(paragraphs[0].ends_with("Indicators: "));
        assert!(paragraphs[1].starts_with("Accuracy (60%)"));
    }

    #[test]
    fn test_render_empty_is_empty() {
        assert!(render_rubric_text(&[]).is_empty());
    }
}

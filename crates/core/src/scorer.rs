//! Pure correctness check for a single answered question.

use crate::model::Question;

/// Returns whether `selected` is the question's designated correct option.
///
/// A missing selection is simply incorrect, never an error: a question can
/// time out before the user picks anything. Comparison is an exact value
/// match against the correct option.
#[must_use]
pub fn is_correct(question: &Question, selected: Option<&str>) -> bool {
    selected.is_some_and(|choice| choice == question.correct_answer())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build_question() -> Question {
        Question::new(
            "Largest ocean?",
            vec!["Atlantic".into(), "Pacific".into(), "Arctic".into()],
            "Pacific",
        )
        .unwrap()
    }

    #[test]
    fn matching_selection_is_correct() {
        assert!(is_correct(&build_question(), Some("Pacific")));
    }

    #[test]
    fn mismatching_selection_is_incorrect() {
        assert!(!is_correct(&build_question(), Some("Atlantic")));
    }

    #[test]
    fn missing_selection_is_incorrect_not_an_error() {
        assert!(!is_correct(&build_question(), None));
    }

    #[test]
    fn comparison_is_exact_not_case_insensitive() {
        assert!(!is_correct(&build_question(), Some("pacific")));
    }
}

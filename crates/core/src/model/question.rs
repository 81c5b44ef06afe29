use thiserror::Error;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuestionError {
    #[error("question prompt cannot be empty")]
    EmptyPrompt,

    #[error("a question needs at least two options, got {0}")]
    TooFewOptions(usize),

    #[error("option text cannot be empty")]
    EmptyOption,

    #[error("the correct answer does not appear among the options")]
    CorrectAnswerMissing,
}

//
// ─── QUESTION ──────────────────────────────────────────────────────────────────
//

/// A single multiple-choice question.
///
/// Options are order-significant for display and may repeat; exactly one
/// option value is designated correct. Validation happens once, here at the
/// data boundary; consumers can rely on a `Question` being well-formed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    prompt: String,
    options: Vec<String>,
    correct_answer: String,
}

impl Question {
    /// Creates a validated question.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError::EmptyPrompt` for a blank prompt,
    /// `QuestionError::TooFewOptions` for fewer than two options,
    /// `QuestionError::EmptyOption` for a blank option, and
    /// `QuestionError::CorrectAnswerMissing` when the designated answer is
    /// not one of the options.
    pub fn new(
        prompt: impl Into<String>,
        options: Vec<String>,
        correct_answer: impl Into<String>,
    ) -> Result<Self, QuestionError> {
        let prompt = prompt.into();
        if prompt.trim().is_empty() {
            return Err(QuestionError::EmptyPrompt);
        }
        if options.len() < 2 {
            return Err(QuestionError::TooFewOptions(options.len()));
        }

        let mut trimmed = Vec::with_capacity(options.len());
        for option in options {
            let option = option.trim().to_owned();
            if option.is_empty() {
                return Err(QuestionError::EmptyOption);
            }
            trimmed.push(option);
        }

        let correct_answer = correct_answer.into().trim().to_owned();
        if !trimmed.iter().any(|o| *o == correct_answer) {
            return Err(QuestionError::CorrectAnswerMissing);
        }

        Ok(Self {
            prompt: prompt.trim().to_owned(),
            options: trimmed,
            correct_answer,
        })
    }

    #[must_use]
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    /// Options in display order.
    #[must_use]
    pub fn options(&self) -> &[String] {
        &self.options
    }

    #[must_use]
    pub fn correct_answer(&self) -> &str {
        &self.correct_answer
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

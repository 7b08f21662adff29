// ********* Input data structures ***********

use std::borrow::Cow;

use snafu::Snafu;

/// A raw value, as it comes out of a spreadsheet cell.
///
/// Exports mix typed cells (numbers, booleans) with free text, and empty
/// cells show up wherever a survey did not fill a column. Every variant
/// can be turned into text with [`AnswerCell::canonical_text`].
#[derive(PartialEq, Debug, Clone)]
pub enum AnswerCell {
    Number(f64),
    Text(String),
    Boolean(bool),
    /// An empty or missing cell.
    Empty,
}

impl AnswerCell {
    /// The text form of the cell, or `None` for an empty cell.
    ///
    /// Numbers are rendered with their shortest decimal representation
    /// (`1.0` becomes `"1"`), booleans as `"true"` / `"false"`.
    pub fn canonical_text(&self) -> Option<Cow<'_, str>> {
        match self {
            AnswerCell::Number(n) => Some(Cow::Owned(n.to_string())),
            AnswerCell::Text(s) => Some(Cow::Borrowed(s.as_str())),
            AnswerCell::Boolean(b) => Some(Cow::Borrowed(if *b { "true" } else { "false" })),
            AnswerCell::Empty => None,
        }
    }

    /// Same as [`AnswerCell::canonical_text`], for callers that need real text.
    ///
    /// `what` names the argument in the error message.
    pub fn require_text(&self, what: &str) -> Result<Cow<'_, str>, AnswerError> {
        self.canonical_text()
            .ok_or_else(|| AnswerError::InvalidArgument {
                what: what.to_string(),
            })
    }
}

impl From<&str> for AnswerCell {
    fn from(s: &str) -> Self {
        AnswerCell::Text(s.to_string())
    }
}

impl From<String> for AnswerCell {
    fn from(s: String) -> Self {
        AnswerCell::Text(s)
    }
}

impl From<f64> for AnswerCell {
    fn from(n: f64) -> Self {
        AnswerCell::Number(n)
    }
}

impl From<i64> for AnswerCell {
    fn from(n: i64) -> Self {
        AnswerCell::Number(n as f64)
    }
}

impl From<bool> for AnswerCell {
    fn from(b: bool) -> Self {
        AnswerCell::Boolean(b)
    }
}

impl<T: Into<AnswerCell>> From<Option<T>> for AnswerCell {
    fn from(o: Option<T>) -> Self {
        o.map(Into::into).unwrap_or(AnswerCell::Empty)
    }
}

/// The numbers found in an answer option.
///
/// Empty for a non-numeric option, one element for a point value, and two
/// elements for an inclusive range, in the order they were written.
pub type NumericParts = Vec<f64>;

/// The curated reference answers for one question.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct QuestionFacts {
    pub correct_answer: String,
    /// When provided, only the option with this exact answer is very wrong.
    /// Otherwise, very wrong answers may be inferred from the distance to the
    /// correct answer (see [`MarkingRules`]).
    pub very_wrong_answer: Option<String>,
}

impl QuestionFacts {
    pub fn new(correct_answer: &str) -> QuestionFacts {
        QuestionFacts {
            correct_answer: correct_answer.to_string(),
            very_wrong_answer: None,
        }
    }

    pub fn with_very_wrong_answer(self, very_wrong_answer: &str) -> QuestionFacts {
        QuestionFacts {
            correct_answer: self.correct_answer,
            very_wrong_answer: Some(very_wrong_answer.to_string()),
        }
    }
}

// ******** Output data structures *********

/// The outcome of marking one answer option.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash, PartialOrd, Ord)]
pub enum Correctness {
    Correct,
    Wrong,
    VeryWrong,
}

impl Correctness {
    /// The code used in the correctness column of the survey listings.
    pub fn code(&self) -> &'static str {
        match self {
            Correctness::Correct => "1",
            Correctness::Wrong => "2",
            Correctness::VeryWrong => "3",
        }
    }
}

/// Errors that prevent an answer from being matched or marked.
#[derive(Eq, PartialEq, Debug, Clone, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum AnswerError {
    /// An empty cell was given where text is required.
    #[snafu(display("Invalid argument: {what} must not be empty"))]
    InvalidArgument { what: String },
    #[snafu(display("Need at least two answer options, got {count}"))]
    InsufficientOptions { count: usize },
    #[snafu(display("No correct answer option found"))]
    NoCorrectOptionFound {},
    #[snafu(display("Answer options not all numerical"))]
    OptionsNotAllNumerical {},
    #[snafu(display("No corresponding answer option entries found"))]
    NoAnswerOptions {},
    #[snafu(display("No factual answer provided"))]
    MissingFactualAnswer {},
}

impl AnswerError {
    /// Incomplete source data produces these errors routinely. The answer can
    /// be left unmarked instead of failing the whole batch.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            AnswerError::NoCorrectOptionFound {} | AnswerError::OptionsNotAllNumerical {}
        )
    }
}

// ********* Configuration **********

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct MarkingRules {
    /// An answer this many options (or more) away from the nearest correct
    /// option is marked very wrong, when the question has no explicit very
    /// wrong answer.
    pub very_wrong_distance: usize,
    /// If false, answers are only marked very wrong when the question
    /// provides an explicit very wrong answer.
    pub infer_very_wrong: bool,
}

impl MarkingRules {
    pub const DEFAULT_RULES: MarkingRules = MarkingRules {
        very_wrong_distance: 2,
        infer_very_wrong: true,
    };
}

impl Default for MarkingRules {
    fn default() -> Self {
        MarkingRules::DEFAULT_RULES
    }
}

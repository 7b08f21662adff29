use log::debug;
use snafu::ensure;

pub use crate::config::*;
use crate::{distance_from_correct, is_same_answer, matches};

/// A builder for marking the answers to one question.
///
/// The facts of the question are set first, then all the answer options that
/// were offered. Each option can then be marked correct, wrong or very wrong.
///
/// ```
/// pub use answer_matching::builder::Builder;
/// pub use answer_matching::{Correctness, MarkingRules, QuestionFacts};
/// # use answer_matching::AnswerError;
///
/// let mut builder = Builder::new(&MarkingRules::DEFAULT_RULES)
///     .facts(QuestionFacts::new("34%"));
///
/// builder.add_options(&["10-20%", "20-30%", "30-40%"]);
///
/// assert_eq!(builder.mark("30-40%")?, Correctness::Correct);
/// assert_eq!(builder.mark("20-30%")?, Correctness::Wrong);
/// assert_eq!(builder.mark("10-20%")?, Correctness::VeryWrong);
///
/// # Ok::<(), AnswerError>(())
/// ```
#[derive(Debug, Clone)]
pub struct Builder {
    pub(crate) _rules: MarkingRules,
    pub(crate) _facts: Option<QuestionFacts>,
    pub(crate) _options: Vec<String>,
}

impl Builder {
    pub fn new(rules: &MarkingRules) -> Builder {
        Builder {
            _rules: rules.clone(),
            _facts: None,
            _options: Vec::new(),
        }
    }

    pub fn facts(self, facts: QuestionFacts) -> Builder {
        Builder {
            _rules: self._rules,
            _facts: Some(facts),
            _options: self._options,
        }
    }

    /// Adds one of the answer options offered for this question.
    pub fn add_option(&mut self, answer_option: &str) {
        self._options.push(answer_option.to_string());
    }

    pub fn add_options<S: AsRef<str>>(&mut self, answer_options: &[S]) {
        for o in answer_options {
            self.add_option(o.as_ref());
        }
    }

    /// Adds an answer option read from a cell. Empty cells are rejected.
    pub fn add_option_cell(&mut self, answer_option: &AnswerCell) -> Result<(), AnswerError> {
        let text = answer_option.require_text("answer option")?;
        self.add_option(&text);
        Ok(())
    }

    pub fn options(&self) -> &[String] {
        &self._options
    }

    /// Marks the chosen answer option.
    pub fn mark(&self, chosen_option: &str) -> Result<Correctness, AnswerError> {
        ensure!(!self._options.is_empty(), NoAnswerOptionsSnafu {});
        let facts = match &self._facts {
            Some(f) if !f.correct_answer.trim().is_empty() => f,
            _ => return MissingFactualAnswerSnafu {}.fail(),
        };

        let correct_options: Vec<&String> = self
            ._options
            .iter()
            .filter(|o| matches(o, &facts.correct_answer))
            .collect();
        ensure!(!correct_options.is_empty(), NoCorrectOptionFoundSnafu {});

        let chosen = chosen_option.trim().to_lowercase();
        let is_correct = correct_options
            .iter()
            .any(|o| o.trim().to_lowercase() == chosen);

        let very_wrong = match facts.very_wrong_answer.as_deref() {
            _ if is_correct => false,
            Some(vw) if !vw.trim().is_empty() => is_same_answer(chosen_option, vw),
            _ if self._rules.infer_very_wrong => self.is_far_from_correct(chosen_option, facts)?,
            _ => false,
        };

        let res = if is_correct {
            Correctness::Correct
        } else if very_wrong {
            Correctness::VeryWrong
        } else {
            Correctness::Wrong
        };
        debug!(
            "mark: chosen {:?} correct options {:?} -> {:?}",
            chosen_option, correct_options, res
        );
        Ok(res)
    }

    /// Marks the chosen answer option read from a cell. Empty cells are rejected.
    pub fn mark_cell(&self, chosen_option: &AnswerCell) -> Result<Correctness, AnswerError> {
        let text = chosen_option.require_text("chosen answer option")?;
        self.mark(&text)
    }

    /// Marks every answer option that was added, in order.
    pub fn mark_all(&self) -> Vec<(String, Result<Correctness, AnswerError>)> {
        self._options
            .iter()
            .map(|o| (o.clone(), self.mark(o)))
            .collect()
    }

    fn is_far_from_correct(
        &self,
        chosen_option: &str,
        facts: &QuestionFacts,
    ) -> Result<bool, AnswerError> {
        match distance_from_correct(chosen_option, &self._options, &facts.correct_answer) {
            Ok(d) => Ok(d >= self._rules.very_wrong_distance),
            // Not enough information to say, leave it as simply wrong.
            Err(e) if e.is_recoverable() => {
                debug!(
                    "is_far_from_correct: {:?}: not inferring very wrong: {}",
                    chosen_option, e
                );
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scale_builder(correct: &str) -> Builder {
        let mut b = Builder::new(&MarkingRules::DEFAULT_RULES).facts(QuestionFacts::new(correct));
        b.add_options(&["1", "2", "3", "4", "5"]);
        b
    }

    #[test]
    fn infers_very_wrong_from_distance() {
        let b = scale_builder("2");
        assert_eq!(b.mark("2"), Ok(Correctness::Correct));
        assert_eq!(b.mark("1"), Ok(Correctness::Wrong));
        assert_eq!(b.mark("3"), Ok(Correctness::Wrong));
        assert_eq!(b.mark("4"), Ok(Correctness::VeryWrong));
        assert_eq!(b.mark("5"), Ok(Correctness::VeryWrong));
    }

    #[test]
    fn custom_distance_threshold() {
        let rules = MarkingRules {
            very_wrong_distance: 3,
            ..MarkingRules::DEFAULT_RULES
        };
        let mut b = Builder::new(&rules).facts(QuestionFacts::new("1"));
        b.add_options(&["1", "2", "3", "4"]);
        assert_eq!(b.mark("3"), Ok(Correctness::Wrong));
        assert_eq!(b.mark("4"), Ok(Correctness::VeryWrong));
    }

    #[test]
    fn inference_can_be_turned_off() {
        let rules = MarkingRules {
            infer_very_wrong: false,
            ..MarkingRules::DEFAULT_RULES
        };
        let mut b = Builder::new(&rules).facts(QuestionFacts::new("1"));
        b.add_options(&["1", "2", "3", "4"]);
        assert_eq!(b.mark("4"), Ok(Correctness::Wrong));
    }

    #[test]
    fn explicit_very_wrong_answer() {
        let mut b = Builder::new(&MarkingRules::DEFAULT_RULES)
            .facts(QuestionFacts::new("Increased").with_very_wrong_answer("Decreased a lot"));
        b.add_options(&["Increased", "Stayed the same", "Decreased a lot"]);
        let marks: Vec<(String, Result<Correctness, AnswerError>)> = b.mark_all();
        assert_eq!(
            marks,
            vec![
                ("Increased".to_string(), Ok(Correctness::Correct)),
                ("Stayed the same".to_string(), Ok(Correctness::Wrong)),
                ("Decreased a lot".to_string(), Ok(Correctness::VeryWrong)),
            ]
        );
    }

    #[test]
    fn explicit_very_wrong_answer_wins_over_distance() {
        let b = scale_builder("1").facts(QuestionFacts::new("1").with_very_wrong_answer("3"));
        assert_eq!(b.mark("5"), Ok(Correctness::Wrong));
        assert_eq!(b.mark("3"), Ok(Correctness::VeryWrong));
    }

    #[test]
    fn non_numerical_options_are_only_wrong() {
        let mut b = Builder::new(&MarkingRules::DEFAULT_RULES).facts(QuestionFacts::new("Yes"));
        b.add_options(&["Yes", "No", "Don't know"]);
        assert_eq!(b.mark("yes "), Ok(Correctness::Correct));
        assert_eq!(b.mark("Don't know"), Ok(Correctness::Wrong));
    }

    #[test]
    fn non_latin_options() {
        let mut b = Builder::new(&MarkingRules::DEFAULT_RULES).facts(QuestionFacts::new("Да"));
        b.add_options(&["Да", "Нет"]);
        assert_eq!(b.mark("Да"), Ok(Correctness::Correct));
        assert_eq!(b.mark("Нет"), Ok(Correctness::Wrong));
    }

    #[test]
    fn missing_facts() {
        let mut b = Builder::new(&MarkingRules::DEFAULT_RULES);
        b.add_options(&["1", "2"]);
        assert_eq!(b.mark("1"), Err(AnswerError::MissingFactualAnswer {}));
        let b = b.facts(QuestionFacts::new("  "));
        assert_eq!(b.mark("1"), Err(AnswerError::MissingFactualAnswer {}));
    }

    #[test]
    fn missing_options() {
        let b = Builder::new(&MarkingRules::DEFAULT_RULES).facts(QuestionFacts::new("1"));
        assert_eq!(b.mark("1"), Err(AnswerError::NoAnswerOptions {}));
    }

    #[test]
    fn no_option_matches_the_facts() {
        let b = scale_builder("42");
        assert_eq!(b.mark("1"), Err(AnswerError::NoCorrectOptionFound {}));
    }

    #[test]
    fn single_option_cannot_be_ranked() {
        let mut b = Builder::new(&MarkingRules::DEFAULT_RULES).facts(QuestionFacts::new("1"));
        b.add_option("1");
        assert_eq!(b.mark("1"), Ok(Correctness::Correct));
        assert_eq!(
            b.mark("2"),
            Err(AnswerError::InsufficientOptions { count: 1 })
        );
    }

    #[test]
    fn cells() {
        let mut b = Builder::new(&MarkingRules::DEFAULT_RULES).facts(QuestionFacts::new("14 pounds"));
        b.add_option_cell(&AnswerCell::Number(14.0)).unwrap();
        b.add_option_cell(&AnswerCell::Number(20.0)).unwrap();
        assert!(b.add_option_cell(&AnswerCell::Empty).is_err());
        assert_eq!(b.options(), &["14".to_string(), "20".to_string()]);
        assert_eq!(b.mark_cell(&AnswerCell::Number(14.0)), Ok(Correctness::Correct));
        assert!(matches!(
            b.mark_cell(&AnswerCell::Empty),
            Err(AnswerError::InvalidArgument { .. })
        ));
    }
}

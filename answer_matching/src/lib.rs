mod config;
pub mod builder;
pub mod manual;
pub mod normalize;
pub mod survey;

use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;
use snafu::ensure;

pub use crate::config::*;
use crate::normalize::key_for_fuzzy_lookup;

// **** Numerical parts ****

// The first number embedded in some text: "$14 billion", "about 10", "1%,"
static EMBEDDED_NUMBER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"-?\d[\d.,]*").expect("the number pattern is a valid regex")
});

// "1,000", "-12,345.5"
static GROUPED_NUMBER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^-?\d{1,3}(,\d{3})+(\.\d+)?$").expect("the grouping pattern is a valid regex")
});

/// Returns the parts of an answer option that are numerical in nature:
/// integers, floats, percentages, amounts with units, or ranges of such.
///
/// This never fails. Anything that cannot be read as a number (including an
/// empty cell or a boolean) returns an empty list.
///
/// ```
/// use answer_matching::{extract_numerical_parts, AnswerCell};
///
/// assert_eq!(extract_numerical_parts(&"30-40%".into()), vec![30.0, 40.0]);
/// assert_eq!(extract_numerical_parts(&"$14 billion".into()), vec![14.0]);
/// assert_eq!(extract_numerical_parts(&AnswerCell::Number(1.5)), vec![1.5]);
/// assert!(extract_numerical_parts(&AnswerCell::Empty).is_empty());
/// ```
pub fn extract_numerical_parts(answer_option: &AnswerCell) -> NumericParts {
    match answer_option.canonical_text() {
        Some(text) => extract_numerical_parts_str(&text),
        None => Vec::new(),
    }
}

/// Text version of [`extract_numerical_parts`].
pub fn extract_numerical_parts_str(answer_option: &str) -> NumericParts {
    // En-dashes and minus signs are written as plain dashes.
    let text = answer_option
        .trim()
        .to_lowercase()
        .replace(|c: char| c == '\u{2013}' || c == '\u{2212}', "-");

    if let Some(n) = parse_finite(&text) {
        return vec![n];
    }

    // A "-" past the first character may be a range: try both sides.
    // A leading "-" is a negative sign.
    if text.chars().skip(1).any(|c| c == '-') {
        let range: Vec<&str> = text.split('-').collect();
        if range.len() > 2 {
            return Vec::new();
        }
        let low = extract_numerical_parts_str(range[0]);
        let high = extract_numerical_parts_str(range[1]);
        if low.len() == 1 && high.len() == 1 {
            return vec![low[0], high[0]];
        }
    }

    EMBEDDED_NUMBER
        .find(&text)
        .and_then(|m| parse_embedded_number(m.as_str()))
        .map(|n| vec![n])
        .unwrap_or_default()
}

fn parse_finite(s: &str) -> Option<f64> {
    s.parse::<f64>().ok().filter(|n| n.is_finite())
}

// "1,000" is a thousands separator, "500," is a trailing punctuation. A
// decimal comma ("1,5") is not a number.
fn parse_embedded_number(token: &str) -> Option<f64> {
    let trimmed = token.trim_end_matches(|c| c == '.' || c == ',');
    if !trimmed.contains(',') {
        return parse_finite(trimmed);
    }
    if GROUPED_NUMBER.is_match(trimmed) {
        parse_finite(&trimmed.replace(',', ""))
    } else {
        None
    }
}

// **** Matching ****

/// Checks if an answer option corresponds to the factual answer of a question.
///
/// Matching is attempted in this order:
/// * the normalized texts are the same (case, surrounding spaces and
///   punctuation noise are ignored)
/// * both contain a single number, and the numbers are equal (`"14"` matches
///   `"14 pounds"`)
/// * the answer option is a range, the factual answer a single number inside
///   the range, bounds included (`"30-40%"` matches `"34%"`)
pub fn matches(answer_option: &str, factual_answer: &str) -> bool {
    is_same_answer(answer_option, factual_answer)
        || matches_numerically(answer_option, factual_answer)
}

/// Cell version of [`matches`]. Empty cells are rejected.
pub fn matches_cells(
    answer_option: &AnswerCell,
    factual_answer: &AnswerCell,
) -> Result<bool, AnswerError> {
    let answer_option = answer_option.require_text("answer option")?;
    let factual_answer = factual_answer.require_text("factual answer")?;
    Ok(matches(&answer_option, &factual_answer))
}

/// Equality after normalization, without any numerical interpretation.
pub fn is_same_answer(answer_option: &str, factual_answer: &str) -> bool {
    key_for_fuzzy_lookup(answer_option) == key_for_fuzzy_lookup(factual_answer)
}

fn matches_numerically(answer_option: &str, factual_answer: &str) -> bool {
    let option_parts = extract_numerical_parts_str(answer_option);
    let factual_parts = extract_numerical_parts_str(factual_answer);
    match (option_parts.as_slice(), factual_parts.as_slice()) {
        ([option], [factual]) => option == factual,
        ([low, high], [factual]) => low <= factual && factual <= high,
        _ => false,
    }
}

// **** Distance ****

/// Counts how many answer options away the chosen answer option is from the
/// nearest option matching the factual answer.
///
/// The options are ordered by the smallest number they contain (a range ranks
/// by its lower bound). The distance is the number of steps in that order,
/// regardless of how far apart the numbers themselves are: in
/// `["3%", "23%", "43%"]`, `"43%"` is 2 options away from `"3%"`.
///
/// A chosen option that matches the factual answer is always at distance 0,
/// even when the options are not numerical.
///
/// ```
/// use answer_matching::distance_from_correct;
///
/// let options = ["10-20%", "20-30%", "30-40%"];
/// assert_eq!(distance_from_correct("30-40%", &options, "15%"), Ok(2));
/// ```
pub fn distance_from_correct<S: AsRef<str>>(
    chosen_option: &str,
    all_options: &[S],
    factual_answer: &str,
) -> Result<usize, AnswerError> {
    ensure!(
        all_options.len() >= 2,
        InsufficientOptionsSnafu {
            count: all_options.len()
        }
    );

    let chosen = chosen_option.trim().to_lowercase();
    let factual = factual_answer.trim().to_lowercase();

    let correct_options: Vec<&str> = all_options
        .iter()
        .map(|o| o.as_ref())
        .filter(|o| matches(o, &factual))
        .collect();
    debug!(
        "distance_from_correct: factual {:?} correct options: {:?}",
        factual, correct_options
    );
    ensure!(!correct_options.is_empty(), NoCorrectOptionFoundSnafu {});

    if correct_options
        .iter()
        .any(|o| o.trim().to_lowercase() == chosen)
    {
        return Ok(0);
    }

    // From here on, only the order of the numbers tells the distance.
    let option_ranks: Vec<f64> = all_options
        .iter()
        .map(|o| rank_value(o.as_ref()))
        .collect::<Option<Vec<f64>>>()
        .ok_or(AnswerError::OptionsNotAllNumerical {})?;
    let chosen_rank = rank_value(&chosen).ok_or(AnswerError::OptionsNotAllNumerical {})?;

    let mut sorted_ranks = option_ranks;
    sorted_ranks.sort_by(|a, b| a.total_cmp(b));
    debug!(
        "distance_from_correct: chosen rank {:?} sorted ranks: {:?}",
        chosen_rank, sorted_ranks
    );

    let chosen_pos = rank_position(&sorted_ranks, chosen_rank);
    let distance = correct_options
        .iter()
        .filter_map(|o| rank_value(o))
        .map(|r| rank_position(&sorted_ranks, r).abs_diff(chosen_pos))
        .min()
        // Correct options are a subset of the options, which are all numerical.
        .ok_or(AnswerError::OptionsNotAllNumerical {})?;
    Ok(distance)
}

/// Cell version of [`distance_from_correct`]. Empty cells are rejected.
pub fn distance_from_correct_cells(
    chosen_option: &AnswerCell,
    all_options: &[AnswerCell],
    factual_answer: &AnswerCell,
) -> Result<usize, AnswerError> {
    let chosen = chosen_option.require_text("chosen answer option")?;
    let factual = factual_answer.require_text("factual answer")?;
    let options = all_options
        .iter()
        .map(|o| o.require_text("answer option"))
        .collect::<Result<Vec<_>, _>>()?;
    distance_from_correct(&chosen, &options, &factual)
}

// The smallest number in an option. None for non-numerical options.
fn rank_value(answer_option: &str) -> Option<f64> {
    extract_numerical_parts_str(answer_option)
        .into_iter()
        .reduce(f64::min)
}

// Index of the first occurrence of the value in the sorted ranks. A value that
// is not one of the ranks is placed where it would be inserted.
fn rank_position(sorted_ranks: &[f64], rank: f64) -> usize {
    sorted_ranks.partition_point(|r| *r < rank)
}

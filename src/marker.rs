use log::{debug, info, warn};

use answer_matching::builder::Builder;
use answer_matching::*;
use snafu::{prelude::*, Snafu};

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde_json::json;
use serde_json::Value as JSValue;
use text_diff::print_diff;

pub mod config_reader;
mod io_common;
mod io_csv;
mod io_xlsx;

use crate::marker::config_reader::*;

const UNMAPPED_QUESTION: &str = "(Question ID not mapped)";

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum MarkError {
    #[snafu(display("Error opening file {path}"))]
    OpeningExcel {
        source: calamine::XlsxError,
        path: String,
    },
    #[snafu(display("No worksheet found in {path}"))]
    EmptyExcel { path: String },
    #[snafu(display("Worksheet {name:?} not found in {path}"))]
    MissingWorksheet { path: String, name: String },
    #[snafu(display("Several worksheets found in {path}, the worksheet name must be provided"))]
    TooManyWorksheets { path: String },
    #[snafu(display("Unexpected cell type at line {lineno}: {content}"))]
    ExcelWrongCellType { lineno: usize, content: String },
    #[snafu(display("Error opening file {path}"))]
    CsvOpen { source: csv::Error, path: String },
    #[snafu(display("Error reading a CSV line"))]
    CsvLineParse { source: csv::Error },
    #[snafu(display("Line {lineno} is too short, expected a column {column}"))]
    LineTooShort { lineno: usize, column: usize },
    #[snafu(display("Error opening file {path}"))]
    OpeningJson {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error parsing JSON"))]
    ParsingJson { source: serde_json::Error },
    #[snafu(display("Cannot use {value} as a column or row index"))]
    ParsingColumnIndex { value: String },
    #[snafu(display("Provider not implemented: {provider:?}"))]
    UnknownProvider { provider: String },
    #[snafu(display("The configuration file has no parent directory"))]
    MissingParentDir {},
    #[snafu(display("Error writing file {path}"))]
    WritingOutput {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Difference detected between the marks and the reference summary {path}"))]
    ReferenceMismatch { path: String },

    #[snafu(whatever, display("{message}"))]
    Whatever {
        message: String,
        #[snafu(source(from(Box<dyn std::error::Error>, Some)))]
        source: Option<Box<dyn std::error::Error>>,
    },
}

pub type MarkResult<T> = Result<T, MarkError>;

/// One row of an answer file: an answer option offered for a question.
#[derive(PartialEq, Debug, Clone)]
pub struct ParsedAnswer {
    pub question_id: String,
    pub answer: AnswerCell,
    /// 1-based, as displayed by spreadsheet programs.
    pub lineno: usize,
}

#[derive(PartialEq, Debug, Clone)]
struct RowMark {
    question_id: String,
    answer: String,
    outcome: Result<Correctness, String>,
}

fn resolve_path(root: Option<&Path>, file_path: &str) -> PathBuf {
    match root {
        Some(r) => r.join(file_path),
        None => PathBuf::from(file_path),
    }
}

fn read_answers(path: &Path, src: &AnswerSource) -> MarkResult<Vec<ParsedAnswer>> {
    let p = path.display().to_string();
    info!("Attempting to read answer file {:?}", p);
    let res = match src.provider.as_str() {
        "csv" => io_csv::read_csv_answers(&p, src)?,
        "xlsx" => io_xlsx::read_xlsx_answers(&p, src)?,
        x => {
            return UnknownProviderSnafu { provider: x }.fail();
        }
    };
    info!(
        "read_answers: {}: {} rows",
        io_common::simplify_file_name(&p),
        res.len()
    );
    Ok(res)
}

fn mark_answers(
    rows: &[ParsedAnswer],
    questions: &[QuestionConfig],
    rules: &MarkingRules,
) -> Vec<RowMark> {
    let facts: HashMap<&str, QuestionFacts> = questions
        .iter()
        .map(|q| (q.question_id.trim(), q.facts()))
        .collect();

    // All the rows of a question together are the options offered for it.
    let mut builders: HashMap<&str, Builder> = HashMap::new();
    for row in rows {
        let qid = row.question_id.as_str();
        if let (Some(f), Some(text)) = (facts.get(qid), row.answer.canonical_text()) {
            let builder = builders
                .entry(qid)
                .or_insert_with(|| Builder::new(rules).facts(f.clone()));
            let seen = builder
                .options()
                .iter()
                .any(|o| o.trim().to_lowercase() == text.trim().to_lowercase());
            if !seen {
                builder.add_option(&text);
            }
        }
    }
    debug!("mark_answers: {} questions with options", builders.len());

    let mut unmapped: Vec<&str> = rows
        .iter()
        .map(|r| r.question_id.as_str())
        .filter(|qid| !facts.contains_key(qid))
        .collect();
    unmapped.sort_unstable();
    unmapped.dedup();
    if !unmapped.is_empty() {
        warn!("mark_answers: question ids not in the configuration: {:?}", unmapped);
    }

    rows.iter()
        .map(|row| {
            let outcome = match facts.get(row.question_id.as_str()) {
                None => Err(UNMAPPED_QUESTION.to_string()),
                Some(f) => {
                    let res = match builders.get(row.question_id.as_str()) {
                        Some(b) => b.mark_cell(&row.answer),
                        // Only empty rows for this question.
                        None => Builder::new(rules).facts(f.clone()).mark_cell(&row.answer),
                    };
                    res.map_err(|e| {
                        debug!(
                            "mark_answers: line {}: question {:?}: {}",
                            row.lineno, row.question_id, e
                        );
                        format!("({})", e)
                    })
                }
            };
            RowMark {
                question_id: row.question_id.clone(),
                answer: row
                    .answer
                    .canonical_text()
                    .map(|s| s.to_string())
                    .unwrap_or_default(),
                outcome,
            }
        })
        .collect()
}

fn build_summary_js(settings: &OutputSettings, marks: &[RowMark]) -> JSValue {
    let config = OutputConfig {
        name: settings.name.clone(),
        rows: marks.len(),
    };
    let results: Vec<JSValue> = marks
        .iter()
        .map(|m| match &m.outcome {
            Ok(c) => json!({
                "questionId": m.question_id,
                "answer": m.answer,
                "autoMarkedCorrectness": c.code(),
            }),
            Err(e) => json!({
                "questionId": m.question_id,
                "answer": m.answer,
                "error": e,
            }),
        })
        .collect();
    json!({ "config": config, "results": results })
}

fn default_config() -> MarkingConfig {
    MarkingConfig {
        output_settings: OutputSettings {
            name: "gsmark".to_string(),
            output_path: None,
        },
        answer_sources: Vec::new(),
        questions: Vec::new(),
        rules: None,
    }
}

/// Reads all the answer rows, marks them and writes the summary.
///
/// `input`, when provided, replaces the answer sources of the configuration.
/// Its path is taken relative to the working directory, while the paths in the
/// configuration are relative to the configuration file.
pub fn run_marking(
    config_path: Option<String>,
    input: Option<AnswerSource>,
    out: Option<String>,
    check_summary_path: Option<String>,
) -> MarkResult<()> {
    let (config, root) = match &config_path {
        Some(p) => {
            let config = read_config(p)?;
            let root = Path::new(p)
                .parent()
                .context(MissingParentDirSnafu {})?
                .to_path_buf();
            (config, Some(root))
        }
        None => (default_config(), None),
    };
    info!("config: {:?}", config);

    let rules = config.marking_rules()?;

    let sources: Vec<(AnswerSource, PathBuf)> = match input {
        Some(src) => {
            let p = PathBuf::from(&src.file_path);
            vec![(src, p)]
        }
        None => config
            .answer_sources
            .iter()
            .map(|src| (src.clone(), resolve_path(root.as_deref(), &src.file_path)))
            .collect(),
    };
    if sources.is_empty() {
        whatever!("No answer source found: provide --input or answerSources in the configuration");
    }

    let mut rows: Vec<ParsedAnswer> = Vec::new();
    for (src, path) in sources.iter() {
        let mut file_rows = read_answers(path, src)?;
        rows.append(&mut file_rows);
    }
    if config.questions.is_empty() {
        warn!("No questions in the configuration, no row can be marked");
    }

    let marks = mark_answers(&rows, &config.questions, &rules);
    let result_js = build_summary_js(&config.output_settings, &marks);
    let pretty_js_stats = serde_json::to_string_pretty(&result_js).context(ParsingJsonSnafu {})?;

    let out_path: Option<String> = out.or_else(|| {
        config
            .output_settings
            .output_path
            .as_ref()
            .map(|p| resolve_path(root.as_deref(), p).display().to_string())
    });
    match out_path.as_deref() {
        None | Some("stdout") => {
            println!("{}", pretty_js_stats);
        }
        Some(p) => {
            info!("Writing summary to {}", p);
            fs::write(p, &pretty_js_stats).context(WritingOutputSnafu { path: p })?;
        }
    }

    // The reference summary, if provided for comparison
    if let Some(summary_p) = check_summary_path {
        let summary_ref = read_summary(&summary_p)?;
        let pretty_js_summary_ref =
            serde_json::to_string_pretty(&summary_ref).context(ParsingJsonSnafu {})?;
        if pretty_js_summary_ref != pretty_js_stats {
            warn!("Found differences with the reference summary");
            print_diff(
                pretty_js_summary_ref.as_str(),
                pretty_js_stats.as_ref(),
                "\n",
            );
            return ReferenceMismatchSnafu { path: summary_p }.fail();
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;
    use tempfile::{tempdir, TempDir};

    const ANSWERS_CSV: &str = "Question ID,Answer
q1,10-20%
q1,20-30%
q1,30-40%
q2,Yes
q2,No
q2,
q3,1
";

    fn write_file(dir: &TempDir, name: &str, contents: &str) -> String {
        let p = dir.path().join(name);
        let mut f = File::create(&p).unwrap();
        f.write_all(contents.as_bytes()).unwrap();
        p.display().to_string()
    }

    fn write_config(dir: &TempDir) -> String {
        let config = json!({
            "outputSettings": {"name": "Batch 1", "outputPath": "marks.json"},
            "answerSources": [{
                "provider": "csv",
                "filePath": "answers.csv",
                "questionIdColumnIndex": "A",
                "answerColumnIndex": "B"
            }],
            "questions": [
                {"questionId": "q1", "correctAnswer": "34%"},
                {"questionId": "q2", "correctAnswer": "Yes"}
            ]
        });
        write_file(dir, "answers.csv", ANSWERS_CSV);
        write_file(dir, "marking.json", &config.to_string())
    }

    fn expected_summary() -> JSValue {
        json!({
            "config": {"name": "Batch 1", "rows": 7},
            "results": [
                {"questionId": "q1", "answer": "10-20%", "autoMarkedCorrectness": "3"},
                {"questionId": "q1", "answer": "20-30%", "autoMarkedCorrectness": "2"},
                {"questionId": "q1", "answer": "30-40%", "autoMarkedCorrectness": "1"},
                {"questionId": "q2", "answer": "Yes", "autoMarkedCorrectness": "1"},
                {"questionId": "q2", "answer": "No", "autoMarkedCorrectness": "2"},
                {"questionId": "q2", "answer": "", "error": "(Invalid argument: chosen answer option must not be empty)"},
                {"questionId": "q3", "answer": "1", "error": "(Question ID not mapped)"}
            ]
        })
    }

    fn rows(data: &[(&str, &str)]) -> Vec<ParsedAnswer> {
        data.iter()
            .enumerate()
            .map(|(idx, (qid, answer))| ParsedAnswer {
                question_id: qid.to_string(),
                answer: AnswerCell::from(*answer),
                lineno: idx + 2,
            })
            .collect()
    }

    fn question(qid: &str, correct: &str) -> QuestionConfig {
        QuestionConfig {
            question_id: qid.to_string(),
            correct_answer: Some(correct.to_string()),
            very_wrong_answer: None,
        }
    }

    #[test]
    fn marks_rows_in_input_order() {
        let rows = rows(&[("q1", "3"), ("q2", "a"), ("q1", "1"), ("q1", "2")]);
        let marks = mark_answers(&rows, &[question("q1", "1")], &MarkingRules::DEFAULT_RULES);
        let outcomes: Vec<Result<Correctness, String>> =
            marks.into_iter().map(|m| m.outcome).collect();
        assert_eq!(
            outcomes,
            vec![
                Ok(Correctness::VeryWrong),
                Err(UNMAPPED_QUESTION.to_string()),
                Ok(Correctness::Correct),
                Ok(Correctness::Wrong),
            ]
        );
    }

    #[test]
    fn repeated_rows_are_one_option() {
        let rows = rows(&[("q1", "1"), ("q1", "2"), ("q1", "2 "), ("q1", "3")]);
        let marks = mark_answers(&rows, &[question("q1", "1")], &MarkingRules::DEFAULT_RULES);
        assert_eq!(marks[3].outcome, Ok(Correctness::VeryWrong));
    }

    #[test]
    fn row_errors_are_reported() {
        let rows = rows(&[("q1", "1"), ("q1", "2")]);
        let mut q = question("q1", "42");
        let marks = mark_answers(&rows, &[q.clone()], &MarkingRules::DEFAULT_RULES);
        assert_eq!(
            marks[0].outcome,
            Err("(No correct answer option found)".to_string())
        );
        q.correct_answer = None;
        let marks = mark_answers(&rows, &[q], &MarkingRules::DEFAULT_RULES);
        assert_eq!(
            marks[0].outcome,
            Err("(No factual answer provided)".to_string())
        );
    }

    #[test]
    fn run_with_config() {
        let _ = env_logger::builder().is_test(true).try_init();
        let dir = tempdir().unwrap();
        let config_path = write_config(&dir);
        run_marking(Some(config_path), None, None, None).unwrap();
        let summary = read_summary(&dir.path().join("marks.json").display().to_string()).unwrap();
        assert_eq!(summary, expected_summary());
    }

    #[test]
    fn run_with_reference() {
        let dir = tempdir().unwrap();
        let config_path = write_config(&dir);
        let out = dir.path().join("out.json").display().to_string();
        let reference = write_file(&dir, "expected.json", &expected_summary().to_string());
        run_marking(
            Some(config_path.clone()),
            None,
            Some(out.clone()),
            Some(reference),
        )
        .unwrap();

        let mut wrong = expected_summary();
        wrong["config"]["rows"] = json!(6);
        let reference = write_file(&dir, "wrong.json", &wrong.to_string());
        let res = run_marking(Some(config_path), None, Some(out), Some(reference));
        assert!(matches!(res, Err(MarkError::ReferenceMismatch { .. })));
    }

    #[test]
    fn run_with_input_only() {
        let dir = tempdir().unwrap();
        let input = write_file(&dir, "answers.csv", ANSWERS_CSV);
        let out = dir.path().join("out.json").display().to_string();
        let src = AnswerSource::from_input(&input, None, None);
        run_marking(None, Some(src), Some(out.clone()), None).unwrap();
        let summary = read_summary(&out).unwrap();
        assert_eq!(summary["config"]["rows"], json!(7));
        assert_eq!(
            summary["results"][0]["error"],
            json!("(Question ID not mapped)")
        );
    }

    #[test]
    fn run_without_sources() {
        let res = run_marking(None, None, None, None);
        assert!(matches!(res, Err(MarkError::Whatever { .. })));
    }

    #[test]
    fn unknown_provider() {
        let dir = tempdir().unwrap();
        let input = write_file(&dir, "answers.csv", ANSWERS_CSV);
        let src = AnswerSource::from_input(&input, Some("ods".to_string()), None);
        let res = run_marking(None, Some(src), Some("stdout".to_string()), None);
        assert!(matches!(res, Err(MarkError::UnknownProvider { .. })));
    }
}

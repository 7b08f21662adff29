// Primitives for reading CSV files.

use crate::marker::{io_common::cell_from_text, *};

pub fn read_csv_answers(path: &str, src: &AnswerSource) -> MarkResult<Vec<ParsedAnswer>> {
    let qid_idx = src.question_id_column_index()?;
    let answer_idx = src.answer_column_index()?;
    let first_row = src.first_row_index()?;

    // Trailing empty cells are often dropped by the exports.
    let rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .context(CsvOpenSnafu { path })?;

    let mut res: Vec<ParsedAnswer> = Vec::new();
    // The index starts at 1 to respect most conventions in the excel world
    for (idx, line_r) in rdr.into_records().enumerate().skip(first_row - 1) {
        let lineno = idx + 1;
        let line = line_r.context(CsvLineParseSnafu {})?;
        let question_id = line
            .get(qid_idx)
            .context(LineTooShortSnafu {
                lineno,
                column: qid_idx + 1,
            })?
            .trim();
        if question_id.is_empty() {
            debug!("read_csv_answers: lineno: {:?}: no question id, skipping", lineno);
            continue;
        }
        let answer = cell_from_text(line.get(answer_idx));
        debug!(
            "read_csv_answers: lineno: {:?} question: {:?} answer: {:?}",
            lineno, question_id, answer
        );
        res.push(ParsedAnswer {
            question_id: question_id.to_string(),
            answer,
            lineno,
        });
    }
    Ok(res)
}

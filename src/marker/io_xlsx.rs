use calamine::{open_workbook, DataType, Range, Reader, Xlsx};

use crate::marker::*;

pub fn read_xlsx_answers(path: &str, src: &AnswerSource) -> MarkResult<Vec<ParsedAnswer>> {
    let qid_idx = src.question_id_column_index()?;
    let answer_idx = src.answer_column_index()?;
    let first_row = src.first_row_index()?;

    let wrange = get_range(path, src)?;
    // The range starts at the first non-empty cell of the sheet, not at A1.
    let (row_start, col_start) = wrange.start().unwrap_or((0, 0));
    let (row_start, col_start) = (row_start as usize, col_start as usize);
    debug!(
        "read_xlsx_answers: path: {:?} start: {:?}",
        path,
        (row_start, col_start)
    );

    let mut res: Vec<ParsedAnswer> = Vec::new();
    for (idx, row) in wrange.rows().enumerate() {
        let lineno = row_start + idx + 1;
        if lineno < first_row {
            continue;
        }
        let question_id = read_question_id(get_cell(row, qid_idx, col_start), lineno)?;
        if question_id.is_empty() {
            debug!("read_xlsx_answers: lineno: {:?}: no question id, skipping", lineno);
            continue;
        }
        let answer = read_answer_cell(get_cell(row, answer_idx, col_start), lineno)?;
        debug!(
            "read_xlsx_answers: lineno: {:?} question: {:?} answer: {:?}",
            lineno, question_id, answer
        );
        res.push(ParsedAnswer {
            question_id,
            answer,
            lineno,
        });
    }
    Ok(res)
}

fn get_cell(row: &[DataType], column: usize, col_start: usize) -> Option<&DataType> {
    column.checked_sub(col_start).and_then(|c| row.get(c))
}

fn read_question_id(cell: Option<&DataType>, lineno: usize) -> MarkResult<String> {
    match cell {
        None | Some(DataType::Empty) => Ok(String::new()),
        Some(DataType::String(s)) => Ok(s.trim().to_string()),
        Some(DataType::Int(i)) => Ok(i.to_string()),
        Some(DataType::Float(f)) => Ok(f.to_string()),
        Some(c) => ExcelWrongCellTypeSnafu {
            lineno,
            content: format!("{:?}", c),
        }
        .fail(),
    }
}

fn read_answer_cell(cell: Option<&DataType>, lineno: usize) -> MarkResult<AnswerCell> {
    match cell {
        None | Some(DataType::Empty) => Ok(AnswerCell::Empty),
        Some(DataType::String(s)) if s.trim().is_empty() => Ok(AnswerCell::Empty),
        Some(DataType::String(s)) => Ok(AnswerCell::Text(s.clone())),
        Some(DataType::Float(f)) => Ok(AnswerCell::Number(*f)),
        Some(DataType::Int(i)) => Ok(AnswerCell::Number(*i as f64)),
        Some(DataType::Bool(b)) => Ok(AnswerCell::Boolean(*b)),
        Some(c) => ExcelWrongCellTypeSnafu {
            lineno,
            content: format!("{:?}", c),
        }
        .fail(),
    }
}

fn get_range(path: &str, src: &AnswerSource) -> MarkResult<Range<DataType>> {
    let mut workbook: Xlsx<_> = open_workbook(path).context(OpeningExcelSnafu { path })?;

    // A worksheet name was provided, use it.
    if let Some(worksheet_name) = &src.excel_worksheet_name {
        let wrange = workbook
            .worksheet_range(worksheet_name)
            .context(MissingWorksheetSnafu {
                path,
                name: worksheet_name,
            })?
            .context(OpeningExcelSnafu { path })?;
        return Ok(wrange);
    }

    let all_worksheets = workbook.worksheets();
    match all_worksheets.as_slice() {
        [] => EmptyExcelSnafu { path }.fail(),
        [(worksheet_name, wrange)] => {
            debug!(
                "get_range: path: {:?} worksheet: {:?}",
                path, worksheet_name
            );
            Ok(wrange.clone())
        }
        _ => TooManyWorksheetsSnafu { path }.fail(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(DataType::String("14 pounds".to_string()), AnswerCell::from("14 pounds"))]
    #[case(DataType::String(" ".to_string()), AnswerCell::Empty)]
    #[case(DataType::Float(1.5), AnswerCell::Number(1.5))]
    #[case(DataType::Int(3), AnswerCell::Number(3.0))]
    #[case(DataType::Bool(true), AnswerCell::Boolean(true))]
    #[case(DataType::Empty, AnswerCell::Empty)]
    fn answer_cells(#[case] cell: DataType, #[case] expected: AnswerCell) {
        assert_eq!(read_answer_cell(Some(&cell), 2).unwrap(), expected);
    }

    #[test]
    fn missing_cells() {
        assert_eq!(read_answer_cell(None, 2).unwrap(), AnswerCell::Empty);
        assert_eq!(read_question_id(None, 2).unwrap(), "");
    }

    #[test]
    fn wrong_cell_types() {
        let res = read_answer_cell(Some(&DataType::DateTime(44000.0)), 7);
        assert!(matches!(
            res,
            Err(MarkError::ExcelWrongCellType { lineno: 7, .. })
        ));
    }

    #[test]
    fn numerical_question_ids() {
        assert_eq!(read_question_id(Some(&DataType::Int(12)), 2).unwrap(), "12");
        assert_eq!(
            read_question_id(Some(&DataType::String(" q1 ".to_string())), 2).unwrap(),
            "q1"
        );
    }

    #[test]
    fn cells_relative_to_range_start() {
        let row = vec![DataType::String("q1".to_string()), DataType::Int(4)];
        assert_eq!(get_cell(&row, 2, 1), Some(&DataType::Int(4)));
        assert_eq!(get_cell(&row, 0, 1), None);
    }

    #[test]
    fn missing_file() {
        let src = AnswerSource::from_input("does/not/exist.xlsx", None, None);
        let res = read_xlsx_answers("does/not/exist.xlsx", &src);
        assert!(matches!(res, Err(MarkError::OpeningExcel { .. })));
    }
}

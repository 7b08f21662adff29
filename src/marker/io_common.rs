// Helpers shared by the readers.

use std::path::Path;

use answer_matching::AnswerCell;

pub fn simplify_file_name(path: &str) -> String {
    Path::new(path)
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or(path)
        .to_string()
}

/// A cell of a text-only source. Missing and blank cells are empty.
pub fn cell_from_text(s: Option<&str>) -> AnswerCell {
    match s {
        Some(x) if !x.trim().is_empty() => AnswerCell::Text(x.to_string()),
        _ => AnswerCell::Empty,
    }
}

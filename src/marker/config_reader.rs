use crate::marker::*;

use serde::{Deserialize, Serialize};
use serde_json::Value as JSValue;

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct OutputSettings {
    pub name: String,
    #[serde(rename = "outputPath")]
    pub output_path: Option<String>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    pub name: String,
    pub rows: usize,
}

/// One file of answer rows.
#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct AnswerSource {
    pub provider: String,
    #[serde(rename = "filePath")]
    pub file_path: String,
    #[serde(rename = "questionIdColumnIndex")]
    _question_id_column_index: Option<JSValue>,
    #[serde(rename = "answerColumnIndex")]
    _answer_column_index: Option<JSValue>,
    #[serde(rename = "firstRowIndex")]
    _first_row_index: Option<JSValue>,
    #[serde(rename = "excelWorksheetName")]
    pub excel_worksheet_name: Option<String>,
}

impl AnswerSource {
    /// A source given on the command line: question ids in column A, answers
    /// in column B, and a header row.
    pub fn from_input(
        file_path: &str,
        provider: Option<String>,
        excel_worksheet_name: Option<String>,
    ) -> AnswerSource {
        let provider = provider.unwrap_or_else(|| {
            if file_path.to_lowercase().ends_with(".xlsx") {
                "xlsx".to_string()
            } else {
                "csv".to_string()
            }
        });
        AnswerSource {
            provider,
            file_path: file_path.to_string(),
            _question_id_column_index: None,
            _answer_column_index: None,
            _first_row_index: None,
            excel_worksheet_name,
        }
    }

    /// 0-based index of the question id column.
    pub fn question_id_column_index(&self) -> MarkResult<usize> {
        let x = read_js_int(&self._question_id_column_index, 1)?;
        Ok(x - 1)
    }

    /// 0-based index of the answer column.
    pub fn answer_column_index(&self) -> MarkResult<usize> {
        let x = read_js_int(&self._answer_column_index, 2)?;
        Ok(x - 1)
    }

    /// 1-based index of the first data row. Defaults to skipping one header row.
    pub fn first_row_index(&self) -> MarkResult<usize> {
        read_js_int(&self._first_row_index, 2)
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct QuestionConfig {
    #[serde(rename = "questionId")]
    pub question_id: String,
    #[serde(rename = "correctAnswer")]
    pub correct_answer: Option<String>,
    #[serde(rename = "veryWrongAnswer")]
    pub very_wrong_answer: Option<String>,
}

impl QuestionConfig {
    pub fn facts(&self) -> QuestionFacts {
        QuestionFacts {
            correct_answer: self.correct_answer.clone().unwrap_or_default(),
            very_wrong_answer: self.very_wrong_answer.clone(),
        }
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct RulesConfig {
    #[serde(rename = "veryWrongDistance")]
    pub very_wrong_distance: Option<usize>,
    #[serde(rename = "inferVeryWrong")]
    pub infer_very_wrong: Option<bool>,
}

impl RulesConfig {
    pub fn marking_rules(&self) -> MarkResult<MarkingRules> {
        let defaults = MarkingRules::DEFAULT_RULES;
        let very_wrong_distance = self
            .very_wrong_distance
            .unwrap_or(defaults.very_wrong_distance);
        if very_wrong_distance == 0 {
            whatever!("veryWrongDistance must be at least 1");
        }
        Ok(MarkingRules {
            very_wrong_distance,
            infer_very_wrong: self.infer_very_wrong.unwrap_or(defaults.infer_very_wrong),
        })
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct MarkingConfig {
    #[serde(rename = "outputSettings")]
    pub output_settings: OutputSettings,
    #[serde(rename = "answerSources", default)]
    pub answer_sources: Vec<AnswerSource>,
    #[serde(default)]
    pub questions: Vec<QuestionConfig>,
    pub rules: Option<RulesConfig>,
}

impl MarkingConfig {
    pub fn marking_rules(&self) -> MarkResult<MarkingRules> {
        match &self.rules {
            Some(r) => r.marking_rules(),
            None => Ok(MarkingRules::DEFAULT_RULES),
        }
    }
}

pub fn read_config(path: &str) -> MarkResult<MarkingConfig> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu {})
}

pub fn read_summary(path: &str) -> MarkResult<JSValue> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu {})
}

// 1-based indexes, as numbers, numerical strings or Excel-style column letters.
fn read_js_int(x: &Option<JSValue>, default: usize) -> MarkResult<usize> {
    let res = match x {
        None | Some(JSValue::Null) => Some(default),
        Some(JSValue::Number(n)) => n.as_u64().map(|x| x as usize),
        Some(JSValue::String(s)) if !s.is_empty() && s.chars().all(|c| c.is_ascii_alphabetic()) => {
            excel_column_number(s)
        }
        Some(JSValue::String(s)) => s.trim().parse::<usize>().ok(),
        _ => None,
    };
    res.filter(|x| *x >= 1).context(ParsingColumnIndexSnafu {
        value: format!("{:?}", x),
    })
}

// "A" -> 1, "Z" -> 26, "AA" -> 27. None when too large.
fn excel_column_number(s: &str) -> Option<usize> {
    s.to_ascii_uppercase().bytes().try_fold(0usize, |acc, b| {
        acc.checked_mul(26)?.checked_add((b - b'A' + 1) as usize)
    })
}

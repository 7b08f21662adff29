//! Parsing of the metadata attached to survey exports: the survey names, which
//! encode the batch a survey belongs to, and the reporting URLs, which carry
//! the survey id.

use log::debug;

const WORLD_VIEWS: &str = "World Views ";
const COUNTRY_VIEWS: &str = "Country Views ";
const STUDY_SURVEY: &str = "Study Survey ";
const STUDY: &str = "Study ";

// World Views batches up to this number were run as one batch.
const MAX_FIRST_WORLD_VIEWS_BATCH: u32 = 80;

/// The batch number of a survey, for one of the survey series.
#[derive(Eq, PartialEq, Debug, Clone, Hash)]
pub enum BatchNumber {
    /// The survey name does not follow any of the known series.
    Unrecognized,
    /// The survey belongs to another series.
    NotApplicable,
    Batch(String),
}

impl BatchNumber {
    pub fn batch(&self) -> Option<&str> {
        match self {
            BatchNumber::Batch(s) => Some(s.as_str()),
            _ => None,
        }
    }
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct SurveyBatch {
    pub world_views: BatchNumber,
    pub country_views: BatchNumber,
    pub study: BatchNumber,
}

/// Finds the batch numbers encoded in a survey name such as `"World Views 123"`,
/// `"Country Views 12"` or `"Study Survey 3"`.
pub fn parse_survey_name(survey_name: &str) -> SurveyBatch {
    let strip = |prefix: &str| -> Option<String> {
        if survey_name.contains(prefix) {
            Some(survey_name.trim().replace(prefix, ""))
        } else {
            None
        }
    };

    let world_views = strip(WORLD_VIEWS).map(|b| match b.parse::<u32>() {
        Ok(n) if n > 0 && n <= MAX_FIRST_WORLD_VIEWS_BATCH => {
            format!("1-{}", MAX_FIRST_WORLD_VIEWS_BATCH)
        }
        _ => b,
    });
    let country_views = strip(COUNTRY_VIEWS);
    let study = strip(STUDY_SURVEY).or_else(|| strip(STUDY));

    // Some country views surveys were also run as studies.
    let study = match country_views.as_deref() {
        Some("383") => Some("1/c383".to_string()),
        Some("384") => Some("2/c384".to_string()),
        Some("385") => Some("3/c385".to_string()),
        _ => study,
    };

    let recognized = world_views.is_some() || country_views.is_some() || study.is_some();
    let to_batch = |o: Option<String>| match o {
        Some(s) => BatchNumber::Batch(s),
        None if recognized => BatchNumber::NotApplicable,
        None => BatchNumber::Unrecognized,
    };
    let res = SurveyBatch {
        world_views: to_batch(world_views),
        country_views: to_batch(country_views),
        study: to_batch(study),
    };
    debug!("parse_survey_name: {:?} -> {:?}", survey_name, res);
    res
}

/// Extracts the survey id from a Google Surveys reporting URL
/// (`https://surveys.google.com/reporting/survey?survey=<id>&...`).
///
/// Query parameters are form-decoded: `%xx` escapes and `+` for spaces.
pub fn survey_id_from_url(url: &str) -> Option<String> {
    let query = url.split_once('?').map(|(_, q)| q).unwrap_or(url);
    let query = query.split_once('#').map(|(q, _)| q).unwrap_or(query);
    query
        .split('&')
        .filter_map(|kv| kv.split_once('='))
        .filter_map(|(k, v)| Some((decode_query_component(k)?, v)))
        .find(|(k, _)| k == "survey")
        .and_then(|(_, v)| decode_query_component(v))
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn decode_query_component(s: &str) -> Option<String> {
    match urlencoding::decode(&s.replace('+', " ")) {
        Ok(decoded) => Some(decoded.into_owned()),
        Err(e) => {
            debug!("decode_query_component: {:?}: {}", s, e);
            None
        }
    }
}

//! Deciding whether a detail page's displayed date is "today".
//!
//! The bulletin site renders dates inconsistently across article templates
//! (`2024-03-14`, `2024.03.14 08:30`, `입력 2024/3/14`, or nothing at all), so
//! the matcher is permissive: only a date that parses and is provably in the
//! past is rejected.

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;

static DIGIT_RUNS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d+").unwrap());

/// Outcome of matching one candidate's date text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Accept,
    Reject,
    /// No proof the date is wrong (missing, unparseable or in the future).
    AcceptWithUncertainty,
}

impl Verdict {
    /// The locator takes both accepting verdicts as a match.
    pub fn is_accepted(self) -> bool {
        !matches!(self, Verdict::Reject)
    }
}

/// Today's date plus its string markers, fixed for the whole run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Today {
    date: NaiveDate,
    markers: Vec<String>,
}

impl Today {
    pub fn new(date: NaiveDate) -> Self {
        let markers = ["%Y-%m-%d", "%Y.%m.%d", "%Y/%m/%d"]
            .iter()
            .map(|fmt| date.format(fmt).to_string())
            .collect();
        Self { date, markers }
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    /// `YYYY-MM-DD`, the key used for directories and snapshots.
    pub fn dashed(&self) -> String {
        self.date.format("%Y-%m-%d").to_string()
    }

    pub fn markers(&self) -> &[String] {
        &self.markers
    }
}

/// Build `YYYY-MM-DD` from the first three digit runs, padding month and day.
fn candidate_date(date_text: &str) -> Option<String> {
    let runs: Vec<&str> = DIGIT_RUNS
        .find_iter(date_text)
        .map(|m| m.as_str())
        .collect();
    if runs.len() < 3 {
        return None;
    }
    Some(format!("{}-{:0>2}-{:0>2}", runs[0], runs[1], runs[2]))
}

/// Match a displayed date against today.
///
/// # Arguments
///
/// * `date_text` - Date text as displayed on a detail page (may be empty)
/// * `today` - The run date and its string markers
///
/// # Returns
///
/// - [`Verdict::Accept`] when a marker appears in the text or the first three
///   digit runs form today's date
/// - [`Verdict::Reject`] only when those runs parse to a date before today
/// - [`Verdict::AcceptWithUncertainty`] otherwise, including text without digits
pub fn matches(date_text: &str, today: &Today) -> Verdict {
    if !date_text.chars().any(|c| c.is_ascii_digit()) {
        return Verdict::AcceptWithUncertainty;
    }

    let candidate = candidate_date(date_text);
    if candidate.as_deref() == Some(today.dashed().as_str())
        || today.markers().iter().any(|m| date_text.contains(m.as_str()))
    {
        return Verdict::Accept;
    }

    match candidate.and_then(|c| NaiveDate::parse_from_str(&c, "%Y-%m-%d").ok()) {
        Some(parsed) if parsed < today.date() => Verdict::Reject,
        _ => Verdict::AcceptWithUncertainty,
    }
}

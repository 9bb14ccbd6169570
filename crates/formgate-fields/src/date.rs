//! Date and date/time fields
//!
//! The widget submits separate year, month, day (and time) parts. Checks run
//! in a fixed order and stop at the first malformed part:
//!
//! 1. completeness
//! 2. month range
//! 3. day and year are numeric
//! 4. year digit count (two digits only when expansion is on)
//! 5. calendar validity
//!
//! The time part is checked on its own and replaced by its canonical
//! `HH:MM:SS` form when it parses.

use crate::{Checked, FieldValidator, SetupContext, ValidationContext};
use chrono::{NaiveDate, NaiveTime};
use formgate_core::{
    DateLevel, DateOptions, DateParts, FieldProblem, FieldSpec, FieldValue, ProblemKind,
    RawComponents, RawValue, Representation, Representations, SetupErrorKind, SetupReport,
};
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// `9`, `09:30`, `9.30`, `9h30`, `09:30:15`, each with optional am/pm
    static ref SEPARATED_TIME: Regex = Regex::new(
        r"^(\d{1,2})(?:[:.h](\d{2})(?:[:.](\d{2}))?)?\s*(am|pm|a\.m\.|p\.m\.)?$"
    )
    .unwrap();

    /// `930`, `0930`, `1745pm`
    static ref COMPACT_TIME: Regex = Regex::new(r"^(\d{1,2})(\d{2})\s*(am|pm|a\.m\.|p\.m\.)?$").unwrap();

    static ref DIGITS: Regex = Regex::new(r"^\d+$").unwrap();
}

/// Expand a two-digit year: up to `cutoff` becomes 20yy, above it 19yy.
pub fn expand_year(year: &str, cutoff: u32) -> String {
    match year.parse::<u32>() {
        Ok(short) if year.len() == 2 => {
            if short <= cutoff {
                format!("20{:02}", short)
            } else {
                format!("19{:02}", short)
            }
        }
        _ => year.to_string(),
    }
}

/// Parse a time of day written in any of the accepted styles.
pub fn parse_time(input: &str) -> Option<NaiveTime> {
    let input = input.trim().to_lowercase();
    match input.as_str() {
        "noon" => return NaiveTime::from_hms_opt(12, 0, 0),
        "midnight" => return NaiveTime::from_hms_opt(0, 0, 0),
        _ => {}
    }

    let (hour, minute, second, meridiem) = if let Some(caps) = SEPARATED_TIME.captures(&input) {
        (
            caps.get(1)?.as_str().parse::<u32>().ok()?,
            caps.get(2).map_or(Some(0), |m| m.as_str().parse::<u32>().ok())?,
            caps.get(3).map_or(Some(0), |m| m.as_str().parse::<u32>().ok())?,
            caps.get(4).map(|m| m.as_str().starts_with('p')),
        )
    } else if let Some(caps) = COMPACT_TIME.captures(&input) {
        (
            caps.get(1)?.as_str().parse::<u32>().ok()?,
            caps.get(2)?.as_str().parse::<u32>().ok()?,
            0,
            caps.get(3).map(|m| m.as_str().starts_with('p')),
        )
    } else {
        return None;
    };

    let hour = match meridiem {
        None => hour,
        Some(_) if hour == 0 || hour > 12 => return None,
        Some(false) => hour % 12,
        Some(true) => hour % 12 + 12,
    };

    NaiveTime::from_hms_opt(hour, minute, second)
}

/// Read a `YYYY-MM-DD[ time]` string into parts without checking them.
fn loose_parts(value: &str) -> DateParts {
    let value = value.trim();
    let (date, time) = match value.split_once(|c: char| c == ' ' || c == 'T') {
        Some((date, time)) => (date, time.trim()),
        None => (value, ""),
    };
    let mut pieces = date.splitn(3, '-');
    DateParts {
        year: pieces.next().unwrap_or("").to_string(),
        month: pieces.next().unwrap_or("").to_string(),
        day: pieces.next().unwrap_or("").to_string(),
        time: time.to_string(),
    }
}

fn submitted_parts(raw: Option<&RawValue>) -> DateParts {
    match raw {
        Some(RawValue::Map(map)) => {
            let part = |key: &str| map.get(key).map(|v| v.trim().to_string()).unwrap_or_default();
            DateParts {
                year: part("year"),
                month: part("month"),
                day: part("day"),
                time: part("time"),
            }
        }
        Some(RawValue::Text(text)) => loose_parts(text),
        _ => DateParts::default(),
    }
}

pub struct DateField<'a>(pub &'a DateOptions);

impl DateField<'_> {
    fn uses_time(&self) -> bool {
        self.0.level == DateLevel::DateTime
    }

    /// Validate and canonicalize the date part.
    fn check_date(
        &self,
        title: &str,
        parts: &mut DateParts,
        cutoff: u32,
    ) -> Result<NaiveDate, FieldProblem> {
        let malformed = |what: &str| {
            FieldProblem::new(
                ProblemKind::MalformedDate,
                format!("{}: the {} is not valid.", title, what),
            )
        };

        if parts.year.is_empty() || parts.month.is_empty() || parts.day.is_empty() {
            return Err(FieldProblem::new(
                ProblemKind::IncompleteDateParts,
                format!("{}: please fill in year, month and day.", title),
            ));
        }

        let month = parts
            .month
            .parse::<u32>()
            .ok()
            .filter(|m| DIGITS.is_match(&parts.month) && (1..=12).contains(m))
            .ok_or_else(|| malformed("month"))?;
        parts.month = format!("{:02}", month);

        if !DIGITS.is_match(&parts.day) || parts.day.len() > 2 {
            return Err(malformed("day"));
        }
        if !DIGITS.is_match(&parts.year) {
            return Err(malformed("year"));
        }

        match parts.year.len() {
            4 => {}
            2 if self.0.expand_years => parts.year = expand_year(&parts.year, cutoff),
            _ => return Err(malformed("year")),
        }

        let year = parts.year.parse::<i32>().map_err(|_| malformed("year"))?;
        let day = parts.day.parse::<u32>().map_err(|_| malformed("day"))?;
        parts.day = format!("{:02}", day);

        NaiveDate::from_ymd_opt(year, month, day).ok_or_else(|| {
            FieldProblem::new(
                ProblemKind::InvalidDateCalendar,
                format!("{}: {}-{}-{} does not exist.", title, parts.year, parts.month, parts.day),
            )
        })
    }
}

impl FieldValidator for DateField<'_> {
    fn initial_value(&self, ctx: &ValidationContext<'_>) -> FieldValue {
        let parts = match self.0.default.as_deref().map(str::trim) {
            Some("today") => {
                let today = ctx.today.format("%Y-%m-%d").to_string();
                loose_parts(&today)
            }
            Some(default) => loose_parts(default),
            None => DateParts::default(),
        };
        FieldValue::Date(parts)
    }

    fn setup_checks(&self, spec: &FieldSpec, _setup: &SetupContext<'_>, report: &mut SetupReport) {
        if let Some(cutoff) = self.0.year_cutoff {
            if cutoff > 99 {
                report.add(
                    SetupErrorKind::ThresholdMismatch,
                    format!("field '{}': year_cutoff must be below 100 ({} given)", spec.name, cutoff),
                );
            }
        }
    }

    fn produces(&self, _representation: Representation) -> bool {
        true
    }

    fn check(&self, spec: &FieldSpec, raw: Option<&RawValue>, ctx: &ValidationContext<'_>) -> Checked {
        let title = spec.display_title();
        let mut parts = submitted_parts(raw);
        if !self.uses_time() {
            parts.time.clear();
        }

        if parts.date_is_blank() && parts.time.is_empty() {
            return Checked {
                sticky: FieldValue::Date(parts.clone()),
                normalized: FieldValue::Empty,
                problems: Vec::new(),
                empty: true,
                representations: Representations {
                    rawcomponents: Some(RawComponents::Date(parts)),
                    compiled: Some(String::new()),
                    presented: Some(String::new()),
                },
            };
        }

        let mut problems = Vec::new();
        let cutoff = self.0.year_cutoff.unwrap_or(ctx.settings.year_cutoff);
        let date = match self.check_date(title, &mut parts, cutoff) {
            Ok(date) => Some(date),
            Err(problem) => {
                problems.push(problem);
                None
            }
        };

        let mut time = None;
        if !parts.time.is_empty() {
            match parse_time(&parts.time) {
                Some(parsed) => {
                    parts.time = parsed.format("%H:%M:%S").to_string();
                    time = Some(parsed);
                }
                None => problems.push(FieldProblem::new(
                    ProblemKind::InvalidTimeFormat,
                    format!("{}: '{}' is not a recognizable time.", title, parts.time),
                )),
            }
        }

        let (compiled, presented) = match date {
            Some(date) if problems.is_empty() => {
                let mut compiled = date.format("%Y-%m-%d").to_string();
                let mut presented = date.format("%B %-d, %Y").to_string();
                if let Some(time) = time {
                    compiled.push_str(&time.format(" %H:%M:%S").to_string());
                    presented.push_str(&time.format(" %H:%M").to_string());
                }
                (compiled, presented)
            }
            _ => (String::new(), String::new()),
        };

        let normalized = if compiled.is_empty() {
            FieldValue::Empty
        } else {
            FieldValue::Text(compiled.clone())
        };

        Checked {
            sticky: FieldValue::Date(parts.clone()),
            normalized,
            problems,
            empty: false,
            representations: Representations {
                rawcomponents: Some(RawComponents::Date(parts)),
                compiled: Some(compiled),
                presented: Some(presented),
            },
        }
    }
}

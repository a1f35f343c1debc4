use chrono::{Datelike, NaiveDate, NaiveTime};

use crate::domain::models::provider::{AvailabilityException, AvailabilityWindow, ExceptionKind};
use crate::error::AppError;

/// Provider-local wall-time interval, half-open.
pub type LocalInterval = (NaiveTime, NaiveTime);

pub fn parse_hhmm(raw: &str) -> Result<NaiveTime, AppError> {
    NaiveTime::parse_from_str(raw, "%H:%M")
        .map_err(|_| AppError::Validation(format!("Invalid time '{}', expected HH:MM", raw)))
}

/// Write-time validation for a recurring window: well-formed bounds and no
/// overlap with the provider's existing windows on the same weekday.
/// Overlaps are rejected, never silently merged.
pub fn validate_new_window(
    new: &AvailabilityWindow,
    existing: &[AvailabilityWindow],
) -> Result<(), AppError> {
    if !(0..=6).contains(&new.weekday) {
        return Err(AppError::Validation("Weekday must be 0 (Monday) to 6 (Sunday)".into()));
    }
    let start = parse_hhmm(&new.start_time)?;
    let end = parse_hhmm(&new.end_time)?;
    if start >= end {
        return Err(AppError::Validation("Window start must be before end".into()));
    }
    for window in existing.iter().filter(|w| w.weekday == new.weekday) {
        let (ws, we) = (parse_hhmm(&window.start_time)?, parse_hhmm(&window.end_time)?);
        if start < we && end > ws {
            return Err(AppError::Validation(format!(
                "Window overlaps existing window {}-{}",
                window.start_time, window.end_time
            )));
        }
    }
    Ok(())
}

/// Merges the recurring windows for `date`'s weekday with that date's
/// exceptions: BLOCKED subtracts (splitting a window the block lands inside),
/// ADDED unions in. Output is non-overlapping and sorted ascending.
pub fn resolve_windows(
    date: NaiveDate,
    windows: &[AvailabilityWindow],
    exceptions: &[AvailabilityException],
) -> Result<Vec<LocalInterval>, AppError> {
    let weekday = date.weekday().num_days_from_monday() as i32;

    let mut intervals: Vec<LocalInterval> = Vec::new();
    for window in windows.iter().filter(|w| w.weekday == weekday) {
        intervals.push((parse_hhmm(&window.start_time)?, parse_hhmm(&window.end_time)?));
    }
    intervals.sort();

    for exception in exceptions.iter().filter(|e| e.date == date) {
        match exception.kind {
            ExceptionKind::Blocked => {
                match (&exception.start_time, &exception.end_time) {
                    (Some(s), Some(e)) => {
                        intervals = subtract(intervals, (parse_hhmm(s)?, parse_hhmm(e)?));
                    }
                    // No bounds = the whole day is blocked.
                    _ => intervals.clear(),
                }
            }
            ExceptionKind::Added => {
                let (Some(s), Some(e)) = (&exception.start_time, &exception.end_time) else {
                    return Err(AppError::Validation("ADDED exception requires start and end".into()));
                };
                let (start, end) = (parse_hhmm(s)?, parse_hhmm(e)?);
                if start >= end {
                    return Err(AppError::Validation("Exception start must be before end".into()));
                }
                intervals.push((start, end));
            }
        }
    }

    Ok(merge(intervals))
}

fn subtract(intervals: Vec<LocalInterval>, block: LocalInterval) -> Vec<LocalInterval> {
    let (bs, be) = block;
    let mut out = Vec::with_capacity(intervals.len() + 1);
    for (s, e) in intervals {
        if be <= s || bs >= e {
            out.push((s, e));
            continue;
        }
        if bs > s {
            out.push((s, bs));
        }
        if be < e {
            out.push((be, e));
        }
    }
    out
}

fn merge(mut intervals: Vec<LocalInterval>) -> Vec<LocalInterval> {
    intervals.sort();
    let mut out: Vec<LocalInterval> = Vec::with_capacity(intervals.len());
    for (s, e) in intervals {
        match out.last_mut() {
            Some(last) if s <= last.1 => {
                if e > last.1 {
                    last.1 = e;
                }
            }
            _ => out.push((s, e)),
        }
    }
    out
}

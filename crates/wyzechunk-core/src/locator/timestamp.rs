use crate::error::Error;
use chrono::{NaiveDate, NaiveDateTime};
use std::path::Path;

/// Derive a fragment's start time from `<YYYYMMDD...>/<HH>/<MM>.<ext>`.
///
/// Only the last three path segments are inspected, so anything above the
/// date folder is ignored. The date folder may carry a suffix after its first
/// eight characters.
pub fn timestamp_from_path(path: &Path) -> Result<NaiveDateTime, Error> {
    let minute_seg = path
        .file_stem()
        .and_then(|s| s.to_str())
        .ok_or_else(|| Error::malformed(path, "file name is not valid UTF-8"))?;
    let mut ancestors = path.ancestors().skip(1);
    let hour_seg = segment_name(path, ancestors.next(), "hour folder")?;
    let date_seg = segment_name(path, ancestors.next(), "date folder")?;

    if date_seg.len() < 8 || !date_seg.as_bytes()[..8].is_ascii() {
        return Err(Error::malformed(
            path,
            format!("date folder {:?} does not start with YYYYMMDD", date_seg),
        ));
    }
    if hour_seg.len() != 2 || minute_seg.len() != 2 {
        return Err(Error::malformed(path, "hour and minute must be two digits"));
    }
    let date_digits = &date_seg[..8];
    let year = parse_digits(path, &date_digits[0..4], "year")?;
    let month = parse_digits(path, &date_digits[4..6], "month")?;
    let day = parse_digits(path, &date_digits[6..8], "day")?;
    let hour = parse_digits(path, hour_seg, "hour")?;
    let minute = parse_digits(path, minute_seg, "minute")?;

    NaiveDate::from_ymd_opt(year as i32, month, day)
        .ok_or_else(|| Error::malformed(path, format!("{} is not a calendar date", date_digits)))?
        .and_hms_opt(hour, minute, 0)
        .ok_or_else(|| {
            Error::malformed(path, format!("{:02}:{:02} is not a time of day", hour, minute))
        })
}

fn segment_name<'a>(
    path: &Path,
    segment: Option<&'a Path>,
    what: &str,
) -> Result<&'a str, Error> {
    segment
        .and_then(|p| p.file_name())
        .ok_or_else(|| Error::malformed(path, format!("missing {}", what)))?
        .to_str()
        .ok_or_else(|| Error::malformed(path, format!("{} is not valid UTF-8", what)))
}

fn parse_digits(path: &Path, field: &str, what: &str) -> Result<u32, Error> {
    if field.is_empty() || !field.bytes().all(|b| b.is_ascii_digit()) {
        return Err(Error::malformed(
            path,
            format!("{} {:?} is not numeric", what, field),
        ));
    }
    field
        .parse()
        .map_err(|_| Error::malformed(path, format!("{} {:?} is out of range", what, field)))
}

use chrono::NaiveDateTime;
use regex::Regex;
use std::path::Path;
use std::sync::LazyLock;

use super::parse_canonical;

/// Compact timestamp embedded in a filename: year, month, day, hour,
/// minute, second with optional `_`/`-`/`.` separators. The day-to-hour
/// separator is required and may also be a literal `T`.
static COMPACT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?P<year>\d{4})[_\-.]?(?P<month>\d{2})[_\-.]?(?P<day>\d{2})[_\-T](?P<hour>\d{2})[_\-.]?(?P<minute>\d{2})[_\-.]?(?P<second>\d{2})",
    )
    .unwrap()
});

/// `YYYY-MM-DD - ` convention used by manually curated folder names.
static FOLDER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?P<year>\d{4})-(?P<month>\d{2})-(?P<day>\d{2}) - ").unwrap());

/// Extract a date from the filename portion of `path`.
///
/// Digits alone do not make a date: the captured fields go through the
/// strict canonical parse, so month 13 or day 00 yields None.
pub fn date_from_filename(path: &Path) -> Option<NaiveDateTime> {
    let filename = path.file_name().and_then(|n| n.to_str())?;
    let caps = COMPACT_RE.captures(filename)?;
    let candidate = format!(
        "{}:{}:{} {}:{}:{}",
        &caps["year"], &caps["month"], &caps["day"], &caps["hour"], &caps["minute"], &caps["second"],
    );
    parse_canonical(&candidate)
}

/// Extract a date from a `YYYY-MM-DD - ` fragment anywhere in the full
/// path, with the time fixed at midnight.
pub fn date_from_folder(path: &Path) -> Option<NaiveDateTime> {
    let path_str = path.to_string_lossy();
    let caps = FOLDER_RE.captures(&path_str)?;
    let candidate = format!("{}:{}:{} 00:00:00", &caps["year"], &caps["month"], &caps["day"]);
    parse_canonical(&candidate)
}

/// Path-based fallback: the filename convention first, then (when enabled)
/// the folder convention.
pub fn date_from_path(path: &Path, match_folder_date: bool) -> Option<NaiveDateTime> {
    date_from_filename(path).or_else(|| {
        if match_folder_date {
            date_from_folder(path)
        } else {
            None
        }
    })
}

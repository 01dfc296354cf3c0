pub mod exif;
pub mod guess;
pub mod probe;

use std::path::Path;

use chrono::NaiveDateTime;

/// Canonical interchange format shared by every extraction strategy.
pub const CANONICAL_FORMAT: &str = "%Y:%m:%d %H:%M:%S";

/// Strict parse of the canonical form. Fails closed on impossible
/// calendar fields.
pub fn parse_canonical(candidate: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(candidate, CANONICAL_FORMAT).ok()
}

/// Best-effort parse for embedded values that are close to, but not, the
/// canonical form. Normalizes the common separator variants, then accepts
/// a bare date at midnight.
pub fn parse_loose(value: &str) -> Option<NaiveDateTime> {
    let cleaned = value
        .trim()
        .replace('-', ":")
        .replace('/', ":")
        .replace('\\', ":")
        .replace('.', ":")
        .replace('T', " ");

    if let Ok(dt) = NaiveDateTime::parse_from_str(&cleaned, CANONICAL_FORMAT) {
        return Some(dt);
    }

    let date_part = cleaned.split(' ').next()?;
    let date = chrono::NaiveDate::parse_from_str(date_part, "%Y:%m:%d").ok()?;
    date.and_hms_opt(0, 0, 0)
}

/// Convert a naive local datetime to epoch seconds. Ambiguous local times
/// (DST fold) resolve to the earlier instant; nonexistent local times
/// (DST gap) yield None.
pub fn to_local_epoch(dt: NaiveDateTime) -> Option<i64> {
    dt.and_local_timezone(chrono::Local)
        .earliest()
        .map(|local| local.timestamp())
}

/// Resolve an image's creation time: embedded metadata first, then the
/// filename pattern, then (when enabled) the folder pattern.
///
/// A malformed embedded value is treated the same as a missing one.
pub fn resolve_image_date(path: &Path, match_folder_date: bool) -> Option<NaiveDateTime> {
    if let Some(raw) = exif::embedded_image_date(path) {
        if let Some(dt) = parse_canonical(raw.trim()).or_else(|| parse_loose(&raw)) {
            return Some(dt);
        }
    }
    guess::date_from_path(path, match_folder_date)
}

/// Outcome of a video resolution. A probe failure is never fatal but is
/// worth surfacing: it usually means ffprobe is missing or the file is
/// corrupt.
pub struct VideoDate {
    pub date: Option<NaiveDateTime>,
    pub probe_warning: Option<String>,
}

/// Resolve a video's creation time: container metadata via the external
/// probe, then the same path-based fallbacks as images.
pub fn resolve_video_date(path: &Path, match_folder_date: bool) -> VideoDate {
    let mut probe_warning = None;
    let embedded = match probe::creation_time(path) {
        Ok(Some(value)) => probe::parse_creation_time(&value),
        Ok(None) => None,
        Err(err) => {
            probe_warning = Some(format!("{}: {}", path.display(), err));
            None
        }
    };
    VideoDate {
        date: embedded.or_else(|| guess::date_from_path(path, match_folder_date)),
        probe_warning,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn dt(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, mo, d)
            .unwrap()
            .and_hms_opt(h, mi, s)
            .unwrap()
    }

    #[test]
    fn test_canonical_roundtrip() {
        assert_eq!(parse_canonical("2020:01:15 14:30:00"), Some(dt(2020, 1, 15, 14, 30, 0)));
    }

    #[test]
    fn test_canonical_fails_closed() {
        assert_eq!(parse_canonical("2020:13:01 10:00:00"), None);
        assert_eq!(parse_canonical("2020:01:00 10:00:00"), None);
        assert_eq!(parse_canonical("not a date"), None);
    }

    #[test]
    fn test_loose_accepts_dashed_form() {
        assert_eq!(parse_loose("2020-01-15 14:30:00"), Some(dt(2020, 1, 15, 14, 30, 0)));
    }

    #[test]
    fn test_loose_accepts_iso_t_form() {
        assert_eq!(parse_loose("2021-06-01T10:15:30"), Some(dt(2021, 6, 1, 10, 15, 30)));
    }

    #[test]
    fn test_loose_accepts_bare_date() {
        assert_eq!(parse_loose("2020/01/15"), Some(dt(2020, 1, 15, 0, 0, 0)));
    }

    #[test]
    fn test_loose_fails_closed() {
        assert_eq!(parse_loose("2020:13:01 10:00:00"), None);
        assert_eq!(parse_loose("around noon"), None);
    }

    #[test]
    fn test_image_falls_back_to_filename() {
        // No file on disk, so both embedded backends yield nothing.
        let path = Path::new("IMG_2020-01-15_14.30.00.jpg");
        assert_eq!(resolve_image_date(path, false), Some(dt(2020, 1, 15, 14, 30, 0)));
    }

    #[test]
    fn test_image_without_any_source_is_absent() {
        assert_eq!(resolve_image_date(Path::new("holiday.jpg"), false), None);
    }

    #[test]
    fn test_video_falls_back_on_probe_failure() {
        // A nonexistent file makes the probe fail regardless of whether
        // ffprobe is installed.
        let resolved = resolve_video_date(Path::new("VID_20160130T114915.mp4"), false);
        assert_eq!(resolved.date, Some(dt(2016, 1, 30, 11, 49, 15)));
    }
}

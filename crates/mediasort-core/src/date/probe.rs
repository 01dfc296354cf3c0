use std::path::Path;
use std::process::Command;

use chrono::NaiveDateTime;
use serde::Deserialize;

/// Failure of the external probe itself, as opposed to a probe that ran
/// fine and simply found no creation time.
#[derive(Debug)]
pub enum ProbeError {
    /// The probe binary could not be spawned (missing or not executable).
    Spawn(std::io::Error),
    /// The probe ran but exited with a failure status.
    Exit(String),
    /// The probe output was not the expected JSON document.
    Parse(serde_json::Error),
}

impl std::fmt::Display for ProbeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProbeError::Spawn(err) => write!(f, "could not run ffprobe: {}", err),
            ProbeError::Exit(stderr) => write!(f, "ffprobe failed: {}", stderr),
            ProbeError::Parse(err) => write!(f, "unreadable ffprobe output: {}", err),
        }
    }
}

impl std::error::Error for ProbeError {}

#[derive(Debug, Deserialize)]
struct ProbeOutput {
    format: Option<ProbeFormat>,
}

#[derive(Debug, Deserialize)]
struct ProbeFormat {
    tags: Option<ProbeTags>,
}

#[derive(Debug, Deserialize)]
struct ProbeTags {
    creation_time: Option<String>,
}

/// Run ffprobe on `path` and return the container's `creation_time` tag,
/// if any. Blocking, no timeout.
pub fn creation_time(path: &Path) -> Result<Option<String>, ProbeError> {
    let output = Command::new("ffprobe")
        .args(["-v", "quiet", "-print_format", "json", "-show_format"])
        .arg(path)
        .output()
        .map_err(ProbeError::Spawn)?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(ProbeError::Exit(stderr.trim().to_string()));
    }

    let parsed: ProbeOutput = serde_json::from_slice(&output.stdout).map_err(ProbeError::Parse)?;
    Ok(parsed
        .format
        .and_then(|format| format.tags)
        .and_then(|tags| tags.creation_time))
}

/// Parse a `creation_time` value. Containers write either a
/// fractional-seconds UTC form or a plain form; both are taken as naive
/// local time.
pub fn parse_creation_time(value: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.fZ")
        .or_else(|_| NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S"))
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_fractional_utc_form() {
        assert_eq!(
            parse_creation_time("2021-06-01T10:15:30.000000Z"),
            NaiveDate::from_ymd_opt(2021, 6, 1).unwrap().and_hms_opt(10, 15, 30)
        );
    }

    #[test]
    fn test_plain_form() {
        assert_eq!(
            parse_creation_time("2019-12-31 23:59:59"),
            NaiveDate::from_ymd_opt(2019, 12, 31).unwrap().and_hms_opt(23, 59, 59)
        );
    }

    #[test]
    fn test_garbage_yields_nothing() {
        assert_eq!(parse_creation_time("yesterday-ish"), None);
        assert_eq!(parse_creation_time("2021-13-01T00:00:00.000000Z"), None);
    }

    #[test]
    fn test_json_tag_extraction() {
        let parsed: ProbeOutput = serde_json::from_str(
            r#"{"format": {"tags": {"creation_time": "2021-06-01T10:15:30.000000Z"}}}"#,
        )
        .unwrap();
        let time = parsed.format.and_then(|f| f.tags).and_then(|t| t.creation_time);
        assert_eq!(time.as_deref(), Some("2021-06-01T10:15:30.000000Z"));
    }

    #[test]
    fn test_json_without_tags() {
        let parsed: ProbeOutput =
            serde_json::from_str(r#"{"format": {"duration": "12.5"}}"#).unwrap();
        assert!(parsed.format.and_then(|f| f.tags).is_none());
    }
}

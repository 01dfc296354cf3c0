use std::path::Path;
use std::time::UNIX_EPOCH;

use walkdir::WalkDir;

use crate::date;
use crate::media::{Disposition, MediaRecord};
use crate::patterns::PatternSet;
use crate::SortOptions;

/// Walks a source tree and assigns each file a disposition.
///
/// Pattern sets are injected at construction, so runs are isolated from
/// each other and there is no module-level state.
pub struct Classifier {
    ignored: PatternSet,
    filtered: PatternSet,
    match_folder_date: bool,
}

impl Classifier {
    pub fn new(options: &SortOptions) -> anyhow::Result<Self> {
        Ok(Self {
            ignored: PatternSet::compile(&options.ignored_patterns)?,
            filtered: PatternSet::compile(&options.filtered_patterns)?,
            match_folder_date: options.match_folder_date,
        })
    }

    /// Lazily classify every file under `root`, in traversal order.
    pub fn scan(&self, root: &Path) -> Scan<'_> {
        Scan {
            classifier: self,
            walker: WalkDir::new(root).into_iter(),
            warnings: Vec::new(),
        }
    }
}

/// Lazy, single-pass record stream. Ignored paths are dropped entirely;
/// every other file yields exactly one record.
pub struct Scan<'a> {
    classifier: &'a Classifier,
    walker: walkdir::IntoIter,
    warnings: Vec<String>,
}

impl Scan<'_> {
    /// Drain the warnings accumulated so far (probe failures and the like).
    pub fn take_warnings(&mut self) -> Vec<String> {
        std::mem::take(&mut self.warnings)
    }

    fn classify(&mut self, path: &Path, mtime: i64) -> MediaRecord {
        // Sniff by content bytes, never by extension. An unreadable file
        // is indistinguishable from an unrecognized one here.
        let kind = infer::get_from_path(path).ok().flatten();
        let Some(kind) = kind else {
            return MediaRecord {
                disposition: Disposition::Unknown,
                path: path.to_path_buf(),
                mime: None,
                creation_ts: None,
                mtime,
            };
        };

        let mime = kind.mime_type();
        let match_folder_date = self.classifier.match_folder_date;

        if mime.starts_with("image/") {
            let creation_ts =
                date::resolve_image_date(path, match_folder_date).and_then(date::to_local_epoch);
            MediaRecord {
                disposition: Disposition::Image,
                path: path.to_path_buf(),
                mime: Some(mime.to_string()),
                creation_ts,
                mtime,
            }
        } else if mime.starts_with("video/") {
            let resolved = date::resolve_video_date(path, match_folder_date);
            if let Some(warning) = resolved.probe_warning {
                self.warnings.push(warning);
            }
            MediaRecord {
                disposition: Disposition::Video,
                path: path.to_path_buf(),
                mime: Some(mime.to_string()),
                creation_ts: resolved.date.and_then(date::to_local_epoch),
                mtime,
            }
        } else {
            MediaRecord {
                disposition: Disposition::Other,
                path: path.to_path_buf(),
                mime: Some(mime.to_string()),
                creation_ts: None,
                mtime,
            }
        }
    }
}

impl Iterator for Scan<'_> {
    type Item = MediaRecord;

    fn next(&mut self) -> Option<MediaRecord> {
        loop {
            let entry = match self.walker.next()? {
                Ok(entry) => entry,
                // Entries that vanish between listing and stat are not
                // worth aborting the walk over.
                Err(_) => continue,
            };
            if entry.file_type().is_dir() {
                continue;
            }
            let Some(mtime) = entry
                .metadata()
                .ok()
                .and_then(|meta| meta.modified().ok())
                .and_then(|modified| modified.duration_since(UNIX_EPOCH).ok())
                .map(|age| age.as_secs() as i64)
            else {
                continue;
            };

            let path = entry.path();
            let path_str = path.to_string_lossy();
            // Ignore wins over filter when a path matches both.
            if self.classifier.ignored.is_match(&path_str) {
                continue;
            }
            if self.classifier.filtered.is_match(&path_str) {
                return Some(MediaRecord {
                    disposition: Disposition::Filtered,
                    path: path.to_path_buf(),
                    mime: None,
                    creation_ts: None,
                    mtime,
                });
            }

            return Some(self.classify(path, mtime));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SortOptions;
    use std::collections::HashSet;
    use std::fs;

    const JPEG_MAGIC: &[u8] = &[0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, 0x4A, 0x46, 0x49, 0x46, 0x00];
    const PNG_MAGIC: &[u8] = &[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00];

    fn classifier_for(source: &Path, dest: &Path) -> Classifier {
        Classifier::new(&SortOptions::new(source, dest)).unwrap()
    }

    #[test]
    fn test_mixed_tree() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("IMG_2020-01-15_14.30.00.jpg"), JPEG_MAGIC).unwrap();
        fs::write(dir.path().join("scan.png"), PNG_MAGIC).unwrap();
        fs::write(dir.path().join("archive.txt"), "plain text").unwrap();
        fs::write(dir.path().join("mystery.bin"), [0x00, 0x01, 0x02, 0x03]).unwrap();
        fs::create_dir(dir.path().join("@eaDir")).unwrap();
        fs::write(dir.path().join("@eaDir").join("SYNOPHOTO_THUMB_M.jpg"), JPEG_MAGIC).unwrap();

        let classifier = classifier_for(dir.path(), Path::new("/unused"));
        let records: Vec<MediaRecord> = classifier.scan(dir.path()).collect();

        // The @eaDir artifact is dropped entirely, not even Filtered.
        assert_eq!(records.len(), 4);
        assert!(records.iter().all(|r| !r.path.to_string_lossy().contains("@eaDir")));

        let by_name = |name: &str| {
            records
                .iter()
                .find(|r| r.path.file_name().unwrap() == name)
                .unwrap()
        };

        let image = by_name("IMG_2020-01-15_14.30.00.jpg");
        assert_eq!(image.disposition, Disposition::Image);
        assert_eq!(image.mime.as_deref(), Some("image/jpeg"));
        let expected = chrono::NaiveDate::from_ymd_opt(2020, 1, 15)
            .unwrap()
            .and_hms_opt(14, 30, 0)
            .unwrap();
        assert_eq!(image.creation_ts, date::to_local_epoch(expected));

        let png = by_name("scan.png");
        assert_eq!(png.disposition, Disposition::Image);
        assert_eq!(png.mime.as_deref(), Some("image/png"));
        assert_eq!(png.creation_ts, None);

        let filtered = by_name("archive.txt");
        assert_eq!(filtered.disposition, Disposition::Filtered);
        assert_eq!(filtered.mime, None);
        assert_eq!(filtered.creation_ts, None);

        let unknown = by_name("mystery.bin");
        assert_eq!(unknown.disposition, Disposition::Unknown);
        assert_eq!(unknown.mime, None);
    }

    #[test]
    fn test_ignore_wins_over_filter() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("@eaDir")).unwrap();
        // Matches both the @eaDir ignore rule and the .txt filter rule.
        fs::write(dir.path().join("@eaDir").join("index.txt"), "x").unwrap();

        let classifier = classifier_for(dir.path(), Path::new("/unused"));
        assert_eq!(classifier.scan(dir.path()).count(), 0);
    }

    #[test]
    fn test_scan_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.jpg"), JPEG_MAGIC).unwrap();
        fs::write(dir.path().join("b.txt"), "text").unwrap();
        fs::create_dir(dir.path().join("nested")).unwrap();
        fs::write(dir.path().join("nested").join("c.png"), PNG_MAGIC).unwrap();

        let classifier = classifier_for(dir.path(), Path::new("/unused"));
        let first: HashSet<MediaRecord> = classifier.scan(dir.path()).collect();
        let second: HashSet<MediaRecord> = classifier.scan(dir.path()).collect();
        assert_eq!(first, second);
        assert_eq!(first.len(), 3);
    }

    #[test]
    fn test_missing_root_yields_nothing() {
        let classifier = classifier_for(Path::new("/unused"), Path::new("/unused"));
        assert_eq!(classifier.scan(Path::new("/no/such/root")).count(), 0);
    }
}

use std::collections::{HashMap, HashSet};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::{Local, LocalResult, TimeZone};

use crate::media::{Disposition, MediaRecord};

/// Maps classification records to destination paths and performs the
/// moves. Collisions are resolved with a deterministic `name(N).ext`
/// suffix; nothing is ever overwritten.
pub struct Planner {
    dest_root: PathBuf,
    dry_run: bool,
    created_dirs: HashSet<PathBuf>,
    name_counters: HashMap<PathBuf, u32>,
    used_paths: HashSet<PathBuf>,
}

impl Planner {
    pub fn new(dest_root: &Path, dry_run: bool) -> anyhow::Result<Self> {
        if !dry_run {
            fs::create_dir_all(dest_root).with_context(|| {
                format!("cannot create destination root {}", dest_root.display())
            })?;
        }
        Ok(Self {
            dest_root: dest_root.to_path_buf(),
            dry_run,
            created_dirs: HashSet::new(),
            name_counters: HashMap::new(),
            used_paths: HashSet::new(),
        })
    }

    /// Destination directory for a record, before collision handling.
    ///
    /// Dated media land in `media_dated/YYYY-MM-DD`, undated media in
    /// `media_mtime/YYYY-MM-DD` derived from the filesystem mtime, and
    /// everything else under its disposition directory.
    pub fn destination_dir(&self, record: &MediaRecord) -> PathBuf {
        match record.disposition {
            Disposition::Image | Disposition::Video => match record.creation_ts {
                Some(ts) => self.dest_root.join("media_dated").join(date_dir_name(ts)),
                None => self
                    .dest_root
                    .join("media_mtime")
                    .join(date_dir_name(record.mtime)),
            },
            other => self.dest_root.join(other.dir_name()),
        }
    }

    /// Move the record's file into place, returning the path it ended up
    /// at. Directories are created once per unique path; the original
    /// filename is preserved.
    pub fn place(&mut self, record: &MediaRecord) -> anyhow::Result<PathBuf> {
        let sub_dir = self.destination_dir(record);
        if !self.created_dirs.contains(&sub_dir) {
            if !self.dry_run {
                fs::create_dir_all(&sub_dir)
                    .with_context(|| format!("cannot create {}", sub_dir.display()))?;
            }
            self.created_dirs.insert(sub_dir.clone());
        }

        let filename = record
            .path
            .file_name()
            .with_context(|| format!("source has no filename: {}", record.path.display()))?;
        let base_dest = sub_dir.join(filename);

        let mut dest = base_dest.clone();
        if self.used_paths.contains(&dest) || dest.exists() {
            let stem = Path::new(filename)
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or("file");
            let ext = Path::new(filename)
                .extension()
                .and_then(|s| s.to_str())
                .unwrap_or("");
            let counter = self.name_counters.entry(base_dest).or_insert(0);
            loop {
                *counter += 1;
                let new_name = if ext.is_empty() {
                    format!("{}({})", stem, counter)
                } else {
                    format!("{}({}).{}", stem, counter, ext)
                };
                dest = sub_dir.join(&new_name);
                if !self.used_paths.contains(&dest) && !dest.exists() {
                    break;
                }
            }
        }
        self.used_paths.insert(dest.clone());

        if !self.dry_run {
            move_file(&record.path, &dest).with_context(|| {
                format!("cannot move {} to {}", record.path.display(), dest.display())
            })?;
        }
        Ok(dest)
    }
}

/// `YYYY-MM-DD` bucket name for an epoch second, in local time.
fn date_dir_name(ts: i64) -> String {
    match Local.timestamp_opt(ts, 0) {
        LocalResult::Single(dt) | LocalResult::Ambiguous(dt, _) => {
            dt.format("%Y-%m-%d").to_string()
        }
        LocalResult::None => "date-unknown".to_string(),
    }
}

/// Rename, falling back to copy-and-remove when the destination is on a
/// different filesystem. The copy preserves the source mtime.
fn move_file(src: &Path, dest: &Path) -> io::Result<()> {
    if fs::rename(src, dest).is_ok() {
        return Ok(());
    }
    let metadata = fs::metadata(src)?;
    fs::copy(src, dest)?;
    let mtime = filetime::FileTime::from_last_modification_time(&metadata);
    filetime::set_file_mtime(dest, mtime).ok();
    fs::remove_file(src)
}

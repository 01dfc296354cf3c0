use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use exif::{In, Reader, Tag};

/// A single embedded-metadata backend.
///
/// Backends read a raw date string from the file and return None for
/// anything they cannot open or parse; they never error.
pub trait MetadataReader {
    fn try_read(&self, path: &Path) -> Option<String>;
}

/// Capture time is preferred over the generic modification field.
const DATE_TAGS: [Tag; 2] = [Tag::DateTimeOriginal, Tag::DateTime];

/// Primary backend: kamadak-exif.
pub struct ExifReader;

impl MetadataReader for ExifReader {
    fn try_read(&self, path: &Path) -> Option<String> {
        let file = File::open(path).ok()?;
        let mut reader = BufReader::new(file);
        let exif = Reader::new().read_from_container(&mut reader).ok()?;
        for tag in DATE_TAGS {
            if let Some(field) = exif.get_field(tag, In::PRIMARY) {
                return Some(field.display_value().to_string());
            }
        }
        None
    }
}

/// Secondary backend: rexif, for encoders whose output the primary reader
/// cannot parse. Uses the quiet buffer parser so malformed files do not
/// spam stderr.
pub struct RexifReader;

impl MetadataReader for RexifReader {
    fn try_read(&self, path: &Path) -> Option<String> {
        let mut contents = Vec::new();
        File::open(path).ok()?.read_to_end(&mut contents).ok()?;
        let (parsed, _) = rexif::parse_buffer_quiet(&contents);
        parsed.ok()?.entries.iter().find_map(|entry| {
            if entry.tag == rexif::ExifTag::DateTimeOriginal {
                Some(entry.value.to_string())
            } else {
                None
            }
        })
    }
}

/// Read an embedded image date string, primary backend first, secondary
/// only when the primary yields nothing.
pub fn embedded_image_date(path: &Path) -> Option<String> {
    let readers: [&dyn MetadataReader; 2] = [&ExifReader, &RexifReader];
    readers.iter().find_map(|reader| reader.try_read(path))
}

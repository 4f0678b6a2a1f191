//! Sidecar metadata record stored next to each tracked file.
//!
//! `<file>.meta` holds two lines: the validator (an HTTP `Last-Modified`
//! value or a decimal Unix timestamp) and the lowercase hex SHA-256 of the
//! last known good content. Either line may be empty.

use chrono::NaiveDateTime;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use crate::storage::{self, Storage};

/// Suffix appended to the tracked file's path.
pub const META_SUFFIX: &str = ".meta";

/// Sidecars are a couple of short lines; anything past this is not ours.
const MAX_META_BYTES: u64 = 4 * 1024;

/// Integers at or below this are not taken as epoch seconds.
const MIN_EPOCH_VALIDATOR: i64 = 100_000;

const HTTP_DATE_PREFIX: &str = "%a, %d %b %Y %H:%M:%S";

/// Same without the weekday, which some servers get wrong.
const HTTP_DATE_NO_WEEKDAY: &str = "%d %b %Y %H:%M:%S";

/// Path of the sidecar for `local_path`.
pub fn meta_path(local_path: &Path) -> PathBuf {
    storage::with_suffix(local_path, META_SUFFIX)
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SidecarRecord {
    /// `Last-Modified` value or decimal epoch seconds.
    pub validator: String,
    /// Hex SHA-256 of the content, or empty if never hashed.
    pub hash: String,
}

impl SidecarRecord {
    pub fn new(validator: impl Into<String>, hash: impl Into<String>) -> Self {
        Self {
            validator: validator.into(),
            hash: hash.into(),
        }
    }

    /// Parse sidecar text. Missing lines come back empty.
    pub fn parse(text: &str) -> Self {
        let mut lines = text.split('\n').map(|l| l.strip_suffix('\r').unwrap_or(l));
        let validator = lines.next().unwrap_or_default().to_string();
        let hash = lines.next().unwrap_or_default().trim().to_string();
        Self { validator, hash }
    }

    /// On-disk form: each field followed by a newline.
    pub fn render(&self) -> String {
        format!("{}\n{}\n", self.validator, self.hash)
    }

    /// Time the validator stands for, if it parses to one.
    pub fn recorded_time(&self) -> Option<i64> {
        match parse_validator_time(&self.validator) {
            0 => None,
            t => Some(t),
        }
    }
}

/// Read the sidecar for `local_path`. Never fails: a missing or unreadable
/// record reads as empty.
pub fn read<S: Storage + ?Sized>(storage: &S, local_path: &Path) -> SidecarRecord {
    let path = meta_path(local_path);
    let mut text = String::new();
    let result = storage
        .open_read(&path)
        .and_then(|r| r.take(MAX_META_BYTES).read_to_string(&mut text));
    match result {
        Ok(_) => SidecarRecord::parse(&text),
        Err(e) => {
            if e.kind() != io::ErrorKind::NotFound {
                tracing::warn!(path = %path.display(), "unreadable sidecar, ignoring: {}", e);
            }
            SidecarRecord::default()
        }
    }
}

/// Replace the sidecar for `local_path`. Goes through a temp file and a
/// rename so a reader never sees only the first line.
pub fn write<S: Storage + ?Sized>(
    storage: &S,
    local_path: &Path,
    record: &SidecarRecord,
) -> io::Result<()> {
    let path = meta_path(local_path);
    storage::ensure_parent_dir(storage, &path)?;
    storage::replace_contents(storage, &path, record.render().as_bytes())?;
    tracing::debug!(
        path = %path.display(),
        validator = %record.validator,
        hash = %record.hash,
        "sidecar written"
    );
    Ok(())
}

/// Epoch seconds for a validator, or 0 when it is neither a plausible
/// timestamp nor an HTTP date. HTTP dates are read as UTC.
pub fn parse_validator_time(validator: &str) -> i64 {
    let s = validator.trim();
    if s.is_empty() {
        return 0;
    }
    if s.bytes().all(|b| b.is_ascii_digit()) {
        return match s.parse::<i64>() {
            Ok(n) if n > MIN_EPOCH_VALIDATOR => n,
            _ => 0,
        };
    }
    let parsed = NaiveDateTime::parse_and_remainder(s, HTTP_DATE_PREFIX).or_else(|e| {
        // The weekday is redundant; ignore it if it does not match the date.
        match s.split_once(", ") {
            Some((_, rest)) => NaiveDateTime::parse_and_remainder(rest, HTTP_DATE_NO_WEEKDAY),
            None => Err(e),
        }
    });
    match parsed {
        Ok((dt, _zone)) => dt.and_utc().timestamp(),
        Err(_) => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemStorage;

    const HASH: &str = "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad";

    #[test]
    fn meta_path_appends_suffix() {
        assert_eq!(
            meta_path(Path::new("/www/timezones.json.gz")),
            PathBuf::from("/www/timezones.json.gz.meta")
        );
    }

    #[test]
    fn write_then_read() {
        let store = MemStorage::new();
        let local = Path::new("/www/file.bin");
        let rec = SidecarRecord::new("Mon, 01 Jan 2024 00:00:00 GMT", HASH);
        write(&store, local, &rec).unwrap();
        assert_eq!(read(&store, local), rec);
        assert_eq!(
            store.read("/www/file.bin.meta").unwrap(),
            format!("Mon, 01 Jan 2024 00:00:00 GMT\n{}\n", HASH).into_bytes()
        );
        assert!(!store.exists(Path::new("/www/file.bin.meta.tmp")));
    }

    #[test]
    fn write_creates_missing_parent_dirs_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let local = dir.path().join("sub").join("x.json");
        let rec = SidecarRecord::new("1700000000", HASH);
        write(&crate::storage::DiskStorage, &local, &rec).unwrap();
        assert_eq!(read(&crate::storage::DiskStorage, &local), rec);
        assert!(!dir.path().join("sub").join("x.json.meta.tmp").exists());
    }

    #[test]
    fn missing_record_reads_empty() {
        let store = MemStorage::new();
        assert_eq!(read(&store, Path::new("/nope")), SidecarRecord::default());
    }

    #[test]
    fn missing_second_line_reads_empty() {
        let store = MemStorage::new();
        store.insert("/f.meta", b"1700000000");
        let rec = read(&store, Path::new("/f"));
        assert_eq!(rec.validator, "1700000000");
        assert_eq!(rec.hash, "");
    }

    #[test]
    fn crlf_lines_are_tolerated() {
        let rec = SidecarRecord::parse("Mon, 01 Jan 2024 00:00:00 GMT\r\nabc\r\n");
        assert_eq!(rec.validator, "Mon, 01 Jan 2024 00:00:00 GMT");
        assert_eq!(rec.hash, "abc");
    }

    #[test]
    fn empty_fields_round_trip() {
        let rec = SidecarRecord::new("", "");
        assert_eq!(rec.render(), "\n\n");
        assert_eq!(SidecarRecord::parse(&rec.render()), rec);
    }

    #[test]
    fn validator_time_epoch() {
        assert_eq!(parse_validator_time("1700000000"), 1_700_000_000);
        assert_eq!(parse_validator_time(" 1700000000 "), 1_700_000_000);
        assert_eq!(parse_validator_time("100000"), 0);
        assert_eq!(parse_validator_time("42"), 0);
    }

    #[test]
    fn validator_time_http_date() {
        assert_eq!(
            parse_validator_time("Mon, 01 Jan 2024 00:00:00 GMT"),
            1_704_067_200
        );
        assert_eq!(
            parse_validator_time("Wed, 21 Oct 2015 07:28:00 GMT"),
            1_445_412_480
        );
    }

    #[test]
    fn validator_time_ignores_wrong_weekday() {
        // 2024-01-01 was a Monday.
        assert_eq!(
            parse_validator_time("Sun, 01 Jan 2024 00:00:00 GMT"),
            1_704_067_200
        );
        assert_eq!(
            SidecarRecord::new("Fri, 21 Oct 2015 07:28:00 GMT", "").recorded_time(),
            Some(1_445_412_480)
        );
    }

    #[test]
    fn validator_time_garbage_is_zero() {
        assert_eq!(parse_validator_time(""), 0);
        assert_eq!(parse_validator_time("yesterday"), 0);
        assert_eq!(parse_validator_time("2024-01-01T00:00:00Z"), 0);
        assert_eq!(SidecarRecord::new("junk", "").recorded_time(), None);
    }
}

//! CSV-backed record store.
//!
//! Every write rewrites the whole file through a temporary sibling that is
//! renamed into place. There is no locking: two processes appending at the
//! same time will lose one of the appends (last writer wins).

use std::collections::HashMap;
use std::fs::File;
use std::path::{Path, PathBuf};

use anyhow::Context as _;
use serde::Serialize;

use crate::formats::{BookRecord, Field, normalize_genre};

pub const CANONICAL_HEADER: [&str; 7] = [
    "title",
    "author",
    "genre",
    "pages",
    "stars",
    "published_date",
    "date_read",
];

const UNKNOWN_MARKERS: &[&str] = &["nan", "unknown"];

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("record store unavailable: {}: {reason}", .path.display())]
    Unavailable { path: PathBuf, reason: String },

    #[error("write record store: {}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaVersion {
    /// Capitalized headers such as `Title` and `Date Read`.
    V1,
    /// [`CANONICAL_HEADER`], exactly and in order.
    V2,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MigrationOutcome {
    AlreadyCurrent,
    Migrated { records: usize },
}

#[derive(Debug, Clone)]
pub struct RecordStore {
    path: PathBuf,
    /// Where temporary files are staged; defaults to the store's directory.
    scratch_dir: Option<PathBuf>,
}

impl RecordStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            scratch_dir: None,
        }
    }

    #[cfg(test)]
    fn with_scratch_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.scratch_dir = Some(dir.into());
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the full collection, migrating a legacy file in place first.
    ///
    /// A failed migration rewrite is logged and the parsed records are still
    /// returned; the rewrite is retried on the next load.
    pub fn load(&self) -> Result<Vec<BookRecord>, StoreError> {
        let (version, records) = self.read()?;
        if version == SchemaVersion::V1
            && let Err(err) = self.rewrite_migrated(&records)
        {
            let err = anyhow::Error::from(err);
            tracing::warn!(?err, "keeping legacy record store; migration rewrite failed");
        }
        Ok(records)
    }

    pub fn migrate(&self) -> Result<MigrationOutcome, StoreError> {
        let (records, outcome) = self.load_migrated()?;
        tracing::debug!(path = %self.path.display(), records = records.len(), ?outcome, "checked schema");
        Ok(outcome)
    }

    /// Appends `record` and rewrites the backing file with the full collection.
    pub fn append_and_persist(
        &self,
        mut collection: Vec<BookRecord>,
        record: BookRecord,
    ) -> Result<Vec<BookRecord>, StoreError> {
        collection.push(record);
        self.write(&collection)?;
        tracing::info!(path = %self.path.display(), records = collection.len(), "persisted record store");
        Ok(collection)
    }

    /// Creates an empty store holding only the header row.
    pub fn initialize(&self) -> anyhow::Result<()> {
        if self.path.exists() {
            anyhow::bail!("record store already exists: {}", self.path.display());
        }
        self.write(&[])?;
        Ok(())
    }

    fn load_migrated(&self) -> Result<(Vec<BookRecord>, MigrationOutcome), StoreError> {
        let (version, records) = self.read()?;
        if version == SchemaVersion::V2 {
            return Ok((records, MigrationOutcome::AlreadyCurrent));
        }

        self.rewrite_migrated(&records)?;
        let outcome = MigrationOutcome::Migrated {
            records: records.len(),
        };
        Ok((records, outcome))
    }

    fn rewrite_migrated(&self, records: &[BookRecord]) -> Result<(), StoreError> {
        tracing::info!(
            path = %self.path.display(),
            records = records.len(),
            "migrating record store to canonical schema"
        );
        self.write(records)
    }

    fn read(&self) -> Result<(SchemaVersion, Vec<BookRecord>), StoreError> {
        let file = File::open(&self.path).map_err(|err| self.unavailable(format!("open: {err}")))?;
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::Headers)
            .from_reader(file);

        let headers = reader
            .headers()
            .map_err(|err| self.unavailable(format!("read header: {err}")))?
            .clone();
        let columns = Columns::from_headers(&headers).map_err(|reason| self.unavailable(reason))?;

        let mut records = Vec::new();
        for (idx, row) in reader.records().enumerate() {
            // Header is line 1.
            let line = idx + 2;
            let row = row.map_err(|err| self.unavailable(format!("line {line}: {err}")))?;
            let record = columns
                .record(&row)
                .map_err(|err| self.unavailable(format!("line {line}: {err:#}")))?;
            records.push(record);
        }

        Ok((columns.version, records))
    }

    fn write(&self, records: &[BookRecord]) -> Result<(), StoreError> {
        let dir = match (&self.scratch_dir, self.path.parent()) {
            (Some(scratch), _) => scratch.as_path(),
            (None, Some(parent)) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let tmp = tempfile::NamedTempFile::new_in(dir).map_err(|err| self.write_error(err))?;

        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(tmp.as_file());
        writer
            .write_record(CANONICAL_HEADER)
            .map_err(|err| self.write_error(err))?;
        for record in records {
            writer
                .serialize(StoredRow::from(record))
                .map_err(|err| self.write_error(err))?;
        }
        writer.flush().map_err(|err| self.write_error(err))?;
        drop(writer);

        // The temporary file starts out owner-only; keep the existing file's mode.
        if let Ok(meta) = std::fs::metadata(&self.path) {
            tmp.as_file()
                .set_permissions(meta.permissions())
                .map_err(|err| self.write_error(err))?;
        }
        tmp.as_file()
            .sync_all()
            .map_err(|err| self.write_error(err))?;
        tmp.persist(&self.path)
            .map_err(|err| self.write_error(err.error))?;
        Ok(())
    }

    fn unavailable(&self, reason: String) -> StoreError {
        StoreError::Unavailable {
            path: self.path.clone(),
            reason,
        }
    }

    fn write_error(&self, err: impl Into<csv::Error>) -> StoreError {
        StoreError::Write {
            path: self.path.clone(),
            source: err.into(),
        }
    }
}

#[derive(Debug, Serialize)]
struct StoredRow<'a> {
    title: &'a str,
    author: &'a str,
    genre: &'a str,
    pages: Option<u32>,
    stars: u32,
    published_date: Option<i32>,
    date_read: i32,
}

impl<'a> From<&'a BookRecord> for StoredRow<'a> {
    fn from(record: &'a BookRecord) -> Self {
        Self {
            title: &record.title,
            author: &record.author,
            genre: &record.genre,
            pages: record.pages.known().copied(),
            stars: record.stars,
            published_date: record.published_date.known().copied(),
            date_read: record.date_read,
        }
    }
}

/// Column positions resolved from a header row of either schema version.
#[derive(Debug)]
struct Columns {
    version: SchemaVersion,
    title: usize,
    author: usize,
    genre: Option<usize>,
    pages: Option<usize>,
    stars: Option<usize>,
    published_date: Option<usize>,
    date_read: usize,
}

impl Columns {
    fn from_headers(headers: &csv::StringRecord) -> Result<Self, String> {
        let version = if headers.iter().eq(CANONICAL_HEADER) {
            SchemaVersion::V2
        } else {
            SchemaVersion::V1
        };

        let mut by_name = HashMap::new();
        for (idx, header) in headers.iter().enumerate() {
            by_name.entry(normalize_header(header)).or_insert(idx);
        }
        let required = |name: &str| {
            by_name
                .get(name)
                .copied()
                .ok_or_else(|| format!("missing required column `{name}`"))
        };

        Ok(Self {
            version,
            title: required("title")?,
            author: required("author")?,
            genre: by_name.get("genre").copied(),
            pages: by_name.get("pages").copied(),
            stars: by_name.get("stars").copied(),
            published_date: by_name.get("published_date").copied(),
            date_read: required("date_read")?,
        })
    }

    fn record(&self, row: &csv::StringRecord) -> anyhow::Result<BookRecord> {
        let cell = |idx: usize| row.get(idx).unwrap_or("");
        let optional = |idx: Option<usize>| idx.map(cell).unwrap_or("");

        let date_read = parse_optional_int::<i32>(cell(self.date_read))
            .context("date_read")?
            .ok_or_else(|| anyhow::anyhow!("date_read is empty"))?;

        Ok(BookRecord {
            title: cell(self.title).trim().to_owned(),
            author: cell(self.author).trim().to_owned(),
            genre: normalize_genre(optional(self.genre)),
            pages: Field::from(parse_optional_int::<u32>(optional(self.pages)).context("pages")?),
            stars: parse_optional_int::<u32>(optional(self.stars))
                .context("stars")?
                .unwrap_or(0),
            published_date: Field::from(
                parse_optional_int::<i32>(optional(self.published_date))
                    .context("published_date")?,
            ),
            date_read,
        })
    }
}

fn normalize_header(header: &str) -> String {
    header
        .trim()
        .chars()
        .map(|c| match c {
            ' ' | '-' => '_',
            c => c.to_ascii_lowercase(),
        })
        .collect()
}

/// Parses an integer cell. Empty cells and unknown markers yield `None`;
/// integer-valued floats such as `350.0` are accepted.
fn parse_optional_int<T: TryFrom<i64>>(raw: &str) -> anyhow::Result<Option<T>> {
    let raw = raw.trim();
    if raw.is_empty() || UNKNOWN_MARKERS.iter().any(|m| m.eq_ignore_ascii_case(raw)) {
        return Ok(None);
    }

    let value = match raw.parse::<i64>() {
        Ok(value) => value,
        Err(_) => {
            let float: f64 = raw
                .parse()
                .map_err(|_| anyhow::anyhow!("not an integer: {raw:?}"))?;
            if !float.is_finite() || float.fract() != 0.0 {
                anyhow::bail!("not an integer: {raw:?}");
            }
            float as i64
        }
    };

    T::try_from(value)
        .map(Some)
        .map_err(|_| anyhow::anyhow!("out of range: {raw:?}"))
}

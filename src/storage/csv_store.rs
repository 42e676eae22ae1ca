//! CSV storage implementation
//!
//! This module provides a CSV-backed implementation of the ResultStore trait.
//! Files are UTF-8 with a byte order mark, one header row, one row per record.

use crate::storage::traits::{ResultStore, StoreError, StoreResult};
use crate::storage::Record;
use std::collections::HashSet;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

/// UTF-8 byte order mark written at the start of new files
const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// CSV storage backend
pub struct CsvStore {
    path: PathBuf,
    identifier_field: String,
    /// Column order of the file; `None` until a header exists
    header: Option<Vec<String>>,
    records: Vec<Record>,
    seen: HashSet<String>,
    writer: Option<csv::Writer<File>>,
    /// The file had no bytes at all when opened
    empty_at_open: bool,
    /// The last existing row lacks its line terminator
    needs_newline: bool,
    /// Length to cut the file back to before the first write
    repair_len: Option<u64>,
}

impl CsvStore {
    /// Opens a store, loading every record already in the file
    ///
    /// A missing or empty file yields an empty store. Opening never touches
    /// the disk; a row cut off by a crash is ignored here and removed from the
    /// file by the first append, so new rows start on a clean line.
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the CSV file
    /// * `identifier_field` - Column holding each record's unique identifier
    ///
    /// # Returns
    ///
    /// * `Ok(CsvStore)` - Successfully opened store
    /// * `Err(StoreError)` - File unreadable, malformed, or lacking the identifier column
    pub fn open(path: &Path, identifier_field: &str) -> StoreResult<Self> {
        let mut store = Self {
            path: path.to_path_buf(),
            identifier_field: identifier_field.to_string(),
            header: None,
            records: Vec::new(),
            seen: HashSet::new(),
            writer: None,
            empty_at_open: true,
            needs_newline: false,
            repair_len: None,
        };

        if path.exists() {
            let raw = std::fs::read(path)?;
            store.empty_at_open = raw.is_empty();
            store.load(&raw)?;
        }

        tracing::debug!(
            "Opened {} with {} records",
            store.path.display(),
            store.records.len()
        );

        Ok(store)
    }

    fn load(&mut self, raw: &[u8]) -> StoreResult<()> {
        let content = raw.strip_prefix(UTF8_BOM).unwrap_or(raw);
        let bom_len = (raw.len() - content.len()) as u64;
        if content.iter().all(u8::is_ascii_whitespace) {
            return Ok(());
        }

        // Header and first row are written together, so a file without a
        // single line break holds nothing but an interrupted first write
        if !content.contains(&b'\n') {
            tracing::warn!(
                "{} holds only a partial header, starting over",
                self.path.display()
            );
            self.repair_len = Some(0);
            self.empty_at_open = true;
            return Ok(());
        }

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(content);

        let header: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
        let id_index = header
            .iter()
            .position(|column| *column == self.identifier_field)
            .ok_or_else(|| StoreError::MissingIdentifierColumn {
                path: self.path.display().to_string(),
                column: self.identifier_field.clone(),
            })?;

        let mut rows = Vec::new();
        let mut row = csv::StringRecord::new();
        loop {
            let start = reader.position().byte();
            if !reader.read_record(&mut row)? {
                break;
            }
            rows.push((start, row.clone()));
        }

        if !content.ends_with(b"\n") {
            let cut = rows.last().and_then(|(start, row)| {
                let tail = &content[*start as usize..];
                let open_quote = tail.iter().filter(|&&b| b == b'"').count() % 2 == 1;
                (open_quote || row.len() < header.len()).then_some(*start)
            });

            match cut {
                Some(start) => {
                    tracing::warn!(
                        "{} ends with an incomplete row, dropping it",
                        self.path.display()
                    );
                    self.repair_len = Some(bom_len + start);
                    rows.pop();
                }
                None => self.needs_newline = true,
            }
        }

        for (_, row) in rows {
            match row.get(id_index) {
                Some(id) if !id.is_empty() => {
                    if !self.seen.insert(id.to_string()) {
                        tracing::warn!("{} repeats identifier {}", self.path.display(), id);
                    }
                }
                _ => tracing::warn!(
                    "{} has a row without '{}'",
                    self.path.display(),
                    self.identifier_field
                ),
            }
            self.records.push(Record::from_row(&header, &row));
        }

        self.header = Some(header);
        Ok(())
    }

    /// Path of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Column order of the file, if a header has been read or written
    pub fn header(&self) -> Option<&[String]> {
        self.header.as_deref()
    }

    /// All records, in file order
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    fn writer(&mut self, writing_header: bool) -> StoreResult<&mut csv::Writer<File>> {
        let writer = match self.writer.take() {
            Some(writer) => writer,
            None => self.open_writer(writing_header)?,
        };
        Ok(self.writer.insert(writer))
    }

    /// Opens the file for appending, creating it and its directory if needed
    fn open_writer(&mut self, writing_header: bool) -> StoreResult<csv::Writer<File>> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;

        if let Some(len) = self.repair_len.take() {
            file.set_len(len)?;
        }
        if writing_header && self.empty_at_open {
            file.write_all(UTF8_BOM)?;
        }
        if self.needs_newline {
            file.write_all(b"\n")?;
            self.needs_newline = false;
        }

        Ok(csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file))
    }
}

impl ResultStore for CsvStore {
    fn identifier_field(&self) -> &str {
        &self.identifier_field
    }

    fn contains(&self, identifier: &str) -> bool {
        self.seen.contains(identifier)
    }

    fn append(&mut self, record: Record) -> StoreResult<()> {
        let identifier = record
            .text(&self.identifier_field)
            .ok_or_else(|| StoreError::MissingIdentifier(self.identifier_field.clone()))?;

        if self.seen.contains(&identifier) {
            return Err(StoreError::DuplicateIdentifier(identifier));
        }

        let (header, writing_header) = match &self.header {
            Some(header) => {
                if let Some(field) = record
                    .field_names()
                    .find(|f| !header.iter().any(|h| h.as_str() == *f))
                {
                    return Err(StoreError::UnknownField {
                        field: field.to_string(),
                        path: self.path.display().to_string(),
                    });
                }
                (header.clone(), false)
            }
            None => (record.field_names().map(str::to_string).collect(), true),
        };

        let row: Vec<String> = header
            .iter()
            .map(|column| {
                record
                    .get(column)
                    .map(|value| value.to_string())
                    .unwrap_or_default()
            })
            .collect();

        let writer = self.writer(writing_header)?;
        if writing_header {
            writer.write_record(&header)?;
        }
        writer.write_record(&row)?;
        writer.flush()?;
        writer.get_ref().sync_data()?;

        if writing_header {
            self.header = Some(header);
        }
        self.seen.insert(identifier);
        self.records.push(record);

        Ok(())
    }

    fn len(&self) -> usize {
        self.records.len()
    }
}

use crate::error::{Result, RouteError};
use crate::types::RawRecord;
use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Single-pass iterator over the rows of a delimited file, keyed by the
/// field names found on its first row.
///
/// Values are kept as raw strings. Short rows leave their trailing fields
/// absent and surplus values are ignored.
pub struct CsvRecords {
    path: PathBuf,
    headers: Vec<String>,
    rows: csv::StringRecordsIntoIter<Cursor<Vec<u8>>>,
}

impl CsvRecords {
    pub fn open(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(RouteError::MissingFile {
                path: path.to_path_buf(),
            });
        }

        // Sources separate fields with ", " and are not careful about quoting
        let content = tighten_separators(&fs::read_to_string(path)?);
        let reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(Cursor::new(content.into_bytes()));

        let mut rows = reader.into_records();
        let headers = match rows.next() {
            Some(header_row) => header_row?.iter().map(clean_field).collect(),
            None => Vec::new(),
        };
        debug!("Opened {} with fields {:?}", path.display(), headers);

        Ok(Self {
            path: path.to_path_buf(),
            headers,
            rows,
        })
    }
}

impl Iterator for CsvRecords {
    type Item = Result<RawRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        let row = match self.rows.next()? {
            Ok(row) => row,
            Err(e) => {
                return Some(Err(RouteError::parse(
                    self.path.display().to_string(),
                    e,
                )))
            }
        };

        let record: RawRecord = self
            .headers
            .iter()
            .zip(row.iter())
            .map(|(key, value)| (key.clone(), clean_field(value)))
            .collect();
        debug!("record {:?}", record);
        Some(Ok(record))
    }
}

/// Drop the blanks after each unquoted separator, so a quote opening the
/// next field is seen by the reader and separators inside it are kept.
fn tighten_separators(content: &str) -> String {
    let mut out = String::with_capacity(content.len());
    let mut chars = content.chars().peekable();
    let mut in_quotes = false;
    let mut field_start = true;

    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes => {
                if chars.peek() == Some(&'"') {
                    // escaped quote
                    chars.next();
                    out.push_str("\"\"");
                    continue;
                }
                in_quotes = false;
            }
            '"' if field_start => in_quotes = true,
            ',' if !in_quotes => {
                out.push(c);
                while matches!(chars.peek(), Some(' ') | Some('\t')) {
                    chars.next();
                }
                field_start = true;
                continue;
            }
            '\n' if !in_quotes => {
                out.push(c);
                field_start = true;
                continue;
            }
            _ => {}
        }
        out.push(c);
        field_start = false;
    }
    out
}

/// Strip the quotes left around a value when a quote follows the separator's space
fn clean_field(value: &str) -> String {
    let trimmed = value.trim();
    trimmed
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .map(str::trim)
        .unwrap_or(trimmed)
        .to_string()
}

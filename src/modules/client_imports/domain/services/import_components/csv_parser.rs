use crate::shared::errors::{AppError, AppResult};
use csv::{ReaderBuilder, Trim};

/// Header plus data rows of one uploaded file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedCsv {
    /// Trimmed, lower-cased column names
    pub header: Vec<String>,
    /// Trimmed values, possibly shorter than the header
    pub rows: Vec<Vec<String>>,
}

impl ParsedCsv {
    /// Data rows only; the header is not a record
    pub fn total_records(&self) -> usize {
        self.rows.len()
    }
}

/// Splits raw text on a single delimiter
///
/// Quoting is deliberately not interpreted: a delimiter inside a value shifts
/// every following field of that row.
#[derive(Debug, Clone, Copy)]
pub struct CsvParser {
    delimiter: u8,
}

impl Default for CsvParser {
    fn default() -> Self {
        Self { delimiter: b',' }
    }
}

impl CsvParser {
    pub fn new(delimiter: u8) -> Self {
        Self { delimiter }
    }

    pub fn delimiter(&self) -> u8 {
        self.delimiter
    }

    pub fn parse(&self, text: &str) -> AppResult<ParsedCsv> {
        let text = text.strip_prefix('\u{feff}').unwrap_or(text);

        // Blank lines never count as rows
        let lines: Vec<&str> = text.lines().filter(|line| !line.trim().is_empty()).collect();
        if lines.is_empty() {
            return Err(AppError::ParseError("File is empty".to_string()));
        }
        let content = lines.join("\n");

        let mut reader = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true) // Rows may be shorter than the header
            .quoting(false)
            .trim(Trim::All)
            .delimiter(self.delimiter)
            .from_reader(content.as_bytes());

        let mut records = reader.records();

        let header: Vec<String> = match records.next() {
            Some(record) => record?.iter().map(|name| name.to_lowercase()).collect(),
            None => return Err(AppError::ParseError("File has no header row".to_string())),
        };

        let mut rows = Vec::with_capacity(lines.len() - 1);
        for record in records {
            rows.push(record?.iter().map(str::to_string).collect());
        }

        Ok(ParsedCsv { header, rows })
    }
}

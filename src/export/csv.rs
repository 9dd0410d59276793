//! CSV export: one row per message or thread reply.
//!
//! Columns are fixed (see [`crate::reader::COLUMNS`]); replies carry
//! `depth = 1` and their parent's `ts`.

use std::io::Write;

use crate::error::Result;
use crate::model::Archive;
use crate::reader::{message_rows, COLUMNS};

use super::{ExportOptions, Exporter};

/// CSV exporter.
#[derive(Debug, Clone)]
pub struct CsvExporter {
    /// Include header row.
    include_header: bool,
    /// Field delimiter.
    delimiter: char,
    /// Quote character.
    quote_char: char,
}

impl Default for CsvExporter {
    fn default() -> Self {
        Self::new()
    }
}

impl CsvExporter {
    /// Create a new CSV exporter.
    #[must_use]
    pub fn new() -> Self {
        Self {
            include_header: true,
            delimiter: ',',
            quote_char: '"',
        }
    }

    /// Include or exclude header row.
    #[must_use]
    pub fn with_header(mut self, include: bool) -> Self {
        self.include_header = include;
        self
    }

    /// Set the field delimiter.
    #[must_use]
    pub fn with_delimiter(mut self, delim: char) -> Self {
        self.delimiter = delim;
        self
    }

    /// Escape a field value for CSV.
    fn escape_field(&self, value: &str) -> String {
        let needs_quoting = value.contains(self.delimiter)
            || value.contains(self.quote_char)
            || value.contains('\n')
            || value.contains('\r');

        if needs_quoting {
            let doubled: String = [self.quote_char, self.quote_char].iter().collect();
            let escaped = value.replace(self.quote_char, &doubled);
            format!("{q}{escaped}{q}", q = self.quote_char)
        } else {
            value.to_string()
        }
    }

    /// Write a CSV row.
    fn write_row<W: Write, S: AsRef<str>>(&self, writer: &mut W, fields: &[S]) -> Result<()> {
        let line: Vec<String> = fields.iter().map(|f| self.escape_field(f.as_ref())).collect();
        writeln!(writer, "{}", line.join(&self.delimiter.to_string()))?;
        Ok(())
    }
}

impl Exporter for CsvExporter {
    fn export_archive<W: Write>(
        &self,
        archive: &Archive,
        writer: &mut W,
        options: &ExportOptions,
    ) -> Result<()> {
        if self.include_header {
            self.write_row(writer, COLUMNS)?;
        }
        for row in message_rows(archive) {
            if row.depth > 0 && !options.include_threads {
                continue;
            }
            self.write_row(writer, &row.fields()[..])?;
        }
        Ok(())
    }
}

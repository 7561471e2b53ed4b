//! # Projection Printer
//!
//! Renders targets as one line each, projecting the configured columns.
//!
//! - `TXT`: `key=value` tokens joined by single spaces
//! - `TSV`: a header of column names before the first row, then one
//!   tab-separated row per target
//!
//! Missing values print as empty strings, lists as `[a, b]`.

use crate::error::Result;
use crate::store::ContentRepository;
use crate::target::{TargetId, Targets};
use std::fmt;
use std::io::Write;

/// Recognized format names. A format's code is its index here.
pub const FORMAT_NAMES: [&str; 2] = ["TXT", "TSV"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Format {
    #[default]
    Txt,
    Tsv,
}

impl Format {
    /// Case-sensitive lookup in [`FORMAT_NAMES`]. `None` for unknown names.
    pub fn lookup(name: &str) -> Option<Format> {
        match FORMAT_NAMES.iter().position(|n| *n == name)? {
            0 => Some(Format::Txt),
            _ => Some(Format::Tsv),
        }
    }

    pub fn code(self) -> usize {
        match self {
            Format::Txt => 0,
            Format::Tsv => 1,
        }
    }

    pub fn name(self) -> &'static str {
        FORMAT_NAMES[self.code()]
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

pub struct Printer {
    format: Format,
    columns: Vec<String>,
    header_done: bool,
}

impl Printer {
    pub fn new(format: Format, columns: Vec<String>) -> Self {
        Self {
            format,
            columns,
            header_done: false,
        }
    }

    pub fn format(&self) -> Format {
        self.format
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Append a column to every line printed from now on.
    pub fn add_column(&mut self, key: impl Into<String>) {
        self.columns.push(key.into());
    }

    /// Lines for one target: the TSV header the first time, then the row.
    pub fn render<R: ContentRepository + ?Sized>(
        &mut self,
        targets: &mut Targets,
        repo: &R,
        id: TargetId,
    ) -> Result<Vec<String>> {
        let mut values = Vec::with_capacity(self.columns.len());
        for key in &self.columns {
            let value = targets.get(repo, id, key)?;
            values.push(value.map(|v| v.to_string()).unwrap_or_default());
        }

        let mut lines = Vec::with_capacity(2);
        match self.format {
            Format::Txt => {
                let tokens: Vec<String> = self
                    .columns
                    .iter()
                    .zip(&values)
                    .map(|(key, value)| format!("{}={}", key, value))
                    .collect();
                lines.push(tokens.join(" "));
            }
            Format::Tsv => {
                if !self.header_done {
                    lines.push(self.columns.join("\t"));
                    self.header_done = true;
                }
                let cells: Vec<String> = values.iter().map(|v| tsv_cell(v)).collect();
                lines.push(cells.join("\t"));
            }
        }
        Ok(lines)
    }

    pub fn print<R: ContentRepository + ?Sized, W: Write>(
        &mut self,
        out: &mut W,
        targets: &mut Targets,
        repo: &R,
        id: TargetId,
    ) -> Result<()> {
        for line in self.render(targets, repo, id)? {
            writeln!(out, "{}", line)?;
        }
        Ok(())
    }
}

/// Tabs and line breaks inside a value would shift every later column.
fn tsv_cell(value: &str) -> String {
    value.replace(['\t', '\n', '\r'], " ")
}

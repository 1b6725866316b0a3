//! Tabular output
//!
//! Rows are ordered string-keyed cells. Rendering either pads columns to a
//! common width or joins cells with a delimiter.

use std::io::{self, Write};

/// One table cell
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Cell {
    Empty,
    Text(String),
    Flag(bool),
    List(Vec<String>),
}

impl Cell {
    pub fn is_empty(&self) -> bool {
        matches!(self, Cell::Empty)
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Cell::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Render with absent values as `na` and lists joined by `list_sep`
    pub fn render(&self, na: &str, list_sep: &str) -> String {
        match self {
            Cell::Empty => na.to_string(),
            Cell::Text(s) => s.clone(),
            Cell::Flag(b) => b.to_string(),
            Cell::List(items) => items.join(list_sep),
        }
    }
}

impl From<&str> for Cell {
    fn from(s: &str) -> Self {
        Cell::Text(s.to_string())
    }
}

impl From<String> for Cell {
    fn from(s: String) -> Self {
        Cell::Text(s)
    }
}

impl From<bool> for Cell {
    fn from(b: bool) -> Self {
        Cell::Flag(b)
    }
}

impl From<Vec<String>> for Cell {
    fn from(items: Vec<String>) -> Self {
        Cell::List(items)
    }
}

impl<T: Into<Cell>> From<Option<T>> for Cell {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Cell::Empty)
    }
}

/// Ordered mapping of column name to cell
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Row {
    cells: Vec<(String, Cell)>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a cell, replacing an existing one with the same key
    pub fn with(mut self, key: &str, cell: impl Into<Cell>) -> Self {
        self.insert(key, cell);
        self
    }

    pub fn insert(&mut self, key: &str, cell: impl Into<Cell>) {
        let cell = cell.into();
        match self.cells.iter_mut().find(|(k, _)| k == key) {
            Some((_, existing)) => *existing = cell,
            None => self.cells.push((key.to_string(), cell)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&Cell> {
        self.cells.iter().find(|(k, _)| k == key).map(|(_, c)| c)
    }

    /// Text value of a column, if it holds text
    pub fn text(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Cell::as_text)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.cells.iter().map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Cell)> {
        self.cells.iter().map(|(k, c)| (k.as_str(), c))
    }
}

/// Rendering options
#[derive(Debug, Clone)]
pub struct TableOptions {
    /// Columns to print, in order; `None` prints every key seen
    pub columns: Option<Vec<String>>,
    /// Pad columns instead of delimiting them
    pub align: bool,
    pub delimiter: char,
    /// Longer cells are cut to this width, ending in `...`
    pub cell_width: Option<usize>,
    pub list_separator: String,
    pub na: String,
}

impl Default for TableOptions {
    fn default() -> Self {
        Self {
            columns: None,
            align: true,
            delimiter: '\t',
            cell_width: Some(44),
            list_separator: ", ".to_string(),
            na: String::new(),
        }
    }
}

impl TableOptions {
    pub fn with_columns<S: AsRef<str>>(columns: &[S]) -> Self {
        Self {
            columns: Some(columns.iter().map(|c| c.as_ref().to_string()).collect()),
            ..Self::default()
        }
    }
}

/// Print rows to stdout
pub fn print_table(rows: &[Row], options: &TableOptions) -> io::Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    write_table(&mut out, rows, options)
}

/// Write rows to any writer
pub fn write_table<W: Write>(out: &mut W, rows: &[Row], options: &TableOptions) -> io::Result<()> {
    if rows.is_empty() {
        return Ok(());
    }

    let columns: Vec<String> = match &options.columns {
        Some(columns) => columns.clone(),
        None => {
            let mut seen: Vec<String> = Vec::new();
            for key in rows.iter().flat_map(Row::keys) {
                if !seen.iter().any(|s| s == key) {
                    seen.push(key.to_string());
                }
            }
            seen
        }
    };

    let rendered: Vec<Vec<String>> = rows
        .iter()
        .map(|row| {
            columns
                .iter()
                .map(|col| {
                    let text = row
                        .get(col)
                        .map(|c| c.render(&options.na, &options.list_separator))
                        .unwrap_or_default();
                    truncate(&text, options.cell_width)
                })
                .collect()
        })
        .collect();

    if options.align {
        log::debug!("using manual alignment to render output");
        let widths: Vec<usize> = columns
            .iter()
            .enumerate()
            .map(|(i, col)| {
                rendered
                    .iter()
                    .map(|cells| cells[i].chars().count())
                    .chain(std::iter::once(col.chars().count()))
                    .max()
                    .unwrap_or(0)
            })
            .collect();

        writeln!(out, "{}", padded(&columns, &widths))?;
        for cells in &rendered {
            writeln!(out, "{}", padded(cells, &widths))?;
        }
    } else {
        log::debug!("using delimiter to render output");
        let sep = options.delimiter.to_string();
        writeln!(out, "{}", columns.join(&sep))?;
        for cells in &rendered {
            writeln!(out, "{}", cells.join(&sep))?;
        }
    }
    Ok(())
}

fn padded(cells: &[String], widths: &[usize]) -> String {
    let line = cells
        .iter()
        .zip(widths)
        .map(|(cell, width)| format!("{:<width$}", cell, width = width))
        .collect::<Vec<_>>()
        .join("  ");
    line.trim_end().to_string()
}

fn truncate(text: &str, width: Option<usize>) -> String {
    match width {
        Some(width) if text.chars().count() > width => {
            let kept: String = text.chars().take(width.saturating_sub(3)).collect();
            format!("{}...", kept)
        }
        _ => text.to_string(),
    }
}

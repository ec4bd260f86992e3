use anyhow::{Result, Context, anyhow};
use chrono::{Local, NaiveDate};
use std::fs;
use std::path::{Path, PathBuf};

// @module: File utilities for delimited sheet exports

/// Rows of a delimited text file
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    /// Header record, if the file has one
    pub header: Option<Vec<String>>,

    /// Data records
    pub records: Vec<Vec<String>>,
}

impl Table {
    /// Values of a column; records too short for it yield empty strings
    pub fn column(&self, index: usize) -> Vec<String> {
        self.records
            .iter()
            .map(|record| record.get(index).cloned().unwrap_or_default())
            .collect()
    }

    /// Width of the widest record, header included
    pub fn width(&self) -> usize {
        self.records
            .iter()
            .chain(self.header.iter())
            .map(Vec::len)
            .max()
            .unwrap_or(0)
    }

    /// Append a column after the current widest record
    ///
    /// Short records are padded so the new column lines up. Missing values
    /// become empty cells.
    pub fn append_column(&mut self, label: &str, values: &[String]) {
        let width = self.width();

        if let Some(header) = self.header.as_mut() {
            header.resize(width, String::new());
            header.push(label.to_string());
        }

        for (index, record) in self.records.iter_mut().enumerate() {
            record.resize(width, String::new());
            record.push(values.get(index).cloned().unwrap_or_default());
        }
    }

    /// Serialize with the given delimiter, one record per line
    pub fn to_delimited(&self, delimiter: char) -> String {
        let separator = delimiter.to_string();
        let mut output = String::new();

        for record in self.header.iter().chain(self.records.iter()) {
            let line: Vec<String> = record.iter().map(|cell| flatten_cell(cell, delimiter)).collect();
            output.push_str(&line.join(&separator));
            output.push('\n');
        }

        output
    }
}

/// Replace line breaks and the delimiter inside a cell with spaces
pub fn flatten_cell(cell: &str, delimiter: char) -> String {
    cell.chars()
        .map(|c| if c == '\n' || c == '\r' || c == '\t' || c == delimiter { ' ' } else { c })
        .collect()
}

// @struct: File operations utility
pub struct FileManager;

impl FileManager {
    // @checks: File existence
    pub fn file_exists<P: AsRef<Path>>(path: P) -> bool {
        path.as_ref().exists() && path.as_ref().is_file()
    }

    // @creates: Directory and parents if needed
    pub fn ensure_dir<P: AsRef<Path>>(path: P) -> Result<()> {
        let path = path.as_ref();
        if !path.as_os_str().is_empty() && !path.exists() {
            fs::create_dir_all(path)?;
        }
        Ok(())
    }

    /// Read a file to a string
    pub fn read_to_string<P: AsRef<Path>>(path: P) -> Result<String> {
        fs::read_to_string(&path)
            .with_context(|| format!("Failed to read file: {:?}", path.as_ref()))
    }

    /// Write a string to a file
    pub fn write_to_file<P: AsRef<Path>>(path: P, content: &str) -> Result<()> {
        // Ensure the parent directory exists
        if let Some(parent) = path.as_ref().parent() {
            Self::ensure_dir(parent)?;
        }

        fs::write(&path, content)
            .with_context(|| format!("Failed to write to file: {:?}", path.as_ref()))?;

        Ok(())
    }

    /// Parse delimited text
    ///
    /// Lines are records, fields are split on the delimiter. No quoting is
    /// interpreted. Trailing blank lines are ignored.
    pub fn parse_table(content: &str, delimiter: char, has_header: bool) -> Table {
        let mut lines: Vec<&str> = content
            .lines()
            .map(|line| line.strip_suffix('\r').unwrap_or(line))
            .collect();
        while lines.last().is_some_and(|line| line.trim().is_empty()) {
            lines.pop();
        }

        let mut records = lines
            .into_iter()
            .map(|line| line.split(delimiter).map(str::to_string).collect::<Vec<_>>());

        let header = if has_header { records.next() } else { None };

        Table {
            header,
            records: records.collect(),
        }
    }

    /// Read a delimited text file
    pub fn read_table<P: AsRef<Path>>(path: P, delimiter: char, has_header: bool) -> Result<Table> {
        let content = Self::read_to_string(&path)?;
        let table = Self::parse_table(content.trim_start_matches('\u{feff}'), delimiter, has_header);
        if table.records.is_empty() {
            return Err(anyhow!("No data rows in {:?}", path.as_ref()));
        }
        Ok(table)
    }

    /// Write a table as delimited text
    pub fn write_table<P: AsRef<Path>>(path: P, table: &Table, delimiter: char) -> Result<()> {
        Self::write_to_file(path, &table.to_delimited(delimiter))
    }

    // @generates: Output file name `<stem>_Translated_<YYYY-MM-DD>.<ext>`
    pub fn output_file_name<P: AsRef<Path>>(input_file: P, date: NaiveDate) -> String {
        let input_file = input_file.as_ref();
        let stem = input_file.file_stem().unwrap_or_default().to_string_lossy();
        let extension = input_file
            .extension()
            .map(|e| e.to_string_lossy().to_string())
            .unwrap_or_else(|| "tsv".to_string());

        format!("{}_Translated_{}.{}", stem, date.format("%Y-%m-%d"), extension)
    }

    // @generates: Output path next to the input file, dated today
    pub fn generate_output_path<P: AsRef<Path>>(input_file: P) -> PathBuf {
        let input_file = input_file.as_ref();
        let file_name = Self::output_file_name(input_file, Local::now().date_naive());
        input_file
            .parent()
            .unwrap_or_else(|| Path::new(""))
            .join(file_name)
    }
}

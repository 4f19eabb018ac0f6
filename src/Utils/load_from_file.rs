use log::{error, info};
use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TableError {
    #[error("File '{0}' does not exist")]
    NotFound(String),
    #[error("I/O error on '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Malformed number '{token}' in '{path}' at line {line}")]
    Parse {
        path: String,
        line: usize,
        token: String,
    },
    #[error("'{path}' line {line}: expected at least {expected} columns, found {found}")]
    ColumnCount {
        path: String,
        line: usize,
        expected: usize,
        found: usize,
    },
    #[error("'{0}' contains no data rows")]
    Empty(String),
    #[error("columns passed for '{0}' have different lengths")]
    RaggedColumns(String),
}

/// Handle on a whitespace separated numeric table, columns in scientific notation:
/// one row per line, `#` starts a comment.
#[derive(Debug, Clone)]
pub struct LoadData {
    pub file_name: PathBuf,
}

impl LoadData {
    pub fn new<P: AsRef<Path>>(file_name: P) -> Self {
        LoadData {
            file_name: file_name.as_ref().to_path_buf(),
        }
    }
    /// Reads the table and returns it column-wise
    pub fn load_columns(&self, n_columns: usize) -> Result<Vec<Vec<f64>>, TableError> {
        load_columns(&self.file_name, n_columns)
    }
    pub fn save_columns(&self, columns: &[&[f64]]) -> Result<(), TableError> {
        save_columns(&self.file_name, columns)
    }
}

/// Parses a text table and returns its first `n_columns` columns, one `Vec`
/// per column. Rows with fewer numbers are an error, trailing columns are ignored.
pub fn load_columns(path: &Path, n_columns: usize) -> Result<Vec<Vec<f64>>, TableError> {
    let name = path.display().to_string();
    if !path.exists() {
        error!("table '{}' not found", name);
        return Err(TableError::NotFound(name));
    }
    let file = File::open(path).map_err(|source| TableError::Io {
        path: name.clone(),
        source,
    })?;
    let reader = BufReader::new(file);

    let mut columns: Vec<Vec<f64>> = vec![Vec::new(); n_columns];
    for (i, line) in reader.lines().enumerate() {
        let line = line.map_err(|source| TableError::Io {
            path: name.clone(),
            source,
        })?;
        let content = match line.split_once('#') {
            Some((before, _)) => before,
            None => line.as_str(),
        };
        let tokens: Vec<&str> = content.split_whitespace().collect();
        if tokens.is_empty() {
            continue;
        }
        if tokens.len() < n_columns {
            error!("table '{}' has a malformed row {}", name, i + 1);
            return Err(TableError::ColumnCount {
                path: name,
                line: i + 1,
                expected: n_columns,
                found: tokens.len(),
            });
        }
        for (column, token) in columns.iter_mut().zip(tokens) {
            let value: f64 = token.parse().map_err(|_| TableError::Parse {
                path: name.clone(),
                line: i + 1,
                token: token.to_string(),
            })?;
            column.push(value);
        }
    }
    if columns.first().map_or(true, |c| c.is_empty()) {
        return Err(TableError::Empty(name));
    }
    info!("loaded {} rows from '{}'", columns[0].len(), name);
    Ok(columns)
}

/// Writes equally long columns side by side, creating parent directories if needed.
pub fn save_columns(path: &Path, columns: &[&[f64]]) -> Result<(), TableError> {
    let name = path.display().to_string();
    let n_rows = columns.first().map_or(0, |c| c.len());
    if columns.iter().any(|c| c.len() != n_rows) {
        return Err(TableError::RaggedColumns(name));
    }
    let io_err = |source| TableError::Io {
        path: name.clone(),
        source,
    };
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(io_err)?;
        }
    }
    let file = File::create(path).map_err(io_err)?;
    let mut writer = BufWriter::new(file);
    for row in 0..n_rows {
        let line: Vec<String> = columns.iter().map(|c| format!("{:.18e}", c[row])).collect();
        writeln!(writer, "{}", line.join(" ")).map_err(io_err)?;
    }
    writer.flush().map_err(io_err)?;
    info!("saved {} rows to '{}'", n_rows, name);
    Ok(())
}

//! Feature-to-gage crosswalk from a hydrofabric GeoPackage.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use rusqlite::types::Value;
use rusqlite::{Connection, OpenFlags};
use tracing::{debug, info};

use crate::ensemble_read::discover;
use crate::error::IoError;

/// File name pattern of hydrofabric GeoPackages.
pub const HYDROFABRIC_PATTERN: &str = "*.gpkg";

/// Which table and columns hold the crosswalk.
#[derive(Debug, Clone)]
pub struct CrosswalkConfig {
    table: String,
    id_column: String,
    gage_column: String,
}

impl Default for CrosswalkConfig {
    fn default() -> Self {
        Self {
            table: "flowpath-attributes".into(),
            id_column: "id".into(),
            gage_column: "gage".into(),
        }
    }
}

impl CrosswalkConfig {
    pub fn with_table(mut self, table: impl Into<String>) -> Self {
        self.table = table.into();
        self
    }

    pub fn with_id_column(mut self, column: impl Into<String>) -> Self {
        self.id_column = column.into();
        self
    }

    pub fn with_gage_column(mut self, column: impl Into<String>) -> Self {
        self.gage_column = column.into();
        self
    }
}

/// Numeric feature id from a hydrofabric id such as `wb-1234`: the first
/// run of digits.
pub fn feature_number(id: &str) -> Option<i64> {
    let start = id.find(|c: char| c.is_ascii_digit())?;
    let digits: String = id[start..]
        .chars()
        .take_while(char::is_ascii_digit)
        .collect();
    digits.parse().ok()
}

fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

fn value_to_string(value: Value) -> Option<String> {
    match value {
        Value::Text(s) => {
            let s = s.trim();
            (!s.is_empty()).then(|| s.to_string())
        }
        Value::Integer(i) => Some(i.to_string()),
        Value::Real(x) if x.fract() == 0.0 => Some(format!("{}", x as i64)),
        Value::Real(x) => Some(x.to_string()),
        Value::Null | Value::Blob(_) => None,
    }
}

/// First GeoPackage in `dir` by sorted path, or `None` when there is none.
///
/// # Errors
///
/// Returns [`IoError::FileNotFound`] if `dir` is not a directory.
pub fn find_hydrofabric(dir: &Path) -> Result<Option<PathBuf>, IoError> {
    if !dir.is_dir() {
        return Err(IoError::FileNotFound {
            path: dir.to_path_buf(),
        });
    }
    let candidates = discover(dir, HYDROFABRIC_PATTERN)?;
    if let Some(first) = candidates.first() {
        info!(
            path = %first.display(),
            n_candidates = candidates.len(),
            "auto-detected hydrofabric"
        );
    }
    Ok(candidates.into_iter().next())
}

/// Read `feature id -> gage id` pairs from the GeoPackage at `path`.
///
/// Rows without a gage, or whose id carries no digits, are skipped.
/// Integer gage ids are formatted without padding, so string columns are
/// the reliable way to keep leading zeros.
///
/// # Errors
///
/// Returns [`IoError::FileNotFound`], [`IoError::MissingVariable`] if the
/// table or a column is absent, or [`IoError::Sqlite`] on query failure.
pub fn read_gage_crosswalk(
    path: &Path,
    config: &CrosswalkConfig,
) -> Result<BTreeMap<i64, String>, IoError> {
    if !path.exists() {
        return Err(IoError::FileNotFound {
            path: path.to_path_buf(),
        });
    }
    let conn = Connection::open_with_flags(path, OpenFlags::SQLITE_OPEN_READ_ONLY)?;

    let columns = table_columns(&conn, &config.table)?;
    if columns.is_empty() {
        return Err(IoError::MissingVariable {
            name: config.table.clone(),
            path: path.to_path_buf(),
        });
    }
    for column in [&config.id_column, &config.gage_column] {
        if !columns.contains(column) {
            return Err(IoError::MissingVariable {
                name: format!("{}.{}", config.table, column),
                path: path.to_path_buf(),
            });
        }
    }

    let sql = format!(
        "SELECT {id}, {gage} FROM {table} WHERE {gage} IS NOT NULL",
        id = quote_ident(&config.id_column),
        gage = quote_ident(&config.gage_column),
        table = quote_ident(&config.table),
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map([], |row| Ok((row.get::<_, Value>(0)?, row.get::<_, Value>(1)?)))?;

    let mut mapping = BTreeMap::new();
    let mut n_skipped = 0usize;
    for row in rows {
        let (id, gage) = row?;
        let feature = value_to_string(id).as_deref().and_then(feature_number);
        match (feature, value_to_string(gage)) {
            (Some(feature), Some(gage)) => {
                mapping.insert(feature, gage);
            }
            _ => n_skipped += 1,
        }
    }

    if n_skipped > 0 {
        debug!(n_skipped, "skipped crosswalk rows without a usable id or gage");
    }
    info!(
        path = %path.display(),
        n_gages = mapping.len(),
        "loaded gage crosswalk"
    );
    Ok(mapping)
}

fn table_columns(conn: &Connection, table: &str) -> Result<Vec<String>, IoError> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({})", quote_ident(table)))?;
    let names = stmt
        .query_map([], |row| row.get::<_, String>(1))?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(names)
}

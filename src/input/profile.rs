//! Code for reading time-indexed profile tables from CSV files.
use super::input_err_msg;
use crate::id::TimeStepID;
use crate::model::ProfileMap;
use anyhow::{Context, Result, ensure};
use itertools::Itertools;
use std::io;
use std::path::Path;

/// A table of values indexed by time step.
///
/// One column of the source file supplies the row index; every other column holds values. Cells
/// are kept as read: blank or non-numeric cells and repeated index values are only rejected when
/// a column is extracted as a [`ProfileMap`].
#[derive(Debug, Clone, PartialEq)]
pub struct ProfileTable {
    index_name: String,
    columns: Vec<String>,
    rows: Vec<ProfileRow>,
}

/// A single row of a [`ProfileTable`]
#[derive(Debug, Clone, PartialEq)]
struct ProfileRow {
    time_step: TimeStepID,
    cells: Vec<String>,
}

impl ProfileTable {
    /// Read a profile table from a CSV file, using the column at position `index_col` as the index.
    ///
    /// # Arguments
    ///
    /// * `file_path` - Path to the CSV file
    /// * `index_col` - Zero-based position of the index column
    pub fn from_path(file_path: &Path, index_col: usize) -> Result<Self> {
        let reader = csv::Reader::from_path(file_path).with_context(|| input_err_msg(file_path))?;
        Self::from_csv_reader(reader, |headers| {
            ensure!(
                index_col < headers.len(),
                "Index column {index_col} is out of range (file has {} columns)",
                headers.len()
            );
            Ok(index_col)
        })
        .with_context(|| input_err_msg(file_path))
    }

    /// Read a profile table from a CSV file, using the column called `index_name` as the index.
    pub fn from_path_with_index_name(file_path: &Path, index_name: &str) -> Result<Self> {
        let reader = csv::Reader::from_path(file_path).with_context(|| input_err_msg(file_path))?;
        Self::from_csv_reader(reader, |headers| {
            headers
                .iter()
                .position(|header| header == index_name)
                .with_context(|| format!("No index column named {index_name}"))
        })
        .with_context(|| input_err_msg(file_path))
    }

    /// Read a profile table from a CSV reader.
    ///
    /// `select_index` is given the header row and returns the position of the index column.
    fn from_csv_reader<R, F>(mut reader: csv::Reader<R>, select_index: F) -> Result<Self>
    where
        R: io::Read,
        F: FnOnce(&csv::StringRecord) -> Result<usize>,
    {
        let headers = reader.headers()?.clone();
        let index_col = select_index(&headers)?;

        let split_index = |record: &csv::StringRecord| {
            let mut cells = record.iter().map(str::to_string).collect_vec();
            let time_step = cells.remove(index_col);
            (time_step, cells)
        };

        let (index_name, columns) = split_index(&headers);
        let rows: Vec<ProfileRow> = reader
            .records()
            .map_ok(|record| {
                let (time_step, cells) = split_index(&record);
                ProfileRow {
                    time_step: time_step.into(),
                    cells,
                }
            })
            .try_collect()?;

        Ok(Self {
            index_name,
            columns,
            rows,
        })
    }

    /// The name of the index column
    pub fn index_name(&self) -> &str {
        &self.index_name
    }

    /// The names of the value columns, in file order
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// The number of data rows
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the table has no data rows
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Iterate over the index values in file order, including any repeats
    pub fn iter_index(&self) -> impl Iterator<Item = &TimeStepID> {
        self.rows.iter().map(|row| &row.time_step)
    }

    /// Get the cell in `column` for the first row indexed by `time_step`, as read from file
    pub fn get(&self, time_step: &str, column: &str) -> Option<&str> {
        let pos = self.column_position(column)?;
        self.rows
            .iter()
            .find(|row| &*row.time_step.0 == time_step)
            .map(|row| row.cells[pos].as_str())
    }

    /// Extract a single column as a [`ProfileMap`].
    ///
    /// Every cell in the column must be a number and every index value must be unique.
    pub fn column(&self, column: &str) -> Result<ProfileMap> {
        let pos = self
            .column_position(column)
            .with_context(|| format!("No column named {column}"))?;

        let mut map = ProfileMap::with_capacity(self.rows.len());
        for (row_num, row) in self.rows.iter().enumerate() {
            let field = &row.cells[pos];
            let value = field.trim().parse().with_context(|| {
                format!(
                    "Invalid value '{field}' in column {column} (row {})",
                    row_num + 1
                )
            })?;

            let existing = map.insert(row.time_step.clone(), value).is_some();
            ensure!(!existing, "Duplicate index value {}", row.time_step);
        }

        Ok(map)
    }

    fn column_position(&self, column: &str) -> Option<usize> {
        self.columns.iter().position(|name| name == column)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::assert_error;
    use rstest::{fixture, rstest};
    use std::fs::File;
    use std::io::Write;
    use std::path::PathBuf;
    use tempfile::{TempDir, tempdir};

    #[fixture]
    fn dir() -> TempDir {
        tempdir().unwrap()
    }

    fn create_profile_file(dir_path: &Path, contents: &str) -> PathBuf {
        let file_path = dir_path.join("profile.csv");
        let mut file = File::create(&file_path).unwrap();
        write!(file, "{contents}").unwrap();
        file_path
    }

    #[rstest]
    fn test_from_path(dir: TempDir) {
        let file_path = create_profile_file(dir.path(), "time,value\nt0,0.0\nt1,0.5\nt2,1.0\n");
        let table = ProfileTable::from_path(&file_path, 0).unwrap();

        assert_eq!(table.len(), 3);
        assert_eq!(table.index_name(), "time");
        assert_eq!(table.columns(), ["value"]);
        assert_eq!(table.iter_index().map(ToString::to_string).join(","), "t0,t1,t2");
        assert_eq!(table.get("t1", "value"), Some("0.5"));
        assert_eq!(table.get("t3", "value"), None);
        assert_eq!(table.get("t1", "other"), None);
        assert_eq!(table.column("value").unwrap()["t1"], 0.5);
    }

    #[rstest]
    fn test_from_path_other_index_col(dir: TempDir) {
        let file_path = create_profile_file(dir.path(), "value,time,extra\n1.5,a,2\n2.5,b,3\n");
        let table = ProfileTable::from_path(&file_path, 1).unwrap();

        assert_eq!(table.index_name(), "time");
        assert_eq!(table.columns(), ["value", "extra"]);
        assert_eq!(table.get("b", "value"), Some("2.5"));
        assert_eq!(table.get("b", "extra"), Some("3"));
    }

    #[rstest]
    fn test_from_path_with_index_name(dir: TempDir) {
        let file_path = create_profile_file(dir.path(), "value,t\n0.25,t0\n0.75,t1\n");
        let table = ProfileTable::from_path_with_index_name(&file_path, "t").unwrap();
        let column = table.column("value").unwrap();

        assert_eq!(column.len(), 2);
        assert_eq!(column["t0"], 0.25);
        assert_eq!(column["t1"], 0.75);
        assert!(table.column("t").is_err());

        assert!(ProfileTable::from_path_with_index_name(&file_path, "time").is_err());
    }

    #[rstest]
    fn test_from_path_header_only(dir: TempDir) {
        let file_path = create_profile_file(dir.path(), "time,value\n");
        let table = ProfileTable::from_path(&file_path, 0).unwrap();
        assert!(table.is_empty());
        assert_eq!(table.columns(), ["value"]);
    }

    #[rstest]
    fn test_from_path_missing_file(dir: TempDir) {
        let file_path = dir.path().join("missing.csv");
        assert_error!(
            ProfileTable::from_path(&file_path, 0),
            input_err_msg(&file_path)
        );
    }

    #[rstest]
    fn test_from_path_index_out_of_range(dir: TempDir) {
        let file_path = create_profile_file(dir.path(), "time,value\nt0,1.0\n");
        let err = ProfileTable::from_path(&file_path, 2).unwrap_err();

        // First error in the chain is the file context; the cause comes next
        assert_eq!(err.to_string(), input_err_msg(&file_path));
        assert_eq!(
            err.chain().nth(1).unwrap().to_string(),
            "Index column 2 is out of range (file has 2 columns)"
        );
    }

    #[rstest]
    fn test_from_path_ragged_rows(dir: TempDir) {
        let file_path = create_profile_file(dir.path(), "time,value\nt0,1.0,2.0\n");
        assert!(ProfileTable::from_path(&file_path, 0).is_err());
    }

    #[rstest]
    fn test_from_path_keeps_cells_as_read(dir: TempDir) {
        let file_path = create_profile_file(
            dir.path(),
            "time,value,unit\nt0,,kW\nt0,2.0,kW\n t1 ,abc,kW\n",
        );
        let table = ProfileTable::from_path(&file_path, 0).unwrap();

        assert_eq!(table.len(), 3);
        assert_eq!(table.columns(), ["value", "unit"]);
        assert_eq!(table.iter_index().map(ToString::to_string).join(","), "t0,t0, t1 ");

        // Lookups return the first matching row
        assert_eq!(table.get("t0", "value"), Some(""));
        assert_eq!(table.get("t0", "unit"), Some("kW"));
        assert_eq!(table.get(" t1 ", "value"), Some("abc"));
        assert_eq!(table.get("t1", "value"), None);
    }

    #[rstest]
    #[case("time,value\nt0,abc\n", "Invalid value 'abc' in column value (row 1)")]
    #[case("time,value\nt0,1.0\nt1,\n", "Invalid value '' in column value (row 2)")]
    #[case("time,value\nt0,1.0\nt0,2.0\n", "Duplicate index value t0")]
    fn test_column_invalid(dir: TempDir, #[case] contents: &str, #[case] msg: &str) {
        let file_path = create_profile_file(dir.path(), contents);
        let table = ProfileTable::from_path(&file_path, 0).unwrap();
        assert_error!(table.column("value"), msg);
    }
}

//! Immutable, column-major view of a precinct results file.

use std::collections::BTreeMap;

use polars::prelude::{AnyValue, DataFrame};

use crate::error::{QaError, Result};
use crate::value::any_to_string;

/// One loaded results file.
///
/// Every cell is held as text. Row position is the stable identifier used in
/// issue reporting; see [`row_number`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Dataset {
    names: Vec<String>,
    columns: Vec<Vec<String>>,
    index: BTreeMap<String, usize>,
    height: usize,
}

/// Converts a zero-based row position into the 1-based number shown to users.
pub fn row_number(position: usize) -> usize {
    position + 1
}

impl Dataset {
    /// Builds a dataset from a header and row-major records.
    pub fn new<H, R, V>(headers: H, rows: R) -> Result<Self>
    where
        H: IntoIterator,
        H::Item: Into<String>,
        R: IntoIterator<Item = V>,
        V: IntoIterator,
        V::Item: Into<String>,
    {
        let names: Vec<String> = headers.into_iter().map(Into::into).collect();
        let index = build_index(&names)?;
        let mut columns: Vec<Vec<String>> = vec![Vec::new(); names.len()];
        let mut height = 0;
        for (row_idx, row) in rows.into_iter().enumerate() {
            let values: Vec<String> = row.into_iter().map(Into::into).collect();
            if values.len() != names.len() {
                return Err(QaError::RowWidth {
                    row: row_number(row_idx),
                    found: values.len(),
                    expected: names.len(),
                });
            }
            for (column, value) in columns.iter_mut().zip(values) {
                column.push(value);
            }
            height += 1;
        }
        Ok(Self {
            names,
            columns,
            index,
            height,
        })
    }

    /// Builds a dataset from a Polars frame, rendering every cell as text.
    ///
    /// Nulls become empty strings.
    pub fn from_frame(df: &DataFrame) -> Result<Self> {
        let height = df.height();
        let mut names = Vec::with_capacity(df.width());
        let mut columns = Vec::with_capacity(df.width());
        for column in df.get_columns() {
            names.push(column.name().to_string());
            let mut values = Vec::with_capacity(height);
            for idx in 0..height {
                let value = column.get(idx).unwrap_or(AnyValue::Null);
                values.push(any_to_string(value));
            }
            columns.push(values);
        }
        let index = build_index(&names)?;
        Ok(Self {
            names,
            columns,
            index,
            height,
        })
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn width(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.height == 0
    }

    /// Column names in file order.
    pub fn column_names(&self) -> &[String] {
        &self.names
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// All values of a column, or `None` if the column is absent.
    pub fn column(&self, name: &str) -> Option<&[String]> {
        self.index
            .get(name)
            .map(|&idx| self.columns[idx].as_slice())
    }

    /// A single cell. Absent columns and out-of-range rows read as `None`.
    pub fn value(&self, name: &str, row: usize) -> Option<&str> {
        self.column(name)
            .and_then(|values| values.get(row))
            .map(String::as_str)
    }

    /// Cell value with absent columns read as the empty string.
    pub fn value_or_empty(&self, name: &str, row: usize) -> &str {
        self.value(name, row).unwrap_or("")
    }

    /// All cells of one row, in column order.
    pub fn row_values(&self, row: usize) -> Vec<&str> {
        self.columns
            .iter()
            .map(|values| values.get(row).map_or("", String::as_str))
            .collect()
    }

    /// Returns the first column in `candidates` that is present.
    pub fn first_present<'a>(&self, candidates: &[&'a str]) -> Option<&'a str> {
        candidates.iter().copied().find(|name| self.has_column(name))
    }
}

fn build_index(names: &[String]) -> Result<BTreeMap<String, usize>> {
    let mut index = BTreeMap::new();
    for (idx, name) in names.iter().enumerate() {
        if index.insert(name.clone(), idx).is_some() {
            return Err(QaError::DuplicateColumn {
                column: name.clone(),
            });
        }
    }
    Ok(index)
}

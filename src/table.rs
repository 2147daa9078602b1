use std::cmp::Ordering;

use rayon::prelude::*;

/// Ordered list of column keys. Drives both the field order of parsed
/// records and the column order of the rendered table.
#[derive(Debug, Clone, PartialEq)]
pub struct Schema {
    keys: Vec<String>,
}

impl Schema {
    /// Returns `None` for an empty key list, a table needs at least one column.
    pub fn new<I, S>(keys: I) -> Option<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let keys: Vec<String> = keys.into_iter().map(Into::into).collect();
        if keys.is_empty() { None } else { Some(Self { keys }) }
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    pub fn key(&self, idx: usize) -> Option<&str> {
        self.keys.get(idx).map(String::as_str)
    }

    pub fn position(&self, key: &str) -> Option<usize> {
        self.keys.iter().position(|k| k == key)
    }
}

/// One row of the song list. Holds exactly one value per schema column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    values: Vec<String>,
}

impl Record {
    /// Builds a record if `values` matches the schema width, no partial records.
    pub fn from_values(schema: &Schema, values: Vec<String>) -> Option<Self> {
        if values.len() == schema.len() {
            Some(Self { values })
        } else {
            None
        }
    }

    /// Value of the column named `key`.
    pub fn get(&self, schema: &Schema, key: &str) -> Option<&str> {
        schema
            .position(key)
            .and_then(|idx| self.values.get(idx))
            .map(String::as_str)
    }

    pub fn value(&self, idx: usize) -> &str {
        &self.values[idx]
    }

    pub fn values(&self) -> &[String] {
        &self.values
    }

    fn contains_lowercase(&self, schema: &Schema, query: &str) -> bool {
        self.values[..schema.len()]
            .iter()
            .any(|v| v.to_lowercase().contains(query))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

impl SortDirection {
    pub fn flip(self) -> Self {
        match self {
            SortDirection::Ascending => SortDirection::Descending,
            SortDirection::Descending => SortDirection::Ascending,
        }
    }

    /// +1 for ascending, -1 for descending.
    pub fn sign(self) -> i8 {
        match self {
            SortDirection::Ascending => 1,
            SortDirection::Descending => -1,
        }
    }

    fn apply(self, ordering: Ordering) -> Ordering {
        match self {
            SortDirection::Ascending => ordering,
            SortDirection::Descending => ordering.reverse(),
        }
    }
}

/// Active sort column (schema index) and direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SortState {
    pub column: usize,
    pub direction: SortDirection,
}

impl SortState {
    /// Header click: same column flips the direction, another column becomes
    /// active in ascending order.
    pub fn click(&mut self, column: usize) {
        if column == self.column {
            self.direction = self.direction.flip();
        } else {
            self.column = column;
            self.direction = SortDirection::Ascending;
        }
    }
}

/// Keeps records where any schema field contains `query`, ignoring case.
/// Relative order is preserved and an empty query keeps everything.
pub fn filter(records: &[Record], schema: &Schema, query: &str) -> Vec<Record> {
    let query = query.to_lowercase();
    records
        .par_iter()
        .filter(|r| r.contains_lowercase(schema, &query))
        .cloned()
        .collect()
}

/// Orders records by the lower-cased value of the active column.
pub fn sort(records: &[Record], state: &SortState) -> Vec<Record> {
    let mut sorted = records.to_vec();
    sorted.sort_by(|a, b| {
        let lhs = a.value(state.column).to_lowercase();
        let rhs = b.value(state.column).to_lowercase();
        state.direction.apply(lhs.cmp(&rhs))
    });
    sorted
}

//! Membership roster loading.

use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, info};

use crate::error::RosterLoadError;
use crate::parser::{Table, read_table};

/// Member id to name mapping.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Roster {
    members: HashMap<i64, String>,
}

impl Roster {
    pub fn name(&self, id: i64) -> Option<&str> {
        self.members.get(&id).map(String::as_str)
    }

    pub fn contains(&self, id: i64) -> bool {
        self.members.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Inserts a member, replacing any earlier name for the same id.
    pub fn insert(&mut self, id: i64, name: impl Into<String>) -> Option<String> {
        self.members.insert(id, name.into())
    }
}

impl<S: Into<String>> FromIterator<(i64, S)> for Roster {
    fn from_iter<T: IntoIterator<Item = (i64, S)>>(iter: T) -> Self {
        let mut roster = Roster::default();
        for (id, name) in iter {
            roster.insert(id, name);
        }
        roster
    }
}

/// Loads the roster at `path`.
///
/// The file has a header row; the first two columns are read as id and name
/// whatever their headings say. Later rows win over earlier rows with the same
/// id.
///
/// # Errors
///
/// Fails if the file cannot be read, has no name column, or an id cell is
/// not an integer.
#[tracing::instrument(fields(file = %path.display()))]
pub fn load_roster(path: &Path) -> Result<Roster, RosterLoadError> {
    let table = read_table(path, true).map_err(|source| RosterLoadError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    table
        .require_columns(2)
        .map_err(|source| RosterLoadError::Shape {
            path: path.to_path_buf(),
            source,
        })?;

    let mut roster = Roster::default();
    for (index, row) in table.rows.iter().enumerate() {
        let id_cell = Table::cell(row, 0);
        let name_cell = Table::cell(row, 1);
        if id_cell.is_empty() && name_cell.is_empty() {
            continue;
        }

        // +2: one for the header, one for 1-based numbering
        let line = index + 2;
        let id = id_cell.as_integer().ok_or_else(|| RosterLoadError::InvalidId {
            row: line,
            value: id_cell.as_text(),
        })?;

        if let Some(previous) = roster.insert(id, name_cell.as_text()) {
            debug!(id, previous = %previous, row = line, "Duplicate roster id, keeping later row");
        }
    }

    info!(members = roster.len(), "Roster loaded");
    Ok(roster)
}

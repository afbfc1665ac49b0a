//! Repeating sub-records for field-group fields.
//!
//! A field-group cell is a list of entries, each a full form over the nested
//! table's schema. Entries recurse: a nested table may itself contain group
//! fields, and the same expansion applies at every level.

use crate::codec::CodecError;
use crate::form::FormState;
use tablekit_protocol::{Row, RowId};
use tablekit_schema::{SchemaCatalog, Table};

/// One sub-record inside a field-group cell.
///
/// `row_id` is present for entries loaded from storage and absent for
/// entries added in this editing session; callers use it to decide whether
/// removing the entry also requires a remote delete.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupEntry {
    pub row_id: Option<RowId>,
    pub form: FormState,
}

impl GroupEntry {
    /// A fresh, empty entry over the nested table's schema.
    pub fn blank(table: &Table) -> Self {
        Self {
            row_id: None,
            form: FormState::new(table),
        }
    }

    /// An entry backed by a stored nested row.
    pub fn from_row(table: &Table, catalog: &SchemaCatalog, row: &Row) -> Self {
        Self {
            row_id: Some(row.id.clone()),
            form: FormState::from_row(table, catalog, row),
        }
    }

    /// An entry with no value in any field. Blank entries are tolerated
    /// individually but a required group must have at least one non-blank.
    pub fn is_blank(&self) -> bool {
        self.form.is_blank()
    }

    /// Serialize back to a nested row. New entries mint their id here.
    pub fn wire_row(&self) -> Result<Row, CodecError> {
        let mut row = Row::new();
        if let Some(id) = &self.row_id {
            row.id = id.clone();
        }
        row.values = self.form.wire_values()?;
        Ok(row)
    }
}

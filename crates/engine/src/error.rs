use std::fmt;

use coldiff_api::DiffError;
use coldiff_types::{FieldId, RecordId};
use serde_json::Value;
use thiserror::Error;

use crate::host::HostError;

/// Which of the three form inputs a column position came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnRole {
    Source,
    Target,
    Diff,
}

impl fmt::Display for ColumnRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Source => "source",
            Self::Target => "target",
            Self::Diff => "diff",
        })
    }
}

/// Everything that can stop a comparison run.
#[derive(Debug, Error)]
pub enum RunError {
    /// A form value is not a JSON number.
    #[error("index values must be numbers ({key} = {value})")]
    InvalidInput { key: String, value: Value },

    /// A column position with no field behind it, raised where the field id
    /// is first needed.
    #[error("field id is undefined: {role} column position {position} is outside the visible field list")]
    UndefinedField { role: ColumnRole, position: String },

    #[error("record {record_id} has no value in field {field_id}")]
    MissingCell { field_id: FieldId, record_id: RecordId },

    #[error("cell ({field_id}, {record_id}) is a {kind}, not a list")]
    NotText {
        field_id: FieldId,
        record_id: RecordId,
        kind: &'static str,
    },

    #[error(transparent)]
    Host(#[from] HostError),

    #[error(transparent)]
    Diff(#[from] DiffError),
}

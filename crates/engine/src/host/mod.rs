//! Capability set the comparison needs from the table application.
//!
//! The host owns every table, view and record. Coldiff only borrows handles
//! for the duration of one form submission and never caches what it reads.
//!
//! - [`Base`]: selection and active table lookup
//! - [`Table`]: view lookup, record fetch, cell write
//! - [`View`]: visible record and field order

mod local;

pub use local::{FieldSnapshot, LocalBase, LocalTable, LocalView, Snapshot, TableSnapshot, ViewSnapshot};

use async_trait::async_trait;
use coldiff_types::{CellValue, FieldId, Record, RecordId, Selection, TableId, ViewId};
use thiserror::Error;

/// Errors raised by host accessors.
#[derive(Debug, Error)]
pub enum HostError {
    #[error("no active table is selected")]
    NoActiveTable,

    #[error("no view is selected")]
    NoSelectedView,

    #[error("table not found: {0}")]
    TableNotFound(TableId),

    #[error("view not found: {0}")]
    ViewNotFound(ViewId),

    #[error("record not found: {0}")]
    RecordNotFound(RecordId),

    #[error("field not found: {0}")]
    FieldNotFound(FieldId),

    #[error("snapshot I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("snapshot serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Entry point into the host: what the user currently has selected.
#[async_trait]
pub trait Base: Send + Sync {
    type Table: Table;

    async fn get_selection(&self) -> Result<Selection, HostError>;

    async fn get_active_table(&self) -> Result<Self::Table, HostError>;
}

#[async_trait]
pub trait Table: Send + Sync {
    type View: View;

    fn id(&self) -> &TableId;

    async fn get_view_by_id(&self, view_id: &ViewId) -> Result<Self::View, HostError>;

    async fn get_record_by_id(&self, record_id: &RecordId) -> Result<Record, HostError>;

    /// Replace the value stored at (`field_id`, `record_id`).
    async fn set_cell_value(&self, field_id: &FieldId, record_id: &RecordId, value: CellValue) -> Result<(), HostError>;
}

/// A filtered and sorted presentation of a table. Lists come back in the
/// order the host renders them.
#[async_trait]
pub trait View: Send + Sync {
    fn id(&self) -> &ViewId;

    async fn get_visible_record_id_list(&self) -> Result<Vec<RecordId>, HostError>;

    async fn get_visible_field_id_list(&self) -> Result<Vec<FieldId>, HostError>;
}

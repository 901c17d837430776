//! # Coldiff Engine
//!
//! Compares two columns of the host's selected view row by row. For every
//! visible record the engine reads the source and modified cell text, asks a
//! [`coldiff_api::DiffService`] for a diff link, and writes that link as a URL
//! cell into the destination column.
//!
//! ## Architecture
//!
//! - **`host`**: capability traits for the table application plus a
//!   file-backed implementation
//! - **`selection`**: active table/view resolution and visible layout
//! - **`cells`**: text extraction from list cells
//! - **`compare`**: column resolution and the sequential per-record loop
//! - **`report`**: caller-supplied progress/failure reporting
//! - **`ui`**: form rendering and submit handling

pub mod cells;
pub mod compare;
pub mod error;
pub mod host;
pub mod report;
pub mod selection;
pub mod ui;

pub use cells::get_cell_value;
pub use compare::{
    ColumnIndices, CompareOptions, CompareSummary, FieldSlot, PlannedRequest, ResolvedColumns, WrittenLink, compare_columns,
    plan_requests,
};
pub use error::{ColumnRole, RunError};
pub use host::{Base, HostError, LocalBase, Snapshot, Table, View};
pub use report::{MemoryReporter, Reporter, RunEvent, TracingReporter};
pub use selection::{SelectedTable, VisibleLayout, get_record_ids_and_field_ids, get_selected_table_and_view};
pub use ui::{UiSurface, handle_submission, render_form};

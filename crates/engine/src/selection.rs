//! Resolving what the user is looking at.

use coldiff_types::{FieldId, RecordId};
use tracing::debug;

use crate::host::{Base, HostError, Table, View};

/// The active table together with the selected view on it.
pub struct SelectedTable<T: Table> {
    pub table: T,
    pub view: T::View,
}

/// Visible rows and columns of a view, in rendered order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VisibleLayout {
    pub record_ids: Vec<RecordId>,
    pub field_ids: Vec<FieldId>,
}

/// Read the host selection and resolve its table and view.
///
/// Nothing is guarded locally: a missing table or view surfaces as the
/// host's error.
pub async fn get_selected_table_and_view<B: Base>(base: &B) -> Result<SelectedTable<B::Table>, HostError> {
    let selection = base.get_selection().await?;
    let table = base.get_active_table().await?;
    let view_id = selection.view_id.ok_or(HostError::NoSelectedView)?;
    let view = table.get_view_by_id(&view_id).await?;
    debug!(table_id = %table.id(), %view_id, "selection resolved");
    Ok(SelectedTable { table, view })
}

/// Visible record ids and field ids of `view`, filters and sorts applied.
pub async fn get_record_ids_and_field_ids<V: View>(view: &V) -> Result<VisibleLayout, HostError> {
    let record_ids = view.get_visible_record_id_list().await?;
    let field_ids = view.get_visible_field_id_list().await?;
    Ok(VisibleLayout { record_ids, field_ids })
}

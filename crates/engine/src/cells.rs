//! Reading text out of cells.

use coldiff_types::{FieldId, RecordId};
use tracing::debug;

use crate::error::RunError;
use crate::host::Table;

/// Fetch `record_id` and return the text of its `field_id` cell.
///
/// The cell must be a list; the `text` of its items is joined in host order
/// with no separator, and items without text add nothing. A cell that is not
/// a list, or no value at all, is an error. Nothing is coerced.
pub async fn get_cell_value<T>(table: &T, field_id: &FieldId, record_id: &RecordId) -> Result<String, RunError>
where
    T: Table + ?Sized,
{
    let record = table.get_record_by_id(record_id).await?;
    debug!(%record_id, %field_id, field_count = record.fields.len(), "record fetched");

    let cell = record.fields.get(field_id).ok_or_else(|| RunError::MissingCell {
        field_id: field_id.clone(),
        record_id: record_id.clone(),
    })?;
    cell.joined_text().ok_or_else(|| RunError::NotText {
        field_id: field_id.clone(),
        record_id: record_id.clone(),
        kind: cell.kind_name(),
    })
}

//! Column comparison: the per-record read, diff, write loop.
//!
//! Column positions index the view's *visible* field list. They are not
//! bounds-checked when resolved; a position with no field behind it only
//! fails once the run needs that field id. Records are processed strictly one
//! after another, and the first error stops the run. Cells written before the
//! failure stay written.

use coldiff_api::DiffService;
use coldiff_types::form::{DIFF_IDX_KEY, SRC_IDX_KEY, TARGET_IDX_KEY};
use coldiff_types::{CellValue, DEFAULT_LINK_LABEL, DiffRequest, FieldId, RecordId, TableId, ViewId};
use coldiff_util::char_len;
use serde::Serialize;
use serde_json::{Map, Number, Value};
use tracing::debug;

use crate::cells::get_cell_value;
use crate::error::{ColumnRole, RunError};
use crate::host::{Base, Table, View};
use crate::report::{Reporter, RunEvent};
use crate::selection::{get_record_ids_and_field_ids, get_selected_table_and_view};

/// The three numeric form inputs, validated as numbers but not as positions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnIndices {
    pub src: Number,
    pub target: Number,
    pub diff: Number,
}

impl ColumnIndices {
    pub fn new(src: u64, target: u64, diff: u64) -> Self {
        Self {
            src: src.into(),
            target: target.into(),
            diff: diff.into(),
        }
    }

    /// Pull `srcIdx`, `targetIdx` and `diffIdx` out of submitted form values.
    /// Each must be a JSON number; a missing key counts as not a number.
    pub fn from_form_values(values: &Map<String, Value>) -> Result<Self, RunError> {
        let number = |key: &str| match values.get(key) {
            Some(Value::Number(number)) => Ok(number.clone()),
            other => Err(RunError::InvalidInput {
                key: key.to_string(),
                value: other.cloned().unwrap_or(Value::Null),
            }),
        };
        Ok(Self {
            src: number(SRC_IDX_KEY)?,
            target: number(TARGET_IDX_KEY)?,
            diff: number(DIFF_IDX_KEY)?,
        })
    }
}

/// A column position and the field id found there, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSlot {
    pub role: ColumnRole,
    pub position: Number,
    pub field_id: Option<FieldId>,
}

impl FieldSlot {
    /// Look `position` up in `field_ids`. Negative, fractional and
    /// out-of-range positions leave the slot empty.
    pub fn resolve(role: ColumnRole, position: &Number, field_ids: &[FieldId]) -> Self {
        let field_id = list_index(position).and_then(|index| field_ids.get(index)).cloned();
        Self {
            role,
            position: position.clone(),
            field_id,
        }
    }

    /// The field id, or [`RunError::UndefinedField`] for an empty slot.
    pub fn field_id(&self) -> Result<&FieldId, RunError> {
        self.field_id.as_ref().ok_or_else(|| RunError::UndefinedField {
            role: self.role,
            position: self.position.to_string(),
        })
    }
}

fn list_index(position: &Number) -> Option<usize> {
    if let Some(index) = position.as_u64() {
        return usize::try_from(index).ok();
    }
    // 2.0 addresses the same element as 2
    let value = position.as_f64()?;
    (value >= 0.0 && value.fract() == 0.0 && value <= usize::MAX as f64).then_some(value as usize)
}

/// Slots for all three inputs against one visible field list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedColumns {
    pub source: FieldSlot,
    pub target: FieldSlot,
    pub diff: FieldSlot,
}

impl ResolvedColumns {
    pub fn resolve(indices: &ColumnIndices, field_ids: &[FieldId]) -> Self {
        Self {
            source: FieldSlot::resolve(ColumnRole::Source, &indices.src, field_ids),
            target: FieldSlot::resolve(ColumnRole::Target, &indices.target, field_ids),
            diff: FieldSlot::resolve(ColumnRole::Diff, &indices.diff, field_ids),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompareOptions {
    /// Display text of every URL cell written.
    pub link_label: String,
}

impl Default for CompareOptions {
    fn default() -> Self {
        Self {
            link_label: DEFAULT_LINK_LABEL.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WrittenLink {
    pub record_id: RecordId,
    pub link: String,
}

/// Outcome of a run that reached the last record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompareSummary {
    pub table_id: TableId,
    pub view_id: ViewId,
    pub written: Vec<WrittenLink>,
}

/// Compare two columns of the selected view row by row and write one diff
/// link per row into the destination column.
///
/// Errors are reported through `reporter` and returned. The run does not
/// continue past the first failing record.
pub async fn compare_columns<B, D, R>(
    base: &B,
    diff_service: &D,
    reporter: &R,
    indices: &ColumnIndices,
    options: &CompareOptions,
) -> Result<CompareSummary, RunError>
where
    B: Base,
    D: DiffService + ?Sized,
    R: Reporter + ?Sized,
{
    let mut written = Vec::new();
    match run(base, diff_service, reporter, indices, options, &mut written).await {
        Ok((table_id, view_id)) => {
            reporter.report(RunEvent::Finished { processed: written.len() });
            Ok(CompareSummary {
                table_id,
                view_id,
                written,
            })
        }
        Err(error) => {
            reporter.report(RunEvent::Failed {
                error: &error,
                processed: written.len(),
            });
            Err(error)
        }
    }
}

async fn run<B, D, R>(
    base: &B,
    diff_service: &D,
    reporter: &R,
    indices: &ColumnIndices,
    options: &CompareOptions,
    written: &mut Vec<WrittenLink>,
) -> Result<(TableId, ViewId), RunError>
where
    B: Base,
    D: DiffService + ?Sized,
    R: Reporter + ?Sized,
{
    let selected = get_selected_table_and_view(base).await?;
    let layout = get_record_ids_and_field_ids(&selected.view).await?;
    let columns = ResolvedColumns::resolve(indices, &layout.field_ids);
    let table = &selected.table;
    reporter.report(RunEvent::Started {
        table_id: table.id(),
        view_id: selected.view.id(),
        records: layout.record_ids.len(),
        fields: layout.field_ids.len(),
    });

    for record_id in &layout.record_ids {
        let original = get_cell_value(table, columns.source.field_id()?, record_id).await?;
        let modified = get_cell_value(table, columns.target.field_id()?, record_id).await?;
        debug!(
            %record_id,
            original_chars = char_len(&original),
            modified_chars = char_len(&modified),
            "cells read"
        );

        let link = diff_service.compare(&DiffRequest { original, modified }).await?;

        let value = CellValue::url(options.link_label.as_str(), link.as_str());
        table.set_cell_value(columns.diff.field_id()?, record_id, value).await?;
        reporter.report(RunEvent::RecordCompared {
            record_id,
            link: &link,
        });
        written.push(WrittenLink {
            record_id: record_id.clone(),
            link,
        });
    }

    Ok((table.id().clone(), selected.view.id().clone()))
}

/// A request [`compare_columns`] would send, computed without any HTTP call
/// or cell write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlannedRequest {
    pub record_id: RecordId,
    /// Destination field; `None` when the diff position has no field.
    pub diff_field_id: Option<FieldId>,
    pub request: DiffRequest,
}

/// Read every visible record the way [`compare_columns`] does and return the
/// payloads it would post. Stops at the first read failure.
pub async fn plan_requests<B: Base>(base: &B, indices: &ColumnIndices) -> Result<Vec<PlannedRequest>, RunError> {
    let selected = get_selected_table_and_view(base).await?;
    let layout = get_record_ids_and_field_ids(&selected.view).await?;
    let columns = ResolvedColumns::resolve(indices, &layout.field_ids);

    let mut planned = Vec::with_capacity(layout.record_ids.len());
    for record_id in layout.record_ids {
        let original = get_cell_value(&selected.table, columns.source.field_id()?, &record_id).await?;
        let modified = get_cell_value(&selected.table, columns.target.field_id()?, &record_id).await?;
        planned.push(PlannedRequest {
            record_id,
            diff_field_id: columns.diff.field_id.clone(),
            request: DiffRequest { original, modified },
        });
    }
    Ok(planned)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fields() -> Vec<FieldId> {
        ["f0", "f1", "f2", "f3"].into_iter().map(FieldId::from).collect()
    }

    #[test]
    fn form_values_must_be_numbers() {
        let values = json!({ "srcIdx": 1, "targetIdx": "2", "diffIdx": 3 });
        let error = ColumnIndices::from_form_values(values.as_object().unwrap()).expect_err("string index");
        match error {
            RunError::InvalidInput { key, value } => {
                assert_eq!(key, "targetIdx");
                assert_eq!(value, json!("2"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn missing_form_value_is_not_a_number() {
        let values = json!({ "srcIdx": 1, "targetIdx": 2 });
        let error = ColumnIndices::from_form_values(values.as_object().unwrap()).expect_err("missing diffIdx");
        assert!(matches!(error, RunError::InvalidInput { ref key, value: Value::Null } if key == "diffIdx"));
    }

    #[test]
    fn numeric_form_values_are_accepted_unchecked() {
        let values = json!({ "srcIdx": 1, "targetIdx": -4, "diffIdx": 99 });
        let indices = ColumnIndices::from_form_values(values.as_object().unwrap()).unwrap();
        assert_eq!(indices.target, Number::from(-4));
        assert_eq!(indices.diff, Number::from(99));
    }

    #[test]
    fn positions_resolve_against_visible_fields() {
        let columns = ResolvedColumns::resolve(&ColumnIndices::new(1, 2, 3), &fields());
        assert_eq!(columns.source.field_id().unwrap().as_str(), "f1");
        assert_eq!(columns.target.field_id().unwrap().as_str(), "f2");
        assert_eq!(columns.diff.field_id().unwrap().as_str(), "f3");
    }

    #[test]
    fn integral_floats_address_the_same_field() {
        let position = Number::from_f64(2.0).unwrap();
        let slot = FieldSlot::resolve(ColumnRole::Target, &position, &fields());
        assert_eq!(slot.field_id.as_ref().map(FieldId::as_str), Some("f2"));
    }

    #[test]
    fn unusable_positions_leave_the_slot_empty_until_used() {
        let cases = [Number::from(99), Number::from(-1), Number::from_f64(1.5).unwrap()];
        for position in cases {
            let slot = FieldSlot::resolve(ColumnRole::Diff, &position, &fields());
            assert!(slot.field_id.is_none(), "{position}");
            let error = slot.field_id().expect_err("empty slot");
            assert!(matches!(error, RunError::UndefinedField { role: ColumnRole::Diff, .. }));
        }
    }
}

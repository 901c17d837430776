use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use coldiff_api::{DiffError, DiffService, StatusCode};
use coldiff_engine::host::{LocalTable, LocalView};
use coldiff_engine::{
    Base, ColumnIndices, ColumnRole, CompareOptions, HostError, LocalBase, MemoryReporter, RunError, Snapshot, Table,
    compare_columns, handle_submission, plan_requests,
};
use coldiff_types::{CellValue, DiffRequest, FieldId, FormSubmission, Record, RecordId, Selection, TableId, ViewId};
use serde_json::json;

type Journal = Arc<Mutex<Vec<String>>>;

fn note(journal: &Journal, line: String) {
    journal.lock().unwrap().push(line);
}

/// Host wrapper that journals every record read and cell write.
struct JournalingBase {
    inner: LocalBase,
    journal: Journal,
}

struct JournalingTable {
    inner: LocalTable,
    journal: Journal,
}

#[async_trait]
impl Base for JournalingBase {
    type Table = JournalingTable;

    async fn get_selection(&self) -> Result<Selection, HostError> {
        self.inner.get_selection().await
    }

    async fn get_active_table(&self) -> Result<JournalingTable, HostError> {
        Ok(JournalingTable {
            inner: self.inner.get_active_table().await?,
            journal: Arc::clone(&self.journal),
        })
    }
}

#[async_trait]
impl Table for JournalingTable {
    type View = LocalView;

    fn id(&self) -> &TableId {
        self.inner.id()
    }

    async fn get_view_by_id(&self, view_id: &ViewId) -> Result<LocalView, HostError> {
        self.inner.get_view_by_id(view_id).await
    }

    async fn get_record_by_id(&self, record_id: &RecordId) -> Result<Record, HostError> {
        note(&self.journal, format!("read {record_id}"));
        self.inner.get_record_by_id(record_id).await
    }

    async fn set_cell_value(&self, field_id: &FieldId, record_id: &RecordId, value: CellValue) -> Result<(), HostError> {
        note(&self.journal, format!("write {field_id} {record_id}"));
        self.inner.set_cell_value(field_id, record_id, value).await
    }
}

/// Diff service answering from a script, journaling each payload.
struct ScriptedDiff {
    replies: Mutex<VecDeque<Result<String, DiffError>>>,
    journal: Journal,
}

#[async_trait]
impl DiffService for ScriptedDiff {
    async fn compare(&self, request: &DiffRequest) -> Result<String, DiffError> {
        note(&self.journal, format!("diff {}|{}", request.original, request.modified));
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok("https://x/d/unscripted".to_string()))
    }
}

struct Fixture {
    base: JournalingBase,
    local: LocalBase,
    diff: ScriptedDiff,
    journal: Journal,
}

fn fixture(replies: Vec<Result<String, DiffError>>) -> Fixture {
    let snapshot: Snapshot = serde_json::from_value(json!({
        "selection": { "table_id": "tbl", "view_id": "grid" },
        "tables": [{
            "id": "tbl",
            "fields": [{ "id": "f0" }, { "id": "f1" }, { "id": "f2" }, { "id": "f3" }],
            "views": [{
                "id": "grid",
                "visible_field_ids": ["f0", "f1", "f2", "f3"],
                "visible_record_ids": ["r1", "r2"]
            }],
            "records": [
                {
                    "record_id": "r1",
                    "fields": {
                        "f1": [{ "type": "text", "text": "hel" }, { "type": "text", "text": "lo" }],
                        "f2": [{ "type": "text", "text": "world" }]
                    }
                },
                {
                    "record_id": "r2",
                    "fields": {
                        "f1": [{ "type": "text", "text": "foo" }],
                        "f2": [{ "type": "text", "text": "bar" }]
                    }
                }
            ]
        }]
    }))
    .expect("fixture snapshot");

    let local = LocalBase::from_snapshot(snapshot);
    let journal: Journal = Arc::default();
    Fixture {
        base: JournalingBase {
            inner: local.clone(),
            journal: Arc::clone(&journal),
        },
        local,
        diff: ScriptedDiff {
            replies: Mutex::new(replies.into()),
            journal: Arc::clone(&journal),
        },
        journal,
    }
}

fn cell(local: &LocalBase, record: usize, field: &str) -> Option<CellValue> {
    local.snapshot().tables[0].records[record].fields.get(&FieldId::from(field)).cloned()
}

fn failure() -> DiffError {
    DiffError::Status {
        status: StatusCode::SERVICE_UNAVAILABLE,
        body: "unavailable".to_string(),
    }
}

#[tokio::test]
async fn writes_each_link_before_moving_to_the_next_record() {
    let fixture = fixture(vec![Ok("https://x/d/1".into()), Ok("https://x/d/2".into())]);
    let reporter = MemoryReporter::new();

    let summary = compare_columns(
        &fixture.base,
        &fixture.diff,
        &reporter,
        &ColumnIndices::new(1, 2, 3),
        &CompareOptions::default(),
    )
    .await
    .expect("run succeeds");

    assert_eq!(
        *fixture.journal.lock().unwrap(),
        vec![
            "read r1",
            "read r1",
            "diff hello|world",
            "write f3 r1",
            "read r2",
            "read r2",
            "diff foo|bar",
            "write f3 r2",
        ]
    );
    assert_eq!(cell(&fixture.local, 0, "f3"), Some(CellValue::url("对比结果", "https://x/d/1")));
    assert_eq!(cell(&fixture.local, 1, "f3"), Some(CellValue::url("对比结果", "https://x/d/2")));
    assert_eq!(summary.written.len(), 2);
    assert_eq!(summary.table_id.as_str(), "tbl");
    assert_eq!(summary.view_id.as_str(), "grid");
    assert_eq!(reporter.lines().last().map(String::as_str), Some("finished processed=2"));
}

#[tokio::test]
async fn first_diff_failure_stops_the_run() {
    let fixture = fixture(vec![Err(failure())]);
    let reporter = MemoryReporter::new();

    let error = compare_columns(
        &fixture.base,
        &fixture.diff,
        &reporter,
        &ColumnIndices::new(1, 2, 3),
        &CompareOptions::default(),
    )
    .await
    .expect_err("diff failure propagates");

    assert!(matches!(error, RunError::Diff(_)), "{error:?}");
    let journal = fixture.journal.lock().unwrap().clone();
    assert_eq!(journal, vec!["read r1", "read r1", "diff hello|world"]);
    assert!(!journal.iter().any(|line| line.contains("r2")));
    assert_eq!(cell(&fixture.local, 0, "f3"), None);
    assert!(reporter.lines().last().unwrap().starts_with("failed after 0:"));
}

#[tokio::test]
async fn earlier_writes_survive_a_later_failure() {
    let fixture = fixture(vec![Ok("https://x/d/1".into()), Err(failure())]);

    let result = compare_columns(
        &fixture.base,
        &fixture.diff,
        &MemoryReporter::new(),
        &ColumnIndices::new(1, 2, 3),
        &CompareOptions::default(),
    )
    .await;

    assert!(result.is_err());
    assert_eq!(cell(&fixture.local, 0, "f3"), Some(CellValue::url("对比结果", "https://x/d/1")));
    assert_eq!(cell(&fixture.local, 1, "f3"), None);
}

#[tokio::test]
async fn out_of_range_destination_fails_where_the_field_is_used() {
    let fixture = fixture(vec![Ok("https://x/d/1".into())]);

    let error = compare_columns(
        &fixture.base,
        &fixture.diff,
        &MemoryReporter::new(),
        &ColumnIndices::new(1, 2, 99),
        &CompareOptions::default(),
    )
    .await
    .expect_err("no field at position 99");

    assert!(
        matches!(error, RunError::UndefinedField { role: ColumnRole::Diff, ref position } if position == "99"),
        "{error:?}"
    );
    // Reads and the POST for r1 already happened; only the write could not.
    assert_eq!(*fixture.journal.lock().unwrap(), vec!["read r1", "read r1", "diff hello|world"]);
}

#[tokio::test]
async fn out_of_range_source_fails_before_any_request() {
    let fixture = fixture(vec![Ok("https://x/d/1".into())]);
    let reporter = MemoryReporter::new();

    let error = compare_columns(
        &fixture.base,
        &fixture.diff,
        &reporter,
        &ColumnIndices::new(99, 2, 3),
        &CompareOptions::default(),
    )
    .await
    .expect_err("no field at position 99");

    assert!(
        matches!(error, RunError::UndefinedField { role: ColumnRole::Source, ref position } if position == "99"),
        "{error:?}"
    );
    assert!(fixture.journal.lock().unwrap().is_empty());
    assert_eq!(cell(&fixture.local, 0, "f3"), None);
    assert!(reporter.lines().last().unwrap().starts_with("failed after 0:"));
}

#[tokio::test]
async fn non_numeric_input_fails_before_any_request() {
    let fixture = fixture(vec![]);
    let reporter = MemoryReporter::new();
    let mut surface: Vec<String> = Vec::new();
    let submission = FormSubmission {
        key: "对比".to_string(),
        values: json!({ "srcIdx": "one", "targetIdx": 2, "diffIdx": 3 })
            .as_object()
            .cloned()
            .unwrap(),
    };

    let error = handle_submission(
        &mut surface,
        &submission,
        &fixture.base,
        &fixture.diff,
        &reporter,
        &CompareOptions::default(),
    )
    .await
    .expect_err("string index");

    assert!(matches!(error, RunError::InvalidInput { ref key, .. } if key == "srcIdx"));
    assert!(fixture.journal.lock().unwrap().is_empty());
    assert_eq!(surface, vec!["你点击了**对比**按钮"]);
    assert_eq!(reporter.lines()[0], "clicked 对比");
    assert!(reporter.lines()[1].starts_with("failed after 0: index values must be numbers"));
}

#[tokio::test]
async fn submission_with_defaults_runs_the_comparison() {
    let fixture = fixture(vec![Ok("https://x/d/1".into()), Ok("https://x/d/2".into())]);
    let submission = FormSubmission {
        key: "对比".to_string(),
        values: coldiff_types::FormSpec::compare().default_values(),
    };
    let options = CompareOptions {
        link_label: "diff".to_string(),
    };

    let summary = handle_submission(
        &mut Vec::<String>::new(),
        &submission,
        &fixture.base,
        &fixture.diff,
        &MemoryReporter::new(),
        &options,
    )
    .await
    .expect("run succeeds");

    assert_eq!(summary.written[1].link, "https://x/d/2");
    assert_eq!(cell(&fixture.local, 1, "f3"), Some(CellValue::url("diff", "https://x/d/2")));
}

#[tokio::test]
async fn planning_reads_cells_without_posting_or_writing() {
    let fixture = fixture(vec![]);

    let planned = plan_requests(&fixture.base, &ColumnIndices::new(1, 2, 3)).await.expect("plan");

    assert_eq!(planned.len(), 2);
    assert_eq!(planned[0].request, DiffRequest::new("hello", "world"));
    assert_eq!(planned[1].diff_field_id, Some(FieldId::from("f3")));
    let journal = fixture.journal.lock().unwrap();
    assert!(journal.iter().all(|line| line.starts_with("read")), "{journal:?}");
}

#[tokio::test]
async fn demo_snapshot_plans_one_request_per_visible_record() {
    let snapshot: Snapshot =
        serde_json::from_str(include_str!("../../../demos/snapshot.json")).expect("demo snapshot parses");
    let base = LocalBase::from_snapshot(snapshot);

    let planned = plan_requests(&base, &ColumnIndices::new(1, 2, 3)).await.expect("plan");

    assert_eq!(planned.len(), 2);
    assert_eq!(planned[0].request, DiffRequest::new("Hello, world", "Hello, World!"));
    assert_eq!(planned[1].request, DiffRequest::new("Bye", "Goodbye"));
    assert_eq!(planned[1].diff_field_id, Some(FieldId::from("fldDiff")));
}

//! File-backed host.
//!
//! A [`Snapshot`] is a JSON export of a base: the current selection plus every
//! table with its fields, views and records. [`LocalBase`] serves the host
//! traits from an in-memory copy and can write the (possibly modified) copy
//! back to disk.

use std::fs;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use coldiff_types::{CellValue, FieldId, Record, RecordId, Selection, TableId, ViewId};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{Base, HostError, Table, View};

/// Serialized form of a base.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub selection: Selection,
    #[serde(default)]
    pub tables: Vec<TableSnapshot>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSnapshot {
    pub id: FieldId,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewSnapshot {
    pub id: ViewId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub visible_field_ids: Vec<FieldId>,
    #[serde(default)]
    pub visible_record_ids: Vec<RecordId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableSnapshot {
    pub id: TableId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub fields: Vec<FieldSnapshot>,
    #[serde(default)]
    pub views: Vec<ViewSnapshot>,
    #[serde(default)]
    pub records: Vec<Record>,
}

impl Snapshot {
    fn table(&self, table_id: &TableId) -> Result<&TableSnapshot, HostError> {
        self.tables
            .iter()
            .find(|table| &table.id == table_id)
            .ok_or_else(|| HostError::TableNotFound(table_id.clone()))
    }

    fn table_mut(&mut self, table_id: &TableId) -> Result<&mut TableSnapshot, HostError> {
        self.tables
            .iter_mut()
            .find(|table| &table.id == table_id)
            .ok_or_else(|| HostError::TableNotFound(table_id.clone()))
    }
}

impl TableSnapshot {
    fn view(&self, view_id: &ViewId) -> Result<&ViewSnapshot, HostError> {
        self.views
            .iter()
            .find(|view| &view.id == view_id)
            .ok_or_else(|| HostError::ViewNotFound(view_id.clone()))
    }
}

type SharedSnapshot = Arc<Mutex<Snapshot>>;

fn lock(state: &SharedSnapshot) -> MutexGuard<'_, Snapshot> {
    state.lock().expect("snapshot lock poisoned")
}

/// In-memory host backed by a [`Snapshot`]. Clones share the same data.
#[derive(Debug, Clone, Default)]
pub struct LocalBase {
    state: SharedSnapshot,
}

impl LocalBase {
    pub fn from_snapshot(snapshot: Snapshot) -> Self {
        Self {
            state: Arc::new(Mutex::new(snapshot)),
        }
    }

    /// Read a snapshot file.
    pub fn load(path: &Path) -> Result<Self, HostError> {
        let data = fs::read_to_string(path)?;
        let snapshot: Snapshot = serde_json::from_str(&data)?;
        debug!(path = %path.display(), tables = snapshot.tables.len(), "snapshot loaded");
        Ok(Self::from_snapshot(snapshot))
    }

    /// Write the current state back, pretty-printed.
    pub fn save(&self, path: &Path) -> Result<(), HostError> {
        let data = serde_json::to_string_pretty(&*lock(&self.state))?;
        if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, data)?;
        debug!(path = %path.display(), "snapshot saved");
        Ok(())
    }

    /// Copy of the current state.
    pub fn snapshot(&self) -> Snapshot {
        lock(&self.state).clone()
    }
}

#[async_trait]
impl Base for LocalBase {
    type Table = LocalTable;

    async fn get_selection(&self) -> Result<Selection, HostError> {
        Ok(lock(&self.state).selection.clone())
    }

    async fn get_active_table(&self) -> Result<LocalTable, HostError> {
        let snapshot = lock(&self.state);
        let table_id = snapshot.selection.table_id.clone().ok_or(HostError::NoActiveTable)?;
        snapshot.table(&table_id)?;
        Ok(LocalTable {
            id: table_id,
            state: Arc::clone(&self.state),
        })
    }
}

/// Handle on one table of a [`LocalBase`].
#[derive(Debug, Clone)]
pub struct LocalTable {
    id: TableId,
    state: SharedSnapshot,
}

#[async_trait]
impl Table for LocalTable {
    type View = LocalView;

    fn id(&self) -> &TableId {
        &self.id
    }

    async fn get_view_by_id(&self, view_id: &ViewId) -> Result<LocalView, HostError> {
        lock(&self.state).table(&self.id)?.view(view_id)?;
        Ok(LocalView {
            table_id: self.id.clone(),
            id: view_id.clone(),
            state: Arc::clone(&self.state),
        })
    }

    async fn get_record_by_id(&self, record_id: &RecordId) -> Result<Record, HostError> {
        lock(&self.state)
            .table(&self.id)?
            .records
            .iter()
            .find(|record| &record.record_id == record_id)
            .cloned()
            .ok_or_else(|| HostError::RecordNotFound(record_id.clone()))
    }

    async fn set_cell_value(&self, field_id: &FieldId, record_id: &RecordId, value: CellValue) -> Result<(), HostError> {
        let mut snapshot = lock(&self.state);
        let table = snapshot.table_mut(&self.id)?;
        if !table.fields.iter().any(|field| &field.id == field_id) {
            return Err(HostError::FieldNotFound(field_id.clone()));
        }
        let record = table
            .records
            .iter_mut()
            .find(|record| &record.record_id == record_id)
            .ok_or_else(|| HostError::RecordNotFound(record_id.clone()))?;
        record.fields.insert(field_id.clone(), value);
        Ok(())
    }
}

/// Handle on one view of a [`LocalTable`].
#[derive(Debug, Clone)]
pub struct LocalView {
    table_id: TableId,
    id: ViewId,
    state: SharedSnapshot,
}

#[async_trait]
impl View for LocalView {
    fn id(&self) -> &ViewId {
        &self.id
    }

    async fn get_visible_record_id_list(&self) -> Result<Vec<RecordId>, HostError> {
        let snapshot = lock(&self.state);
        Ok(snapshot.table(&self.table_id)?.view(&self.id)?.visible_record_ids.clone())
    }

    async fn get_visible_field_id_list(&self) -> Result<Vec<FieldId>, HostError> {
        let snapshot = lock(&self.state);
        Ok(snapshot.table(&self.table_id)?.view(&self.id)?.visible_field_ids.clone())
    }
}

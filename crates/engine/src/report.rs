//! Progress and failure reporting for comparison runs.
//!
//! The orchestration never logs on its own behalf; callers pass a
//! [`Reporter`]. [`TracingReporter`] forwards to `tracing`, and
//! [`MemoryReporter`] keeps rendered lines for hosts that show a log panel.

use std::sync::Mutex;

use coldiff_types::{RecordId, TableId, ViewId};
use tracing::{error, info};

use crate::error::RunError;

/// One step of a run, borrowed from the orchestration's state.
#[derive(Debug, Clone, Copy)]
pub enum RunEvent<'a> {
    Clicked {
        button: &'a str,
    },
    Started {
        table_id: &'a TableId,
        view_id: &'a ViewId,
        records: usize,
        fields: usize,
    },
    RecordCompared {
        record_id: &'a RecordId,
        link: &'a str,
    },
    Finished {
        processed: usize,
    },
    /// The run stopped; `processed` records were written before the failure.
    Failed {
        error: &'a RunError,
        processed: usize,
    },
}

impl RunEvent<'_> {
    /// Single-line rendering used by [`MemoryReporter`].
    pub fn render(&self) -> String {
        match self {
            Self::Clicked { button } => format!("clicked {button}"),
            Self::Started {
                table_id,
                view_id,
                records,
                fields,
            } => format!("started table={table_id} view={view_id} records={records} fields={fields}"),
            Self::RecordCompared { record_id, link } => format!("compared {record_id} -> {link}"),
            Self::Finished { processed } => format!("finished processed={processed}"),
            Self::Failed { error, processed } => format!("failed after {processed}: {error}"),
        }
    }
}

pub trait Reporter: Send + Sync {
    fn report(&self, event: RunEvent<'_>);
}

/// Default reporter: structured `tracing` events.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingReporter;

impl Reporter for TracingReporter {
    fn report(&self, event: RunEvent<'_>) {
        match event {
            RunEvent::Clicked { button } => info!(button, "compare form submitted"),
            RunEvent::Started {
                table_id,
                view_id,
                records,
                fields,
            } => info!(%table_id, %view_id, records, fields, "comparison started"),
            RunEvent::RecordCompared { record_id, link } => info!(%record_id, link, "diff link written"),
            RunEvent::Finished { processed } => info!(processed, "comparison finished"),
            RunEvent::Failed { error, processed } => error!(processed, error = %error, "comparison aborted"),
        }
    }
}

/// Collects rendered events in memory.
#[derive(Debug, Default)]
pub struct MemoryReporter {
    lines: Mutex<Vec<String>>,
}

impl MemoryReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().expect("reporter lock poisoned").clone()
    }
}

impl Reporter for MemoryReporter {
    fn report(&self, event: RunEvent<'_>) {
        self.lines.lock().expect("reporter lock poisoned").push(event.render());
    }
}

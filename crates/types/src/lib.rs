//! Shared data model for coldiff.
//!
//! These types describe what the tool reads from and writes to the host
//! table application (identifiers, records, cell values) and the payloads
//! exchanged with the remote diff service.

pub mod form;

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub use form::{FormItem, FormSpec, FormSubmission};

/// Default label shown in the destination cell for a written diff link.
pub const DEFAULT_LINK_LABEL: &str = "对比结果";

macro_rules! host_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }
    };
}

host_id!(
    /// Opaque table identifier issued by the host.
    TableId
);
host_id!(
    /// Opaque view identifier issued by the host.
    ViewId
);
host_id!(
    /// Opaque row identifier, stable for the duration of one run.
    RecordId
);
host_id!(
    /// Opaque column identifier, independent of display position.
    FieldId
);

/// The host's current selection. Either part may be absent when the user has
/// nothing focused.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table_id: Option<TableId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub view_id: Option<ViewId>,
}

/// Kind tag carried by a rich-text segment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SegmentKind {
    #[default]
    Text,
    Url,
    Mention,
    #[serde(other)]
    Other,
}

/// One segment of a rich-text cell. Every segment kind exposes `text`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellSegment {
    #[serde(rename = "type", default)]
    pub kind: SegmentKind,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
}

impl CellSegment {
    /// Plain text segment.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            kind: SegmentKind::Text,
            text: text.into(),
            link: None,
        }
    }

    /// URL segment: `{type: "url", text, link}`.
    pub fn url(text: impl Into<String>, link: impl Into<String>) -> Self {
        Self {
            kind: SegmentKind::Url,
            text: text.into(),
            link: Some(link.into()),
        }
    }
}

/// A cell value as stored by the host.
///
/// Text-like fields hold an ordered sequence of segments. Every other field
/// type (numbers, checkboxes, dates, attachments) is kept as raw JSON, so a
/// saved snapshot carries it back unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    Segments(Vec<CellSegment>),
    Scalar(Value),
}

impl CellValue {
    /// A single URL segment, the shape written into the destination column.
    pub fn url(label: impl Into<String>, link: impl Into<String>) -> Self {
        Self::Segments(vec![CellSegment::url(label, link)])
    }

    /// Segments in host order, or `None` when the cell is not text-like.
    pub fn segments(&self) -> Option<&[CellSegment]> {
        match self {
            Self::Segments(segments) => Some(segments),
            Self::Scalar(_) => None,
        }
    }

    /// The `text` of every list item joined in host order with no separator.
    ///
    /// Any list counts, typed or not: items without a string `text` (an
    /// attachment, a bare string, `{"text": null}`) contribute nothing. `None`
    /// only when the cell is not a list at all.
    pub fn joined_text(&self) -> Option<String> {
        match self {
            Self::Segments(segments) => Some(segments.iter().map(|segment| segment.text.as_str()).collect()),
            Self::Scalar(Value::Array(items)) => Some(
                items
                    .iter()
                    .filter_map(|item| item.get("text").and_then(Value::as_str))
                    .collect(),
            ),
            Self::Scalar(_) => None,
        }
    }

    /// Short name of the JSON shape, used in error messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Segments(_) => "segments",
            Self::Scalar(Value::Null) => "null",
            Self::Scalar(Value::Bool(_)) => "boolean",
            Self::Scalar(Value::Number(_)) => "number",
            Self::Scalar(Value::String(_)) => "string",
            Self::Scalar(Value::Array(_)) => "array",
            Self::Scalar(Value::Object(_)) => "object",
        }
    }
}

/// A row fetched by id: field id to cell value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub record_id: RecordId,
    #[serde(default)]
    pub fields: IndexMap<FieldId, CellValue>,
}

/// Body posted to the diff service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffRequest {
    pub original: String,
    pub modified: String,
}

impl DiffRequest {
    pub fn new(original: impl Into<String>, modified: impl Into<String>) -> Self {
        Self {
            original: original.into(),
            modified: modified.into(),
        }
    }
}

/// JSON pointer of the result link inside a successful diff response
/// (`{"data": {"link": "..."}}`).
pub const DIFF_LINK_POINTER: &str = "/data/link";

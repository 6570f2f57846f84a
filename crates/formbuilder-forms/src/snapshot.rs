//! Render-session snapshots.
//!
//! A [`FormSnapshot`] is plain data: the field catalog, the database binding
//! (by connection *name*) and the render configuration. It never carries a
//! live handle, so restoring one on a later request cannot resurrect stale
//! connections. A [`RenderSession`] is what is stored in the session store:
//! the encoded snapshot plus the form kind that produced it.

use std::collections::BTreeMap;

use formbuilder_core::FormResult;
use serde::{Deserialize, Serialize};

use crate::binding::DbBinding;
use crate::definition::PrimaryValues;
use crate::field::{FieldSpec, FormKind};

/// A serializable copy of a form definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormSnapshot {
    /// The normalized form name.
    pub name: String,
    /// Field descriptions in catalog order.
    pub fields: Vec<FieldSpec>,
    /// The database binding, if linked.
    pub db_binding: Option<DbBinding>,
    /// Template identifier for insert/update forms.
    pub insert_form_template: String,
    /// Template identifier for edit tables.
    pub edit_table_template: String,
    /// Default form action URL.
    pub form_action: Option<String>,
    /// The `enctype` of the form, if not the browser default.
    pub form_encoding: Option<String>,
    /// Whether browser-side validation stays on.
    pub browser_validation: bool,
    /// Ajax endpoint for edit-table insert rows.
    pub insert_form_url: Option<String>,
    /// Javascript callback for edit-table insert rows.
    pub insert_form_callback: Option<String>,
    /// Primary-key values per rendered edit-table row.
    pub edit_table_row_data: BTreeMap<String, PrimaryValues>,
}

impl FormSnapshot {
    /// Encodes the snapshot as a JSON string.
    pub fn encode(&self) -> FormResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Decodes a snapshot from its JSON string.
    pub fn decode(encoded: &str) -> FormResult<Self> {
        Ok(serde_json::from_str(encoded)?)
    }
}

/// The value stored under a render-session key.
///
/// Serializes as `{"formBuilder": "<snapshot JSON>", "formType": "insertForm"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderSession {
    /// The encoded [`FormSnapshot`].
    #[serde(rename = "formBuilder")]
    pub form_builder: String,
    /// The lifecycle path that produced the session.
    #[serde(rename = "formType")]
    pub form_type: FormKind,
}

impl RenderSession {
    /// Wraps a snapshot for storage.
    pub fn new(snapshot: &FormSnapshot, form_type: FormKind) -> FormResult<Self> {
        Ok(Self {
            form_builder: snapshot.encode()?,
            form_type,
        })
    }

    /// Converts to the JSON value handed to the session store.
    pub fn to_value(&self) -> FormResult<serde_json::Value> {
        Ok(serde_json::to_value(self)?)
    }

    /// Reads a session value back.
    pub fn from_value(value: serde_json::Value) -> FormResult<Self> {
        Ok(serde_json::from_value(value)?)
    }

    /// Decodes the stored snapshot.
    pub fn snapshot(&self) -> FormResult<FormSnapshot> {
        FormSnapshot::decode(&self.form_builder)
    }
}

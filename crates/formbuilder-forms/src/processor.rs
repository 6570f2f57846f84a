//! Processors: mapping a posted form back onto its table.
//!
//! A [`Processor`] is rebuilt from a saved render session. It knows the
//! table and connection, the kind of form that was rendered and every field
//! of the catalog, and turns a [`Submission`] into column values ready for
//! an insert or update.

use std::collections::BTreeMap;

use formbuilder_session::Submission;

use crate::definition::PrimaryValues;
use crate::field::{FieldSpec, FormKind};

/// Posted fields that are never stored.
pub const RESERVED_FIELDS: [&str; 2] = ["engineCSRFCheck", "submit"];

/// Column values gathered from a submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CollectedValues {
    /// One record (insert and update forms).
    Single(BTreeMap<String, String>),
    /// One record per posted edit-table row, keyed by row identifier.
    Rows(BTreeMap<String, BTreeMap<String, String>>),
}

/// Processes submissions of one rendered form.
#[derive(Debug, Clone)]
pub struct Processor {
    table: String,
    connection: String,
    processor_type: FormKind,
    fields: Vec<FieldSpec>,
    row_data: BTreeMap<String, PrimaryValues>,
}

impl Processor {
    /// Creates an insert processor for `table` on the named connection.
    pub fn new(table: impl Into<String>, connection: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            connection: connection.into(),
            processor_type: FormKind::InsertForm,
            fields: Vec::new(),
            row_data: BTreeMap::new(),
        }
    }

    /// Sets the kind of form being processed.
    pub fn set_processor_type(&mut self, kind: FormKind) {
        self.processor_type = kind;
    }

    /// Adds a field; a later field with the same name replaces the earlier one.
    pub fn add_field(&mut self, spec: FieldSpec) {
        match self.fields.iter_mut().find(|f| f.name == spec.name) {
            Some(slot) => *slot = spec,
            None => self.fields.push(spec),
        }
    }

    /// Sets the primary-key values per edit-table row.
    pub fn set_row_data(&mut self, row_data: BTreeMap<String, PrimaryValues>) {
        self.row_data = row_data;
    }

    /// Returns the table.
    pub fn table(&self) -> &str {
        &self.table
    }

    /// Returns the connection name.
    pub fn connection(&self) -> &str {
        &self.connection
    }

    /// Returns the kind of form being processed.
    pub const fn processor_type(&self) -> FormKind {
        self.processor_type
    }

    /// Returns the fields in catalog order.
    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    /// Returns the primary-key values per edit-table row.
    pub const fn row_data(&self) -> &BTreeMap<String, PrimaryValues> {
        &self.row_data
    }

    fn stored_fields(&self) -> impl Iterator<Item = &FieldSpec> {
        self.fields.iter().filter(|f| {
            !f.field_type.is_display_only() && !RESERVED_FIELDS.contains(&f.name.as_str())
        })
    }

    /// Gathers the posted column values.
    ///
    /// Edit tables yield one record per known row identifier that has at
    /// least one posted value; primary-key columns come from the recorded
    /// row data, never from the posting. Other forms yield the posted
    /// scalar values.
    pub fn collect(&self, submission: &Submission) -> CollectedValues {
        if self.processor_type != FormKind::EditTable {
            let values = self
                .stored_fields()
                .filter_map(|f| {
                    let value = submission.value(&f.name)?;
                    Some((f.name.clone(), value.to_string()))
                })
                .collect();
            return CollectedValues::Single(values);
        }

        let mut rows: BTreeMap<String, BTreeMap<String, String>> = BTreeMap::new();
        for field in self.stored_fields().filter(|f| !f.primary) {
            for row_id in submission.row_ids(&field.name) {
                if !self.row_data.contains_key(row_id) {
                    tracing::debug!(field = %field.name, row_id, "posted row not rendered; ignored");
                    continue;
                }
                if let Some(value) = submission.row_value(&field.name, row_id) {
                    rows.entry(row_id.to_string())
                        .or_default()
                        .insert(field.name.clone(), value.to_string());
                }
            }
        }
        for (row_id, values) in &mut rows {
            if let Some(primary) = self.row_data.get(row_id) {
                values.extend(primary.iter().cloned());
            }
        }
        CollectedValues::Rows(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::FieldType;

    fn processor(kind: FormKind) -> Processor {
        let mut p = Processor::new("people", "appDB");
        p.set_processor_type(kind);
        p.add_field(FieldSpec::new("id", FieldType::Hidden).primary(true));
        p.add_field(FieldSpec::new("name", FieldType::Text));
        p.add_field(FieldSpec::new("total", FieldType::Plaintext));
        p.add_field(FieldSpec::new("submit", FieldType::Submit));
        p
    }

    #[test]
    fn test_collect_single_skips_display_only() {
        let submission = Submission::from_pairs([
            ("id", "4"),
            ("name", "Ada"),
            ("total", "99"),
            ("submit", "Submit"),
            ("engineCSRFCheck", "x"),
        ]);
        let CollectedValues::Single(values) = processor(FormKind::UpdateForm).collect(&submission)
        else {
            panic!("expected a single record");
        };
        assert_eq!(values.len(), 2);
        assert_eq!(values["id"], "4");
        assert_eq!(values["name"], "Ada");
    }

    #[test]
    fn test_collect_rows_uses_recorded_primary_values() {
        let mut p = processor(FormKind::EditTable);
        p.set_row_data(BTreeMap::from([(
            "r1".to_string(),
            vec![("id".to_string(), "7".to_string())],
        )]));
        let submission = Submission::from_pairs([
            ("name[r1]", "Grace"),
            ("id[r1]", "1000"),
            ("name[forged]", "Mallory"),
        ]);
        let CollectedValues::Rows(rows) = p.collect(&submission) else {
            panic!("expected rows");
        };
        assert_eq!(rows.len(), 1);
        assert_eq!(rows["r1"]["name"], "Grace");
        assert_eq!(rows["r1"]["id"], "7");
    }

    #[test]
    fn test_add_field_replaces_same_name() {
        let mut p = Processor::new("t", "appDB");
        p.add_field(FieldSpec::new("a", FieldType::Text));
        p.add_field(FieldSpec::new("a", FieldType::Email));
        assert_eq!(p.fields().len(), 1);
        assert_eq!(p.fields()[0].field_type, FieldType::Email);
        assert_eq!(p.processor_type(), FormKind::InsertForm);
    }
}

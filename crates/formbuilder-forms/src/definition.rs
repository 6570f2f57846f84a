//! Form definitions.

use std::collections::BTreeMap;

use formbuilder_core::{FormResult, Settings};

use crate::binding::DbBinding;
use crate::catalog::FieldCatalog;
use crate::field::{Field, FieldFactory, FieldSpec, FieldType, FormKind};
use crate::snapshot::FormSnapshot;
use crate::widgets::HtmlField;

/// Ordered `(field, value)` primary-key pairs of one edit-table row.
pub type PrimaryValues = Vec<(String, String)>;

/// The `enctype` used once a form has a file field.
pub const MULTIPART_ENCODING: &str = "multipart/form-data";

/// Normalizes a form name: trimmed and lowercased.
pub fn normalize_name(name: &str) -> String {
    name.trim().to_lowercase()
}

/// One named form: its fields, database binding and render configuration.
///
/// # Examples
///
/// ```
/// use formbuilder_core::Settings;
/// use formbuilder_forms::definition::FormDefinition;
/// use formbuilder_forms::field::{FieldSpec, FieldType};
///
/// let mut form = FormDefinition::new(" Contact ", &Settings::default());
/// assert_eq!(form.name(), "contact");
///
/// form.add_field(FieldSpec::new("resume", FieldType::File)).unwrap();
/// assert_eq!(form.form_encoding.as_deref(), Some("multipart/form-data"));
/// ```
#[derive(Debug)]
pub struct FormDefinition {
    name: String,
    catalog: FieldCatalog,
    db_binding: Option<DbBinding>,
    /// Template identifier for insert/update forms.
    pub insert_form_template: String,
    /// Template identifier for edit tables.
    pub edit_table_template: String,
    /// Default form action URL.
    pub form_action: Option<String>,
    /// The `enctype` of the form, if not the browser default.
    pub form_encoding: Option<String>,
    /// Whether browser-side validation stays on (`novalidate` otherwise).
    pub browser_validation: bool,
    /// Ajax endpoint for edit-table insert rows.
    pub insert_form_url: Option<String>,
    /// Javascript callback for edit-table insert rows.
    pub insert_form_callback: Option<String>,
    edit_table_row_data: BTreeMap<String, PrimaryValues>,
}

impl FormDefinition {
    /// Creates an empty form using the template defaults from `settings`.
    pub fn new(name: &str, settings: &Settings) -> Self {
        Self {
            name: normalize_name(name),
            catalog: FieldCatalog::new(),
            db_binding: None,
            insert_form_template: settings.default_insert_template.clone(),
            edit_table_template: settings.default_edit_template.clone(),
            form_action: None,
            form_encoding: None,
            browser_validation: settings.browser_validation,
            insert_form_url: None,
            insert_form_callback: None,
            edit_table_row_data: BTreeMap::new(),
        }
    }

    /// Returns the normalized name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the field catalog.
    pub const fn fields(&self) -> &FieldCatalog {
        &self.catalog
    }

    /// Returns the field catalog for modification.
    pub fn fields_mut(&mut self) -> &mut FieldCatalog {
        &mut self.catalog
    }

    /// Adds a field rendered by the default [`HtmlField`] widget.
    pub fn add_field(&mut self, spec: FieldSpec) -> FormResult<()> {
        self.add_boxed_field(HtmlField::boxed(spec))
    }

    /// Adds a field with a custom widget.
    ///
    /// A `file` field switches the form to multipart encoding.
    pub fn add_boxed_field(&mut self, field: Box<dyn Field>) -> FormResult<()> {
        let is_file = field.field_type() == FieldType::File;
        self.catalog.add_field(field)?;
        if is_file {
            self.form_encoding = Some(MULTIPART_ENCODING.to_string());
        }
        Ok(())
    }

    /// Makes sure the form can be submitted by adding a `submit` button if
    /// no submit field exists.
    pub fn ensure_form_submit(&mut self) -> FormResult<()> {
        if self.catalog.has_type(FieldType::Submit) {
            return Ok(());
        }
        self.add_field(FieldSpec::new("submit", FieldType::Submit).value("Submit"))
    }

    /// Removes every field.
    pub fn reset(&mut self) {
        self.catalog.reset();
    }

    /// Binds the form to a database table.
    pub fn link(&mut self, binding: DbBinding) {
        self.db_binding = Some(binding);
    }

    /// Returns the database binding.
    pub const fn db_binding(&self) -> Option<&DbBinding> {
        self.db_binding.as_ref()
    }

    /// Returns the primary-key values recorded per edit-table row.
    pub const fn edit_table_row_data(&self) -> &BTreeMap<String, PrimaryValues> {
        &self.edit_table_row_data
    }

    /// Records a row's primary-key values, returning the previous entry.
    pub fn record_row(&mut self, row_id: String, values: PrimaryValues) -> Option<PrimaryValues> {
        self.edit_table_row_data.insert(row_id, values)
    }

    /// Returns the error scope (`formName_formType`) used for validation errors.
    pub fn error_scope(&self, kind: FormKind) -> String {
        format!("{}_{kind}", self.name)
    }

    /// Takes a plain-data snapshot of the form.
    pub fn to_snapshot(&self) -> FormSnapshot {
        FormSnapshot {
            name: self.name.clone(),
            fields: self.catalog.specs(),
            db_binding: self.db_binding.clone(),
            insert_form_template: self.insert_form_template.clone(),
            edit_table_template: self.edit_table_template.clone(),
            form_action: self.form_action.clone(),
            form_encoding: self.form_encoding.clone(),
            browser_validation: self.browser_validation,
            insert_form_url: self.insert_form_url.clone(),
            insert_form_callback: self.insert_form_callback.clone(),
            edit_table_row_data: self.edit_table_row_data.clone(),
        }
    }

    /// Rebuilds a form from a snapshot, creating widgets with `factory`.
    pub fn from_snapshot(snapshot: FormSnapshot, factory: FieldFactory) -> FormResult<Self> {
        Ok(Self {
            name: snapshot.name,
            catalog: FieldCatalog::from_specs(snapshot.fields, factory)?,
            db_binding: snapshot.db_binding,
            insert_form_template: snapshot.insert_form_template,
            edit_table_template: snapshot.edit_table_template,
            form_action: snapshot.form_action,
            form_encoding: snapshot.form_encoding,
            browser_validation: snapshot.browser_validation,
            insert_form_url: snapshot.insert_form_url,
            insert_form_callback: snapshot.insert_form_callback,
            edit_table_row_data: snapshot.edit_table_row_data,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binding::DbOptions;

    fn contact() -> FormDefinition {
        let mut form = FormDefinition::new("contact", &Settings::default());
        form.add_field(FieldSpec::new("id", FieldType::Hidden).primary(true))
            .unwrap();
        form.add_field(FieldSpec::new("name", FieldType::Text)).unwrap();
        form
    }

    #[test]
    fn test_normalize_name() {
        assert_eq!(normalize_name("  MyForm "), "myform");
    }

    #[test]
    fn test_ensure_form_submit_once() {
        let mut form = contact();
        form.ensure_form_submit().unwrap();
        form.ensure_form_submit().unwrap();
        let submit = form.fields().get("submit").unwrap();
        assert_eq!(submit.field_type(), FieldType::Submit);
        assert_eq!(submit.spec().value, "Submit");
        assert_eq!(form.fields().len(), 3);
    }

    #[test]
    fn test_snapshot_roundtrip_keeps_catalog() {
        let mut form = contact();
        form.link(DbOptions::table("contacts").normalize("appDB").unwrap());
        form.record_row("abc".into(), vec![("id".into(), "7".into())]);

        let restored = FormDefinition::from_snapshot(form.to_snapshot(), HtmlField::boxed).unwrap();
        assert_eq!(restored.name(), "contact");
        assert_eq!(restored.fields().list_fields(), ["id", "name"]);
        assert_eq!(restored.fields().specs(), form.fields().specs());
        assert_eq!(restored.db_binding().unwrap().table, "contacts");
        assert_eq!(restored.edit_table_row_data()["abc"][0].1, "7");
    }

    #[test]
    fn test_error_scope_and_reset() {
        let mut form = contact();
        assert_eq!(form.error_scope(FormKind::InsertForm), "contact_insertForm");
        form.reset();
        assert!(form.fields().is_empty());
    }
}

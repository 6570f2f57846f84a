//! The ordered field catalog of a form.

use formbuilder_core::{FormError, FormResult};

use crate::field::{Field, FieldFactory, FieldSpec, FieldType};

/// An ordered collection of fields with unique names.
///
/// # Examples
///
/// ```
/// use formbuilder_forms::catalog::FieldCatalog;
/// use formbuilder_forms::field::{FieldSpec, FieldType};
/// use formbuilder_forms::widgets::HtmlField;
///
/// let mut catalog = FieldCatalog::new();
/// catalog.add_field(HtmlField::boxed(FieldSpec::new("id", FieldType::Hidden).primary(true))).unwrap();
/// catalog.add_field(HtmlField::boxed(FieldSpec::new("name", FieldType::Text))).unwrap();
/// assert!(catalog.add_field(HtmlField::boxed(FieldSpec::new("name", FieldType::Text))).is_err());
///
/// assert_eq!(catalog.list_fields(), ["id", "name"]);
/// assert_eq!(catalog.list_primary_fields(), ["id"]);
/// ```
#[derive(Debug, Default)]
pub struct FieldCatalog {
    fields: Vec<Box<dyn Field>>,
}

impl FieldCatalog {
    /// Creates an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds a catalog from plain descriptions.
    pub fn from_specs(specs: Vec<FieldSpec>, factory: FieldFactory) -> FormResult<Self> {
        let mut catalog = Self::new();
        for spec in specs {
            catalog.add_field(factory(spec))?;
        }
        Ok(catalog)
    }

    /// Appends a field.
    ///
    /// # Errors
    ///
    /// Fails if the name is empty or already used in this catalog.
    pub fn add_field(&mut self, field: Box<dyn Field>) -> FormResult<()> {
        let name = field.name().trim();
        if name.is_empty() {
            return Err(FormError::Configuration(
                "Field name must not be empty".to_string(),
            ));
        }
        if self.contains(name) {
            return Err(FormError::Configuration(format!(
                "Field '{name}' is already defined"
            )));
        }
        self.fields.push(field);
        Ok(())
    }

    /// Returns `true` if a field named `name` exists.
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Looks up a field by name.
    pub fn get(&self, name: &str) -> Option<&dyn Field> {
        self.fields
            .iter()
            .find(|f| f.name() == name)
            .map(AsRef::as_ref)
    }

    /// Looks up a field by name for modification.
    pub fn get_mut(&mut self, name: &str) -> Option<&mut Box<dyn Field>> {
        self.fields.iter_mut().find(|f| f.name() == name)
    }

    /// Removes a field, returning it.
    pub fn remove(&mut self, name: &str) -> Option<Box<dyn Field>> {
        let idx = self.fields.iter().position(|f| f.name() == name)?;
        Some(self.fields.remove(idx))
    }

    /// Iterates the fields in catalog order.
    pub fn iter(&self) -> impl Iterator<Item = &dyn Field> {
        self.fields.iter().map(AsRef::as_ref)
    }

    /// Returns all field names in catalog order.
    pub fn list_fields(&self) -> Vec<String> {
        self.fields.iter().map(|f| f.name().to_string()).collect()
    }

    /// Returns the primary-key field names in declaration order.
    pub fn list_primary_fields(&self) -> Vec<String> {
        self.fields
            .iter()
            .filter(|f| f.is_primary())
            .map(|f| f.name().to_string())
            .collect()
    }

    /// Sets a field's `disabled` flag.
    ///
    /// # Errors
    ///
    /// Returns [`FormError::UnknownField`] if no such field exists.
    pub fn modify_field_disabled(&mut self, name: &str, disabled: bool) -> FormResult<()> {
        let field = self
            .get_mut(name)
            .ok_or_else(|| FormError::UnknownField(name.to_string()))?;
        field.spec_mut().disabled = disabled;
        Ok(())
    }

    /// Returns field names in display order.
    ///
    /// With `edit_strip == Some(true)` editable fields come first and
    /// read-only ones (primary, disabled, plaintext) follow, each group in
    /// catalog order. Otherwise catalog order is kept.
    pub fn sorted_fields(&self, edit_strip: Option<bool>) -> Vec<String> {
        if edit_strip != Some(true) {
            return self.list_fields();
        }
        let is_read_only = |f: &&Box<dyn Field>| {
            let spec = f.spec();
            spec.primary || spec.disabled || spec.field_type == FieldType::Plaintext
        };
        let (read_only, editable): (Vec<_>, Vec<_>) = self.fields.iter().partition(is_read_only);
        editable
            .into_iter()
            .chain(read_only)
            .map(|f| f.name().to_string())
            .collect()
    }

    /// Returns `true` if any field has the given type.
    pub fn has_type(&self, field_type: FieldType) -> bool {
        self.fields.iter().any(|f| f.field_type() == field_type)
    }

    /// Returns plain copies of every field description, in order.
    pub fn specs(&self) -> Vec<FieldSpec> {
        self.fields.iter().map(|f| f.spec().clone()).collect()
    }

    /// Removes every field.
    pub fn reset(&mut self) {
        self.fields.clear();
    }

    /// Returns the number of fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns `true` if the catalog has no fields.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

//! Field definitions and the field capability trait.
//!
//! A [`FieldSpec`] is the plain, serializable description of one form field.
//! A [`Field`] wraps a spec with the rendering capabilities the template
//! renderer calls into. The catalog stores `Box<dyn Field>` so applications
//! can plug in their own widgets; [`HtmlField`](crate::widgets::HtmlField)
//! is the default.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use formbuilder_core::FormError;
use formbuilder_template::AttrPairs;
use serde::{Deserialize, Serialize};

/// The lifecycle path a form is rendered or processed for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum FormKind {
    /// A single-row insert form.
    #[serde(rename = "insertForm")]
    InsertForm,
    /// A single-row update form.
    #[serde(rename = "updateForm")]
    UpdateForm,
    /// A multi-row edit table.
    #[serde(rename = "editTable")]
    EditTable,
}

impl FormKind {
    /// Returns the canonical name (`insertForm`, `updateForm`, `editTable`).
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::InsertForm => "insertForm",
            Self::UpdateForm => "updateForm",
            Self::EditTable => "editTable",
        }
    }
}

impl fmt::Display for FormKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FormKind {
    type Err = FormError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "insertform" | "insert" => Ok(Self::InsertForm),
            "updateform" | "update" => Ok(Self::UpdateForm),
            "edittable" => Ok(Self::EditTable),
            other => Err(FormError::UnknownDisplayType(other.to_string())),
        }
    }
}

/// The type of a form field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    /// `<input type="text">`.
    #[default]
    Text,
    /// `<input type="hidden">`.
    Hidden,
    /// `<input type="password">`.
    Password,
    /// `<input type="email">`.
    Email,
    /// `<input type="number">`.
    Number,
    /// `<input type="date">`.
    Date,
    /// `<input type="url">`.
    Url,
    /// `<input type="tel">`.
    Tel,
    /// `<textarea>`.
    Textarea,
    /// `<select>`.
    Select,
    /// A checkbox (or a checkbox group when options are given).
    Checkbox,
    /// A radio group.
    Radio,
    /// `<input type="file">`; switches the form to multipart encoding.
    File,
    /// Read-only text derived from the current (row) values.
    Plaintext,
    /// `<input type="submit">`.
    Submit,
    /// `<input type="button">`.
    Button,
}

impl FieldType {
    /// Returns the lowercase type name.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Hidden => "hidden",
            Self::Password => "password",
            Self::Email => "email",
            Self::Number => "number",
            Self::Date => "date",
            Self::Url => "url",
            Self::Tel => "tel",
            Self::Textarea => "textarea",
            Self::Select => "select",
            Self::Checkbox => "checkbox",
            Self::Radio => "radio",
            Self::File => "file",
            Self::Plaintext => "plaintext",
            Self::Submit => "submit",
            Self::Button => "button",
        }
    }

    /// Returns `true` for types whose value is never posted back.
    pub const fn is_display_only(self) -> bool {
        matches!(self, Self::Plaintext | Self::Submit | Self::Button)
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FieldType {
    type Err = FormError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let ty = match s.trim().to_ascii_lowercase().as_str() {
            "text" => Self::Text,
            "hidden" => Self::Hidden,
            "password" => Self::Password,
            "email" => Self::Email,
            "number" => Self::Number,
            "date" => Self::Date,
            "url" => Self::Url,
            "tel" => Self::Tel,
            "textarea" => Self::Textarea,
            "select" => Self::Select,
            "checkbox" => Self::Checkbox,
            "radio" => Self::Radio,
            "file" => Self::File,
            "plaintext" => Self::Plaintext,
            "submit" => Self::Submit,
            "button" => Self::Button,
            other => {
                return Err(FormError::Configuration(format!(
                    "Unknown field type '{other}'"
                )))
            }
        };
        Ok(ty)
    }
}

/// One choice of a select, radio or checkbox group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectOption {
    /// The submitted value.
    pub value: String,
    /// The displayed label.
    pub label: String,
}

/// The plain-data description of a form field.
///
/// # Examples
///
/// ```
/// use formbuilder_forms::field::{FieldSpec, FieldType, FormKind};
///
/// let spec = FieldSpec::new("email", FieldType::Email)
///     .label("E-mail")
///     .required(true)
///     .show_in([FormKind::InsertForm]);
/// assert_eq!(spec.display_label(), "E-mail");
/// assert!(spec.shows_in(FormKind::InsertForm));
/// assert!(!spec.shows_in(FormKind::EditTable));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldSpec {
    /// The field name, unique within a form.
    pub name: String,
    /// The field type.
    #[serde(rename = "type")]
    pub field_type: FieldType,
    /// The label text; the name is shown when empty.
    pub label: String,
    /// The default value.
    pub value: String,
    /// Form kinds this field is shown in; empty means all.
    pub show_in: Vec<FormKind>,
    /// Whether this field is part of the table's primary key.
    pub primary: bool,
    /// Whether the input is rendered disabled.
    pub disabled: bool,
    /// Whether the input is required.
    pub required: bool,
    /// Extra HTML attributes for the input.
    pub attributes: BTreeMap<String, String>,
    /// Choices for select, radio and checkbox groups.
    pub options: Vec<SelectOption>,
    /// JS/CSS asset files this field needs on the page.
    pub assets: Vec<String>,
    /// The last value pushed into the field while rendering.
    pub rendered_value: Option<String>,
}

impl FieldSpec {
    /// Creates a spec with the given name and type.
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
            ..Self::default()
        }
    }

    /// Sets the label.
    #[must_use]
    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// Sets the default value.
    #[must_use]
    pub fn value(mut self, value: impl Into<String>) -> Self {
        self.value = value.into();
        self
    }

    /// Marks the field as (part of) the primary key.
    #[must_use]
    pub const fn primary(mut self, primary: bool) -> Self {
        self.primary = primary;
        self
    }

    /// Sets whether the input is disabled.
    #[must_use]
    pub const fn disabled(mut self, disabled: bool) -> Self {
        self.disabled = disabled;
        self
    }

    /// Sets whether the input is required.
    #[must_use]
    pub const fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    /// Restricts the form kinds the field is shown in.
    #[must_use]
    pub fn show_in(mut self, kinds: impl IntoIterator<Item = FormKind>) -> Self {
        self.show_in = kinds.into_iter().collect();
        self
    }

    /// Adds an HTML attribute.
    #[must_use]
    pub fn attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// Adds a choice.
    #[must_use]
    pub fn option(mut self, value: impl Into<String>, label: impl Into<String>) -> Self {
        self.options.push(SelectOption {
            value: value.into(),
            label: label.into(),
        });
        self
    }

    /// Adds an asset file.
    #[must_use]
    pub fn asset(mut self, path: impl Into<String>) -> Self {
        self.assets.push(path.into());
        self
    }

    /// Returns the label, or the name when no label is set.
    pub fn display_label(&self) -> &str {
        if self.label.is_empty() {
            &self.name
        } else {
            &self.label
        }
    }

    /// Returns `true` if the field is shown in forms of `kind`.
    pub fn shows_in(&self, kind: FormKind) -> bool {
        self.show_in.is_empty() || self.show_in.contains(&kind)
    }
}

/// The capability set the renderer needs from a field.
pub trait Field: Send + Sync + fmt::Debug {
    /// Returns the field's plain-data description.
    fn spec(&self) -> &FieldSpec;

    /// Returns the field's description for modification.
    fn spec_mut(&mut self) -> &mut FieldSpec;

    /// Renders label and input using the named wrapper template.
    fn render(&self, template: Option<&str>, attrs: &AttrPairs) -> String;

    /// Renders the input only.
    fn render_field(&self, attrs: &AttrPairs) -> String;

    /// Renders the label only.
    fn render_label(&self, attrs: &AttrPairs) -> String;

    /// Tells the field which kind of form it is being rendered into.
    fn set_render_type(&mut self, kind: FormKind);

    /// Tells the field the render-session identifier of the form.
    fn set_form_id(&mut self, form_id: &str);

    /// Records the value most recently pushed into the field.
    fn set_rendered_value(&mut self, value: String) {
        self.spec_mut().rendered_value = Some(value);
    }

    /// Returns the field name.
    fn name(&self) -> &str {
        &self.spec().name
    }

    /// Returns the field type.
    fn field_type(&self) -> FieldType {
        self.spec().field_type
    }

    /// Returns the form kinds the field is shown in (empty means all).
    fn show_in(&self) -> &[FormKind] {
        &self.spec().show_in
    }

    /// Returns `true` if the field is part of the primary key.
    fn is_primary(&self) -> bool {
        self.spec().primary
    }

    /// Returns the asset files the field needs.
    fn assets(&self) -> &[String] {
        &self.spec().assets
    }
}

/// Builds a live field from its description (used when restoring snapshots).
pub type FieldFactory = fn(FieldSpec) -> Box<dyn Field>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_form_kind_names() {
        assert_eq!(FormKind::InsertForm.to_string(), "insertForm");
        assert_eq!("UPDATE".parse::<FormKind>().unwrap(), FormKind::UpdateForm);
        assert_eq!(" editTable ".parse::<FormKind>().unwrap(), FormKind::EditTable);
        assert!("assets".parse::<FormKind>().is_err());
        assert_eq!(
            serde_json::to_string(&FormKind::EditTable).unwrap(),
            "\"editTable\""
        );
    }

    #[test]
    fn test_field_type_parse() {
        assert_eq!("Hidden".parse::<FieldType>().unwrap(), FieldType::Hidden);
        assert!("blink".parse::<FieldType>().is_err());
        assert!(FieldType::Plaintext.is_display_only());
        assert!(!FieldType::Hidden.is_display_only());
    }

    #[test]
    fn test_spec_serde_defaults() {
        let spec: FieldSpec = serde_json::from_str(r#"{"name":"id","type":"hidden","primary":true}"#).unwrap();
        assert_eq!(spec.field_type, FieldType::Hidden);
        assert!(spec.primary);
        assert!(spec.show_in.is_empty());
        assert!(spec.rendered_value.is_none());
    }

    #[test]
    fn test_display_label_falls_back_to_name() {
        let spec = FieldSpec::new("title", FieldType::Text);
        assert_eq!(spec.display_label(), "title");
    }
}

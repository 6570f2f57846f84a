//! The default HTML field widget.
//!
//! [`HtmlField`] renders a [`FieldSpec`] as plain HTML5 form markup. Tag
//! attributes from the template override the spec: `name` renames the input
//! (row loops use this for `name[rowID]`), `value` sets the current value,
//! `label` replaces the label text, and anything else becomes an extra input
//! attribute.

use formbuilder_template::html::{element_id, escape_html, render_attrs};
use formbuilder_template::{str2bool, AttrPairs};

use crate::field::{Field, FieldSpec, FieldType, FormKind};

/// Tag attributes consumed by the widget rather than copied to the input.
const RESERVED_ATTRS: [&str; 5] = ["name", "value", "display", "template", "label"];

/// The default [`Field`] implementation.
///
/// # Examples
///
/// ```
/// use formbuilder_forms::field::{Field, FieldSpec, FieldType};
/// use formbuilder_forms::widgets::HtmlField;
/// use formbuilder_template::AttrPairs;
///
/// let field = HtmlField::new(FieldSpec::new("email", FieldType::Email).value("a@b.c"));
/// assert_eq!(
///     field.render_field(&AttrPairs::new()),
///     r#"<input type="email" name="email" id="email" value="a@b.c" />"#
/// );
/// ```
#[derive(Debug, Clone)]
pub struct HtmlField {
    spec: FieldSpec,
    render_type: Option<FormKind>,
    form_id: Option<String>,
}

impl HtmlField {
    /// Wraps a spec.
    pub const fn new(spec: FieldSpec) -> Self {
        Self {
            spec,
            render_type: None,
            form_id: None,
        }
    }

    /// Wraps a spec in a box; usable as a [`FieldFactory`](crate::field::FieldFactory).
    pub fn boxed(spec: FieldSpec) -> Box<dyn Field> {
        Box::new(Self::new(spec))
    }

    /// Returns the kind of form the field was last rendered into.
    pub const fn render_type(&self) -> Option<FormKind> {
        self.render_type
    }

    /// Returns the render-session identifier the field was last rendered for.
    pub fn form_id(&self) -> Option<&str> {
        self.form_id.as_deref()
    }

    fn input_name<'a>(&'a self, attrs: &'a AttrPairs) -> &'a str {
        attrs.get("name").unwrap_or(self.spec.name.as_str())
    }

    fn current_value<'a>(&'a self, attrs: &'a AttrPairs) -> &'a str {
        if let Some(value) = attrs.get("value") {
            return value;
        }
        if self.spec.field_type == FieldType::Plaintext {
            if let Some(rendered) = self.spec.rendered_value.as_deref() {
                return rendered;
            }
        }
        &self.spec.value
    }

    /// Extra input attributes: spec attributes, then tag attributes, then flags.
    fn extra_attrs(&self, attrs: &AttrPairs) -> AttrPairs {
        let mut extra: AttrPairs = self
            .spec
            .attributes
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        for (k, v) in attrs.iter() {
            if !RESERVED_ATTRS.contains(&k) {
                extra.set(k, v);
            }
        }
        if self.spec.disabled {
            extra.set("disabled", "disabled");
        }
        if self.spec.required {
            extra.set("required", "required");
        }
        extra
    }

    fn render_choices(&self, name: &str, value: &str, extra: &str) -> String {
        let input_type = self.spec.field_type.as_str();
        self.spec
            .options
            .iter()
            .map(|choice| {
                let checked = if choice.value == value {
                    r#" checked="checked""#
                } else {
                    ""
                };
                format!(
                    r#"<label><input type="{input_type}" name="{}" value="{}"{checked}{extra} /> {}</label>"#,
                    escape_html(name),
                    escape_html(&choice.value),
                    escape_html(&choice.label),
                )
            })
            .collect()
    }
}

impl Field for HtmlField {
    fn spec(&self) -> &FieldSpec {
        &self.spec
    }

    fn spec_mut(&mut self) -> &mut FieldSpec {
        &mut self.spec
    }

    fn render(&self, template: Option<&str>, attrs: &AttrPairs) -> String {
        let field = self.render_field(attrs);
        if self.spec.field_type == FieldType::Hidden {
            return field;
        }
        let label = self.render_label(attrs);
        let template = template.unwrap_or(match self.render_type {
            Some(FormKind::EditTable) => "inline",
            _ => "default",
        });
        match template {
            "inline" => format!("{label}{field}"),
            "table" => format!("<tr><th>{label}</th><td>{field}</td></tr>"),
            _ => format!(
                r#"<div class="formField {}Field">{label}{field}</div>"#,
                self.spec.field_type
            ),
        }
    }

    fn render_field(&self, attrs: &AttrPairs) -> String {
        let name = escape_html(self.input_name(attrs));
        let id = element_id(self.input_name(attrs));
        let value = self.current_value(attrs);
        let extra_pairs = self.extra_attrs(attrs);
        let extra = render_attrs(extra_pairs.iter());

        match self.spec.field_type {
            FieldType::Textarea => format!(
                r#"<textarea name="{name}" id="{id}"{extra}>{}</textarea>"#,
                escape_html(value)
            ),
            FieldType::Select => {
                let options: String = self
                    .spec
                    .options
                    .iter()
                    .map(|choice| {
                        let selected = if choice.value == value {
                            r#" selected="selected""#
                        } else {
                            ""
                        };
                        format!(
                            r#"<option value="{}"{selected}>{}</option>"#,
                            escape_html(&choice.value),
                            escape_html(&choice.label)
                        )
                    })
                    .collect();
                format!(r#"<select name="{name}" id="{id}"{extra}>{options}</select>"#)
            }
            FieldType::Radio | FieldType::Checkbox if !self.spec.options.is_empty() => {
                self.render_choices(self.input_name(attrs), value, &extra)
            }
            FieldType::Checkbox => {
                let checked = if str2bool(value) == Some(true) {
                    r#" checked="checked""#
                } else {
                    ""
                };
                format!(r#"<input type="checkbox" name="{name}" id="{id}" value="1"{checked}{extra} />"#)
            }
            FieldType::Plaintext => {
                format!(r#"<span id="{id}"{extra}>{}</span>"#, escape_html(value))
            }
            FieldType::File | FieldType::Password => format!(
                r#"<input type="{}" name="{name}" id="{id}"{extra} />"#,
                self.spec.field_type
            ),
            other => format!(
                r#"<input type="{other}" name="{name}" id="{id}" value="{}"{extra} />"#,
                escape_html(value)
            ),
        }
    }

    fn render_label(&self, attrs: &AttrPairs) -> String {
        if matches!(
            self.spec.field_type,
            FieldType::Hidden | FieldType::Submit | FieldType::Button
        ) {
            return String::new();
        }
        let text = attrs.get("label").unwrap_or_else(|| self.spec.display_label());
        format!(
            r#"<label for="{}">{}</label>"#,
            element_id(self.input_name(attrs)),
            escape_html(text)
        )
    }

    fn set_render_type(&mut self, kind: FormKind) {
        self.render_type = Some(kind);
    }

    fn set_form_id(&mut self, form_id: &str) {
        self.form_id = Some(form_id.to_string());
    }
}

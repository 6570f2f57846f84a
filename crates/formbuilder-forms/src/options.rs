//! Per-render options.

use std::collections::BTreeMap;

use formbuilder_template::{str2bool, AttrPairs};

/// Options controlling a single render of a form.
///
/// # Examples
///
/// ```
/// use formbuilder_forms::options::RenderOptions;
/// use formbuilder_template::AttrPairs;
///
/// let attrs = AttrPairs::parse(r#"title="Contacts" noFormTag="yes" id="7""#);
/// let options = RenderOptions::from_attrs(&attrs);
/// assert_eq!(options.title.as_deref(), Some("Contacts"));
/// assert!(options.no_form_tag);
/// assert_eq!(options.values["id"], "7");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderOptions {
    /// Text substituted for `{formTitle}`.
    pub title: Option<String>,
    /// The form action URL; overrides the form's default action.
    pub action: Option<String>,
    /// Suppresses the `<form>` and `</form>` wrapper tags.
    pub no_form_tag: bool,
    /// `rel` attribute of the `<form>` tag.
    pub rel: Option<String>,
    /// `rev` attribute of the `<form>` tag.
    pub rev: Option<String>,
    /// Keeps `{ifExpandable}` blocks and drops `{noShowExpandable}` ones.
    pub expandable: bool,
    /// Base attributes of the `<form>` tag.
    pub form_attributes: AttrPairs,
    /// Attributes emitted as `data-<key>` on the `<form>` tag.
    pub form_data_attributes: AttrPairs,
    /// Template identifier overriding the form's configured template.
    pub template: Option<String>,
    /// Ajax endpoint for edit-table insert rows.
    pub insert_form_url: Option<String>,
    /// Javascript callback for edit-table insert rows.
    pub insert_form_callback: Option<String>,
    /// Any other option, e.g. primary-key values selecting an update.
    pub values: BTreeMap<String, String>,
}

impl RenderOptions {
    /// Creates empty options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads options from tag-style attributes.
    ///
    /// Option names are matched case-insensitively; unrecognized keys land
    /// in [`values`](Self::values).
    pub fn from_attrs(attrs: &AttrPairs) -> Self {
        let mut options = Self::default();
        for (key, value) in attrs.iter() {
            let flag = || str2bool(value).unwrap_or(false);
            match key.to_ascii_lowercase().as_str() {
                "title" => options.title = Some(value.to_string()),
                "action" | "formaction" => options.action = Some(value.to_string()),
                "noformtag" => options.no_form_tag = flag(),
                "rel" => options.rel = Some(value.to_string()),
                "rev" => options.rev = Some(value.to_string()),
                "expandable" => options.expandable = flag(),
                "template" => options.template = Some(value.to_string()),
                "insertformurl" => options.insert_form_url = Some(value.to_string()),
                "insertformcallback" => options.insert_form_callback = Some(value.to_string()),
                _ => {
                    options.values.insert(key.to_string(), value.to_string());
                }
            }
        }
        options
    }

    /// Sets the title.
    #[must_use]
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Sets the action URL.
    #[must_use]
    pub fn action(mut self, action: impl Into<String>) -> Self {
        self.action = Some(action.into());
        self
    }

    /// Suppresses the wrapper tags.
    #[must_use]
    pub const fn no_form_tag(mut self, no_form_tag: bool) -> Self {
        self.no_form_tag = no_form_tag;
        self
    }

    /// Sets the expandable flag.
    #[must_use]
    pub const fn expandable(mut self, expandable: bool) -> Self {
        self.expandable = expandable;
        self
    }

    /// Sets the template identifier.
    #[must_use]
    pub fn template(mut self, template: impl Into<String>) -> Self {
        self.template = Some(template.into());
        self
    }

    /// Adds a `<form>` attribute.
    #[must_use]
    pub fn form_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.form_attributes.set(key, value);
        self
    }

    /// Adds a `data-*` attribute.
    #[must_use]
    pub fn data_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.form_data_attributes.set(key, value);
        self
    }

    /// Adds a free-form value.
    #[must_use]
    pub fn value(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_attrs_aliases() {
        let attrs = AttrPairs::parse(
            r#"formAction="/save" expandable="1" insertFormURL="/row" insertFormCallback="cb""#,
        );
        let options = RenderOptions::from_attrs(&attrs);
        assert_eq!(options.action.as_deref(), Some("/save"));
        assert!(options.expandable);
        assert_eq!(options.insert_form_url.as_deref(), Some("/row"));
        assert_eq!(options.insert_form_callback.as_deref(), Some("cb"));
        assert!(options.values.is_empty());
    }

    #[test]
    fn test_builders() {
        let options = RenderOptions::new()
            .title("T")
            .form_attribute("class", "wide")
            .data_attribute("table", "contacts")
            .value("id", "3");
        assert_eq!(options.form_attributes.get("class"), Some("wide"));
        assert_eq!(options.form_data_attributes.get("table"), Some("contacts"));
        assert_eq!(options.values["id"], "3");
        assert!(!options.no_form_tag);
    }
}

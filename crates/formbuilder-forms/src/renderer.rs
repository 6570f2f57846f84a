//! The template renderer.
//!
//! Rendering runs in fixed phases, each of which lexes the text produced by
//! the previous one, parses only the blocks it owns, and writes the result
//! back out as text:
//!
//! 1. primary-key fields are forced disabled,
//! 2. `{ifFormErrors}` blocks and `{formErrors}` tags,
//! 3. every `{form}...{/form}` block: expandable sections, then
//!    `{fieldsLoop}`, then `{rowLoop}` (see [`rows`](crate::rows)),
//! 4. the remaining single tags (`{form}`, `{fields}`, `{field}`, ...).
//!
//! Tags no phase recognizes are written back verbatim so an outer template
//! engine can still see them.

use formbuilder_core::logging::render_span;
use formbuilder_core::{Diagnostics, FormError};
use formbuilder_db::ConnectionRegistry;
use formbuilder_session::{CsrfIssuer, Submission};
use formbuilder_template::html::{escape_html, render_attrs};
use formbuilder_template::{parse, str2bool, to_source, tokenize, AttrPairs, Node, TagToken, Token};
use tracing::Instrument;

use crate::definition::FormDefinition;
use crate::error_html::pretty_print_form_errors;
use crate::field::{FieldType, FormKind};
use crate::options::RenderOptions;

/// Valid `display` values of the `{fields}` tag.
const FIELDS_DISPLAYS: [&str; 4] = ["full", "fields", "labels", "hidden"];

/// The request-scoped collaborators a render needs.
pub struct RenderContext<'a> {
    /// Named database connections for row loops.
    pub connections: &'a ConnectionRegistry,
    /// Issues the CSRF pair embedded in every `<form>`.
    pub csrf: &'a dyn CsrfIssuer,
    /// The current request's posted values.
    pub submission: &'a Submission,
    /// Where failures are reported.
    pub diagnostics: &'a mut Diagnostics,
}

/// Expands one template against one form definition.
///
/// A renderer is single-use in spirit: its rendered-fields ledger and the
/// row counters belong to the render that created them.
pub struct TemplateRenderer<'a> {
    pub(crate) form: &'a mut FormDefinition,
    pub(crate) kind: FormKind,
    pub(crate) form_id: String,
    pub(crate) options: &'a RenderOptions,
    pub(crate) connections: &'a ConnectionRegistry,
    pub(crate) csrf: &'a dyn CsrfIssuer,
    pub(crate) submission: &'a Submission,
    pub(crate) diagnostics: &'a mut Diagnostics,
    pub(crate) ledger: Vec<String>,
    pub(crate) row_count: usize,
    pub(crate) field_count: usize,
}

impl<'a> TemplateRenderer<'a> {
    /// Creates a renderer for `form` rendered as `kind` under the render
    /// session `form_id`.
    pub fn new(
        form: &'a mut FormDefinition,
        kind: FormKind,
        form_id: impl Into<String>,
        options: &'a RenderOptions,
        ctx: RenderContext<'a>,
    ) -> Self {
        Self {
            form,
            kind,
            form_id: form_id.into(),
            options,
            connections: ctx.connections,
            csrf: ctx.csrf,
            submission: ctx.submission,
            diagnostics: ctx.diagnostics,
            ledger: Vec::new(),
            row_count: 0,
            field_count: 0,
        }
    }

    /// Renders `template` to HTML.
    pub async fn render(&mut self, template: &str) -> String {
        let span = render_span(self.form.name(), self.kind.as_str());
        self.render_phases(template).instrument(span).await
    }

    /// Returns the fields emitted so far, in emission order.
    pub fn rendered_fields(&self) -> &[String] {
        &self.ledger
    }

    /// Returns the row count of the last row loop.
    pub const fn row_count(&self) -> usize {
        self.row_count
    }

    /// Returns the per-row field tag count of the last row loop.
    pub const fn field_count(&self) -> usize {
        self.field_count
    }

    async fn render_phases(&mut self, template: &str) -> String {
        self.ledger.clear();
        self.disable_primary_fields();
        let text = self.expand_errors(template);
        let text = self.expand_form_blocks(&text).await;
        let html = self.expand_general_tags(&text);
        tracing::debug!(fields = self.ledger.len(), "form rendered");
        html
    }

    // ── Phase 1 ──────────────────────────────────────────────────────

    fn disable_primary_fields(&mut self) {
        for name in self.form.fields().list_primary_fields() {
            if let Err(e) = self.form.fields_mut().modify_field_disabled(&name, true) {
                self.diagnostics.debug(e.to_string());
            }
        }
    }

    // ── Phase 2 ──────────────────────────────────────────────────────

    fn expand_errors(&self, text: &str) -> String {
        let scope = self.form.error_scope(self.kind);
        let errors = pretty_print_form_errors(self.diagnostics, &scope);
        let mut out = String::with_capacity(text.len());
        write_errors(parse(tokenize(text), &["ifFormErrors"]), &errors, &mut out);
        out
    }

    // ── Phase 3 ──────────────────────────────────────────────────────

    async fn expand_form_blocks(&mut self, text: &str) -> String {
        let mut out = String::with_capacity(text.len());
        for node in parse(tokenize(text), &["form"]) {
            match node {
                Node::Block { .. } => {
                    let block = node.source();
                    out.push_str(&self.expand_form_block(&block).await);
                }
                other => out.push_str(&other.source()),
            }
        }
        out
    }

    async fn expand_form_block(&mut self, block: &str) -> String {
        let block = self.strip_expandable(block);
        let block = self.expand_fields_loops(&block);
        match self.expand_row_loops(&block).await {
            Ok(block) => block,
            Err(e) => {
                tracing::debug!(error = %e, "form block aborted");
                e.user_message()
            }
        }
    }

    fn strip_expandable(&self, block: &str) -> String {
        let (keep, drop) = if self.options.expandable {
            ("ifExpandable", "noShowExpandable")
        } else {
            ("noShowExpandable", "ifExpandable")
        };
        let mut out = String::with_capacity(block.len());
        write_expandable(parse(tokenize(block), &[keep, drop]), keep, &mut out);
        out
    }

    fn expand_fields_loops(&mut self, block: &str) -> String {
        let mut out = String::with_capacity(block.len());
        for node in parse(tokenize(block), &["fieldsLoop"]) {
            match node {
                Node::Block { open, children, .. } => {
                    let body = to_source(&children);
                    out.push_str(&self.expand_fields_loop(&open.attr_pairs(), body.trim()));
                }
                other => out.push_str(&other.source()),
            }
        }
        out
    }

    /// Emits the unrendered hidden fields, then repeats `body` once per
    /// remaining visible field.
    fn expand_fields_loop(&mut self, attrs: &AttrPairs, body: &str) -> String {
        let list: Option<Vec<String>> = attrs.get("list").map(|list| {
            list.split(',')
                .map(str::trim)
                .filter(|name| !name.is_empty())
                .map(str::to_string)
                .collect()
        });
        let edit_strip = attrs.get("editStrip").and_then(str2bool);
        let show_hidden = attrs.get("showHidden").map_or(Some(true), str2bool);
        let listed = |name: &str| list.as_ref().map_or(true, |l| l.iter().any(|n| n == name));

        let mut out = String::new();
        if show_hidden != Some(false) {
            let hidden: Vec<String> = self
                .form
                .fields()
                .iter()
                .filter(|f| f.field_type() == FieldType::Hidden)
                .filter(|f| listed(f.name()) && f.spec().shows_in(self.kind))
                .filter(|f| !self.is_rendered(f.name()))
                .map(|f| f.name().to_string())
                .collect();
            for name in hidden {
                out.push_str(&self.render_full(&name));
            }
        }

        let visible: Vec<String> = self
            .form
            .fields()
            .sorted_fields(edit_strip)
            .into_iter()
            .filter(|name| {
                self.form.fields().get(name).is_some_and(|f| {
                    f.field_type() != FieldType::Hidden && f.spec().shows_in(self.kind)
                })
            })
            .filter(|name| listed(name) && !self.is_rendered(name))
            .collect();
        for name in visible {
            out.push_str(&name_first_field_tag(body, &name));
        }
        out
    }

    async fn expand_row_loops(&mut self, block: &str) -> Result<String, FormError> {
        let mut out = String::with_capacity(block.len());
        for node in parse(tokenize(block), &["rowLoop"]) {
            match node {
                Node::Block { children, .. } => {
                    let body = to_source(&children);
                    out.push_str(&self.expand_row_loop(body.trim()).await?);
                }
                other => out.push_str(&other.source()),
            }
        }
        Ok(out)
    }

    // ── Phase 4 ──────────────────────────────────────────────────────

    fn expand_general_tags(&mut self, text: &str) -> String {
        let mut out = String::with_capacity(text.len());
        for token in tokenize(text) {
            match token {
                Token::Text(text) => out.push_str(&text),
                Token::Tag(tag) => {
                    let rendered = self.render_tag(&tag);
                    out.push_str(&rendered);
                }
            }
        }
        out
    }

    fn render_tag(&mut self, tag: &TagToken) -> String {
        match tag.key().as_str() {
            "formtitle" => self.options.title.clone().unwrap_or_default(),
            "form" => self.render_form_open(&tag.attr_pairs()),
            "/form" if self.options.no_form_tag => String::new(),
            "/form" => "</form>".to_string(),
            "fields" => self.render_fields(&tag.attr_pairs()),
            "field" => self.render_named_field(tag),
            "fieldset" => {
                let attrs = tag.attr_pairs();
                let legend = attrs.get("legend").unwrap_or_default();
                format!("<fieldset><legend>{}</legend>", escape_html(legend))
            }
            "/fieldset" => "</fieldset>".to_string(),
            "rowcount" => self.row_count.to_string(),
            "fieldcount" => self.field_count.to_string(),
            _ => tag.raw.clone(),
        }
    }

    /// `{form}`: the opening tag (unless suppressed) plus the session and
    /// CSRF hidden inputs.
    fn render_form_open(&mut self, attrs: &AttrPairs) -> String {
        let mut tag_attrs = attrs.clone();
        let with_hidden = tag_attrs
            .remove("hidden")
            .and_then(|v| str2bool(&v))
            .unwrap_or(false);

        let mut out = String::new();
        if !self.options.no_form_tag {
            if let Some(rel) = &self.options.rel {
                tag_attrs.set("rel", rel.as_str());
            }
            if let Some(rev) = &self.options.rev {
                tag_attrs.set("rev", rev.as_str());
            }
            if !self.form.browser_validation {
                tag_attrs.set("novalidate", "");
            }
            let tag_action = tag_attrs.remove("action");
            tag_attrs.remove("method");

            let mut merged = self.options.form_attributes.clone();
            merged.remove("action");
            merged.remove("method");
            if let Some(encoding) = &self.form.form_encoding {
                merged.set("enctype", encoding.as_str());
            }
            merged.merge(&tag_attrs);

            let data: Vec<(String, &str)> = self
                .options
                .form_data_attributes
                .iter()
                .map(|(k, v)| (format!("data-{k}"), v))
                .collect();

            let action = self
                .options
                .action
                .clone()
                .or(tag_action)
                .or_else(|| self.form.form_action.clone());
            let action = action.map_or_else(String::new, |a| {
                format!(r#" action="{}""#, escape_html(&a))
            });
            out.push_str(&format!(
                r#"<form{action} method="post"{}{}>"#,
                render_attrs(merged.iter()),
                render_attrs(data.iter().map(|(k, v)| (k.as_str(), *v))),
            ));
        }

        let csrf = self.csrf.issue();
        for (name, value) in [
            ("__formID", self.form_id.as_str()),
            ("__csrfID", csrf.id.as_str()),
            ("__csrfToken", csrf.token.as_str()),
        ] {
            out.push_str(&format!(
                r#"<input type="hidden" name="{name}" value="{}">"#,
                escape_html(value)
            ));
        }

        if with_hidden {
            let hidden: Vec<String> = self
                .form
                .fields()
                .iter()
                .filter(|f| f.field_type() == FieldType::Hidden && !self.is_rendered(f.name()))
                .map(|f| f.name().to_string())
                .collect();
            for name in hidden {
                out.push_str(&self.render_full(&name));
            }
        }
        out
    }

    /// `{fields display="..."}`: every field not rendered yet.
    fn render_fields(&mut self, attrs: &AttrPairs) -> String {
        let display = display_of(attrs);
        if !FIELDS_DISPLAYS.contains(&display.as_str()) {
            self.diagnostics.debug(format!(
                "Invalid 'display' for {{fields}}: '{display}' (only full|fields|labels|hidden are valid)"
            ));
            return String::new();
        }
        let hidden_only = display == "hidden";
        let names: Vec<String> = self
            .form
            .fields()
            .iter()
            .filter(|f| !hidden_only || f.field_type() == FieldType::Hidden)
            .filter(|f| f.spec().shows_in(self.kind) && !self.is_rendered(f.name()))
            .map(|f| f.name().to_string())
            .collect();

        let template = attrs.get("template").map(|t| t.trim().to_ascii_lowercase());
        let mut out = String::new();
        for name in names {
            let kind = self.kind;
            let Some(field) = self.form.fields_mut().get_mut(&name) else {
                continue;
            };
            field.set_render_type(kind);
            field.set_form_id(&self.form_id);
            let no_attrs = AttrPairs::new();
            let html = match display.as_str() {
                "fields" => field.render_field(&no_attrs),
                "labels" => field.render_label(&no_attrs),
                _ => field.render(template.as_deref(), &no_attrs),
            };
            out.push_str(&html);
            self.mark_rendered(&name);
        }
        out
    }

    /// `{field name="..."}` outside a row loop.
    fn render_named_field(&mut self, tag: &TagToken) -> String {
        let attrs = tag.attr_pairs();
        let Some(name) = attrs.get("name").filter(|n| !n.is_empty()) else {
            self.diagnostics.debug("'name' is required for {field} tags");
            return String::new();
        };
        let name = name.to_string();
        if !self.form.fields().contains(&name) {
            self.diagnostics
                .debug(FormError::UnknownField(name).to_string());
            return String::new();
        }
        if display_of(&attrs) == "full" && self.is_rendered(&name) {
            self.diagnostics
                .debug(format!("Field '{name}' was already rendered"));
            return String::new();
        }
        let html = self.render_field_tag(&tag.raw, &name, attrs, None);
        self.mark_rendered(&name);
        html
    }

    /// Renders one field tag. `value` overrides the posted value; without
    /// either the field's own value is used.
    pub(crate) fn render_field_tag(
        &mut self,
        raw: &str,
        name: &str,
        mut attrs: AttrPairs,
        value: Option<String>,
    ) -> String {
        if let Some(value) = value.or_else(|| self.submission.value(name).map(str::to_string)) {
            attrs.set("value", value);
        }
        let display = display_of(&attrs);
        let template = attrs.get("template").map(|t| t.trim().to_ascii_lowercase());

        let kind = self.kind;
        let Some(field) = self.form.fields_mut().get_mut(name) else {
            self.diagnostics
                .debug(FormError::UnknownField(name.to_string()).to_string());
            return String::new();
        };
        field.set_render_type(kind);
        field.set_form_id(&self.form_id);
        match display.as_str() {
            "full" => field.render(template.as_deref(), &attrs),
            "field" => field.render_field(&attrs),
            "label" => field.render_label(&attrs),
            other => {
                self.diagnostics.debug(format!(
                    "Invalid 'display' for field '{name}': '{other}' (only full|field|label are valid)"
                ));
                raw.to_string()
            }
        }
    }

    /// Renders a field in full with no tag attributes and marks it.
    fn render_full(&mut self, name: &str) -> String {
        let html = self.render_field_tag("", name, AttrPairs::new(), None);
        self.mark_rendered(name);
        html
    }

    pub(crate) fn is_rendered(&self, name: &str) -> bool {
        self.ledger.iter().any(|n| n == name)
    }

    pub(crate) fn mark_rendered(&mut self, name: &str) {
        if !self.is_rendered(name) {
            self.ledger.push(name.to_string());
        }
    }
}

/// The lowercased `display` attribute, `full` by default.
fn display_of(attrs: &AttrPairs) -> String {
    attrs
        .get("display")
        .map_or_else(|| "full".to_string(), |d| d.trim().to_ascii_lowercase())
}

fn write_errors(nodes: Vec<Node>, errors: &str, out: &mut String) {
    for node in nodes {
        match node {
            Node::Block { children, .. } => {
                if !errors.is_empty() {
                    write_errors(children, errors, out);
                }
            }
            Node::Tag(tag) if tag.is_open("formErrors") => out.push_str(errors),
            other => out.push_str(&other.source()),
        }
    }
}

/// Unwraps `keep` blocks, drops every other block, and removes stray
/// `keep` delimiters.
fn write_expandable(nodes: Vec<Node>, keep: &str, out: &mut String) {
    for node in nodes {
        match node {
            Node::Block { open, children, .. } => {
                if open.is(keep) {
                    write_expandable(children, keep, out);
                }
            }
            Node::Tag(tag) if tag.is(keep) => {}
            other => out.push_str(&other.source()),
        }
    }
}

/// Gives the first unnamed `{field}` tag in `body` the name `name`.
fn name_first_field_tag(body: &str, name: &str) -> String {
    let mut named = false;
    tokenize(body)
        .into_iter()
        .map(|token| match token {
            Token::Tag(tag)
                if !named
                    && tag.is_open("field")
                    && tag.attr_pairs().get("name").map_or(true, str::is_empty) =>
            {
                named = true;
                let mut attrs = tag.attr_pairs();
                attrs.set("name", name);
                tag.with_attrs(&attrs).raw
            }
            other => other.source().to_string(),
        })
        .collect()
}

//! The form lifecycle manager.
//!
//! [`FormManager`] is the entry point pages talk to. It owns the registry of
//! live forms for one request, saves a render session whenever a form is
//! displayed, and rebuilds a [`Processor`] from that session when the form
//! comes back.
//!
//! The `display*` operations never fail: problems are reported to the
//! manager's [`Diagnostics`] and the affected output degrades to an empty
//! string, so one broken form cannot take down a page.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use formbuilder_core::{Diagnostics, FormError, FormResult, Settings};
use formbuilder_db::{ConnectionRegistry, SelectAll, Value};
use formbuilder_session::{new_session_id, CsrfIssuer, RandomCsrfIssuer, SessionStore, Submission};
use formbuilder_template::{AttrPairs, FileSystemLoader, TemplateLoader, TemplateVariant};

use crate::binding::{DbBinding, DbOptions};
use crate::definition::FormDefinition;
use crate::error_html::pretty_print;
use crate::field::{FieldFactory, FormKind};
use crate::options::RenderOptions;
use crate::processor::{CollectedValues, Processor};
use crate::registry::FormRegistry;
use crate::renderer::{RenderContext, TemplateRenderer};
use crate::snapshot::{FormSnapshot, RenderSession};
use crate::widgets::HtmlField;

/// The client-side script every page with forms needs.
pub const FORM_EVENTS_SCRIPT: &str = "formEvents.js";

fn unknown_form(name: &str) -> FormError {
    FormError::Configuration(format!("No form defined with name '{name}'"))
}

/// Reports an error at a level matching its cause.
fn report(diagnostics: &mut Diagnostics, e: &FormError) {
    match e {
        FormError::Session(_) | FormError::Io(_) | FormError::Serialization(_) => {
            diagnostics.high(e.to_string());
        }
        _ => diagnostics.debug(e.to_string()),
    }
}

/// Creates, renders and processes forms.
pub struct FormManager {
    settings: Settings,
    registry: FormRegistry,
    connections: ConnectionRegistry,
    sessions: Arc<dyn SessionStore>,
    csrf: Arc<dyn CsrfIssuer>,
    loader: Arc<dyn TemplateLoader>,
    field_factory: FieldFactory,
    diagnostics: Diagnostics,
    submission: Submission,
    processors: HashMap<String, Processor>,
}

impl FormManager {
    /// Creates a manager with the default CSRF issuer, a filesystem template
    /// loader over `settings.template_dirs` and [`HtmlField`] widgets.
    pub fn new(
        settings: Settings,
        sessions: Arc<dyn SessionStore>,
        connections: ConnectionRegistry,
    ) -> Self {
        let loader = FileSystemLoader::new(settings.template_dirs.clone());
        Self {
            settings,
            registry: FormRegistry::new(),
            connections,
            sessions,
            csrf: Arc::new(RandomCsrfIssuer),
            loader: Arc::new(loader),
            field_factory: HtmlField::boxed,
            diagnostics: Diagnostics::new(),
            submission: Submission::new(),
            processors: HashMap::new(),
        }
    }

    /// Replaces the CSRF issuer.
    #[must_use]
    pub fn with_csrf(mut self, csrf: Arc<dyn CsrfIssuer>) -> Self {
        self.csrf = csrf;
        self
    }

    /// Replaces the template loader.
    #[must_use]
    pub fn with_loader(mut self, loader: Arc<dyn TemplateLoader>) -> Self {
        self.loader = loader;
        self
    }

    /// Replaces the widget factory used when forms are rebuilt from sessions.
    #[must_use]
    pub fn with_field_factory(mut self, factory: FieldFactory) -> Self {
        self.field_factory = factory;
        self
    }

    /// Sets the current request's posted values.
    pub fn set_submission(&mut self, submission: Submission) {
        self.submission = submission;
    }

    /// Returns the settings.
    pub const fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Returns the reported diagnostics.
    pub const fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    /// Returns the diagnostics sink, e.g. to record validation errors.
    pub fn diagnostics_mut(&mut self) -> &mut Diagnostics {
        &mut self.diagnostics
    }

    /// Returns the registry of live forms.
    pub const fn registry(&self) -> &FormRegistry {
        &self.registry
    }

    /// Returns the database connections.
    pub const fn connections(&self) -> &ConnectionRegistry {
        &self.connections
    }

    // ── Definitions ──────────────────────────────────────────────────

    /// Registers a new form, optionally bound to a table.
    ///
    /// On failure nothing is registered and the error is also reported.
    ///
    /// # Errors
    ///
    /// [`FormError::DuplicateName`] if the name is taken, or any binding
    /// error of [`link_to_database`](Self::link_to_database).
    pub fn create_form(
        &mut self,
        name: &str,
        db_options: Option<DbOptions>,
    ) -> FormResult<&mut FormDefinition> {
        let mut form = FormDefinition::new(name, &self.settings);
        if self.registry.contains(form.name()) {
            let e = FormError::DuplicateName(form.name().to_string());
            report(&mut self.diagnostics, &e);
            return Err(e);
        }
        if let Some(options) = db_options {
            match self.bind(options) {
                Ok(binding) => form.link(binding),
                Err(e) => {
                    report(&mut self.diagnostics, &e);
                    return Err(e);
                }
            }
        }
        tracing::info!(form = form.name(), "form created");
        self.registry.insert(form)
    }

    /// Binds an existing form to a table. A bare table name is accepted.
    ///
    /// # Errors
    ///
    /// [`FormError::MissingTable`] without a table,
    /// [`FormError::UnknownConnection`] if the connection is not registered.
    pub fn link_to_database(&mut self, name: &str, options: impl Into<DbOptions>) -> FormResult<()> {
        let result = self.bind(options.into()).and_then(|binding| {
            let form = self.registry.get_mut(name).ok_or_else(|| unknown_form(name))?;
            form.link(binding);
            Ok(())
        });
        if let Err(e) = &result {
            report(&mut self.diagnostics, e);
        }
        result
    }

    fn bind(&self, options: DbOptions) -> FormResult<DbBinding> {
        let binding = options.normalize(&self.settings.default_connection)?;
        self.connections.resolve(Some(&binding.connection))?;
        Ok(binding)
    }

    /// Looks up a form.
    pub fn form(&self, name: &str) -> Option<&FormDefinition> {
        self.registry.get(name)
    }

    /// Looks up a form for modification.
    pub fn form_mut(&mut self, name: &str) -> Option<&mut FormDefinition> {
        self.registry.get_mut(name)
    }

    /// Removes a form, returning `true` if it existed.
    pub fn destroy_form(&mut self, name: &str) -> bool {
        self.registry.remove(name).is_some()
    }

    // ── Render sessions ──────────────────────────────────────────────

    /// Saves a render session for the form and returns its identifier.
    pub async fn save_form(&mut self, name: &str, kind: FormKind) -> FormResult<String> {
        let form_id = new_session_id();
        let result = match self.registry.get(name) {
            Some(form) => self.store_session(&form_id, &form.to_snapshot(), kind).await,
            None => Err(unknown_form(name)),
        };
        match result {
            Ok(()) => Ok(form_id),
            Err(e) => {
                report(&mut self.diagnostics, &e);
                Err(e)
            }
        }
    }

    async fn store_session(
        &self,
        form_id: &str,
        snapshot: &FormSnapshot,
        kind: FormKind,
    ) -> FormResult<()> {
        let value = RenderSession::new(snapshot, kind)?.to_value()?;
        self.sessions
            .set(&self.settings.session_key(form_id), value, self.settings.form_timeout)
            .await?;
        tracing::info!(form = %snapshot.name, kind = %kind, "form saved");
        Ok(())
    }

    /// Rebuilds the processor for a render session.
    ///
    /// Without an explicit identifier the posted `MYSQL[__formID]` is used.
    /// Processors are cached per identifier for the life of the manager.
    ///
    /// # Errors
    ///
    /// [`FormError::NoId`] if no identifier is available,
    /// [`FormError::InvalidId`] if the session is missing, expired or
    /// unreadable, and [`FormError::NoDatabaseLink`] if the saved form has
    /// no table (it must be processed by hand).
    pub async fn create_processor(&mut self, form_id: Option<&str>) -> FormResult<&Processor> {
        let form_id = match form_id.or_else(|| self.submission.form_id()) {
            Some(id) => id.to_string(),
            None => {
                report(&mut self.diagnostics, &FormError::NoId);
                return Err(FormError::NoId);
            }
        };
        if !self.processors.contains_key(&form_id) {
            match self.load_processor(&form_id).await {
                Ok(processor) => {
                    tracing::info!(table = processor.table(), "processor created");
                    self.processors.insert(form_id.clone(), processor);
                }
                Err(e) => {
                    report(&mut self.diagnostics, &e);
                    return Err(e);
                }
            }
        }
        self.processors
            .get(&form_id)
            .ok_or(FormError::InvalidId(form_id))
    }

    async fn load_processor(&self, form_id: &str) -> FormResult<Processor> {
        let invalid = || FormError::InvalidId(form_id.to_string());
        let value = self
            .sessions
            .get(&self.settings.session_key(form_id))
            .await?
            .ok_or_else(invalid)?;
        let session = RenderSession::from_value(value).map_err(|_| invalid())?;
        let snapshot = session.snapshot().map_err(|_| invalid())?;
        let form = FormDefinition::from_snapshot(snapshot, self.field_factory)?;

        let binding = form
            .db_binding()
            .ok_or_else(|| FormError::NoDatabaseLink(form.name().to_string()))?;
        let mut processor = Processor::new(&binding.table, &binding.connection);
        processor.set_processor_type(session.form_type);
        for spec in form.fields().specs() {
            processor.add_field(spec);
        }
        processor.set_row_data(form.edit_table_row_data().clone());
        Ok(processor)
    }

    /// Gathers the posted values for a render session.
    pub async fn process(&mut self, form_id: Option<&str>) -> FormResult<CollectedValues> {
        let processor = self.create_processor(form_id).await?.clone();
        Ok(processor.collect(&self.submission))
    }

    // ── Display ──────────────────────────────────────────────────────

    /// Displays a form by display type.
    ///
    /// Types are case-insensitive: `insert`, `insertForm`, `update` and
    /// `updateForm` all display the insert form, which turns into an update
    /// form when the options carry an `id`. `edit`/`editTable` display the
    /// edit table; `assets` and `errors` ignore `name`. Unknown types are
    /// reported and render nothing.
    pub async fn display(&mut self, name: &str, display_type: &str, options: &RenderOptions) -> String {
        match display_type.trim().to_ascii_lowercase().as_str() {
            "insert" | "insertform" | "update" | "updateform" => {
                self.display_insert_form(name, options).await
            }
            "edit" | "edittable" => self.display_edit_table(name, options).await,
            "assets" => self.display_assets(),
            "errors" => self.display_errors(),
            _ => {
                let e = FormError::UnknownDisplayType(display_type.to_string());
                report(&mut self.diagnostics, &e);
                String::new()
            }
        }
    }

    /// Expands a `{formBuilder name="..." display="..." ...}` page tag.
    ///
    /// The remaining attributes become [`RenderOptions`]; `display`
    /// defaults to `insert`.
    pub async fn template_tag(&mut self, attrs: &AttrPairs) -> String {
        let mut options = RenderOptions::from_attrs(attrs);
        let name = options.values.remove("name").unwrap_or_default();
        let display = options
            .values
            .remove("display")
            .unwrap_or_else(|| "insert".to_string());
        self.display(&name, &display, &options).await
    }

    /// Displays an insert form, or an update form when the options carry
    /// an `id`.
    pub async fn display_insert_form(&mut self, name: &str, options: &RenderOptions) -> String {
        if options.values.contains_key("id") {
            return self.display_update_form(name, options).await;
        }
        let result = self.show_record_form(name, FormKind::InsertForm, options).await;
        self.degrade(result)
    }

    /// Displays an update form.
    ///
    /// Option values named like primary fields select the record; its
    /// columns pre-fill the fields.
    pub async fn display_update_form(&mut self, name: &str, options: &RenderOptions) -> String {
        let result = match self.prefill_record(name, options).await {
            Ok(()) => self.show_record_form(name, FormKind::UpdateForm, options).await,
            Err(e) => Err(e),
        };
        self.degrade(result)
    }

    /// Displays an edit table.
    ///
    /// The session is saved after rendering so it carries the row data.
    pub async fn display_edit_table(&mut self, name: &str, options: &RenderOptions) -> String {
        let result = self.show_edit_table(name, options).await;
        self.degrade(result)
    }

    /// Inlines the form scripts and styles of every registered form.
    pub fn display_assets(&mut self) -> String {
        let mut assets = vec![format!(
            "{}/{FORM_EVENTS_SCRIPT}",
            self.settings.assets_url.trim_end_matches('/')
        )];
        for form in self.registry.iter() {
            for field in form.fields().iter() {
                for asset in field.assets() {
                    if !assets.contains(asset) {
                        assets.push(asset.clone());
                    }
                }
            }
        }

        let mut out = String::new();
        for asset in assets {
            let extension = Path::new(&asset)
                .extension()
                .map(|e| e.to_string_lossy().to_ascii_lowercase())
                .unwrap_or_default();
            let (open, close) = match extension.as_str() {
                "js" => ("<script>", "</script>"),
                "css" | "less" | "sass" => ("<style>", "</style>"),
                _ => {
                    self.diagnostics
                        .debug(format!("Unknown asset type for '{asset}'"));
                    continue;
                }
            };
            match self.loader.load(&asset) {
                Ok(source) => {
                    out.push_str(open);
                    out.push_str(&source);
                    out.push_str(close);
                }
                Err(e) => report(&mut self.diagnostics, &e),
            }
        }
        out
    }

    /// Renders every user-facing diagnostic.
    pub fn display_errors(&self) -> String {
        pretty_print(&self.diagnostics)
    }

    fn degrade(&mut self, result: FormResult<String>) -> String {
        result.unwrap_or_else(|e| {
            report(&mut self.diagnostics, &e);
            String::new()
        })
    }

    async fn show_record_form(
        &mut self,
        name: &str,
        kind: FormKind,
        options: &RenderOptions,
    ) -> FormResult<String> {
        let form = self.registry.get_mut(name).ok_or_else(|| unknown_form(name))?;
        form.ensure_form_submit()?;
        let snapshot = form.to_snapshot();
        let form_id = new_session_id();
        self.store_session(&form_id, &snapshot, kind).await?;
        self.render(name, kind, &form_id, options).await
    }

    async fn show_edit_table(&mut self, name: &str, options: &RenderOptions) -> FormResult<String> {
        let form = self.registry.get_mut(name).ok_or_else(|| unknown_form(name))?;
        form.ensure_form_submit()?;
        let mut options = options.clone();
        let url = options.insert_form_url.clone().or_else(|| form.insert_form_url.clone());
        let callback = options
            .insert_form_callback
            .clone()
            .or_else(|| form.insert_form_callback.clone());
        if let Some(url) = url {
            options.form_data_attributes.set("insert-form-url", url);
        }
        if let Some(callback) = callback {
            options.form_data_attributes.set("insert-form-callback", callback);
        }

        let form_id = new_session_id();
        let html = self.render(name, FormKind::EditTable, &form_id, &options).await?;
        let form = self.registry.get(name).ok_or_else(|| unknown_form(name))?;
        self.store_session(&form_id, &form.to_snapshot(), FormKind::EditTable)
            .await?;
        Ok(html)
    }

    /// Sets primary fields from the options and loads the selected record
    /// into the field values.
    async fn prefill_record(&mut self, name: &str, options: &RenderOptions) -> FormResult<()> {
        let form = self.registry.get_mut(name).ok_or_else(|| unknown_form(name))?;
        let mut keys = Vec::new();
        for primary in form.fields().list_primary_fields() {
            if let Some(value) = options.values.get(&primary) {
                if let Some(field) = form.fields_mut().get_mut(&primary) {
                    field.spec_mut().value.clone_from(value);
                }
                keys.push((primary, value.clone()));
            }
        }
        let Some(binding) = form.db_binding().cloned() else {
            return Ok(());
        };
        if keys.is_empty() {
            return Ok(());
        }

        let db = self.connections.resolve(Some(&binding.connection))?;
        let filter = keys
            .iter()
            .map(|(column, _)| format!("{} = ?", db.quote_identifier(column)))
            .collect::<Vec<_>>()
            .join(" AND ");
        let sql = SelectAll::new(&binding.table)
            .filter(Some(filter.as_str()))
            .limit(Some("1"))
            .to_sql_for(db.as_ref());
        let params: Vec<Value> = keys.iter().map(|(_, v)| Value::from(v.as_str())).collect();

        let rows = match db.query(&sql, &params).await {
            Ok(rows) => rows,
            Err(e) => {
                self.diagnostics.high(format!("SQL Error: {e} ({sql})"));
                return Ok(());
            }
        };
        let Some(row) = rows.first() else {
            self.diagnostics
                .debug(format!("No record in '{}' matches the update keys", binding.table));
            return Ok(());
        };
        for (column, value) in row.iter() {
            if let Some(field) = form.fields_mut().get_mut(column) {
                field.spec_mut().value = value.to_form_string();
            }
        }
        Ok(())
    }

    async fn render(
        &mut self,
        name: &str,
        kind: FormKind,
        form_id: &str,
        options: &RenderOptions,
    ) -> FormResult<String> {
        let form = self.registry.get_mut(name).ok_or_else(|| unknown_form(name))?;
        let (template, variant) = match kind {
            FormKind::EditTable => (&form.edit_table_template, TemplateVariant::Edit),
            FormKind::InsertForm | FormKind::UpdateForm => {
                (&form.insert_form_template, TemplateVariant::Insert)
            }
        };
        let template = options.template.as_ref().unwrap_or(template);
        let source = self.loader.load_form_template(template, variant)?;

        let ctx = RenderContext {
            connections: &self.connections,
            csrf: self.csrf.as_ref(),
            submission: &self.submission,
            diagnostics: &mut self.diagnostics,
        };
        let mut renderer = TemplateRenderer::new(form, kind, form_id, options, ctx);
        Ok(renderer.render(&source).await)
    }
}

impl std::fmt::Debug for FormManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FormManager")
            .field("forms", &self.registry.names())
            .field("connections", &self.connections)
            .field("processors", &self.processors.len())
            .finish_non_exhaustive()
    }
}

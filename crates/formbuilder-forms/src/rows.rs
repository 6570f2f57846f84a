//! The row materializer: `{rowLoop}` expansion.
//!
//! Each invocation runs the form's bound `SELECT *` query and repeats the
//! loop body once per row. Field tags in the body are renamed to
//! `name[rowID]`, where the row identifier is a hash of the row's
//! primary-key values, and the primary-key values are recorded on the form
//! so a later request can map posted rows back to database rows.

use std::collections::HashSet;

use formbuilder_core::{DiagnosticLevel, FormError, FormResult};
use formbuilder_db::Row;
use formbuilder_session::hex_encode;
use formbuilder_template::{tokenize, Token};
use sha2::{Digest, Sha256};

use crate::definition::PrimaryValues;
use crate::field::FieldType;
use crate::renderer::TemplateRenderer;

/// Output of a row loop whose query returned nothing.
pub const NO_RECORDS_MESSAGE: &str = "No records found";

/// Hashes a row's ordered primary-key values into its row identifier.
///
/// # Examples
///
/// ```
/// use formbuilder_forms::rows::row_identifier;
///
/// let a = row_identifier(&[("id".to_string(), "1".to_string())]);
/// let b = row_identifier(&[("id".to_string(), "2".to_string())]);
/// assert_eq!(a.len(), 64);
/// assert_ne!(a, b);
/// assert_eq!(a, row_identifier(&[("id".to_string(), "1".to_string())]));
/// ```
pub fn row_identifier(primary: &[(String, String)]) -> String {
    let joined = primary
        .iter()
        .map(|(_, value)| value.as_str())
        .collect::<Vec<_>>()
        .join("|");
    hex_encode(&Sha256::digest(joined.as_bytes()))
}

fn is_word(name: &str) -> bool {
    !name.is_empty() && name.chars().all(|c| c.is_alphanumeric() || c == '_')
}

impl TemplateRenderer<'_> {
    /// Expands one `{rowLoop}` body.
    ///
    /// A missing binding or connection yields an empty block; a query
    /// failure yields the generic database error text. Zero rows abort the
    /// enclosing `{form}` block with [`FormError::EmptyResult`].
    pub(crate) async fn expand_row_loop(&mut self, body: &str) -> FormResult<String> {
        self.row_count = 0;
        self.field_count = 0;

        let Some(binding) = self.form.db_binding().cloned() else {
            self.diagnostics.debug(format!(
                "No database table for the row loop of form '{}' (link it to a database first)",
                self.form.name()
            ));
            return Ok(String::new());
        };
        let db = match self.connections.resolve(Some(&binding.connection)) {
            Ok(db) => db,
            Err(e) => {
                self.diagnostics
                    .debug(format!("Database connection failed to establish: {e}"));
                return Ok(String::new());
            }
        };

        let sql = binding.select_all().to_sql_for(db.as_ref());
        let rows = match db.query(&sql, &[]).await {
            Ok(rows) => rows,
            Err(e) => {
                self.diagnostics.high(format!("SQL Error: {e} ({sql})"));
                return Ok(FormError::QueryError(e.to_string()).user_message());
            }
        };
        tracing::debug!(table = %binding.table, rows = rows.len(), "row loop executed");

        if rows.is_empty() {
            return Err(FormError::EmptyResult(NO_RECORDS_MESSAGE.to_string()));
        }
        self.row_count = rows.len();

        let keyed = !self.form.fields().list_primary_fields().is_empty();
        if !keyed {
            self.diagnostics.debug(format!(
                "Form '{}' has no primary fields; rows are identified by position",
                self.form.name()
            ));
        }

        let mut seen = HashSet::new();
        let mut out = String::new();
        for (position, row) in rows.iter().enumerate() {
            let row_id = self.record_row(row, (!keyed).then_some(position));
            if !seen.insert(row_id.clone()) {
                self.diagnostics.report(
                    DiagnosticLevel::Warning,
                    format!(
                        "Duplicate primary key values in table '{}': rows share identifier {row_id}",
                        binding.table
                    ),
                );
            }
            out.push_str(&self.expand_row(body, row, &row_id));
        }
        Ok(self.substitute_counters(&out))
    }

    /// Pushes cell values into the catalog and records the row's primary
    /// values, returning its identifier.
    ///
    /// Without primary fields the identifier is derived from `position`
    /// and the recorded primary values are empty.
    fn record_row(&mut self, row: &Row, position: Option<usize>) -> String {
        for (column, value) in row.iter() {
            if let Some(field) = self.form.fields_mut().get_mut(column) {
                field.set_rendered_value(value.to_form_string());
            }
        }
        let primary: PrimaryValues = self
            .form
            .fields()
            .list_primary_fields()
            .into_iter()
            .filter_map(|name| {
                let value = row.get_value(&name)?.to_form_string();
                Some((name, value))
            })
            .collect();
        let row_id = match position {
            Some(position) => row_identifier(&[("#row".to_string(), format!("#{position}"))]),
            None => row_identifier(&primary),
        };
        self.form.record_row(row_id.clone(), primary);
        row_id
    }

    fn expand_row(&mut self, body: &str, row: &Row, row_id: &str) -> String {
        let body: String = tokenize(body)
            .into_iter()
            .map(|token| match token {
                Token::Tag(tag) if tag.is_open("rowLoopID") => row_id.to_string(),
                other => other.source().to_string(),
            })
            .collect();

        let tokens = tokenize(&body);
        let mut parts: Vec<String> = tokens.iter().map(|t| t.source().to_string()).collect();
        let mut deferred = Vec::new();
        let mut field_tags = 0;

        for (idx, token) in tokens.iter().enumerate() {
            let Token::Tag(tag) = token else { continue };
            if !tag.is_open("field") {
                continue;
            }
            let mut attrs = tag.attr_pairs();
            let Some(name) = attrs.get("name").filter(|n| is_word(n)).map(str::to_string) else {
                continue;
            };
            field_tags += 1;
            attrs.set("name", format!("{name}[{row_id}]"));
            let raw = tag.with_attrs(&attrs).raw;

            let Some(field_type) = self.form.fields().get(&name).map(|f| f.field_type()) else {
                self.diagnostics
                    .debug(FormError::UnknownField(name).to_string());
                parts[idx] = String::new();
                continue;
            };
            if field_type == FieldType::Plaintext {
                deferred.push((idx, name, attrs, raw));
                continue;
            }
            let value = self
                .submission
                .row_value(&name, row_id)
                .map(str::to_string)
                .or_else(|| row.get_value(&name).map(|v| v.to_form_string()))
                .unwrap_or_default();
            parts[idx] = self.render_field_tag(&raw, &name, attrs, Some(value));
        }

        for (idx, name, attrs, raw) in deferred {
            parts[idx] = self.render_field_tag(&raw, &name, attrs, None);
        }
        self.field_count = field_tags;
        parts.concat()
    }

    fn substitute_counters(&self, block: &str) -> String {
        tokenize(block)
            .into_iter()
            .map(|token| match token {
                Token::Tag(tag) if tag.is_open("rowCount") => self.row_count.to_string(),
                Token::Tag(tag) if tag.is_open("fieldCount") => self.field_count.to_string(),
                other => other.source().to_string(),
            })
            .collect()
    }
}

//! HTML pretty printing of diagnostics and form validation errors.

use formbuilder_core::{Diagnostic, DiagnosticLevel, Diagnostics};
use formbuilder_template::escape_html;

fn error_list<'a>(items: impl Iterator<Item = (&'a str, &'a str)>) -> String {
    let items: String = items
        .map(|(class, message)| {
            format!(
                r#"<li><span class="{class}">{}</span></li>"#,
                escape_html(message)
            )
        })
        .collect();
    if items.is_empty() {
        String::new()
    } else {
        format!(r#"<ul class="errorPrettyPrint">{items}</ul>"#)
    }
}

/// Renders the validation errors recorded for `scope` (`formName_formType`).
///
/// Returns an empty string when the scope has no errors.
///
/// # Examples
///
/// ```
/// use formbuilder_core::Diagnostics;
/// use formbuilder_forms::error_html::pretty_print_form_errors;
///
/// let mut diagnostics = Diagnostics::new();
/// assert_eq!(pretty_print_form_errors(&diagnostics, "contact_insertForm"), "");
///
/// diagnostics.add_form_error("contact_insertForm", "Name is required");
/// assert_eq!(
///     pretty_print_form_errors(&diagnostics, "contact_insertForm"),
///     r#"<ul class="errorPrettyPrint"><li><span class="errorMessage">Name is required</span></li></ul>"#
/// );
/// ```
pub fn pretty_print_form_errors(diagnostics: &Diagnostics, scope: &str) -> String {
    let class = DiagnosticLevel::Error.css_class();
    error_list(
        diagnostics
            .form_errors(scope)
            .iter()
            .map(|message| (class, message.as_str())),
    )
}

/// Renders every user-facing diagnostic, one list item per message.
pub fn pretty_print(diagnostics: &Diagnostics) -> String {
    error_list(
        diagnostics
            .user_facing()
            .map(|Diagnostic { level, message }| (level.css_class(), message.as_str())),
    )
}

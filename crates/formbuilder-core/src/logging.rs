//! Logging for formbuilder.
//!
//! The formbuilder crates log at `settings.log_level`; every other target
//! (database drivers, the host application) is capped at `warn`. A level that
//! is already a filter directive (`formbuilder_forms=trace,rusqlite=debug`)
//! is used as given.
//!
//! Renders run inside a `form_render` span carrying the form name and kind.
//! JSON output flattens those fields onto every event; debug output reports
//! the span's timing when a render finishes.

use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::{fmt, EnvFilter};

use crate::settings::Settings;

/// Tracing targets of the formbuilder crates.
pub const FORMBUILDER_TARGETS: [&str; 6] = [
    "formbuilder",
    "formbuilder_core",
    "formbuilder_db",
    "formbuilder_session",
    "formbuilder_template",
    "formbuilder_forms",
];

/// Builds the `EnvFilter` directives for `settings`.
///
/// # Examples
///
/// ```
/// use formbuilder_core::logging::filter_directives;
/// use formbuilder_core::Settings;
///
/// let settings = Settings { log_level: "debug".into(), ..Settings::default() };
/// let directives = filter_directives(&settings);
/// assert!(directives.starts_with("warn,"));
/// assert!(directives.contains("formbuilder_forms=debug"));
/// ```
pub fn filter_directives(settings: &Settings) -> String {
    let level = settings.log_level.trim();
    if level.contains('=') || level.contains(',') {
        return level.to_string();
    }
    let level = if level.is_empty() { "info" } else { level };
    std::iter::once("warn".to_string())
        .chain(FORMBUILDER_TARGETS.iter().map(|target| format!("{target}={level}")))
        .collect::<Vec<_>>()
        .join(",")
}

/// Installs the global tracing subscriber for `settings`.
///
/// Debug mode writes compact lines and closes each render span with its
/// timing; otherwise events are JSON with the current render's form and
/// kind inlined. Installing a second subscriber is a no-op.
pub fn setup_logging(settings: &Settings) {
    let filter =
        EnvFilter::try_new(filter_directives(settings)).unwrap_or_else(|_| EnvFilter::new("info"));

    if settings.debug {
        fmt::Subscriber::builder()
            .with_env_filter(filter)
            .with_span_events(FmtSpan::CLOSE)
            .compact()
            .try_init()
            .ok();
    } else {
        fmt::Subscriber::builder()
            .with_env_filter(filter)
            .json()
            .with_current_span(true)
            .with_span_list(false)
            .flatten_event(true)
            .try_init()
            .ok();
    }
}

/// Creates the span covering one render of a form.
///
/// # Examples
///
/// ```
/// use formbuilder_core::logging::render_span;
///
/// let span = render_span("contact", "insertForm");
/// let _guard = span.enter();
/// tracing::debug!("expanding form block");
/// ```
pub fn render_span(form_name: &str, form_type: &str) -> tracing::Span {
    tracing::debug_span!("form_render", form = form_name, kind = form_type)
}

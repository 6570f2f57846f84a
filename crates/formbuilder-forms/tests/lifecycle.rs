//! Integration tests for the form lifecycle: define, display, save, process.
//!
//! These tests drive [`FormManager`] end to end against an in-memory SQLite
//! database, the in-memory session store and string templates.

use std::sync::Arc;

use formbuilder_core::{FormError, Settings};
use formbuilder_db::{ConnectionRegistry, DbExecutor, SqliteBackend, Value};
use formbuilder_forms::{
    row_identifier, CollectedValues, DbOptions, FieldSpec, FieldType, FormKind, FormManager,
    RenderOptions, RenderSession,
};
use formbuilder_session::{CsrfIssuer, CsrfToken, InMemorySessionStore, SessionStore, Submission};
use formbuilder_template::{AttrPairs, StringLoader};

// ============================================================================
// Shared helpers
// ============================================================================

const INSERT_TEMPLATE: &str = "{form}{fieldsLoop}{field}{/fieldsLoop}{/form}";

const EDIT_TEMPLATE: &str = concat!(
    "{form}<table>{rowLoop}<tr>",
    r#"{field name="id" display="field"}{field name="name" display="field"}"#,
    "</tr>{/rowLoop}</table>{/form}"
);

struct FixedCsrf;

impl CsrfIssuer for FixedCsrf {
    fn issue(&self) -> CsrfToken {
        CsrfToken {
            id: "csrf-id".into(),
            token: "csrf-token".into(),
        }
    }
}

struct Fixture {
    manager: FormManager,
    sessions: Arc<InMemorySessionStore>,
    loader: Arc<StringLoader>,
}

async fn contacts_db(rows: &[(i64, &str)]) -> Arc<SqliteBackend> {
    let db = SqliteBackend::memory().unwrap();
    db.execute_sql("CREATE TABLE contacts (id INTEGER PRIMARY KEY, name TEXT)", &[])
        .await
        .unwrap();
    for (id, name) in rows {
        db.execute_sql(
            "INSERT INTO contacts (id, name) VALUES (?1, ?2)",
            &[Value::Int(*id), Value::from(*name)],
        )
        .await
        .unwrap();
    }
    Arc::new(db)
}

async fn fixture(rows: &[(i64, &str)]) -> Fixture {
    let settings = Settings::default();
    let mut connections = ConnectionRegistry::new(settings.default_connection.clone());
    connections.register("appDB", contacts_db(rows).await);

    let sessions = Arc::new(InMemorySessionStore::new());
    let loader = Arc::new(StringLoader::new());
    loader.add("default/insert.html", INSERT_TEMPLATE);
    loader.add("default/edit.html", EDIT_TEMPLATE);

    let manager = FormManager::new(settings, sessions.clone(), connections)
        .with_csrf(Arc::new(FixedCsrf))
        .with_loader(loader.clone());
    Fixture {
        manager,
        sessions,
        loader,
    }
}

/// The `contact` form: `name` (text) and `id` (hidden primary key).
fn define_contact(manager: &mut FormManager) {
    let form = manager
        .create_form("contact", Some(DbOptions::table("contacts")))
        .unwrap();
    form.add_field(FieldSpec::new("name", FieldType::Text).label("Name"))
        .unwrap();
    form.add_field(FieldSpec::new("id", FieldType::Hidden).primary(true))
        .unwrap();
}

fn posted_form_id(html: &str) -> String {
    let marker = r#"name="__formID" value=""#;
    let start = html.find(marker).expect("form id input") + marker.len();
    let len = html[start..].find('"').expect("closing quote");
    html[start..start + len].to_string()
}

fn position(html: &str, needle: &str) -> usize {
    html.find(needle)
        .unwrap_or_else(|| panic!("{needle} not found in {html}"))
}

fn row_id(id: &str) -> String {
    row_identifier(&[("id".to_string(), id.to_string())])
}

// ============================================================================
// Definitions
// ============================================================================

#[tokio::test]
async fn test_duplicate_name_keeps_first_registration() {
    let mut f = fixture(&[]).await;
    define_contact(&mut f.manager);

    let err = f.manager.create_form(" Contact ", None).unwrap_err();
    assert!(matches!(err, FormError::DuplicateName(ref name) if name == "contact"));

    let form = f.manager.form("contact").unwrap();
    assert_eq!(form.fields().list_fields(), ["name", "id"]);
    assert_eq!(form.db_binding().unwrap().table, "contacts");
    assert!(f.manager.diagnostics().contains("already created"));
}

#[tokio::test]
async fn test_failed_binding_registers_nothing() {
    let mut f = fixture(&[]).await;

    let err = f
        .manager
        .create_form("a", Some(DbOptions::default()))
        .unwrap_err();
    assert!(matches!(err, FormError::MissingTable));
    assert!(f.manager.form("a").is_none());

    let err = f
        .manager
        .create_form("b", Some(DbOptions::table("t").connection("reporting")))
        .unwrap_err();
    assert!(matches!(err, FormError::UnknownConnection(ref c) if c == "reporting"));
    assert!(f.manager.registry().is_empty());
}

#[tokio::test]
async fn test_link_to_database_accepts_bare_table() {
    let mut f = fixture(&[]).await;
    f.manager.create_form("notes", None).unwrap();
    f.manager.link_to_database("notes", "contacts").unwrap();

    let binding = f.manager.form("notes").unwrap().db_binding().unwrap();
    assert_eq!(binding.table, "contacts");
    assert_eq!(binding.connection, "appDB");

    assert!(f.manager.link_to_database("missing", "contacts").is_err());
    assert!(f.manager.destroy_form("notes"));
    assert!(!f.manager.destroy_form("notes"));
}

// ============================================================================
// Insert and update forms
// ============================================================================

#[tokio::test]
async fn test_contact_insert_form() {
    let mut f = fixture(&[]).await;
    define_contact(&mut f.manager);

    let html = f
        .manager
        .display("contact", "INSERT", &RenderOptions::new())
        .await;

    let order = [
        position(&html, "<form"),
        position(&html, r#"name="__formID""#),
        position(&html, r#"name="__csrfID" value="csrf-id""#),
        position(&html, r#"name="__csrfToken" value="csrf-token""#),
        position(&html, r#"<input type="hidden" name="id" id="id" value="" disabled="disabled" />"#),
        position(&html, r#"<input type="text" name="name""#),
        position(&html, r#"<input type="submit" name="submit""#),
        position(&html, "</form>"),
    ];
    assert!(order.windows(2).all(|w| w[0] < w[1]), "{html}");

    let form_id = posted_form_id(&html);
    assert_eq!(form_id.len(), 64);
    let key = f.manager.settings().session_key(&form_id);
    let stored = f.sessions.get(&key).await.unwrap().expect("render session");
    assert_eq!(stored["formType"], "insertForm");
}

#[tokio::test]
async fn test_update_form_prefills_record() {
    let mut f = fixture(&[(1, "Ada"), (2, "Grace")]).await;
    define_contact(&mut f.manager);

    let options = RenderOptions::new().value("id", "2");
    let html = f.manager.display("contact", "insertForm", &options).await;
    assert!(html.contains(r#"name="name" id="name" value="Grace""#), "{html}");
    assert!(html.contains(r#"name="id" id="id" value="2" disabled="disabled""#));

    let form_id = posted_form_id(&html);
    let processor = f.manager.create_processor(Some(&form_id)).await.unwrap();
    assert_eq!(processor.processor_type(), FormKind::UpdateForm);
}

#[tokio::test]
async fn test_update_alias_without_key_is_insert_form() {
    let mut f = fixture(&[(1, "Ada")]).await;
    define_contact(&mut f.manager);
    f.manager
        .form_mut("contact")
        .unwrap()
        .add_field(FieldSpec::new("note", FieldType::Text).show_in([FormKind::InsertForm]))
        .unwrap();

    for alias in ["insert", "insertForm", "update", "UPDATEFORM"] {
        let html = f.manager.display("contact", alias, &RenderOptions::new()).await;
        assert!(html.contains(r#"name="note""#), "{alias}: {html}");

        let key = f.manager.settings().session_key(&posted_form_id(&html));
        let stored = f.sessions.get(&key).await.unwrap().unwrap();
        assert_eq!(stored["formType"], "insertForm", "{alias}");
    }

    let options = RenderOptions::new().value("id", "1");
    let html = f.manager.display("contact", "update", &options).await;
    assert!(!html.contains(r#"name="note""#));
    assert!(html.contains(r#"value="Ada""#));
}

#[tokio::test]
async fn test_posted_values_are_echoed() {
    let mut f = fixture(&[]).await;
    define_contact(&mut f.manager);
    f.manager
        .set_submission(Submission::parse("name=Ada+Lovelace&__formID=stale"));

    let html = f
        .manager
        .display("contact", "insert", &RenderOptions::new())
        .await;
    assert!(html.contains(r#"value="Ada Lovelace""#), "{html}");
}

// ============================================================================
// Render sessions and processors
// ============================================================================

#[tokio::test]
async fn test_session_round_trip_keeps_catalog() {
    let mut f = fixture(&[]).await;
    define_contact(&mut f.manager);
    let form_id = f
        .manager
        .save_form("contact", FormKind::InsertForm)
        .await
        .unwrap();

    let key = f.manager.settings().session_key(&form_id);
    let value = f.sessions.get(&key).await.unwrap().unwrap();
    let snapshot = RenderSession::from_value(value).unwrap().snapshot().unwrap();
    let saved: Vec<(String, FieldType)> = snapshot
        .fields
        .iter()
        .map(|f| (f.name.clone(), f.field_type))
        .collect();
    assert_eq!(
        saved,
        [
            ("name".to_string(), FieldType::Text),
            ("id".to_string(), FieldType::Hidden)
        ]
    );

    let processor = f.manager.create_processor(Some(&form_id)).await.unwrap();
    assert_eq!(processor.table(), "contacts");
    assert_eq!(processor.connection(), "appDB");
    assert_eq!(processor.fields().len(), 2);
}

#[tokio::test]
async fn test_expired_session_is_invalid() {
    let mut f = fixture(&[]).await;
    define_contact(&mut f.manager);
    let form_id = f
        .manager
        .save_form("contact", FormKind::InsertForm)
        .await
        .unwrap();
    f.sessions
        .expire_now(&f.manager.settings().session_key(&form_id))
        .await;

    let expired = f.manager.create_processor(Some(&form_id)).await.unwrap_err();
    assert!(matches!(expired, FormError::InvalidId(_)));

    let never = f.manager.create_processor(Some("nope")).await.unwrap_err();
    assert!(matches!(never, FormError::InvalidId(_)));

    let missing = f.manager.create_processor(None).await.unwrap_err();
    assert!(matches!(missing, FormError::NoId));
}

#[tokio::test]
async fn test_unbound_form_cannot_be_processed() {
    let mut f = fixture(&[]).await;
    f.manager
        .create_form("feedback", None)
        .unwrap()
        .add_field(FieldSpec::new("comment", FieldType::Textarea))
        .unwrap();
    let form_id = f
        .manager
        .save_form("feedback", FormKind::InsertForm)
        .await
        .unwrap();

    let err = f.manager.create_processor(Some(&form_id)).await.unwrap_err();
    assert!(matches!(err, FormError::NoDatabaseLink(ref name) if name == "feedback"));
}

#[tokio::test]
async fn test_processor_is_cached_per_identifier() {
    let mut f = fixture(&[]).await;
    define_contact(&mut f.manager);
    let form_id = f
        .manager
        .save_form("contact", FormKind::InsertForm)
        .await
        .unwrap();
    f.manager.create_processor(Some(&form_id)).await.unwrap();

    f.sessions
        .remove(&f.manager.settings().session_key(&form_id))
        .await
        .unwrap();
    let cached = f.manager.create_processor(Some(&form_id)).await.unwrap();
    assert_eq!(cached.table(), "contacts");
}

#[tokio::test]
async fn test_process_insert_submission() {
    let mut f = fixture(&[]).await;
    define_contact(&mut f.manager);
    let html = f
        .manager
        .display("contact", "insert", &RenderOptions::new())
        .await;
    let form_id = posted_form_id(&html);

    f.manager.set_submission(Submission::from_pairs([
        ("__formID", form_id.as_str()),
        ("name", "Ada"),
        ("submit", "Submit"),
        ("engineCSRFCheck", "1"),
    ]));
    let CollectedValues::Single(values) = f.manager.process(None).await.unwrap() else {
        panic!("expected a single record");
    };
    assert_eq!(values.len(), 1);
    assert_eq!(values["name"], "Ada");
}

// ============================================================================
// Edit tables
// ============================================================================

#[tokio::test]
async fn test_edit_table_rows_and_processing() {
    let mut f = fixture(&[(1, "Ada"), (2, "Grace")]).await;
    define_contact(&mut f.manager);

    let html = f
        .manager
        .display("contact", "editTable", &RenderOptions::new())
        .await;
    let (ada, grace) = (row_id("1"), row_id("2"));
    assert!(html.contains(&format!(r#"name="name[{ada}]" id="name_{ada}" value="Ada""#)), "{html}");
    assert!(html.contains(&format!(r#"name="name[{grace}]" id="name_{grace}" value="Grace""#)));
    assert!(html.contains(&format!(r#"name="id[{grace}]" id="id_{grace}" value="2" disabled="disabled""#)));

    let form = f.manager.form("contact").unwrap();
    assert_eq!(form.edit_table_row_data().len(), 2);

    let form_id = posted_form_id(&html);
    f.manager.set_submission(Submission::from_pairs([
        ("__formID".to_string(), form_id),
        (format!("name[{grace}]"), "Grace Hopper".to_string()),
        (format!("id[{grace}]"), "99".to_string()),
    ]));
    let CollectedValues::Rows(rows) = f.manager.process(None).await.unwrap() else {
        panic!("expected edit-table rows");
    };
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[&grace]["name"], "Grace Hopper");
    assert_eq!(rows[&grace]["id"], "2");
}

#[tokio::test]
async fn test_edit_table_adds_submit_field() {
    let mut f = fixture(&[(1, "Ada")]).await;
    define_contact(&mut f.manager);

    let html = f
        .manager
        .display("contact", "editTable", &RenderOptions::new())
        .await;
    let form = f.manager.form("contact").unwrap();
    assert_eq!(form.fields().list_fields(), ["name", "id", "submit"]);

    let form_id = posted_form_id(&html);
    let processor = f.manager.create_processor(Some(&form_id)).await.unwrap();
    assert!(processor
        .fields()
        .iter()
        .any(|spec| spec.name == "submit" && spec.field_type == FieldType::Submit));
}

#[tokio::test]
async fn test_edit_table_rerender_is_deterministic() {
    let mut f = fixture(&[(1, "Ada")]).await;
    define_contact(&mut f.manager);

    let first = f
        .manager
        .display("contact", "edit", &RenderOptions::new())
        .await;
    let second = f
        .manager
        .display("contact", "edit", &RenderOptions::new())
        .await;
    let name = format!(r#"name="name[{}]""#, row_id("1"));
    assert!(first.contains(&name));
    assert!(second.contains(&name));
    assert_ne!(posted_form_id(&first), posted_form_id(&second));
}

#[tokio::test]
async fn test_empty_table_renders_no_records() {
    let mut f = fixture(&[]).await;
    define_contact(&mut f.manager);
    f.loader.add(
        "people/edit.html",
        "<h1>{formTitle}</h1>{form}<table>{rowLoop}{field name=\"name\"}{/rowLoop}</table>{/form}<p>{rowCount}</p>",
    );

    let options = RenderOptions::new().title("People").template("people");
    let html = f.manager.display("contact", "editTable", &options).await;
    assert_eq!(html, "<h1>People</h1>No records found<p>0</p>");
}

#[tokio::test]
async fn test_edit_table_insert_hooks_become_data_attributes() {
    let mut f = fixture(&[(1, "Ada")]).await;
    define_contact(&mut f.manager);
    f.manager.form_mut("contact").unwrap().insert_form_url = Some("/contacts/new".into());

    let options = RenderOptions::from_attrs(&AttrPairs::parse(r#"insertFormCallback="addRow""#));
    let html = f.manager.display("contact", "editTable", &options).await;
    assert!(html.starts_with(
        r#"<form method="post" data-insert-form-url="/contacts/new" data-insert-form-callback="addRow">"#
    ), "{html}");
}

// ============================================================================
// Display dispatch
// ============================================================================

#[tokio::test]
async fn test_unknown_display_type_renders_nothing() {
    let mut f = fixture(&[]).await;
    define_contact(&mut f.manager);

    let html = f
        .manager
        .display("contact", "sideways", &RenderOptions::new())
        .await;
    assert!(html.is_empty());
    assert!(f.manager.diagnostics().contains("Unsupported display type 'sideways'"));
}

#[tokio::test]
async fn test_missing_template_renders_nothing() {
    let mut f = fixture(&[]).await;
    define_contact(&mut f.manager);

    let options = RenderOptions::new().template("nowhere");
    let html = f.manager.display("contact", "insert", &options).await;
    assert!(html.is_empty());
    assert!(f.manager.diagnostics().contains("No insert template found for 'nowhere'"));
}

#[tokio::test]
async fn test_template_tag_dispatch() {
    let mut f = fixture(&[]).await;
    define_contact(&mut f.manager);
    f.loader.add("titled/insert.html", "<h2>{formTitle}</h2>");

    let attrs = AttrPairs::parse(r#"name="contact" title="Contact us" template="titled""#);
    assert_eq!(f.manager.template_tag(&attrs).await, "<h2>Contact us</h2>");
}

#[tokio::test]
async fn test_assets_are_inlined_once() {
    let mut f = fixture(&[]).await;
    define_contact(&mut f.manager);
    f.manager
        .form_mut("contact")
        .unwrap()
        .add_field(
            FieldSpec::new("born", FieldType::Date)
                .asset("assets/date.js")
                .asset("assets/date.css")
                .asset("assets/date.png"),
        )
        .unwrap();
    f.manager
        .create_form("other", None)
        .unwrap()
        .add_field(FieldSpec::new("when", FieldType::Date).asset("assets/date.js"))
        .unwrap();
    f.loader.add("formBuilderAssets/formEvents.js", "events();");
    f.loader.add("assets/date.js", "date();");
    f.loader.add("assets/date.css", ".date{}");

    let html = f
        .manager
        .display("", "assets", &RenderOptions::new())
        .await;
    assert_eq!(
        html,
        "<script>events();</script><script>date();</script><style>.date{}</style>"
    );
    assert!(f.manager.diagnostics().contains("Unknown asset type for 'assets/date.png'"));
}

#[tokio::test]
async fn test_display_errors_lists_user_facing_diagnostics() {
    let mut f = fixture(&[]).await;
    f.manager.diagnostics_mut().error("Something broke");
    f.manager.diagnostics_mut().debug("internal detail");

    let html = f
        .manager
        .display("", "errors", &RenderOptions::new())
        .await;
    assert_eq!(
        html,
        r#"<ul class="errorPrettyPrint"><li><span class="errorMessage">Something broke</span></li></ul>"#
    );
}

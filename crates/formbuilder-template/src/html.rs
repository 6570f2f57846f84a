//! HTML helpers shared by field widgets and the renderer.

/// Escapes HTML special characters in a string.
///
/// Braces are escaped too, so escaped text can never be read back as a tag.
///
/// # Examples
///
/// ```
/// use formbuilder_template::html::escape_html;
///
/// assert_eq!(escape_html(r#"<a href="x">&</a>"#), "&lt;a href=&quot;x&quot;&gt;&amp;&lt;/a&gt;");
/// ```
pub fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
        .replace('{', "&#123;")
        .replace('}', "&#125;")
}

/// Renders attributes as ` key="value"` pairs in the given order.
///
/// Values are escaped; keys are written as given.
pub fn render_attrs<'a, I>(attrs: I) -> String
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    attrs
        .into_iter()
        .map(|(k, v)| format!(r#" {k}="{}""#, escape_html(v)))
        .collect()
}

/// Converts a field name into a safe element id (`email[ab12]` -> `email_ab12`).
pub fn element_id(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect::<String>()
        .trim_matches('_')
        .to_string()
}

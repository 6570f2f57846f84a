//! Posted form data with bracket-notation keys.
//!
//! A browser posts `__formID`, `name` and, from edit tables, `name[rowID]`.
//! Each posted key is filed under two roots, the way the request pipeline
//! exposes sanitized views of the post:
//!
//! - `MYSQL[__formID]` carries the render-session identifier,
//! - `HTML[field]` carries a single-row value,
//! - `HTML[field][rowID]` carries one row's value in an edit table.
//!
//! [`Submission`] decodes a urlencoded body (or explicit pairs) into a tree
//! of [`PostedValue`]s and answers the lookups the form lifecycle needs.

use std::collections::BTreeMap;

/// Root key holding sanitized-for-SQL values, including `__formID`.
pub const MYSQL_ROOT: &str = "MYSQL";

/// Root key holding sanitized-for-HTML field values.
pub const HTML_ROOT: &str = "HTML";

const ROOTS: [&str; 2] = [MYSQL_ROOT, HTML_ROOT];

/// Posted key carrying the render-session identifier.
pub const FORM_ID_KEY: &str = "__formID";

/// A posted value: a scalar or a nested map of values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PostedValue {
    /// A single string value.
    Scalar(String),
    /// A nested map keyed by bracket segment.
    Map(BTreeMap<String, PostedValue>),
}

impl PostedValue {
    /// Returns the scalar text, if this is a scalar.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Scalar(s) => Some(s),
            Self::Map(_) => None,
        }
    }

    /// Returns the nested map, if this is a map.
    pub const fn as_map(&self) -> Option<&BTreeMap<String, Self>> {
        match self {
            Self::Map(m) => Some(m),
            Self::Scalar(_) => None,
        }
    }
}

/// Decoded posted form data.
///
/// # Examples
///
/// ```
/// use formbuilder_session::Submission;
///
/// let post = Submission::parse("__formID=abc&name=Ada&email%5Br1%5D=a%40b.c");
/// assert_eq!(post.form_id(), Some("abc"));
/// assert_eq!(post.value("name"), Some("Ada"));
/// assert_eq!(post.row_value("email", "r1"), Some("a@b.c"));
/// assert!(post.has_row_values("email"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Submission {
    root: BTreeMap<String, PostedValue>,
}

impl Submission {
    /// Creates an empty submission (a GET request, or no form posted).
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses an `application/x-www-form-urlencoded` body.
    pub fn parse(body: &str) -> Self {
        Self::from_pairs(body.split('&').filter(|p| !p.is_empty()).map(|pair| {
            let (key, value) = pair
                .find('=')
                .map_or((pair, ""), |eq_pos| (&pair[..eq_pos], &pair[eq_pos + 1..]));
            (percent_decode(key), percent_decode(value))
        }))
    }

    /// Builds a submission from already-decoded `(key, value)` pairs as the
    /// browser posted them.
    ///
    /// Every pair is filed under both the `MYSQL` and `HTML` roots. Later
    /// pairs win when two pairs address the same path.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut submission = Self::new();
        for (key, value) in pairs {
            let value = value.into();
            for root in ROOTS {
                let mut path = vec![root.to_string()];
                path.extend(split_key(key.as_ref()));
                submission.insert(&path, value.clone());
            }
        }
        submission
    }

    /// Sets the value at a bracket path, creating intermediate maps.
    pub fn insert(&mut self, path: &[String], value: String) {
        insert_into(&mut self.root, path, value);
    }

    /// Looks up the value at a path of segments.
    pub fn get_path(&self, path: &[&str]) -> Option<&PostedValue> {
        let (first, rest) = path.split_first()?;
        let mut current = self.root.get(*first)?;
        for segment in rest {
            current = current.as_map()?.get(*segment)?;
        }
        Some(current)
    }

    /// Returns the posted render-session identifier (`MYSQL[__formID]`).
    pub fn form_id(&self) -> Option<&str> {
        self.get_path(&[MYSQL_ROOT, FORM_ID_KEY])
            .and_then(PostedValue::as_str)
            .filter(|id| !id.is_empty())
    }

    /// Returns the single-row posted value of a field (`HTML[field]`).
    pub fn value(&self, field: &str) -> Option<&str> {
        self.get_path(&[HTML_ROOT, field]).and_then(PostedValue::as_str)
    }

    /// Returns a row-scoped posted value (`HTML[field][rowID]`).
    pub fn row_value(&self, field: &str, row_id: &str) -> Option<&str> {
        self.get_path(&[HTML_ROOT, field, row_id])
            .and_then(PostedValue::as_str)
    }

    /// Returns `true` if the field was posted with row-scoped values.
    pub fn has_row_values(&self, field: &str) -> bool {
        self.get_path(&[HTML_ROOT, field])
            .is_some_and(|v| v.as_map().is_some())
    }

    /// Returns the row identifiers posted for a field.
    pub fn row_ids(&self, field: &str) -> Vec<&str> {
        self.get_path(&[HTML_ROOT, field])
            .and_then(PostedValue::as_map)
            .map(|m| m.keys().map(String::as_str).collect())
            .unwrap_or_default()
    }

    /// Returns `true` if nothing was posted.
    pub fn is_empty(&self) -> bool {
        self.root.is_empty()
    }
}

fn insert_into(map: &mut BTreeMap<String, PostedValue>, path: &[String], value: String) {
    let Some((first, rest)) = path.split_first() else {
        return;
    };
    let key = if first.is_empty() {
        map.len().to_string()
    } else {
        first.clone()
    };
    if rest.is_empty() {
        map.insert(key, PostedValue::Scalar(value));
        return;
    }
    let entry = map
        .entry(key)
        .or_insert_with(|| PostedValue::Map(BTreeMap::new()));
    if let PostedValue::Scalar(_) = entry {
        *entry = PostedValue::Map(BTreeMap::new());
    }
    if let PostedValue::Map(child) = entry {
        insert_into(child, rest, value);
    }
}

/// Splits `HTML[name][row]` into `["HTML", "name", "row"]`.
///
/// Keys with unbalanced brackets are kept whole.
fn split_key(key: &str) -> Vec<String> {
    let Some(open) = key.find('[') else {
        return vec![key.to_string()];
    };
    let mut segments = vec![key[..open].to_string()];
    let mut rest = &key[open..];
    while let Some(stripped) = rest.strip_prefix('[') {
        let Some(close) = stripped.find(']') else {
            return vec![key.to_string()];
        };
        segments.push(stripped[..close].to_string());
        rest = &stripped[close + 1..];
    }
    if !rest.is_empty() {
        return vec![key.to_string()];
    }
    segments
}

/// Decodes a percent-encoded form component (`+` is a space).
fn percent_decode(input: &str) -> String {
    let plus_decoded = input.replace('+', " ");
    percent_encoding::percent_decode_str(&plus_decoded)
        .decode_utf8_lossy()
        .into_owned()
}

//! Template lexer (tokenizer).
//!
//! Converts raw template text into a stream of [`Token`]s: text literals and
//! tags of the shape `{name attr="value" ...}` or `{/name}`. A brace that does
//! not open a well-formed tag (CSS rules, inline scripts, stray braces) is
//! plain text, so malformed tags pass through untouched.

use std::sync::OnceLock;

use regex::Regex;

use crate::attrs::AttrPairs;

/// A token produced by the template lexer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// A literal text segment.
    Text(String),
    /// A single tag, opening tag or closing tag.
    Tag(TagToken),
}

/// A `{name ...}` or `{/name}` tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagToken {
    /// The tag name as written (without a leading `/`).
    pub name: String,
    /// `true` for `{/name}`.
    pub closing: bool,
    /// The raw attribute text following the name, trimmed.
    pub attrs: String,
    /// The exact source text of the tag.
    pub raw: String,
}

impl TagToken {
    /// Builds an opening tag from a name and raw attribute text.
    pub fn new(name: impl Into<String>, attrs: impl Into<String>) -> Self {
        let name = name.into();
        let attrs = attrs.into().trim().to_string();
        let raw = if attrs.is_empty() {
            format!("{{{name}}}")
        } else {
            format!("{{{name} {attrs}}}")
        };
        Self {
            name,
            closing: false,
            attrs,
            raw,
        }
    }

    /// Returns `true` if this tag has the given name (case-insensitive).
    pub fn is(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
    }

    /// Returns `true` if this is an opening (or single) tag named `name`.
    pub fn is_open(&self, name: &str) -> bool {
        !self.closing && self.is(name)
    }

    /// Returns `true` if this is a closing tag named `name`.
    pub fn is_close(&self, name: &str) -> bool {
        self.closing && self.is(name)
    }

    /// Returns the lowercased name, prefixed with `/` for closing tags.
    pub fn key(&self) -> String {
        let name = self.name.to_ascii_lowercase();
        if self.closing {
            format!("/{name}")
        } else {
            name
        }
    }

    /// Parses the attribute text into ordered pairs.
    pub fn attr_pairs(&self) -> AttrPairs {
        AttrPairs::parse(&self.attrs)
    }

    /// Returns a copy of this tag with its attributes replaced.
    pub fn with_attrs(&self, attrs: &AttrPairs) -> Self {
        Self::new(self.name.clone(), attrs.to_source())
    }
}

fn tag_regex() -> &'static Regex {
    static TAG_RE: OnceLock<Regex> = OnceLock::new();
    TAG_RE.get_or_init(|| {
        Regex::new(r"\{(/?)([A-Za-z_][A-Za-z0-9_]*)(\s[^{}]*)?\}").expect("valid regex")
    })
}

/// Tokenizes template text into [`Token`]s.
///
/// Adjacent text is merged into a single [`Token::Text`]; concatenating the
/// `raw` text of every token reproduces the input exactly.
///
/// # Examples
///
/// ```
/// use formbuilder_template::lexer::{tokenize, Token};
///
/// let tokens = tokenize(r#"<p>{field name="email"}</p>"#);
/// assert_eq!(tokens.len(), 3);
/// match &tokens[1] {
///     Token::Tag(tag) => {
///         assert!(tag.is_open("FIELD"));
///         assert_eq!(tag.attrs, r#"name="email""#);
///     }
///     other => panic!("unexpected token {other:?}"),
/// }
/// ```
pub fn tokenize(source: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut last = 0;

    for caps in tag_regex().captures_iter(source) {
        let Some(whole) = caps.get(0) else {
            continue;
        };
        if whole.start() > last {
            tokens.push(Token::Text(source[last..whole.start()].to_string()));
        }
        let closing = caps.get(1).is_some_and(|m| !m.as_str().is_empty());
        let attrs = caps.get(3).map_or("", |m| m.as_str()).trim();
        if closing && !attrs.is_empty() {
            // `{/name attr}` is not a closing tag; keep it as text.
            tokens.push(Token::Text(whole.as_str().to_string()));
        } else {
            tokens.push(Token::Tag(TagToken {
                name: caps[2].to_string(),
                closing,
                attrs: attrs.to_string(),
                raw: whole.as_str().to_string(),
            }));
        }
        last = whole.end();
    }
    if last < source.len() {
        tokens.push(Token::Text(source[last..].to_string()));
    }

    merge_text(tokens)
}

fn merge_text(tokens: Vec<Token>) -> Vec<Token> {
    let mut merged: Vec<Token> = Vec::with_capacity(tokens.len());
    for token in tokens {
        if let (Token::Text(next), Some(Token::Text(prev))) = (&token, merged.last_mut()) {
            prev.push_str(next);
            continue;
        }
        merged.push(token);
    }
    merged
}

impl Token {
    /// Returns the source text of this token.
    pub fn source(&self) -> &str {
        match self {
            Self::Text(text) => text,
            Self::Tag(tag) => &tag.raw,
        }
    }
}

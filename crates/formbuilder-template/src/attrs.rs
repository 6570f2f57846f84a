//! Attribute pairs.
//!
//! Tag attributes are written `key="value"` (single quotes also accepted).
//! A bare word (`novalidate`) is an attribute with an empty value. Order is
//! preserved so that rewritten tags keep their original shape.

use std::sync::OnceLock;

use regex::Regex;

/// Ordered `key="value"` attribute pairs with unique keys.
///
/// # Examples
///
/// ```
/// use formbuilder_template::attrs::AttrPairs;
///
/// let mut pairs = AttrPairs::parse(r#"display="label" class='wide' required"#);
/// assert_eq!(pairs.get("display"), Some("label"));
/// assert_eq!(pairs.get("class"), Some("wide"));
/// assert_eq!(pairs.get("required"), Some(""));
///
/// pairs.set("name", "email");
/// assert_eq!(pairs.to_source(), r#"display="label" class="wide" required="" name="email""#);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttrPairs {
    pairs: Vec<(String, String)>,
}

fn pair_regex() -> &'static Regex {
    static PAIR_RE: OnceLock<Regex> = OnceLock::new();
    PAIR_RE.get_or_init(|| {
        Regex::new(r#"([A-Za-z_:][-A-Za-z0-9_:.]*)(?:\s*=\s*(?:"([^"]*)"|'([^']*)'))?"#)
            .expect("valid regex")
    })
}

impl AttrPairs {
    /// Creates an empty set of pairs.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses raw attribute text. Later duplicates replace earlier values.
    pub fn parse(source: &str) -> Self {
        let mut pairs = Self::new();
        for caps in pair_regex().captures_iter(source) {
            let value = caps
                .get(2)
                .or_else(|| caps.get(3))
                .map_or("", |m| m.as_str());
            pairs.set(&caps[1], value);
        }
        pairs
    }

    /// Returns the value of `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Returns `true` if `key` is present.
    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Sets `key`, replacing an existing value in place or appending.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.pairs.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.pairs.push((key, value)),
        }
    }

    /// Removes `key`, returning its value.
    pub fn remove(&mut self, key: &str) -> Option<String> {
        let idx = self.pairs.iter().position(|(k, _)| k == key)?;
        Some(self.pairs.remove(idx).1)
    }

    /// Overlays `other` onto these pairs; `other` wins on conflicts.
    pub fn merge(&mut self, other: &Self) {
        for (k, v) in other.iter() {
            self.set(k, v);
        }
    }

    /// Iterates pairs in order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Returns the number of pairs.
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    /// Returns `true` if there are no pairs.
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Writes the pairs back as tag attribute text (`a="1" b="2"`).
    pub fn to_source(&self) -> String {
        self.pairs
            .iter()
            .map(|(k, v)| format!("{k}=\"{v}\""))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for AttrPairs {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut pairs = Self::new();
        for (k, v) in iter {
            pairs.set(k, v);
        }
        pairs
    }
}

/// Coerces a template attribute string to a boolean.
///
/// Returns `None` for text that is neither truthy nor falsy, which callers
/// treat as "not specified".
///
/// # Examples
///
/// ```
/// use formbuilder_template::attrs::str2bool;
///
/// assert_eq!(str2bool("TRUE"), Some(true));
/// assert_eq!(str2bool("off"), Some(false));
/// assert_eq!(str2bool("maybe"), None);
/// ```
pub fn str2bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" | "y" | "t" => Some(true),
        "false" | "0" | "no" | "off" | "n" | "f" | "" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_mixed_quotes() {
        let pairs = AttrPairs::parse(r#"list="a, b" editStrip='true' showHidden = "no""#);
        assert_eq!(pairs.get("list"), Some("a, b"));
        assert_eq!(pairs.get("editStrip"), Some("true"));
        assert_eq!(pairs.get("showHidden"), Some("no"));
        assert_eq!(pairs.len(), 3);
    }

    #[test]
    fn test_parse_empty() {
        assert!(AttrPairs::parse("").is_empty());
        assert!(AttrPairs::parse("   ").is_empty());
    }

    #[test]
    fn test_duplicate_keys_last_wins() {
        let pairs = AttrPairs::parse(r#"a="1" a="2""#);
        assert_eq!(pairs.get("a"), Some("2"));
        assert_eq!(pairs.len(), 1);
    }

    #[test]
    fn test_data_and_dashed_keys() {
        let pairs = AttrPairs::parse(r#"data-role="grid" aria-label="x""#);
        assert_eq!(pairs.get("data-role"), Some("grid"));
        assert_eq!(pairs.get("aria-label"), Some("x"));
    }

    #[test]
    fn test_set_remove_merge() {
        let mut pairs: AttrPairs = [("class", "a"), ("id", "f")].into_iter().collect();
        pairs.set("class", "b");
        assert_eq!(pairs.to_source(), r#"class="b" id="f""#);
        assert_eq!(pairs.remove("id"), Some("f".to_string()));
        assert!(pairs.remove("id").is_none());

        let over = AttrPairs::parse(r#"class="c" method="get""#);
        pairs.merge(&over);
        assert_eq!(pairs.to_source(), r#"class="c" method="get""#);
    }

    #[test]
    fn test_str2bool() {
        assert_eq!(str2bool(" yes "), Some(true));
        assert_eq!(str2bool("1"), Some(true));
        assert_eq!(str2bool("False"), Some(false));
        assert_eq!(str2bool(""), Some(false));
        assert_eq!(str2bool("sometimes"), None);
    }
}

//! Template loaders.
//!
//! Forms name their templates by identifier (`default`, `compact`, ...). A
//! [`TemplateLoader`] turns an identifier plus a [`TemplateVariant`] into
//! template text: `<id>/insert.html` for insert and update forms,
//! `<id>/edit.html` for edit tables, falling back to `<id>` itself as a
//! direct file name or path.

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};

use formbuilder_core::{FormError, FormResult};

/// Which template of a template set to load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TemplateVariant {
    /// The insert/update form template.
    Insert,
    /// The edit table template.
    Edit,
}

impl TemplateVariant {
    /// Returns the file stem of this variant.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Insert => "insert",
            Self::Edit => "edit",
        }
    }
}

impl fmt::Display for TemplateVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Loads template source text by name.
pub trait TemplateLoader: Send + Sync {
    /// Loads the template (or asset) source with the given name.
    ///
    /// # Errors
    ///
    /// Returns [`FormError::Template`] if the template cannot be found.
    fn load(&self, name: &str) -> FormResult<String>;

    /// Loads the `variant` template of the template set `template`.
    ///
    /// Tries `<template>/<variant>.html` first, then `template` as given.
    fn load_form_template(&self, template: &str, variant: TemplateVariant) -> FormResult<String> {
        let template = template.trim();
        self.load(&format!("{template}/{variant}.html"))
            .or_else(|_| self.load(template))
            .map_err(|_| {
                FormError::Template(format!(
                    "No {variant} template found for '{template}'"
                ))
            })
    }
}

/// Loads templates from one or more directories on the filesystem.
///
/// Searches each configured directory in order and returns the first match.
/// Absolute paths are read directly.
#[derive(Debug, Clone, Default)]
pub struct FileSystemLoader {
    dirs: Vec<PathBuf>,
}

impl FileSystemLoader {
    /// Creates a loader searching the given directories.
    pub fn new(dirs: Vec<PathBuf>) -> Self {
        Self { dirs }
    }

    /// Returns the searched directories.
    pub fn dirs(&self) -> &[PathBuf] {
        &self.dirs
    }

    fn read(path: &Path) -> FormResult<String> {
        tracing::trace!(path = %path.display(), "loading template");
        std::fs::read_to_string(path).map_err(|e| {
            FormError::Template(format!("Error reading template '{}': {e}", path.display()))
        })
    }
}

impl TemplateLoader for FileSystemLoader {
    fn load(&self, name: &str) -> FormResult<String> {
        let direct = Path::new(name);
        if direct.is_absolute() {
            if direct.is_file() {
                return Self::read(direct);
            }
        } else {
            for dir in &self.dirs {
                let path = dir.join(name);
                if path.is_file() {
                    return Self::read(&path);
                }
            }
        }

        Err(FormError::Template(format!(
            "Template '{name}' not found in directories: {:?}",
            self.dirs
        )))
    }
}

/// Loads templates from an in-memory map of names to sources.
#[derive(Debug, Default)]
pub struct StringLoader {
    templates: RwLock<HashMap<String, String>>,
}

impl StringLoader {
    /// Creates an empty loader.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a loader from a map of names to sources.
    pub fn from_map(templates: HashMap<String, String>) -> Self {
        Self {
            templates: RwLock::new(templates),
        }
    }

    /// Adds or replaces a template.
    pub fn add(&self, name: impl Into<String>, source: impl Into<String>) {
        self.templates
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name.into(), source.into());
    }
}

impl TemplateLoader for StringLoader {
    fn load(&self, name: &str) -> FormResult<String> {
        self.templates
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
            .ok_or_else(|| FormError::Template(format!("Template '{name}' not found in StringLoader")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_string_loader_basic() {
        let loader = StringLoader::new();
        loader.add("default/insert.html", "{form}{fields}{/form}");
        assert_eq!(
            loader.load("default/insert.html").unwrap(),
            "{form}{fields}{/form}"
        );
        assert!(loader.load("missing").is_err());
    }

    #[test]
    fn test_form_template_variants() {
        let mut map = HashMap::new();
        map.insert("default/insert.html".to_string(), "insert".to_string());
        map.insert("default/edit.html".to_string(), "edit".to_string());
        map.insert("one-off.html".to_string(), "direct".to_string());
        let loader = StringLoader::from_map(map);

        assert_eq!(
            loader.load_form_template("default", TemplateVariant::Insert).unwrap(),
            "insert"
        );
        assert_eq!(
            loader.load_form_template(" default ", TemplateVariant::Edit).unwrap(),
            "edit"
        );
        assert_eq!(
            loader.load_form_template("one-off.html", TemplateVariant::Edit).unwrap(),
            "direct"
        );
        let err = loader
            .load_form_template("nope", TemplateVariant::Insert)
            .unwrap_err();
        assert!(err.to_string().contains("No insert template found for 'nope'"));
    }

    #[test]
    fn test_filesystem_loader_not_found() {
        let loader = FileSystemLoader::new(vec![PathBuf::from("/nonexistent/path")]);
        assert!(loader.load("missing.html").is_err());
    }

    #[test]
    fn test_filesystem_loader_with_temp_dir() {
        let dir = std::env::temp_dir().join("formbuilder_test_loader");
        let _ = std::fs::create_dir_all(dir.join("compact"));
        std::fs::write(dir.join("compact").join("edit.html"), "{rowLoop}{/rowLoop}").unwrap();

        let loader = FileSystemLoader::new(vec![dir.clone()]);
        assert_eq!(
            loader.load_form_template("compact", TemplateVariant::Edit).unwrap(),
            "{rowLoop}{/rowLoop}"
        );

        let absolute = dir.join("compact").join("edit.html");
        let empty = FileSystemLoader::default();
        assert!(empty.load(absolute.to_str().unwrap()).is_ok());

        let _ = std::fs::remove_dir_all(&dir);
    }
}

//! The registry of live form definitions.
//!
//! The registry is owned by one [`FormManager`](crate::manager::FormManager)
//! and lives as long as the request (or render context) that created it.

use std::collections::BTreeMap;

use formbuilder_core::{FormError, FormResult, Settings};

use crate::definition::{normalize_name, FormDefinition};

/// Named form definitions, unique by normalized name.
#[derive(Debug, Default)]
pub struct FormRegistry {
    forms: BTreeMap<String, FormDefinition>,
}

impl FormRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a new, empty form.
    ///
    /// # Errors
    ///
    /// Returns [`FormError::DuplicateName`] if the name is taken; the
    /// existing registration is left untouched.
    pub fn create(&mut self, name: &str, settings: &Settings) -> FormResult<&mut FormDefinition> {
        let form = FormDefinition::new(name, settings);
        self.insert(form)
    }

    /// Registers an already-built form.
    pub fn insert(&mut self, form: FormDefinition) -> FormResult<&mut FormDefinition> {
        use std::collections::btree_map::Entry;

        match self.forms.entry(form.name().to_string()) {
            Entry::Occupied(entry) => Err(FormError::DuplicateName(entry.key().clone())),
            Entry::Vacant(entry) => Ok(entry.insert(form)),
        }
    }

    /// Looks up a form by (unnormalized) name.
    pub fn get(&self, name: &str) -> Option<&FormDefinition> {
        self.forms.get(&normalize_name(name))
    }

    /// Looks up a form for modification.
    pub fn get_mut(&mut self, name: &str) -> Option<&mut FormDefinition> {
        self.forms.get_mut(&normalize_name(name))
    }

    /// Removes (destroys) a form.
    pub fn remove(&mut self, name: &str) -> Option<FormDefinition> {
        self.forms.remove(&normalize_name(name))
    }

    /// Returns `true` if a form with this name is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.forms.contains_key(&normalize_name(name))
    }

    /// Iterates forms ordered by name.
    pub fn iter(&self) -> impl Iterator<Item = &FormDefinition> {
        self.forms.values()
    }

    /// Returns the registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        self.forms.keys().map(String::as_str).collect()
    }

    /// Removes every form.
    pub fn clear(&mut self) {
        self.forms.clear();
    }

    /// Returns the number of forms.
    pub fn len(&self) -> usize {
        self.forms.len()
    }

    /// Returns `true` if no forms are registered.
    pub fn is_empty(&self) -> bool {
        self.forms.is_empty()
    }
}

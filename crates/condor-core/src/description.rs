//! Provenance: which module produced a value, and how callers name one.

use std::fmt;

/// Describes the module that serves a provider's datum.
///
/// Handles carry a reference to this alongside the value so that callers
/// (and error messages) can say where a value came from without asking
/// the producer.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ComponentDescription {
    /// Kind of module (its implementation name).
    pub module_type: String,
    /// Instance label of the module; empty for an unlabeled module.
    pub label: String,
}

impl ComponentDescription {
    /// Describe a module by type and instance label.
    pub fn new(module_type: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            module_type: module_type.into(),
            label: label.into(),
        }
    }

    /// The label used to name this module in messages: the instance label,
    /// or the module type when unlabeled.
    pub fn display_label(&self) -> &str {
        if self.label.is_empty() {
            &self.module_type
        } else {
            &self.label
        }
    }
}

impl fmt::Display for ComponentDescription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.label.is_empty() {
            write!(f, "{}", self.module_type)
        } else {
            write!(f, "{}/'{}'", self.module_type, self.label)
        }
    }
}

/// A caller's request tag: the module expected to serve the datum, plus
/// the datum's label.
///
/// An empty `module` accepts any producer. A non-empty one is checked
/// against the serving provider's [`ComponentDescription::label`].
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct InputTag {
    /// Expected serving module label, or empty for "any".
    pub module: String,
    /// Label of the requested datum.
    pub data: String,
}

impl InputTag {
    /// Tag naming both the serving module and the data label.
    pub fn new(module: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            module: module.into(),
            data: data.into(),
        }
    }

    /// Tag that accepts any serving module.
    pub fn data(data: impl Into<String>) -> Self {
        Self::new("", data)
    }
}

impl fmt::Display for InputTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.module, self.data)
    }
}

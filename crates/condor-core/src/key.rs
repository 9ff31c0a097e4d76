//! Data identities: [`TypeTag`], [`DataKey`], and [`RecordKey`].
//!
//! A requestable datum is identified by the pair (type, label). The type
//! half is a [`TypeTag`] derived from a Rust type at compile time; the
//! label disambiguates several producers of the same type.

use std::any::TypeId;
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// Runtime tag for a Rust type, carrying its name for diagnostics.
///
/// Equality and hashing use only the [`TypeId`]; the name is for
/// messages. Two tags built from the same type are always equal.
#[derive(Clone, Copy, Debug)]
pub struct TypeTag {
    id: TypeId,
    name: &'static str,
}

impl TypeTag {
    /// The tag for `T`.
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }

    /// The underlying [`TypeId`].
    pub fn type_id(&self) -> TypeId {
        self.id
    }

    /// Fully qualified type name, as reported by `std::any::type_name`.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Whether this tag was built from `T`.
    pub fn is<T: ?Sized + 'static>(&self) -> bool {
        self.id == TypeId::of::<T>()
    }
}

impl PartialEq for TypeTag {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeTag {}

impl Hash for TypeTag {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl PartialOrd for TypeTag {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TypeTag {
    fn cmp(&self, other: &Self) -> Ordering {
        // Name first so sorted key listings read alphabetically.
        self.name
            .cmp(other.name)
            .then_with(|| self.id.cmp(&other.id))
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// Full identity of a requestable datum: type plus optional label.
///
/// The empty label is the "unlabeled" default. Keys are immutable and
/// cheap to clone (the label is reference counted).
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DataKey {
    type_tag: TypeTag,
    label: Arc<str>,
}

impl DataKey {
    /// Build a key from an explicit tag and label.
    pub fn new(type_tag: TypeTag, label: impl Into<Arc<str>>) -> Self {
        Self {
            type_tag,
            label: label.into(),
        }
    }

    /// Key for type `T` with the given label.
    pub fn of<T: 'static>(label: impl Into<Arc<str>>) -> Self {
        Self::new(TypeTag::of::<T>(), label)
    }

    /// Key for type `T` with the empty label.
    pub fn unlabeled<T: 'static>() -> Self {
        Self::of::<T>("")
    }

    /// The type half of the identity.
    pub fn type_tag(&self) -> TypeTag {
        self.type_tag
    }

    /// The label half of the identity (possibly empty).
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Shared handle to the label, for cheap capture in closures.
    pub fn label_arc(&self) -> &Arc<str> {
        &self.label
    }
}

impl fmt::Display for DataKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, \"{}\")", self.type_tag, self.label)
    }
}

/// Stable identity of a record *kind* (not instance).
///
/// Used by orchestrators to route requests to the right record and by
/// error messages to say which record a failure came from.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RecordKey(Arc<str>);

impl RecordKey {
    /// Create a record key from its name.
    pub fn new(name: impl Into<Arc<str>>) -> Self {
        Self(name.into())
    }

    /// The record kind's name.
    pub fn name(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecordKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn type_tag_equality_follows_type() {
        assert_eq!(TypeTag::of::<i32>(), TypeTag::of::<i32>());
        assert_ne!(TypeTag::of::<i32>(), TypeTag::of::<u32>());
        assert!(TypeTag::of::<String>().is::<String>());
        assert!(TypeTag::of::<i32>().name().contains("i32"));
    }

    #[test]
    fn data_key_identity_is_type_and_label() {
        let a = DataKey::of::<i32>("a");
        let b = DataKey::of::<i32>("a");
        let c = DataKey::of::<i32>("c");
        let d = DataKey::of::<u32>("a");
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_ne!(a, d);

        let set: HashSet<DataKey> = [a, b, c, d].into_iter().collect();
        assert_eq!(set.len(), 3);
    }

    #[test]
    fn unlabeled_has_empty_label() {
        let k = DataKey::unlabeled::<f64>();
        assert_eq!(k.label(), "");
        assert!(k.type_tag().is::<f64>());
    }

    #[test]
    fn data_key_display_names_type_and_label() {
        let k = DataKey::of::<i32>("pedestals");
        assert_eq!(k.to_string(), "(i32, \"pedestals\")");
    }

    #[test]
    fn record_key_round_trip() {
        let r = RecordKey::new("CaloGeometryRecord");
        assert_eq!(r.name(), "CaloGeometryRecord");
        assert_eq!(r.to_string(), "CaloGeometryRecord");
        assert_eq!(r.clone(), r);
    }
}

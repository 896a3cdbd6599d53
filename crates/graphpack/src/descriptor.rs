//! Type identities, fingerprints and the descriptors that pair them with a
//! field layout.

use std::borrow::Borrow;
use std::fmt;
use std::sync::Arc;

/// Stable name of a type, independent of its schema version.
///
/// Clones share one allocation, so identities can be used freely as map keys
/// and carried inside every descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeIdentity(Arc<str>);

impl TypeIdentity {
    pub fn new(name: impl Into<Arc<str>>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for TypeIdentity {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for TypeIdentity {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for TypeIdentity {
    fn from(name: String) -> Self {
        Self::new(name)
    }
}

impl From<&TypeIdentity> for TypeIdentity {
    fn from(identity: &TypeIdentity) -> Self {
        identity.clone()
    }
}

impl fmt::Display for TypeIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Opaque 64-bit schema version token. Only equality is meaningful.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Fingerprint(u64);

impl Fingerprint {
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub const fn get(self) -> u64 {
        self.0
    }
}

impl From<u64> for Fingerprint {
    fn from(raw: u64) -> Self {
        Self(raw)
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

/// Wire shape of a single field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKind {
    Bool,
    Int,
    Long,
    Double,
    Str,
    Object,
}

impl FieldKind {
    pub const fn code(self) -> u8 {
        match self {
            FieldKind::Bool => 1,
            FieldKind::Int => 2,
            FieldKind::Long => 3,
            FieldKind::Double => 4,
            FieldKind::Str => 5,
            FieldKind::Object => 6,
        }
    }

    pub const fn from_code(code: u8) -> Option<Self> {
        Some(match code {
            1 => FieldKind::Bool,
            2 => FieldKind::Int,
            3 => FieldKind::Long,
            4 => FieldKind::Double,
            5 => FieldKind::Str,
            6 => FieldKind::Object,
            _ => return None,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldSpec {
    pub name: String,
    pub kind: FieldKind,
}

impl FieldSpec {
    pub fn new(name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }
}

/// Ordered field layout of one version of a type.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct FieldSchema(Vec<FieldSpec>);

impl FieldSchema {
    pub fn new(fields: impl IntoIterator<Item = FieldSpec>) -> Self {
        Self(fields.into_iter().collect())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, FieldSpec> {
        self.0.iter()
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.0.iter().position(|f| f.name == name)
    }
}

impl<'a> IntoIterator for &'a FieldSchema {
    type Item = &'a FieldSpec;
    type IntoIter = std::slice::Iter<'a, FieldSpec>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// One version of one type: identity, fingerprint and field layout.
///
/// Immutable once built. Descriptors read from a stream and descriptors
/// published by the running program have the same shape; which one wins for
/// a record is decided by [`DescriptorResolver`](crate::DescriptorResolver).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypeDescriptor {
    identity: TypeIdentity,
    fingerprint: Fingerprint,
    fields: FieldSchema,
}

impl TypeDescriptor {
    pub fn new(
        identity: impl Into<TypeIdentity>,
        fingerprint: impl Into<Fingerprint>,
        fields: FieldSchema,
    ) -> Self {
        Self {
            identity: identity.into(),
            fingerprint: fingerprint.into(),
            fields,
        }
    }

    pub fn identity(&self) -> &TypeIdentity {
        &self.identity
    }

    pub fn fingerprint(&self) -> Fingerprint {
        self.fingerprint
    }

    pub fn fields(&self) -> &FieldSchema {
        &self.fields
    }
}

/// Implemented by application types that publish their current descriptor.
pub trait Describe {
    fn descriptor() -> TypeDescriptor;
}

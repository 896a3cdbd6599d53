//! The host's view of locally-known types.

use std::collections::HashMap;
use std::sync::Arc;

use crate::descriptor::{Describe, TypeDescriptor, TypeIdentity};

/// What the running program knows about a type identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LocalType {
    /// The type exists and publishes its current descriptor.
    Described(Arc<TypeDescriptor>),
    /// The type exists but cannot describe its own layout.
    Opaque,
}

/// Lookup of local types by identity, injected into the resolver.
///
/// `None` means the identity names no local type at all.
pub trait TypeRegistry: Send + Sync {
    fn lookup(&self, identity: &TypeIdentity) -> Option<LocalType>;
}

/// Table-backed [`TypeRegistry`], filled once at startup.
#[derive(Debug, Default, Clone)]
pub struct LocalTypes {
    types: HashMap<TypeIdentity, LocalType>,
}

impl LocalTypes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `descriptor` as the current local version of its identity,
    /// replacing any earlier registration.
    pub fn register(&mut self, descriptor: TypeDescriptor) -> &mut Self {
        self.types.insert(
            descriptor.identity().clone(),
            LocalType::Described(Arc::new(descriptor)),
        );
        self
    }

    pub fn register_type<T: Describe>(&mut self) -> &mut Self {
        self.register(T::descriptor())
    }

    pub fn register_opaque(&mut self, identity: impl Into<TypeIdentity>) -> &mut Self {
        self.types.insert(identity.into(), LocalType::Opaque);
        self
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

impl TypeRegistry for LocalTypes {
    fn lookup(&self, identity: &TypeIdentity) -> Option<LocalType> {
        self.types.get(identity).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::{FieldKind, FieldSchema, FieldSpec, Fingerprint};

    struct Point;

    impl Describe for Point {
        fn descriptor() -> TypeDescriptor {
            TypeDescriptor::new(
                "geo.Point",
                Fingerprint::new(9),
                FieldSchema::new([
                    FieldSpec::new("x", FieldKind::Double),
                    FieldSpec::new("y", FieldKind::Double),
                ]),
            )
        }
    }

    #[test]
    fn lookup_distinguishes_missing_opaque_and_described() {
        let mut types = LocalTypes::new();
        types.register_type::<Point>().register_opaque("geo.Handle");

        assert_eq!(types.lookup(&TypeIdentity::from("geo.Missing")), None);
        assert_eq!(
            types.lookup(&TypeIdentity::from("geo.Handle")),
            Some(LocalType::Opaque)
        );
        match types.lookup(&TypeIdentity::from("geo.Point")) {
            Some(LocalType::Described(d)) => assert_eq!(d.fingerprint(), Fingerprint::new(9)),
            other => panic!("unexpected lookup result: {other:?}"),
        }
        assert_eq!(types.len(), 2);
    }

    #[test]
    fn shared_table_dispatches_through_trait_object() {
        let mut types = LocalTypes::new();
        types.register_type::<Point>();
        let shared: Arc<dyn TypeRegistry> = Arc::new(types);
        let identity = TypeIdentity::from("geo.Point");
        assert!(matches!(shared.lookup(&identity), Some(LocalType::Described(_))));
    }
}

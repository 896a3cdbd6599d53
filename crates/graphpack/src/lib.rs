//! Binary object-graph deserializer that tolerates schema fingerprint drift.
//!
//! Every object record in a graph stream names its type and carries the
//! fingerprint of the schema it was written with. When the running program's
//! type has moved on to a new fingerprint without changing its wire layout,
//! an operator can vouch for the old fingerprint with
//! [`FingerprintRegistry::allow`]; the [`DescriptorResolver`] then substitutes
//! the local descriptor for such records and decoding proceeds with the
//! current layout. Fingerprints nobody vouched for behave exactly as they
//! would without a resolver.
//!
//! ```
//! use std::sync::Arc;
//! use graphpack::*;
//!
//! let old = Arc::new(TypeDescriptor::new(
//!     "app.Foo",
//!     1u64,
//!     FieldSchema::new([FieldSpec::new("name", FieldKind::Str)]),
//! ));
//! let mut graph = ObjectGraph::new();
//! let foo = graph.add_object(old, vec![Value::from("uno")]);
//! let bytes = GraphSerializer::new().serialize(&graph, &Value::Ref(foo)).unwrap();
//!
//! let mut types = LocalTypes::new();
//! types.register(TypeDescriptor::new(
//!     "app.Foo",
//!     3u64,
//!     FieldSchema::new([FieldSpec::new("name", FieldKind::Str)]),
//! ));
//! let deser = VersionTolerantDeserializer::new(Arc::new(types));
//! assert!(deser.deserialize(&bytes).is_err());
//!
//! deser.allow_fingerprint("app.Foo", 1u64);
//! let doc = deser.deserialize(&bytes).unwrap();
//! let root = doc.root_instance().unwrap();
//! assert_eq!(root.descriptor().fingerprint(), Fingerprint::new(3));
//! assert_eq!(root.field::<String>(&doc.graph, "name").unwrap(), "uno");
//! ```

mod config;
mod descriptor;
mod deserializer;
mod error;
mod graph;
mod registry;
mod resolver;
mod types;

pub mod stream;

pub use config::{ConfigError, DecoderOptions};
pub use descriptor::{
    Describe, FieldKind, FieldSchema, FieldSpec, Fingerprint, TypeDescriptor, TypeIdentity,
};
pub use deserializer::{GraphSerializer, VersionTolerantDeserializer};
pub use error::{DecodeError, EncodeError, ExtractError, ResolveError};
pub use graph::{Document, FromGraph, Instance, Node, NodeId, ObjectGraph, Value};
pub use registry::FingerprintRegistry;
pub use resolver::{DescriptorResolver, Resolution};
pub use types::{LocalType, LocalTypes, TypeRegistry};

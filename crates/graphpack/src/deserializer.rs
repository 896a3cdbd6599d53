//! Allow-list driven deserializer and its serializer counterpart.

use std::io::Read;
use std::sync::Arc;

use crate::config::{ConfigError, DecoderOptions};
use crate::descriptor::{Describe, Fingerprint, TypeIdentity};
use crate::error::{DecodeError, EncodeError};
use crate::graph::{Document, FromGraph, ObjectGraph, Value};
use crate::registry::FingerprintRegistry;
use crate::resolver::DescriptorResolver;
use crate::stream::{GraphDecoder, GraphEncoder};
use crate::types::TypeRegistry;

/// Decodes graph streams, accepting records whose type fingerprint differs
/// from the local one when that fingerprint has been allowed for the type.
///
/// ```
/// use std::sync::Arc;
/// use graphpack::{FieldKind, FieldSchema, FieldSpec, LocalTypes, TypeDescriptor};
/// use graphpack::VersionTolerantDeserializer;
///
/// let mut types = LocalTypes::new();
/// types.register(TypeDescriptor::new(
///     "audit.MessageHistory",
///     0x13ca_ce7f_0d4e_2b82_u64,
///     FieldSchema::new([FieldSpec::new("entries", FieldKind::Object)]),
/// ));
///
/// let deser = VersionTolerantDeserializer::new(Arc::new(types));
/// deser.allow_fingerprint("audit.MessageHistory", 0x5f7e_2a10_9bc3_44d1_u64);
/// ```
#[derive(Debug, Clone)]
pub struct VersionTolerantDeserializer {
    resolver: DescriptorResolver,
    options: DecoderOptions,
}

impl VersionTolerantDeserializer {
    pub fn new(types: Arc<dyn TypeRegistry>) -> Self {
        Self::with_registry(types, Arc::new(FingerprintRegistry::new()))
    }

    /// Builds a deserializer over an allow-list shared with other
    /// deserializers.
    pub fn with_registry(
        types: Arc<dyn TypeRegistry>,
        alternates: Arc<FingerprintRegistry>,
    ) -> Self {
        Self {
            resolver: DescriptorResolver::new(alternates, types),
            options: DecoderOptions::default(),
        }
    }

    pub fn with_options(mut self, options: DecoderOptions) -> Result<Self, ConfigError> {
        options.validate()?;
        self.options = options;
        Ok(self)
    }

    pub fn options(&self) -> &DecoderOptions {
        &self.options
    }

    pub fn registry(&self) -> &Arc<FingerprintRegistry> {
        self.resolver.alternates()
    }

    pub fn resolver(&self) -> &DescriptorResolver {
        &self.resolver
    }

    /// Accepts `fingerprint` as an alternate for the type named `identity`.
    pub fn allow_fingerprint(
        &self,
        identity: impl Into<TypeIdentity>,
        fingerprint: impl Into<Fingerprint>,
    ) {
        self.registry().allow(identity, fingerprint);
    }

    /// Accepts `fingerprint` as an alternate for `T`.
    pub fn allow_type<T: Describe>(&self, fingerprint: impl Into<Fingerprint>) {
        self.registry()
            .allow(T::descriptor().identity().clone(), fingerprint);
    }

    pub fn deserialize(&self, bytes: &[u8]) -> Result<Document, DecodeError> {
        GraphDecoder::new(&self.resolver, &self.options).decode(bytes)
    }

    pub fn deserialize_from<R: Read>(&self, mut reader: R) -> Result<Document, DecodeError> {
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes)?;
        self.deserialize(&bytes)
    }

    /// Decodes `bytes` and extracts the root value as `T`.
    pub fn deserialize_as<T: FromGraph>(&self, bytes: &[u8]) -> Result<T, DecodeError> {
        Ok(self.deserialize(bytes)?.extract()?)
    }
}

/// Writes graph streams.
#[derive(Debug, Default)]
pub struct GraphSerializer {
    encoder: GraphEncoder,
}

impl GraphSerializer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn serialize(&mut self, graph: &ObjectGraph, root: &Value) -> Result<Vec<u8>, EncodeError> {
        self.encoder.encode(graph, root)
    }
}

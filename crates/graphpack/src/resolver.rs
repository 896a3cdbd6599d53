//! Chooses which descriptor the decoder uses for each stream record.

use std::sync::Arc;

use crate::descriptor::{Fingerprint, TypeDescriptor};
use crate::error::ResolveError;
use crate::registry::FingerprintRegistry;
use crate::types::{LocalType, TypeRegistry};

/// Descriptor the decoder must use for a record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// The stream's own descriptor, unchanged.
    Stream(Arc<TypeDescriptor>),
    /// The local descriptor, substituted for an allowed alternate fingerprint.
    Local(Arc<TypeDescriptor>),
    /// The stream's own descriptor, whose fingerprint differs from the local
    /// one and is not an allowed alternate.
    ///
    /// `allowed` is the registry snapshot the decision was taken against, so
    /// it never contains the stream fingerprint.
    Mismatch {
        stream: Arc<TypeDescriptor>,
        local: Fingerprint,
        allowed: Arc<Vec<Fingerprint>>,
    },
}

impl Resolution {
    /// Descriptor to lay the record's fields out with.
    pub fn descriptor(&self) -> &Arc<TypeDescriptor> {
        match self {
            Resolution::Stream(d) | Resolution::Local(d) => d,
            Resolution::Mismatch { stream, .. } => stream,
        }
    }

    pub fn into_descriptor(self) -> Arc<TypeDescriptor> {
        match self {
            Resolution::Stream(d) | Resolution::Local(d) => d,
            Resolution::Mismatch { stream, .. } => stream,
        }
    }

    /// Whether the local descriptor replaced the stream's.
    pub fn is_substituted(&self) -> bool {
        matches!(self, Resolution::Local(_))
    }
}

/// Decides, per stream descriptor, whether to keep it or substitute the local
/// descriptor of the same identity.
///
/// Substitution happens only when the stream fingerprint differs from the
/// local one and the [`FingerprintRegistry`] lists it for that identity. Any
/// other mismatch passes the stream descriptor through untouched, so the
/// decoder's own version check behaves exactly as if no resolver existed.
///
/// Holds no state of its own: every call reads the registry as it is at that
/// instant.
#[derive(Clone)]
pub struct DescriptorResolver {
    alternates: Arc<FingerprintRegistry>,
    types: Arc<dyn TypeRegistry>,
}

impl DescriptorResolver {
    /// Creates a resolver over a shared alternate registry and the host's
    /// local types. The registry may keep changing after this call.
    pub fn new(alternates: Arc<FingerprintRegistry>, types: Arc<dyn TypeRegistry>) -> Self {
        Self { alternates, types }
    }

    /// The alternate registry consulted on every mismatch.
    pub fn alternates(&self) -> &Arc<FingerprintRegistry> {
        &self.alternates
    }

    /// The host's local type table.
    pub fn types(&self) -> &Arc<dyn TypeRegistry> {
        &self.types
    }

    /// Picks the descriptor to decode `stream` with.
    ///
    /// Returns [`Resolution::Stream`] when the fingerprints match or the local
    /// type is opaque, [`Resolution::Local`] when the stream fingerprint is an
    /// allowed alternate, and [`Resolution::Mismatch`] for any other
    /// difference. Fails with [`ResolveError::UnknownType`] when the identity
    /// has no local type at all.
    pub fn resolve(&self, stream: Arc<TypeDescriptor>) -> Result<Resolution, ResolveError> {
        let local = match self.types.lookup(stream.identity()) {
            None => {
                return Err(ResolveError::UnknownType {
                    identity: stream.identity().clone(),
                })
            }
            // Never substitute an absent local layout.
            Some(LocalType::Opaque) => return Ok(Resolution::Stream(stream)),
            Some(LocalType::Described(local)) => local,
        };

        if stream.fingerprint() == local.fingerprint() {
            return Ok(Resolution::Stream(stream));
        }

        let allowed = self.alternates.alternates_for(stream.identity());
        if allowed.contains(&stream.fingerprint()) {
            tracing::debug!(
                identity = %stream.identity(),
                stream_fingerprint = %stream.fingerprint(),
                local_fingerprint = %local.fingerprint(),
                "substituting local descriptor for allowed alternate fingerprint"
            );
            return Ok(Resolution::Local(local));
        }

        Ok(Resolution::Mismatch {
            stream,
            local: local.fingerprint(),
            allowed,
        })
    }
}

impl std::fmt::Debug for DescriptorResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DescriptorResolver")
            .field("alternates", &self.alternates)
            .finish_non_exhaustive()
    }
}

//! Error types for resolution, stream decoding, encoding and extraction.

use graphpack_buffers::BufferError;
use thiserror::Error;

use crate::descriptor::{FieldKind, Fingerprint, TypeIdentity};

/// The only failure the resolver itself raises.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ResolveError {
    #[error("unknown type `{identity}`: no local type is registered under this identity")]
    UnknownType { identity: TypeIdentity },
}

/// Errors raised while decoding a graph stream.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error(transparent)]
    Buffer(#[from] BufferError),
    #[error(transparent)]
    Resolve(#[from] ResolveError),
    #[error(
        "schema incompatible for `{identity}`: stream fingerprint {stream}, local fingerprint {local}, allowed alternates {}",
        display_fingerprints(.allowed)
    )]
    SchemaIncompatible {
        identity: TypeIdentity,
        stream: Fingerprint,
        local: Fingerprint,
        allowed: Vec<Fingerprint>,
    },
    #[error("not a graph stream: bad magic bytes")]
    BadMagic,
    #[error("unsupported stream version {0}")]
    UnsupportedVersion(u8),
    #[error("unexpected tag 0x{tag:02x} at offset {offset}")]
    UnexpectedTag { tag: u8, offset: usize },
    #[error("unknown field kind code {code} in descriptor for `{identity}`")]
    UnknownFieldKind { identity: TypeIdentity, code: u8 },
    #[error("invalid handle {0}")]
    InvalidHandle(u32),
    #[error("handle {0} does not refer to a type descriptor")]
    NotADescriptor(u32),
    #[error("handle {0} refers to a type descriptor, expected a value")]
    DescriptorAsValue(u32),
    #[error("nesting depth exceeds the configured maximum of {0}")]
    DepthExceeded(usize),
    #[error("handle count exceeds the configured maximum of {0}")]
    TooManyHandles(usize),
    #[error("{0} trailing byte(s) after the root value")]
    TrailingBytes(usize),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Extract(#[from] ExtractError),
}

fn display_fingerprints(fingerprints: &[Fingerprint]) -> String {
    let parts: Vec<String> = fingerprints.iter().map(ToString::to_string).collect();
    format!("[{}]", parts.join(", "))
}

/// Errors raised while writing a graph stream.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EncodeError {
    #[error("instance of `{identity}` has {actual} field value(s), schema declares {expected}")]
    FieldCount {
        identity: TypeIdentity,
        expected: usize,
        actual: usize,
    },
    #[error("field `{field}` of `{identity}` is declared {expected:?} but holds an incompatible value")]
    FieldKind {
        identity: TypeIdentity,
        field: String,
        expected: FieldKind,
    },
    #[error("`{identity}` fingerprint {fingerprint} appears with two different field layouts")]
    ConflictingDescriptor {
        identity: TypeIdentity,
        fingerprint: Fingerprint,
    },
    #[error("primitive value in a reference position")]
    PrimitiveInReferenceSlot,
    #[error("reference to node {0} which is not in the graph")]
    DanglingRef(u32),
    #[error("string of {0} bytes does not fit a length prefix")]
    TooLong(usize),
}

/// Errors raised while turning decoded values into application types.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ExtractError {
    #[error("expected {expected}, found {found}")]
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
    },
    #[error("`{identity}` has no field `{field}`")]
    MissingField {
        identity: TypeIdentity,
        field: String,
    },
    #[error("expected an instance of `{expected}`, found `{found}`")]
    WrongType {
        expected: TypeIdentity,
        found: TypeIdentity,
    },
    #[error("reference to node {0} which is not in the graph")]
    DanglingRef(u32),
}

//! Graph stream decoder.

use std::sync::Arc;

use graphpack_buffers::Reader;

use super::constants::*;
use crate::config::DecoderOptions;
use crate::descriptor::{
    FieldKind, FieldSchema, FieldSpec, Fingerprint, TypeDescriptor, TypeIdentity,
};
use crate::error::DecodeError;
use crate::graph::{Document, Node, NodeId, ObjectGraph, Value};
use crate::resolver::{DescriptorResolver, Resolution};

enum Handle {
    Descriptor(Arc<TypeDescriptor>),
    Node(NodeId),
}

/// Reads graph streams, consulting a [`DescriptorResolver`] once for every
/// descriptor the stream introduces.
///
/// After resolution the decoder applies its own version check: a descriptor
/// whose fingerprint differs from the local type's fails with
/// [`DecodeError::SchemaIncompatible`]. Field bytes are always read with the
/// resolved descriptor's layout.
pub struct GraphDecoder<'a> {
    resolver: &'a DescriptorResolver,
    options: &'a DecoderOptions,
}

impl<'a> GraphDecoder<'a> {
    pub fn new(resolver: &'a DescriptorResolver, options: &'a DecoderOptions) -> Self {
        Self { resolver, options }
    }

    pub fn decode(&self, data: &[u8]) -> Result<Document, DecodeError> {
        let mut session = Session {
            reader: Reader::new(data),
            resolver: self.resolver,
            options: self.options,
            handles: Vec::new(),
            graph: ObjectGraph::new(),
            depth: 0,
        };
        session.read_header()?;
        let root = session.read_value()?;
        let trailing = session.reader.size();
        if trailing > 0 && !self.options.allow_trailing_bytes {
            return Err(DecodeError::TrailingBytes(trailing));
        }
        Ok(Document {
            graph: session.graph,
            root,
        })
    }
}

/// Per-stream state: the handle table and the graph under construction.
struct Session<'r, 'a> {
    reader: Reader<'r>,
    resolver: &'a DescriptorResolver,
    options: &'a DecoderOptions,
    handles: Vec<Handle>,
    graph: ObjectGraph,
    depth: usize,
}

impl Session<'_, '_> {
    fn read_header(&mut self) -> Result<(), DecodeError> {
        if self.reader.buf(MAGIC.len())? != MAGIC {
            return Err(DecodeError::BadMagic);
        }
        match self.reader.u8()? {
            VERSION => Ok(()),
            other => Err(DecodeError::UnsupportedVersion(other)),
        }
    }

    fn assign(&mut self, handle: Handle) -> Result<(), DecodeError> {
        if self.handles.len() >= self.options.max_handles {
            return Err(DecodeError::TooManyHandles(self.options.max_handles));
        }
        self.handles.push(handle);
        Ok(())
    }

    fn handle(&self, index: u32) -> Result<&Handle, DecodeError> {
        self.handles
            .get(index as usize)
            .ok_or(DecodeError::InvalidHandle(index))
    }

    fn enter(&mut self) -> Result<(), DecodeError> {
        if self.depth >= self.options.max_depth {
            return Err(DecodeError::DepthExceeded(self.options.max_depth));
        }
        self.depth += 1;
        Ok(())
    }

    fn leave(&mut self) {
        self.depth -= 1;
    }

    fn read_str16(&mut self) -> Result<String, DecodeError> {
        let len = self.reader.u16()? as usize;
        Ok(self.reader.utf8(len)?.to_owned())
    }

    fn read_value(&mut self) -> Result<Value, DecodeError> {
        let offset = self.reader.x;
        match self.reader.u8()? {
            TAG_NULL => Ok(Value::Null),
            TAG_STRING => {
                let len = self.reader.u32()? as usize;
                Ok(Value::Str(self.reader.utf8(len)?.to_owned()))
            }
            TAG_REFERENCE => {
                let index = self.reader.u32()?;
                match self.handle(index)? {
                    Handle::Node(id) => Ok(Value::Ref(*id)),
                    Handle::Descriptor(_) => Err(DecodeError::DescriptorAsValue(index)),
                }
            }
            TAG_OBJECT => self.read_object(),
            TAG_LIST => self.read_list(),
            tag => Err(DecodeError::UnexpectedTag { tag, offset }),
        }
    }

    fn read_object(&mut self) -> Result<Value, DecodeError> {
        self.enter()?;
        let descriptor = self.read_descriptor()?;
        let id = self.graph.add_object(Arc::clone(&descriptor), Vec::new());
        self.assign(Handle::Node(id))?;
        let mut values = Vec::with_capacity(descriptor.fields().len());
        for field in descriptor.fields() {
            values.push(self.read_field(field.kind)?);
        }
        if let Some(instance) = self.graph.instance_mut(id) {
            instance.fill(values);
        }
        self.leave();
        Ok(Value::Ref(id))
    }

    fn read_list(&mut self) -> Result<Value, DecodeError> {
        self.enter()?;
        let id = self.graph.add_list(Vec::new());
        self.assign(Handle::Node(id))?;
        let count = self.reader.u32()? as usize;
        // Each element takes at least one byte.
        let mut values = Vec::with_capacity(count.min(self.reader.size()));
        for _ in 0..count {
            values.push(self.read_value()?);
        }
        if let Some(Node::List(slot)) = self.graph.get_mut(id) {
            *slot = values;
        }
        self.leave();
        Ok(Value::Ref(id))
    }

    fn read_field(&mut self, kind: FieldKind) -> Result<Value, DecodeError> {
        Ok(match kind {
            FieldKind::Bool => Value::Bool(self.reader.u8()? != 0),
            FieldKind::Int => Value::Int(self.reader.i32()?),
            FieldKind::Long => Value::Long(self.reader.i64()?),
            FieldKind::Double => Value::Double(self.reader.f64()?),
            FieldKind::Str => {
                let offset = self.reader.x;
                match self.reader.peek()? {
                    TAG_NULL | TAG_STRING => self.read_value()?,
                    tag => return Err(DecodeError::UnexpectedTag { tag, offset }),
                }
            }
            FieldKind::Object => self.read_value()?,
        })
    }

    fn read_descriptor(&mut self) -> Result<Arc<TypeDescriptor>, DecodeError> {
        let offset = self.reader.x;
        match self.reader.u8()? {
            TAG_DESCRIPTOR => self.read_new_descriptor(),
            TAG_REFERENCE => {
                let index = self.reader.u32()?;
                match self.handle(index)? {
                    Handle::Descriptor(descriptor) => Ok(Arc::clone(descriptor)),
                    Handle::Node(_) => Err(DecodeError::NotADescriptor(index)),
                }
            }
            tag => Err(DecodeError::UnexpectedTag { tag, offset }),
        }
    }

    fn read_new_descriptor(&mut self) -> Result<Arc<TypeDescriptor>, DecodeError> {
        let identity = TypeIdentity::from(self.read_str16()?);
        let fingerprint = Fingerprint::new(self.reader.u64()?);
        let count = self.reader.u16()?;
        let mut fields = Vec::with_capacity(count as usize);
        for _ in 0..count {
            let code = self.reader.u8()?;
            let kind = FieldKind::from_code(code).ok_or_else(|| DecodeError::UnknownFieldKind {
                identity: identity.clone(),
                code,
            })?;
            fields.push(FieldSpec::new(self.read_str16()?, kind));
        }
        let stream = Arc::new(TypeDescriptor::new(
            identity,
            fingerprint,
            FieldSchema::new(fields),
        ));

        let resolution = self.resolver.resolve(stream)?;
        let substituted = resolution.is_substituted();
        let descriptor = check_version(resolution)?;
        tracing::trace!(
            identity = %descriptor.identity(),
            fingerprint = %descriptor.fingerprint(),
            handle = self.handles.len(),
            substituted,
            "interned descriptor"
        );
        self.assign(Handle::Descriptor(Arc::clone(&descriptor)))?;
        Ok(descriptor)
    }
}

/// The decoder's own compatibility rule, independent of any allow-list.
fn check_version(resolution: Resolution) -> Result<Arc<TypeDescriptor>, DecodeError> {
    match resolution {
        Resolution::Mismatch {
            stream,
            local,
            allowed,
        } => Err(DecodeError::SchemaIncompatible {
            identity: stream.identity().clone(),
            stream: stream.fingerprint(),
            local,
            allowed: allowed.to_vec(),
        }),
        resolution => Ok(resolution.into_descriptor()),
    }
}

//! Graph stream encoder.

use std::collections::HashMap;
use std::sync::Arc;

use graphpack_buffers::Writer;

use super::constants::*;
use crate::descriptor::{FieldKind, FieldSpec, Fingerprint, TypeDescriptor, TypeIdentity};
use crate::error::EncodeError;
use crate::graph::{Node, NodeId, ObjectGraph, Value};

/// Writes an [`ObjectGraph`] value as a graph stream.
///
/// Descriptors are written once per (identity, fingerprint) and nodes once
/// per [`NodeId`]; later occurrences become back-references. Two descriptors
/// sharing an identity and fingerprint must also share a field layout.
#[derive(Debug, Default)]
pub struct GraphEncoder {
    pub writer: Writer,
    descriptors: HashMap<(TypeIdentity, Fingerprint), (u32, Arc<TypeDescriptor>)>,
    nodes: HashMap<NodeId, u32>,
    next_handle: u32,
}

impl GraphEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn encode(&mut self, graph: &ObjectGraph, root: &Value) -> Result<Vec<u8>, EncodeError> {
        self.reset();
        self.writer.buf(&MAGIC);
        self.writer.u8(VERSION);
        let written = self.write_value(graph, root);
        let bytes = self.writer.flush();
        written.map(|()| bytes)
    }

    fn reset(&mut self) {
        self.writer.reset();
        self.descriptors.clear();
        self.nodes.clear();
        self.next_handle = 0;
    }

    fn next_handle(&mut self) -> u32 {
        let handle = self.next_handle;
        self.next_handle += 1;
        handle
    }

    fn write_reference(&mut self, handle: u32) {
        self.writer.u8(TAG_REFERENCE);
        self.writer.u32(handle);
    }

    fn write_value(&mut self, graph: &ObjectGraph, value: &Value) -> Result<(), EncodeError> {
        match value {
            Value::Null => self.writer.u8(TAG_NULL),
            Value::Str(s) => self.write_string(s)?,
            Value::Ref(id) => self.write_node(graph, *id)?,
            Value::Bool(_) | Value::Int(_) | Value::Long(_) | Value::Double(_) => {
                return Err(EncodeError::PrimitiveInReferenceSlot)
            }
        }
        Ok(())
    }

    fn write_string(&mut self, s: &str) -> Result<(), EncodeError> {
        let len = u32::try_from(s.len()).map_err(|_| EncodeError::TooLong(s.len()))?;
        self.writer.u8(TAG_STRING);
        self.writer.u32(len);
        self.writer.utf8(s);
        Ok(())
    }

    fn write_str16(&mut self, s: &str) -> Result<(), EncodeError> {
        let len = u16::try_from(s.len()).map_err(|_| EncodeError::TooLong(s.len()))?;
        self.writer.u16(len);
        self.writer.utf8(s);
        Ok(())
    }

    fn write_node(&mut self, graph: &ObjectGraph, id: NodeId) -> Result<(), EncodeError> {
        if let Some(&handle) = self.nodes.get(&id) {
            self.write_reference(handle);
            return Ok(());
        }
        match graph.get(id).ok_or(EncodeError::DanglingRef(id.index()))? {
            Node::Object(instance) => {
                let descriptor = instance.descriptor();
                let expected = descriptor.fields().len();
                if instance.values().len() != expected {
                    return Err(EncodeError::FieldCount {
                        identity: descriptor.identity().clone(),
                        expected,
                        actual: instance.values().len(),
                    });
                }
                self.writer.u8(TAG_OBJECT);
                self.write_descriptor(descriptor)?;
                let handle = self.next_handle();
                self.nodes.insert(id, handle);
                for (spec, value) in descriptor.fields().iter().zip(instance.values()) {
                    self.write_field(graph, descriptor, spec, value)?;
                }
            }
            Node::List(values) => {
                let count =
                    u32::try_from(values.len()).map_err(|_| EncodeError::TooLong(values.len()))?;
                self.writer.u8(TAG_LIST);
                let handle = self.next_handle();
                self.nodes.insert(id, handle);
                self.writer.u32(count);
                for value in values {
                    self.write_value(graph, value)?;
                }
            }
        }
        Ok(())
    }

    fn write_descriptor(&mut self, descriptor: &Arc<TypeDescriptor>) -> Result<(), EncodeError> {
        let key = (descriptor.identity().clone(), descriptor.fingerprint());
        if let Some((handle, interned)) = self.descriptors.get(&key) {
            if interned.fields() != descriptor.fields() {
                return Err(EncodeError::ConflictingDescriptor {
                    identity: key.0,
                    fingerprint: key.1,
                });
            }
            let handle = *handle;
            self.write_reference(handle);
            return Ok(());
        }
        let count = u16::try_from(descriptor.fields().len())
            .map_err(|_| EncodeError::TooLong(descriptor.fields().len()))?;
        self.writer.u8(TAG_DESCRIPTOR);
        self.write_str16(descriptor.identity().as_str())?;
        self.writer.u64(descriptor.fingerprint().get());
        self.writer.u16(count);
        for field in descriptor.fields() {
            self.writer.u8(field.kind.code());
            self.write_str16(&field.name)?;
        }
        let handle = self.next_handle();
        self.descriptors.insert(key, (handle, Arc::clone(descriptor)));
        Ok(())
    }

    fn write_field(
        &mut self,
        graph: &ObjectGraph,
        descriptor: &TypeDescriptor,
        spec: &FieldSpec,
        value: &Value,
    ) -> Result<(), EncodeError> {
        match (spec.kind, value) {
            (FieldKind::Bool, Value::Bool(b)) => self.writer.u8(u8::from(*b)),
            (FieldKind::Int, Value::Int(v)) => self.writer.i32(*v),
            (FieldKind::Long, Value::Long(v)) => self.writer.i64(*v),
            (FieldKind::Double, Value::Double(v)) => self.writer.f64(*v),
            (FieldKind::Str, Value::Null | Value::Str(_))
            | (FieldKind::Object, Value::Null | Value::Str(_) | Value::Ref(_)) => {
                self.write_value(graph, value)?
            }
            (expected, _) => {
                return Err(EncodeError::FieldKind {
                    identity: descriptor.identity().clone(),
                    field: spec.name.clone(),
                    expected,
                })
            }
        }
        Ok(())
    }
}

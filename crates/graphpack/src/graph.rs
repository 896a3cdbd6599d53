//! Arena-backed object graphs.
//!
//! Objects and lists live in an [`ObjectGraph`] and refer to each other by
//! [`NodeId`], which lets decoded graphs contain shared and cyclic
//! references without reference-counted cells.

use std::sync::Arc;

use crate::descriptor::{TypeDescriptor, TypeIdentity};
use crate::error::ExtractError;

/// Index of a node in an [`ObjectGraph`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
    pub fn index(self) -> u32 {
        self.0
    }
}

/// A field, list element or root value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i32),
    Long(i64),
    Double(f64),
    Str(String),
    Ref(NodeId),
}

impl Value {
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Long(_) => "long",
            Value::Double(_) => "double",
            Value::Str(_) => "string",
            Value::Ref(_) => "reference",
        }
    }

    pub fn as_ref_id(&self) -> Option<NodeId> {
        match self {
            Value::Ref(id) => Some(*id),
            _ => None,
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_owned())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<NodeId> for Value {
    fn from(id: NodeId) -> Self {
        Value::Ref(id)
    }
}

/// An object: the descriptor it was read with and its field values in the
/// descriptor's field order.
#[derive(Debug, Clone, PartialEq)]
pub struct Instance {
    descriptor: Arc<TypeDescriptor>,
    values: Vec<Value>,
}

impl Instance {
    pub fn new(descriptor: Arc<TypeDescriptor>, values: Vec<Value>) -> Self {
        Self { descriptor, values }
    }

    pub fn descriptor(&self) -> &Arc<TypeDescriptor> {
        &self.descriptor
    }

    pub fn identity(&self) -> &TypeIdentity {
        self.descriptor.identity()
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.descriptor
            .fields()
            .position(name)
            .and_then(|i| self.values.get(i))
    }

    /// Sets field `name`, returning `false` when the descriptor has no such
    /// field.
    pub fn set(&mut self, name: &str, value: Value) -> bool {
        match self.descriptor.fields().position(name) {
            Some(i) if i < self.values.len() => {
                self.values[i] = value;
                true
            }
            _ => false,
        }
    }

    /// Extracts field `name` as `T`.
    pub fn field<T: FromGraph>(&self, graph: &ObjectGraph, name: &str) -> Result<T, ExtractError> {
        let value = self.get(name).ok_or_else(|| ExtractError::MissingField {
            identity: self.identity().clone(),
            field: name.to_owned(),
        })?;
        T::from_graph(graph, value)
    }

    pub(crate) fn fill(&mut self, values: Vec<Value>) {
        self.values = values;
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Object(Instance),
    List(Vec<Value>),
}

/// Arena of objects and lists.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObjectGraph {
    nodes: Vec<Node>,
}

impl ObjectGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn push(&mut self, node: Node) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(node);
        id
    }

    pub fn add_object(&mut self, descriptor: Arc<TypeDescriptor>, values: Vec<Value>) -> NodeId {
        self.push(Node::Object(Instance::new(descriptor, values)))
    }

    pub fn add_list(&mut self, values: Vec<Value>) -> NodeId {
        self.push(Node::List(values))
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0 as usize)
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id.0 as usize)
    }

    pub fn instance(&self, id: NodeId) -> Option<&Instance> {
        match self.get(id)? {
            Node::Object(instance) => Some(instance),
            Node::List(_) => None,
        }
    }

    pub fn instance_mut(&mut self, id: NodeId) -> Option<&mut Instance> {
        match self.get_mut(id)? {
            Node::Object(instance) => Some(instance),
            Node::List(_) => None,
        }
    }

    pub fn list(&self, id: NodeId) -> Option<&[Value]> {
        match self.get(id)? {
            Node::List(values) => Some(values),
            Node::Object(_) => None,
        }
    }

    /// Follows `value` to an instance.
    pub fn resolve_instance(&self, value: &Value) -> Result<&Instance, ExtractError> {
        let id = expect_ref(value)?;
        match self.get(id) {
            Some(Node::Object(instance)) => Ok(instance),
            Some(Node::List(_)) => Err(ExtractError::TypeMismatch {
                expected: "object",
                found: "list",
            }),
            None => Err(ExtractError::DanglingRef(id.0)),
        }
    }

    /// Like [`resolve_instance`](Self::resolve_instance), also checking the
    /// instance's identity.
    pub fn instance_of(
        &self,
        value: &Value,
        identity: &TypeIdentity,
    ) -> Result<&Instance, ExtractError> {
        let instance = self.resolve_instance(value)?;
        if instance.identity() != identity {
            return Err(ExtractError::WrongType {
                expected: identity.clone(),
                found: instance.identity().clone(),
            });
        }
        Ok(instance)
    }
}

fn expect_ref(value: &Value) -> Result<NodeId, ExtractError> {
    value.as_ref_id().ok_or(ExtractError::TypeMismatch {
        expected: "reference",
        found: value.kind_name(),
    })
}

/// Builds an application value out of a decoded graph value.
pub trait FromGraph: Sized {
    fn from_graph(graph: &ObjectGraph, value: &Value) -> Result<Self, ExtractError>;
}

macro_rules! from_graph_primitive {
    ($ty:ty, $variant:ident, $name:literal) => {
        impl FromGraph for $ty {
            fn from_graph(_graph: &ObjectGraph, value: &Value) -> Result<Self, ExtractError> {
                match value {
                    Value::$variant(v) => Ok(v.to_owned()),
                    other => Err(ExtractError::TypeMismatch {
                        expected: $name,
                        found: other.kind_name(),
                    }),
                }
            }
        }
    };
}

from_graph_primitive!(bool, Bool, "bool");
from_graph_primitive!(i32, Int, "int");
from_graph_primitive!(i64, Long, "long");
from_graph_primitive!(f64, Double, "double");
from_graph_primitive!(String, Str, "string");

impl<T: FromGraph> FromGraph for Option<T> {
    fn from_graph(graph: &ObjectGraph, value: &Value) -> Result<Self, ExtractError> {
        match value {
            Value::Null => Ok(None),
            other => T::from_graph(graph, other).map(Some),
        }
    }
}

impl<T: FromGraph> FromGraph for Vec<T> {
    fn from_graph(graph: &ObjectGraph, value: &Value) -> Result<Self, ExtractError> {
        let id = expect_ref(value)?;
        match graph.get(id) {
            Some(Node::List(values)) => values.iter().map(|v| T::from_graph(graph, v)).collect(),
            Some(Node::Object(_)) => Err(ExtractError::TypeMismatch {
                expected: "list",
                found: "object",
            }),
            None => Err(ExtractError::DanglingRef(id.0)),
        }
    }
}

/// A decoded stream: its graph and the root value.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub graph: ObjectGraph,
    pub root: Value,
}

impl Document {
    pub fn root_instance(&self) -> Result<&Instance, ExtractError> {
        self.graph.resolve_instance(&self.root)
    }

    pub fn extract<T: FromGraph>(&self) -> Result<T, ExtractError> {
        T::from_graph(&self.graph, &self.root)
    }
}

// SPDX-License-Identifier: MIT OR Apache-2.0
//! Type semantics describing how a property decomposes into slots.
//!
//! Semantics decide:
//! - which children a slot has
//! - which value a slot owns and its default
//! - which outputs an input may link to
//! - whether a composite value must be refreshed when a child changes

use crate::error::Result;
use crate::expression::Expression;
use crate::graph::SlotGraph;
use crate::slot::SlotId;
use crate::value::{SlotValue, ValueType};
use std::fmt;
use std::sync::Arc;

/// Semantic type of a property
pub trait TypeSemantics: fmt::Debug + Send + Sync {
    /// Unique type identifier
    fn id(&self) -> &str;

    /// Value type of the slot's own value
    fn value_type(&self) -> ValueType;

    /// Child properties, `None` for leaf types
    fn children(&self) -> Option<Vec<PropertyDescriptor>> {
        None
    }

    /// Create the owned value of a freshly built slot.
    ///
    /// Children already exist when this is called.
    fn create_value(&self, graph: &SlotGraph, slot: SlotId) -> Result<Option<Expression>>;

    /// Apply the default value.
    ///
    /// Returns `true` when the default was assigned at this level and the
    /// children must be left alone.
    fn default(&self, _graph: &mut SlotGraph, _slot: SlotId) -> Result<bool> {
        Ok(false)
    }

    /// Check if an input of this type can read from an output of `other`
    fn can_link(&self, other: &dyn TypeSemantics) -> bool {
        if self.id() == other.id() {
            return true;
        }
        self.value_type().is_concrete() && self.value_type() == other.value_type()
    }

    /// Whether the slot's proxy value was regenerated after a child changed,
    /// requiring the change to escalate to this slot
    fn update_proxy(&self, _graph: &SlotGraph, _slot: SlotId) -> bool {
        false
    }
}

/// Name and semantics of one property
#[derive(Debug, Clone)]
pub struct PropertyDescriptor {
    /// Property name
    pub name: String,
    /// Semantic type
    pub semantics: Arc<dyn TypeSemantics>,
}

impl PropertyDescriptor {
    /// Create a property descriptor
    pub fn new(name: impl Into<String>, semantics: Arc<dyn TypeSemantics>) -> Self {
        Self {
            name: name.into(),
            semantics,
        }
    }
}

/// Single-valued type (float, int, uint, bool)
#[derive(Debug, Clone)]
pub struct ScalarSemantics {
    id: String,
    default: SlotValue,
}

impl ScalarSemantics {
    /// Create a scalar type with a default value
    pub fn new(id: impl Into<String>, default: SlotValue) -> Self {
        Self {
            id: id.into(),
            default,
        }
    }

    /// Float scalar
    pub fn float(default: f32) -> Self {
        Self::new("float", SlotValue::Float(default))
    }

    /// Signed integer scalar
    pub fn int(default: i32) -> Self {
        Self::new("int", SlotValue::Int(default))
    }

    /// Unsigned integer scalar
    pub fn uint(default: u32) -> Self {
        Self::new("uint", SlotValue::Uint(default))
    }

    /// Boolean scalar
    pub fn bool(default: bool) -> Self {
        Self::new("bool", SlotValue::Bool(default))
    }

    /// Default value
    pub fn default_value(&self) -> &SlotValue {
        &self.default
    }
}

impl TypeSemantics for ScalarSemantics {
    fn id(&self) -> &str {
        &self.id
    }

    fn value_type(&self) -> ValueType {
        self.default.value_type()
    }

    fn create_value(&self, _graph: &SlotGraph, _slot: SlotId) -> Result<Option<Expression>> {
        Ok(SlotValue::zero(self.value_type()).map(Expression::constant))
    }

    fn default(&self, graph: &mut SlotGraph, slot: SlotId) -> Result<bool> {
        graph.set_slot_value(slot, self.default.clone())?;
        Ok(true)
    }
}

/// Float vector made of one float child per component
#[derive(Debug, Clone)]
pub struct VectorSemantics {
    id: String,
    components: Vec<String>,
    default: Vec<f32>,
}

impl VectorSemantics {
    /// Create a vector type. Returns `None` unless there are 2 to 4
    /// components and one default per component.
    pub fn new(id: impl Into<String>, components: Vec<String>, default: Vec<f32>) -> Option<Self> {
        if !(2..=4).contains(&components.len()) || components.len() != default.len() {
            return None;
        }
        Some(Self {
            id: id.into(),
            components,
            default,
        })
    }

    fn with_names(id: &str, names: &[&str], default: Vec<f32>) -> Self {
        Self {
            id: id.to_string(),
            components: names.iter().map(|n| (*n).to_string()).collect(),
            default,
        }
    }

    /// 2D vector (x, y)
    pub fn float2(default: [f32; 2]) -> Self {
        Self::with_names("float2", &["x", "y"], default.to_vec())
    }

    /// 3D vector (x, y, z)
    pub fn float3(default: [f32; 3]) -> Self {
        Self::with_names("float3", &["x", "y", "z"], default.to_vec())
    }

    /// 4D vector (x, y, z, w)
    pub fn float4(default: [f32; 4]) -> Self {
        Self::with_names("float4", &["x", "y", "z", "w"], default.to_vec())
    }

    /// RGBA color (r, g, b, a)
    pub fn color(default: [f32; 4]) -> Self {
        Self::with_names("color", &["r", "g", "b", "a"], default.to_vec())
    }

    /// Component names
    pub fn components(&self) -> &[String] {
        &self.components
    }
}

impl TypeSemantics for VectorSemantics {
    fn id(&self) -> &str {
        &self.id
    }

    fn value_type(&self) -> ValueType {
        ValueType::float_vector(self.components.len()).unwrap_or(ValueType::None)
    }

    fn children(&self) -> Option<Vec<PropertyDescriptor>> {
        let component: Arc<dyn TypeSemantics> = Arc::new(ScalarSemantics::float(0.0));
        Some(
            self.components
                .iter()
                .map(|name| PropertyDescriptor::new(name.clone(), Arc::clone(&component)))
                .collect(),
        )
    }

    fn create_value(&self, graph: &SlotGraph, slot: SlotId) -> Result<Option<Expression>> {
        let children = graph.slot(slot)?.children().to_vec();
        Ok(Some(Expression::combine(self.value_type(), children)))
    }

    fn default(&self, graph: &mut SlotGraph, slot: SlotId) -> Result<bool> {
        let children = graph.slot(slot)?.children().to_vec();
        for (child, value) in children.into_iter().zip(&self.default) {
            graph.set_value(child, *value)?;
        }
        Ok(true)
    }

    // The combined value follows the link state of every component.
    fn update_proxy(&self, _graph: &SlotGraph, _slot: SlotId) -> bool {
        true
    }
}

/// Structure of named fields without a value of its own
#[derive(Debug, Clone)]
pub struct CompositeSemantics {
    id: String,
    fields: Vec<PropertyDescriptor>,
}

impl CompositeSemantics {
    /// Create a composite type from its fields
    pub fn new(id: impl Into<String>, fields: Vec<PropertyDescriptor>) -> Self {
        Self {
            id: id.into(),
            fields,
        }
    }

    /// Sphere (center, radius)
    pub fn sphere() -> Self {
        Self::new(
            "sphere",
            vec![
                PropertyDescriptor::new("center", Arc::new(VectorSemantics::float3([0.0; 3]))),
                PropertyDescriptor::new("radius", Arc::new(ScalarSemantics::float(1.0))),
            ],
        )
    }

    /// Axis-aligned box (center, size)
    pub fn aabox() -> Self {
        Self::new(
            "aabox",
            vec![
                PropertyDescriptor::new("center", Arc::new(VectorSemantics::float3([0.0; 3]))),
                PropertyDescriptor::new("size", Arc::new(VectorSemantics::float3([1.0; 3]))),
            ],
        )
    }

    /// Field descriptors
    pub fn fields(&self) -> &[PropertyDescriptor] {
        &self.fields
    }
}

impl TypeSemantics for CompositeSemantics {
    fn id(&self) -> &str {
        &self.id
    }

    fn value_type(&self) -> ValueType {
        ValueType::None
    }

    fn children(&self) -> Option<Vec<PropertyDescriptor>> {
        Some(self.fields.clone())
    }

    fn create_value(&self, _graph: &SlotGraph, _slot: SlotId) -> Result<Option<Expression>> {
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_link_compatibility() {
        let float = ScalarSemantics::float(0.0);
        let int = ScalarSemantics::int(0);
        let float4 = VectorSemantics::float4([0.0; 4]);
        let color = VectorSemantics::color([1.0; 4]);
        let sphere = CompositeSemantics::sphere();
        let aabox = CompositeSemantics::aabox();

        assert!(float.can_link(&ScalarSemantics::float(3.0)));
        assert!(!float.can_link(&int));
        assert!(color.can_link(&float4));
        assert!(sphere.can_link(&CompositeSemantics::sphere()));
        assert!(!sphere.can_link(&aabox));
    }

    #[test]
    fn test_vector_definition_validation() {
        let names = |n: &[&str]| n.iter().map(|s| (*s).to_string()).collect::<Vec<_>>();
        assert!(VectorSemantics::new("uv", names(&["u", "v"]), vec![0.0, 0.0]).is_some());
        assert!(VectorSemantics::new("bad", names(&["u"]), vec![0.0]).is_none());
        assert!(VectorSemantics::new("bad", names(&["u", "v"]), vec![0.0]).is_none());
    }

    #[test]
    fn test_children() {
        let color = VectorSemantics::color([1.0; 4]);
        let names: Vec<_> = color.children().unwrap().into_iter().map(|d| d.name).collect();
        assert_eq!(names, ["r", "g", "b", "a"]);
        assert_eq!(color.value_type(), ValueType::Float4);
        assert!(ScalarSemantics::bool(true).children().is_none());
        assert_eq!(CompositeSemantics::sphere().fields().len(), 2);
    }
}

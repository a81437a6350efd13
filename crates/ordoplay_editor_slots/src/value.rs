// SPDX-License-Identifier: MIT OR Apache-2.0
//! Value types that can be held by a property slot.

use serde::{Deserialize, Serialize};

/// Type tag of the value a slot holds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValueType {
    /// No concrete value (container slots)
    None,
    /// Floating point value
    Float,
    /// 2D float vector
    Float2,
    /// 3D float vector
    Float3,
    /// 4D float vector
    Float4,
    /// Signed integer
    Int,
    /// Unsigned integer
    Uint,
    /// Boolean value
    Bool,
}

impl ValueType {
    /// Float vector type with the given number of components
    pub fn float_vector(components: usize) -> Option<Self> {
        match components {
            1 => Some(Self::Float),
            2 => Some(Self::Float2),
            3 => Some(Self::Float3),
            4 => Some(Self::Float4),
            _ => None,
        }
    }

    /// Number of float components, or zero for non-float types
    pub fn component_count(&self) -> usize {
        match self {
            Self::Float => 1,
            Self::Float2 => 2,
            Self::Float3 => 3,
            Self::Float4 => 4,
            Self::None | Self::Int | Self::Uint | Self::Bool => 0,
        }
    }

    /// Whether a slot of this type holds a concrete value
    pub fn is_concrete(&self) -> bool {
        !matches!(self, Self::None)
    }
}

/// Concrete value stored in a slot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SlotValue {
    /// Float
    Float(f32),
    /// 2D vector
    Float2([f32; 2]),
    /// 3D vector
    Float3([f32; 3]),
    /// 4D vector
    Float4([f32; 4]),
    /// Signed integer
    Int(i32),
    /// Unsigned integer
    Uint(u32),
    /// Boolean
    Bool(bool),
}

impl SlotValue {
    /// Get the value type for this value
    pub fn value_type(&self) -> ValueType {
        match self {
            Self::Float(_) => ValueType::Float,
            Self::Float2(_) => ValueType::Float2,
            Self::Float3(_) => ValueType::Float3,
            Self::Float4(_) => ValueType::Float4,
            Self::Int(_) => ValueType::Int,
            Self::Uint(_) => ValueType::Uint,
            Self::Bool(_) => ValueType::Bool,
        }
    }

    /// Zero value of a type, `None` for [`ValueType::None`]
    pub fn zero(value_type: ValueType) -> Option<Self> {
        match value_type {
            ValueType::None => None,
            ValueType::Float => Some(Self::Float(0.0)),
            ValueType::Float2 => Some(Self::Float2([0.0; 2])),
            ValueType::Float3 => Some(Self::Float3([0.0; 3])),
            ValueType::Float4 => Some(Self::Float4([0.0; 4])),
            ValueType::Int => Some(Self::Int(0)),
            ValueType::Uint => Some(Self::Uint(0)),
            ValueType::Bool => Some(Self::Bool(false)),
        }
    }

    /// Build a float vector of `value_type` from its components
    pub fn from_components(value_type: ValueType, components: &[f32]) -> Option<Self> {
        if components.len() != value_type.component_count() {
            return None;
        }
        match components {
            [x] => Some(Self::Float(*x)),
            [x, y] => Some(Self::Float2([*x, *y])),
            [x, y, z] => Some(Self::Float3([*x, *y, *z])),
            [x, y, z, w] => Some(Self::Float4([*x, *y, *z, *w])),
            _ => None,
        }
    }

    /// Float components of this value, empty for non-float values
    pub fn components(&self) -> Vec<f32> {
        match self {
            Self::Float(v) => vec![*v],
            Self::Float2(v) => v.to_vec(),
            Self::Float3(v) => v.to_vec(),
            Self::Float4(v) => v.to_vec(),
            Self::Int(_) | Self::Uint(_) | Self::Bool(_) => Vec::new(),
        }
    }
}

/// Rust type that maps onto one [`ValueType`]
pub trait SlotValueType: Sized {
    /// Value type tag for this Rust type
    const VALUE_TYPE: ValueType;

    /// Wrap into a [`SlotValue`]
    fn into_slot_value(self) -> SlotValue;

    /// Unwrap from a [`SlotValue`] of the matching variant
    fn from_slot_value(value: &SlotValue) -> Option<Self>;
}

macro_rules! impl_slot_value_type {
    ($ty:ty, $variant:ident) => {
        impl SlotValueType for $ty {
            const VALUE_TYPE: ValueType = ValueType::$variant;

            fn into_slot_value(self) -> SlotValue {
                SlotValue::$variant(self)
            }

            fn from_slot_value(value: &SlotValue) -> Option<Self> {
                match value {
                    SlotValue::$variant(v) => Some(*v),
                    _ => None,
                }
            }
        }
    };
}

impl_slot_value_type!(f32, Float);
impl_slot_value_type!([f32; 2], Float2);
impl_slot_value_type!([f32; 3], Float3);
impl_slot_value_type!([f32; 4], Float4);
impl_slot_value_type!(i32, Int);
impl_slot_value_type!(u32, Uint);
impl_slot_value_type!(bool, Bool);

// SPDX-License-Identifier: MIT OR Apache-2.0
//! Value expressions owned by property slots.
//!
//! An [`Expression`] is the handle a slot stores as its computed value. It
//! only knows how to reduce itself to a [`SlotValue`] and to cache the
//! result; reading other slots goes through a resolver supplied by the graph.

use crate::error::{Result, SlotError};
use crate::slot::SlotId;
use crate::value::{SlotValue, ValueType};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identity of an expression handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ExpressionId(pub Uuid);

impl ExpressionId {
    /// Create a new random expression ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ExpressionId {
    fn default() -> Self {
        Self::new()
    }
}

/// How an expression produces its value
#[derive(Debug, Clone, PartialEq)]
pub enum ExpressionKind {
    /// Stored value
    Constant(SlotValue),
    /// Float vector assembled from the current values of component slots
    Combine(Vec<SlotId>),
}

/// Value handle owned by a slot
#[derive(Debug, Clone)]
pub struct Expression {
    id: ExpressionId,
    value_type: ValueType,
    kind: ExpressionKind,
    cache: Option<SlotValue>,
}

impl Expression {
    /// Create a constant expression
    pub fn constant(value: SlotValue) -> Self {
        Self {
            id: ExpressionId::new(),
            value_type: value.value_type(),
            cache: Some(value.clone()),
            kind: ExpressionKind::Constant(value),
        }
    }

    /// Create a float vector combining one float slot per component
    pub fn combine(value_type: ValueType, components: Vec<SlotId>) -> Self {
        Self {
            id: ExpressionId::new(),
            value_type,
            kind: ExpressionKind::Combine(components),
            cache: None,
        }
    }

    /// Handle identity
    pub fn id(&self) -> ExpressionId {
        self.id
    }

    /// Type of the reduced value
    pub fn value_type(&self) -> ValueType {
        self.value_type
    }

    /// How the value is produced
    pub fn kind(&self) -> &ExpressionKind {
        &self.kind
    }

    /// Whether the cached reduction is current
    pub fn is_valid(&self) -> bool {
        self.cache.is_some()
    }

    /// Last reduced value, if still valid
    pub fn cached(&self) -> Option<&SlotValue> {
        self.cache.as_ref()
    }

    /// Drop the cached reduction
    pub fn invalidate(&mut self) {
        self.cache = None;
    }

    /// Reduce to a concrete value.
    ///
    /// `resolve` returns the current value of a component slot.
    pub fn reduce(&self, resolve: &dyn Fn(SlotId) -> Result<SlotValue>) -> Result<SlotValue> {
        match &self.kind {
            ExpressionKind::Constant(value) => Ok(value.clone()),
            ExpressionKind::Combine(components) => {
                let mut floats = Vec::with_capacity(components.len());
                for component in components {
                    match resolve(*component)? {
                        SlotValue::Float(v) => floats.push(v),
                        other => {
                            return Err(SlotError::TypeMismatch {
                                expected: ValueType::Float,
                                found: other.value_type(),
                            })
                        }
                    }
                }
                SlotValue::from_components(self.value_type, &floats).ok_or(
                    SlotError::TypeMismatch {
                        expected: self.value_type,
                        found: ValueType::float_vector(floats.len()).unwrap_or(ValueType::None),
                    },
                )
            }
        }
    }

    pub(crate) fn store_reduced(&mut self, value: SlotValue) {
        self.cache = Some(value);
    }

    /// Replace a constant's value, returning whether it changed
    pub(crate) fn set_constant(&mut self, value: SlotValue) -> bool {
        match &mut self.kind {
            ExpressionKind::Constant(current) if *current != value => {
                *current = value;
                self.cache = None;
                true
            }
            _ => false,
        }
    }
}

impl PartialEq for Expression {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

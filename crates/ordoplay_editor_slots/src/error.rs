// SPDX-License-Identifier: MIT OR Apache-2.0
//! Error types for slot graph operations.

use crate::slot::SlotId;
use crate::value::ValueType;

/// Error raised by a slot graph operation.
///
/// Every variant is raised before the graph is mutated, so a failed call
/// leaves links and values exactly as they were.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SlotError {
    /// Value read or written with a type the slot does not hold
    #[error("Type mismatch: slot holds {expected:?}, got {found:?}")]
    TypeMismatch {
        /// Value type declared by the slot
        expected: ValueType,
        /// Value type that was requested
        found: ValueType,
    },

    /// Slot has no value representation
    #[error("Slot has no value: {0:?}")]
    NotFound(SlotId),

    /// Input and output semantics cannot be linked
    #[error("Incompatible link: {input:?} -> {output:?}")]
    IncompatibleLink {
        /// Input slot being linked
        input: SlotId,
        /// Output slot it was linked to
        output: SlotId,
    },

    /// Child index out of range
    #[error("Invalid child index {index} (slot has {len} children)")]
    InvalidIndex {
        /// Requested index
        index: usize,
        /// Number of children
        len: usize,
    },

    /// Handle does not refer to a slot of this graph
    #[error("Unknown slot: {0:?}")]
    UnknownSlot(SlotId),

    /// Input handle used where an output is required, or the reverse
    #[error("Wrong slot direction: {0:?}")]
    WrongDirection(SlotId),

    /// Vector written as a whole while one of its components is linked
    #[error("Cannot write {slot:?}: component {component:?} is linked")]
    ComponentLinked {
        /// Slot being written
        slot: SlotId,
        /// Linked component
        component: SlotId,
    },

    /// Operation only valid on the root of a slot tree
    #[error("Slot is not a tree root: {0:?}")]
    NotRoot(SlotId),
}

/// Result type for slot graph operations
pub type Result<T> = std::result::Result<T, SlotError>;

/// Error when loading semantic type definitions
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// RON could not be parsed
    #[error("Failed to parse semantics config: {0}")]
    Parse(#[from] ron::error::SpannedError),

    /// RON could not be written
    #[error("Failed to write semantics config: {0}")]
    Serialize(#[from] ron::Error),

    /// A field references a type that is not registered
    #[error("Unknown semantic type: {0}")]
    UnknownType(String),

    /// A definition is malformed
    #[error("Invalid definition for {id}: {reason}")]
    InvalidDefinition {
        /// Type identifier
        id: String,
        /// What is wrong with it
        reason: String,
    },
}

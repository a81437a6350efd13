// SPDX-License-Identifier: MIT OR Apache-2.0
//! Property slot graph for `OrdoPlay` Editor.
//!
//! Every property of a VFX node (a rate, a position, a bounding sphere) is
//! a tree of slots:
//! - Typed, nestable values decomposed by type semantics
//! - Inputs linked to at most one output, outputs feeding many inputs
//! - Change notifications flowing up to parents and down to linked inputs
//!
//! ## Architecture
//!
//! All slots live in one [`SlotGraph`] arena and refer to each other by
//! [`SlotId`]. Parents own their children; links are non-owning IDs that
//! are checked on every lookup.
//!
//! The graph is single-threaded. Share it between threads as a
//! [`SharedSlotGraph`], one lock per graph.

pub mod error;
pub mod value;
pub mod expression;
pub mod semantics;
pub mod registry;
pub mod slot;
pub mod graph;
pub mod link;
pub mod collect;

pub use error::{ConfigError, Result, SlotError};
pub use expression::{Expression, ExpressionId, ExpressionKind};
pub use graph::SlotGraph;
pub use registry::{FieldDefinition, SemanticsConfig, SemanticsRegistry, TypeDefinition};
pub use semantics::{
    CompositeSemantics, PropertyDescriptor, ScalarSemantics, TypeSemantics, VectorSemantics,
};
pub use slot::{
    InputSlotId, NamedValue, OutputSlotId, PropertySlot, SlotDirection, SlotEvent, SlotId,
    SlotLink, SlotObserver,
};
pub use value::{SlotValue, SlotValueType, ValueType};

use parking_lot::Mutex;
use std::sync::Arc;

/// Slot graph shared between threads
pub type SharedSlotGraph = Arc<Mutex<SlotGraph>>;

/// Wrap a graph for sharing between threads
pub fn shared(graph: SlotGraph) -> SharedSlotGraph {
    Arc::new(Mutex::new(graph))
}

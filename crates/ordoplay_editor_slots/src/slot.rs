// SPDX-License-Identifier: MIT OR Apache-2.0
//! Property slot records stored in the slot graph.

use crate::error::{Result, SlotError};
use crate::expression::Expression;
use crate::graph::SlotGraph;
use crate::semantics::{PropertyDescriptor, TypeSemantics};
use crate::value::{SlotValue, ValueType};
use indexmap::IndexSet;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

/// Unique identifier for a slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SlotId(pub Uuid);

impl SlotId {
    /// Create a new random slot ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SlotId {
    fn default() -> Self {
        Self::new()
    }
}

/// Handle to a slot known to be an input
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InputSlotId(pub(crate) SlotId);

impl InputSlotId {
    /// Underlying slot ID
    pub fn id(self) -> SlotId {
        self.0
    }
}

impl From<InputSlotId> for SlotId {
    fn from(input: InputSlotId) -> Self {
        input.0
    }
}

/// Handle to a slot known to be an output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OutputSlotId(pub(crate) SlotId);

impl OutputSlotId {
    /// Underlying slot ID
    pub fn id(self) -> SlotId {
        self.0
    }
}

impl From<OutputSlotId> for SlotId {
    fn from(output: OutputSlotId) -> Self {
        output.0
    }
}

/// Slot direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SlotDirection {
    /// Consumes a value, linkable to one output
    Input,
    /// Produces a value, linkable to many inputs
    Output,
}

/// Change notification raised by a slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SlotEvent {
    /// A link or the whole value expression changed
    LinkUpdated,
    /// The content of the value changed
    ValueUpdated,
}

/// Listener notified of slot events.
///
/// Called synchronously while the graph propagates a change. The graph is
/// only readable from here; an owner that reacts by mutating the graph
/// records the event and applies its changes once the call returns.
pub trait SlotObserver: Send + Sync {
    /// Handle an event raised by `slot`
    fn on_slot_event(&self, graph: &SlotGraph, event: SlotEvent, slot: SlotId);
}

/// Link state of a slot
#[derive(Debug, Clone, PartialEq)]
pub enum SlotLink {
    /// Input side of a link
    Input {
        /// Output this input reads from
        connected_output: Option<SlotId>,
    },
    /// Output side of a link
    Output {
        /// Inputs reading from this output
        connected_inputs: IndexSet<SlotId>,
    },
}

impl SlotLink {
    pub(crate) fn new(direction: SlotDirection) -> Self {
        match direction {
            SlotDirection::Input => Self::Input { connected_output: None },
            SlotDirection::Output => Self::Output {
                connected_inputs: IndexSet::new(),
            },
        }
    }
}

/// A slot in a property tree
pub struct PropertySlot {
    pub(crate) id: SlotId,
    pub(crate) descriptor: PropertyDescriptor,
    pub(crate) full_name: String,
    pub(crate) parent: Option<SlotId>,
    pub(crate) children: Vec<SlotId>,
    pub(crate) owned_value: Option<Expression>,
    pub(crate) observer: Option<Arc<dyn SlotObserver>>,
    pub(crate) link: SlotLink,
}

impl PropertySlot {
    /// Slot ID
    pub fn id(&self) -> SlotId {
        self.id
    }

    /// Property name
    pub fn name(&self) -> &str {
        &self.descriptor.name
    }

    /// Name in the slot hierarchy, `root_child_..._name`
    pub fn full_name(&self) -> &str {
        &self.full_name
    }

    /// Property descriptor the slot was built from
    pub fn property(&self) -> &PropertyDescriptor {
        &self.descriptor
    }

    /// Type semantics of the slot
    pub fn semantics(&self) -> &Arc<dyn TypeSemantics> {
        &self.descriptor.semantics
    }

    /// Declared value type
    pub fn value_type(&self) -> ValueType {
        self.descriptor.semantics.value_type()
    }

    /// Parent slot, `None` for a root
    pub fn parent(&self) -> Option<SlotId> {
        self.parent
    }

    /// Child slots in property order
    pub fn children(&self) -> &[SlotId] {
        &self.children
    }

    /// Number of children
    pub fn child_count(&self) -> usize {
        self.children.len()
    }

    /// Child at `index`
    pub fn child(&self, index: usize) -> Result<SlotId> {
        self.children.get(index).copied().ok_or(SlotError::InvalidIndex {
            index,
            len: self.children.len(),
        })
    }

    /// Locally owned value
    pub fn owned_value(&self) -> Option<&Expression> {
        self.owned_value.as_ref()
    }

    /// Last reduced value of the owned expression
    pub fn cached_value(&self) -> Option<&SlotValue> {
        self.owned_value.as_ref().and_then(Expression::cached)
    }

    /// Slot direction
    pub fn direction(&self) -> SlotDirection {
        match self.link {
            SlotLink::Input { .. } => SlotDirection::Input,
            SlotLink::Output { .. } => SlotDirection::Output,
        }
    }

    /// Link state
    pub fn link(&self) -> &SlotLink {
        &self.link
    }

    /// Whether the slot takes part in any link
    pub fn is_linked(&self) -> bool {
        match &self.link {
            SlotLink::Input { connected_output } => connected_output.is_some(),
            SlotLink::Output { connected_inputs } => !connected_inputs.is_empty(),
        }
    }

    /// Slot whose value this slot currently exposes
    pub fn current_value_ref(&self) -> SlotId {
        match &self.link {
            SlotLink::Input {
                connected_output: Some(output),
            } => *output,
            SlotLink::Input { connected_output: None } | SlotLink::Output { .. } => self.id,
        }
    }

    /// Output an input is linked to; always `None` for outputs
    pub fn connected_output(&self) -> Option<SlotId> {
        match &self.link {
            SlotLink::Input { connected_output } => *connected_output,
            SlotLink::Output { .. } => None,
        }
    }

    /// Inputs linked to an output, in link order; empty for inputs
    pub fn connected_inputs(&self) -> impl Iterator<Item = SlotId> + '_ {
        let inputs = match &self.link {
            SlotLink::Output { connected_inputs } => Some(connected_inputs.iter().copied()),
            SlotLink::Input { .. } => None,
        };
        inputs.into_iter().flatten()
    }

    /// Whether `input` is in this output's fan-out set
    pub fn has_connected_input(&self, input: SlotId) -> bool {
        match &self.link {
            SlotLink::Output { connected_inputs } => connected_inputs.contains(&input),
            SlotLink::Input { .. } => false,
        }
    }
}

impl fmt::Debug for PropertySlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropertySlot")
            .field("id", &self.id)
            .field("full_name", &self.full_name)
            .field("semantics", &self.descriptor.semantics.id())
            .field("parent", &self.parent)
            .field("children", &self.children)
            .field("owned_value", &self.owned_value)
            .field("link", &self.link)
            .finish_non_exhaustive()
    }
}

/// Value collected for a leaf slot, keyed by its hierarchy name
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedValue {
    /// Full name of the slot the value was collected for
    pub name: String,
    /// Reduced value
    pub value: SlotValue,
}

impl NamedValue {
    /// Create a named value
    pub fn new(name: impl Into<String>, value: SlotValue) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }
}

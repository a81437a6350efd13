// SPDX-License-Identifier: MIT OR Apache-2.0
//! Slot graph: the arena holding every property slot tree.
//!
//! Trees own their children by ID; links between inputs and outputs are
//! plain IDs checked on every lookup. All operations run synchronously and
//! finish before returning.

use crate::error::{Result, SlotError};
use crate::expression::{Expression, ExpressionKind};
use crate::semantics::PropertyDescriptor;
use crate::slot::{
    InputSlotId, OutputSlotId, PropertySlot, SlotDirection, SlotEvent, SlotId, SlotLink,
    SlotObserver,
};
use crate::value::{SlotValue, SlotValueType, ValueType};
use indexmap::IndexMap;
use std::sync::Arc;

/// Arena of property slots
#[derive(Debug, Default)]
pub struct SlotGraph {
    slots: IndexMap<SlotId, PropertySlot>,
}

impl SlotGraph {
    /// Create a new empty graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Build an input slot tree for a property
    pub fn create_input(
        &mut self,
        descriptor: PropertyDescriptor,
        observer: Option<Arc<dyn SlotObserver>>,
    ) -> Result<InputSlotId> {
        let id = self.build_slot(None, descriptor, observer, SlotDirection::Input)?;
        Ok(InputSlotId(id))
    }

    /// Build an output slot tree for a property
    pub fn create_output(
        &mut self,
        descriptor: PropertyDescriptor,
        observer: Option<Arc<dyn SlotObserver>>,
    ) -> Result<OutputSlotId> {
        let id = self.build_slot(None, descriptor, observer, SlotDirection::Output)?;
        Ok(OutputSlotId(id))
    }

    fn build_slot(
        &mut self,
        parent: Option<SlotId>,
        descriptor: PropertyDescriptor,
        observer: Option<Arc<dyn SlotObserver>>,
        direction: SlotDirection,
    ) -> Result<SlotId> {
        let full_name = match parent {
            Some(parent) => format!("{}_{}", self.slot(parent)?.full_name, descriptor.name),
            None => descriptor.name.clone(),
        };
        let semantics = Arc::clone(&descriptor.semantics);

        let id = SlotId::new();
        self.slots.insert(
            id,
            PropertySlot {
                id,
                descriptor,
                full_name,
                parent: None,
                children: Vec::new(),
                owned_value: None,
                observer: observer.clone(),
                link: SlotLink::new(direction),
            },
        );

        if let Some(child_descriptors) = semantics.children() {
            let mut children = Vec::with_capacity(child_descriptors.len());
            for child in child_descriptors {
                children.push(self.build_slot(Some(id), child, observer.clone(), direction)?);
            }
            self.slot_mut(id)?.children = children;
        }

        let value = semantics.create_value(self, id)?;
        self.slot_mut(id)?.owned_value = value;
        self.set_default(id)?;

        // Attached last: nothing above this slot may be notified while it is built
        self.slot_mut(id)?.parent = parent;

        let slot = self.slot(id)?;
        tracing::trace!(
            slot = %slot.full_name,
            semantics = semantics.id(),
            children = slot.children.len(),
            "Built slot"
        );
        Ok(id)
    }

    /// Apply defaults to a slot, descending into children the slot's
    /// semantics do not cover
    pub fn set_default(&mut self, id: SlotId) -> Result<()> {
        let semantics = Arc::clone(self.slot(id)?.semantics());
        if !semantics.default(self, id)? {
            let children = self.slot(id)?.children.clone();
            for child in children {
                self.set_default(child)?;
            }
        }
        Ok(())
    }

    /// Get a slot by ID
    pub fn slot(&self, id: SlotId) -> Result<&PropertySlot> {
        self.slots.get(&id).ok_or(SlotError::UnknownSlot(id))
    }

    pub(crate) fn slot_mut(&mut self, id: SlotId) -> Result<&mut PropertySlot> {
        self.slots.get_mut(&id).ok_or(SlotError::UnknownSlot(id))
    }

    /// Check if a slot exists
    pub fn contains(&self, id: SlotId) -> bool {
        self.slots.contains_key(&id)
    }

    /// Get all slots
    pub fn slots(&self) -> impl Iterator<Item = &PropertySlot> {
        self.slots.values()
    }

    /// Get the number of slots
    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    /// Typed handle for an input slot
    pub fn input(&self, id: SlotId) -> Result<InputSlotId> {
        match self.slot(id)?.direction() {
            SlotDirection::Input => Ok(InputSlotId(id)),
            SlotDirection::Output => Err(SlotError::WrongDirection(id)),
        }
    }

    /// Typed handle for an output slot
    pub fn output(&self, id: SlotId) -> Result<OutputSlotId> {
        match self.slot(id)?.direction() {
            SlotDirection::Output => Ok(OutputSlotId(id)),
            SlotDirection::Input => Err(SlotError::WrongDirection(id)),
        }
    }

    /// Child of a slot by index
    pub fn child(&self, id: SlotId, index: usize) -> Result<SlotId> {
        self.slot(id)?.child(index)
    }

    /// Child of an input slot by index
    pub fn input_child(&self, input: InputSlotId, index: usize) -> Result<InputSlotId> {
        self.child(input.id(), index).map(InputSlotId)
    }

    /// Child of an output slot by index
    pub fn output_child(&self, output: OutputSlotId, index: usize) -> Result<OutputSlotId> {
        self.child(output.id(), index).map(OutputSlotId)
    }

    /// Parent of a slot
    pub fn parent(&self, id: SlotId) -> Result<Option<SlotId>> {
        Ok(self.slot(id)?.parent)
    }

    /// Find a slot of the tree rooted at `root` by its full name
    pub fn find(&self, root: SlotId, full_name: &str) -> Result<Option<SlotId>> {
        let slot = self.slot(root)?;
        if slot.full_name == full_name {
            return Ok(Some(root));
        }
        for child in &slot.children {
            if let Some(found) = self.find(*child, full_name)? {
                return Ok(Some(found));
            }
        }
        Ok(None)
    }

    /// Owned expression of a slot
    pub fn value(&self, id: SlotId) -> Result<Option<&Expression>> {
        Ok(self.slot(id)?.owned_value.as_ref())
    }

    /// Owned expression of the slot a slot currently reads from
    pub fn value_ref(&self, id: SlotId) -> Result<Option<&Expression>> {
        self.value(self.current_value_ref(id)?)
    }

    /// Replace a slot's expression.
    ///
    /// Raises [`SlotEvent::LinkUpdated`] when the handle changes, since
    /// everything derived from the old expression must be rebuilt.
    ///
    /// The expression must have the slot's declared value type and must
    /// reduce; otherwise the old expression is kept.
    pub fn set_expression(&mut self, id: SlotId, expression: Option<Expression>) -> Result<bool> {
        let slot = self.slot(id)?;
        let current = slot.owned_value.as_ref().map(Expression::id);
        if current == expression.as_ref().map(Expression::id) {
            return Ok(false);
        }

        let found = expression
            .as_ref()
            .map_or(ValueType::None, Expression::value_type);
        if found != slot.value_type() {
            return Err(SlotError::TypeMismatch {
                expected: slot.value_type(),
                found,
            });
        }
        if let Some(expression) = &expression {
            self.reduce(expression)?;
        }

        self.slot_mut(id)?.owned_value = expression;
        self.notify_change(id, SlotEvent::LinkUpdated)?;
        Ok(true)
    }

    /// Write a typed value
    pub fn set_value<T: SlotValueType>(&mut self, id: SlotId, value: T) -> Result<bool> {
        self.set_slot_value(id, value.into_slot_value())
    }

    /// Read a typed value
    pub fn get_value<T: SlotValueType>(&self, id: SlotId) -> Result<T> {
        let value = self.get_slot_value(id)?;
        T::from_slot_value(&value).ok_or(SlotError::TypeMismatch {
            expected: value.value_type(),
            found: T::VALUE_TYPE,
        })
    }

    /// Write a value into the slot's own expression.
    ///
    /// A combined vector is written through its component slots, and is
    /// rejected with [`SlotError::ComponentLinked`] while any component
    /// reads from a link. Returns whether anything changed.
    pub fn set_slot_value(&mut self, id: SlotId, value: SlotValue) -> Result<bool> {
        let expression = self.slot(id)?.owned_value.as_ref().ok_or(SlotError::NotFound(id))?;
        if expression.value_type() != value.value_type() {
            return Err(SlotError::TypeMismatch {
                expected: expression.value_type(),
                found: value.value_type(),
            });
        }

        let components = match expression.kind() {
            ExpressionKind::Constant(_) => None,
            ExpressionKind::Combine(components) => Some(components.clone()),
        };

        if let Some(components) = components {
            for component in &components {
                if self.slot(*component)?.is_linked() {
                    return Err(SlotError::ComponentLinked {
                        slot: id,
                        component: *component,
                    });
                }
            }
            let mut changed = false;
            for (component, v) in components.into_iter().zip(value.components()) {
                changed |= self.set_slot_value(component, SlotValue::Float(v))?;
            }
            return Ok(changed);
        }

        let changed = self
            .slot_mut(id)?
            .owned_value
            .as_mut()
            .is_some_and(|expression| expression.set_constant(value));
        if changed {
            self.notify_change(id, SlotEvent::ValueUpdated)?;
        }
        Ok(changed)
    }

    /// Read the reduced value of the slot's own expression
    pub fn get_slot_value(&self, id: SlotId) -> Result<SlotValue> {
        let expression = self.slot(id)?.owned_value.as_ref().ok_or(SlotError::NotFound(id))?;
        match expression.cached() {
            Some(value) => Ok(value.clone()),
            None => self.reduce(expression),
        }
    }

    /// Reduce an expression, reading components through their links
    fn reduce(&self, expression: &Expression) -> Result<SlotValue> {
        expression.reduce(&|component| self.get_slot_value(self.current_value_ref(component)?))
    }

    /// Invalidate and recompute the slot's own value
    fn refresh_value(&mut self, id: SlotId) -> Result<()> {
        let Some(expression) = self.slot_mut(id)?.owned_value.as_mut() else {
            return Ok(());
        };
        expression.invalidate();

        let slot = self.slot(id)?;
        let Some(expression) = slot.owned_value.as_ref() else {
            return Ok(());
        };
        let reduced = self.reduce(expression)?;
        if let Some(expression) = self.slot_mut(id)?.owned_value.as_mut() {
            expression.store_reduced(reduced);
        }
        Ok(())
    }

    /// Propagate a change from a slot.
    ///
    /// The slot's value is recomputed, then its observer is called, then
    /// linked inputs are notified (outputs only), then the parent is
    /// notified for value changes or when its proxy had to be regenerated.
    pub fn notify_change(&mut self, id: SlotId, event: SlotEvent) -> Result<()> {
        self.refresh_value(id)?;

        let slot = self.slot(id)?;
        tracing::trace!(slot = %slot.full_name, ?event, "Slot changed");
        if let Some(observer) = slot.observer.clone() {
            observer.on_slot_event(self, event, id);
        }

        self.propagate_change(id, event)?;

        if let Some(parent) = self.slot(id)?.parent {
            let escalate = event == SlotEvent::ValueUpdated || {
                let semantics = Arc::clone(self.slot(parent)?.semantics());
                semantics.update_proxy(self, parent)
            };
            if escalate {
                self.notify_change(parent, event)?;
            }
        }
        Ok(())
    }

    fn propagate_change(&mut self, id: SlotId, event: SlotEvent) -> Result<()> {
        let inputs: Vec<SlotId> = match &self.slot(id)?.link {
            SlotLink::Input { .. } => return Ok(()),
            SlotLink::Output { connected_inputs } => connected_inputs.iter().copied().collect(),
        };
        for input in inputs {
            self.notify_change(input, event)?;
        }
        Ok(())
    }

    /// Remove a whole slot tree, unlinking it from the rest of the graph.
    ///
    /// Returns the number of removed slots.
    pub fn remove_tree(&mut self, root: SlotId) -> Result<usize> {
        if self.slot(root)?.parent.is_some() {
            return Err(SlotError::NotRoot(root));
        }
        self.unlink_recursively(root)?;

        let mut pending = vec![root];
        let mut removed = 0;
        while let Some(id) = pending.pop() {
            if let Some(slot) = self.slots.swap_remove(&id) {
                pending.extend(slot.children);
                removed += 1;
            }
        }
        tracing::debug!(?root, removed, "Removed slot tree");
        Ok(removed)
    }
}

// SPDX-License-Identifier: MIT OR Apache-2.0
//! Read-only traversals used by the effect compiler.
//!
//! All traversals are pre-order: a slot comes before its children and
//! children follow property order.

use crate::error::Result;
use crate::expression::Expression;
use crate::graph::SlotGraph;
use crate::slot::{NamedValue, SlotId};

impl SlotGraph {
    /// Value handles of a tree, following links.
    ///
    /// Each level reads the slot it is linked to and continues with that
    /// slot's children.
    pub fn flatten_values(&self, id: SlotId) -> Result<Vec<Option<&Expression>>> {
        let mut values = Vec::new();
        self.flatten_values_into(id, &mut values)?;
        Ok(values)
    }

    fn flatten_values_into<'a>(
        &'a self,
        id: SlotId,
        values: &mut Vec<Option<&'a Expression>>,
    ) -> Result<()> {
        let source = self.slot(self.current_value_ref(id)?)?;
        values.push(source.owned_value());
        for child in source.children() {
            self.flatten_values_into(*child, values)?;
        }
        Ok(())
    }

    /// Value handles owned by a tree's own slots, ignoring links
    pub fn flatten_owned_values(&self, id: SlotId) -> Result<Vec<Option<&Expression>>> {
        let mut values = Vec::new();
        self.flatten_owned_values_into(id, &mut values)?;
        Ok(values)
    }

    fn flatten_owned_values_into<'a>(
        &'a self,
        id: SlotId,
        values: &mut Vec<Option<&'a Expression>>,
    ) -> Result<()> {
        let slot = self.slot(id)?;
        values.push(slot.owned_value());
        for child in slot.children() {
            self.flatten_owned_values_into(*child, values)?;
        }
        Ok(())
    }

    /// Collect one reduced value per reachable leaf, named after the slot
    /// it was reached through.
    ///
    /// Descends through the structure of linked sources: below a linked
    /// composite, entries carry the source's child names.
    pub fn collect_named_values(&self, id: SlotId) -> Result<Vec<NamedValue>> {
        let mut values = Vec::new();
        self.collect_named_values_into(id, &mut values)?;
        Ok(values)
    }

    fn collect_named_values_into(&self, id: SlotId, values: &mut Vec<NamedValue>) -> Result<()> {
        let source_id = self.current_value_ref(id)?;
        let source = self.slot(source_id)?;
        if source.owned_value().is_some() {
            let name = self.slot(id)?.full_name();
            values.push(NamedValue::new(name, self.get_slot_value(source_id)?));
            return Ok(());
        }
        for child in source.children() {
            self.collect_named_values_into(*child, values)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::graph::SlotGraph;
    use crate::semantics::{
        CompositeSemantics, PropertyDescriptor, ScalarSemantics, TypeSemantics, VectorSemantics,
    };
    use crate::slot::NamedValue;
    use crate::value::SlotValue;
    use std::sync::Arc;

    fn descriptor(name: &str, semantics: impl TypeSemantics + 'static) -> PropertyDescriptor {
        PropertyDescriptor::new(name, Arc::new(semantics))
    }

    fn point() -> CompositeSemantics {
        CompositeSemantics::new(
            "point",
            vec![
                descriptor("x", ScalarSemantics::float(0.0)),
                descriptor("y", ScalarSemantics::float(0.0)),
            ],
        )
    }

    #[test]
    fn test_collect_named_values_of_composite() {
        let mut graph = SlotGraph::new();
        let root = graph.create_input(descriptor("root", point()), None).unwrap();
        let x = graph.child(root.id(), 0).unwrap();
        let y = graph.child(root.id(), 1).unwrap();
        graph.set_value(x, 1.0_f32).unwrap();
        graph.set_value(y, 2.0_f32).unwrap();

        let values = graph.collect_named_values(root.id()).unwrap();
        assert_eq!(
            values,
            vec![
                NamedValue::new("root_x", SlotValue::Float(1.0)),
                NamedValue::new("root_y", SlotValue::Float(2.0)),
            ]
        );
    }

    #[test]
    fn test_collect_stops_at_concrete_value() {
        let mut graph = SlotGraph::new();
        let root = graph
            .create_input(descriptor("bounds", CompositeSemantics::sphere()), None)
            .unwrap();

        let names: Vec<_> = graph
            .collect_named_values(root.id())
            .unwrap()
            .into_iter()
            .map(|v| v.name)
            .collect();
        assert_eq!(names, ["bounds_center", "bounds_radius"]);
    }

    #[test]
    fn test_collect_follows_linked_structure() {
        let mut graph = SlotGraph::new();
        let source = graph.create_output(descriptor("src", point()), None).unwrap();
        graph.set_value(graph.child(source.id(), 0).unwrap(), 3.0_f32).unwrap();
        graph.set_value(graph.child(source.id(), 1).unwrap(), 4.0_f32).unwrap();

        let target = graph.create_input(descriptor("dst", point()), None).unwrap();
        graph.link(target, Some(source)).unwrap();

        // Values come from the source, names from the source's children
        let values = graph.collect_named_values(target.id()).unwrap();
        assert_eq!(
            values,
            vec![
                NamedValue::new("src_x", SlotValue::Float(3.0)),
                NamedValue::new("src_y", SlotValue::Float(4.0)),
            ]
        );
    }

    #[test]
    fn test_flatten_values() {
        let mut graph = SlotGraph::new();
        let speed = graph
            .create_output(descriptor("speed", ScalarSemantics::float(9.0)), None)
            .unwrap();
        let velocity = graph
            .create_input(descriptor("velocity", VectorSemantics::float3([0.0; 3])), None)
            .unwrap();
        let y = graph.input_child(velocity, 1).unwrap();
        graph.link(y, Some(speed)).unwrap();

        let owned = graph.flatten_owned_values(velocity.id()).unwrap();
        let linked = graph.flatten_values(velocity.id()).unwrap();
        assert_eq!(owned.len(), 4);
        assert_eq!(linked.len(), 4);

        let speed_value = graph.value(speed.id()).unwrap();
        let y_value = graph.value(y.id()).unwrap();
        assert_eq!(linked[2], speed_value);
        assert_eq!(owned[2], y_value);
        assert_eq!(linked[0], owned[0]);
        assert_eq!(linked[1], owned[1]);
    }
}

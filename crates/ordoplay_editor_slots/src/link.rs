// SPDX-License-Identifier: MIT OR Apache-2.0
//! Links between input and output slots.
//!
//! An input reads from at most one output, an output feeds any number of
//! inputs. Both sides are updated together before any notification is
//! raised, so observers never see a one-sided link.

use crate::error::{Result, SlotError};
use crate::graph::SlotGraph;
use crate::slot::{InputSlotId, OutputSlotId, SlotEvent, SlotId, SlotLink};

impl SlotGraph {
    /// Link an input to an output, or unlink it with `None`.
    ///
    /// Returns whether the link changed.
    pub fn link(&mut self, input: InputSlotId, output: Option<OutputSlotId>) -> Result<bool> {
        let input = input.id();
        let target = output.map(OutputSlotId::id);
        let previous = match self.slot(input)?.link {
            SlotLink::Input { connected_output } => connected_output,
            SlotLink::Output { .. } => return Err(SlotError::WrongDirection(input)),
        };
        if previous == target {
            return Ok(false);
        }

        if let Some(target) = target {
            let output_slot = self.slot(target)?;
            if !matches!(output_slot.link, SlotLink::Output { .. }) {
                return Err(SlotError::WrongDirection(target));
            }
            let input_slot = self.slot(input)?;
            if !input_slot.semantics().can_link(output_slot.semantics().as_ref()) {
                return Err(SlotError::IncompatibleLink { input, output: target });
            }
        }

        if let Some(previous) = previous {
            if let Ok(slot) = self.slot_mut(previous) {
                if let SlotLink::Output { connected_inputs } = &mut slot.link {
                    connected_inputs.shift_remove(&input);
                }
            }
        }
        if let Some(target) = target {
            if let SlotLink::Output { connected_inputs } = &mut self.slot_mut(target)?.link {
                connected_inputs.insert(input);
            }
        }
        if let SlotLink::Input { connected_output } = &mut self.slot_mut(input)?.link {
            *connected_output = target;
        }

        tracing::debug!(?input, ?previous, output = ?target, "Slot link updated");
        self.notify_change(input, SlotEvent::LinkUpdated)?;
        Ok(true)
    }

    /// Unlink an input from its output
    pub fn unlink(&mut self, input: InputSlotId) -> Result<bool> {
        self.link(input, None)
    }

    /// Link an output to an input. The input's previous link is replaced.
    pub fn link_output(&mut self, output: OutputSlotId, input: InputSlotId) -> Result<bool> {
        self.link(input, Some(output))
    }

    /// Unlink an input from this output.
    ///
    /// Unlike [`SlotGraph::unlink`], an input linked to a different output
    /// keeps its link and `Ok(false)` is returned.
    pub fn unlink_output(&mut self, output: OutputSlotId, input: InputSlotId) -> Result<bool> {
        if self.connected_output(input)? != Some(output) {
            return Ok(false);
        }
        self.unlink(input)
    }

    /// Remove every link of a slot: an input's single link or all of an
    /// output's fan-out
    pub fn unlink_all(&mut self, id: SlotId) -> Result<()> {
        let inputs: Vec<SlotId> = match &self.slot(id)?.link {
            SlotLink::Input { .. } => vec![id],
            SlotLink::Output { connected_inputs } => connected_inputs.iter().copied().collect(),
        };
        for input in inputs {
            self.unlink(InputSlotId(input))?;
        }
        if let SlotLink::Output { connected_inputs } = &mut self.slot_mut(id)?.link {
            connected_inputs.clear();
        }
        Ok(())
    }

    /// Remove every link of a slot and all its descendants
    pub fn unlink_recursively(&mut self, id: SlotId) -> Result<()> {
        self.unlink_all(id)?;
        let children = self.slot(id)?.children().to_vec();
        for child in children {
            self.unlink_recursively(child)?;
        }
        Ok(())
    }

    /// Slot whose value `id` currently exposes: the linked output for a
    /// linked input, the slot itself otherwise
    pub fn current_value_ref(&self, id: SlotId) -> Result<SlotId> {
        Ok(self.slot(id)?.current_value_ref())
    }

    /// Check if a slot takes part in any link
    pub fn is_linked(&self, id: SlotId) -> Result<bool> {
        Ok(self.slot(id)?.is_linked())
    }

    /// Output an input is linked to
    pub fn connected_output(&self, input: InputSlotId) -> Result<Option<OutputSlotId>> {
        Ok(self.slot(input.id())?.connected_output().map(OutputSlotId))
    }

    /// Inputs linked to an output, in link order
    pub fn connected_inputs(&self, output: OutputSlotId) -> Result<Vec<InputSlotId>> {
        Ok(self
            .slot(output.id())?
            .connected_inputs()
            .map(InputSlotId)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use crate::error::SlotError;
    use crate::graph::SlotGraph;
    use crate::semantics::{
        CompositeSemantics, PropertyDescriptor, ScalarSemantics, TypeSemantics, VectorSemantics,
    };
    use crate::slot::{InputSlotId, OutputSlotId, SlotEvent, SlotId, SlotObserver};
    use parking_lot::Mutex;
    use std::sync::Arc;

    #[derive(Default)]
    struct Recorder {
        events: Mutex<Vec<(SlotEvent, String)>>,
    }

    impl Recorder {
        fn take(&self) -> Vec<(SlotEvent, String)> {
            std::mem::take(&mut *self.events.lock())
        }
    }

    impl SlotObserver for Recorder {
        fn on_slot_event(&self, graph: &SlotGraph, event: SlotEvent, slot: SlotId) {
            let name = graph.slot(slot).unwrap().full_name().to_string();
            self.events.lock().push((event, name));
        }
    }

    fn descriptor(name: &str, semantics: impl TypeSemantics + 'static) -> PropertyDescriptor {
        PropertyDescriptor::new(name, Arc::new(semantics))
    }

    fn float_output(graph: &mut SlotGraph, name: &str, default: f32) -> OutputSlotId {
        graph
            .create_output(descriptor(name, ScalarSemantics::float(default)), None)
            .unwrap()
    }

    fn float_input(graph: &mut SlotGraph, name: &str) -> InputSlotId {
        graph
            .create_input(descriptor(name, ScalarSemantics::float(0.0)), None)
            .unwrap()
    }

    fn assert_consistent(graph: &SlotGraph) {
        for slot in graph.slots() {
            if let Some(output) = slot.connected_output() {
                assert!(graph.slot(output).unwrap().has_connected_input(slot.id()));
            }
            for input in slot.connected_inputs() {
                assert_eq!(graph.slot(input).unwrap().connected_output(), Some(slot.id()));
            }
        }
    }

    #[test]
    fn test_link_reads_through_output() {
        let mut graph = SlotGraph::new();
        let output = float_output(&mut graph, "out", 0.0);
        let input = float_input(&mut graph, "in");

        assert!(graph.link(input, Some(output)).unwrap());
        assert!(graph.is_linked(input.id()).unwrap());
        assert!(graph.is_linked(output.id()).unwrap());
        assert_consistent(&graph);

        graph.set_value(output.id(), 5.0_f32).unwrap();
        let source = graph.current_value_ref(input.id()).unwrap();
        assert_eq!(source, output.id());
        assert_eq!(graph.get_value::<f32>(source).unwrap(), 5.0);
        // The input's own value is untouched
        assert_eq!(graph.get_value::<f32>(input.id()).unwrap(), 0.0);
    }

    #[test]
    fn test_relink_same_output_is_noop() {
        let mut graph = SlotGraph::new();
        let output = float_output(&mut graph, "out", 0.0);
        let input = float_input(&mut graph, "in");

        assert!(graph.link(input, Some(output)).unwrap());
        assert!(!graph.link(input, Some(output)).unwrap());
        assert_eq!(graph.connected_inputs(output).unwrap(), vec![input]);
    }

    #[test]
    fn test_unlink_restores_state() {
        let mut graph = SlotGraph::new();
        let output = float_output(&mut graph, "out", 0.0);
        let input = float_input(&mut graph, "in");

        graph.link(input, Some(output)).unwrap();
        assert!(graph.unlink(input).unwrap());
        assert!(!graph.unlink(input).unwrap());

        assert!(!graph.is_linked(input.id()).unwrap());
        assert!(!graph.is_linked(output.id()).unwrap());
        assert_eq!(graph.connected_output(input).unwrap(), None);
        assert_eq!(graph.current_value_ref(input.id()).unwrap(), input.id());
        assert_consistent(&graph);
    }

    #[test]
    fn test_relink_moves_between_outputs() {
        let mut graph = SlotGraph::new();
        let first = float_output(&mut graph, "first", 1.0);
        let second = float_output(&mut graph, "second", 2.0);
        let input = float_input(&mut graph, "in");

        graph.link(input, Some(first)).unwrap();
        graph.link_output(second, input).unwrap();

        assert!(!graph.is_linked(first.id()).unwrap());
        assert_eq!(graph.connected_output(input).unwrap(), Some(second));
        assert_consistent(&graph);

        assert!(!graph.unlink_output(first, input).unwrap());
        assert!(graph.unlink_output(second, input).unwrap());
        assert_consistent(&graph);
    }

    #[test]
    fn test_incompatible_link_leaves_state() {
        let mut graph = SlotGraph::new();
        let output = float_output(&mut graph, "out", 0.0);
        let other = graph
            .create_output(descriptor("flag", ScalarSemantics::bool(false)), None)
            .unwrap();
        let input = float_input(&mut graph, "in");

        graph.link(input, Some(output)).unwrap();
        let err = graph.link(input, Some(other)).unwrap_err();
        assert_eq!(
            err,
            SlotError::IncompatibleLink { input: input.id(), output: other.id() }
        );
        assert_eq!(graph.connected_output(input).unwrap(), Some(output));
        assert!(!graph.is_linked(other.id()).unwrap());
        assert_consistent(&graph);
    }

    #[test]
    fn test_link_raises_link_updated() {
        let mut graph = SlotGraph::new();
        let recorder = Arc::new(Recorder::default());
        let output = float_output(&mut graph, "out", 0.0);
        let input = graph
            .create_input(descriptor("in", ScalarSemantics::float(0.0)), Some(recorder.clone()))
            .unwrap();
        recorder.take();

        graph.link(input, Some(output)).unwrap();
        assert_eq!(recorder.take(), vec![(SlotEvent::LinkUpdated, "in".to_string())]);
    }

    #[test]
    fn test_output_change_reaches_every_input_and_ancestors() {
        let mut graph = SlotGraph::new();
        let recorder = Arc::new(Recorder::default());
        let output = float_output(&mut graph, "speed", 0.0);
        let velocity = graph
            .create_input(
                descriptor("velocity", VectorSemantics::float3([0.0; 3])),
                Some(recorder.clone()),
            )
            .unwrap();
        let bounds = graph
            .create_input(
                descriptor("bounds", CompositeSemantics::sphere()),
                Some(recorder.clone()),
            )
            .unwrap();

        let x = graph.input_child(velocity, 0).unwrap();
        let radius = graph.input_child(bounds, 1).unwrap();
        graph.link(x, Some(output)).unwrap();
        graph.link(radius, Some(output)).unwrap();
        recorder.take();

        graph.set_value(output.id(), 2.0_f32).unwrap();

        let events = recorder.take();
        let names: Vec<_> = events.iter().map(|(_, name)| name.as_str()).collect();
        assert_eq!(names, ["velocity_x", "velocity", "bounds_radius", "bounds"]);
        assert!(events.iter().all(|(event, _)| *event == SlotEvent::ValueUpdated));
        assert_eq!(graph.get_value::<[f32; 3]>(velocity.id()).unwrap(), [2.0, 0.0, 0.0]);
    }

    #[test]
    fn test_link_change_escalates_only_through_proxies() {
        let mut graph = SlotGraph::new();
        let recorder = Arc::new(Recorder::default());
        let output = float_output(&mut graph, "speed", 4.0);
        let bounds = graph
            .create_input(
                descriptor("bounds", CompositeSemantics::sphere()),
                Some(recorder.clone()),
            )
            .unwrap();
        let center = graph.input_child(bounds, 0).unwrap();
        let y = graph.input_child(center, 1).unwrap();
        recorder.take();

        graph.link(y, Some(output)).unwrap();

        // The vector regenerates its combined value, the sphere has no proxy
        let names: Vec<_> = recorder.take().into_iter().map(|(_, name)| name).collect();
        assert_eq!(names, ["bounds_center_y", "bounds_center"]);
        assert_eq!(graph.get_value::<[f32; 3]>(center.id()).unwrap(), [0.0, 4.0, 0.0]);
    }

    #[test]
    fn test_unlink_all_clears_fan_out() {
        let mut graph = SlotGraph::new();
        let output = float_output(&mut graph, "out", 0.0);
        let inputs: Vec<_> = (0..3).map(|i| float_input(&mut graph, &format!("in{i}"))).collect();
        for input in &inputs {
            graph.link(*input, Some(output)).unwrap();
        }
        assert_eq!(graph.connected_inputs(output).unwrap(), inputs);

        graph.unlink_all(output.id()).unwrap();
        assert!(!graph.is_linked(output.id()).unwrap());
        for input in &inputs {
            assert!(!graph.is_linked(input.id()).unwrap());
        }
        assert_consistent(&graph);
    }

    #[test]
    fn test_unlink_recursively_clears_subtree() {
        let mut graph = SlotGraph::new();
        let speed = float_output(&mut graph, "speed", 1.0);
        let center = graph
            .create_output(descriptor("center", VectorSemantics::float3([0.0; 3])), None)
            .unwrap();
        let bounds = graph
            .create_input(descriptor("bounds", CompositeSemantics::sphere()), None)
            .unwrap();

        let bounds_center = graph.input_child(bounds, 0).unwrap();
        let radius = graph.input_child(bounds, 1).unwrap();
        let z = graph.input_child(bounds_center, 2).unwrap();
        graph.link(bounds_center, Some(center)).unwrap();
        graph.link(radius, Some(speed)).unwrap();
        graph.link(z, Some(speed)).unwrap();

        graph.unlink_recursively(bounds.id()).unwrap();
        for slot in graph.slots() {
            assert!(!slot.is_linked(), "{} still linked", slot.full_name());
        }
        assert_consistent(&graph);
    }

    #[test]
    fn test_remove_tree_unlinks_consumers() {
        let mut graph = SlotGraph::new();
        let output = float_output(&mut graph, "out", 3.0);
        let input = float_input(&mut graph, "in");
        graph.link(input, Some(output)).unwrap();

        graph.remove_tree(output.id()).unwrap();
        assert!(!graph.is_linked(input.id()).unwrap());
        assert_eq!(graph.current_value_ref(input.id()).unwrap(), input.id());
    }

    #[test]
    fn test_wrong_direction() {
        let mut graph = SlotGraph::new();
        let output = float_output(&mut graph, "out", 0.0);
        let input = float_input(&mut graph, "in");
        let fake = InputSlotId(output.id());

        assert_eq!(
            graph.link(fake, Some(output)),
            Err(SlotError::WrongDirection(output.id()))
        );
        assert_eq!(
            graph.link(input, Some(OutputSlotId(input.id()))),
            Err(SlotError::WrongDirection(input.id()))
        );
    }
}

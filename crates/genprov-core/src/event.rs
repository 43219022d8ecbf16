//! # Events
//!
//! One simulated collision: an association graph plus the reconstructed
//! objects that reference it.
//!
//! `Event` is immutable once built. `EventBuilder` enforces the construction
//! rules (bottom-up nodes, unique ids, resolvable constituents) and
//! `SerializableEvent` is the flat form used by the file formats.

use crate::graph::AssociationGraph;
use crate::primitives::{MAX_EVENT_NODES, MAX_EVENT_OBJECTS};
use crate::{GenprovError, Node, ObjectId, OutputObject, Shape};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// =============================================================================
// EVENT
// =============================================================================

/// An association graph and its ordered output objects.
#[derive(Debug, Clone)]
pub struct Event {
    id: u64,
    graph: AssociationGraph,
    objects: Vec<OutputObject>,
    /// ObjectId -> position in `objects`
    index: BTreeMap<ObjectId, usize>,
}

impl Event {
    #[must_use]
    pub fn id(&self) -> u64 {
        self.id
    }

    #[must_use]
    pub fn graph(&self) -> &AssociationGraph {
        &self.graph
    }

    /// Objects in the order they were added.
    #[must_use]
    pub fn objects(&self) -> &[OutputObject] {
        &self.objects
    }

    #[must_use]
    pub fn object(&self, id: ObjectId) -> Option<&OutputObject> {
        self.index.get(&id).and_then(|&i| self.objects.get(i))
    }
}

// =============================================================================
// BUILDER
// =============================================================================

/// Incremental constructor for `Event`.
#[derive(Debug, Clone)]
pub struct EventBuilder {
    id: u64,
    graph: AssociationGraph,
    objects: Vec<OutputObject>,
    index: BTreeMap<ObjectId, usize>,
}

impl EventBuilder {
    /// Start an event whose graph records malformed nodes.
    #[must_use]
    pub fn new(id: u64) -> Self {
        Self {
            id,
            graph: AssociationGraph::new(),
            objects: Vec::new(),
            index: BTreeMap::new(),
        }
    }

    /// Start an event whose graph rejects malformed nodes.
    #[must_use]
    pub fn strict(id: u64) -> Self {
        Self {
            graph: AssociationGraph::strict(),
            ..Self::new(id)
        }
    }

    /// Add a node. Its children must have been added already.
    pub fn add_node(&mut self, node: Node) -> Result<Shape, GenprovError> {
        self.graph.insert(node)
    }

    /// Add an object. Every constituent must already be in the graph.
    pub fn add_object(&mut self, object: OutputObject) -> Result<(), GenprovError> {
        if self.index.contains_key(&object.id) {
            return Err(GenprovError::DuplicateObject(object.id));
        }
        if let Some(&constituent) = object
            .constituents
            .iter()
            .find(|&&c| !self.graph.contains(c))
        {
            return Err(GenprovError::UnknownConstituent {
                object: object.id,
                constituent,
            });
        }
        self.index.insert(object.id, self.objects.len());
        self.objects.push(object);
        Ok(())
    }

    #[must_use]
    pub fn build(self) -> Event {
        Event {
            id: self.id,
            graph: self.graph,
            objects: self.objects,
            index: self.index,
        }
    }
}

// =============================================================================
// SERIALIZABLE FORM
// =============================================================================

/// Flat event representation: nodes in insertion order, then objects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SerializableEvent {
    pub id: u64,
    pub nodes: Vec<Node>,
    pub objects: Vec<OutputObject>,
}

impl SerializableEvent {
    /// Rebuild an event, recomputing shapes and malformations.
    ///
    /// Size limits are checked before any node is inserted.
    pub fn into_event(self, strict: bool) -> Result<Event, GenprovError> {
        if self.nodes.len() > MAX_EVENT_NODES {
            return Err(GenprovError::DeserializationError(format!(
                "Event {} has {} nodes, maximum is {}",
                self.id,
                self.nodes.len(),
                MAX_EVENT_NODES
            )));
        }
        if self.objects.len() > MAX_EVENT_OBJECTS {
            return Err(GenprovError::DeserializationError(format!(
                "Event {} has {} objects, maximum is {}",
                self.id,
                self.objects.len(),
                MAX_EVENT_OBJECTS
            )));
        }

        let mut builder = if strict {
            EventBuilder::strict(self.id)
        } else {
            EventBuilder::new(self.id)
        };
        for node in self.nodes {
            builder.add_node(node)?;
        }
        for object in self.objects {
            builder.add_object(object)?;
        }
        Ok(builder.build())
    }
}

impl From<&Event> for SerializableEvent {
    fn from(event: &Event) -> Self {
        Self {
            id: event.id,
            nodes: event.graph.nodes().cloned().collect(),
            objects: event.objects.clone(),
        }
    }
}

impl TryFrom<SerializableEvent> for Event {
    type Error = GenprovError;

    fn try_from(value: SerializableEvent) -> Result<Self, Self::Error> {
        value.into_event(false)
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{FourMomentum, NodeId, ObjectKind};

    fn leaf(id: u64) -> Node {
        Node::new(NodeId(id), FourMomentum::new(1.0, 2.0, 3.0, 4.0))
    }

    fn object(id: u64, constituents: &[u64]) -> OutputObject {
        OutputObject::new(ObjectId(id), ObjectKind::Jet, FourMomentum::ZERO)
            .with_constituents(constituents.iter().map(|&c| NodeId(c)))
    }

    fn assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn shared_types_are_send_and_sync() {
        assert_send_sync::<crate::AssociationGraph>();
        assert_send_sync::<Event>();
        assert_send_sync::<SerializableEvent>();
        assert_send_sync::<crate::FlattenResult>();
        assert_send_sync::<crate::AttributionResult>();
        assert_send_sync::<crate::LeadingParticle>();
        assert_send_sync::<crate::ObjectRecord>();
        assert_send_sync::<crate::EventReport>();
    }

    #[test]
    fn builder_collects_nodes_and_objects() {
        let mut builder = EventBuilder::new(12);
        builder.add_node(leaf(1)).expect("add node");
        builder.add_object(object(100, &[1])).expect("add object");
        builder.add_object(object(101, &[])).expect("add object");

        let event = builder.build();
        assert_eq!(event.id(), 12);
        assert_eq!(event.graph().len(), 1);
        assert_eq!(event.objects().len(), 2);
        assert_eq!(event.object(ObjectId(101)).map(|o| o.id), Some(ObjectId(101)));
        assert!(event.object(ObjectId(5)).is_none());
    }

    #[test]
    fn duplicate_object_is_rejected() {
        let mut builder = EventBuilder::new(1);
        builder.add_object(object(7, &[])).expect("add object");

        let result = builder.add_object(object(7, &[]));
        assert!(matches!(result, Err(GenprovError::DuplicateObject(ObjectId(7)))));
    }

    #[test]
    fn dangling_constituent_is_rejected() {
        let mut builder = EventBuilder::new(1);
        builder.add_node(leaf(1)).expect("add node");

        let result = builder.add_object(object(7, &[1, 2]));
        assert!(matches!(
            result,
            Err(GenprovError::UnknownConstituent {
                object: ObjectId(7),
                constituent: NodeId(2)
            })
        ));
    }

    #[test]
    fn serializable_form_preserves_insertion_order() {
        let mut builder = EventBuilder::new(3);
        builder.add_node(leaf(5)).expect("add node");
        builder.add_node(leaf(2)).expect("add node");
        builder
            .add_node(leaf(9).with_children([NodeId(5)]))
            .expect("add node");
        let event = builder.build();

        let flat = SerializableEvent::from(&event);
        let ids: Vec<_> = flat.nodes.iter().map(|n| n.id).collect();
        assert_eq!(ids, vec![NodeId(5), NodeId(2), NodeId(9)]);

        let rebuilt = Event::try_from(flat.clone()).expect("rebuild");
        assert_eq!(SerializableEvent::from(&rebuilt), flat);
    }

    #[test]
    fn strict_rebuild_rejects_malformed_nodes() {
        let flat = SerializableEvent {
            id: 1,
            nodes: vec![leaf(1), leaf(2), leaf(3).with_children([NodeId(1), NodeId(2)])],
            objects: Vec::new(),
        };

        assert!(flat.clone().into_event(false).is_ok());
        assert!(matches!(
            flat.into_event(true),
            Err(GenprovError::MalformedHierarchy(_))
        ));
    }
}

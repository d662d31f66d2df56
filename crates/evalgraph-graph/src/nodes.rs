//! Operation, component and entity nodes.
//!
//! Nodes never own each other. Parents are reached through `Copy` index
//! handles into the [`Graph`](crate::Graph) tables, so a node can be borrowed
//! independently of the node that owns it.

use evalgraph_core::{
    CompactHashMap, ComponentId, ComponentKey, ComponentKind, ComponentState, EntityId,
    OperationFlags, OperationId, OperationKind, RecordRef,
};

/// Smallest unit of evaluation work and the unit of traversal.
#[derive(Debug, Clone)]
pub struct OperationNode {
    pub(crate) kind: OperationKind,
    pub(crate) flags: OperationFlags,
    pub(crate) scheduled: bool,
    pub(crate) outlinks: Vec<OperationId>,
    pub(crate) owner: ComponentId,
}

impl OperationNode {
    pub(crate) fn new(kind: OperationKind, owner: ComponentId) -> Self {
        Self {
            kind,
            flags: OperationFlags::empty(),
            scheduled: false,
            outlinks: Vec::new(),
            owner,
        }
    }

    pub fn kind(&self) -> OperationKind {
        self.kind
    }

    pub fn flags(&self) -> OperationFlags {
        self.flags
    }

    pub fn needs_update(&self) -> bool {
        self.flags.contains(OperationFlags::NEEDS_UPDATE)
    }

    pub fn is_directly_modified(&self) -> bool {
        self.flags.contains(OperationFlags::DIRECTLY_MODIFIED)
    }

    /// Whether the current flush already queued this operation.
    pub fn is_scheduled(&self) -> bool {
        self.scheduled
    }

    /// Outbound relations in insertion order. The same target may appear
    /// more than once.
    pub fn outlinks(&self) -> &[OperationId] {
        &self.outlinks
    }

    pub fn owner(&self) -> ComponentId {
        self.owner
    }
}

/// Operations of one evaluation aspect of an entity.
#[derive(Debug, Clone)]
pub struct ComponentNode {
    pub(crate) key: ComponentKey,
    pub(crate) done: ComponentState,
    pub(crate) operations: Vec<OperationId>,
    pub(crate) owner: EntityId,
    pub(crate) entry_operation: Option<OperationId>,
    pub(crate) depends_on_cow: bool,
}

impl ComponentNode {
    pub(crate) fn new(key: ComponentKey, owner: EntityId) -> Self {
        let depends_on_cow = key.kind.depends_on_cow();
        Self {
            key,
            done: ComponentState::None,
            operations: Vec::new(),
            owner,
            entry_operation: None,
            depends_on_cow,
        }
    }

    pub fn key(&self) -> &ComponentKey {
        &self.key
    }

    pub fn kind(&self) -> ComponentKind {
        self.key.kind
    }

    pub fn state(&self) -> ComponentState {
        self.done
    }

    pub fn operations(&self) -> &[OperationId] {
        &self.operations
    }

    pub fn owner(&self) -> EntityId {
        self.owner
    }

    pub fn depends_on_cow(&self) -> bool {
        self.depends_on_cow
    }

    /// Operation used to re-enter this component from elsewhere: the
    /// designated one, or the only operation when there is exactly one.
    pub fn entry_operation(&self) -> Option<OperationId> {
        match (self.entry_operation, self.operations.as_slice()) {
            (Some(op), _) => Some(op),
            (None, [only]) => Some(*only),
            _ => None,
        }
    }
}

/// One externally visible data object.
#[derive(Debug, Clone)]
pub struct EntityNode {
    pub(crate) name: String,
    pub(crate) done: bool,
    pub(crate) components: CompactHashMap<ComponentKey, ComponentId>,
    pub(crate) original: RecordRef,
    pub(crate) evaluated: RecordRef,
}

impl EntityNode {
    pub(crate) fn new(name: String, original: RecordRef, evaluated: RecordRef) -> Self {
        Self {
            name,
            done: false,
            components: CompactHashMap::default(),
            original,
            evaluated,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether the current flush already handled this entity.
    pub fn is_done(&self) -> bool {
        self.done
    }

    pub fn find_component(&self, key: &ComponentKey) -> Option<ComponentId> {
        self.components.get(key).copied()
    }

    /// Lookup for the unnamed component of `kind`.
    pub fn component(&self, kind: ComponentKind) -> Option<ComponentId> {
        self.find_component(&ComponentKey::new(kind))
    }

    pub fn components(&self) -> impl Iterator<Item = ComponentId> + '_ {
        self.components.values().copied()
    }

    pub fn original(&self) -> &RecordRef {
        &self.original
    }

    pub fn evaluated(&self) -> &RecordRef {
        &self.evaluated
    }
}

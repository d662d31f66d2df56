use crate::{ComponentNode, EntityNode, OperationNode};
use evalgraph_core::{
    CompactHashSet, ComponentId, ComponentKey, ComponentKind, EntityId, EvalGraphError,
    OperationFlags, OperationId, OperationKind, Record, RecordRef, RecordTag, Result,
};
use tracing::trace;

/// Dependency graph of operations grouped into components and entities.
///
/// The graph owns every node. Besides the node tables it holds the entry set:
/// operations tagged by an external change since the last
/// [`clear_tags`](crate::clear_tags).
#[derive(Debug, Default)]
pub struct Graph {
    pub(crate) operations: Vec<OperationNode>,
    pub(crate) components: Vec<ComponentNode>,
    pub(crate) entities: Vec<EntityNode>,
    pub(crate) entry_tags: CompactHashSet<OperationId>,
    scene: Option<String>,
    view_layer: Option<String>,
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Scene and view layer handed to editors with every update notification.
    pub fn with_scene(mut self, scene: impl Into<String>, view_layer: impl Into<String>) -> Self {
        self.scene = Some(scene.into());
        self.view_layer = Some(view_layer.into());
        self
    }

    pub fn scene(&self) -> Option<&str> {
        self.scene.as_deref()
    }

    pub fn view_layer(&self) -> Option<&str> {
        self.view_layer.as_deref()
    }

    /// Add an entity with fresh original and evaluated records.
    pub fn add_entity(&mut self, name: impl Into<String>) -> EntityId {
        let name = name.into();
        let original = Record::new(name.clone()).into_ref();
        let evaluated = Record::new(name.clone()).into_ref();
        self.add_entity_with(name, original, evaluated)
    }

    /// # Panics
    ///
    /// If the entity table already holds `u32::MAX + 1` entities.
    pub fn add_entity_with(
        &mut self,
        name: impl Into<String>,
        original: RecordRef,
        evaluated: RecordRef,
    ) -> EntityId {
        let id = EntityId::from_index(self.entities.len());
        self.entities.push(EntityNode::new(name.into(), original, evaluated));
        id
    }

    pub fn add_component(
        &mut self,
        entity: EntityId,
        key: impl Into<ComponentKey>,
    ) -> Result<ComponentId> {
        let key = key.into();
        let id = ComponentId::try_from_index(self.components.len())
            .ok_or(EvalGraphError::CapacityExceeded("components"))?;
        let node = self
            .entities
            .get_mut(entity.index())
            .ok_or(EvalGraphError::UnknownEntity(entity))?;
        if node.components.contains_key(&key) {
            return Err(EvalGraphError::DuplicateComponent {
                entity,
                key: key.to_string(),
            });
        }
        node.components.insert(key.clone(), id);
        self.components.push(ComponentNode::new(key, entity));
        Ok(id)
    }

    pub fn add_operation(&mut self, component: ComponentId, kind: OperationKind) -> Result<OperationId> {
        let id = OperationId::try_from_index(self.operations.len())
            .ok_or(EvalGraphError::CapacityExceeded("operations"))?;
        self.components
            .get_mut(component.index())
            .ok_or(EvalGraphError::UnknownComponent(component))?
            .operations
            .push(id);
        self.operations.push(OperationNode::new(kind, component));
        Ok(id)
    }

    /// Designate the operation through which `component` is re-entered.
    pub fn set_entry_operation(&mut self, component: ComponentId, op: OperationId) -> Result<()> {
        let owner = self.operation(op).ok_or(EvalGraphError::UnknownOperation(op))?.owner;
        if owner != component {
            return Err(EvalGraphError::ConsistencyViolation(format!(
                "{} belongs to {}, not {}",
                op, owner, component
            )));
        }
        self.component_mut(component)?.entry_operation = Some(op);
        Ok(())
    }

    /// Override whether `component` invalidates the copy-on-write proxy.
    pub fn set_depends_on_cow(&mut self, component: ComponentId, depends: bool) -> Result<()> {
        self.component_mut(component)?.depends_on_cow = depends;
        Ok(())
    }

    /// Add a relation `from -> to`: a change of `from` requires `to` to update.
    pub fn add_relation(&mut self, from: OperationId, to: OperationId) -> Result<()> {
        if self.operation(to).is_none() {
            return Err(EvalGraphError::UnknownOperation(to));
        }
        self.operations
            .get_mut(from.index())
            .ok_or(EvalGraphError::UnknownOperation(from))?
            .outlinks
            .push(to);
        Ok(())
    }

    pub fn operation(&self, id: OperationId) -> Option<&OperationNode> {
        self.operations.get(id.index())
    }

    pub fn component(&self, id: ComponentId) -> Option<&ComponentNode> {
        self.components.get(id.index())
    }

    pub fn entity(&self, id: EntityId) -> Option<&EntityNode> {
        self.entities.get(id.index())
    }

    pub fn operations(&self) -> impl Iterator<Item = (OperationId, &OperationNode)> + '_ {
        self.operations
            .iter()
            .enumerate()
            .map(|(i, node)| (OperationId::from_index(i), node))
    }

    pub fn components(&self) -> impl Iterator<Item = (ComponentId, &ComponentNode)> + '_ {
        self.components
            .iter()
            .enumerate()
            .map(|(i, node)| (ComponentId::from_index(i), node))
    }

    pub fn entities(&self) -> impl Iterator<Item = (EntityId, &EntityNode)> + '_ {
        self.entities
            .iter()
            .enumerate()
            .map(|(i, node)| (EntityId::from_index(i), node))
    }

    pub fn operation_count(&self) -> usize {
        self.operations.len()
    }

    pub fn component_count(&self) -> usize {
        self.components.len()
    }

    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    /// Operations tagged since the last tag clear.
    pub fn entry_tags(&self) -> impl Iterator<Item = OperationId> + '_ {
        self.entry_tags.iter().copied()
    }

    pub fn has_entry_tags(&self) -> bool {
        !self.entry_tags.is_empty()
    }

    /// Mark `op` as changed and make it an entry point of the next flush.
    pub fn tag_operation_update(&mut self, op: OperationId) -> Result<()> {
        if self.operation(op).is_none() {
            return Err(EvalGraphError::UnknownOperation(op));
        }
        self.tag_operation(op);
        Ok(())
    }

    /// Tag every operation of `component`. Skipped when the component's entry
    /// operation already needs an update.
    pub fn tag_component_update(&mut self, component: ComponentId) -> Result<()> {
        if self.component(component).is_none() {
            return Err(EvalGraphError::UnknownComponent(component));
        }
        self.tag_component(component);
        Ok(())
    }

    /// Record `recalc` on the entity's original data and tag all its components.
    pub fn tag_entity_update(&mut self, entity: EntityId, recalc: RecordTag) -> Result<()> {
        let node = self
            .entities
            .get(entity.index())
            .ok_or(EvalGraphError::UnknownEntity(entity))?;
        node.original.write().tag |= recalc & RecordTag::RECALC_ALL;
        let components: Vec<ComponentId> = node.components().collect();
        for component in components {
            self.tag_component(component);
        }
        Ok(())
    }

    pub(crate) fn tag_operation(&mut self, op: OperationId) {
        self.operations[op.index()]
            .flags
            .insert(OperationFlags::DIRECTLY_MODIFIED | OperationFlags::NEEDS_UPDATE);
        self.entry_tags.insert(op);
        trace!(%op, "operation tagged");
    }

    pub(crate) fn tag_component(&mut self, component: ComponentId) {
        let node = &self.components[component.index()];
        if let Some(entry) = node.entry_operation() {
            if self.operations[entry.index()].needs_update() {
                return;
            }
        }
        let operations = node.operations.clone();
        for op in operations {
            self.tag_operation(op);
        }
    }

    /// Check the structural conditions the update flush relies on.
    pub fn validate(&self) -> Result<()> {
        for (id, node) in self.operations() {
            if let Some(bad) = node.outlinks.iter().find(|to| self.operation(**to).is_none()) {
                return Err(EvalGraphError::ConsistencyViolation(format!(
                    "{} links to missing {}",
                    id, bad
                )));
            }
        }

        for (id, node) in self.components() {
            if node.kind() != ComponentKind::Bone {
                continue;
            }
            let entity = &self.entities[node.owner.index()];
            let pose = entity.component(ComponentKind::EvalPose).ok_or_else(|| {
                EvalGraphError::ConsistencyViolation(format!(
                    "{} ({}) of entity '{}' has no pose component",
                    id, node.key, entity.name
                ))
            })?;
            if self.components[pose.index()].entry_operation().is_none() {
                return Err(EvalGraphError::ConsistencyViolation(format!(
                    "pose component of entity '{}' has no entry operation",
                    entity.name
                )));
            }
        }

        Ok(())
    }

    fn component_mut(&mut self, id: ComponentId) -> Result<&mut ComponentNode> {
        self.components
            .get_mut(id.index())
            .ok_or(EvalGraphError::UnknownComponent(id))
    }
}

//! Side effects of reaching an entity or a component during propagation.

use crate::propagate::Propagation;
use crate::UpdateContext;
use evalgraph_core::{
    ComponentId, ComponentKind, ComponentState, EntityId, OperationFlags, RecordTag,
};
use tracing::{trace, warn};

impl Propagation<'_> {
    /// Runs once per entity per flush: carry recalc tags over to the evaluated
    /// record, refresh editors, and record the recalc in the database.
    pub(crate) fn handle_entity(&mut self, entity: EntityId) {
        let node = &mut self.graph.entities[entity.index()];
        if node.done {
            return;
        }
        node.done = true;

        let original = &node.original;
        let evaluated = &node.evaluated;
        // Tags are set on original data; the evaluation only reads the copy.
        let recalc = original.read().tag & RecordTag::RECALC_ALL;
        evaluated.write().tag |= recalc;

        let expanded = self.env.cow.is_expanded(&evaluated.read());
        if expanded {
            let ctx = UpdateContext {
                database: self.env.database,
                scene: self.scene.as_deref(),
                view_layer: self.view_layer.as_deref(),
            };
            self.env.notifier.notify_update(&ctx, evaluated);
        }
        self.env.database.mark_recalc(original);
        self.env.database.mark_recalc_data(original);

        self.stats.entities_handled += 1;
        trace!(%entity, name = %node.name, expanded, "entity flushed");
    }

    /// Runs once per component per flush.
    pub(crate) fn handle_component(&mut self, component: ComponentId) {
        let graph = &mut *self.graph;
        let node = &mut graph.components[component.index()];
        if node.done == ComponentState::Done {
            return;
        }
        // Marked before any side effect so nothing below can re-enter it.
        node.done = ComponentState::Done;
        self.stats.components_handled += 1;

        let node = &graph.components[component.index()];
        let entity = &graph.entities[node.owner.index()];

        if self.env.use_copy_on_write && node.depends_on_cow {
            match entity.component(ComponentKind::CopyOnWrite) {
                Some(cow) => {
                    self.deferred_tags.insert(cow);
                }
                None => warn!(
                    %component,
                    entity = %entity.name,
                    "component depends on copy-on-write but its entity has none"
                ),
            }
        }

        for &op in &node.operations {
            let op_node = &mut graph.operations[op.index()];
            if self.env.policy.is_excluded(op_node.kind) {
                continue;
            }
            op_node.flags.insert(OperationFlags::NEEDS_UPDATE);
        }

        // A changed bone may be an IK target, so the whole pose solver has to
        // run again even if the pose is not downstream of the change.
        if node.kind() == ComponentKind::Bone {
            let pose = entity.component(ComponentKind::EvalPose).unwrap_or_else(|| {
                panic!(
                    "bone component {} of entity '{}' has no pose component",
                    node.key, entity.name
                )
            });
            let pose_node = &mut graph.components[pose.index()];
            if pose_node.done == ComponentState::None {
                let entry = pose_node.entry_operation().unwrap_or_else(|| {
                    panic!("pose component {} has no entry operation", pose)
                });
                pose_node.done = ComponentState::Scheduled;
                let entry_node = &mut graph.operations[entry.index()];
                if !entry_node.scheduled {
                    entry_node.scheduled = true;
                    self.queue.push_front(entry);
                    self.stats.operations_scheduled += 1;
                    self.stats.pose_reentries += 1;
                }
            }
        }
    }
}

//! Worklist traversal behind [`UpdateFlusher::flush_updates`](crate::UpdateFlusher::flush_updates).
//!
//! The worklist is double ended. After visiting an operation, the first
//! unscheduled successor becomes the next active operation without a queue
//! round-trip, and every other successor goes to the *front* of the queue.
//! This keeps long chains hot while branches are still drained before older
//! backlog.
//!
//! `OperationNode::scheduled` is the only visit guard: an operation is queued
//! (or made active) at most once per flush, which bounds the walk by the
//! number of operations plus relations.

use crate::{CopyOnWriteQuery, Database, EditorNotifier, FlushStats, Graph, RetagPolicy};
use evalgraph_core::{CompactHashSet, ComponentId, OperationFlags, OperationId};
use std::collections::VecDeque;
use tracing::trace;

/// Collaborators and switches of one flush.
pub(crate) struct FlushEnv<'a> {
    pub(crate) database: &'a dyn Database,
    pub(crate) notifier: &'a dyn EditorNotifier,
    pub(crate) cow: &'a dyn CopyOnWriteQuery,
    pub(crate) policy: &'a RetagPolicy,
    pub(crate) use_copy_on_write: bool,
    pub(crate) record_visits: bool,
}

pub(crate) struct Propagation<'a> {
    pub(crate) graph: &'a mut Graph,
    pub(crate) env: FlushEnv<'a>,
    pub(crate) queue: VecDeque<OperationId>,
    /// Components to tag once the traversal is over.
    pub(crate) deferred_tags: CompactHashSet<ComponentId>,
    pub(crate) scene: Option<String>,
    pub(crate) view_layer: Option<String>,
    pub(crate) stats: FlushStats,
}

impl<'a> Propagation<'a> {
    pub(crate) fn new(graph: &'a mut Graph, env: FlushEnv<'a>) -> Self {
        let scene = graph.scene().map(str::to_string);
        let view_layer = graph.view_layer().map(str::to_string);
        let stats = FlushStats {
            visit_order: env.record_visits.then(Vec::new),
            ..FlushStats::default()
        };
        Self {
            graph,
            env,
            queue: VecDeque::new(),
            deferred_tags: CompactHashSet::default(),
            scene,
            view_layer,
            stats,
        }
    }

    /// Queue every entry-tagged operation.
    pub(crate) fn schedule_entrypoints(&mut self) {
        let graph = &mut *self.graph;
        for &op in graph.entry_tags.iter() {
            graph.operations[op.index()].scheduled = true;
            self.queue.push_back(op);
        }
        self.stats.operations_scheduled += self.queue.len();
        trace!(entries = self.queue.len(), "entry points scheduled");
    }

    pub(crate) fn run(&mut self) {
        while let Some(first) = self.queue.pop_front() {
            let mut active = Some(first);
            while let Some(op) = active {
                self.visit(op);
                active = self.schedule_children(op);
            }
        }
    }

    fn visit(&mut self, op: OperationId) {
        let node = &mut self.graph.operations[op.index()];
        node.flags.insert(OperationFlags::NEEDS_UPDATE);
        let component = node.owner;
        let entity = self.graph.components[component.index()].owner;

        self.stats.operations_visited += 1;
        if let Some(order) = self.stats.visit_order.as_mut() {
            order.push(op);
        }

        self.handle_entity(entity);
        self.handle_component(component);
    }

    /// Schedule the unscheduled successors of `op`, returning the one that
    /// bypasses the queue.
    fn schedule_children(&mut self, op: OperationId) -> Option<OperationId> {
        let graph = &mut *self.graph;
        let mut next = None;
        // Taken out for the loop so targets can be borrowed mutably, a
        // self-relation included.
        let outlinks = std::mem::take(&mut graph.operations[op.index()].outlinks);
        for &to in &outlinks {
            let target = &mut graph.operations[to.index()];
            if target.scheduled {
                continue;
            }
            target.scheduled = true;
            self.stats.operations_scheduled += 1;
            if next.is_none() {
                next = Some(to);
            } else {
                self.queue.push_front(to);
            }
        }
        graph.operations[op.index()].outlinks = outlinks;
        next
    }

    /// Apply the queued copy-on-write tags and hand back the statistics.
    pub(crate) fn finish(self) -> FlushStats {
        let mut stats = self.stats;
        stats.deferred_tags = self.deferred_tags.len();
        for &component in self.deferred_tags.iter() {
            self.graph.tag_component(component);
        }
        stats
    }
}

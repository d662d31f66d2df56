//! Per-node resets run before a flush and after an evaluation.
//!
//! No reset reads another node, so above `threshold` nodes the tables are
//! processed on the rayon pool; the end of `for_each` is the barrier before
//! the next phase.

use crate::Graph;
use evalgraph_core::{ComponentState, OperationFlags};
use rayon::prelude::*;

fn for_each_node<T, F>(nodes: &mut [T], threshold: usize, f: F)
where
    T: Send,
    F: Fn(&mut T) + Sync + Send,
{
    if nodes.len() > threshold {
        nodes.par_iter_mut().for_each(f);
    } else {
        nodes.iter_mut().for_each(f);
    }
}

/// Forget which operations, components and entities the previous flush
/// touched.
pub(crate) fn prepare_flush(graph: &mut Graph, threshold: usize) {
    for_each_node(&mut graph.operations, threshold, |op| op.scheduled = false);
    for_each_node(&mut graph.entities, threshold, |entity| entity.done = false);
    // Every component belongs to exactly one entity, so walking the component
    // table resets each entity's components exactly once.
    for_each_node(&mut graph.components, threshold, |comp| {
        comp.done = ComponentState::None
    });
}

/// Drop update tags from every operation and discard unconsumed entries.
pub(crate) fn clear_operation_tags(graph: &mut Graph, threshold: usize) {
    let tags = OperationFlags::DIRECTLY_MODIFIED | OperationFlags::NEEDS_UPDATE;
    for_each_node(&mut graph.operations, threshold, |op| op.flags.remove(tags));
    graph.entry_tags.clear();
}

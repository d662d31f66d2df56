use crate::propagate::{FlushEnv, Propagation};
use crate::{
    reset, CopyOnWriteQuery, Database, EditorNotifier, Graph, NullNotifier, RecordExpansion,
    RetagPolicy,
};
use evalgraph_core::{EvalGraphConfig, FlushConfig, OperationId};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, trace};

/// What one flush did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlushStats {
    pub operations_visited: usize,
    pub operations_scheduled: usize,
    pub entities_handled: usize,
    pub components_handled: usize,
    /// Pose entry operations queued because a bone changed.
    pub pose_reentries: usize,
    /// Copy-on-write components tagged after the traversal.
    pub deferred_tags: usize,
    pub elapsed: Duration,
    /// Operations in visit order, kept only with `FlushConfig::record_visits`.
    pub visit_order: Option<Vec<OperationId>>,
}

/// Propagates entry tags through a [`Graph`] and clears tags after evaluation.
pub struct UpdateFlusher {
    config: FlushConfig,
    policy: RetagPolicy,
    notifier: Arc<dyn EditorNotifier>,
    cow: Arc<dyn CopyOnWriteQuery>,
}

impl UpdateFlusher {
    pub fn new(config: FlushConfig) -> Self {
        let policy = RetagPolicy::from_config(&config);
        Self {
            config,
            policy,
            notifier: Arc::new(NullNotifier),
            cow: Arc::new(RecordExpansion),
        }
    }

    pub fn from_config(config: &EvalGraphConfig) -> Self {
        Self::new(config.flush.clone())
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn EditorNotifier>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn with_copy_on_write_query(mut self, cow: Arc<dyn CopyOnWriteQuery>) -> Self {
        self.cow = cow;
        self
    }

    pub fn with_policy(mut self, policy: RetagPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn config(&self) -> &FlushConfig {
        &self.config
    }

    pub fn policy(&self) -> &RetagPolicy {
        &self.policy
    }

    /// Flush updates from the entry-tagged operations outwards until every
    /// affected operation needs an update.
    ///
    /// Returns immediately, touching nothing, when no operation is tagged.
    /// The entry set itself is left alone; [`clear_tags`](Self::clear_tags)
    /// empties it after evaluation.
    ///
    /// # Panics
    ///
    /// On a malformed graph: a bone component whose entity has no pose
    /// component, or a pose component without an entry operation.
    /// [`Graph::validate`] reports these without panicking.
    pub fn flush_updates(&self, database: &dyn Database, graph: &mut Graph) -> FlushStats {
        if !graph.has_entry_tags() {
            trace!("no entry tags, skipping flush");
            return FlushStats::default();
        }
        let start = Instant::now();

        reset::prepare_flush(graph, self.config.parallel_threshold);

        let env = FlushEnv {
            database,
            notifier: self.notifier.as_ref(),
            cow: self.cow.as_ref(),
            policy: &self.policy,
            use_copy_on_write: self.config.use_copy_on_write,
            record_visits: self.config.record_visits,
        };
        let mut propagation = Propagation::new(graph, env);
        propagation.schedule_entrypoints();
        propagation.run();
        let mut stats = propagation.finish();
        stats.elapsed = start.elapsed();

        debug!(
            visited = stats.operations_visited,
            entities = stats.entities_handled,
            components = stats.components_handled,
            pose_reentries = stats.pose_reentries,
            deferred_tags = stats.deferred_tags,
            elapsed_us = stats.elapsed.as_micros() as u64,
            "update flush complete"
        );
        stats
    }

    /// Clear update tags from all operations and drop unflushed entry tags.
    pub fn clear_tags(&self, graph: &mut Graph) {
        reset::clear_operation_tags(graph, self.config.parallel_threshold);
        trace!(operations = graph.operation_count(), "tags cleared");
    }
}

impl Default for UpdateFlusher {
    fn default() -> Self {
        Self::new(FlushConfig::default())
    }
}

impl std::fmt::Debug for UpdateFlusher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UpdateFlusher")
            .field("config", &self.config)
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

/// [`UpdateFlusher::flush_updates`] with the default configuration and no
/// editor notifier.
pub fn flush_updates(database: &dyn Database, graph: &mut Graph) -> FlushStats {
    UpdateFlusher::default().flush_updates(database, graph)
}

/// [`UpdateFlusher::clear_tags`] with the default configuration.
pub fn clear_tags(graph: &mut Graph) {
    UpdateFlusher::default().clear_tags(graph)
}

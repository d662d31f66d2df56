use evalgraph_core::{CompactHashSet, FlushConfig, OperationKind};

/// Operation kinds a visited component must not re-tag.
///
/// Excluded operations still get tagged when the traversal reaches them
/// through a relation; they are only skipped by the blanket per-component pass.
#[derive(Debug, Clone)]
pub struct RetagPolicy {
    excluded: CompactHashSet<OperationKind>,
}

impl RetagPolicy {
    /// Policy that re-tags every operation.
    pub fn retag_all() -> Self {
        Self {
            excluded: CompactHashSet::default(),
        }
    }

    pub fn from_config(config: &FlushConfig) -> Self {
        Self::with_exclusions(config.retag_exclusions.iter().copied())
    }

    pub fn with_exclusions(kinds: impl IntoIterator<Item = OperationKind>) -> Self {
        Self {
            excluded: kinds.into_iter().collect(),
        }
    }

    pub fn is_excluded(&self, kind: OperationKind) -> bool {
        self.excluded.contains(&kind)
    }
}

impl Default for RetagPolicy {
    fn default() -> Self {
        Self::from_config(&FlushConfig::default())
    }
}

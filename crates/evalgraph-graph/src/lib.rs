//! Dependency graph and update flushing for EvalGraph.
//!
//! A [`Graph`] holds operations grouped into components, and components
//! grouped into entities. External edits tag operations
//! ([`Graph::tag_operation_update`] and friends), which puts them in the
//! graph's entry set. [`UpdateFlusher::flush_updates`] then walks relations
//! outwards from the entry set, flags every affected operation
//! `NEEDS_UPDATE`, and informs each touched entity's database record and
//! editors exactly once. After evaluation, [`UpdateFlusher::clear_tags`]
//! resets the flags for the next cycle.

pub mod collaborators;
pub mod flush;
pub mod graph;
mod handlers;
pub mod nodes;
pub mod policy;
mod propagate;
mod reset;

pub use collaborators::*;
pub use flush::*;
pub use graph::*;
pub use nodes::*;
pub use policy::*;

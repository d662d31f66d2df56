//! Memory-lean containers shared by the graph tables.
//!
//! - `compact_map`: HashMap / HashSet alternatives using hashbrown + Fx hasher

pub mod compact_map;

pub use compact_map::*;

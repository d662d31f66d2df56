//! Interfaces the update flush calls out to, plus stock implementations.
//!
//! The flush never reaches for global state: the database, editor notifier and
//! copy-on-write query are handed to it explicitly, so tests can swap in
//! recording fakes.

use crossbeam_channel::{Receiver, Sender};
use dashmap::DashMap;
use evalgraph_core::{Record, RecordId, RecordRef};
use tracing::trace;

/// Bookkeeping on the database that owns the original records.
pub trait Database: Send + Sync {
    /// The record needs recalculation.
    fn mark_recalc(&self, original: &RecordRef);
    /// The record's data block needs recalculation.
    fn mark_recalc_data(&self, original: &RecordRef);
}

/// Context handed to editors together with an updated record.
#[derive(Clone, Copy)]
pub struct UpdateContext<'a> {
    pub database: &'a dyn Database,
    pub scene: Option<&'a str>,
    pub view_layer: Option<&'a str>,
}

impl std::fmt::Debug for UpdateContext<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UpdateContext")
            .field("scene", &self.scene)
            .field("view_layer", &self.view_layer)
            .finish_non_exhaustive()
    }
}

/// Fire-and-forget sink for editor/UI refreshes.
pub trait EditorNotifier: Send + Sync {
    fn notify_update(&self, ctx: &UpdateContext<'_>, evaluated: &RecordRef);
}

/// Tells whether a lazily duplicated evaluated record has been materialized.
pub trait CopyOnWriteQuery: Send + Sync {
    fn is_expanded(&self, evaluated: &Record) -> bool;
}

/// Reads [`Record::expanded`].
#[derive(Debug, Default, Clone, Copy)]
pub struct RecordExpansion;

impl CopyOnWriteQuery for RecordExpansion {
    fn is_expanded(&self, evaluated: &Record) -> bool {
        evaluated.expanded
    }
}

/// Drops every notification.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullNotifier;

impl EditorNotifier for NullNotifier {
    fn notify_update(&self, _ctx: &UpdateContext<'_>, _evaluated: &RecordRef) {}
}

/// Message emitted by [`ChannelNotifier`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditorUpdate {
    pub record: RecordId,
    pub name: String,
    pub scene: Option<String>,
    pub view_layer: Option<String>,
}

/// Forwards notifications over a crossbeam channel so editors can pick them
/// up from their own thread.
#[derive(Debug, Clone)]
pub struct ChannelNotifier {
    tx: Sender<EditorUpdate>,
}

impl ChannelNotifier {
    pub fn new(tx: Sender<EditorUpdate>) -> Self {
        Self { tx }
    }

    /// Notifier plus the receiving end of an unbounded channel.
    pub fn unbounded() -> (Self, Receiver<EditorUpdate>) {
        let (tx, rx) = crossbeam_channel::unbounded();
        (Self::new(tx), rx)
    }
}

impl EditorNotifier for ChannelNotifier {
    fn notify_update(&self, ctx: &UpdateContext<'_>, evaluated: &RecordRef) {
        let record = evaluated.read();
        let update = EditorUpdate {
            record: record.id,
            name: record.name.clone(),
            scene: ctx.scene.map(str::to_string),
            view_layer: ctx.view_layer.map(str::to_string),
        };
        // A dropped receiver only means nobody is listening anymore.
        if self.tx.send(update).is_err() {
            trace!(record = %record.id, "editor update dropped, receiver gone");
        }
    }
}

/// Recalc marks recorded for one original record.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RecalcMarks {
    pub recalc: u32,
    pub recalc_data: u32,
}

/// In-memory [`Database`] that counts recalc marks per record.
#[derive(Debug, Default)]
pub struct RecalcLedger {
    marks: DashMap<RecordId, RecalcMarks>,
}

impl RecalcLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn marks(&self, record: RecordId) -> RecalcMarks {
        self.marks.get(&record).map(|m| *m).unwrap_or_default()
    }

    /// Records that received at least one mark.
    pub fn len(&self) -> usize {
        self.marks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.marks.is_empty()
    }

    /// Forget all marks, e.g. once the database has been saved.
    pub fn clear(&self) {
        self.marks.clear();
    }
}

impl Database for RecalcLedger {
    fn mark_recalc(&self, original: &RecordRef) {
        let id = original.read().id;
        self.marks.entry(id).or_default().recalc += 1;
    }

    fn mark_recalc_data(&self, original: &RecordRef) {
        let id = original.read().id;
        self.marks.entry(id).or_default().recalc_data += 1;
    }
}

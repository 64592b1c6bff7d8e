//! Cross-surface event recorder

use std::cell::RefCell;
use std::rc::Rc;

use serde::Serialize;
use windowsim::{Point, Size, Surface, SurfaceId, SurfaceKind};

/// One fired event slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SurfaceEvent {
    Activated,
    Closed,
    PositionChanged(Point),
    Resized(Size),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RecordedEvent {
    pub surface: SurfaceId,
    pub kind: SurfaceKind,
    pub event: SurfaceEvent,
}

/// Shared, ordered log of events from any number of surfaces
///
/// Attaching occupies all four handler slots of the surface. Setting a
/// handler afterwards replaces the recorder for that slot.
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    entries: Rc<RefCell<Vec<RecordedEvent>>>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record every event `surface` fires from now on
    pub fn attach(&self, surface: &Surface) -> windowsim::Result<()> {
        let record = self.sink(surface);

        let r = record.clone();
        surface.on_activated(move || r(SurfaceEvent::Activated))?;
        let r = record.clone();
        surface.on_closed(move || r(SurfaceEvent::Closed))?;
        let r = record.clone();
        surface.on_position_changed(move |p| r(SurfaceEvent::PositionChanged(p)))?;
        surface.on_resized(move |s| record(SurfaceEvent::Resized(s)))?;

        tracing::trace!(surface = %surface.id(), "event log attached");
        Ok(())
    }

    fn sink(&self, surface: &Surface) -> impl Fn(SurfaceEvent) + Clone + 'static {
        let entries = Rc::clone(&self.entries);
        let (id, kind) = (surface.id(), surface.kind());
        move |event| {
            entries.borrow_mut().push(RecordedEvent {
                surface: id,
                kind,
                event,
            })
        }
    }

    /// Every recorded event, oldest first
    pub fn entries(&self) -> Vec<RecordedEvent> {
        self.entries.borrow().clone()
    }

    /// Events fired by one surface, oldest first
    pub fn events_for(&self, id: SurfaceId) -> Vec<SurfaceEvent> {
        self.entries
            .borrow()
            .iter()
            .filter(|e| e.surface == id)
            .map(|e| e.event)
            .collect()
    }

    /// Index of the first entry matching `surface` and `event`
    pub fn position_of(&self, id: SurfaceId, event: SurfaceEvent) -> Option<usize> {
        self.entries
            .borrow()
            .iter()
            .position(|e| e.surface == id && e.event == event)
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }

    pub fn clear(&self) {
        self.entries.borrow_mut().clear();
    }
}

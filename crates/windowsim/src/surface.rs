//! Shared surface state
//!
//! Windows and popups are both built on a `Surface`: position, client size,
//! scaling, a lifecycle flag and four single-subscriber event slots.
//! Surfaces are mutated only through the owning `Window`/`Popup`
//! operations; external code can read state and (re)set handlers.
//!
//! Event delivery is synchronous. A surface fires its own slot first and
//! then notifies dependent surfaces (popups) in attachment order.
//!
//! A slot is vacated while its handler runs. A move or resize issued from
//! inside a `position_changed`/`resized` handler updates the state and
//! notifies dependents, but is not delivered to the running handler again.
//!
//! A surface owns its dependents: a popup stays attached, and keeps
//! following its parent, until it or the parent is closed, whether or not
//! anything else still holds the popup.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};
use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

use crate::error::{Result, WindowingError};
use crate::geometry::{Point, Rect, Size};
use crate::screen::ScreenDescriptor;

static NEXT_SURFACE_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique surface identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct SurfaceId(u64);

impl SurfaceId {
    fn next() -> Self {
        Self(NEXT_SURFACE_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for SurfaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SurfaceKind {
    Window,
    Popup,
}

impl fmt::Display for SurfaceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SurfaceKind::Window => f.write_str("window"),
            SurfaceKind::Popup => f.write_str("popup"),
        }
    }
}

/// Lifecycle of a surface
///
/// `Closing` covers the window between `close()` being called and the
/// `closed` handler returning; the surface already refuses operations.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Lifecycle {
    #[default]
    Created,
    Visible,
    Closing,
    Closed,
}

/// Snapshot of a surface's geometry and lifecycle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceState {
    pub position: Point,
    pub client_size: Size,
    pub scaling: f64,
    pub lifecycle: Lifecycle,
}

impl SurfaceState {
    /// Screen rectangle covered by the client area
    pub fn bounds(&self) -> Rect {
        Rect::from_origin_size(self.position, self.client_size)
    }

    pub fn is_closed(&self) -> bool {
        matches!(self.lifecycle, Lifecycle::Closing | Lifecycle::Closed)
    }
}

type Handler<A> = Box<dyn FnMut(A)>;

#[derive(Default)]
struct EventSlots {
    activated: Option<Handler<()>>,
    closed: Option<Handler<()>>,
    position_changed: Option<Handler<Point>>,
    resized: Option<Handler<Size>>,
}

impl EventSlots {
    fn activated(&mut self) -> &mut Option<Handler<()>> {
        &mut self.activated
    }

    fn closed(&mut self) -> &mut Option<Handler<()>> {
        &mut self.closed
    }

    fn position_changed(&mut self) -> &mut Option<Handler<Point>> {
        &mut self.position_changed
    }

    fn resized(&mut self) -> &mut Option<Handler<Size>> {
        &mut self.resized
    }
}

/// Surfaces whose geometry depends on another surface (popups on their parent)
pub(crate) trait SurfaceObserver {
    /// The observed surface moved or resized; `parent` is its new state
    fn parent_changed(&self, parent: &SurfaceState);

    /// The observed surface closed
    fn parent_closed(&self);
}

struct Observer {
    id: SurfaceId,
    observer: Rc<dyn SurfaceObserver>,
}

struct SurfaceCore {
    id: SurfaceId,
    kind: SurfaceKind,
    screen: ScreenDescriptor,
    state: RefCell<SurfaceState>,
    slots: RefCell<EventSlots>,
    observers: RefCell<Vec<Observer>>,
}

/// Shared handle to a window's or popup's state and event slots
#[derive(Clone)]
pub struct Surface {
    core: Rc<SurfaceCore>,
}

/// Non-owning surface reference
#[derive(Clone)]
pub(crate) struct WeakSurface(Weak<SurfaceCore>);

impl WeakSurface {
    pub(crate) fn upgrade(&self) -> Option<Surface> {
        self.0.upgrade().map(|core| Surface { core })
    }
}

impl fmt::Debug for Surface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Surface")
            .field("id", &self.core.id)
            .field("kind", &self.core.kind)
            .field("state", &*self.core.state.borrow())
            .finish_non_exhaustive()
    }
}

impl Surface {
    pub(crate) fn new(kind: SurfaceKind, screen: ScreenDescriptor, scaling: f64) -> Self {
        let id = SurfaceId::next();
        tracing::debug!(%kind, surface = %id, scaling, "surface created");
        Self {
            core: Rc::new(SurfaceCore {
                id,
                kind,
                screen,
                state: RefCell::new(SurfaceState {
                    position: Point::ORIGIN,
                    client_size: Size::default(),
                    scaling,
                    lifecycle: Lifecycle::Created,
                }),
                slots: RefCell::new(EventSlots::default()),
                observers: RefCell::new(Vec::new()),
            }),
        }
    }

    pub fn id(&self) -> SurfaceId {
        self.core.id
    }

    pub fn kind(&self) -> SurfaceKind {
        self.core.kind
    }

    /// The screen this surface lives on
    pub fn screen(&self) -> ScreenDescriptor {
        self.core.screen
    }

    pub fn state(&self) -> SurfaceState {
        *self.core.state.borrow()
    }

    pub fn position(&self) -> Point {
        self.core.state.borrow().position
    }

    pub fn client_size(&self) -> Size {
        self.core.state.borrow().client_size
    }

    pub fn scaling(&self) -> f64 {
        self.core.state.borrow().scaling
    }

    pub fn lifecycle(&self) -> Lifecycle {
        self.core.state.borrow().lifecycle
    }

    pub fn is_closed(&self) -> bool {
        self.core.state.borrow().is_closed()
    }

    /// Whether both handles refer to the same surface
    pub fn same_surface(&self, other: &Surface) -> bool {
        Rc::ptr_eq(&self.core, &other.core)
    }

    // ===== Event slots =====

    /// Replace the `activated` handler
    pub fn on_activated(&self, mut handler: impl FnMut() + 'static) -> Result<()> {
        let boxed: Handler<()> = Box::new(move |()| handler());
        self.set_slot(EventSlots::activated, boxed)
    }

    /// Replace the `closed` handler
    pub fn on_closed(&self, mut handler: impl FnMut() + 'static) -> Result<()> {
        let boxed: Handler<()> = Box::new(move |()| handler());
        self.set_slot(EventSlots::closed, boxed)
    }

    /// Replace the `position_changed` handler.
    ///
    /// The handler is not re-entered: moving this surface from inside it
    /// takes effect, but the nested move is not reported to it.
    pub fn on_position_changed(&self, handler: impl FnMut(Point) + 'static) -> Result<()> {
        let boxed: Handler<Point> = Box::new(handler);
        self.set_slot(EventSlots::position_changed, boxed)
    }

    /// Replace the `resized` handler. Like `position_changed`, a resize made
    /// from inside the handler is not reported to it.
    pub fn on_resized(&self, handler: impl FnMut(Size) + 'static) -> Result<()> {
        let boxed: Handler<Size> = Box::new(handler);
        self.set_slot(EventSlots::resized, boxed)
    }

    fn set_slot<A>(
        &self,
        select: fn(&mut EventSlots) -> &mut Option<Handler<A>>,
        handler: Handler<A>,
    ) -> Result<()> {
        self.ensure_open()?;
        *select(&mut self.core.slots.borrow_mut()) = Some(handler);
        Ok(())
    }

    /// Invoke a slot without holding any borrow across the call, so the
    /// handler is free to query or drive this surface.
    fn fire<A>(&self, select: fn(&mut EventSlots) -> &mut Option<Handler<A>>, arg: A) {
        let taken = select(&mut self.core.slots.borrow_mut()).take();
        let Some(mut handler) = taken else {
            return;
        };

        handler(arg);

        if self.is_closed() {
            return;
        }
        let mut slots = self.core.slots.borrow_mut();
        let slot = select(&mut slots);
        if slot.is_none() {
            *slot = Some(handler);
        }
    }

    // ===== Operations (driven by Window / Popup) =====

    pub(crate) fn ensure_open(&self) -> Result<()> {
        if self.is_closed() {
            return Err(WindowingError::ClosedSurface {
                kind: self.core.kind,
                id: self.core.id,
            });
        }
        Ok(())
    }

    pub(crate) fn activate(&self) -> Result<()> {
        self.ensure_open()?;
        self.core.state.borrow_mut().lifecycle = Lifecycle::Visible;
        tracing::debug!(kind = %self.core.kind, surface = %self.core.id, "activated");
        self.fire(EventSlots::activated, ());
        Ok(())
    }

    /// Set the position and fire `position_changed`, even if unchanged
    pub(crate) fn set_position(&self, position: Point) -> Result<()> {
        self.ensure_open()?;
        self.core.state.borrow_mut().position = position;
        tracing::debug!(kind = %self.core.kind, surface = %self.core.id, ?position, "moved");
        self.fire(EventSlots::position_changed, position);
        self.notify_changed();
        Ok(())
    }

    /// Set the client size and fire `resized`, even if unchanged
    pub(crate) fn set_client_size(&self, size: Size) -> Result<()> {
        self.ensure_open()?;
        self.core.state.borrow_mut().client_size = size;
        tracing::debug!(kind = %self.core.kind, surface = %self.core.id, ?size, "resized");
        self.fire(EventSlots::resized, size);
        self.notify_changed();
        Ok(())
    }

    /// Move and resize to `rect`, firing only the events whose value
    /// actually changed. Returns whether anything changed.
    pub(crate) fn apply_geometry(&self, rect: Rect) -> Result<bool> {
        self.ensure_open()?;
        let (moved, resized) = {
            let mut state = self.core.state.borrow_mut();
            let moved = state.position != rect.origin();
            let resized = state.client_size != rect.size();
            state.position = rect.origin();
            state.client_size = rect.size();
            (moved, resized)
        };

        if moved {
            tracing::debug!(kind = %self.core.kind, surface = %self.core.id, position = ?rect.origin(), "moved");
            self.fire(EventSlots::position_changed, rect.origin());
        }
        if resized {
            tracing::debug!(kind = %self.core.kind, surface = %self.core.id, size = ?rect.size(), "resized");
            self.fire(EventSlots::resized, rect.size());
        }
        if moved || resized {
            self.notify_changed();
        }
        Ok(moved || resized)
    }

    /// Fire `closed`, enter the terminal state, drop every handler and
    /// close dependent surfaces.
    pub(crate) fn close(&self) -> Result<()> {
        self.ensure_open()?;
        self.core.state.borrow_mut().lifecycle = Lifecycle::Closing;
        tracing::debug!(kind = %self.core.kind, surface = %self.core.id, "closing");

        self.fire(EventSlots::closed, ());

        self.core.state.borrow_mut().lifecycle = Lifecycle::Closed;
        let slots = std::mem::take(&mut *self.core.slots.borrow_mut());
        drop(slots);

        let observers = std::mem::take(&mut *self.core.observers.borrow_mut());
        for o in &observers {
            o.observer.parent_closed();
        }
        tracing::debug!(kind = %self.core.kind, surface = %self.core.id, "closed");
        Ok(())
    }

    // ===== Dependents =====

    pub(crate) fn downgrade(&self) -> WeakSurface {
        WeakSurface(Rc::downgrade(&self.core))
    }

    /// Attach a dependent. The surface keeps it alive until either side closes.
    pub(crate) fn attach_observer(&self, id: SurfaceId, observer: Rc<dyn SurfaceObserver>) {
        self.core
            .observers
            .borrow_mut()
            .push(Observer { id, observer });
    }

    pub(crate) fn detach_observer(&self, id: SurfaceId) {
        self.core.observers.borrow_mut().retain(|o| o.id != id);
    }

    /// Number of open dependents (popups) attached to this surface
    pub fn dependent_count(&self) -> usize {
        self.core.observers.borrow().len()
    }

    fn notify_changed(&self) {
        if self.is_closed() {
            return;
        }
        let live: Vec<_> = self
            .core
            .observers
            .borrow()
            .iter()
            .map(|o| o.observer.clone())
            .collect();
        let state = self.state();
        for observer in live {
            observer.parent_changed(&state);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;

    fn surface() -> Surface {
        Surface::new(SurfaceKind::Window, ScreenDescriptor::default(), 1.0)
    }

    #[test]
    fn new_surface_has_zero_geometry() {
        let s = surface();
        let state = s.state();

        assert_eq!(state.position, Point::ORIGIN);
        assert_eq!(state.client_size, Size::default());
        assert_eq!(state.scaling, 1.0);
        assert_eq!(state.lifecycle, Lifecycle::Created);
    }

    #[test]
    fn ids_are_unique() {
        assert_ne!(surface().id(), surface().id());
    }

    #[test]
    fn setting_a_slot_replaces_the_previous_handler() {
        let s = surface();
        let first = Rc::new(Cell::new(0));
        let second = Rc::new(Cell::new(0));

        let f = first.clone();
        s.on_activated(move || f.set(f.get() + 1)).unwrap();
        let g = second.clone();
        s.on_activated(move || g.set(g.get() + 1)).unwrap();

        s.activate().unwrap();

        assert_eq!(first.get(), 0);
        assert_eq!(second.get(), 1);
    }

    #[test]
    fn handler_can_query_its_own_surface() {
        let s = surface();
        let seen = Rc::new(Cell::new(Point::ORIGIN));

        let handle = s.clone();
        let seen_in = seen.clone();
        s.on_position_changed(move |_| seen_in.set(handle.position()))
            .unwrap();

        s.set_position(Point::new(7, 9)).unwrap();
        assert_eq!(seen.get(), Point::new(7, 9));
    }

    #[test]
    fn handler_survives_reentrant_delivery() {
        let s = surface();
        let calls = Rc::new(Cell::new(0));

        let handle = s.clone();
        let count = calls.clone();
        s.on_position_changed(move |p| {
            count.set(count.get() + 1);
            if p.x < 3 {
                handle.set_position(Point::new(p.x + 1, p.y)).unwrap();
            }
        })
        .unwrap();

        s.set_position(Point::new(0, 0)).unwrap();

        // Nested deliveries find the slot vacated; the handler is restored afterwards
        assert_eq!(calls.get(), 1);
        assert_eq!(s.position(), Point::new(1, 0));

        s.set_position(Point::new(10, 0)).unwrap();
        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn resize_from_resized_handler_is_not_reported_to_it() {
        let s = surface();
        let seen = Rc::new(RefCell::new(Vec::new()));

        let handle = s.clone();
        let log = seen.clone();
        s.on_resized(move |size| {
            log.borrow_mut().push(size);
            handle.set_client_size(Size::new(size.width * 2, size.height)).unwrap();
        })
        .unwrap();

        s.set_client_size(Size::new(10, 10)).unwrap();

        assert_eq!(*seen.borrow(), vec![Size::new(10, 10)]);
        assert_eq!(s.client_size(), Size::new(20, 10));
    }

    #[test]
    fn handler_installed_during_delivery_wins() {
        let s = surface();
        let replaced = Rc::new(Cell::new(false));

        let handle = s.clone();
        let flag = replaced.clone();
        s.on_activated(move || {
            let flag = flag.clone();
            handle.on_activated(move || flag.set(true)).unwrap();
        })
        .unwrap();

        s.activate().unwrap();
        assert!(!replaced.get());
        s.activate().unwrap();
        assert!(replaced.get());
    }

    #[test]
    fn apply_geometry_fires_only_changes() {
        let s = surface();
        let moves = Rc::new(Cell::new(0));
        let resizes = Rc::new(Cell::new(0));

        let m = moves.clone();
        s.on_position_changed(move |_| m.set(m.get() + 1)).unwrap();
        let r = resizes.clone();
        s.on_resized(move |_| r.set(r.get() + 1)).unwrap();

        assert!(s.apply_geometry(Rect::new(10, 10, 100, 100)).unwrap());
        assert_eq!((moves.get(), resizes.get()), (1, 1));

        assert!(s.apply_geometry(Rect::new(20, 10, 100, 100)).unwrap());
        assert_eq!((moves.get(), resizes.get()), (2, 1));

        assert!(!s.apply_geometry(Rect::new(20, 10, 100, 100)).unwrap());
        assert_eq!((moves.get(), resizes.get()), (2, 1));
    }

    #[test]
    fn close_fires_closed_once_and_rejects_further_operations() {
        let s = surface();
        let closed = Rc::new(Cell::new(0));
        let lifecycle_during = Rc::new(Cell::new(Lifecycle::Created));

        let c = closed.clone();
        let l = lifecycle_during.clone();
        let handle = s.clone();
        s.on_closed(move || {
            c.set(c.get() + 1);
            l.set(handle.lifecycle());
        })
        .unwrap();

        s.close().unwrap();

        assert_eq!(closed.get(), 1);
        assert_eq!(lifecycle_during.get(), Lifecycle::Closing);
        assert_eq!(s.lifecycle(), Lifecycle::Closed);

        let err = s.set_position(Point::new(1, 1)).unwrap_err();
        assert_eq!(
            err,
            WindowingError::ClosedSurface {
                kind: SurfaceKind::Window,
                id: s.id()
            }
        );
        assert!(s.close().is_err());
        assert!(s.on_resized(|_| {}).is_err());
        assert_eq!(closed.get(), 1);
    }

    #[test]
    fn closing_inside_a_handler_stops_later_events() {
        let s = surface();
        let resized = Rc::new(Cell::new(false));

        let handle = s.clone();
        s.on_position_changed(move |_| handle.close().unwrap()).unwrap();
        let r = resized.clone();
        s.on_resized(move |_| r.set(true)).unwrap();

        s.apply_geometry(Rect::new(5, 5, 10, 10)).unwrap();

        assert!(s.is_closed());
        assert!(!resized.get());
    }
}

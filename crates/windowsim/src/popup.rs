//! Popup simulator
//!
//! A popup is a transient surface attached to a parent (a window or another
//! popup). The parent owns the popup until one of them closes; the popup
//! holds only a non-owning reference back and never mutates the parent. A positioned popup re-runs its placement whenever the parent
//! moves or resizes and publishes the result through its own
//! `position_changed`/`resized` slots, after the parent's events have fired.
//! Popups close with their parent, including when the parent is dropped
//! without being closed.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::error::{Result, WindowingError};
use crate::geometry::{Point, Rect, Size};
use crate::platform::PopupFactory;
use crate::positioner::{PopupPositioner, PositionerParameters};
use crate::surface::{Surface, SurfaceId, SurfaceKind, SurfaceObserver, SurfaceState, WeakSurface};

struct PopupInner {
    surface: Surface,
    parent: WeakSurface,
    positioner: Option<RefCell<PopupPositioner>>,
    popup_factory: RefCell<Option<PopupFactory>>,
}

/// Handle to a simulated popup
#[derive(Clone)]
pub struct Popup {
    inner: Rc<PopupInner>,
}

impl fmt::Debug for Popup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Popup")
            .field("surface", &self.inner.surface)
            .field("positioned", &self.inner.positioner.is_some())
            .finish_non_exhaustive()
    }
}

impl Popup {
    /// Popup with no placement wiring. It follows its parent's lifetime
    /// but not its geometry.
    pub fn inert(parent: &Surface) -> Result<Self> {
        Self::attach(parent, None)
    }

    /// Popup driven by a placement engine. Nothing is placed until
    /// parameters arrive through [`Popup::update_placement`].
    pub fn positioned(parent: &Surface) -> Result<Self> {
        Self::attach(parent, Some(PopupPositioner::new()))
    }

    /// Positioned popup, placed immediately
    pub fn with_placement(parent: &Surface, parameters: PositionerParameters) -> Result<Self> {
        let popup = Self::positioned(parent)?;
        popup.update_placement(parameters)?;
        Ok(popup)
    }

    fn attach(parent: &Surface, positioner: Option<PopupPositioner>) -> Result<Self> {
        parent.ensure_open()?;

        let surface = Surface::new(SurfaceKind::Popup, parent.screen(), parent.scaling());
        let inner = Rc::new(PopupInner {
            surface,
            parent: parent.downgrade(),
            positioner: positioner.map(RefCell::new),
            popup_factory: RefCell::new(None),
        });

        parent.attach_observer(inner.surface.id(), inner.clone());

        tracing::debug!(
            popup = %inner.surface.id(),
            parent = %parent.id(),
            positioned = inner.positioner.is_some(),
            "popup attached"
        );
        Ok(Self { inner })
    }

    pub fn surface(&self) -> &Surface {
        &self.inner.surface
    }

    pub fn id(&self) -> SurfaceId {
        self.inner.surface.id()
    }

    pub fn position(&self) -> Point {
        self.inner.surface.position()
    }

    pub fn client_size(&self) -> Size {
        self.inner.surface.client_size()
    }

    pub fn is_closed(&self) -> bool {
        self.inner.surface.is_closed()
    }

    /// The parent surface, if it is still alive
    pub fn parent(&self) -> Option<Surface> {
        self.inner.parent.upgrade()
    }

    pub fn is_positioned(&self) -> bool {
        self.inner.positioner.is_some()
    }

    /// Current placement parameters (positioned popups only)
    pub fn placement(&self) -> Option<PositionerParameters> {
        self.inner
            .positioner
            .as_ref()
            .and_then(|p| p.borrow().parameters())
    }

    /// Change the placement request and re-place immediately
    pub fn update_placement(&self, parameters: PositionerParameters) -> Result<()> {
        self.inner.surface.ensure_open()?;
        let positioner = self.inner.positioner.as_ref().ok_or(
            WindowingError::UnsupportedOperation("placement on a popup without a positioner"),
        )?;
        positioner.borrow_mut().update(parameters)?;
        self.inner.reposition()
    }

    pub(crate) fn set_popup_factory(&self, factory: PopupFactory) {
        let mut slot = self.inner.popup_factory.borrow_mut();
        if slot.is_none() {
            *slot = Some(factory);
        }
    }

    // ===== Lifecycle operations =====

    /// Make the popup visible; fires `activated` every time
    pub fn show(&self) -> Result<()> {
        self.inner.surface.activate()
    }

    /// Move the popup, sliding it back inside the screen's working area
    /// if it would stick out
    pub fn move_to(&self, position: Point) -> Result<()> {
        self.inner.surface.ensure_open()?;
        let area = self.inner.surface.screen().working_area();
        let rect = Rect::from_origin_size(position, self.client_size());
        let clamped = Point::new(
            clamp_axis(rect.x, rect.width, area.x, area.right()),
            clamp_axis(rect.y, rect.height, area.y, area.bottom()),
        );
        if clamped != position {
            tracing::debug!(popup = %self.id(), requested = ?position, ?clamped, "popup move clamped");
        }
        self.inner.surface.set_position(clamped)
    }

    /// Resize the popup
    ///
    /// A popup with placement parameters treats this as a new requested
    /// popup size and re-places. Otherwise the size is constrained to the
    /// screen bounds like a window's.
    pub fn resize(&self, size: Size) -> Result<()> {
        self.inner.surface.ensure_open()?;
        if let Some(parameters) = self.placement() {
            return self.update_placement(PositionerParameters { size, ..parameters });
        }
        if size.is_negative() {
            return Err(WindowingError::InvalidGeometry(format!(
                "popup size {size:?} is negative"
            )));
        }
        let bound = self.inner.surface.screen().bounds().size();
        self.inner.surface.set_client_size(size.constrain(bound))
    }

    /// Close the popup and any popups nested in it
    pub fn close(&self) -> Result<()> {
        self.inner.close()
    }

    /// Create a popup nested in this one
    pub fn create_popup(&self) -> Result<Popup> {
        self.inner.surface.ensure_open()?;
        let factory = self.inner.popup_factory.borrow().clone();
        let child = match &factory {
            Some(factory) => factory(&self.inner.surface)?,
            None => Popup::inert(&self.inner.surface)?,
        };
        if let Some(factory) = factory {
            child.set_popup_factory(factory);
        }
        Ok(child)
    }
}

impl PopupInner {
    fn reposition(&self) -> Result<()> {
        let Some(parent) = self.parent.upgrade() else {
            return Ok(());
        };
        self.reposition_against(&parent.state())
    }

    fn reposition_against(&self, parent: &SurfaceState) -> Result<()> {
        let Some(positioner) = &self.positioner else {
            return Ok(());
        };
        let constraint = self.surface.screen().working_area();
        let placed = positioner.borrow_mut().place(parent.bounds(), constraint)?;
        if let Some(rect) = placed {
            self.surface.apply_geometry(rect)?;
        }
        Ok(())
    }

    fn close(&self) -> Result<()> {
        self.surface.close()?;
        if let Some(parent) = self.parent.upgrade() {
            parent.detach_observer(self.surface.id());
        }
        Ok(())
    }
}

impl Drop for PopupInner {
    fn drop(&mut self) {
        if self.surface.is_closed() {
            return;
        }
        tracing::debug!(popup = %self.surface.id(), "parent dropped, closing popup");
        if let Err(e) = self.surface.close() {
            tracing::warn!(popup = %self.surface.id(), error = %e, "failed to close orphaned popup");
        }
    }
}

impl SurfaceObserver for PopupInner {
    fn parent_changed(&self, parent: &SurfaceState) {
        if self.surface.is_closed() {
            return;
        }
        if let Err(e) = self.reposition_against(parent) {
            tracing::warn!(popup = %self.surface.id(), error = %e, "failed to re-place popup");
        }
    }

    fn parent_closed(&self) {
        if self.surface.is_closed() {
            return;
        }
        if let Err(e) = self.close() {
            tracing::warn!(popup = %self.surface.id(), error = %e, "failed to close popup with parent");
        }
    }
}

/// Keep `[pos, pos+len)` inside `[lo, hi)` where possible, never before `lo`
fn clamp_axis(pos: i32, len: i32, lo: i32, hi: i32) -> i32 {
    pos.min(hi.saturating_sub(len)).max(lo)
}

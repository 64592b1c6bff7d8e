//! Window simulator
//!
//! Each operation mutates the window's surface state and fires the matching
//! event slot before returning. Windows are never clamped to the screen
//! position-wise; only their client size is bounded by the screen.

use std::fmt;

use crate::error::{Result, WindowingError};
use crate::geometry::{Point, Size};
use crate::platform::PopupFactory;
use crate::popup::Popup;
use crate::screen::ScreenDescriptor;
use crate::surface::{Surface, SurfaceId, SurfaceKind};

/// Handle to a simulated top-level window
#[derive(Clone)]
pub struct Window {
    surface: Surface,
    popup_factory: Option<PopupFactory>,
}

impl fmt::Debug for Window {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Window")
            .field("surface", &self.surface)
            .field("popup_factory", &self.popup_factory.is_some())
            .finish()
    }
}

impl Window {
    /// Window on `screen` with a scaling factor of 1
    pub fn new(screen: ScreenDescriptor) -> Self {
        Self::on_screen(screen, 1.0)
    }

    pub fn with_scaling(screen: ScreenDescriptor, scaling: f64) -> Result<Self> {
        if scaling.is_nan() || scaling <= 0.0 {
            return Err(WindowingError::InvalidGeometry(format!(
                "scaling must be positive, got {scaling}"
            )));
        }
        Ok(Self::on_screen(screen, scaling))
    }

    /// `scaling` must already be known to be positive
    pub(crate) fn on_screen(screen: ScreenDescriptor, scaling: f64) -> Self {
        Self {
            surface: Surface::new(SurfaceKind::Window, screen, scaling),
            popup_factory: None,
        }
    }

    /// Route `create_popup` through `factory` instead of building an inert popup
    pub fn with_popup_factory(mut self, factory: PopupFactory) -> Self {
        self.popup_factory = Some(factory);
        self
    }

    pub fn surface(&self) -> &Surface {
        &self.surface
    }

    pub fn id(&self) -> SurfaceId {
        self.surface.id()
    }

    pub fn position(&self) -> Point {
        self.surface.position()
    }

    pub fn client_size(&self) -> Size {
        self.surface.client_size()
    }

    pub fn is_closed(&self) -> bool {
        self.surface.is_closed()
    }

    /// Make the window visible and active
    ///
    /// Calling it again re-fires `activated`, like a platform re-activating
    /// an already visible window.
    pub fn show(&self) -> Result<()> {
        self.surface.activate()
    }

    pub fn move_to(&self, position: Point) -> Result<()> {
        self.surface.set_position(position)
    }

    /// Resize the client area, bounded by the screen size
    pub fn resize(&self, size: Size) -> Result<()> {
        self.surface.ensure_open()?;
        if size.is_negative() {
            return Err(WindowingError::InvalidGeometry(format!(
                "window size {size:?} is negative"
            )));
        }
        let bound = self.surface.screen().bounds().size();
        let client_size = size.constrain(bound);
        if client_size != size {
            tracing::debug!(window = %self.id(), requested = ?size, ?client_size, "resize constrained to screen");
        }
        self.surface.set_client_size(client_size)
    }

    /// Fire `closed`, then close every popup still attached
    pub fn close(&self) -> Result<()> {
        self.surface.close()
    }

    /// Create a popup parented to this window. Does not affect the
    /// window's own lifecycle.
    pub fn create_popup(&self) -> Result<Popup> {
        self.surface.ensure_open()?;
        let popup = match &self.popup_factory {
            Some(factory) => {
                let popup = factory(&self.surface)?;
                popup.set_popup_factory(factory.clone());
                popup
            }
            None => Popup::inert(&self.surface)?,
        };
        tracing::debug!(window = %self.id(), popup = %popup.id(), "popup created");
        Ok(popup)
    }
}

#[cfg(test)]
mod tests {
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    use super::*;
    use crate::positioner::PositionerParameters;

    fn window() -> Window {
        Window::new(ScreenDescriptor::default())
    }

    #[test]
    fn show_fires_activated_every_time() {
        let w = window();
        let count = Rc::new(Cell::new(0));
        let c = count.clone();
        w.surface().on_activated(move || c.set(c.get() + 1)).unwrap();

        w.show().unwrap();
        w.show().unwrap();

        assert_eq!(count.get(), 2);
    }

    #[test]
    fn move_is_not_clamped() {
        let w = window();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let s = seen.clone();
        w.surface()
            .on_position_changed(move |p| s.borrow_mut().push(p))
            .unwrap();

        w.move_to(Point::new(-500, 5000)).unwrap();

        assert_eq!(w.position(), Point::new(-500, 5000));
        assert_eq!(*seen.borrow(), vec![Point::new(-500, 5000)]);
    }

    #[test]
    fn resize_is_bounded_by_screen() {
        let w = window();
        let seen = Rc::new(Cell::new(Size::default()));
        let s = seen.clone();
        w.surface().on_resized(move |size| s.set(size)).unwrap();

        w.resize(Size::new(2000, 2000)).unwrap();

        assert_eq!(w.client_size(), Size::new(1280, 1024));
        assert_eq!(seen.get(), Size::new(1280, 1024));
    }

    #[test]
    fn negative_resize_rejected() {
        let w = window();
        assert!(matches!(
            w.resize(Size::new(-1, 100)),
            Err(WindowingError::InvalidGeometry(_))
        ));
        assert_eq!(w.client_size(), Size::default());
    }

    #[test]
    fn create_popup_does_not_close_window() {
        let w = window();
        let closed = Rc::new(Cell::new(false));
        let c = closed.clone();
        w.surface().on_closed(move || c.set(true)).unwrap();

        let popup = w.create_popup().unwrap();

        assert!(!closed.get());
        assert!(!w.is_closed());
        assert!(!popup.is_positioned());
        assert!(popup.parent().unwrap().same_surface(w.surface()));
    }

    #[test]
    fn popup_factory_is_used_and_inherited() {
        let built = Rc::new(Cell::new(0));
        let b = built.clone();
        let factory: PopupFactory = Rc::new(move |parent: &Surface| {
            b.set(b.get() + 1);
            Popup::positioned(parent)
        });
        let w = window().with_popup_factory(factory);

        let popup = w.create_popup().unwrap();
        assert!(popup.is_positioned());

        let nested = popup.create_popup().unwrap();
        assert!(nested.is_positioned());
        assert_eq!(built.get(), 2);

        nested
            .update_placement(PositionerParameters::dropdown(Size::new(10, 10)))
            .unwrap();
    }

    #[test]
    fn operations_after_close_fail() {
        let w = window();
        w.close().unwrap();

        let closed = WindowingError::ClosedSurface {
            kind: SurfaceKind::Window,
            id: w.id(),
        };
        assert_eq!(w.move_to(Point::new(1, 1)), Err(closed.clone()));
        assert_eq!(w.resize(Size::new(1, 1)), Err(closed.clone()));
        assert_eq!(w.show(), Err(closed.clone()));
        assert_eq!(w.close(), Err(closed.clone()));
        assert!(matches!(w.create_popup(), Err(WindowingError::ClosedSurface { .. })));
    }

    #[test]
    fn invalid_scaling_rejected() {
        assert!(Window::with_scaling(ScreenDescriptor::default(), 0.0).is_err());
        let w = Window::with_scaling(ScreenDescriptor::default(), 2.0).unwrap();
        assert_eq!(w.surface().scaling(), 2.0);
    }
}

//! Platform factory
//!
//! Single entry point that hands out windows and screen lists. The screens
//! come from the process-wide registry when one has been set up, and from
//! the fixed virtual screen otherwise. Callers can inject their own window
//! and popup constructors; both are resolved once, when the factory is built.

use std::fmt;
use std::rc::Rc;

use crate::config::{Config, ConfigError};
use crate::error::{Result, WindowingError};
use crate::popup::Popup;
use crate::screen::{self, ScreenDescriptor, Screens};
use crate::surface::Surface;
use crate::window::Window;

/// Caller-supplied window constructor
pub type WindowFactory = Rc<dyn Fn() -> Window>;

/// Caller-supplied popup constructor, keyed by the parent surface
pub type PopupFactory = Rc<dyn Fn(&Surface) -> Result<Popup>>;

#[derive(Clone)]
pub struct PlatformFactory {
    screens: Screens,
    scaling: f64,
    window_factory: Option<WindowFactory>,
    popup_factory: Option<PopupFactory>,
}

impl fmt::Debug for PlatformFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlatformFactory")
            .field("screens", &self.screens)
            .field("scaling", &self.scaling)
            .field("window_factory", &self.window_factory.is_some())
            .field("popup_factory", &self.popup_factory.is_some())
            .finish()
    }
}

impl Default for PlatformFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl PlatformFactory {
    /// Factory for the registered screens, or the fixed 1280x1024 virtual
    /// screen when [`screen::init`] has not been called
    pub fn new() -> Self {
        let screens = match screen::registry() {
            Some(screens) => {
                tracing::debug!(count = screens.screen_count(), "using registered screens");
                screens
            }
            None => Screens::default(),
        };
        Self::with_defaults(screens, 1.0)
    }

    /// Factory for the configured screen and scaling. Ignores the registry.
    pub fn from_config(config: &Config) -> std::result::Result<Self, ConfigError> {
        config.validate()?;
        let screen = config
            .screen
            .descriptor()
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;
        tracing::info!(
            bounds = ?screen.bounds(),
            working_area = ?screen.working_area(),
            scaling = config.scaling,
            "platform factory configured"
        );
        Ok(Self::with_defaults(Screens::single(screen), config.scaling))
    }

    fn with_defaults(screens: Screens, scaling: f64) -> Self {
        Self {
            screens,
            scaling,
            window_factory: None,
            popup_factory: None,
        }
    }

    /// Use `screens` instead of the configured single screen. Windows are
    /// created on the primary one.
    pub fn with_screens(mut self, screens: Screens) -> Self {
        self.screens = screens;
        self
    }

    /// Hand out windows built by `factory`
    pub fn with_window_factory(mut self, factory: impl Fn() -> Window + 'static) -> Self {
        self.window_factory = Some(Rc::new(factory));
        self
    }

    /// Build popups for default windows with `factory`
    pub fn with_popup_factory(
        mut self,
        factory: impl Fn(&Surface) -> Result<Popup> + 'static,
    ) -> Self {
        self.popup_factory = Some(Rc::new(factory));
        self
    }

    /// Screen new windows are created on
    pub fn screen(&self) -> ScreenDescriptor {
        self.screens.primary()
    }

    /// Create a window
    ///
    /// A configured window factory takes over entirely. Otherwise a default
    /// window is built and, if a popup factory is configured, wired to it.
    pub fn create_window(&self) -> Window {
        if let Some(factory) = &self.window_factory {
            let window = factory();
            tracing::debug!(window = %window.id(), "window created by caller factory");
            return window;
        }

        let window = Window::on_screen(self.screen(), self.scaling);
        let window = match &self.popup_factory {
            Some(factory) => window.with_popup_factory(factory.clone()),
            None => window,
        };
        tracing::debug!(window = %window.id(), "window created");
        window
    }

    /// Embeddable windows are not simulated
    pub fn create_embeddable_window(&self) -> Result<Window> {
        Err(WindowingError::UnsupportedOperation("embeddable windows"))
    }

    /// Screen list shared by every window of this factory
    pub fn create_screen_registry(&self) -> Screens {
        self.screens.clone()
    }
}

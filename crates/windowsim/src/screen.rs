//! Virtual screens
//!
//! A `ScreenDescriptor` is an immutable description of one display. The
//! process-wide registry holds the screens a test run works against; it
//! has no implicit default and must be set up with [`init`] and torn down
//! with [`reset`] by the caller. `PlatformFactory::new` reads it.

use std::sync::{PoisonError, RwLock};

use crate::error::{Result, WindowingError};
use crate::geometry::Rect;

/// Width of the fixed virtual screen
pub const DEFAULT_SCREEN_WIDTH: i32 = 1280;

/// Height of the fixed virtual screen
pub const DEFAULT_SCREEN_HEIGHT: i32 = 1024;

/// Pixel density of the fixed virtual screen
pub const DEFAULT_DPI: f64 = 96.0;

/// One virtual display
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScreenDescriptor {
    dpi: f64,
    bounds: Rect,
    working_area: Rect,
    is_primary: bool,
}

impl ScreenDescriptor {
    /// Build a descriptor, rejecting empty bounds, non-positive DPI and a
    /// working area that sticks out of the bounds.
    pub fn new(dpi: f64, bounds: Rect, working_area: Rect, is_primary: bool) -> Result<Self> {
        if bounds.is_empty() {
            return Err(WindowingError::InvalidGeometry(format!(
                "screen bounds {bounds:?} have no area"
            )));
        }
        if dpi.is_nan() || dpi <= 0.0 {
            return Err(WindowingError::InvalidGeometry(format!(
                "screen dpi must be positive, got {dpi}"
            )));
        }
        if !bounds.contains_rect(&working_area) {
            return Err(WindowingError::InvalidGeometry(format!(
                "working area {working_area:?} is not inside bounds {bounds:?}"
            )));
        }

        Ok(Self {
            dpi,
            bounds,
            working_area,
            is_primary,
        })
    }

    pub fn dpi(&self) -> f64 {
        self.dpi
    }

    pub fn bounds(&self) -> Rect {
        self.bounds
    }

    pub fn working_area(&self) -> Rect {
        self.working_area
    }

    pub fn is_primary(&self) -> bool {
        self.is_primary
    }
}

impl Default for ScreenDescriptor {
    fn default() -> Self {
        let bounds = Rect::new(0, 0, DEFAULT_SCREEN_WIDTH, DEFAULT_SCREEN_HEIGHT);
        Self {
            dpi: DEFAULT_DPI,
            bounds,
            working_area: bounds,
            is_primary: true,
        }
    }
}

/// Ordered, non-empty list of screens
#[derive(Debug, Clone, PartialEq)]
pub struct Screens {
    screens: Vec<ScreenDescriptor>,
}

impl Screens {
    pub fn new(screens: Vec<ScreenDescriptor>) -> Result<Self> {
        if screens.is_empty() {
            return Err(WindowingError::InvalidGeometry(
                "a screen list needs at least one screen".to_string(),
            ));
        }
        Ok(Self { screens })
    }

    pub fn single(screen: ScreenDescriptor) -> Self {
        Self {
            screens: vec![screen],
        }
    }

    pub fn all_screens(&self) -> &[ScreenDescriptor] {
        &self.screens
    }

    pub fn screen_count(&self) -> usize {
        self.screens.len()
    }

    /// First screen flagged primary, else the first screen
    pub fn primary(&self) -> ScreenDescriptor {
        self.screens
            .iter()
            .find(|s| s.is_primary())
            .copied()
            .unwrap_or(self.screens[0])
    }
}

impl Default for Screens {
    fn default() -> Self {
        Self::single(ScreenDescriptor::default())
    }
}

static REGISTRY: RwLock<Option<Screens>> = RwLock::new(None);

/// Install the process-wide screen list
pub fn init(screens: Screens) -> Result<()> {
    let mut registry = REGISTRY.write().unwrap_or_else(PoisonError::into_inner);
    if registry.is_some() {
        return Err(WindowingError::RegistryInitialized);
    }
    tracing::info!(count = screens.screen_count(), "screen registry initialized");
    *registry = Some(screens);
    Ok(())
}

/// Clear the process-wide screen list
pub fn reset() {
    let mut registry = REGISTRY.write().unwrap_or_else(PoisonError::into_inner);
    if registry.take().is_some() {
        tracing::debug!("screen registry reset");
    }
}

/// Current screen list, if initialized
pub fn registry() -> Option<Screens> {
    REGISTRY
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .clone()
}

/// All registered screens, in registration order (empty when uninitialized)
pub fn all_screens() -> Vec<ScreenDescriptor> {
    registry()
        .map(|s| s.screens)
        .unwrap_or_default()
}

pub fn screen_count() -> usize {
    REGISTRY
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .as_ref()
        .map_or(0, Screens::screen_count)
}

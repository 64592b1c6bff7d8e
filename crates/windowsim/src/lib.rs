//! Headless windowing platform
//!
//! A deterministic, single-threaded stand-in for a native windowing
//! environment. Windows and popups fire the same lifecycle events a real
//! platform would (activation, move, resize, close), and popups are placed
//! against their anchor with the usual flip/slide/resize constraint rules.
//!
//! Every operation runs to completion, including any cascaded callbacks,
//! before it returns.

pub mod config;
pub mod error;
pub mod geometry;
pub mod logging;
pub mod platform;
pub mod popup;
pub mod positioner;
pub mod screen;
pub mod surface;
pub mod window;

pub use error::{Result, WindowingError};
pub use geometry::{Point, Rect, Size};
pub use platform::{PlatformFactory, PopupFactory, WindowFactory};
pub use popup::Popup;
pub use positioner::{
    place, ConstraintAdjustment, Edge, PlacementRequest, PopupPositioner, PositionerParameters,
};
pub use screen::{ScreenDescriptor, Screens};
pub use surface::{Lifecycle, Surface, SurfaceId, SurfaceKind, SurfaceState};
pub use window::Window;

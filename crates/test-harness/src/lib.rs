//! Test harness for windowsim
//!
//! Provides infrastructure for driving the headless platform from tests.
//!
//! # Modules
//!
//! - `headless`: Platform wrapper that tracks every surface it opens
//! - `recorder`: Ordered log of events fired across surfaces
//! - `assertions`: Common test assertions
//! - `fixtures`: Test fixture helpers

pub mod assertions;
pub mod fixtures;
pub mod headless;
pub mod recorder;

pub use headless::{PlatformSnapshot, SurfaceSnapshot, TestPlatform};
pub use recorder::{EventLog, RecordedEvent, SurfaceEvent};

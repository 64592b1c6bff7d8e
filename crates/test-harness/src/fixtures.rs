//! Test fixtures for common test scenarios

use std::sync::{Mutex, MutexGuard, PoisonError};

use windowsim::{screen, Popup, PositionerParameters, Rect, Size, Window};

use crate::headless::TestPlatform;

/// Standard virtual screen dimensions
pub const TEST_SCREEN_WIDTH: i32 = 1280;
pub const TEST_SCREEN_HEIGHT: i32 = 1024;

/// Where `platform_with_window` puts its window
pub const TEST_WINDOW_BOUNDS: Rect = Rect::new(200, 150, 640, 480);

/// Route windowsim logs to the test output
pub fn init_logging() {
    windowsim::logging::init_test_logging();
}

/// Platform on the standard screen
pub fn platform() -> TestPlatform {
    TestPlatform::new_headless(TEST_SCREEN_WIDTH, TEST_SCREEN_HEIGHT)
}

/// Platform with one visible window at `TEST_WINDOW_BOUNDS`
pub fn platform_with_window() -> (TestPlatform, Window) {
    let mut platform = platform();
    let window = platform.open_window_at(TEST_WINDOW_BOUNDS);
    (platform, window)
}

/// Drop-down menu anchored to `anchor` (relative to the parent's client area)
pub fn menu_parameters(anchor: Rect, size: Size) -> PositionerParameters {
    PositionerParameters::dropdown(size).with_anchor_rect(anchor)
}

/// Platform with a window and a 200x300 menu hanging from a 50x20 button
/// at (100, 100) inside it
pub fn platform_with_menu() -> (TestPlatform, Window, Popup) {
    let (mut platform, window) = platform_with_window();
    let popup = platform
        .open_popup(
            window.surface(),
            menu_parameters(Rect::new(100, 100, 50, 20), Size::new(200, 300)),
        )
        .expect("menu placement should succeed");
    (platform, window, popup)
}

static REGISTRY_LOCK: Mutex<()> = Mutex::new(());

/// Exclusive access to the process-wide screen registry
///
/// The registry is reset when the guard is taken and again when it drops,
/// so every test starts from an uninitialized registry.
pub struct RegistryGuard {
    _lock: MutexGuard<'static, ()>,
}

impl Drop for RegistryGuard {
    fn drop(&mut self) {
        screen::reset();
    }
}

pub fn registry_guard() -> RegistryGuard {
    // A panicking test poisons the lock; the registry is reset anyway
    let lock = REGISTRY_LOCK.lock().unwrap_or_else(PoisonError::into_inner);
    screen::reset();
    RegistryGuard { _lock: lock }
}

//! Headless platform wrapper for testing

use serde::Serialize;
use windowsim::screen::DEFAULT_DPI;
use windowsim::{
    Lifecycle, PlatformFactory, Popup, PositionerParameters, Rect, ScreenDescriptor, Screens,
    Surface, SurfaceId, SurfaceKind, Window,
};

use crate::recorder::EventLog;

/// Snapshot of one surface for assertions
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SurfaceSnapshot {
    pub id: SurfaceId,
    pub kind: SurfaceKind,

    /// Parent surface, while it is alive (popups only)
    pub parent: Option<SurfaceId>,

    pub lifecycle: Lifecycle,

    /// Client area in screen coordinates
    pub bounds: Rect,
}

/// Snapshot of platform state for assertions
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlatformSnapshot {
    /// Screen bounds
    pub screen: Rect,

    /// Area popups are constrained to
    pub working_area: Rect,

    /// Every tracked surface, ordered by id
    pub surfaces: Vec<SurfaceSnapshot>,

    /// Number of events recorded so far
    pub event_count: usize,
}

impl PlatformSnapshot {
    pub fn surface(&self, id: SurfaceId) -> Option<&SurfaceSnapshot> {
        self.surfaces.iter().find(|s| s.id == id)
    }

    /// Surfaces not yet closed
    pub fn open_count(&self) -> usize {
        self.surfaces
            .iter()
            .filter(|s| s.lifecycle != Lifecycle::Closed)
            .count()
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// Test platform wrapper
///
/// Windows come from a [`PlatformFactory`] whose popups are positioned.
/// Every surface opened through the wrapper is recorded into one shared
/// [`EventLog`].
pub struct TestPlatform {
    factory: PlatformFactory,
    log: EventLog,
    windows: Vec<Window>,
    popups: Vec<Popup>,
}

impl TestPlatform {
    /// Create a new headless test platform with one screen of the given size
    pub fn new_headless(width: i32, height: i32) -> Self {
        let bounds = Rect::new(0, 0, width, height);
        Self::with_working_area(bounds, bounds)
    }

    /// Screen whose working area is smaller than its bounds (e.g. a panel)
    pub fn with_working_area(bounds: Rect, working_area: Rect) -> Self {
        let screen = ScreenDescriptor::new(DEFAULT_DPI, bounds, working_area, true)
            .expect("test screen geometry must be valid");
        let factory = PlatformFactory::new()
            .with_screens(Screens::single(screen))
            .with_popup_factory(Popup::positioned);
        Self::with_factory(factory)
    }

    pub fn with_factory(factory: PlatformFactory) -> Self {
        Self {
            factory,
            log: EventLog::new(),
            windows: Vec::new(),
            popups: Vec::new(),
        }
    }

    pub fn factory(&self) -> &PlatformFactory {
        &self.factory
    }

    pub fn screen(&self) -> ScreenDescriptor {
        self.factory.screen()
    }

    pub fn log(&self) -> &EventLog {
        &self.log
    }

    /// Create a window through the factory and start recording it
    pub fn open_window(&mut self) -> Window {
        let window = self.factory.create_window();
        self.log
            .attach(window.surface())
            .expect("fresh window should accept handlers");
        self.windows.push(window.clone());
        window
    }

    /// Window already shown, moved and resized to `bounds`. Setup events
    /// are dropped from the log.
    pub fn open_window_at(&mut self, bounds: Rect) -> Window {
        let window = self.open_window();
        window.show().expect("show fresh window");
        window.move_to(bounds.origin()).expect("move fresh window");
        window.resize(bounds.size()).expect("resize fresh window");
        self.log.clear();
        window
    }

    /// Create a positioned popup under `parent` and place it with `parameters`
    ///
    /// The log is attached before the first placement, so the initial
    /// geometry events are recorded.
    pub fn open_popup(
        &mut self,
        parent: &Surface,
        parameters: PositionerParameters,
    ) -> windowsim::Result<Popup> {
        let popup = Popup::positioned(parent)?;
        self.log.attach(popup.surface())?;
        popup.update_placement(parameters)?;
        self.popups.push(popup.clone());
        Ok(popup)
    }

    /// Start recording a popup created elsewhere (e.g. `Window::create_popup`)
    pub fn track_popup(&mut self, popup: &Popup) -> windowsim::Result<()> {
        self.log.attach(popup.surface())?;
        self.popups.push(popup.clone());
        Ok(())
    }

    pub fn windows(&self) -> &[Window] {
        &self.windows
    }

    pub fn popups(&self) -> &[Popup] {
        &self.popups
    }

    /// Get a snapshot of current state for assertions
    pub fn snapshot(&self) -> PlatformSnapshot {
        let screen = self.screen();

        let windows = self.windows.iter().map(|w| describe(w.surface(), None));
        let popups = self.popups.iter().map(|p| {
            let parent = p.parent().map(|s| s.id());
            describe(p.surface(), parent)
        });
        let mut surfaces: Vec<_> = windows.chain(popups).collect();
        surfaces.sort_by_key(|s| s.id);

        PlatformSnapshot {
            screen: screen.bounds(),
            working_area: screen.working_area(),
            surfaces,
            event_count: self.log.len(),
        }
    }
}

fn describe(surface: &Surface, parent: Option<SurfaceId>) -> SurfaceSnapshot {
    let state = surface.state();
    SurfaceSnapshot {
        id: surface.id(),
        kind: surface.kind(),
        parent,
        lifecycle: state.lifecycle,
        bounds: state.bounds(),
    }
}

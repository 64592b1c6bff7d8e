//! Test assertions for platform state

use std::fmt::Debug;

use windowsim::{Lifecycle, Popup, Rect, SurfaceId, WindowingError};

use crate::headless::PlatformSnapshot;
use crate::recorder::{EventLog, SurfaceEvent};

/// Assert that `rect` lies entirely inside `bounds`
pub fn assert_rect_inside(rect: Rect, bounds: Rect) {
    assert!(
        bounds.contains_rect(&rect),
        "rect {:?} should be inside {:?} (right={}, bottom={} vs right={}, bottom={})",
        rect,
        bounds,
        rect.right(),
        rect.bottom(),
        bounds.right(),
        bounds.bottom()
    );
}

/// Assert that a popup sits inside its screen's working area
pub fn assert_popup_in_working_area(popup: &Popup) {
    let bounds = popup.surface().state().bounds();
    let area = popup.surface().screen().working_area();
    assert_rect_inside(bounds, area);
}

/// Assert that an operation failed because the surface was closed
pub fn assert_closed_error<T: Debug>(result: windowsim::Result<T>, id: SurfaceId) {
    match result {
        Err(WindowingError::ClosedSurface { id: closed, .. }) => {
            assert_eq!(closed, id, "closed-surface error names the wrong surface");
        }
        other => panic!("expected ClosedSurface for {id}, got {other:?}"),
    }
}

/// Assert that a surface fired exactly `expected`, in order
pub fn assert_events(log: &EventLog, id: SurfaceId, expected: &[SurfaceEvent]) {
    let actual = log.events_for(id);
    assert_eq!(
        actual, expected,
        "surface {} fired {:?}, expected {:?}",
        id, actual, expected
    );
}

/// Assert that `closed` is the last event a surface fired
pub fn assert_no_events_after_close(log: &EventLog, id: SurfaceId) {
    let events = log.events_for(id);
    let closed_at = events
        .iter()
        .position(|e| *e == SurfaceEvent::Closed)
        .unwrap_or_else(|| panic!("surface {id} never fired closed: {events:?}"));
    assert_eq!(
        closed_at,
        events.len() - 1,
        "surface {} fired events after closing: {:?}",
        id,
        &events[closed_at + 1..]
    );
}

/// Assert that `first` was recorded before `second`
pub fn assert_fired_before(
    log: &EventLog,
    first: (SurfaceId, SurfaceEvent),
    second: (SurfaceId, SurfaceEvent),
) {
    let a = log
        .position_of(first.0, first.1)
        .unwrap_or_else(|| panic!("{:?} was never recorded", first));
    let b = log
        .position_of(second.0, second.1)
        .unwrap_or_else(|| panic!("{:?} was never recorded", second));
    assert!(
        a < b,
        "{:?} (at {}) should fire before {:?} (at {})",
        first,
        a,
        second,
        b
    );
}

/// Assert that every tracked surface is closed
pub fn assert_all_closed(snapshot: &PlatformSnapshot) {
    for surface in &snapshot.surfaces {
        assert_eq!(
            surface.lifecycle,
            Lifecycle::Closed,
            "{} {} should be closed",
            surface.kind,
            surface.id
        );
    }
}

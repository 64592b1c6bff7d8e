//! Tests for popups following their parent
//!
//! These tests verify that positioned popups re-place themselves when the
//! parent moves or resizes, that the parent's event always fires first,
//! and that popups close with their parent.

use std::cell::Cell;
use std::rc::Rc;

use test_harness::assertions::{
    assert_all_closed, assert_closed_error, assert_events, assert_fired_before,
    assert_popup_in_working_area,
};
use test_harness::fixtures;
use test_harness::SurfaceEvent;
use windowsim::{Lifecycle, Point, Rect, Size, SurfaceKind};

/// Initial placement fires position then size on the popup
#[test]
fn initial_placement_is_recorded() {
    let (platform, _window, popup) = fixtures::platform_with_menu();

    assert_events(
        platform.log(),
        popup.id(),
        &[
            SurfaceEvent::PositionChanged(Point::new(300, 270)),
            SurfaceEvent::Resized(Size::new(200, 300)),
        ],
    );
}

/// Moving the parent moves the popup, parent event first
#[test]
fn popup_follows_parent_move() {
    fixtures::init_logging();
    let (platform, window, popup) = fixtures::platform_with_menu();
    platform.log().clear();

    window.move_to(Point::new(250, 150)).unwrap();

    assert_eq!(popup.position(), Point::new(350, 270));
    assert_events(
        platform.log(),
        popup.id(),
        &[SurfaceEvent::PositionChanged(Point::new(350, 270))],
    );
    assert_fired_before(
        platform.log(),
        (window.id(), SurfaceEvent::PositionChanged(Point::new(250, 150))),
        (popup.id(), SurfaceEvent::PositionChanged(Point::new(350, 270))),
    );
}

/// The popup's handler already sees the parent's new geometry
#[test]
fn popup_handler_sees_updated_parent() {
    let (_platform, window, popup) = fixtures::platform_with_menu();
    let parent_seen = Rc::new(Cell::new(None));

    let seen = parent_seen.clone();
    let parent = window.clone();
    popup
        .surface()
        .on_position_changed(move |_| seen.set(Some(parent.position())))
        .unwrap();

    window.move_to(Point::new(0, 0)).unwrap();

    assert_eq!(parent_seen.get(), Some(Point::new(0, 0)));
}

/// A parent resize that leaves the anchor in place fires nothing on the popup
#[test]
fn unchanged_placement_fires_nothing() {
    let (platform, window, popup) = fixtures::platform_with_menu();
    platform.log().clear();

    window.resize(Size::new(700, 500)).unwrap();

    assert_events(
        platform.log(),
        window.id(),
        &[SurfaceEvent::Resized(Size::new(700, 500))],
    );
    assert_events(platform.log(), popup.id(), &[]);
}

/// Moving the parent towards the bottom edge flips the menu above its button
#[test]
fn parent_move_triggers_flip() {
    let (platform, window, popup) = fixtures::platform_with_menu();
    platform.log().clear();

    window.move_to(Point::new(200, 700)).unwrap();

    // Button now at (300, 800)..(350, 820); menu ends at the button's top
    assert_eq!(popup.surface().state().bounds(), Rect::new(300, 500, 200, 300));
    assert_popup_in_working_area(&popup);
}

/// Moving the parent to the ends of the coordinate range keeps the menu on screen
#[test]
fn parent_at_coordinate_limits_keeps_menu_on_screen() {
    let (platform, window, popup) = fixtures::platform_with_menu();

    for target in [
        Point::new(i32::MAX - 100, 0),
        Point::new(i32::MAX, i32::MAX),
        Point::new(i32::MIN, i32::MIN),
        Point::new(0, i32::MAX - 50),
    ] {
        platform.log().clear();
        window.move_to(target).unwrap();

        assert_eq!(window.position(), target);
        assert_popup_in_working_area(&popup);
        assert_fired_before(
            platform.log(),
            (window.id(), SurfaceEvent::PositionChanged(target)),
            (popup.id(), SurfaceEvent::PositionChanged(popup.position())),
        );
    }
}

/// Nested popups cascade within the same call, outermost first
#[test]
fn nested_popups_cascade() {
    let (mut platform, window, popup) = fixtures::platform_with_menu();
    let submenu = platform
        .open_popup(
            popup.surface(),
            fixtures::menu_parameters(Rect::new(0, 0, 10, 10), Size::new(100, 100)),
        )
        .unwrap();
    assert_eq!(submenu.position(), Point::new(300, 280));
    platform.log().clear();

    window.move_to(Point::new(250, 150)).unwrap();

    assert_eq!(submenu.position(), Point::new(350, 280));
    let order: Vec<_> = platform.log().entries().iter().map(|e| e.surface).collect();
    assert_eq!(order, vec![window.id(), popup.id(), submenu.id()]);
}

/// Closing the window closes every popup under it, parent first
#[test]
fn close_cascades_to_popups() {
    let (mut platform, window, popup) = fixtures::platform_with_menu();
    let submenu = platform
        .open_popup(
            popup.surface(),
            fixtures::menu_parameters(Rect::new(0, 0, 10, 10), Size::new(100, 100)),
        )
        .unwrap();
    platform.log().clear();

    window.close().unwrap();

    let order: Vec<_> = platform
        .log()
        .entries()
        .iter()
        .map(|e| (e.surface, e.event))
        .collect();
    assert_eq!(
        order,
        vec![
            (window.id(), SurfaceEvent::Closed),
            (popup.id(), SurfaceEvent::Closed),
            (submenu.id(), SurfaceEvent::Closed),
        ]
    );
    assert_all_closed(&platform.snapshot());
    assert_closed_error(popup.move_to(Point::new(0, 0)), popup.id());
    assert_closed_error(submenu.show(), submenu.id());
}

/// A closed popup no longer tracks its parent
#[test]
fn closed_popup_is_detached() {
    let (platform, window, popup) = fixtures::platform_with_menu();
    assert_eq!(window.surface().dependent_count(), 1);

    popup.close().unwrap();
    platform.log().clear();
    window.move_to(Point::new(0, 0)).unwrap();

    assert_eq!(window.surface().dependent_count(), 0);
    assert_events(platform.log(), popup.id(), &[]);
    assert!(!window.is_closed(), "closing a popup must not close its parent");
}

/// A popup whose handles were all dropped keeps following its parent and
/// still closes with it
#[test]
fn dropped_popup_stays_attached_until_parent_closes() {
    let (platform, window) = fixtures::platform_with_window();
    let popup = window.create_popup().unwrap();
    platform.log().attach(popup.surface()).unwrap();
    popup
        .update_placement(fixtures::menu_parameters(Rect::new(100, 100, 50, 20), Size::new(200, 300)))
        .unwrap();
    let id = popup.id();
    let surface = popup.surface().clone();
    drop(popup);
    platform.log().clear();

    window.move_to(Point::new(250, 150)).unwrap();

    assert_eq!(window.surface().dependent_count(), 1);
    assert_eq!(surface.position(), Point::new(350, 270));
    assert_events(platform.log(), id, &[SurfaceEvent::PositionChanged(Point::new(350, 270))]);

    platform.log().clear();
    window.close().unwrap();

    assert_eq!(surface.lifecycle(), Lifecycle::Closed);
    assert_eq!(window.surface().dependent_count(), 0);
    assert_events(platform.log(), id, &[SurfaceEvent::Closed]);
}

/// Moving a popup by hand slides it back onto the screen
#[test]
fn popup_move_is_clamped_to_screen() {
    let (platform, _window, popup) = fixtures::platform_with_menu();
    platform.log().clear();

    popup.move_to(Point::new(1200, 900)).unwrap();

    assert_eq!(popup.position(), Point::new(1080, 724));
    assert_events(
        platform.log(),
        popup.id(),
        &[SurfaceEvent::PositionChanged(Point::new(1080, 724))],
    );
}

/// Popups inherit the screen and scaling of their parent
#[test]
fn popup_inherits_parent_screen() {
    let (_platform, window, popup) = fixtures::platform_with_menu();

    assert_eq!(popup.surface().screen(), window.surface().screen());
    assert_eq!(popup.surface().scaling(), window.surface().scaling());
    assert_eq!(popup.surface().kind(), SurfaceKind::Popup);
    assert!(popup.parent().unwrap().same_surface(window.surface()));
}

/// Snapshots record the parent link and serialize to JSON
#[test]
fn snapshot_describes_popup_tree() {
    let (platform, window, popup) = fixtures::platform_with_menu();

    let snapshot = platform.snapshot();
    let entry = snapshot.surface(popup.id()).unwrap();

    assert_eq!(entry.parent, Some(window.id()));
    assert_eq!(entry.bounds, Rect::new(300, 270, 200, 300));
    assert_eq!(entry.lifecycle, Lifecycle::Created);
    assert_eq!(snapshot.open_count(), 2);

    let json = snapshot.to_json().unwrap();
    assert!(json.contains("\"kind\": \"popup\""), "json was {json}");
    assert!(json.contains("\"lifecycle\": \"visible\""), "json was {json}");
}

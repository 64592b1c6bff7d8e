#![no_main]
//! Fuzz target for popup placement
//!
//! Decodes random bytes into a placement request and checks that `place`
//! either rejects it or returns a rectangle inside the constraint.

use libfuzzer_sys::fuzz_target;

use windowsim::{place, ConstraintAdjustment, Edge, PlacementRequest, Point, Rect, Size};

const EDGES: [Edge; 9] = [
    Edge::Center,
    Edge::Top,
    Edge::Bottom,
    Edge::Left,
    Edge::Right,
    Edge::TopLeft,
    Edge::TopRight,
    Edge::BottomLeft,
    Edge::BottomRight,
];

/// Read little-endian i32s over the full range, edges of the plane included
fn coords(data: &[u8]) -> impl Iterator<Item = i32> + '_ {
    data.chunks_exact(4)
        .map(|c| i32::from_le_bytes([c[0], c[1], c[2], c[3]]))
}

fuzz_target!(|data: &[u8]| {
    if data.len() < 3 {
        return;
    }
    let anchor_edge = EDGES[data[0] as usize % EDGES.len()];
    let gravity_edge = EDGES[data[1] as usize % EDGES.len()];
    let constraint_adjustment = ConstraintAdjustment::from_bits_truncate(data[2]);

    let v: Vec<i32> = coords(&data[3..]).take(12).collect();
    if v.len() < 12 {
        return;
    }

    let request = PlacementRequest {
        anchor_rect: Rect::new(v[0], v[1], v[2], v[3]),
        popup_size: Size::new(v[4], v[5]),
        anchor_edge,
        gravity_edge,
        offset: Point::new(v[6], v[7]),
        constraint_adjustment,
        constraint_rect: Rect::new(v[8], v[9], v[10], v[11]),
    };

    match place(&request) {
        Ok(rect) => {
            assert!(
                request.constraint_rect.contains_rect(&rect),
                "{rect:?} escapes {:?}",
                request.constraint_rect
            );
            assert!(rect.width >= 1 && rect.height >= 1);
        }
        Err(_) => assert!(request.validate().is_err(), "place failed on a valid request"),
    }
});

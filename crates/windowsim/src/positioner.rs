//! Popup placement
//!
//! `place` computes where a popup lands relative to an anchor rectangle:
//!
//! 1. pick the anchor point on the anchor rect (`anchor_edge`)
//! 2. pin the popup's `gravity_edge` to that point and add `offset`
//! 3. if that rectangle fits the constraint rect, done
//! 4. otherwise try the enabled adjustments one at a time, in the order
//!    Flip, Slide, Resize; the first that yields a fully-contained
//!    rectangle wins
//! 5. if none does, take the least-overflowing candidate and apply Slide
//!    then Resize on both axes, which always fits a non-empty constraint
//!
//! `PopupPositioner` is the stateful engine a popup owns: it keeps the
//! parent-relative parameters and turns them into absolute requests
//! against the parent's current geometry.

use bitflags::bitflags;

use crate::error::{Result, WindowingError};
use crate::geometry::{Point, Rect, Size};

/// Edge (or corner) of a rectangle
///
/// For an anchor this selects the anchor point: `Bottom` is the
/// bottom-center of the anchor rect, `TopLeft` its top-left corner,
/// `Center` its center. For gravity it names the direction the popup grows
/// from that point: `Bottom` puts the popup's top edge on the point,
/// horizontally centered; `BottomRight` puts its top-left corner there.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Edge {
    #[default]
    Center,
    Top,
    Bottom,
    Left,
    Right,
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

/// Position along one axis: start (left/top), middle, or end (right/bottom)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    Start,
    Middle,
    End,
}

impl Side {
    fn flipped(self) -> Side {
        match self {
            Side::Start => Side::End,
            Side::Middle => Side::Middle,
            Side::End => Side::Start,
        }
    }
}

impl Edge {
    fn horizontal(self) -> Side {
        match self {
            Edge::Left | Edge::TopLeft | Edge::BottomLeft => Side::Start,
            Edge::Right | Edge::TopRight | Edge::BottomRight => Side::End,
            Edge::Center | Edge::Top | Edge::Bottom => Side::Middle,
        }
    }

    fn vertical(self) -> Side {
        match self {
            Edge::Top | Edge::TopLeft | Edge::TopRight => Side::Start,
            Edge::Bottom | Edge::BottomLeft | Edge::BottomRight => Side::End,
            Edge::Center | Edge::Left | Edge::Right => Side::Middle,
        }
    }

    fn from_sides(horizontal: Side, vertical: Side) -> Edge {
        match (horizontal, vertical) {
            (Side::Start, Side::Start) => Edge::TopLeft,
            (Side::Middle, Side::Start) => Edge::Top,
            (Side::End, Side::Start) => Edge::TopRight,
            (Side::Start, Side::Middle) => Edge::Left,
            (Side::Middle, Side::Middle) => Edge::Center,
            (Side::End, Side::Middle) => Edge::Right,
            (Side::Start, Side::End) => Edge::BottomLeft,
            (Side::Middle, Side::End) => Edge::Bottom,
            (Side::End, Side::End) => Edge::BottomRight,
        }
    }

    /// Mirror left/right
    pub fn flip_x(self) -> Edge {
        Edge::from_sides(self.horizontal().flipped(), self.vertical())
    }

    /// Mirror top/bottom
    pub fn flip_y(self) -> Edge {
        Edge::from_sides(self.horizontal(), self.vertical().flipped())
    }
}

bitflags! {
    /// Strategies allowed when the naive placement overflows the constraint
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
    pub struct ConstraintAdjustment: u8 {
        const FLIP = 1 << 0;
        const SLIDE = 1 << 1;
        const RESIZE = 1 << 2;
    }
}

/// Absolute placement request, everything in screen pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlacementRequest {
    pub anchor_rect: Rect,
    pub popup_size: Size,
    pub anchor_edge: Edge,
    pub gravity_edge: Edge,
    pub offset: Point,
    pub constraint_adjustment: ConstraintAdjustment,
    pub constraint_rect: Rect,
}

impl PlacementRequest {
    /// Reject geometry that would only produce a degenerate placement
    pub fn validate(&self) -> Result<()> {
        if self.constraint_rect.is_empty() {
            return Err(WindowingError::InvalidGeometry(format!(
                "constraint rect {:?} has no area",
                self.constraint_rect
            )));
        }
        if self.popup_size.is_empty() {
            return Err(WindowingError::InvalidGeometry(format!(
                "popup size {:?} must be positive",
                self.popup_size
            )));
        }
        if self.anchor_rect.size().is_negative() {
            return Err(WindowingError::InvalidGeometry(format!(
                "anchor rect {:?} has a negative size",
                self.anchor_rect
            )));
        }
        Ok(())
    }
}

/// Which axes of a rectangle stick out of the constraint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Overflow {
    x: bool,
    y: bool,
}

impl Overflow {
    fn of(rect: &Rect, bounds: &Rect) -> Self {
        Self {
            x: rect.x < bounds.x || rect.right() > bounds.right(),
            y: rect.y < bounds.y || rect.bottom() > bounds.bottom(),
        }
    }

    fn any(self) -> bool {
        self.x || self.y
    }
}

fn anchor_coord(start: i32, len: i32, side: Side) -> i32 {
    match side {
        Side::Start => start,
        Side::Middle => start.saturating_add(len / 2),
        Side::End => start.saturating_add(len),
    }
}

fn gravitate(point: i32, len: i32, side: Side) -> i32 {
    match side {
        Side::Start => point.saturating_sub(len),
        Side::Middle => point.saturating_sub(len / 2),
        Side::End => point,
    }
}

/// Steps 1-3: the rectangle before any constraint adjustment
fn unconstrained(request: &PlacementRequest, anchor: Edge, gravity: Edge) -> Rect {
    let a = &request.anchor_rect;
    let size = request.popup_size;

    let point_x = anchor_coord(a.x, a.width, anchor.horizontal());
    let point_y = anchor_coord(a.y, a.height, anchor.vertical());

    let x = gravitate(point_x, size.width, gravity.horizontal());
    let y = gravitate(point_y, size.height, gravity.vertical());

    Rect::from_origin_size(Point::new(x, y), size).translate(request.offset)
}

/// Smallest move bringing `[pos, pos+len)` inside `[lo, hi)`
fn slide_axis(pos: i32, len: i32, lo: i32, hi: i32) -> i32 {
    if pos < lo {
        lo
    } else if pos.saturating_add(len) > hi {
        hi.saturating_sub(len)
    } else {
        pos
    }
}

/// Largest length that fits from `pos`, at least 1; `None` if `pos` is outside
fn resize_axis(pos: i32, len: i32, lo: i32, hi: i32) -> Option<i32> {
    if pos < lo || pos >= hi {
        None
    } else {
        Some(len.min(hi.saturating_sub(pos)).max(1))
    }
}

fn flip(request: &PlacementRequest, overflow: Overflow) -> Rect {
    let mut anchor = request.anchor_edge;
    let mut gravity = request.gravity_edge;
    if overflow.x {
        anchor = anchor.flip_x();
        gravity = gravity.flip_x();
    }
    if overflow.y {
        anchor = anchor.flip_y();
        gravity = gravity.flip_y();
    }
    unconstrained(request, anchor, gravity)
}

fn slide(rect: Rect, bounds: &Rect, overflow: Overflow) -> Rect {
    let mut out = rect;
    if overflow.x {
        out.x = slide_axis(rect.x, rect.width, bounds.x, bounds.right());
    }
    if overflow.y {
        out.y = slide_axis(rect.y, rect.height, bounds.y, bounds.bottom());
    }
    out
}

fn resize(rect: Rect, bounds: &Rect, overflow: Overflow) -> Rect {
    let mut out = rect;
    if overflow.x {
        if let Some(width) = resize_axis(rect.x, rect.width, bounds.x, bounds.right()) {
            out.width = width;
        }
    }
    if overflow.y {
        if let Some(height) = resize_axis(rect.y, rect.height, bounds.y, bounds.bottom()) {
            out.height = height;
        }
    }
    out
}

/// Slide, then shrink whatever still overflows. Fits any non-empty bounds.
fn force_inside(rect: Rect, bounds: &Rect) -> Rect {
    let x = slide_axis(rect.x, rect.width, bounds.x, bounds.right()).max(bounds.x);
    let y = slide_axis(rect.y, rect.height, bounds.y, bounds.bottom()).max(bounds.y);
    let width = rect.width.min(bounds.right().saturating_sub(x)).max(1);
    let height = rect.height.min(bounds.bottom().saturating_sub(y)).max(1);
    Rect::new(x, y, width, height)
}

/// Area of `rect` lying outside `bounds`
fn overflow_area(rect: &Rect, bounds: &Rect) -> i64 {
    let inside = rect.intersect(bounds).map_or(0, |r| r.area());
    rect.area() - inside
}

/// Place a popup. See the module docs for the adjustment order.
pub fn place(request: &PlacementRequest) -> Result<Rect> {
    request.validate()?;

    let bounds = request.constraint_rect;
    let adjust = request.constraint_adjustment;
    let naive = unconstrained(request, request.anchor_edge, request.gravity_edge);

    let overflow = Overflow::of(&naive, &bounds);
    if !overflow.any() {
        tracing::trace!(rect = ?naive, "placement fits without adjustment");
        return Ok(naive);
    }

    let flipped = adjust
        .contains(ConstraintAdjustment::FLIP)
        .then(|| flip(request, overflow));

    if let Some(candidate) = flipped {
        if bounds.contains_rect(&candidate) {
            tracing::trace!(rect = ?candidate, "placement resolved by flip");
            return Ok(candidate);
        }
    }

    if adjust.contains(ConstraintAdjustment::SLIDE) {
        let candidate = slide(naive, &bounds, overflow);
        if bounds.contains_rect(&candidate) {
            tracing::trace!(rect = ?candidate, "placement resolved by slide");
            return Ok(candidate);
        }
    }

    if adjust.contains(ConstraintAdjustment::RESIZE) {
        let candidate = resize(naive, &bounds, overflow);
        if bounds.contains_rect(&candidate) {
            tracing::trace!(rect = ?candidate, "placement resolved by resize");
            return Ok(candidate);
        }
    }

    let best = match flipped {
        Some(candidate) if overflow_area(&candidate, &bounds) < overflow_area(&naive, &bounds) => {
            candidate
        }
        _ => naive,
    };
    let forced = force_inside(best, &bounds);
    tracing::trace!(rect = ?forced, "placement forced inside constraint");
    Ok(forced)
}

/// Placement parameters relative to the parent surface
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PositionerParameters {
    /// Anchor area relative to the parent's client origin; `None` anchors
    /// to the parent's whole client area
    pub anchor_rect: Option<Rect>,
    pub size: Size,
    pub anchor: Edge,
    pub gravity: Edge,
    pub offset: Point,
    pub constraint_adjustment: ConstraintAdjustment,
}

impl PositionerParameters {
    /// Drop-down menu placement: below the anchor, left edges aligned,
    /// every adjustment enabled
    pub fn dropdown(size: Size) -> Self {
        Self {
            anchor_rect: None,
            size,
            anchor: Edge::BottomLeft,
            gravity: Edge::BottomRight,
            offset: Point::ORIGIN,
            constraint_adjustment: ConstraintAdjustment::all(),
        }
    }

    pub fn with_anchor_rect(mut self, anchor_rect: Rect) -> Self {
        self.anchor_rect = Some(anchor_rect);
        self
    }

    pub fn with_edges(mut self, anchor: Edge, gravity: Edge) -> Self {
        self.anchor = anchor;
        self.gravity = gravity;
        self
    }

    pub fn with_offset(mut self, offset: Point) -> Self {
        self.offset = offset;
        self
    }

    pub fn with_constraint_adjustment(mut self, adjustment: ConstraintAdjustment) -> Self {
        self.constraint_adjustment = adjustment;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.size.is_empty() {
            return Err(WindowingError::InvalidGeometry(format!(
                "popup size {:?} must be positive",
                self.size
            )));
        }
        if let Some(anchor) = self.anchor_rect {
            if anchor.size().is_negative() {
                return Err(WindowingError::InvalidGeometry(format!(
                    "anchor rect {anchor:?} has a negative size"
                )));
            }
        }
        Ok(())
    }
}

/// Placement engine instance owned by a popup
#[derive(Debug, Clone, Default)]
pub struct PopupPositioner {
    parameters: Option<PositionerParameters>,
    last_placement: Option<Rect>,
}

impl PopupPositioner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the placement parameters
    pub fn update(&mut self, parameters: PositionerParameters) -> Result<()> {
        parameters.validate()?;
        tracing::debug!(?parameters, "positioner updated");
        self.parameters = Some(parameters);
        Ok(())
    }

    pub fn parameters(&self) -> Option<PositionerParameters> {
        self.parameters
    }

    /// Most recent result of [`PopupPositioner::place`]
    pub fn last_placement(&self) -> Option<Rect> {
        self.last_placement
    }

    /// Absolute request for a parent whose client area covers `parent_bounds`
    pub fn request_for(&self, parent_bounds: Rect, constraint: Rect) -> Option<PlacementRequest> {
        let params = self.parameters?;
        let anchor_rect = match params.anchor_rect {
            Some(relative) => relative.translate(parent_bounds.origin()),
            None => parent_bounds,
        };
        Some(PlacementRequest {
            anchor_rect,
            popup_size: params.size,
            anchor_edge: params.anchor,
            gravity_edge: params.gravity,
            offset: params.offset,
            constraint_adjustment: params.constraint_adjustment,
            constraint_rect: constraint,
        })
    }

    /// Place against the parent's current geometry. `Ok(None)` until
    /// parameters have been supplied.
    pub fn place(&mut self, parent_bounds: Rect, constraint: Rect) -> Result<Option<Rect>> {
        let Some(request) = self.request_for(parent_bounds, constraint) else {
            return Ok(None);
        };
        let rect = place(&request)?;
        self.last_placement = Some(rect);
        Ok(Some(rect))
    }
}

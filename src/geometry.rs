//! Bounding-box math for elements and the canvas background.
//!
//! Everything here is a pure function over plain values: no side effects, no
//! egui types, inputs are never mutated. The interaction layer and the
//! property panel both route geometry changes through these functions so the
//! containment invariant (every box inside the canvas at rest) holds after
//! every mutation.

use crate::constants;
use crate::types::{BackgroundGeometry, CanvasConfig, CanvasElement, Template};
use serde::{Deserialize, Serialize};

/// An axis-aligned bounding box in canvas units, positioned by its top-left
/// corner.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ElementRect {
    /// Left edge.
    pub x: f32,
    /// Top edge.
    pub y: f32,
    /// Box width.
    pub width: f32,
    /// Box height.
    pub height: f32,
}

impl ElementRect {
    /// Creates a rect from position and size.
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// The bounding box of an element, using the intrinsic fallback size for
    /// text elements without an explicit box.
    pub fn of_element(element: &CanvasElement) -> Self {
        let (width, height) = element.payload.resolved_size();
        Self::new(element.x, element.y, width, height)
    }

    /// The background bounding box resolved from the canvas configuration.
    pub fn of_background(config: &CanvasConfig) -> Self {
        let geometry = config.resolved_background_geometry();
        Self::new(geometry.x, geometry.y, geometry.width, geometry.height)
    }

    /// Right edge.
    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    /// Bottom edge.
    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    /// Whether the point lies inside the box (edges inclusive).
    pub fn contains(&self, px: f32, py: f32) -> bool {
        px >= self.x && px <= self.right() && py >= self.y && py <= self.bottom()
    }
}

/// Canvas dimensions used as the clamping bounds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CanvasSize {
    /// Canvas width.
    pub width: f32,
    /// Canvas height.
    pub height: f32,
}

impl From<&CanvasConfig> for CanvasSize {
    fn from(config: &CanvasConfig) -> Self {
        Self {
            width: config.width,
            height: config.height,
        }
    }
}

/// One of the eight compass-direction resize hotspots on a selected target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResizeHandle {
    /// Top edge.
    North,
    /// Top-right corner.
    NorthEast,
    /// Right edge.
    East,
    /// Bottom-right corner.
    SouthEast,
    /// Bottom edge.
    South,
    /// Bottom-left corner.
    SouthWest,
    /// Left edge.
    West,
    /// Top-left corner.
    NorthWest,
}

impl ResizeHandle {
    /// All handles in drawing order.
    pub const ALL: [ResizeHandle; 8] = [
        ResizeHandle::North,
        ResizeHandle::NorthEast,
        ResizeHandle::East,
        ResizeHandle::SouthEast,
        ResizeHandle::South,
        ResizeHandle::SouthWest,
        ResizeHandle::West,
        ResizeHandle::NorthWest,
    ];

    /// Whether dragging this handle moves the box's right edge.
    pub fn touches_east(&self) -> bool {
        matches!(
            self,
            ResizeHandle::East | ResizeHandle::NorthEast | ResizeHandle::SouthEast
        )
    }

    /// Whether dragging this handle moves the box's left edge.
    pub fn touches_west(&self) -> bool {
        matches!(
            self,
            ResizeHandle::West | ResizeHandle::NorthWest | ResizeHandle::SouthWest
        )
    }

    /// Whether dragging this handle moves the box's top edge.
    pub fn touches_north(&self) -> bool {
        matches!(
            self,
            ResizeHandle::North | ResizeHandle::NorthEast | ResizeHandle::NorthWest
        )
    }

    /// Whether dragging this handle moves the box's bottom edge.
    pub fn touches_south(&self) -> bool {
        matches!(
            self,
            ResizeHandle::South | ResizeHandle::SouthEast | ResizeHandle::SouthWest
        )
    }

    /// Position of the handle on the unit box, `(0, 0)` top-left to
    /// `(1, 1)` bottom-right.
    pub fn unit_position(&self) -> (f32, f32) {
        match self {
            ResizeHandle::North => (0.5, 0.0),
            ResizeHandle::NorthEast => (1.0, 0.0),
            ResizeHandle::East => (1.0, 0.5),
            ResizeHandle::SouthEast => (1.0, 1.0),
            ResizeHandle::South => (0.5, 1.0),
            ResizeHandle::SouthWest => (0.0, 1.0),
            ResizeHandle::West => (0.0, 0.5),
            ResizeHandle::NorthWest => (0.0, 0.0),
        }
    }
}

fn clamp(value: f32, low: f32, high: f32) -> f32 {
    value.max(low).min(high)
}

/// Moves a box into canvas bounds along both axes independently.
///
/// `x' = clamp(x, 0, max(0, canvas_w - w))`, same for y. The size is never
/// changed. Used whenever the canvas shrinks or an element is dropped.
///
/// # Arguments
///
/// * `rect` - The box to contain
/// * `canvas` - The clamping bounds
///
/// # Returns
///
/// A new rect at the nearest in-bounds position.
pub fn clamp_position(rect: ElementRect, canvas: CanvasSize) -> ElementRect {
    ElementRect {
        x: clamp(rect.x, 0.0, (canvas.width - rect.width).max(0.0)),
        y: clamp(rect.y, 0.0, (canvas.height - rect.height).max(0.0)),
        ..rect
    }
}

/// Resizes a box from one of its eight handles, keeping it inside the canvas.
///
/// For each axis the handle touches, the box grows or shrinks from the
/// opposite anchor edge. The minimum dimension is enforced first, then the
/// canvas clamps are applied: overflowing the far edge reduces the dimension
/// (not the position); overflowing the near edge clamps the position to 0 and
/// reduces the dimension by the overflow. The size-then-position order per
/// axis is load-bearing: it decides what happens when a handle is dragged
/// past the canvas edge.
///
/// # Arguments
///
/// * `rect` - The box captured at gesture start
/// * `handle` - Which hotspot is being dragged
/// * `delta` - Pointer movement since gesture start, in canvas units
/// * `canvas` - The clamping bounds
/// * `min_size` - Smallest dimension the resize may produce
///
/// # Returns
///
/// A new rect satisfying `0 <= x`, `0 <= y`, `x + w <= canvas_w`,
/// `y + h <= canvas_h`, and `w >= min_size` unless the canvas itself is
/// smaller than `min_size` (accepted degenerate case).
pub fn apply_resize_with_min(
    rect: ElementRect,
    handle: ResizeHandle,
    delta: (f32, f32),
    canvas: CanvasSize,
    min_size: f32,
) -> ElementRect {
    let (dx, dy) = delta;
    let mut out = rect;

    if handle.touches_east() {
        out.width = (rect.width + dx).max(min_size);
        if out.x + out.width > canvas.width {
            out.width = canvas.width - out.x;
        }
    } else if handle.touches_west() {
        out.x = rect.x + dx;
        out.width = rect.width - dx;
        if out.width < min_size {
            out.width = min_size;
            out.x = rect.x + rect.width - min_size;
        }
        if out.x < 0.0 {
            out.width += out.x;
            out.x = 0.0;
        }
    }

    if handle.touches_south() {
        out.height = (rect.height + dy).max(min_size);
        if out.y + out.height > canvas.height {
            out.height = canvas.height - out.y;
        }
    } else if handle.touches_north() {
        out.y = rect.y + dy;
        out.height = rect.height - dy;
        if out.height < min_size {
            out.height = min_size;
            out.y = rect.y + rect.height - min_size;
        }
        if out.y < 0.0 {
            out.height += out.y;
            out.y = 0.0;
        }
    }

    out
}

/// [`apply_resize_with_min`] with the application-wide minimum element size.
pub fn apply_resize(
    rect: ElementRect,
    handle: ResizeHandle,
    delta: (f32, f32),
    canvas: CanvasSize,
) -> ElementRect {
    apply_resize_with_min(rect, handle, delta, canvas, constants::MIN_ELEMENT_SIZE)
}

/// Contains a background box within the canvas: the size is capped to the
/// canvas dimensions, then the position is clamped.
pub fn clamp_background(geometry: BackgroundGeometry, canvas: CanvasSize) -> BackgroundGeometry {
    let width = geometry.width.min(canvas.width);
    let height = geometry.height.min(canvas.height);
    let contained = clamp_position(
        ElementRect::new(geometry.x, geometry.y, width, height),
        canvas,
    );
    BackgroundGeometry {
        x: contained.x,
        y: contained.y,
        width,
        height,
        object_fit: geometry.object_fit,
    }
}

/// Re-applies containment to every element and the background geometry.
///
/// Called after the canvas dimensions change so all boxes end up inside the
/// new bounds. Element sizes are preserved; only positions move (the
/// background box may also shrink to fit).
pub fn recontain_template(template: &mut Template) {
    let canvas = CanvasSize::from(&template.config);

    for element in &mut template.elements {
        let contained = clamp_position(ElementRect::of_element(element), canvas);
        element.x = contained.x;
        element.y = contained.y;
    }

    if let Some(geometry) = template.config.background_geometry {
        template.config.background_geometry = Some(clamp_background(geometry, canvas));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{CanvasElement, ObjectFit};

    const CANVAS: CanvasSize = CanvasSize {
        width: 800.0,
        height: 600.0,
    };

    fn in_bounds(rect: ElementRect, canvas: CanvasSize) -> bool {
        rect.x >= 0.0
            && rect.y >= 0.0
            && rect.right() <= canvas.width
            && rect.bottom() <= canvas.height
    }

    #[test]
    fn clamp_position_moves_box_inside() {
        let rect = ElementRect::new(750.0, 580.0, 100.0, 50.0);
        let clamped = clamp_position(rect, CANVAS);
        assert_eq!(clamped, ElementRect::new(700.0, 550.0, 100.0, 50.0));
    }

    #[test]
    fn clamp_position_leaves_contained_box_alone() {
        let rect = ElementRect::new(10.0, 20.0, 100.0, 50.0);
        assert_eq!(clamp_position(rect, CANVAS), rect);
    }

    #[test]
    fn clamp_position_negative_coordinates_go_to_zero() {
        let rect = ElementRect::new(-30.0, -5.0, 100.0, 50.0);
        let clamped = clamp_position(rect, CANVAS);
        assert_eq!((clamped.x, clamped.y), (0.0, 0.0));
    }

    #[test]
    fn clamp_position_oversized_box_pins_to_origin() {
        // Box wider than the canvas: max(0, w - box_w) keeps x at 0 rather
        // than going negative.
        let rect = ElementRect::new(100.0, 100.0, 900.0, 700.0);
        let clamped = clamp_position(rect, CANVAS);
        assert_eq!((clamped.x, clamped.y), (0.0, 0.0));
        assert_eq!((clamped.width, clamped.height), (900.0, 700.0));
    }

    #[test]
    fn clamp_position_is_idempotent() {
        for x in [-100.0, 0.0, 350.0, 750.0, 900.0] {
            for y in [-50.0, 0.0, 300.0, 580.0, 700.0] {
                for (w, h) in [(20.0, 20.0), (100.0, 50.0), (800.0, 600.0), (1000.0, 1000.0)] {
                    let rect = ElementRect::new(x, y, w, h);
                    let once = clamp_position(rect, CANVAS);
                    let twice = clamp_position(once, CANVAS);
                    assert_eq!(once, twice, "not idempotent for {rect:?}");
                }
            }
        }
    }

    #[test]
    fn resize_southeast_grows_box() {
        let rect = ElementRect::new(100.0, 100.0, 100.0, 50.0);
        let resized = apply_resize(rect, ResizeHandle::SouthEast, (40.0, 30.0), CANVAS);
        assert_eq!(resized, ElementRect::new(100.0, 100.0, 140.0, 80.0));
    }

    #[test]
    fn resize_northwest_moves_origin_and_shrinks() {
        let rect = ElementRect::new(100.0, 100.0, 100.0, 50.0);
        let resized = apply_resize(rect, ResizeHandle::NorthWest, (10.0, 5.0), CANVAS);
        // Opposite corner (200, 150) stays fixed.
        assert_eq!(resized, ElementRect::new(110.0, 105.0, 90.0, 45.0));
    }

    #[test]
    fn resize_edge_handle_only_touches_its_axis() {
        let rect = ElementRect::new(100.0, 100.0, 100.0, 50.0);
        let resized = apply_resize(rect, ResizeHandle::East, (25.0, 999.0), CANVAS);
        assert_eq!(resized, ElementRect::new(100.0, 100.0, 125.0, 50.0));
    }

    #[test]
    fn resize_enforces_minimum_size_from_anchor() {
        let rect = ElementRect::new(100.0, 100.0, 100.0, 50.0);
        let resized = apply_resize(rect, ResizeHandle::East, (-200.0, 0.0), CANVAS);
        assert_eq!(resized, ElementRect::new(100.0, 100.0, 20.0, 50.0));

        // West handle keeps the right edge anchored when clamped to minimum.
        let resized = apply_resize(rect, ResizeHandle::West, (200.0, 0.0), CANVAS);
        assert_eq!(resized, ElementRect::new(180.0, 100.0, 20.0, 50.0));

        // North handle keeps the bottom edge anchored.
        let resized = apply_resize(rect, ResizeHandle::North, (0.0, 200.0), CANVAS);
        assert_eq!(resized, ElementRect::new(100.0, 130.0, 100.0, 20.0));
    }

    #[test]
    fn resize_past_far_edge_reduces_dimension_not_position() {
        // The spec scenario: bottom-right handle dragged (+200, +200) on an
        // element at (780, 580) sized 100x50 on an 800x600 canvas.
        let rect = ElementRect::new(780.0, 580.0, 100.0, 50.0);
        let resized = apply_resize(rect, ResizeHandle::SouthEast, (200.0, 200.0), CANVAS);
        assert_eq!(resized, ElementRect::new(780.0, 580.0, 20.0, 20.0));
    }

    #[test]
    fn resize_past_near_edge_clamps_position_and_reduces_dimension() {
        let rect = ElementRect::new(10.0, 10.0, 100.0, 50.0);
        let resized = apply_resize(rect, ResizeHandle::West, (-30.0, 0.0), CANVAS);
        // Right edge stays at 110; the 20 units of overflow past x=0 come
        // out of the width.
        assert_eq!(resized, ElementRect::new(0.0, 10.0, 110.0, 50.0));

        // Bottom edge stays at 60; the 15 units past y=0 come out of the height.
        let resized = apply_resize(rect, ResizeHandle::North, (0.0, -25.0), CANVAS);
        assert_eq!(resized, ElementRect::new(10.0, 0.0, 100.0, 60.0));
    }

    #[test]
    fn resize_output_always_contained_with_min_size() {
        // Exhaustive sweep: boxes at rest positions, all handles, a grid of
        // deltas including far over-drags in every direction.
        let rects = [
            ElementRect::new(0.0, 0.0, 20.0, 20.0),
            ElementRect::new(0.0, 0.0, 100.0, 50.0),
            ElementRect::new(350.0, 275.0, 100.0, 50.0),
            ElementRect::new(700.0, 550.0, 100.0, 50.0),
            ElementRect::new(780.0, 580.0, 20.0, 20.0),
        ];
        let deltas = [-1000.0, -250.0, -35.0, 0.0, 35.0, 250.0, 1000.0];

        for rect in rects {
            for handle in ResizeHandle::ALL {
                for dx in deltas {
                    for dy in deltas {
                        let out = apply_resize(rect, handle, (dx, dy), CANVAS);
                        assert!(
                            in_bounds(out, CANVAS),
                            "out of bounds: {rect:?} {handle:?} ({dx}, {dy}) -> {out:?}"
                        );
                        assert!(
                            out.width >= 20.0 && out.height >= 20.0,
                            "below minimum: {rect:?} {handle:?} ({dx}, {dy}) -> {out:?}"
                        );
                    }
                }
            }
        }
    }

    #[test]
    fn clamp_background_shrinks_and_repositions() {
        let geometry = BackgroundGeometry {
            x: 500.0,
            y: 100.0,
            width: 600.0,
            height: 700.0,
            object_fit: ObjectFit::Contain,
        };
        let contained = clamp_background(geometry, CANVAS);
        assert_eq!(contained.width, 600.0);
        assert_eq!(contained.height, 600.0);
        assert_eq!(contained.x, 200.0);
        assert_eq!(contained.y, 0.0);
        assert_eq!(contained.object_fit, ObjectFit::Contain);
    }

    #[test]
    fn recontain_after_canvas_shrink() {
        let mut template = Template::new();
        template.config.width = 800.0;
        template.config.height = 600.0;

        let mut near_corner = CanvasElement::new_text(700.0, 550.0, "a".into());
        near_corner.payload.set_size(100.0, 50.0);
        template.add_element(near_corner);
        template.add_element(CanvasElement::new_image(600.0, 100.0, "b".into()));

        template.config.width = 400.0;
        template.config.height = 300.0;
        recontain_template(&mut template);

        for element in &template.elements {
            let rect = ElementRect::of_element(element);
            assert!(
                in_bounds(rect, CanvasSize::from(&template.config)),
                "element escaped after shrink: {rect:?}"
            );
        }
    }

    #[test]
    fn handle_unit_positions_match_touched_edges() {
        for handle in ResizeHandle::ALL {
            let (ux, uy) = handle.unit_position();
            assert_eq!(handle.touches_west(), ux == 0.0);
            assert_eq!(handle.touches_east(), ux == 1.0);
            assert_eq!(handle.touches_north(), uy == 0.0);
            assert_eq!(handle.touches_south(), uy == 1.0);
        }
    }
}

//! Pointer-gesture state machine for drag and resize.
//!
//! The controller is deliberately independent of any UI framework: the
//! canvas surface feeds it pointer events in canvas coordinates and applies
//! the geometry updates it emits. Subscription to movement is a consequence
//! of the state transitions themselves (entering `Dragging` or `Resizing`
//! makes `pointer_moved` productive, leaving makes it inert), not of widget
//! lifecycle hooks.
//!
//! At most one gesture is active at a time; attempts to start a second are
//! ignored. A gesture ends on pointer release or loss of pointer tracking,
//! keeping whatever geometry was last committed; there is no rollback and
//! no cancel key.

use crate::geometry::{apply_resize, clamp_position, CanvasSize, ElementRect, ResizeHandle};
use crate::types::ElementId;

/// What a gesture operates on: the canvas background or a single element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragTarget {
    /// The background image box.
    Background,
    /// The element with this id.
    Element(ElementId),
}

/// The controller's current state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Gesture {
    /// No gesture in progress.
    Idle,
    /// The target body is being moved.
    Dragging {
        /// What is being moved.
        target: DragTarget,
        /// Pointer position captured at pointer-down.
        pointer_start: (f32, f32),
        /// Target origin captured at pointer-down.
        origin_start: (f32, f32),
    },
    /// The target is being resized from one of its handles.
    Resizing {
        /// What is being resized.
        target: DragTarget,
        /// Which hotspot was grabbed.
        handle: ResizeHandle,
        /// Pointer position captured at pointer-down.
        pointer_start: (f32, f32),
        /// Full target box captured at pointer-down.
        rect_start: ElementRect,
    },
}

/// A geometry commit emitted on pointer movement.
///
/// The shell writes `rect`'s position when `position_changed` and its size
/// when `size_changed`, so unchanged coordinates are not rewritten.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeometryUpdate {
    /// The gesture's target.
    pub target: DragTarget,
    /// The new, already-clamped box.
    pub rect: ElementRect,
    /// Whether the position differs from the gesture-start position.
    pub position_changed: bool,
    /// Whether the size differs from the gesture-start size.
    pub size_changed: bool,
}

/// Drives `Idle -> Dragging -> Idle` and `Idle -> Resizing -> Idle`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InteractionController {
    gesture: Gesture,
}

impl Default for InteractionController {
    fn default() -> Self {
        Self::new()
    }
}

impl InteractionController {
    /// Creates an idle controller.
    pub fn new() -> Self {
        Self {
            gesture: Gesture::Idle,
        }
    }

    /// The current gesture state.
    pub fn gesture(&self) -> Gesture {
        self.gesture
    }

    /// Whether no gesture is in progress.
    pub fn is_idle(&self) -> bool {
        matches!(self.gesture, Gesture::Idle)
    }

    /// The target of the active gesture, if any.
    pub fn active_target(&self) -> Option<DragTarget> {
        match self.gesture {
            Gesture::Idle => None,
            Gesture::Dragging { target, .. } | Gesture::Resizing { target, .. } => Some(target),
        }
    }

    /// Starts a drag on the target body.
    ///
    /// Ignored unless idle: at most one gesture may be active.
    ///
    /// # Arguments
    ///
    /// * `target` - What to move
    /// * `pointer` - Pointer-down position in canvas units
    /// * `origin` - The target's current top-left corner
    ///
    /// # Returns
    ///
    /// `true` if the gesture started.
    pub fn begin_drag(&mut self, target: DragTarget, pointer: (f32, f32), origin: (f32, f32)) -> bool {
        if !self.is_idle() {
            return false;
        }
        self.gesture = Gesture::Dragging {
            target,
            pointer_start: pointer,
            origin_start: origin,
        };
        true
    }

    /// Starts a resize from one of the target's eight handles.
    ///
    /// Ignored unless idle.
    ///
    /// # Arguments
    ///
    /// * `target` - What to resize
    /// * `handle` - The grabbed hotspot
    /// * `pointer` - Pointer-down position in canvas units
    /// * `rect` - The target's current full box
    ///
    /// # Returns
    ///
    /// `true` if the gesture started.
    pub fn begin_resize(
        &mut self,
        target: DragTarget,
        handle: ResizeHandle,
        pointer: (f32, f32),
        rect: ElementRect,
    ) -> bool {
        if !self.is_idle() {
            return false;
        }
        self.gesture = Gesture::Resizing {
            target,
            handle,
            pointer_start: pointer,
            rect_start: rect,
        };
        true
    }

    /// Feeds a pointer-move event to the active gesture.
    ///
    /// # Arguments
    ///
    /// * `pointer` - Current pointer position in canvas units
    /// * `current_size` - The target's current rendered dimensions, used as
    ///   the box size while dragging (resizing uses the captured box)
    /// * `canvas` - Clamping bounds
    ///
    /// # Returns
    ///
    /// The geometry to commit, or `None` when idle. The shell applies the
    /// update synchronously before the next event is processed.
    pub fn pointer_moved(
        &mut self,
        pointer: (f32, f32),
        current_size: (f32, f32),
        canvas: CanvasSize,
    ) -> Option<GeometryUpdate> {
        match self.gesture {
            Gesture::Idle => None,
            Gesture::Dragging {
                target,
                pointer_start,
                origin_start,
            } => {
                let dx = pointer.0 - pointer_start.0;
                let dy = pointer.1 - pointer_start.1;
                let candidate = ElementRect::new(
                    origin_start.0 + dx,
                    origin_start.1 + dy,
                    current_size.0,
                    current_size.1,
                );
                let rect = clamp_position(candidate, canvas);
                Some(GeometryUpdate {
                    target,
                    rect,
                    position_changed: rect.x != origin_start.0 || rect.y != origin_start.1,
                    size_changed: false,
                })
            }
            Gesture::Resizing {
                target,
                handle,
                pointer_start,
                rect_start,
            } => {
                let delta = (pointer.0 - pointer_start.0, pointer.1 - pointer_start.1);
                let rect = apply_resize(rect_start, handle, delta, canvas);
                Some(GeometryUpdate {
                    target,
                    rect,
                    position_changed: rect.x != rect_start.x || rect.y != rect_start.y,
                    size_changed: rect.width != rect_start.width
                        || rect.height != rect_start.height,
                })
            }
        }
    }

    /// Ends the active gesture on pointer-up.
    ///
    /// The last committed geometry stands; nothing is rolled back or
    /// re-snapped beyond the clamps already applied per move.
    ///
    /// # Returns
    ///
    /// The target whose gesture just ended, if one was active.
    pub fn pointer_released(&mut self) -> Option<DragTarget> {
        let target = self.active_target();
        self.gesture = Gesture::Idle;
        target
    }

    /// Handles loss of pointer tracking (pointer left the window, capture
    /// lost). Treated exactly like pointer-up.
    pub fn pointer_capture_lost(&mut self) -> Option<DragTarget> {
        self.pointer_released()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    const CANVAS: CanvasSize = CanvasSize {
        width: 800.0,
        height: 600.0,
    };

    fn element_target() -> DragTarget {
        DragTarget::Element(Uuid::new_v4())
    }

    #[test]
    fn starts_idle() {
        let controller = InteractionController::new();
        assert!(controller.is_idle());
        assert_eq!(controller.active_target(), None);
    }

    #[test]
    fn drag_moves_by_pointer_delta() {
        let mut controller = InteractionController::new();
        let target = element_target();
        assert!(controller.begin_drag(target, (150.0, 120.0), (100.0, 100.0)));

        let update = controller
            .pointer_moved((180.0, 140.0), (100.0, 50.0), CANVAS)
            .unwrap();

        assert_eq!(update.target, target);
        assert_eq!(update.rect, ElementRect::new(130.0, 120.0, 100.0, 50.0));
        assert!(update.position_changed);
        assert!(!update.size_changed);
    }

    #[test]
    fn drag_clamps_to_canvas_bounds() {
        let mut controller = InteractionController::new();
        controller.begin_drag(element_target(), (0.0, 0.0), (700.0, 550.0));

        let update = controller
            .pointer_moved((500.0, 500.0), (100.0, 50.0), CANVAS)
            .unwrap();

        assert_eq!(update.rect, ElementRect::new(700.0, 550.0, 100.0, 50.0));
    }

    #[test]
    fn drag_uses_current_rendered_size_for_clamping() {
        let mut controller = InteractionController::new();
        controller.begin_drag(element_target(), (0.0, 0.0), (0.0, 0.0));

        // A wider element stops 200 units earlier than a narrow one.
        let update = controller
            .pointer_moved((1000.0, 0.0), (300.0, 50.0), CANVAS)
            .unwrap();

        assert_eq!(update.rect.x, 500.0);
    }

    #[test]
    fn resize_applies_captured_rect_and_handle() {
        let mut controller = InteractionController::new();
        let target = DragTarget::Background;
        let rect = ElementRect::new(100.0, 100.0, 200.0, 150.0);
        assert!(controller.begin_resize(target, ResizeHandle::SouthEast, (300.0, 250.0), rect));

        let update = controller
            .pointer_moved((340.0, 280.0), (0.0, 0.0), CANVAS)
            .unwrap();

        assert_eq!(update.rect, ElementRect::new(100.0, 100.0, 240.0, 180.0));
        assert!(!update.position_changed);
        assert!(update.size_changed);
    }

    #[test]
    fn resize_from_west_handle_reports_position_change() {
        let mut controller = InteractionController::new();
        let rect = ElementRect::new(100.0, 100.0, 200.0, 150.0);
        controller.begin_resize(element_target(), ResizeHandle::West, (100.0, 150.0), rect);

        let update = controller
            .pointer_moved((80.0, 150.0), (0.0, 0.0), CANVAS)
            .unwrap();

        assert_eq!(update.rect, ElementRect::new(80.0, 100.0, 220.0, 150.0));
        assert!(update.position_changed);
        assert!(update.size_changed);
    }

    #[test]
    fn only_one_gesture_at_a_time() {
        let mut controller = InteractionController::new();
        let first = element_target();
        assert!(controller.begin_drag(first, (0.0, 0.0), (0.0, 0.0)));

        // Neither a second drag nor a resize may start mid-gesture.
        assert!(!controller.begin_drag(element_target(), (0.0, 0.0), (0.0, 0.0)));
        assert!(!controller.begin_resize(
            DragTarget::Background,
            ResizeHandle::North,
            (0.0, 0.0),
            ElementRect::new(0.0, 0.0, 10.0, 10.0),
        ));

        assert_eq!(controller.active_target(), Some(first));
    }

    #[test]
    fn release_returns_to_idle_and_reports_target() {
        let mut controller = InteractionController::new();
        let target = element_target();
        controller.begin_drag(target, (0.0, 0.0), (0.0, 0.0));

        assert_eq!(controller.pointer_released(), Some(target));
        assert!(controller.is_idle());

        // Releasing while idle is a no-op.
        assert_eq!(controller.pointer_released(), None);
    }

    #[test]
    fn capture_loss_ends_gesture_without_rollback() {
        let mut controller = InteractionController::new();
        let target = element_target();
        controller.begin_drag(target, (0.0, 0.0), (100.0, 100.0));

        let update = controller
            .pointer_moved((50.0, 0.0), (100.0, 50.0), CANVAS)
            .unwrap();
        assert_eq!(update.rect.x, 150.0);

        // Tracking loss behaves like pointer-up: the gesture ends, the last
        // committed geometry stands, and subsequent moves emit nothing.
        assert_eq!(controller.pointer_capture_lost(), Some(target));
        assert_eq!(
            controller.pointer_moved((500.0, 500.0), (100.0, 50.0), CANVAS),
            None
        );
    }

    #[test]
    fn moves_while_idle_emit_nothing() {
        let mut controller = InteractionController::new();
        assert_eq!(
            controller.pointer_moved((10.0, 10.0), (100.0, 50.0), CANVAS),
            None
        );
    }
}

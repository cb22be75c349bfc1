use crate::geometry::{Position, Rect, Scroll};

/// Computes where the overlay goes: directly below the trigger, centered on
/// the trigger's horizontal midpoint, clamped to the viewport's horizontal
/// bounds. Both rectangles are viewport-relative; the result is in page
/// coordinates.
///
/// The left-edge clamp runs before the right-edge clamp and the result is not
/// re-checked against zero, so an overlay wider than the viewport ends up
/// with a negative `left`. There is no vertical clamping and no flip above
/// the trigger when space below runs out.
pub fn place_below(
    trigger: Rect,
    overlay: Rect,
    scroll: Scroll,
    viewport_width: f32,
) -> Position {
    let top = trigger.bottom() + scroll.y;

    let mut left = trigger.center_x() - overlay.width / 2.0 + scroll.x;

    if left < 0.0 {
        left = 0.0;
    }
    if left + overlay.width > viewport_width {
        left = viewport_width - overlay.width;
    }

    Position { top, left }
}

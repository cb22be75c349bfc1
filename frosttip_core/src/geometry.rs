/// Axis-aligned rectangle in viewport coordinates, as sampled from a rendered
/// element. Rectangles are ephemeral: the host re-samples them on every
/// position pass instead of caching them.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub top: f32,
    pub left: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(top: f32, left: f32, width: f32, height: f32) -> Self {
        Self {
            top,
            left,
            width,
            height,
        }
    }

    pub fn bottom(&self) -> f32 {
        self.top + self.height
    }

    pub fn right(&self) -> f32 {
        self.left + self.width
    }

    pub fn center_x(&self) -> f32 {
        self.left + self.width / 2.0
    }

    /// An element that is not attached to the visible tree measures as an
    /// empty rectangle; position passes skip such samples.
    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }
}

/// Absolute page coordinates of the overlay's top-left corner: viewport
/// coordinates plus the page scroll offset at computation time.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Position {
    pub top: f32,
    pub left: f32,
}

/// Current page scroll offsets.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Scroll {
    pub x: f32,
    pub y: f32,
}

impl Scroll {
    pub const ZERO: Self = Self { x: 0.0, y: 0.0 };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derived_edges_follow_origin_and_size() {
        let rect = Rect::new(10.0, 20.0, 40.0, 8.0);
        assert_eq!(rect.bottom(), 18.0);
        assert_eq!(rect.right(), 60.0);
        assert_eq!(rect.center_x(), 40.0);
    }

    #[test]
    fn unattached_elements_measure_empty() {
        assert!(Rect::default().is_empty());
        assert!(Rect::new(5.0, 5.0, 0.0, 10.0).is_empty());
        assert!(!Rect::new(5.0, 5.0, 1.0, 1.0).is_empty());
    }
}

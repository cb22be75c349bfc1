use frosttip_core::{Rect, Scroll};
use iced::{Event, Rectangle, Size, widget::scrollable::AbsoluteOffset, window};

/// Window size and page scroll offsets, tracked from runtime events.
///
/// This is the read side of the viewport signal: the same messages that
/// update it decide whether a reposition pass is due, so nothing here is
/// polled from ambient globals.
#[derive(Debug, Clone, Copy, Default)]
pub struct ViewportMetrics {
    size: Size,
    scroll: Scroll,
}

impl ViewportMetrics {
    pub fn width(&self) -> f32 {
        self.size.width
    }

    pub fn scroll(&self) -> Scroll {
        self.scroll
    }

    /// Feeds a window open/resize event. Returns whether the size changed.
    pub fn on_window_event(&mut self, event: &Event) -> bool {
        match event {
            Event::Window(
                window::Event::Opened { size, .. }
                | window::Event::Resized(size),
            ) => {
                let changed = *size != self.size;
                self.size = *size;
                changed
            }
            _ => false,
        }
    }

    /// Feeds the page scrollable's offset. Returns whether it changed.
    pub fn on_scroll(&mut self, offset: AbsoluteOffset) -> bool {
        let scroll = Scroll {
            x: offset.x,
            y: offset.y,
        };
        let changed = scroll != self.scroll;
        self.scroll = scroll;
        changed
    }

    #[cfg(test)]
    pub fn for_tests(width: f32, scroll: Scroll) -> Self {
        Self {
            size: Size::new(width, 600.0),
            scroll,
        }
    }
}

/// Bounds reported by the runtime are window-relative, which is exactly the
/// viewport-coordinate contract the placement math expects.
pub fn rect_from(bounds: Rectangle) -> Rect {
    Rect::new(bounds.y, bounds.x, bounds.width, bounds.height)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resize_events_update_the_size_once() {
        let mut metrics = ViewportMetrics::default();
        let event =
            Event::Window(window::Event::Resized(Size::new(800.0, 600.0)));

        assert!(metrics.on_window_event(&event));
        assert_eq!(metrics.width(), 800.0);
        assert!(!metrics.on_window_event(&event), "same size is not a change");
    }

    #[test]
    fn unrelated_events_are_ignored() {
        let mut metrics = ViewportMetrics::default();
        let event = Event::Window(window::Event::Focused);

        assert!(!metrics.on_window_event(&event));
    }

    #[test]
    fn scroll_offsets_round_trip() {
        let mut metrics = ViewportMetrics::default();

        assert!(metrics.on_scroll(AbsoluteOffset { x: 0.0, y: 120.0 }));
        assert_eq!(metrics.scroll(), Scroll { x: 0.0, y: 120.0 });
        assert!(!metrics.on_scroll(AbsoluteOffset { x: 0.0, y: 120.0 }));
    }

    #[test]
    fn rects_convert_from_window_bounds() {
        let rect = rect_from(Rectangle {
            x: 10.0,
            y: 20.0,
            width: 30.0,
            height: 40.0,
        });

        assert_eq!(rect.left, 10.0);
        assert_eq!(rect.top, 20.0);
        assert_eq!(rect.bottom(), 60.0);
    }
}

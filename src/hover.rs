//! Hover tooltip component: trigger wiring, delay timers, measurement, and
//! the overlay layer.
//!
//! Each registered trigger owns a [`HoverBinder`] deciding *when* the overlay
//! shows and a pair of container ids deciding *where*: the trigger's bounds
//! and the overlay's own bounds are sampled through widget operations on
//! every position pass, then fed to the placement math. The overlay itself is
//! rendered by [`HoverTips::overlay_layer`] at the root of the window view,
//! outside every trigger's subtree, so no ancestor can clip it.

use std::time::Duration;

use frosttip_core::{
    Command, HoverBinder, Position, Rect, TimerToken, place_below,
};
use iced::{
    Length, Rectangle, Task, mouse::Interaction, padding, task,
    widget::{Container, MouseArea, Stack, container},
};
use rustc_hash::FxHashMap;
use tracing::{debug, trace};

use crate::{
    Element, Message, config, style,
    viewport::{ViewportMetrics, rect_from},
};

/// Bounds queries can miss while the overlay is entering the tree; each miss
/// re-issues the query up to this cap before the pass is skipped.
const MEASURE_RETRIES: u8 = 5;

#[derive(Debug, Clone)]
pub enum HoverMsg {
    Entered(container::Id),
    Exited(container::Id),
    DelayElapsed(container::Id, TimerToken),
    TriggerMeasured(container::Id, Option<Rectangle>),
    OverlayMeasured(container::Id, Option<Rectangle>),
}

struct HoverTip {
    trigger: container::Id,
    overlay: container::Id,
    binder: HoverBinder,
    /// Armed delay task. Abort-on-drop, so replacing it is cancelling it.
    timer: Option<task::Handle>,
    trigger_sample: Option<Rect>,
    overlay_sample: Option<Rect>,
    position: Option<Position>,
    retries: u8,
}

/// All hover tooltip instances of the application, keyed by trigger id.
#[derive(Default)]
pub struct HoverTips {
    tips: FxHashMap<container::Id, HoverTip>,
}

#[profiling::all_functions]
impl HoverTips {
    /// Mounts a tooltip instance for `trigger` with the given hover delay.
    pub fn register(&mut self, trigger: container::Id, delay: Duration) {
        self.tips.insert(
            trigger.clone(),
            HoverTip {
                trigger,
                overlay: container::Id::unique(),
                binder: HoverBinder::new(delay),
                timer: None,
                trigger_sample: None,
                overlay_sample: None,
                position: None,
                retries: 0,
            },
        );
    }

    /// Unmounts every instance. Pending delay tasks abort when their handles
    /// drop and the overlay layer empties on the next view pass.
    pub fn clear(&mut self) {
        if !self.tips.is_empty() {
            debug!(count = self.tips.len(), "tearing down hover tooltips");
        }
        self.tips.clear();
    }

    pub fn any_visible(&self) -> bool {
        self.tips.values().any(|tip| tip.binder.is_visible())
    }

    pub fn update(
        &mut self,
        message: HoverMsg,
        viewport: &ViewportMetrics,
    ) -> Task<Message> {
        match message {
            HoverMsg::Entered(id) => {
                let Some(tip) = self.tips.get_mut(&id) else {
                    return Task::none();
                };
                let command = tip.binder.pointer_enter();
                Self::execute(tip, command)
            }
            HoverMsg::Exited(id) => {
                let Some(tip) = self.tips.get_mut(&id) else {
                    return Task::none();
                };
                let command = tip.binder.pointer_leave();
                Self::execute(tip, command)
            }
            HoverMsg::DelayElapsed(id, token) => {
                let Some(tip) = self.tips.get_mut(&id) else {
                    return Task::none();
                };
                tip.timer = None;
                let command = tip.binder.timer_fired(token);
                Self::execute(tip, command)
            }
            HoverMsg::TriggerMeasured(id, bounds) => {
                self.measured(&id, bounds, Sample::Trigger, viewport)
            }
            HoverMsg::OverlayMeasured(id, bounds) => {
                self.measured(&id, bounds, Sample::Overlay, viewport)
            }
        }
    }

    /// Re-runs the full position computation for every visible instance from
    /// freshly sampled rectangles. Never an incremental adjustment.
    pub fn reposition(&mut self) -> Task<Message> {
        let passes: Vec<_> = self
            .tips
            .values_mut()
            .filter(|tip| tip.binder.is_visible())
            .map(|tip| {
                tip.trigger_sample = None;
                tip.overlay_sample = None;
                tip.retries = 0;
                Self::measure(tip)
            })
            .collect();

        Task::batch(passes)
    }

    fn execute(tip: &mut HoverTip, command: Command) -> Task<Message> {
        match command {
            Command::Arm { token, delay } => {
                let id = tip.trigger.clone();
                let (sleep, handle) = Task::perform(
                    async move { tokio::time::sleep(delay).await },
                    move |()| {
                        Message::Hover(HoverMsg::DelayElapsed(
                            id.clone(),
                            token,
                        ))
                    },
                )
                .abortable();

                // Replacing the stored handle aborts any superseded timer.
                tip.timer = Some(handle.abort_on_drop());
                sleep
            }
            Command::Disarm(token) => {
                trace!(?token, "dropping pending hover timer");
                tip.timer = None;
                Task::none()
            }
            Command::Show => {
                tip.trigger_sample = None;
                tip.overlay_sample = None;
                tip.position = None;
                tip.retries = 0;
                Self::measure(tip)
            }
            Command::Hide => {
                tip.trigger_sample = None;
                tip.overlay_sample = None;
                tip.position = None;
                Task::none()
            }
            Command::None => Task::none(),
        }
    }

    /// Samples both rectangles of one instance through widget operations.
    fn measure(tip: &HoverTip) -> Task<Message> {
        let key = tip.trigger.clone();
        let for_trigger = container::visible_bounds(tip.trigger.clone()).map(
            move |bounds| {
                Message::Hover(HoverMsg::TriggerMeasured(key.clone(), bounds))
            },
        );

        let key = tip.trigger.clone();
        let for_overlay = container::visible_bounds(tip.overlay.clone()).map(
            move |bounds| {
                Message::Hover(HoverMsg::OverlayMeasured(key.clone(), bounds))
            },
        );

        Task::batch([for_trigger, for_overlay])
    }

    fn measured(
        &mut self,
        id: &container::Id,
        bounds: Option<Rectangle>,
        sample: Sample,
        viewport: &ViewportMetrics,
    ) -> Task<Message> {
        let Some(tip) = self.tips.get_mut(id) else {
            return Task::none();
        };

        // A query can resolve after the pointer already left; the instance
        // is hidden again and the sample is stale.
        if !tip.binder.is_visible() {
            return Task::none();
        }

        match bounds.map(rect_from) {
            Some(rect) if !rect.is_empty() => match sample {
                Sample::Trigger => tip.trigger_sample = Some(rect),
                Sample::Overlay => tip.overlay_sample = Some(rect),
            },
            _ => {
                if tip.retries < MEASURE_RETRIES {
                    tip.retries += 1;
                    return Self::measure(tip);
                }
                debug!(?sample, "bounds unavailable, skipping position pass");
                return Task::none();
            }
        }

        if let (Some(trigger), Some(overlay)) =
            (tip.trigger_sample, tip.overlay_sample)
        {
            let position = place_below(
                trigger,
                overlay,
                viewport.scroll(),
                viewport.width(),
            );
            trace!(?position, "placed tooltip");
            tip.position = Some(position);
        }

        Task::none()
    }

    /// The full-window layer carrying every mounted overlay, composed above
    /// the page via `stack`. An overlay without a position yet is laid out
    /// transparently so it can be measured without flashing.
    pub fn overlay_layer<'a>(
        &'a self,
        style: &'a config::Style,
        viewport: &ViewportMetrics,
        render: impl Fn(&container::Id) -> Option<Element<'a>>,
    ) -> Element<'a> {
        let scroll = viewport.scroll();

        let layer = self
            .tips
            .values()
            .filter(|tip| tip.binder.is_visible())
            .fold(Stack::new(), |stack, tip| {
                let Some(content) = render(&tip.trigger) else {
                    return stack;
                };

                let measuring = tip.position.is_none();
                let tip_box = Container::new(content)
                    .id(tip.overlay.clone())
                    .padding(style.padding)
                    .style(style::overlay_style(style, measuring));

                // Placement is in page coordinates while the layer is pinned
                // to the window, so convert back through the scroll offset.
                let (x, y) = match tip.position {
                    Some(position) => {
                        (position.left - scroll.x, position.top - scroll.y)
                    }
                    None => (0.0, 0.0),
                };

                stack.push(
                    Container::new(tip_box).padding(padding::top(y).left(x)),
                )
            });

        Container::new(layer)
            .width(Length::Fill)
            .height(Length::Fill)
            .into()
    }

    #[cfg(test)]
    fn phase_of(&self, id: &container::Id) -> frosttip_core::Phase {
        self.tips[id].binder.phase()
    }

    #[cfg(test)]
    fn position_of(&self, id: &container::Id) -> Option<Position> {
        self.tips[id].position
    }
}

#[derive(Debug, Clone, Copy)]
enum Sample {
    Trigger,
    Overlay,
}

/// Wraps arbitrary trigger content in the hover wiring. The content sits in
/// an id'd container so its on-screen bounds stay queryable.
pub fn trigger<'a>(
    id: &container::Id,
    content: impl Into<Element<'a>>,
) -> Element<'a> {
    MouseArea::new(Container::new(content).id(id.clone()))
        .on_enter(Message::Hover(HoverMsg::Entered(id.clone())))
        .on_exit(Message::Hover(HoverMsg::Exited(id.clone())))
        .interaction(Interaction::Pointer)
        .into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use frosttip_core::{Phase, Scroll};

    const DELAY: Duration = Duration::from_millis(150);

    fn viewport() -> ViewportMetrics {
        ViewportMetrics::for_tests(800.0, Scroll { x: 10.0, y: 20.0 })
    }

    fn registered() -> (HoverTips, container::Id) {
        let mut tips = HoverTips::default();
        let id = container::Id::unique();
        tips.register(id.clone(), DELAY);
        (tips, id)
    }

    fn pending_token(tips: &HoverTips, id: &container::Id) -> TimerToken {
        match tips.phase_of(id) {
            Phase::Pending(token) => token,
            phase => panic!("expected a pending timer, got {phase:?}"),
        }
    }

    #[test]
    fn enter_arms_and_exit_cancels() {
        let (mut tips, id) = registered();
        let viewport = viewport();

        let _ = tips.update(HoverMsg::Entered(id.clone()), &viewport);
        let token = pending_token(&tips, &id);

        let _ = tips.update(HoverMsg::Exited(id.clone()), &viewport);
        assert_eq!(tips.phase_of(&id), Phase::Idle);

        // The expiry the abort failed to beat must not show anything.
        let _ = tips.update(HoverMsg::DelayElapsed(id.clone(), token), &viewport);
        assert_eq!(tips.phase_of(&id), Phase::Idle);
        assert!(!tips.any_visible());
    }

    #[test]
    fn elapsed_delay_mounts_the_overlay_unplaced() {
        let (mut tips, id) = registered();
        let viewport = viewport();

        let _ = tips.update(HoverMsg::Entered(id.clone()), &viewport);
        let token = pending_token(&tips, &id);
        let _ = tips.update(HoverMsg::DelayElapsed(id.clone(), token), &viewport);

        assert!(tips.any_visible());
        assert_eq!(
            tips.position_of(&id),
            None,
            "placement waits for both rectangles"
        );
    }

    #[test]
    fn both_measurements_complete_the_placement() {
        let (mut tips, id) = registered();
        let viewport = viewport();

        let _ = tips.update(HoverMsg::Entered(id.clone()), &viewport);
        let token = pending_token(&tips, &id);
        let _ = tips.update(HoverMsg::DelayElapsed(id.clone(), token), &viewport);

        let trigger_bounds = Rectangle {
            x: 100.0,
            y: 40.0,
            width: 80.0,
            height: 20.0,
        };
        let overlay_bounds = Rectangle {
            x: 0.0,
            y: 0.0,
            width: 40.0,
            height: 30.0,
        };

        let _ = tips.update(
            HoverMsg::TriggerMeasured(id.clone(), Some(trigger_bounds)),
            &viewport,
        );
        assert_eq!(tips.position_of(&id), None, "one rectangle is not enough");

        let _ = tips.update(
            HoverMsg::OverlayMeasured(id.clone(), Some(overlay_bounds)),
            &viewport,
        );

        let position = tips.position_of(&id).expect("placed");
        assert_eq!(position.top, 80.0);
        assert_eq!(position.left, 130.0);
    }

    #[test]
    fn late_measurements_after_exit_are_dropped() {
        let (mut tips, id) = registered();
        let viewport = viewport();

        let _ = tips.update(HoverMsg::Entered(id.clone()), &viewport);
        let token = pending_token(&tips, &id);
        let _ = tips.update(HoverMsg::DelayElapsed(id.clone(), token), &viewport);
        let _ = tips.update(HoverMsg::Exited(id.clone()), &viewport);

        let bounds = Rectangle {
            x: 1.0,
            y: 2.0,
            width: 3.0,
            height: 4.0,
        };
        let _ = tips.update(
            HoverMsg::TriggerMeasured(id.clone(), Some(bounds)),
            &viewport,
        );

        assert_eq!(tips.position_of(&id), None);
        assert!(!tips.any_visible());
    }

    #[test]
    fn unavailable_bounds_eventually_give_up() {
        let (mut tips, id) = registered();
        let viewport = viewport();

        let _ = tips.update(HoverMsg::Entered(id.clone()), &viewport);
        let token = pending_token(&tips, &id);
        let _ = tips.update(HoverMsg::DelayElapsed(id.clone(), token), &viewport);

        for _ in 0..=u16::from(MEASURE_RETRIES) + 1 {
            let _ = tips
                .update(HoverMsg::TriggerMeasured(id.clone(), None), &viewport);
        }

        assert!(tips.any_visible(), "instance stays mounted");
        assert_eq!(tips.position_of(&id), None, "but is never placed");
    }

    #[test]
    fn clear_unmounts_everything() {
        let (mut tips, id) = registered();
        let viewport = viewport();

        let _ = tips.update(HoverMsg::Entered(id.clone()), &viewport);
        let token = pending_token(&tips, &id);
        let _ = tips.update(HoverMsg::DelayElapsed(id.clone(), token), &viewport);
        assert!(tips.any_visible());

        tips.clear();
        assert!(!tips.any_visible());

        // Stragglers for removed instances are no-ops.
        let _ = tips.update(HoverMsg::DelayElapsed(id.clone(), token), &viewport);
        let _ = tips.update(HoverMsg::Exited(id), &viewport);
    }

    #[test]
    fn messages_for_unknown_triggers_are_ignored() {
        let (mut tips, _id) = registered();
        let viewport = viewport();

        let unknown = container::Id::unique();
        let _ = tips.update(HoverMsg::Entered(unknown), &viewport);
        assert!(!tips.any_visible());
    }
}

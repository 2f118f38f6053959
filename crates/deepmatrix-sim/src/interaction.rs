//! Pointer interaction: drag-to-rotate, hover steering, and the one-shot
//! reveal latch shared with the scroll trigger.

use deepmatrix_core::config::BehaviorConfig;
use deepmatrix_core::constants::{
    HOVER_BASE_ANGLE, HOVER_MAX_ANGLE, HOVER_MAX_TRANSLATION_GAIN, HOVER_MIN_DT_MS,
    HOVER_SPEED_GAIN, HOVER_TRANSLATION_GAIN, HOVER_TRANSLATION_SPEED_GAIN, RELEASE_FACTOR,
    SCROLL_REVEAL_THRESHOLD_PX,
};
use glam::{Vec2, Vec3};

use crate::camera::{LatticeCamera, LatticeGroup};
use crate::motion::MotionState;

/// Pointer position relative to the surface's top-left corner (CSS pixels),
/// with the event timestamp in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerSample {
    pub position: Vec2,
    pub time_ms: f64,
    /// Primary pointer pressing its main button (left mouse, first touch, pen tip).
    pub primary: bool,
}

impl PointerSample {
    pub fn new(x: f32, y: f32, time_ms: f64) -> Self {
        Self {
            position: Vec2::new(x, y),
            time_ms,
            primary: true,
        }
    }

    pub fn with_primary(self, primary: bool) -> Self {
        Self { primary, ..self }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cursor {
    Grab,
    Grabbing,
    Default,
}

impl Cursor {
    pub fn as_css(self) -> &'static str {
        match self {
            Cursor::Grab => "grab",
            Cursor::Grabbing => "grabbing",
            Cursor::Default => "default",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerCapture {
    Capture(i32),
    Release(i32),
}

/// Side effects the host must apply after an input event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct InteractionResponse {
    /// The reveal latch fired on this event. Happens at most once per mount.
    pub reveal_triggered: bool,
    pub cursor: Option<Cursor>,
    pub capture: Option<PointerCapture>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum PointerMode {
    Inactive,
    Hovering(Option<PointerSample>),
    Dragging { pointer_id: i32, last: PointerSample },
}

/// Fires exactly once.
#[derive(Debug, Clone, Copy, Default)]
pub struct RevealLatch {
    fired: bool,
}

impl RevealLatch {
    /// Returns true only on the first call.
    pub fn fire(&mut self) -> bool {
        !std::mem::replace(&mut self.fired, true)
    }

    pub fn has_fired(&self) -> bool {
        self.fired
    }
}

/// Read-only scene state an input event is interpreted against.
pub struct InteractionContext<'a> {
    pub config: &'a BehaviorConfig,
    pub camera: &'a LatticeCamera,
    pub group: &'a LatticeGroup,
    /// Bounding radius of the unscaled lattice.
    pub bounding_radius: f32,
}

#[derive(Debug, Clone)]
pub struct InteractionController {
    mode: PointerMode,
    latch: RevealLatch,
}

impl Default for InteractionController {
    fn default() -> Self {
        Self {
            mode: PointerMode::Inactive,
            latch: RevealLatch::default(),
        }
    }
}

impl InteractionController {
    pub fn is_dragging(&self) -> bool {
        matches!(self.mode, PointerMode::Dragging { .. })
    }

    pub fn is_hovering(&self) -> bool {
        matches!(self.mode, PointerMode::Hovering(_))
    }

    pub fn reveal_fired(&self) -> bool {
        self.latch.has_fired()
    }

    fn fire_reveal(&mut self, motion: &mut MotionState) -> bool {
        if self.latch.fire() {
            motion.trigger_reveal();
            log::info!("Lattice revealed by first interaction");
            true
        } else {
            false
        }
    }

    /// Start a drag. Secondary buttons and extra pointers while a drag is
    /// active are ignored; the first pointer keeps its capture.
    pub fn pointer_down(
        &mut self,
        motion: &mut MotionState,
        pointer_id: i32,
        sample: PointerSample,
    ) -> InteractionResponse {
        if !sample.primary || self.is_dragging() {
            return InteractionResponse::default();
        }
        self.mode = PointerMode::Dragging {
            pointer_id,
            last: sample,
        };
        motion.dragging = true;
        InteractionResponse {
            reveal_triggered: self.fire_reveal(motion),
            cursor: Some(Cursor::Grabbing),
            capture: Some(PointerCapture::Capture(pointer_id)),
        }
    }

    pub fn pointer_move(
        &mut self,
        motion: &mut MotionState,
        ctx: &InteractionContext<'_>,
        pointer_id: i32,
        sample: PointerSample,
    ) -> InteractionResponse {
        match self.mode {
            PointerMode::Dragging { pointer_id: id, last } => {
                if id != pointer_id {
                    return InteractionResponse::default();
                }
                self.mode = PointerMode::Dragging {
                    pointer_id: id,
                    last: sample,
                };
                let d = sample.position - last.position;
                let s = ctx.config.interaction_sensitivity;
                motion.add_rotation_impulse(
                    Vec3::new(d.y * s, d.x * s, 0.0),
                    ctx.config.max_rotation_velocity,
                );
                InteractionResponse::default()
            }
            PointerMode::Inactive | PointerMode::Hovering(_) => self.hover(motion, ctx, sample),
        }
    }

    fn hover(
        &mut self,
        motion: &mut MotionState,
        ctx: &InteractionContext<'_>,
        sample: PointerSample,
    ) -> InteractionResponse {
        let ray = ctx.camera.ray_from_ndc(ctx.camera.pixel_to_ndc(sample.position));
        let radius = ctx.bounding_radius * ctx.group.scale;
        if !ray.hits_sphere(ctx.group.position.extend(0.0), radius) {
            let was_hovering = self.is_hovering();
            self.mode = PointerMode::Inactive;
            return InteractionResponse {
                cursor: was_hovering.then_some(Cursor::Default),
                ..Default::default()
            };
        }

        let previous = match self.mode {
            PointerMode::Hovering(prev) => prev,
            _ => None,
        };
        let entered = !self.is_hovering();
        self.mode = PointerMode::Hovering(Some(sample));
        let cursor = entered.then_some(Cursor::Grab);

        let Some(prev) = previous else {
            return InteractionResponse {
                cursor,
                ..Default::default()
            };
        };

        let d = sample.position - prev.position;
        if d == Vec2::ZERO {
            return InteractionResponse {
                cursor,
                ..Default::default()
            };
        }

        let dt = (sample.time_ms - prev.time_ms).max(HOVER_MIN_DT_MS) as f32;
        let speed = d.length() / dt;

        let angle = (HOVER_BASE_ANGLE + HOVER_SPEED_GAIN * speed).min(HOVER_MAX_ANGLE);
        motion.add_rotation_impulse(
            Vec3::new(d.y * angle, d.x * angle, 0.0),
            ctx.config.max_rotation_velocity,
        );

        let gain = (HOVER_TRANSLATION_GAIN + HOVER_TRANSLATION_SPEED_GAIN * speed)
            .min(HOVER_MAX_TRANSLATION_GAIN);
        let wpp = ctx.camera.world_per_pixel();
        let max_speed = ctx.config.max_translation_speed * ctx.camera.bounds().min_half_extent();
        motion.add_translation_impulse(Vec2::new(d.x * wpp.x, -d.y * wpp.y) * gain, max_speed);

        InteractionResponse {
            reveal_triggered: self.fire_reveal(motion),
            cursor,
            capture: None,
        }
    }

    pub fn pointer_up(&mut self, motion: &mut MotionState, pointer_id: i32) -> InteractionResponse {
        match self.mode {
            PointerMode::Dragging { pointer_id: id, .. } if id == pointer_id => {
                self.mode = PointerMode::Inactive;
                motion.release(RELEASE_FACTOR);
                InteractionResponse {
                    reveal_triggered: false,
                    cursor: Some(Cursor::Default),
                    capture: Some(PointerCapture::Release(pointer_id)),
                }
            }
            _ => InteractionResponse::default(),
        }
    }

    /// Cancel behaves like release.
    pub fn pointer_cancel(
        &mut self,
        motion: &mut MotionState,
        pointer_id: i32,
    ) -> InteractionResponse {
        self.pointer_up(motion, pointer_id)
    }

    /// Leaving the surface ends hovering. Velocity is kept, so the lattice coasts.
    /// A captured drag keeps going.
    pub fn pointer_leave(&mut self) -> InteractionResponse {
        if self.is_hovering() {
            self.mode = PointerMode::Inactive;
            InteractionResponse {
                cursor: Some(Cursor::Default),
                ..Default::default()
            }
        } else {
            InteractionResponse::default()
        }
    }

    /// Page scroll past the threshold counts as the first interaction.
    pub fn scroll(&mut self, motion: &mut MotionState, scroll_y: f64) -> InteractionResponse {
        if scroll_y.abs() <= SCROLL_REVEAL_THRESHOLD_PX {
            return InteractionResponse::default();
        }
        InteractionResponse {
            reveal_triggered: self.fire_reveal(motion),
            ..Default::default()
        }
    }
}

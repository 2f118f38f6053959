use std::cell::Cell;
use std::rc::Rc;

use deepmatrix_core::Rgb;

/// Props the embedding page may change at any time without a rebuild.
/// The page writes, the frame loop reads at the top of every tick.
/// Single-threaded: clones share the same cells.
#[derive(Debug, Clone)]
pub struct LiveParams {
    target_color: Rc<Cell<Rgb>>,
    scale_multiplier: Rc<Cell<f32>>,
}

impl LiveParams {
    pub fn new(target_color: Rgb, scale_multiplier: f32) -> Self {
        Self {
            target_color: Rc::new(Cell::new(target_color)),
            scale_multiplier: Rc::new(Cell::new(scale_multiplier)),
        }
    }

    pub fn target_color(&self) -> Rgb {
        self.target_color.get()
    }

    pub fn set_target_color(&self, color: Rgb) {
        self.target_color.set(color);
    }

    pub fn scale_multiplier(&self) -> f32 {
        self.scale_multiplier.get()
    }

    pub fn set_scale_multiplier(&self, multiplier: f32) {
        self.scale_multiplier.set(multiplier);
    }
}

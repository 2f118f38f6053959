/// Canvas size in CSS pixels plus the device pixel ratio it is drawn at.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceSize {
    css_width: f32,
    css_height: f32,
    pixel_ratio: f32,
}

impl SurfaceSize {
    /// Non-finite or negative extents collapse to zero; a bad ratio falls back to 1.
    pub fn new(css_width: f32, css_height: f32, pixel_ratio: f32) -> Self {
        let extent = |v: f32| if v.is_finite() { v.max(0.0) } else { 0.0 };
        let pixel_ratio = if pixel_ratio.is_finite() && pixel_ratio > 0.0 {
            pixel_ratio
        } else {
            1.0
        };
        Self {
            css_width: extent(css_width),
            css_height: extent(css_height),
            pixel_ratio,
        }
    }

    pub fn css(&self) -> (f32, f32) {
        (self.css_width, self.css_height)
    }

    pub fn pixel_ratio(&self) -> f32 {
        self.pixel_ratio
    }

    /// Backing-store size in device pixels, never zero.
    pub fn physical(&self) -> (u32, u32) {
        (
            ((self.css_width * self.pixel_ratio) as u32).max(1),
            ((self.css_height * self.pixel_ratio) as u32).max(1),
        )
    }

    /// Physical size clamped to the device's maximum texture dimension.
    pub fn physical_within(&self, max_dimension: u32) -> (u32, u32) {
        let (w, h) = self.physical();
        let max_dimension = max_dimension.max(1);
        (w.min(max_dimension), h.min(max_dimension))
    }
}

use glam::Vec3;

use crate::error::MatrixError;

/// Linear RGB color with components in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rgb(pub Vec3);

impl Rgb {
    pub const BLACK: Rgb = Rgb(Vec3::ZERO);
    pub const WHITE: Rgb = Rgb(Vec3::ONE);

    pub fn new(r: f32, g: f32, b: f32) -> Self {
        Rgb(Vec3::new(r, g, b))
    }

    pub fn gray(level: f32) -> Self {
        Rgb(Vec3::splat(level))
    }

    /// Parse a CSS-style color: `#rgb`, `#rrggbb`, `rgb(r, g, b)` or a basic name.
    pub fn parse(spec: &str) -> Result<Rgb, MatrixError> {
        let s = spec.trim().to_ascii_lowercase();
        let invalid = || MatrixError::InvalidColor(spec.to_string());

        if let Some(hex) = s.strip_prefix('#') {
            return parse_hex(hex).ok_or_else(invalid);
        }
        if let Some(body) = s.strip_prefix("rgb(").and_then(|b| b.strip_suffix(')')) {
            return parse_rgb_fn(body).ok_or_else(invalid);
        }
        named(&s).ok_or_else(invalid)
    }

    pub fn lerp(self, other: Rgb, t: f32) -> Rgb {
        Rgb(self.0.lerp(other.0, t.clamp(0.0, 1.0)))
    }

    pub fn scaled(self, k: f32) -> Rgb {
        Rgb((self.0 * k).clamp(Vec3::ZERO, Vec3::ONE))
    }

    pub fn to_array(self) -> [f32; 3] {
        self.0.to_array()
    }

    pub fn with_alpha(self, alpha: f32) -> [f32; 4] {
        [self.0.x, self.0.y, self.0.z, alpha]
    }
}

fn parse_hex(hex: &str) -> Option<Rgb> {
    if !hex.bytes().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    let nibble = |c: u8| (c as char).to_digit(16);
    let bytes = hex.as_bytes();
    let (r, g, b) = match bytes.len() {
        3 => {
            let r = nibble(bytes[0])?;
            let g = nibble(bytes[1])?;
            let b = nibble(bytes[2])?;
            (r * 17, g * 17, b * 17)
        }
        6 => {
            let v = u32::from_str_radix(hex, 16).ok()?;
            ((v >> 16) & 0xFF, (v >> 8) & 0xFF, v & 0xFF)
        }
        _ => return None,
    };
    Some(Rgb::new(
        r as f32 / 255.0,
        g as f32 / 255.0,
        b as f32 / 255.0,
    ))
}

fn parse_rgb_fn(body: &str) -> Option<Rgb> {
    let mut channels = [0.0f32; 3];
    let mut parts = body.split(',');
    for channel in channels.iter_mut() {
        let value: f32 = parts.next()?.trim().parse().ok()?;
        if !(0.0..=255.0).contains(&value) {
            return None;
        }
        *channel = value / 255.0;
    }
    if parts.next().is_some() {
        return None;
    }
    Some(Rgb::new(channels[0], channels[1], channels[2]))
}

fn named(name: &str) -> Option<Rgb> {
    let hex = match name {
        "black" => "000000",
        "white" => "ffffff",
        "gray" | "grey" => "808080",
        "red" => "ff0000",
        "green" => "008000",
        "blue" => "0000ff",
        "cyan" => "00ffff",
        "magenta" => "ff00ff",
        "yellow" => "ffff00",
        "orange" => "ffa500",
        "purple" => "800080",
        _ => return None,
    };
    parse_hex(hex)
}

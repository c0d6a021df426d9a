//! Named 8-bit sRGB colors used across the scene and overlay.

pub type Rgba8 = [u8; 4];

pub const RAYWHITE: Rgba8 = [245, 245, 245, 255];
pub const WHITE: Rgba8 = [255, 255, 255, 255];
pub const DARKGRAY: Rgba8 = [80, 80, 80, 255];
pub const GREEN: Rgba8 = [0, 228, 48, 255];
pub const LIME: Rgba8 = [0, 158, 47, 255];
pub const YELLOW: Rgba8 = [253, 249, 0, 255];
pub const ORANGE: Rgba8 = [255, 161, 0, 255];
pub const RED: Rgba8 = [230, 41, 55, 255];
pub const BLUE: Rgba8 = [0, 121, 241, 255];

/// Grid line shades.
pub const GRID_CENTER: [f32; 4] = [0.5, 0.5, 0.5, 1.0];
pub const GRID_LINE: [f32; 4] = [0.75, 0.75, 0.75, 1.0];

/// Normalise to 0..1 without changing the transfer curve.
pub fn normalized(c: Rgba8) -> [f32; 4] {
    c.map(|v| v as f32 / 255.0)
}

/// Decode the sRGB channels to linear for an sRGB render target; alpha is
/// left linear.
pub fn linear(c: Rgba8) -> [f32; 4] {
    let [r, g, b, a] = normalized(c);
    [srgb_to_linear(r), srgb_to_linear(g), srgb_to_linear(b), a]
}

pub fn linear_f32(c: [f32; 4]) -> [f32; 4] {
    [
        srgb_to_linear(c[0]),
        srgb_to_linear(c[1]),
        srgb_to_linear(c[2]),
        c[3],
    ]
}

pub fn with_alpha(mut c: [f32; 4], alpha: f32) -> [f32; 4] {
    c[3] = alpha;
    c
}

fn srgb_to_linear(v: f32) -> f32 {
    if v <= 0.04045 {
        v / 12.92
    } else {
        ((v + 0.055) / 1.055).powf(2.4)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn linear_keeps_endpoints_and_alpha() {
        assert_eq!(linear(WHITE), [1.0, 1.0, 1.0, 1.0]);
        assert_eq!(linear([0, 0, 0, 128])[3], 128.0 / 255.0);
        let mid = linear([128, 128, 128, 255])[0];
        assert!(mid > 0.2 && mid < 0.23);
    }
}

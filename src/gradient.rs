//! Gradient/shading service: turns a CSS gradient into a PDF Shading
//! dictionary (`ShadingType 2`, axial). Grounded on the style resolver's
//! `Color` type (`src/style.rs`); the PDF builder registers the produced
//! [`Shading`] as a resource the same way it registers fonts/images.

use crate::style::Color;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GradientStop {
    /// Position along the gradient axis, in `[0, 1]`.
    pub offset: f32,
    pub color: Color,
}

#[derive(Debug, Clone)]
pub struct LinearGradient {
    /// Angle in degrees, CSS convention (0 = to top, 90 = to right).
    pub angle_deg: f32,
    pub stops: Vec<GradientStop>,
}

/// An axial (`ShadingType 2`) PDF shading ready for resource registration.
#[derive(Debug, Clone)]
pub struct Shading {
    pub x0: f32,
    pub y0: f32,
    pub x1: f32,
    pub y1: f32,
    /// Two-stop simplification: PDF axial shadings interpolate between
    /// exactly `/C0`/`/C1`; gradients with more than two CSS stops are
    /// approximated by their first and last stop (documented limitation —
    /// full multi-stop support needs a stitching function, which is out of
    /// scope for this engine's pragmatic CSS subset).
    pub c0: [f32; 3],
    pub c1: [f32; 3],
    pub extend_start: bool,
    pub extend_end: bool,
}

/// Converts a `linear-gradient(...)` into PDF shading coordinates spanning
/// `box_width`/`box_height` (in points, box-local origin at top-left).
pub fn linear_gradient_to_shading(gradient: &LinearGradient, box_width: f32, box_height: f32) -> Shading {
    let (x0, y0, x1, y1) = axis_endpoints(gradient.angle_deg, box_width, box_height);
    let first = gradient.stops.first().copied().unwrap_or(GradientStop { offset: 0.0, color: Color::BLACK });
    let last = gradient.stops.last().copied().unwrap_or(first);
    Shading {
        x0,
        y0,
        x1,
        y1,
        c0: [first.color.r, first.color.g, first.color.b],
        c1: [last.color.r, last.color.g, last.color.b],
        extend_start: true,
        extend_end: true,
    }
}

/// Resolves the gradient axis endpoints in box-local, Y-down pixel space,
/// for the CSS `to right`/`to bottom`/angle forms. `to right` is angle 90,
/// `to bottom` is angle 180, matching CSS's "0 = to top" convention.
fn axis_endpoints(angle_deg: f32, width: f32, height: f32) -> (f32, f32, f32, f32) {
    let theta = angle_deg.to_radians();
    let dx = theta.sin();
    let dy = -theta.cos();
    let cx = width / 2.0;
    let cy = height / 2.0;
    // Project the box's half-diagonal onto the gradient direction so the
    // line spans corner-to-corner along that axis, matching CSS gradient
    // geometry for the common axis-aligned cases (0/90/180/270).
    let half_len = (width.abs() * dx.abs() + height.abs() * dy.abs()) / 2.0;
    (cx - dx * half_len, cy - dy * half_len, cx + dx * half_len, cy + dy * half_len)
}

/// CSS keyword -> angle-degrees mapping for the directional gradient forms.
pub fn angle_from_css_direction(direction: &str) -> f32 {
    match direction.trim() {
        "to top" => 0.0,
        "to right" => 90.0,
        "to bottom" => 180.0,
        "to left" => 270.0,
        "to top right" | "to right top" => 45.0,
        "to bottom right" | "to right bottom" => 135.0,
        "to bottom left" | "to left bottom" => 225.0,
        "to top left" | "to left top" => 315.0,
        other => other.trim_end_matches("deg").parse().unwrap_or(180.0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn to_right_produces_horizontal_axis() {
        let gradient = LinearGradient {
            angle_deg: angle_from_css_direction("to right"),
            stops: vec![
                GradientStop { offset: 0.0, color: Color { r: 1.0, g: 0.0, b: 0.0, a: 1.0 } },
                GradientStop { offset: 1.0, color: Color { r: 1.0, g: 1.0, b: 0.0, a: 1.0 } },
            ],
        };
        let shading = linear_gradient_to_shading(&gradient, 200.0, 100.0);
        assert!((shading.y1 - shading.y0).abs() < 1e-3);
        assert!((shading.x1 - shading.x0 - 200.0).abs() < 1e-3);
        assert_eq!(shading.c0, [1.0, 0.0, 0.0]);
        assert_eq!(shading.c1, [1.0, 1.0, 0.0]);
        assert!(shading.extend_start && shading.extend_end);
    }

    #[test]
    fn angle_keywords_resolve_correctly() {
        assert_eq!(angle_from_css_direction("to bottom"), 180.0);
        assert_eq!(angle_from_css_direction("45deg"), 45.0);
    }
}

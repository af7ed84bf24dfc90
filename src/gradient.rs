use crate::config::GradientStop;

/// Parse a `#rrggbb` color. Accepts the leading `#` as optional.
pub fn parse_hex(hex: &str) -> Option<[u8; 3]> {
    let hex = hex.trim().strip_prefix('#').unwrap_or(hex.trim());
    if hex.len() != 6 {
        return None;
    }
    let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
    let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
    let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
    Some([r, g, b])
}

pub fn format_hex(color: [u8; 3]) -> String {
    format!("#{:02x}{:02x}{:02x}", color[0], color[1], color[2])
}

#[inline]
fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Precomputed projection of pixel coordinates onto the gradient axis.
///
/// Angle convention: 0° runs left->right, 90° bottom->top (screen-space y
/// grows down, hence the negated sin). The projection of the sampled
/// rectangle is linear, so its extremes sit at the corners; those bounds
/// rescale every pixel's projection into [0, 1] without a second pass
/// over the image.
pub struct GradientAxis {
    dir_x: f32,
    dir_y: f32,
    inv_w: f32,
    inv_h: f32,
    min_proj: f32,
    inv_range: f32,
}

impl GradientAxis {
    pub fn new(width: usize, height: usize, angle_deg: f32) -> Self {
        let a = angle_deg.to_radians();
        let dir_x = a.cos();
        let dir_y = -a.sin();

        let inv_w = 1.0 / width as f32;
        let inv_h = 1.0 / height as f32;

        // Centered coordinate extents of the pixel grid: first sample at
        // -0.5, last at (n-1)/n - 0.5.
        let xs = [-0.5, (width - 1) as f32 * inv_w - 0.5];
        let ys = [-0.5, (height - 1) as f32 * inv_h - 0.5];

        let mut min_proj = f32::INFINITY;
        let mut max_proj = f32::NEG_INFINITY;
        for x in xs {
            for y in ys {
                let p = x * dir_x + y * dir_y;
                min_proj = min_proj.min(p);
                max_proj = max_proj.max(p);
            }
        }

        let range = max_proj - min_proj;
        let inv_range = if range > 1e-8 { 1.0 / range } else { 0.0 };

        Self {
            dir_x,
            dir_y,
            inv_w,
            inv_h,
            min_proj,
            inv_range,
        }
    }

    /// Gradient parameter in [0, 1] for the given pixel.
    #[inline]
    pub fn t(&self, px: usize, py: usize) -> f32 {
        let x = px as f32 * self.inv_w - 0.5;
        let y = py as f32 * self.inv_h - 0.5;
        let proj = x * self.dir_x + y * self.dir_y;
        (proj - self.min_proj) * self.inv_range
    }
}

/// Interpolated (rgb, opacity) at `t`, both in [0, 1] floats.
///
/// Assumes `stops` is sorted by position (the GradientConfig invariant)
/// and non-empty. `t` outside the stop range clamps to the endpoint stop;
/// stops sharing a position resolve to the later one in list order.
pub fn gradient_color(stops: &[GradientStop], t: f32) -> ([f32; 3], f32) {
    let t = t.clamp(0.0, 1.0);

    // Rightmost insertion point: left bracket is the last stop with
    // position <= t, so duplicate positions fall through to the later stop.
    let idx = stops.partition_point(|s| s.position <= t);
    let last = stops.len() - 1;
    let left = &stops[idx.saturating_sub(1)];
    let right = &stops[idx.min(last)];

    let span = right.position - left.position;
    let factor = if span > 0.0 { (t - left.position) / span } else { 0.0 };

    let rgb = [
        lerp(left.color[0] as f32 / 255.0, right.color[0] as f32 / 255.0, factor),
        lerp(left.color[1] as f32 / 255.0, right.color[1] as f32 / 255.0, factor),
        lerp(left.color[2] as f32 / 255.0, right.color[2] as f32 / 255.0, factor),
    ];
    let opacity = lerp(left.opacity, right.opacity, factor);

    (rgb, opacity)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GradientConfig;

    fn stop(position: f32, color: [u8; 3], opacity: f32) -> GradientStop {
        GradientStop { position, color, opacity }
    }

    #[test]
    fn parses_and_formats_hex() {
        assert_eq!(parse_hex("#1a2e45"), Some([0x1a, 0x2e, 0x45]));
        assert_eq!(parse_hex("caf0f8"), Some([0xca, 0xf0, 0xf8]));
        assert_eq!(parse_hex("#12345"), None);
        assert_eq!(parse_hex("#zzzzzz"), None);
        assert_eq!(format_hex([0x00, 0x08, 0x14]), "#000814");
    }

    #[test]
    fn endpoints_return_endpoint_stops() {
        let gradient = GradientConfig::default();
        let stops = gradient.stops();

        let (rgb0, a0) = gradient_color(stops, 0.0);
        assert_eq!(rgb0, [0.0, 0x08 as f32 / 255.0, 0x14 as f32 / 255.0]);
        assert_eq!(a0, 1.0);

        let (rgb1, _) = gradient_color(stops, 1.0);
        assert_eq!(
            rgb1,
            [0xca as f32 / 255.0, 0xf0 as f32 / 255.0, 0xf8 as f32 / 255.0]
        );
    }

    #[test]
    fn t_outside_range_clamps_to_endpoints() {
        let stops = [stop(0.2, [10, 10, 10], 0.5), stop(0.8, [200, 200, 200], 1.0)];
        assert_eq!(gradient_color(&stops, 0.0), gradient_color(&stops, 0.2));
        assert_eq!(gradient_color(&stops, 1.0), gradient_color(&stops, 0.8));
    }

    #[test]
    fn interpolates_midway_between_stops() {
        let stops = [stop(0.0, [0, 0, 0], 0.0), stop(1.0, [255, 255, 255], 1.0)];
        let (rgb, a) = gradient_color(&stops, 0.5);
        for c in rgb {
            assert!((c - 0.5).abs() < 1e-6);
        }
        assert!((a - 0.5).abs() < 1e-6);
    }

    #[test]
    fn later_stop_wins_at_duplicate_position() {
        let stops = [
            stop(0.0, [0, 0, 0], 1.0),
            stop(0.5, [10, 10, 10], 1.0),
            stop(0.5, [240, 240, 240], 1.0),
            stop(1.0, [255, 255, 255], 1.0),
        ];
        let (rgb, _) = gradient_color(&stops, 0.5);
        assert_eq!(rgb[0], 240.0 / 255.0);
    }

    #[test]
    fn exact_stop_position_returns_stop_values() {
        let stops = [
            stop(0.0, [0, 0, 0], 1.0),
            stop(0.3, [30, 60, 90], 0.7),
            stop(1.0, [255, 255, 255], 1.0),
        ];
        let (rgb, a) = gradient_color(&stops, 0.3);
        assert_eq!(rgb, [30.0 / 255.0, 60.0 / 255.0, 90.0 / 255.0]);
        assert_eq!(a, 0.7);
    }

    #[test]
    fn axis_spans_zero_to_one_left_to_right() {
        let axis = GradientAxis::new(64, 32, 0.0);
        assert!((axis.t(0, 0) - 0.0).abs() < 1e-6);
        assert!((axis.t(63, 0) - 1.0).abs() < 1e-6);
        // A horizontal axis ignores the row.
        assert!((axis.t(32, 0) - axis.t(32, 31)).abs() < 1e-6);
    }

    #[test]
    fn axis_at_90_degrees_runs_bottom_to_top() {
        let axis = GradientAxis::new(32, 64, 90.0);
        assert!(axis.t(0, 63) < axis.t(0, 0));
        assert!((axis.t(0, 63) - 0.0).abs() < 1e-5);
        assert!((axis.t(0, 0) - 1.0).abs() < 1e-5);
    }
}

use rayon::prelude::*;

use crate::config::ProjectConfig;
use crate::gradient::{GradientAxis, gradient_color};
use crate::grid::Grid;
use crate::lighting::brightness;
use crate::{CancelFlag, Canceled};

#[inline]
fn to_u8(v: f32) -> u8 {
    (v.clamp(0.0, 1.0) * 255.0).round() as u8
}

/// Compose the final RGBA image from the heightmap's shade and the
/// gradient. Per pixel: gradient color at the angle-projected t, scaled by
/// the brightness factor, with the stop opacity applied as a blend weight
/// against an opaque black background. Output alpha is always 255.
pub fn compose_image(
    config: &ProjectConfig,
    shade: &Grid<f32>,
    cancel: &CancelFlag,
) -> Result<Vec<u8>, Canceled> {
    let w = shade.w;
    let h = shade.h;
    let axis = GradientAxis::new(w, h, config.gradient.angle_deg);
    let stops = config.gradient.stops();
    let intensity = config.lighting.intensity;

    let mut rgba = vec![0u8; w * h * 4];
    rgba.par_chunks_mut(w * 4)
        .enumerate()
        .try_for_each(|(y, row)| {
            if cancel.is_canceled() {
                return Err(Canceled);
            }
            for x in 0..w {
                let ([r, g, b], opacity) = gradient_color(stops, axis.t(x, y));
                let factor = brightness(shade.get(x, y), intensity) * opacity;
                let out = &mut row[x * 4..x * 4 + 4];
                out[0] = to_u8(r * factor);
                out[1] = to_u8(g * factor);
                out[2] = to_u8(b * factor);
                out[3] = 255;
            }
            Ok(())
        })?;

    Ok(rgba)
}

/// Diagnostic: a [0, 1] field as grayscale RGBA.
pub fn render_grayscale(map: &Grid<f32>) -> Vec<u8> {
    let mut rgba = vec![0u8; map.w * map.h * 4];
    for (i, &v) in map.data.iter().enumerate() {
        let g = to_u8(v);
        rgba[i * 4..i * 4 + 4].copy_from_slice(&[g, g, g, 255]);
    }
    rgba
}

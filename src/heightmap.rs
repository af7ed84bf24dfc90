use rayon::prelude::*;

use crate::config::{LayerKind, NoiseLayerConfig, ProjectConfig};
use crate::grid::Grid;
use crate::noise::{evaluate_layer, warp_coords};
use crate::{CancelFlag, Canceled};

/// Per-category preview fields, each independently normalized to [0, 1].
pub struct LayerMaps {
    pub base: Grid<f32>,
    pub detail: Grid<f32>,
    pub combined: Grid<f32>,
}

#[inline]
fn is_height_layer(layer: &NoiseLayerConfig) -> bool {
    layer.enabled && matches!(layer.kind, LayerKind::Base | LayerKind::Detail)
}

/// Contrast exponent for the final heightmap: the first enabled BASE
/// layer's height_power. DETAIL/WARP height_power values are carried in
/// the config but have no effect here.
fn shaping_power(config: &ProjectConfig) -> f32 {
    config
        .noise_layers
        .iter()
        .find(|l| l.enabled && l.kind == LayerKind::Base)
        .map(|l| l.height_power)
        .unwrap_or(1.0)
}

/// Min-max normalize a field into [0, 1] in place. A constant field (all
/// layers disabled, or a single flat layer) becomes constant 0.0 rather
/// than dividing by zero.
fn normalize(field: &mut Grid<f32>) {
    let min = field.data.iter().cloned().fold(f32::INFINITY, f32::min);
    let max = field.data.iter().cloned().fold(f32::NEG_INFINITY, f32::max);

    if max - min <= 1e-8 {
        field.data.fill(0.0);
        return;
    }

    let inv_range = 1.0 / (max - min);
    for v in &mut field.data {
        *v = (*v - min) * inv_range;
    }
}

/// Build the normalized heightmap for one render.
///
/// Every pixel maps to normalized coordinates (px/width, py/height), so
/// the same config produces the same pattern at preview and export sizes,
/// only sampled more densely. Coordinates pass through the warp stage,
/// then all enabled BASE/DETAIL layers are summed with their amplitudes,
/// the raw field is min-max normalized over the full image, and the BASE
/// layer's height_power is applied as the global contrast exponent.
///
/// The cancellation flag is polled once per scanline; a canceled build
/// returns `Err(Canceled)` without exposing partial data.
pub fn build_heightmap(
    config: &ProjectConfig,
    width: usize,
    height: usize,
    cancel: &CancelFlag,
) -> Result<Grid<f32>, Canceled> {
    let mut field = Grid::<f32>::new(width, height);
    let layers = &config.noise_layers;

    field
        .data
        .par_chunks_mut(width)
        .enumerate()
        .try_for_each(|(py, row)| {
            if cancel.is_canceled() {
                return Err(Canceled);
            }
            let y = py as f32 / height as f32;
            for (px, out) in row.iter_mut().enumerate() {
                let x = px as f32 / width as f32;
                let (wx, wy) = warp_coords(layers, x, y);
                let mut sum = 0.0;
                for layer in layers.iter().filter(|l| is_height_layer(l)) {
                    sum += evaluate_layer(layer, wx, wy) * layer.amplitude;
                }
                *out = sum;
            }
            Ok(())
        })?;

    normalize(&mut field);

    let power = shaping_power(config);
    if power != 1.0 {
        for v in &mut field.data {
            *v = v.powf(power);
        }
    }

    Ok(field)
}

/// Build the diagnostic per-category maps (BASE sum, DETAIL sum, and the
/// combined field), each normalized on its own. Used for layer previews
/// only; no height_power shaping is applied.
pub fn build_layer_maps(
    config: &ProjectConfig,
    width: usize,
    height: usize,
    cancel: &CancelFlag,
) -> Result<LayerMaps, Canceled> {
    let layers = &config.noise_layers;
    let mut base = Grid::<f32>::new(width, height);
    let mut detail = Grid::<f32>::new(width, height);
    let mut combined = Grid::<f32>::new(width, height);

    base.data
        .par_chunks_mut(width)
        .zip(detail.data.par_chunks_mut(width))
        .zip(combined.data.par_chunks_mut(width))
        .enumerate()
        .try_for_each(|(py, ((base_row, detail_row), combined_row))| {
            if cancel.is_canceled() {
                return Err(Canceled);
            }
            let y = py as f32 / height as f32;
            for px in 0..width {
                let x = px as f32 / width as f32;
                let (wx, wy) = warp_coords(layers, x, y);
                let mut base_sum = 0.0;
                let mut detail_sum = 0.0;
                for layer in layers.iter().filter(|l| is_height_layer(l)) {
                    let v = evaluate_layer(layer, wx, wy) * layer.amplitude;
                    match layer.kind {
                        LayerKind::Base => base_sum += v,
                        LayerKind::Detail => detail_sum += v,
                        LayerKind::Warp => {}
                    }
                }
                base_row[px] = base_sum;
                detail_row[px] = detail_sum;
                combined_row[px] = base_sum + detail_sum;
            }
            Ok(())
        })?;

    normalize(&mut base);
    normalize(&mut detail);
    normalize(&mut combined);

    Ok(LayerMaps { base, detail, combined })
}

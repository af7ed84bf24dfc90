use rayon::prelude::*;

use crate::config::LightingConfig;
use crate::grid::Grid;
use crate::{CancelFlag, Canceled};

/// Minimum brightness factor. Keeps unlit slopes from going fully black so
/// the gradient color stays visible everywhere.
pub const BRIGHTNESS_FLOOR: f32 = 0.4;

/// Directional light vector from azimuth/elevation, unit length.
/// Azimuth 0° lights from +x, 90° from +y; elevation 90° is overhead.
pub fn light_vector(config: &LightingConfig) -> [f32; 3] {
    let az = config.azimuth_deg.to_radians();
    let el = config.elevation_deg.to_radians();

    let lx = el.cos() * az.cos();
    let ly = el.cos() * az.sin();
    let lz = el.sin();

    let len = (lx * lx + ly * ly + lz * lz).sqrt().max(1e-8);
    [lx / len, ly / len, lz / len]
}

/// Unit surface normal at one pixel, from edge-clamped central
/// differences. Border pixels reuse their own value for the missing
/// neighbor (edge padding), so every pixel gets a valid difference pair.
/// The epsilon keeps perfectly flat regions from dividing by zero; those
/// resolve to the unit-z normal.
#[inline]
pub fn surface_normal(height: &Grid<f32>, x: usize, y: usize) -> [f32; 3] {
    let xm = x.saturating_sub(1);
    let xp = (x + 1).min(height.w - 1);
    let ym = y.saturating_sub(1);
    let yp = (y + 1).min(height.h - 1);

    let dx = height.get(xp, y) - height.get(xm, y);
    let dy = height.get(x, yp) - height.get(x, ym);

    let nx = -dx;
    let ny = -dy;
    let nz = 1.0f32;

    let len = (nx * nx + ny * ny + nz * nz).sqrt() + 1e-8;
    [nx / len, ny / len, nz / len]
}

/// Per-pixel diffuse shade in [0, 1]: clamped dot of surface normal and
/// light direction. Cancellation is polled per scanline.
pub fn compute_shade(
    height: &Grid<f32>,
    lighting: &LightingConfig,
    cancel: &CancelFlag,
) -> Result<Grid<f32>, Canceled> {
    let [lx, ly, lz] = light_vector(lighting);
    let mut shade = Grid::<f32>::new(height.w, height.h);
    let w = height.w;

    shade
        .data
        .par_chunks_mut(w)
        .enumerate()
        .try_for_each(|(y, row)| {
            if cancel.is_canceled() {
                return Err(Canceled);
            }
            for (x, out) in row.iter_mut().enumerate() {
                let [nx, ny, nz] = surface_normal(height, x, y);
                let dot = nx * lx + ny * ly + nz * lz;
                *out = dot.clamp(0.0, 1.0);
            }
            Ok(())
        })?;

    Ok(shade)
}

/// Brightness factor applied to the gradient color downstream.
#[inline]
pub fn brightness(shade: f32, intensity: f32) -> f32 {
    BRIGHTNESS_FLOOR + (1.0 - BRIGHTNESS_FLOOR) * shade * intensity
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CancelFlag;
    use crate::config::{LightingConfig, ProjectConfig};
    use crate::heightmap::build_heightmap;

    #[test]
    fn light_vector_is_unit_length() {
        for az in [0.0, 45.0, 120.0, 300.0] {
            for el in [0.0, 30.0, 60.0, 90.0] {
                let [x, y, z] = light_vector(&LightingConfig {
                    azimuth_deg: az,
                    elevation_deg: el,
                    intensity: 1.0,
                });
                let len = (x * x + y * y + z * z).sqrt();
                assert!((len - 1.0).abs() < 1e-4);
            }
        }
    }

    #[test]
    fn normals_are_unit_length() {
        let config = ProjectConfig::default();
        let map = build_heightmap(&config, 64, 36, &CancelFlag::new()).unwrap();
        for y in 0..map.h {
            for x in 0..map.w {
                let [nx, ny, nz] = surface_normal(&map, x, y);
                let len = (nx * nx + ny * ny + nz * nz).sqrt();
                assert!((len - 1.0).abs() < 1e-4, "|n| = {len} at ({x}, {y})");
            }
        }
    }

    #[test]
    fn flat_map_shades_to_sin_elevation() {
        let flat = Grid::<f32>::new(16, 16);
        let lighting = LightingConfig {
            azimuth_deg: 45.0,
            elevation_deg: 60.0,
            intensity: 0.8,
        };
        let shade = compute_shade(&flat, &lighting, &CancelFlag::new()).unwrap();
        let expected = 60.0f32.to_radians().sin();
        for &s in &shade.data {
            assert!((s - expected).abs() < 1e-4, "shade {s} != {expected}");
        }
    }

    #[test]
    fn shade_stays_in_unit_range() {
        let config = ProjectConfig::default();
        let cancel = CancelFlag::new();
        let map = build_heightmap(&config, 96, 54, &cancel).unwrap();
        let shade = compute_shade(&map, &config.lighting, &cancel).unwrap();
        for &s in &shade.data {
            assert!((0.0..=1.0).contains(&s));
        }
    }

    #[test]
    fn brightness_never_goes_black() {
        assert_eq!(brightness(0.0, 1.0), BRIGHTNESS_FLOOR);
        assert_eq!(brightness(1.0, 0.0), BRIGHTNESS_FLOOR);
        assert!((brightness(1.0, 1.0) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn canceled_shade_returns_canceled() {
        let flat = Grid::<f32>::new(64, 64);
        let cancel = CancelFlag::new();
        cancel.cancel();
        assert!(compute_shade(&flat, &LightingConfig::default(), &cancel).is_err());
    }
}

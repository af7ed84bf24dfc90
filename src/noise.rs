use crate::config::{LayerKind, NoiseLayerConfig};
use crate::rng::hash2;

/// Decorrelation shift between the x- and y-displacement fields of a warp
/// layer that share one seed and scale.
const WARP_OFFSET: f32 = 1000.0;

#[inline]
fn smootherstep(t: f32) -> f32 {
    t * t * t * (t * (t * 6.0 - 15.0) + 10.0)
}

#[inline]
fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// 2D gradient noise (Perlin-style). Better isotropy than value noise --
/// no grid-aligned diagonal artifacts. Output is in [-1, 1] and bit-exact
/// for identical (x, y, seed) regardless of calling thread.
#[inline]
pub fn noise2d(x: f32, y: f32, seed: u32) -> f32 {
    let ix = x.floor() as i32;
    let iy = y.floor() as i32;
    let fx = x - ix as f32;
    let fy = y - iy as f32;
    let sx = smootherstep(fx);
    let sy = smootherstep(fy);

    #[inline]
    fn grad(hash: u32, dx: f32, dy: f32) -> f32 {
        // 16 evenly-spaced unit gradients (every 22.5°).
        // Eliminates the directional bias of 4-gradient Perlin.
        match hash & 15 {
            0  =>  dx,
            1  =>  0.924 * dx + 0.383 * dy,
            2  =>  0.707 * (dx + dy),
            3  =>  0.383 * dx + 0.924 * dy,
            4  =>  dy,
            5  => -0.383 * dx + 0.924 * dy,
            6  =>  0.707 * (-dx + dy),
            7  => -0.924 * dx + 0.383 * dy,
            8  => -dx,
            9  => -0.924 * dx - 0.383 * dy,
            10 =>  0.707 * (-dx - dy),
            11 => -0.383 * dx - 0.924 * dy,
            12 => -dy,
            13 =>  0.383 * dx - 0.924 * dy,
            14 =>  0.707 * (dx - dy),
            _  =>  0.924 * dx - 0.383 * dy,
        }
    }

    let v00 = grad(hash2(ix, iy, seed), fx, fy);
    let v10 = grad(hash2(ix + 1, iy, seed), fx - 1.0, fy);
    let v01 = grad(hash2(ix, iy + 1, seed), fx, fy - 1.0);
    let v11 = grad(hash2(ix + 1, iy + 1, seed), fx - 1.0, fy - 1.0);

    let a = lerp(v00, v10, sx);
    let b = lerp(v01, v11, sx);
    // Scale to approximately [-1, 1] range (raw range is ~[-0.7, 0.7])
    lerp(a, b, sy) * 1.414
}

/// Multi-octave fractal sum for one noise layer at a single coordinate.
///
/// Octave `i` samples at `(x * scale_x, y * scale_y) * lacunarity^i` with
/// amplitude `persistence^i`, always under the layer's own seed. BASE and
/// DETAIL layers shape each octave with the ridge transform
/// `(1 - |n|)^ridge_power`; WARP layers accumulate the raw sample (plain
/// FBM). The sum is NOT divided by the total amplitude -- the heightmap
/// compositor normalizes the combined field once, over the whole image.
///
/// Disabled layers contribute 0 without a single noise call.
pub fn evaluate_layer(layer: &NoiseLayerConfig, x: f32, y: f32) -> f32 {
    if !layer.enabled {
        return 0.0;
    }

    let ridged = matches!(layer.kind, LayerKind::Base | LayerKind::Detail);
    let mut sum = 0.0;
    let mut amp = 1.0_f32;
    let mut freq = 1.0_f32;

    for _ in 0..layer.octaves {
        let n = noise2d(
            x * layer.scale_x * freq,
            y * layer.scale_y * freq,
            layer.seed,
        );
        let v = if ridged {
            // (1 - |n|) stays in [0, 1] for n in [-1, 1]; the max(0.0)
            // guards the range-correction overshoot of noise2d.
            (1.0 - n.abs()).max(0.0).powf(layer.ridge_power)
        } else {
            n
        };
        sum += v * amp;
        amp *= layer.persistence;
        freq *= layer.lacunarity;
    }

    sum
}

/// Displace a sample coordinate through every enabled WARP layer, in
/// configured order, each warping the coordinates produced by the previous
/// one. With no enabled WARP layer this is the identity.
pub fn warp_coords(layers: &[NoiseLayerConfig], mut x: f32, mut y: f32) -> (f32, f32) {
    for layer in layers {
        if !layer.enabled || layer.kind != LayerKind::Warp {
            continue;
        }
        let wx = evaluate_layer(layer, x, y);
        let wy = evaluate_layer(layer, x + WARP_OFFSET, y + WARP_OFFSET);
        x += wx * layer.amplitude;
        y += wy * layer.amplitude;
    }
    (x, y)
}

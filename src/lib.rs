pub mod config;
pub mod gradient;
pub mod grid;
pub mod heightmap;
pub mod io;
pub mod lighting;
pub mod noise;
pub mod render;
pub mod rng;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use config::{ConfigError, ProjectConfig};

/// Cooperative cancellation handle shared between a render call and its
/// caller. Cloning hands out another view of the same flag.
#[derive(Clone, Debug, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_canceled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Marker returned by pipeline stages when the cancel flag was observed.
#[derive(Clone, Copy, Debug)]
pub struct Canceled;

pub struct Timing {
    pub name: &'static str,
    pub ms: f64,
}

/// Grayscale RGBA previews of the individual noise layer categories,
/// rendered at their own (typically smaller) resolution.
pub struct NoisePreviews {
    pub width: usize,
    pub height: usize,
    pub base: Vec<u8>,
    pub detail: Vec<u8>,
    pub combined: Vec<u8>,
}

pub struct RenderOutput {
    pub width: usize,
    pub height: usize,
    pub rgba: Vec<u8>,
    pub previews: Option<NoisePreviews>,
    pub timings: Vec<Timing>,
}

/// Either a finished image or a cooperative cancellation. A canceled
/// render carries no output at all -- partial pixels are never exposed.
pub enum RenderOutcome {
    Complete(RenderOutput),
    Canceled,
}

/// Render the project at the requested resolution.
///
/// Pure function of its inputs: no hidden state, no I/O, byte-identical
/// output for identical config and dimensions. The config is validated
/// before any pixel work; the cancel flag is polled at scanline
/// granularity throughout.
pub fn render(
    config: &ProjectConfig,
    width: usize,
    height: usize,
    cancel: &CancelFlag,
) -> Result<RenderOutcome, ConfigError> {
    config.validate()?;
    Ok(match run_pipeline(config, width, height, None, cancel) {
        Ok(output) => RenderOutcome::Complete(output),
        Err(Canceled) => RenderOutcome::Canceled,
    })
}

/// Like [`render`], additionally producing grayscale base/detail/combined
/// layer previews at the given preview resolution.
pub fn render_with_previews(
    config: &ProjectConfig,
    width: usize,
    height: usize,
    preview_width: usize,
    preview_height: usize,
    cancel: &CancelFlag,
) -> Result<RenderOutcome, ConfigError> {
    config.validate()?;
    let previews = Some((preview_width, preview_height));
    Ok(match run_pipeline(config, width, height, previews, cancel) {
        Ok(output) => RenderOutcome::Complete(output),
        Err(Canceled) => RenderOutcome::Canceled,
    })
}

fn run_pipeline(
    config: &ProjectConfig,
    width: usize,
    height: usize,
    previews: Option<(usize, usize)>,
    cancel: &CancelFlag,
) -> Result<RenderOutput, Canceled> {
    let mut timings = Vec::new();
    let total_start = Instant::now();

    let t = Instant::now();
    let height_map = heightmap::build_heightmap(config, width, height, cancel)?;
    timings.push(Timing {
        name: "heightmap",
        ms: t.elapsed().as_secs_f64() * 1000.0,
    });

    let t = Instant::now();
    let shade = lighting::compute_shade(&height_map, &config.lighting, cancel)?;
    timings.push(Timing {
        name: "shade",
        ms: t.elapsed().as_secs_f64() * 1000.0,
    });

    let t = Instant::now();
    let rgba = render::compose_image(config, &shade, cancel)?;
    timings.push(Timing {
        name: "compose",
        ms: t.elapsed().as_secs_f64() * 1000.0,
    });

    let previews = match previews {
        Some((pw, ph)) => {
            let t = Instant::now();
            let maps = heightmap::build_layer_maps(config, pw, ph, cancel)?;
            let previews = NoisePreviews {
                width: pw,
                height: ph,
                base: render::render_grayscale(&maps.base),
                detail: render::render_grayscale(&maps.detail),
                combined: render::render_grayscale(&maps.combined),
            };
            timings.push(Timing {
                name: "previews",
                ms: t.elapsed().as_secs_f64() * 1000.0,
            });
            Some(previews)
        }
        None => None,
    };

    timings.push(Timing {
        name: "TOTAL",
        ms: total_start.elapsed().as_secs_f64() * 1000.0,
    });

    Ok(RenderOutput {
        width,
        height,
        rgba,
        previews,
        timings,
    })
}

use std::path::PathBuf;

use dunegen::config::{ProjectConfig, RESOLUTION_PRESETS};
use dunegen::{CancelFlag, RenderOutcome};

/// "1920x1080", a preset name from RESOLUTION_PRESETS, or neither.
fn parse_size(arg: &str) -> Option<(usize, usize)> {
    if let Some((w, h)) = arg.split_once('x') {
        if let (Ok(w), Ok(h)) = (w.parse(), h.parse()) {
            return Some((w, h));
        }
    }
    RESOLUTION_PRESETS
        .iter()
        .find(|(label, _, _)| *label == arg)
        .map(|&(_, w, h)| (w, h))
}

fn main() {
    let args: Vec<String> = std::env::args().collect();

    let mut config = ProjectConfig::default();
    let mut size = (1920usize, 1080usize);
    let mut out_dir = PathBuf::from("artifacts");

    for arg in &args[1..] {
        if arg.ends_with(".json") {
            config = dunegen::io::load_project(arg).expect("failed to load project file");
        } else if let Some(parsed) = parse_size(arg) {
            size = parsed;
        } else {
            out_dir = PathBuf::from(arg);
        }
    }
    let (width, height) = size;

    std::fs::create_dir_all(&out_dir).expect("failed to create output directory");

    eprintln!(
        "Rendering {}x{} dune image ({} noise layers, gradient angle {}°)",
        width,
        height,
        config.noise_layers.len(),
        config.gradient.angle_deg
    );

    let cancel = CancelFlag::new();
    let outcome = dunegen::render_with_previews(
        &config,
        width,
        height,
        config.noise_preview_width,
        config.noise_preview_height,
        &cancel,
    )
    .expect("invalid project configuration");

    let output = match outcome {
        RenderOutcome::Complete(output) => output,
        RenderOutcome::Canceled => {
            eprintln!("render canceled");
            return;
        }
    };

    eprintln!("\nTimings:");
    for t in &output.timings {
        eprintln!("  {:20} {:8.1} ms", t.name, t.ms);
    }

    let save = |name: &str, rgba: &[u8], w: usize, h: usize| {
        let path = out_dir.join(name);
        image::save_buffer(&path, rgba, w as u32, h as u32, image::ColorType::Rgba8)
            .expect("failed to save image");
        eprintln!("Saved {}", path.display());
    };

    save("dune.png", &output.rgba, output.width, output.height);

    if let Some(previews) = &output.previews {
        save("base.png", &previews.base, previews.width, previews.height);
        save("detail.png", &previews.detail, previews.width, previews.height);
        save("combined.png", &previews.combined, previews.width, previews.height);
    }

    eprintln!("\nDone.");
}

use std::net::SocketAddr;

use axum::http::StatusCode;
use axum::{Json, Router, routing::post};
use base64::Engine;
use image::ImageEncoder;
use image::codecs::png::PngEncoder;
use serde::{Deserialize, Serialize};
use tower_http::services::ServeDir;

use dunegen::config::ProjectConfig;
use dunegen::{CancelFlag, RenderOutcome};

#[derive(Deserialize)]
struct RenderRequest {
    /// Full project configuration; omitted fields fall back to the
    /// default frost dune project.
    config: Option<ProjectConfig>,
    width: Option<usize>,
    height: Option<usize>,
    #[serde(default = "default_previews")]
    previews: bool,
}

fn default_previews() -> bool {
    true
}

#[derive(Serialize)]
struct RenderResponse {
    layers: Vec<Layer>,
    timings: Vec<TimingEntry>,
    width: usize,
    height: usize,
}

#[derive(Serialize)]
struct Layer {
    name: String,
    data_url: String,
}

#[derive(Serialize)]
struct TimingEntry {
    name: String,
    ms: f64,
}

fn encode_png(rgba: &[u8], w: usize, h: usize) -> String {
    let mut buf = Vec::new();
    let encoder = PngEncoder::new(&mut buf);
    encoder
        .write_image(rgba, w as u32, h as u32, image::ExtendedColorType::Rgba8)
        .expect("PNG encode failed");
    let b64 = base64::engine::general_purpose::STANDARD.encode(&buf);
    format!("data:image/png;base64,{}", b64)
}

async fn render_handler(
    Json(req): Json<RenderRequest>,
) -> Result<Json<RenderResponse>, (StatusCode, String)> {
    let config = req.config.unwrap_or_default();
    let width = req.width.unwrap_or(config.preview_width);
    let height = req.height.unwrap_or(config.preview_height);
    let previews = req.previews;

    let outcome = tokio::task::spawn_blocking(move || {
        let cancel = CancelFlag::new();
        let result = if previews {
            dunegen::render_with_previews(
                &config,
                width,
                height,
                config.noise_preview_width,
                config.noise_preview_height,
                &cancel,
            )
        } else {
            dunegen::render(&config, width, height, &cancel)
        };
        result
    })
    .await
    .expect("render task panicked");

    let output = match outcome {
        Ok(RenderOutcome::Complete(output)) => output,
        Ok(RenderOutcome::Canceled) => {
            return Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                "render canceled".to_string(),
            ));
        }
        Err(err) => return Err((StatusCode::UNPROCESSABLE_ENTITY, err.to_string())),
    };

    let mut layers = vec![Layer {
        name: "dune".into(),
        data_url: encode_png(&output.rgba, output.width, output.height),
    }];

    if let Some(previews) = &output.previews {
        for (name, rgba) in [
            ("base", &previews.base),
            ("detail", &previews.detail),
            ("combined", &previews.combined),
        ] {
            layers.push(Layer {
                name: name.into(),
                data_url: encode_png(rgba, previews.width, previews.height),
            });
        }
    }

    let timings = output
        .timings
        .iter()
        .map(|t| TimingEntry {
            name: t.name.to_string(),
            ms: t.ms,
        })
        .collect();

    Ok(Json(RenderResponse {
        layers,
        timings,
        width: output.width,
        height: output.height,
    }))
}

#[tokio::main]
async fn main() {
    let frontend = ServeDir::new("frontend");

    let app = Router::new()
        .route("/api/render", post(render_handler))
        .fallback_service(frontend);

    let addr = SocketAddr::from(([127, 0, 0, 1], 3000));
    eprintln!("dunegen server at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    axum::serve(listener, app).await.unwrap();
}

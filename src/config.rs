use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::gradient::{format_hex, parse_hex};

/// Role of a noise layer in the composite. BASE and DETAIL blend
/// additively into the heightmap; WARP displaces sample coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayerKind {
    Base,
    Detail,
    Warp,
}

/// One fractal noise layer -- every tunable the noise panel exposes.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct NoiseLayerConfig {
    #[serde(rename = "layer_type")]
    pub kind: LayerKind,
    pub enabled: bool,
    pub seed: u32,
    pub scale_x: f32,
    pub scale_y: f32,
    pub octaves: u32,
    pub persistence: f32,
    pub lacunarity: f32,
    pub ridge_power: f32,
    /// Global contrast exponent. Only honored on the first enabled BASE
    /// layer; on DETAIL and WARP layers the value is carried but unused.
    pub height_power: f32,
    pub amplitude: f32,
}

impl Default for NoiseLayerConfig {
    fn default() -> Self {
        Self {
            kind: LayerKind::Base,
            enabled: true,
            seed: 0,
            scale_x: 1.5,
            scale_y: 0.3,
            octaves: 5,
            persistence: 0.5,
            lacunarity: 2.0,
            ridge_power: 2.0,
            height_power: 1.7,
            amplitude: 1.0,
        }
    }
}

/// Anchored (position, color, opacity) triple of a gradient.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct GradientStop {
    pub position: f32,
    #[serde(with = "hex_color")]
    pub color: [u8; 3],
    pub opacity: f32,
}

mod hex_color {
    use serde::de::Error;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(color: &[u8; 3], ser: S) -> Result<S::Ok, S::Error> {
        ser.serialize_str(&super::format_hex(*color))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(de: D) -> Result<[u8; 3], D::Error> {
        let s = String::deserialize(de)?;
        super::parse_hex(&s).ok_or_else(|| D::Error::custom(format!("invalid hex color {s:?}")))
    }
}

/// Ordered color stops plus the gradient axis angle.
///
/// The stop list is kept sorted by position at all times: every mutation
/// re-sorts (stably, so stops sharing a position keep their list order and
/// the later one wins at the exact boundary), and deserialization sorts on
/// construction. The renderer can therefore bracket stops with a plain
/// binary search.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(from = "RawGradientConfig")]
pub struct GradientConfig {
    pub angle_deg: f32,
    stops: Vec<GradientStop>,
}

#[derive(Deserialize)]
struct RawGradientConfig {
    #[serde(default = "default_gradient_angle")]
    angle_deg: f32,
    #[serde(default)]
    stops: Vec<GradientStop>,
}

fn default_gradient_angle() -> f32 {
    20.0
}

impl From<RawGradientConfig> for GradientConfig {
    fn from(raw: RawGradientConfig) -> Self {
        GradientConfig::new(raw.angle_deg, raw.stops)
    }
}

impl GradientConfig {
    pub fn new(angle_deg: f32, stops: Vec<GradientStop>) -> Self {
        let mut gradient = Self { angle_deg, stops };
        gradient.sort_stops();
        gradient
    }

    pub fn stops(&self) -> &[GradientStop] {
        &self.stops
    }

    pub fn push_stop(&mut self, stop: GradientStop) {
        self.stops.push(stop);
        self.sort_stops();
    }

    /// Replace the stop at `index`. Returns false if the index is out of
    /// bounds.
    pub fn set_stop(&mut self, index: usize, stop: GradientStop) -> bool {
        match self.stops.get_mut(index) {
            Some(slot) => {
                *slot = stop;
                self.sort_stops();
                true
            }
            None => false,
        }
    }

    pub fn remove_stop(&mut self, index: usize) -> Option<GradientStop> {
        if index < self.stops.len() {
            Some(self.stops.remove(index))
        } else {
            None
        }
    }

    fn sort_stops(&mut self) {
        self.stops.sort_by(|a, b| a.position.total_cmp(&b.position));
    }
}

impl Default for GradientConfig {
    fn default() -> Self {
        Self::new(
            20.0,
            vec![
                GradientStop { position: 0.0, color: [0x00, 0x08, 0x14], opacity: 1.0 },
                GradientStop { position: 0.3, color: [0x0a, 0x16, 0x28], opacity: 1.0 },
                GradientStop { position: 0.6, color: [0x1a, 0x2e, 0x45], opacity: 1.0 },
                GradientStop { position: 1.0, color: [0xca, 0xf0, 0xf8], opacity: 1.0 },
            ],
        )
    }
}

/// Directional light parameters. Azimuth 0° lights from +x, 90° from +y
/// (screen-space y grows down); elevation 90° is straight overhead.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct LightingConfig {
    #[serde(rename = "light_azimuth_deg")]
    pub azimuth_deg: f32,
    #[serde(rename = "light_elevation_deg")]
    pub elevation_deg: f32,
    pub intensity: f32,
}

impl Default for LightingConfig {
    fn default() -> Self {
        Self {
            azimuth_deg: 45.0,
            elevation_deg: 60.0,
            intensity: 0.8,
        }
    }
}

/// Named color swatch collection. Carried in the project for the editing
/// surface; the renderer itself never reads it.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Palette {
    pub name: String,
    pub colors: Vec<String>,
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            name: "frost".into(),
            colors: vec![
                "#000814".into(),
                "#0a1628".into(),
                "#1a2e45".into(),
                "#caf0f8".into(),
                "#64ffda".into(),
                "#4ecdc4".into(),
            ],
        }
    }
}

/// Export/preview size presets (label, width, height).
pub const RESOLUTION_PRESETS: &[(&str, usize, usize)] = &[
    ("1080p", 1920, 1080),
    ("1440p", 2560, 1440),
    ("4k", 3840, 2160),
    ("portrait", 1080, 1920),
];

/// Everything one render needs, as a single serializable snapshot.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectConfig {
    pub palette: Palette,
    pub gradient: GradientConfig,
    pub noise_layers: Vec<NoiseLayerConfig>,
    pub lighting: LightingConfig,
    pub preview_width: usize,
    pub preview_height: usize,
    pub noise_preview_width: usize,
    pub noise_preview_height: usize,
    /// Base for per-layer seed derivation when building default projects.
    /// The renderer only ever consumes the resolved per-layer seeds.
    pub seed_global: u32,
}

/// Per-layer seed for a default project: seed_global + layer index.
#[inline]
pub fn derive_layer_seed(seed_global: u32, layer_index: u32) -> u32 {
    seed_global.wrapping_add(layer_index)
}

impl Default for ProjectConfig {
    fn default() -> Self {
        let seed_global = 42;
        let noise_layers = vec![
            NoiseLayerConfig {
                kind: LayerKind::Warp,
                seed: derive_layer_seed(seed_global, 0),
                scale_x: 0.2,
                scale_y: 0.05,
                octaves: 2,
                ridge_power: 1.0,
                height_power: 1.0,
                amplitude: 0.5,
                ..NoiseLayerConfig::default()
            },
            NoiseLayerConfig {
                kind: LayerKind::Base,
                seed: derive_layer_seed(seed_global, 1),
                ..NoiseLayerConfig::default()
            },
            NoiseLayerConfig {
                kind: LayerKind::Detail,
                seed: derive_layer_seed(seed_global, 2),
                scale_x: 6.0,
                scale_y: 2.0,
                octaves: 3,
                height_power: 1.3,
                amplitude: 0.4,
                ..NoiseLayerConfig::default()
            },
        ];

        Self {
            palette: Palette::default(),
            gradient: GradientConfig::default(),
            noise_layers,
            lighting: LightingConfig::default(),
            preview_width: 960,
            preview_height: 540,
            noise_preview_width: 480,
            noise_preview_height: 270,
            seed_global,
        }
    }
}

/// A configuration the renderer refuses to start on. Each variant names
/// the offending field so the caller can fix the input.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("gradient needs at least 2 stops, got {count}")]
    TooFewStops { count: usize },
    #[error("gradient stop {index} position {position} is outside [0, 1]")]
    StopPositionOutOfRange { index: usize, position: f32 },
    #[error("noise layer {layer} {axis} scale must be > 0, got {value}")]
    NonPositiveScale {
        layer: usize,
        axis: &'static str,
        value: f32,
    },
    #[error("noise layer {layer} octaves must be in 1..=8, got {octaves}")]
    OctavesOutOfRange { layer: usize, octaves: u32 },
    #[error("noise layer {layer} amplitude must be >= 0, got {value}")]
    NegativeAmplitude { layer: usize, value: f32 },
}

impl ProjectConfig {
    /// Check every constraint the renderer depends on. Runs before any
    /// pixel is computed; an invalid config never starts a render.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let stops = self.gradient.stops();
        if stops.len() < 2 {
            return Err(ConfigError::TooFewStops { count: stops.len() });
        }
        for (index, stop) in stops.iter().enumerate() {
            if !(0.0..=1.0).contains(&stop.position) {
                return Err(ConfigError::StopPositionOutOfRange {
                    index,
                    position: stop.position,
                });
            }
        }

        for (layer, cfg) in self.noise_layers.iter().enumerate() {
            if !(cfg.scale_x > 0.0) {
                return Err(ConfigError::NonPositiveScale {
                    layer,
                    axis: "x",
                    value: cfg.scale_x,
                });
            }
            if !(cfg.scale_y > 0.0) {
                return Err(ConfigError::NonPositiveScale {
                    layer,
                    axis: "y",
                    value: cfg.scale_y,
                });
            }
            if !(1..=8).contains(&cfg.octaves) {
                return Err(ConfigError::OctavesOutOfRange {
                    layer,
                    octaves: cfg.octaves,
                });
            }
            if !(cfg.amplitude >= 0.0) {
                return Err(ConfigError::NegativeAmplitude {
                    layer,
                    value: cfg.amplitude,
                });
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_project_is_valid() {
        assert_eq!(ProjectConfig::default().validate(), Ok(()));
    }

    #[test]
    fn default_layer_seeds_derive_from_global() {
        let config = ProjectConfig::default();
        for (i, layer) in config.noise_layers.iter().enumerate() {
            assert_eq!(layer.seed, config.seed_global + i as u32);
        }
    }

    #[test]
    fn too_few_stops_is_rejected() {
        let mut config = ProjectConfig::default();
        config.gradient = GradientConfig::new(
            0.0,
            vec![GradientStop { position: 0.0, color: [0, 0, 0], opacity: 1.0 }],
        );
        assert_eq!(config.validate(), Err(ConfigError::TooFewStops { count: 1 }));
    }

    #[test]
    fn stop_position_out_of_range_is_rejected() {
        let mut config = ProjectConfig::default();
        config.gradient.push_stop(GradientStop {
            position: 1.2,
            color: [1, 2, 3],
            opacity: 0.5,
        });
        assert_eq!(
            config.validate(),
            Err(ConfigError::StopPositionOutOfRange { index: 4, position: 1.2 })
        );
    }

    #[test]
    fn non_positive_scale_is_rejected() {
        let mut config = ProjectConfig::default();
        config.noise_layers[1].scale_y = 0.0;
        assert_eq!(
            config.validate(),
            Err(ConfigError::NonPositiveScale { layer: 1, axis: "y", value: 0.0 })
        );
    }

    #[test]
    fn octaves_out_of_range_is_rejected() {
        let mut config = ProjectConfig::default();
        config.noise_layers[0].octaves = 9;
        assert_eq!(
            config.validate(),
            Err(ConfigError::OctavesOutOfRange { layer: 0, octaves: 9 })
        );
    }

    #[test]
    fn negative_amplitude_is_rejected() {
        let mut config = ProjectConfig::default();
        config.noise_layers[2].amplitude = -0.1;
        assert_eq!(
            config.validate(),
            Err(ConfigError::NegativeAmplitude { layer: 2, value: -0.1 })
        );
    }

    #[test]
    fn stops_stay_sorted_through_mutation() {
        let mut gradient = GradientConfig::new(0.0, vec![]);
        gradient.push_stop(GradientStop { position: 0.8, color: [1, 1, 1], opacity: 1.0 });
        gradient.push_stop(GradientStop { position: 0.2, color: [2, 2, 2], opacity: 1.0 });
        gradient.push_stop(GradientStop { position: 0.5, color: [3, 3, 3], opacity: 1.0 });
        let positions: Vec<f32> = gradient.stops().iter().map(|s| s.position).collect();
        assert_eq!(positions, vec![0.2, 0.5, 0.8]);

        gradient.set_stop(0, GradientStop { position: 0.9, color: [2, 2, 2], opacity: 1.0 });
        let positions: Vec<f32> = gradient.stops().iter().map(|s| s.position).collect();
        assert_eq!(positions, vec![0.5, 0.8, 0.9]);

        let removed = gradient.remove_stop(1).unwrap();
        assert_eq!(removed.position, 0.8);
        assert!(gradient.remove_stop(5).is_none());
        let positions: Vec<f32> = gradient.stops().iter().map(|s| s.position).collect();
        assert_eq!(positions, vec![0.5, 0.9]);
    }

    #[test]
    fn unsorted_stops_are_sorted_on_deserialize() {
        let json = r##"{
            "angle_deg": 30.0,
            "stops": [
                {"position": 0.7, "color": "#ffffff", "opacity": 1.0},
                {"position": 0.1, "color": "#000000", "opacity": 0.5}
            ]
        }"##;
        let gradient: GradientConfig = serde_json::from_str(json).unwrap();
        assert_eq!(gradient.stops()[0].position, 0.1);
        assert_eq!(gradient.stops()[0].color, [0, 0, 0]);
        assert_eq!(gradient.stops()[1].position, 0.7);
    }

    #[test]
    fn project_round_trips_through_json() {
        let config = ProjectConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        // Original field naming survives serialization.
        assert!(json.contains("\"layer_type\":\"warp\""));
        assert!(json.contains("\"light_azimuth_deg\""));
        assert!(json.contains("\"#000814\""));

        let back: ProjectConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.noise_layers.len(), 3);
        assert_eq!(back.noise_layers[1].seed, 43);
        assert_eq!(back.gradient.stops().len(), 4);
        assert_eq!(back.seed_global, 42);
    }
}

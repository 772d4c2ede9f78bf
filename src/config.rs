//! Runtime configuration for the world.
//!
//! Every field carries a default so a partial (or missing) `assets/world.toml`
//! still yields a complete configuration.

use serde::{Deserialize, Serialize};

use crate::{error::WorldError, resources::load_string};

pub const CONFIG_FILE: &str = "world.toml";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct WorldConfig {
    /// Selects which pre-authored `text` nodes stay visible.
    pub language: String,
    pub assets: AssetOptions,
    pub camera: CameraOptions,
    pub bloom: BloomOptions,
    pub palette: PaletteOptions,
    pub timings: TimingOptions,
    pub performance: PerformanceOptions,
    pub parallax: ParallaxOptions,
    pub orbs: OrbOptions,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            language: "en".to_owned(),
            assets: AssetOptions::default(),
            camera: CameraOptions::default(),
            bloom: BloomOptions::default(),
            palette: PaletteOptions::default(),
            timings: TimingOptions::default(),
            performance: PerformanceOptions::default(),
            parallax: ParallaxOptions::default(),
            orbs: OrbOptions::default(),
        }
    }
}

impl WorldConfig {
    pub fn from_toml(text: &str) -> Result<Self, WorldError> {
        Ok(toml::from_str(text)?)
    }

    /// Reads [`CONFIG_FILE`] from the asset root, falling back to defaults.
    pub async fn load() -> Self {
        match load_string(CONFIG_FILE).await {
            Ok(text) => match Self::from_toml(&text) {
                Ok(config) => config,
                Err(e) => {
                    log::warn!("{}; using default configuration", e);
                    Self::default()
                }
            },
            Err(e) => {
                log::info!("no {} found ({}); using default configuration", CONFIG_FILE, e);
                Self::default()
            }
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AssetOptions {
    pub letters: String,
    pub wall: String,
}

impl Default for AssetOptions {
    fn default() -> Self {
        Self {
            letters: "kleczewsky.glb".to_owned(),
            wall: "kleczewsky_wall.glb".to_owned(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CameraOptions {
    pub fov_degrees: f32,
    pub znear: f32,
    pub zfar: f32,
    /// Where the intro flight starts.
    pub intro_position: [f32; 3],
    pub intro_pitch_degrees: f32,
    /// Where the intro flight ends when the scene has no `Home` checkpoint.
    pub home_position: [f32; 3],
    pub home_pitch_degrees: f32,
}

impl Default for CameraOptions {
    fn default() -> Self {
        Self {
            fov_degrees: 75.0,
            znear: 1.0,
            zfar: 10000.0,
            intro_position: [0.0, 2.0, 90.0],
            intro_pitch_degrees: -90.0,
            home_position: [0.0, 2.0, 22.0],
            home_pitch_degrees: 0.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct BloomOptions {
    pub enabled: bool,
    pub threshold: f32,
    pub strength: f32,
    pub radius: f32,
    pub exposure: f32,
    pub fxaa: bool,
}

impl Default for BloomOptions {
    fn default() -> Self {
        Self {
            enabled: true,
            threshold: 0.0,
            strength: 1.1,
            radius: 0.15,
            exposure: 1.0,
            fxaa: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PaletteOptions {
    /// Linear RGB colours shared by letters, orbs and colour cycling.
    pub letter_colors: [[f32; 3]; 3],
}

impl Default for PaletteOptions {
    fn default() -> Self {
        Self {
            letter_colors: [[1.0, 0.24, 0.42], [0.18, 0.62, 1.0], [1.0, 0.78, 0.2]],
        }
    }
}

/// All durations in seconds.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TimingOptions {
    pub implode_debounce: f32,
    pub implode_stagger: f32,
    pub loader_throttle: f32,
    pub loader_fade_delay: f32,
    pub loader_fade_duration: f32,
    pub idle_interval: f32,
    pub section_flight: f32,
}

impl Default for TimingOptions {
    fn default() -> Self {
        Self {
            implode_debounce: 1.0,
            implode_stagger: 0.25,
            loader_throttle: 0.3,
            loader_fade_delay: 2.0,
            loader_fade_duration: 0.5,
            idle_interval: 6.0,
            section_flight: 2.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PerformanceOptions {
    pub min_fps: f32,
    pub window: usize,
    pub min_records: usize,
    pub sample_interval_millis: u64,
}

impl Default for PerformanceOptions {
    fn default() -> Self {
        Self {
            min_fps: 30.0,
            window: 5,
            min_records: 4,
            sample_interval_millis: 1000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ParallaxOptions {
    pub factor_x: f32,
    pub factor_y: f32,
    /// Fraction of the remaining offset covered per frame.
    pub lerp: f32,
}

impl Default for ParallaxOptions {
    fn default() -> Self {
        Self {
            factor_x: -3.0,
            factor_y: 0.8,
            lerp: 0.1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct OrbOptions {
    pub count: usize,
    pub radius: f32,
    pub height: f32,
    pub scatter: f32,
    /// Orbs without a base spot keep at least this far from the centre.
    pub clear_range: f32,
    /// Base (x, z) spots; shuffled before use.
    pub spots: Vec<[f32; 2]>,
}

impl Default for OrbOptions {
    fn default() -> Self {
        Self {
            count: 10,
            radius: 0.2,
            height: 0.1,
            scatter: 20.0,
            clear_range: 10.0,
            spots: vec![
                [-15.0, 5.0],
                [11.0, 7.0],
                [18.0, -4.0],
                [-19.0, 15.0],
                [-24.0, -5.0],
                [26.0, 2.0],
                [11.0, 26.0],
                [-29.0, 5.0],
            ],
        }
    }
}

//! kleczewsky-world
//!
//! An interactive 3D landing page rendered with wgpu, natively and in the
//! browser. Floating letters burst apart under the pointer, light orbs flicker
//! on during a camera fly-in, and the camera flies between the sections of the
//! page.
//!
//! High-level modules
//! - `animation`: letter, light, intro and navigation choreography
//! - `camera`: camera types, ray construction and uniforms for view/projection
//! - `config`: the `world.toml` configuration
//! - `context`: central GPU and window context that owns device/queue/pipelines
//! - `data_structures`: engine data models (meshes, instances, textures)
//! - `flow`: high level flow control (scenes / update loops)
//! - `input`: pointer parallax, hovering and clicking through raycasts
//! - `loader`: asset progress and the loader screen lifecycle
//! - `perf`: frame rate monitoring and quality degradation
//! - `pipelines`: render pipelines (basic, light)
//! - `postprocess`: bloom, tone mapping and FXAA
//! - `raycast`: rays, bounding boxes and the nearest hit
//! - `resources`: helpers to load textures/models and create GPU resources
//! - `render`: render composition for efficient pipeline reuse
//! - `schedule`: timers and throttles in frame time
//! - `tween`: property tweens, easing and timelines
//! - `world`: the landing page flow
//!

pub mod animation;
pub mod camera;
pub mod config;
pub mod context;
pub mod data_structures;
pub mod error;
pub mod flow;
pub mod input;
pub mod loader;
pub mod perf;
pub mod pipelines;
pub mod postprocess;
pub mod raycast;
pub mod render;
pub mod resources;
pub mod schedule;
pub mod tween;
pub mod world;

// Re-exports commonly used types for convenience in downstream code.
pub use cgmath;
pub use wgpu;
pub use winit::dpi::PhysicalPosition;
pub use winit::event::DeviceEvent;
pub use winit::event::WindowEvent;

pub use error::WorldError;
pub use world::{Section, World, WorldEvent, WorldState};

/// Name of the environment variable that turns on debug logging natively.
pub const DEBUG_ENV: &str = "KLECZEWSKY_DEBUG";

/// Debug mode is on when [`DEBUG_ENV`] is set or, on the web, when the page
/// was opened with `?debug`.
pub fn debug_mode() -> bool {
    #[cfg(not(target_arch = "wasm32"))]
    {
        std::env::var_os(DEBUG_ENV).is_some()
    }

    #[cfg(target_arch = "wasm32")]
    {
        web_sys::window()
            .and_then(|window| window.location().search().ok())
            .map(|search| {
                search
                    .trim_start_matches('?')
                    .split('&')
                    .any(|pair| pair == "debug" || pair.starts_with("debug="))
            })
            .unwrap_or(false)
    }
}

/// Opens the window and runs the landing page until it is closed.
pub fn start() -> anyhow::Result<()> {
    let level = if debug_mode() {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };
    flow::run_with_log_level(vec![World::constructor()], level)
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen::prelude::wasm_bindgen(start)]
pub fn run_web() -> Result<(), wasm_bindgen::JsValue> {
    start().map_err(|e| wasm_bindgen::JsValue::from_str(&format!("{:#}", e)))
}

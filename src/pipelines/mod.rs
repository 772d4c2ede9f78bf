//! Render pipelines.
//!
//! - `basic` holds the lit instanced pipeline and the occluder variant used
//!   for the bloom mask
//! - `light` holds the light uniform and its bind group

pub mod basic;
pub mod light;

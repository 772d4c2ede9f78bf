//! Loading progress and the loader screen lifecycle.
//!
//! Every asset reports its progress under an id. The mean over all ids drives
//! the loader text; once it reaches 100% the screen says so, waits, fades out
//! and finally reports [`LoaderEvent::Hidden`], the moment the world starts.

use std::collections::BTreeMap;

use crate::{
    config::TimingOptions,
    data_structures::scene_graph::SceneNode,
    resources::load_model_gltf,
    schedule::{Throttle, Timers},
};

const DOWNLOADED_PERCENT: f32 = 99.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LoaderEvent {
    Progress(u8),
    Ready,
    /// The loader screen starts fading out over `duration` seconds.
    FadeOut { duration: f32 },
    Hidden,
}

impl LoaderEvent {
    /// What the loader screen shows after this event, if anything changes.
    pub fn text(&self) -> Option<String> {
        match self {
            LoaderEvent::Progress(percent) => Some(format!("{}%", percent)),
            LoaderEvent::Ready => Some("Ready".to_owned()),
            LoaderEvent::FadeOut { .. } | LoaderEvent::Hidden => None,
        }
    }
}

pub struct LoaderController {
    /// `None` when the total size of the asset isn't known.
    status: BTreeMap<String, Option<f32>>,
    throttle: Throttle,
    timers: Timers<LoaderEvent>,
    loaded: bool,
    fade_delay: f32,
    fade_duration: f32,
    events: Vec<LoaderEvent>,
}

impl LoaderController {
    pub fn new(timings: &TimingOptions) -> Self {
        Self {
            status: BTreeMap::new(),
            throttle: Throttle::new(timings.loader_throttle),
            timers: Timers::new(),
            loaded: false,
            fade_delay: timings.loader_fade_delay,
            fade_duration: timings.loader_fade_duration,
            events: Vec::new(),
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    /// Registers an asset before it reports anything, so the mean can't reach
    /// 100% while it is still pending.
    pub fn expect_asset(&mut self, id: &str) {
        self.status.entry(id.to_owned()).or_insert(None);
    }

    pub fn report_bytes(&mut self, id: &str, loaded: u64, total: Option<u64>) {
        let percent = match total {
            Some(total) if total > 0 => Some((loaded as f32 / total as f32 * 100.0).min(100.0)),
            _ => None,
        };
        self.status.insert(id.to_owned(), percent);
        self.request_update();
    }

    pub fn report_percent(&mut self, id: &str, percent: f32) {
        self.status
            .insert(id.to_owned(), Some(percent.clamp(0.0, 100.0)));
        self.request_update();
    }

    /// Rounded mean over every reported asset; unknown sizes count as zero.
    pub fn progress(&self) -> Option<u8> {
        if self.status.is_empty() {
            return None;
        }
        let sum: f32 = self.status.values().map(|s| s.unwrap_or(0.0)).sum();
        Some((sum / self.status.len() as f32).round() as u8)
    }

    fn request_update(&mut self) {
        if self.throttle.call() {
            self.update_ui();
        }
    }

    fn update_ui(&mut self) {
        let Some(percent) = self.progress() else {
            return;
        };
        if self.loaded {
            return;
        }
        self.events.push(LoaderEvent::Progress(percent));
        if percent == 100 {
            self.loaded = true;
            log::info!("all assets loaded");
            self.events.push(LoaderEvent::Ready);
            self.timers.schedule(
                self.fade_delay,
                LoaderEvent::FadeOut {
                    duration: self.fade_duration,
                },
            );
            self.timers
                .schedule(self.fade_delay + self.fade_duration, LoaderEvent::Hidden);
        }
    }

    /// Loads a glTF scene, reporting its download as it goes and 100% once
    /// the scene is built.
    pub async fn load_gltf(
        &mut self,
        id: u32,
        path: &str,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
    ) -> anyhow::Result<Box<dyn SceneNode>> {
        let loaded = {
            let mut on_progress = |loaded: u64, total: Option<u64>| match total {
                // the download alone never completes an asset; building the scene does
                Some(total) if total > 0 => self.report_percent(
                    path,
                    (loaded as f32 / total as f32 * 100.0).min(DOWNLOADED_PERCENT),
                ),
                _ => self.report_bytes(path, loaded, None),
            };
            load_model_gltf(id, path, device, queue, &mut on_progress).await
        };
        match loaded {
            Ok(node) => {
                self.report_percent(path, 100.0);
                Ok(node)
            }
            Err(e) => {
                log::error!("Could not load {}: {:#}", path, e);
                Err(e)
            }
        }
    }

    /// Advances the throttle and the fade timers by `dt` seconds.
    pub fn advance(&mut self, dt: f32) -> Vec<LoaderEvent> {
        if self.throttle.advance(dt) {
            self.update_ui();
        }
        let due = self.timers.advance(dt);
        self.events.extend(due);
        std::mem::take(&mut self.events)
    }
}

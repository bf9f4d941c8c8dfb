//! Delegates that hand raw frames from the platform to the registry.
//!
//! A bridge only knows its session handle. The consumer is looked up on every
//! frame, so frames arriving before a consumer is registered are dropped.

use std::sync::Weak;
use tracing::debug;

use crate::platform::{
    AudioFrame, AudioFrameKind, AudioRawData, AudioRawDataDelegate, RawDataStatus,
    RendererDelegate, VideoFrame, YuvRawData,
};

use super::{Registry, SessionHandle};

pub struct AudioBridge {
    registry: Weak<Registry>,
    handle: SessionHandle,
}

impl AudioBridge {
    pub fn new(registry: Weak<Registry>, handle: SessionHandle) -> Self {
        Self { registry, handle }
    }

    fn forward(&self, kind: AudioFrameKind, node_id: u32, data: &AudioRawData) {
        if data.buffer.is_empty() {
            return;
        }
        let Some(registry) = self.registry.upgrade() else {
            return;
        };
        registry.dispatch_audio(
            self.handle,
            &AudioFrame {
                kind,
                node_id,
                data: &data.buffer,
                sample_rate: data.sample_rate,
                channels: data.channels,
            },
        );
    }
}

impl AudioRawDataDelegate for AudioBridge {
    fn on_mixed_audio_raw_data_received(&self, data: &AudioRawData) {
        self.forward(AudioFrameKind::Mixed, 0, data);
    }

    fn on_one_way_audio_raw_data_received(&self, data: &AudioRawData, user_id: u32) {
        self.forward(AudioFrameKind::OneWay, user_id, data);
    }

    fn on_share_audio_raw_data_received(&self, data: &AudioRawData, user_id: u32) {
        self.forward(AudioFrameKind::Share, user_id, data);
    }

    fn on_one_way_interpreter_audio_raw_data_received(&self, _data: &AudioRawData, _language: &str) {}
}

pub struct VideoBridge {
    registry: Weak<Registry>,
    handle: SessionHandle,
}

impl VideoBridge {
    pub fn new(registry: Weak<Registry>, handle: SessionHandle) -> Self {
        Self { registry, handle }
    }
}

impl RendererDelegate for VideoBridge {
    fn on_renderer_destroyed(&self) {
        debug!("renderer for session {} destroyed", self.handle);
    }

    fn on_raw_data_frame_received(&self, frame: &YuvRawData) {
        if frame.buffer_len() == 0 {
            return;
        }
        let Some(registry) = self.registry.upgrade() else {
            return;
        };
        registry.dispatch_video(
            self.handle,
            &VideoFrame {
                y: &frame.y,
                u: &frame.u,
                v: &frame.v,
                width: frame.width,
                height: frame.height,
                source_id: frame.source_id,
                timestamp: frame.timestamp,
            },
        );
    }

    fn on_raw_data_status_changed(&self, status: RawDataStatus) {
        debug!("raw video for session {} is {:?}", self.handle, status);
    }
}

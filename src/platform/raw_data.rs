//! Raw media frames and the platform's raw-data helpers.
//!
//! The platform decodes audio and video itself; we only ever see the decoded
//! PCM buffers and I420 planes handed to the delegates below.

use std::sync::Arc;

use super::status::{RawDataType, SdkStatus, VideoResolution};

/// Origin of a raw audio frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioFrameKind {
    /// All participants mixed into one stream.
    Mixed,
    /// A single participant's stream.
    OneWay,
    /// Audio attached to a screen share.
    Share,
}

impl AudioFrameKind {
    pub fn code(&self) -> i32 {
        match self {
            Self::Mixed => 0,
            Self::OneWay => 1,
            Self::Share => 2,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mixed => "mixed",
            Self::OneWay => "one_way",
            Self::Share => "share",
        }
    }
}

/// Decoded PCM buffer (S16LE) as handed over by the platform.
#[derive(Debug, Clone, Default)]
pub struct AudioRawData {
    pub buffer: Vec<u8>,
    pub sample_rate: u32,
    pub channels: u16,
}

/// Decoded I420 frame as handed over by the platform.
#[derive(Debug, Clone, Default)]
pub struct YuvRawData {
    pub y: Vec<u8>,
    pub u: Vec<u8>,
    pub v: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub source_id: u32,
    pub timestamp: u64,
}

impl YuvRawData {
    pub fn buffer_len(&self) -> usize {
        self.y.len() + self.u.len() + self.v.len()
    }
}

/// Whether a renderer is currently receiving data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RawDataStatus {
    On,
    Off,
}

/// Audio frame delivered to a registered consumer.
#[derive(Debug, Clone, Copy)]
pub struct AudioFrame<'a> {
    pub kind: AudioFrameKind,
    /// Speaker id for one-way and share audio, zero for mixed audio.
    pub node_id: u32,
    pub data: &'a [u8],
    pub sample_rate: u32,
    pub channels: u16,
}

/// Video frame delivered to a registered consumer.
#[derive(Debug, Clone, Copy)]
pub struct VideoFrame<'a> {
    pub y: &'a [u8],
    pub u: &'a [u8],
    pub v: &'a [u8],
    pub width: u32,
    pub height: u32,
    pub source_id: u32,
    pub timestamp: u64,
}

impl VideoFrame<'_> {
    pub fn len(&self) -> usize {
        self.y.len() + self.u.len() + self.v.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Receives raw audio on a platform thread.
pub trait AudioRawDataDelegate: Send + Sync {
    fn on_mixed_audio_raw_data_received(&self, data: &AudioRawData);
    fn on_one_way_audio_raw_data_received(&self, data: &AudioRawData, user_id: u32);
    fn on_share_audio_raw_data_received(&self, data: &AudioRawData, user_id: u32);
    fn on_one_way_interpreter_audio_raw_data_received(&self, data: &AudioRawData, language: &str);
}

/// Receives raw video on a platform thread.
pub trait RendererDelegate: Send + Sync {
    fn on_renderer_destroyed(&self);
    fn on_raw_data_frame_received(&self, frame: &YuvRawData);
    fn on_raw_data_status_changed(&self, status: RawDataStatus);
}

/// Platform helper that feeds raw audio to one delegate.
pub trait AudioRawHelper: Send + Sync {
    /// May return [`SdkStatus::NotJoinAudio`] while the audio transport is still joining.
    fn subscribe(&self, delegate: Arc<dyn AudioRawDataDelegate>) -> SdkStatus;
    fn unsubscribe(&self) -> SdkStatus;
}

/// Platform renderer bound to one delegate at creation.
pub trait VideoRenderer: Send + Sync {
    fn set_resolution(&self, resolution: VideoResolution) -> SdkStatus;
    fn subscribe(&self, source_id: u32, kind: RawDataType) -> SdkStatus;
    fn unsubscribe(&self) -> SdkStatus;
    fn destroy(&self) -> SdkStatus;
}

//! Per-handle frame counters.

use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Audio,
    Video,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FrameStats {
    pub audio_frames: u64,
    pub video_frames: u64,
    /// Frames that arrived while no consumer was registered.
    pub frames_dropped: u64,
    pub bytes_delivered: u64,
    pub created_at: DateTime<Utc>,
    pub last_frame_at: Option<DateTime<Utc>>,
}

impl FrameStats {
    pub fn new() -> Self {
        Self {
            audio_frames: 0,
            video_frames: 0,
            frames_dropped: 0,
            bytes_delivered: 0,
            created_at: Utc::now(),
            last_frame_at: None,
        }
    }

    pub fn record_delivered(&mut self, kind: MediaKind, bytes: usize) {
        match kind {
            MediaKind::Audio => self.audio_frames += 1,
            MediaKind::Video => self.video_frames += 1,
        }
        self.bytes_delivered += bytes as u64;
        self.last_frame_at = Some(Utc::now());
    }

    pub fn record_dropped(&mut self) {
        self.frames_dropped += 1;
    }

    pub fn frames_delivered(&self) -> u64 {
        self.audio_frames + self.video_frames
    }

    /// Seconds since the last delivered frame, if any.
    pub fn idle_seconds(&self) -> Option<i64> {
        self.last_frame_at
            .map(|at| (Utc::now() - at).num_seconds())
    }
}

impl Default for FrameStats {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts_by_kind() {
        let mut stats = FrameStats::new();
        stats.record_delivered(MediaKind::Audio, 640);
        stats.record_delivered(MediaKind::Audio, 640);
        stats.record_delivered(MediaKind::Video, 1000);
        stats.record_dropped();

        assert_eq!(stats.audio_frames, 2);
        assert_eq!(stats.video_frames, 1);
        assert_eq!(stats.frames_delivered(), 3);
        assert_eq!(stats.frames_dropped, 1);
        assert_eq!(stats.bytes_delivered, 2280);
        assert!(stats.last_frame_at.is_some());
        assert_eq!(stats.idle_seconds(), Some(0));
    }

    #[test]
    fn test_new_stats_have_no_last_frame() {
        let stats = FrameStats::default();
        assert_eq!(stats.frames_delivered(), 0);
        assert!(stats.last_frame_at.is_none());
        assert!(stats.idle_seconds().is_none());
    }

    #[test]
    fn test_stats_serialize_timestamps() {
        let mut stats = FrameStats::new();
        stats.record_delivered(MediaKind::Video, 12);

        let value = serde_json::to_value(&stats).unwrap();
        assert_eq!(value["video_frames"], 1);
        assert_eq!(value["bytes_delivered"], 12);
        let created = value["created_at"].as_str().unwrap();
        assert_eq!(created.parse::<DateTime<Utc>>().unwrap(), stats.created_at);
        assert!(value["last_frame_at"].is_string());
    }
}

//! Interfaces of the external conferencing platform.
//!
//! Nothing in here talks to a real platform; a host binds one by implementing
//! [`Platform`] and the service traits. [`sim`] provides an in-process binding.

pub mod bootstrap;
pub mod events;
pub mod raw_data;
pub mod services;
pub mod sim;
pub mod status;

pub use bootstrap::{AuthContext, AuthService, InitParams, NetworkConnectionHelper, Platform, ProxySettings};
pub use events::{
    AuthServiceEvent, MeetingParameter, MeetingServiceEvent, RecordingCtrlEvent, RecordingStatus,
    ReminderContent, ReminderEvent, ReminderHandler, RequestLocalRecordingStatus, ShareCtrlEvent,
    ShareSourceInfo, StatisticsWarning, TranscodingStatus,
};
pub use raw_data::{
    AudioFrame, AudioFrameKind, AudioRawData, AudioRawDataDelegate, AudioRawHelper, RawDataStatus,
    RendererDelegate, VideoFrame, VideoRenderer, YuvRawData,
};
pub use services::{
    AudioController, AudioSettings, JoinParams, MeetingService, ParticipantsController,
    RecordingController, ReminderController, SettingService, SharingController, StartParams,
    VideoController,
};
pub use status::{
    AuthResult, LeaveKind, MeetingStatus, RawDataType, SdkStatus, SharingStatus, VideoResolution,
};

//! SDK-level entry points: initialization, global services and authentication.

use std::sync::Arc;

use super::events::AuthServiceEvent;
use super::services::{MeetingService, SettingService};
use super::status::SdkStatus;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InitParams {
    pub web_domain: String,
    pub support_url: String,
    pub language: String,
    pub enable_log_by_default: bool,
    pub enable_generate_dump: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProxySettings {
    pub auto_detect: bool,
    pub proxy: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthContext {
    pub jwt_token: String,
}

pub trait AuthService: Send + Sync {
    fn set_event(&self, listener: Option<Arc<dyn AuthServiceEvent>>) -> SdkStatus;
    /// Result arrives through [`AuthServiceEvent::on_authentication_return`].
    fn sdk_auth(&self, context: &AuthContext) -> SdkStatus;
}

pub trait NetworkConnectionHelper: Send + Sync {
    fn configure_proxy(&self, settings: &ProxySettings) -> SdkStatus;
}

/// Process-level binding to the conferencing platform.
pub trait Platform: Send + Sync {
    fn init_sdk(&self, params: &InitParams) -> SdkStatus;
    fn create_setting_service(&self) -> Result<Arc<dyn SettingService>, SdkStatus>;
    fn create_network_helper(&self) -> Result<Arc<dyn NetworkConnectionHelper>, SdkStatus>;
    fn create_meeting_service(&self) -> Result<Arc<dyn MeetingService>, SdkStatus>;
    fn create_auth_service(&self) -> Result<Arc<dyn AuthService>, SdkStatus>;
    /// Runs every pending platform event on the calling thread without blocking.
    fn pump_events(&self);
    fn cleanup_sdk(&self) -> SdkStatus;
}

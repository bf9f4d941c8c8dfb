//! Meeting control endpoints.
//!
//! - Joining a meeting (POST /api/meetings)
//! - Listing meetings (GET /api/meetings)
//! - Getting a meeting's status and frame counters (GET /api/meetings/:meeting_id)
//! - Leaving a meeting (DELETE /api/meetings/:meeting_id)
//!
//! Every meeting runs on its own platform binding and SDK instance, keyed by
//! the platform meeting id.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    routing::get,
    Router,
};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, warn};

use crate::api::error::{ApiError, ApiResult};
use crate::meeting::SessionConfig;
use crate::platform::{MeetingStatus, Platform};
use crate::registry::{FrameStats, Registry, SdkHandle, SessionHandle};
use crate::sdk::SdkConfig;

/// Builds a fresh platform binding for each joined meeting.
pub type PlatformFactory = Arc<dyn Fn() -> Arc<dyn Platform> + Send + Sync>;

struct ServedMeeting {
    session: SessionHandle,
    sdk: SdkHandle,
    platform: Arc<dyn Platform>,
}

enum Slot {
    /// Authentication or join still in flight.
    Joining,
    Live(ServedMeeting),
}

/// Shared state for meeting routes.
#[derive(Clone)]
pub struct MeetingState {
    registry: Arc<Registry>,
    sdk_config: SdkConfig,
    display_name: String,
    platforms: PlatformFactory,
    meetings: Arc<Mutex<HashMap<String, Slot>>>,
}

/// Request body for the join endpoint.
#[derive(Debug, Deserialize)]
pub struct JoinRequest {
    pub meeting_id: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub join_token: Option<String>,
    #[serde(default = "default_audio")]
    pub audio: bool,
    #[serde(default)]
    pub video: bool,
}

fn default_audio() -> bool {
    true
}

#[derive(Debug, Serialize)]
pub struct MeetingView {
    pub meeting_id: String,
    pub session: SessionHandle,
    pub status: MeetingStatus,
    pub phase: &'static str,
    pub joined: bool,
    pub recording: bool,
    pub share_source_id: u32,
    pub stats: FrameStats,
}

impl MeetingState {
    pub fn new(
        registry: Arc<Registry>,
        sdk_config: SdkConfig,
        display_name: impl Into<String>,
        platforms: PlatformFactory,
    ) -> Self {
        Self {
            registry,
            sdk_config,
            display_name: display_name.into(),
            platforms,
            meetings: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn meeting_count(&self) -> usize {
        self.meetings
            .lock()
            .values()
            .filter(|slot| matches!(slot, Slot::Live(_)))
            .count()
    }

    /// Authenticates a dedicated SDK instance and asks it to join. Blocks
    /// until authentication settles.
    pub fn join(&self, request: JoinRequest) -> ApiResult<SessionHandle> {
        let meeting_id = request.meeting_id.trim().to_string();
        if meeting_id.is_empty() {
            return Err(ApiError::bad_request("meeting_id is required"));
        }
        {
            let mut meetings = self.meetings.lock();
            if meetings.contains_key(&meeting_id) {
                return Err(ApiError::conflict(format!(
                    "meeting {} is already joined",
                    meeting_id
                )));
            }
            meetings.insert(meeting_id.clone(), Slot::Joining);
        }

        match self.open(&meeting_id, request) {
            Ok(served) => {
                let session = served.session;
                self.meetings.lock().insert(meeting_id.clone(), Slot::Live(served));
                info!("meeting {} joining as session {}", meeting_id, session);
                Ok(session)
            }
            Err(e) => {
                self.meetings.lock().remove(&meeting_id);
                Err(e)
            }
        }
    }

    fn open(&self, meeting_id: &str, request: JoinRequest) -> ApiResult<ServedMeeting> {
        let platform = (self.platforms)();
        let sdk = self
            .registry
            .create_sdk(platform.clone(), self.sdk_config.clone())?;

        let display_name = request
            .display_name
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| self.display_name.clone());
        let mut config = SessionConfig::join(meeting_id, request.password, display_name)
            .with_audio(request.audio)
            .with_video(request.video);
        config.join_token = request.join_token.filter(|token| !token.is_empty());

        match self.registry.create_and_join(sdk, config) {
            Ok(session) => Ok(ServedMeeting {
                session,
                sdk,
                platform,
            }),
            Err(e) => {
                warn!("join of meeting {} rejected: {}", meeting_id, e);
                self.registry.destroy_sdk(sdk);
                Err(e.into())
            }
        }
    }

    /// Leaves the meeting and cleans up its SDK instance.
    pub fn leave(&self, meeting_id: &str) -> ApiResult<()> {
        let served = {
            let mut meetings = self.meetings.lock();
            match meetings.remove(meeting_id) {
                Some(Slot::Live(served)) => served,
                Some(Slot::Joining) => {
                    meetings.insert(meeting_id.to_string(), Slot::Joining);
                    return Err(ApiError::conflict(format!(
                        "meeting {} is still joining",
                        meeting_id
                    )));
                }
                None => return Err(ApiError::not_found(format!("meeting {} not found", meeting_id))),
            }
        };

        self.registry.destroy(served.session);
        served.platform.pump_events();
        self.registry.destroy_sdk(served.sdk);
        info!("meeting {} left", meeting_id);
        Ok(())
    }

    pub fn view(&self, meeting_id: &str) -> Option<MeetingView> {
        let session = match self.meetings.lock().get(meeting_id) {
            Some(Slot::Live(served)) => served.session,
            _ => return None,
        };
        self.describe(meeting_id, session)
    }

    pub fn list(&self) -> Vec<MeetingView> {
        let mut live: Vec<(String, SessionHandle)> = self
            .meetings
            .lock()
            .iter()
            .filter_map(|(id, slot)| match slot {
                Slot::Live(served) => Some((id.clone(), served.session)),
                Slot::Joining => None,
            })
            .collect();
        live.sort_by_key(|(_, session)| *session);
        live.iter()
            .filter_map(|(id, session)| self.describe(id, *session))
            .collect()
    }

    fn describe(&self, meeting_id: &str, session: SessionHandle) -> Option<MeetingView> {
        let handle = self.registry.session(session)?;
        let snapshot = handle.snapshot();
        Some(MeetingView {
            meeting_id: meeting_id.to_string(),
            session,
            status: handle.platform_status(),
            phase: snapshot.phase.as_str(),
            joined: snapshot.joined,
            recording: snapshot.recording,
            share_source_id: snapshot.share_source_id,
            stats: self.registry.stats(session).unwrap_or_default(),
        })
    }

    /// Runs pending events of every platform binding once.
    pub fn pump(&self) {
        let platforms: Vec<Arc<dyn Platform>> = self
            .meetings
            .lock()
            .values()
            .filter_map(|slot| match slot {
                Slot::Live(served) => Some(served.platform.clone()),
                Slot::Joining => None,
            })
            .collect();
        for platform in platforms {
            platform.pump_events();
        }
    }

    /// Leaves every live meeting.
    pub fn shutdown(&self) {
        let live: Vec<String> = self
            .meetings
            .lock()
            .iter()
            .filter(|(_, slot)| matches!(slot, Slot::Live(_)))
            .map(|(id, _)| id.clone())
            .collect();
        for meeting_id in live {
            if let Err(e) = self.leave(&meeting_id) {
                warn!("meeting {} not left cleanly: {}", meeting_id, e.status());
            }
        }
    }
}

pub fn router(state: MeetingState) -> Router {
    Router::new()
        .route("/meetings", get(list_meetings).post(join_meeting))
        .route("/meetings/:meeting_id", get(get_meeting).delete(leave_meeting))
        .with_state(state)
}

async fn join_meeting(
    State(state): State<MeetingState>,
    Json(request): Json<JoinRequest>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    info!("Join request for meeting {} received via API", request.meeting_id);

    let session = tokio::task::spawn_blocking(move || state.join(request)).await??;

    Ok((
        StatusCode::ACCEPTED,
        Json(json!({
            "status": "joining",
            "session": session,
        })),
    ))
}

async fn list_meetings(State(state): State<MeetingState>) -> Json<Vec<MeetingView>> {
    Json(state.list())
}

async fn get_meeting(
    Path(meeting_id): Path<String>,
    State(state): State<MeetingState>,
) -> ApiResult<Json<MeetingView>> {
    state
        .view(&meeting_id)
        .map(Json)
        .ok_or_else(|| ApiError::not_found(format!("meeting {} not found", meeting_id)))
}

async fn leave_meeting(
    Path(meeting_id): Path<String>,
    State(state): State<MeetingState>,
) -> ApiResult<Json<Value>> {
    info!("Leave request for meeting {} received via API", meeting_id);

    tokio::task::spawn_blocking(move || state.leave(&meeting_id)).await??;

    Ok(Json(json!({ "status": "left" })))
}

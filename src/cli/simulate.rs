//! CLI handler for `meetbot simulate`.
//!
//! Runs the full bot flow against the in-process platform: authenticate,
//! join, wait for recording privilege, capture frames, leave. Each meeting
//! gets its own simulated platform and SDK instance.

use anyhow::{anyhow, bail, Context, Result};
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use crate::cli::SimulateCliArgs;
use crate::config::Config;
use crate::meeting::SessionConfig;
use crate::platform::sim::SimPlatform;
use crate::platform::{Platform, ShareSourceInfo, SharingStatus};
use crate::registry::{
    audio_callback, video_callback, FrameStats, Registry, SdkHandle, SessionHandle,
};

const SETTLE_TIMEOUT: Duration = Duration::from_secs(15);
const PUMP_INTERVAL: Duration = Duration::from_millis(10);
const AUDIO_CHUNK: [u8; 640] = [0; 640];
const SHARE_WIDTH: u32 = 1280;
const SHARE_HEIGHT: u32 = 720;

struct SimulatedMeeting {
    meeting_id: String,
    platform: Arc<SimPlatform>,
    sdk: SdkHandle,
    session: SessionHandle,
}

#[derive(Debug, Serialize)]
struct MeetingReport {
    meeting_id: String,
    session: SessionHandle,
    recorded: bool,
    stats: FrameStats,
}

/// Splits `<id> <password> ...` into pairs.
fn meeting_pairs(values: &[String]) -> Result<Vec<(String, String)>> {
    if values.is_empty() || values.len() % 2 != 0 {
        bail!("expected meeting id and password pairs, got {} value(s)", values.len());
    }
    Ok(values
        .chunks(2)
        .map(|pair| (pair[0].clone(), pair[1].clone()))
        .collect())
}

/// Loads the configuration, filling in credentials the simulated platform
/// accepts when none are configured.
pub(crate) fn simulation_config() -> Result<Config> {
    let mut config = Config::load().unwrap_or_else(|e| {
        warn!("using default configuration: {:#}", e);
        Config::default()
    });
    if config.sdk.key.is_empty() || config.sdk.secret.is_empty() {
        config.sdk.key = "simulated-key".to_string();
        config.sdk.secret = "simulated-secret".to_string();
    }
    config.validate()?;
    Ok(config)
}

pub fn handle_simulate_command(args: SimulateCliArgs, cancel: Arc<AtomicBool>) -> Result<()> {
    let pairs = meeting_pairs(&args.meetings)?;
    let config = simulation_config()?;

    let registry = Registry::new();
    registry.set_recording_options(config.recording_options());
    let display_name = args
        .name
        .clone()
        .unwrap_or_else(|| config.bot.display_name.clone());

    let mut meetings = Vec::with_capacity(pairs.len());
    for (index, (meeting_id, password)) in pairs.into_iter().enumerate() {
        let meeting = open_meeting(&registry, &config, &args, index as u32, meeting_id, password, &display_name)?;
        meetings.push(meeting);
    }

    let capturing = args.audio || args.video;
    wait_until(&meetings, &cancel, |meeting| {
        registry
            .session(meeting.session)
            .map(|session| if capturing { session.is_recording() } else { session.is_joined() })
            .unwrap_or(false)
    })?;

    if capturing {
        push_frames(&meetings, &args, &cancel);
    }

    let reports: Vec<MeetingReport> = meetings
        .iter()
        .map(|meeting| MeetingReport {
            meeting_id: meeting.meeting_id.clone(),
            session: meeting.session,
            recorded: registry
                .session(meeting.session)
                .map(|session| session.is_recording())
                .unwrap_or(false),
            stats: registry.stats(meeting.session).unwrap_or_default(),
        })
        .collect();

    for meeting in &meetings {
        registry.destroy(meeting.session);
        meeting.platform.pump_events();
        registry.destroy_sdk(meeting.sdk);
    }

    print_reports(&reports, args.json)
}

fn open_meeting(
    registry: &Arc<Registry>,
    config: &Config,
    args: &SimulateCliArgs,
    index: u32,
    meeting_id: String,
    password: String,
    display_name: &str,
) -> Result<SimulatedMeeting> {
    let platform = SimPlatform::new().with_auto_flow();
    if args.video {
        platform.meeting.sharing.add_source(ShareSourceInfo {
            user_id: 100 + index,
            share_source_id: 1000 + index,
            status: SharingStatus::OtherShareBegin,
            is_showing_in_first_view: true,
            is_showing_in_second_view: false,
        });
    }

    let sdk = registry
        .create_sdk(platform.clone(), config.sdk_config())
        .map_err(|e| anyhow!("failed to create SDK for meeting {}: {}", meeting_id, e))?;

    let session_config = SessionConfig::join(meeting_id.clone(), password, display_name)
        .with_audio(args.audio)
        .with_video(args.video);
    let session = registry
        .create_and_join(sdk, session_config)
        .map_err(|e| anyhow!("failed to join meeting {}: {}", meeting_id, e))?;

    registry.set_audio_callback(
        session,
        Some(audio_callback(|handle, frame| {
            debug!(
                "session {} got {} bytes of {} audio from node {}",
                handle,
                frame.data.len(),
                frame.kind.as_str(),
                frame.node_id
            );
        })),
    )?;
    registry.set_video_callback(
        session,
        Some(video_callback(|handle, frame| {
            debug!(
                "session {} got {}x{} frame from share {}",
                handle, frame.width, frame.height, frame.source_id
            );
        })),
    )?;

    info!("meeting {} joining as session {}", meeting_id, session);
    Ok(SimulatedMeeting {
        meeting_id,
        platform,
        sdk,
        session,
    })
}

/// Pumps every platform until `ready` holds for all meetings.
fn wait_until(
    meetings: &[SimulatedMeeting],
    cancel: &AtomicBool,
    ready: impl Fn(&SimulatedMeeting) -> bool,
) -> Result<()> {
    let deadline = Instant::now() + SETTLE_TIMEOUT;
    loop {
        for meeting in meetings {
            meeting.platform.pump_events();
        }
        if meetings.iter().all(&ready) {
            return Ok(());
        }
        if cancel.load(Ordering::SeqCst) {
            bail!("simulation interrupted");
        }
        if Instant::now() >= deadline {
            return Err(anyhow!("meetings did not settle within {:?}", SETTLE_TIMEOUT))
                .context("waiting for the bot to join and record");
        }
        thread::sleep(PUMP_INTERVAL);
    }
}

fn push_frames(meetings: &[SimulatedMeeting], args: &SimulateCliArgs, cancel: &AtomicBool) {
    for n in 0..args.frames {
        if cancel.load(Ordering::SeqCst) {
            warn!("simulation interrupted after {} frame(s)", n);
            return;
        }
        for meeting in meetings {
            if args.audio {
                meeting.platform.meeting.audio_helper.push_mixed_audio(&AUDIO_CHUNK);
            }
            if args.video {
                if let Some(renderer) = meeting.platform.meeting.last_renderer() {
                    renderer.push_frame(SHARE_WIDTH, SHARE_HEIGHT, u64::from(n) * 33);
                }
            }
            meeting.platform.pump_events();
        }
    }
}

fn print_reports(reports: &[MeetingReport], json: bool) -> Result<()> {
    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(reports).context("Failed to serialize statistics")?
        );
        return Ok(());
    }

    println!();
    println!("Simulation results");
    println!("==================");
    for report in reports {
        println!();
        println!("Meeting:   {} (session {})", report.meeting_id, report.session);
        println!("Recording: {}", if report.recorded { "yes" } else { "no" });
        println!("Audio:     {} frame(s)", report.stats.audio_frames);
        println!("Video:     {} frame(s)", report.stats.video_frames);
        println!("Dropped:   {}", report.stats.frames_dropped);
        println!("Bytes:     {}", report.stats.bytes_delivered);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn test_meeting_pairs() {
        let pairs = meeting_pairs(&strings(&["1", "a", "2", "b"])).unwrap();
        assert_eq!(
            pairs,
            vec![("1".to_string(), "a".to_string()), ("2".to_string(), "b".to_string())]
        );
    }

    #[test]
    fn test_meeting_pairs_rejects_odd_count() {
        assert!(meeting_pairs(&strings(&["1", "a", "2"])).is_err());
        assert!(meeting_pairs(&[]).is_err());
    }

    #[test]
    fn test_two_meetings_capture_audio_and_share() {
        let args = SimulateCliArgs {
            meetings: strings(&["111", "pw", "222", "pw"]),
            audio: true,
            video: true,
            frames: 3,
            name: Some("Tester".to_string()),
            json: true,
        };
        let mut config = Config::default();
        config.sdk.key = "k".to_string();
        config.sdk.secret = "s".to_string();
        config.sdk.auth_timeout_seconds = 2;

        let registry = Registry::new();
        let cancel = AtomicBool::new(false);
        let meetings: Vec<_> = meeting_pairs(&args.meetings)
            .unwrap()
            .into_iter()
            .enumerate()
            .map(|(i, (id, pw))| open_meeting(&registry, &config, &args, i as u32, id, pw, "Tester").unwrap())
            .collect();
        assert_ne!(meetings[0].session, meetings[1].session);

        wait_until(&meetings, &cancel, |m| {
            registry.session(m.session).map(|s| s.is_recording()).unwrap_or(false)
        })
        .unwrap();
        push_frames(&meetings, &args, &cancel);

        for meeting in &meetings {
            let stats = registry.stats(meeting.session).unwrap();
            assert_eq!(stats.audio_frames, 3);
            assert_eq!(stats.video_frames, 3);
            assert_eq!(stats.frames_dropped, 0);
        }
    }
}

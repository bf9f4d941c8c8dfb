//! SDK bootstrap.
//!
//! Initializes the platform, creates the process-wide services every session
//! shares and authenticates with a signed token. Authentication completes
//! through an event, so [`Sdk::authenticate_blocking`] keeps pumping the
//! platform while it waits.

pub mod event_loop;
pub mod jwt;

pub use event_loop::EventLoop;

use parking_lot::{Condvar, Mutex};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

use crate::events::AuthAdapter;
use crate::meeting::error::{check, reject};
use crate::meeting::{SessionError, SessionResult};
use crate::platform::{
    AuthContext, AuthResult, AuthService, InitParams, MeetingService, NetworkConnectionHelper,
    Platform, ProxySettings, SettingService,
};

const AUTH_PUMP_INTERVAL: Duration = Duration::from_millis(10);

/// Credentials and endpoints for one SDK instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SdkConfig {
    pub key: String,
    pub secret: String,
    pub web_domain: String,
    /// Explicit proxy; `None` lets the platform auto-detect.
    pub proxy: Option<String>,
    pub auth_timeout: Duration,
    pub jwt_ttl: chrono::Duration,
}

impl SdkConfig {
    pub fn new(key: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            secret: secret.into(),
            web_domain: "https://zoom.us".to_string(),
            proxy: None,
            auth_timeout: Duration::from_secs(10),
            jwt_ttl: chrono::Duration::hours(24),
        }
    }

    /// Picks up `HTTP_PROXY` when no proxy is set.
    pub fn with_proxy_from_env(mut self) -> Self {
        if self.proxy.is_none() {
            self.proxy = std::env::var("HTTP_PROXY").ok().filter(|p| !p.is_empty());
        }
        self
    }

    pub fn has_credentials(&self) -> bool {
        !self.key.is_empty() && !self.secret.is_empty()
    }
}

#[derive(Default)]
struct Services {
    initialized: bool,
    settings: Option<Arc<dyn SettingService>>,
    network: Option<Arc<dyn NetworkConnectionHelper>>,
    meeting: Option<Arc<dyn MeetingService>>,
    auth: Option<Arc<dyn AuthService>>,
}

/// Authentication outcome, signalled from the platform's event thread.
#[derive(Default)]
struct AuthGate {
    outcome: Mutex<Option<AuthResult>>,
    ready: Condvar,
}

impl AuthGate {
    fn settle(&self, result: AuthResult) {
        *self.outcome.lock() = Some(result);
        self.ready.notify_all();
    }

    fn reset(&self) {
        *self.outcome.lock() = None;
    }
}

pub struct Sdk {
    platform: Arc<dyn Platform>,
    config: SdkConfig,
    services: Mutex<Services>,
    auth: Arc<AuthGate>,
}

impl Sdk {
    pub fn new(platform: Arc<dyn Platform>, config: SdkConfig) -> Self {
        Self {
            platform,
            config,
            services: Mutex::new(Services::default()),
            auth: Arc::new(AuthGate::default()),
        }
    }

    pub fn config(&self) -> &SdkConfig {
        &self.config
    }

    /// Initializes the platform and creates the shared services. Repeat calls
    /// after success are no-ops.
    pub fn initialize(&self) -> SessionResult<()> {
        let mut services = self.services.lock();
        if services.initialized {
            return Ok(());
        }
        if !self.config.has_credentials() {
            error!("an SDK key and secret are required");
            return Err(SessionError::Uninitialized);
        }

        let params = InitParams {
            web_domain: self.config.web_domain.clone(),
            support_url: self.config.web_domain.clone(),
            language: "en-US".to_string(),
            enable_log_by_default: true,
            enable_generate_dump: true,
        };
        check(self.platform.init_sdk(&params), "initialize SDK")?;
        // From here on the platform needs a matching cleanup call.
        services.initialized = true;

        if let Err(e) = self.create_services(&mut services) {
            drop(services);
            self.cleanup();
            return Err(e);
        }

        info!("SDK initialized");
        Ok(())
    }

    fn create_services(&self, services: &mut Services) -> SessionResult<()> {
        let settings = self
            .platform
            .create_setting_service()
            .map_err(|status| reject(status, "create setting service"))?;
        services.settings = Some(settings);

        let network = self
            .platform
            .create_network_helper()
            .map_err(|status| reject(status, "create network connection helper"))?;
        let proxy = ProxySettings {
            auto_detect: self.config.proxy.is_none(),
            proxy: self.config.proxy.clone(),
        };
        if let Some(proxy) = &proxy.proxy {
            info!("using proxy {}", proxy);
        }
        if check(network.configure_proxy(&proxy), "configure proxy").is_err() {
            warn!("continuing with the platform's default proxy settings");
        }
        services.network = Some(network);

        let meeting = self
            .platform
            .create_meeting_service()
            .map_err(|status| reject(status, "create meeting service"))?;
        services.meeting = Some(meeting);
        Ok(())
    }

    /// Sends the authentication request. The outcome arrives as an event.
    pub fn authenticate(&self) -> SessionResult<()> {
        let mut services = self.services.lock();
        if !services.initialized {
            error!("SDK must be initialized before authenticating");
            return Err(SessionError::Uninitialized);
        }
        if self.is_authenticated() {
            return Ok(());
        }

        let auth = match &services.auth {
            Some(auth) => auth.clone(),
            None => {
                let auth = self
                    .platform
                    .create_auth_service()
                    .map_err(|status| reject(status, "create auth service"))?;
                services.auth = Some(auth.clone());
                auth
            }
        };

        let (on_success, on_failure) = (self.auth.clone(), self.auth.clone());
        let adapter = Arc::new(AuthAdapter::new(
            move || on_success.settle(AuthResult::Success),
            move |result| on_failure.settle(result),
        ));
        check(auth.set_event(Some(adapter)), "register auth listener")?;

        self.auth.reset();
        let context = AuthContext {
            jwt_token: jwt::sign_sdk_token(&self.config.key, &self.config.secret, self.config.jwt_ttl)?,
        };
        check(auth.sdk_auth(&context), "authenticate SDK")
    }

    /// Authenticates and waits for the outcome, pumping platform events
    /// every 10ms until it arrives or `timeout` elapses.
    pub fn authenticate_blocking(&self, timeout: Duration) -> SessionResult<()> {
        self.authenticate()?;

        let deadline = Instant::now() + timeout;
        loop {
            match *self.auth.outcome.lock() {
                Some(AuthResult::Success) => return Ok(()),
                Some(result) => return Err(SessionError::Unauthenticated(result.reason())),
                None => {}
            }

            if Instant::now() >= deadline {
                error!("authentication did not complete within {:?}", timeout);
                return Err(SessionError::Unauthenticated(
                    "authentication timed out".to_string(),
                ));
            }

            self.platform.pump_events();

            let mut outcome = self.auth.outcome.lock();
            if outcome.is_none() {
                self.auth.ready.wait_for(&mut outcome, AUTH_PUMP_INTERVAL);
            }
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.services.lock().initialized
    }

    pub fn is_authenticated(&self) -> bool {
        *self.auth.outcome.lock() == Some(AuthResult::Success)
    }

    pub fn meeting_service(&self) -> Option<Arc<dyn MeetingService>> {
        self.services.lock().meeting.clone()
    }

    pub fn setting_service(&self) -> Option<Arc<dyn SettingService>> {
        self.services.lock().settings.clone()
    }

    /// Releases every service and the platform itself. Safe to repeat.
    pub fn cleanup(&self) {
        let services = std::mem::take(&mut *self.services.lock());

        if let Some(auth) = services.auth {
            let _ = check(auth.set_event(None), "unregister auth listener");
        }
        if services.initialized {
            let _ = check(self.platform.cleanup_sdk(), "clean up SDK");
            debug!("SDK cleaned up");
        }
        self.auth.reset();
    }
}

impl Drop for Sdk {
    fn drop(&mut self) {
        self.cleanup();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::sim::SimPlatform;
    use crate::platform::SdkStatus;

    fn sdk_for(sim: &Arc<SimPlatform>) -> Sdk {
        Sdk::new(sim.clone(), SdkConfig::new("key", "secret"))
    }

    #[test]
    fn test_initialize_creates_services() {
        let sim = SimPlatform::new();
        let sdk = sdk_for(&sim);

        sdk.initialize().unwrap();
        assert!(sdk.is_initialized());
        assert!(sdk.meeting_service().is_some());
        assert!(sdk.setting_service().is_some());

        let params = sim.init_params().unwrap();
        assert_eq!(params.web_domain, "https://zoom.us");
        assert_eq!(params.support_url, "https://zoom.us");
        assert_eq!(
            sim.network.proxies(),
            vec![ProxySettings {
                auto_detect: true,
                proxy: None
            }]
        );

        // Second call is a no-op.
        sdk.initialize().unwrap();
        assert_eq!(sim.network.proxies().len(), 1);
    }

    #[test]
    fn test_initialize_requires_credentials() {
        let sim = SimPlatform::new();
        let sdk = Sdk::new(sim.clone(), SdkConfig::new("", "secret"));
        assert_eq!(sdk.initialize(), Err(SessionError::Uninitialized));
        assert!(sim.init_params().is_none());
    }

    #[test]
    fn test_initialize_failure_is_reported() {
        let sim = SimPlatform::new();
        sim.set_init_status(SdkStatus::ModuleLoadFailed);
        let sdk = sdk_for(&sim);
        let err = sdk.initialize().unwrap_err();
        assert_eq!(err.status(), SdkStatus::ModuleLoadFailed);
        assert!(!sdk.is_initialized());
    }

    #[test]
    fn test_explicit_proxy_disables_auto_detect() {
        let sim = SimPlatform::new();
        let mut config = SdkConfig::new("key", "secret");
        config.proxy = Some("http://proxy:3128".to_string());
        let sdk = Sdk::new(sim.clone(), config);
        sdk.initialize().unwrap();

        let proxies = sim.network.proxies();
        assert!(!proxies[0].auto_detect);
        assert_eq!(proxies[0].proxy.as_deref(), Some("http://proxy:3128"));
    }

    #[test]
    fn test_authenticate_requires_initialize() {
        let sim = SimPlatform::new();
        let sdk = sdk_for(&sim);
        assert_eq!(sdk.authenticate(), Err(SessionError::Uninitialized));
    }

    #[test]
    fn test_authenticate_blocking_pumps_until_success() {
        let sim = SimPlatform::new();
        let sdk = sdk_for(&sim);
        sdk.initialize().unwrap();

        sdk.authenticate_blocking(Duration::from_secs(2)).unwrap();
        assert!(sdk.is_authenticated());
        assert!(sim.pump_count() >= 1);

        let contexts = sim.auth.contexts();
        assert_eq!(contexts.len(), 1);
        assert_eq!(contexts[0].jwt_token.split('.').count(), 3);
    }

    #[test]
    fn test_authenticate_blocking_reports_failure() {
        let sim = SimPlatform::new();
        sim.auth.set_result(AuthResult::KeyOrSecretWrong);
        let sdk = sdk_for(&sim);
        sdk.initialize().unwrap();

        let err = sdk.authenticate_blocking(Duration::from_secs(2)).unwrap_err();
        assert_eq!(
            err,
            SessionError::Unauthenticated("key or secret is wrong".to_string())
        );
        assert!(!sdk.is_authenticated());
    }

    #[test]
    fn test_authenticate_blocking_times_out() {
        let sim = SimPlatform::new();
        sim.auth.set_respond(false);
        let sdk = sdk_for(&sim);
        sdk.initialize().unwrap();

        let started = Instant::now();
        let err = sdk.authenticate_blocking(Duration::from_millis(100)).unwrap_err();
        assert!(matches!(err, SessionError::Unauthenticated(_)));
        assert!(started.elapsed() >= Duration::from_millis(100));
    }

    #[test]
    fn test_cleanup_is_idempotent() {
        let sim = SimPlatform::new();
        let sdk = sdk_for(&sim);
        sdk.initialize().unwrap();
        sdk.authenticate_blocking(Duration::from_secs(2)).unwrap();

        sdk.cleanup();
        sdk.cleanup();
        assert!(!sdk.is_initialized());
        assert!(!sdk.is_authenticated());
        assert!(sdk.meeting_service().is_none());
        assert_eq!(sim.cleanup_count(), 1);

        drop(sdk);
        assert_eq!(sim.cleanup_count(), 1);
    }
}

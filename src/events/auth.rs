//! Authentication result adapter.

use tracing::{error, info};

use crate::platform::{AuthResult, AuthServiceEvent};

type SuccessCallback = Box<dyn Fn() + Send + Sync>;
type FailureCallback = Box<dyn Fn(AuthResult) + Send + Sync>;

pub struct AuthAdapter {
    on_success: SuccessCallback,
    on_failure: FailureCallback,
}

impl AuthAdapter {
    pub fn new(
        on_success: impl Fn() + Send + Sync + 'static,
        on_failure: impl Fn(AuthResult) + Send + Sync + 'static,
    ) -> Self {
        Self {
            on_success: Box::new(on_success),
            on_failure: Box::new(on_failure),
        }
    }
}

impl AuthServiceEvent for AuthAdapter {
    fn on_authentication_return(&self, result: AuthResult) {
        if result == AuthResult::Success {
            info!("SDK authenticated");
            (self.on_success)();
        } else {
            error!("authentication failed because the {}", result.reason());
            (self.on_failure)(result);
        }
    }

    fn on_logout(&self) {}

    fn on_identity_expired(&self) {
        info!("SDK identity expired");
    }
}

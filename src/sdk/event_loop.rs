//! Process event loop.
//!
//! The platform delivers every callback from its own dispatch queue, which
//! only makes progress while somebody pumps it. `run` does that until `stop`
//! is called from another thread.

use parking_lot::{Condvar, Mutex};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use crate::platform::Platform;

pub const DEFAULT_PUMP_INTERVAL: Duration = Duration::from_millis(100);

pub struct EventLoop {
    platform: Arc<dyn Platform>,
    interval: Duration,
    running: AtomicBool,
    stop_requested: Mutex<bool>,
    wake: Condvar,
}

impl EventLoop {
    pub fn new(platform: Arc<dyn Platform>) -> Self {
        Self::with_interval(platform, DEFAULT_PUMP_INTERVAL)
    }

    pub fn with_interval(platform: Arc<dyn Platform>, interval: Duration) -> Self {
        Self {
            platform,
            interval,
            running: AtomicBool::new(false),
            stop_requested: Mutex::new(false),
            wake: Condvar::new(),
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Pumps platform events until [`EventLoop::stop`]. Returns immediately
    /// if the loop is already running on another thread.
    pub fn run(&self) {
        {
            let mut stop = self.stop_requested.lock();
            if self.running.swap(true, Ordering::SeqCst) {
                warn!("event loop is already running");
                return;
            }
            *stop = false;
        }
        info!("starting event loop");

        loop {
            self.platform.pump_events();

            let mut stop = self.stop_requested.lock();
            if !*stop {
                self.wake.wait_for(&mut stop, self.interval);
            }
            if *stop {
                break;
            }
        }

        self.running.store(false, Ordering::SeqCst);
        info!("event loop stopped");
    }

    /// Asks a running loop to return. No effect when the loop is not running.
    pub fn stop(&self) {
        let mut stop = self.stop_requested.lock();
        if !self.is_running() {
            return;
        }
        *stop = true;
        self.wake.notify_all();
    }
}

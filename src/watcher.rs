//! Appearance change notifications.
//!
//! Inside the window the shell observes `AppleInterfaceThemeChangedNotification`
//! on the distributed notification center. Where that is not available a
//! background thread fingerprints the global `AppleInterfaceStyle` default
//! instead. Either way consumers get a payload-less
//! `ControllerEvent::AppearanceChanged` and re-query
//! `ThemeController::current_theme` on receipt.

use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::core::{Invocation, SystemBridge};
use crate::osx::ThemeObserver;
use crate::types::ControllerEvent;

const POLL_TIMEOUT: Duration = Duration::from_secs(5);

enum Source {
    Notification(ThemeObserver),
    Polling {
        stop: Option<mpsc::Sender<()>>,
        handle: Option<JoinHandle<()>>,
    },
}

/// Live subscription. Call `unsubscribe` at shutdown.
pub struct Subscription {
    source: Source,
}

impl Subscription {
    /// Stop delivering events. Removes the observer, or stops and joins the
    /// polling thread.
    pub fn unsubscribe(self) {
        match self.source {
            Source::Notification(observer) => drop(observer),
            Source::Polling { mut stop, mut handle } => {
                stop.take();
                if let Some(handle) = handle.take() {
                    if handle.join().is_err() {
                        log::warn!("appearance watcher panicked");
                    }
                }
            }
        }
        log::debug!("appearance watcher stopped");
    }

    pub fn is_active(&self) -> bool {
        match &self.source {
            Source::Notification(_) => true,
            Source::Polling { handle, .. } => handle.as_ref().is_some_and(|h| !h.is_finished()),
        }
    }

    pub fn is_notification(&self) -> bool {
        matches!(self.source, Source::Notification(_))
    }
}

pub struct AppearanceWatcher;

impl AppearanceWatcher {
    /// Observe the system notification, falling back to polling at `interval`.
    /// Call from the main thread.
    pub fn start<B: SystemBridge>(
        bridge: Arc<B>,
        interval: Duration,
        events: mpsc::Sender<ControllerEvent>,
    ) -> Subscription {
        match ThemeObserver::register(events.clone()) {
            Some(observer) => Subscription {
                source: Source::Notification(observer),
            },
            None => {
                log::info!("appearance notifications unavailable, polling every {:?}", interval);
                Self::subscribe(bridge, interval, events)
            }
        }
    }

    /// Poll the interface-style default on a background thread.
    pub fn subscribe<B: SystemBridge>(
        bridge: Arc<B>,
        interval: Duration,
        events: mpsc::Sender<ControllerEvent>,
    ) -> Subscription {
        let (stop_tx, stop_rx) = mpsc::channel::<()>();
        let handle = thread::spawn(move || {
            let mut last = fingerprint(bridge.as_ref());
            loop {
                match stop_rx.recv_timeout(interval) {
                    Err(RecvTimeoutError::Timeout) => {}
                    // explicit stop or the subscription was dropped
                    _ => break,
                }
                let now = fingerprint(bridge.as_ref());
                if now != last {
                    log::debug!("appearance changed ({:?} -> {:?})", last, now);
                    last = now;
                    if events.send(ControllerEvent::AppearanceChanged).is_err() {
                        break;
                    }
                }
            }
        });
        Subscription {
            source: Source::Polling {
                stop: Some(stop_tx),
                handle: Some(handle),
            },
        }
    }
}

/// Raw state of the interface-style default; only compared, never interpreted.
fn fingerprint<B: SystemBridge>(bridge: &B) -> Option<(Option<i32>, String)> {
    bridge
        .run(&Invocation::interface_style(), POLL_TIMEOUT)
        .ok()
        .map(|out| (out.status, out.stdout.trim().to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::StubBridge;
    use crate::types::Theme;

    const INTERVAL: Duration = Duration::from_millis(20);

    #[test]
    fn change_emits_one_payloadless_event() {
        let bridge = Arc::new(StubBridge::headless(Theme::Light));
        let (tx, rx) = mpsc::channel();
        let sub = AppearanceWatcher::subscribe(bridge.clone(), INTERVAL, tx);

        // give the watcher time to take its baseline
        while bridge.interface_reads() == 0 {
            thread::sleep(Duration::from_millis(5));
        }
        bridge.set_theme(Theme::Dark);

        let event = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(event, ControllerEvent::AppearanceChanged);
        assert!(rx.recv_timeout(INTERVAL * 5).is_err());
        sub.unsubscribe();
    }

    #[test]
    fn unsubscribe_stops_thread() {
        let bridge = Arc::new(StubBridge::headless(Theme::Light));
        let (tx, rx) = mpsc::channel();
        let sub = AppearanceWatcher::subscribe(bridge.clone(), INTERVAL, tx);
        assert!(sub.is_active());
        sub.unsubscribe();

        let reads = bridge.interface_reads();
        bridge.set_theme(Theme::Dark);
        thread::sleep(INTERVAL * 5);
        assert_eq!(bridge.interface_reads(), reads);
        // the sender went away with the thread
        assert!(matches!(rx.try_recv(), Err(mpsc::TryRecvError::Disconnected)));
    }

    #[cfg(target_os = "macos")]
    #[test]
    fn start_prefers_the_system_notification() {
        let bridge = Arc::new(StubBridge::headless(Theme::Light));
        let (tx, _rx) = mpsc::channel();
        let sub = AppearanceWatcher::start(bridge.clone(), INTERVAL, tx);
        assert!(sub.is_notification());

        // nothing is spawned while the appearance stays put
        thread::sleep(INTERVAL * 10);
        assert_eq!(bridge.interface_reads(), 0);
        sub.unsubscribe();
    }

    #[cfg(not(target_os = "macos"))]
    #[test]
    fn start_falls_back_to_polling() {
        let bridge = Arc::new(StubBridge::headless(Theme::Light));
        let (tx, rx) = mpsc::channel();
        let sub = AppearanceWatcher::start(bridge.clone(), INTERVAL, tx);
        assert!(!sub.is_notification());
        assert!(sub.is_active());

        while bridge.interface_reads() == 0 {
            thread::sleep(Duration::from_millis(5));
        }
        bridge.set_theme(Theme::Dark);
        assert_eq!(rx.recv_timeout(Duration::from_secs(5)), Ok(ControllerEvent::AppearanceChanged));
        sub.unsubscribe();
    }
}

//! macOS-specific utilities.

/// Name of NSApp's effective appearance, e.g. `NSAppearanceNameDarkAqua`.
///
/// Only meaningful inside a process that runs an NSApplication; the window
/// shell calls this through `MacBridge::gui`.
#[cfg(target_os = "macos")]
#[allow(deprecated)]
pub fn effective_appearance_name() -> Option<String> {
    use cocoa::base::{id, nil};
    use cocoa::foundation::{NSAutoreleasePool, NSString};
    use objc::{class, msg_send, sel, sel_impl};
    use std::ffi::CStr;

    unsafe {
        let pool = NSAutoreleasePool::new(nil);
        let app: id = msg_send![class!(NSApplication), sharedApplication];
        let name = if app == nil {
            None
        } else {
            let appearance: id = msg_send![app, effectiveAppearance];
            if appearance == nil {
                None
            } else {
                let name: id = msg_send![appearance, name];
                if name == nil {
                    None
                } else {
                    let raw = name.UTF8String();
                    if raw.is_null() {
                        None
                    } else {
                        Some(CStr::from_ptr(raw).to_string_lossy().into_owned())
                    }
                }
            }
        };
        let _: () = msg_send![pool, drain];
        name
    }
}

#[cfg(not(target_os = "macos"))]
pub fn effective_appearance_name() -> Option<String> {
    None
}

/// Distributed notification posted when the user switches light/dark.
pub const THEME_CHANGED_NOTIFICATION: &str = "AppleInterfaceThemeChangedNotification";

#[cfg(target_os = "macos")]
mod observer {
    use std::ffi::c_void;
    use std::sync::mpsc;

    use cocoa::base::{id, nil};
    use cocoa::foundation::{NSAutoreleasePool, NSString};
    use objc::declare::ClassDecl;
    use objc::runtime::{Class, Object, Sel};
    use objc::{class, msg_send, sel, sel_impl};

    use super::THEME_CHANGED_NOTIFICATION;
    use crate::types::ControllerEvent;

    const CLASS_NAME: &str = "ThemeSwitcherAppearanceObserver";
    const SENDER_IVAR: &str = "eventSender";

    extern "C" fn theme_changed(this: &Object, _cmd: Sel, _notification: id) {
        unsafe {
            let ptr: *mut c_void = *this.get_ivar(SENDER_IVAR);
            if ptr.is_null() {
                return;
            }
            let events = &*(ptr as *const mpsc::Sender<ControllerEvent>);
            if events.send(ControllerEvent::AppearanceChanged).is_err() {
                log::debug!("appearance notification dropped: receiver gone");
            }
        }
    }

    fn observer_class() -> Option<&'static Class> {
        if let Some(class) = Class::get(CLASS_NAME) {
            return Some(class);
        }
        let mut decl = ClassDecl::new(CLASS_NAME, class!(NSObject))?;
        decl.add_ivar::<*mut c_void>(SENDER_IVAR);
        unsafe {
            decl.add_method(
                sel!(themeChanged:),
                theme_changed as extern "C" fn(&Object, Sel, id),
            );
        }
        Some(decl.register())
    }

    /// Observer registered on `NSDistributedNotificationCenter`. Owns the
    /// boxed sender its callback writes to; removed and freed on drop.
    pub struct ThemeObserver {
        observer: id,
        events: *mut mpsc::Sender<ControllerEvent>,
    }

    impl ThemeObserver {
        /// Register for theme changes. Must run on the main thread so the
        /// notification is delivered by the main run loop.
        pub fn register(events: mpsc::Sender<ControllerEvent>) -> Option<Self> {
            let class = observer_class()?;
            unsafe {
                let pool = NSAutoreleasePool::new(nil);
                let observer: id = msg_send![class, new];
                if observer == nil {
                    let _: () = msg_send![pool, drain];
                    return None;
                }
                let events = Box::into_raw(Box::new(events));
                (*observer).set_ivar::<*mut c_void>(SENDER_IVAR, events as *mut c_void);

                let center: id = msg_send![class!(NSDistributedNotificationCenter), defaultCenter];
                let name = NSString::alloc(nil).init_str(THEME_CHANGED_NOTIFICATION);
                let _: () = msg_send![center, addObserver:observer
                    selector:sel!(themeChanged:)
                    name:name
                    object:nil];
                let _: () = msg_send![name, release];
                let _: () = msg_send![pool, drain];

                log::debug!("observing {THEME_CHANGED_NOTIFICATION}");
                Some(Self { observer, events })
            }
        }

        /// Deliver a notification by hand, as the center would.
        #[cfg(test)]
        pub fn fire(&self) {
            unsafe {
                let _: () = msg_send![self.observer, themeChanged: nil];
            }
        }
    }

    impl Drop for ThemeObserver {
        fn drop(&mut self) {
            unsafe {
                let center: id = msg_send![class!(NSDistributedNotificationCenter), defaultCenter];
                let _: () = msg_send![center, removeObserver: self.observer];
                (*self.observer).set_ivar::<*mut c_void>(SENDER_IVAR, std::ptr::null_mut());
                let _: () = msg_send![self.observer, release];
                drop(Box::from_raw(self.events));
            }
            log::debug!("stopped observing {THEME_CHANGED_NOTIFICATION}");
        }
    }
}

#[cfg(target_os = "macos")]
pub use observer::ThemeObserver;

/// Stand-in where there is no distributed notification center.
#[cfg(not(target_os = "macos"))]
pub struct ThemeObserver;

#[cfg(not(target_os = "macos"))]
impl ThemeObserver {
    pub fn register(_events: std::sync::mpsc::Sender<crate::types::ControllerEvent>) -> Option<Self> {
        log::debug!("{THEME_CHANGED_NOTIFICATION} is not available on this platform");
        None
    }
}

/// Open System Settings → Privacy & Security at the given deep link (best-effort).
pub fn open_privacy_settings(url: &str) {
    if cfg!(target_os = "macos") {
        if let Err(e) = std::process::Command::new("open").arg(url).spawn() {
            log::warn!("cannot open {url}: {e}");
        }
    }
}

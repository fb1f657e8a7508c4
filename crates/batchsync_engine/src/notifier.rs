use batchsync_core::Notice;
use sync_logging::{sync_info, sync_warn};

/// Whether desktop notifications may be shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DesktopPermission {
    /// The environment has no desktop notification facility.
    #[default]
    Unsupported,
    /// Supported but the user has not answered yet.
    NotAsked,
    Denied,
    Granted,
}

/// Presentation seam for transition notices and error toasts.
pub trait Notifier: Send + Sync {
    /// Transient in-app message. Always shown.
    fn toast(&self, notice: &Notice);

    fn desktop_permission(&self) -> DesktopPermission {
        DesktopPermission::Unsupported
    }

    /// Only called when [`Notifier::desktop_permission`] is `Granted`.
    fn desktop(&self, _notice: &Notice) {}

    fn error_toast(&self, message: &str);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Delivery {
    pub toast: bool,
    pub desktop: bool,
}

/// Shows a notice as a toast, plus a desktop notification when allowed.
pub fn present(notifier: &dyn Notifier, notice: &Notice) -> Delivery {
    notifier.toast(notice);
    let desktop = notifier.desktop_permission() == DesktopPermission::Granted;
    if desktop {
        notifier.desktop(notice);
    }
    Delivery {
        toast: true,
        desktop,
    }
}

/// Notifier that only writes to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn toast(&self, notice: &Notice) {
        sync_info!("[{:?}] {}", notice.severity, notice.message);
    }

    fn error_toast(&self, message: &str) {
        sync_warn!("{}", message);
    }
}

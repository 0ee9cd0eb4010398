//! Production environment.
//!
//! Monotonic time from `std::time::Instant`. The wall clock is trusted only
//! once it reads later than 2020-01-01, which rules out hosts that booted
//! without a real-time clock and have not synced yet. On Linux the link is
//! up when any non-loopback interface reports an operational state of `up`.

use std::{
    path::PathBuf,
    time::{Duration, Instant, SystemTime, UNIX_EPOCH},
};

use departure_core::Environment;

/// Earliest wall-clock time treated as synced: 2020-01-01T00:00:00Z.
pub const TRUSTED_AFTER_MILLIS: i64 = 1_577_836_800_000;

const SYSFS_NET: &str = "/sys/class/net";

/// How the environment decides whether the network link is up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkCheck {
    /// Assume the link is always up
    Assume,
    /// Inspect interface operational state under a sysfs directory
    Sysfs(PathBuf),
}

impl Default for LinkCheck {
    fn default() -> Self {
        if cfg!(target_os = "linux") { Self::Sysfs(PathBuf::from(SYSFS_NET)) } else { Self::Assume }
    }
}

/// Production environment using system time.
#[derive(Debug, Clone, Default)]
pub struct SystemEnv {
    link: LinkCheck,
}

impl SystemEnv {
    /// Environment with the given link detection.
    pub fn new(link: LinkCheck) -> Self {
        Self { link }
    }
}

impl Environment for SystemEnv {
    type Instant = Instant;

    #[allow(clippy::disallowed_methods)]
    fn now(&self) -> Instant {
        Instant::now()
    }

    #[allow(clippy::disallowed_methods)]
    fn wall_clock_millis(&self) -> Option<i64> {
        let since_epoch = SystemTime::now().duration_since(UNIX_EPOCH).ok()?;
        let millis = i64::try_from(since_epoch.as_millis()).ok()?;
        (millis >= TRUSTED_AFTER_MILLIS).then_some(millis)
    }

    fn link_up(&self) -> bool {
        match &self.link {
            LinkCheck::Assume => true,
            LinkCheck::Sysfs(root) => sysfs_link_up(root),
        }
    }

    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Whether any interface other than loopback is operationally up.
///
/// An unreadable directory counts as up so that a missing sysfs never
/// blanks the board.
fn sysfs_link_up(root: &std::path::Path) -> bool {
    let Ok(entries) = std::fs::read_dir(root) else {
        return true;
    };
    entries.filter_map(Result::ok).filter(|entry| entry.file_name() != "lo").any(|entry| {
        std::fs::read_to_string(entry.path().join("operstate"))
            .is_ok_and(|state| state.trim() == "up")
    })
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    fn interface(root: &std::path::Path, name: &str, state: &str) {
        let dir = root.join(name);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("operstate"), format!("{state}\n")).unwrap();
    }

    #[test]
    fn wall_clock_is_trusted_on_a_synced_host() {
        let millis = SystemEnv::new(LinkCheck::Assume).wall_clock_millis();
        assert!(millis.is_some_and(|ms| ms >= TRUSTED_AFTER_MILLIS));
    }

    #[test]
    fn loopback_alone_is_not_a_link() {
        let root = tempfile::tempdir().unwrap();
        interface(root.path(), "lo", "unknown");
        interface(root.path(), "eth0", "down");

        let env = SystemEnv::new(LinkCheck::Sysfs(root.path().to_owned()));
        assert!(!env.link_up());

        interface(root.path(), "wlan0", "up");
        assert!(env.link_up());
    }

    #[test]
    fn missing_sysfs_counts_as_up() {
        let env = SystemEnv::new(LinkCheck::Sysfs(PathBuf::from("/nonexistent/sys/class/net")));
        assert!(env.link_up());
    }
}

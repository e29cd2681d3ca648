//! "Is there a usable network path right now?"

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

pub trait Connectivity: Send + Sync {
  /// Cheap local check; must not touch the network.
  fn is_available(&self) -> bool;
}

/// Looks for a non-loopback interface that is up.
///
/// Reads `/sys/class/net/<iface>/operstate`. Virtual links (tun, wireguard)
/// often report `unknown` rather than `up`, so both count. Where the sysfs
/// tree does not exist the check cannot say anything and reports available.
pub struct SystemConnectivity {
  root: PathBuf,
}

impl SystemConnectivity {
  pub fn new() -> Self {
    Self::with_root("/sys/class/net")
  }

  fn with_root(root: impl Into<PathBuf>) -> Self {
    Self { root: root.into() }
  }

  fn interface_is_up(dir: &Path) -> bool {
    std::fs::read_to_string(dir.join("operstate"))
      .map(|state| matches!(state.trim(), "up" | "unknown"))
      .unwrap_or(false)
  }
}

impl Default for SystemConnectivity {
  fn default() -> Self {
    Self::new()
  }
}

impl Connectivity for SystemConnectivity {
  fn is_available(&self) -> bool {
    let entries = match std::fs::read_dir(&self.root) {
      Ok(entries) => entries,
      Err(_) => return true,
    };

    entries
      .filter_map(|entry| entry.ok())
      .filter(|entry| entry.file_name() != "lo")
      .any(|entry| Self::interface_is_up(&entry.path()))
  }
}

/// Connectivity that is whatever it was last set to.
///
/// Backs the `--offline` flag and lets tests flip the network on and off.
#[derive(Debug)]
pub struct StaticConnectivity {
  online: AtomicBool,
}

impl StaticConnectivity {
  pub fn new(online: bool) -> Self {
    Self {
      online: AtomicBool::new(online),
    }
  }

  #[allow(dead_code)]
  pub fn set(&self, online: bool) {
    self.online.store(online, Ordering::SeqCst);
  }
}

impl Connectivity for StaticConnectivity {
  fn is_available(&self) -> bool {
    self.online.load(Ordering::SeqCst)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn fake_iface(root: &Path, name: &str, state: &str) {
    let dir = root.join(name);
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("operstate"), format!("{state}\n")).unwrap();
  }

  #[test]
  fn test_only_loopback_is_offline() {
    let root = tempfile::tempdir().unwrap();
    fake_iface(root.path(), "lo", "unknown");

    assert!(!SystemConnectivity::with_root(root.path()).is_available());
  }

  #[test]
  fn test_up_interface_is_online() {
    let root = tempfile::tempdir().unwrap();
    fake_iface(root.path(), "lo", "unknown");
    fake_iface(root.path(), "eth0", "down");
    fake_iface(root.path(), "wlan0", "up");

    assert!(SystemConnectivity::with_root(root.path()).is_available());
  }

  #[test]
  fn test_all_down_is_offline() {
    let root = tempfile::tempdir().unwrap();
    fake_iface(root.path(), "eth0", "down");
    fake_iface(root.path(), "wlan0", "dormant");

    assert!(!SystemConnectivity::with_root(root.path()).is_available());
  }

  #[test]
  fn test_missing_sysfs_assumes_online() {
    let root = tempfile::tempdir().unwrap();
    let missing = root.path().join("nope");

    assert!(SystemConnectivity::with_root(missing).is_available());
  }

  #[test]
  fn test_static_connectivity_flips() {
    let conn = StaticConnectivity::new(false);
    assert!(!conn.is_available());
    conn.set(true);
    assert!(conn.is_available());
  }
}

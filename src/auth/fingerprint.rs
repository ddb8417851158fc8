//! Weak device fingerprint.
//!
//! Raises the cost of copying a session to another machine. It is not a
//! security boundary on its own: attributes change across browser and OS
//! updates, and anyone controlling both devices can forge it.

use base64::{engine::general_purpose, Engine as _};

/// Placeholder used for any attribute that cannot be observed.
pub const UNKNOWN: &str = "unknown";

const SEPARATOR: &str = "||";

/// Locally observable device attributes. Any of them may be missing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceAttributes {
    /// Screen geometry in pixels as `(width, height)`.
    pub screen: Option<(u32, u32)>,
    /// Locale tag, e.g. `fr-FR`.
    pub locale: Option<String>,
    /// Minutes to add to local time to get UTC (same sign as the browser's
    /// `getTimezoneOffset`).
    pub timezone_offset_minutes: Option<i32>,
    pub logical_cpus: Option<u32>,
    /// Approximate device memory in whole gigabytes.
    pub device_memory_gb: Option<u32>,
}

impl DeviceAttributes {
    /// Collect what a native process can see. Never fails; anything not
    /// observable is left as `None`.
    pub fn detect() -> Self {
        Self {
            screen: None,
            locale: detect_locale(),
            timezone_offset_minutes: Some(detect_timezone_offset()),
            logical_cpus: std::thread::available_parallelism()
                .ok()
                .and_then(|n| u32::try_from(n.get()).ok()),
            device_memory_gb: detect_memory_gb(),
        }
    }

    /// Encode the attributes into the fingerprint string.
    pub fn fingerprint(&self) -> String {
        let screen = self
            .screen
            .map(|(w, h)| format!("{}x{}", w, h))
            .unwrap_or_else(|| UNKNOWN.to_string());
        let locale = self
            .locale
            .as_deref()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .unwrap_or(UNKNOWN)
            .to_string();
        let parts = [
            screen,
            locale,
            or_unknown(self.timezone_offset_minutes),
            or_unknown(self.logical_cpus),
            or_unknown(self.device_memory_gb),
        ];
        general_purpose::STANDARD.encode(parts.join(SEPARATOR))
    }
}

fn or_unknown<T: ToString>(value: Option<T>) -> String {
    value
        .map(|v| v.to_string())
        .unwrap_or_else(|| UNKNOWN.to_string())
}

fn detect_locale() -> Option<String> {
    ["LC_ALL", "LC_MESSAGES", "LANG"]
        .iter()
        .filter_map(|var| std::env::var(var).ok())
        .find(|v| !v.is_empty() && v != "C" && v != "POSIX")
        .map(|v| {
            // "fr_FR.UTF-8" -> "fr-FR"
            let tag = v.split('.').next().unwrap_or(&v);
            tag.replace('_', "-")
        })
}

fn detect_timezone_offset() -> i32 {
    use chrono::Offset;
    let east_secs = chrono::Local::now().offset().fix().local_minus_utc();
    -east_secs / 60
}

#[cfg(target_os = "linux")]
fn detect_memory_gb() -> Option<u32> {
    let meminfo = std::fs::read_to_string("/proc/meminfo").ok()?;
    let kib: u64 = meminfo
        .lines()
        .find(|l| l.starts_with("MemTotal:"))?
        .split_whitespace()
        .nth(1)?
        .parse()
        .ok()?;
    let gb = (kib as f64 / (1024.0 * 1024.0)).round() as u32;
    Some(gb.max(1))
}

#[cfg(not(target_os = "linux"))]
fn detect_memory_gb() -> Option<u32> {
    None
}

//! Current time and host name for newly created log records.

use chrono::{DateTime, SubsecRound, Utc};

const FALLBACK_HOSTNAME: &str = "localhost";

/// Current UTC time at the store's millisecond precision, so a record read
/// back from the store compares equal to the one that was written.
pub fn utc_now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(3)
}

pub fn hostname() -> String {
    platform_hostname()
        .map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| FALLBACK_HOSTNAME.to_string())
}

#[cfg(unix)]
fn platform_hostname() -> Option<String> {
    let mut buffer = [0u8; 256];
    // SAFETY: the pointer and length describe a writable buffer we own.
    let status =
        unsafe { libc::gethostname(buffer.as_mut_ptr().cast::<libc::c_char>(), buffer.len()) };
    if status != 0 {
        return None;
    }
    let end = buffer.iter().position(|byte| *byte == 0).unwrap_or(buffer.len());
    Some(String::from_utf8_lossy(&buffer[..end]).into_owned())
}

#[cfg(not(unix))]
fn platform_hostname() -> Option<String> {
    std::env::var("COMPUTERNAME")
        .or_else(|_| std::env::var("HOSTNAME"))
        .ok()
}

//! Platform identifier for report payloads
//!
//! The collection endpoint groups reports by a short platform string, not by
//! a full user-agent. Identifiers match what the browser's stats updater
//! sends (`winx64`, `osx`, `linux`, ...).

/// Returns the platform identifier for the current build target.
pub fn platform_identifier() -> &'static str {
    identifier_for(std::env::consts::OS, std::env::consts::ARCH)
}

fn identifier_for(os: &str, arch: &str) -> &'static str {
    match (os, arch) {
        ("windows", "x86_64") => "winx64",
        ("windows", _) => "winia32",
        ("macos", _) => "osx",
        ("android", _) => "android",
        ("linux", _) => "linux",
        _ => "unknown",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_platforms() {
        assert_eq!(identifier_for("windows", "x86_64"), "winx64");
        assert_eq!(identifier_for("windows", "x86"), "winia32");
        assert_eq!(identifier_for("macos", "aarch64"), "osx");
        assert_eq!(identifier_for("linux", "x86_64"), "linux");
        assert_eq!(identifier_for("android", "aarch64"), "android");
        assert_eq!(identifier_for("freebsd", "x86_64"), "unknown");
    }

    #[test]
    fn test_current_platform_is_nonempty() {
        assert!(!platform_identifier().is_empty());
    }
}

//! Central configuration constants for batch defaults and runtime limits.

/// Build configurations offered when a profile does not list its own.
/// Server and editor variants are included.
pub const DEFAULT_CONFIGS: &[&str] = &[
    "Debug",
    "DebugGame",
    "DebugServer",
    "DebugEditor",
    "Development",
    "DevelopmentServer",
    "DevelopmentEditor",
    "Test",
    "TestServer",
    "TestEditor",
    "Shipping",
    "ShippingServer",
    "ShippingEditor",
];

/// Target platforms offered when a profile does not list its own.
pub const DEFAULT_PLATFORMS: &[&str] = &["Win64", "Linux", "Mac", "Android"];

/// Platforms an editor configuration can be built for.
pub const EDITOR_PLATFORMS: &[&str] = &["Win64", "Linux", "Mac"];

/// How often the process watcher checks for child exit or a cancel request.
pub const RUNNER_POLL_INTERVAL_MS: u64 = 25;

/// How long a cancelled process tree gets to exit before it is killed outright.
pub const CANCEL_GRACE_MS: u64 = 5_000;

/// Platforms allowed for `config`, or `None` when any platform is fine.
pub fn allowed_platforms_for_config(config: &str) -> Option<&'static [&'static str]> {
    if config.ends_with("Editor") {
        Some(EDITOR_PLATFORMS)
    } else {
        None
    }
}

/// Convenience check built on [`allowed_platforms_for_config`].
pub fn is_platform_allowed(config: &str, platform: &str) -> bool {
    allowed_platforms_for_config(config)
        .map(|allowed| allowed.contains(&platform))
        .unwrap_or(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_configs_include_server_and_editor() {
        assert!(DEFAULT_CONFIGS.contains(&"DevelopmentServer"));
        assert!(DEFAULT_CONFIGS.contains(&"DevelopmentEditor"));
    }

    #[test]
    fn default_platforms_include_mac() {
        assert!(DEFAULT_PLATFORMS.contains(&"Mac"));
    }

    #[test]
    fn editor_configs_are_restricted_to_desktop_platforms() {
        assert!(is_platform_allowed("DevelopmentEditor", "Linux"));
        assert!(!is_platform_allowed("DevelopmentEditor", "Android"));
        assert!(is_platform_allowed("Shipping", "Android"));
    }
}

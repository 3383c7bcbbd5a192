use serde::{Deserialize, Serialize};

/// Configuration for the PDP gate.
///
/// Loaded once at startup and treated as read-only for the lifetime of the
/// enforcement session. Every field has a default so a missing or partial
/// config file still produces a usable (if inactive) gate.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PdpConfig {
    /// Master switch. Enforcement also requires `endpoint` to be set.
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Authorization endpoint (point decisions). Enforcement is inactive
    /// without it.
    #[serde(default)]
    pub endpoint: Option<String>,

    /// Partial-evaluation endpoint (constraint queries). The advisory tool
    /// treats its absence as a hard configuration error.
    #[serde(default)]
    pub constraint_endpoint: Option<String>,

    /// Per-request deadline in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Treat decision-service failures as Allow instead of Deny.
    /// Off by default: an unreachable PDP must never widen access.
    #[serde(default)]
    pub fail_open: bool,

    /// Entity namespace for principal/action/resource identifiers.
    #[serde(default = "default_namespace")]
    pub namespace: String,

    /// Principal used for context-free constraint queries.
    #[serde(default = "default_query_principal")]
    pub query_principal: String,

    /// Base command words blocked by the bundled deny-list interceptor.
    #[serde(default)]
    pub deny_commands: Vec<String>,
}

fn default_enabled() -> bool {
    true
}

fn default_timeout_ms() -> u64 {
    2000
}

fn default_namespace() -> String {
    "OpenClaw".into()
}

fn default_query_principal() -> String {
    "main".into()
}

impl Default for PdpConfig {
    fn default() -> Self {
        toml::from_str("").expect("empty config must deserialize via defaults")
    }
}

impl PdpConfig {
    /// Load configuration from ~/.config/pdp-gate/config.toml, falling back
    /// to defaults when the file is absent or unreadable. A present but
    /// malformed file is reported on stderr and ignored rather than killing
    /// the hook.
    pub fn load() -> Self {
        Self::load_user_file().unwrap_or_default()
    }

    fn load_user_file() -> Option<Self> {
        let home = std::env::var_os("HOME")?;
        let path = std::path::Path::new(&home).join(".config/pdp-gate/config.toml");
        let content = std::fs::read_to_string(path).ok()?;
        match toml::from_str(&content) {
            Ok(config) => Some(config),
            Err(e) => {
                eprintln!("pdp-gate: config parse error: {e}");
                None
            }
        }
    }

    /// Whether point-decision enforcement is active.
    pub fn is_active(&self) -> bool {
        self.enabled && self.endpoint.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = PdpConfig::default();
        assert!(config.enabled);
        assert_eq!(config.endpoint, None);
        assert_eq!(config.timeout_ms, 2000);
        assert!(!config.fail_open);
        assert_eq!(config.namespace, "OpenClaw");
        assert_eq!(config.query_principal, "main");
        assert!(!config.is_active());
    }

    #[test]
    fn partial_file_fills_gaps() {
        let config: PdpConfig =
            toml::from_str("endpoint = \"http://localhost:8180/authorize\"").unwrap();
        assert!(config.is_active());
        assert_eq!(config.timeout_ms, 2000);
        assert!(!config.fail_open);
    }

    #[test]
    fn disabled_overrides_endpoint() {
        let config: PdpConfig =
            toml::from_str("enabled = false\nendpoint = \"http://localhost:8180/authorize\"")
                .unwrap();
        assert!(!config.is_active());
    }
}

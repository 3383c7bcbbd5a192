//! Bundled interceptors.
//!
//! Only one ships by default: a flat deny list over the base command word
//! of `bash` actions, driven by `deny_commands` in the config file. Runs
//! after the PDP decision, so it can only tighten the verdict.

use serde_json::{Map, Value};

use crate::config::PdpConfig;
use crate::enforce::{Interceptor, InterceptorAction, InterceptorError};
use crate::ident::normalize_action;

/// Blocks `bash` actions whose base command is on the configured deny list.
/// Dotted variants match their prefix (`mkfs.ext4` matches `mkfs`).
pub struct DenyListInterceptor {
    deny_commands: Vec<String>,
}

impl DenyListInterceptor {
    pub fn from_config(config: &PdpConfig) -> Self {
        Self {
            deny_commands: config.deny_commands.clone(),
        }
    }

    fn is_denied(&self, base: &str) -> bool {
        let prefix = base.split('.').next().unwrap_or("");
        self.deny_commands
            .iter()
            .any(|c| c == base || c == prefix)
    }
}

impl Interceptor for DenyListInterceptor {
    fn name(&self) -> &str {
        "deny-list"
    }

    fn inspect(
        &self,
        action_name: &str,
        parameters: &Map<String, Value>,
    ) -> Result<InterceptorAction, InterceptorError> {
        if normalize_action(action_name) != "bash" {
            return Ok(InterceptorAction::Pass);
        }

        let command = parameters
            .get("command")
            .and_then(Value::as_str)
            .unwrap_or("");
        let base = base_command(command);
        if !base.is_empty() && self.is_denied(&base) {
            return Ok(InterceptorAction::Block {
                reason: format!("blocked command: {base}"),
            });
        }
        Ok(InterceptorAction::Pass)
    }
}

/// Extract the first real command word, skipping leading VAR=value assignments.
fn base_command(command: &str) -> String {
    let mut rest = command.trim();
    loop {
        if let Some(eq_pos) = rest.find('=') {
            let before_eq = &rest[..eq_pos];
            if !before_eq.is_empty()
                && before_eq
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '_')
                && before_eq
                    .chars()
                    .next()
                    .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
            {
                let after_eq = &rest[eq_pos + 1..];
                if let Some(sp) = after_eq.find(char::is_whitespace) {
                    rest = after_eq[sp..].trim_start();
                    continue;
                }
            }
        }
        break;
    }
    rest.split_whitespace().next().unwrap_or("").to_string()
}

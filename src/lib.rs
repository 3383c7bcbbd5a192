//! pdp-gate: a PreToolUse hook that gates agent tool calls through an
//! external Cedar PDP.
//!
//! Before a tool call runs, the gate maps it onto canonical
//! principal/action/resource identifiers, asks the policy decision point
//! for a verdict, then runs a chain of local interceptors that can block
//! the call or patch its parameters. A separate advisory surface queries
//! the PDP's partial evaluator for the residual constraints governing an
//! action, so an agent can plan before attempting anything.
//!
//! # Architecture
//!
//! - **[`ident`]** — Canonical identifiers: principal/action/resource plus a fixed-shape context.
//! - **[`pdp`]** — Decision and constraint-query clients; fail-open/fail-closed handling.
//! - **[`enforce`]** — Enforcement hook: PDP verdict first, then the interceptor chain.
//! - **[`interceptors`]** — Bundled interceptors (config-driven command deny list).
//! - **[`constraints`]** — Advisory constraint summaries for proactive planning.
//! - **[`config`]** — Configuration loading: serde defaults + user file.
//! - **[`logging`]** — Outcome logging to `~/.local/share/pdp-gate/decisions.log`.

/// Configuration types and loading.
pub mod config;
/// Constraint advisory tool: query + human-readable rendering.
pub mod constraints;
/// Enforcement hook, interceptor trait, and outcome types.
pub mod enforce;
/// PDP error taxonomy.
pub mod error;
/// Canonical identifier construction.
pub mod ident;
/// Bundled interceptor implementations.
pub mod interceptors;
/// File-based outcome logging.
pub mod logging;
/// HTTP clients for the decision service.
pub mod pdp;

use std::sync::Arc;

use config::PdpConfig;
use enforce::EnforcementHook;
use error::PdpResult;
use interceptors::DenyListInterceptor;
use pdp::PdpClient;

/// Compose the enforcement hook described by a configuration.
///
/// The decision point is attached only when enforcement is active
/// (enabled + endpoint set); the deny-list interceptor only when the
/// config lists commands for it. An unconfigured gate passes everything
/// through untouched.
pub fn hook_from_config(config: &PdpConfig) -> PdpResult<EnforcementHook> {
    let mut hook = EnforcementHook::new(&config.namespace);
    if config.is_active() {
        hook = hook.with_decision_point(Arc::new(PdpClient::new(config.clone())?));
    }
    if !config.deny_commands.is_empty() {
        hook = hook.with_interceptor(Box::new(DenyListInterceptor::from_config(config)));
    }
    Ok(hook)
}

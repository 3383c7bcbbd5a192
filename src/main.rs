//! pdp-gate: PreToolUse hook for PDP-gated tool calls.
//!
//! Reads a tool-call event as JSON from stdin, enforces it against the
//! configured policy decision point and interceptor chain, and writes a
//! permission decision to stdout.
//!
//! Second mode: `pdp-gate constraints <action>` queries the PDP's partial
//! evaluator and prints a summary of the residual constraints governing
//! that action.

use serde::Deserialize;
use serde_json::{Map, Value};
use std::io::Read;

use pdp_gate::config::PdpConfig;
use pdp_gate::enforce::EnforcementOutcome;
use pdp_gate::pdp::PdpClient;
use pdp_gate::{constraints, hook_from_config, logging};

#[derive(Deserialize)]
struct HookInput {
    tool_name: Option<String>,
    tool_input: Option<Map<String, Value>>,
    session_id: Option<String>,
    tool_call_id: Option<String>,
}

#[tokio::main]
async fn main() {
    // stdout carries the decision; logs go to stderr.
    let _ = simplelog::TermLogger::init(
        log::LevelFilter::Warn,
        simplelog::Config::default(),
        simplelog::TerminalMode::Stderr,
        simplelog::ColorChoice::Never,
    );

    let args: Vec<String> = std::env::args().collect();
    if args.get(1).map(String::as_str) == Some("constraints") {
        let Some(action) = args.get(2) else {
            eprintln!("usage: pdp-gate constraints <action>");
            std::process::exit(2);
        };
        run_constraints(action).await;
        return;
    }

    run_hook().await;
}

/// Advisory mode: print the constraint summary for one action as JSON.
/// Any failure is fatal — a made-up verdict would be worse than none.
async fn run_constraints(action: &str) {
    let config = PdpConfig::load();
    let client = match PdpClient::new(config) {
        Ok(client) => client,
        Err(e) => {
            eprintln!("pdp-gate: {e}");
            std::process::exit(1);
        }
    };

    match constraints::advise(&client, action).await {
        Ok(summary) => {
            println!("{}", serde_json::to_string_pretty(&summary).unwrap());
        }
        Err(e) => {
            eprintln!("pdp-gate: {e}");
            std::process::exit(1);
        }
    }
}

/// Hook mode: enforce the tool call described on stdin.
async fn run_hook() {
    let mut input = String::new();
    if std::io::stdin().read_to_string(&mut input).is_err() {
        eprintln!("failed to read stdin");
        std::process::exit(1);
    }

    let hook_input: HookInput = match serde_json::from_str(&input) {
        Ok(v) => v,
        Err(e) => {
            eprintln!("JSON parse error: {e}");
            std::process::exit(1);
        }
    };

    // No tool name → not a tool-call event; nothing to gate.
    let Some(tool_name) = hook_input.tool_name else {
        std::process::exit(0);
    };

    let parameters = hook_input.tool_input.unwrap_or_default();
    let original = parameters.clone();

    let config = PdpConfig::load();
    let outcome = match hook_from_config(&config) {
        Ok(hook) => {
            hook.enforce(
                &tool_name,
                parameters,
                hook_input.tool_call_id.as_deref(),
                hook_input.session_id.as_deref(),
            )
            .await
        }
        // A gate that cannot be built must not wave actions through.
        Err(e) => EnforcementOutcome::Blocked {
            reason: format!("authorization setup failed: {e}"),
        },
    };

    logging::log_outcome(&tool_name, &outcome);

    let hook_output = match &outcome {
        EnforcementOutcome::Blocked { reason } => serde_json::json!({
            "hookEventName": "PreToolUse",
            "permissionDecision": "deny",
            "permissionDecisionReason": reason,
        }),
        EnforcementOutcome::Proceed { parameters } => {
            let mut out = serde_json::json!({
                "hookEventName": "PreToolUse",
                "permissionDecision": "allow",
                "permissionDecisionReason": "permitted by policy gate",
            });
            if *parameters != original {
                out["updatedInput"] = Value::Object(parameters.clone());
            }
            out
        }
    };

    let output = serde_json::json!({ "hookSpecificOutput": hook_output });
    println!("{}", serde_json::to_string(&output).unwrap());
}

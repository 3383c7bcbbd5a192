//! Canonical identifier construction for PDP requests.
//!
//! Maps an intercepted tool call onto the entity identifiers the decision
//! service expects: a principal, a namespaced action, a resource, and a
//! fixed-shape context. Pure and infallible; defaults fill every gap.

use serde::Serialize;
use serde_json::{Map, Value};

/// Principal used when neither an actor nor a session is known.
pub const UNKNOWN_PRINCIPAL: &str = "unknown";

/// Caller-supplied action names that map onto a canonical tool name.
const ACTION_ALIASES: &[(&str, &str)] = &[("exec", "bash"), ("shell", "bash")];

/// An intercepted tool call, as handed to the gate by the action framework.
#[derive(Debug, Clone, Default)]
pub struct ActionRequest {
    pub actor_id: Option<String>,
    pub session_id: Option<String>,
    pub action_name: String,
    pub parameters: Map<String, Value>,
    pub call_id: Option<String>,
}

/// Canonical identifiers for one authorization request.
///
/// Serializes directly into the decision-request wire shape.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DecisionIdentifiers {
    pub principal: String,
    pub action: String,
    pub resource: String,
    pub context: Map<String, Value>,
}

/// Normalize a caller-supplied action name to its canonical tool name.
/// Canonical names pass through unchanged.
pub fn normalize_action(name: &str) -> String {
    let lowered = name.to_ascii_lowercase();
    for (alias, canonical) in ACTION_ALIASES {
        if lowered == *alias {
            return (*canonical).to_string();
        }
    }
    lowered
}

/// PascalCase a tool name: split on `-`/`_`, capitalize each segment.
fn pascal_case(name: &str) -> String {
    name.split(['-', '_'])
        .filter(|seg| !seg.is_empty())
        .map(|seg| {
            let mut chars = seg.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect()
}

/// Build the action identifier for a (not yet normalized) tool name.
pub fn action_identifier(namespace: &str, action_name: &str) -> String {
    let canonical = normalize_action(action_name);
    format!(
        "{namespace}::Action::\"ToolExec::{}\"",
        pascal_case(&canonical)
    )
}

/// Build the resource identifier for a (not yet normalized) tool name.
pub fn resource_identifier(namespace: &str, action_name: &str) -> String {
    format!("{namespace}::Tool::\"{}\"", normalize_action(action_name))
}

/// Build the principal identifier from an explicit principal name.
pub fn principal_identifier(namespace: &str, principal: &str) -> String {
    format!("{namespace}::Agent::\"{principal}\"")
}

/// Parameter keys folded into fixed context fields rather than merged through.
const CONSUMED_KEYS: &[&str] = &["path", "file_path", "command"];

/// Build the full identifier set for a point decision.
///
/// The context always carries `toolCallId`, `filePath`, and `command`
/// (empty strings when the caller supplied nothing) because the decision
/// service validates context against a fixed schema; a missing field fails
/// validation before any policy is evaluated. `sessionKey` is added when a
/// session is known. Remaining caller parameters merge in without
/// overwriting the fixed fields.
pub fn build_identifiers(namespace: &str, request: &ActionRequest) -> DecisionIdentifiers {
    let principal_name = request
        .actor_id
        .as_deref()
        .or(request.session_id.as_deref())
        .unwrap_or(UNKNOWN_PRINCIPAL);

    let mut context = Map::new();
    context.insert(
        "toolCallId".into(),
        Value::String(request.call_id.clone().unwrap_or_default()),
    );
    context.insert(
        "filePath".into(),
        Value::String(
            str_param(&request.parameters, "path")
                .or_else(|| str_param(&request.parameters, "file_path"))
                .unwrap_or_default(),
        ),
    );
    context.insert(
        "command".into(),
        Value::String(str_param(&request.parameters, "command").unwrap_or_default()),
    );
    if let Some(session) = &request.session_id {
        context.insert("sessionKey".into(), Value::String(session.clone()));
    }

    for (key, value) in &request.parameters {
        if CONSUMED_KEYS.contains(&key.as_str()) || context.contains_key(key) {
            continue;
        }
        context.insert(key.clone(), value.clone());
    }

    DecisionIdentifiers {
        principal: principal_identifier(namespace, principal_name),
        action: action_identifier(namespace, &request.action_name),
        resource: resource_identifier(namespace, &request.action_name),
        context,
    }
}

fn str_param(parameters: &Map<String, Value>, key: &str) -> Option<String> {
    parameters
        .get(key)
        .and_then(Value::as_str)
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    const NS: &str = "OpenClaw";

    fn request(action: &str) -> ActionRequest {
        ActionRequest {
            action_name: action.into(),
            ..Default::default()
        }
    }

    #[test]
    fn alias_exec_maps_to_bash() {
        assert_eq!(normalize_action("exec"), "bash");
        assert_eq!(
            action_identifier(NS, "exec"),
            action_identifier(NS, "bash")
        );
    }

    #[test]
    fn normalization_is_idempotent() {
        let once = normalize_action("exec");
        assert_eq!(normalize_action(&once), once);
        assert_eq!(normalize_action("write"), "write");
    }

    #[test]
    fn action_is_pascal_cased_and_namespaced() {
        assert_eq!(
            action_identifier(NS, "write"),
            "OpenClaw::Action::\"ToolExec::Write\""
        );
        assert_eq!(
            action_identifier(NS, "apply_patch"),
            "OpenClaw::Action::\"ToolExec::ApplyPatch\""
        );
        assert_eq!(
            action_identifier(NS, "file-search"),
            "OpenClaw::Action::\"ToolExec::FileSearch\""
        );
    }

    #[test]
    fn resource_keeps_raw_name() {
        assert_eq!(
            resource_identifier(NS, "write"),
            "OpenClaw::Tool::\"write\""
        );
    }

    #[test]
    fn principal_prefers_actor_then_session_then_unknown() {
        let mut req = request("read");
        assert_eq!(
            build_identifiers(NS, &req).principal,
            "OpenClaw::Agent::\"unknown\""
        );

        req.session_id = Some("sess-1".into());
        assert_eq!(
            build_identifiers(NS, &req).principal,
            "OpenClaw::Agent::\"sess-1\""
        );

        req.actor_id = Some("agent-abc".into());
        assert_eq!(
            build_identifiers(NS, &req).principal,
            "OpenClaw::Agent::\"agent-abc\""
        );
    }

    #[test]
    fn context_fixed_fields_always_present() {
        let ids = build_identifiers(NS, &request("read"));
        assert_eq!(ids.context["toolCallId"], "");
        assert_eq!(ids.context["filePath"], "");
        assert_eq!(ids.context["command"], "");
        assert!(!ids.context.contains_key("sessionKey"));
    }

    #[test]
    fn context_extracts_path_and_command() {
        let mut req = request("write");
        req.parameters
            .insert("path".into(), Value::String("/tmp/out.txt".into()));
        req.parameters
            .insert("command".into(), Value::String("git status".into()));
        let ids = build_identifiers(NS, &req);
        assert_eq!(ids.context["filePath"], "/tmp/out.txt");
        assert_eq!(ids.context["command"], "git status");
    }

    #[test]
    fn file_path_parameter_is_fallback_for_path() {
        let mut req = request("read");
        req.parameters
            .insert("file_path".into(), Value::String("/etc/hosts".into()));
        let ids = build_identifiers(NS, &req);
        assert_eq!(ids.context["filePath"], "/etc/hosts");
    }

    #[test]
    fn session_key_present_with_session() {
        let mut req = request("read");
        req.session_id = Some("sess-9".into());
        req.call_id = Some("call-1".into());
        let ids = build_identifiers(NS, &req);
        assert_eq!(ids.context["sessionKey"], "sess-9");
        assert_eq!(ids.context["toolCallId"], "call-1");
    }

    #[test]
    fn extra_parameters_merge_without_overwriting() {
        let mut req = request("write");
        req.parameters
            .insert("content".into(), Value::String("hello".into()));
        // A caller-supplied "filePath" must not clobber the normalized field.
        req.parameters
            .insert("filePath".into(), Value::String("/spoofed".into()));
        req.parameters
            .insert("path".into(), Value::String("/real".into()));
        let ids = build_identifiers(NS, &req);
        assert_eq!(ids.context["content"], "hello");
        assert_eq!(ids.context["filePath"], "/real");
    }

    #[test]
    fn builder_is_deterministic() {
        let mut req = request("bash");
        req.parameters
            .insert("command".into(), Value::String("ls".into()));
        req.call_id = Some("call-7".into());
        assert_eq!(build_identifiers(NS, &req), build_identifiers(NS, &req));
    }

    #[test]
    fn non_string_path_defaults_to_empty() {
        let mut req = request("write");
        req.parameters.insert("path".into(), Value::from(42));
        let ids = build_identifiers(NS, &req);
        assert_eq!(ids.context["filePath"], "");
        // Consumed keys never ride along under their raw name.
        assert!(!ids.context.contains_key("path"));
    }
}

//! Caller-invokable constraint discovery.
//!
//! Wraps the constraint query client and renders the residual policy
//! expressions for an agent to plan against, before it attempts an action.
//! Advisory only — nothing here enforces anything, which is why every
//! failure is surfaced instead of being mapped to allow or deny.

use serde::Serialize;

use crate::error::{PdpError, PdpResult};
use crate::ident::normalize_action;
use crate::pdp::PdpClient;

/// Closed vocabulary the advisory tool accepts, post-normalization.
const ADVISORY_ACTIONS: &[&str] = &["read", "write", "edit", "bash"];

/// Shown when the PDP returns no residuals. Partial evaluation collapses
/// both unconditional outcomes into an empty list, so the wording must
/// stay ambiguous.
const NO_RESIDUALS: &str = "No residual constraints returned; the policy set \
either allows this action unconditionally or denies it unconditionally.";

/// Rendered result of one constraint query.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConstraintSummary {
    pub action: String,
    pub decision: String,
    pub constraint_count: usize,
    pub constraints: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
}

/// Query the PDP for the constraints governing `action` and summarize them.
///
/// Fails hard on unknown actions, missing configuration, or any query
/// failure — a fabricated "allowed"/"denied" answer from a broken query
/// would be worse than no answer.
pub async fn advise(client: &PdpClient, action: &str) -> PdpResult<ConstraintSummary> {
    let normalized = normalize_action(action);
    if !ADVISORY_ACTIONS.contains(&normalized.as_str()) {
        return Err(PdpError::UnsupportedAction {
            name: action.to_string(),
        });
    }

    let result = client.query_constraints(&normalized).await?;
    Ok(ConstraintSummary {
        action: normalized,
        constraint_count: result.residuals.len(),
        constraints: render_residuals(&result.residuals),
        decision: result.decision,
        explanation: result.explanation,
    })
}

/// Number the residual expressions, one per line. Expressions are opaque
/// policy text; they are not interpreted here.
fn render_residuals(residuals: &[String]) -> String {
    if residuals.is_empty() {
        return NO_RESIDUALS.to_string();
    }
    residuals
        .iter()
        .enumerate()
        .map(|(i, residual)| format!("{}. {residual}", i + 1))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PdpConfig;

    #[tokio::test]
    async fn action_outside_vocabulary_is_rejected() {
        let client = PdpClient::new(PdpConfig::default()).unwrap();
        let err = advise(&client, "frobnicate").await.unwrap_err();
        assert!(matches!(err, PdpError::UnsupportedAction { .. }));
    }

    #[tokio::test]
    async fn missing_constraint_endpoint_is_a_hard_error() {
        let client = PdpClient::new(PdpConfig::default()).unwrap();
        let err = advise(&client, "write").await.unwrap_err();
        assert!(matches!(err, PdpError::Config { .. }));
    }

    #[test]
    fn renders_numbered_residuals() {
        let rendered = render_residuals(&[
            "permit when context.filePath like \"/tmp/*\"".to_string(),
            "forbid when context.filePath like \"/etc/*\"".to_string(),
        ]);
        assert_eq!(
            rendered,
            "1. permit when context.filePath like \"/tmp/*\"\n\
             2. forbid when context.filePath like \"/etc/*\""
        );
    }

    #[test]
    fn empty_residuals_render_ambiguity_note() {
        let rendered = render_residuals(&[]);
        assert!(rendered.contains("unconditionally"), "{rendered}");
    }

    #[test]
    fn summary_serializes_camel_case() {
        let summary = ConstraintSummary {
            action: "write".into(),
            decision: "UNKNOWN".into(),
            constraint_count: 0,
            constraints: NO_RESIDUALS.into(),
            explanation: None,
        };
        let json = serde_json::to_value(&summary).unwrap();
        assert!(json.get("constraintCount").is_some());
        assert!(json.get("explanation").is_none());
    }
}

//! HTTP clients for the policy decision point.
//!
//! Two request shapes share one transport: point decisions (full context,
//! enforced) and constraint queries (no context, advisory). Failure handling
//! differs on purpose — decisions fold transport trouble into the configured
//! fail-open/fail-closed policy, constraint queries surface it to the caller
//! because there is nothing to enforce.

use std::time::Duration;

use async_trait::async_trait;
use log::{debug, warn};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::config::PdpConfig;
use crate::error::{PdpError, PdpResult};
use crate::ident::{self, DecisionIdentifiers};

/// Outcome of one point-decision call. Never cached; recomputed per call.
#[derive(Debug, Clone, PartialEq)]
pub struct Decision {
    pub allowed: bool,
    /// Always populated when `allowed` is false.
    pub reason: Option<String>,
    /// Policy ids the PDP reports as having matched, in response order.
    pub matched_policy_ids: Vec<String>,
}

/// Outcome of one constraint (partial-evaluation) query.
///
/// An empty `residuals` list means the policy set resolves unconditionally —
/// to allow OR to deny. Callers must not read emptiness as either.
#[derive(Debug, Clone, PartialEq)]
pub struct ConstraintResult {
    pub decision: String,
    pub residuals: Vec<String>,
    pub explanation: Option<String>,
}

/// Seam between the enforcement hook and the decision service.
///
/// Implementations fold transport failures into the returned decision per
/// their failure policy. An `Err` marks a failure outside that policy and
/// must never be interpreted as permission by callers.
#[async_trait]
pub trait DecisionPoint: Send + Sync {
    async fn decide(&self, identifiers: &DecisionIdentifiers) -> PdpResult<Decision>;
}

// ── Wire types ──

#[derive(Debug, Deserialize)]
struct AuthorizeResponse {
    decision: String,
    #[serde(default)]
    diagnostics: Diagnostics,
}

#[derive(Debug, Default, Deserialize)]
struct Diagnostics {
    /// Matched policy ids.
    #[serde(default)]
    reason: Vec<String>,
    #[serde(default)]
    errors: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct ConstraintResponse {
    decision: String,
    #[serde(default)]
    residuals: Vec<String>,
    #[serde(default)]
    explanation: Option<String>,
}

/// Decision label the PDP uses for a permitted request. Any other label —
/// including malformed ones — is treated as deny; the conservative mapping
/// is deliberate.
const ALLOW_LABEL: &str = "Allow";

impl Decision {
    fn from_response(response: AuthorizeResponse) -> Self {
        let Diagnostics {
            reason: policy_ids,
            errors,
        } = response.diagnostics;

        if response.decision == ALLOW_LABEL {
            return Decision {
                allowed: true,
                reason: None,
                matched_policy_ids: policy_ids,
            };
        }

        let reason = match errors.into_iter().next() {
            Some(first) => first,
            None if policy_ids.is_empty() => "Denied by policy".to_string(),
            None => format!("Denied by policy: {}", policy_ids.join(", ")),
        };
        Decision {
            allowed: false,
            reason: Some(reason),
            matched_policy_ids: policy_ids,
        }
    }
}

/// Client for the decision service endpoints.
#[derive(Debug, Clone)]
pub struct PdpClient {
    client: reqwest::Client,
    config: PdpConfig,
}

impl PdpClient {
    /// Build a client with the per-request deadline from `config.timeout_ms`.
    pub fn new(config: PdpConfig) -> PdpResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| PdpError::Config {
                message: format!("failed to build HTTP client: {e}"),
            })?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &PdpConfig {
        &self.config
    }

    /// Request a point decision for the given identifiers.
    ///
    /// Never escapes the failure policy: timeouts, transport errors,
    /// non-success statuses, and unparsable bodies all resolve to a
    /// decision shaped by `config.fail_open`.
    pub async fn decide(&self, identifiers: &DecisionIdentifiers) -> Decision {
        let Some(endpoint) = self.config.endpoint.clone() else {
            return self.failure_decision(&PdpError::Config {
                message: "no authorization endpoint configured".into(),
            });
        };

        debug!(
            "authorize {} for {}",
            identifiers.action, identifiers.principal
        );
        match self.post::<_, AuthorizeResponse>(&endpoint, identifiers).await {
            Ok(response) => {
                let decision = Decision::from_response(response);
                debug!(
                    "decision: {}",
                    if decision.allowed { "allow" } else { "deny" }
                );
                decision
            }
            Err(e) => self.failure_decision(&e),
        }
    }

    /// Ask the PDP what residual constraints apply to an action, without
    /// supplying concrete context — "what would be required", not "is this
    /// attempt allowed". The request therefore has no `context` field, and
    /// the principal is the configured query principal.
    pub async fn query_constraints(&self, action_name: &str) -> PdpResult<ConstraintResult> {
        let endpoint =
            self.config
                .constraint_endpoint
                .clone()
                .ok_or_else(|| PdpError::Config {
                    message: "no constraint endpoint configured".into(),
                })?;

        let ns = &self.config.namespace;
        let body = serde_json::json!({
            "principal": ident::principal_identifier(ns, &self.config.query_principal),
            "action": ident::action_identifier(ns, action_name),
            "resource": ident::resource_identifier(ns, action_name),
        });

        debug!("constraint query {}", body["action"]);
        let response: ConstraintResponse = self.post(&endpoint, &body).await?;
        Ok(ConstraintResult {
            decision: response.decision,
            residuals: response.residuals,
            explanation: response.explanation,
        })
    }

    /// POST a JSON body and parse a JSON response.
    async fn post<B, T>(&self, url: &str, body: &B) -> PdpResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self
            .client
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    PdpError::Timeout {
                        timeout_ms: self.config.timeout_ms,
                    }
                } else {
                    PdpError::Transport {
                        message: e.to_string(),
                    }
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(PdpError::Status {
                status: status.as_u16(),
            });
        }

        response.json().await.map_err(|e| PdpError::InvalidResponse {
            message: e.to_string(),
        })
    }

    /// Resolve a failed decision attempt per the configured policy.
    /// Default is fail-closed: an unreachable PDP must never widen access.
    fn failure_decision(&self, err: &PdpError) -> Decision {
        if self.config.fail_open {
            warn!("authorization unavailable, failing open: {err}");
            Decision {
                allowed: true,
                reason: Some(format!("authorization unavailable (fail-open): {err}")),
                matched_policy_ids: Vec::new(),
            }
        } else {
            warn!("authorization unavailable, failing closed: {err}");
            Decision {
                allowed: false,
                reason: Some(format!("Authorization service unavailable: {err}")),
                matched_policy_ids: Vec::new(),
            }
        }
    }
}

#[async_trait]
impl DecisionPoint for PdpClient {
    async fn decide(&self, identifiers: &DecisionIdentifiers) -> PdpResult<Decision> {
        Ok(PdpClient::decide(self, identifiers).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(json: &str) -> AuthorizeResponse {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn allow_carries_matched_policy_ids() {
        let decision = Decision::from_response(response(
            r#"{"decision": "Allow", "diagnostics": {"reason": ["policy0"], "errors": []}}"#,
        ));
        assert!(decision.allowed);
        assert_eq!(decision.reason, None);
        assert_eq!(decision.matched_policy_ids, vec!["policy0"]);
    }

    #[test]
    fn deny_uses_first_diagnostic_error() {
        let decision = Decision::from_response(response(
            r#"{"decision": "Deny", "diagnostics": {"reason": ["policy2"],
                "errors": ["blocked by system-path policy", "second"]}}"#,
        ));
        assert!(!decision.allowed);
        assert_eq!(
            decision.reason.as_deref(),
            Some("blocked by system-path policy")
        );
    }

    #[test]
    fn deny_synthesizes_reason_from_policy_ids() {
        let decision = Decision::from_response(response(
            r#"{"decision": "Deny", "diagnostics": {"reason": ["p1", "p2"], "errors": []}}"#,
        ));
        assert_eq!(decision.reason.as_deref(), Some("Denied by policy: p1, p2"));
    }

    #[test]
    fn deny_without_diagnostics() {
        let decision = Decision::from_response(response(r#"{"decision": "Deny"}"#));
        assert!(!decision.allowed);
        assert_eq!(decision.reason.as_deref(), Some("Denied by policy"));
    }

    #[test]
    fn unexpected_label_is_deny() {
        let decision = Decision::from_response(response(r#"{"decision": "Indeterminate"}"#));
        assert!(!decision.allowed);
    }

    #[test]
    fn failure_decision_defaults_to_closed() {
        let client = PdpClient::new(PdpConfig::default()).unwrap();
        let decision = client.failure_decision(&PdpError::Status { status: 503 });
        assert!(!decision.allowed);
        let reason = decision.reason.unwrap();
        assert!(reason.contains("Authorization service unavailable"), "{reason}");
    }

    #[test]
    fn failure_decision_fail_open() {
        let config = PdpConfig {
            fail_open: true,
            ..PdpConfig::default()
        };
        let client = PdpClient::new(config).unwrap();
        let decision = client.failure_decision(&PdpError::Timeout { timeout_ms: 2000 });
        assert!(decision.allowed);
        let reason = decision.reason.unwrap();
        assert!(reason.contains("fail-open"), "{reason}");
    }
}

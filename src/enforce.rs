//! Pre-action enforcement: the PDP decision first, then the interceptor chain.
//!
//! `EnforcementHook::enforce` is the single entry point the action framework
//! calls before every tool execution. The decision service can only block or
//! pass; registered interceptors can additionally patch parameters. A denied
//! decision short-circuits the chain.

use std::sync::Arc;

use log::{debug, warn};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::ident::{ActionRequest, build_identifiers};
use crate::pdp::DecisionPoint;

/// What the caller does next: run the action or refuse it.
#[derive(Debug, Clone, PartialEq)]
pub enum EnforcementOutcome {
    Blocked { reason: String },
    Proceed { parameters: Map<String, Value> },
}

/// Failure inside a single interceptor. Caught and logged by the chain;
/// never escapes `enforce`.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct InterceptorError(pub String);

/// What one interceptor asks the chain to do.
#[derive(Debug, Clone)]
pub enum InterceptorAction {
    /// Nothing to add.
    Pass,
    /// Refuse the action.
    Block { reason: String },
    /// Shallow-merge these keys over the current parameters.
    Patch(Map<String, Value>),
}

/// A pluggable pre-action check, registered at composition time.
///
/// Interceptors run after the PDP decision, in registration order, each
/// seeing the parameters as patched by its predecessors. They have exactly
/// one narrow capability: inspect, optionally block, optionally patch.
pub trait Interceptor: Send + Sync {
    /// Stable name, used in diagnostics.
    fn name(&self) -> &str;

    /// Inspect the pending action and say what to do with it.
    fn inspect(
        &self,
        action_name: &str,
        parameters: &Map<String, Value>,
    ) -> Result<InterceptorAction, InterceptorError>;
}

/// The enforcement pipeline for intercepted actions.
pub struct EnforcementHook {
    namespace: String,
    decision_point: Option<Arc<dyn DecisionPoint>>,
    interceptors: Vec<Box<dyn Interceptor>>,
}

impl EnforcementHook {
    /// A hook with no decision point and no interceptors: everything proceeds.
    #[must_use]
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            decision_point: None,
            interceptors: Vec::new(),
        }
    }

    /// Attach the decision service.
    #[must_use]
    pub fn with_decision_point(mut self, point: Arc<dyn DecisionPoint>) -> Self {
        self.decision_point = Some(point);
        self
    }

    /// Append an interceptor to the chain.
    #[must_use]
    pub fn with_interceptor(mut self, interceptor: Box<dyn Interceptor>) -> Self {
        self.interceptors.push(interceptor);
        self
    }

    /// Decide whether `action_name` may run with `parameters`.
    ///
    /// Without a decision point the PDP step is skipped entirely (feature
    /// disabled is "not applicable", not an error). A decision-point error
    /// blocks: the absence of a decision is never permission.
    pub async fn enforce(
        &self,
        action_name: &str,
        parameters: Map<String, Value>,
        call_id: Option<&str>,
        session: Option<&str>,
    ) -> EnforcementOutcome {
        if let Some(point) = &self.decision_point {
            let request = ActionRequest {
                actor_id: None,
                session_id: session.map(str::to_string),
                action_name: action_name.to_string(),
                parameters: parameters.clone(),
                call_id: call_id.map(str::to_string),
            };
            let identifiers = build_identifiers(&self.namespace, &request);

            match point.decide(&identifiers).await {
                Ok(decision) => {
                    debug!(
                        "decision for {action_name}: {}",
                        if decision.allowed { "allow" } else { "deny" }
                    );
                    if !decision.allowed {
                        let reason = decision
                            .reason
                            .unwrap_or_else(|| "denied by policy".to_string());
                        return EnforcementOutcome::Blocked { reason };
                    }
                }
                Err(e) => {
                    warn!("decision point failed for {action_name}: {e}");
                    return EnforcementOutcome::Blocked {
                        reason: format!("authorization check failed: {e}"),
                    };
                }
            }
        }

        self.run_interceptors(action_name, parameters)
    }

    fn run_interceptors(
        &self,
        action_name: &str,
        mut parameters: Map<String, Value>,
    ) -> EnforcementOutcome {
        for interceptor in &self.interceptors {
            match interceptor.inspect(action_name, &parameters) {
                Ok(InterceptorAction::Pass) => {}
                Ok(InterceptorAction::Block { reason }) => {
                    debug!(
                        "interceptor {} blocked {action_name}: {reason}",
                        interceptor.name()
                    );
                    return EnforcementOutcome::Blocked { reason };
                }
                Ok(InterceptorAction::Patch(patch)) => {
                    for (key, value) in patch {
                        parameters.insert(key, value);
                    }
                }
                // Interceptors may deny or adjust, never crash the pipeline.
                Err(e) => {
                    warn!("interceptor {} failed, skipping: {e}", interceptor.name());
                }
            }
        }
        EnforcementOutcome::Proceed { parameters }
    }
}

//! JSON-lines serve mode
//!
//! One route request per stdin line, one outcome per stdout line. This is
//! the surface an AI agent drives: it names a tool, and the router fills in
//! whatever prerequisite work the session still needs.
//!
//! Request shape:
//! `{"tool": "build_image", "params": {...}, "session_id": "s1", "force": false}`

use anyhow::Result;
use dockhand_application::{RouteOutcome, RouteRequest, ToolContext, ToolRouter};
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::debug;

#[derive(Debug, Deserialize)]
struct ServeRequest {
    tool: String,
    #[serde(default)]
    params: Value,
    #[serde(default)]
    session_id: Option<String>,
    #[serde(default)]
    force: bool,
}

impl From<ServeRequest> for RouteRequest {
    fn from(request: ServeRequest) -> Self {
        let mut route = RouteRequest::new(request.tool).with_params(request.params);
        if let Some(session_id) = request.session_id {
            route = route.with_session(session_id);
        }
        if request.force {
            route = route.forced();
        }
        route
    }
}

/// Render a route outcome as the wire-level JSON response
pub fn outcome_to_json(outcome: RouteOutcome) -> Value {
    let (result, error) = match outcome.result {
        Ok(output) => (Some(output), None),
        Err(failure) => (None, Some(failure.to_string())),
    };

    json!({
        "ok": error.is_none(),
        "result": result,
        "error": error,
        "executed_tools": outcome.executed_tools,
        "session_id": outcome.session.as_ref().map(|s| s.session_id.clone()),
        "completed_steps": outcome.session.map(|s| s.completed_steps),
    })
}

/// Read route requests line by line until stdin closes
pub async fn run(router: &ToolRouter, ctx: &ToolContext) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    while let Some(line) = lines.next_line().await? {
        let line = line.trim().to_string();
        if line.is_empty() {
            continue;
        }

        let response = match serde_json::from_str::<ServeRequest>(&line) {
            Ok(request) => {
                debug!(tool = %request.tool, "Serving route request");
                outcome_to_json(router.route(request.into(), ctx).await)
            }
            Err(error) => json!({
                "ok": false,
                "result": null,
                "error": format!("Invalid request: {}", error),
                "executed_tools": [],
                "session_id": null,
                "completed_steps": null,
            }),
        };

        let mut encoded = serde_json::to_vec(&response)?;
        encoded.push(b'\n');
        stdout.write_all(&encoded).await?;
        stdout.flush().await?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use dockhand_application::RouteError;
    use dockhand_domain::{Step, WorkflowState};

    #[test]
    fn test_request_defaults() {
        let request: ServeRequest = serde_json::from_str(r#"{"tool": "build_image"}"#).unwrap();
        let route = RouteRequest::from(request);
        assert_eq!(route.tool_name, "build_image");
        assert_eq!(route.params, Value::Null);
        assert_eq!(route.session_id, None);
        assert!(!route.force);
    }

    #[test]
    fn test_request_full() {
        let raw = r#"{"tool": "push_image", "params": {"image_name": "shop"}, "session_id": "s1", "force": true}"#;
        let request: ServeRequest = serde_json::from_str(raw).unwrap();
        let route = RouteRequest::from(request);
        assert_eq!(route.tool_name, "push_image");
        assert_eq!(route.params["image_name"], "shop");
        assert_eq!(route.session_id.as_deref(), Some("s1"));
        assert!(route.force);
    }

    #[test]
    fn test_outcome_to_json_success() {
        let mut session = WorkflowState::new("s1");
        session.completed_steps.insert(Step::AnalyzedRepo);
        let outcome = RouteOutcome {
            result: Ok(json!({"language": "rust"})),
            executed_tools: vec!["analyze_repo".to_string()],
            session: Some(session),
        };

        let rendered = outcome_to_json(outcome);
        assert_eq!(rendered["ok"], true);
        assert_eq!(rendered["result"]["language"], "rust");
        assert_eq!(rendered["error"], Value::Null);
        assert_eq!(rendered["executed_tools"][0], "analyze_repo");
        assert_eq!(rendered["session_id"], "s1");
        assert_eq!(rendered["completed_steps"][0], "analyzed_repo");
    }

    #[test]
    fn test_outcome_to_json_failure() {
        let outcome = RouteOutcome {
            result: Err(RouteError::ToolNotFound("mystery".to_string())),
            executed_tools: vec![],
            session: None,
        };

        let rendered = outcome_to_json(outcome);
        assert_eq!(rendered["ok"], false);
        assert_eq!(rendered["result"], Value::Null);
        assert_eq!(rendered["error"], "Tool not found: mystery");
        assert_eq!(rendered["session_id"], Value::Null);
    }
}

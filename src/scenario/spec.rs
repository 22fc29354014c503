//! Scenario file format
//!
//! ```toml
//! name = "virtual machines"
//! resource_group = "fake-resource-group"
//!
//! [[operation]]
//! name = "BeginDelete"
//! kind = "poller"
//! resource = "vm1"
//! non_terminal = 1
//! failure = { http_status = 404, error_code = "NotFound" }
//! expect = { state = "Failed", http_status = 404 }
//! ```

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::fake::{
    FakeServer, HandlerKind, PagerSimulator, PollerSimulator, PollerState, Request, Resource,
    ResourceScope, ResponseError, Terminal,
};
use crate::poll::MAX_POLLS_LIMIT;

fn default_provider() -> String {
    "Microsoft.Compute".to_string()
}

fn default_resource_type() -> String {
    "virtualMachines".to_string()
}

/// A declarative fake backend plus the calls to make against it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Scenario {
    pub name: String,
    pub resource_group: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subscription_id: Option<String>,
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default = "default_resource_type")]
    pub resource_type: String,
    #[serde(default, rename = "operation")]
    pub operations: Vec<OperationSpec>,
}

/// One `[[operation]]` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OperationSpec {
    pub name: String,
    pub kind: HandlerKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource: Option<String>,

    /// Sync: answer with this error instead of the resource
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ResponseError>,

    /// Poller: in-progress polls before the terminal one
    #[serde(default)]
    pub non_terminal: u32,
    /// Poller: terminal failure; success when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure: Option<ResponseError>,
    /// Poller: reject the begin call itself
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initial_error: Option<ResponseError>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub pages: Vec<PageSpec>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expect: Option<Expectation>,
}

/// One `[[operation.pages]]` entry: a page of resource names or an error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PageSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ResponseError>,
}

/// Checks applied to an operation's outcome.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Expectation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<PollerState>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub http_status: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pages: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors: Option<usize>,
}

/// Scenario loading and validation errors
#[derive(Debug, thiserror::Error)]
pub enum ScenarioError {
    #[error("failed to read scenario {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse scenario: {0}")]
    Parse(String),

    #[error("invalid scenario: {0}")]
    Invalid(String),

    #[error("invalid operation '{operation}': {message}")]
    InvalidOperation { operation: String, message: String },
}

impl Scenario {
    /// Read, parse and validate a scenario file.
    pub fn load(path: &Path) -> Result<Self, ScenarioError> {
        let text = fs::read_to_string(path).map_err(|source| ScenarioError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    pub fn from_toml_str(text: &str) -> Result<Self, ScenarioError> {
        let scenario: Scenario =
            toml::from_str(text).map_err(|e| ScenarioError::Parse(e.to_string()))?;
        scenario.validate()?;
        Ok(scenario)
    }

    pub fn validate(&self) -> Result<(), ScenarioError> {
        if self.name.trim().is_empty() {
            return Err(ScenarioError::Invalid("name must not be empty".to_string()));
        }
        if self.resource_group.trim().is_empty() || self.resource_group.contains('/') {
            return Err(ScenarioError::Invalid(format!(
                "resource_group '{}' must be a non-empty path segment",
                self.resource_group
            )));
        }
        if self.operations.is_empty() {
            return Err(ScenarioError::Invalid(
                "at least one [[operation]] is required".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for op in &self.operations {
            if !seen.insert(op.name.as_str()) {
                return Err(op.invalid("operation names must be unique"));
            }
            op.validate()?;
        }
        Ok(())
    }

    /// Scope used for resource IDs when a request names no subscription.
    pub fn scope(&self, default_subscription: &str) -> ResourceScope {
        ResourceScope::new(
            self.subscription_id
                .clone()
                .unwrap_or_else(|| default_subscription.to_string()),
            self.resource_group.clone(),
            self.provider.clone(),
            self.resource_type.clone(),
        )
    }

    /// Register one handler per operation.
    ///
    /// Handlers derive resource IDs from the request, so every resource they
    /// produce embeds the resource group the caller asked for.
    pub fn build_server(&self, default_subscription: &str) -> FakeServer<Resource> {
        let base = self.scope(default_subscription);
        let mut builder = FakeServer::builder();

        for op in &self.operations {
            let kind = op.kind;
            let op = op.clone();
            let base = base.clone();
            builder = match kind {
                HandlerKind::Sync => builder.sync(op.name.clone(), move |req: &Request| {
                    if let Some(err) = &op.error {
                        return Err(err.clone());
                    }
                    Ok(Resource::in_scope(&request_scope(&base, req), op.resource_name(req)))
                }),
                HandlerKind::Poller => builder.poller(op.name.clone(), move |req: &Request| {
                    if let Some(err) = &op.initial_error {
                        return Err(err.clone());
                    }
                    let resource =
                        Resource::in_scope(&request_scope(&base, req), op.resource_name(req));
                    let running = resource
                        .clone()
                        .with_property("provisioningState", json!("InProgress"));
                    let terminal = match &op.failure {
                        Some(err) => Terminal::Failure(err.clone()),
                        None => Terminal::Success(
                            resource.with_property("provisioningState", json!("Succeeded")),
                        ),
                    };
                    Ok(PollerSimulator::from_script(
                        vec![Some(running); op.non_terminal as usize],
                        terminal,
                    ))
                }),
                HandlerKind::Pager => builder.pager(op.name.clone(), move |req: &Request| {
                    let scope = request_scope(&base, req);
                    let mut pager = PagerSimulator::new();
                    for page in &op.pages {
                        match (&page.items, &page.error) {
                            (Some(items), _) => pager.add_page(
                                items.iter().map(|name| Resource::in_scope(&scope, name)).collect(),
                            ),
                            (None, Some(err)) => pager.add_transient_error(err.clone()),
                            (None, None) => pager.add_page(Vec::new()),
                        }
                    }
                    pager
                }),
            };
        }

        builder.build()
    }
}

fn request_scope(base: &ResourceScope, req: &Request) -> ResourceScope {
    let subscription_id = if req.subscription_id.is_empty() {
        base.subscription_id.clone()
    } else {
        req.subscription_id.clone()
    };
    ResourceScope::new(
        subscription_id,
        req.scope.clone(),
        base.provider.clone(),
        base.resource_type.clone(),
    )
}

impl OperationSpec {
    fn invalid(&self, message: impl Into<String>) -> ScenarioError {
        ScenarioError::InvalidOperation {
            operation: self.name.clone(),
            message: message.into(),
        }
    }

    fn resource_name(&self, req: &Request) -> String {
        req.resource_name
            .clone()
            .or_else(|| self.resource.clone())
            .unwrap_or_default()
    }

    pub fn expectation(&self) -> Expectation {
        self.expect.clone().unwrap_or_default()
    }

    fn validate(&self) -> Result<(), ScenarioError> {
        if self.name.trim().is_empty() {
            return Err(self.invalid("name must not be empty"));
        }

        let expect = self.expectation();
        match self.kind {
            HandlerKind::Sync | HandlerKind::Poller => {
                if self.resource.as_deref().map_or(true, |r| r.trim().is_empty()) {
                    return Err(self.invalid("'resource' is required"));
                }
                if !self.pages.is_empty() {
                    return Err(self.invalid("'pages' only applies to pager operations"));
                }
                if expect.items.is_some() || expect.pages.is_some() || expect.errors.is_some() {
                    return Err(self.invalid("expect.items/pages/errors only apply to pagers"));
                }
            }
            HandlerKind::Pager => {
                if self.error.is_some() || self.failure.is_some() || self.initial_error.is_some() {
                    return Err(self.invalid("pagers take errors per page"));
                }
                if self.non_terminal > 0 {
                    return Err(self.invalid("'non_terminal' only applies to pollers"));
                }
                if expect.http_status.is_some() || expect.error_code.is_some() || expect.name.is_some() {
                    return Err(self.invalid("expect.http_status/error_code/name do not apply to pagers"));
                }
                for (idx, page) in self.pages.iter().enumerate() {
                    if page.items.is_some() && page.error.is_some() {
                        return Err(self.invalid(format!("page {} has both items and error", idx)));
                    }
                }
            }
        }

        match self.kind {
            HandlerKind::Sync => {
                if self.non_terminal > 0 || self.failure.is_some() || self.initial_error.is_some() {
                    return Err(self.invalid("poller fields on a sync operation"));
                }
                if expect.state.is_some() {
                    return Err(self.invalid("expect.state only applies to pollers"));
                }
            }
            HandlerKind::Poller => {
                if self.error.is_some() {
                    return Err(self.invalid("use 'failure' or 'initial_error' on pollers"));
                }
                // entries past MAX_POLLS_LIMIT are unreachable
                if self.non_terminal > MAX_POLLS_LIMIT {
                    return Err(self.invalid(format!(
                        "'non_terminal' must be at most {}, got {}",
                        MAX_POLLS_LIMIT, self.non_terminal
                    )));
                }
            }
            HandlerKind::Pager => {}
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCENARIO: &str = r#"
name = "vm"
resource_group = "fake-resource-group"

[[operation]]
name = "Get"
kind = "sync"
resource = "virtualmachine1"
expect = { name = "virtualmachine1" }

[[operation]]
name = "BeginDelete"
kind = "poller"
resource = "virtualmachine1"
non_terminal = 2
failure = { http_status = 404, error_code = "NotFound" }

[[operation]]
name = "List"
kind = "pager"

[[operation.pages]]
items = ["vm1", "vm2"]

[[operation.pages]]
error = { http_status = 503, error_code = "ServiceUnavailable" }
"#;

    #[test]
    fn test_parse_defaults() {
        let scenario = Scenario::from_toml_str(SCENARIO).unwrap();
        assert_eq!(scenario.provider, "Microsoft.Compute");
        assert_eq!(scenario.resource_type, "virtualMachines");
        assert_eq!(scenario.operations.len(), 3);
        assert_eq!(scenario.operations[1].kind, HandlerKind::Poller);
        assert_eq!(
            scenario.operations[1].failure,
            Some(ResponseError::new(404, "NotFound"))
        );
        assert_eq!(scenario.operations[2].pages.len(), 2);
    }

    #[test]
    fn test_server_from_scenario() {
        let scenario = Scenario::from_toml_str(SCENARIO).unwrap();
        let server = scenario.build_server("sub-0");
        assert_eq!(server.operations(), vec!["BeginDelete", "Get", "List"]);

        let vm = server
            .get(&Request::new("Get", "other-group").with_resource("vm9"))
            .unwrap();
        assert_eq!(vm.name, "vm9");
        assert!(vm.id.starts_with("/subscriptions/sub-0/resourceGroups/other-group/"));

        let mut poller = server.begin(&Request::new("BeginDelete", "rg")).unwrap();
        assert_eq!(poller.remaining(), 3);
        assert!(poller.poll().unwrap().is_running());
    }

    #[test]
    fn test_unknown_field_rejected() {
        let err = Scenario::from_toml_str(
            "name = \"x\"\nresource_group = \"rg\"\nbogus = 1\n",
        )
        .unwrap_err();
        assert!(matches!(err, ScenarioError::Parse(_)));
    }

    #[test]
    fn test_validation_errors() {
        let no_ops = "name = \"x\"\nresource_group = \"rg\"\n";
        assert!(matches!(
            Scenario::from_toml_str(no_ops),
            Err(ScenarioError::Invalid(_))
        ));

        let missing_resource = r#"
name = "x"
resource_group = "rg"
[[operation]]
name = "Get"
kind = "sync"
"#;
        assert!(matches!(
            Scenario::from_toml_str(missing_resource),
            Err(ScenarioError::InvalidOperation { .. })
        ));

        let both = r#"
name = "x"
resource_group = "rg"
[[operation]]
name = "List"
kind = "pager"
[[operation.pages]]
items = ["a"]
error = { http_status = 500, error_code = "Boom" }
"#;
        let err = Scenario::from_toml_str(both).unwrap_err();
        assert!(err.to_string().contains("both items and error"));

        let endless = r#"
name = "x"
resource_group = "rg"
[[operation]]
name = "BeginDelete"
kind = "poller"
resource = "vm1"
non_terminal = 4294967295
"#;
        let err = Scenario::from_toml_str(endless).unwrap_err();
        assert!(matches!(err, ScenarioError::InvalidOperation { .. }));
        assert!(err.to_string().contains("at most 100000"), "{}", err);

        let duplicate = r#"
name = "x"
resource_group = "rg"
[[operation]]
name = "Get"
kind = "sync"
resource = "a"
[[operation]]
name = "Get"
kind = "sync"
resource = "b"
"#;
        assert!(Scenario::from_toml_str(duplicate)
            .unwrap_err()
            .to_string()
            .contains("unique"));
    }
}

//! Resource items and ARM-style resource IDs.

use std::sync::OnceLock;

use regex_lite::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Where a resource lives: subscription, resource group and resource type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceScope {
    pub subscription_id: String,
    pub resource_group: String,
    pub provider: String,
    pub resource_type: String,
}

impl ResourceScope {
    pub fn new(
        subscription_id: impl Into<String>,
        resource_group: impl Into<String>,
        provider: impl Into<String>,
        resource_type: impl Into<String>,
    ) -> Self {
        Self {
            subscription_id: subscription_id.into(),
            resource_group: resource_group.into(),
            provider: provider.into(),
            resource_type: resource_type.into(),
        }
    }

    /// Path of the resource collection in this scope.
    pub fn collection_path(&self) -> String {
        format!(
            "/subscriptions/{}/resourceGroups/{}/providers/{}/{}",
            self.subscription_id, self.resource_group, self.provider, self.resource_type
        )
    }

    /// Full resource ID for `name` in this scope. Always embeds the
    /// resource group.
    pub fn resource_id(&self, name: &str) -> String {
        format!("{}/{}", self.collection_path(), name)
    }
}

/// A resource returned by the fake backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    pub name: String,
    pub id: String,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub properties: Map<String, Value>,
}

impl Resource {
    /// Create a resource whose ID is derived from `scope`.
    pub fn in_scope(scope: &ResourceScope, name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            id: scope.resource_id(&name),
            name,
            properties: Map::new(),
        }
    }

    pub fn with_property(mut self, key: impl Into<String>, value: Value) -> Self {
        self.properties.insert(key.into(), value);
        self
    }

    /// Whether the ID embeds the given scoping name.
    pub fn id_contains(&self, scope: &str) -> bool {
        self.id.contains(scope)
    }
}

/// A parsed resource or collection path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourcePath {
    pub scope: ResourceScope,
    /// `None` for collection paths.
    pub name: Option<String>,
}

fn resource_path_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"^/(?i:subscriptions)/([^/]+)/(?i:resourceGroups)/([^/]+)/(?i:providers)/([^/]+)/([^/]+)(?:/([^/]+))?/?$",
        )
        .expect("resource path pattern is valid")
    })
}

impl ResourcePath {
    /// Parse `/subscriptions/{sub}/resourceGroups/{rg}/providers/{ns}/{type}[/{name}]`.
    pub fn parse(path: &str) -> Option<Self> {
        let caps = resource_path_regex().captures(path)?;
        Some(Self {
            scope: ResourceScope::new(&caps[1], &caps[2], &caps[3], &caps[4]),
            name: caps.get(5).map(|m| m.as_str().to_string()),
        })
    }

    pub fn is_collection(&self) -> bool {
        self.name.is_none()
    }
}

//! Shared fixtures for integration tests
//!
//! - Scenario files under `tests/fixtures/`
//! - A virtual-machine fake server with the Get, BeginDelete and List
//!   handlers used across test files

#![allow(dead_code)]

use std::path::{Path, PathBuf};

use armfake::fake::{
    FakeServer, PagerSimulator, PollerSimulator, Request, Resource, ResourceScope, ResponseError,
};

pub const RESOURCE_GROUP: &str = "fake-resource-group";
pub const SUBSCRIPTION_ID: &str = "00000000-0000-0000-0000-000000000000";

/// Path to a file under `tests/fixtures/`
pub fn fixture_path(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures").join(name)
}

pub fn vm_scope(resource_group: &str) -> ResourceScope {
    ResourceScope::new(SUBSCRIPTION_ID, resource_group, "Microsoft.Compute", "virtualMachines")
}

/// Resource ID path of `name` in the default resource group
pub fn vm_path(name: &str) -> String {
    vm_scope(RESOURCE_GROUP).resource_id(name)
}

/// Collection path for virtual machines in the default resource group
pub fn vms_path() -> String {
    vm_scope(RESOURCE_GROUP).collection_path()
}

/// Fake virtual-machine backend:
/// - `Get` echoes the requested name with an ID in the request's group
/// - `BeginDelete` is in progress once, then fails with 404 NotFound
/// - `List` serves 5 VMs over 2 pages with one transient error between them
pub fn vm_server() -> FakeServer<Resource> {
    FakeServer::builder()
        .sync("Get", |req: &Request| {
            let name = req.resource_name.clone().unwrap_or_default();
            Ok(Resource::in_scope(&vm_scope(&req.scope), name)
                .with_property("location", serde_json::json!("westus")))
        })
        .poller("BeginDelete", |_: &Request| {
            let mut poller = PollerSimulator::new();
            poller.add_non_terminal(None).map_err(|_| ResponseError::new(500, "Setup"))?;
            poller
                .set_terminal_failure("NotFound", 404)
                .map_err(|_| ResponseError::new(500, "Setup"))?;
            Ok(poller)
        })
        .pager("List", |req: &Request| {
            let scope = vm_scope(&req.scope);
            let mut pager = PagerSimulator::new();
            pager.add_page(
                ["vm1", "vm2", "vm3"]
                    .iter()
                    .map(|n| Resource::in_scope(&scope, *n))
                    .collect(),
            );
            pager.add_transient_error(ResponseError::new(503, "NetworkError"));
            pager.add_page(["vm4", "vm5"].iter().map(|n| Resource::in_scope(&scope, *n)).collect());
            pager
        })
        .build()
}

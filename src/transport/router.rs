//! Maps wire paths to logical operations.

use armfake_wire::{names, Method};

use crate::fake::ResourcePath;

/// Where a wire request goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    /// A resource or collection call handled by the dispatch table
    Resource {
        operation: &'static str,
        path: ResourcePath,
    },
    /// `GET /operations/{id}`
    OperationStatus(String),
    /// `GET /pages/{id}`
    NextPage(String),
    /// Known path, unsupported method
    MethodNotAllowed,
    NotFound,
}

/// Resolve `method` and `path` to a route.
pub fn route(method: Method, path: &str) -> Route {
    let segments: Vec<&str> = path.trim_matches('/').split('/').collect();
    match segments.as_slice() {
        ["operations", id] if !id.is_empty() => match method {
            Method::Get => Route::OperationStatus(id.to_string()),
            _ => Route::MethodNotAllowed,
        },
        ["pages", id] if !id.is_empty() => match method {
            Method::Get => Route::NextPage(id.to_string()),
            _ => Route::MethodNotAllowed,
        },
        _ => match ResourcePath::parse(path) {
            Some(path) => resource_route(method, path),
            None => Route::NotFound,
        },
    }
}

fn resource_route(method: Method, path: ResourcePath) -> Route {
    let operation = match (method, path.is_collection()) {
        (Method::Get, true) => names::LIST,
        (Method::Get, false) => names::GET,
        (Method::Put, false) => names::BEGIN_CREATE_OR_UPDATE,
        (Method::Patch, false) => names::BEGIN_UPDATE,
        (Method::Delete, false) => names::BEGIN_DELETE,
        _ => return Route::MethodNotAllowed,
    };
    Route::Resource { operation, path }
}

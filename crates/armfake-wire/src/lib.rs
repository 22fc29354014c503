//! armfake Wire Types
//!
//! Serde types for the ARM-style wire protocol spoken by the fake transport:
//! request/response envelopes, async-operation status bodies, page bodies
//! with continuation links, and error bodies.

pub mod error;
pub mod ops;
pub mod request;
pub mod response;

pub use error::{ErrorBody, ErrorDetail, WireError};
pub use ops::{decode_skip_token, encode_skip_token, AsyncOperationBody, OperationStatus, PageBody};
pub use request::{Method, WireRequest};
pub use response::WireResponse;

/// Header carrying the polling URL for a long-running operation.
pub const ASYNC_OPERATION_HEADER: &str = "Azure-AsyncOperation";

/// Secondary polling URL header.
pub const LOCATION_HEADER: &str = "Location";

/// Suggested delay in seconds before the next poll.
pub const RETRY_AFTER_HEADER: &str = "Retry-After";

/// Link to retry after a transient paging error.
pub const NEXT_LINK_HEADER: &str = "x-ms-fake-next-link";

/// Query parameter carrying the paging continuation token.
pub const SKIP_TOKEN_PARAM: &str = "$skiptoken";

/// Base URL used when none is configured.
pub const DEFAULT_BASE_URL: &str = "https://fake.local";

/// Logical operation names the router produces.
pub mod names {
    pub const GET: &str = "Get";
    pub const BEGIN_CREATE_OR_UPDATE: &str = "BeginCreateOrUpdate";
    pub const BEGIN_UPDATE: &str = "BeginUpdate";
    pub const BEGIN_DELETE: &str = "BeginDelete";
    pub const LIST: &str = "List";
}

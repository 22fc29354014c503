//! Operation-specific body types.

pub mod lro;
pub mod paging;

pub use lro::{AsyncOperationBody, OperationStatus};
pub use paging::{decode_skip_token, encode_skip_token, PageBody};

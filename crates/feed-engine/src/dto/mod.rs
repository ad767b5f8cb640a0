//! Data transfer objects for engine inputs

mod requests;

pub use requests::{CreateCommentRequest, EditCommentRequest};

//! Value objects - immutable domain identifiers

mod ids;

pub use ids::{CommentId, IdParseError, PostId, UserId};

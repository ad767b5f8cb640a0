//! Push payloads and side-effect descriptions

mod entity_update;
mod side_effect;

pub use entity_update::EntityUpdate;
pub use side_effect::{
    Notification, NotificationKind, XpReason, XP_COMMENT_LIKED, XP_POST_LIKED,
};

//! Conversation primitives: immutable messages and the stage machine.

mod message;
mod stage;

pub use message::{Message, MessageError, MessageId, Role};
pub(crate) use message::{latest_user_content, user_contents};
pub use stage::Stage;

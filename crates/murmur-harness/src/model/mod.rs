//! Reference model for model-based testing.
//!
//! The model is a deliberately naive re-statement of the session rules:
//! linear scans over plain vectors, no indexes, no shared code with
//! `murmur-core`. Operations are applied to both the model and a real
//! [`murmur_core::Session`]; their observable states and the commands they
//! transmit must agree after every step.

mod operation;
mod session;
mod transcript;

pub use operation::{
    BODY, DISPLAY_NAME, MESSAGE_SPACE, ModelMessageId, ModelUserId, OWN_USER_ID, Operation,
    USER_SPACE, message, message_id, sent_commands, user, user_id,
};
pub use session::{ModelSession, ObservableState};
pub use transcript::ModelTranscript;

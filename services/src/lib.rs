//! Small shared helpers: opaque id generation and the user-store
//! collaborator contract.

pub mod ids;
pub mod user_store;

pub use ids::message_id;
pub use user_store::{NewUser, UserRecord, UserStore};

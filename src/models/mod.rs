pub mod chat;
pub mod connection;
pub mod conversation;
pub mod metadata;

pub use chat::*;
pub use connection::*;
pub use conversation::*;
pub use metadata::*;

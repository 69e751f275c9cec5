pub mod chat;
pub mod session;

pub mod conversation;
pub mod webhook;

pub mod link;
pub mod notification;
pub mod ports;
pub mod session;
pub mod signature;

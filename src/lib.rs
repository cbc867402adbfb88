pub mod app;
pub mod core;
pub mod decoder;
pub mod session;
pub mod verify;

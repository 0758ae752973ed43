pub mod fetch;
pub mod server;
pub mod verify;

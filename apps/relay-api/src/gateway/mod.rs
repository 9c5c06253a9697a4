pub mod connection;
pub mod coordinator;
pub mod envelope;
pub mod server;
pub mod session;

pub mod config;
pub mod drawing;
pub mod error;
pub mod gesture;
pub mod keyboard;
pub mod payload;
pub mod render;
pub mod session;
pub mod transport;

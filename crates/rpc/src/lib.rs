//! HTTP API for the CHD risk inference service.

pub mod server;


pub use server::{start_server, AppState};

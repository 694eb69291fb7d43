//! HTTP server exposing the relay, generation and settings endpoints

mod handler;
pub mod server;

pub use server::{build_http_client, build_router, run_server, ProxyState};

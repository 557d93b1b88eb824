//! Main entry point for the Visia backend.
//!
//! Everything from configuration to graceful shutdown lives in
//! `backend::start_server`; this binary only provides the runtime.

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    backend::start_server().await
}

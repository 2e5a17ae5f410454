//! Server command implementation

use anyhow::Result;
use runway_core::EngineConfig;
use runway_server::ServerConfig;

pub async fn cmd_serve(
    engine: EngineConfig,
    host: &str,
    port: u16,
    allowed_origins: Vec<String>,
) -> Result<()> {
    println!("🚀 Starting Runway web server...");
    println!("   Listening: http://{}:{}", host, port);
    if !allowed_origins.is_empty() {
        println!("   CORS origins: {}", allowed_origins.join(", "));
    }
    println!();
    println!("   Press Ctrl+C to stop");

    let config = ServerConfig {
        allowed_origins,
        ..Default::default()
    };
    runway_server::serve(engine, host, port, config).await
}

//! Daemon status and shutdown commands.

use anyhow::Result;
use serde::Deserialize;

use super::http::{base_url, get_json, post_json};

// ── Response types ────────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct StatusResponse {
    target: String,
    lifespan_secs: u64,
    resend_interval_secs: u64,
    cleanup_interval_secs: u64,
    remote_names: usize,
    active_apis: usize,
    owned: Vec<OwnedInfo>,
    listener_running: bool,
}

#[derive(Deserialize)]
struct OwnedInfo {
    name: String,
    version: String,
    port: u16,
}

#[derive(Deserialize)]
struct ShutdownResponse {
    message: String,
}

// ── Commands ──────────────────────────────────────────────────────────────────

pub async fn cmd_status(port: u16) -> Result<()> {
    let resp: StatusResponse = get_json(&format!("{}/status", base_url(port))).await?;

    println!("═══════════════════════════════════════");
    println!("  Beacon Daemon Status");
    println!("═══════════════════════════════════════");
    println!("  Announcing to    : {}", resp.target);
    println!("  Listener         : {}", if resp.listener_running { "running" } else { "STOPPED" });
    println!("  Lifespan         : {}s", resp.lifespan_secs);
    println!("  Resend interval  : {}s", resp.resend_interval_secs);
    println!("  Cleanup interval : {}s", resp.cleanup_interval_secs);
    println!("  Known names      : {}", resp.remote_names);
    println!("  Active services  : {}", resp.active_apis);

    if resp.owned.is_empty() {
        println!("\n  No services announced by this daemon.");
    } else {
        println!("\n  Announced:");
        for o in &resp.owned {
            println!("  • {} {} on port {}", o.name, o.version, o.port);
        }
    }

    Ok(())
}

pub async fn cmd_shutdown(port: u16) -> Result<()> {
    let resp: ShutdownResponse = post_json(&format!("{}/daemon/shutdown", base_url(port))).await?;
    println!("{}", resp.message);
    Ok(())
}

//! Service listing and registration commands.

use anyhow::Result;
use serde::{Deserialize, Serialize};

use super::http::{base_url, get_json, post_json_body};

#[derive(Deserialize)]
struct ApisResponse {
    apis: Vec<ApiInfo>,
}

#[derive(Deserialize)]
struct ApiInfo {
    name: String,
    version: String,
    host: String,
    port: u16,
}

#[derive(Serialize)]
struct RegisterRequest<'a> {
    name: &'a str,
    version: &'a str,
    port: u16,
}

#[derive(Deserialize)]
struct RegisterResponse {
    name: String,
    version: String,
    port: u16,
}

fn print_apis(title: &str, apis: &[ApiInfo]) {
    println!("═══════════════════════════════════════");
    println!("  {} ({})", title, apis.len());
    println!("═══════════════════════════════════════");
    for a in apis {
        println!("  ┌─ {}", a.name);
        println!("  │  version : {}", a.version);
        println!("  └─ address : {}:{}", a.host, a.port);
    }
}

pub async fn cmd_list(port: u16) -> Result<()> {
    let resp: ApisResponse = get_json(&format!("{}/apis", base_url(port))).await?;

    if resp.apis.is_empty() {
        println!("No services discovered yet.");
        return Ok(());
    }
    print_apis("Discovered Services", &resp.apis);
    Ok(())
}

pub async fn cmd_get(port: u16, name: &str) -> Result<()> {
    let resp: ApisResponse = get_json(&format!("{}/apis/{}", base_url(port), name)).await?;

    if resp.apis.is_empty() {
        println!("No active registrations for '{}'.", name);
        return Ok(());
    }
    print_apis(name, &resp.apis);
    Ok(())
}

pub async fn cmd_register(port: u16, name: &str, version: &str, service_port: &str) -> Result<()> {
    let service_port: u16 = service_port
        .parse()
        .map_err(|_| anyhow::anyhow!("service port must be a number between 0 and 65535"))?;

    let req = RegisterRequest {
        name,
        version,
        port: service_port,
    };
    let resp: RegisterResponse = post_json_body(&format!("{}/apis", base_url(port)), &req).await?;
    println!("Announcing {} {} on port {}.", resp.name, resp.version, resp.port);
    Ok(())
}

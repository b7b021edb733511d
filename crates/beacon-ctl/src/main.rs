//! beacon-ctl: command-line interface for the Beacon daemon.

use anyhow::{Context, Result};

mod cmd;

const DEFAULT_PORT: u16 = 5325;

fn print_usage() {
    println!("Usage: beacon-ctl [--port <port>] <command>");
    println!();
    println!("Commands:");
    println!("  status                              Show daemon status and announced services");
    println!("  list                                List every discovered service");
    println!("  get <name>                          List discovered instances of one service");
    println!("  register <name> <version> <port>    Announce a service from the daemon");
    println!("  shutdown                            Stop the daemon");
    println!();
    println!("Options:");
    println!("  --port <port>   API port (default: {})", DEFAULT_PORT);
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().skip(1).collect();

    // Parse --port option
    let mut port = DEFAULT_PORT;
    let mut remaining: Vec<&str> = Vec::new();
    let mut i = 0;
    while i < args.len() {
        if args[i] == "--port" {
            i += 1;
            port = args
                .get(i)
                .context("--port requires a value")?
                .parse()
                .context("--port must be a number")?;
        } else {
            remaining.push(&args[i]);
        }
        i += 1;
    }

    match remaining.as_slice() {
        ["status"] | []                          => cmd::status::cmd_status(port).await,
        ["list"]                                 => cmd::apis::cmd_list(port).await,
        ["get", name]                            => cmd::apis::cmd_get(port, name).await,
        ["register", name, version, svc_port]    => {
            cmd::apis::cmd_register(port, name, version, svc_port).await
        }
        ["shutdown"]                             => cmd::status::cmd_shutdown(port).await,
        ["help"] | ["--help"] | ["-h"]           => { print_usage(); Ok(()) }
        other => {
            eprintln!("Unknown command: {}", other.join(" "));
            eprintln!();
            print_usage();
            std::process::exit(1);
        }
    }
}

//! Admission gate server.
//!
//! ```text
//!     Client Request
//!     ───────────────▶ request id ─▶ trace ─▶ timeout ─▶ rate gate
//!                                                          │
//!                        ┌─────────────────────────────────┤
//!                        ▼                                 ▼
//!                 /api/captcha*                 auth gate (token → permissions)
//!                 captcha store                            │
//!                                                          ▼
//!                                              permission gate ─▶ handler
//! ```

use std::path::PathBuf;

use clap::Parser;

#[derive(Parser)]
#[command(name = "admission-gate")]
#[command(about = "Authentication, permission and rate-limit gate for HTTP APIs", long_about = None)]
struct Args {
    /// TOML config file; watched for changes. Defaults apply when omitted.
    #[arg(short, long, env = "GATE_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    admission_gate::lifecycle::startup::run(args.config.as_deref()).await?;
    Ok(())
}

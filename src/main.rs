//! Unified registry-rs CLI.
//!
//! Queries and provisioning against the annotated configuration document:
//! - `registry-rs get <protocol> <username>` - one user's quota view
//! - `registry-rs list [--protocol <p>]` - all users plus statistics
//! - `registry-rs summary` - per-protocol aggregate counts
//! - `registry-rs provision <protocol> [...]` - append a new account

use std::process::ExitCode;

use clap::Parser;

use registry_service::cli::RegistryArgs;

#[tokio::main]
async fn main() -> ExitCode {
    let args = RegistryArgs::parse();

    match registry_service::cli::run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

//! Local runner for the grammar correct service.
//!
//! Events are dispatched against a file-backed store so the full request
//! lifecycle can be exercised without AWS.

mod invoke;
mod parsing;
mod persistence;

use std::path::PathBuf;

use anyhow::Result;
use clap::ArgMatches;
use gc_core::{Config, FileStore, RequestKey};
use tracing_subscriber::EnvFilter;

use invoke::handle_invoke;
use parsing::cli_commands::match_cli_input;
use persistence::{handle_put_artifact, handle_show};

#[tokio::main]
async fn main() -> Result<()> {
    let args = match_cli_input();
    init_tracing(args.get_flag("debug"));

    let store = FileStore::new(data_dir(&args)?);

    match args.subcommand() {
        Some(("invoke", sub)) => {
            let mut config = Config::from_env()?.dispatch;
            if sub.get_flag("store_corrected_audio") {
                config.store_corrected_audio = true;
            }
            if let Some(ttl) = sub.get_one::<u64>("ttl_secs") {
                config.request_ttl_secs = *ttl;
            }

            let source = required(sub, "event")?;
            if let Some(response) = handle_invoke(store, source, config).await? {
                println!("{}", serde_json::to_string_pretty(&response)?);
            }
        }
        Some(("put-artifact", sub)) => {
            let key = RequestKey::new(required(sub, "email")?, required(sub, "request_id")?);
            let filename = handle_put_artifact(&store, &key, required(sub, "file")?).await?;
            println!("Stored artifact {}", filename);
        }
        Some(("show", sub)) => {
            let key = RequestKey::new(required(sub, "email")?, required(sub, "request_id")?);
            let item = handle_show(&store, &key).await?;
            println!("{}", serde_json::to_string_pretty(&item)?);
        }
        Some((other, _)) => return Err(anyhow::format_err!("Unknown command: {}", other)),
        None => return Err(anyhow::format_err!("No command given")),
    }

    Ok(())
}

fn data_dir(args: &ArgMatches) -> Result<PathBuf> {
    match args.get_one::<String>("data_dir") {
        Some(dir) => Ok(PathBuf::from(dir)),
        None => Ok(FileStore::default_dir()?),
    }
}

fn required<'a>(args: &'a ArgMatches, name: &str) -> Result<&'a str> {
    args.get_one::<String>(name)
        .map(String::as_str)
        .ok_or_else(|| anyhow::format_err!("Missing argument: {}", name))
}

fn init_tracing(debug: bool) {
    // Logs go to stderr so responses on stdout stay machine readable
    let default = if debug { "gc=debug,gc_core=debug" } else { "gc=info,gc_core=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

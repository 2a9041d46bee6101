//! lessoncache CLI - save, inspect, and remove offline lesson modules.

use anyhow::Result;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use lessoncache::api::{ContentClient, ContentSource};
use lessoncache::config::Config;
use lessoncache::offline::OfflineStore;
use lessoncache::store::FileKvStore;

/// Initialize the tracing subscriber for logging
fn init_tracing() {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn usage() -> ! {
    eprintln!("Usage: lessoncache <command> [args]");
    eprintln!();
    eprintln!("Commands:");
    eprintln!("  save <module-id>     Download a module and its images for offline use");
    eprintln!("  get <module-id>      Show a saved module, hydrated");
    eprintln!("  remove <module-id>   Delete a saved module and its assets");
    eprintln!("  exists <module-id>   Check whether a module is saved");
    eprintln!("  list                 List saved modules");
    std::process::exit(2);
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();
    init_tracing();

    let args: Vec<String> = std::env::args().collect();
    let command = args.get(1).map(String::as_str).unwrap_or("list");
    let module_id = args.get(2).map(String::as_str);

    let config = Config::load()?;
    let base_url = std::env::var("LESSONCACHE_API_URL")
        .ok()
        .or_else(|| config.api_base_url.clone());
    let client = match base_url {
        Some(url) => ContentClient::with_base_url(url)?,
        None => ContentClient::new()?,
    };
    let paths = config.storage_paths()?;
    let snapshots = FileKvStore::new(paths.snapshot_dir())?;
    let store = OfflineStore::new(client.clone(), Box::new(snapshots), &paths);

    match command {
        "save" => {
            let id = module_id.unwrap_or_else(|| usage());
            info!(module_id = id, "Saving module offline");
            let module = client.fetch_module(id).await?;
            store.save_module_offline(&module).await?;
            println!("Saved '{}' for offline use", module.title);
        }
        "get" => {
            let id = module_id.unwrap_or_else(|| usage());
            match store.get_offline_module(id).await? {
                Some(hydrated) => {
                    let snapshot = &hydrated.snapshot;
                    println!(
                        "{} - {} page(s), saved {}",
                        snapshot.module.title,
                        snapshot.pages.len(),
                        snapshot.age_display()
                    );
                    println!("hydrated assets: {}", hydrated.handles.len());
                }
                None => println!("Module '{}' is not saved offline", id),
            }
        }
        "remove" => {
            let id = module_id.unwrap_or_else(|| usage());
            store.remove_module_offline(id).await?;
            println!("Removed '{}'", id);
        }
        "exists" => {
            let id = module_id.unwrap_or_else(|| usage());
            println!("{}", store.is_module_offline(id).await?);
        }
        "list" => {
            let modules = store.list_offline_modules().await?;
            if modules.is_empty() {
                println!("No modules saved offline");
            }
            for module in modules {
                println!("{}  {}", module.id, module.title);
            }
        }
        _ => usage(),
    }

    Ok(())
}

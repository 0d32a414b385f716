use profile_booking_service::infra::config::{Config, StorageBackend};
use profile_booking_service::infra::telemetry;
use profile_booking_service::{app, Collection};

fn usage_and_exit() -> ! {
    eprintln!(
        "Usage: cargo run --bin preflight\n\
         \n\
         Reads env vars (or .env):\n\
           STORAGE_BACKEND (postgres|memory), DATABASE_URL, DATABASE_MAX_CONNECTIONS, PORT\n\
         Connects to storage, creates missing collections and reports document counts.\n"
    );
    std::process::exit(2);
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    telemetry::init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.iter().any(|a| a == "-h" || a == "--help") {
        usage_and_exit();
    }

    let config = Config::from_env()?;

    println!("> Preflight:");
    println!("  STORAGE_BACKEND={:?}", config.storage);
    println!("  LISTEN_ADDR={}", config.listen_addr());
    if config.storage == StorageBackend::Postgres {
        println!("  DATABASE_MAX_CONNECTIONS={}", config.max_connections);
    }

    let store = app::open_store(&config).await?;
    store.ping().await?;
    println!("  Storage reachable: yes");

    for collection in Collection::ALL {
        let n = store.count(collection).await?;
        println!("  {}: {} documents", collection, n);
    }

    println!("> Preflight OK");
    Ok(())
}

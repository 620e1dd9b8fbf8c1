use pos::config::Config;
use pos::database::sqlite::SQLiteConnection;
use pos::database::{seed_menu, Database};
use pos::endpoints::{create_http_router, handle};
use pos::errors::Result;
use pos::http::HttpServer;
use pos::pos::PointOfSale;
use std::sync::{Arc, Mutex};
use tracing_subscriber::EnvFilter;

fn run() -> Result<()> {
    let config = Config::from_env()?;

    let mut db = SQLiteConnection::open(&config.database)?;
    // A database file survives restarts, only fill an empty menu
    if config.seed_menu && db.list_menu_items()?.is_empty() {
        seed_menu(&mut db)?;
        tracing::info!("Loaded the sample menu");
    }

    let pos: Arc<Mutex<PointOfSale>> = Arc::new(Mutex::new(PointOfSale::new(
        Box::new(db) as Box<dyn Database + Send>,
    )));
    let router = Arc::new(create_http_router()?);

    let server = HttpServer::new(&config.address)?;
    tracing::info!(address = %config.address, database = %config.database, "Listening");
    server.serve(move |request| handle(&router, &pos, request));
    Ok(())
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    if let Err(err) = run() {
        tracing::error!(error = %err, "Server stopped");
        std::process::exit(1);
    }
}

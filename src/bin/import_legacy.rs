//! Replaces the catalog with the contents of the legacy shop database.
//!
//! Run with: cargo run --bin import-legacy -- <db> <user> <password> <media dir>
//!
//! Legacy host and port come from `APP__LEGACY_DB_HOST` / `APP__LEGACY_DB_PORT`.

use std::{io::Write, path::PathBuf, sync::Arc};

use anyhow::Context;
use clap::Parser;
use rand::{rngs::StdRng, SeedableRng};
use tracing::info;

use shop_catalog::{
    config, db,
    importer::{Importer, LegacyConnection, SqlLegacySource},
    media::{FsMediaStore, MediaStore},
};

#[derive(Debug, Parser)]
#[command(name = "import-legacy", about = "Import products from the legacy shop database")]
struct Args {
    /// Legacy database name
    old_db_name: String,
    /// Legacy database user
    old_db_user: String,
    /// Legacy database password
    old_db_password: String,
    /// Directory holding the legacy product images
    path_to_old_media: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let cfg = config::load_config().context("loading configuration")?;
    config::init_tracing(&cfg.log_level, cfg.log_json);

    let catalog_db = db::establish_connection_from_app_config(&cfg)
        .await
        .context("connecting to the catalog database")?;
    db::run_migrations(&catalog_db)
        .await
        .context("running catalog migrations")?;

    let legacy = LegacyConnection {
        host: cfg.legacy_db_host.clone(),
        port: cfg.legacy_db_port,
        database: args.old_db_name,
        user: args.old_db_user,
        password: args.old_db_password,
    };
    let source = SqlLegacySource::connect(&legacy)
        .await
        .context("connecting to the legacy database")?;

    let media: Arc<dyn MediaStore> = Arc::new(FsMediaStore::new(&cfg.media_root));
    let mut importer = Importer::new(
        Arc::new(catalog_db),
        media,
        source,
        args.path_to_old_media,
        StdRng::from_entropy(),
    );

    let report = importer
        .run(|progress| {
            let mut out = std::io::stdout();
            let _ = write!(out, "import products {}%\r", progress.percent);
            let _ = out.flush();
        })
        .await?;

    println!("imported products {}/{}", report.products, report.total);
    info!(
        categories = report.categories,
        variants = report.variants,
        images = report.images,
        "Import complete"
    );
    Ok(())
}

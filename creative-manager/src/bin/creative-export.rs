#![deny(rust_2018_idioms)]
#![deny(clippy::all)]

use std::{error::Error, path::Path, sync::Arc};

use clap::{crate_version, Arg, Command};
use slog::{error, info, warn};

use creative_manager::{FileStorage, Manager};
use gateway::HttpGateway;
use primitives::{
    config::configuration,
    util::{api::ApiUrl, logging::new_logger},
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let cli = Command::new("Creative export")
        .version(crate_version!())
        .about("Bundles the locally saved creative draft into a zip archive")
        .arg(
            Arg::new("config")
                .help("the config file for the creative manager")
                .takes_value(true),
        )
        .arg(
            Arg::new("storageDir")
                .long("storageDir")
                .short('s')
                .help("the directory the draft snapshots are saved in")
                .required(true)
                .takes_value(true),
        )
        .arg(
            Arg::new("output")
                .long("output")
                .short('o')
                .help("the directory the archive is written to")
                .default_value(".")
                .takes_value(true),
        )
        .arg(
            Arg::new("gatewayUrl")
                .long("gatewayUrl")
                .short('g')
                .help("overrides the base url of the creative API from the config")
                .takes_value(true),
        )
        .get_matches();

    let mut config = configuration(cli.value_of("config"))?;
    if let Some(gateway_url) = cli.value_of("gatewayUrl") {
        config.gateway.base_url = ApiUrl::parse(gateway_url)?;
    }

    let logger = new_logger("creative-export");

    let storage_dir = cli.value_of("storageDir").ok_or("storage directory missing")?;
    let storage = FileStorage::new(storage_dir, config.storage.quota)?;
    let gateway = HttpGateway::new(&config.gateway, logger.clone())?;
    let manager = Manager::new(config, Arc::new(gateway), Arc::new(storage), logger.clone());

    if !manager.hydrate_from_local().await? {
        error!(&logger, "No saved draft in {}", storage_dir; "module" => "creative-export");
        return Err(format!("No saved draft in {storage_dir}").into());
    }

    let bundle = manager.export(None).await?;
    for warning in &bundle.warnings {
        warn!(&logger, "{}", warning; "module" => "creative-export");
    }

    let output = Path::new(cli.value_of("output").unwrap_or(".")).join(&bundle.file_name);
    tokio::fs::write(&output, &bundle.bytes).await?;

    info!(&logger, "Exported the draft to {}", output.display(); "module" => "creative-export", "files" => bundle.files.len());

    Ok(())
}

use std::path::PathBuf;
use std::sync::Arc;

use bytes::Bytes;
use tracing::info;

use crate::cli::ConvertArgs;
use convertbox::config::Config;
use convertbox::dispatch::{ConversionRequest, Dispatcher};
use convertbox::observability::Metrics;

type AnyError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// One conversion through the same dispatcher the server uses, with the
/// artifact copied to the requested destination.
pub async fn convert(config: Config, args: ConvertArgs) -> Result<(), AnyError> {
    let file_name = args
        .input
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| format!("Not a file: {}", args.input.display()))?;
    let data = tokio::fs::read(&args.input)
        .await
        .map_err(|e| format!("Failed to read {}: {}", args.input.display(), e))?;

    let conversion_type = args
        .conversion_type
        .unwrap_or_else(|| config.conversion.default_type.to_string());

    let dispatcher = Dispatcher::from_config(&config, Arc::new(Metrics::new()));
    dispatcher.tracker().ensure_roots().await?;

    let artifact = dispatcher
        .dispatch(ConversionRequest {
            file_name,
            data: Bytes::from(data),
            conversion_type,
        })
        .await?;

    let dest = match args.output {
        Some(path) if path.is_dir() => path.join(artifact.file_name()),
        Some(path) => path,
        None => PathBuf::from(artifact.file_name()),
    };
    let written = artifact.copy_to(&dest).await?;

    info!(path = %dest.display(), bytes = written, "Converted file written");
    println!("{}", dest.display());
    Ok(())
}

pub fn print_config(config: &Config) -> Result<(), AnyError> {
    print!("{}", config.to_toml()?);
    Ok(())
}

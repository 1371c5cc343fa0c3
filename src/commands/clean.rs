use tracing::info;

use crate::{CleanArgs, build::validate_dest, config::SiteConfig};

pub async fn run(args: &CleanArgs) -> Result<(), anyhow::Error> {
    let root = std::env::current_dir()?;

    // Same resolution as a build: argument, then config, then the default
    let dest = match args.dest.as_deref().filter(|d| !d.is_empty()) {
        Some(dest) => dest.to_string(),
        None => SiteConfig::load(&root)?.dest_or_default().to_string(),
    };
    let site_path = root.join(validate_dest(&dest)?);

    if !site_path.exists() {
        info!("Nothing to delete at {}", site_path.display());
        return Ok(());
    }

    if args.dry_run {
        info!("Would delete {}", site_path.display());
    } else {
        tokio::fs::remove_dir_all(&site_path).await?;
        info!("Deleted {}", site_path.display());
    }

    Ok(())
}

use std::path::Path;

use tracing::info;
use warden_core::config::WardenConfig;

/// Run the `init` command: write a default configuration file.
pub async fn run(config_path: &str, force: bool) -> anyhow::Result<()> {
    let path = Path::new(config_path);
    if path.exists() && !force {
        anyhow::bail!("{config_path} already exists, pass --force to overwrite it");
    }

    let config = WardenConfig::generate_default();
    let toml_str = toml::to_string_pretty(&config)?;
    std::fs::write(path, &toml_str)?;
    info!("Wrote configuration to {}", path.display());

    println!("Warden configuration written to {config_path}");
    println!();
    println!("Next steps:");
    println!("  1. Point [directory] at a domain controller and the forest root");
    println!("  2. Fill in [ca] so CA tokens in CDP and AIA URLs expand correctly");
    println!("  3. Run `warden check-policy <file>` on each template policy");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn init_writes_valid_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("warden.toml");
        let path_str = path.to_string_lossy().to_string();

        run(&path_str, false).await.unwrap();

        let config = WardenConfig::load(&path).unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.directory.timeout_secs, 15);
    }

    #[tokio::test]
    async fn init_refuses_to_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("warden.toml");
        std::fs::write(&path, "# existing").unwrap();
        let path_str = path.to_string_lossy().to_string();

        let err = run(&path_str, false).await.unwrap_err();
        assert!(err.to_string().contains("already exists"));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "# existing");

        run(&path_str, true).await.unwrap();
        assert!(WardenConfig::load(&path).is_ok());
    }
}

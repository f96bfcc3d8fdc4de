use std::path::Path;

use tracing::info;
use warden_core::config::WardenConfig;
use warden_directory::client::LdapDirectoryClient;
use warden_directory::resolver::{DirectoryResolver, ResolveRequest};

/// Options of the `resolve` command.
#[derive(Debug, Clone)]
pub struct ResolveOptions {
    pub identity: String,
    pub attribute: String,
    pub category: String,
    pub search_root: Option<String>,
    pub nested: bool,
}

/// Run the `resolve` command: look up one directory object and print it as JSON.
pub async fn run(config_path: &str, options: &ResolveOptions) -> anyhow::Result<()> {
    let config = WardenConfig::load(Path::new(config_path))?;
    config.validate()?;

    info!("Loaded configuration from {}", config_path);

    let resolver = DirectoryResolver::new(LdapDirectoryClient::new(&config.directory));
    let request = ResolveRequest {
        forest_root: &config.directory.forest_root,
        match_attribute: &options.attribute,
        identity: &options.identity,
        object_category: &options.category,
        search_root: options.search_root.as_deref(),
        resolve_nested_groups: options.nested,
    };

    let object = resolver.resolve(&request).await?;
    println!("{}", serde_json::to_string_pretty(&object)?);

    Ok(())
}

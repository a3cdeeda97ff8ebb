use anyhow::Context;
use devforge_core::config::Config;
use devforge_core::store::ProjectStore;
use devforge_core::{io, paths};
use std::path::Path;

pub fn run(root: &Path) -> anyhow::Result<()> {
    println!("Initializing devforge in: {}", root.display());

    let config_path = paths::config_path(root);
    let config = if config_path.exists() {
        println!("  exists:  {}", paths::CONFIG_FILE);
        Config::load(root).context("failed to read config.yaml")?
    } else {
        let cfg = Config::default();
        cfg.save(root).context("failed to write config.yaml")?;
        println!("  created: {}", paths::CONFIG_FILE);
        cfg
    };

    if let Some(db) = config.store_path(root) {
        let existed = db.exists();
        if ProjectStore::from_config(&config, root).is_durable() {
            let verb = if existed { "exists: " } else { "created:" };
            println!("  {verb} {}", db.display());
        }
    }

    if io::ensure_gitignore_entry(root, paths::STATE_DB)? {
        println!("  updated: .gitignore");
    }

    for warning in config.validate() {
        println!("  warning: {warning}");
    }

    println!("\nNext: devforge project new");
    Ok(())
}

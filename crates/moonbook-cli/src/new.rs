//! New command implementation for Moonbook CLI.

use moonbook_core::Document;
use moonbook_sync::{default_notebook_path, write_document};

/// Create an empty notebook file.
pub fn execute(path: &str, force: bool) -> anyhow::Result<()> {
    let path = default_notebook_path(path);

    if path.exists() && !force {
        anyhow::bail!(
            "File {} already exists (use --force to overwrite)",
            path.display()
        );
    }

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    write_document(&path, &Document::new())?;
    println!("Created new notebook: {}", path.display());

    Ok(())
}

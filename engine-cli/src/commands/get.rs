//! Read a settings value.

use anyhow::{Context, Result};
use engine_api::Engine;
use engine_types::OpenMode;

/// Run the get command.
pub fn run(engine: &Engine, path: &str, name: &str) -> Result<()> {
    let key = engine
        .open_key_by_path(path, OpenMode::ReadOnly)
        .with_context(|| format!("failed to open settings key {:?}", path))?;
    let value = key
        .get_str(name)
        .with_context(|| format!("failed to read value {:?}", name))?;
    println!("{}", value);
    key.close()?;
    Ok(())
}

//! Write a settings value.

use anyhow::{Context, Result};
use engine_api::Engine;
use engine_types::OpenMode;

/// Run the set command.
pub fn run(engine: &Engine, path: &str, name: &str, value: &str, as_int: bool) -> Result<()> {
    let key = engine
        .open_key_by_path(path, OpenMode::ReadWrite)
        .with_context(|| format!("failed to open settings key {:?}", path))?;
    if as_int {
        let value: u32 = value.parse().context("value is not an integer")?;
        key.set_u32(name, value)?;
    } else {
        key.set_str(name, value)?;
    }
    key.close()?;
    println!("set {} {}", path, name);
    Ok(())
}

//! Show engine module information.

use crate::commands::Connected;
use anyhow::Result;
use engine_types::SdkVersion;

/// Run the info command.
pub fn run(connected: &Connected) -> Result<()> {
    println!("=== engine-cli info ===");
    println!();
    println!("Module:  {}", connected.module_name);
    match &connected.library {
        Some(path) => println!("Library: {}", path.display()),
        None => println!("Library: (in-process mock)"),
    }
    match connected.engine_version {
        Some(version) => println!("Engine:  {}", version),
        None => println!("Engine:  (mock)"),
    }
    println!("SDK:     {}", SdkVersion::CURRENT);
    Ok(())
}

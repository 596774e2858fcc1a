pub mod compile;
pub mod run;
pub mod solve;

use std::fs;
use std::path::Path;

/// Writes to the file if given, stdout otherwise.
pub(crate) fn emit(output: Option<&Path>, content: &str) -> anyhow::Result<()> {
    match output {
        Some(path) => {
            fs::write(path, content)?;
            tracing::info!("Wrote {}", path.display());
        }
        None => println!("{content}"),
    }
    Ok(())
}

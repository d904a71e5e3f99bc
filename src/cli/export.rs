//! Export command.
//!
//! Writes the definitions of an organization's secrets to CSV.

use std::path::Path;

use crate::cli::output;
use crate::cli::GlobalArgs;
use crate::core::config::{Overrides, Settings};
use crate::core::export;
use crate::core::owner;
use crate::core::platform::GitHub;
use crate::error::Result;

/// Export secrets of `source_org` (or the current repository's owner).
pub fn execute(global: &GlobalArgs, source_org: Option<String>, output_file: &Path) -> Result<()> {
    let settings = Settings::load(&Overrides::from(global))?;
    let org = match source_org {
        Some(org) => org,
        None => owner::current_owner()?,
    };

    let client = GitHub::new(&settings)?;
    let runtime = super::runtime()?;
    let secrets = runtime.block_on(export::collect(&client, &org, settings.concurrency))?;

    let rows = export::write_csv(output_file, &org, &secrets)?;

    output::success(&format!(
        "exported {} secret{} from {} to {}",
        rows,
        if rows == 1 { "" } else { "s" },
        output::key(&org),
        output::path(&output_file.display().to_string())
    ));
    if rows > 0 {
        output::dimmed("  values are not exported; the platform never returns them");
    }

    Ok(())
}

use colored::Colorize;
use signet_key::KeyHalf;

use super::Workspace;
use crate::error::CliResult;

/// Stored key names with whether they can sign, sorted by name
pub fn key_names(workspace: &Workspace) -> CliResult<Vec<(String, bool)>> {
    let store = workspace.service.keys().store();
    let signing = store.list(KeyHalf::Private)?;
    Ok(store
        .list(KeyHalf::Public)?
        .into_iter()
        .map(|name| {
            let can_sign = signing.contains(&name);
            (name, can_sign)
        })
        .collect())
}

pub fn handle(workspace: &Workspace) -> CliResult<()> {
    let names = key_names(workspace)?;
    if names.is_empty() {
        println!("{}", "No keys stored".yellow());
        return Ok(());
    }

    for (name, can_sign) in names {
        let kind = if can_sign {
            "signing".green()
        } else {
            "imported".cyan()
        };
        println!("  {} ({})", name.bold(), kind);
    }
    Ok(())
}

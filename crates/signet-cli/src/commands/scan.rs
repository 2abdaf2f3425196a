use std::path::PathBuf;

use colored::Colorize;

use super::{read_content, Workspace};
use crate::error::CliResult;

pub fn handle(
    workspace: &Workspace,
    document: String,
    user: String,
    file: PathBuf,
    syntax: Option<String>,
) -> CliResult<()> {
    let document = workspace.document(&document)?;
    let user = workspace.user(&user)?;
    let content = read_content(&file)?;
    let syntax = syntax.unwrap_or_else(|| workspace.settings.discovery.default_syntax.clone());

    let found = workspace
        .service
        .discovery()
        .find_signable_fragments(&content, &syntax, &document, Some(&user));

    if found.is_empty() {
        println!("{} nothing left for {} to sign in {}", "✓".green(), user, document);
        return Ok(());
    }

    println!("{}", format!("{} fragment(s) to sign:", found.len()).yellow());
    for (id, body) in &found {
        let preview: String = body.chars().take(60).collect();
        println!("  {} {}", id.bold(), preview.replace('\n', " ").dimmed());
    }

    Ok(())
}

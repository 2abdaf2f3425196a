use std::path::PathBuf;

use colored::Colorize;
use signet_core::RequestContext;

use super::{read_content, Workspace};
use crate::error::CliResult;

pub fn handle(
    workspace: &Workspace,
    key: String,
    user: String,
    document: String,
    id: String,
    file: PathBuf,
) -> CliResult<()> {
    let user = workspace.user(&user)?;
    let document = workspace.document(&document)?;
    let content = read_content(&file)?;

    println!("{}", format!("Signing fragment {:?} of {}...", id, document).cyan());
    let ctx = RequestContext::new(document, Some(user));
    let record = workspace.service.sign_fragment(&ctx, &id, &content, &key)?;

    println!("{} signed by {} with key {}", "✓".green(), record.author.bold(), record.certificate);
    println!("{}", serde_json::to_string_pretty(&record)?);

    Ok(())
}

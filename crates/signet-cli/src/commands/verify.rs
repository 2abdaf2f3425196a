use std::path::PathBuf;

use colored::Colorize;
use signet_core::CoreError;

use super::{read_content, Workspace};
use crate::error::CliResult;

pub fn handle(workspace: &Workspace, document: String, id: String, file: PathBuf) -> CliResult<()> {
    let document = workspace.document(&document)?;
    let content = read_content(&file)?;
    println!("{}", format!("Verifying fragment {:?} of {}...", id, document).cyan());

    let record = workspace
        .service
        .records()
        .find(&document, &id)?
        .ok_or_else(|| CoreError::SignatureInvalid(format!("fragment {:?} is not signed", id)))?;

    match workspace.service.engine().check(&record, &content, &document) {
        Ok(signer) => {
            println!("{} {}", "✓".green(), "Signature valid".green().bold());
            println!("  Signer: {}", signer);
            println!("  Key: {}", record.certificate);
            Ok(())
        }
        Err(e) => {
            println!("{} {}", "✗".red(), "Signature rejected".red().bold());
            println!("  {}", e);
            Err(e.into())
        }
    }
}

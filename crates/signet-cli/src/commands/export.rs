use std::fs;
use std::path::PathBuf;

use colored::Colorize;

use super::Workspace;
use crate::error::CliResult;

pub fn handle(workspace: &Workspace, name: String, output: Option<PathBuf>) -> CliResult<()> {
    let public = workspace.service.keys().key_pair(&name)?.public;
    let bytes = public.to_bytes()?;

    match output {
        Some(path) => {
            fs::write(&path, &bytes)?;
            eprintln!("{} public key of {} written to {:?}", "✓".green(), name.bold(), path);
        }
        None => println!("{}", String::from_utf8_lossy(&bytes)),
    }

    Ok(())
}

use std::fs;
use std::path::PathBuf;

use colored::Colorize;
use signet_key::KeyArtifact;

use super::{fingerprint, Workspace};
use crate::error::{CliError, CliResult};

pub fn handle(workspace: &Workspace, name: String, public: PathBuf) -> CliResult<()> {
    if !public.is_file() {
        return Err(CliError::FileNotFound(public.display().to_string()));
    }
    let artifact = KeyArtifact::from_bytes(&fs::read(&public)?)?;
    let bits = artifact.modulus_bits();
    let print = fingerprint(&artifact);

    workspace.service.keys().import_public_key(&name, artifact)?;

    println!("{} public key imported as {}", "✓".green(), name.bold());
    println!("  Modulus: {} bits", bits);
    println!("  Fingerprint: {}", print);
    println!(
        "{}",
        "  Signatures made with this key now verify; it cannot sign here.".yellow()
    );

    Ok(())
}

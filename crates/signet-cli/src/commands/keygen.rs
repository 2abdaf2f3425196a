use colored::Colorize;

use super::{fingerprint, Workspace};
use crate::error::CliResult;

pub fn handle(workspace: &Workspace, name: String) -> CliResult<()> {
    let keys = workspace.service.keys();
    println!(
        "{}",
        format!("Generating RSA-{} key pair {:?}...", keys.key_bits(), name).cyan()
    );

    workspace.service.generate_key_pair(&name)?;
    let pair = keys.key_pair(&name)?;

    println!("{} key pair {} generated", "✓".green(), name.bold());
    println!();
    println!("{}", "Key information:".cyan());
    println!("  Modulus: {} bits", pair.public.modulus_bits());
    println!("  Fingerprint: {}", fingerprint(&pair.public));

    Ok(())
}

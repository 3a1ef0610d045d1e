use std::path::Path;

use alloy::signers::local::PrivateKeySigner;
use color_eyre::{
    eyre::{bail, WrapErr},
    Result,
};
use resolve_path::PathResolveExt;

/// Parse newline delimited private keys. Blank lines are skipped and the `0x`
/// prefix is optional. Errors name the line, never the key.
pub fn parse_signers(text: &str) -> Result<Vec<PrivateKeySigner>> {
    let mut signers = Vec::new();
    for (idx, line) in text.lines().enumerate() {
        let key = line.trim();
        if key.is_empty() {
            continue;
        }
        let key = key.strip_prefix("0x").unwrap_or(key);
        match key.parse::<PrivateKeySigner>() {
            Ok(signer) => signers.push(signer),
            Err(_) => bail!("Invalid private key on line {}", idx + 1),
        }
    }
    Ok(signers)
}

/// Load signers from a key file. A missing or empty file is fatal.
pub fn load_signers(path: &Path) -> Result<Vec<PrivateKeySigner>> {
    let path = path.resolve();
    let text = std::fs::read_to_string(&path)
        .wrap_err_with(|| format!("Failed to read key file {path:?}"))?;
    let signers = parse_signers(&text).wrap_err_with(|| format!("In key file {path:?}"))?;
    if signers.is_empty() {
        bail!("No private keys found in {path:?}");
    }
    Ok(signers)
}

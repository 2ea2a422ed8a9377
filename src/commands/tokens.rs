use anyhow::{Context as _, Result};
use colored::Colorize;

use super::Context;
use crate::jwt::decode_jwt;
use crate::pkce;
use crate::render::{print_view, PageView};

/// Show stored settings and tokens, decoded.
pub fn show(ctx: &Context) -> Result<()> {
    let store = ctx.open_store()?;
    if store.is_empty() {
        println!("{}", "Storage is empty".yellow());
        println!("\nRun 'oidc-demo init' to load the config");
        return Ok(());
    }
    print_view(&PageView::from_store(&store));
    Ok(())
}

pub fn decode(token: &str) -> Result<()> {
    let decoded = decode_jwt(token).context("Failed to decode token")?;
    println!("{}", decoded.to_pretty());
    Ok(())
}

/// Print the S256 challenge for a verifier (the built-in one by default).
pub fn challenge(verifier: Option<String>) -> Result<()> {
    let verifier = verifier.unwrap_or_else(|| pkce::CODE_VERIFIER.to_string());
    println!("{} {}", "code_verifier: ".bright_cyan(), verifier);
    println!("{} {}", "code_challenge:".bright_cyan(), pkce::code_challenge(&verifier));
    Ok(())
}

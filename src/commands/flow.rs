use anyhow::{bail, Result};
use colored::Colorize;
use dialoguer::Confirm;
use tracing::warn;

use super::{block_on, Context};
use crate::config;
use crate::oidc;
use crate::render::{print_view, PageView};

/// Load the config document and seed storage.
pub fn init(ctx: &Context) -> Result<()> {
    let mut store = ctx.open_store()?;
    let http = reqwest::Client::new();
    let config = block_on(config::load_config(&http, &ctx.config_source))??;
    config::seed_store(&mut store, &config)?;

    println!(
        "{} Loaded config from {}",
        "✓".green(),
        ctx.config_source.to_string().bright_cyan()
    );
    println!("  Client ID: {}", config.client_id);
    println!("  Storage:   {}", store.path().display());
    Ok(())
}

/// Print the IdP authorization URL, optionally opening it in a browser.
pub fn login(ctx: &Context, open_browser: bool) -> Result<()> {
    let mut store = ctx.open_store()?;
    let url = oidc::start_login(&mut store)?;

    println!("{} Open this URL to log in at the IdP:", "→".bright_blue());
    println!("{}", url);

    if open_browser {
        if let Err(e) = open::that(url.as_str()) {
            warn!(error = %e, "Could not open a browser");
            println!("{} Open the URL above manually", "!".yellow());
        }
    }
    Ok(())
}

/// Complete the flow from a pasted redirect URL (or just its query string).
pub fn callback(ctx: &Context, redirect: &str) -> Result<()> {
    let mut store = ctx.open_store()?;
    let query = callback_query(redirect);

    let http = reqwest::Client::new();
    let stored = block_on(oidc::handle_callback(&http, &mut store, query))??;
    if !stored {
        bail!("Missing OIDC 'code' parameter in '{}'", redirect);
    }

    println!("{} Tokens stored", "✓".green());
    println!();
    print_view(&PageView::from_store(&store));
    Ok(())
}

pub fn call_api(ctx: &Context) -> Result<()> {
    let store = ctx.open_store()?;
    let http = reqwest::Client::new();
    let status = block_on(oidc::call_protected(&http, &store))??;
    println!("API response status: {}", color_status(status));
    Ok(())
}

pub fn logout(ctx: &Context) -> Result<()> {
    let mut store = ctx.open_store()?;
    let http = reqwest::Client::new();
    let status = block_on(oidc::logout(&http, &mut store))??;
    println!("Logout response status: {}", color_status(status));
    Ok(())
}

/// Clear storage and reload the config.
pub fn reset(ctx: &Context, force: bool) -> Result<()> {
    let mut store = ctx.open_store()?;

    if !force {
        let confirmed = Confirm::new()
            .with_prompt(format!(
                "Clear all stored tokens and settings in {}?",
                store.path().display()
            ))
            .default(false)
            .interact()?;
        if !confirmed {
            println!("{}", "Cancelled".yellow());
            return Ok(());
        }
    }

    let http = reqwest::Client::new();
    let loaded = block_on(config::load_config(&http, &ctx.config_source))?;
    oidc::reset(&mut store, loaded, &ctx.config_source)?;
    println!("{} App state reset", "✓".green());
    Ok(())
}

/// The query string of a pasted redirect URL. A bare query passes through;
/// any fragment is dropped.
fn callback_query(redirect: &str) -> &str {
    let query = redirect
        .split_once('?')
        .map(|(_, query)| query)
        .unwrap_or(redirect);
    query.split('#').next().unwrap_or_default()
}

fn color_status(status: reqwest::StatusCode) -> colored::ColoredString {
    let text = status.to_string();
    if status.is_success() {
        text.green()
    } else {
        text.red()
    }
}

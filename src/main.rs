use clap::{Parser, Subcommand};
use oidc_demo::commands::{self, Context};
use oidc_demo::config::{self, ConfigSource};
use oidc_demo::{logging, webui};
use std::path::PathBuf;

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Parser)]
#[command(name = "oidc-demo")]
#[command(about = "Walk through the OIDC authorization code flow with PKCE")]
#[command(version = VERSION)]
struct Cli {
    /// Config document: a local path or an http(s) URL
    #[arg(long, global = true, env = config::CONFIG_ENV)]
    config: Option<String>,

    /// Directory holding the persisted key/value storage
    #[arg(long, global = true, env = config::STATE_DIR_ENV)]
    state_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the demo page with login, callback, API call, logout and reset
    Serve {
        /// Port to listen on (loopback only)
        #[arg(long, default_value_t = 8080, env = config::PORT_ENV)]
        port: u16,
    },

    /// Load the config document into storage
    Init,

    /// Print the IdP authorization URL that starts the flow
    Login {
        /// Also open the URL in the default browser
        #[arg(long)]
        open: bool,
    },

    /// Exchange the code from an IdP redirect URL for tokens
    Callback {
        /// Full redirect URL, or just its query string
        redirect: String,
    },

    /// Show stored settings and decoded tokens
    Show,

    /// Call the protected API with the stored access token
    CallApi,

    /// Call the logout endpoint with the stored access token
    Logout,

    /// Clear all stored state and reload the config
    Reset {
        /// Skip the confirmation prompt
        #[arg(long)]
        force: bool,
    },

    /// Decode a JWT and print its header and body
    Decode {
        token: String,
    },

    /// Print the S256 code challenge for a code verifier
    Challenge {
        /// Defaults to the built-in verifier
        verifier: Option<String>,
    },
}

fn main() {
    logging::init("info");
    let cli = Cli::parse();

    let ctx = Context {
        state_dir: cli.state_dir.unwrap_or_else(config::get_state_dir),
        config_source: cli
            .config
            .as_deref()
            .map(ConfigSource::parse)
            .unwrap_or_else(config::get_config_source),
    };

    let result = match cli.command {
        Commands::Serve { port } => {
            webui::run_server(port, &ctx.state_dir, ctx.config_source.clone())
        }
        Commands::Init => commands::flow::init(&ctx),
        Commands::Login { open } => commands::flow::login(&ctx, open),
        Commands::Callback { redirect } => commands::flow::callback(&ctx, &redirect),
        Commands::Show => commands::tokens::show(&ctx),
        Commands::CallApi => commands::flow::call_api(&ctx),
        Commands::Logout => commands::flow::logout(&ctx),
        Commands::Reset { force } => commands::flow::reset(&ctx, force),
        Commands::Decode { token } => commands::tokens::decode(&token),
        Commands::Challenge { verifier } => commands::tokens::challenge(verifier),
    };

    if let Err(e) = result {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

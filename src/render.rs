use colored::Colorize;
use std::fmt::Write as _;
use tracing::warn;

use crate::jwt::decode_jwt;
use crate::store::{keys, Store};

/// A stored token and its decoded form (empty when absent or malformed).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenView {
    pub raw: String,
    pub decoded: String,
}

impl TokenView {
    fn decode(store: &Store, key: &'static str) -> Self {
        let Some(raw) = store.get(key).filter(|t| !t.is_empty()) else {
            return Self::default();
        };
        let decoded = match decode_jwt(raw) {
            Ok(jwt) => jwt.to_pretty(),
            Err(e) => {
                warn!(token = key, error = %e, "Could not decode stored token");
                String::new()
            }
        };
        Self {
            raw: raw.to_string(),
            decoded,
        }
    }
}

/// Status codes of the last API call and logout, shown on the page.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Statuses {
    pub api: Option<u16>,
    pub logout: Option<u16>,
}

/// Everything the page shows, read from storage.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageView {
    pub client_id: String,
    pub authorization_endpoint: String,
    pub callback_endpoint: String,
    pub token_endpoint: String,
    pub protected_endpoint: String,
    pub logout_endpoint: String,
    pub authenticated: bool,
    pub expires_in: String,
    pub refresh_token: String,
    pub access_token: TokenView,
    pub id_token: TokenView,
}

impl PageView {
    pub fn from_store(store: &Store) -> Self {
        let text = |key: &str| store.get(key).unwrap_or_default().to_string();
        Self {
            client_id: text(keys::CLIENT_ID),
            authorization_endpoint: text(keys::AUTHORIZATION_ENDPOINT),
            callback_endpoint: text(keys::CALLBACK_ENDPOINT),
            token_endpoint: text(keys::TOKEN_ENDPOINT),
            protected_endpoint: text(keys::PROTECTED_ENDPOINT),
            logout_endpoint: text(keys::LOGOUT_ENDPOINT),
            authenticated: store.get(keys::AUTHENTICATED) == Some("true"),
            expires_in: text(keys::EXPIRES_IN),
            refresh_token: text(keys::REFRESH_TOKEN),
            access_token: TokenView::decode(store, keys::ACCESS_TOKEN),
            id_token: TokenView::decode(store, keys::ID_TOKEN),
        }
    }

    fn config_rows(&self) -> [(&'static str, &str); 6] {
        [
            ("Client ID", self.client_id.as_str()),
            ("Authorization endpoint", self.authorization_endpoint.as_str()),
            ("Callback endpoint", self.callback_endpoint.as_str()),
            ("Token endpoint", self.token_endpoint.as_str()),
            ("Protected endpoint", self.protected_endpoint.as_str()),
            ("Logout endpoint", self.logout_endpoint.as_str()),
        ]
    }
}

pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

const PAGE_HEAD: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>OIDC PKCE demo</title>
<style>
body { font-family: sans-serif; max-width: 60rem; margin: 2rem auto; }
pre { background: #f4f4f4; padding: .75rem; white-space: pre-wrap; word-break: break-all; }
form { display: inline-block; margin-right: .5rem; }
th { text-align: left; padding-right: 1rem; }
</style>
</head>
<body>
<h1>OIDC authorization code flow with PKCE</h1>
"#;

fn status_text(status: Option<u16>) -> String {
    status.map(|s| s.to_string()).unwrap_or_default()
}

fn token_section(out: &mut String, title: &str, id: &str, token: &TokenView) {
    let _ = write!(
        out,
        "<h2>{title}</h2>\n<pre id=\"code{id}\">{}</pre>\n<pre id=\"code{id}Decoded\">{}</pre>\n",
        escape_html(&token.raw),
        escape_html(&token.decoded),
    );
}

pub fn render_html(view: &PageView, statuses: &Statuses) -> String {
    let mut out = String::from(PAGE_HEAD);

    out.push_str("<table>\n");
    for (label, value) in view.config_rows() {
        let _ = writeln!(out, "<tr><th>{label}</th><td>{}</td></tr>", escape_html(value));
    }
    let _ = writeln!(
        out,
        "<tr><th>Authenticated</th><td id=\"txtAuthenticated\">{}</td></tr>",
        view.authenticated
    );
    out.push_str("</table>\n");

    out.push_str(concat!(
        "<p>\n",
        "<form method=\"post\" action=\"/login\"><button>Login</button></form>\n",
        "<form method=\"post\" action=\"/api/call\"><button>Call protected API</button></form>\n",
        "<form method=\"post\" action=\"/logout\"><button>Logout</button></form>\n",
        "<form method=\"post\" action=\"/reset\"><button>Reset</button></form>\n",
        "</p>\n",
    ));
    let _ = writeln!(
        out,
        "<p>API response status: <span id=\"txtApiResponseStatus\">{}</span></p>",
        status_text(statuses.api)
    );
    let _ = writeln!(
        out,
        "<p>Logout response status: <span id=\"txtLogoutResponseStatus\">{}</span></p>",
        status_text(statuses.logout)
    );

    token_section(&mut out, "Access token", "AccessToken", &view.access_token);
    token_section(&mut out, "ID token", "IdToken", &view.id_token);
    let _ = writeln!(
        out,
        "<h2>Refresh token</h2>\n<pre id=\"codeRefreshToken\">{}</pre>",
        escape_html(&view.refresh_token)
    );
    let _ = writeln!(
        out,
        "<p>Expires in: <span id=\"txtExpiresIn\">{}</span></p>",
        escape_html(&view.expires_in)
    );

    out.push_str("</body>\n</html>\n");
    out
}

/// Terminal rendering for `oidc-demo show`.
pub fn print_view(view: &PageView) {
    println!("{}", "Configuration".bright_cyan().bold());
    for (label, value) in view.config_rows() {
        let value = if value.is_empty() {
            "(not set)".dimmed().to_string()
        } else {
            value.to_string()
        };
        println!("  {:<24} {}", label, value);
    }
    println!();

    let auth = if view.authenticated {
        "yes".green()
    } else {
        "no".yellow()
    };
    println!("{} {}", "Authenticated:".bright_cyan().bold(), auth);
    if !view.expires_in.is_empty() {
        println!("{} {}s", "Expires in:".bright_cyan().bold(), view.expires_in);
    }
    println!();

    for (title, token) in [("Access token", &view.access_token), ("ID token", &view.id_token)] {
        println!("{}", title.bright_cyan().bold());
        if token.raw.is_empty() {
            println!("  {}", "(none)".dimmed());
        } else {
            println!("{}", token.raw);
            if !token.decoded.is_empty() {
                println!("{}", token.decoded);
            }
        }
        println!();
    }

    println!("{}", "Refresh token".bright_cyan().bold());
    if view.refresh_token.is_empty() {
        println!("  {}", "(none)".dimmed());
    } else {
        println!("{}", view.refresh_token);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const SAMPLE: &str = "eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9.eyJzdWIiOiJ1c2VyLTEiLCJpYXQiOjE3MDAwMDAwMDAsImV4cCI6MTcwMDAwMzYwMCwiZW1haWwiOiJhQGIuYyJ9.sig";

    #[test]
    fn test_empty_store_renders_empty_view() {
        let dir = TempDir::new().unwrap();
        let view = PageView::from_store(&Store::open(dir.path()).unwrap());
        assert_eq!(view, PageView::default());
    }

    #[test]
    fn test_view_decodes_tokens() {
        let dir = TempDir::new().unwrap();
        let mut store = Store::open(dir.path()).unwrap();
        store.set(keys::ACCESS_TOKEN, SAMPLE);
        store.set(keys::AUTHENTICATED, "true");

        let view = PageView::from_store(&store);

        assert!(view.authenticated);
        assert_eq!(view.access_token.raw, SAMPLE);
        assert!(view.access_token.decoded.contains("\"sub\": \"user-1\""));
        assert!(view.access_token.decoded.contains("GMT+0000"));
    }

    #[test]
    fn test_malformed_token_has_empty_decoded() {
        let dir = TempDir::new().unwrap();
        let mut store = Store::open(dir.path()).unwrap();
        store.set(keys::ID_TOKEN, "garbage");

        let view = PageView::from_store(&store);

        assert_eq!(view.id_token.raw, "garbage");
        assert!(view.id_token.decoded.is_empty());
    }

    #[test]
    fn test_authenticated_false_string() {
        let dir = TempDir::new().unwrap();
        let mut store = Store::open(dir.path()).unwrap();
        store.set(keys::AUTHENTICATED, "false");
        assert!(!PageView::from_store(&store).authenticated);
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html(r#"<a href="x">&'</a>"#),
            "&lt;a href=&quot;x&quot;&gt;&amp;&#39;&lt;/a&gt;"
        );
    }

    #[test]
    fn test_render_html_escapes_and_shows_statuses() {
        let view = PageView {
            client_id: "<script>".to_string(),
            ..PageView::default()
        };
        let html = render_html(&view, &Statuses { api: Some(200), logout: None });
        assert!(html.contains("&lt;script&gt;"));
        assert!(!html.contains("<script>"));
        assert!(html.contains("<span id=\"txtApiResponseStatus\">200</span>"));
        assert!(html.contains("<span id=\"txtLogoutResponseStatus\"></span>"));
    }
}

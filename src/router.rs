//! Chooses the code path for a page-load or navigation event.

use reqwest::Url;
use tracing::{debug, info};

/// Matched against both the URL path and the `#` fragment.
pub const CALLBACK_PATH: &str = "/oauth2/callback";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavigationEvent {
    /// Initial load of the page.
    PageLoad { url: Url },
    /// User moved between fragment paths.
    HashChange { old_url: Url, new_url: Url },
    /// Script-driven history transition; carries the current location.
    PopState { url: Url },
    /// Anything else; routed against the current location.
    Other { url: Url },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Home,
    Callback,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dispatch {
    pub route: Route,
    /// Page loads (re)load the runtime config before anything else.
    pub load_config: bool,
}

fn fragment(url: &Url) -> String {
    url.fragment().map(|f| format!("#{f}")).unwrap_or_default()
}

fn route_for(url: &Url) -> Route {
    if url.path() == CALLBACK_PATH || url.fragment() == Some(CALLBACK_PATH) {
        Route::Callback
    } else {
        Route::Home
    }
}

pub fn dispatch(event: &NavigationEvent) -> Dispatch {
    let (url, load_config) = match event {
        NavigationEvent::PageLoad { url } => {
            info!("Handling page load: [(none)] --> [{}]", fragment(url));
            (url, true)
        }
        NavigationEvent::HashChange { old_url, new_url } => {
            info!(
                "Handling user page transition: [{}] --> [{}]",
                fragment(old_url),
                fragment(new_url)
            );
            (new_url, false)
        }
        NavigationEvent::PopState { url } => {
            info!("Handling popstate event type");
            (url, false)
        }
        NavigationEvent::Other { url } => {
            debug!("Unhandled event type");
            (url, false)
        }
    };
    Dispatch {
        route: route_for(url),
        load_config,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn test_page_load_home() {
        let d = dispatch(&NavigationEvent::PageLoad {
            url: url("http://localhost:8080/"),
        });
        assert_eq!(d.route, Route::Home);
        assert!(d.load_config);
    }

    #[test]
    fn test_callback_by_path() {
        let d = dispatch(&NavigationEvent::PageLoad {
            url: url("http://localhost:8080/oauth2/callback?code=abc&state=foobarbaz"),
        });
        assert_eq!(d.route, Route::Callback);
    }

    #[test]
    fn test_callback_by_fragment() {
        let d = dispatch(&NavigationEvent::HashChange {
            old_url: url("http://localhost:8080/#/home"),
            new_url: url("http://localhost:8080/#/oauth2/callback"),
        });
        assert_eq!(d.route, Route::Callback);
        assert!(!d.load_config);
    }

    #[test]
    fn test_similar_paths_are_home() {
        for u in [
            "http://localhost:8080/oauth2/callback/extra",
            "http://localhost:8080/oauth2",
            "http://localhost:8080/#/oauth2/callbackx",
        ] {
            let d = dispatch(&NavigationEvent::PopState { url: url(u) });
            assert_eq!(d.route, Route::Home, "{u}");
        }
    }

    #[test]
    fn test_other_events_use_current_location() {
        let d = dispatch(&NavigationEvent::Other {
            url: url("http://localhost:8080/oauth2/callback"),
        });
        assert_eq!(d, Dispatch { route: Route::Callback, load_config: false });
    }
}

//! Cookie jar shared by the K-Online and ebank hosts.

use reqwest::cookie::{CookieStore, Jar};
use reqwest::header::HeaderValue;
use reqwest::Url;
use tracing::debug;

/// Cookie jar that refuses cookies scoped to a public suffix or to a
/// registrable domain other than the responding host's.
///
/// Cookies the portal scopes to its registrable domain are replayed to both
/// portal hosts; host-only cookies stay with the host that set them.
#[derive(Debug, Default)]
pub struct PortalCookieJar {
    jar: Jar,
}

impl PortalCookieJar {
    pub fn new() -> Self {
        Self::default()
    }

    fn accepts(header: &HeaderValue, url: &Url) -> bool {
        let Ok(raw) = std::str::from_utf8(header.as_bytes()) else {
            return false;
        };
        let Some(domain) = domain_attribute(raw) else {
            return true;
        };
        let Some(host) = url.host_str() else {
            return false;
        };
        let host = host.to_ascii_lowercase();

        match (psl::domain_str(&domain), psl::domain_str(&host)) {
            (Some(cookie_site), Some(host_site)) => cookie_site == host_site,
            _ => false,
        }
    }
}

impl CookieStore for PortalCookieJar {
    fn set_cookies(&self, cookie_headers: &mut dyn Iterator<Item = &HeaderValue>, url: &Url) {
        let mut accepted = Vec::new();
        for header in cookie_headers {
            if Self::accepts(header, url) {
                accepted.push(header);
            } else {
                debug!(host = url.host_str().unwrap_or_default(), "Rejected cross-site cookie");
            }
        }
        self.jar.set_cookies(&mut accepted.into_iter(), url);
    }

    fn cookies(&self, url: &Url) -> Option<HeaderValue> {
        self.jar.cookies(url)
    }
}

/// Lowercased `Domain` attribute of a `Set-Cookie` value, without a
/// leading dot.
fn domain_attribute(set_cookie: &str) -> Option<String> {
    set_cookie.split(';').skip(1).find_map(|attr| {
        let (name, value) = attr.split_once('=')?;
        if !name.trim().eq_ignore_ascii_case("domain") {
            return None;
        }
        let value = value.trim().trim_start_matches('.').to_ascii_lowercase();
        (!value.is_empty()).then_some(value)
    })
}

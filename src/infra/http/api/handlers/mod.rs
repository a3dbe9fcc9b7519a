//! API handlers organized by resource type.

mod lists;

pub use lists::*;

use axum::http::Uri;
use url::Url;

/// Absolute URL of the current request under the public origin.
///
/// Any path prefix of `public_url` is kept in front of the request path.
fn request_url(public_url: &Url, uri: &Uri) -> Url {
    let mut url = public_url.clone();
    let prefix = url.path().trim_end_matches('/').to_string();
    url.set_path(&format!("{prefix}{}", uri.path()));
    url.set_query(uri.query());
    url
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uri(raw: &str) -> Uri {
        raw.parse().expect("valid uri")
    }

    #[test]
    fn root_public_url_takes_the_request_path() {
        let base = Url::parse("https://social.example").expect("url");
        let url = request_url(&base, &uri("/api/v1/lists/01L/accounts?limit=2"));
        assert_eq!(
            url.as_str(),
            "https://social.example/api/v1/lists/01L/accounts?limit=2"
        );
    }

    #[test]
    fn public_url_path_prefix_is_kept() {
        for raw in ["https://host.example/social", "https://host.example/social/"] {
            let base = Url::parse(raw).expect("url");
            let url = request_url(&base, &uri("/api/v1/lists/01L/accounts"));
            assert_eq!(
                url.as_str(),
                "https://host.example/social/api/v1/lists/01L/accounts"
            );
        }
    }
}

//! Deterministic URL normalization (spec §4.7, §3 invariant: equal after
//! normalization == same Expression). Generalized from the teacher's
//! `tools::crawl::normalize_url`/`resolve_url` into the full contract:
//! scheme/host lowercasing, fragment stripping, default-port removal,
//! dot-segment resolution, and tracking-parameter removal.

use url::Url;

const TRACKING_PARAM_PREFIXES: &[&str] = &["utm_", "fbclid", "gclid", "msclkid", "mc_eid", "ref_src"];

/// Resolves `href` against `base` into an absolute URL, rejecting
/// non-http(s) schemes and pseudo-protocols (spec §4.7: "candidate
/// filtering (scheme, deny-list...)").
pub fn resolve(base: &str, href: &str) -> Option<String> {
    if href.starts_with("javascript:") || href.starts_with("mailto:") || href.starts_with("tel:") || href.starts_with('#') || href.starts_with("data:") {
        return None;
    }
    let base_url = Url::parse(base).ok()?;
    let resolved = base_url.join(href).ok()?;
    if resolved.scheme() != "http" && resolved.scheme() != "https" {
        return None;
    }
    Some(normalize(resolved.as_str()))
}

/// `normalize(normalize(u)) == normalize(u)` (spec §8 round-trip property).
pub fn normalize(url: &str) -> String {
    let Ok(mut parsed) = Url::parse(url) else {
        return url.to_lowercase();
    };

    let _ = parsed.set_scheme(&parsed.scheme().to_lowercase());
    if let Some(host) = parsed.host_str() {
        let lower = host.to_lowercase();
        let _ = parsed.set_host(Some(&lower));
    }

    if (parsed.scheme() == "http" && parsed.port() == Some(80)) || (parsed.scheme() == "https" && parsed.port() == Some(443)) {
        let _ = parsed.set_port(None);
    }

    parsed.set_fragment(None);
    strip_tracking_params(&mut parsed);
    parsed.set_path(&collapse_dot_segments(parsed.path()));

    parsed.to_string()
}

fn strip_tracking_params(url: &mut Url) {
    let kept: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(k, _)| !TRACKING_PARAM_PREFIXES.iter().any(|prefix| k.to_ascii_lowercase().starts_with(prefix)))
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    if kept.is_empty() {
        url.set_query(None);
    } else {
        url.query_pairs_mut().clear().extend_pairs(kept);
    }
}

fn collapse_dot_segments(path: &str) -> String {
    let mut segments: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }
    segments.join("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lowercases_scheme_and_host() {
        assert_eq!(normalize("HTTPS://Example.COM/Path"), "https://example.com/Path");
    }

    #[test]
    fn strips_fragment_and_default_port() {
        assert_eq!(normalize("https://example.com:443/a#section"), "https://example.com/a");
    }

    #[test]
    fn strips_tracking_params_but_keeps_others() {
        assert_eq!(normalize("https://example.com/a?utm_source=x&id=5"), "https://example.com/a?id=5");
    }

    #[test]
    fn collapses_dot_segments() {
        assert_eq!(normalize("https://example.com/a/../b/./c"), "https://example.com/b/c");
    }

    #[test]
    fn normalization_is_idempotent() {
        let once = normalize("https://Example.com:443/a/../b?utm_source=x#frag");
        let twice = normalize(&once);
        assert_eq!(once, twice);
    }

    #[test]
    fn resolve_rejects_pseudo_protocols() {
        assert!(resolve("https://example.com/a", "javascript:void(0)").is_none());
        assert!(resolve("https://example.com/a", "mailto:a@b.com").is_none());
    }

    #[test]
    fn resolve_handles_relative_paths() {
        assert_eq!(resolve("https://example.com/a/b", "../c").unwrap(), "https://example.com/c");
    }
}

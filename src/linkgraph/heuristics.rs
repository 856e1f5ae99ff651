//! Host-pattern rewrite heuristics (spec §4.7, §6 config surface
//! `heuristics.rules`): a config-driven `host_pattern -> {capture_regex,
//! template}` map applied before a discovered link enters the candidate
//! filter, e.g. rewriting AMP or tracker-redirect URLs to their canonical
//! target.

use std::sync::OnceLock;

use regex::Regex;
use url::Url;

use crate::config::HeuristicsConfig;

/// Applies the first matching rule whose `capture_regex` matches `url`,
/// substituting capture groups into `template` (`$1`, `$2`, ...). Returns
/// `url` unchanged if no rule's host pattern matches.
pub fn rewrite(url: &str, cfg: &HeuristicsConfig) -> String {
    let Some(host) = Url::parse(url).ok().and_then(|u| u.host_str().map(|h| h.to_string())) else {
        return url.to_string();
    };

    for (pattern, rule) in &cfg.rules {
        if !host_matches(&host, pattern) {
            continue;
        }
        let Some(re) = compile(&rule.capture_regex) else { continue };
        if let Some(captures) = re.captures(url) {
            let mut expanded = String::new();
            captures.expand(&rule.template, &mut expanded);
            if !expanded.is_empty() {
                return expanded;
            }
        }
    }
    url.to_string()
}

fn host_matches(host: &str, pattern: &str) -> bool {
    match pattern.strip_prefix("*.") {
        Some(suffix) => host == suffix || host.ends_with(&format!(".{suffix}")),
        None => host == pattern,
    }
}

fn compile(pattern: &str) -> Option<Regex> {
    static CACHE: OnceLock<std::sync::Mutex<std::collections::HashMap<String, Regex>>> = OnceLock::new();
    let cache = CACHE.get_or_init(|| std::sync::Mutex::new(std::collections::HashMap::new()));
    let mut guard = cache.lock().unwrap();
    if let Some(re) = guard.get(pattern) {
        return Some(re.clone());
    }
    let re = Regex::new(pattern).ok()?;
    guard.insert(pattern.to_string(), re.clone());
    Some(re)
}

//! Edge filter — static pattern classifier for abusive requests.
//!
//! Runs before rate limiting and auth so high-confidence garbage is shed
//! at minimal cost. This is a blocklist, not a guarantee: the contract is
//! "catch obvious scanner traffic cheaply", nothing more. Patterns are
//! chosen to never match normal JSON bodies, percent-encoded Unicode in
//! search queries, or legitimate browser user agents.

use std::sync::LazyLock;

use axum::{extract::Request, middleware::Next, response::Response};
use axum::http::header::USER_AGENT;
use regex::Regex;
use tracing::warn;

use crate::error::AppError;

/// Labelled request-target patterns: path traversal, script injection,
/// elementary SQL injection.
static TARGET_RULES: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    [
        (r"\.\./", "path traversal"),
        (r"(?i)%2e%2e%2f", "encoded path traversal"),
        (r"\.\.\\", "path traversal (backslash)"),
        (r"(?i)<script", "inline script tag"),
        (r"(?i)%3cscript", "encoded script tag"),
        (r"(?i)\bunion\b[^&]{0,40}\bselect\b", "sql union select"),
        (r"(?i)\bdrop\s+table\b", "sql drop table"),
        (r#"(?i)['"]\s*or\s+1\s*=\s*1"#, "sql tautology"),
        (r"(?i);\s*--\s", "sql comment injection"),
    ]
    .into_iter()
    .map(|(pattern, label)| (Regex::new(pattern).expect("static regex"), label))
    .collect()
});

/// Known scanner/tool user-agent signatures.
static UA_RULES: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(sqlmap|nikto|nmap|masscan|dirbuster|gobuster|wfuzz|acunetix|nessus|zgrab)\b")
        .expect("static regex")
});

/// Classify a request target + user agent. Returns the matched rule
/// label for logging, or `None` when the request looks ordinary.
pub fn is_malicious(path: &str, query: &str, user_agent: &str) -> Option<&'static str> {
    let target = if query.is_empty() {
        path.to_string()
    } else {
        format!("{path}?{query}")
    };
    for (regex, label) in TARGET_RULES.iter() {
        if regex.is_match(&target) {
            return Some(label);
        }
    }
    if UA_RULES.is_match(user_agent) {
        return Some("scanner user agent");
    }
    None
}

/// Axum middleware: reject flagged requests with a 400 before any rate
/// limiting or auth work runs.
pub async fn reject_malicious(request: Request, next: Next) -> Result<Response, AppError> {
    let path = request.uri().path();
    let query = request.uri().query().unwrap_or("");
    let user_agent = request
        .headers()
        .get(USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    if let Some(rule) = is_malicious(path, query, user_agent) {
        warn!(path, rule, "edge filter rejected request");
        return Err(AppError::BadRequest("İstek reddedildi.".into()));
    }

    Ok(next.run(request).await)
}

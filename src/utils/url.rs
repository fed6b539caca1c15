//! URL utilities for consistent endpoint handling
//!
//! One configured base URL selects the backend for both the HTTP auth
//! calls and the chat channel handshake. These helpers normalize it and
//! derive the concrete endpoints, preventing trailing-slash and scheme
//! mistakes.

/// Normalize a base URL by removing trailing slashes
///
/// # Examples
///
/// ```
/// use palaver::utils::url::normalize_base_url;
///
/// assert_eq!(normalize_base_url("https://chat.example.com"), "https://chat.example.com");
/// assert_eq!(normalize_base_url("https://chat.example.com/"), "https://chat.example.com");
/// assert_eq!(normalize_base_url("https://chat.example.com///"), "https://chat.example.com");
/// ```
pub fn normalize_base_url(base_url: &str) -> String {
    base_url.trim_end_matches('/').to_string()
}

/// Construct a complete API endpoint URL from the base URL and a path
///
/// # Examples
///
/// ```
/// use palaver::utils::url::construct_api_url;
///
/// assert_eq!(
///     construct_api_url("https://chat.example.com", "api/users"),
///     "https://chat.example.com/api/users"
/// );
/// assert_eq!(
///     construct_api_url("https://chat.example.com/", "/api/users/existing"),
///     "https://chat.example.com/api/users/existing"
/// );
/// ```
pub fn construct_api_url(base_url: &str, endpoint: &str) -> String {
    let normalized_base = normalize_base_url(base_url);
    let endpoint = endpoint.trim_start_matches('/');
    format!("{}/{}", normalized_base, endpoint)
}

/// Derive the websocket endpoint for the chat channel from the HTTP base
/// URL. A base URL with an unrecognized scheme is passed through as-is so
/// the connection error surfaces at handshake time.
///
/// # Examples
///
/// ```
/// use palaver::utils::url::websocket_url;
///
/// assert_eq!(websocket_url("https://chat.example.com"), "wss://chat.example.com/ws");
/// assert_eq!(websocket_url("http://localhost:4000/"), "ws://localhost:4000/ws");
/// ```
pub fn websocket_url(base_url: &str) -> String {
    let base = normalize_base_url(base_url);
    let ws_base = if let Some(rest) = base.strip_prefix("https://") {
        format!("wss://{}", rest)
    } else if let Some(rest) = base.strip_prefix("http://") {
        format!("ws://{}", rest)
    } else {
        base
    };
    format!("{}/ws", ws_base)
}

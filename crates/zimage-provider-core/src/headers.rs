/// Ordered header list; names compare case-insensitively.
pub type Headers = Vec<(String, String)>;

pub const AUTHORIZATION: &str = "Authorization";
pub const CONTENT_TYPE: &str = "Content-Type";

pub fn header_set(headers: &mut Headers, name: impl Into<String>, value: impl Into<String>) {
    let name = name.into();
    let value = value.into();
    match headers.iter_mut().find(|(k, _)| k.eq_ignore_ascii_case(&name)) {
        Some((_, v)) => *v = value,
        None => headers.push((name, value)),
    }
}

pub fn header_get<'a>(headers: &'a Headers, name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(name))
        .map(|(_, v)| v.as_str())
}

/// Provider token from a caller header such as `X-HF-Token`. Blank values
/// count as absent.
pub fn header_token<'a>(headers: &'a Headers, name: &str) -> Option<&'a str> {
    header_get(headers, name)
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Sets `Authorization: Bearer <token>`; anonymous calls send none.
pub fn set_bearer(headers: &mut Headers, token: Option<&str>) {
    if let Some(token) = token {
        header_set(headers, AUTHORIZATION, format!("Bearer {token}"));
    }
}

/// Declared content type of an upstream body, `fallback` when missing or blank.
pub fn content_type_or<'a>(headers: &'a Headers, fallback: &'a str) -> &'a str {
    header_get(headers, CONTENT_TYPE)
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .unwrap_or(fallback)
}

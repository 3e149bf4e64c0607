use hyper::{header::COOKIE, HeaderMap};

pub const COOKIE_NAME: &str = "sid";

/// Extracts the session ID from a map of headers.
pub fn extract_session(headers: &HeaderMap) -> Option<&str> {
    let session = headers
        .get_all(COOKIE)
        .iter()
        .flat_map(|value| value.as_bytes().split(|&byte| byte == b';'))
        .filter_map(|section| {
            let mid = section.iter().copied().position(|byte| byte == b'=')?;
            let (left, right) = section.split_at(mid);
            let session = &right[1..];
            Some((left.trim_ascii(), session.trim_ascii()))
        })
        .find_map(|(key, session)| (key == COOKIE_NAME.as_bytes()).then_some(session))?;
    core::str::from_utf8(session).ok()
}

/// Generates a fresh random session ID as 32 hexadecimal characters.
pub fn generate_session_id() -> Box<str> {
    let bytes: [u8; 16] = rand::random();
    hex::encode(bytes).into_boxed_str()
}

pub fn session_cookie(session: &str) -> String {
    format!("{COOKIE_NAME}={session}; Path=/; HttpOnly; SameSite=Lax")
}

#[cfg(test)]
mod tests {
    use super::*;
    use hyper::header::HeaderValue;

    #[test]
    fn finds_session_among_other_cookies() {
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_static("theme=dark; sid=0123abcd; lang=en"));
        assert_eq!(extract_session(&headers), Some("0123abcd"));
    }

    #[test]
    fn missing_session_cookie() {
        let mut headers = HeaderMap::new();
        assert_eq!(extract_session(&headers), None);
        headers.insert(COOKIE, HeaderValue::from_static("theme=dark; sidebar=1"));
        assert_eq!(extract_session(&headers), None);
    }

    #[test]
    fn generated_ids_are_hex() {
        let id = generate_session_id();
        assert_eq!(id.len(), 32);
        assert!(id.bytes().all(|byte| byte.is_ascii_hexdigit()));
        assert_ne!(id, generate_session_id());
    }
}

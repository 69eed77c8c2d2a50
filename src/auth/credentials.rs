/// Authorization header parsing
///
/// Pure functions over the request headers; no I/O and no token checks.

use actix_web::http::header::{HeaderMap, AUTHORIZATION};

use crate::error::ValidationError;

const BEARER_PREFIX: &str = "Bearer ";
const API_KEY_PREFIX: &str = "ApiKey ";

/// Extract the token from `Authorization: Bearer <token>`
pub fn extract_bearer_token(headers: &HeaderMap) -> Result<String, ValidationError> {
    extract_with_prefix(headers, BEARER_PREFIX)
}

/// Extract the key from `Authorization: ApiKey <key>`
pub fn extract_api_key(headers: &HeaderMap) -> Result<String, ValidationError> {
    extract_with_prefix(headers, API_KEY_PREFIX)
}

fn extract_with_prefix(headers: &HeaderMap, prefix: &str) -> Result<String, ValidationError> {
    let value = headers
        .get(AUTHORIZATION)
        .ok_or(ValidationError::MissingAuthorizationHeader)?
        .to_str()
        .map_err(|_| ValidationError::MalformedAuthorizationHeader)?;

    let credential = value
        .strip_prefix(prefix)
        .ok_or(ValidationError::MalformedAuthorizationHeader)?
        .trim();

    if credential.is_empty() {
        return Err(ValidationError::MalformedAuthorizationHeader);
    }

    Ok(credential.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::http::header::{HeaderName, HeaderValue};

    fn headers_with(name: HeaderName, value: &'static str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(name, HeaderValue::from_static(value));
        headers
    }

    fn authorization(value: &'static str) -> HeaderMap {
        headers_with(AUTHORIZATION, value)
    }

    #[test]
    fn test_bearer_token() {
        assert_eq!(
            extract_bearer_token(&authorization("Bearer abc123")),
            Ok("abc123".to_string())
        );
    }

    #[test]
    fn test_bearer_token_is_trimmed() {
        assert_eq!(
            extract_bearer_token(&authorization("Bearer   abc123  ")),
            Ok("abc123".to_string())
        );
    }

    #[test]
    fn test_missing_header() {
        assert_eq!(
            extract_bearer_token(&HeaderMap::new()),
            Err(ValidationError::MissingAuthorizationHeader)
        );
    }

    #[test]
    fn test_token_under_other_header_is_missing() {
        let headers = headers_with(HeaderName::from_static("invalid"), "Bearer abc123");
        assert_eq!(
            extract_bearer_token(&headers),
            Err(ValidationError::MissingAuthorizationHeader)
        );
    }

    #[test]
    fn test_empty_bearer_token() {
        assert_eq!(
            extract_bearer_token(&authorization("Bearer ")),
            Err(ValidationError::MalformedAuthorizationHeader)
        );
    }

    #[test]
    fn test_wrong_scheme() {
        assert_eq!(
            extract_bearer_token(&authorization("ApiKey abc123")),
            Err(ValidationError::MalformedAuthorizationHeader)
        );
        assert_eq!(
            extract_bearer_token(&authorization("abc123")),
            Err(ValidationError::MalformedAuthorizationHeader)
        );
    }

    #[test]
    fn test_api_key() {
        assert_eq!(
            extract_api_key(&authorization("ApiKey f271c81ff7084ee5b99a5091b42d486e")),
            Ok("f271c81ff7084ee5b99a5091b42d486e".to_string())
        );
        assert_eq!(
            extract_api_key(&authorization("ApiKey    ")),
            Err(ValidationError::MalformedAuthorizationHeader)
        );
        assert_eq!(
            extract_api_key(&HeaderMap::new()),
            Err(ValidationError::MissingAuthorizationHeader)
        );
    }
}

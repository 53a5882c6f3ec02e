//! Signed browser session cookie.
//!
//! Token format: `<uuid>.<base64url(hmac_sha256(uuid))>`. Only the session
//! id travels in the cookie; game state stays server side.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;
use warp::http::header::{HeaderValue, SET_COOKIE};
use warp::reply::Response;

use crate::session::SessionId;

pub const SESSION_COOKIE: &str = "pointrush_session";

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CookieError {
    #[error("malformed session token")]
    Malformed,
    #[error("session token signature mismatch")]
    BadSignature,
    #[error("invalid signing key")]
    InvalidKey,
}

#[derive(Clone)]
pub struct SessionCookies {
    key: Arc<Vec<u8>>,
}

impl fmt::Debug for SessionCookies {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionCookies")
            .field("key", &"<redacted>")
            .finish()
    }
}

impl SessionCookies {
    pub fn new(secret: impl AsRef<[u8]>) -> Self {
        Self {
            key: Arc::new(secret.as_ref().to_vec()),
        }
    }

    fn mac(&self) -> Result<HmacSha256, CookieError> {
        HmacSha256::new_from_slice(&self.key).map_err(|_| CookieError::InvalidKey)
    }

    pub fn sign(&self, id: &SessionId) -> Result<String, CookieError> {
        let mut mac = self.mac()?;
        mac.update(id.as_bytes());
        let sig = mac.finalize().into_bytes();
        Ok(format!("{}.{}", id, URL_SAFE_NO_PAD.encode(sig)))
    }

    pub fn verify(&self, token: &str) -> Result<SessionId, CookieError> {
        let (id, sig) = token.split_once('.').ok_or(CookieError::Malformed)?;
        Uuid::parse_str(id).map_err(|_| CookieError::Malformed)?;
        let sig = URL_SAFE_NO_PAD
            .decode(sig)
            .map_err(|_| CookieError::Malformed)?;

        let mut mac = self.mac()?;
        mac.update(id.as_bytes());
        mac.verify_slice(&sig)
            .map_err(|_| CookieError::BadSignature)?;
        Ok(id.to_string())
    }

    /// Maps the raw cookie value to a session, issuing a fresh one when the
    /// cookie is absent or does not verify.
    pub fn resolve(&self, raw: Option<&str>) -> BrowserSession {
        if let Some(token) = raw {
            match self.verify(token) {
                Ok(id) => {
                    return BrowserSession {
                        id,
                        set_cookie: None,
                    }
                }
                Err(err) => {
                    tracing::warn!(error = %err, "discarding invalid session cookie");
                }
            }
        }
        self.issue()
    }

    pub fn issue(&self) -> BrowserSession {
        let id = Uuid::new_v4().to_string();
        let set_cookie = match self.sign(&id) {
            Ok(token) => Some(format!(
                "{SESSION_COOKIE}={token}; Path=/; HttpOnly; SameSite=Lax"
            )),
            Err(err) => {
                tracing::error!(error = %err, "failed to sign session cookie");
                None
            }
        };
        tracing::debug!(session_id = %id, "issued new browser session");
        BrowserSession { id, set_cookie }
    }
}

/// The session a request belongs to, plus the cookie to send back if it is new.
#[derive(Debug, Clone)]
pub struct BrowserSession {
    pub id: SessionId,
    set_cookie: Option<String>,
}

impl BrowserSession {
    pub fn is_new(&self) -> bool {
        self.set_cookie.is_some()
    }

    pub fn set_cookie(&self) -> Option<&str> {
        self.set_cookie.as_deref()
    }

    /// Adds the `Set-Cookie` header for newly issued sessions.
    pub fn attach(&self, mut response: Response) -> Response {
        if let Some(cookie) = &self.set_cookie {
            if let Ok(value) = HeaderValue::from_str(cookie) {
                response.headers_mut().append(SET_COOKIE, value);
            }
        }
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cookies() -> SessionCookies {
        SessionCookies::new("unit-test-secret-key")
    }

    #[test]
    fn signed_token_verifies() {
        let c = cookies();
        let id = Uuid::new_v4().to_string();
        let token = c.sign(&id).expect("sign");
        assert_eq!(c.verify(&token).expect("verify"), id);
    }

    #[test]
    fn token_from_other_key_is_rejected() {
        let id = Uuid::new_v4().to_string();
        let token = SessionCookies::new("another-secret-key-xyz")
            .sign(&id)
            .expect("sign");
        assert_eq!(cookies().verify(&token), Err(CookieError::BadSignature));
    }

    #[test]
    fn tampered_id_is_rejected() {
        let c = cookies();
        let token = c.sign(&Uuid::new_v4().to_string()).expect("sign");
        let (_, sig) = token.split_once('.').expect("dot");
        let forged = format!("{}.{}", Uuid::new_v4(), sig);
        assert_eq!(c.verify(&forged), Err(CookieError::BadSignature));
    }

    #[test]
    fn garbage_is_malformed() {
        let c = cookies();
        assert_eq!(c.verify("nodot"), Err(CookieError::Malformed));
        assert_eq!(c.verify("not-a-uuid.abc"), Err(CookieError::Malformed));
    }

    #[test]
    fn resolve_reuses_valid_and_replaces_invalid() {
        let c = cookies();
        let fresh = c.resolve(None);
        assert!(fresh.is_new());
        let cookie = fresh.set_cookie().expect("cookie");
        assert!(cookie.starts_with("pointrush_session="));
        assert!(cookie.contains("HttpOnly"));

        let token = c.sign(&fresh.id).expect("sign");
        let again = c.resolve(Some(&token));
        assert!(!again.is_new());
        assert_eq!(again.id, fresh.id);

        let replaced = c.resolve(Some("forged.value"));
        assert!(replaced.is_new());
        assert_ne!(replaced.id, fresh.id);
    }

    #[test]
    fn attach_only_sets_cookie_for_new_sessions() {
        let c = cookies();
        let fresh = c.resolve(None);
        let response = fresh.attach(Response::new(Default::default()));
        assert!(response.headers().get(SET_COOKIE).is_some());

        let token = c.sign(&fresh.id).expect("sign");
        let known = c.resolve(Some(&token));
        let response = known.attach(Response::new(Default::default()));
        assert!(response.headers().get(SET_COOKIE).is_none());
    }
}

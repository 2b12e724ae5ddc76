//! Signed cookie session.
//!
//! A thin wrapper around `axum_extra`'s [`SignedCookieJar`] so handlers only
//! deal with logging a user in or out. The whole session lives client side in
//! one signed cookie; a cookie that fails verification, does not decode, or is
//! older than [`SESSION_MAX_AGE_SECS`] is treated as an anonymous session.

use crate::types::User;
use axum::async_trait;
use axum::extract::{FromRef, FromRequestParts};
use axum::http::request::Parts;
use axum::http::HeaderMap;
use axum::response::{IntoResponseParts, Redirect, ResponseParts};
use axum_extra::extract::cookie::{Cookie, Key, SameSite, SignedCookieJar};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha512};
use std::convert::Infallible;
use tracing::{debug, warn};

pub const SESSION_COOKIE: &str = "session";

/// Session lifetime: 14 days. Enforced when the cookie is read, not only by
/// the browser.
pub const SESSION_MAX_AGE_SECS: i64 = 14 * 24 * 60 * 60;

/// Server secret used to sign session cookies.
#[derive(Clone)]
pub struct SessionKey(Key);

impl SessionKey {
    /// Any secret works; it is stretched to the 64 bytes a signing key needs.
    pub fn new(secret: &str) -> Self {
        Self(Key::from(Sha512::digest(secret.as_bytes()).as_slice()))
    }
}

impl From<SessionKey> for Key {
    fn from(key: SessionKey) -> Self {
        key.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct SessionData {
    usuario_id: i32,
    usuario_nome: String,
    /// Unix seconds at login.
    emitido_em: i64,
}

impl SessionData {
    fn decode(value: &str, now: i64) -> Option<Self> {
        let data: Self = serde_json::from_str(value)
            .map_err(|err| warn!(?err, "Session cookie payload is malformed"))
            .ok()?;
        if now - data.emitido_em > SESSION_MAX_AGE_SECS {
            debug!(usuario_id = data.usuario_id, "Session cookie expired");
            return None;
        }
        Some(data)
    }
}

/// The current request's session. Handlers that change it must return it as
/// part of the response so the new cookie is sent.
pub struct CookieSession {
    jar: SignedCookieJar,
    data: Option<SessionData>,
}

impl CookieSession {
    pub fn from_headers(key: SessionKey, headers: &HeaderMap) -> Self {
        Self::from_jar(SignedCookieJar::from_headers(headers, key.into()))
    }

    fn from_jar(jar: SignedCookieJar) -> Self {
        let data = jar
            .get(SESSION_COOKIE)
            .and_then(|cookie| SessionData::decode(cookie.value(), Utc::now().timestamp()));
        Self { jar, data }
    }

    pub fn user_id(&self) -> Option<i32> {
        self.data.as_ref().map(|data| data.usuario_id)
    }

    pub fn user_name(&self) -> Option<&str> {
        self.data.as_ref().map(|data| data.usuario_nome.as_str())
    }

    pub fn log_in(self, user: &User) -> Self {
        let data = SessionData {
            usuario_id: user.id,
            usuario_nome: user.name.clone(),
            emitido_em: Utc::now().timestamp(),
        };
        // Serialising an integer and a string cannot fail.
        let value = serde_json::to_string(&data).unwrap_or_default();
        let cookie = Cookie::build((SESSION_COOKIE, value))
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax)
            .max_age(time::Duration::seconds(SESSION_MAX_AGE_SECS));

        Self {
            jar: self.jar.add(cookie),
            data: Some(data),
        }
    }

    pub fn clear(self) -> Self {
        Self {
            jar: self.jar.remove(Cookie::build(SESSION_COOKIE).path("/")),
            data: None,
        }
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for CookieSession
where
    SessionKey: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let jar = SignedCookieJar::from_headers(&parts.headers, SessionKey::from_ref(state).into());
        Ok(Self::from_jar(jar))
    }
}

impl IntoResponseParts for CookieSession {
    type Error = Infallible;

    fn into_response_parts(self, res: ResponseParts) -> Result<ResponseParts, Self::Error> {
        self.jar.into_response_parts(res)
    }
}

/// A logged-in caller. Rejects anonymous requests with a redirect to the
/// login page.
#[derive(Debug, Clone)]
pub struct Authenticated {
    pub user_id: i32,
    pub user_name: String,
}

#[async_trait]
impl<S> FromRequestParts<S> for Authenticated
where
    SessionKey: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = Redirect;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let session = CookieSession::from_headers(SessionKey::from_ref(state), &parts.headers);
        match session.data {
            Some(data) => Ok(Self {
                user_id: data.usuario_id,
                user_name: data.usuario_nome,
            }),
            None => {
                debug!(path = %parts.uri.path(), "Anonymous request redirected to login");
                Err(Redirect::to("/login"))
            }
        }
    }
}

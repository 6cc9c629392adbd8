//! Session layer shared with the account service.
//!
//! The account service signs users in and writes [`crate::models::CurrentUser`]
//! into the same `tower_sessions.session` table; the storefront only reads it.
//! Both services sign the `dac_session` cookie with `STOREFRONT_SESSION_SECRET`.

use secrecy::{ExposeSecret, SecretString};
use sha2::{Digest, Sha512};
use sqlx::PgPool;
use tower_sessions::{
    Expiry, SessionManagerLayer, SessionStore,
    cookie::{Key, SameSite, time::Duration},
    service::SignedCookie,
};
use tower_sessions_sqlx_store::PostgresStore;

use crate::config::StorefrontConfig;

/// Session cookie name.
pub const SESSION_COOKIE_NAME: &str = "dac_session";

/// Sessions expire after 7 days without a request.
const SESSION_EXPIRY_SECONDS: i64 = 7 * 24 * 60 * 60;

/// Cookie signing key derived from the configured secret.
///
/// SHA-512 stretches the secret to the 64 bytes the cookie key needs.
#[must_use]
pub fn session_key(secret: &SecretString) -> Key {
    let digest = Sha512::digest(secret.expose_secret().as_bytes());
    Key::from(digest.as_slice())
}

/// Apply the storefront cookie settings to a session store.
///
/// `secure` should be set whenever the storefront is served over HTTPS.
#[must_use]
pub fn session_layer<S: SessionStore>(
    store: S,
    key: Key,
    secure: bool,
) -> SessionManagerLayer<S, SignedCookie> {
    SessionManagerLayer::new(store)
        .with_name(SESSION_COOKIE_NAME)
        .with_expiry(Expiry::OnInactivity(Duration::seconds(
            SESSION_EXPIRY_SECONDS,
        )))
        .with_secure(secure)
        .with_same_site(SameSite::Lax)
        .with_http_only(true)
        .with_path("/")
        .with_signed(key)
}

/// Create the session layer over the `PostgreSQL` session table.
#[must_use]
pub fn create_session_layer(
    pool: &PgPool,
    config: &StorefrontConfig,
) -> SessionManagerLayer<PostgresStore, SignedCookie> {
    // The tower_sessions.session table is created by the storefront migrations
    let store = PostgresStore::new(pool.clone());
    session_layer(
        store,
        session_key(&config.session_secret),
        config.base_url.starts_with("https://"),
    )
}

//! Session cookie configuration read from the environment.
//!
//! | Variable | Debug build | Release build |
//! |---|---|---|
//! | `SESSION_KEY_FILE` | missing/unreadable: ephemeral key | must be readable, >= 64 bytes |
//! | `SESSION_COOKIE_SECURE` | default `1` | required |
//! | `SESSION_SAMESITE` | default `Lax` | required; `None` needs a secure cookie |
//! | `SESSION_ALLOW_EPHEMERAL` | default `0` | required, must be `0` |
//! | `SESSION_TTL_MINUTES` | default `120` | default `120`; invalid values rejected |
//!
//! Debug builds log a warning for every default they fall back to.

pub mod fingerprint;
mod parsing;

use std::path::PathBuf;

use actix_session::SessionMiddleware;
use actix_session::config::{CookieContentSecurity, PersistentSession};
use actix_session::storage::CookieSessionStore;
use actix_web::cookie::time::Duration;
use actix_web::cookie::{Key, SameSite};
use mockable::Env;
use tracing::warn;
use zeroize::Zeroize;

use parsing::{bool_toggle, same_site_toggle, ttl_toggle};

const SESSION_KEY_DEFAULT_PATH: &str = "/var/run/secrets/session_key";
const SESSION_KEY_MIN_LEN: usize = 64;
/// `Key::derive_from` refuses shorter master keys.
const SESSION_KEY_DERIVE_MIN_LEN: usize = 32;
const SESSION_COOKIE_NAME: &str = "session";
pub(crate) const DEFAULT_TTL_MINUTES: i64 = 120;

pub(crate) const KEY_FILE_ENV: &str = "SESSION_KEY_FILE";
pub(crate) const COOKIE_SECURE_ENV: &str = "SESSION_COOKIE_SECURE";
pub(crate) const SAMESITE_ENV: &str = "SESSION_SAMESITE";
pub(crate) const ALLOW_EPHEMERAL_ENV: &str = "SESSION_ALLOW_EPHEMERAL";
pub(crate) const TTL_MINUTES_ENV: &str = "SESSION_TTL_MINUTES";

/// Build mode for session configuration validation.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum BuildMode {
    /// Fall back to defaults with a warning.
    Debug,
    /// Reject missing or invalid toggles.
    Release,
}

impl BuildMode {
    /// Mode matching `cfg!(debug_assertions)`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use gateway::inbound::http::session_config::BuildMode;
    ///
    /// let mode = BuildMode::from_debug_assertions();
    /// assert_eq!(mode == BuildMode::Debug, cfg!(debug_assertions));
    /// ```
    #[must_use]
    pub fn from_debug_assertions() -> Self {
        if cfg!(debug_assertions) {
            Self::Debug
        } else {
            Self::Release
        }
    }

    fn is_debug(self) -> bool {
        matches!(self, Self::Debug)
    }
}

/// Validated session cookie settings.
#[derive(Clone)]
pub struct SessionSettings {
    /// Master key for cookie encryption.
    pub key: Key,
    /// Whether session cookies are marked `Secure`.
    pub cookie_secure: bool,
    /// `SameSite` policy for session cookies.
    pub same_site: SameSite,
    /// Lifetime of a persistent session cookie.
    pub ttl: Duration,
}

impl SessionSettings {
    /// Cookie-backed session middleware: private content, HttpOnly, path `/`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use actix_web::cookie::time::Duration;
    /// use actix_web::cookie::{Key, SameSite};
    /// use gateway::inbound::http::session_config::SessionSettings;
    ///
    /// let settings = SessionSettings {
    ///     key: Key::generate(),
    ///     cookie_secure: true,
    ///     same_site: SameSite::Strict,
    ///     ttl: Duration::minutes(30),
    /// };
    /// let _middleware = settings.middleware();
    /// ```
    pub fn middleware(&self) -> SessionMiddleware<CookieSessionStore> {
        SessionMiddleware::builder(CookieSessionStore::default(), self.key.clone())
            .cookie_name(SESSION_COOKIE_NAME.to_owned())
            .cookie_path("/".to_owned())
            .cookie_secure(self.cookie_secure)
            .cookie_http_only(true)
            .cookie_content_security(CookieContentSecurity::Private)
            .cookie_same_site(self.same_site)
            .session_lifecycle(PersistentSession::default().session_ttl(self.ttl))
            .build()
    }

    /// Truncated SHA-256 of the signing key, safe to log.
    pub fn key_fingerprint(&self) -> String {
        fingerprint::key_fingerprint(&self.key)
    }
}

/// Errors raised while validating session configuration.
#[derive(thiserror::Error, Debug)]
pub enum SessionConfigError {
    #[error("missing required environment variable: {name}")]
    MissingEnv { name: &'static str },
    #[error("invalid value for {name}='{value}'; expected {expected}")]
    InvalidEnv {
        name: &'static str,
        value: String,
        expected: &'static str,
    },
    #[error("failed to read session key at {path}: {source}")]
    KeyRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("session key at {path} too short: need >= {min_len} bytes, got {length}")]
    KeyTooShort {
        path: PathBuf,
        length: usize,
        min_len: usize,
    },
    #[error("SESSION_SAMESITE=None requires SESSION_COOKIE_SECURE=1")]
    InsecureSameSiteNone,
    #[error("SESSION_ALLOW_EPHEMERAL must be 0 in release builds")]
    EphemeralNotAllowed,
}

/// Build session settings from environment variables and build mode.
///
/// # Examples
///
/// ```rust
/// use gateway::inbound::http::session_config::{BuildMode, session_settings_from_env};
/// use mockable::MockEnv;
///
/// let mut env = MockEnv::new();
/// env.expect_string().returning(|_| None);
///
/// let settings = session_settings_from_env(&env, BuildMode::Debug).unwrap();
/// assert!(settings.cookie_secure);
/// assert_eq!(settings.ttl.whole_minutes(), 120);
/// ```
pub fn session_settings_from_env<E: Env>(
    env: &E,
    mode: BuildMode,
) -> Result<SessionSettings, SessionConfigError> {
    let cookie_secure = bool_toggle(COOKIE_SECURE_ENV, true).read(env, mode)?;
    let same_site = same_site_toggle(mode).read(env, mode)?;
    ensure_same_site_allowed(same_site, cookie_secure, mode)?;
    let allow_ephemeral = bool_toggle(ALLOW_EPHEMERAL_ENV, false).read(env, mode)?;
    if allow_ephemeral && !mode.is_debug() {
        return Err(SessionConfigError::EphemeralNotAllowed);
    }
    let ttl = ttl_toggle().read(env, mode)?;
    let key = session_key(env, mode, allow_ephemeral)?;

    Ok(SessionSettings {
        key,
        cookie_secure,
        same_site,
        ttl,
    })
}

fn ensure_same_site_allowed(
    same_site: SameSite,
    cookie_secure: bool,
    mode: BuildMode,
) -> Result<(), SessionConfigError> {
    if same_site != SameSite::None || cookie_secure {
        return Ok(());
    }
    if mode.is_debug() {
        warn!("SESSION_SAMESITE=None with an insecure cookie; browsers may drop it");
        return Ok(());
    }
    Err(SessionConfigError::InsecureSameSiteNone)
}

fn session_key<E: Env>(
    env: &E,
    mode: BuildMode,
    allow_ephemeral: bool,
) -> Result<Key, SessionConfigError> {
    let path = PathBuf::from(
        env.string(KEY_FILE_ENV)
            .unwrap_or_else(|| SESSION_KEY_DEFAULT_PATH.to_owned()),
    );

    let mut bytes = match std::fs::read(&path) {
        Ok(bytes) => bytes,
        Err(source) if mode.is_debug() || allow_ephemeral => {
            warn!(path = %path.display(), error = %source, "using temporary session key (dev only)");
            return Ok(Key::generate());
        }
        Err(source) => return Err(SessionConfigError::KeyRead { path, source }),
    };

    let length = bytes.len();
    let key = if length >= SESSION_KEY_MIN_LEN {
        Ok(Key::derive_from(&bytes))
    } else if mode.is_debug() && length >= SESSION_KEY_DERIVE_MIN_LEN {
        warn!(path = %path.display(), length, "session key shorter than recommended");
        Ok(Key::derive_from(&bytes))
    } else if mode.is_debug() {
        warn!(path = %path.display(), length, "session key unusable; using temporary key");
        Ok(Key::generate())
    } else {
        Err(SessionConfigError::KeyTooShort {
            path,
            length,
            min_len: SESSION_KEY_MIN_LEN,
        })
    };
    bytes.zeroize();
    key
}

#[cfg(test)]
mod test_utils;

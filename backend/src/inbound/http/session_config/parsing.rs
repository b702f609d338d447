//! Typed readers for individual session toggles.

use actix_web::cookie::SameSite;
use actix_web::cookie::time::Duration;
use mockable::Env;
use tracing::warn;

use super::{BuildMode, DEFAULT_TTL_MINUTES, SAMESITE_ENV, SessionConfigError, TTL_MINUTES_ENV};

const BOOL_EXPECTED: &str = "1|0|true|false|yes|no|y|n";
const SAMESITE_EXPECTED: &str = "Strict|Lax|None";
const TTL_EXPECTED: &str = "whole minutes between 1 and 525600";
const TTL_MAX_MINUTES: i64 = 525_600;

/// One environment toggle: how to parse it and what to fall back to.
pub(super) struct Toggle<T> {
    name: &'static str,
    default: T,
    expected: &'static str,
    /// Whether release builds accept the default when the variable is unset.
    optional_in_release: bool,
    parse: fn(&str) -> Option<T>,
}

impl<T: Copy + std::fmt::Debug> Toggle<T> {
    pub(super) fn read<E: Env>(&self, env: &E, mode: BuildMode) -> Result<T, SessionConfigError> {
        let Some(raw) = env.string(self.name) else {
            if self.optional_in_release {
                return Ok(self.default);
            }
            return self.fallback(mode, SessionConfigError::MissingEnv { name: self.name }, || {
                warn!(default = ?self.default, "{} not set; using default", self.name);
            });
        };
        if let Some(value) = (self.parse)(raw.trim()) {
            return Ok(value);
        }
        let error = SessionConfigError::InvalidEnv {
            name: self.name,
            value: raw.clone(),
            expected: self.expected,
        };
        self.fallback(mode, error, || {
            warn!(value = %raw, default = ?self.default, "invalid {}; using default", self.name);
        })
    }

    fn fallback(
        &self,
        mode: BuildMode,
        error: SessionConfigError,
        warn_fn: impl FnOnce(),
    ) -> Result<T, SessionConfigError> {
        if mode.is_debug() {
            warn_fn();
            Ok(self.default)
        } else {
            Err(error)
        }
    }
}

pub(super) fn bool_toggle(name: &'static str, default: bool) -> Toggle<bool> {
    Toggle {
        name,
        default,
        expected: BOOL_EXPECTED,
        optional_in_release: false,
        parse: parse_bool,
    }
}

/// `Lax` in debug builds, `Strict` otherwise.
pub(super) fn same_site_toggle(mode: BuildMode) -> Toggle<SameSite> {
    Toggle {
        name: SAMESITE_ENV,
        default: if mode.is_debug() {
            SameSite::Lax
        } else {
            SameSite::Strict
        },
        expected: SAMESITE_EXPECTED,
        optional_in_release: false,
        parse: parse_same_site,
    }
}

pub(super) fn ttl_toggle() -> Toggle<Duration> {
    Toggle {
        name: TTL_MINUTES_ENV,
        default: Duration::minutes(DEFAULT_TTL_MINUTES),
        expected: TTL_EXPECTED,
        optional_in_release: true,
        parse: parse_ttl,
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "y" => Some(true),
        "0" | "false" | "no" | "n" => Some(false),
        _ => None,
    }
}

fn parse_same_site(value: &str) -> Option<SameSite> {
    match value.to_ascii_lowercase().as_str() {
        "lax" => Some(SameSite::Lax),
        "strict" => Some(SameSite::Strict),
        "none" => Some(SameSite::None),
        _ => None,
    }
}

fn parse_ttl(value: &str) -> Option<Duration> {
    value
        .parse::<i64>()
        .ok()
        .filter(|minutes| (1..=TTL_MAX_MINUTES).contains(minutes))
        .map(Duration::minutes)
}

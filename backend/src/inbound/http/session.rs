//! Session helpers to keep HTTP handlers free of framework-specific logic.
//!
//! Wraps the Actix session so handlers deal only with gateway concepts:
//! binding a user to the session, tearing it down, and one-shot flash
//! messages consumed by the next view.

use std::collections::BTreeMap;

use actix_session::Session;
use actix_web::{FromRequest, HttpRequest, dev::Payload};
use futures_util::future::LocalBoxFuture;
use serde::de::DeserializeOwned;
use tracing::warn;

use crate::domain::{Error, UserId};

pub(crate) const USER_ID_KEY: &str = "user_id";
pub(crate) const FLASH_STATUS_KEY: &str = "flash_status";
pub(crate) const FLASH_ERRORS_KEY: &str = "flash_errors";

/// Flash data read once by a view.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Flash {
    pub status: Option<String>,
    pub errors: BTreeMap<String, String>,
}

/// Newtype wrapper that exposes higher-level session operations.
#[derive(Clone)]
pub struct SessionContext(Session);

fn write_error(error: impl std::fmt::Display) -> Error {
    Error::internal(format!("failed to persist session: {error}"))
}

fn read_error(error: impl std::fmt::Display) -> Error {
    Error::internal(format!("failed to read session: {error}"))
}

impl SessionContext {
    /// Construct a new wrapper from the underlying Actix session.
    pub fn new(session: Session) -> Self {
        Self(session)
    }

    /// Bind the session to `user_id`.
    ///
    /// The session id is renewed first so an identifier planted before
    /// authentication never carries the authenticated state.
    pub fn login(&self, user_id: &UserId) -> Result<(), Error> {
        self.0.renew();
        self.0
            .insert(USER_ID_KEY, user_id.as_ref())
            .map_err(write_error)
    }

    /// Drop every session entry and expire the cookie. Safe to call when no
    /// session exists.
    pub fn logout(&self) {
        self.0.purge();
    }

    /// Unbind the user but keep the session, so flash data set afterwards
    /// still reaches the client.
    pub fn forget_user(&self) {
        self.0.remove(USER_ID_KEY);
    }

    /// Fetch the current user id from the session, if present.
    ///
    /// A malformed id is logged and treated as no session.
    pub fn user_id(&self) -> Result<Option<UserId>, Error> {
        let id = self.0.get::<String>(USER_ID_KEY).map_err(read_error)?;
        match id {
            Some(raw) => match UserId::new(raw) {
                Ok(id) => Ok(Some(id)),
                Err(error) => {
                    warn!("invalid user id in session cookie: {error}");
                    Ok(None)
                }
            },
            None => Ok(None),
        }
    }

    /// Queue a status message for the next view.
    pub fn flash_status(&self, message: &str) -> Result<(), Error> {
        self.0
            .insert(FLASH_STATUS_KEY, message)
            .map_err(write_error)
    }

    /// Queue an error for `field`, keeping any already flashed.
    pub fn flash_error(&self, field: &str, message: &str) -> Result<(), Error> {
        let mut errors: BTreeMap<String, String> = self
            .0
            .get(FLASH_ERRORS_KEY)
            .map_err(read_error)?
            .unwrap_or_default();
        errors.insert(field.to_owned(), message.to_owned());
        self.0.insert(FLASH_ERRORS_KEY, errors).map_err(write_error)
    }

    /// Remove and return the queued flash data.
    pub fn take_flash(&self) -> Result<Flash, Error> {
        Ok(Flash {
            status: self.take(FLASH_STATUS_KEY)?,
            errors: self.take(FLASH_ERRORS_KEY)?.unwrap_or_default(),
        })
    }

    fn take<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, Error> {
        self.0.remove_as::<T>(key).transpose().map_err(read_error)
    }
}

impl FromRequest for SessionContext {
    type Error = actix_web::Error;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, payload: &mut Payload) -> Self::Future {
        let fut = Session::from_request(req, payload);
        Box::pin(async move { fut.await.map(SessionContext::new) })
    }
}

//! Tests for the credential gateway service.

use std::sync::{Arc, Mutex};

use tokio::sync::Notify;

use super::*;
use crate::domain::{DisplayName, ErrorCode};
use crate::domain::ports::{MockPasswordHasher, MockUserRepository};
use rstest::{fixture, rstest};

/// Reversible "hash" so tests can assert what was stored.
#[derive(Default)]
struct PrefixHasher;

#[async_trait]
impl PasswordHasher for PrefixHasher {
    async fn hash(&self, password: &str) -> Result<PasswordHash, PasswordHashingError> {
        PasswordHash::new(format!("hashed:{password}"))
            .map_err(|err| PasswordHashingError::hash(err.to_string()))
    }

    async fn verify(
        &self,
        password: &str,
        hash: &PasswordHash,
    ) -> Result<bool, PasswordHashingError> {
        Ok(hash.as_str() == format!("hashed:{password}"))
    }
}

#[derive(Default)]
struct StubUsers {
    rows: Mutex<Vec<User>>,
}

impl StubUsers {
    fn rows(&self) -> Vec<User> {
        self.rows.lock().expect("rows lock").clone()
    }
}

#[async_trait]
impl UserRepository for StubUsers {
    async fn create(&self, user: &User) -> Result<(), UserPersistenceError> {
        let mut rows = self.rows.lock().expect("rows lock");
        if rows.iter().any(|row| row.email() == user.email()) {
            return Err(UserPersistenceError::duplicate_email(user.email().as_ref()));
        }
        rows.push(user.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, UserPersistenceError> {
        let rows = self.rows.lock().expect("rows lock");
        Ok(rows.iter().find(|row| row.id() == id).cloned())
    }

    async fn find_by_email(
        &self,
        email: &EmailAddress,
    ) -> Result<Option<User>, UserPersistenceError> {
        let rows = self.rows.lock().expect("rows lock");
        Ok(rows.iter().find(|row| row.email() == email).cloned())
    }

    async fn update_profile(
        &self,
        id: &UserId,
        changes: &ProfileChanges,
    ) -> Result<User, UserPersistenceError> {
        let mut rows = self.rows.lock().expect("rows lock");
        if let Some(email) = changes.email() {
            if rows.iter().any(|row| row.email() == email && row.id() != id) {
                return Err(UserPersistenceError::duplicate_email(email.as_ref()));
            }
        }
        let row = rows
            .iter_mut()
            .find(|row| row.id() == id)
            .ok_or_else(|| UserPersistenceError::not_found(id.as_ref()))?;
        if let Some(name) = changes.display_name() {
            *row = row.clone().with_display_name(name.clone());
        }
        if let Some(email) = changes.email() {
            *row = row.clone().with_email(email.clone());
        }
        Ok(row.clone())
    }

    async fn set_password_hash(
        &self,
        id: &UserId,
        hash: &PasswordHash,
    ) -> Result<(), UserPersistenceError> {
        let mut rows = self.rows.lock().expect("rows lock");
        let row = rows
            .iter_mut()
            .find(|row| row.id() == id)
            .ok_or_else(|| UserPersistenceError::not_found(id.as_ref()))?;
        *row = row.clone().with_password_hash(hash.clone());
        Ok(())
    }

    async fn email_taken(
        &self,
        email: &EmailAddress,
        excluding: Option<UserId>,
    ) -> Result<bool, UserPersistenceError> {
        let rows = self.rows.lock().expect("rows lock");
        Ok(rows
            .iter()
            .any(|row| row.email() == email && Some(row.id()) != excluding.as_ref()))
    }
}

type StubGateway = CredentialGateway<StubUsers, PrefixHasher>;

#[fixture]
fn users() -> Arc<StubUsers> {
    Arc::new(StubUsers::default())
}

fn gateway(users: &Arc<StubUsers>) -> StubGateway {
    CredentialGateway::new(Arc::clone(users), Arc::new(PrefixHasher))
}

fn registration(name: &str, email: &str, password: &str) -> Registration {
    Registration::try_from_parts(Some(name), Some(email), Some(password))
        .expect("valid registration")
}

fn login(email: &str, password: &str) -> LoginCredentials {
    LoginCredentials::try_from_parts(Some(email), Some(password)).expect("valid credentials")
}

fn password_change(current: &str, new: &str) -> PasswordChange {
    PasswordChange::try_from_parts(Some(current), Some(new), Some(new)).expect("valid change")
}

fn field_codes(error: &Error) -> Vec<(String, String)> {
    let fields = error
        .details()
        .and_then(|details| details.get("fields"))
        .and_then(|fields| fields.as_array())
        .cloned()
        .unwrap_or_default();
    fields
        .iter()
        .map(|field| {
            (
                field["field"].as_str().unwrap_or_default().to_owned(),
                field["code"].as_str().unwrap_or_default().to_owned(),
            )
        })
        .collect()
}

fn flagged_field(error: &Error) -> Option<&str> {
    error.details()?.get("field")?.as_str()
}

#[rstest]
#[tokio::test]
async fn register_stores_a_hash_never_the_plaintext(users: Arc<StubUsers>) {
    let service = gateway(&users);

    let id = service
        .register(&registration("Ann", "ann@x.com", "password1"))
        .await
        .expect("registration succeeds");

    let rows = users.rows();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].id(), &id);
    assert_ne!(rows[0].password_hash().as_str(), "password1");
}

#[rstest]
#[tokio::test]
async fn duplicate_registration_fails_on_email(users: Arc<StubUsers>) {
    let service = gateway(&users);
    service
        .register(&registration("Ann", "ann@x.com", "password1"))
        .await
        .expect("first registration succeeds");

    let err = service
        .register(&registration("Other Ann", "ANN@x.com", "password2"))
        .await
        .expect_err("second registration fails");

    assert_eq!(err.code(), ErrorCode::InvalidRequest);
    assert_eq!(
        field_codes(&err),
        vec![("email".to_owned(), "email_taken".to_owned())]
    );
    assert_eq!(users.rows().len(), 1);
}

#[rstest]
#[tokio::test]
async fn store_level_duplicate_maps_to_email_taken() {
    let mut repo = MockUserRepository::new();
    repo.expect_email_taken().return_once(|_, _| Ok(false));
    repo.expect_create().times(1).return_once(|user| {
        Err(UserPersistenceError::duplicate_email(
            user.email().as_ref(),
        ))
    });
    let service = CredentialGateway::new(Arc::new(repo), Arc::new(PrefixHasher));

    let err = service
        .register(&registration("Ann", "ann@x.com", "password1"))
        .await
        .expect_err("lost the race");

    assert_eq!(
        field_codes(&err),
        vec![("email".to_owned(), "email_taken".to_owned())]
    );
}

#[rstest]
#[case("ann@x.com", "wrongpass")]
#[case("nobody@x.com", "password1")]
#[tokio::test]
async fn login_failures_are_indistinguishable(
    users: Arc<StubUsers>,
    #[case] email: &str,
    #[case] password: &str,
) {
    let service = gateway(&users);
    service
        .register(&registration("Ann", "ann@x.com", "password1"))
        .await
        .expect("registration succeeds");

    let err = service
        .authenticate(&login(email, password))
        .await
        .expect_err("login fails");

    assert_eq!(err.code(), ErrorCode::Unauthorized);
    assert_eq!(err.message(), "invalid credentials");
    assert_eq!(flagged_field(&err), Some("email"));
}

#[rstest]
#[tokio::test]
async fn unknown_email_still_runs_a_verification() {
    let mut repo = MockUserRepository::new();
    repo.expect_find_by_email().times(2).returning(|_| Ok(None));
    let mut hasher = MockPasswordHasher::new();
    hasher.expect_hash().times(1).returning(|_| {
        PasswordHash::new("dummy").map_err(|err| PasswordHashingError::hash(err.to_string()))
    });
    hasher.expect_verify().times(2).returning(|_, _| Ok(false));
    let service = CredentialGateway::new(Arc::new(repo), Arc::new(hasher));

    for _ in 0..2 {
        let err = service
            .authenticate(&login("nobody@x.com", "password1"))
            .await
            .expect_err("unknown email");
        assert_eq!(err.code(), ErrorCode::Unauthorized);
    }
}

#[rstest]
#[case(UserPersistenceError::connection("refused"), ErrorCode::ServiceUnavailable)]
#[case(UserPersistenceError::query("syntax"), ErrorCode::InternalError)]
#[tokio::test]
async fn store_failures_keep_their_kind(
    #[case] failure: UserPersistenceError,
    #[case] expected: ErrorCode,
) {
    let mut repo = MockUserRepository::new();
    repo.expect_find_by_email().return_once(move |_| Err(failure));
    let service = CredentialGateway::new(Arc::new(repo), Arc::new(PrefixHasher));

    let err = service
        .authenticate(&login("ann@x.com", "password1"))
        .await
        .expect_err("store failure");
    assert_eq!(err.code(), expected);
}

#[rstest]
#[tokio::test]
async fn hasher_failure_is_internal() {
    let mut repo = MockUserRepository::new();
    repo.expect_email_taken().return_once(|_, _| Ok(false));
    repo.expect_create().times(0);
    let mut hasher = MockPasswordHasher::new();
    hasher
        .expect_hash()
        .return_once(|_| Err(PasswordHashingError::hash("bad params")));
    let service = CredentialGateway::new(Arc::new(repo), Arc::new(hasher));

    let err = service
        .register(&registration("Ann", "ann@x.com", "password1"))
        .await
        .expect_err("hasher failure");
    assert_eq!(err.code(), ErrorCode::InternalError);
}

#[rstest]
#[tokio::test]
async fn fetch_profile_reports_missing_users() {
    let mut repo = MockUserRepository::new();
    repo.expect_find_by_id().return_once(|_| Ok(None));
    let service = CredentialGateway::new(Arc::new(repo), Arc::new(PrefixHasher));

    let err = service
        .fetch_profile(&UserId::random())
        .await
        .expect_err("missing user");
    assert_eq!(err.code(), ErrorCode::NotFound);
}

#[rstest]
#[tokio::test]
async fn update_profile_accepts_own_email_and_rejects_others(users: Arc<StubUsers>) {
    let service = gateway(&users);
    let ann = service
        .register(&registration("Ann", "ann@x.com", "password1"))
        .await
        .expect("ann registers");
    service
        .register(&registration("Bob", "bob@x.com", "password1"))
        .await
        .expect("bob registers");

    let own = ProfileChanges::try_from_parts(Some("Annie"), Some("ann@x.com"))
        .expect("valid changes");
    let updated = service
        .update_profile(&ann, &own)
        .await
        .expect("own email is allowed");
    assert_eq!(updated.display_name().as_ref(), "Annie");

    let taken = ProfileChanges::try_from_parts(None, Some("bob@x.com")).expect("valid changes");
    let err = service
        .update_profile(&ann, &taken)
        .await
        .expect_err("other user's email");
    assert_eq!(
        field_codes(&err),
        vec![("email".to_owned(), "email_taken".to_owned())]
    );

    let stored = service.fetch_profile(&ann).await.expect("profile");
    assert_eq!(stored.display_name().as_ref(), "Annie");
    assert_eq!(stored.email().as_ref(), "ann@x.com");
}

#[rstest]
#[tokio::test]
async fn empty_profile_changes_do_not_write() {
    let existing = User::new(
        UserId::random(),
        DisplayName::new("Ann").expect("name"),
        EmailAddress::new("ann@x.com").expect("email"),
        PasswordHash::new("hashed:password1").expect("hash"),
    );
    let id = existing.id().clone();
    let mut repo = MockUserRepository::new();
    repo.expect_find_by_id().return_once(move |_| Ok(Some(existing)));
    repo.expect_update_profile().never();
    repo.expect_set_password_hash().never();
    let service = CredentialGateway::new(Arc::new(repo), Arc::new(PrefixHasher));

    let user = service
        .update_profile(&id, &ProfileChanges::default())
        .await
        .expect("no-op update");
    assert_eq!(user.id(), &id);
}

#[rstest]
#[tokio::test]
async fn wrong_current_password_leaves_hash_unchanged(users: Arc<StubUsers>) {
    let service = gateway(&users);
    let id = service
        .register(&registration("Ann", "ann@x.com", "password1"))
        .await
        .expect("registration succeeds");
    let before = users.rows()[0].password_hash().clone();

    let err = service
        .change_password(&id, &password_change("notmypass", "newpass1"))
        .await
        .expect_err("wrong current password");

    assert_eq!(err.code(), ErrorCode::Unauthorized);
    assert_eq!(err.message(), "current password is incorrect");
    assert_eq!(flagged_field(&err), Some("current_password"));
    assert_eq!(users.rows()[0].password_hash(), &before);
}

#[rstest]
#[tokio::test]
async fn register_login_change_password_scenario(users: Arc<StubUsers>) {
    let service = gateway(&users);

    let id = service
        .register(&registration("Ann", "ann@x.com", "password1"))
        .await
        .expect("registration succeeds");
    let logged_in = service
        .authenticate(&login("ann@x.com", "password1"))
        .await
        .expect("login succeeds");
    assert_eq!(logged_in, id);

    service
        .change_password(&id, &password_change("password1", "newpass1"))
        .await
        .expect("password change succeeds");

    let old = service.authenticate(&login("ann@x.com", "password1")).await;
    assert!(old.is_err(), "old password must stop working");
    let new = service
        .authenticate(&login("ann@x.com", "newpass1"))
        .await
        .expect("new password works");
    assert_eq!(new, id);
}

/// Store whose profile writes wait until released, to interleave a password
/// change between a profile edit starting and landing.
#[derive(Default)]
struct GatedUsers {
    inner: StubUsers,
    profile_write_started: Notify,
    release_profile_write: Notify,
}

#[async_trait]
impl UserRepository for GatedUsers {
    async fn create(&self, user: &User) -> Result<(), UserPersistenceError> {
        self.inner.create(user).await
    }

    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, UserPersistenceError> {
        self.inner.find_by_id(id).await
    }

    async fn find_by_email(
        &self,
        email: &EmailAddress,
    ) -> Result<Option<User>, UserPersistenceError> {
        self.inner.find_by_email(email).await
    }

    async fn update_profile(
        &self,
        id: &UserId,
        changes: &ProfileChanges,
    ) -> Result<User, UserPersistenceError> {
        self.profile_write_started.notify_one();
        self.release_profile_write.notified().await;
        self.inner.update_profile(id, changes).await
    }

    async fn set_password_hash(
        &self,
        id: &UserId,
        hash: &PasswordHash,
    ) -> Result<(), UserPersistenceError> {
        self.inner.set_password_hash(id, hash).await
    }

    async fn email_taken(
        &self,
        email: &EmailAddress,
        excluding: Option<UserId>,
    ) -> Result<bool, UserPersistenceError> {
        self.inner.email_taken(email, excluding).await
    }
}

#[rstest]
#[tokio::test]
async fn profile_edit_racing_a_password_change_keeps_the_new_password() {
    let users = Arc::new(GatedUsers::default());
    let service = CredentialGateway::new(Arc::clone(&users), Arc::new(PrefixHasher));
    let id = service
        .register(&registration("Ann", "ann@x.com", "password1"))
        .await
        .expect("registration succeeds");

    let rename = ProfileChanges::try_from_parts(Some("Ann Smith"), None).expect("valid changes");
    let edit = service.update_profile(&id, &rename);
    let rotate = async {
        users.profile_write_started.notified().await;
        service
            .change_password(&id, &password_change("password1", "newpass1"))
            .await
            .expect("password change succeeds");
        users.release_profile_write.notify_one();
    };
    let (edited, ()) = tokio::join!(edit, rotate);
    assert_eq!(
        edited.expect("profile edit succeeds").display_name().as_ref(),
        "Ann Smith"
    );

    let old = service.authenticate(&login("ann@x.com", "password1")).await;
    assert!(old.is_err(), "old password must stay rejected");
    service
        .authenticate(&login("ann@x.com", "newpass1"))
        .await
        .expect("new password works");
}

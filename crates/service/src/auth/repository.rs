use async_trait::async_trait;
use uuid::Uuid;

use super::domain::{AuthUser, Credentials};
use super::errors::AuthError;

/// Repository abstraction for admin account persistence.
#[async_trait]
pub trait AuthRepository: Send + Sync {
    async fn find_user_by_email(&self, email: &str) -> Result<Option<AuthUser>, AuthError>;
    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<AuthUser>, AuthError>;
    async fn create_user(&self, email: &str, name: &str, password_hash: String, password_algorithm: &str) -> Result<AuthUser, AuthError>;
    async fn count_users(&self) -> Result<u64, AuthError>;

    async fn get_credentials(&self, user_id: Uuid) -> Result<Option<Credentials>, AuthError>;
    async fn set_password(&self, user_id: Uuid, password_hash: String, password_algorithm: &str) -> Result<(), AuthError>;
    async fn record_login(&self, user_id: Uuid) -> Result<(), AuthError>;
}

/// Simple in-memory mock repository for tests and doc examples
pub mod mock {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    #[derive(Default)]
    pub struct MockAuthRepository {
        users: Mutex<HashMap<String, AuthUser>>, // key: lowercased email
        creds: Mutex<HashMap<Uuid, Credentials>>, // key: user_id
        logins: Mutex<Vec<Uuid>>,
    }

    impl MockAuthRepository {
        pub fn login_count(&self, user_id: Uuid) -> usize {
            self.logins.lock().unwrap().iter().filter(|id| **id == user_id).count()
        }
    }

    #[async_trait]
    impl AuthRepository for MockAuthRepository {
        async fn find_user_by_email(&self, email: &str) -> Result<Option<AuthUser>, AuthError> {
            let users = self.users.lock().unwrap();
            Ok(users.get(&email.trim().to_ascii_lowercase()).cloned())
        }

        async fn find_user_by_id(&self, id: Uuid) -> Result<Option<AuthUser>, AuthError> {
            let users = self.users.lock().unwrap();
            Ok(users.values().find(|u| u.id == id).cloned())
        }

        async fn create_user(&self, email: &str, name: &str, password_hash: String, password_algorithm: &str) -> Result<AuthUser, AuthError> {
            let key = email.trim().to_ascii_lowercase();
            let mut users = self.users.lock().unwrap();
            if users.contains_key(&key) {
                return Err(AuthError::Conflict);
            }
            let user = AuthUser { id: Uuid::new_v4(), email: key.clone(), name: name.trim().to_string() };
            users.insert(key, user.clone());
            self.creds.lock().unwrap().insert(
                user.id,
                Credentials { user_id: user.id, password_hash, password_algorithm: password_algorithm.to_string() },
            );
            Ok(user)
        }

        async fn count_users(&self) -> Result<u64, AuthError> {
            Ok(self.users.lock().unwrap().len() as u64)
        }

        async fn get_credentials(&self, user_id: Uuid) -> Result<Option<Credentials>, AuthError> {
            let creds = self.creds.lock().unwrap();
            Ok(creds.get(&user_id).cloned())
        }

        async fn set_password(&self, user_id: Uuid, password_hash: String, password_algorithm: &str) -> Result<(), AuthError> {
            let mut creds = self.creds.lock().unwrap();
            let c = creds.get_mut(&user_id).ok_or(AuthError::NotFound)?;
            c.password_hash = password_hash;
            c.password_algorithm = password_algorithm.to_string();
            Ok(())
        }

        async fn record_login(&self, user_id: Uuid) -> Result<(), AuthError> {
            self.logins.lock().unwrap().push(user_id);
            Ok(())
        }
    }
}

use sea_orm::{DatabaseConnection, EntityTrait, PaginatorTrait};
use uuid::Uuid;

use models::admin_user;

use crate::auth::domain::{AuthUser, Credentials};
use crate::auth::errors::AuthError;
use crate::auth::repository::AuthRepository;

pub struct SeaOrmAuthRepository {
    pub db: DatabaseConnection,
}

fn to_user(u: admin_user::Model) -> AuthUser {
    AuthUser { id: u.id, email: u.email, name: u.name }
}

#[async_trait::async_trait]
impl AuthRepository for SeaOrmAuthRepository {
    async fn find_user_by_email(&self, email: &str) -> Result<Option<AuthUser>, AuthError> {
        let res = admin_user::find_by_email(&self.db, email).await?;
        Ok(res.map(to_user))
    }

    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<AuthUser>, AuthError> {
        let res = admin_user::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(|e| AuthError::Repository(e.to_string()))?;
        Ok(res.map(to_user))
    }

    async fn create_user(&self, email: &str, name: &str, password_hash: String, password_algorithm: &str) -> Result<AuthUser, AuthError> {
        let created = admin_user::create(&self.db, email, name, password_hash, password_algorithm).await?;
        Ok(to_user(created))
    }

    async fn count_users(&self) -> Result<u64, AuthError> {
        admin_user::Entity::find()
            .count(&self.db)
            .await
            .map_err(|e| AuthError::Repository(e.to_string()))
    }

    async fn get_credentials(&self, user_id: Uuid) -> Result<Option<Credentials>, AuthError> {
        let res = admin_user::Entity::find_by_id(user_id)
            .one(&self.db)
            .await
            .map_err(|e| AuthError::Repository(e.to_string()))?;
        Ok(res.map(|c| Credentials { user_id: c.id, password_hash: c.password_hash, password_algorithm: c.password_algorithm }))
    }

    async fn set_password(&self, user_id: Uuid, password_hash: String, password_algorithm: &str) -> Result<(), AuthError> {
        admin_user::set_password(&self.db, user_id, password_hash, password_algorithm).await?;
        Ok(())
    }

    async fn record_login(&self, user_id: Uuid) -> Result<(), AuthError> {
        admin_user::touch_last_login(&self.db, user_id).await?;
        Ok(())
    }
}

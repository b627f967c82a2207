use std::sync::Arc;

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHasher, SaltString},
    Argon2, PasswordHash, PasswordVerifier,
};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::{
    models::users::{NewUser, SignupForm, User, UserRole},
    repositories::UserRepository,
    Error, Result,
};

#[derive(Clone)]
pub struct AuthService {
    user_repo: Arc<dyn UserRepository>,
    jwt_secret: String,
    jwt_expiration: i64,
}

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String,
    iat: usize,
    exp: usize,
}

pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)?
        .to_string();
    Ok(hash)
}

pub fn verify_password(password: &str, hash: &str) -> Result<bool> {
    let parsed_hash = PasswordHash::new(hash)?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

impl AuthService {
    pub fn new(
        user_repo: Arc<dyn UserRepository>,
        jwt_secret: String,
        jwt_expiration: i64,
    ) -> Self {
        Self {
            user_repo,
            jwt_secret,
            jwt_expiration,
        }
    }

    pub async fn register(&self, form: SignupForm) -> Result<User> {
        self.create_account(form, UserRole::User).await
    }

    pub async fn create_account(&self, form: SignupForm, role: UserRole) -> Result<User> {
        if self
            .user_repo
            .get_user(None, Some(&form.username))
            .await?
            .is_some()
        {
            return Err(Error::BadRequest(
                "A user with that username already exists.".to_string(),
            ));
        }

        let user = self
            .user_repo
            .create_user(NewUser {
                username: form.username,
                email: form.email,
                first_name: form.first_name,
                last_name: form.last_name,
                password_hash: hash_password(&form.password1)?,
                role,
            })
            .await?;

        info!(user_id = %user.id, username = %user.username, "Registered user");
        Ok(user)
    }

    /// Checks the credentials and issues a token.
    pub async fn login(&self, username: &str, password: &str) -> Result<(User, String)> {
        let user = self
            .user_repo
            .get_user(None, Some(username))
            .await?
            .ok_or_else(invalid_credentials)?;

        if !verify_password(password, &user.password)? {
            return Err(invalid_credentials());
        }

        let token = self.generate_token(user.id)?;
        Ok((user, token))
    }

    pub fn generate_token(&self, user_id: Uuid) -> Result<String> {
        let now = Utc::now();
        let exp = (now + Duration::minutes(self.jwt_expiration)).timestamp() as usize;
        let iat = now.timestamp() as usize;
        let claims = Claims {
            sub: user_id.to_string(),
            iat,
            exp,
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.as_bytes()),
        )
        .map_err(|_| Error::InternalServerError)
    }

    pub fn decode_token<T: Into<String>>(&self, token: T) -> Result<Uuid> {
        let decode = decode::<Claims>(
            &token.into(),
            &DecodingKey::from_secret(self.jwt_secret.as_bytes()),
            &Validation::new(Algorithm::HS256),
        )
        .map_err(|_| Error::Unauthorized)?;

        Uuid::parse_str(&decode.claims.sub).map_err(|_| Error::Unauthorized)
    }

    pub fn token_max_age_minutes(&self) -> i64 {
        self.jwt_expiration
    }
}

fn invalid_credentials() -> Error {
    Error::BadRequest("Unable to log in with provided credentials.".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::MemoryRepo;

    fn service() -> AuthService {
        AuthService::new(Arc::new(MemoryRepo::new()), "secret".to_string(), 60)
    }

    fn signup(username: &str) -> SignupForm {
        SignupForm {
            username: username.to_string(),
            password1: "correct horse".to_string(),
            password2: "correct horse".to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn login_round_trips_through_token() {
        let auth = service();
        let user = auth.register(signup("leo")).await.unwrap();

        let (_, token) = auth.login("leo", "correct horse").await.unwrap();

        assert_eq!(auth.decode_token(token).unwrap(), user.id);
    }

    #[tokio::test]
    async fn wrong_password_is_rejected() {
        let auth = service();
        auth.register(signup("leo")).await.unwrap();

        let err = auth.login("leo", "battery staple").await.unwrap_err();
        assert!(matches!(err, Error::BadRequest(_)));
    }

    #[tokio::test]
    async fn duplicate_username_is_rejected() {
        let auth = service();
        auth.register(signup("leo")).await.unwrap();

        assert!(auth.register(signup("leo")).await.is_err());
    }

    #[test]
    fn tokens_signed_with_another_secret_are_rejected() {
        let ours = service();
        let theirs = AuthService::new(Arc::new(MemoryRepo::new()), "other".to_string(), 60);
        let token = theirs.generate_token(Uuid::now_v7()).unwrap();

        assert!(matches!(ours.decode_token(token), Err(Error::Unauthorized)));
    }
}

use anyhow::anyhow;
use argon2::{
    Algorithm, Argon2, ParamsBuilder, PasswordHash, PasswordHasher as _, PasswordVerifier,
    Version, password_hash::SaltString,
};
use rand::RngCore;

use crate::domain::repository::PasswordHasher;
use crate::error::ApiError;

const SALT_LEN: usize = 16;

/// Argon2id hasher producing PHC strings (`$argon2id$v=19$...`).
#[derive(Clone)]
pub struct Argon2PasswordHasher {
    argon2: Argon2<'static>,
}

impl Argon2PasswordHasher {
    pub fn new() -> anyhow::Result<Self> {
        let mut builder = ParamsBuilder::new();
        builder.m_cost(19 * 1024); // 19 MiB
        builder.t_cost(2);
        builder.p_cost(1);
        let params = builder
            .build()
            .map_err(|e| anyhow!("invalid argon2 params: {e}"))?;
        Ok(Self {
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
        })
    }
}

impl PasswordHasher for Argon2PasswordHasher {
    fn hash(&self, password: &str) -> Result<String, ApiError> {
        let mut salt_bytes = [0u8; SALT_LEN];
        rand::thread_rng().fill_bytes(&mut salt_bytes);
        let salt = SaltString::encode_b64(&salt_bytes)
            .map_err(|e| anyhow!("encode salt: {e}"))?;
        let hash = self
            .argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| anyhow!("hash password: {e}"))?
            .to_string();
        Ok(hash)
    }

    fn verify(&self, password: &str, hash: &str) -> Result<bool, ApiError> {
        let parsed = PasswordHash::new(hash).map_err(|e| anyhow!("parse password hash: {e}"))?;
        match self.argon2.verify_password(password.as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(e) => Err(ApiError::Internal(anyhow!("verify password: {e}"))),
        }
    }
}

//! Staff identity carried by bearer tokens

use serde::{Deserialize, Serialize};

use super::enums::StaffRole;
use crate::error::AppError;

/// JWT claims issued by the identity provider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StaffClaims {
    /// Staff identity, recorded as initiator of generation batches
    pub sub: String,
    pub name: Option<String>,
    pub role: StaffRole,
    pub exp: i64,
    pub iat: i64,
}

impl StaffClaims {
    /// Create a signed token (used by tooling and tests)
    pub fn create_token(&self, secret: &str) -> Result<String, jsonwebtoken::errors::Error> {
        use jsonwebtoken::{encode, EncodingKey, Header};
        encode(
            &Header::default(),
            self,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
    }

    /// Parse JWT token
    pub fn from_token(token: &str, secret: &str) -> Result<Self, jsonwebtoken::errors::Error> {
        use jsonwebtoken::{decode, DecodingKey, Validation};
        let token_data = decode::<Self>(
            token,
            &DecodingKey::from_secret(secret.as_bytes()),
            &Validation::default(),
        )?;
        Ok(token_data.claims)
    }

    /// Generation runs and undo are restricted to admins and managers
    pub fn require_scheduler(&self) -> Result<(), AppError> {
        match self.role {
            StaffRole::Admin | StaffRole::Manager => Ok(()),
            StaffRole::Barber => Err(AppError::Authorization(
                "Manager privileges required to generate appointments".to_string(),
            )),
        }
    }

    pub fn require_admin(&self) -> Result<(), AppError> {
        if self.role == StaffRole::Admin {
            Ok(())
        } else {
            Err(AppError::Authorization("Administrator privileges required".to_string()))
        }
    }
}

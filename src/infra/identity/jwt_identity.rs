use crate::domain::models::identity::{CallerIdentity, Claims};
use crate::domain::ports::IdentityProvider;
use crate::error::AppError;
use async_trait::async_trait;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use tracing::debug;

/// Resolves access tokens minted by the identity service.
pub struct JwtIdentityProvider {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl JwtIdentityProvider {
    pub fn new(public_key_pem: &str, audience: &str) -> Result<Self, AppError> {
        let decoding_key = DecodingKey::from_ed_pem(public_key_pem.as_bytes())
            .map_err(|e| AppError::InternalWithMsg(format!("Invalid identity public key: {}", e)))?;

        let mut validation = Validation::new(Algorithm::EdDSA);
        validation.set_audience(&[audience]);

        Ok(Self { decoding_key, validation })
    }
}

#[async_trait]
impl IdentityProvider for JwtIdentityProvider {
    async fn resolve_caller(&self, token: &str) -> Result<CallerIdentity, AppError> {
        let token_data = decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map_err(|e| {
                debug!("Rejected access token: {}", e);
                AppError::Unauthorized
            })?;

        Ok(CallerIdentity {
            user_id: token_data.claims.sub,
            role: token_data.claims.role,
        })
    }
}

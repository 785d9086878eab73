use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use uuid::Uuid;

use crate::auth::{AuthConfig, AuthError, AuthResult};

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct AccessTokenClaims {
    #[serde(rename = "userId")]
    pub user_id: Uuid,
    pub email: String,
    pub iss: String,
    pub aud: String,
    pub iat: i64,
    /// Absolute expiry in Unix seconds.
    pub exp: i64,
}

#[derive(Debug, Clone)]
pub struct SignedAccessToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Identity embedded in an access token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenIdentity {
    pub user_id: Uuid,
    pub email: String,
}

/// Issues and validates HS256 bearer tokens with a key fixed at construction.
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    issuer: String,
    audience: String,
    access_token_ttl: Duration,
    leeway_secs: i64,
}

impl JwtService {
    pub fn from_config(config: &AuthConfig) -> AuthResult<Self> {
        config.validate()?;
        let access_token_ttl = Duration::try_seconds(config.access_token_ttl_secs)
            .ok_or_else(|| AuthError::Config("access token TTL out of range".into()))?;
        let leeway_secs = i64::try_from(config.token_leeway_secs)
            .map_err(|_| AuthError::Config("token leeway out of range".into()))?;
        let secret_bytes = config.jwt_secret.as_bytes();
        let encoding_key = EncodingKey::from_secret(secret_bytes);
        let decoding_key = DecodingKey::from_secret(secret_bytes);

        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_audience(&[config.audience.clone()]);
        validation.set_issuer(&[config.issuer.clone()]);
        validation.set_required_spec_claims(&["exp", "iss", "aud"]);
        validation.leeway = config.token_leeway_secs;

        Ok(Self {
            encoding_key,
            decoding_key,
            validation,
            issuer: config.issuer.clone(),
            audience: config.audience.clone(),
            access_token_ttl,
            leeway_secs,
        })
    }

    pub fn issue_access_token(&self, identity: &TokenIdentity) -> AuthResult<SignedAccessToken> {
        self.issue_at(identity, Utc::now())
    }

    fn issue_at(
        &self,
        identity: &TokenIdentity,
        now: DateTime<Utc>,
    ) -> AuthResult<SignedAccessToken> {
        let expires_at = now
            .checked_add_signed(self.access_token_ttl)
            .ok_or_else(|| AuthError::Signing("token expiry out of range".into()))?;
        let claims = AccessTokenClaims {
            user_id: identity.user_id,
            email: identity.email.clone(),
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|err| AuthError::Signing(err.to_string()))?;

        Ok(SignedAccessToken { token, expires_at })
    }

    /// Verify signature, algorithm, issuer, audience and expiry before any
    /// claim is handed back. A token is expired once `exp <= now`.
    pub fn decode_access_token(&self, token: &str) -> AuthResult<AccessTokenClaims> {
        match decode::<AccessTokenClaims>(token, &self.decoding_key, &self.validation) {
            // jsonwebtoken still accepts `exp == now`.
            Ok(token_data)
                if token_data.claims.exp.saturating_add(self.leeway_secs)
                    <= Utc::now().timestamp() =>
            {
                Err(AuthError::TokenExpired)
            }
            Ok(token_data) => Ok(token_data.claims),
            Err(err) => match err.kind() {
                ErrorKind::ExpiredSignature => Err(AuthError::TokenExpired),
                kind => {
                    log::debug!("rejecting access token: {:?}", kind);
                    Err(AuthError::TokenInvalid)
                }
            },
        }
    }

    pub fn validate(&self, token: &str) -> AuthResult<TokenIdentity> {
        let claims = self.decode_access_token(token)?;
        Ok(TokenIdentity {
            user_id: claims.user_id,
            email: claims.email,
        })
    }
}

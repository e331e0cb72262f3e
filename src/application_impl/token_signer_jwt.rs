use crate::application_port::{TokenError, TokenSigner};
use crate::domain_model::*;
use chrono::{DateTime, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub issuer: String,
    pub audience: String,
    pub access_ttl: Duration,
    pub signing_key: Vec<u8>,
}

#[derive(Debug, Serialize, Deserialize)]
struct AccessClaims {
    sub: String,
    role: Role,
    exp: i64,
    iat: i64,
    iss: String,
    aud: String,
    jti: String, // keeps tokens minted in the same second distinct
    // Sub-second issue/expiry times. `exp` stays authoritative for validation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    iat_ms: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    exp_ms: Option<i64>,
}

fn timestamp(secs: i64, millis: Option<i64>) -> Result<DateTime<Utc>, TokenError> {
    let at = match millis {
        Some(ms) if ms.div_euclid(1000) == secs => DateTime::from_timestamp_millis(ms),
        Some(_) => None,
        None => DateTime::from_timestamp(secs, 0),
    };
    at.ok_or(TokenError::Malformed)
}

fn to_payload(claims: AccessClaims) -> Result<AccessTokenPayload, TokenError> {
    let issued_at = timestamp(claims.iat, claims.iat_ms)?;
    let expires_at = timestamp(claims.exp, claims.exp_ms)?;
    Ok(AccessTokenPayload {
        subject_id: SubjectId(claims.sub),
        role: claims.role,
        issued_at,
        expires_at,
    })
}

fn map_jwt_error(e: jsonwebtoken::errors::Error) -> TokenError {
    match e.kind() {
        ErrorKind::ExpiredSignature => TokenError::Expired,
        ErrorKind::InvalidSignature
        | ErrorKind::InvalidAlgorithm
        | ErrorKind::InvalidIssuer
        | ErrorKind::InvalidAudience
        | ErrorKind::ImmatureSignature => TokenError::BadSignature,
        _ => TokenError::Malformed,
    }
}

pub struct JwtHs256Signer {
    cfg: JwtConfig,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    unverified: Validation,
}

impl std::fmt::Debug for JwtHs256Signer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtHs256Signer")
            .field("issuer", &self.cfg.issuer)
            .field("audience", &self.cfg.audience)
            .field("access_ttl", &self.cfg.access_ttl)
            .finish()
    }
}

impl JwtHs256Signer {
    pub fn new(cfg: JwtConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.leeway = 0;
        validation.set_audience(&[cfg.audience.clone()]);
        validation.set_issuer(&[cfg.issuer.clone()]);

        let mut unverified = Validation::new(Algorithm::HS256);
        unverified.insecure_disable_signature_validation();
        unverified.validate_exp = false;
        unverified.validate_aud = false;
        unverified.required_spec_claims.clear();

        JwtHs256Signer {
            encoding_key: EncodingKey::from_secret(&cfg.signing_key),
            decoding_key: DecodingKey::from_secret(&cfg.signing_key),
            validation,
            unverified,
            cfg,
        }
    }

    #[inline]
    fn gen_jti() -> String {
        uuid::Uuid::new_v4().to_string()
    }
}

impl TokenSigner for JwtHs256Signer {
    fn issue_at(
        &self,
        grant: &AccessGrant,
        issued_at: DateTime<Utc>,
    ) -> Result<(AccessToken, AccessTokenPayload), TokenError> {
        let exp_dt = issued_at + self.cfg.access_ttl;
        let claims = AccessClaims {
            sub: grant.subject_id.0.clone(),
            role: grant.role,
            exp: exp_dt.timestamp(),
            iat: issued_at.timestamp(),
            iss: self.cfg.issuer.clone(),
            aud: self.cfg.audience.clone(),
            jti: Self::gen_jti(),
            iat_ms: Some(issued_at.timestamp_millis()),
            exp_ms: Some(exp_dt.timestamp_millis()),
        };
        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| TokenError::Encoding(e.to_string()))?;
        let payload = to_payload(claims)?;
        Ok((AccessToken(token), payload))
    }

    fn verify(&self, token: &AccessToken) -> Result<AccessTokenPayload, TokenError> {
        let data = decode::<AccessClaims>(&token.0, &self.decoding_key, &self.validation)
            .map_err(map_jwt_error)?;
        to_payload(data.claims)
    }

    fn decode(&self, token: &AccessToken) -> Result<AccessTokenPayload, TokenError> {
        let data = decode::<AccessClaims>(&token.0, &self.decoding_key, &self.unverified)
            .map_err(|_| TokenError::Malformed)?;
        to_payload(data.claims)
    }
}

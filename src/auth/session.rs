//! Stateless bearer tokens binding `{subjectID, email, role}`.
//!
//! Tokens are HS256 JWTs signed with the configured secret. There is no
//! revocation list: a token stays valid until its `exp` passes.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde_json::Value;

use super::claims::{Claims, DecodedClaims, SessionClaims};
use crate::services::{ServiceError, ServiceResult};

#[derive(Clone)]
pub struct SessionIssuer {
    secret: Option<String>,
    ttl: Duration,
}

impl std::fmt::Debug for SessionIssuer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionIssuer")
            .field("configured", &self.secret.is_some())
            .field("ttl", &self.ttl)
            .finish()
    }
}

impl SessionIssuer {
    pub fn new(secret: Option<String>, ttl_hours: i64) -> Self {
        Self {
            secret: secret.filter(|s| !s.is_empty()),
            ttl: Duration::hours(ttl_hours),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.secret.is_some()
    }

    fn secret(&self) -> ServiceResult<&[u8]> {
        self.secret
            .as_deref()
            .map(str::as_bytes)
            .ok_or_else(|| ServiceError::Configuration("JWT secret is not configured".to_string()))
    }

    pub fn issue(&self, subject_id: &str, email: &str, role: &str) -> ServiceResult<String> {
        self.issue_at(subject_id, email, role, Utc::now())
    }

    pub fn issue_at(
        &self,
        subject_id: &str,
        email: &str,
        role: &str,
        now: DateTime<Utc>,
    ) -> ServiceResult<String> {
        let secret = self.secret()?;

        let claims = SessionClaims {
            user_id: subject_id.to_string(),
            email: email.to_string(),
            user_type: role.to_string(),
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
        };

        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(secret),
        )
        .map_err(|e| ServiceError::Configuration(format!("Failed to sign token: {}", e)))
    }

    pub fn validate(&self, token: &str) -> ServiceResult<Claims> {
        self.validate_at(token, Utc::now())
    }

    /// Verify the signature, then check expiry against `now`.
    pub fn validate_at(&self, token: &str, now: DateTime<Utc>) -> ServiceResult<Claims> {
        let decoded = self.decode(token)?;

        let expires_at = decoded
            .expires_at()
            .ok_or_else(|| ServiceError::CredentialInvalid("token carries no expiry".to_string()))?;
        if now.timestamp() >= expires_at {
            return Err(ServiceError::CredentialExpired);
        }

        decoded
            .normalize()
            .map_err(|e| ServiceError::CredentialInvalid(e.to_string()))
    }

    pub fn subject(&self, token: &str) -> ServiceResult<String> {
        self.subject_at(token, Utc::now())
    }

    /// Subject only, for callers that need no role. Accepts `id` in place of `userId`.
    pub fn subject_at(&self, token: &str, now: DateTime<Utc>) -> ServiceResult<String> {
        let decoded = self.decode(token)?;

        match decoded.expires_at() {
            Some(exp) if now.timestamp() >= exp => return Err(ServiceError::CredentialExpired),
            Some(_) => {}
            None => {
                return Err(ServiceError::CredentialInvalid(
                    "token carries no expiry".to_string(),
                ))
            }
        }

        decoded
            .subject_id()
            .map_err(|e| ServiceError::CredentialInvalid(e.to_string()))
    }

    fn decode(&self, token: &str) -> ServiceResult<DecodedClaims> {
        let secret = self.secret()?;

        // Expiry is checked by the caller against an explicit instant.
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.leeway = 0;
        validation.required_spec_claims.clear();

        let data = decode::<Value>(token, &DecodingKey::from_secret(secret), &validation)
            .map_err(|e| match e.kind() {
                ErrorKind::InvalidSignature => {
                    ServiceError::CredentialInvalid("signature mismatch".to_string())
                }
                _ => ServiceError::CredentialInvalid(e.to_string()),
            })?;

        DecodedClaims::from_value(data.claims)
            .map_err(|e| ServiceError::CredentialInvalid(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn issuer() -> SessionIssuer {
        SessionIssuer::new(Some("test-secret".to_string()), 24)
    }

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_valid_within_window() {
        let issuer = issuer();
        let token = issuer.issue_at("acc-1", "a@x.com", "company", t0()).unwrap();

        let claims = issuer.validate_at(&token, t0() + Duration::hours(1)).unwrap();
        assert_eq!(claims.subject_id, "acc-1");
        assert_eq!(claims.email, "a@x.com");
        assert_eq!(claims.role, "company");
    }

    #[test]
    fn test_expired_after_window() {
        let issuer = issuer();
        let token = issuer.issue_at("acc-1", "a@x.com", "company", t0()).unwrap();

        let result = issuer.validate_at(&token, t0() + Duration::hours(25));
        assert!(matches!(result, Err(ServiceError::CredentialExpired)));
    }

    #[test]
    fn test_signature_mismatch() {
        let token = issuer().issue_at("acc-1", "a@x.com", "user", t0()).unwrap();
        let other = SessionIssuer::new(Some("another-secret".to_string()), 24);

        let result = other.validate_at(&token, t0());
        assert!(matches!(result, Err(ServiceError::CredentialInvalid(_))));
    }

    #[test]
    fn test_malformed_token() {
        let result = issuer().validate_at("not.a.jwt", t0());
        assert!(matches!(result, Err(ServiceError::CredentialInvalid(_))));
    }

    #[test]
    fn test_missing_secret_never_issues() {
        let issuer = SessionIssuer::new(None, 24);
        assert!(!issuer.is_configured());
        assert!(matches!(
            issuer.issue("acc-1", "a@x.com", "user"),
            Err(ServiceError::Configuration(_))
        ));

        let blank = SessionIssuer::new(Some(String::new()), 24);
        assert!(matches!(
            blank.validate("anything"),
            Err(ServiceError::Configuration(_))
        ));
    }

    #[test]
    fn test_loose_payload_from_same_secret() {
        let payload = serde_json::json!({
            "userId": "legacy",
            "userType": "wholesaler",
            "exp": (t0() + Duration::hours(2)).timestamp(),
        });
        let token = encode(
            &Header::new(Algorithm::HS256),
            &payload,
            &EncodingKey::from_secret(b"test-secret"),
        )
        .unwrap();

        let claims = issuer().validate_at(&token, t0()).unwrap();
        assert_eq!(claims.subject_id, "legacy");
        assert_eq!(claims.role, "wholesaler");
        assert_eq!(claims.email, "");
    }

    #[test]
    fn test_subject_accepts_id_claim() {
        let payload = serde_json::json!({
            "id": "older-signer",
            "exp": (t0() + Duration::hours(2)).timestamp(),
        });
        let token = encode(
            &Header::new(Algorithm::HS256),
            &payload,
            &EncodingKey::from_secret(b"test-secret"),
        )
        .unwrap();

        let issuer = issuer();
        assert_eq!(issuer.subject_at(&token, t0()).unwrap(), "older-signer");
        assert!(matches!(
            issuer.validate_at(&token, t0()),
            Err(ServiceError::CredentialInvalid(_))
        ));
        assert!(matches!(
            issuer.subject_at(&token, t0() + Duration::hours(3)),
            Err(ServiceError::CredentialExpired)
        ));
    }
}

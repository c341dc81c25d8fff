//! Normalization of decoded token payloads into one claims contract.
//!
//! A verified token body reaches us either in the shape we issue ourselves
//! (`SessionClaims`) or as a loose JSON object written by some other signer
//! that shares the secret. Both collapse into [`Claims`] here so handlers never
//! look at the raw payload.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::db::AccountRole;

/// The normalized identity every protected handler works with
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub subject_id: String,
    pub email: String,
    pub role: String,
}

impl Claims {
    /// Whether the role tag is one of `allowed`
    pub fn has_role(&self, allowed: &[AccountRole]) -> bool {
        allowed.iter().any(|role| role.as_str() == self.role)
    }
}

/// Token body as written by the session issuer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionClaims {
    pub user_id: String,
    pub email: String,
    pub user_type: String,
    pub iat: i64,
    pub exp: i64,
}

impl From<SessionClaims> for Claims {
    fn from(claims: SessionClaims) -> Self {
        Self {
            subject_id: claims.user_id,
            email: claims.email,
            role: claims.user_type,
        }
    }
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ClaimsError {
    #[error("token payload is not an object")]
    NotAnObject,

    #[error("missing or non-string claim: {0}")]
    InvalidClaim(&'static str),
}

/// One decoded payload, in whichever physical shape it arrived
#[derive(Debug, Clone)]
pub enum DecodedClaims {
    Typed(SessionClaims),
    Map(Map<String, Value>),
}

impl DecodedClaims {
    pub fn from_value(value: Value) -> Result<Self, ClaimsError> {
        let Value::Object(map) = value else {
            return Err(ClaimsError::NotAnObject);
        };

        match serde_json::from_value::<SessionClaims>(Value::Object(map.clone())) {
            Ok(typed) => Ok(DecodedClaims::Typed(typed)),
            Err(_) => Ok(DecodedClaims::Map(map)),
        }
    }

    /// Expiry instant (unix seconds) when the payload carries one
    pub fn expires_at(&self) -> Option<i64> {
        match self {
            DecodedClaims::Typed(claims) => Some(claims.exp),
            DecodedClaims::Map(map) => map.get("exp").and_then(Value::as_i64),
        }
    }

    /// Collapse into the normalized contract.
    ///
    /// The loose shape must carry string `userId` and `userType`; `email` is
    /// optional there and defaults to empty.
    pub fn normalize(self) -> Result<Claims, ClaimsError> {
        match self {
            DecodedClaims::Typed(claims) => Ok(claims.into()),
            DecodedClaims::Map(map) => Ok(Claims {
                subject_id: string_claim(&map, "userId")?,
                role: string_claim(&map, "userType")?,
                email: map
                    .get("email")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string(),
            }),
        }
    }

    /// Subject only, accepting `id` when `userId` is absent
    pub fn subject_id(&self) -> Result<String, ClaimsError> {
        match self {
            DecodedClaims::Typed(claims) => Ok(claims.user_id.clone()),
            DecodedClaims::Map(map) => string_claim(map, "userId")
                .or_else(|_| string_claim(map, "id"))
                .map_err(|_| ClaimsError::InvalidClaim("userId")),
        }
    }
}

fn string_claim(map: &Map<String, Value>, key: &'static str) -> Result<String, ClaimsError> {
    map.get(key)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or(ClaimsError::InvalidClaim(key))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_typed_shape_is_returned_unchanged() {
        let decoded = DecodedClaims::from_value(json!({
            "userId": "a1",
            "email": "a@x.com",
            "userType": "company",
            "iat": 1,
            "exp": 2
        }))
        .unwrap();
        assert!(matches!(decoded, DecodedClaims::Typed(_)));
        assert_eq!(decoded.expires_at(), Some(2));

        let claims = decoded.normalize().unwrap();
        assert_eq!(
            claims,
            Claims {
                subject_id: "a1".to_string(),
                email: "a@x.com".to_string(),
                role: "company".to_string(),
            }
        );
    }

    #[test]
    fn test_map_shape_without_email() {
        let decoded = DecodedClaims::from_value(json!({
            "userId": "b2",
            "userType": "user",
            "exp": 10
        }))
        .unwrap();
        assert!(matches!(decoded, DecodedClaims::Map(_)));

        let claims = decoded.normalize().unwrap();
        assert_eq!(claims.subject_id, "b2");
        assert_eq!(claims.role, "user");
        assert_eq!(claims.email, "");
    }

    #[test]
    fn test_map_shape_wrong_types_fail() {
        let decoded = DecodedClaims::from_value(json!({ "userId": 5, "userType": "user" })).unwrap();
        assert_eq!(
            decoded.normalize().unwrap_err(),
            ClaimsError::InvalidClaim("userId")
        );

        let decoded = DecodedClaims::from_value(json!({ "userId": "x" })).unwrap();
        assert_eq!(
            decoded.normalize().unwrap_err(),
            ClaimsError::InvalidClaim("userType")
        );
    }

    #[test]
    fn test_subject_id_falls_back_to_id() {
        let decoded = DecodedClaims::from_value(json!({ "id": "legacy-7" })).unwrap();
        assert_eq!(decoded.subject_id().unwrap(), "legacy-7");

        let decoded = DecodedClaims::from_value(json!({ "userId": "u", "id": "other" })).unwrap();
        assert_eq!(decoded.subject_id().unwrap(), "u");

        let decoded = DecodedClaims::from_value(json!({ "sub": "nope" })).unwrap();
        assert!(decoded.subject_id().is_err());
    }

    #[test]
    fn test_non_object_payload_rejected() {
        assert_eq!(
            DecodedClaims::from_value(json!(["a"])).unwrap_err(),
            ClaimsError::NotAnObject
        );
    }

    #[test]
    fn test_role_gate() {
        let claims = Claims {
            subject_id: "1".to_string(),
            email: String::new(),
            role: "serviceProvider".to_string(),
        };
        assert!(claims.has_role(&[AccountRole::ServiceProvider]));
        assert!(!claims.has_role(&[AccountRole::Company, AccountRole::Wholesaler]));
    }
}

//! JWT token issuance and validation
//!
//! Implements signed session tokens with HMAC-SHA256.
//! Tokens carry the username and role names and expire after a
//! configured number of minutes. There is no revocation list.

use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use signin_core::TokenConfig;
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;
use uuid::Uuid;

/// JWT Claims structure
///
/// These claims are embedded in the token and extracted during validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Token issuer
    pub iss: String,
    /// Subject - username
    pub sub: String,
    /// JWT ID - unique per issued token
    pub jti: String,
    /// Issued at timestamp (Unix epoch)
    pub iat: u64,
    /// Expiration timestamp (Unix epoch)
    pub exp: u64,
    /// Role names granted to the subject
    pub roles: Vec<String>,
}

impl Claims {
    /// Check if the subject holds a role
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }
}

/// Token issuance and validation errors
#[derive(Debug, Error)]
pub enum TokenError {
    #[error("Failed to encode JWT: {0}")]
    Encoding(#[from] jsonwebtoken::errors::Error),

    #[error("Invalid token format")]
    Invalid,

    #[error("Token has expired")]
    Expired,

    #[error("Invalid token signature")]
    InvalidSignature,

    #[error("System time error: {0}")]
    SystemTime(#[from] std::time::SystemTimeError),

    #[error("Validity window of {0} minutes is out of range")]
    InvalidWindow(i64),
}

/// JWT Configuration
#[derive(Clone)]
pub struct JwtConfig {
    /// Secret key for HMAC signing (must be at least 256 bits)
    pub secret: String,
    /// Validity window in minutes (default: 60)
    pub valid_minutes: i64,
    /// Token issuer identifier
    pub issuer: String,
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self::from(&TokenConfig::default())
    }
}

impl From<&TokenConfig> for JwtConfig {
    fn from(config: &TokenConfig) -> Self {
        Self {
            secret: config.secret.clone(),
            valid_minutes: config.valid_minutes,
            issuer: config.issuer.clone(),
        }
    }
}

impl std::fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtConfig")
            .field("secret", &"<redacted>")
            .field("valid_minutes", &self.valid_minutes)
            .field("issuer", &self.issuer)
            .finish()
    }
}

/// A freshly issued token and how long it stays valid
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub valid_minutes: i64,
}

/// Issues and validates session tokens with a server-held secret
#[derive(Clone)]
pub struct TokenIssuer {
    config: JwtConfig,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl TokenIssuer {
    pub fn new(config: JwtConfig) -> Self {
        let encoding_key = EncodingKey::from_secret(config.secret.as_bytes());
        let decoding_key = DecodingKey::from_secret(config.secret.as_bytes());
        Self {
            config,
            encoding_key,
            decoding_key,
        }
    }

    /// Configured validity window in minutes
    pub fn valid_minutes(&self) -> i64 {
        self.config.valid_minutes
    }

    /// Issue a token for a verified user
    ///
    /// # Arguments
    ///
    /// * `username` - Verified username, stored as the subject
    /// * `roles` - Role names granted to the user
    ///
    /// # Returns
    ///
    /// * `Ok(IssuedToken)` - Encoded JWT and the validity window
    /// * `Err(TokenError)` - If encoding fails
    ///
    /// # Example
    ///
    /// ```no_run
    /// use signin_api::auth::jwt::{JwtConfig, TokenIssuer};
    ///
    /// let issuer = TokenIssuer::new(JwtConfig::default());
    /// let issued = issuer
    ///     .issue("alice", &["USER".to_string()])
    ///     .expect("Failed to issue token");
    /// assert_eq!(issued.valid_minutes, 60);
    /// ```
    pub fn issue(&self, username: &str, roles: &[String]) -> Result<IssuedToken, TokenError> {
        let now = SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs();
        let exp = u64::try_from(self.config.valid_minutes)
            .ok()
            .filter(|&minutes| minutes > 0)
            .and_then(|minutes| minutes.checked_mul(60))
            .and_then(|secs| now.checked_add(secs))
            .ok_or(TokenError::InvalidWindow(self.config.valid_minutes))?;

        let claims = Claims {
            iss: self.config.issuer.clone(),
            sub: username.to_string(),
            jti: Uuid::new_v4().to_string(),
            iat: now,
            exp,
            roles: roles.to_vec(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)?;

        Ok(IssuedToken {
            token,
            valid_minutes: self.config.valid_minutes,
        })
    }

    /// Validate a token and extract its claims
    ///
    /// Accepts every token produced by `issue` under the same configuration
    /// until it expires.
    pub fn validate(&self, token: &str) -> Result<Claims, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[&self.config.issuer]);

        let token_data = decode::<Claims>(token, &self.decoding_key, &validation).map_err(|e| {
            match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => TokenError::Expired,
                jsonwebtoken::errors::ErrorKind::InvalidSignature => TokenError::InvalidSignature,
                _ => TokenError::Invalid,
            }
        })?;

        Ok(token_data.claims)
    }
}

impl std::fmt::Debug for TokenIssuer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenIssuer")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roles(names: &[&str]) -> Vec<String> {
        names.iter().map(|r| r.to_string()).collect()
    }

    #[test]
    fn test_issue_and_validate_token() {
        let issuer = TokenIssuer::new(JwtConfig::default());

        let issued = issuer
            .issue("alice", &roles(&["USER"]))
            .expect("Failed to issue token");
        assert_eq!(issued.valid_minutes, 60);

        let claims = issuer.validate(&issued.token).expect("Failed to validate token");
        assert_eq!(claims.sub, "alice");
        assert_eq!(claims.roles, roles(&["USER"]));
        assert_eq!(claims.iss, "signin-api");
        assert_eq!(claims.exp - claims.iat, 60 * 60);
        assert!(claims.has_role("USER"));
        assert!(!claims.has_role("ADMIN"));
    }

    #[test]
    fn test_tokens_are_not_idempotent() {
        let issuer = TokenIssuer::new(JwtConfig::default());

        let first = issuer.issue("alice", &roles(&["USER"])).unwrap();
        let second = issuer.issue("alice", &roles(&["USER"])).unwrap();

        assert_ne!(first.token, second.token);
        assert_eq!(first.valid_minutes, second.valid_minutes);
    }

    #[test]
    fn test_configured_window() {
        let issuer = TokenIssuer::new(JwtConfig {
            valid_minutes: 15,
            ..Default::default()
        });

        let issued = issuer.issue("bob", &[]).unwrap();
        let claims = issuer.validate(&issued.token).unwrap();

        assert_eq!(issued.valid_minutes, 15);
        assert_eq!(claims.exp - claims.iat, 15 * 60);
        assert!(claims.roles.is_empty());
    }

    #[test]
    fn test_out_of_range_window_is_an_error() {
        for minutes in [i64::MAX, 0, -5] {
            let issuer = TokenIssuer::new(JwtConfig {
                valid_minutes: minutes,
                ..Default::default()
            });

            let result = issuer.issue("alice", &roles(&["USER"]));
            assert!(
                matches!(result, Err(TokenError::InvalidWindow(m)) if m == minutes),
                "window {minutes} should be rejected"
            );
        }
    }

    #[test]
    fn test_longest_configured_window() {
        let issuer = TokenIssuer::new(JwtConfig {
            valid_minutes: signin_core::config::MAX_VALID_MINUTES,
            ..Default::default()
        });

        let issued = issuer.issue("alice", &[]).unwrap();
        let claims = issuer.validate(&issued.token).unwrap();
        assert_eq!(claims.exp - claims.iat, 525_600 * 60);
    }

    #[test]
    fn test_invalid_token() {
        let issuer = TokenIssuer::new(JwtConfig::default());
        let result = issuer.validate("invalid.token.here");
        assert!(matches!(result, Err(TokenError::Invalid)));
    }

    #[test]
    fn test_wrong_secret() {
        let issuer1 = TokenIssuer::new(JwtConfig {
            secret: "secret1".to_string(),
            ..Default::default()
        });
        let issuer2 = TokenIssuer::new(JwtConfig {
            secret: "secret2".to_string(),
            ..Default::default()
        });

        let issued = issuer1.issue("alice", &roles(&["USER"])).unwrap();

        let result = issuer2.validate(&issued.token);
        assert!(matches!(result, Err(TokenError::InvalidSignature)));
    }

    #[test]
    fn test_wrong_issuer() {
        let issuer1 = TokenIssuer::new(JwtConfig::default());
        let issuer2 = TokenIssuer::new(JwtConfig {
            issuer: "someone-else".to_string(),
            ..Default::default()
        });

        let issued = issuer1.issue("alice", &roles(&["USER"])).unwrap();
        assert!(issuer2.validate(&issued.token).is_err());
    }

    #[test]
    fn test_expired_token() {
        let config = JwtConfig::default();
        let issuer = TokenIssuer::new(config.clone());
        let now = SystemTime::now().duration_since(UNIX_EPOCH).unwrap().as_secs();

        // Expired an hour ago, well past the default leeway
        let claims = Claims {
            iss: config.issuer.clone(),
            sub: "alice".to_string(),
            jti: Uuid::new_v4().to_string(),
            iat: now - 7200,
            exp: now - 3600,
            roles: roles(&["USER"]),
        };

        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(config.secret.as_bytes()),
        )
        .unwrap();

        let result = issuer.validate(&token);
        assert!(matches!(result, Err(TokenError::Expired)));
    }

    #[test]
    fn test_debug_redacts_secret() {
        let issuer = TokenIssuer::new(JwtConfig {
            secret: "do-not-print".to_string(),
            ..Default::default()
        });
        assert!(!format!("{issuer:?}").contains("do-not-print"));
    }
}

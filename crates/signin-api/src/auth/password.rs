/// Password hashing and verification using Argon2id
///
/// Stored hashes are PHC strings, so the salt and parameters travel with
/// the hash:
/// - Algorithm: Argon2id
/// - Memory: 64 MB (default)
/// - Iterations: 3
/// - Parallelism: 4 lanes
/// - Salt: 16 bytes random
/// - Output: 32 bytes hash
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2, Params,
};
use signin_core::HashingConfig;
use thiserror::Error;

/// Password hashing and verification errors
#[derive(Debug, Error)]
pub enum PasswordError {
    #[error("Failed to hash password: {0}")]
    HashingFailed(String),

    #[error("Failed to verify password: {0}")]
    VerificationFailed(String),

    #[error("Invalid password hash format")]
    InvalidHashFormat,
}

/// Password hashing configuration
#[derive(Debug, Clone)]
pub struct PasswordConfig {
    /// Memory cost in KB (default: 65536 = 64 MB)
    pub memory_cost: u32,
    /// Time cost (iterations, default: 3)
    pub time_cost: u32,
    /// Parallelism (lanes, default: 4)
    pub parallelism: u32,
    /// Output length in bytes (default: 32)
    pub output_len: Option<usize>,
}

impl Default for PasswordConfig {
    fn default() -> Self {
        Self::from(&HashingConfig::default())
    }
}

impl From<&HashingConfig> for PasswordConfig {
    fn from(config: &HashingConfig) -> Self {
        Self {
            memory_cost: config.memory_cost,
            time_cost: config.time_cost,
            parallelism: config.parallelism,
            output_len: Some(32),
        }
    }
}

impl PasswordConfig {
    /// Cheap parameters for tests; never use these for stored credentials
    pub fn light() -> Self {
        Self {
            memory_cost: 1024,
            time_cost: 1,
            parallelism: 1,
            output_len: Some(32),
        }
    }

    /// Create Argon2 parameters from this configuration
    fn to_params(&self) -> Result<Params, PasswordError> {
        Params::new(
            self.memory_cost,
            self.time_cost,
            self.parallelism,
            self.output_len,
        )
        .map_err(|e| PasswordError::HashingFailed(e.to_string()))
    }
}

/// Hash a plaintext password with the default parameters
///
/// # Example
///
/// ```no_run
/// use signin_api::auth::password::hash_password;
///
/// let hash = hash_password("secret123").expect("Failed to hash password");
/// assert!(hash.starts_with("$argon2id$"));
/// ```
pub fn hash_password(password: &str) -> Result<String, PasswordError> {
    hash_password_with_config(password, &PasswordConfig::default())
}

/// Hash a password with custom configuration
///
/// # Returns
///
/// * `Ok(String)` - PHC string format hash, safe to store
/// * `Err(PasswordError)` - If hashing fails
pub fn hash_password_with_config(
    password: &str,
    config: &PasswordConfig,
) -> Result<String, PasswordError> {
    let salt = SaltString::generate(&mut OsRng);

    let params = config.to_params()?;
    let argon2 = Argon2::new(argon2::Algorithm::Argon2id, argon2::Version::V0x13, params);

    let password_hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| PasswordError::HashingFailed(e.to_string()))?;

    Ok(password_hash.to_string())
}

/// Verify a plaintext password against a stored hash
///
/// Parameters are read from the PHC string, so hashes made with any
/// `PasswordConfig` verify here.
///
/// # Returns
///
/// * `Ok(true)` - Password matches
/// * `Ok(false)` - Password does not match
/// * `Err(PasswordError)` - If the stored hash is malformed
pub fn verify_password(password: &str, hash: &str) -> Result<bool, PasswordError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| PasswordError::InvalidHashFormat)?;

    match Argon2::default().verify_password(password.as_bytes(), &parsed_hash) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(PasswordError::VerificationFailed(e.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify_password() {
        let config = PasswordConfig::light();
        let hash = hash_password_with_config("secret123", &config).expect("Failed to hash");

        assert!(verify_password("secret123", &hash).expect("Verification failed"));
        assert!(!verify_password("wrong", &hash).expect("Verification failed"));
    }

    #[test]
    fn test_hash_never_contains_plaintext() {
        let hash = hash_password_with_config("secret123", &PasswordConfig::light()).unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(!hash.contains("secret123"));
    }

    #[test]
    fn test_same_password_produces_different_hashes() {
        // Random salt per hash
        let config = PasswordConfig::light();
        let hash1 = hash_password_with_config("SamePassword123!", &config).unwrap();
        let hash2 = hash_password_with_config("SamePassword123!", &config).unwrap();

        assert_ne!(hash1, hash2);
        assert!(verify_password("SamePassword123!", &hash1).unwrap());
        assert!(verify_password("SamePassword123!", &hash2).unwrap());
    }

    #[test]
    fn test_invalid_hash_format() {
        let result = verify_password("password", "invalid-hash-format");
        assert!(matches!(result, Err(PasswordError::InvalidHashFormat)));
    }

    #[test]
    fn test_default_hash_verifies() {
        let hash = hash_password("TestPassword123!").unwrap();
        assert!(hash.contains("m=65536"));
        assert!(verify_password("TestPassword123!", &hash).unwrap());
    }

    #[test]
    fn test_custom_config() {
        let config = PasswordConfig {
            memory_cost: 32768,
            time_cost: 2,
            parallelism: 2,
            output_len: Some(32),
        };

        let hash = hash_password_with_config("TestPassword123!", &config).unwrap();

        assert!(verify_password("TestPassword123!", &hash).unwrap());
        assert!(hash.contains("m=32768"));
        assert!(hash.contains("t=2"));
        assert!(hash.contains("p=2"));
    }

    #[test]
    fn test_config_from_hashing_settings() {
        let settings = HashingConfig {
            memory_cost: 4096,
            time_cost: 2,
            parallelism: 1,
        };
        let config = PasswordConfig::from(&settings);
        assert_eq!(config.memory_cost, 4096);
        assert_eq!(config.output_len, Some(32));
    }

    #[test]
    fn test_validated_hashing_settings_build_params() {
        // Anything the config layer accepts must be accepted by Argon2
        let smallest = HashingConfig {
            memory_cost: 8,
            time_cost: 1,
            parallelism: 1,
        };
        assert!(smallest.validate().is_ok());
        assert!(PasswordConfig::from(&smallest).to_params().is_ok());

        let rejected = HashingConfig {
            memory_cost: 0,
            ..Default::default()
        };
        assert!(rejected.validate().is_err());
        assert!(PasswordConfig::from(&rejected).to_params().is_err());
    }
}

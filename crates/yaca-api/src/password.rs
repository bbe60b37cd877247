use argon2::{
    Algorithm, Argon2, Params, PasswordHash, PasswordHasher, PasswordVerifier, Version,
    password_hash::SaltString,
};
use rand_core::OsRng;
use thiserror::Error;

/// Characters that satisfy the special-character rule. Nothing outside
/// ASCII letters, digits and this set is accepted.
pub const SPECIAL_CHARACTERS: &str = "$%#@!*&~^-+";

pub const MIN_PASSWORD_LEN: usize = 4;

/// The first password rule a candidate breaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PasswordRule {
    #[error("Password must be at least 4 characters.")]
    TooShort,
    #[error("Password must contain at least one letter.")]
    MissingLetter,
    #[error("Password must contain at least one number.")]
    MissingDigit,
    #[error(
        "Password must contain at least one special character ($, %, #, @, !, *, &, ~, ^, -, +)."
    )]
    MissingSpecial,
    #[error("Password contains invalid characters.")]
    InvalidCharacter,
}

fn is_special(c: char) -> bool {
    SPECIAL_CHARACTERS.contains(c)
}

/// Check a password against the policy, rules in order.
pub fn validate_password(password: &str) -> Result<(), PasswordRule> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(PasswordRule::TooShort);
    }
    if !password.chars().any(|c| c.is_ascii_alphabetic()) {
        return Err(PasswordRule::MissingLetter);
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        return Err(PasswordRule::MissingDigit);
    }
    if !password.chars().any(is_special) {
        return Err(PasswordRule::MissingSpecial);
    }
    if password
        .chars()
        .any(|c| !c.is_ascii_alphanumeric() && !is_special(c))
    {
        return Err(PasswordRule::InvalidCharacter);
    }
    Ok(())
}

/// Argon2id hashing with tunable cost. Hash and verify run on the blocking
/// pool since both are deliberately slow.
#[derive(Clone)]
pub struct CredentialHasher {
    argon2: Argon2<'static>,
}

impl CredentialHasher {
    /// `memory_kib` and `iterations` map to Argon2 `m_cost` and `t_cost`.
    pub fn new(memory_kib: u32, iterations: u32) -> anyhow::Result<Self> {
        let params = Params::new(memory_kib, iterations, 1, None)
            .map_err(|e| anyhow::anyhow!("invalid Argon2 parameters: {}", e))?;
        Ok(Self {
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
        })
    }

    /// Cheapest parameters Argon2 accepts. Tests only.
    pub fn insecure_fast() -> Self {
        Self {
            argon2: Argon2::new(
                Algorithm::Argon2id,
                Version::V0x13,
                Params::new(Params::MIN_M_COST, Params::MIN_T_COST, 1, None)
                    .unwrap_or_default(),
            ),
        }
    }

    pub async fn hash(&self, password: String) -> anyhow::Result<String> {
        let argon2 = self.argon2.clone();
        tokio::task::spawn_blocking(move || {
            let salt = SaltString::generate(&mut OsRng);
            argon2
                .hash_password(password.as_bytes(), &salt)
                .map(|hash| hash.to_string())
                .map_err(|e| anyhow::anyhow!("password hashing failed: {}", e))
        })
        .await?
    }

    /// Constant-time comparison against a stored PHC string. The cost
    /// parameters come from the hash itself.
    pub async fn verify(&self, password: String, stored_hash: String) -> anyhow::Result<bool> {
        let argon2 = self.argon2.clone();
        tokio::task::spawn_blocking(move || {
            let parsed = PasswordHash::new(&stored_hash)
                .map_err(|e| anyhow::anyhow!("stored hash is unreadable: {}", e))?;
            match argon2.verify_password(password.as_bytes(), &parsed) {
                Ok(()) => Ok(true),
                Err(argon2::password_hash::Error::Password) => Ok(false),
                Err(e) => Err(anyhow::anyhow!("password verification failed: {}", e)),
            }
        })
        .await?
    }
}

//! Issuer configuration.
//!
//! ```toml
//! rsa_key_bits = 3072
//! legacy_tagged_chain_serials = true
//!
//! [limits]
//! name = 80
//! ```

use std::path::Path;

use bon::Builder;
use serde::Deserialize;

use crate::error::ConfigError;

/// Smallest RSA modulus the issuer will generate.
pub const MIN_RSA_KEY_BITS: usize = 2048;

/// Maximum lengths, in characters, of the identity fields.
#[derive(Clone, Debug, Builder, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct FieldLimits {
    #[builder(default = 64)]
    pub name: usize,
    #[builder(default = 64)]
    pub email: usize,
    #[builder(default = 64)]
    pub organization: usize,
    #[builder(default = 64)]
    pub signer_cn: usize,
    #[builder(default = 64)]
    pub signer_email: usize,
    #[builder(default = 64)]
    pub signer_organization: usize,
    #[builder(default = 128)]
    pub location: usize,
}

impl Default for FieldLimits {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// Settings shared by every issuance operation.
#[derive(Clone, Debug, Builder, Deserialize)]
#[serde(default)]
pub struct IssuerConfig {
    #[builder(default)]
    pub limits: FieldLimits,
    /// Modulus size for generated RSA keys.
    #[builder(default = MIN_RSA_KEY_BITS)]
    pub rsa_key_bits: usize,
    #[builder(default = 5)]
    pub person_validity_years: i32,
    #[builder(default = 3650)]
    pub service_validity_days: i64,
    /// How far `notBefore` is moved into the past.
    #[builder(default = 1)]
    pub backdate_days: i64,
    /// Chain-signed serials use `legacy_serial_tag` followed by 4 random bytes.
    #[builder(default = false)]
    pub legacy_tagged_chain_serials: bool,
    #[builder(default = String::from("NBD1"))]
    pub legacy_serial_tag: String,
}

impl Default for IssuerConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl IssuerConfig {
    /// Parses and validates a TOML document. Missing keys take their defaults.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: IssuerConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads and validates a TOML configuration file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Checks value ranges that serde cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.rsa_key_bits < MIN_RSA_KEY_BITS {
            return Err(ConfigError::Invalid(format!(
                "rsa_key_bits must be at least {MIN_RSA_KEY_BITS}, got {}",
                self.rsa_key_bits
            )));
        }
        if self.person_validity_years <= 0 || self.service_validity_days <= 0 {
            return Err(ConfigError::Invalid(
                "validity periods must be positive".to_string(),
            ));
        }
        if self.backdate_days < 0 {
            return Err(ConfigError::Invalid(
                "backdate_days cannot be negative".to_string(),
            ));
        }
        if self.legacy_serial_tag.len() != 4
            || !self
                .legacy_serial_tag
                .bytes()
                .all(|b| b.is_ascii_alphanumeric())
        {
            return Err(ConfigError::Invalid(
                "legacy_serial_tag must be exactly 4 ASCII letters or digits".to_string(),
            ));
        }
        Ok(())
    }

    pub(crate) fn legacy_tag_bytes(&self) -> [u8; 4] {
        let mut tag = [0u8; 4];
        tag.copy_from_slice(&self.legacy_serial_tag.as_bytes()[..4]);
        tag
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = IssuerConfig::default();
        assert_eq!(config.rsa_key_bits, 2048);
        assert_eq!(config.limits.name, 64);
        assert_eq!(config.limits.location, 128);
        assert!(!config.legacy_tagged_chain_serials);
        assert_eq!(&config.legacy_tag_bytes(), b"NBD1");
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = IssuerConfig::from_toml_str(
            r#"
            rsa_key_bits = 3072
            legacy_tagged_chain_serials = true

            [limits]
            name = 80
            "#,
        )
        .unwrap();
        assert_eq!(config.rsa_key_bits, 3072);
        assert!(config.legacy_tagged_chain_serials);
        assert_eq!(config.limits.name, 80);
        assert_eq!(config.limits.email, 64);
        assert_eq!(config.service_validity_days, 3650);
    }

    #[test]
    fn test_rejects_weak_rsa() {
        let err = IssuerConfig::from_toml_str("rsa_key_bits = 1024").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_rejects_bad_tag() {
        let err = IssuerConfig::from_toml_str("legacy_serial_tag = \"TOOLONG\"").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }
}

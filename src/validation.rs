//! Validation of the identity data carried by person-mode requests.
//!
//! Fields are checked one at a time in a fixed order (subject name, email,
//! organization, signer common name, signer email, signer organization,
//! location, country). For each field, presence is checked before length,
//! and length before content. The first violation is returned.

use std::sync::LazyLock;

use regex::Regex;

use crate::config::FieldLimits;
use crate::country;
use crate::error::ValidationError;

static NAME_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9._\- ]+$").expect("name pattern compiles"));

static EMAIL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9_.\-]+@([A-Za-z0-9_\-]+\.)+[A-Za-z0-9_\-]{2,4}$")
        .expect("email pattern compiles")
});

/// Identity of a certificate subject as supplied by the caller.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct IdentityAttributes {
    pub name: String,
    pub email: String,
    pub organization: String,
    pub location: Option<String>,
    pub country: Option<String>,
}

/// Identity embedded in the issuer field of a person certificate.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SignerIdentity {
    pub common_name: String,
    pub email: String,
    pub organization: String,
}

/// Subject and issuer identities that passed validation.
///
/// Only [`validate_person`] constructs this type, so holding one proves the
/// checks ran. Empty optional fields are normalized to `None`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ValidatedIdentity {
    subject: IdentityAttributes,
    issuer: SignerIdentity,
}

impl ValidatedIdentity {
    pub fn subject(&self) -> &IdentityAttributes {
        &self.subject
    }

    pub fn issuer(&self) -> &SignerIdentity {
        &self.issuer
    }
}

/// Validates a subject identity together with its signer identity.
pub fn validate_person(
    subject: &IdentityAttributes,
    issuer: &SignerIdentity,
    limits: &FieldLimits,
) -> Result<ValidatedIdentity, ValidationError> {
    check_name("Name", &subject.name, limits.name)?;
    check_email("Email", &subject.email, limits.email)?;
    check_name("Organization", &subject.organization, limits.organization)?;

    check_name("SignerCN", &issuer.common_name, limits.signer_cn)?;
    check_email("SignerEmail", &issuer.email, limits.signer_email)?;
    check_name(
        "SignerOrganization",
        &issuer.organization,
        limits.signer_organization,
    )?;

    let location = non_empty(&subject.location);
    if let Some(location) = location {
        check_name("Location", location, limits.location)?;
    }

    let country = non_empty(&subject.country);
    if let Some(country) = country {
        if !country::is_valid(country) {
            return Err(ValidationError::InvalidCountryCode);
        }
    }

    Ok(ValidatedIdentity {
        subject: IdentityAttributes {
            location: location.map(str::to_string),
            country: country.map(str::to_string),
            ..subject.clone()
        },
        issuer: issuer.clone(),
    })
}

/// Rejects an empty required field.
pub fn require(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.is_empty() {
        return Err(ValidationError::MissingField { field });
    }
    Ok(())
}

fn check_length(field: &'static str, value: &str, max: usize) -> Result<(), ValidationError> {
    if value.chars().count() > max {
        return Err(ValidationError::FieldTooLong { field, max });
    }
    Ok(())
}

fn check_name(field: &'static str, value: &str, max: usize) -> Result<(), ValidationError> {
    require(field, value)?;
    check_length(field, value, max)?;
    if !NAME_REGEX.is_match(value) {
        return Err(ValidationError::InvalidCharacters { field });
    }
    Ok(())
}

fn check_email(field: &'static str, value: &str, max: usize) -> Result<(), ValidationError> {
    require(field, value)?;
    check_length(field, value, max)?;
    if !EMAIL_REGEX.is_match(value) {
        return Err(ValidationError::InvalidEmail { field });
    }
    Ok(())
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid() -> (IdentityAttributes, SignerIdentity) {
        (
            IdentityAttributes {
                name: "John Doe".to_string(),
                email: "johndoe@company.com".to_string(),
                organization: "My Company".to_string(),
                location: Some("Buenos Aires".to_string()),
                country: Some("AR".to_string()),
            },
            SignerIdentity {
                common_name: "mycompany.com - Root Certificate".to_string(),
                email: "info@mycompany.com".to_string(),
                organization: "mycompany.com".to_string(),
            },
        )
    }

    fn check(subject: &IdentityAttributes, issuer: &SignerIdentity) -> Result<ValidatedIdentity, ValidationError> {
        validate_person(subject, issuer, &FieldLimits::default())
    }

    #[test]
    fn test_valid_request_passes() {
        let (subject, issuer) = valid();
        let validated = check(&subject, &issuer).unwrap();
        assert_eq!(validated.subject(), &subject);
        assert_eq!(validated.issuer(), &issuer);
    }

    #[test]
    fn test_missing_name() {
        let (mut subject, issuer) = valid();
        subject.name.clear();
        assert_eq!(
            check(&subject, &issuer).unwrap_err(),
            ValidationError::MissingField { field: "Name" }
        );
    }

    #[test]
    fn test_name_length_boundary() {
        let (mut subject, issuer) = valid();
        subject.name = "A".repeat(64);
        assert!(check(&subject, &issuer).is_ok());

        subject.name = "A".repeat(65);
        assert_eq!(
            check(&subject, &issuer).unwrap_err(),
            ValidationError::FieldTooLong {
                field: "Name",
                max: 64
            }
        );
    }

    #[test]
    fn test_name_invalid_characters() {
        let (mut subject, issuer) = valid();
        subject.name = "Test name #".to_string();
        assert_eq!(
            check(&subject, &issuer).unwrap_err(),
            ValidationError::InvalidCharacters { field: "Name" }
        );

        subject.name = "Doe;cn=evil".to_string();
        assert_eq!(
            check(&subject, &issuer).unwrap_err(),
            ValidationError::InvalidCharacters { field: "Name" }
        );
    }

    #[test]
    fn test_case_folded_lookalikes_are_rejected() {
        let (mut subject, issuer) = valid();
        subject.name = "Jo\u{212A}n".to_string();
        assert_eq!(
            check(&subject, &issuer),
            Err(ValidationError::InvalidCharacters { field: "Name" })
        );

        let (mut subject, issuer) = valid();
        subject.organization = "My Compan\u{17F}".to_string();
        assert_eq!(
            check(&subject, &issuer),
            Err(ValidationError::InvalidCharacters { field: "Organization" })
        );

        let (mut subject, issuer) = valid();
        subject.email = "\u{212A}@company.com".to_string();
        assert_eq!(
            check(&subject, &issuer),
            Err(ValidationError::InvalidEmail { field: "Email" })
        );
    }

    #[test]
    fn test_email_rules() {
        let (mut subject, issuer) = valid();
        subject.email = "dummy@domain".to_string();
        assert_eq!(
            check(&subject, &issuer).unwrap_err(),
            ValidationError::InvalidEmail { field: "Email" }
        );

        subject.email = "A".repeat(100);
        assert_eq!(
            check(&subject, &issuer).unwrap_err(),
            ValidationError::FieldTooLong {
                field: "Email",
                max: 64
            }
        );
    }

    #[test]
    fn test_signer_fields() {
        let (subject, mut issuer) = valid();
        issuer.email = "not-an-email".to_string();
        assert_eq!(
            check(&subject, &issuer).unwrap_err(),
            ValidationError::InvalidEmail {
                field: "SignerEmail"
            }
        );

        let (subject, mut issuer) = valid();
        issuer.organization.clear();
        assert_eq!(
            check(&subject, &issuer).unwrap_err(),
            ValidationError::MissingField {
                field: "SignerOrganization"
            }
        );
    }

    #[test]
    fn test_first_violation_wins() {
        let (mut subject, mut issuer) = valid();
        subject.organization = "Bad!Org".to_string();
        issuer.common_name.clear();
        subject.country = Some("XX".to_string());
        assert_eq!(
            check(&subject, &issuer).unwrap_err(),
            ValidationError::InvalidCharacters {
                field: "Organization"
            }
        );
    }

    #[test]
    fn test_validation_is_repeatable() {
        let (mut subject, issuer) = valid();
        subject.location = Some("Buenos Aires!".to_string());
        let first = check(&subject, &issuer).unwrap_err();
        let second = check(&subject, &issuer).unwrap_err();
        assert_eq!(first, second);
        assert_eq!(first.to_string(), second.to_string());
        assert_eq!(first, ValidationError::InvalidCharacters { field: "Location" });
    }

    #[test]
    fn test_country() {
        let (mut subject, issuer) = valid();
        subject.country = Some("XX".to_string());
        assert_eq!(
            check(&subject, &issuer).unwrap_err(),
            ValidationError::InvalidCountryCode
        );
    }

    #[test]
    fn test_empty_optionals_are_dropped() {
        let (mut subject, issuer) = valid();
        subject.location = Some(String::new());
        subject.country = Some(String::new());
        let validated = check(&subject, &issuer).unwrap();
        assert_eq!(validated.subject().location, None);
        assert_eq!(validated.subject().country, None);
    }
}

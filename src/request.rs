//! Request shapes for the three issuance operations.
//!
//! Field names follow the wire format (`Name`, `SignerCN`, `IPAddresses`, ...).
//! Missing string fields deserialize as empty and are rejected by validation.

use serde::Deserialize;

use crate::export::OutputFormat;
use crate::key::KeyAlgorithm;
use crate::validation::{IdentityAttributes, SignerIdentity};

/// Self-signed certificate for an individual.
#[derive(Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct PersonCertificateRequest {
    pub name: String,
    pub email: String,
    pub organization: String,
    pub location: Option<String>,
    pub country: Option<String>,
    #[serde(rename = "SignerCN")]
    pub signer_cn: String,
    pub signer_email: String,
    pub signer_organization: String,
    pub password: String,
    pub output_format: OutputFormat,
    pub signature_algorithm: KeyAlgorithm,
}

impl PersonCertificateRequest {
    pub fn identity(&self) -> IdentityAttributes {
        IdentityAttributes {
            name: self.name.clone(),
            email: self.email.clone(),
            organization: self.organization.clone(),
            location: self.location.clone(),
            country: self.country.clone(),
        }
    }

    pub fn signer(&self) -> SignerIdentity {
        SignerIdentity {
            common_name: self.signer_cn.clone(),
            email: self.signer_email.clone(),
            organization: self.signer_organization.clone(),
        }
    }
}

/// Self-signed CA certificate for a service, with optional SAN entries.
#[derive(Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct ServiceCertificateRequest {
    pub certificate_name: String,
    pub dns_names: Vec<String>,
    #[serde(rename = "IPAddresses", alias = "IpAddresses")]
    pub ip_addresses: Vec<String>,
    pub password: String,
    pub output_format: OutputFormat,
}

/// Leaf certificate signed by the key inside a caller-supplied container.
#[derive(Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct SignCertificateRequest {
    pub certificate_name: String,
    pub base64_issuer_certificate: String,
    pub issuer_certificate_password: String,
    pub new_certificate_password: String,
    pub days_valid: i64,
    pub output_format: OutputFormat,
}

// Requests carry passwords and issuer containers; keep them out of logs.
macro_rules! redacted_debug {
    ($ty:ty, $($field:ident),*) => {
        impl std::fmt::Debug for $ty {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.debug_struct(stringify!($ty))
                    $(.field(stringify!($field), &self.$field))*
                    .finish_non_exhaustive()
            }
        }
    };
}

redacted_debug!(
    PersonCertificateRequest,
    name,
    email,
    organization,
    location,
    country,
    signer_cn,
    output_format,
    signature_algorithm
);
redacted_debug!(
    ServiceCertificateRequest,
    certificate_name,
    dns_names,
    ip_addresses,
    output_format
);
redacted_debug!(
    SignCertificateRequest,
    certificate_name,
    days_valid,
    output_format
);

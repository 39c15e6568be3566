use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use const_oid::AssociatedOid;
use der::{
    Decode, Encode,
    asn1::{Ia5String, OctetString},
    oid::ObjectIdentifier,
};
use sha1::{Digest, Sha1};
use x509_cert::ext::pkix::name::GeneralName;
use x509_cert::spki::SubjectPublicKeyInfoOwned;

pub use der::flagset::FlagSet;
use x509_cert::ext::pkix::KeyUsage as X509KeyUsage;
pub use x509_cert::ext::pkix::KeyUsages;

use crate::error::{CryptoError, MalformedInputError};

/// Trait for converting to and from X.509 extensions.
///
/// # Example
/// ```
/// use certmint::cert::extensions::{BasicConstraints, ToAndFromX509Extension};
/// let bc = BasicConstraints { is_ca: true, max_path_length: Some(0) };
/// let encoded = bc.to_x509_extension_value().unwrap();
/// let decoded = BasicConstraints::from_x509_extension_value(&encoded).unwrap();
/// assert_eq!(decoded.max_path_length, Some(0));
/// ```
pub trait ToAndFromX509Extension {
    /// The Object Identifier (OID) for the extension.
    const OID: ObjectIdentifier;

    /// Encodes the extension into a DER-encoded byte vector.
    fn to_x509_extension_value(&self) -> Result<Vec<u8>, CryptoError>;

    /// Decodes the extension from a DER-encoded byte slice.
    fn from_x509_extension_value(extension: &[u8]) -> Result<Self, CryptoError>
    where
        Self: Sized;
}

/// One Subject Alternative Name entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SanEntry {
    Ip(IpAddr),
    Dns(String),
}

/// Represents the Subject Alternative Name (SAN) extension.
///
/// Entries keep their order: IP addresses first, then DNS names, when built
/// with [`SubjectAltName::parse`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubjectAltName {
    pub entries: Vec<SanEntry>,
}

impl SubjectAltName {
    /// Parses caller-supplied IP literals and DNS names.
    ///
    /// Fails on the first IP that is not a valid IPv4/IPv6 literal, or on a
    /// DNS name that is empty or not ASCII.
    pub fn parse<S: AsRef<str>>(
        dns_names: &[S],
        ip_addresses: &[S],
    ) -> Result<Self, MalformedInputError> {
        let mut entries = Vec::with_capacity(dns_names.len() + ip_addresses.len());
        for ip in ip_addresses {
            let ip = ip.as_ref();
            let addr = ip
                .trim()
                .parse::<IpAddr>()
                .map_err(|_| MalformedInputError::InvalidIpAddress(ip.to_string()))?;
            entries.push(SanEntry::Ip(addr));
        }
        for dns in dns_names {
            let dns = dns.as_ref();
            if dns.is_empty() || !dns.is_ascii() {
                return Err(MalformedInputError::InvalidDnsName(dns.to_string()));
            }
            entries.push(SanEntry::Dns(dns.to_string()));
        }
        Ok(Self { entries })
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn dns_names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().filter_map(|e| match e {
            SanEntry::Dns(name) => Some(name.as_str()),
            SanEntry::Ip(_) => None,
        })
    }

    pub fn ip_addresses(&self) -> impl Iterator<Item = IpAddr> + '_ {
        self.entries.iter().filter_map(|e| match e {
            SanEntry::Ip(addr) => Some(*addr),
            SanEntry::Dns(_) => None,
        })
    }
}

impl ToAndFromX509Extension for SubjectAltName {
    const OID: ObjectIdentifier = x509_cert::ext::pkix::SubjectAltName::OID;

    fn to_x509_extension_value(&self) -> Result<Vec<u8>, CryptoError> {
        let names = self
            .entries
            .iter()
            .map(|entry| match entry {
                SanEntry::Dns(name) => Ok(GeneralName::DnsName(Ia5String::new(name)?)),
                SanEntry::Ip(IpAddr::V4(addr)) => {
                    Ok(GeneralName::IpAddress(OctetString::new(addr.octets().to_vec())?))
                }
                SanEntry::Ip(IpAddr::V6(addr)) => {
                    Ok(GeneralName::IpAddress(OctetString::new(addr.octets().to_vec())?))
                }
            })
            .collect::<Result<Vec<_>, der::Error>>()?;

        Ok(x509_cert::ext::pkix::SubjectAltName(names).to_der()?)
    }

    fn from_x509_extension_value(extension: &[u8]) -> Result<Self, CryptoError> {
        let san = x509_cert::ext::pkix::SubjectAltName::from_der(extension)?;
        let entries = san
            .0
            .iter()
            .map(|name| match name {
                GeneralName::DnsName(dns) => Ok(SanEntry::Dns(dns.to_string())),
                GeneralName::IpAddress(octets) => match octets.as_bytes() {
                    bytes if bytes.len() == 4 => {
                        let mut v4 = [0u8; 4];
                        v4.copy_from_slice(bytes);
                        Ok(SanEntry::Ip(IpAddr::V4(Ipv4Addr::from(v4))))
                    }
                    bytes if bytes.len() == 16 => {
                        let mut v6 = [0u8; 16];
                        v6.copy_from_slice(bytes);
                        Ok(SanEntry::Ip(IpAddr::V6(Ipv6Addr::from(v6))))
                    }
                    _ => Err(CryptoError::Encoding(
                        "IP address entry has an invalid length".to_string(),
                    )),
                },
                _ => Err(CryptoError::Encoding(
                    "Unsupported general name type".to_string(),
                )),
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { entries })
    }
}

/// Represents the Basic Constraints extension.
///
/// # Fields
/// * `is_ca` - Indicates if the certificate is a CA.
/// * `max_path_length` - The maximum number of intermediate CAs allowed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BasicConstraints {
    pub is_ca: bool,
    pub max_path_length: Option<u8>,
}

impl ToAndFromX509Extension for BasicConstraints {
    const OID: ObjectIdentifier = x509_cert::ext::pkix::BasicConstraints::OID;

    fn to_x509_extension_value(&self) -> Result<Vec<u8>, CryptoError> {
        let bc = x509_cert::ext::pkix::BasicConstraints {
            ca: self.is_ca,
            path_len_constraint: self.max_path_length,
        };

        Ok(bc.to_der()?)
    }

    fn from_x509_extension_value(der_bytes: &[u8]) -> Result<Self, CryptoError> {
        let bc = x509_cert::ext::pkix::BasicConstraints::from_der(der_bytes)?;
        Ok(Self {
            is_ca: bc.ca,
            max_path_length: bc.path_len_constraint,
        })
    }
}

/// Represents the Key Usage extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyUsage(pub FlagSet<KeyUsages>);

impl ToAndFromX509Extension for KeyUsage {
    const OID: ObjectIdentifier = <X509KeyUsage as AssociatedOid>::OID;

    fn to_x509_extension_value(&self) -> Result<Vec<u8>, CryptoError> {
        let ku = X509KeyUsage::from(self.0);
        Ok(ku.to_der()?)
    }

    fn from_x509_extension_value(extension: &[u8]) -> Result<Self, CryptoError> {
        let ku = X509KeyUsage::from_der(extension)?;
        Ok(Self(ku.0))
    }
}

/// Represents the Subject Key Identifier extension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubjectKeyIdentifier(pub Vec<u8>);

impl SubjectKeyIdentifier {
    /// SHA-1 of the `subjectPublicKey` bit string (RFC 5280 §4.2.1.2, method 1).
    pub fn from_spki(spki: &SubjectPublicKeyInfoOwned) -> Self {
        Self(Sha1::digest(spki.subject_public_key.raw_bytes()).to_vec())
    }
}

impl ToAndFromX509Extension for SubjectKeyIdentifier {
    const OID: ObjectIdentifier = x509_cert::ext::pkix::SubjectKeyIdentifier::OID;

    fn to_x509_extension_value(&self) -> Result<Vec<u8>, CryptoError> {
        let ski = x509_cert::ext::pkix::SubjectKeyIdentifier(OctetString::new(self.0.clone())?);
        Ok(ski.to_der()?)
    }

    fn from_x509_extension_value(extension: &[u8]) -> Result<Self, CryptoError> {
        let ski = x509_cert::ext::pkix::SubjectKeyIdentifier::from_der(extension)?;
        Ok(Self(ski.0.as_bytes().to_vec()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_constraints_encoding_decoding() {
        let original = BasicConstraints {
            is_ca: true,
            max_path_length: Some(0),
        };
        let encoded = original.to_x509_extension_value().unwrap();
        let decoded = BasicConstraints::from_x509_extension_value(&encoded).unwrap();
        assert_eq!(original, decoded);
    }

    #[test]
    fn test_key_usage_encoding_decoding() {
        let original = KeyUsage(KeyUsages::KeyCertSign | KeyUsages::CRLSign);
        let encoded = original.to_x509_extension_value().unwrap();
        let decoded = KeyUsage::from_x509_extension_value(&encoded).unwrap();
        assert_eq!(original, decoded);
    }

    #[test]
    fn test_san_keeps_ip_then_dns_order() {
        let san = SubjectAltName::parse(&["service.local"], &["127.0.0.1", "::1"]).unwrap();
        assert_eq!(
            san.entries,
            vec![
                SanEntry::Ip("127.0.0.1".parse().unwrap()),
                SanEntry::Ip("::1".parse().unwrap()),
                SanEntry::Dns("service.local".to_string()),
            ]
        );
        let encoded = san.to_x509_extension_value().unwrap();
        let decoded = SubjectAltName::from_x509_extension_value(&encoded).unwrap();
        assert_eq!(san, decoded);
        assert_eq!(decoded.dns_names().collect::<Vec<_>>(), vec!["service.local"]);
        assert_eq!(decoded.ip_addresses().count(), 2);
    }

    #[test]
    fn test_san_rejects_malformed_ip() {
        let err = SubjectAltName::parse(&["ok.local"], &["300.1.1.1"]).unwrap_err();
        assert_eq!(err, MalformedInputError::InvalidIpAddress("300.1.1.1".to_string()));
    }

    #[test]
    fn test_san_rejects_non_ascii_dns() {
        let err = SubjectAltName::parse(&["bücher.example"], &[]).unwrap_err();
        assert!(matches!(err, MalformedInputError::InvalidDnsName(_)));
    }

    #[test]
    fn test_ski_is_sha1_sized() {
        let key = crate::key::KeyPair::generate_ecdsa_p256();
        let ski = SubjectKeyIdentifier::from_spki(&key.as_spki().unwrap());
        assert_eq!(ski.0.len(), 20);
    }
}

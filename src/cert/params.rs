use std::fmt;

use const_oid::ObjectIdentifier;
use der::asn1::{Any, SetOfVec};
use der::Tag;
use time::{Duration, OffsetDateTime};
use x509_cert::attr::AttributeTypeAndValue;
use x509_cert::name::{Name, RdnSequence, RelativeDistinguishedName};

use super::extensions::ToAndFromX509Extension;
use crate::error::CryptoError;
use crate::validation::{SignerIdentity, ValidatedIdentity};

/// Attribute types that may appear in a distinguished name built by this crate.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NameAttribute {
    CommonName,
    Email,
    Organization,
    Locality,
    State,
    Country,
}

impl NameAttribute {
    const ALL: [NameAttribute; 6] = [
        NameAttribute::CommonName,
        NameAttribute::Email,
        NameAttribute::Organization,
        NameAttribute::Locality,
        NameAttribute::State,
        NameAttribute::Country,
    ];

    /// Lower-case key used in the canonical string form.
    pub fn key(self) -> &'static str {
        match self {
            NameAttribute::CommonName => "cn",
            NameAttribute::Email => "email",
            NameAttribute::Organization => "o",
            NameAttribute::Locality => "l",
            NameAttribute::State => "st",
            NameAttribute::Country => "c",
        }
    }

    pub fn oid(self) -> ObjectIdentifier {
        match self {
            NameAttribute::CommonName => ObjectIdentifier::new_unwrap("2.5.4.3"),
            NameAttribute::Email => ObjectIdentifier::new_unwrap("1.2.840.113549.1.9.1"),
            NameAttribute::Organization => ObjectIdentifier::new_unwrap("2.5.4.10"),
            NameAttribute::Locality => ObjectIdentifier::new_unwrap("2.5.4.7"),
            NameAttribute::State => ObjectIdentifier::new_unwrap("2.5.4.8"),
            NameAttribute::Country => ObjectIdentifier::new_unwrap("2.5.4.6"),
        }
    }

    // RFC 5280 mandates IA5String for emailAddress and PrintableString for countryName.
    fn tag(self) -> Tag {
        match self {
            NameAttribute::Email => Tag::Ia5String,
            NameAttribute::Country => Tag::PrintableString,
            _ => Tag::Utf8String,
        }
    }

    fn from_oid(oid: ObjectIdentifier) -> Option<Self> {
        Self::ALL.into_iter().find(|attr| attr.oid() == oid)
    }
}

/// An ordered distinguished name.
///
/// Subject names of person certificates always follow the order
/// `cn, email, o, [l, st], [c]`; issuer names carry `cn, email, o`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DistinguishedName {
    attributes: Vec<(NameAttribute, String)>,
}

impl DistinguishedName {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an attribute, keeping insertion order.
    pub fn with(mut self, attribute: NameAttribute, value: impl Into<String>) -> Self {
        self.attributes.push((attribute, value.into()));
        self
    }

    /// A name holding only a common name, as used by service and chain certificates.
    pub fn common_name(value: impl Into<String>) -> Self {
        Self::new().with(NameAttribute::CommonName, value)
    }

    /// Subject name of a person certificate. The location fills both `l` and `st`.
    pub fn for_subject(identity: &ValidatedIdentity) -> Self {
        let subject = identity.subject();
        let mut dn = Self::new()
            .with(NameAttribute::CommonName, &subject.name)
            .with(NameAttribute::Email, &subject.email)
            .with(NameAttribute::Organization, &subject.organization);
        if let Some(location) = &subject.location {
            dn = dn
                .with(NameAttribute::Locality, location)
                .with(NameAttribute::State, location);
        }
        if let Some(country) = &subject.country {
            dn = dn.with(NameAttribute::Country, country);
        }
        dn
    }

    /// Issuer name embedded in a person certificate.
    pub fn for_signer(signer: &SignerIdentity) -> Self {
        Self::new()
            .with(NameAttribute::CommonName, &signer.common_name)
            .with(NameAttribute::Email, &signer.email)
            .with(NameAttribute::Organization, &signer.organization)
    }

    /// First value of `attribute`, if present.
    pub fn get(&self, attribute: NameAttribute) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(attr, _)| *attr == attribute)
            .map(|(_, value)| value.as_str())
    }

    /// Encodes the name with one attribute per RDN, in insertion order.
    pub fn as_x509_name(&self) -> Result<Name, CryptoError> {
        let mut rdns = Vec::with_capacity(self.attributes.len());
        for (attribute, value) in &self.attributes {
            let atav = AttributeTypeAndValue {
                oid: attribute.oid(),
                value: Any::new(attribute.tag(), value.as_bytes())?,
            };
            rdns.push(RelativeDistinguishedName(SetOfVec::try_from(vec![atav])?));
        }
        Ok(RdnSequence(rdns))
    }

    /// Decodes a name, skipping attribute types this crate does not produce.
    pub fn from_x509_name(name: &Name) -> Result<Self, CryptoError> {
        let mut attributes = Vec::new();
        for rdn in name.0.iter() {
            for atav in rdn.0.iter() {
                let Some(attribute) = NameAttribute::from_oid(atav.oid) else {
                    continue;
                };
                let value = std::str::from_utf8(atav.value.value())
                    .map_err(|e| CryptoError::Encoding(e.to_string()))?;
                attributes.push((attribute, value.to_string()));
            }
        }
        Ok(Self { attributes })
    }
}

/// Renders `cn=...;email=...;o=...`. Backslashes and semicolons inside values
/// are escaped with a backslash.
impl fmt::Display for DistinguishedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (attribute, value)) in self.attributes.iter().enumerate() {
            if i > 0 {
                f.write_str(";")?;
            }
            write!(f, "{}=", attribute.key())?;
            for ch in value.chars() {
                if ch == ';' || ch == '\\' {
                    f.write_str("\\")?;
                }
                write!(f, "{ch}")?;
            }
        }
        Ok(())
    }
}

/// Certificate validity period.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Validity {
    pub not_before: OffsetDateTime,
    pub not_after: OffsetDateTime,
}

impl Validity {
    /// `[now - backdate days, now + days]`. `None` if the end is out of range.
    pub fn backdated_days(now: OffsetDateTime, backdate: i64, days: i64) -> Option<Self> {
        Some(Self {
            not_before: now.checked_sub(checked_days(backdate)?)?,
            not_after: now.checked_add(checked_days(days)?)?,
        })
    }

    /// `[now - backdate days, now + years]` in calendar years. Feb 29 maps to
    /// Feb 28 when the target year is not a leap year.
    pub fn backdated_years(now: OffsetDateTime, backdate: i64, years: i32) -> Option<Self> {
        let year = now.year().checked_add(years)?;
        let not_after = now
            .replace_year(year)
            .or_else(|_| {
                now.replace_day(28)
                    .and_then(|d| d.replace_year(year))
            })
            .ok()?;
        Some(Self {
            not_before: now.checked_sub(checked_days(backdate)?)?,
            not_after,
        })
    }

    pub fn duration(&self) -> Duration {
        self.not_after - self.not_before
    }
}

// `Duration::days` panics on overflow.
fn checked_days(days: i64) -> Option<Duration> {
    days.checked_mul(86_400).map(Duration::seconds)
}

/// Represents an X.509 extension.
///
/// # Fields
/// * `oid` - The object identifier of the extension.
/// * `critical` - Indicates if the extension is critical.
/// * `value` - The DER-encoded value of the extension.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExtensionParam {
    pub oid: ObjectIdentifier,
    pub critical: bool,
    /// DER-encoded extension value
    pub value: Vec<u8>,
}

impl ExtensionParam {
    /// Encodes a typed extension.
    pub fn from_extension<E: ToAndFromX509Extension>(
        extension: &E,
        critical: bool,
    ) -> Result<Self, CryptoError> {
        Ok(Self {
            oid: E::OID,
            critical,
            value: extension.to_x509_extension_value()?,
        })
    }

    /// Decodes the value into a typed extension.
    pub fn to_extension<E: ToAndFromX509Extension>(&self) -> Result<E, CryptoError> {
        E::from_x509_extension_value(&self.value)
    }
}

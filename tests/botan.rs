mod util;

use botan::Certificate as BotanCertificate;

use certmint::export::IssuedPayload;
use certmint::issuer::CertificateIssuer;
use certmint::key::KeyAlgorithm;
use certmint::request::PersonCertificateRequest;

fn check_cert(payload: &IssuedPayload, password: &str) {
    let container = util::open(payload, password);
    for cert in &container.certificates {
        // Use botan crate to parse the DER and assert it succeeds
        BotanCertificate::load(&cert.to_der().unwrap()).expect("Botan failed to parse certificate");
    }
}

#[test]
#[ignore]
fn test_botan_person_ecdsa_p256() {
    let payload = CertificateIssuer::default()
        .issue_self_signed_person(&util::person_request())
        .unwrap();
    check_cert(&payload, "12345678");
}

#[test]
#[ignore]
fn test_botan_person_rsa() {
    let request = PersonCertificateRequest {
        signature_algorithm: KeyAlgorithm::Rsa,
        ..util::person_request()
    };
    let payload = CertificateIssuer::default()
        .issue_self_signed_person(&request)
        .unwrap();
    check_cert(&payload, "12345678");
}

#[test]
#[ignore]
fn test_botan_service() {
    let payload = CertificateIssuer::default()
        .issue_self_signed_service(&util::service_request())
        .unwrap();
    check_cert(&payload, "service-password");
}

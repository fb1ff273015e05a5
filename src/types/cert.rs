use anyhow::{anyhow, Context};
use x509_cert::der::asn1::ObjectIdentifier;
use x509_cert::der::{Decode, DecodePem, Encode};
use x509_cert::crl::CertificateList;
use x509_cert::name::Name;
use x509_cert::Certificate;

use crate::types::sgx_x509::SgxPckExtension;

const COMMON_NAME_OID: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.5.4.3");

/// A PCK leaf certificate together with its decoded SGX extension.
#[derive(Clone, Debug)]
pub struct PckCertificate {
    certificate: Certificate,
    extension: SgxPckExtension,
}

impl PckCertificate {
    pub fn from_der(bytes: &[u8]) -> anyhow::Result<Self> {
        Self::try_from(Certificate::from_der(bytes).context("PCK certificate DER")?)
    }

    pub fn from_pem(pem: &str) -> anyhow::Result<Self> {
        Self::try_from(Certificate::from_pem(pem).context("PCK certificate PEM")?)
    }

    pub fn certificate(&self) -> &Certificate {
        &self.certificate
    }

    pub fn extension(&self) -> &SgxPckExtension {
        &self.extension
    }

    pub fn fmspc(&self) -> &[u8; 6] {
        &self.extension.fmspc
    }

    pub fn pce_id(&self) -> &[u8; 2] {
        &self.extension.pceid
    }

    pub fn subject_common_name_contains(&self, phrase: &str) -> bool {
        common_name_contains(&self.certificate.tbs_certificate.subject, phrase)
    }

    pub fn issuer_der(&self) -> anyhow::Result<Vec<u8>> {
        self.certificate
            .tbs_certificate
            .issuer
            .to_der()
            .context("PCK certificate issuer")
    }

    /// SEC1 encoded public key of the certificate.
    pub fn public_key(&self) -> anyhow::Result<&[u8]> {
        self.certificate
            .tbs_certificate
            .subject_public_key_info
            .subject_public_key
            .as_bytes()
            .ok_or_else(|| anyhow!("missing PCK public key"))
    }

    pub fn is_revoked_by(&self, crl: &CertificateList) -> bool {
        let serial = &self.certificate.tbs_certificate.serial_number;
        crl.tbs_cert_list
            .revoked_certificates
            .as_ref()
            .map_or(false, |revoked| {
                revoked.iter().any(|entry| &entry.serial_number == serial)
            })
    }
}

impl TryFrom<Certificate> for PckCertificate {
    type Error = anyhow::Error;

    fn try_from(certificate: Certificate) -> anyhow::Result<Self> {
        let extension = certificate
            .tbs_certificate
            .extensions
            .as_ref()
            .and_then(|extensions| {
                extensions
                    .iter()
                    .find(|ext| SgxPckExtension::is_pck_ext(&ext.extn_id.to_string()))
            })
            .ok_or_else(|| anyhow!("PCK certificate does not contain an SGX extension"))?;

        let extension = SgxPckExtension::from_der(extension.extn_value.as_bytes())
            .context("PCK extension")?;

        Ok(PckCertificate {
            certificate,
            extension,
        })
    }
}

pub fn crl_issuer_common_name_contains(crl: &CertificateList, phrase: &str) -> bool {
    common_name_contains(&crl.tbs_cert_list.issuer, phrase)
}

pub fn crl_issuer_der(crl: &CertificateList) -> anyhow::Result<Vec<u8>> {
    crl.tbs_cert_list.issuer.to_der().context("CRL issuer")
}

/// True when any CN attribute of the name contains `phrase`.
fn common_name_contains(name: &Name, phrase: &str) -> bool {
    name.0.iter().any(|rdn| {
        rdn.0.iter().any(|attribute| {
            attribute.oid == COMMON_NAME_OID
                && String::from_utf8_lossy(attribute.value.value()).contains(phrase)
        })
    })
}

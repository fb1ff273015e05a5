//! Quote verification core for Intel SGX and TDX ECDSA attestation.
//!
//! Given a parsed [`Quote`], a PCK certificate, the PCK CRL, a TCB info
//! document and optionally an enclave identity document, [`verify_quote`]
//! decides whether the platform that produced the quote is trustworthy and
//! classifies why not: out-of-date microcode, revoked platform, needed
//! configuration, advisable TD relaunch, and so on. The outcome is a single
//! [`VerificationStatus`]; no error type crosses this boundary.
//!
//! The crate neither fetches nor caches collateral and makes no clock-based
//! expiry decisions; callers supply already-parsed documents and certificate
//! chain validation happens outside.

pub mod constants;
pub mod status;
pub mod types;
pub mod utils;

use p256::ecdsa::signature::Verifier;
use x509_cert::crl::CertificateList;
use zerocopy::AsBytes;

pub use status::VerificationStatus;
pub use types::cert::PckCertificate;
pub use types::enclave_identity::EnclaveIdentity;
pub use types::quote::Quote;
pub use types::tcb_info::TcbInfo;

use constants::{PCK_CRL_CA_CN_PHRASE, QUOTE_V3, SGX_PCK_CN_PHRASE, SGX_TEE_TYPE, TDX_TEE_TYPE};
use types::cert;
use types::enclave_identity::{EnclaveType, QeReportStatus};
use types::report::Td10ReportBody;
use types::tcb_info::TcbInfoId;
use utils::crypto::{attestation_key_from_raw, p256_public_key_from_sec1};

/// Verify a quote against its collateral.
///
/// The checks run in a fixed order and the first failure names the result;
/// the ordering is part of the contract since earlier checks suppress
/// failure classes later checks would misattribute (a revoked PCK reports
/// PCK_REVOKED, never TCB_NOT_SUPPORTED).
pub fn verify_quote(
    quote: &Quote<'_>,
    pck_cert: &PckCertificate,
    pck_crl: &CertificateList,
    tcb_info: &TcbInfo,
    qe_identity: Option<&EnclaveIdentity>,
) -> VerificationStatus {
    if !pck_cert.subject_common_name_contains(SGX_PCK_CN_PHRASE) {
        log::warn!("PCK certificate subject CN lacks the PCK phrase");
        return VerificationStatus::InvalidPckCert;
    }

    if !cert::crl_issuer_common_name_contains(pck_crl, PCK_CRL_CA_CN_PHRASE) {
        log::warn!("PCK CRL issuer CN lacks the CA phrase");
        return VerificationStatus::InvalidPckCrl;
    }

    match (cert::crl_issuer_der(pck_crl), pck_cert.issuer_der()) {
        (Ok(crl_issuer), Ok(cert_issuer)) if crl_issuer == cert_issuer => {}
        _ => {
            log::warn!("PCK CRL issuer does not match the PCK certificate issuer");
            return VerificationStatus::InvalidPckCrl;
        }
    }

    if pck_cert.is_revoked_by(pck_crl) {
        log::warn!("PCK certificate is revoked");
        return VerificationStatus::PckRevoked;
    }

    let tee_type = quote.header.tee_type.get();
    if tcb_info.version() >= 3 {
        if tcb_info.id() == TcbInfoId::Tdx && tee_type != TDX_TEE_TYPE {
            log::warn!("TCB info is generated for TDX and does not match the quote's TEE");
            return VerificationStatus::TcbInfoMismatch;
        }
        if tcb_info.id() == TcbInfoId::Sgx && tee_type != SGX_TEE_TYPE {
            log::warn!("TCB info is generated for SGX and does not match the quote's TEE");
            return VerificationStatus::TcbInfoMismatch;
        }
    } else if tee_type == TDX_TEE_TYPE {
        log::warn!("TCB info version {} is invalid for TDX", tcb_info.version());
        return VerificationStatus::TcbInfoMismatch;
    }

    if pck_cert.fmspc() != &tcb_info.fmspc || pck_cert.pce_id() != &tcb_info.pce_id {
        log::warn!("FMSPC or PCEID of the PCK certificate does not match the TCB info");
        return VerificationStatus::TcbInfoMismatch;
    }

    let certification_data = &quote.signature.certification_data;
    if certification_data.parsed_size != certification_data.declared_size {
        log::warn!(
            "certification data declares {} bytes but parsed to {}",
            certification_data.declared_size,
            certification_data.parsed_size
        );
        return VerificationStatus::UnsupportedQuoteFormat;
    }

    if tee_type == TDX_TEE_TYPE && tcb_info.version() >= 3 && tcb_info.id() == TcbInfoId::Tdx {
        if let Some(td_report) = quote.body.as_td10_report() {
            let status =
                verify_tdx_module_binding(quote.header.version.get(), td_report, tcb_info);
            if status != VerificationStatus::Ok {
                return status;
            }
        }
    }

    let pck_key = match pck_cert.public_key().and_then(p256_public_key_from_sec1) {
        Ok(key) => key,
        Err(_) => {
            log::warn!("PCK certificate public key is not a P-256 key");
            return VerificationStatus::InvalidPckCert;
        }
    };
    if pck_key
        .verify(
            quote.signature.qe_report_body.as_bytes(),
            &quote.signature.qe_report_signature,
        )
        .is_err()
    {
        return VerificationStatus::InvalidQeReportSignature;
    }

    if quote.signature.verify_qe_report_data().is_err() {
        return VerificationStatus::InvalidQeReportData;
    }

    let mut qe_tcb_status = None;
    if let Some(identity) = qe_identity {
        if let Some(status) = check_qe_identity_coherence(identity, tee_type) {
            return status;
        }

        match identity.verify_report(&quote.signature.qe_report_body) {
            QeReportStatus::MiscselectMismatch
            | QeReportStatus::AttributesMismatch
            | QeReportStatus::MrSignerMismatch
            | QeReportStatus::IsvProdIdMismatch => {
                return VerificationStatus::QeIdentityMismatch;
            }
            status => qe_tcb_status = Some(status),
        }
    }

    let attestation_key = match attestation_key_from_raw(&quote.signature.attestation_pub_key) {
        Ok(key) => key,
        Err(_) => return VerificationStatus::UnsupportedQuoteFormat,
    };
    if attestation_key
        .verify(&quote.signed_data(), &quote.signature.isv_signature)
        .is_err()
    {
        return VerificationStatus::InvalidQuoteSignature;
    }

    tcb_info.check_tcb_level(
        &pck_cert.extension().tcb,
        quote.header.version.get(),
        tee_type,
        &quote.body,
        qe_tcb_status,
    )
}

/// The enclave identity must be issued for the TEE that produced the quote:
/// QE for SGX, TD_QE for TDX. Version 1 documents predate TDX entirely.
fn check_qe_identity_coherence(
    identity: &EnclaveIdentity,
    tee_type: u32,
) -> Option<VerificationStatus> {
    match tee_type {
        TDX_TEE_TYPE => {
            if identity.version == 1 {
                log::warn!("enclave identity version 1 is invalid for TDX");
                return Some(VerificationStatus::QeIdentityMismatch);
            }
            if identity.version != 2 {
                return Some(VerificationStatus::UnsupportedQeIdentityFormat);
            }
            if identity.id != EnclaveType::TdQe {
                log::warn!("enclave identity is not generated for TDX");
                return Some(VerificationStatus::QeIdentityMismatch);
            }
        }
        SGX_TEE_TYPE => {
            if identity.version != 2 {
                return Some(VerificationStatus::UnsupportedQeIdentityFormat);
            }
            if identity.id != EnclaveType::Qe {
                log::warn!("enclave identity is not generated for SGX");
                return Some(VerificationStatus::QeIdentityMismatch);
            }
        }
        _ => return Some(VerificationStatus::QeIdentityMismatch),
    }
    None
}

/// Validate MRSIGNERSEAM and SEAMATTRIBUTES of a TD report against the TDX
/// module asserted by the TCB info: the default module, or the resolved
/// module identity when a newer quote asserts a module version.
fn verify_tdx_module_binding(
    quote_version: u16,
    td_report: &Td10ReportBody,
    tcb_info: &TcbInfo,
) -> VerificationStatus {
    let module_version = td_report.tee_tcb_svn[1];

    let (mrsigner, attributes) = if quote_version > QUOTE_V3 && module_version > 0 {
        if tcb_info.tdx_module_identities().is_none() {
            log::warn!("quote asserts TDX module version {module_version} but the TCB info carries no module identities");
            return VerificationStatus::TcbInfoMismatch;
        }
        match tcb_info.find_tdx_module_identity(module_version) {
            Some(identity) => (&identity.mrsigner, &identity.attributes),
            None => return VerificationStatus::TdxModuleMismatch,
        }
    } else {
        match tcb_info.tdx_module() {
            Some(module) => (&module.mrsigner, &module.attributes),
            None => {
                log::warn!("TCB info carries no TDX module");
                return VerificationStatus::TcbInfoMismatch;
            }
        }
    };

    if &td_report.mr_signer_seam != mrsigner {
        log::warn!("MRSIGNERSEAM does not match the TDX module");
        return VerificationStatus::TdxModuleMismatch;
    }

    // Every SEAMATTRIBUTES byte must be zero and equal the module's
    // attributes byte. Current modules publish all-zero attributes, so a
    // non-zero byte never matches.
    // TODO: revisit the zero requirement if a module with non-zero
    // attributes is ever published.
    let attributes_ok = td_report
        .seam_attributes
        .iter()
        .zip(attributes.iter())
        .all(|(byte, expected)| *byte == 0 && byte == expected);
    if !attributes_ok {
        log::warn!("SEAMATTRIBUTES do not match the TDX module");
        return VerificationStatus::TdxModuleMismatch;
    }

    VerificationStatus::Ok
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{
        ECDSA_256_WITH_P256_CURVE, ENCLAVE_REPORT_LEN, HEADER_LEN, INTEL_QE_VENDOR_ID,
        TD10_REPORT_LEN,
    };
    use p256::ecdsa::{signature::Signer, Signature, SigningKey};
    use p256::elliptic_curve::sec1::ToEncodedPoint;
    use sha2::{Digest, Sha256};
    use x509_cert::der::Decode;

    const PCK_SUBJECT_CN: &str = "Intel SGX PCK Certificate";
    const PCK_ISSUER_CN: &str = "Intel SGX PCK Platform CA";
    const PCK_SERIAL: u8 = 0x42;
    const FMSPC_HEX: &str = "00906ed50000";
    const FMSPC: [u8; 6] = [0x00, 0x90, 0x6E, 0xD5, 0x00, 0x00];

    // ---- minimal DER writer --------------------------------------------

    fn tlv(tag: u8, content: &[u8]) -> Vec<u8> {
        let mut out = vec![tag];
        let len = content.len();
        if len < 128 {
            out.push(len as u8);
        } else if len < 256 {
            out.push(0x81);
            out.push(len as u8);
        } else {
            out.push(0x82);
            out.extend_from_slice(&(len as u16).to_be_bytes());
        }
        out.extend_from_slice(content);
        out
    }

    const OID_ECDSA_SHA256: &[u8] = &[0x2A, 0x86, 0x48, 0xCE, 0x3D, 0x04, 0x03, 0x02];
    const OID_EC_PUBKEY: &[u8] = &[0x2A, 0x86, 0x48, 0xCE, 0x3D, 0x02, 0x01];
    const OID_P256: &[u8] = &[0x2A, 0x86, 0x48, 0xCE, 0x3D, 0x03, 0x01, 0x07];
    const OID_CN: &[u8] = &[0x55, 0x04, 0x03];
    const OID_SGX_EXT: &[u8] = &[0x2A, 0x86, 0x48, 0x86, 0xF8, 0x4D, 0x01, 0x0D, 0x01];

    fn der_oid(body: &[u8]) -> Vec<u8> {
        tlv(0x06, body)
    }

    fn name(cn: &str) -> Vec<u8> {
        let mut atav = der_oid(OID_CN);
        atav.extend(tlv(0x13, cn.as_bytes()));
        tlv(0x30, &tlv(0x31, &tlv(0x30, &atav)))
    }

    fn utc_time(stamp: &str) -> Vec<u8> {
        tlv(0x17, stamp.as_bytes())
    }

    fn alg_ecdsa_sha256() -> Vec<u8> {
        tlv(0x30, &der_oid(OID_ECDSA_SHA256))
    }

    fn dummy_bit_string() -> Vec<u8> {
        let mut bits = vec![0u8];
        bits.extend_from_slice(&[0u8; 8]);
        tlv(0x03, &bits)
    }

    // ---- PCK certificate and CRL ---------------------------------------

    fn sgx_oid_entry(suffix: &[u8], value: Vec<u8>) -> Vec<u8> {
        let mut body = OID_SGX_EXT.to_vec();
        body.extend_from_slice(suffix);
        let mut content = der_oid(&body);
        content.extend_from_slice(&value);
        tlv(0x30, &content)
    }

    /// SGX extension asserting compsvn = 1 for every component, PCE SVN 10
    /// and the test FMSPC.
    fn sgx_extension_der() -> Vec<u8> {
        let mut entries = Vec::new();
        entries.extend(sgx_oid_entry(&[0x01], tlv(0x04, &[0xAB; 16])));

        let mut tcb_entries = Vec::new();
        for i in 0..16u8 {
            tcb_entries.extend(sgx_oid_entry(&[0x02, i + 1], tlv(0x02, &[0x01])));
        }
        tcb_entries.extend(sgx_oid_entry(&[0x02, 0x11], tlv(0x02, &[0x0A])));
        tcb_entries.extend(sgx_oid_entry(&[0x02, 0x12], tlv(0x04, &[0x01; 16])));
        entries.extend(sgx_oid_entry(&[0x02], tlv(0x30, &tcb_entries)));

        entries.extend(sgx_oid_entry(&[0x03], tlv(0x04, &[0x00, 0x00])));
        entries.extend(sgx_oid_entry(&[0x04], tlv(0x04, &FMSPC)));
        entries.extend(sgx_oid_entry(&[0x05], tlv(0x0A, &[0x00])));

        tlv(0x30, &entries)
    }

    fn pck_cert_der(public_key_sec1: &[u8], subject_cn: &str) -> Vec<u8> {
        let mut tbs = Vec::new();
        tbs.extend(tlv(0xA0, &tlv(0x02, &[0x02]))); // version v3
        tbs.extend(tlv(0x02, &[PCK_SERIAL]));
        tbs.extend(alg_ecdsa_sha256());
        tbs.extend(name(PCK_ISSUER_CN));
        let mut validity = utc_time("250101000000Z");
        validity.extend(utc_time("350101000000Z"));
        tbs.extend(tlv(0x30, &validity));
        tbs.extend(name(subject_cn));

        let mut alg = der_oid(OID_EC_PUBKEY);
        alg.extend(der_oid(OID_P256));
        let mut spki = tlv(0x30, &alg);
        let mut bits = vec![0u8];
        bits.extend_from_slice(public_key_sec1);
        spki.extend(tlv(0x03, &bits));
        tbs.extend(tlv(0x30, &spki));

        let mut extension = der_oid(OID_SGX_EXT);
        extension.extend(tlv(0x04, &sgx_extension_der()));
        tbs.extend(tlv(0xA3, &tlv(0x30, &tlv(0x30, &extension))));

        let mut cert = tlv(0x30, &tbs);
        cert.extend(alg_ecdsa_sha256());
        cert.extend(dummy_bit_string());
        tlv(0x30, &cert)
    }

    fn pck_crl_der(issuer_cn: &str, revoked_serials: &[u8]) -> Vec<u8> {
        let mut tbs = Vec::new();
        tbs.extend(tlv(0x02, &[0x01])); // version v2
        tbs.extend(alg_ecdsa_sha256());
        tbs.extend(name(issuer_cn));
        tbs.extend(utc_time("250101000000Z"));
        tbs.extend(utc_time("350101000000Z"));
        if !revoked_serials.is_empty() {
            let mut list = Vec::new();
            for serial in revoked_serials {
                let mut entry = tlv(0x02, &[*serial]);
                entry.extend(utc_time("250102000000Z"));
                list.extend(tlv(0x30, &entry));
            }
            tbs.extend(tlv(0x30, &list));
        }

        let mut crl = tlv(0x30, &tbs);
        crl.extend(alg_ecdsa_sha256());
        crl.extend(dummy_bit_string());
        tlv(0x30, &crl)
    }

    // ---- quote construction --------------------------------------------

    fn pck_signing_key() -> SigningKey {
        SigningKey::from_bytes(&[3u8; 32].into()).unwrap()
    }

    fn attestation_signing_key() -> SigningKey {
        SigningKey::from_bytes(&[5u8; 32].into()).unwrap()
    }

    fn raw_public_key(key: &SigningKey) -> [u8; 64] {
        let point = key.verifying_key().to_encoded_point(false);
        let mut raw = [0u8; 64];
        raw.copy_from_slice(&point.as_bytes()[1..]);
        raw
    }

    fn header_bytes(version: u16, tee_type: u32) -> Vec<u8> {
        let mut bytes = vec![0u8; HEADER_LEN];
        bytes[0..2].copy_from_slice(&version.to_le_bytes());
        bytes[2..4].copy_from_slice(&ECDSA_256_WITH_P256_CURVE.to_le_bytes());
        bytes[4..8].copy_from_slice(&tee_type.to_le_bytes());
        bytes[12..28].copy_from_slice(&INTEL_QE_VENDOR_ID);
        bytes
    }

    /// QE report whose report data binds the attestation key.
    fn qe_report_bytes(attestation_raw: &[u8; 64], auth_data: &[u8]) -> Vec<u8> {
        let mut report = vec![0u8; ENCLAVE_REPORT_LEN];
        let mut hasher = Sha256::new();
        hasher.update(attestation_raw);
        hasher.update(auth_data);
        report[320..352].copy_from_slice(&hasher.finalize());
        report
    }

    fn build_quote(version: u16, tee_type: u32, body: &[u8]) -> Vec<u8> {
        let pck = pck_signing_key();
        let attestation = attestation_signing_key();
        let attestation_raw = raw_public_key(&attestation);
        let auth_data = b"qe auth data";

        let qe_report = qe_report_bytes(&attestation_raw, auth_data);
        let qe_report_signature: Signature = pck.sign(&qe_report);

        let mut quote = header_bytes(version, tee_type);
        if version == 5 {
            let body_type: u16 = if body.len() == TD10_REPORT_LEN { 2 } else { 3 };
            quote.extend_from_slice(&body_type.to_le_bytes());
            quote.extend_from_slice(&(body.len() as u32).to_le_bytes());
        }
        quote.extend_from_slice(body);
        let isv_signature: Signature = attestation.sign(&quote);

        let mut section = Vec::new();
        section.extend_from_slice(&isv_signature.to_bytes());
        section.extend_from_slice(&attestation_raw);
        if version == 3 {
            section.extend_from_slice(&qe_report);
            section.extend_from_slice(&qe_report_signature.to_bytes());
            section.extend_from_slice(&(auth_data.len() as u16).to_le_bytes());
            section.extend_from_slice(auth_data);
            section.extend_from_slice(&5u16.to_le_bytes());
            section.extend_from_slice(&5u32.to_le_bytes());
            section.extend_from_slice(b"chain");
        } else {
            let mut inner = Vec::new();
            inner.extend_from_slice(&qe_report);
            inner.extend_from_slice(&qe_report_signature.to_bytes());
            inner.extend_from_slice(&(auth_data.len() as u16).to_le_bytes());
            inner.extend_from_slice(auth_data);
            inner.extend_from_slice(&5u16.to_le_bytes());
            inner.extend_from_slice(&5u32.to_le_bytes());
            inner.extend_from_slice(b"chain");
            section.extend_from_slice(&6u16.to_le_bytes());
            section.extend_from_slice(&(inner.len() as u32).to_le_bytes());
            section.extend_from_slice(&inner);
        }

        quote.extend_from_slice(&(section.len() as u32).to_le_bytes());
        quote.extend_from_slice(&section);
        quote
    }

    // ---- collateral ----------------------------------------------------

    fn sgx_tcb_info() -> TcbInfo {
        let mut tcb = serde_json::Map::new();
        for i in 1..=16 {
            tcb.insert(format!("sgxtcbcomp{i:02}svn"), serde_json::json!(1));
        }
        tcb.insert("pcesvn".to_string(), serde_json::json!(10));

        serde_json::json!({
            "version": 2,
            "issueDate": "2025-05-01T10:00:00Z",
            "nextUpdate": "2025-06-01T10:00:00Z",
            "fmspc": FMSPC_HEX,
            "pceId": "0000",
            "tcbType": 0,
            "tcbEvaluationDataNumber": 16,
            "tcbLevels": [{
                "tcb": tcb,
                "tcbDate": "2025-05-01T00:00:00Z",
                "tcbStatus": "UpToDate"
            }]
        })
        .to_string()
        .parse()
        .unwrap()
    }

    fn tdx_tcb_info() -> TcbInfo {
        let components: Vec<serde_json::Value> =
            (0..16).map(|_| serde_json::json!({ "svn": 0 })).collect();
        serde_json::json!({
            "id": "TDX",
            "version": 3,
            "issueDate": "2025-05-01T10:00:00Z",
            "nextUpdate": "2025-06-01T10:00:00Z",
            "fmspc": FMSPC_HEX,
            "pceId": "0000",
            "tcbType": 0,
            "tcbEvaluationDataNumber": 16,
            "tdxModule": {
                "mrsigner": "00".repeat(48),
                "attributes": "0000000000000000",
                "attributesMask": "ffffffffffffffff"
            },
            "tdxModuleIdentities": [{
                "id": "TDX_01",
                "mrsigner": "00".repeat(48),
                "attributes": "0000000000000000",
                "attributesMask": "ffffffffffffffff",
                "tcbLevels": [{
                    "tcb": { "isvsvn": 0 },
                    "tcbDate": "2025-05-01T00:00:00Z",
                    "tcbStatus": "UpToDate"
                }]
            }],
            "tcbLevels": [{
                "tcb": {
                    "sgxtcbcomponents": (0..16).map(|_| serde_json::json!({ "svn": 1 })).collect::<Vec<_>>(),
                    "tdxtcbcomponents": components,
                    "pcesvn": 10
                },
                "tcbDate": "2025-05-01T00:00:00Z",
                "tcbStatus": "UpToDate"
            }]
        })
        .to_string()
        .parse()
        .unwrap()
    }

    fn qe_identity(id: &str) -> EnclaveIdentity {
        format!(
            r#"{{
                "id": "{id}",
                "version": 2,
                "issueDate": "2025-05-01T10:00:00Z",
                "nextUpdate": "2025-06-01T10:00:00Z",
                "tcbEvaluationDataNumber": 17,
                "miscselect": "00000000",
                "miscselectMask": "00000000",
                "attributes": "00000000000000000000000000000000",
                "attributesMask": "00000000000000000000000000000000",
                "mrsigner": "{}",
                "isvprodid": 0,
                "tcbLevels": [
                    {{"tcb": {{"isvsvn": 0}}, "tcbDate": "2025-05-01T00:00:00Z", "tcbStatus": "UpToDate"}}
                ]
            }}"#,
            "00".repeat(32)
        )
        .parse()
        .unwrap()
    }

    struct Setup {
        quote_bytes: Vec<u8>,
        pck_cert: PckCertificate,
        pck_crl: CertificateList,
        tcb_info: TcbInfo,
    }

    fn sgx_setup() -> Setup {
        let public_key = pck_signing_key().verifying_key().to_encoded_point(false);
        Setup {
            quote_bytes: build_quote(3, SGX_TEE_TYPE, &[0u8; ENCLAVE_REPORT_LEN]),
            pck_cert: PckCertificate::from_der(&pck_cert_der(public_key.as_bytes(), PCK_SUBJECT_CN))
                .unwrap(),
            pck_crl: CertificateList::from_der(&pck_crl_der(PCK_ISSUER_CN, &[])).unwrap(),
            tcb_info: sgx_tcb_info(),
        }
    }

    fn tdx_setup() -> Setup {
        let public_key = pck_signing_key().verifying_key().to_encoded_point(false);
        Setup {
            quote_bytes: build_quote(4, TDX_TEE_TYPE, &[0u8; TD10_REPORT_LEN]),
            pck_cert: PckCertificate::from_der(&pck_cert_der(public_key.as_bytes(), PCK_SUBJECT_CN))
                .unwrap(),
            pck_crl: CertificateList::from_der(&pck_crl_der(PCK_ISSUER_CN, &[])).unwrap(),
            tcb_info: tdx_tcb_info(),
        }
    }

    fn run(setup: &Setup, identity: Option<&EnclaveIdentity>) -> VerificationStatus {
        let quote = Quote::read(&mut setup.quote_bytes.as_slice()).unwrap();
        verify_quote(
            &quote,
            &setup.pck_cert,
            &setup.pck_crl,
            &setup.tcb_info,
            identity,
        )
    }

    #[test]
    fn verifies_sgx_quote() {
        let setup = sgx_setup();
        assert_eq!(run(&setup, None), VerificationStatus::Ok);
        assert_eq!(
            run(&setup, Some(&qe_identity("QE"))),
            VerificationStatus::Ok
        );
    }

    #[test]
    fn verifies_tdx_quote() {
        let setup = tdx_setup();
        assert_eq!(run(&setup, None), VerificationStatus::Ok);
        assert_eq!(
            run(&setup, Some(&qe_identity("TD_QE"))),
            VerificationStatus::Ok
        );
    }

    #[test]
    fn rejects_wrong_subject_cn() {
        let mut setup = sgx_setup();
        let public_key = pck_signing_key().verifying_key().to_encoded_point(false);
        setup.pck_cert =
            PckCertificate::from_der(&pck_cert_der(public_key.as_bytes(), "Intel SGX TCB Signing"))
                .unwrap();
        assert_eq!(run(&setup, None), VerificationStatus::InvalidPckCert);
    }

    #[test]
    fn rejects_crl_without_ca_cn() {
        let mut setup = sgx_setup();
        setup.pck_crl =
            CertificateList::from_der(&pck_crl_der("Intel SGX Something", &[])).unwrap();
        assert_eq!(run(&setup, None), VerificationStatus::InvalidPckCrl);
    }

    #[test]
    fn rejects_crl_issuer_mismatch() {
        let mut setup = sgx_setup();
        setup.pck_crl =
            CertificateList::from_der(&pck_crl_der("Intel SGX PCK Processor CA", &[])).unwrap();
        assert_eq!(run(&setup, None), VerificationStatus::InvalidPckCrl);
    }

    #[test]
    fn reports_revoked_pck() {
        let mut setup = sgx_setup();
        setup.pck_crl =
            CertificateList::from_der(&pck_crl_der(PCK_ISSUER_CN, &[PCK_SERIAL])).unwrap();
        assert_eq!(run(&setup, None), VerificationStatus::PckRevoked);
    }

    #[test]
    fn revocation_is_by_serial() {
        let mut setup = sgx_setup();
        setup.pck_crl =
            CertificateList::from_der(&pck_crl_der(PCK_ISSUER_CN, &[PCK_SERIAL + 1])).unwrap();
        assert_eq!(run(&setup, None), VerificationStatus::Ok);
    }

    #[test]
    fn rejects_tee_type_mismatch() {
        // TDX TCB info applied to an SGX quote.
        let mut setup = sgx_setup();
        setup.tcb_info = tdx_tcb_info();
        assert_eq!(run(&setup, None), VerificationStatus::TcbInfoMismatch);

        // v2 TCB info applied to a TDX quote.
        let mut setup = tdx_setup();
        setup.tcb_info = sgx_tcb_info();
        assert_eq!(run(&setup, None), VerificationStatus::TcbInfoMismatch);
    }

    #[test]
    fn rejects_fmspc_mismatch() {
        let mut setup = sgx_setup();
        let json = serde_json::to_string(&setup.tcb_info)
            .unwrap()
            .replace(FMSPC_HEX, "00906ed51111");
        setup.tcb_info = json.parse().unwrap();
        assert_eq!(run(&setup, None), VerificationStatus::TcbInfoMismatch);
    }

    #[test]
    fn rejects_tampered_quote_signature() {
        let mut setup = sgx_setup();
        // Flip a byte inside the signed region.
        setup.quote_bytes[HEADER_LEN + 10] ^= 1;
        assert_eq!(run(&setup, None), VerificationStatus::InvalidQuoteSignature);
    }

    #[test]
    fn rejects_tampered_qe_report_signature() {
        let mut setup = sgx_setup();
        // The QE report signature lives after the quote signature and the
        // attestation key in the v3 signature section.
        let offset = setup.quote_bytes.len() - 5 - 6 - 12 - 2 - 64 + 1;
        setup.quote_bytes[offset] ^= 1;
        assert_eq!(
            run(&setup, None),
            VerificationStatus::InvalidQeReportSignature
        );
    }

    #[test]
    fn rejects_unbound_attestation_key() {
        let mut setup = sgx_setup();
        // Corrupt the QE auth data: the QE report hash no longer matches.
        let offset = setup.quote_bytes.len() - 5 - 6 - 12;
        setup.quote_bytes[offset] ^= 1;
        assert_eq!(run(&setup, None), VerificationStatus::InvalidQeReportData);
    }

    #[test]
    fn qe_identity_must_match_tee() {
        let setup = sgx_setup();
        assert_eq!(
            run(&setup, Some(&qe_identity("TD_QE"))),
            VerificationStatus::QeIdentityMismatch
        );

        let setup = tdx_setup();
        assert_eq!(
            run(&setup, Some(&qe_identity("QE"))),
            VerificationStatus::QeIdentityMismatch
        );
    }

    #[test]
    fn qe_identity_version_must_be_supported() {
        let setup = tdx_setup();

        let mut identity = qe_identity("TD_QE");
        identity.version = 1;
        assert_eq!(
            run(&setup, Some(&identity)),
            VerificationStatus::QeIdentityMismatch
        );

        identity.version = 3;
        assert_eq!(
            run(&setup, Some(&identity)),
            VerificationStatus::UnsupportedQeIdentityFormat
        );
    }

    #[test]
    fn qe_identity_field_mismatch() {
        let setup = sgx_setup();
        let mut identity = qe_identity("QE");
        identity.isvprodid = 7;
        assert_eq!(
            run(&setup, Some(&identity)),
            VerificationStatus::QeIdentityMismatch
        );
    }

    #[test]
    fn qe_status_converges_into_verdict() {
        let setup = sgx_setup();

        // The only identity level is OutOfDate at the report's ISVSVN.
        let json = serde_json::to_string(&qe_identity("QE"))
            .unwrap()
            .replace("\"UpToDate\"", "\"OutOfDate\"");
        let identity: EnclaveIdentity = json.parse().unwrap();
        assert_eq!(
            run(&setup, Some(&identity)),
            VerificationStatus::TcbOutOfDate
        );

        // No identity level at or below the report's ISVSVN.
        let json =
            serde_json::to_string(&qe_identity("QE")).unwrap().replace("\"isvsvn\":0", "\"isvsvn\":3");
        let identity: EnclaveIdentity = json.parse().unwrap();
        assert_eq!(
            run(&setup, Some(&identity)),
            VerificationStatus::TcbNotSupported
        );
    }

    #[test]
    fn tdx_module_binding_checks_mrsigner_seam() {
        let mut body = [0u8; TD10_REPORT_LEN];
        body[64] = 0xFF; // mr_signer_seam[0]
        let mut setup = tdx_setup();
        setup.quote_bytes = build_quote(4, TDX_TEE_TYPE, &body);
        assert_eq!(run(&setup, None), VerificationStatus::TdxModuleMismatch);
    }

    #[test]
    fn tdx_module_binding_requires_zero_seam_attributes() {
        let mut body = [0u8; TD10_REPORT_LEN];
        body[112] = 0x01; // seam_attributes[0]
        let mut setup = tdx_setup();
        setup.quote_bytes = build_quote(4, TDX_TEE_TYPE, &body);
        assert_eq!(run(&setup, None), VerificationStatus::TdxModuleMismatch);
    }

    #[test]
    fn tdx_module_binding_resolves_identity_for_versioned_modules() {
        let mut body = [0u8; TD10_REPORT_LEN];
        body[1] = 0x01; // tee_tcb_svn[1]: module version 1
        let mut setup = tdx_setup();
        setup.quote_bytes = build_quote(4, TDX_TEE_TYPE, &body);
        assert_eq!(run(&setup, None), VerificationStatus::Ok);

        // An unknown module version has no identity to bind against.
        body[1] = 0x02;
        setup.quote_bytes = build_quote(4, TDX_TEE_TYPE, &body);
        assert_eq!(run(&setup, None), VerificationStatus::TdxModuleMismatch);
    }

    #[test]
    fn tdx_module_binding_without_identities_is_tcb_info_mismatch() {
        let mut setup = tdx_setup();
        let mut json = serde_json::to_value(&setup.tcb_info).unwrap();
        json.as_object_mut().unwrap().remove("tdxModuleIdentities");
        setup.tcb_info = json.to_string().parse().unwrap();

        let mut body = [0u8; TD10_REPORT_LEN];
        body[1] = 0x01;
        setup.quote_bytes = build_quote(4, TDX_TEE_TYPE, &body);
        assert_eq!(run(&setup, None), VerificationStatus::TcbInfoMismatch);
    }

    #[test]
    fn verifies_v5_tdx_quote() {
        let mut setup = tdx_setup();
        setup.quote_bytes = build_quote(5, TDX_TEE_TYPE, &[0u8; TD10_REPORT_LEN]);
        assert_eq!(run(&setup, None), VerificationStatus::Ok);
    }
}

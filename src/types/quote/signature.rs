use anyhow::{anyhow, bail, Context};
use p256::ecdsa::Signature;
use zerocopy::little_endian;

use crate::constants::ENCLAVE_REPORT_LEN;
use crate::types::report::EnclaveReportBody;
use crate::utils;
use crate::utils::hash::sha256sum;

/// Types of data the quote can carry to certify the QE report signature.
///
/// Only the self-contained types are accepted: a concatenated PCK
/// certificate chain, or (v4/v5) a QE report certification structure that
/// nests one.
#[derive(Debug, PartialEq)]
pub enum CertificationKeyType {
    PpidClearText = 1,
    PpidRsa2048Encrypted = 2,
    PpidRsa3072Encrypted = 3,
    PckCleartext = 4,
    PckCertChain = 5,
    EcdsaSigAuxData = 6,
}

/// Typed certification data of a quote.
///
/// `declared_size` is the size field from the wire; `parsed_size` is the
/// number of bytes the inner structure actually occupied. The verifier
/// requires the two to be equal.
#[derive(Debug)]
pub struct CertificationData<'a> {
    pub key_type: u16,
    pub declared_size: u32,
    pub parsed_size: u32,
    pub data: &'a [u8],
}

impl<'a> CertificationData<'a> {
    fn read(bytes: &mut &'a [u8]) -> anyhow::Result<Self> {
        let key_type = utils::read_from_bytes::<little_endian::U16>(bytes)
            .ok_or_else(|| anyhow!("underflow reading certification data type"))?
            .get();

        let declared_size = utils::read_from_bytes::<little_endian::U32>(bytes)
            .ok_or_else(|| anyhow!("underflow reading certification data size"))?
            .get();

        let data = utils::read_bytes(bytes, declared_size as usize)
            .ok_or_else(|| anyhow!("underflow reading certification data"))?;

        Ok(Self {
            key_type,
            declared_size,
            // Refined to the inner structure size when the contents are
            // parsed further (key type 6).
            parsed_size: declared_size,
            data,
        })
    }
}

/// Signature data for SGX and TDX quotes.
///
/// In the Intel docs this is A 4.4: "ECDSA 256-bit Quote Signature Data
/// Structure". Version 3 quotes carry the QE report at the top level;
/// versions 4 and 5 nest it inside certification data of type 6. Both
/// layouts normalize into this structure.
#[derive(Debug)]
pub struct QuoteSignatureData<'a> {
    /// Signature of the quote header and body by the attestation key.
    pub isv_signature: Signature,

    /// The public key used to generate the isv_signature, raw `x || y`.
    pub attestation_pub_key: [u8; 64],

    /// Report of the quoting enclave.
    pub qe_report_body: EnclaveReportBody,

    /// Signature of the quoting enclave report using the PCK cert key.
    pub qe_report_signature: Signature,

    /// Variable-length data the QE included in its report hash.
    pub qe_auth_data: &'a [u8],

    /// Certification data of the quote (outer structure for v4/v5).
    pub certification_data: CertificationData<'a>,

    /// Concatenated PEM PCK certificate chain carried by the quote.
    pub pck_chain: &'a [u8],
}

#[derive(Debug, zerocopy::FromBytes, zerocopy::FromZeroes)]
#[repr(C)]
struct EcdsaSignatureHeader {
    isv_signature: [u8; 64],
    attestation_pub_key: [u8; 64],
}

impl<'a> QuoteSignatureData<'a> {
    pub fn read(bytes: &mut &'a [u8], version: u16) -> anyhow::Result<Self> {
        let signature_len = utils::read_from_bytes::<little_endian::U32>(bytes)
            .ok_or_else(|| anyhow!("underflow reading signature length"))?
            .get();

        if bytes.len() != signature_len as usize {
            bail!(
                "quote signature data size mismatch, declared {} got {}",
                signature_len,
                bytes.len()
            );
        }

        let signature = match version {
            3 => Self::read_v3_signature(bytes),
            4 | 5 => Self::read_v4_signature(bytes),
            _ => Err(anyhow!("unsupported quote version {version}")),
        }?;

        if !bytes.is_empty() {
            bail!("trailing bytes after quote signature data");
        }

        Ok(signature)
    }

    fn read_v3_signature(bytes: &mut &'a [u8]) -> anyhow::Result<Self> {
        let signature_header: EcdsaSignatureHeader = utils::read_from_bytes(bytes)
            .ok_or_else(|| anyhow!("underflow reading signature header"))?;

        let qe_report_body = utils::read_array::<ENCLAVE_REPORT_LEN>(bytes)
            .ok_or_else(|| anyhow!("underflow reading QE report"))?;
        let qe_report_body = EnclaveReportBody::try_from(qe_report_body)?;

        let qe_report_signature = utils::read_bytes(bytes, 64)
            .ok_or_else(|| anyhow!("underflow reading QE report signature"))?;
        let qe_report_signature =
            Signature::from_slice(qe_report_signature).context("QE report signature")?;

        let qe_auth_data = read_qe_auth_data(bytes)?;

        let certification_data = CertificationData::read(bytes)?;
        if certification_data.key_type != CertificationKeyType::PckCertChain as u16 {
            bail!(
                "unsupported certification data type {}",
                certification_data.key_type
            );
        }
        let pck_chain = strip_nul(certification_data.data);

        Ok(QuoteSignatureData {
            isv_signature: Signature::from_slice(&signature_header.isv_signature)
                .context("quote signature")?,
            attestation_pub_key: signature_header.attestation_pub_key,
            qe_report_body,
            qe_report_signature,
            qe_auth_data,
            certification_data,
            pck_chain,
        })
    }

    fn read_v4_signature(bytes: &mut &'a [u8]) -> anyhow::Result<Self> {
        let signature_header: EcdsaSignatureHeader = utils::read_from_bytes(bytes)
            .ok_or_else(|| anyhow!("underflow reading signature header"))?;

        let mut certification_data = CertificationData::read(bytes)?;
        if certification_data.key_type != CertificationKeyType::EcdsaSigAuxData as u16 {
            bail!(
                "unsupported certification data type {}",
                certification_data.key_type
            );
        }

        // Certification data of type 6 nests the QE report, its signature,
        // the QE auth data and an inner PCK chain certification structure.
        let mut data = certification_data.data;

        let qe_report_bytes = utils::read_array::<ENCLAVE_REPORT_LEN>(&mut data)
            .ok_or_else(|| anyhow!("underflow reading QE report"))?;
        let qe_report_body = EnclaveReportBody::try_from(qe_report_bytes)?;

        let qe_report_sig_bytes = utils::read_bytes(&mut data, 64)
            .ok_or_else(|| anyhow!("underflow reading QE report signature"))?;
        let qe_report_signature =
            Signature::from_slice(qe_report_sig_bytes).context("QE report signature")?;

        let qe_auth_data = read_qe_auth_data(&mut data)?;

        let inner = CertificationData::read(&mut data)?;
        if inner.key_type != CertificationKeyType::PckCertChain as u16 {
            bail!("unsupported certification data type {}", inner.key_type);
        }
        let pck_chain = strip_nul(inner.data);

        let consumed = certification_data.data.len() - data.len();
        certification_data.parsed_size = consumed as u32;

        Ok(QuoteSignatureData {
            isv_signature: Signature::from_slice(&signature_header.isv_signature)
                .context("quote signature")?,
            attestation_pub_key: signature_header.attestation_pub_key,
            qe_report_body,
            qe_report_signature,
            qe_auth_data,
            certification_data,
            pck_chain,
        })
    }

    /// Verify that the QE report binds the attestation key.
    ///
    /// By specification the first 32 bytes of the QE report data must be
    /// SHA256(attestation public key || QE auth data).
    pub fn verify_qe_report_data(&self) -> anyhow::Result<()> {
        let mut verification_data =
            Vec::with_capacity(self.attestation_pub_key.len() + self.qe_auth_data.len());
        verification_data.extend_from_slice(&self.attestation_pub_key);
        verification_data.extend_from_slice(self.qe_auth_data);
        let digest = sha256sum(&verification_data);

        if digest != self.qe_report_body.report_data[..digest.len()] {
            bail!("QE report data does not bind the attestation key");
        }

        Ok(())
    }
}

fn read_qe_auth_data<'a>(bytes: &mut &'a [u8]) -> anyhow::Result<&'a [u8]> {
    let size = utils::read_from_bytes::<little_endian::U16>(bytes)
        .ok_or_else(|| anyhow!("underflow reading QE auth data size"))?
        .get();

    utils::read_bytes(bytes, size as usize).ok_or_else(|| anyhow!("underflow reading QE auth data"))
}

fn strip_nul(data: &[u8]) -> &[u8] {
    data.strip_suffix(&[0]).unwrap_or(data)
}

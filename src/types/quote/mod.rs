mod body;
mod header;
mod signature;

use anyhow::{anyhow, bail};
pub use body::*;
pub use header::*;
pub use signature::*;
use zerocopy::little_endian;
use zerocopy::AsBytes;

use crate::constants::{
    BODY_DESCRIPTOR_LEN, BODY_SGX_ENCLAVE_REPORT_TYPE, BODY_TD_REPORT10_TYPE,
    BODY_TD_REPORT15_TYPE, ENCLAVE_REPORT_LEN, HEADER_LEN, QUOTE_V5, SGX_TEE_TYPE, TD10_REPORT_LEN,
    TD15_REPORT_LEN, TDX_TEE_TYPE,
};
use crate::types::report::{EnclaveReportBody, Td10ReportBody, Td15ReportBody};
use crate::utils;

/// A DCAP quote, parsed for verification.
#[derive(Debug)]
pub struct Quote<'a> {
    /// Header of the quote data structure.
    pub header: QuoteHeader,

    /// Report of the attested enclave or trust domain.
    pub body: QuoteBody,

    /// Signature data over the signed region.
    pub signature: QuoteSignatureData<'a>,
}

impl<'a> Quote<'a> {
    /// Parse a quote from its wire encoding. The whole buffer must be
    /// consumed; integers are little-endian.
    pub fn read(bytes: &mut &'a [u8]) -> anyhow::Result<Self> {
        let header = utils::read_array::<HEADER_LEN>(bytes)
            .ok_or_else(|| anyhow!("underflow reading quote header"))?;
        let header = QuoteHeader::try_from(header)?;

        let body = if header.version.get() == QUOTE_V5 {
            Self::read_v5_body(bytes, &header)?
        } else {
            Self::read_legacy_body(bytes, &header)?
        };

        let signature = QuoteSignatureData::read(bytes, header.version.get())?;

        Ok(Quote {
            header,
            body,
            signature,
        })
    }

    /// v3/v4 bodies are implied by the TEE type. v3 TDX quotes are legacy
    /// and still carry an enclave report.
    fn read_legacy_body(bytes: &mut &'a [u8], header: &QuoteHeader) -> anyhow::Result<QuoteBody> {
        match (header.tee_type.get(), header.version.get()) {
            (SGX_TEE_TYPE, _) | (TDX_TEE_TYPE, 3) => {
                let body = utils::read_array::<ENCLAVE_REPORT_LEN>(bytes)
                    .ok_or_else(|| anyhow!("underflow reading enclave report"))?;
                Ok(QuoteBody::EnclaveReport(EnclaveReportBody::try_from(body)?))
            }
            (TDX_TEE_TYPE, _) => {
                let body = utils::read_array::<TD10_REPORT_LEN>(bytes)
                    .ok_or_else(|| anyhow!("underflow reading TD report"))?;
                Ok(QuoteBody::TdReport10(Td10ReportBody::try_from(body)?))
            }
            (tee_type, _) => bail!("unknown TEE type {tee_type:#x}"),
        }
    }

    /// v5 bodies are selected by a 6-byte descriptor (type, size).
    fn read_v5_body(bytes: &mut &'a [u8], header: &QuoteHeader) -> anyhow::Result<QuoteBody> {
        let body_type = utils::read_from_bytes::<little_endian::U16>(bytes)
            .ok_or_else(|| anyhow!("underflow reading body type"))?
            .get();
        let body_size = utils::read_from_bytes::<little_endian::U32>(bytes)
            .ok_or_else(|| anyhow!("underflow reading body size"))?
            .get();

        let (body, expected_tee) = match body_type {
            BODY_SGX_ENCLAVE_REPORT_TYPE => {
                if body_size as usize != ENCLAVE_REPORT_LEN {
                    bail!("enclave report body size mismatch, got {body_size}");
                }
                let body = utils::read_array::<ENCLAVE_REPORT_LEN>(bytes)
                    .ok_or_else(|| anyhow!("underflow reading enclave report"))?;
                (
                    QuoteBody::EnclaveReport(EnclaveReportBody::try_from(body)?),
                    SGX_TEE_TYPE,
                )
            }
            BODY_TD_REPORT10_TYPE => {
                if body_size as usize != TD10_REPORT_LEN {
                    bail!("TD 1.0 report body size mismatch, got {body_size}");
                }
                let body = utils::read_array::<TD10_REPORT_LEN>(bytes)
                    .ok_or_else(|| anyhow!("underflow reading TD report"))?;
                (
                    QuoteBody::TdReport10(Td10ReportBody::try_from(body)?),
                    TDX_TEE_TYPE,
                )
            }
            BODY_TD_REPORT15_TYPE => {
                if body_size as usize != TD15_REPORT_LEN {
                    bail!("TD 1.5 report body size mismatch, got {body_size}");
                }
                let body = utils::read_array::<TD15_REPORT_LEN>(bytes)
                    .ok_or_else(|| anyhow!("underflow reading TD report"))?;
                (
                    QuoteBody::TdReport15(Td15ReportBody::try_from(body)?),
                    TDX_TEE_TYPE,
                )
            }
            _ => bail!("unknown quote body type {body_type}"),
        };

        if header.tee_type.get() != expected_tee {
            bail!(
                "body type {body_type} does not match TEE type {:#x}",
                header.tee_type.get()
            );
        }

        Ok(body)
    }

    /// The region covered by the quote signature: header, v5 body
    /// descriptor when present, then the body. Assembled from the typed
    /// values rather than raw offsets.
    pub fn signed_data(&self) -> Vec<u8> {
        let body_bytes = self.body.as_bytes();
        let mut data = Vec::with_capacity(HEADER_LEN + BODY_DESCRIPTOR_LEN + body_bytes.len());
        data.extend_from_slice(self.header.as_bytes());
        if self.header.version.get() == QUOTE_V5 {
            data.extend_from_slice(&self.body.body_type().to_le_bytes());
            data.extend_from_slice(&(body_bytes.len() as u32).to_le_bytes());
        }
        data.extend_from_slice(body_bytes);
        data
    }
}

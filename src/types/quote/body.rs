use zerocopy::AsBytes;

use crate::constants::{
    BODY_SGX_ENCLAVE_REPORT_TYPE, BODY_TD_REPORT10_TYPE, BODY_TD_REPORT15_TYPE,
};
use crate::types::report::{EnclaveReportBody, Td10ReportBody, Td15ReportBody};

/// Body of the Quote data structure.
///
/// For v3/v4 quotes the variant is implied by the TEE type; for v5 quotes it
/// is selected by the body descriptor.
#[derive(Clone, Copy, Debug)]
pub enum QuoteBody {
    EnclaveReport(EnclaveReportBody),
    TdReport10(Td10ReportBody),
    TdReport15(Td15ReportBody),
}

impl QuoteBody {
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Self::EnclaveReport(body) => body.as_bytes(),
            Self::TdReport10(body) => body.as_bytes(),
            Self::TdReport15(body) => body.as_bytes(),
        }
    }

    /// Body type value as carried by the v5 body descriptor.
    pub fn body_type(&self) -> u16 {
        match self {
            Self::EnclaveReport(_) => BODY_SGX_ENCLAVE_REPORT_TYPE,
            Self::TdReport10(_) => BODY_TD_REPORT10_TYPE,
            Self::TdReport15(_) => BODY_TD_REPORT15_TYPE,
        }
    }

    /// TEE TCB SVN of the report, zero for enclave report bodies.
    pub fn tee_tcb_svn(&self) -> [u8; 16] {
        match self {
            Self::EnclaveReport(_) => [0; 16],
            Self::TdReport10(body) => body.tee_tcb_svn,
            Self::TdReport15(body) => body.base.tee_tcb_svn,
        }
    }

    pub fn as_td10_report(&self) -> Option<&Td10ReportBody> {
        match self {
            Self::TdReport10(body) => Some(body),
            Self::TdReport15(body) => Some(&body.base),
            Self::EnclaveReport(_) => None,
        }
    }

    pub fn as_td15_report(&self) -> Option<&Td15ReportBody> {
        match self {
            Self::TdReport15(body) => Some(body),
            _ => None,
        }
    }
}

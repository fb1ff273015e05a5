use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::types::report::EnclaveReportBody;

/// Hex serde for the 32-bit MISCSELECT values, which the identity document
/// encodes as 8 big-endian hex characters.
mod u32_hex {
    use serde::Serializer;

    pub fn deserialize<'de, D>(deserializer: D) -> Result<u32, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let value: [u8; 4] = hex::deserialize(deserializer)?;
        Ok(u32::from_be_bytes(value))
    }

    pub fn serialize<S: Serializer>(value: &u32, serializer: S) -> Result<S::Ok, S::Error> {
        hex::serialize(value.to_be_bytes(), serializer)
    }
}

/// Identifier of the enclave the identity document was issued for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EnclaveType {
    /// Quoting Enclave
    #[serde(rename = "QE")]
    Qe,
    /// Quote Verification Enclave
    #[serde(rename = "QVE")]
    Qve,
    /// TDX Quoting Enclave
    #[serde(rename = "TD_QE")]
    TdQe,
}

/// Status of an enclave TCB level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String")]
pub enum QeTcbStatus {
    UpToDate,
    SWHardeningNeeded,
    ConfigurationNeeded,
    ConfigurationAndSWHardeningNeeded,
    OutOfDate,
    OutOfDateConfigurationNeeded,
    Revoked,
    /// A status string this implementation does not know.
    Unrecognized,
}

impl From<String> for QeTcbStatus {
    fn from(status: String) -> Self {
        match status.as_str() {
            "UpToDate" => QeTcbStatus::UpToDate,
            "SWHardeningNeeded" => QeTcbStatus::SWHardeningNeeded,
            "ConfigurationNeeded" => QeTcbStatus::ConfigurationNeeded,
            "ConfigurationAndSWHardeningNeeded" => QeTcbStatus::ConfigurationAndSWHardeningNeeded,
            "OutOfDate" => QeTcbStatus::OutOfDate,
            "OutOfDateConfigurationNeeded" => QeTcbStatus::OutOfDateConfigurationNeeded,
            "Revoked" => QeTcbStatus::Revoked,
            _ => QeTcbStatus::Unrecognized,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QeTcb {
    pub isvsvn: u16,
}

/// Enclave TCB level, keyed by the enclave's ISVSVN.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QeTcbLevel {
    pub tcb: QeTcb,
    pub tcb_date: chrono::DateTime<Utc>,
    pub tcb_status: QeTcbStatus,
    #[serde(rename = "advisoryIDs", skip_serializing_if = "Option::is_none")]
    pub advisory_ids: Option<Vec<String>>,
}

/// Outcome of comparing a QE report against an enclave identity document.
///
/// The mismatch variants terminate verification; the ISVSVN variants are
/// forwarded into the status convergence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QeReportStatus {
    Ok,
    MiscselectMismatch,
    AttributesMismatch,
    MrSignerMismatch,
    IsvProdIdMismatch,
    IsvSvnOutOfDate,
    IsvSvnRevoked,
    IsvSvnNotSupported,
}

/// Enclave identity document, version 2.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnclaveIdentity {
    /// Identifier of the SGX enclave issued by Intel.
    pub id: EnclaveType,

    /// Version of the structure.
    pub version: u16,

    pub issue_date: chrono::DateTime<Utc>,
    pub next_update: chrono::DateTime<Utc>,

    pub tcb_evaluation_data_number: u16,

    /// miscselect "golden" value (upon applying the mask).
    #[serde(with = "u32_hex")]
    pub miscselect: u32,

    /// Mask applied to the miscselect value retrieved from the platform.
    #[serde(with = "u32_hex")]
    pub miscselect_mask: u32,

    /// attributes "golden" value (upon applying the mask).
    #[serde(with = "hex")]
    pub attributes: [u8; 16],

    /// Mask applied to the attributes value retrieved from the platform.
    #[serde(with = "hex")]
    pub attributes_mask: [u8; 16],

    /// Expected enclave signer measurement; may be empty, in which case the
    /// signer is not pinned.
    #[serde(with = "hex")]
    pub mrsigner: Vec<u8>,

    /// Enclave product ID.
    pub isvprodid: u16,

    /// Supported enclave TCB levels, kept sorted descending by ISVSVN.
    pub tcb_levels: Vec<QeTcbLevel>,
}

impl EnclaveIdentity {
    /// Compare a QE report against this identity.
    ///
    /// The checks run in document order; the first failing one names the
    /// result.
    pub fn verify_report(&self, report: &EnclaveReportBody) -> QeReportStatus {
        if (report.misc_select.get() & self.miscselect_mask) != self.miscselect {
            log::warn!(
                "QE report miscselect {:#010x} does not match identity",
                report.misc_select.get()
            );
            return QeReportStatus::MiscselectMismatch;
        }

        let attributes_match = report
            .attributes
            .iter()
            .zip(self.attributes_mask.iter())
            .map(|(attribute, mask)| attribute & mask)
            .eq(self.attributes.iter().copied());
        if !attributes_match {
            log::warn!("QE report attributes do not match identity");
            return QeReportStatus::AttributesMismatch;
        }

        if !self.mrsigner.is_empty() && self.mrsigner != report.mr_signer {
            log::warn!(
                "QE report mrsigner {} does not match identity {}",
                hex::encode(report.mr_signer),
                hex::encode(&self.mrsigner)
            );
            return QeReportStatus::MrSignerMismatch;
        }

        if report.isv_prod_id.get() != self.isvprodid {
            log::warn!(
                "QE report isvprodid {} does not match identity {}",
                report.isv_prod_id.get(),
                self.isvprodid
            );
            return QeReportStatus::IsvProdIdMismatch;
        }

        match self.tcb_status(report.isv_svn.get()) {
            None => QeReportStatus::IsvSvnNotSupported,
            Some(QeTcbStatus::UpToDate) => QeReportStatus::Ok,
            Some(QeTcbStatus::Revoked) => QeReportStatus::IsvSvnRevoked,
            Some(_) => QeReportStatus::IsvSvnOutOfDate,
        }
    }

    /// Status of the highest TCB level with an ISVSVN not above the
    /// report's.
    fn tcb_status(&self, isv_svn: u16) -> Option<QeTcbStatus> {
        self.tcb_levels
            .iter()
            .find(|level| level.tcb.isvsvn <= isv_svn)
            .map(|level| level.tcb_status)
    }
}

impl std::str::FromStr for EnclaveIdentity {
    type Err = anyhow::Error;

    fn from_str(json: &str) -> anyhow::Result<Self> {
        let mut identity: EnclaveIdentity = serde_json::from_str(json)?;
        identity
            .tcb_levels
            .sort_by(|a, b| b.tcb.isvsvn.cmp(&a.tcb.isvsvn));
        Ok(identity)
    }
}

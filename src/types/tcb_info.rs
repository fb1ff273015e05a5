use std::cmp::Ordering;

use anyhow::bail;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::constants::{CPUSVN_LEN, QUOTE_V3, TDX_TEE_TYPE};
use crate::status::VerificationStatus;
use crate::types::enclave_identity::QeReportStatus;
use crate::types::quote::QuoteBody;
use crate::types::sgx_x509::PckTcb;

/// Identifier of the TEE a TCB info document describes. Documents before
/// version 3 carry no id and implicitly describe SGX.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TcbInfoId {
    #[serde(rename = "SGX")]
    Sgx,
    #[serde(rename = "TDX")]
    Tdx,
}

/// Status of a platform TCB level as asserted by the TCB info document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String")]
pub enum TcbStatus {
    UpToDate,
    OutOfDate,
    ConfigurationNeeded,
    SWHardeningNeeded,
    ConfigurationAndSWHardeningNeeded,
    OutOfDateConfigurationNeeded,
    Revoked,
    /// A status string this implementation does not know. Never silently
    /// accepted; converges to TCB_UNRECOGNIZED_STATUS.
    Unrecognized,
}

impl From<String> for TcbStatus {
    fn from(status: String) -> Self {
        match status.as_str() {
            "UpToDate" => TcbStatus::UpToDate,
            "OutOfDate" => TcbStatus::OutOfDate,
            "ConfigurationNeeded" => TcbStatus::ConfigurationNeeded,
            "SWHardeningNeeded" => TcbStatus::SWHardeningNeeded,
            "ConfigurationAndSWHardeningNeeded" => TcbStatus::ConfigurationAndSWHardeningNeeded,
            "OutOfDateConfigurationNeeded" => TcbStatus::OutOfDateConfigurationNeeded,
            "Revoked" => TcbStatus::Revoked,
            _ => TcbStatus::Unrecognized,
        }
    }
}

impl TcbStatus {
    pub fn to_verification_status(self) -> VerificationStatus {
        match self {
            TcbStatus::UpToDate => VerificationStatus::Ok,
            TcbStatus::OutOfDate => VerificationStatus::TcbOutOfDate,
            TcbStatus::ConfigurationNeeded => VerificationStatus::TcbConfigurationNeeded,
            TcbStatus::SWHardeningNeeded => VerificationStatus::TcbSwHardeningNeeded,
            TcbStatus::ConfigurationAndSWHardeningNeeded => {
                VerificationStatus::TcbConfigurationAndSwHardeningNeeded
            }
            TcbStatus::OutOfDateConfigurationNeeded => {
                VerificationStatus::TcbOutOfDateConfigurationNeeded
            }
            TcbStatus::Revoked => VerificationStatus::TcbRevoked,
            TcbStatus::Unrecognized => VerificationStatus::TcbUnrecognizedStatus,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TcbComponent {
    pub svn: u8,
}

/// TCB of a platform TCB level. The PCS v3 API (TCB info v2) encodes the
/// sixteen SGX components as flat fields, the v4 API (TCB info v3) as
/// component arrays with an optional TDX counterpart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Tcb {
    V2(TcbV2),
    V3(TcbV3),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TcbV2 {
    sgxtcbcomp01svn: u8,
    sgxtcbcomp02svn: u8,
    sgxtcbcomp03svn: u8,
    sgxtcbcomp04svn: u8,
    sgxtcbcomp05svn: u8,
    sgxtcbcomp06svn: u8,
    sgxtcbcomp07svn: u8,
    sgxtcbcomp08svn: u8,
    sgxtcbcomp09svn: u8,
    sgxtcbcomp10svn: u8,
    sgxtcbcomp11svn: u8,
    sgxtcbcomp12svn: u8,
    sgxtcbcomp13svn: u8,
    sgxtcbcomp14svn: u8,
    sgxtcbcomp15svn: u8,
    sgxtcbcomp16svn: u8,
    pcesvn: u16,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TcbV3 {
    sgxtcbcomponents: [TcbComponent; 16],
    #[serde(skip_serializing_if = "Option::is_none")]
    tdxtcbcomponents: Option<[TcbComponent; 16]>,
    pcesvn: u16,
}

impl Tcb {
    pub fn pcesvn(&self) -> u16 {
        match self {
            Self::V2(v2) => v2.pcesvn,
            Self::V3(v3) => v3.pcesvn,
        }
    }

    pub fn sgx_tcb_components(&self) -> [u8; 16] {
        match self {
            Self::V2(v2) => [
                v2.sgxtcbcomp01svn,
                v2.sgxtcbcomp02svn,
                v2.sgxtcbcomp03svn,
                v2.sgxtcbcomp04svn,
                v2.sgxtcbcomp05svn,
                v2.sgxtcbcomp06svn,
                v2.sgxtcbcomp07svn,
                v2.sgxtcbcomp08svn,
                v2.sgxtcbcomp09svn,
                v2.sgxtcbcomp10svn,
                v2.sgxtcbcomp11svn,
                v2.sgxtcbcomp12svn,
                v2.sgxtcbcomp13svn,
                v2.sgxtcbcomp14svn,
                v2.sgxtcbcomp15svn,
                v2.sgxtcbcomp16svn,
            ],
            Self::V3(v3) => v3.sgxtcbcomponents.map(|comp| comp.svn),
        }
    }

    pub fn tdx_tcb_components(&self) -> Option<[u8; 16]> {
        match self {
            Self::V2(_) => None,
            Self::V3(v3) => v3.tdxtcbcomponents.map(|components| components.map(|comp| comp.svn)),
        }
    }
}

/// One platform TCB level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TcbLevel {
    pub tcb: Tcb,
    pub tcb_date: chrono::DateTime<Utc>,
    pub tcb_status: TcbStatus,
    #[serde(rename = "advisoryIDs", skip_serializing_if = "Option::is_none")]
    pub advisory_ids: Option<Vec<String>>,
}

impl TcbLevel {
    fn tdx_component(&self, index: usize) -> Option<u8> {
        self.tcb.tdx_tcb_components().map(|components| components[index])
    }
}

/// Default TDX module referenced when the quote does not assert a module
/// version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TdxModule {
    #[serde(with = "hex", rename = "mrsigner")]
    pub mrsigner: [u8; 48],
    #[serde(with = "hex")]
    pub attributes: [u8; 8],
    #[serde(with = "hex")]
    pub attributes_mask: [u8; 8],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TdxModuleTcb {
    pub isvsvn: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TdxModuleTcbLevel {
    pub tcb: TdxModuleTcb,
    pub tcb_date: chrono::DateTime<Utc>,
    pub tcb_status: TcbStatus,
    #[serde(rename = "advisoryIDs", skip_serializing_if = "Option::is_none")]
    pub advisory_ids: Option<Vec<String>>,
}

/// Identity of one TDX module version. The id has the form `TDX_XX` where
/// `XX` is the hex encoding of the module version byte.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TdxModuleIdentity {
    pub id: String,
    #[serde(with = "hex", rename = "mrsigner")]
    pub mrsigner: [u8; 48],
    #[serde(with = "hex")]
    pub attributes: [u8; 8],
    #[serde(with = "hex")]
    pub attributes_mask: [u8; 8],
    /// Module TCB levels, kept sorted descending by ISVSVN.
    pub tcb_levels: Vec<TdxModuleTcbLevel>,
}

/// TCB info document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TcbInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<TcbInfoId>,
    version: u16,
    pub issue_date: chrono::DateTime<Utc>,
    pub next_update: chrono::DateTime<Utc>,
    #[serde(with = "hex")]
    pub fmspc: [u8; 6],
    #[serde(with = "hex")]
    pub pce_id: [u8; 2],
    tcb_type: u16,
    pub tcb_evaluation_data_number: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    tdx_module: Option<TdxModule>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tdx_module_identities: Option<Vec<TdxModuleIdentity>>,
    tcb_levels: Vec<TcbLevel>,
}

impl std::str::FromStr for TcbInfo {
    type Err = anyhow::Error;

    fn from_str(json: &str) -> anyhow::Result<Self> {
        let mut tcb_info: TcbInfo = serde_json::from_str(json)?;

        if tcb_info.version < 2 {
            bail!("unsupported TCB info version {}", tcb_info.version);
        }
        if tcb_info.id == Some(TcbInfoId::Tdx) && tcb_info.version < 3 {
            bail!("TDX TCB info requires version 3, got {}", tcb_info.version);
        }

        // tcb_type determines how to compare TCB levels; only 0 is defined.
        if tcb_info.tcb_type != 0 {
            bail!("unsupported TCB type {}", tcb_info.tcb_type);
        }

        // The level sets are iterated in descending order only; order them
        // once here instead of trusting the document.
        tcb_info.tcb_levels.sort_by(descending_by_tcb);
        if let Some(identities) = &mut tcb_info.tdx_module_identities {
            for identity in identities {
                identity
                    .tcb_levels
                    .sort_by(|a, b| b.tcb.isvsvn.cmp(&a.tcb.isvsvn));
            }
        }

        Ok(tcb_info)
    }
}

/// Descending composite ordering over (SGX components, TDX components,
/// PCE SVN).
fn descending_by_tcb(a: &TcbLevel, b: &TcbLevel) -> Ordering {
    let tdx = |level: &TcbLevel| level.tcb.tdx_tcb_components().unwrap_or([0; 16]);
    b.tcb
        .sgx_tcb_components()
        .cmp(&a.tcb.sgx_tcb_components())
        .then_with(|| tdx(b).cmp(&tdx(a)))
        .then_with(|| b.tcb.pcesvn().cmp(&a.tcb.pcesvn()))
}

/// The PCK CPUSVN is considered lower if *any* of its components is lower;
/// equal-or-higher requires *every* component to be equal or higher.
fn is_cpu_svn_higher_or_equal(pck_tcb: &PckTcb, tcb_level: &TcbLevel) -> bool {
    let components = tcb_level.tcb.sgx_tcb_components();
    pck_tcb
        .compsvn
        .iter()
        .zip(components.iter())
        .all(|(pck, level)| pck >= level)
}

/// TDX TCB comparison. When the quote asserts a TDX module version
/// (byte 1 non-zero) the first two components belong to the module and are
/// checked by the TDX module check instead, so the comparison starts at
/// index 2.
fn is_tdx_tcb_higher_or_equal(tee_tcb_svn: &[u8; 16], tcb_level: &TcbLevel) -> bool {
    let components = match tcb_level.tcb.tdx_tcb_components() {
        Some(components) => components,
        None => return false,
    };
    let start = if tee_tcb_svn[1] > 0 { 2 } else { 0 };
    (start..CPUSVN_LEN).all(|index| tee_tcb_svn[index] >= components[index])
}

impl TcbInfo {
    pub fn id(&self) -> TcbInfoId {
        self.id.unwrap_or(TcbInfoId::Sgx)
    }

    pub fn version(&self) -> u16 {
        self.version
    }

    pub fn tdx_module(&self) -> Option<&TdxModule> {
        self.tdx_module.as_ref()
    }

    pub fn tdx_module_identities(&self) -> Option<&[TdxModuleIdentity]> {
        self.tdx_module_identities.as_deref()
    }

    pub fn tcb_levels(&self) -> &[TcbLevel] {
        &self.tcb_levels
    }

    /// Select the applicable SGX and TDX TCB levels for a platform TCB and
    /// an optional TEE TCB SVN.
    ///
    /// The SGX level is the highest-ranked level matching the PCK
    /// components and PCE SVN; the TDX level is the highest-ranked level
    /// that additionally satisfies the TEE TCB SVN. Without a TEE TCB SVN
    /// (SGX quotes, TCB info v2) the first SGX match is returned alone.
    pub fn match_tcb_levels(
        &self,
        pck_tcb: &PckTcb,
        tee_tcb_svn: Option<&[u8; 16]>,
    ) -> (Option<&TcbLevel>, Option<&TcbLevel>) {
        let mut sgx_tcb_level = None;

        for tcb_level in &self.tcb_levels {
            if !is_cpu_svn_higher_or_equal(pck_tcb, tcb_level)
                || pck_tcb.pcesvn < tcb_level.tcb.pcesvn()
            {
                continue;
            }

            let tee_tcb_svn = match tee_tcb_svn {
                Some(svn) => svn,
                None => return (Some(tcb_level), None),
            };

            if sgx_tcb_level.is_none() {
                log::debug!(
                    "selected SGX TCB level with status {:?}",
                    tcb_level.tcb_status
                );
                sgx_tcb_level = Some(tcb_level);
            }

            if is_tdx_tcb_higher_or_equal(tee_tcb_svn, tcb_level) {
                log::debug!(
                    "selected TDX TCB level with status {:?}",
                    tcb_level.tcb_status
                );
                return (sgx_tcb_level, Some(tcb_level));
            }
        }

        (sgx_tcb_level, None)
    }

    /// Resolve a TDX module identity by module version byte. Identity ids
    /// may be upper or lower case.
    pub fn find_tdx_module_identity(&self, module_version: u8) -> Option<&TdxModuleIdentity> {
        let id = format!("TDX_{module_version:02X}");
        self.tdx_module_identities
            .as_deref()
            .unwrap_or(&[])
            .iter()
            .find(|identity| identity.id.eq_ignore_ascii_case(&id))
    }

    /// Resolve the TDX module identity asserted by the quote and derive the
    /// module TCB status from its ISVSVN.
    pub fn tdx_module_tcb_status(
        &self,
        quote_version: u16,
        tee_tcb_svn: &[u8; 16],
    ) -> (VerificationStatus, Option<&TdxModuleIdentity>) {
        let module_isv_svn = tee_tcb_svn[0];
        let module_version = tee_tcb_svn[1];

        // Newer quote formats report version 0 when no relocatable module
        // is present; there is nothing to check then.
        if quote_version > QUOTE_V3 && module_version == 0 {
            return (VerificationStatus::Ok, None);
        }

        let identity = match self.find_tdx_module_identity(module_version) {
            Some(identity) => identity,
            None => {
                log::warn!("no TDX module identity matches version {module_version}");
                return (VerificationStatus::TdxModuleMismatch, None);
            }
        };

        let tcb_level = identity
            .tcb_levels
            .iter()
            .find(|level| level.tcb.isvsvn <= module_isv_svn);
        let tcb_level = match tcb_level {
            Some(level) => level,
            None => {
                log::warn!("no TDX module TCB level matches ISVSVN {module_isv_svn}");
                return (VerificationStatus::TcbNotSupported, Some(identity));
            }
        };

        let status = match tcb_level.tcb_status {
            TcbStatus::UpToDate => VerificationStatus::Ok,
            TcbStatus::OutOfDate => VerificationStatus::TcbOutOfDate,
            TcbStatus::Revoked => VerificationStatus::TcbRevoked,
            _ => VerificationStatus::TcbUnrecognizedStatus,
        };
        (status, Some(identity))
    }

    /// Fold the platform TCB level status with the TDX module status.
    pub fn converge_tcb_status_with_tdx_module_status(
        tcb_level_status: VerificationStatus,
        tdx_module_status: VerificationStatus,
    ) -> VerificationStatus {
        if tdx_module_status == VerificationStatus::TcbOutOfDate {
            if tcb_level_status == VerificationStatus::Ok
                || tcb_level_status == VerificationStatus::TcbSwHardeningNeeded
            {
                return VerificationStatus::TcbOutOfDate;
            }
            if tcb_level_status == VerificationStatus::TcbConfigurationNeeded
                || tcb_level_status == VerificationStatus::TcbConfigurationAndSwHardeningNeeded
            {
                return VerificationStatus::TcbOutOfDateConfigurationNeeded;
            }
        }
        if tdx_module_status == VerificationStatus::TcbRevoked {
            return VerificationStatus::TcbRevoked;
        }

        match tcb_level_status {
            VerificationStatus::TcbOutOfDate
            | VerificationStatus::TcbRevoked
            | VerificationStatus::TcbConfigurationNeeded
            | VerificationStatus::TcbOutOfDateConfigurationNeeded
            | VerificationStatus::TcbSwHardeningNeeded
            | VerificationStatus::TcbConfigurationAndSwHardeningNeeded
            | VerificationStatus::Ok => tcb_level_status,
            _ => VerificationStatus::TcbUnrecognizedStatus,
        }
    }

    /// Fold a TCB level status with the QE identity status.
    pub fn converge_tcb_status_with_qe_tcb_status(
        tcb_level_status: VerificationStatus,
        qe_tcb_status: QeReportStatus,
    ) -> VerificationStatus {
        if qe_tcb_status == QeReportStatus::IsvSvnOutOfDate {
            if tcb_level_status == VerificationStatus::Ok
                || tcb_level_status == VerificationStatus::TcbSwHardeningNeeded
            {
                return VerificationStatus::TcbOutOfDate;
            }
            if tcb_level_status == VerificationStatus::TcbConfigurationNeeded
                || tcb_level_status == VerificationStatus::TcbConfigurationAndSwHardeningNeeded
            {
                return VerificationStatus::TcbOutOfDateConfigurationNeeded;
            }
        }
        if qe_tcb_status == QeReportStatus::IsvSvnRevoked {
            return VerificationStatus::TcbRevoked;
        } else if qe_tcb_status == QeReportStatus::IsvSvnNotSupported {
            return VerificationStatus::TcbNotSupported;
        }

        match tcb_level_status {
            VerificationStatus::TcbTdRelaunchAdvised
            | VerificationStatus::TcbTdRelaunchAdvisedConfigurationNeeded
            | VerificationStatus::TcbOutOfDate
            | VerificationStatus::TcbRevoked
            | VerificationStatus::TcbConfigurationNeeded
            | VerificationStatus::TcbOutOfDateConfigurationNeeded
            | VerificationStatus::TcbSwHardeningNeeded
            | VerificationStatus::TcbConfigurationAndSwHardeningNeeded
            | VerificationStatus::TcbNotSupported
            | VerificationStatus::Ok => tcb_level_status,
            _ => VerificationStatus::TcbUnrecognizedStatus,
        }
    }

    /// Decide whether relaunching the TD on the currently installed TDX
    /// stack would lift the TCB status, based on the post-relaunch TCB SVN
    /// of a TD 1.5 report.
    ///
    /// `tee_tcb_svn2[0]` is the post-relaunch module ISVSVN (or TDX
    /// component 0 when no module version is asserted), `[1]` the
    /// post-relaunch module version and `[2]` the post-relaunch TDX
    /// component 2 SVN; no other index is consulted.
    pub fn advise_td_relaunch(
        &self,
        tee_tcb_svn2: &[u8; 16],
        sgx_tcb_status: VerificationStatus,
        tdx_tcb_status: VerificationStatus,
        tdx_module_tcb_status: VerificationStatus,
        qe_tcb_status: Option<QeReportStatus>,
    ) -> VerificationStatus {
        let qe_trusted = match qe_tcb_status {
            None => true,
            Some(status) => !matches!(
                status,
                QeReportStatus::IsvSvnOutOfDate
                    | QeReportStatus::IsvSvnRevoked
                    | QeReportStatus::IsvSvnNotSupported
            ),
        };
        if !qe_trusted {
            return tdx_tcb_status;
        }

        if !matches!(
            sgx_tcb_status,
            VerificationStatus::Ok
                | VerificationStatus::TcbSwHardeningNeeded
                | VerificationStatus::TcbConfigurationNeeded
                | VerificationStatus::TcbConfigurationAndSwHardeningNeeded
        ) {
            return tdx_tcb_status;
        }

        if !matches!(
            tdx_tcb_status,
            VerificationStatus::TcbOutOfDate | VerificationStatus::TcbOutOfDateConfigurationNeeded
        ) {
            return tdx_tcb_status;
        }

        if tdx_module_tcb_status != VerificationStatus::TcbOutOfDate {
            return tdx_tcb_status;
        }

        let latest_tcb_level = match self.tcb_levels.first() {
            Some(level) => level,
            None => {
                log::warn!("no TDX TCB level available for relaunch evaluation");
                return VerificationStatus::TcbNotSupported;
            }
        };

        let satisfies_latest = if tee_tcb_svn2[1] == 0 {
            latest_tcb_level
                .tdx_component(0)
                .map_or(false, |svn| tee_tcb_svn2[0] >= svn)
                && latest_tcb_level
                    .tdx_component(2)
                    .map_or(false, |svn| tee_tcb_svn2[2] >= svn)
        } else {
            let identity = match self.find_tdx_module_identity(tee_tcb_svn2[1]) {
                Some(identity) => identity,
                None => return VerificationStatus::TdxModuleMismatch,
            };
            let latest_module_level = match identity.tcb_levels.first() {
                Some(level) => level,
                None => {
                    log::warn!("no TDX module TCB level available for relaunch evaluation");
                    return VerificationStatus::TcbNotSupported;
                }
            };
            tee_tcb_svn2[0] >= latest_module_level.tcb.isvsvn
                && latest_tcb_level
                    .tdx_component(2)
                    .map_or(false, |svn| tee_tcb_svn2[2] >= svn)
        };

        if satisfies_latest {
            log::debug!("TD relaunch would restore the latest TCB level");
            if sgx_tcb_status.is_configuration_needed() || tdx_tcb_status.is_configuration_needed()
            {
                VerificationStatus::TcbTdRelaunchAdvisedConfigurationNeeded
            } else {
                VerificationStatus::TcbTdRelaunchAdvised
            }
        } else {
            tdx_tcb_status
        }
    }

    /// Compute the final TCB status for a quote: level matching, the TDX
    /// module check, status convergence and for TD 1.5 reports the relaunch
    /// evaluation.
    pub fn check_tcb_level(
        &self,
        pck_tcb: &PckTcb,
        quote_version: u16,
        tee_type: u32,
        body: &QuoteBody,
        qe_tcb_status: Option<QeReportStatus>,
    ) -> VerificationStatus {
        let is_tdx =
            self.version >= 3 && self.id() == TcbInfoId::Tdx && tee_type == TDX_TEE_TYPE;

        let tee_tcb_svn = is_tdx.then(|| body.tee_tcb_svn());
        let (sgx_tcb_level, tdx_tcb_level) =
            self.match_tcb_levels(pck_tcb, tee_tcb_svn.as_ref());

        let sgx_tcb_level = match sgx_tcb_level {
            Some(level) => level,
            None => {
                log::warn!("no SGX TCB level matches the PCK TCB");
                return VerificationStatus::TcbNotSupported;
            }
        };

        let sgx_tcb_status = sgx_tcb_level.tcb_status.to_verification_status();
        if sgx_tcb_status == VerificationStatus::TcbRevoked {
            log::warn!("SGX TCB is revoked");
        }

        if !is_tdx {
            return match qe_tcb_status {
                Some(qe) => Self::converge_tcb_status_with_qe_tcb_status(sgx_tcb_status, qe),
                None => sgx_tcb_status,
            };
        }

        let tdx_tcb_level = match tdx_tcb_level {
            Some(level) => level,
            None => {
                log::warn!("no TDX TCB level matches the TEE TCB SVN");
                return VerificationStatus::TcbNotSupported;
            }
        };

        let (tdx_module_tcb_status, _) =
            self.tdx_module_tcb_status(quote_version, &body.tee_tcb_svn());
        if matches!(
            tdx_module_tcb_status,
            VerificationStatus::TcbNotSupported
                | VerificationStatus::TdxModuleMismatch
                | VerificationStatus::TcbUnrecognizedStatus
        ) {
            return tdx_module_tcb_status;
        }

        let mut tdx_tcb_status = Self::converge_tcb_status_with_tdx_module_status(
            tdx_tcb_level.tcb_status.to_verification_status(),
            tdx_module_tcb_status,
        );
        if tdx_tcb_status == VerificationStatus::TcbRevoked {
            log::warn!("TDX TCB is revoked");
            return tdx_tcb_status;
        }

        if let Some(td15) = body.as_td15_report() {
            tdx_tcb_status = self.advise_td_relaunch(
                &td15.tee_tcb_svn2,
                sgx_tcb_status,
                tdx_tcb_status,
                tdx_module_tcb_status,
                qe_tcb_status,
            );
        }

        match qe_tcb_status {
            Some(qe) => Self::converge_tcb_status_with_qe_tcb_status(tdx_tcb_status, qe),
            None => tdx_tcb_status,
        }
    }
}

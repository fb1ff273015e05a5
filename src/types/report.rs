use anyhow::bail;
use zerocopy::little_endian;

use crate::constants::{ENCLAVE_REPORT_LEN, TD10_REPORT_LEN, TD15_REPORT_LEN};

/// Report of an SGX enclave, embedded in SGX quote bodies and in the QE
/// report of every quote's signature data.
///
/// We use zerocopy for zero-copy parsing of the report from raw bytes. The
/// layout is `#[repr(C)]` with no padding, so the struct can be reinterpreted
/// from (and as) the 384-byte wire encoding directly.
#[derive(Clone, Copy, Debug, PartialEq, Eq, zerocopy::FromBytes, zerocopy::FromZeroes, zerocopy::AsBytes)]
#[repr(C)]
pub struct EnclaveReportBody {
    /// Security Version of the CPU (raw value).
    /// [16 bytes]
    pub cpu_svn: [u8; 16],

    /// SSA Frame extended feature set. Reports which SECS.MISCSELECT
    /// settings are used in the enclave.
    /// [4 bytes]
    pub misc_select: little_endian::U32,

    reserved_1: [u8; 28],

    /// Set of flags describing attributes of the enclave, from
    /// SECS.ATTRIBUTES.
    /// [16 bytes]
    pub attributes: [u8; 16],

    /// Measurement of the enclave.
    /// [32 bytes]
    pub mr_enclave: [u8; 32],

    reserved_2: [u8; 32],

    /// Measurement of the enclave signer.
    /// [32 bytes]
    pub mr_signer: [u8; 32],

    reserved_3: [u8; 96],

    /// Product ID of the enclave.
    /// [2 bytes]
    pub isv_prod_id: little_endian::U16,

    /// Security Version of the enclave.
    /// [2 bytes]
    pub isv_svn: little_endian::U16,

    reserved_4: [u8; 60],

    /// Additional report data. The enclave is free to provide 64 bytes of
    /// custom data; the quoting enclave uses it to bind the attestation key.
    /// [64 bytes]
    pub report_data: [u8; 64],
}

impl TryFrom<[u8; ENCLAVE_REPORT_LEN]> for EnclaveReportBody {
    type Error = anyhow::Error;

    fn try_from(bytes: [u8; ENCLAVE_REPORT_LEN]) -> anyhow::Result<Self> {
        match zerocopy::FromBytes::read_from(&bytes[..]) {
            Some(body) => Ok(body),
            None => bail!("incorrect enclave report size"),
        }
    }
}

// TEE_TCB_SVN:
// [0]      TDX Module ISVSVN (handled by the TDX Module check)
// [1]      TDX Module version (handled by the TDX Module check)
// [2..16]  compared against TCBInfo.tcbLevels.tcb.tdxtcbcomponents
//          (all 16 bytes are compared when byte 1 is zero)

/// Report of a TDX 1.0 trust domain (TDX v4 quotes, v5 body type 2).
#[derive(Clone, Copy, Debug, PartialEq, Eq, zerocopy::FromBytes, zerocopy::FromZeroes, zerocopy::AsBytes)]
#[repr(C)]
pub struct Td10ReportBody {
    /// Describes the TCB of the TDX stack that produced the report.
    /// [16 bytes]
    pub tee_tcb_svn: [u8; 16],

    /// Measurement of the TDX Module.
    /// [48 bytes]
    pub mr_seam: [u8; 48],

    /// Signer measurement of the TDX Module; zero for the Intel module.
    /// [48 bytes]
    pub mr_signer_seam: [u8; 48],

    /// Must be zero for TDX 1.0.
    /// [8 bytes]
    pub seam_attributes: [u8; 8],

    /// TD attributes.
    /// [8 bytes]
    pub td_attributes: [u8; 8],

    /// eXtended Features Available Mask, same format as XCR0.
    /// [8 bytes]
    pub xfam: [u8; 8],

    /// Measurement of the initial contents of the TD.
    /// [48 bytes]
    pub mr_td: [u8; 48],

    /// Software-defined ID for non-owner-defined TD configuration.
    /// [48 bytes]
    pub mr_config_id: [u8; 48],

    /// Software-defined ID for the TD's owner.
    /// [48 bytes]
    pub mr_owner: [u8; 48],

    /// Software-defined ID for owner-defined TD configuration.
    /// [48 bytes]
    pub mr_owner_config: [u8; 48],

    /// Runtime-extendable measurement registers.
    /// [48 bytes each]
    pub rt_mr0: [u8; 48],
    pub rt_mr1: [u8; 48],
    pub rt_mr2: [u8; 48],
    pub rt_mr3: [u8; 48],

    /// Additional report data, integrity-protected by the quote signature.
    /// [64 bytes]
    pub report_data: [u8; 64],
}

impl TryFrom<[u8; TD10_REPORT_LEN]> for Td10ReportBody {
    type Error = anyhow::Error;

    fn try_from(bytes: [u8; TD10_REPORT_LEN]) -> anyhow::Result<Self> {
        match zerocopy::FromBytes::read_from(&bytes[..]) {
            Some(body) => Ok(body),
            None => bail!("incorrect TD 1.0 report size"),
        }
    }
}

/// Report of a TDX 1.5 trust domain (v5 body type 3): the TDX 1.0 report
/// followed by the post-relaunch TCB SVN and the service TD measurement.
#[derive(Clone, Copy, Debug, PartialEq, Eq, zerocopy::FromBytes, zerocopy::FromZeroes, zerocopy::AsBytes)]
#[repr(C)]
pub struct Td15ReportBody {
    pub base: Td10ReportBody,

    /// TCB the TD would run at after a relaunch on the current platform.
    /// [16 bytes]
    pub tee_tcb_svn2: [u8; 16],

    /// Measurement of the migration service TD.
    /// [48 bytes]
    pub mr_service_td: [u8; 48],
}

impl TryFrom<[u8; TD15_REPORT_LEN]> for Td15ReportBody {
    type Error = anyhow::Error;

    fn try_from(bytes: [u8; TD15_REPORT_LEN]) -> anyhow::Result<Self> {
        match zerocopy::FromBytes::read_from(&bytes[..]) {
            Some(body) => Ok(body),
            None => bail!("incorrect TD 1.5 report size"),
        }
    }
}

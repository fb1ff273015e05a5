use anyhow::bail;
use zerocopy::little_endian;

use crate::constants::{
    ECDSA_256_WITH_P256_CURVE, HEADER_LEN, QUOTE_V3, QUOTE_V5, SGX_TEE_TYPE, TDX_TEE_TYPE,
};

/// Header of the Quote data structure, common to versions 3, 4 and 5.
#[derive(Clone, Copy, Debug, PartialEq, Eq, zerocopy::FromBytes, zerocopy::FromZeroes, zerocopy::AsBytes)]
#[repr(C)]
pub struct QuoteHeader {
    /// Version of the quote data structure - 3, 4 or 5.
    /// [2 bytes]
    pub version: little_endian::U16,

    /// Type of attestation key used by the quoting enclave.
    /// 2 (ECDSA-256-with-P-256 curve)
    /// 3 (ECDSA-384-with-P-384 curve)
    /// [2 bytes]
    pub attestation_key_type: little_endian::U16,

    /// TEE for this attestation.
    /// 0x00000000: SGX
    /// 0x00000081: TDX
    /// [4 bytes]
    pub tee_type: little_endian::U32,

    /// Security Version of the Quoting Enclave (reserved in v5).
    /// [2 bytes]
    pub qe_svn: [u8; 2],

    /// Security Version of the PCE (reserved in v5).
    /// [2 bytes]
    pub pce_svn: [u8; 2],

    /// Unique identifier of the QE vendor.
    /// Value: 939A7233F79C4CA9940A0DB3957F0607 (Intel SGX QE Vendor)
    /// [16 bytes]
    pub qe_vendor_id: [u8; 16],

    /// Custom user-defined data. For the Intel DCAP quote generation
    /// libraries the first 16 bytes contain a platform identifier.
    /// [20 bytes]
    pub user_data: [u8; 20],
}

impl TryFrom<[u8; HEADER_LEN]> for QuoteHeader {
    type Error = anyhow::Error;

    fn try_from(bytes: [u8; HEADER_LEN]) -> anyhow::Result<Self> {
        let header: QuoteHeader = match zerocopy::FromBytes::read_from(&bytes[..]) {
            Some(header) => header,
            None => bail!("incorrect quote header size"),
        };

        if !(QUOTE_V3..=QUOTE_V5).contains(&header.version.get()) {
            bail!("unsupported quote version {}", header.version.get());
        }

        if header.attestation_key_type.get() != ECDSA_256_WITH_P256_CURVE {
            bail!(
                "unsupported attestation key type {}",
                header.attestation_key_type.get()
            );
        }

        let tee_type = header.tee_type.get();
        if tee_type != SGX_TEE_TYPE && tee_type != TDX_TEE_TYPE {
            bail!("unknown TEE type {tee_type:#x}");
        }

        Ok(header)
    }
}

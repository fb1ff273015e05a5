// https://github.com/intel/SGX-TDX-DCAP-QuoteVerificationLibrary/blob/master/Src/AttestationLibrary/src/QuoteVerification/QuoteConstants.h

pub const SGX_TEE_TYPE: u32 = 0x00000000;
pub const TDX_TEE_TYPE: u32 = 0x00000081;

pub const QUOTE_V3: u16 = 3;
pub const QUOTE_V4: u16 = 4;
pub const QUOTE_V5: u16 = 5;

pub const ECDSA_256_WITH_P256_CURVE: u16 = 2;

/// Quote body types carried by the v5 body descriptor.
pub const BODY_SGX_ENCLAVE_REPORT_TYPE: u16 = 1;
pub const BODY_TD_REPORT10_TYPE: u16 = 2;
pub const BODY_TD_REPORT15_TYPE: u16 = 3;

pub const HEADER_LEN: usize = 48;
pub const BODY_DESCRIPTOR_LEN: usize = 6;

pub const ENCLAVE_REPORT_LEN: usize = 384;
pub const TD10_REPORT_LEN: usize = 584;
pub const TD15_REPORT_LEN: usize = 684;

pub const CPUSVN_LEN: usize = 16;

pub const INTEL_QE_VENDOR_ID: [u8; 16] = [
    0x93, 0x9A, 0x72, 0x33, 0xF7, 0x9C, 0x4C, 0xA9, 0x94, 0x0A, 0x0D, 0xB3, 0x95, 0x7F, 0x06, 0x07,
];

/// Phrase required in the Subject CN of a PCK leaf certificate.
pub const SGX_PCK_CN_PHRASE: &str = "SGX PCK Certificate";
/// Phrase required in the Issuer CN of a PCK CRL.
pub const PCK_CRL_CA_CN_PHRASE: &str = "CA";

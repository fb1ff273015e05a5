/// Final verdict of a quote verification.
///
/// Every failure mode is reported as one of these values; no error type
/// crosses the verification boundary. The discriminants are stable and may
/// be persisted by callers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum VerificationStatus {
    Ok = 0,
    TcbOutOfDate = 1,
    TcbOutOfDateConfigurationNeeded = 2,
    TcbSwHardeningNeeded = 3,
    TcbConfigurationNeeded = 4,
    TcbConfigurationAndSwHardeningNeeded = 5,
    TcbTdRelaunchAdvised = 6,
    TcbTdRelaunchAdvisedConfigurationNeeded = 7,
    TcbRevoked = 8,
    TcbNotSupported = 9,
    TcbUnrecognizedStatus = 10,
    TcbInfoMismatch = 11,
    TdxModuleMismatch = 12,
    QeIdentityMismatch = 13,
    InvalidPckCert = 14,
    InvalidPckCrl = 15,
    PckRevoked = 16,
    InvalidQeReportSignature = 17,
    InvalidQeReportData = 18,
    InvalidQuoteSignature = 19,
    UnsupportedQuoteFormat = 20,
    UnsupportedQeIdentityFormat = 21,
}

impl VerificationStatus {
    pub fn code(self) -> u16 {
        self as u16
    }

    /// Whether the status indicates that a platform configuration change is
    /// required to reach the reported TCB level.
    pub fn is_configuration_needed(self) -> bool {
        matches!(
            self,
            VerificationStatus::TcbConfigurationNeeded
                | VerificationStatus::TcbOutOfDateConfigurationNeeded
                | VerificationStatus::TcbConfigurationAndSwHardeningNeeded
                | VerificationStatus::TcbTdRelaunchAdvisedConfigurationNeeded
        )
    }
}

impl std::fmt::Display for VerificationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            VerificationStatus::Ok => "OK",
            VerificationStatus::TcbOutOfDate => "TCB_OUT_OF_DATE",
            VerificationStatus::TcbOutOfDateConfigurationNeeded => {
                "TCB_OUT_OF_DATE_CONFIGURATION_NEEDED"
            }
            VerificationStatus::TcbSwHardeningNeeded => "TCB_SW_HARDENING_NEEDED",
            VerificationStatus::TcbConfigurationNeeded => "TCB_CONFIGURATION_NEEDED",
            VerificationStatus::TcbConfigurationAndSwHardeningNeeded => {
                "TCB_CONFIGURATION_AND_SW_HARDENING_NEEDED"
            }
            VerificationStatus::TcbTdRelaunchAdvised => "TCB_TD_RELAUNCH_ADVISED",
            VerificationStatus::TcbTdRelaunchAdvisedConfigurationNeeded => {
                "TCB_TD_RELAUNCH_ADVISED_CONFIGURATION_NEEDED"
            }
            VerificationStatus::TcbRevoked => "TCB_REVOKED",
            VerificationStatus::TcbNotSupported => "TCB_NOT_SUPPORTED",
            VerificationStatus::TcbUnrecognizedStatus => "TCB_UNRECOGNIZED_STATUS",
            VerificationStatus::TcbInfoMismatch => "TCB_INFO_MISMATCH",
            VerificationStatus::TdxModuleMismatch => "TDX_MODULE_MISMATCH",
            VerificationStatus::QeIdentityMismatch => "QE_IDENTITY_MISMATCH",
            VerificationStatus::InvalidPckCert => "INVALID_PCK_CERT",
            VerificationStatus::InvalidPckCrl => "INVALID_PCK_CRL",
            VerificationStatus::PckRevoked => "PCK_REVOKED",
            VerificationStatus::InvalidQeReportSignature => "INVALID_QE_REPORT_SIGNATURE",
            VerificationStatus::InvalidQeReportData => "INVALID_QE_REPORT_DATA",
            VerificationStatus::InvalidQuoteSignature => "INVALID_QUOTE_SIGNATURE",
            VerificationStatus::UnsupportedQuoteFormat => "UNSUPPORTED_QUOTE_FORMAT",
            VerificationStatus::UnsupportedQeIdentityFormat => "UNSUPPORTED_QE_IDENTITY_FORMAT",
        };
        write!(f, "{name}")
    }
}

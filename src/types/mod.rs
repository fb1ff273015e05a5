pub mod cert;
pub mod enclave_identity;
pub mod quote;
pub mod report;
pub mod sgx_x509;
pub mod tcb_info;

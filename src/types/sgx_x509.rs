use anyhow::{anyhow, bail, Context};
use x509_parser::oid_registry::asn1_rs::{
    Boolean, Enumerated, FromDer, Integer, OctetString, Oid, Sequence,
};

use crate::constants::CPUSVN_LEN;

/// OID of the SGX extension carried by PCK leaf certificates.
pub const SGX_EXTENSIONS_OID: &str = "1.2.840.113741.1.13.1";

/// Platform TCB asserted by a PCK certificate: the 16 decomposed SGX TCB
/// component SVNs, the PCE SVN and the raw CPUSVN.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PckTcb {
    pub compsvn: [u8; CPUSVN_LEN],
    pub pcesvn: u16,
    pub cpusvn: [u8; CPUSVN_LEN],
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PckPlatformConfiguration {
    pub dynamic_platform: Option<bool>,
    pub cached_keys: Option<bool>,
    pub smt_enabled: Option<bool>,
}

/// Decoded SGX extension of a PCK certificate.
///
/// https://download.01.org/intel-sgx/sgx-dcap/1.20/linux/docs/SGX_PCK_Certificate_CRL_Spec-1.4.pdf
///
/// SGX Extensions       | 1.2.840.113741.1.13.1      | mandatory | ASN.1 Sequence
/// PPID                 | 1.2.840.113741.1.13.1.1    | mandatory | ASN.1 Octet String
/// TCB                  | 1.2.840.113741.1.13.1.2    | mandatory | ASN.1 Sequence
/// SGX TCB Comp01 SVN   | 1.2.840.113741.1.13.1.2.1  | mandatory | ASN.1 Integer
/// ...
/// SGX TCB Comp16 SVN   | 1.2.840.113741.1.13.1.2.16 | mandatory | ASN.1 Integer
/// PCESVN               | 1.2.840.113741.1.13.1.2.17 | mandatory | ASN.1 Integer
/// CPUSVN               | 1.2.840.113741.1.13.1.2.18 | mandatory | ASN.1 Octet String
/// PCE-ID               | 1.2.840.113741.1.13.1.3    | mandatory | ASN.1 Octet String
/// FMSPC                | 1.2.840.113741.1.13.1.4    | mandatory | ASN.1 Octet String
/// SGX Type             | 1.2.840.113741.1.13.1.5    | mandatory | ASN.1 Enumerated
/// Platform Instance ID | 1.2.840.113741.1.13.1.6    | optional  | ASN.1 Octet String
/// Configuration        | 1.2.840.113741.1.13.1.7    | optional  | ASN.1 Sequence
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SgxPckExtension {
    pub ppid: [u8; 16],
    pub tcb: PckTcb,
    pub pceid: [u8; 2],
    pub fmspc: [u8; 6],
    pub sgx_type: u32,
    pub platform_instance_id: Option<[u8; 16]>,
    pub configuration: Option<PckPlatformConfiguration>,
}

impl SgxPckExtension {
    pub fn is_pck_ext(oid: &str) -> bool {
        oid == SGX_EXTENSIONS_OID
    }

    /// Decode the extension from the contents of the extension value octet
    /// string.
    pub fn from_der(bytes: &[u8]) -> anyhow::Result<Self> {
        let (_, sgx_extensions) =
            Sequence::from_der(bytes).map_err(|e| anyhow!("SGX extension sequence: {e:?}"))?;

        let mut ppid = None;
        let mut tcb = None;
        let mut pceid = None;
        let mut fmspc = None;
        let mut sgx_type = None;
        let mut platform_instance_id = None;
        let mut configuration = None;

        let mut i = sgx_extensions.content.as_ref();
        while !i.is_empty() {
            let (j, current_sequence) =
                Sequence::from_der(i).map_err(|e| anyhow!("SGX extension entry: {e:?}"))?;
            i = j;
            let (value, current_oid) = Oid::from_der(current_sequence.content.as_ref())
                .map_err(|e| anyhow!("SGX extension entry OID: {e:?}"))?;

            match current_oid.to_id_string().as_str() {
                "1.2.840.113741.1.13.1.1" => {
                    ppid = Some(octet_string_array::<16>(value).context("PPID")?);
                }
                "1.2.840.113741.1.13.1.2" => {
                    tcb = Some(parse_tcb(value)?);
                }
                "1.2.840.113741.1.13.1.3" => {
                    pceid = Some(octet_string_array::<2>(value).context("PCE-ID")?);
                }
                "1.2.840.113741.1.13.1.4" => {
                    fmspc = Some(octet_string_array::<6>(value).context("FMSPC")?);
                }
                "1.2.840.113741.1.13.1.5" => {
                    let (_, sgx_type_enum) = Enumerated::from_der(value)
                        .map_err(|e| anyhow!("SGX type: {e:?}"))?;
                    sgx_type = Some(sgx_type_enum.0);
                }
                "1.2.840.113741.1.13.1.6" => {
                    platform_instance_id =
                        Some(octet_string_array::<16>(value).context("platform instance id")?);
                }
                "1.2.840.113741.1.13.1.7" => {
                    configuration = Some(parse_configuration(value)?);
                }
                other => bail!("unknown OID {other} in SGX extension"),
            }
        }

        Ok(SgxPckExtension {
            ppid: ppid.ok_or_else(|| anyhow!("missing PPID in SGX extension"))?,
            tcb: tcb.ok_or_else(|| anyhow!("missing TCB in SGX extension"))?,
            pceid: pceid.ok_or_else(|| anyhow!("missing PCE-ID in SGX extension"))?,
            fmspc: fmspc.ok_or_else(|| anyhow!("missing FMSPC in SGX extension"))?,
            sgx_type: sgx_type.ok_or_else(|| anyhow!("missing SGX type in SGX extension"))?,
            platform_instance_id,
            configuration,
        })
    }
}

fn parse_tcb(value: &[u8]) -> anyhow::Result<PckTcb> {
    let (_, tcb_sequence) =
        Sequence::from_der(value).map_err(|e| anyhow!("TCB sequence: {e:?}"))?;

    let mut compsvn = [0u8; CPUSVN_LEN];
    let mut k = tcb_sequence.content.as_ref();
    for (index, comp) in compsvn.iter_mut().enumerate() {
        let oid = format!("1.2.840.113741.1.13.1.2.{}", index + 1);
        let (rest, svn) = get_asn1_uint64(k, &oid)?;
        *comp = u8::try_from(svn).map_err(|_| anyhow!("TCB component {} out of range", index + 1))?;
        k = rest;
    }

    let (k, pcesvn) = get_asn1_uint64(k, "1.2.840.113741.1.13.1.2.17")?;
    let pcesvn = u16::try_from(pcesvn).map_err(|_| anyhow!("PCESVN out of range"))?;

    let (_, cpusvn) = get_asn1_bytes(k, "1.2.840.113741.1.13.1.2.18")?;
    let cpusvn: [u8; CPUSVN_LEN] = cpusvn
        .as_slice()
        .try_into()
        .map_err(|_| anyhow!("incorrect CPUSVN length"))?;

    Ok(PckTcb {
        compsvn,
        pcesvn,
        cpusvn,
    })
}

fn parse_configuration(value: &[u8]) -> anyhow::Result<PckPlatformConfiguration> {
    let (_, configuration_seq) =
        Sequence::from_der(value).map_err(|e| anyhow!("configuration sequence: {e:?}"))?;

    let mut configuration = PckPlatformConfiguration::default();

    // Each of the three flags is optional.
    let mut k = configuration_seq.content.as_ref();
    while !k.is_empty() {
        let (l, asn1_seq) =
            Sequence::from_der(k).map_err(|e| anyhow!("configuration entry: {e:?}"))?;
        k = l;
        let (l, current_oid) = Oid::from_der(asn1_seq.content.as_ref())
            .map_err(|e| anyhow!("configuration entry OID: {e:?}"))?;
        let (_, flag) = Boolean::from_der(l).map_err(|e| anyhow!("configuration flag: {e:?}"))?;

        match current_oid.to_id_string().as_str() {
            "1.2.840.113741.1.13.1.7.1" => configuration.dynamic_platform = Some(flag.bool()),
            "1.2.840.113741.1.13.1.7.2" => configuration.cached_keys = Some(flag.bool()),
            "1.2.840.113741.1.13.1.7.3" => configuration.smt_enabled = Some(flag.bool()),
            other => bail!("unknown OID {other} in SGX extension configuration"),
        }
    }

    Ok(configuration)
}

fn octet_string_array<const N: usize>(value: &[u8]) -> anyhow::Result<[u8; N]> {
    let (_, bytes) = OctetString::from_der(value).map_err(|e| anyhow!("octet string: {e:?}"))?;
    bytes
        .as_ref()
        .try_into()
        .map_err(|_| anyhow!("incorrect octet string length"))
}

fn get_asn1_uint64<'a>(bytes: &'a [u8], oid_str: &str) -> anyhow::Result<(&'a [u8], u64)> {
    let (k, asn1_seq) = Sequence::from_der(bytes).map_err(|e| anyhow!("{oid_str}: {e:?}"))?;
    let (l, asn1_oid) =
        Oid::from_der(asn1_seq.content.as_ref()).map_err(|e| anyhow!("{oid_str}: {e:?}"))?;
    if !oid_str.eq(&asn1_oid.to_id_string()) {
        bail!("expected OID {oid_str}, got {}", asn1_oid.to_id_string());
    }
    let (_, asn1_int) = Integer::from_der(l).map_err(|e| anyhow!("{oid_str}: {e:?}"))?;
    Ok((k, asn1_int.as_u64().map_err(|e| anyhow!("{oid_str}: {e:?}"))?))
}

fn get_asn1_bytes<'a>(bytes: &'a [u8], oid_str: &str) -> anyhow::Result<(&'a [u8], Vec<u8>)> {
    let (k, asn1_seq) = Sequence::from_der(bytes).map_err(|e| anyhow!("{oid_str}: {e:?}"))?;
    let (l, asn1_oid) =
        Oid::from_der(asn1_seq.content.as_ref()).map_err(|e| anyhow!("{oid_str}: {e:?}"))?;
    if !oid_str.eq(&asn1_oid.to_id_string()) {
        bail!("expected OID {oid_str}, got {}", asn1_oid.to_id_string());
    }
    let (_, asn1_bytes) = OctetString::from_der(l).map_err(|e| anyhow!("{oid_str}: {e:?}"))?;
    Ok((k, asn1_bytes.into_cow().to_vec()))
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Minimal DER writer for the test extension: tag, long-form lengths
    /// where needed, then contents.
    fn tlv(tag: u8, content: &[u8]) -> Vec<u8> {
        let mut out = vec![tag];
        let len = content.len();
        if len < 128 {
            out.push(len as u8);
        } else if len < 256 {
            out.push(0x81);
            out.push(len as u8);
        } else {
            out.push(0x82);
            out.extend_from_slice(&(len as u16).to_be_bytes());
        }
        out.extend_from_slice(content);
        out
    }

    /// DER encoding of an OID under the SGX arc. `suffix` holds the arcs
    /// after 1.2.840.113741.1.13.1.
    fn sgx_oid(suffix: &[u8]) -> Vec<u8> {
        // 1.2 -> 0x2A, 840 -> 0x86 0x48, 113741 -> 0x86 0xF8 0x4D
        let mut body = vec![0x2A, 0x86, 0x48, 0x86, 0xF8, 0x4D, 0x01, 0x0D, 0x01];
        body.extend_from_slice(suffix);
        tlv(0x06, &body)
    }

    fn entry(oid_suffix: &[u8], value: Vec<u8>) -> Vec<u8> {
        let mut content = sgx_oid(oid_suffix);
        content.extend_from_slice(&value);
        tlv(0x30, &content)
    }

    fn test_extension_der() -> Vec<u8> {
        let mut entries = Vec::new();
        entries.extend_from_slice(&entry(&[0x01], tlv(0x04, &[0xAB; 16]))); // PPID

        let mut tcb_entries = Vec::new();
        for i in 0..16u8 {
            tcb_entries.extend_from_slice(&entry(&[0x02, i + 1], tlv(0x02, &[i + 1])));
        }
        tcb_entries.extend_from_slice(&entry(&[0x02, 0x11], tlv(0x02, &[0x0A]))); // PCESVN
        tcb_entries.extend_from_slice(&entry(&[0x02, 0x12], tlv(0x04, &[0xF0; 16]))); // CPUSVN
        entries.extend_from_slice(&entry(&[0x02], tlv(0x30, &tcb_entries)));

        entries.extend_from_slice(&entry(&[0x03], tlv(0x04, &[0x00, 0x00]))); // PCE-ID
        entries.extend_from_slice(&entry(&[0x04], tlv(0x04, &[1, 2, 3, 4, 5, 6]))); // FMSPC
        entries.extend_from_slice(&entry(&[0x05], tlv(0x0A, &[0x00]))); // SGX type

        tlv(0x30, &entries)
    }

    #[test]
    fn parses_pck_extension() {
        let extension = SgxPckExtension::from_der(&test_extension_der()).unwrap();
        assert_eq!(extension.ppid, [0xAB; 16]);
        assert_eq!(
            extension.tcb.compsvn,
            [1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15, 16]
        );
        assert_eq!(extension.tcb.pcesvn, 10);
        assert_eq!(extension.tcb.cpusvn, [0xF0; 16]);
        assert_eq!(extension.pceid, [0, 0]);
        assert_eq!(extension.fmspc, [1, 2, 3, 4, 5, 6]);
        assert_eq!(extension.sgx_type, 0);
        assert!(extension.platform_instance_id.is_none());
    }

    #[test]
    fn rejects_missing_fmspc() {
        let mut entries = Vec::new();
        entries.extend_from_slice(&entry(&[0x01], tlv(0x04, &[0xAB; 16])));
        let der = tlv(0x30, &entries);
        assert!(SgxPckExtension::from_der(&der).is_err());
    }

    #[test]
    fn recognizes_extension_oid() {
        assert!(SgxPckExtension::is_pck_ext("1.2.840.113741.1.13.1"));
        assert!(!SgxPckExtension::is_pck_ext("2.5.29.15"));
    }
}

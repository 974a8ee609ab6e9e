//! Wire-format encoding and decoding for the single-question subset of the
//! DNS message format this responder speaks.
//!
//! Decoding starts at the fixed question offset and assumes exactly one
//! uncompressed question; truncated or garbled input surfaces as a
//! [`WireError`] that the responder loop turns into drop-and-continue.
//! Encoding always writes the owner name as the `0xC00C` compression pointer
//! back at the question, which is only valid because the single answer
//! echoes the question's exact name.

use thiserror::Error;

use super::enums::{CLASS_IN, RecordType};
use crate::zone::RecordData;

/// DNS message header length; the question section starts right after it.
pub const HEADER_LEN: usize = 12;

/// Classic DNS/UDP maximum datagram size. No EDNS large-message support.
pub const MAX_DATAGRAM_LEN: usize = 512;

/// Fixed TTL stamped on every record this responder produces.
pub const RECORD_TTL: u32 = 60;

/// Flags for a standard authoritative response with no error.
const FLAGS_NOERROR: [u8; 2] = [0x81, 0x80];

/// Flags for a name-error (NXDOMAIN) response.
const FLAGS_NXDOMAIN: [u8; 2] = [0x81, 0x83];

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WireError {
    #[error("datagram truncated at offset {0}")]
    Truncated(usize),

    #[error("question label is not valid UTF-8")]
    InvalidLabel,

    #[error("invalid {kind} record value: {value}")]
    InvalidRecordValue { kind: &'static str, value: String },

    #[error("record value does not match type {0}")]
    RecordMismatch(&'static str),

    #[error("TXT record exceeds 255 bytes")]
    TxtTooLong,
}

pub type Result<T> = std::result::Result<T, WireError>;

/// Question section decoded from an inbound query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    /// Fully-qualified, dot-terminated domain name.
    pub name: String,
    /// Raw wire-format type code.
    pub qtype: u16,
    /// Offset of the first byte past the type and class fields.
    pub end: usize,
}

/// Decode the question section of `datagram`.
///
/// Reads length-prefixed labels from offset 12 until the zero-length
/// terminator, then the 2-byte type code. The caller guarantees at least a
/// full header is present; anything shorter than the labels claim is a
/// [`WireError::Truncated`].
pub fn decode_question(datagram: &[u8]) -> Result<Question> {
    let mut offset = HEADER_LEN;
    let mut name = String::new();

    loop {
        let len = *datagram
            .get(offset)
            .ok_or(WireError::Truncated(offset))? as usize;
        if len == 0 {
            offset += 1;
            break;
        }
        let label = datagram
            .get(offset + 1..offset + 1 + len)
            .ok_or(WireError::Truncated(offset))?;
        let label = std::str::from_utf8(label).map_err(|_| WireError::InvalidLabel)?;
        name.push_str(label);
        name.push('.');
        offset += 1 + len;
    }

    // A bare root query has no labels; the canonical form is still ".".
    if name.is_empty() {
        name.push('.');
    }

    let qtype = read_u16(datagram, offset)?;

    Ok(Question {
        name,
        qtype,
        end: offset + 4,
    })
}

fn read_u16(datagram: &[u8], offset: usize) -> Result<u16> {
    let bytes = datagram
        .get(offset..offset + 2)
        .ok_or(WireError::Truncated(offset))?;
    Ok(u16::from_be_bytes([bytes[0], bytes[1]]))
}

/// Encode a domain name as length-prefixed labels with a zero terminator.
///
/// Only used for names embedded in RDATA (the MX exchange); owner names are
/// written as the compression pointer instead.
pub fn encode_name(name: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(name.len() + 2);
    for label in name.trim_matches('.').split('.') {
        out.push(label.len() as u8);
        out.extend_from_slice(label.as_bytes());
    }
    out.push(0);
    out
}

/// Build the RDATA bytes for one record.
pub fn encode_rdata(rtype: RecordType, data: &RecordData) -> Result<Vec<u8>> {
    match (rtype, data) {
        (RecordType::A, RecordData::Value(ip)) => ip
            .split('.')
            .map(|octet| {
                octet.parse::<u8>().map_err(|_| WireError::InvalidRecordValue {
                    kind: "A",
                    value: ip.clone(),
                })
            })
            .collect(),
        (RecordType::AAAA, RecordData::Value(ip)) => {
            let mut out = Vec::with_capacity(16);
            for group in ipv6_groups(ip)? {
                out.extend_from_slice(&group.to_be_bytes());
            }
            Ok(out)
        }
        (RecordType::MX, RecordData::Mx { preference, exchange }) => {
            let mut out = preference.to_be_bytes().to_vec();
            out.extend_from_slice(&encode_name(exchange));
            Ok(out)
        }
        (RecordType::TXT, RecordData::Value(text)) => {
            if text.len() > 255 {
                return Err(WireError::TxtTooLong);
            }
            let mut out = Vec::with_capacity(text.len() + 1);
            out.push(text.len() as u8);
            out.extend_from_slice(text.as_bytes());
            Ok(out)
        }
        (rtype, _) => Err(WireError::RecordMismatch(rtype.label())),
    }
}

/// Expand a compressed-notation IPv6 literal into 16-bit groups.
///
/// Each empty segment produced by `::` is replaced with enough zero groups
/// to reach eight in total, computed as eight minus the count of non-empty
/// segments. Only a single interior `::` contraction expands correctly;
/// doubled or edge-positioned contractions keep the narrow historical
/// result rather than being repaired.
fn ipv6_groups(addr: &str) -> Result<Vec<u16>> {
    let parts: Vec<&str> = addr.split(':').collect();
    let nonempty = parts.iter().filter(|part| !part.is_empty()).count();
    let mut groups = Vec::with_capacity(8);

    for part in &parts {
        if part.is_empty() {
            let fill = 8usize.saturating_sub(nonempty);
            groups.extend(std::iter::repeat_n(0u16, fill));
        } else {
            let group =
                u16::from_str_radix(part, 16).map_err(|_| WireError::InvalidRecordValue {
                    kind: "AAAA",
                    value: addr.to_string(),
                })?;
            groups.push(group);
        }
    }

    groups.truncate(8);
    Ok(groups)
}

/// Encode one resource record for the answer section.
///
/// The owner name is the `0xC00C` pointer at the question name, followed by
/// type, class IN, the fixed TTL, RDLENGTH and the RDATA bytes.
pub fn encode_record(rtype_code: u16, rdata: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(12 + rdata.len());
    out.extend_from_slice(&[0xC0, 0x0C]);
    out.extend_from_slice(&rtype_code.to_be_bytes());
    out.extend_from_slice(&CLASS_IN.to_be_bytes());
    out.extend_from_slice(&RECORD_TTL.to_be_bytes());
    out.extend_from_slice(&(rdata.len() as u16).to_be_bytes());
    out.extend_from_slice(rdata);
    out
}

/// Assemble the full response datagram.
///
/// The transaction id and question section are echoed verbatim from the
/// query. With an answer the flags are `0x8180` and ANCOUNT is one; without
/// one the flags are `0x8183` (name error) and ANCOUNT is zero.
pub fn build_response(query: &[u8], question_end: usize, answer: Option<&[u8]>) -> Vec<u8> {
    let question = &query[HEADER_LEN..question_end.min(query.len())];
    let answer_len = answer.map_or(0, <[u8]>::len);

    let mut out = Vec::with_capacity(HEADER_LEN + question.len() + answer_len);
    out.extend_from_slice(&query[..2]);
    match answer {
        Some(record) => {
            out.extend_from_slice(&FLAGS_NOERROR);
            out.extend_from_slice(&[0x00, 0x01]); // QDCOUNT
            out.extend_from_slice(&[0x00, 0x01]); // ANCOUNT
            out.extend_from_slice(&[0x00, 0x00, 0x00, 0x00]); // NSCOUNT, ARCOUNT
            out.extend_from_slice(question);
            out.extend_from_slice(record);
        }
        None => {
            out.extend_from_slice(&FLAGS_NXDOMAIN);
            out.extend_from_slice(&[0x00, 0x01]); // QDCOUNT
            out.extend_from_slice(&[0x00, 0x00]); // ANCOUNT
            out.extend_from_slice(&[0x00, 0x00, 0x00, 0x00]); // NSCOUNT, ARCOUNT
            out.extend_from_slice(question);
        }
    }
    out
}

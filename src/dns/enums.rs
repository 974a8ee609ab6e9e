use std::fmt;

/// Resource record types the responder can serve.
///
/// The wire codes form a fixed bidirectional table; anything outside it is
/// reported by its decimal code and never matches zone data.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum RecordType {
    A,
    MX,
    TXT,
    AAAA,
}

impl RecordType {
    /// Wire-format type code.
    pub fn code(self) -> u16 {
        match self {
            RecordType::A => 1,
            RecordType::MX => 15,
            RecordType::TXT => 16,
            RecordType::AAAA => 28,
        }
    }

    /// Map a wire-format type code back to a served type.
    pub fn from_code(code: u16) -> Option<RecordType> {
        match code {
            1 => Some(RecordType::A),
            15 => Some(RecordType::MX),
            16 => Some(RecordType::TXT),
            28 => Some(RecordType::AAAA),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            RecordType::A => "A",
            RecordType::MX => "MX",
            RecordType::TXT => "TXT",
            RecordType::AAAA => "AAAA",
        }
    }

    /// Map a zone-file type label to a served type.
    pub fn from_label(label: &str) -> Option<RecordType> {
        match label {
            "A" => Some(RecordType::A),
            "MX" => Some(RecordType::MX),
            "TXT" => Some(RecordType::TXT),
            "AAAA" => Some(RecordType::AAAA),
            _ => None,
        }
    }

    /// Human-readable label for any type code, including unserved ones.
    ///
    /// Unknown codes render as their decimal form so the counter sink can
    /// still attribute them.
    pub fn label_for_code(code: u16) -> String {
        match RecordType::from_code(code) {
            Some(rtype) => rtype.label().to_string(),
            None => code.to_string(),
        }
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// The only class the responder emits.
pub const CLASS_IN: u16 = 1;

use serde::{Deserialize, Serialize};

/// Typed payload of one zone record.
///
/// A, AAAA and TXT values are kept in their zone-file string form and only
/// turned into bytes at encode time; MX carries its preference and exchange
/// name. Each domain holds at most one value per record type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordData {
    Mx {
        preference: u16,
        exchange: String,
    },
    Value(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_plain_value() {
        let data: RecordData = serde_json::from_str("\"192.0.2.1\"").unwrap();
        assert_eq!(data, RecordData::Value("192.0.2.1".into()));
    }

    #[test]
    fn test_deserialize_mx_object() {
        let data: RecordData =
            serde_json::from_str(r#"{"preference": 10, "exchange": "mail.example.com."}"#)
                .unwrap();
        assert_eq!(
            data,
            RecordData::Mx {
                preference: 10,
                exchange: "mail.example.com.".into()
            }
        );
    }
}

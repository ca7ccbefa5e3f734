use serde::{Deserialize, Deserializer};

/// Custom deserializer for a comma-separated list of broker addresses.
pub fn deserialize_broker_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    Ok(s.split(',').map(|broker| broker.trim().to_string()).filter(|b| !b.is_empty()).collect())
}

/// Deserializes an integer that may arrive as a number or as a string (the
/// environment source yields strings).
///
/// Returns `None` when the value cannot be parsed, so the caller can fall
/// back to the field default instead of failing the whole configuration
/// load.
pub fn lenient_u64<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(u64),
        Text(String),
    }

    Ok(match Raw::deserialize(deserializer) {
        Ok(Raw::Number(n)) => Some(n),
        Ok(Raw::Text(s)) => s.trim().parse().ok(),
        Err(_) => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json;

    #[derive(Debug, Deserialize, PartialEq)]
    struct TestBrokers {
        #[serde(deserialize_with = "deserialize_broker_list")]
        brokers: Vec<String>,
    }

    #[derive(Debug, Deserialize, PartialEq)]
    struct TestLenient {
        #[serde(deserialize_with = "lenient_u64")]
        value: Option<u64>,
    }

    #[test]
    fn test_deserialize_broker_list() {
        let json = r#"{"brokers": "localhost:9092, localhost:9093,localhost:9094"}"#;
        let parsed: TestBrokers = serde_json::from_str(json).unwrap();
        assert_eq!(
            parsed.brokers,
            vec!["localhost:9092", "localhost:9093", "localhost:9094"]
        );
    }

    #[test]
    fn test_deserialize_broker_list_skips_empty_entries() {
        let json = r#"{"brokers": "localhost:9092,,"}"#;
        let parsed: TestBrokers = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.brokers, vec!["localhost:9092"]);
    }

    #[test]
    fn test_lenient_u64_accepts_numbers() {
        let parsed: TestLenient = serde_json::from_str(r#"{"value": 250}"#).unwrap();
        assert_eq!(parsed.value, Some(250));
    }

    #[test]
    fn test_lenient_u64_parses_strings() {
        let parsed: TestLenient = serde_json::from_str(r#"{"value": " 250 "}"#).unwrap();
        assert_eq!(parsed.value, Some(250));
    }

    #[test]
    fn test_lenient_u64_yields_none_for_garbage() {
        let parsed: TestLenient = serde_json::from_str(r#"{"value": "not-a-number"}"#).unwrap();
        assert_eq!(parsed.value, None);

        let parsed: TestLenient = serde_json::from_str(r#"{"value": -1}"#).unwrap();
        assert_eq!(parsed.value, None);
    }
}

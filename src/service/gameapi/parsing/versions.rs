use json::JsonValue;

use super::ParsingError;

/// Parses Data Dragon's `versions.json`, newest first.
pub fn parse_versions(json: &JsonValue) -> Result<Vec<String>, ParsingError> {
    if let JsonValue::Array(array) = json {
        return array
            .iter()
            .map(|v| v.as_str().map(str::to_string).ok_or(ParsingError::InvalidType("version".into())))
            .collect();
    }

    Err(ParsingError::InvalidType("root".into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_order() {
        let versions = parse_versions(&json::parse(r#"["14.2.1","14.1.1","lolpatch_3.7"]"#).unwrap()).unwrap();
        assert_eq!(versions[0], "14.2.1");
        assert_eq!(versions.len(), 3);
    }
}

use json::JsonValue;

use crate::model::item::Item;

use super::{str_field, ParsingError};

/// Parses Data Dragon's `item.json`.
pub fn parse_items(json: &JsonValue) -> Result<Vec<Item>, ParsingError> {
    if let JsonValue::Object(obj) = &json["data"] {
        let mut items = Vec::new();

        for (id, item) in obj.iter() {
            let name = str_field(&item["name"], "name")?;
            let gold = &item["gold"];
            let gold_total = gold["total"].as_u32().ok_or(ParsingError::InvalidType("gold.total".into()))?;
            let purchasable = gold["purchasable"].as_bool().unwrap_or(false);

            items.push(Item {
                id: id.to_string().into(),
                name,
                gold_total,
                purchasable,
            });
        }

        return Ok(items);
    }

    Err(ParsingError::InvalidType("data".into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_items() {
        let json = json::parse(
            r#"{"data":{"1001":{"name":"Boots","gold":{"base":300,"total":300,"purchasable":true}}}}"#,
        )
        .unwrap();
        let items = parse_items(&json).unwrap();
        assert_eq!(items[0].id.0, "1001");
        assert_eq!(items[0].gold_total, 300);
        assert!(items[0].purchasable);
    }
}

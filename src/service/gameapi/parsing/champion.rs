use json::JsonValue;

use crate::model::{
    champion::{Champion, ChampionRotation},
    ids::ChampionId,
};

use super::{str_field, ParsingError};

pub fn parse_rotation(json: &JsonValue) -> Result<ChampionRotation, ParsingError> {
    if let JsonValue::Object(obj) = json {
        let free_champion_ids = parse_id_list(&obj["freeChampionIds"], "freeChampionIds")?;
        let free_champion_ids_for_new_players =
            parse_id_list(&obj["freeChampionIdsForNewPlayers"], "freeChampionIdsForNewPlayers")?;
        let max_new_player_level = obj["maxNewPlayerLevel"]
            .as_u32()
            .ok_or(ParsingError::InvalidType("maxNewPlayerLevel".into()))?;

        return Ok(ChampionRotation {
            free_champion_ids,
            free_champion_ids_for_new_players,
            max_new_player_level,
        });
    }

    Err(ParsingError::InvalidType("root".into()))
}

fn parse_id_list(json: &JsonValue, field: &str) -> Result<Vec<ChampionId>, ParsingError> {
    if !json.is_array() {
        return Err(ParsingError::InvalidType(field.into()));
    }
    json.members()
        .map(|id| id.as_i64().map(ChampionId::from).ok_or(ParsingError::InvalidType(field.into())))
        .collect()
}

/// Parses Data Dragon's `champion.json`.
pub fn parse_champions(json: &JsonValue) -> Result<Vec<Champion>, ParsingError> {
    let data = &json["data"];
    if let JsonValue::Object(obj) = data {
        let mut champions = Vec::new();

        for (id, champ) in obj.iter() {
            let key = str_field(&champ["key"], "key")?;
            let name = str_field(&champ["name"], "name")?;
            let title = str_field(&champ["title"], "title")?;
            let tags = champ["tags"].members().filter_map(|t| t.as_str()).map(str::to_string).collect();

            champions.push(Champion {
                id: id.to_string(),
                key: key.into(),
                name,
                title,
                tags,
            });
        }

        return Ok(champions);
    }

    Err(ParsingError::InvalidType("data".into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_rotation() {
        let json = json::parse(
            r#"{"freeChampionIds":[1,2,3],"freeChampionIdsForNewPlayers":[18],"maxNewPlayerLevel":10}"#,
        )
        .unwrap();
        let rotation = parse_rotation(&json).unwrap();
        assert_eq!(rotation.free_champion_ids.len(), 3);
        assert_eq!(rotation.free_champion_ids_for_new_players[0].0, "18");
        assert_eq!(rotation.max_new_player_level, 10);
    }

    #[test]
    fn parses_static_champions() {
        let json = json::parse(
            r#"{"type":"champion","version":"14.1.1","data":{
                "MonkeyKing":{"id":"MonkeyKing","key":"62","name":"Wukong","title":"the Monkey King","tags":["Fighter","Tank"]}
            }}"#,
        )
        .unwrap();
        let champions = parse_champions(&json).unwrap();
        assert_eq!(champions[0].id, "MonkeyKing");
        assert_eq!(champions[0].key.0, "62");
        assert!(champions[0].has_tag("tank"));
    }
}

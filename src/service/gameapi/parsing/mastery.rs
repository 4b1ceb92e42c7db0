use json::JsonValue;

use crate::model::mastery::ChampionMastery;

use super::{timestamp_millis, ParsingError};

pub fn parse_masteries(json: &JsonValue) -> Result<Vec<ChampionMastery>, ParsingError> {
    if let JsonValue::Array(array) = json {
        let mut masteries = Vec::new();

        for champ_entry in array {
            if let JsonValue::Object(champ_obj) = champ_entry {
                let champ_id = champ_obj["championId"]
                    .as_i64()
                    .ok_or(ParsingError::InvalidType("championId".into()))?;
                let level = champ_obj["championLevel"]
                    .as_u16()
                    .ok_or(ParsingError::InvalidType("championLevel".into()))?;
                let points = champ_obj["championPoints"]
                    .as_u32()
                    .ok_or(ParsingError::InvalidType("championPoints".into()))?;
                let last_play_time = timestamp_millis(&champ_obj["lastPlayTime"], "lastPlayTime")?;

                masteries.push(ChampionMastery {
                    champ_id: champ_id.into(),
                    level,
                    points,
                    last_play_time,
                })
            } else {
                return Err(ParsingError::InvalidType("mastery entry".into()));
            }
        }

        return Ok(masteries);
    }

    Err(ParsingError::InvalidType("root".into()))
}

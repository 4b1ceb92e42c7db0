use json::JsonValue;

use crate::model::summoner::{Account, Summoner};

use super::{str_field, timestamp_millis, ParsingError};

pub fn parse_account(json: &JsonValue) -> Result<Account, ParsingError> {
    if let JsonValue::Object(obj) = json {
        let puuid = obj["puuid"].as_str().ok_or(ParsingError::InvalidType("puuid".into()))?;
        let game_name = str_field(&obj["gameName"], "gameName")?;
        let tag_line = str_field(&obj["tagLine"], "tagLine")?;

        return Ok(Account {
            puuid: puuid.into(),
            game_name,
            tag_line,
        });
    }

    Err(ParsingError::InvalidType("root".into()))
}

pub fn parse_summoner(json: &JsonValue) -> Result<Summoner, ParsingError> {
    if let JsonValue::Object(obj) = json {
        let puuid = obj["puuid"].as_str().ok_or(ParsingError::InvalidType("puuid".into()))?;
        let profile_icon_id = obj["profileIconId"]
            .as_u32()
            .ok_or(ParsingError::InvalidType("profileIconId".into()))?;
        let level = obj["summonerLevel"]
            .as_u32()
            .ok_or(ParsingError::InvalidType("summonerLevel".into()))?;
        let revision_date = timestamp_millis(&obj["revisionDate"], "revisionDate")?;

        return Ok(Summoner {
            puuid: puuid.into(),
            profile_icon_id,
            level,
            revision_date,
        });
    }

    Err(ParsingError::InvalidType("root".into()))
}

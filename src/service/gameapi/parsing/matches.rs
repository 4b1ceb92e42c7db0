use json::JsonValue;

use crate::model::{
    ids::MatchId,
    matches::{Match, Participant, Role},
};

use super::{str_field, timestamp_millis, ParsingError};

pub fn parse_match_ids(json: &JsonValue) -> Result<Vec<MatchId>, ParsingError> {
    if let JsonValue::Array(array) = json {
        return array
            .iter()
            .map(|id| id.as_str().map(MatchId::from).ok_or(ParsingError::InvalidType("match id".into())))
            .collect();
    }

    Err(ParsingError::InvalidType("root".into()))
}

pub fn parse_match(json: &JsonValue) -> Result<Match, ParsingError> {
    if let JsonValue::Object(obj) = json {
        let match_id = obj["metadata"]["matchId"]
            .as_str()
            .ok_or(ParsingError::InvalidType("matchId".into()))?;

        let info = &obj["info"];
        if !info.is_object() {
            return Err(ParsingError::InvalidType("info".into()));
        }
        let game_creation = timestamp_millis(&info["gameCreation"], "gameCreation")?;
        let raw_duration = info["gameDuration"]
            .as_u64()
            .ok_or(ParsingError::InvalidType("gameDuration".into()))?;
        // Before patch 11.20 the duration was reported in milliseconds and no end timestamp was sent
        let game_duration = if info["gameEndTimestamp"].is_null() {
            raw_duration / 1000
        } else {
            raw_duration
        };
        let game_version = str_field(&info["gameVersion"], "gameVersion")?;
        let queue_id = info["queueId"].as_u16().ok_or(ParsingError::InvalidType("queueId".into()))?;

        let participants = info["participants"]
            .members()
            .map(parse_participant)
            .collect::<Result<Vec<_>, _>>()?;
        if participants.is_empty() {
            return Err(ParsingError::InvalidType("participants".into()));
        }

        return Ok(Match {
            match_id: match_id.into(),
            game_creation,
            game_duration,
            game_version,
            queue_id,
            participants,
        });
    }

    Err(ParsingError::InvalidType("root".into()))
}

fn parse_participant(json: &JsonValue) -> Result<Participant, ParsingError> {
    if let JsonValue::Object(obj) = json {
        let puuid = obj["puuid"].as_str().ok_or(ParsingError::InvalidType("puuid".into()))?;
        let riot_id = match (obj["riotIdGameName"].as_str(), obj["riotIdTagline"].as_str()) {
            (Some(name), Some(tag)) if !name.is_empty() => format!("{}#{}", name, tag),
            _ => obj["summonerName"].as_str().unwrap_or_default().to_string(),
        };
        let champ_id = obj["championId"]
            .as_i64()
            .ok_or(ParsingError::InvalidType("championId".into()))?;
        let champion_name = str_field(&obj["championName"], "championName")?;
        let team_id = obj["teamId"].as_u16().ok_or(ParsingError::InvalidType("teamId".into()))?;
        let role = Role::from_team_position(obj["teamPosition"].as_str().unwrap_or_default());
        let win = obj["win"].as_bool().ok_or(ParsingError::InvalidType("win".into()))?;
        let kills = obj["kills"].as_u32().ok_or(ParsingError::InvalidType("kills".into()))?;
        let deaths = obj["deaths"].as_u32().ok_or(ParsingError::InvalidType("deaths".into()))?;
        let assists = obj["assists"].as_u32().ok_or(ParsingError::InvalidType("assists".into()))?;
        let gold_earned = obj["goldEarned"].as_u32().unwrap_or(0);
        let total_minions_killed = obj["totalMinionsKilled"].as_u32().unwrap_or(0);

        return Ok(Participant {
            puuid: puuid.into(),
            riot_id,
            champ_id: champ_id.into(),
            champion_name,
            team_id,
            role,
            win,
            kills,
            deaths,
            assists,
            gold_earned,
            total_minions_killed,
        });
    }

    Err(ParsingError::InvalidType("participant".into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ids::Puuid;

    const MATCH: &str = r#"{
        "metadata": {"matchId": "EUW1_100", "participants": ["p-1", "p-2"]},
        "info": {
            "gameCreation": 1700000000000,
            "gameDuration": 1800,
            "gameEndTimestamp": 1700001800000,
            "gameVersion": "14.1.555.1234",
            "queueId": 420,
            "participants": [
                {"puuid": "p-1", "riotIdGameName": "Alpha", "riotIdTagline": "EUW", "championId": 157,
                 "championName": "Yasuo", "teamId": 100, "teamPosition": "MIDDLE", "win": true,
                 "kills": 10, "deaths": 2, "assists": 4, "goldEarned": 14000, "totalMinionsKilled": 230},
                {"puuid": "p-2", "riotIdGameName": "Beta", "riotIdTagline": "EUW", "championId": 64,
                 "championName": "LeeSin", "teamId": 200, "teamPosition": "", "win": false,
                 "kills": 3, "deaths": 0, "assists": 1}
            ]
        }
    }"#;

    #[test]
    fn parses_match_and_participants() {
        let parsed = parse_match(&json::parse(MATCH).unwrap()).unwrap();
        assert_eq!(parsed.match_id.0, "EUW1_100");
        assert_eq!(parsed.game_duration, 1800);
        assert_eq!(parsed.queue_id, 420);

        let alpha = parsed.participant(&Puuid::from("p-1")).unwrap();
        assert_eq!(alpha.riot_id, "Alpha#EUW");
        assert_eq!(alpha.role, Role::Middle);
        assert!((alpha.kda() - 7.0).abs() < f64::EPSILON);

        let beta = parsed.participant(&Puuid::from("p-2")).unwrap();
        assert_eq!(beta.role, Role::Unknown);
        assert_eq!(beta.gold_earned, 0);
        assert!((beta.kda() - 4.0).abs() < f64::EPSILON);
    }

    #[test]
    fn legacy_duration_is_converted_from_millis() {
        let legacy = MATCH.replace(r#""gameEndTimestamp": 1700001800000,"#, "").replace("1800,", "1800000,");
        let parsed = parse_match(&json::parse(&legacy).unwrap()).unwrap();
        assert_eq!(parsed.game_duration, 1800);
    }

    #[test]
    fn parses_match_ids() {
        let ids = parse_match_ids(&json::parse(r#"["EUW1_1","EUW1_2"]"#).unwrap()).unwrap();
        assert_eq!(ids, vec![MatchId::from("EUW1_1"), MatchId::from("EUW1_2")]);
        assert!(parse_match_ids(&json::parse("[1]").unwrap()).is_err());
    }
}

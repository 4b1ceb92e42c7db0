use std::{fmt, str::FromStr};

/// The Riot API methods this client knows about. Each one has its own
/// method-scoped rate limit, so the tracker keys its budgets by this enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ApiMethod {
    AccountByRiotId,
    SummonerByPuuid,
    MatchIdsByPuuid,
    Match,
    LeagueEntriesByPuuid,
    ChampionMasteryByPuuid,
    ChampionRotation,
    ActiveGameByPuuid,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Routing {
    Platform,
    Regional,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Platform {
    Br1,
    Eun1,
    Euw1,
    Jp1,
    Kr,
    La1,
    La2,
    Me1,
    Na1,
    Oc1,
    Ph2,
    Ru,
    Sg2,
    Th2,
    Tr1,
    Tw2,
    Vn2,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RegionalRoute {
    Americas,
    Asia,
    Europe,
    Sea,
}

impl ApiMethod {
    pub fn name(&self) -> &'static str {
        match self {
            ApiMethod::AccountByRiotId => "account-v1.getByRiotId",
            ApiMethod::SummonerByPuuid => "summoner-v4.getByPUUID",
            ApiMethod::MatchIdsByPuuid => "match-v5.getMatchIdsByPUUID",
            ApiMethod::Match => "match-v5.getMatch",
            ApiMethod::LeagueEntriesByPuuid => "league-v4.getLeagueEntriesByPUUID",
            ApiMethod::ChampionMasteryByPuuid => "champion-mastery-v4.getAllChampionMasteriesByPUUID",
            ApiMethod::ChampionRotation => "champion-v3.getChampionInfo",
            ApiMethod::ActiveGameByPuuid => "spectator-v5.getCurrentGameInfoByPuuid",
        }
    }

    pub fn routing(&self) -> Routing {
        match self {
            ApiMethod::AccountByRiotId | ApiMethod::MatchIdsByPuuid | ApiMethod::Match => Routing::Regional,
            _ => Routing::Platform,
        }
    }
}

impl fmt::Display for ApiMethod {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl Platform {
    pub fn host(&self) -> &'static str {
        match self {
            Platform::Br1 => "br1",
            Platform::Eun1 => "eun1",
            Platform::Euw1 => "euw1",
            Platform::Jp1 => "jp1",
            Platform::Kr => "kr",
            Platform::La1 => "la1",
            Platform::La2 => "la2",
            Platform::Me1 => "me1",
            Platform::Na1 => "na1",
            Platform::Oc1 => "oc1",
            Platform::Ph2 => "ph2",
            Platform::Ru => "ru",
            Platform::Sg2 => "sg2",
            Platform::Th2 => "th2",
            Platform::Tr1 => "tr1",
            Platform::Tw2 => "tw2",
            Platform::Vn2 => "vn2",
        }
    }

    pub fn regional_route(&self) -> RegionalRoute {
        match self {
            Platform::Br1 | Platform::La1 | Platform::La2 | Platform::Na1 => RegionalRoute::Americas,
            Platform::Jp1 | Platform::Kr => RegionalRoute::Asia,
            Platform::Eun1 | Platform::Euw1 | Platform::Me1 | Platform::Ru | Platform::Tr1 => RegionalRoute::Europe,
            Platform::Oc1 | Platform::Ph2 | Platform::Sg2 | Platform::Th2 | Platform::Tw2 | Platform::Vn2 => {
                RegionalRoute::Sea
            }
        }
    }

    /// Base url for an endpoint, picking the platform or regional host as the
    /// method requires.
    pub fn base_url(&self, method: ApiMethod) -> String {
        let host = match method.routing() {
            Routing::Platform => self.host(),
            Routing::Regional => self.regional_route().host(),
        };
        format!("https://{}.api.riotgames.com", host)
    }
}

impl RegionalRoute {
    pub fn host(&self) -> &'static str {
        match self {
            RegionalRoute::Americas => "americas",
            RegionalRoute::Asia => "asia",
            RegionalRoute::Europe => "europe",
            RegionalRoute::Sea => "sea",
        }
    }
}

impl FromStr for Platform {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let platform = match s.trim().to_lowercase().as_str() {
            "br1" | "br" => Platform::Br1,
            "eun1" | "eune" => Platform::Eun1,
            "euw1" | "euw" => Platform::Euw1,
            "jp1" | "jp" => Platform::Jp1,
            "kr" => Platform::Kr,
            "la1" | "lan" => Platform::La1,
            "la2" | "las" => Platform::La2,
            "me1" | "me" => Platform::Me1,
            "na1" | "na" => Platform::Na1,
            "oc1" | "oce" => Platform::Oc1,
            "ph2" | "ph" => Platform::Ph2,
            "ru" => Platform::Ru,
            "sg2" | "sg" => Platform::Sg2,
            "th2" | "th" => Platform::Th2,
            "tr1" | "tr" => Platform::Tr1,
            "tw2" | "tw" => Platform::Tw2,
            "vn2" | "vn" => Platform::Vn2,
            other => return Err(format!("unknown region '{}'", other)),
        };
        Ok(platform)
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.host())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn regional_methods_use_regional_host() {
        assert_eq!(
            Platform::Euw1.base_url(ApiMethod::Match),
            "https://europe.api.riotgames.com"
        );
        assert_eq!(
            Platform::Kr.base_url(ApiMethod::AccountByRiotId),
            "https://asia.api.riotgames.com"
        );
    }

    #[test]
    fn platform_methods_use_platform_host() {
        assert_eq!(
            Platform::Na1.base_url(ApiMethod::SummonerByPuuid),
            "https://na1.api.riotgames.com"
        );
    }

    #[test]
    fn parses_platform_aliases() {
        assert_eq!("EUW".parse::<Platform>(), Ok(Platform::Euw1));
        assert_eq!(" oc1 ".parse::<Platform>(), Ok(Platform::Oc1));
        assert!("atlantis".parse::<Platform>().is_err());
    }

    #[test]
    fn method_names_are_distinct() {
        let methods = [
            ApiMethod::AccountByRiotId,
            ApiMethod::SummonerByPuuid,
            ApiMethod::MatchIdsByPuuid,
            ApiMethod::Match,
            ApiMethod::LeagueEntriesByPuuid,
            ApiMethod::ChampionMasteryByPuuid,
            ApiMethod::ChampionRotation,
            ApiMethod::ActiveGameByPuuid,
        ];
        let mut names = methods.iter().map(|m| m.name()).collect::<Vec<_>>();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), methods.len());
    }
}

pub mod champion;
pub mod ids;
pub mod item;
pub mod league;
pub mod livegame;
pub mod mastery;
pub mod matches;
pub mod stats;
pub mod summoner;

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString, IntoEnumIterator};
use thiserror::Error;

use crate::config::ZonePayloads;

/// Target positions on the play mat.
#[derive(
    Copy,
    Clone,
    Debug,
    PartialEq,
    Eq,
    Hash,
    Deserialize,
    Serialize,
    AsRefStr,
    Display,
    EnumIter,
    EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Zone {
    Red,
    Blue,
    Yellow,
    Center,
}

#[derive(Debug, Error, PartialEq)]
#[error("Unknown zone: {0:?}")]
pub struct UnknownZone(pub String);

/// Fixed mapping from zones to the bytes the motor controller understands.
#[derive(Debug)]
pub struct ZoneMap {
    payloads: HashMap<Zone, Vec<u8>>,
}

impl Zone {
    pub fn default_payload(self) -> &'static [u8] {
        match self {
            Zone::Red => b"<RED>",
            Zone::Blue => b"<BLUE>",
            Zone::Yellow => b"<YELLOW>",
            Zone::Center => b"<STOP>",
        }
    }

    /// What the zone stands for in the story game.
    pub fn meaning(self) -> &'static str {
        match self {
            Zone::Red => "spend",
            Zone::Blue => "save",
            Zone::Yellow => "invest",
            Zone::Center => "home",
        }
    }

    pub fn from_choice(choice: &str) -> Option<Zone> {
        match choice {
            "spend" => Some(Zone::Red),
            "save" => Some(Zone::Blue),
            "invest" => Some(Zone::Yellow),
            _ => None,
        }
    }
}

impl ZoneMap {
    pub fn new(overrides: &ZonePayloads) -> Self {
        let payloads = Zone::iter()
            .map(|zone| {
                let payload = match overrides.get(zone) {
                    Some(custom) => custom.as_bytes().to_vec(),
                    None => zone.default_payload().to_vec(),
                };

                (zone, payload)
            })
            .collect();

        Self { payloads }
    }

    pub fn payload(&self, zone: Zone) -> &[u8] {
        &self.payloads[&zone]
    }

    /// Looks up a zone given as it arrived on the wire. Matching is case-sensitive.
    pub fn resolve(&self, zone: &str) -> Result<(Zone, &[u8]), UnknownZone> {
        let zone: Zone = zone.parse().map_err(|_| UnknownZone(zone.to_owned()))?;
        Ok((zone, self.payload(zone)))
    }
}

impl Default for ZoneMap {
    fn default() -> Self {
        Self::new(&ZonePayloads::default())
    }
}

impl ZonePayloads {
    fn get(&self, zone: Zone) -> Option<&str> {
        match zone {
            Zone::Red => self.red.as_deref(),
            Zone::Blue => self.blue.as_deref(),
            Zone::Yellow => self.yellow.as_deref(),
            Zone::Center => self.center.as_deref(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_payloads() {
        let zones = ZoneMap::default();

        assert_eq!(zones.resolve("red"), Ok((Zone::Red, &b"<RED>"[..])));
        assert_eq!(zones.resolve("blue"), Ok((Zone::Blue, &b"<BLUE>"[..])));
        assert_eq!(zones.resolve("yellow"), Ok((Zone::Yellow, &b"<YELLOW>"[..])));
        assert_eq!(zones.resolve("center"), Ok((Zone::Center, &b"<STOP>"[..])));
    }

    #[test]
    fn test_every_zone_has_one_payload() {
        let zones = ZoneMap::default();

        for zone in Zone::iter() {
            assert_eq!(zones.resolve(zone.as_ref()).unwrap().0, zone);
            assert!(!zones.payload(zone).is_empty());
        }
    }

    #[test]
    fn test_unknown_zones() {
        let zones = ZoneMap::default();

        for zone in ["bogus", "", "RED", " red", "green", "spend"] {
            assert_eq!(zones.resolve(zone), Err(UnknownZone(zone.to_owned())));
        }
    }

    #[test]
    fn test_overrides() {
        let overrides = ZonePayloads {
            center: Some("<HOME>".into()),
            ..Default::default()
        };
        let zones = ZoneMap::new(&overrides);

        assert_eq!(zones.payload(Zone::Center), b"<HOME>");
        assert_eq!(zones.payload(Zone::Red), b"<RED>");
    }

    #[test]
    fn test_choices() {
        assert_eq!(Zone::from_choice("spend"), Some(Zone::Red));
        assert_eq!(Zone::from_choice("save"), Some(Zone::Blue));
        assert_eq!(Zone::from_choice("invest"), Some(Zone::Yellow));
        assert_eq!(Zone::from_choice("home"), None);
        assert_eq!(Zone::Yellow.meaning(), "invest");
        assert_eq!(Zone::Center.to_string(), "center");
    }
}

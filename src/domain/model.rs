use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

/// Vélib' 回傳的單一車型計數項目，例如 `{"mechanical": 3}`
pub type BikeTypeCount = BTreeMap<String, u32>;

/// Bike type labels found in `num_bikes_available_types`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BikeType {
    Mechanical,
    Ebike,
}

impl BikeType {
    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "mechanical" => Some(BikeType::Mechanical),
            "ebike" => Some(BikeType::Ebike),
            _ => None,
        }
    }
}

/// One station's status snapshot, as relayed to the backend.
///
/// Field names on the wire follow the upstream feed, except for the two derived
/// counts which keep the column names of the `stations` table. Decoding goes
/// through `RawStation`, so missing or `null` fields fall back to zero.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawStation")]
pub struct StationRecord {
    #[serde(rename = "stationCode")]
    pub station_code: String,
    pub station_id: i64,
    #[serde(rename = "numBikesAvailable")]
    pub num_bikes_available: u32,
    /// Consumed by [`StationRecord::apply_bike_type_counts`]; never serialized.
    #[serde(rename = "num_bikes_available_types", skip_serializing)]
    pub bike_types: Vec<BikeTypeCount>,
    #[serde(rename = "numDocksAvailable")]
    pub num_docks_available: u32,
    pub is_installed: u8,
    pub is_returning: u8,
    pub is_renting: u8,
    pub last_reported: i64,
    #[serde(rename = "NumMechanicalBikesAvailable")]
    pub num_mechanical_bikes_available: u32,
    #[serde(rename = "NumEBikesAvailable")]
    pub num_ebikes_available: u32,
}

/// Decoding shape of a station. The feed sends both `numDocksAvailable` and
/// `num_docks_available` (same for bikes); either one is enough, camelCase wins.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawStation {
    #[serde(rename = "stationCode", deserialize_with = "null_as_default")]
    station_code: String,
    #[serde(deserialize_with = "null_as_default")]
    station_id: i64,
    #[serde(rename = "numBikesAvailable")]
    bikes_camel: Option<u32>,
    #[serde(rename = "num_bikes_available")]
    bikes_snake: Option<u32>,
    #[serde(rename = "num_bikes_available_types", deserialize_with = "null_as_default")]
    bike_types: Vec<BikeTypeCount>,
    #[serde(rename = "numDocksAvailable")]
    docks_camel: Option<u32>,
    #[serde(rename = "num_docks_available")]
    docks_snake: Option<u32>,
    #[serde(deserialize_with = "null_as_default")]
    is_installed: u8,
    #[serde(deserialize_with = "null_as_default")]
    is_returning: u8,
    #[serde(deserialize_with = "null_as_default")]
    is_renting: u8,
    #[serde(deserialize_with = "null_as_default")]
    last_reported: i64,
    #[serde(rename = "NumMechanicalBikesAvailable", deserialize_with = "null_as_default")]
    num_mechanical_bikes_available: u32,
    #[serde(rename = "NumEBikesAvailable", deserialize_with = "null_as_default")]
    num_ebikes_available: u32,
}

impl From<RawStation> for StationRecord {
    fn from(raw: RawStation) -> Self {
        Self {
            station_code: raw.station_code,
            station_id: raw.station_id,
            num_bikes_available: raw.bikes_camel.or(raw.bikes_snake).unwrap_or_default(),
            bike_types: raw.bike_types,
            num_docks_available: raw.docks_camel.or(raw.docks_snake).unwrap_or_default(),
            is_installed: raw.is_installed,
            is_returning: raw.is_returning,
            is_renting: raw.is_renting,
            last_reported: raw.last_reported,
            num_mechanical_bikes_available: raw.num_mechanical_bikes_available,
            num_ebikes_available: raw.num_ebikes_available,
        }
    }
}

// null 視為零值；型別不符仍然回報錯誤
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

impl StationRecord {
    /// Copies the nested per-type counts into the flat fields.
    ///
    /// Entries are visited in payload order, so a repeated label overwrites the
    /// earlier one. Unknown labels are ignored and a missing label leaves the
    /// field untouched.
    pub fn apply_bike_type_counts(&mut self) {
        for entry in &self.bike_types {
            for (label, count) in entry {
                match BikeType::from_label(label) {
                    Some(BikeType::Mechanical) => self.num_mechanical_bikes_available = *count,
                    Some(BikeType::Ebike) => self.num_ebikes_available = *count,
                    None => {}
                }
            }
        }
    }

    pub fn installed(&self) -> bool {
        self.is_installed != 0
    }

    pub fn returning(&self) -> bool {
        self.is_returning != 0
    }

    pub fn renting(&self) -> bool {
        self.is_renting != 0
    }

    pub fn last_reported_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.last_reported, 0)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedData {
    pub stations: Vec<StationRecord>,
}

/// `station_status.json` envelope. Other top-level keys (`lastUpdatedOther`, `ttl`) are ignored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StationFeed {
    pub data: FeedData,
}

impl StationFeed {
    pub fn apply_bike_type_counts(&mut self) {
        for station in &mut self.data.stations {
            station.apply_bike_type_counts();
        }
    }

    pub fn into_stations(self) -> Vec<StationRecord> {
        self.data.stations
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn station_with_types(bike_types: Vec<BikeTypeCount>) -> StationRecord {
        StationRecord {
            station_code: "16107".to_string(),
            station_id: 213688169,
            num_bikes_available: 5,
            bike_types,
            num_docks_available: 30,
            is_installed: 1,
            is_returning: 1,
            is_renting: 0,
            last_reported: 1_700_000_000,
            num_mechanical_bikes_available: 0,
            num_ebikes_available: 0,
        }
    }

    fn entry(label: &str, count: u32) -> BikeTypeCount {
        BikeTypeCount::from([(label.to_string(), count)])
    }

    #[test]
    fn test_empty_bike_types_keep_zero_counts() {
        let mut station = station_with_types(vec![]);
        station.apply_bike_type_counts();

        assert_eq!(station.num_mechanical_bikes_available, 0);
        assert_eq!(station.num_ebikes_available, 0);
    }

    #[test]
    fn test_unknown_label_is_ignored() {
        let mut station = station_with_types(vec![
            entry("mechanical", 2),
            entry("scooter", 9),
            entry("ebike", 1),
        ]);
        station.apply_bike_type_counts();

        assert_eq!(station.num_mechanical_bikes_available, 2);
        assert_eq!(station.num_ebikes_available, 1);
    }

    #[test]
    fn test_only_unknown_label_leaves_defaults() {
        let mut station = station_with_types(vec![entry("scooter", 4)]);
        station.apply_bike_type_counts();

        assert_eq!(station.num_mechanical_bikes_available, 0);
        assert_eq!(station.num_ebikes_available, 0);
    }

    #[test]
    fn test_repeated_label_last_one_wins() {
        let mut station = station_with_types(vec![
            entry("ebike", 7),
            entry("mechanical", 3),
            entry("ebike", 4),
        ]);
        station.apply_bike_type_counts();

        assert_eq!(station.num_mechanical_bikes_available, 3);
        assert_eq!(station.num_ebikes_available, 4);
    }

    #[test]
    fn test_decode_feed_station() {
        let json = serde_json::json!({
            "stationCode": "16107",
            "station_id": 213688169,
            "num_bikes_available": 3,
            "numBikesAvailable": 3,
            "num_bikes_available_types": [{"mechanical": 2}, {"ebike": 1}],
            "num_docks_available": 32,
            "numDocksAvailable": 32,
            "is_installed": 1,
            "is_returning": 1,
            "is_renting": 1,
            "last_reported": 1697462400
        });

        let mut station: StationRecord = serde_json::from_value(json).unwrap();
        station.apply_bike_type_counts();

        assert_eq!(station.station_code, "16107");
        assert_eq!(station.num_bikes_available, 3);
        assert_eq!(station.num_docks_available, 32);
        assert_eq!(station.num_mechanical_bikes_available, 2);
        assert_eq!(station.num_ebikes_available, 1);
        assert!(station.installed() && station.returning() && station.renting());
        assert_eq!(
            station.last_reported_at().unwrap().to_rfc3339(),
            "2023-10-16T13:20:00+00:00"
        );
    }

    #[test]
    fn test_decode_snake_case_only_station() {
        let json = serde_json::json!({
            "stationCode": "1",
            "station_id": 1,
            "num_bikes_available": 3,
            "num_docks_available": 32,
            "is_installed": 1,
            "is_returning": 1,
            "is_renting": 1,
            "last_reported": 0
        });

        let station: StationRecord = serde_json::from_value(json).unwrap();

        assert_eq!(station.num_bikes_available, 3);
        assert_eq!(station.num_docks_available, 32);
    }

    #[test]
    fn test_camel_case_count_wins_over_snake_case() {
        let json = serde_json::json!({
            "stationCode": "1",
            "station_id": 1,
            "num_bikes_available": 1,
            "numBikesAvailable": 4,
            "num_docks_available": 2,
            "numDocksAvailable": 9
        });

        let station: StationRecord = serde_json::from_value(json).unwrap();

        assert_eq!(station.num_bikes_available, 4);
        assert_eq!(station.num_docks_available, 9);
    }

    #[test]
    fn test_missing_and_null_fields_decode_as_zero() {
        let json = serde_json::json!({
            "stationCode": "42",
            "station_id": 42,
            "numBikesAvailable": null,
            "num_bikes_available_types": null,
            "is_installed": 1,
            "is_renting": null,
            "last_reported": null
        });

        let station: StationRecord = serde_json::from_value(json).unwrap();

        assert_eq!(station.station_code, "42");
        assert_eq!(station.num_bikes_available, 0);
        assert_eq!(station.num_docks_available, 0);
        assert!(station.bike_types.is_empty());
        assert!(station.installed());
        assert!(!station.returning());
        assert!(!station.renting());
        assert_eq!(station.last_reported, 0);
    }

    #[test]
    fn test_type_mismatch_still_fails() {
        let json = serde_json::json!({"stationCode": 16107, "station_id": 1});
        assert!(serde_json::from_value::<StationRecord>(json).is_err());

        let json = serde_json::json!({"stationCode": "1", "last_reported": "yesterday"});
        assert!(serde_json::from_value::<StationRecord>(json).is_err());
    }

    #[test]
    fn test_serialized_record_excludes_nested_types() {
        let mut station = station_with_types(vec![entry("mechanical", 2), entry("ebike", 3)]);
        station.apply_bike_type_counts();

        let value = serde_json::to_value(&station).unwrap();
        let object = value.as_object().unwrap();

        assert!(!object.contains_key("num_bikes_available_types"));
        assert_eq!(object["NumMechanicalBikesAvailable"], 2);
        assert_eq!(object["NumEBikesAvailable"], 3);
        assert_eq!(object["stationCode"], "16107");
    }

    #[test]
    fn test_round_trip_keeps_flags_and_counts() {
        let mut station = station_with_types(vec![entry("mechanical", 6), entry("ebike", 8)]);
        station.apply_bike_type_counts();

        let json = serde_json::to_string(&station).unwrap();
        let decoded: StationRecord = serde_json::from_str(&json).unwrap();

        assert_eq!(decoded.station_id, station.station_id);
        assert_eq!(decoded.num_bikes_available, station.num_bikes_available);
        assert_eq!(decoded.num_docks_available, station.num_docks_available);
        assert_eq!(decoded.is_installed, station.is_installed);
        assert_eq!(decoded.is_returning, station.is_returning);
        assert_eq!(decoded.is_renting, station.is_renting);
        assert_eq!(decoded.last_reported, station.last_reported);
        assert_eq!(decoded.num_mechanical_bikes_available, 6);
        assert_eq!(decoded.num_ebikes_available, 8);
        assert!(decoded.bike_types.is_empty());
    }

    proptest! {
        #[test]
        fn prop_derived_counts_match_entries(mechanical in 0u32..500, ebike in 0u32..500, ebike_first: bool) {
            let types = if ebike_first {
                vec![entry("ebike", ebike), entry("mechanical", mechanical)]
            } else {
                vec![entry("mechanical", mechanical), entry("ebike", ebike)]
            };
            let mut station = station_with_types(types);
            station.apply_bike_type_counts();

            prop_assert_eq!(station.num_mechanical_bikes_available, mechanical);
            prop_assert_eq!(station.num_ebikes_available, ebike);
        }
    }
}

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Average daily min/max temperatures for a city restricted to one
/// calendar month across the fixed historical range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyProfile {
    pub city: String,
    pub month: u32,
    pub min_temp_avg: f64,
    pub max_temp_avg: f64,
}

/// The month whose averages most closely match the requested comfort
/// range, with the component and overall differences.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BestTravelMonth {
    pub city: String,
    pub best_month: u32,
    pub min_temp_diff: f64,
    pub max_temp_diff: f64,
    pub overall_diff: f64,
}

/// Per-city entry of a comparison.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CityStats {
    pub min_temp_avg: f64,
    pub max_temp_avg: f64,
}

/// Multi-city comparison for one month. City names are used verbatim as
/// keys, so a repeated input city overwrites its own entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CityComparison {
    pub month: u32,
    #[serde(flatten)]
    pub cities: BTreeMap<String, CityStats>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_comparison_flattens_city_keys() {
        let mut cities = BTreeMap::new();
        cities.insert(
            "London".to_string(),
            CityStats {
                min_temp_avg: 12.3,
                max_temp_avg: 21.8,
            },
        );

        let comparison = CityComparison { month: 7, cities };
        let json = serde_json::to_value(&comparison).unwrap();

        assert_eq!(json["month"], 7);
        assert_eq!(json["London"]["min_temp_avg"], 12.3);
        assert_eq!(json["London"]["max_temp_avg"], 21.8);
    }

    #[test]
    fn test_profile_serialization_shape() {
        let profile = MonthlyProfile {
            city: "Paris".to_string(),
            month: 3,
            min_temp_avg: 4.56,
            max_temp_avg: 12.01,
        };

        let json = serde_json::to_string(&profile).unwrap();
        assert!(json.contains("\"city\":\"Paris\""));
        assert!(json.contains("\"month\":3"));
    }
}

use serde::{Deserialize, Serialize};

/// An airport as selected in the booking forms and returned by the lookup API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Airport {
    pub iata_code: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub city_name: String,
    #[serde(default)]
    pub country_name: String,
}

impl Airport {
    /// Human readable location, e.g. `Barcelona (BCN), Spain`.
    #[must_use]
    pub fn location(&self) -> String {
        format!("{} ({}), {}", self.city_name, self.iata_code, self.country_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_location_format() {
        let airport = Airport {
            iata_code: "BCN".into(),
            name: "El Prat".into(),
            city_name: "Barcelona".into(),
            country_name: "Spain".into(),
        };
        assert_eq!(airport.location(), "Barcelona (BCN), Spain");
    }
}

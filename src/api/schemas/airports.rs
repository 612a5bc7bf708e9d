use crate::domain::airport::Airport;
use serde::{Deserialize, Serialize};

#[derive(Debug, Default, Deserialize)]
pub struct AirportQuery {
    #[serde(default)]
    pub keyword: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AirportAddress {
    pub city_name: String,
    pub country_name: String,
}

/// Airport record as the booking forms expect it: flat fields plus the
/// nested address block.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AirportResponse {
    pub iata_code: String,
    pub name: String,
    pub city_name: String,
    pub country_name: String,
    pub address: AirportAddress,
}

impl From<Airport> for AirportResponse {
    fn from(a: Airport) -> Self {
        Self {
            address: AirportAddress { city_name: a.city_name.clone(), country_name: a.country_name.clone() },
            iata_code: a.iata_code,
            name: a.name,
            city_name: a.city_name,
            country_name: a.country_name,
        }
    }
}

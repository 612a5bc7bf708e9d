use crate::domain::airport::Airport;
use crate::domain::submission::{
    AirClaimRequest, AirTicketRequest, ContactRequest, FlightSegment, PassengerCounts, TripType, ValidationError,
};
use lettre::Address;
use serde::{Deserialize, Deserializer, Serialize};

/// Collects required fields in declaration order so the rejection can name
/// everything that is missing at once.
#[derive(Debug, Default)]
struct Required {
    missing: Vec<&'static str>,
}

impl Required {
    fn take(&mut self, field: &'static str, value: Option<String>) -> String {
        match present(value) {
            Some(v) => v,
            None => {
                self.missing.push(field);
                String::new()
            }
        }
    }

    fn finish(self) -> Result<(), ValidationError> {
        if self.missing.is_empty() { Ok(()) } else { Err(ValidationError::MissingFields(self.missing)) }
    }
}

/// Trims and drops empty or whitespace-only values.
fn present(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn parse_email(raw: &str) -> Result<Address, ValidationError> {
    raw.parse().map_err(|_| ValidationError::InvalidEmail)
}

/// Accepts `"2"` as well as `2`.
fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Number(serde_json::Number),
    }

    Ok(Option::<Raw>::deserialize(deserializer)?.map(|raw| match raw {
        Raw::Text(s) => s,
        Raw::Number(n) => n.to_string(),
    }))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactPayload {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub subject: Option<String>,
    pub message: Option<String>,
}

impl TryFrom<ContactPayload> for ContactRequest {
    type Error = ValidationError;

    fn try_from(p: ContactPayload) -> Result<Self, Self::Error> {
        let mut required = Required::default();
        let name = required.take("name", p.name);
        let email = required.take("email", p.email);
        let subject = required.take("subject", p.subject);
        let message = required.take("message", p.message);
        required.finish()?;

        Ok(Self { name, email: parse_email(&email)?, phone: present(p.phone), subject, message })
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct FlightSegmentPayload {
    pub from: Option<Airport>,
    pub to: Option<Airport>,
    pub date: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct PassengerCountsPayload {
    #[serde(default)]
    pub adult: u32,
    #[serde(default)]
    pub child: u32,
    #[serde(default)]
    pub infant: u32,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AirTicketPayload {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub trip_type: Option<String>,
    pub from_airport: Option<Airport>,
    pub to_airport: Option<Airport>,
    pub departure_date: Option<String>,
    pub return_date: Option<String>,
    #[serde(default)]
    pub flight_segments: Vec<FlightSegmentPayload>,
    pub passenger_counts: Option<PassengerCountsPayload>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub baggage: Option<String>,
}

impl TryFrom<AirTicketPayload> for AirTicketRequest {
    type Error = ValidationError;

    fn try_from(p: AirTicketPayload) -> Result<Self, Self::Error> {
        let mut required = Required::default();
        let first_name = required.take("firstName", p.first_name);
        let last_name = required.take("lastName", p.last_name);
        let email = required.take("email", p.email);
        let trip_type = required.take("tripType", p.trip_type);
        required.finish()?;

        let email = parse_email(&email)?;
        let trip_type: TripType = trip_type.parse()?;

        Ok(Self {
            first_name,
            last_name,
            email,
            phone: present(p.phone),
            trip_type,
            from_airport: p.from_airport,
            to_airport: p.to_airport,
            departure_date: present(p.departure_date),
            return_date: present(p.return_date),
            flight_segments: p
                .flight_segments
                .into_iter()
                .map(|s| FlightSegment { from: s.from, to: s.to, date: present(s.date) })
                .collect(),
            passenger_counts: p
                .passenger_counts
                .map(|c| PassengerCounts { adult: c.adult, child: c.child, infant: c.infant }),
            baggage: present(p.baggage),
        })
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AirClaimPayload {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub flight_number: Option<String>,
    pub departure_airport: Option<String>,
    pub arrival_airport: Option<String>,
    pub flight_date: Option<String>,
    pub issue_type: Option<String>,
    pub description: Option<String>,
    pub booking_reference: Option<String>,
}

impl TryFrom<AirClaimPayload> for AirClaimRequest {
    type Error = ValidationError;

    fn try_from(p: AirClaimPayload) -> Result<Self, Self::Error> {
        let mut required = Required::default();
        let first_name = required.take("firstName", p.first_name);
        let last_name = required.take("lastName", p.last_name);
        let email = required.take("email", p.email);
        let flight_number = required.take("flightNumber", p.flight_number);
        required.finish()?;

        Ok(Self {
            first_name,
            last_name,
            email: parse_email(&email)?,
            phone: present(p.phone),
            flight_number,
            departure_airport: present(p.departure_airport),
            arrival_airport: present(p.arrival_airport),
            flight_date: present(p.flight_date),
            issue_type: present(p.issue_type),
            description: present(p.description),
            booking_reference: present(p.booking_reference),
        })
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct FormResponse {
    pub success: bool,
    pub message: String,
}

impl FormResponse {
    #[must_use]
    pub fn accepted(message: &str) -> Self {
        Self { success: true, message: message.to_string() }
    }
}

use crate::domain::airport::Airport;
use crate::domain::request_log::LogEndpoint;
use lettre::Address;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Missing required fields")]
    MissingFields(Vec<&'static str>),
    #[error("Invalid email address")]
    InvalidEmail,
    #[error("Invalid trip type")]
    InvalidTripType,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TripType {
    RoundTrip,
    OneWay,
    MultiCity,
}

impl TripType {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::RoundTrip => "Round Trip",
            Self::OneWay => "One Way",
            Self::MultiCity => "Multi City",
        }
    }
}

impl std::str::FromStr for TripType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "roundTrip" => Ok(Self::RoundTrip),
            "oneWay" => Ok(Self::OneWay),
            "multiCity" => Ok(Self::MultiCity),
            _ => Err(ValidationError::InvalidTripType),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlightSegment {
    pub from: Option<Airport>,
    pub to: Option<Airport>,
    pub date: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PassengerCounts {
    pub adult: u32,
    pub child: u32,
    pub infant: u32,
}

impl PassengerCounts {
    #[must_use]
    pub const fn total(&self) -> u32 {
        self.adult.saturating_add(self.child).saturating_add(self.infant)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactRequest {
    pub name: String,
    pub email: Address,
    pub phone: Option<String>,
    pub subject: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AirTicketRequest {
    pub first_name: String,
    pub last_name: String,
    pub email: Address,
    pub phone: Option<String>,
    pub trip_type: TripType,
    pub from_airport: Option<Airport>,
    pub to_airport: Option<Airport>,
    pub departure_date: Option<String>,
    pub return_date: Option<String>,
    pub flight_segments: Vec<FlightSegment>,
    pub passenger_counts: Option<PassengerCounts>,
    pub baggage: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AirClaimRequest {
    pub first_name: String,
    pub last_name: String,
    pub email: Address,
    pub phone: Option<String>,
    pub flight_number: String,
    pub departure_airport: Option<String>,
    pub arrival_airport: Option<String>,
    pub flight_date: Option<String>,
    pub issue_type: Option<String>,
    pub description: Option<String>,
    pub booking_reference: Option<String>,
}

/// A validated lead-capture form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormSubmission {
    Contact(ContactRequest),
    AirTicket(AirTicketRequest),
    AirClaim(AirClaimRequest),
}

impl FormSubmission {
    #[must_use]
    pub const fn email(&self) -> &Address {
        match self {
            Self::Contact(c) => &c.email,
            Self::AirTicket(t) => &t.email,
            Self::AirClaim(c) => &c.email,
        }
    }

    #[must_use]
    pub const fn endpoint(&self) -> LogEndpoint {
        match self {
            Self::Contact(_) => LogEndpoint::Contact,
            Self::AirTicket(_) => LogEndpoint::AirTicket,
            Self::AirClaim(_) => LogEndpoint::AirClaim,
        }
    }

    /// Response message returned to the browser once the form is accepted.
    #[must_use]
    pub const fn acknowledgement(&self) -> &'static str {
        match self {
            Self::Contact(_) => "Contact form processed successfully",
            Self::AirTicket(_) => "Air ticket form processed successfully",
            Self::AirClaim(_) => "Air claim form processed successfully",
        }
    }

    /// One-line description used in the request log.
    #[must_use]
    pub fn summary(&self) -> String {
        match self {
            Self::Contact(c) => format!("{}, subject: {}", c.email, c.subject),
            Self::AirTicket(t) => format!("{}, trip type: {}", t.email, t.trip_type.label()),
            Self::AirClaim(c) => format!("{}, flight number: {}", c.email, c.flight_number),
        }
    }
}

/// A raw notification request: the caller supplies the rendered HTML.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailRequest {
    pub to: Address,
    pub subject: String,
    pub html: String,
}

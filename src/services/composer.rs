use crate::domain::airport::Airport;
use crate::domain::message::OutboundMessage;
use crate::domain::submission::{
    AirClaimRequest, AirTicketRequest, ContactRequest, EmailRequest, FormSubmission, PassengerCounts, TripType,
};
use lettre::Address;
use minijinja::Environment;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{Date, OffsetDateTime};

pub const NOT_PROVIDED: &str = "Not provided";

pub const CONTACT_SUBJECT: &str = "Contact Form Submission Confirmation";
pub const AIR_TICKET_SUBJECT: &str = "Flight Quote Request Confirmation";
pub const AIR_CLAIM_SUBJECT: &str = "Flight Claim Request Confirmation";

const TEMPLATES: [(&str, &str); 6] = [
    ("layout.html", include_str!("templates/layout.html")),
    ("macros.html", include_str!("templates/macros.html")),
    ("personal.html", include_str!("templates/personal.html")),
    ("contact.html", include_str!("templates/contact.html")),
    ("air_ticket.html", include_str!("templates/air_ticket.html")),
    ("air_claim.html", include_str!("templates/air_claim.html")),
];

/// Builds transport-ready messages. No I/O and no failure path once constructed.
///
/// Form confirmations go to the submitter and blind-copy the operational
/// mailbox; raw e-mail requests carbon-copy it. Bodies are rendered from the
/// `.html` templates, so every interpolated value is auto-escaped.
#[derive(Clone)]
pub struct Composer {
    operations_address: Address,
    brand: String,
    templates: Arc<Environment<'static>>,
}

impl fmt::Debug for Composer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Composer")
            .field("operations_address", &self.operations_address)
            .field("brand", &self.brand)
            .finish_non_exhaustive()
    }
}

impl Composer {
    /// # Errors
    /// Returns an error if one of the bundled templates fails to parse.
    pub fn new(operations_address: Address, brand: impl Into<String>) -> Result<Self, minijinja::Error> {
        let mut env = Environment::new();
        for (name, source) in TEMPLATES {
            env.add_template(name, source)?;
        }
        Ok(Self { operations_address, brand: brand.into(), templates: Arc::new(env) })
    }

    #[must_use]
    pub const fn operations_address(&self) -> &Address {
        &self.operations_address
    }

    #[must_use]
    pub fn compose(&self, submission: &FormSubmission) -> OutboundMessage {
        let (subject, body) = match submission {
            FormSubmission::Contact(c) => (CONTACT_SUBJECT, self.render("contact.html", &self.contact_view(c))),
            FormSubmission::AirTicket(t) => (AIR_TICKET_SUBJECT, self.render("air_ticket.html", &self.air_ticket_view(t))),
            FormSubmission::AirClaim(c) => (AIR_CLAIM_SUBJECT, self.render("air_claim.html", &self.air_claim_view(c))),
        };

        OutboundMessage::builder(submission.email().clone(), subject, body)
            .bcc(self.operations_address.clone())
            .reply_to(self.operations_address.clone())
            .build()
    }

    #[must_use]
    pub fn compose_email(&self, request: &EmailRequest) -> OutboundMessage {
        OutboundMessage::builder(request.to.clone(), request.subject.clone(), request.html.clone())
            .cc(self.operations_address.clone())
            .reply_to(self.operations_address.clone())
            .build()
    }

    fn render(&self, name: &str, view: &impl Serialize) -> String {
        match self.templates.get_template(name).and_then(|t| t.render(view)) {
            Ok(html) => html,
            Err(e) => {
                tracing::error!(error = %e, template = name, "Failed to render confirmation body");
                String::new()
            }
        }
    }

    fn contact_view<'a>(&'a self, c: &'a ContactRequest) -> ContactView<'a> {
        ContactView {
            brand: &self.brand,
            title: "Contact Form Submission",
            name: &c.name,
            email: c.email.to_string(),
            phone: or_placeholder(c.phone.as_deref()),
            subject: contact_subject_label(&c.subject),
            message_lines: c.message.lines().collect(),
        }
    }

    fn air_ticket_view<'a>(&'a self, t: &'a AirTicketRequest) -> AirTicketView<'a> {
        let location = |airport: Option<&Airport>| or_placeholder(airport.map(Airport::location).as_deref());
        let date = |raw: Option<&str>| or_placeholder(raw.map(format_date).as_deref());
        let count = |f: fn(&PassengerCounts) -> u32| or_placeholder(t.passenger_counts.as_ref().map(|c| f(c).to_string()).as_deref());

        let segments = (t.trip_type == TripType::MultiCity).then(|| {
            t.flight_segments
                .iter()
                .map(|s| SegmentView {
                    origin: location(s.from.as_ref()),
                    destination: location(s.to.as_ref()),
                    date: date(s.date.as_deref()),
                })
                .collect()
        });

        AirTicketView {
            brand: &self.brand,
            title: "Flight Quote Request",
            personal: personal_view(&t.first_name, &t.last_name, &t.email, t.phone.as_deref()),
            not_provided: NOT_PROVIDED,
            trip_type: t.trip_type.label(),
            origin: location(t.from_airport.as_ref()),
            destination: location(t.to_airport.as_ref()),
            departure: date(t.departure_date.as_deref()),
            return_date: (t.trip_type == TripType::RoundTrip).then(|| date(t.return_date.as_deref())),
            segments,
            total_passengers: count(PassengerCounts::total),
            adults: count(|c| c.adult),
            children: count(|c| c.child),
            infants: count(|c| c.infant),
            baggage: or_placeholder(t.baggage.as_deref().map(baggage_label).as_deref()),
        }
    }

    fn air_claim_view<'a>(&'a self, c: &'a AirClaimRequest) -> AirClaimView<'a> {
        AirClaimView {
            brand: &self.brand,
            title: "Flight Claim Request",
            personal: personal_view(&c.first_name, &c.last_name, &c.email, c.phone.as_deref()),
            flight_number: &c.flight_number,
            origin: or_placeholder(c.departure_airport.as_deref()),
            destination: or_placeholder(c.arrival_airport.as_deref()),
            date: or_placeholder(c.flight_date.as_deref().map(format_date).as_deref()),
            booking_reference: or_placeholder(c.booking_reference.as_deref()),
            issue: or_placeholder(c.issue_type.as_deref().map(issue_type_label)),
            description: or_placeholder(c.description.as_deref()),
        }
    }
}

#[derive(Serialize)]
struct ContactView<'a> {
    brand: &'a str,
    title: &'static str,
    name: &'a str,
    email: String,
    phone: String,
    subject: &'static str,
    message_lines: Vec<&'a str>,
}

#[derive(Serialize)]
struct PersonalView {
    full_name: String,
    email: String,
    phone: String,
}

#[derive(Serialize)]
struct SegmentView {
    origin: String,
    destination: String,
    date: String,
}

#[derive(Serialize)]
struct AirTicketView<'a> {
    brand: &'a str,
    title: &'static str,
    #[serde(flatten)]
    personal: PersonalView,
    not_provided: &'static str,
    trip_type: &'static str,
    origin: String,
    destination: String,
    departure: String,
    return_date: Option<String>,
    segments: Option<Vec<SegmentView>>,
    total_passengers: String,
    adults: String,
    children: String,
    infants: String,
    baggage: String,
}

#[derive(Serialize)]
struct AirClaimView<'a> {
    brand: &'a str,
    title: &'static str,
    #[serde(flatten)]
    personal: PersonalView,
    flight_number: &'a str,
    origin: String,
    destination: String,
    date: String,
    booking_reference: String,
    issue: String,
    description: String,
}

fn personal_view(first_name: &str, last_name: &str, email: &Address, phone: Option<&str>) -> PersonalView {
    PersonalView {
        full_name: format!("{first_name} {last_name}"),
        email: email.to_string(),
        phone: or_placeholder(phone),
    }
}

/// Blank or absent values render as the placeholder.
fn or_placeholder(value: Option<&str>) -> String {
    value.map(str::trim).filter(|v| !v.is_empty()).unwrap_or(NOT_PROVIDED).to_string()
}

fn contact_subject_label(code: &str) -> &'static str {
    match code {
        "booking" => "New Booking",
        "support" => "Travel Support",
        "partnership" => "Business Partnership",
        "feedback" => "Feedback",
        _ => "Other",
    }
}

fn issue_type_label(code: &str) -> &'static str {
    match code {
        "delay" => "Flight Delay",
        "cancellation" => "Flight Cancellation",
        "denied-boarding" => "Denied Boarding",
        "baggage" => "Baggage Issue",
        _ => "Other",
    }
}

fn baggage_label(code: &str) -> String {
    match code {
        "1" => "1 bag (23kg)".to_string(),
        "2" | "3" => format!("{code} bags (23kg each)"),
        _ => "No checked baggage".to_string(),
    }
}

/// Renders `2025-06-01` or an RFC 3339 timestamp as `June 1, 2025`; anything
/// else is returned unchanged.
fn format_date(raw: &str) -> String {
    let date = OffsetDateTime::parse(raw, &Rfc3339)
        .map(OffsetDateTime::date)
        .or_else(|_| Date::parse(raw, format_description!("[year]-[month]-[day]")));

    match date {
        Ok(d) => format!("{} {}, {}", d.month(), d.day(), d.year()),
        Err(_) => raw.to_string(),
    }
}

use crate::adapters::airports::AmadeusClient;
use crate::domain::airport::Airport;
use std::sync::Arc;

pub const MIN_KEYWORD_LEN: usize = 2;

/// Airport search for the booking forms. Never fails: an unconfigured
/// client, a short keyword or an upstream error all yield no results.
#[derive(Clone, Debug)]
pub struct AirportService {
    client: Option<Arc<AmadeusClient>>,
}

impl AirportService {
    #[must_use]
    pub const fn new(client: Option<Arc<AmadeusClient>>) -> Self {
        Self { client }
    }

    #[must_use]
    pub const fn is_configured(&self) -> bool {
        self.client.is_some()
    }

    #[tracing::instrument(skip(self))]
    pub async fn search(&self, keyword: &str) -> Vec<Airport> {
        let keyword = keyword.trim();
        if keyword.chars().count() < MIN_KEYWORD_LEN {
            return Vec::new();
        }

        let Some(client) = &self.client else {
            tracing::debug!("Airport lookup is not configured");
            return Vec::new();
        };

        match client.search(keyword).await {
            Ok(airports) => airports,
            Err(e) => {
                tracing::warn!(error = %e, "Error searching airports");
                Vec::new()
            }
        }
    }
}

//! Ticket catalog: feeds that supply offering records and the in-memory
//! catalog the purchase store owns.

use crate::error::CatalogError;
use crate::types::{Lamports, OfferingId, TicketOffering};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// One offering as a feed supplies it
///
/// Prices are in SOL and showtimes are RFC 3339 strings; both are validated
/// when the catalog is built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OfferingRecord {
    /// Catalog id
    pub id: u32,
    /// Film title
    pub title: String,
    /// Synopsis
    pub description: String,
    /// Price in SOL
    pub price: f64,
    /// Poster image URL
    pub image: String,
    /// RFC 3339 start time
    pub showtime: String,
    /// Theater name
    pub theater: String,
    /// Seat label
    pub seat: String,
}

impl OfferingRecord {
    fn into_offering(self) -> Result<TicketOffering, CatalogError> {
        let offering_id = OfferingId::new(self.id);
        let price = Lamports::from_sol(self.price).ok_or(CatalogError::InvalidPrice {
            offering_id,
            price: self.price,
        })?;
        let showtime = DateTime::parse_from_rfc3339(&self.showtime)
            .map_err(|_| CatalogError::InvalidShowtime {
                offering_id,
                showtime: self.showtime.clone(),
            })?
            .with_timezone(&Utc);

        Ok(TicketOffering::new(
            offering_id,
            self.title,
            self.description,
            self.image,
            self.theater,
            self.seat,
            price,
            showtime,
        ))
    }
}

/// Source of offering records
pub trait CatalogFeed {
    /// Load every record, in display order
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError`] if the feed cannot be read or parsed.
    fn records(&self) -> Result<Vec<OfferingRecord>, CatalogError>;
}

/// The three built-in showtimes
#[derive(Debug, Clone, Copy, Default)]
pub struct StaticCatalogFeed;

impl CatalogFeed for StaticCatalogFeed {
    fn records(&self) -> Result<Vec<OfferingRecord>, CatalogError> {
        Ok(vec![
            OfferingRecord {
                id: 1,
                title: "Avatar: The Way of Water".to_string(),
                description: "Set more than a decade after the events of the first film, \
                              Avatar: The Way of Water begins to tell the story of the Sully family."
                    .to_string(),
                price: 0.5,
                image: "https://images.unsplash.com/photo-1635805737707-575885ab0820?w=400&h=600&fit=crop"
                    .to_string(),
                showtime: "2024-01-15T19:00:00Z".to_string(),
                theater: "AMC Century City".to_string(),
                seat: "A12".to_string(),
            },
            OfferingRecord {
                id: 2,
                title: "Top Gun: Maverick".to_string(),
                description: "After thirty years, Maverick is still pushing the envelope as a top \
                              naval aviator, but must confront ghosts of his past."
                    .to_string(),
                price: 0.3,
                image: "https://images.unsplash.com/photo-1574269909862-7e1d70bb8078?w=400&h=600&fit=crop"
                    .to_string(),
                showtime: "2024-01-16T20:30:00Z".to_string(),
                theater: "Regal LA Live".to_string(),
                seat: "B8".to_string(),
            },
            OfferingRecord {
                id: 3,
                title: "Black Panther: Wakanda Forever".to_string(),
                description: "The nation of Wakanda is pitted against intervening world powers as \
                              they mourn the loss of their king T'Challa."
                    .to_string(),
                price: 0.4,
                image: "https://images.unsplash.com/photo-1635805737707-575885ab0820?w=400&h=600&fit=crop"
                    .to_string(),
                showtime: "2024-01-17T18:00:00Z".to_string(),
                theater: "Cinemark Baldwin Hills".to_string(),
                seat: "C15".to_string(),
            },
        ])
    }
}

/// JSON file holding an array of [`OfferingRecord`]s
#[derive(Debug, Clone)]
pub struct JsonCatalogFeed {
    path: PathBuf,
}

impl JsonCatalogFeed {
    /// Feed backed by the file at `path`
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl CatalogFeed for JsonCatalogFeed {
    fn records(&self) -> Result<Vec<OfferingRecord>, CatalogError> {
        let raw = std::fs::read_to_string(&self.path)?;
        let records = serde_json::from_str(&raw)?;
        tracing::debug!(path = %self.path.display(), "Loaded catalog feed");
        Ok(records)
    }
}

/// Offerings keyed by id, listed in feed order
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    order: Vec<OfferingId>,
    offerings: HashMap<OfferingId, TicketOffering>,
}

impl Catalog {
    /// Build a catalog from validated offerings
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::DuplicateId`] if two offerings share an id.
    pub fn from_offerings(
        offerings: impl IntoIterator<Item = TicketOffering>,
    ) -> Result<Self, CatalogError> {
        let mut catalog = Self::default();
        for offering in offerings {
            let offering_id = offering.id;
            if catalog.offerings.insert(offering_id, offering).is_some() {
                return Err(CatalogError::DuplicateId { offering_id });
            }
            catalog.order.push(offering_id);
        }
        Ok(catalog)
    }

    /// Load and validate every record from `feed`
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError`] if the feed fails, a price or showtime is
    /// invalid, or an id repeats.
    pub fn load(feed: &impl CatalogFeed) -> Result<Self, CatalogError> {
        let offerings = feed
            .records()?
            .into_iter()
            .map(OfferingRecord::into_offering)
            .collect::<Result<Vec<_>, _>>()?;
        let catalog = Self::from_offerings(offerings)?;
        tracing::info!(offerings = catalog.len(), "Catalog loaded");
        Ok(catalog)
    }

    /// Offerings in feed order
    pub fn list(&self) -> impl Iterator<Item = &TicketOffering> {
        self.order.iter().filter_map(|id| self.offerings.get(id))
    }

    /// Offering by id
    #[must_use]
    pub fn get(&self, id: OfferingId) -> Option<&TicketOffering> {
        self.offerings.get(&id)
    }

    pub(crate) fn get_mut(&mut self, id: OfferingId) -> Option<&mut TicketOffering> {
        self.offerings.get_mut(&id)
    }

    /// Number of offerings
    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// True if the catalog has no offerings
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

//! Presentation helpers for issued tickets: share text, explorer links and
//! the ticket detail card.

use crate::types::{Lamports, TicketOffering, TokenClassHandle};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Block explorer to link tickets to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Explorer {
    /// Explorer origin, e.g. `https://explorer.solana.com`
    pub base_url: String,
    /// Cluster query parameter, e.g. `devnet`
    pub cluster: String,
}

impl Default for Explorer {
    fn default() -> Self {
        Self {
            base_url: crate::config::DEFAULT_EXPLORER_URL.to_string(),
            cluster: crate::config::DEFAULT_CLUSTER.to_string(),
        }
    }
}

/// Text a buyer can paste to show off their ticket.
#[must_use]
pub fn share_text(offering: &TicketOffering, token: &TokenClassHandle) -> String {
    format!(
        "I just bought a movie ticket NFT for {}! 🎬\nMint Address: {token}",
        offering.title
    )
}

/// Explorer page for a ticket token.
#[must_use]
pub fn explorer_url(explorer: &Explorer, token: &TokenClassHandle) -> String {
    format!(
        "{}/address/{token}?cluster={}",
        explorer.base_url.trim_end_matches('/'),
        explorer.cluster
    )
}

/// Everything the ticket card shows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TicketDetails {
    /// Film title
    pub title: String,
    /// Theater name
    pub theater: String,
    /// Start of the screening
    pub showtime: DateTime<Utc>,
    /// Seat label
    pub seat: String,
    /// Price paid
    pub price_paid: Lamports,
    /// Ticket token class
    pub mint_address: TokenClassHandle,
    /// Network the ticket lives on
    pub network: String,
    /// Token program
    pub token_standard: String,
    /// Units in existence
    pub supply: u64,
}

impl TicketDetails {
    /// Card for an issued offering; `None` until it is issued.
    #[must_use]
    pub fn for_offering(offering: &TicketOffering, network: &str) -> Option<Self> {
        let token = offering.token_identifier()?;
        Some(Self {
            title: offering.title.clone(),
            theater: offering.theater.clone(),
            showtime: offering.showtime,
            seat: offering.seat.clone(),
            price_paid: offering.price,
            mint_address: token.clone(),
            network: network.to_string(),
            token_standard: "SPL Token".to_string(),
            supply: 1,
        })
    }
}

impl fmt::Display for TicketDetails {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "🎫 {}", self.title)?;
        writeln!(f, "Theater: {}", self.theater)?;
        writeln!(f, "Showtime: {}", self.showtime.format("%Y-%m-%d %H:%M UTC"))?;
        writeln!(f, "Seat: {}", self.seat)?;
        writeln!(f, "Price Paid: {}", self.price_paid)?;
        writeln!(f, "Mint Address: {}", self.mint_address)?;
        writeln!(f, "Network: {}", self.network)?;
        writeln!(f, "Token Standard: {}", self.token_standard)?;
        write!(f, "Supply: {} (Unique NFT)", self.supply)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::catalog::{Catalog, StaticCatalogFeed};
    use crate::types::OfferingId;

    fn avatar() -> TicketOffering {
        Catalog::load(&StaticCatalogFeed)
            .unwrap()
            .get(OfferingId::new(1))
            .cloned()
            .unwrap()
    }

    #[test]
    fn test_share_text() {
        let text = share_text(&avatar(), &TokenClassHandle::from("MINT123"));
        assert_eq!(
            text,
            "I just bought a movie ticket NFT for Avatar: The Way of Water! 🎬\nMint Address: MINT123"
        );
    }

    #[test]
    fn test_explorer_url() {
        let token = TokenClassHandle::from("MINT123");
        assert_eq!(
            explorer_url(&Explorer::default(), &token),
            "https://explorer.solana.com/address/MINT123?cluster=devnet"
        );

        let local = Explorer {
            base_url: "http://localhost:3000/".to_string(),
            cluster: "custom".to_string(),
        };
        assert_eq!(
            explorer_url(&local, &token),
            "http://localhost:3000/address/MINT123?cluster=custom"
        );
    }

    #[test]
    fn test_details_only_for_issued_offerings() {
        let mut offering = avatar();
        assert!(TicketDetails::for_offering(&offering, "Solana Devnet").is_none());

        offering.mark_issued(TokenClassHandle::from("MINT123"));
        let details = TicketDetails::for_offering(&offering, "Solana Devnet").unwrap();
        assert_eq!(details.supply, 1);
        assert_eq!(details.token_standard, "SPL Token");
        assert_eq!(details.price_paid, Lamports::new(500_000_000));

        let card = details.to_string();
        assert!(card.contains("Showtime: 2024-01-15 19:00 UTC"));
        assert!(card.contains("Price Paid: 0.5 SOL"));
        assert!(card.ends_with("Supply: 1 (Unique NFT)"));
    }
}

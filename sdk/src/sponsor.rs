//! Sponsor resolution
//!
//! A payment names its sponsor by username. The username is looked up in a
//! [`SponsorLookup`]; with no username the configured [`DefaultSponsor`] is
//! used instead, either a fixed address or another username to look up.

use crate::error::{DinsyError, Result};
use serde::Serialize;
use std::collections::HashMap;
use std::future::Future;
use tracing::{debug, warn};

/// Source of sponsor wallet addresses keyed by username
pub trait SponsorLookup: Send + Sync {
    /// Wallet of `username`, or `None` when the username is unknown
    fn sponsor_wallet(&self, username: &str) -> impl Future<Output = Result<Option<String>>> + Send;
}

/// In-memory sponsor table
#[derive(Debug, Clone, Default)]
pub struct SponsorDirectory {
    wallets: HashMap<String, String>,
}

impl SponsorDirectory {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_sponsor(mut self, username: &str, wallet: &str) -> Self {
        self.insert(username, wallet);
        self
    }

    pub fn insert(&mut self, username: &str, wallet: &str) {
        self.wallets
            .insert(username.trim().to_string(), wallet.trim().to_string());
    }
}

impl SponsorLookup for SponsorDirectory {
    async fn sponsor_wallet(&self, username: &str) -> Result<Option<String>> {
        Ok(self.wallets.get(username.trim()).cloned())
    }
}

/// Sponsor used when the payer names nobody
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DefaultSponsor<'a> {
    /// Look this username up like any named sponsor
    Username(&'a str),
    /// Pay this address directly
    Address(&'a str),
}

/// Where the sponsor share is going
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedSponsor {
    /// `None` when a fixed default sponsor address was used
    pub username: Option<String>,
    pub address: String,
}

async fn lookup_sponsor<L: SponsorLookup>(lookup: &L, username: &str) -> Result<ResolvedSponsor> {
    match lookup.sponsor_wallet(username).await? {
        Some(wallet) if !wallet.trim().is_empty() => {
            debug!(
                service = "dinsy-sdk",
                component = "sponsor",
                event = "sponsor_resolved",
                username = %username,
                address = %wallet,
                "Resolved sponsor wallet"
            );
            Ok(ResolvedSponsor {
                username: Some(username.to_string()),
                address: wallet.trim().to_string(),
            })
        }
        _ => {
            warn!(
                service = "dinsy-sdk",
                component = "sponsor",
                event = "sponsor_not_found",
                username = %username,
                "Sponsor username has no wallet"
            );
            Err(DinsyError::SponsorNotFound(username.to_string()))
        }
    }
}

/// Resolve the sponsor destination for a payment
///
/// # Errors
/// Returns `SponsorNotFound` when the named (or default) username resolves to
/// no wallet
pub async fn resolve_sponsor_address<L: SponsorLookup>(
    lookup: &L,
    username: Option<&str>,
    default: DefaultSponsor<'_>,
) -> Result<ResolvedSponsor> {
    if let Some(username) = username.map(str::trim).filter(|u| !u.is_empty()) {
        return lookup_sponsor(lookup, username).await;
    }

    match default {
        DefaultSponsor::Address(address) => {
            debug!(
                service = "dinsy-sdk",
                component = "sponsor",
                event = "default_sponsor",
                address = %address,
                "No sponsor supplied, using default sponsor address"
            );
            Ok(ResolvedSponsor {
                username: None,
                address: address.trim().to_string(),
            })
        }
        DefaultSponsor::Username(username) => {
            debug!(
                service = "dinsy-sdk",
                component = "sponsor",
                event = "default_sponsor",
                username = %username,
                "No sponsor supplied, looking up default sponsor"
            );
            lookup_sponsor(lookup, username.trim()).await
        }
    }
}

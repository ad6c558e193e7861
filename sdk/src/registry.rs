//! Membership registry HTTP client
//!
//! Thin client for the membership backend: sponsor wallet lookup, referral
//! links, wallet login checks, current plan and registration. Every call is a
//! single request; nothing is cached.

use crate::{
    error::{DinsyError, Result},
    plan::{current_plan, CurrentPlan},
    sponsor::SponsorLookup,
    tiers::TierCatalog,
    validation::is_valid_wallet_address,
};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Deserializer, Serialize};
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

/// Sponsor recorded when a registrant names none
pub const DEFAULT_SPONSOR_USERNAME: &str = "Master";

/// Public site base used for referral links
pub const DEFAULT_SITE_URL: &str = "https://dinsy.pro";

/// Build the referral link for `username`
///
/// # Example
/// ```
/// # use dinsy_sdk::registry::generate_referral_link;
/// # use url::Url;
/// let base = Url::parse("https://dinsy.pro").unwrap();
/// let link = generate_referral_link(&base, "alice").unwrap();
/// assert_eq!(link.as_str(), "https://dinsy.pro/home/auth?ref=alice");
/// ```
///
/// # Errors
/// Returns a URL error if the base cannot be joined
pub fn generate_referral_link(base: &Url, username: &str) -> Result<Url> {
    let mut link = base.join("/home/auth")?;
    link.query_pairs_mut().append_pair("ref", username.trim());
    Ok(link)
}

/// New member registration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Registration {
    pub first_name: String,
    pub last_name: String,
    pub username: String,
    #[serde(default)]
    pub sponsor: Option<String>,
    pub level: u32,
    pub wallet: String,
    #[serde(default)]
    pub ref_link: Option<String>,
}

impl Registration {
    /// Check required fields
    ///
    /// # Errors
    /// Returns a generic error naming the first missing or malformed field
    pub fn validate(&self) -> Result<()> {
        for (field, value) in [
            ("first name", &self.first_name),
            ("last name", &self.last_name),
            ("username", &self.username),
        ] {
            if value.trim().is_empty() {
                return Err(DinsyError::Generic(format!("{field} is required")));
            }
        }
        if !is_valid_wallet_address(&self.wallet) {
            return Err(DinsyError::Generic(format!(
                "wallet must be a 0x-prefixed 20-byte hex address, got: '{}'",
                self.wallet
            )));
        }
        Ok(())
    }

    /// Fill the default sponsor and referral link
    ///
    /// # Errors
    /// Returns a URL error if the referral link cannot be generated
    pub fn with_defaults(mut self, site: &Url) -> Result<Self> {
        if is_blank(self.sponsor.as_deref()) {
            self.sponsor = Some(DEFAULT_SPONSOR_USERNAME.to_string());
        }
        if is_blank(self.ref_link.as_deref()) {
            self.ref_link = Some(generate_referral_link(site, &self.username)?.to_string());
        }
        Ok(self)
    }
}

fn is_blank(value: Option<&str>) -> bool {
    value.map(str::trim).unwrap_or_default().is_empty()
}

fn level_from_number_or_string<'de, D>(deserializer: D) -> std::result::Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(u32),
        Text(String),
    }

    match Option::<Raw>::deserialize(deserializer)? {
        Some(Raw::Number(level)) => Ok(Some(level)),
        Some(Raw::Text(text)) => text
            .trim()
            .parse()
            .map(Some)
            .map_err(serde::de::Error::custom),
        None => Ok(None),
    }
}

/// Stored member record
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RegisteredUser {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub username: Option<String>,
    pub sponsor: Option<String>,
    #[serde(deserialize_with = "level_from_number_or_string")]
    pub level: Option<u32>,
    pub wallet: Option<String>,
    pub ref_link: Option<String>,
}

/// Result of a wallet login check
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletRegistration {
    pub is_registered: bool,
    #[serde(default)]
    pub user: Option<RegisteredUser>,
}

#[derive(Deserialize)]
struct SponsorWalletResponse {
    #[serde(default)]
    wallet: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RefLinkResponse {
    ref_link: String,
}

/// Response to a successful registration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationReceipt {
    #[serde(default)]
    pub message: String,
    pub ref_link: String,
}

/// HTTP client for the membership backend
#[derive(Debug, Clone)]
pub struct RegistryClient {
    client: Client,
    base_url: Url,
}

impl RegistryClient {
    /// # Errors
    /// Returns an error if the base URL is invalid or the client cannot be built
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(Url::parse(base_url)?, client))
    }

    #[must_use]
    pub const fn with_client(base_url: Url, client: Client) -> Self {
        Self { client, base_url }
    }

    #[must_use]
    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Endpoint URL with query parameters
    ///
    /// # Errors
    /// Returns a URL error if the path cannot be joined
    pub fn endpoint(&self, path: &str, query: &[(&str, &str)]) -> Result<Url> {
        let mut url = self.base_url.join(path)?;
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query);
        }
        Ok(url)
    }

    /// Look up a sponsor's wallet; `None` when the username is unknown
    ///
    /// # Errors
    /// Returns an error on transport failure or a non-404 error status
    pub async fn fetch_sponsor_wallet(&self, username: &str) -> Result<Option<String>> {
        let url = self.endpoint("/api/getsponsorWallets", &[("username", username)])?;
        debug!(
            service = "dinsy-sdk",
            component = "registry",
            event = "sponsor_lookup",
            username = %username,
            "Looking up sponsor wallet"
        );

        let response = self.client.get(url).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let body: SponsorWalletResponse = response.error_for_status()?.json().await?;
        Ok(body.wallet.filter(|w| !w.trim().is_empty()))
    }

    /// Referral link stored for `username` (the backend generates one if absent)
    ///
    /// # Errors
    /// Returns an error on transport failure or an error status
    pub async fn ref_link(&self, username: &str) -> Result<String> {
        let url = self.endpoint("/api/auth", &[("username", username)])?;
        let body: RefLinkResponse = self
            .client
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(body.ref_link)
    }

    /// Whether `wallet` belongs to a registered member
    ///
    /// # Errors
    /// Returns an error on transport failure or an error status
    pub async fn wallet_registration(&self, wallet: &str) -> Result<WalletRegistration> {
        let url = self.endpoint("/api/auth", &[("wallet", wallet)])?;
        Ok(self
            .client
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?)
    }

    /// Plan held by the member behind `wallet`, free when unregistered
    ///
    /// # Errors
    /// Returns an error on transport failure or an error status
    pub async fn current_plan(&self, wallet: &str, tiers: &TierCatalog) -> Result<CurrentPlan> {
        let registration = self.wallet_registration(wallet).await?;
        let plan = current_plan(tiers, &registration);
        debug!(
            service = "dinsy-sdk",
            component = "registry",
            event = "current_plan",
            wallet = %wallet,
            label = plan.label,
            "Resolved current plan"
        );
        Ok(plan)
    }

    /// Register a new member
    ///
    /// # Errors
    /// Returns an error if the registration is incomplete, on transport
    /// failure or on an error status
    pub async fn register(&self, registration: Registration) -> Result<RegistrationReceipt> {
        registration.validate()?;
        let registration = registration.with_defaults(&self.base_url)?;
        let url = self.endpoint("/api/auth", &[])?;

        let receipt: RegistrationReceipt = self
            .client
            .post(url)
            .json(&registration)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        info!(
            service = "dinsy-sdk",
            component = "registry",
            event = "member_registered",
            username = %registration.username,
            level = registration.level,
            "Registered new member"
        );
        Ok(receipt)
    }
}

impl SponsorLookup for RegistryClient {
    async fn sponsor_wallet(&self, username: &str) -> Result<Option<String>> {
        self.fetch_sponsor_wallet(username).await
    }
}

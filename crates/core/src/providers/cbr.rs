use async_trait::async_trait;
use reqwest::Client;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
#[cfg(not(target_arch = "wasm32"))]
use std::time::Duration;

use crate::errors::CoreError;
use crate::models::currency::Currency;
use super::traits::RateProvider;

const DAILY_FEED_URL: &str = "https://www.cbr-xml-daily.ru/daily_json.js";
const PROVIDER_NAME: &str = "CBR";

/// Official daily rates of the Central Bank of Russia.
///
/// - **Free**: no API key.
/// - **Quotes**: already against RUB, which is the ledger's pivot.
/// - Some currencies are quoted per 10 or 100 units (`Nominal`); quotes are
///   normalized to one unit.
pub struct CbrProvider {
    client: Client,
    url: String,
}

impl CbrProvider {
    pub fn new() -> Self {
        Self::with_url(DAILY_FEED_URL)
    }

    /// Point the provider at a mirror of the daily feed.
    pub fn with_url(url: impl Into<String>) -> Self {
        let builder = Client::builder();
        #[cfg(not(target_arch = "wasm32"))]
        let builder = builder.timeout(Duration::from_secs(30));
        Self {
            client: builder.build().unwrap_or_else(|_| Client::new()),
            url: url.into(),
        }
    }
}

impl Default for CbrProvider {
    fn default() -> Self {
        Self::new()
    }
}

// ── Feed response types ─────────────────────────────────────────────

#[derive(Deserialize)]
struct DailyFeed {
    #[serde(rename = "Valute")]
    valute: HashMap<String, Quote>,
}

#[derive(Deserialize)]
struct Quote {
    #[serde(rename = "CharCode")]
    char_code: String,
    #[serde(rename = "Nominal")]
    nominal: u32,
    #[serde(rename = "Value")]
    value: Decimal,
}

/// Turn the daily feed document into per-unit RUB rates.
/// Entries with a zero nominal or a non-positive value are skipped.
pub fn parse_daily_feed(json: &str) -> Result<BTreeMap<Currency, Decimal>, CoreError> {
    let feed: DailyFeed = serde_json::from_str(json).map_err(|e| CoreError::Api {
        provider: PROVIDER_NAME.into(),
        message: format!("Failed to parse daily feed: {e}"),
    })?;

    let rates = feed
        .valute
        .into_values()
        .filter(|quote| quote.nominal > 0 && quote.value > Decimal::ZERO)
        .filter_map(|quote| {
            let rate = quote.value.checked_div(Decimal::from(quote.nominal))?;
            Some((Currency::new(&quote.char_code), rate))
        })
        .filter(|(currency, _)| !currency.as_str().is_empty())
        .collect();

    Ok(rates)
}

#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
impl RateProvider for CbrProvider {
    fn name(&self) -> &str {
        PROVIDER_NAME
    }

    async fn fetch_rates(&self) -> Result<BTreeMap<Currency, Decimal>, CoreError> {
        let body = self
            .client
            .get(&self.url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        let rates = parse_daily_feed(&body)?;
        if rates.is_empty() {
            return Err(CoreError::Api {
                provider: PROVIDER_NAME.into(),
                message: "Daily feed contained no usable quotes".into(),
            });
        }
        tracing::debug!(count = rates.len(), "fetched CBR daily rates");
        Ok(rates)
    }
}

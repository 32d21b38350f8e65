use serde::Deserialize;

use crate::bot::error::Error;

const API_BASE: &str = "https://api.dexscreener.com/latest/dex/pairs/ton";

/// Price-change windows the inline keyboard offers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Timeframe {
    M5,
    M30,
    H1,
    D1,
    All,
}

impl Timeframe {
    pub const ALL: [Timeframe; 5] = [
        Timeframe::M5,
        Timeframe::M30,
        Timeframe::H1,
        Timeframe::D1,
        Timeframe::All,
    ];

    pub fn from_callback(data: &str) -> Option<Self> {
        match data {
            "tf_5m" => Some(Timeframe::M5),
            "tf_30m" => Some(Timeframe::M30),
            "tf_1h" => Some(Timeframe::H1),
            "tf_1d" => Some(Timeframe::D1),
            "tf_all" => Some(Timeframe::All),
            _ => None,
        }
    }

    pub fn callback(self) -> &'static str {
        match self {
            Timeframe::M5 => "tf_5m",
            Timeframe::M30 => "tf_30m",
            Timeframe::H1 => "tf_1h",
            Timeframe::D1 => "tf_1d",
            Timeframe::All => "tf_all",
        }
    }

    pub fn button_label(self) -> &'static str {
        match self {
            Timeframe::M5 => "5M 📊",
            Timeframe::M30 => "30M 📈",
            Timeframe::H1 => "1H 📉",
            Timeframe::D1 => "1D 💹",
            Timeframe::All => "ALL 📊",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Timeframe::M5 => "5 minutes",
            Timeframe::M30 => "30 minutes",
            Timeframe::H1 => "1 hour",
            Timeframe::D1 => "24 hours",
            Timeframe::All => "all time",
        }
    }
}

/// The slice of the DexScreener pair schema this bot consumes. Everything
/// is optional; the API omits fields freely.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PairData {
    pub price_usd: Option<String>,
    #[serde(default)]
    pub price_change: PriceChange,
    pub fdv: Option<f64>,
    pub liquidity: Option<Liquidity>,
    pub volume: Option<Volume>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PriceChange {
    pub m5: Option<f64>,
    pub m30: Option<f64>,
    pub h1: Option<f64>,
    pub h24: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Liquidity {
    pub usd: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Volume {
    pub h24: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct PairsResponse {
    pairs: Option<Vec<PairData>>,
}

impl PairData {
    pub fn price(&self) -> f64 {
        self.price_usd
            .as_deref()
            .and_then(|s| s.parse().ok())
            .unwrap_or(0.0)
    }

    /// Percent change over the chosen window; windows the API does not
    /// report read as zero. "All time" falls back to the daily change.
    pub fn change(&self, timeframe: Timeframe) -> f64 {
        let value = match timeframe {
            Timeframe::M5 => self.price_change.m5,
            Timeframe::M30 => self.price_change.m30,
            Timeframe::H1 => self.price_change.h1,
            Timeframe::D1 | Timeframe::All => self.price_change.h24,
        };
        value.unwrap_or(0.0)
    }

    pub fn market_cap(&self) -> f64 {
        self.fdv.unwrap_or(0.0)
    }

    pub fn liquidity_usd(&self) -> f64 {
        self.liquidity.as_ref().and_then(|l| l.usd).unwrap_or(0.0)
    }

    pub fn volume_24h(&self) -> f64 {
        self.volume.as_ref().and_then(|v| v.h24).unwrap_or(0.0)
    }
}

/// Fetch the first pair for the configured address.
pub async fn fetch_pair(client: &reqwest::Client, pair_address: &str) -> Result<PairData, Error> {
    let url = format!("{API_BASE}/{pair_address}");
    let response: PairsResponse = client
        .get(&url)
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;

    response
        .pairs
        .and_then(|pairs| pairs.into_iter().next())
        .ok_or_else(|| Error::custom("price API returned no pairs"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_the_consumed_fields() {
        let raw = r#"{
            "pairs": [{
                "priceUsd": "0.004217",
                "priceChange": {"m5": 0.1, "h1": -2.5, "h24": 12.3},
                "fdv": 421700.0,
                "liquidity": {"usd": 98000.5},
                "volume": {"h24": 15000.0}
            }]
        }"#;
        let response: PairsResponse = serde_json::from_str(raw).unwrap();
        let pair = response.pairs.unwrap().into_iter().next().unwrap();

        assert!((pair.price() - 0.004217).abs() < 1e-12);
        assert_eq!(pair.change(Timeframe::H1), -2.5);
        // m30 is not reported by the API; it reads as zero.
        assert_eq!(pair.change(Timeframe::M30), 0.0);
        assert_eq!(pair.change(Timeframe::All), 12.3);
        assert_eq!(pair.market_cap(), 421700.0);
        assert_eq!(pair.liquidity_usd(), 98000.5);
        assert_eq!(pair.volume_24h(), 15000.0);
    }

    #[test]
    fn missing_everything_reads_as_zero() {
        let pair: PairData = serde_json::from_str("{}").unwrap();
        assert_eq!(pair.price(), 0.0);
        assert_eq!(pair.change(Timeframe::D1), 0.0);
        assert_eq!(pair.liquidity_usd(), 0.0);
    }

    #[test]
    fn callback_round_trip() {
        for tf in Timeframe::ALL {
            assert_eq!(Timeframe::from_callback(tf.callback()), Some(tf));
        }
        assert_eq!(Timeframe::from_callback("tf_bogus"), None);
    }
}

//! Option contract definitions
//!
//! A contract is one tradable listed option together with the market quote
//! observed for it at a point in time.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::greeks::Greeks;

/// Option kind (Call or Put)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OptionKind {
    Call,
    Put,
}

impl OptionKind {
    /// Payoff direction: +1 for call, -1 for put
    pub fn phi(&self) -> f64 {
        match self {
            OptionKind::Call => 1.0,
            OptionKind::Put => -1.0,
        }
    }

    /// Intrinsic value at given spot
    pub fn intrinsic(&self, spot: f64, strike: f64) -> f64 {
        match self {
            OptionKind::Call => (spot - strike).max(0.0),
            OptionKind::Put => (strike - spot).max(0.0),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            OptionKind::Call => "C",
            OptionKind::Put => "P",
        }
    }
}

/// One option instrument and its quote.
///
/// Optional market fields (`last`, `volume`, `open_interest`,
/// `implied_volatility`, `greeks`) may be absent in raw data. The chain
/// validator resolves them: missing volume and open interest become 0,
/// missing IV is solved from the mid, missing Greeks are computed from the
/// pricing model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionContract {
    /// Underlying symbol (e.g. "AAPL")
    pub underlying: String,
    /// Expiration date
    pub expiration: NaiveDate,
    /// Strike price
    pub strike: f64,
    /// Call or put
    pub kind: OptionKind,
    /// Bid price
    #[serde(default)]
    pub bid: f64,
    /// Ask price
    #[serde(default)]
    pub ask: f64,
    /// Last traded price
    #[serde(default)]
    pub last: Option<f64>,
    /// Traded volume (0 when absent)
    #[serde(default)]
    pub volume: Option<u64>,
    /// Open interest (0 when absent)
    #[serde(default)]
    pub open_interest: Option<u64>,
    /// Implied volatility as a decimal (0.30 = 30%)
    #[serde(default)]
    pub implied_volatility: Option<f64>,
    /// Greeks as quoted or recomputed
    #[serde(default)]
    pub greeks: Option<Greeks>,
    /// Underlying spot at quote time
    pub underlying_price: f64,
    /// Quote timestamp
    pub quote_time: DateTime<Utc>,
    /// Synthesized by the gap filler rather than observed
    #[serde(default)]
    pub interpolated: bool,
}

impl OptionContract {
    /// Create a contract with an empty quote
    pub fn new(
        underlying: impl Into<String>,
        expiration: NaiveDate,
        strike: f64,
        kind: OptionKind,
        underlying_price: f64,
        quote_time: DateTime<Utc>,
    ) -> Self {
        Self {
            underlying: underlying.into(),
            expiration,
            strike,
            kind,
            bid: 0.0,
            ask: 0.0,
            last: None,
            volume: None,
            open_interest: None,
            implied_volatility: None,
            greeks: None,
            underlying_price,
            quote_time,
            interpolated: false,
        }
    }

    /// Builder-style quote setter
    pub fn with_quote(mut self, bid: f64, ask: f64) -> Self {
        self.bid = bid;
        self.ask = ask;
        self
    }

    /// Builder-style activity setter
    pub fn with_activity(mut self, volume: u64, open_interest: u64) -> Self {
        self.volume = Some(volume);
        self.open_interest = Some(open_interest);
        self
    }

    pub fn with_iv(mut self, iv: f64) -> Self {
        self.implied_volatility = Some(iv);
        self
    }

    pub fn with_greeks(mut self, greeks: Greeks) -> Self {
        self.greeks = Some(greeks);
        self
    }

    /// Traded volume, 0 when absent
    pub fn volume(&self) -> u64 {
        self.volume.unwrap_or(0)
    }

    /// Open interest, 0 when absent
    pub fn open_interest(&self) -> u64 {
        self.open_interest.unwrap_or(0)
    }

    /// Mid price
    pub fn mid(&self) -> f64 {
        (self.bid + self.ask) / 2.0
    }

    /// Bid-ask spread
    pub fn spread(&self) -> f64 {
        self.ask - self.bid
    }

    /// Relative spread (spread / mid), None when the mid is not positive
    pub fn spread_ratio(&self) -> Option<f64> {
        let mid = self.mid();
        if mid > 0.0 && mid.is_finite() {
            Some(self.spread() / mid)
        } else {
            None
        }
    }

    /// Two-sided, uncrossed, positive quote
    pub fn has_valid_quote(&self) -> bool {
        self.bid.is_finite() && self.ask.is_finite() && self.bid > 0.0 && self.ask > self.bid
    }

    /// Calendar days from the quote date to expiration
    pub fn days_to_expiration(&self) -> i64 {
        (self.expiration - self.quote_time.date_naive()).num_days()
    }

    /// Time to expiry in years (ACT/365)
    pub fn time_to_expiry(&self) -> f64 {
        self.days_to_expiration() as f64 / 365.0
    }

    /// Moneyness K/S
    pub fn moneyness(&self, spot: f64) -> f64 {
        self.strike / spot
    }

    /// Is this option in the money?
    pub fn is_itm(&self, spot: f64) -> bool {
        match self.kind {
            OptionKind::Call => spot > self.strike,
            OptionKind::Put => spot < self.strike,
        }
    }

    /// Is this option at the money (within relative tolerance)?
    pub fn is_atm(&self, spot: f64, tolerance: f64) -> bool {
        (self.strike - spot).abs() / spot < tolerance
    }

    /// Is this option out of the money?
    pub fn is_otm(&self, spot: f64) -> bool {
        !self.is_itm(spot) && !self.is_atm(spot, 0.01)
    }

    /// Short display label, e.g. "AAPL 2025-06-20 150C"
    pub fn label(&self) -> String {
        format!(
            "{} {} {}{}",
            self.underlying,
            self.expiration,
            self.strike,
            self.kind.label()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn contract(strike: f64, kind: OptionKind) -> OptionContract {
        let quote_time = Utc.with_ymd_and_hms(2025, 1, 20, 15, 30, 0).unwrap();
        let expiry = NaiveDate::from_ymd_opt(2025, 6, 20).unwrap();
        OptionContract::new("QQQ", expiry, strike, kind, 500.0, quote_time)
    }

    #[test]
    fn test_option_kind() {
        assert_eq!(OptionKind::Call.phi(), 1.0);
        assert_eq!(OptionKind::Put.phi(), -1.0);

        assert_eq!(OptionKind::Call.intrinsic(110.0, 100.0), 10.0);
        assert_eq!(OptionKind::Put.intrinsic(90.0, 100.0), 10.0);
        assert_eq!(OptionKind::Call.intrinsic(90.0, 100.0), 0.0);
    }

    #[test]
    fn test_time_to_expiry() {
        let opt = contract(500.0, OptionKind::Call);

        assert_eq!(opt.days_to_expiration(), 151);
        // ~5 months = ~0.41 years
        let tte = opt.time_to_expiry();
        assert!(tte > 0.4 && tte < 0.42);
    }

    #[test]
    fn test_quote_fields() {
        let opt = contract(500.0, OptionKind::Call).with_quote(10.0, 10.5);

        assert!(opt.has_valid_quote());
        assert!((opt.mid() - 10.25).abs() < 1e-12);
        assert!((opt.spread() - 0.5).abs() < 1e-12);
        assert!((opt.spread_ratio().unwrap() - 0.5 / 10.25).abs() < 1e-12);

        let crossed = contract(500.0, OptionKind::Call).with_quote(1.0, 1.0);
        assert!(!crossed.has_valid_quote());
        assert_eq!(crossed.volume(), 0);
        assert_eq!(crossed.open_interest(), 0);
    }

    #[test]
    fn test_moneyness() {
        let opt = contract(500.0, OptionKind::Call);

        assert!(opt.is_atm(500.0, 0.01));
        assert!(opt.is_itm(510.0));
        assert!(opt.is_otm(490.0));
        assert!((opt.moneyness(400.0) - 1.25).abs() < 1e-12);
    }

    #[test]
    fn test_missing_fields_deserialize_with_defaults() {
        let json = r#"{
            "underlying": "QQQ",
            "expiration": "2025-06-20",
            "strike": 500.0,
            "kind": "put",
            "bid": 4.1,
            "ask": 4.3,
            "underlying_price": 501.2,
            "quote_time": "2025-01-20T15:30:00Z"
        }"#;

        let opt: OptionContract = serde_json::from_str(json).unwrap();
        assert_eq!(opt.kind, OptionKind::Put);
        assert_eq!(opt.volume, None);
        assert!(opt.greeks.is_none());
        assert!(!opt.interpolated);
    }
}

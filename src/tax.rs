//! Sales-tax rate lookup
//!
//! Rates are estimated per ZIP code by a [`TaxRateOracle`] and cached for
//! less than a day: an estimate exactly 24 hours old is asked for again.
//! Every failure degrades to a default rate instead of an error, so the
//! checkout estimate always has a number to show.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::cache::TtlCache;
use crate::vendors::TaxRateOracle;

/// Combined rate used when no estimate is available
pub const DEFAULT_TAX_RATE: f64 = 0.0875;

/// Answers above this are treated as nonsense
pub const MAX_TAX_RATE: f64 = 0.15;

pub const DEFAULT_CACHE_TTL_HOURS: i64 = 24;

/// Where a returned rate came from
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TaxRateLookup {
    Cached(f64),
    Estimated(f64),
    /// No oracle, or the oracle answered with an unusable value
    Default(f64),
    /// The oracle call failed
    Fallback(f64),
}

impl TaxRateLookup {
    pub fn rate(&self) -> f64 {
        match *self {
            TaxRateLookup::Cached(r)
            | TaxRateLookup::Estimated(r)
            | TaxRateLookup::Default(r)
            | TaxRateLookup::Fallback(r) => r,
        }
    }
}

/// JSON body returned by `GET /api/tax-rate`
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TaxRateResponse {
    pub tax_rate: f64,
    pub zip_code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cached: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<bool>,
}

impl TaxRateResponse {
    pub fn new(zip_code: &str, lookup: TaxRateLookup) -> Self {
        let mut response = Self {
            tax_rate: lookup.rate(),
            zip_code: zip_code.to_string(),
            cached: None,
            default: None,
            error: None,
        };
        match lookup {
            TaxRateLookup::Cached(_) => response.cached = Some(true),
            TaxRateLookup::Default(_) => response.default = Some(true),
            TaxRateLookup::Fallback(_) => response.error = Some(true),
            TaxRateLookup::Estimated(_) => {}
        }
        response
    }
}

/// Parse the longest leading decimal number of an oracle answer
///
/// Reads what `parseFloat` would: trailing text is ignored, so
/// `"0.1025 (10.25%)"` reads as 0.1025 and `"0.1.2"` as 0.1, and an
/// exponent is honoured (`"1e-1"` is 0.1).
pub fn parse_rate(answer: &str) -> Option<f64> {
    let answer = answer.trim_start();
    let bytes = answer.as_bytes();
    let digits = |mut i: usize| {
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
        }
        i
    };

    let mut end = 0;
    if matches!(bytes.first(), Some(b'+' | b'-')) {
        end = 1;
    }
    let int_end = digits(end);
    let mut mantissa_end = int_end;
    if bytes.get(int_end) == Some(&b'.') {
        mantissa_end = digits(int_end + 1);
    }
    // A lone sign or dot has no digits
    if !answer[end..mantissa_end].bytes().any(|b| b.is_ascii_digit()) {
        return None;
    }
    end = mantissa_end;

    if matches!(bytes.get(end), Some(b'e' | b'E')) {
        let mut exp = end + 1;
        if matches!(bytes.get(exp), Some(b'+' | b'-')) {
            exp += 1;
        }
        let exp_end = digits(exp);
        if exp_end > exp {
            end = exp_end;
        }
    }

    answer[..end].parse::<f64>().ok().filter(|r| r.is_finite())
}

pub struct TaxRateService {
    cache: Mutex<TtlCache<String, f64>>,
    oracle: Option<Arc<dyn TaxRateOracle>>,
    default_rate: f64,
    max_rate: f64,
}

impl TaxRateService {
    pub fn new(oracle: Option<Arc<dyn TaxRateOracle>>, cache_ttl: Duration) -> Self {
        Self {
            cache: Mutex::new(TtlCache::new(cache_ttl).strict()),
            oracle,
            default_rate: DEFAULT_TAX_RATE,
            max_rate: MAX_TAX_RATE,
        }
    }

    /// Builder method: override the default and maximum rates
    pub fn with_rates(mut self, default_rate: f64, max_rate: f64) -> Self {
        self.default_rate = default_rate;
        self.max_rate = max_rate;
        self
    }

    pub async fn lookup(&self, zip_code: &str) -> TaxRateLookup {
        self.lookup_at(zip_code, Utc::now()).await
    }

    pub async fn lookup_at(&self, zip_code: &str, now: DateTime<Utc>) -> TaxRateLookup {
        let key = zip_code.to_string();

        if let Some(rate) = self.cache.lock().await.get_at(&key, now) {
            return TaxRateLookup::Cached(rate);
        }

        let Some(oracle) = &self.oracle else {
            return TaxRateLookup::Default(self.default_rate);
        };

        let answer = match oracle.estimate(zip_code).await {
            Ok(answer) => answer,
            Err(e) => {
                tracing::error!(zip_code = %zip_code, error = %e, "Tax rate lookup failed");
                return TaxRateLookup::Fallback(self.default_rate);
            }
        };

        let mut cache = self.cache.lock().await;
        match parse_rate(&answer).filter(|r| *r >= 0.0 && *r <= self.max_rate) {
            Some(rate) => {
                cache.insert_at(key, rate, now);
                tracing::debug!(zip_code = %zip_code, rate, "Estimated tax rate");
                TaxRateLookup::Estimated(rate)
            }
            None => {
                tracing::warn!(zip_code = %zip_code, answer = %answer, "Unusable tax rate answer, using default");
                cache.insert_at(key, self.default_rate, now);
                TaxRateLookup::Default(self.default_rate)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vendors::fakes::FakeTaxOracle;
    use chrono::TimeZone;

    fn service(oracle: Arc<FakeTaxOracle>) -> TaxRateService {
        TaxRateService::new(Some(oracle), Duration::hours(DEFAULT_CACHE_TTL_HOURS))
    }

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 8, 0, 0).unwrap()
    }

    #[test]
    fn test_parse_rate() {
        assert_eq!(parse_rate("0.1025"), Some(0.1025));
        assert_eq!(parse_rate(" 0.0875\n"), Some(0.0875));
        assert_eq!(parse_rate("0.1025 (10.25%)"), Some(0.1025));
        assert_eq!(parse_rate("-0.5"), Some(-0.5));
        assert_eq!(parse_rate(".09"), Some(0.09));
        assert_eq!(parse_rate("9.50%"), Some(9.5));
        assert_eq!(parse_rate("about 9%"), None);
        assert_eq!(parse_rate(""), None);
        assert_eq!(parse_rate("-"), None);
        assert_eq!(parse_rate("."), None);
    }

    #[test]
    fn test_parse_rate_reads_leading_number() {
        assert_eq!(parse_rate("0.1.2"), Some(0.1));
        assert_eq!(parse_rate("1e-1"), Some(0.1));
        assert_eq!(parse_rate("8.75E-2 combined"), Some(0.0875));
        assert_eq!(parse_rate("0.09e"), Some(0.09));
        assert_eq!(parse_rate("0.09e-"), Some(0.09));
        assert_eq!(parse_rate("7."), Some(7.0));
    }

    #[tokio::test]
    async fn test_no_oracle_returns_default_uncached() {
        let service = TaxRateService::new(None, Duration::hours(24));
        assert_eq!(service.lookup("94704").await, TaxRateLookup::Default(DEFAULT_TAX_RATE));
        assert_eq!(service.lookup("94704").await, TaxRateLookup::Default(DEFAULT_TAX_RATE));
    }

    #[tokio::test]
    async fn test_estimate_is_cached() {
        let oracle = Arc::new(FakeTaxOracle::answering("0.1025"));
        let service = service(oracle.clone());

        assert_eq!(service.lookup_at("94704", t0()).await, TaxRateLookup::Estimated(0.1025));
        assert_eq!(
            service.lookup_at("94704", t0() + Duration::hours(23)).await,
            TaxRateLookup::Cached(0.1025)
        );
        assert_eq!(oracle.calls(), 1);

        // A day and a bit later the oracle is asked again
        let later = t0() + Duration::hours(24) + Duration::seconds(1);
        assert_eq!(service.lookup_at("94704", later).await, TaxRateLookup::Estimated(0.1025));
        assert_eq!(oracle.calls(), 2);
    }

    #[tokio::test]
    async fn test_estimate_expires_at_exactly_one_day() {
        let oracle = Arc::new(FakeTaxOracle::answering("0.0925"));
        let service = service(oracle.clone());

        service.lookup_at("90210", t0()).await;
        let almost = t0() + Duration::hours(24) - Duration::milliseconds(1);
        assert_eq!(service.lookup_at("90210", almost).await, TaxRateLookup::Cached(0.0925));

        let day = t0() + Duration::hours(24);
        assert_eq!(service.lookup_at("90210", day).await, TaxRateLookup::Estimated(0.0925));
        assert_eq!(oracle.calls(), 2);
    }

    #[tokio::test]
    async fn test_out_of_range_answer_caches_default() {
        let oracle = Arc::new(FakeTaxOracle::answering("0.25"));
        let service = service(oracle.clone());

        assert_eq!(service.lookup_at("10001", t0()).await, TaxRateLookup::Default(DEFAULT_TAX_RATE));
        assert_eq!(service.lookup_at("10001", t0()).await, TaxRateLookup::Cached(DEFAULT_TAX_RATE));
        assert_eq!(oracle.calls(), 1);
    }

    #[tokio::test]
    async fn test_garbage_answer_uses_default() {
        let oracle = Arc::new(FakeTaxOracle::answering("I am not sure"));
        let service = service(oracle);
        assert_eq!(service.lookup("60601").await, TaxRateLookup::Default(DEFAULT_TAX_RATE));
    }

    #[tokio::test]
    async fn test_oracle_error_falls_back_without_caching() {
        let oracle = Arc::new(FakeTaxOracle::failing());
        let service = service(oracle.clone());

        assert_eq!(service.lookup("94612").await, TaxRateLookup::Fallback(DEFAULT_TAX_RATE));
        assert_eq!(service.lookup("94612").await, TaxRateLookup::Fallback(DEFAULT_TAX_RATE));
        assert_eq!(oracle.calls(), 2);
    }

    #[test]
    fn test_response_flags() {
        let cached = serde_json::to_value(TaxRateResponse::new("94704", TaxRateLookup::Cached(0.1))).unwrap();
        assert_eq!(cached["cached"], true);
        assert_eq!(cached["zipCode"], "94704");
        assert!(cached.get("default").is_none());

        let estimated = serde_json::to_value(TaxRateResponse::new("94704", TaxRateLookup::Estimated(0.1))).unwrap();
        assert_eq!(estimated.as_object().unwrap().len(), 2);

        let fallback = serde_json::to_value(TaxRateResponse::new("94704", TaxRateLookup::Fallback(0.0875))).unwrap();
        assert_eq!(fallback["error"], true);
        assert_eq!(fallback["taxRate"], 0.0875);
    }
}

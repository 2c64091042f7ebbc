//! Volatility Surface
//!
//! Implied volatility on a strike × days-to-expiration grid. The grid is
//! complete (missing cells were filled at build time); an `observed` mask
//! records which cells came straight from quotes.
//!
//! Query policy: points inside the grid envelope
//! `[min strike, max strike] × [min dte, max dte]` are bilinearly
//! interpolated; anything outside returns `None`. There is no
//! extrapolation.

use chrono::{DateTime, NaiveDate, Utc};
use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::core::{AnalyticsError, AnalyticsResult};

use super::{SkewMetrics, TermStructure};

/// Relative distance from spot inside which a strike counts as at-the-money
pub const ATM_TOLERANCE: f64 = 0.01;

const AXIS_EPS: f64 = 1e-9;

/// Immutable implied volatility surface built from one validated snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VolatilitySurface {
    /// Underlying symbol
    pub underlying: String,
    /// Reference spot price
    pub spot: f64,
    /// Timestamp of the source snapshot
    pub snapshot_time: DateTime<Utc>,
    /// Strike axis, ascending
    pub strikes: Vec<f64>,
    /// Days-to-expiration axis, ascending
    pub days: Vec<f64>,
    /// Expiration dates matching `days`
    pub expirations: Vec<NaiveDate>,
    /// Volatility grid [strike, dte] -> vol
    pub vols: Array2<f64>,
    /// Cells taken directly from quoted contracts
    pub observed: Array2<bool>,
    /// Risk-free rate of the source snapshot
    pub risk_free_rate: f64,
    /// Dividend yield of the source snapshot
    pub dividend_yield: f64,
}

impl VolatilitySurface {
    /// Build surface from a complete grid
    #[allow(clippy::too_many_arguments)]
    pub fn from_grid(
        underlying: impl Into<String>,
        spot: f64,
        snapshot_time: DateTime<Utc>,
        strikes: Vec<f64>,
        days: Vec<f64>,
        expirations: Vec<NaiveDate>,
        vols: Array2<f64>,
        observed: Array2<bool>,
        rate: f64,
        div_yield: f64,
    ) -> Self {
        Self {
            underlying: underlying.into(),
            spot,
            snapshot_time,
            strikes,
            days,
            expirations,
            vols,
            observed,
            risk_free_rate: rate,
            dividend_yield: div_yield,
        }
    }

    /// Interpolated volatility at (strike, dte), None outside the grid envelope
    pub fn get_volatility(&self, strike: f64, dte: f64) -> Option<f64> {
        let (xi_lo, xi_hi, x_frac) = find_bracket(&self.strikes, strike)?;
        let (yi_lo, yi_hi, y_frac) = find_bracket(&self.days, dte)?;

        let v00 = self.vols[[xi_lo, yi_lo]];
        let v10 = self.vols[[xi_hi, yi_lo]];
        let v01 = self.vols[[xi_lo, yi_hi]];
        let v11 = self.vols[[xi_hi, yi_hi]];

        let v0 = v00 * (1.0 - x_frac) + v10 * x_frac;
        let v1 = v01 * (1.0 - x_frac) + v11 * x_frac;

        let vol = v0 * (1.0 - y_frac) + v1 * y_frac;
        vol.is_finite().then_some(vol)
    }

    /// Like [`get_volatility`](Self::get_volatility) but reports the
    /// out-of-domain case as an error
    pub fn volatility_checked(&self, strike: f64, dte: f64) -> AnalyticsResult<f64> {
        self.get_volatility(strike, dte).ok_or_else(|| {
            AnalyticsError::out_of_domain(format!(
                "({}, {}d) outside {} surface [{:?}] x [{:?}]",
                strike,
                dte,
                self.underlying,
                self.strike_range(),
                self.dte_range()
            ))
        })
    }

    /// Volatility at strike == spot
    pub fn get_atm_volatility(&self, dte: f64) -> Option<f64> {
        self.get_volatility(self.spot, dte)
    }

    /// OTM call and put wing vols relative to ATM at one expiry.
    ///
    /// Uses grid strikes above spot for the call wing and below spot for
    /// the put wing, ignoring strikes within [`ATM_TOLERANCE`] of spot.
    /// None when ATM or either wing is unavailable.
    pub fn calculate_skew(&self, dte: f64) -> Option<SkewMetrics> {
        let atm = self.get_atm_volatility(dte).filter(|v| *v > 0.0)?;

        let wing = |above: bool| -> Option<f64> {
            let vols: Vec<f64> = self
                .strikes
                .iter()
                .filter(|&&k| (k - self.spot).abs() / self.spot > ATM_TOLERANCE)
                .filter(|&&k| (k > self.spot) == above)
                .filter_map(|&k| self.get_volatility(k, dte))
                .collect();
            (!vols.is_empty()).then(|| vols.iter().sum::<f64>() / vols.len() as f64)
        };

        let call_skew_ratio = wing(true)? / atm;
        let put_skew_ratio = wing(false)? / atm;

        Some(SkewMetrics {
            call_skew_ratio,
            put_skew_ratio,
            net_skew: call_skew_ratio - put_skew_ratio,
        })
    }

    /// ATM vol per grid expiry
    pub fn atm_term_structure(&self) -> Vec<(f64, f64)> {
        self.days
            .iter()
            .filter_map(|&d| self.get_atm_volatility(d).map(|v| (d, v)))
            .collect()
    }

    /// Short-tenor vs long-tenor ATM vol over the grid's expiries.
    ///
    /// The first and last quartile of expiries (at least one each) form the
    /// short and long buckets. None with fewer than two ATM points.
    pub fn calculate_term_structure(&self) -> Option<TermStructure> {
        let points = self.atm_term_structure();
        let n = points.len();
        if n < 2 {
            return None;
        }

        let bucket = ((n as f64) / 4.0).ceil().max(1.0) as usize;
        let short = &points[..bucket];
        let long = &points[n - bucket..];

        let mean = |xs: &[(f64, f64)], pick: fn(&(f64, f64)) -> f64| {
            xs.iter().map(pick).sum::<f64>() / xs.len() as f64
        };

        let short_term_avg = mean(short, |p| p.1);
        let long_term_avg = mean(long, |p| p.1);
        let term_premium = long_term_avg - short_term_avg;

        let diffs: Vec<f64> = points.windows(2).map(|w| w[1].1 - w[0].1).collect();
        let diff_mean = diffs.iter().sum::<f64>() / diffs.len() as f64;
        let vol_of_vol = (diffs.iter().map(|d| (d - diff_mean).powi(2)).sum::<f64>()
            / diffs.len() as f64)
            .sqrt();

        let tenor_gap = mean(long, |p| p.0) - mean(short, |p| p.0);
        let slope = if tenor_gap.abs() > AXIS_EPS {
            term_premium / tenor_gap
        } else {
            0.0
        };

        Some(TermStructure {
            short_term_avg,
            long_term_avg,
            term_premium,
            vol_of_vol,
            slope,
        })
    }

    /// (strike, vol) pairs across the strike axis at one expiry
    pub fn smile(&self, dte: f64) -> Option<Vec<(f64, f64)>> {
        self.strikes
            .iter()
            .map(|&k| self.get_volatility(k, dte).map(|v| (k, v)))
            .collect()
    }

    /// Total variance σ²T at (strike, dte)
    pub fn total_variance(&self, strike: f64, dte: f64) -> Option<f64> {
        self.get_volatility(strike, dte)
            .map(|v| v * v * dte / 365.0)
    }

    /// Whether the grid node at (strike, dte) was quoted rather than filled
    pub fn is_observed(&self, strike: f64, dte: f64) -> Option<bool> {
        let xi = self.strikes.iter().position(|&k| (k - strike).abs() < AXIS_EPS)?;
        let yi = self.days.iter().position(|&d| (d - dte).abs() < AXIS_EPS)?;
        Some(self.observed[[xi, yi]])
    }

    /// Fraction of grid cells that were quoted
    pub fn observed_fraction(&self) -> f64 {
        let total = self.observed.len();
        if total == 0 {
            return 0.0;
        }
        self.observed.iter().filter(|&&o| o).count() as f64 / total as f64
    }

    pub fn strike_range(&self) -> Option<(f64, f64)> {
        Some((*self.strikes.first()?, *self.strikes.last()?))
    }

    pub fn dte_range(&self) -> Option<(f64, f64)> {
        Some((*self.days.first()?, *self.days.last()?))
    }
}

/// Bracketing indices and interpolation fraction, None outside the axis
fn find_bracket(axis: &[f64], value: f64) -> Option<(usize, usize, f64)> {
    if axis.is_empty() || !value.is_finite() {
        return None;
    }

    let first = axis[0];
    let last = axis[axis.len() - 1];
    if value < first - AXIS_EPS || value > last + AXIS_EPS {
        return None;
    }

    let value = value.clamp(first, last);
    let idx = axis.partition_point(|&x| x <= value);

    if idx >= axis.len() {
        let last = axis.len() - 1;
        return Some((last, last, 0.0));
    }

    // value >= axis[0] so idx >= 1
    let (lo, hi) = (idx - 1, idx);
    let frac = (value - axis[lo]) / (axis[hi] - axis[lo]);
    Some((lo, hi, frac))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::TimeZone;

    fn surface(vols: Array2<f64>, days: Vec<f64>) -> VolatilitySurface {
        let strikes = vec![90.0, 95.0, 100.0, 105.0, 110.0];
        let ts = Utc.with_ymd_and_hms(2025, 1, 2, 15, 0, 0).unwrap();
        let expirations = days
            .iter()
            .map(|&d| ts.date_naive() + chrono::Duration::days(d as i64))
            .collect();
        let observed = Array2::from_elem(vols.dim(), true);
        VolatilitySurface::from_grid(
            "TEST",
            100.0,
            ts,
            strikes,
            days,
            expirations,
            vols,
            observed,
            0.05,
            0.0,
        )
    }

    fn smile_surface() -> VolatilitySurface {
        // Put wing richer than call wing, vols rising with tenor
        let smile = [0.30, 0.27, 0.25, 0.24, 0.245];
        let days = vec![30.0, 60.0, 90.0, 180.0];
        let vols = Array2::from_shape_fn((5, 4), |(i, j)| smile[i] + 0.01 * j as f64);
        surface(vols, days)
    }

    #[test]
    fn test_flat_surface_interpolation() {
        let s = surface(Array2::from_elem((5, 3), 0.20), vec![30.0, 60.0, 90.0]);

        let vol = s.get_volatility(102.0, 45.0).unwrap();
        assert_relative_eq!(vol, 0.20, epsilon = 1e-12);
    }

    #[test]
    fn test_exact_at_nodes() {
        let s = smile_surface();
        for (i, &k) in s.strikes.iter().enumerate() {
            for (j, &d) in s.days.iter().enumerate() {
                assert_eq!(s.get_volatility(k, d).unwrap(), s.vols[[i, j]]);
            }
        }
    }

    #[test]
    fn test_bilinear_midpoint() {
        let s = smile_surface();
        let v = s.get_volatility(92.5, 45.0).unwrap();
        let expected = (0.30 + 0.27) / 2.0 + 0.005;
        assert_relative_eq!(v, expected, epsilon = 1e-12);
    }

    #[test]
    fn test_outside_envelope_is_undefined() {
        let s = smile_surface();
        assert!(s.get_volatility(85.0, 60.0).is_none());
        assert!(s.get_volatility(100.0, 10.0).is_none());
        assert!(s.get_volatility(100.0, 365.0).is_none());
        assert!(s.get_volatility(f64::NAN, 60.0).is_none());
        assert!(matches!(
            s.volatility_checked(120.0, 60.0),
            Err(AnalyticsError::OutOfDomain(_))
        ));
    }

    #[test]
    fn test_single_expiry_axis() {
        let s = surface(Array2::from_elem((5, 1), 0.3), vec![45.0]);
        assert_eq!(s.get_volatility(100.0, 45.0), Some(0.3));
        assert!(s.get_volatility(100.0, 46.0).is_none());
    }

    #[test]
    fn test_skew() {
        let s = smile_surface();
        let skew = s.calculate_skew(30.0).unwrap();

        assert_relative_eq!(skew.call_skew_ratio, (0.24 + 0.245) / 2.0 / 0.25, epsilon = 1e-12);
        assert_relative_eq!(skew.put_skew_ratio, (0.30 + 0.27) / 2.0 / 0.25, epsilon = 1e-12);
        assert!(skew.net_skew < 0.0);
    }

    #[test]
    fn test_skew_needs_both_wings() {
        let mut s = smile_surface();
        s.spot = 90.0;
        // no strikes below spot
        assert!(s.calculate_skew(30.0).is_none());
    }

    #[test]
    fn test_term_structure() {
        let s = smile_surface();
        let ts = s.calculate_term_structure().unwrap();

        // ATM: 0.25, 0.26, 0.27, 0.28 at 30/60/90/180 days
        assert_relative_eq!(ts.short_term_avg, 0.25, epsilon = 1e-12);
        assert_relative_eq!(ts.long_term_avg, 0.28, epsilon = 1e-12);
        assert_relative_eq!(ts.term_premium, 0.03, epsilon = 1e-12);
        assert_relative_eq!(ts.vol_of_vol, 0.0, epsilon = 1e-12);
        assert_relative_eq!(ts.slope, 0.03 / 150.0, epsilon = 1e-12);
    }

    #[test]
    fn test_term_structure_needs_two_expiries() {
        let s = surface(Array2::from_elem((5, 1), 0.3), vec![45.0]);
        assert!(s.calculate_term_structure().is_none());
    }

    #[test]
    fn test_smile_and_variance() {
        let s = smile_surface();
        let smile = s.smile(30.0).unwrap();
        assert_eq!(smile.len(), 5);
        assert_eq!(smile[0], (90.0, 0.30));

        let w = s.total_variance(100.0, 365.0);
        assert!(w.is_none());
        let w = s.total_variance(100.0, 180.0).unwrap();
        assert_relative_eq!(w, 0.28 * 0.28 * 180.0 / 365.0, epsilon = 1e-12);
        assert_eq!(s.is_observed(100.0, 90.0), Some(true));
        assert_relative_eq!(s.observed_fraction(), 1.0);
    }
}

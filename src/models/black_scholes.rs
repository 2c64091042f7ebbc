//! Black-Scholes Model
//!
//! Provides:
//! - European option pricing with continuous dividend yield
//! - Closed-form Greeks
//! - Implied volatility solver (Newton-Raphson with bisection fallback)
//!
//! All functions are pure. Expired contracts (`time <= 0`) and zero
//! volatility are degenerate cases with defined answers, not errors.

use std::f64::consts::{PI, SQRT_2};

use statrs::function::erf::erfc;

use crate::core::{AnalyticsError, AnalyticsResult, Greeks, OptionKind};

/// Lowest volatility the IV solver will return
pub const MIN_IV: f64 = 0.001;
/// Highest volatility the IV solver will return
pub const MAX_IV: f64 = 5.0;

/// Standard normal CDF
pub fn norm_cdf(x: f64) -> f64 {
    0.5 * erfc(-x / SQRT_2)
}

/// Standard normal PDF
pub fn norm_pdf(x: f64) -> f64 {
    (-0.5 * x * x).exp() / (2.0 * PI).sqrt()
}

/// Black-Scholes d1 parameter
pub fn d1(spot: f64, strike: f64, rate: f64, div: f64, vol: f64, time: f64) -> f64 {
    let forward = spot * ((rate - div) * time).exp();
    ((forward / strike).ln() + 0.5 * vol * vol * time) / (vol * time.sqrt())
}

/// Black-Scholes d2 parameter
pub fn d2(spot: f64, strike: f64, rate: f64, div: f64, vol: f64, time: f64) -> f64 {
    d1(spot, strike, rate, div, vol, time) - vol * time.sqrt()
}

fn check_inputs(
    spot: f64,
    strike: f64,
    rate: f64,
    div: f64,
    vol: f64,
    time: f64,
) -> AnalyticsResult<()> {
    if !(spot > 0.0) || !spot.is_finite() {
        return Err(AnalyticsError::invalid_input(format!(
            "spot must be positive, got {}",
            spot
        )));
    }
    if !(strike > 0.0) || !strike.is_finite() {
        return Err(AnalyticsError::invalid_input(format!(
            "strike must be positive, got {}",
            strike
        )));
    }
    if !(vol >= 0.0) || !vol.is_finite() {
        return Err(AnalyticsError::invalid_input(format!(
            "volatility must be non-negative, got {}",
            vol
        )));
    }
    if !rate.is_finite() || !div.is_finite() || time.is_nan() {
        return Err(AnalyticsError::invalid_input("rate, dividend yield and time must be finite"));
    }
    Ok(())
}

/// Black-Scholes European option price
pub fn price(
    spot: f64,
    strike: f64,
    rate: f64,
    div: f64,
    vol: f64,
    time: f64,
    kind: OptionKind,
) -> AnalyticsResult<f64> {
    check_inputs(spot, strike, rate, div, vol, time)?;
    Ok(price_unchecked(spot, strike, rate, div, vol, time, kind))
}

fn price_unchecked(
    spot: f64,
    strike: f64,
    rate: f64,
    div: f64,
    vol: f64,
    time: f64,
    kind: OptionKind,
) -> f64 {
    if time <= 0.0 {
        return kind.intrinsic(spot, strike);
    }

    let forward = spot * ((rate - div) * time).exp();
    let df = (-rate * time).exp();

    if vol <= 0.0 {
        // Zero vol = intrinsic value of the forward, discounted
        return df * kind.intrinsic(forward, strike);
    }

    let d1 = d1(spot, strike, rate, div, vol, time);
    let d2 = d2(spot, strike, rate, div, vol, time);

    let phi = kind.phi();
    phi * df * (forward * norm_cdf(phi * d1) - strike * norm_cdf(phi * d2))
}

/// Black-Scholes Greeks
///
/// Theta is per calendar day, vega per 1 vol point, rho per 1 rate point.
/// Delta is returned as computed; bound enforcement belongs to the chain
/// validator.
pub fn greeks(
    spot: f64,
    strike: f64,
    rate: f64,
    div: f64,
    vol: f64,
    time: f64,
    kind: OptionKind,
) -> AnalyticsResult<Greeks> {
    check_inputs(spot, strike, rate, div, vol, time)?;

    if time <= 0.0 || vol <= 0.0 {
        return Ok(Greeks::zero());
    }

    let d1 = d1(spot, strike, rate, div, vol, time);
    let d2 = d2(spot, strike, rate, div, vol, time);
    if !d1.is_finite() || !d2.is_finite() {
        return Ok(Greeks::zero());
    }

    let df = (-rate * time).exp();
    let sqrt_t = time.sqrt();
    let pdf_d1 = norm_pdf(d1);
    let div_factor = (-div * time).exp();

    let delta = match kind {
        OptionKind::Call => div_factor * norm_cdf(d1),
        OptionKind::Put => div_factor * (norm_cdf(d1) - 1.0),
    };

    // Same for call and put
    let gamma = div_factor * pdf_d1 / (spot * vol * sqrt_t);

    let vega = spot * div_factor * pdf_d1 * sqrt_t / 100.0;

    let term1 = -spot * div_factor * pdf_d1 * vol / (2.0 * sqrt_t);
    let theta = match kind {
        OptionKind::Call => {
            term1 - rate * strike * df * norm_cdf(d2) + div * spot * div_factor * norm_cdf(d1)
        }
        OptionKind::Put => {
            term1 + rate * strike * df * norm_cdf(-d2) - div * spot * div_factor * norm_cdf(-d1)
        }
    };
    let theta_per_day = theta / 365.0;

    let rho = match kind {
        OptionKind::Call => strike * time * df * norm_cdf(d2) / 100.0,
        OptionKind::Put => -strike * time * df * norm_cdf(-d2) / 100.0,
    };

    Ok(Greeks::new(delta, gamma, theta_per_day, vega, rho))
}

/// Implied volatility solver using Newton-Raphson with bisection fallback
pub fn implied_volatility(
    market_price: f64,
    spot: f64,
    strike: f64,
    rate: f64,
    div: f64,
    time: f64,
    kind: OptionKind,
) -> AnalyticsResult<f64> {
    check_inputs(spot, strike, rate, div, 0.0, time)?;
    if !(market_price > 0.0) || !market_price.is_finite() {
        return Err(AnalyticsError::numerical("Non-positive option price"));
    }
    if time <= 0.0 {
        return Err(AnalyticsError::numerical("Non-positive time to expiry"));
    }

    let df = (-rate * time).exp();
    let forward = spot * ((rate - div) * time).exp();
    let lower_bound = df * kind.intrinsic(forward, strike);

    if market_price < lower_bound * 0.99 {
        return Err(AnalyticsError::numerical("Price below intrinsic value"));
    }

    // Brenner-Subrahmanyam starting point
    let atm_approx = market_price / (0.4 * spot * time.sqrt());
    let mut vol = atm_approx.clamp(0.01, 3.0);

    let max_iter = 100;
    let tol = 1e-8;

    for _ in 0..max_iter {
        let diff = price_unchecked(spot, strike, rate, div, vol, time, kind) - market_price;

        if diff.abs() < tol {
            return Ok(vol);
        }

        let d1 = d1(spot, strike, rate, div, vol, time);
        let vega = spot * (-div * time).exp() * norm_pdf(d1) * time.sqrt();

        if vega.abs() < 1e-12 {
            break;
        }

        let new_vol = vol - diff / vega;

        if new_vol <= 0.0 || new_vol > MAX_IV || !new_vol.is_finite() {
            break;
        }

        vol = new_vol;
    }

    bisection_iv(market_price, spot, strike, rate, div, time, kind)
}

/// Bisection method for IV (slower but more robust)
fn bisection_iv(
    market_price: f64,
    spot: f64,
    strike: f64,
    rate: f64,
    div: f64,
    time: f64,
    kind: OptionKind,
) -> AnalyticsResult<f64> {
    let mut low = MIN_IV;
    let mut high = MAX_IV;
    let tol = 1e-8;

    let price_at = |vol: f64| price_unchecked(spot, strike, rate, div, vol, time, kind);
    if market_price < price_at(low) - tol || market_price > price_at(high) + tol {
        return Err(AnalyticsError::numerical("Price outside solvable volatility range"));
    }

    for _ in 0..200 {
        let mid = (low + high) / 2.0;
        let diff = price_at(mid) - market_price;

        if diff.abs() < tol || (high - low) < tol {
            return Ok(mid);
        }

        if diff > 0.0 {
            high = mid;
        } else {
            low = mid;
        }
    }

    Err(AnalyticsError::numerical("IV solver did not converge"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_norm_cdf() {
        assert!((norm_cdf(0.0) - 0.5).abs() < 1e-10);
        assert!((norm_cdf(1.96) - 0.975).abs() < 0.001);
        assert!((norm_cdf(-1.96) - 0.025).abs() < 0.001);
    }

    #[test]
    fn test_bs_price() {
        // ATM call, 20% vol, 1 year, 5% rate
        let call_price = price(100.0, 100.0, 0.05, 0.0, 0.20, 1.0, OptionKind::Call).unwrap();
        assert!(call_price > 10.0 && call_price < 11.0);

        let put_price = price(100.0, 100.0, 0.05, 0.0, 0.20, 1.0, OptionKind::Put).unwrap();
        let parity = call_price - put_price - (100.0 - 100.0 * (-0.05_f64).exp());
        assert!(parity.abs() < 1e-9);

        // Hull reference values
        assert_relative_eq!(call_price, 10.4506, epsilon = 1e-4);
        assert_relative_eq!(put_price, 5.5735, epsilon = 1e-4);
    }

    #[test]
    fn test_expired_price_is_intrinsic() {
        let p = price(110.0, 100.0, 0.05, 0.0, 0.2, 0.0, OptionKind::Call).unwrap();
        assert_relative_eq!(p, 10.0);
    }

    #[test]
    fn test_greeks() {
        let g = greeks(100.0, 100.0, 0.05, 0.0, 0.20, 1.0, OptionKind::Call).unwrap();

        assert!(g.delta > 0.5 && g.delta < 0.7);
        assert!(g.gamma > 0.0);
        assert!(g.theta < 0.0);
        assert!(g.vega > 0.0);
        assert!(g.rho > 0.0);
    }

    #[test]
    fn test_greek_units() {
        // Known values for S=K=100, r=5%, q=0, σ=20%, T=1
        let g = greeks(100.0, 100.0, 0.05, 0.0, 0.20, 1.0, OptionKind::Call).unwrap();
        assert_relative_eq!(g.delta, 0.636831, epsilon = 1e-5);
        assert_relative_eq!(g.gamma, 0.018762, epsilon = 1e-5);
        assert_relative_eq!(g.vega, 0.375240, epsilon = 1e-5);
        assert_relative_eq!(g.theta, -6.414028 / 365.0, epsilon = 1e-5);
        assert_relative_eq!(g.rho, 0.532325, epsilon = 1e-5);
    }

    #[test]
    fn test_put_call_symmetry() {
        let (s, k, r, q, v, t) = (105.0, 100.0, 0.03, 0.02, 0.35, 0.4);
        let call = greeks(s, k, r, q, v, t, OptionKind::Call).unwrap();
        let put = greeks(s, k, r, q, v, t, OptionKind::Put).unwrap();

        assert_eq!(call.gamma, put.gamma);
        assert_eq!(call.vega, put.vega);
        assert_relative_eq!(call.delta - put.delta, (-q * t).exp(), epsilon = 1e-12);
    }

    #[test]
    fn test_degenerate_greeks() {
        let expired = greeks(100.0, 90.0, 0.05, 0.0, 0.3, 0.0, OptionKind::Call).unwrap();
        assert_eq!(expired, Greeks::zero());

        let past = greeks(100.0, 90.0, 0.05, 0.0, 0.3, -0.1, OptionKind::Put).unwrap();
        assert_eq!(past, Greeks::zero());

        let zero_vol = greeks(100.0, 90.0, 0.05, 0.0, 0.0, 0.5, OptionKind::Put).unwrap();
        assert_eq!(zero_vol, Greeks::zero());
    }

    #[test]
    fn test_invalid_inputs() {
        let bad_spot = greeks(0.0, 100.0, 0.05, 0.0, 0.2, 1.0, OptionKind::Call);
        assert!(matches!(bad_spot, Err(AnalyticsError::InvalidInput(_))));

        let bad_strike = greeks(100.0, -5.0, 0.05, 0.0, 0.2, 1.0, OptionKind::Call);
        assert!(matches!(bad_strike, Err(AnalyticsError::InvalidInput(_))));

        let bad_vol = price(100.0, 100.0, 0.05, 0.0, -0.2, 1.0, OptionKind::Put);
        assert!(matches!(bad_vol, Err(AnalyticsError::InvalidInput(_))));

        let nan_spot = greeks(f64::NAN, 100.0, 0.05, 0.0, 0.2, 1.0, OptionKind::Call);
        assert!(nan_spot.is_err());
    }

    #[test]
    fn test_implied_vol() {
        let (spot, strike, rate, div, vol, time) = (100.0, 100.0, 0.05, 0.0, 0.25, 0.5);

        let market_price = price(spot, strike, rate, div, vol, time, OptionKind::Call).unwrap();
        let iv = implied_volatility(market_price, spot, strike, rate, div, time, OptionKind::Call)
            .unwrap();

        assert!((iv - vol).abs() < 1e-4);
    }

    #[test]
    fn test_iv_otm() {
        let (spot, strike, rate, div, vol, time) = (100.0, 90.0, 0.05, 0.01, 0.30, 0.25);

        let market_price = price(spot, strike, rate, div, vol, time, OptionKind::Put).unwrap();
        let iv = implied_volatility(market_price, spot, strike, rate, div, time, OptionKind::Put)
            .unwrap();

        assert!((iv - vol).abs() < 1e-3);
    }

    #[test]
    fn test_iv_rejects_bad_prices() {
        assert!(implied_volatility(0.0, 100.0, 100.0, 0.05, 0.0, 0.5, OptionKind::Call).is_err());
        // Deep ITM call quoted below intrinsic
        assert!(implied_volatility(1.0, 100.0, 50.0, 0.05, 0.0, 0.5, OptionKind::Call).is_err());
        assert!(implied_volatility(2.0, 100.0, 100.0, 0.05, 0.0, 0.0, OptionKind::Call).is_err());
    }
}

//! SurfaceBuilder - grid construction from a validated chain

use std::cmp::Ordering;

use chrono::NaiveDate;
use ndarray::Array2;
use tracing::{debug, info, warn};

use crate::core::{AnalyticsError, AnalyticsResult, OptionChainSnapshot, OptionContract};
use crate::validation::ValidatedChain;

use super::{SurfaceConfig, VolatilitySurface};

const STRIKE_EPS: f64 = 1e-6;

/// One usable expiration: date, days to expiry, (strike, iv, quoted) points
struct ExpirySlice {
    expiration: NaiveDate,
    dte: f64,
    points: Vec<(f64, f64, bool)>,
}

/// Builds [`VolatilitySurface`]s
#[derive(Debug, Clone, Default)]
pub struct SurfaceBuilder {
    config: SurfaceConfig,
}

impl SurfaceBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: SurfaceConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SurfaceConfig {
        &self.config
    }

    /// Build a surface from a chain that passed validation.
    ///
    /// Expirations with fewer than `min_strikes` IV observations are left
    /// out. Grid cells with no contract on either side are filled by
    /// repeated averaging of their known 8-connected neighbours.
    pub fn build(&self, chain: &ValidatedChain) -> AnalyticsResult<VolatilitySurface> {
        let snapshot = chain.require_valid()?;

        let mut slices = Vec::new();
        for expiration in snapshot.expirations() {
            let dte = snapshot.days_to(expiration);
            if dte <= 0 {
                continue;
            }

            let points = self.expiry_points(snapshot, expiration);
            if points.len() < self.config.min_strikes {
                debug!(
                    "Skipping {} {}: {} IV points, need {}",
                    snapshot.underlying,
                    expiration,
                    points.len(),
                    self.config.min_strikes
                );
                continue;
            }

            slices.push(ExpirySlice {
                expiration,
                dte: dte as f64,
                points,
            });
        }

        if slices.len() < self.config.min_expirations {
            warn!(
                "Cannot build surface for {}: {} usable expirations, need {}",
                snapshot.underlying,
                slices.len(),
                self.config.min_expirations
            );
            return Err(AnalyticsError::insufficient_data(format!(
                "{} has {} usable expirations, need {}",
                snapshot.underlying,
                slices.len(),
                self.config.min_expirations
            )));
        }

        let mut strikes: Vec<f64> = slices
            .iter()
            .flat_map(|s| s.points.iter().map(|p| p.0))
            .collect();
        strikes.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
        strikes.dedup_by(|a, b| (*a - *b).abs() < STRIKE_EPS);

        let dim = (strikes.len(), slices.len());
        let mut vols = Array2::from_elem(dim, f64::NAN);
        let mut observed = Array2::from_elem(dim, false);

        for (j, slice) in slices.iter().enumerate() {
            for &(strike, iv, quoted) in &slice.points {
                if let Some(i) = strikes.iter().position(|&k| (k - strike).abs() < STRIKE_EPS) {
                    vols[[i, j]] = iv;
                    observed[[i, j]] = quoted;
                }
            }
        }

        let filled = fill_missing(&mut vols);

        info!(
            "Built surface for {}: {} strikes x {} expirations, {} cells filled",
            snapshot.underlying,
            strikes.len(),
            slices.len(),
            filled
        );

        Ok(VolatilitySurface::from_grid(
            snapshot.underlying.clone(),
            snapshot.spot,
            snapshot.fetched_at,
            strikes,
            slices.iter().map(|s| s.dte).collect(),
            slices.iter().map(|s| s.expiration).collect(),
            vols,
            observed,
            snapshot.risk_free_rate,
            snapshot.dividend_yield,
        ))
    }

    /// IV per strike for one expiration, preferring the OTM side
    fn expiry_points(
        &self,
        snapshot: &OptionChainSnapshot,
        expiration: NaiveDate,
    ) -> Vec<(f64, f64, bool)> {
        let usable = |c: &&OptionContract| {
            c.implied_volatility.map_or(false, |v| v.is_finite() && v > 0.0)
                && (self.config.include_interpolated || !c.interpolated)
        };

        let mut strikes: Vec<f64> = snapshot
            .contracts()
            .filter(|c| c.expiration == expiration)
            .map(|c| c.strike)
            .collect();
        strikes.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
        strikes.dedup_by(|a, b| (*a - *b).abs() < STRIKE_EPS);

        strikes
            .into_iter()
            .filter_map(|strike| {
                let call = snapshot.call_at(strike, expiration).filter(usable);
                let put = snapshot.put_at(strike, expiration).filter(usable);
                let (preferred, other) = if strike >= snapshot.spot {
                    (call, put)
                } else {
                    (put, call)
                };
                let contract = preferred.or(other)?;
                Some((strike, contract.implied_volatility?, !contract.interpolated))
            })
            .collect()
    }
}

/// Fill NaN cells from their known 8-connected neighbours, one ring per
/// pass, until nothing is left or no cell can make progress.
/// Returns the number of cells filled.
pub(crate) fn fill_missing(vols: &mut Array2<f64>) -> usize {
    let (nx, ny) = vols.dim();
    let mut filled = 0;

    loop {
        let prev = vols.clone();
        let mut progress = false;
        let mut remaining = false;

        for i in 0..nx {
            for j in 0..ny {
                if !prev[[i, j]].is_nan() {
                    continue;
                }

                let mut sum = 0.0;
                let mut n = 0usize;
                for ii in i.saturating_sub(1)..=(i + 1).min(nx - 1) {
                    for jj in j.saturating_sub(1)..=(j + 1).min(ny - 1) {
                        let v = prev[[ii, jj]];
                        if (ii, jj) != (i, j) && !v.is_nan() {
                            sum += v;
                            n += 1;
                        }
                    }
                }

                if n > 0 {
                    vols[[i, j]] = sum / n as f64;
                    filled += 1;
                    progress = true;
                } else {
                    remaining = true;
                }
            }
        }

        if !remaining || !progress {
            break;
        }
    }

    filled
}

//! VEGAS adaptive importance-sampling Monte-Carlo integrator.
//!
//! The integration domain is a box. Each axis carries a piecewise-uniform
//! sampling density (`n_bins` bins of variable width) that is refined after
//! every iteration so that bins with a larger contribution to `∫ f²` become
//! narrower. Iteration estimates are combined with inverse-variance weights
//! and the χ² per degree of freedom of that combination is reported, so the
//! caller can judge whether the fixed evaluation budget was adequate.
//!
//! Typical use is a training pass (`adapt = true`, result discarded) followed
//! by a production pass on the trained grid.
use crate::Utils::quadrature::IntegrationError;
use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256PlusPlus;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VegasResult {
    pub mean: f64,
    pub sdev: f64,
    /// χ² per degree of freedom of the iteration estimates, 0 for a single iteration
    pub chi2_dof: f64,
    pub n_itn: usize,
}

#[derive(Debug, Clone)]
pub struct Vegas {
    bounds: Vec<(f64, f64)>,
    /// per axis: bin edges on [0, 1]
    grid: Vec<Vec<f64>>,
    n_bins: usize,
    /// damping of the grid refinement
    alpha: f64,
    rng: Xoshiro256PlusPlus,
}

impl Vegas {
    pub fn new(bounds: Vec<(f64, f64)>, seed: u64) -> Result<Self, IntegrationError> {
        if bounds.is_empty() {
            return Err(IntegrationError::InvalidDomain(
                "vegas needs at least one dimension".to_string(),
            ));
        }
        for (a, b) in &bounds {
            if !a.is_finite() || !b.is_finite() || b <= a {
                return Err(IntegrationError::InvalidDomain(format!(
                    "vegas axis [{a}, {b}] must be finite and increasing"
                )));
            }
        }
        let n_bins = 50;
        let uniform: Vec<f64> = (0..=n_bins).map(|i| i as f64 / n_bins as f64).collect();
        Ok(Self {
            grid: vec![uniform; bounds.len()],
            bounds,
            n_bins,
            alpha: 0.5,
            rng: Xoshiro256PlusPlus::seed_from_u64(seed),
        })
    }

    pub fn dim(&self) -> usize {
        self.bounds.len()
    }

    /// Runs `n_itn` iterations of about `n_eval` integrand calls each.
    /// With `adapt` the sampling grid is refined after each iteration.
    pub fn integrate<F: Fn(&[f64]) -> f64>(
        &mut self,
        f: F,
        n_itn: usize,
        n_eval: usize,
        adapt: bool,
    ) -> Result<VegasResult, IntegrationError> {
        let dim = self.dim();
        let n_eval = n_eval.max(2);
        let volume: f64 = self.bounds.iter().map(|(a, b)| b - a).product();

        let mut estimates: Vec<(f64, f64)> = Vec::with_capacity(n_itn);
        let mut x = vec![0.0; dim];
        let mut bins = vec![0usize; dim];
        for _ in 0..n_itn.max(1) {
            let mut d = vec![vec![0.0; self.n_bins]; dim];
            let mut sum = 0.0;
            let mut sum2 = 0.0;
            for _ in 0..n_eval {
                let mut jac = volume;
                for ax in 0..dim {
                    let y: f64 = self.rng.r#gen::<f64>() * self.n_bins as f64;
                    let i = (y as usize).min(self.n_bins - 1);
                    let edges = &self.grid[ax];
                    let width = edges[i + 1] - edges[i];
                    let u = edges[i] + (y - i as f64) * width;
                    let (a, b) = self.bounds[ax];
                    x[ax] = a + u * (b - a);
                    jac *= width * self.n_bins as f64;
                    bins[ax] = i;
                }
                let fx = f(&x);
                if !fx.is_finite() {
                    return Err(IntegrationError::NonFinite(x.clone()));
                }
                let w = fx * jac;
                sum += w;
                sum2 += w * w;
                for ax in 0..dim {
                    d[ax][bins[ax]] += w * w;
                }
            }
            let n = n_eval as f64;
            let mean = sum / n;
            let var = ((sum2 / n - mean * mean) / (n - 1.0)).max(0.0);
            estimates.push((mean, var));
            if adapt {
                self.refine(&d);
            }
        }
        Ok(combine(&estimates))
    }

    /// Lepage grid refinement: smooth, compress, then redistribute edges so
    /// that every new bin carries the same share of the accumulated weight.
    fn refine(&mut self, d: &[Vec<f64>]) {
        let nb = self.n_bins;
        for (ax, dax) in d.iter().enumerate() {
            let total: f64 = dax.iter().sum();
            if total <= 0.0 {
                continue;
            }
            let mut smooth = vec![0.0; nb];
            for i in 0..nb {
                smooth[i] = if nb == 1 {
                    dax[0]
                } else if i == 0 {
                    (dax[0] + dax[1]) / 2.0
                } else if i == nb - 1 {
                    (dax[nb - 2] + dax[nb - 1]) / 2.0
                } else {
                    (dax[i - 1] + dax[i] + dax[i + 1]) / 3.0
                };
            }
            let s_total: f64 = smooth.iter().sum();
            let weights: Vec<f64> = smooth
                .iter()
                .map(|&s| {
                    let r = s / s_total;
                    if r <= 0.0 {
                        0.0
                    } else if r >= 1.0 {
                        1.0
                    } else {
                        ((1.0 - r) / -r.ln()).powf(self.alpha)
                    }
                })
                .collect();
            let w_total: f64 = weights.iter().sum();
            if w_total <= 0.0 {
                continue;
            }
            let per_bin = w_total / nb as f64;

            let old = &self.grid[ax];
            let mut new_edges = Vec::with_capacity(nb + 1);
            new_edges.push(0.0);
            let mut acc = 0.0;
            let mut j = 0;
            for k in 1..nb {
                let target = per_bin * k as f64;
                while j < nb && acc + weights[j] < target {
                    acc += weights[j];
                    j += 1;
                }
                if j >= nb {
                    break;
                }
                let frac = if weights[j] > 0.0 {
                    (target - acc) / weights[j]
                } else {
                    0.0
                };
                new_edges.push(old[j] + frac * (old[j + 1] - old[j]));
            }
            while new_edges.len() < nb {
                new_edges.push(1.0);
            }
            new_edges.push(1.0);
            self.grid[ax] = new_edges;
        }
    }
}

/// inverse-variance weighted mean of iteration estimates
fn combine(estimates: &[(f64, f64)]) -> VegasResult {
    let n_itn = estimates.len();
    if estimates.iter().all(|(_, v)| *v == 0.0) {
        let mean = estimates.iter().map(|(m, _)| m).sum::<f64>() / n_itn as f64;
        return VegasResult {
            mean,
            sdev: 0.0,
            chi2_dof: 0.0,
            n_itn,
        };
    }
    let floor = estimates
        .iter()
        .map(|(_, v)| *v)
        .filter(|v| *v > 0.0)
        .fold(f64::INFINITY, f64::min);
    let mut wsum = 0.0;
    let mut wmean = 0.0;
    for (m, v) in estimates {
        let w = 1.0 / v.max(floor);
        wsum += w;
        wmean += w * m;
    }
    let mean = wmean / wsum;
    let chi2: f64 = estimates
        .iter()
        .map(|(m, v)| (m - mean).powi(2) / v.max(floor))
        .sum();
    let chi2_dof = if n_itn > 1 {
        chi2 / (n_itn - 1) as f64
    } else {
        0.0
    };
    VegasResult {
        mean,
        sdev: (1.0 / wsum).sqrt(),
        chi2_dof,
        n_itn,
    }
}

//! Finite-temperature radiative corrections to the n↔p rates.
//!
//! Three pieces per direction and temperature:
//! - real photon emission/absorption in the thermal bath and the
//!   bremsstrahlung difference, 2-D VEGAS integrals over (E, k);
//! - the electron mass shift, a 1-D quadrature;
//! - the e⁺e⁻/e⁻p scattering term, a 2-D VEGAS integral over
//!   (E₁ + E₂, E₁ − E₂) split at E₁ = E₂ into two regions.
//!
//! Each VEGAS integral runs a training pass and a production pass with the
//! configured budget. The χ²/dof of the production pass is checked against
//! `vegas_chi2_warn` and logged when exceeded; the value is kept.
//!
//! The tabulated result (T in Kelvin) is persisted as
//! `nTOp/{nTOp,pTOn}_thermal_corrections.txt` and splined quadratically.
use crate::Cosmology::physical_constants::ALPHA_EM;
use crate::Utils::interpolation::{QuadraticSpline, logspace};
use crate::Utils::load_from_file::{load_columns, save_columns};
use crate::Utils::quadrature::integrate;
use crate::Utils::vegas::Vegas;
use crate::WeakRates::WeakRateError;
use crate::WeakRates::bulk_rates::{Direction, WeakRateKernel, fermi_stat};
use crate::WeakRates::fermi_dirac::{bose_einstein, fermi_dirac, fermi_dirac_derivative};
use log::{debug, info, warn};
use std::f64::consts::PI;
use std::path::Path;

/// below this temperature the p→n thermal piece is dropped, K
pub const PTON_THERMAL_THRESHOLD: f64 = 158_489_319.246_111_35; // 10^8.2

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VegasBudget {
    pub n_eval: usize,
    pub n_itn: usize,
    pub chi2_warn: f64,
    pub seed: u64,
}

fn a_log(e: f64, k: f64) -> f64 {
    let p = (e * e - 1.0).sqrt();
    (2.0 * e * e + k * k) * ((e + p) / (e - p)).ln() - 4.0 * p * e
}

fn b_log(e: f64) -> f64 {
    let p = (e * e - 1.0).sqrt();
    2.0 * e * ((e + p) / (e - p)).ln() - 4.0 * p
}

/// Integrands of the thermal corrections for one temperature and direction.
struct ThermalIntegrands<'a> {
    kernel: &'a WeakRateKernel,
    x: f64,
    znu: f64,
    dir: Direction,
}

impl ThermalIntegrands<'_> {
    fn s(&self) -> f64 {
        self.dir.sign()
    }

    fn chi_tilde(&self, e: f64) -> f64 {
        self.kernel.chi_tilde(e, self.znu, self.dir)
    }

    fn chi(&self, e: f64) -> f64 {
        self.kernel.chi(e, self.x, self.znu, self.dir)
    }

    /// real photon emission and absorption
    fn true_photon(&self, e: f64, k: f64) -> f64 {
        let (x, s) = (self.x, self.s());
        let b = (e * e - 1.0).sqrt() / e;
        let electron = fermi_dirac(-e * x) * fermi_stat(s, 1.0, b);
        let positron = fermi_dirac(e * x) * fermi_stat(s, -1.0, b);
        let sym = electron * (self.chi_tilde(e - k) + self.chi_tilde(e + k) - 2.0 * self.chi_tilde(e))
            + positron * (self.chi_tilde(-e + k) + self.chi_tilde(-e - k) - 2.0 * self.chi_tilde(-e));
        let asym = electron * (self.chi_tilde(e - k) - self.chi_tilde(e + k))
            + positron * (self.chi_tilde(-e + k) - self.chi_tilde(-e - k));
        ALPHA_EM / (2.0 * PI) * (bose_einstein(x * k) / k) * (a_log(e, k) * sym - k * b_log(e) * asym)
    }

    /// bremsstrahlung difference
    fn bremsstrahlung(&self, e: f64, k: f64) -> f64 {
        let (x, s, q) = (self.x, self.s(), self.kernel.q);
        let b = (e * e - 1.0).sqrt() / e;
        let f_plus = a_log(e, k) + k * b_log(e);
        let f_minus = a_log(e, k) - k * b_log(e);

        let mut electron = f_plus * self.chi_tilde(e + k);
        let de = (e - s * q).abs();
        if k < de {
            electron -= f_plus * fermi_dirac((e - s * q) * self.znu) * (de - k).powi(2);
        }
        electron *= fermi_dirac(-e * x) * fermi_stat(s, 1.0, b);

        let mut positron = f_minus * self.chi_tilde(-e + k);
        let dp = (e + s * q).abs();
        if k < dp {
            positron -= f_plus * fermi_dirac((-e - s * q) * self.znu) * (dp - k).powi(2);
        }
        positron *= fermi_dirac(e * x) * fermi_stat(s, -1.0, b);
        ALPHA_EM / (2.0 * PI * k) * (electron + positron)
    }

    /// electron mass shift
    fn mass_shift(&self, e: f64) -> f64 {
        let p = (e * e - 1.0).sqrt();
        -(ALPHA_EM * e / (2.0 * PI * p)) * (2.0 * PI * PI) / (3.0 * self.x * self.x)
            * (self.chi(e) + self.chi(-e))
    }

    /// e⁺e⁻ and e⁻p scattering, in (E₁ + E₂, E₁ − E₂)
    fn scattering(&self, sum: f64, diff: f64) -> f64 {
        let x = self.x;
        let max_sum = 2.0 + f64::max(10.0, 15.0 / x) + diff.abs();
        if sum - (2.0 + diff.abs()) <= 0.0 || max_sum - sum <= 0.0 {
            return 0.0;
        }
        let e1 = 0.5 * (sum + diff);
        let e2 = 0.5 * (sum - diff);
        let p1 = (e1 * e1 - 1.0).sqrt();
        let p2 = (e2 * e2 - 1.0).sqrt();
        let l_fac = ((e1 * e2 + p1 * p2 + 1.0) / (e1 * e2 - p1 * p2 + 1.0)).ln();
        let lg = ((p1 + p2) / (p1 - p2)).powi(2).ln();
        let fd2 = fermi_dirac(e2 * x);
        let dfd2 = fermi_dirac_derivative(e2, x);
        let bracket = -0.25 * lg * lg
            * (dfd2 * p2 / p1 * e1 * e1 / e2 * (e1 + e2) + fd2 * e1 * e1 / (p1 * p2) * (e2 + e1 / (e2 * e2)))
            + lg * (dfd2 * (p2 * p2 * e1 / e2 * (1.0 / (p1 * p1) + 2.0) - e1 * e1 * p2 / p1 * l_fac)
                + fd2
                    * (e1 / (p1 * p1 * e2 * e2) * (e2 * e2 + 2.0 * p1 * p1 + 1.0)
                        - (e1 * e1 + e2 * e2) / (e1 + e2)
                        - (e1 * e1 * e2) / (p1 * p2) * l_fac))
            - fd2 * (4.0 * e1 * p2 / p1 + 2.0 * e2 * l_fac);
        // Jacobian of the rotated variables
        0.5 * ALPHA_EM / (2.0 * PI) * (self.chi(e1) + self.chi(-e1)) * bracket
    }
}

fn vegas_pass<F: Fn(&[f64]) -> f64>(
    f: F,
    bounds: Vec<(f64, f64)>,
    budget: &VegasBudget,
    seed_offset: u64,
    label: &str,
) -> Result<f64, WeakRateError> {
    let mut vegas = Vegas::new(bounds, budget.seed.wrapping_add(seed_offset))?;
    // training on a fresh grid, the estimate is discarded
    vegas.integrate(&f, budget.n_itn, budget.n_eval, true)?;
    let result = vegas.integrate(&f, budget.n_itn, budget.n_eval, true)?;
    if result.chi2_dof > budget.chi2_warn {
        warn!(
            "VEGAS {}: chi2/dof = {:.2} above {:.2} (mean {:.4e} ± {:.1e})",
            label, result.chi2_dof, budget.chi2_warn, result.mean, result.sdev
        );
    }
    Ok(result.mean)
}

/// Total thermal correction for one direction at photon temperature `t_kelvin`.
pub fn thermal_correction(
    kernel: &WeakRateKernel,
    t_kelvin: f64,
    dir: Direction,
    budget: &VegasBudget,
) -> Result<f64, WeakRateError> {
    if dir == Direction::PToN && t_kelvin < PTON_THERMAL_THRESHOLD {
        return Ok(0.0);
    }
    let (x, znu) = kernel.inverse_temperatures(t_kelvin);
    let integrands = ThermalIntegrands { kernel, x, znu, dir };
    let offset = match dir {
        Direction::NToP => 0,
        Direction::PToN => 4,
    };

    let e_max = f64::max(10.0, 20.0 / x);
    let ek_box = vec![(1.001, e_max), (0.001, e_max)];
    let photon = vegas_pass(
        |v| integrands.true_photon(v[0], v[1]),
        ek_box.clone(),
        budget,
        offset,
        "real photon",
    )?;
    let brems = vegas_pass(
        |v| integrands.bremsstrahlung(v[0], v[1]),
        ek_box,
        budget,
        offset + 1,
        "bremsstrahlung",
    )?;

    let mass_shift = integrate(|e| integrands.mass_shift(e), 1.0, f64::max(25.0, 150.0 / x), 1.49e-8, 1e-2)?;

    let width = f64::max(10.0, 15.0 / x);
    let below = vegas_pass(
        |v| integrands.scattering(v[0], v[1]),
        vec![(2.002, 2.0 + width), (-width, -0.001)],
        budget,
        offset + 2,
        "scattering E1<E2",
    )?;
    let above = vegas_pass(
        |v| integrands.scattering(v[0], v[1]),
        vec![(2.002, 2.0 + width), (0.001, width)],
        budget,
        offset + 3,
        "scattering E1>E2",
    )?;
    debug!(
        "thermal correction {:?} at T = {:.3e} K: photon {:.3e}, brems {:.3e}, mass {:.3e}, scattering {:.3e}",
        dir,
        t_kelvin,
        photon,
        brems,
        mass_shift,
        below + above
    );
    Ok(photon + brems + mass_shift + below + above)
}

/// Splined thermal corrections, T in Kelvin.
#[derive(Debug, Clone)]
pub struct ThermalRateCorrections {
    pub n_to_p: QuadraticSpline,
    pub p_to_n: QuadraticSpline,
}

impl ThermalRateCorrections {
    pub const NTOP_FILE: &'static str = "nTOp_thermal_corrections.txt";
    pub const PTON_FILE: &'static str = "pTOn_thermal_corrections.txt";

    /// Evaluates both directions on `n_samples` log-spaced temperatures
    /// between `t_low` and `t_high` (Kelvin).
    pub fn compute(
        kernel: &WeakRateKernel,
        t_low: f64,
        t_high: f64,
        n_samples: usize,
        budget: &VegasBudget,
    ) -> Result<Self, WeakRateError> {
        info!("computing n<->p thermal corrections on {} temperatures, this takes a while", n_samples);
        let temps = logspace(t_low, t_high, n_samples);
        let mut ntop = Vec::with_capacity(n_samples);
        let mut pton = Vec::with_capacity(n_samples);
        for (i, &t) in temps.iter().enumerate() {
            let point_budget = VegasBudget {
                seed: budget.seed.wrapping_add(8 * i as u64),
                ..*budget
            };
            ntop.push(thermal_correction(kernel, t, Direction::NToP, &point_budget)?);
            pton.push(thermal_correction(kernel, t, Direction::PToN, &point_budget)?);
            debug!("thermal corrections: {}/{} temperatures done", i + 1, n_samples);
        }
        Self::from_grid(&temps, &ntop, &pton)
    }

    pub fn from_grid(temps: &[f64], ntop: &[f64], pton: &[f64]) -> Result<Self, WeakRateError> {
        Ok(ThermalRateCorrections {
            n_to_p: QuadraticSpline::new(temps, ntop)?,
            p_to_n: QuadraticSpline::new(temps, pton)?,
        })
    }

    pub fn load(dir: &Path) -> Result<Self, WeakRateError> {
        let ntop = load_columns(&dir.join(Self::NTOP_FILE), 2)?;
        let pton = load_columns(&dir.join(Self::PTON_FILE), 2)?;
        info!("loaded n<->p thermal corrections from {}", dir.display());
        Ok(ThermalRateCorrections {
            n_to_p: QuadraticSpline::new(&ntop[0], &ntop[1])?,
            p_to_n: QuadraticSpline::new(&pton[0], &pton[1])?,
        })
    }

    pub fn save(&self, dir: &Path) -> Result<(), WeakRateError> {
        save_columns(&dir.join(Self::NTOP_FILE), &[self.n_to_p.x(), self.n_to_p.y()])?;
        save_columns(&dir.join(Self::PTON_FILE), &[self.p_to_n.x(), self.p_to_n.y()])?;
        Ok(())
    }

    pub fn eval(&self, t_kelvin: f64, dir: Direction) -> f64 {
        match dir {
            Direction::NToP => self.n_to_p.eval(t_kelvin),
            Direction::PToN => self.p_to_n.eval(t_kelvin),
        }
    }
}

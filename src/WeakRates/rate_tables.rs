//! Tabulated n↔p rates per temperature era and their normalization.
use crate::Cosmology::physical_constants::{G_A, G_F, M_E, PhysicalConstants, V_UD};
use crate::Utils::interpolation::{QuadraticSpline, logspace};
use crate::Utils::load_from_file::{load_columns, save_columns};
use crate::WeakRates::WeakRateError;
use crate::WeakRates::bulk_rates::{Direction, WeakRateKernel};
use crate::WeakRates::corrections::neutron_decay_phase_space;
use crate::WeakRates::thermal_corrections::{ThermalRateCorrections, VegasBudget};
use crate::settings::{BbnConfig, ThermalCorrections};
use log::{debug, info};
use std::f64::consts::PI;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Era {
    /// T_start → T_weak, only n and p
    High,
    /// T_weak → T_nucl
    Mid,
    /// T_nucl → T_end
    Low,
}

impl Era {
    pub const ALL: [Era; 3] = [Era::High, Era::Mid, Era::Low];

    pub fn tag(self) -> &'static str {
        match self {
            Era::High => "HT",
            Era::Mid => "MT",
            Era::Low => "LT",
        }
    }

    /// (upper, lower) era temperatures in Kelvin
    pub fn temperature_range(self, constants: &PhysicalConstants) -> (f64, f64) {
        match self {
            Era::High => (constants.t_start, constants.t_weak),
            Era::Mid => (constants.t_weak, constants.t_nucl),
            Era::Low => (constants.t_nucl, constants.t_end),
        }
    }
}

/// Forward (n→p) and backward (p→n) splines of one era, T in Kelvin.
#[derive(Debug, Clone)]
pub struct EraRates {
    pub frwrd: QuadraticSpline,
    pub bkwrd: QuadraticSpline,
}

impl EraRates {
    fn file_name(era: Era, dir: Direction) -> String {
        let d = match dir {
            Direction::NToP => "frwrd",
            Direction::PToN => "bkwrd",
        };
        format!("nTOp_{}_{}.txt", d, era.tag())
    }

    fn load(dir: &Path, era: Era) -> Result<Self, WeakRateError> {
        let f = load_columns(&dir.join(Self::file_name(era, Direction::NToP)), 2)?;
        let b = load_columns(&dir.join(Self::file_name(era, Direction::PToN)), 2)?;
        Ok(EraRates {
            frwrd: QuadraticSpline::new(&f[0], &f[1])?,
            bkwrd: QuadraticSpline::new(&b[0], &b[1])?,
        })
    }

    fn save(&self, dir: &Path, era: Era) -> Result<(), WeakRateError> {
        save_columns(
            &dir.join(Self::file_name(era, Direction::NToP)),
            &[self.frwrd.x(), self.frwrd.y()],
        )?;
        save_columns(
            &dir.join(Self::file_name(era, Direction::PToN)),
            &[self.bkwrd.x(), self.bkwrd.y()],
        )?;
        Ok(())
    }
}

/// Which pieces make up a tabulated rate.
#[derive(Debug, Clone)]
pub struct RateComposition {
    pub born_only: bool,
    pub thermal: Option<ThermalRateCorrections>,
    /// new-physics shift in units of the Born rate
    pub np_delta: f64,
}

impl RateComposition {
    /// Unnormalized rate at `t_kelvin`.
    pub fn rate(&self, kernel: &WeakRateKernel, t_kelvin: f64, dir: Direction) -> Result<f64, WeakRateError> {
        let mut rate = if self.born_only {
            kernel.born(t_kelvin, dir)?
        } else {
            let mut r = kernel.radiative(t_kelvin, dir)? + kernel.finite_mass(t_kelvin, dir)?;
            if let Some(thermal) = &self.thermal {
                r += thermal.eval(t_kelvin, dir);
            }
            r
        };
        if self.np_delta != 0.0 {
            rate += self.np_delta * kernel.born(t_kelvin, dir)?;
        }
        Ok(rate)
    }
}

/// n↔p rates of a run. Splines return dimensionless rates; the accessors
/// multiply by `normalization` to give s⁻¹.
#[derive(Debug, Clone)]
pub struct WeakRates {
    pub high: EraRates,
    pub mid: EraRates,
    pub low: EraRates,
    /// s⁻¹
    pub normalization: f64,
}

impl WeakRates {
    pub fn era(&self, era: Era) -> &EraRates {
        match era {
            Era::High => &self.high,
            Era::Mid => &self.mid,
            Era::Low => &self.low,
        }
    }

    /// n→p rate in s⁻¹
    pub fn frwrd(&self, era: Era, t_kelvin: f64) -> f64 {
        self.normalization * self.era(era).frwrd.eval(t_kelvin)
    }

    /// p→n rate in s⁻¹
    pub fn bkwrd(&self, era: Era, t_kelvin: f64) -> f64 {
        self.normalization * self.era(era).bkwrd.eval(t_kelvin)
    }

    /// Tabulates every era on `n_samples` log-spaced temperatures.
    pub fn compute(
        kernel: &WeakRateKernel,
        composition: &RateComposition,
        constants: &PhysicalConstants,
        n_samples: usize,
        normalization: f64,
    ) -> Result<Self, WeakRateError> {
        let tabulate = |era: Era| -> Result<EraRates, WeakRateError> {
            let (t_hi, t_lo) = era.temperature_range(constants);
            info!("computing n<->p weak rates in the {} era", era.tag());
            let temps = logspace(t_hi, t_lo, n_samples);
            let mut frwrd = Vec::with_capacity(n_samples);
            let mut bkwrd = Vec::with_capacity(n_samples);
            for &t in &temps {
                frwrd.push(composition.rate(kernel, t, Direction::NToP)?);
                bkwrd.push(composition.rate(kernel, t, Direction::PToN)?);
            }
            let rates = EraRates {
                frwrd: QuadraticSpline::new(&temps, &frwrd)?,
                bkwrd: QuadraticSpline::new(&temps, &bkwrd)?,
            };
            debug!(
                "{} era: frwrd {:.4e} -> {:.4e}, bkwrd {:.4e} -> {:.4e}",
                era.tag(),
                frwrd[0],
                frwrd[frwrd.len() - 1],
                bkwrd[0],
                bkwrd[bkwrd.len() - 1]
            );
            Ok(rates)
        };
        Ok(WeakRates {
            high: tabulate(Era::High)?,
            mid: tabulate(Era::Mid)?,
            low: tabulate(Era::Low)?,
            normalization,
        })
    }

    pub fn load(dir: &Path, normalization: f64) -> Result<Self, WeakRateError> {
        info!("loading n<->p weak rates from {}", dir.display());
        Ok(WeakRates {
            high: EraRates::load(dir, Era::High)?,
            mid: EraRates::load(dir, Era::Mid)?,
            low: EraRates::load(dir, Era::Low)?,
            normalization,
        })
    }

    pub fn save(&self, dir: &Path) -> Result<(), WeakRateError> {
        for era in Era::ALL {
            self.era(era).save(dir, era)?;
        }
        info!("saved n<->p weak rates to {}", dir.display());
        Ok(())
    }

    /// Global rate normalization in s⁻¹.
    pub fn compute_normalization(constants: &PhysicalConstants, tau_n_normalization: bool, born_only: bool) -> Result<f64, WeakRateError> {
        if tau_n_normalization {
            let f_n = neutron_decay_phase_space(constants.delta_kappa, born_only)?;
            info!("neutron decay phase space F_n = {:.6}", f_n);
            Ok(1.0 / (f_n * constants.tau_n))
        } else {
            Ok(constants.mev_to_secm1 * (G_F * V_UD).powi(2) * (1.0 + 3.0 * G_A * G_A) / (2.0 * PI.powi(3))
                * M_E.powi(5))
        }
    }

    /// Computes or loads the rates as the configuration asks, persisting
    /// recomputed grids when requested.
    pub fn from_config(
        config: &BbnConfig,
        constants: &PhysicalConstants,
        tg: &[f64],
        tnu: &[f64],
    ) -> Result<Self, WeakRateError> {
        let normalization =
            Self::compute_normalization(constants, config.tau_n_normalization, config.weak_rates_born_only)?;
        if !config.compute_weak_rates {
            return Self::load(&config.weak_rates_dir(false), normalization);
        }
        let kernel = WeakRateKernel::new(constants, tg, tnu)?;
        let thermal = if config.weak_rates_born_only {
            None
        } else {
            match config.thermal_corrections {
                ThermalCorrections::Skip => None,
                ThermalCorrections::Load => Some(ThermalRateCorrections::load(&config.weak_rates_dir(false))?),
                ThermalCorrections::Compute => {
                    let budget = VegasBudget {
                        n_eval: config.vegas_evals,
                        n_itn: config.vegas_iterations,
                        chi2_warn: config.vegas_chi2_warn,
                        seed: config.vegas_seed,
                    };
                    let thermal = ThermalRateCorrections::compute(
                        &kernel,
                        constants.t_end,
                        constants.t_start,
                        config.thermal_samples,
                        &budget,
                    )?;
                    if config.save_thermal_corrections {
                        thermal.save(&config.weak_rates_dir(true))?;
                    }
                    Some(thermal)
                }
            }
        };
        let composition = RateComposition {
            born_only: config.weak_rates_born_only,
            thermal,
            np_delta: config.np_weak_rate_delta,
        };
        let rates = Self::compute(&kernel, &composition, constants, config.weak_rate_samples, normalization)?;
        if config.save_weak_rates {
            rates.save(&config.weak_rates_dir(true))?;
        }
        Ok(rates)
    }
}

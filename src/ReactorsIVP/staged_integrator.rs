//! # Staged BBN integrator
//!
//! Drives a complete run: tables → background → weak rates → networks →
//! three integration eras → observables.
//!
//! | era | species | initial state | solver | rtol / atol |
//! |-----|---------|---------------|--------|-------------|
//! | HT  | n, p | weak equilibrium at T_start | Dormand–Prince | 1e-6 / 1e-9 |
//! | MT  | 8 or 12 | HT final n, p + NSE at T_weak | configured stiff | 1e-6 / 1e-9 |
//! | LT  | 8 or 12 | MT final state | configured stiff | 1e-3 / 1e-11 (small), 1e-13 (large) |
//!
//! Any solver failure aborts the run; there is no partial result.
//!
//! ```rust, ignore
//! let mut task = BbnTask::new(BbnConfig::default())?;
//! task.load_tables()?;
//! task.solve_background()?;
//! task.build_weak_rates()?;
//! task.build_network()?;
//! task.solve()?;
//! let results = task.results()?;
//! ```
use crate::Cosmology::background::{Background, BackgroundError, BackgroundModel, BackgroundTrajectory};
use crate::Cosmology::physical_constants::{HE4_OVER_AMU, H_OVER_AMU, PhysicalConstants};
use crate::Kinetics::NetworkError;
use crate::Kinetics::nuclear_network::{NetworkConditions, NetworkOde, ReactionNetwork, baryon_number};
use crate::Kinetics::nuclear_rates::NuclearRates;
use crate::Kinetics::nuclides::{Nuclide, nse_abundance};
use crate::ReactorsIVP::ivp_solvers::{DormandPrince45, IvpError, IvpSolve, IvpSolver, create_solver};
use crate::Thermodynamics::ThermoError;
use crate::Thermodynamics::new_physics::{NewPhysicsSector, create_sector};
use crate::Thermodynamics::plasma::PlasmaThermo;
use crate::Thermodynamics::thermo_tables::ThermoTables;
use crate::WeakRates::WeakRateError;
use crate::WeakRates::rate_tables::{Era, WeakRates};
use crate::settings::{BbnConfig, ConfigError, NetworkSize};
use log::{info, warn};
use nalgebra::DVector;
use std::time::Instant;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BbnError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Thermo(#[from] ThermoError),
    #[error(transparent)]
    Background(#[from] BackgroundError),
    #[error(transparent)]
    WeakRate(#[from] WeakRateError),
    #[error(transparent)]
    Network(#[from] NetworkError),
    #[error("{era} era: {source}")]
    Solver {
        era: &'static str,
        #[source]
        source: IvpError,
    },
    #[error("step '{step}' needs '{missing}' to run first")]
    OutOfOrder { step: &'static str, missing: &'static str },
}

/// Temperature, density and weak rates of one era along the background.
pub struct EraConditions<'a> {
    pub background: &'a Background,
    pub weak_rates: &'a WeakRates,
    pub era: Era,
}

impl<'a> NetworkConditions for EraConditions<'a> {
    fn temperature_kelvin(&self, t: f64) -> f64 {
        self.background.temperature_kelvin(t)
    }

    fn baryon_density(&self, t: f64) -> f64 {
        self.background.rho_b(self.background.a_of_t(t))
    }

    fn weak_rates(&self, t_kelvin: f64) -> (f64, f64) {
        (
            self.weak_rates.frwrd(self.era, t_kelvin),
            self.weak_rates.bkwrd(self.era, t_kelvin),
        )
    }
}

#[derive(Debug, Clone)]
pub struct EraNetworks {
    pub high: ReactionNetwork,
    pub mid: ReactionNetwork,
    pub low: ReactionNetwork,
}

/// Final abundance vectors of the three eras.
#[derive(Debug, Clone, PartialEq)]
pub struct EraStates {
    pub high: DVector<f64>,
    pub mid: DVector<f64>,
    pub low: DVector<f64>,
}

/// Observables of a run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BbnResults {
    pub n_eff: f64,
    /// Ω_ν h² of a relativistic species ×10⁶
    pub omega_nu_rel_1e6: f64,
    /// 1/(Ω_ν h²·10⁻⁶) of non-relativistic neutrinos, in units of Σm_ν [eV]
    pub one_over_omega_nu_nr: f64,
    pub yp_cmb: f64,
    pub yp_bbn: f64,
    pub d_over_h_1e5: f64,
    pub he3_over_h_1e5: f64,
    pub li7_over_h_1e10: f64,
}

impl BbnResults {
    pub const LABELS: [&'static str; 8] = [
        "N_eff",
        "Omega_nu_h2_rel x 1e6",
        "1/(Omega_nu_h2_nr x 1e-6)",
        "YP (CMB)",
        "YP (BBN)",
        "D/H x 1e5",
        "He3/H x 1e5",
        "Li7/H x 1e10",
    ];

    pub fn to_vec(&self) -> Vec<f64> {
        vec![
            self.n_eff,
            self.omega_nu_rel_1e6,
            self.one_over_omega_nu_nr,
            self.yp_cmb,
            self.yp_bbn,
            self.d_over_h_1e5,
            self.he3_over_h_1e5,
            self.li7_over_h_1e10,
        ]
    }

    /// Abundance observables from the final state; tritium is counted as
    /// He3 and Be7 as Li7 since both decay afterwards.
    pub fn from_abundances(y: &DVector<f64>, n_eff: f64, omega_nu_h2_rel: f64, omega_nu_h2_nr: f64) -> Self {
        let at = |s: Nuclide| y[s.index()];
        let yp_bbn = 4.0 * at(Nuclide::He4);
        let he4 = HE4_OVER_AMU / 4.0 * yp_bbn;
        let h = at(Nuclide::P);
        BbnResults {
            n_eff,
            omega_nu_rel_1e6: omega_nu_h2_rel * 1e6,
            one_over_omega_nu_nr: 1.0 / (omega_nu_h2_nr * 1e-6),
            yp_cmb: he4 / (he4 + H_OVER_AMU * (1.0 - yp_bbn)),
            yp_bbn,
            d_over_h_1e5: at(Nuclide::D) / h * 1e5,
            he3_over_h_1e5: (at(Nuclide::T) + at(Nuclide::He3)) / h * 1e5,
            li7_over_h_1e10: (at(Nuclide::Li7) + at(Nuclide::Be7)) / h * 1e10,
        }
    }
}

/// Logs negative abundances; they are left as the solver returned them.
fn report_negative(era: Era, y: &DVector<f64>) {
    for (value, species) in y.iter().zip(Nuclide::ALL.iter()) {
        if *value < 0.0 {
            warn!("{} era: negative abundance Y_{} = {:.3e}", era.tag(), species.name(), value);
        }
    }
}

/// One BBN run, built step by step.
pub struct BbnTask {
    pub config: BbnConfig,
    pub constants: PhysicalConstants,
    solver: IvpSolver,
    thermo: Option<ThermoTables>,
    nuclear_rates: Option<NuclearRates>,
    pub background: Option<Background>,
    pub weak_rates: Option<WeakRates>,
    pub networks: Option<EraNetworks>,
    pub states: Option<EraStates>,
}

impl BbnTask {
    pub fn new(config: BbnConfig) -> Result<Self, BbnError> {
        config.validate()?;
        let constants = PhysicalConstants::new(&config);
        let solver = create_solver(config.solver_backend);
        info!(
            "BBN task: {:?} network, Ω_b h² = {}, τ_n = {} s, stiff solver {}",
            config.network,
            config.omega_b_h2,
            config.tau_n,
            solver.name()
        );
        Ok(Self {
            config,
            constants,
            solver,
            thermo: None,
            nuclear_rates: None,
            background: None,
            weak_rates: None,
            networks: None,
            states: None,
        })
    }

    /// Plasma correction tables and nuclear rate files.
    pub fn load_tables(&mut self) -> Result<(), BbnError> {
        self.thermo = Some(ThermoTables::from_config(&self.config)?);
        self.nuclear_rates = Some(NuclearRates::load(&self.config)?);
        Ok(())
    }

    pub fn solve_background(&mut self) -> Result<(), BbnError> {
        let thermo = self.thermo.clone().ok_or(BbnError::OutOfOrder {
            step: "solve_background",
            missing: "load_tables",
        })?;
        let sector = create_sector(&self.config.new_physics);
        let with_sector = sector.is_active();
        let model = BackgroundModel::new(PlasmaThermo::new(thermo, &self.constants), sector, self.constants.clone());
        let trajectory = if self.config.compute_background {
            let trajectory = model.solve_temperatures(&self.solver, self.config.t_final, self.config.n_sampling)?;
            if self.config.save_background {
                trajectory.save(&self.config.background_file(true))?;
            }
            trajectory
        } else {
            BackgroundTrajectory::load(&self.config.background_file(false), with_sector)?
        };
        let background = Background::new(
            model,
            trajectory,
            &self.solver,
            self.config.non_instantaneous_decoupling,
            self.config.n_sampling,
        )?;
        info!("N_eff = {:.5}", background.n_eff());
        self.background = Some(background);
        Ok(())
    }

    pub fn build_weak_rates(&mut self) -> Result<(), BbnError> {
        let background = self.background.as_ref().ok_or(BbnError::OutOfOrder {
            step: "build_weak_rates",
            missing: "solve_background",
        })?;
        let trajectory = &background.trajectory;
        self.weak_rates = Some(WeakRates::from_config(
            &self.config,
            &self.constants,
            &trajectory.tg,
            &trajectory.tnu,
        )?);
        Ok(())
    }

    pub fn build_network(&mut self) -> Result<(), BbnError> {
        let rates = self.nuclear_rates.as_ref().ok_or(BbnError::OutOfOrder {
            step: "build_network",
            missing: "load_tables",
        })?;
        let size = self.config.network;
        self.networks = Some(EraNetworks {
            high: ReactionNetwork::new(rates, size, Era::High)?,
            mid: ReactionNetwork::new(rates, size, Era::Mid)?,
            low: ReactionNetwork::new(rates, size, Era::Low)?,
        });
        Ok(())
    }

    /// Integrates the three eras, each starting from the previous final state.
    pub fn solve(&mut self) -> Result<(), BbnError> {
        let background = self.background.as_ref().ok_or(BbnError::OutOfOrder {
            step: "solve",
            missing: "solve_background",
        })?;
        let weak_rates = self.weak_rates.as_ref().ok_or(BbnError::OutOfOrder {
            step: "solve",
            missing: "build_weak_rates",
        })?;
        let networks = self.networks.as_ref().ok_or(BbnError::OutOfOrder {
            step: "solve",
            missing: "build_network",
        })?;
        let c = &self.constants;
        let clock = Instant::now();

        // HT: weak equilibrium at T_start
        let bk = weak_rates.bkwrd(Era::High, c.t_start);
        let fw = weak_rates.frwrd(Era::High, c.t_start);
        let yn0 = bk / (bk + fw);
        let y0 = DVector::from_vec(vec![yn0, 1.0 - yn0]);
        info!("HT era: Y_n(T_start) = {:.6}", yn0);
        let ht_solver = if self.config.ht_explicit {
            IvpSolver::DormandPrince45(DormandPrince45)
        } else {
            self.solver.clone()
        };
        let high = self.integrate(
            &ht_solver,
            &networks.high,
            background,
            weak_rates,
            y0,
            (background.t_start, background.t_weak),
            (1e-6, 1e-9),
        )?;

        // MT: free nucleons from HT, the rest in statistical equilibrium
        let n_species = networks.mid.n_species();
        let (yn, yp) = (high[0], high[1]);
        let eta = background.eta_of_T(c.t_weak);
        let mut y0 = DVector::zeros(n_species);
        y0[Nuclide::N.index()] = yn;
        y0[Nuclide::P.index()] = yp;
        for species in Nuclide::ALL.iter().take(n_species).skip(2) {
            y0[species.index()] = nse_abundance(*species, yn, yp, c.t_weak, eta);
        }
        info!(
            "MT era: Y_n = {:.6}, Y_p = {:.6}, NSE Y_d = {:.4e} at η = {:.4e}",
            yn,
            yp,
            y0[Nuclide::D.index()],
            eta
        );
        let mid = self.integrate(
            &self.solver,
            &networks.mid,
            background,
            weak_rates,
            y0,
            (background.t_weak, background.t_nucl),
            (1e-6, 1e-9),
        )?;

        let atol = match self.config.network {
            NetworkSize::Small => 1e-11,
            NetworkSize::Large => 1e-13,
        };
        let low = self.integrate(
            &self.solver,
            &networks.low,
            background,
            weak_rates,
            mid.clone(),
            (background.t_nucl, background.t_end),
            (1e-3, atol),
        )?;
        info!(
            "network solved in {:.2} s, baryon number {:.10}",
            clock.elapsed().as_secs_f64(),
            baryon_number(&low)
        );
        self.states = Some(EraStates { high, mid, low });
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    fn integrate(
        &self,
        solver: &IvpSolver,
        network: &ReactionNetwork,
        background: &Background,
        weak_rates: &WeakRates,
        y0: DVector<f64>,
        t_span: (f64, f64),
        (rtol, atol): (f64, f64),
    ) -> Result<DVector<f64>, BbnError> {
        let era = network.era;
        let conditions = EraConditions {
            background,
            weak_rates,
            era,
        };
        let ode = NetworkOde {
            network,
            conditions: &conditions,
        };
        info!(
            "{} era: {} species, {} reactions, t = {:.4e} .. {:.4e} s ({})",
            era.tag(),
            network.n_species(),
            network.n_reactions(),
            t_span.0,
            t_span.1,
            solver.name()
        );
        let trajectory = solver
            .solve(&ode, &y0, t_span, &[], rtol, atol)
            .map_err(|source| BbnError::Solver { era: era.tag(), source })?;
        let y = trajectory.last().cloned().unwrap_or(y0);
        info!(
            "{} era done in {} steps ({} rejected)",
            era.tag(),
            trajectory.n_steps,
            trajectory.n_rejected
        );
        report_negative(era, &y);
        Ok(y)
    }

    pub fn results(&self) -> Result<BbnResults, BbnError> {
        let background = self.background.as_ref().ok_or(BbnError::OutOfOrder {
            step: "results",
            missing: "solve_background",
        })?;
        let states = self.states.as_ref().ok_or(BbnError::OutOfOrder {
            step: "results",
            missing: "solve",
        })?;
        let mut y = states.low.clone();
        // the small network leaves the heavier species out
        if y.len() < Nuclide::ALL.len() {
            y = y.resize_vertically(Nuclide::ALL.len(), 0.0);
        }
        let results = BbnResults::from_abundances(
            &y,
            background.n_eff(),
            background.omega_nu_h2_rel(),
            background.omega_nu_h2_nr(),
        );
        for (label, value) in BbnResults::LABELS.iter().zip(results.to_vec()) {
            info!("{} = {:.6}", label, value);
        }
        Ok(results)
    }
}

/// Runs every step of a BBN computation.
pub fn compute_results(config: BbnConfig) -> Result<BbnResults, BbnError> {
    let mut task = BbnTask::new(config)?;
    task.load_tables()?;
    task.solve_background()?;
    task.build_weak_rates()?;
    task.build_network()?;
    task.solve()?;
    task.results()
}

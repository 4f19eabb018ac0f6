//! # Background cosmology
//!
//! Solves the photon and neutrino temperature evolution (plus the temperature
//! of an optional extra sector) in a radiation dominated FRW universe,
//! reconstructs the scale factor including non-instantaneous neutrino
//! decoupling, and exposes the time ↔ temperature ↔ scale factor maps used by
//! the weak rates and the nuclear network.
//!
//! Units: time in s, temperatures and energies in MeV, except where a function
//! takes the temperature in Kelvin (`eta_of_T`, era temperatures).
//!
//! ## Pipeline
//! 1. [`BackgroundModel::solve_temperatures`]: `(t, Tγ, Tν[, T_NP])` from
//!    `t_ini = 1/(2 H(T_start))` to `t_final` on a log grid;
//!    alternatively [`BackgroundTrajectory::load`] reads a persisted grid.
//! 2. [`Background::new`]: interpolation maps and `ln a(ln T)`.
use crate::Cosmology::physical_constants::PhysicalConstants;
use crate::ReactorsIVP::ivp_solvers::{IvpError, IvpSolve, IvpSolver, OdeSystem};
use crate::Thermodynamics::new_physics::{Coupling, NewPhysicsSector, Sector};
use crate::Thermodynamics::plasma::{
    PlasmaThermo, drho_g_dt, drho_e_dt, drho_nu_dt, p_e, rho_e, rho_g, rho_nu,
};
use crate::Utils::interpolation::{InterpolationError, LinearInterpolator, logspace};
use crate::Utils::load_from_file::{TableError, load_columns, save_columns};
use crate::Utils::special_functions::ZETA3;
use log::info;
use nalgebra::DVector;
use std::f64::consts::PI;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BackgroundError {
    #[error("background ODE failed: {0}")]
    Solver(#[from] IvpError),
    #[error("background table: {0}")]
    Table(#[from] TableError),
    #[error("background interpolation: {0}")]
    Interpolation(#[from] InterpolationError),
    #[error("background trajectory is inconsistent: {0}")]
    Inconsistent(String),
}

/// Energy content and temperature equations of the early universe.
#[derive(Debug, Clone)]
pub struct BackgroundModel {
    pub plasma: PlasmaThermo,
    pub sector: Sector,
    pub constants: PhysicalConstants,
}

impl BackgroundModel {
    pub fn new(plasma: PlasmaThermo, sector: Sector, constants: PhysicalConstants) -> Self {
        BackgroundModel {
            plasma,
            sector,
            constants,
        }
    }

    /// Expansion rate from the Friedmann equation, s⁻¹.
    pub fn hubble(&self, tg: f64, tnue: f64, tnumu: f64, t_np: f64) -> f64 {
        let c = &self.constants;
        let rho_pl = rho_g(tg) + rho_e(tg) + self.plasma.delta_rho_qed(tg);
        let rho_3nu = rho_nu(tnue) + 2.0 * rho_nu(tnumu);
        let mut rho_tot = rho_pl + rho_3nu + c.norm_delta_neff * c.delta_neff * rho_g(tg);
        rho_tot += self.sector.rho(self.sector.temperature(tg, tnue, t_np));
        c.mev_to_secm1 * (rho_tot * 8.0 * PI / (3.0 * c.m_pl * c.m_pl)).sqrt()
    }

    fn delta_rho_nu(&self, tg: f64, tnu: f64) -> f64 {
        self.plasma.delta_rho_nue(tg, tnu, tnu) + 2.0 * self.plasma.delta_rho_numu(tg, tnu, tnu)
    }

    pub fn dtnu_dt(&self, tg: f64, tnu: f64, t_np: f64) -> f64 {
        let h = self.hubble(tg, tnu, tnu, t_np);
        let mut num = -12.0 * h * rho_nu(tnu) + self.delta_rho_nu(tg, tnu);
        let mut den = 3.0 * drho_nu_dt(tnu);
        if self.sector.coupling() == Coupling::Neutrinos {
            num -= 3.0 * h * (self.sector.rho(tnu) + self.sector.pressure(tnu));
            den += self.sector.drho_dt(tnu);
        }
        num / den
    }

    pub fn dtg_dt(&self, tg: f64, tnu: f64, t_np: f64) -> f64 {
        let h = self.hubble(tg, tnu, tnu, t_np);
        let mut num = -h
            * (4.0 * rho_g(tg) + 3.0 * (rho_e(tg) + p_e(tg)) + 3.0 * tg * self.plasma.dp_qed_dt(tg));
        // collision terms sum to zero: what neutrinos gain the plasma loses
        num -= self.delta_rho_nu(tg, tnu);
        let mut den = drho_g_dt(tg) + drho_e_dt(tg) + tg * self.plasma.d2p_qed_dt2(tg);
        match self.sector.coupling() {
            Coupling::Decoupled => num -= self.sector.delta_rho(tg, tnu, tnu, t_np),
            Coupling::Plasma => {
                num -= 3.0 * h * (self.sector.rho(tg) + self.sector.pressure(tg));
                den += self.sector.drho_dt(tg);
            }
            Coupling::Absent | Coupling::Neutrinos => {}
        }
        num / den
    }

    pub fn dtnp_dt(&self, tg: f64, tnu: f64, t_np: f64) -> f64 {
        let h = self.hubble(tg, tnu, tnu, t_np);
        let num = -3.0 * h * (self.sector.rho(t_np) + self.sector.pressure(t_np))
            + self.sector.delta_rho(tg, tnu, tnu, t_np);
        num / self.sector.drho_dt(t_np)
    }

    /// Effective number of neutrinos, extra radiation in units of one
    /// instantaneously decoupled neutrino.
    pub fn n_eff(&self, tg: f64, tnue: f64, tnumu: f64, t_np: f64) -> f64 {
        let c = &self.constants;
        let rho_gamma = rho_g(tg);
        let mut rho_rad = rho_nu(tnue) + 2.0 * rho_nu(tnumu) + rho_gamma;
        rho_rad += c.norm_delta_neff * c.delta_neff * rho_gamma;
        rho_rad += self.sector.rho(self.sector.temperature(tg, tnue, t_np));
        (rho_rad - rho_gamma) / rho_gamma / c.norm_delta_neff
    }

    /// Entropy density of the plasma, including a sector in equilibrium with it.
    pub fn entropy(&self, tg: f64) -> f64 {
        let mut s = self.plasma.spl(tg);
        if self.sector.coupling() == Coupling::Plasma {
            s += (self.sector.rho(tg) + self.sector.pressure(tg)) / tg;
        }
        s
    }

    /// Start temperature of the run in MeV.
    pub fn t_start_mev(&self) -> f64 {
        self.constants.t_start / self.constants.mev_to_kelvin
    }

    pub fn t_end_mev(&self) -> f64 {
        self.constants.t_end / self.constants.mev_to_kelvin
    }

    /// Half a Hubble time at T_start, the first time of the trajectory.
    pub fn initial_time(&self) -> f64 {
        let ts = self.t_start_mev();
        let t_np = self.sector.initial_temperature(ts);
        1.0 / (2.0 * self.hubble(ts, ts, ts, t_np))
    }

    /// Integrates the temperature equations on `n_sampling` log-spaced times.
    pub fn solve_temperatures(
        &self,
        solver: &IvpSolver,
        t_final: f64,
        n_sampling: usize,
    ) -> Result<BackgroundTrajectory, BackgroundError> {
        let t_ini = self.initial_time();
        let ts = self.t_start_mev();
        let mut y0 = vec![ts, ts];
        if self.sector.is_active() {
            y0.push(self.sector.initial_temperature(ts));
        }
        info!(
            "solving background from t = {:.4e} s to {:.4e} s ({} samples, {})",
            t_ini,
            t_final,
            n_sampling,
            solver.name()
        );
        let t_eval = logspace(t_ini, t_final, n_sampling);
        let traj = solver.solve(self, &DVector::from_vec(y0), (t_ini, t_final), &t_eval, 1e-6, 1e-9)?;
        let t_np = if self.sector.is_active() {
            Some(traj.component(2))
        } else {
            None
        };
        Ok(BackgroundTrajectory {
            t: traj.t.clone(),
            tg: traj.component(0),
            tnu: traj.component(1),
            t_np,
        })
    }
}

impl OdeSystem for BackgroundModel {
    fn ndim(&self) -> usize {
        if self.sector.is_active() { 3 } else { 2 }
    }

    fn rhs(&self, _t: f64, y: &DVector<f64>, dydt: &mut DVector<f64>) {
        let (tg, tnu) = (y[0], y[1]);
        let t_np = if self.sector.is_active() { y[2] } else { 0.0 };
        dydt[0] = self.dtg_dt(tg, tnu, t_np);
        dydt[1] = self.dtnu_dt(tg, tnu, t_np);
        if self.sector.is_active() {
            dydt[2] = self.dtnp_dt(tg, tnu, t_np);
        }
    }

    fn time_derivative(&self, _t: f64, _y: &DVector<f64>, _f0: &DVector<f64>, dfdt: &mut DVector<f64>) {
        dfdt.fill(0.0);
    }
}

/// Sampled solution of the temperature equations.
#[derive(Debug, Clone, PartialEq)]
pub struct BackgroundTrajectory {
    pub t: Vec<f64>,
    pub tg: Vec<f64>,
    pub tnu: Vec<f64>,
    pub t_np: Option<Vec<f64>>,
}

impl BackgroundTrajectory {
    /// Writes `t Tγ Tν [T_NP]` columns.
    pub fn save(&self, path: &Path) -> Result<(), BackgroundError> {
        let mut columns: Vec<&[f64]> = vec![&self.t, &self.tg, &self.tnu];
        if let Some(t_np) = &self.t_np {
            columns.push(t_np);
        }
        save_columns(path, &columns)?;
        Ok(())
    }

    pub fn load(path: &Path, with_sector: bool) -> Result<Self, BackgroundError> {
        let n = if with_sector { 4 } else { 3 };
        let mut cols = load_columns(path, n)?;
        let t_np = if with_sector { cols.pop() } else { None };
        let tnu = cols.pop().unwrap_or_default();
        let tg = cols.pop().unwrap_or_default();
        let t = cols.pop().unwrap_or_default();
        let traj = BackgroundTrajectory { t, tg, tnu, t_np };
        traj.check()?;
        Ok(traj)
    }

    fn check(&self) -> Result<(), BackgroundError> {
        if self.t.len() < 2 {
            return Err(BackgroundError::Inconsistent(format!(
                "{} samples, at least 2 needed",
                self.t.len()
            )));
        }
        if self.t.windows(2).any(|w| w[1] <= w[0]) {
            return Err(BackgroundError::Inconsistent("time grid is not increasing".into()));
        }
        Ok(())
    }

    pub fn final_temperatures(&self) -> (f64, f64, f64) {
        let last = self.t.len() - 1;
        let t_np = self.t_np.as_ref().map_or(0.0, |v| v[last]);
        (self.tg[last], self.tnu[last], t_np)
    }
}

/// Plasma heating of the neutrinos along the solved trajectory, driving ln a(ln T).
struct ScaleFactorSystem<'a> {
    model: &'a BackgroundModel,
    tnu_of_tg: &'a LinearInterpolator,
    tnp_of_tg: Option<&'a LinearInterpolator>,
}

impl ScaleFactorSystem<'_> {
    fn sbar(&self, t: f64) -> f64 {
        self.model.entropy(t) / t.powi(3)
    }

    /// Richardson-extrapolated central difference of s̄
    fn dsbar_dt(&self, t: f64) -> f64 {
        let h = 1e-3 * t;
        let d = |h: f64| (self.sbar(t + h) - self.sbar(t - h)) / (2.0 * h);
        (4.0 * d(0.5 * h) - d(h)) / 3.0
    }

    /// heat leaving the plasma per Hubble time in units of T⁴
    fn n_nu_rate(&self, t: f64) -> f64 {
        let tnu = self.tnu_of_tg.eval(t);
        let t_np = self.tnp_of_tg.map_or(0.0, |f| f.eval(t));
        let mut qdot = self.model.delta_rho_nu(t, tnu);
        if self.model.sector.is_active() {
            qdot += self.model.sector.delta_rho(t, tnu, tnu, t_np);
        }
        qdot / self.model.hubble(t, tnu, tnu, t_np) / t.powi(4)
    }

    fn dlna_dlnt(&self, ln_t: f64) -> f64 {
        let t = ln_t.exp();
        let sbar = self.sbar(t);
        -(3.0 * sbar + t * self.dsbar_dt(t)) / (3.0 * sbar + self.n_nu_rate(t))
    }
}

impl OdeSystem for ScaleFactorSystem<'_> {
    fn ndim(&self) -> usize {
        1
    }
    fn rhs(&self, t: f64, _y: &DVector<f64>, dydt: &mut DVector<f64>) {
        dydt[0] = self.dlna_dlnt(t);
    }
    fn jacobian(&self, _t: f64, _y: &DVector<f64>, jac: &mut nalgebra::DMatrix<f64>) {
        jac[(0, 0)] = 0.0;
    }
}

/// Cosmological background of one run: trajectory plus derived maps.
#[derive(Debug, Clone)]
pub struct Background {
    pub model: BackgroundModel,
    pub trajectory: BackgroundTrajectory,
    t_of_tg: LinearInterpolator,
    tg_of_t: LinearInterpolator,
    /// ln a over ln T, present with non-instantaneous decoupling
    ln_a_of_ln_t: Option<LinearInterpolator>,
    a_of_t: LinearInterpolator,
    /// times of T_start, T_weak, T_nucl, T_end
    pub t_start: f64,
    pub t_weak: f64,
    pub t_nucl: f64,
    pub t_end: f64,
}

impl Background {
    pub fn new(
        model: BackgroundModel,
        trajectory: BackgroundTrajectory,
        solver: &IvpSolver,
        non_instantaneous_decoupling: bool,
        n_sampling: usize,
    ) -> Result<Self, BackgroundError> {
        trajectory.check()?;
        if model.sector.is_active() != trajectory.t_np.is_some() {
            return Err(BackgroundError::Inconsistent(
                "extra sector temperature column does not match the configured sector".into(),
            ));
        }
        let t_of_tg = LinearInterpolator::new(&trajectory.tg, &trajectory.t)?;
        let tg_of_t = LinearInterpolator::new(&trajectory.t, &trajectory.tg)?;

        let ln_a_of_ln_t = if non_instantaneous_decoupling {
            let tnu_of_tg = LinearInterpolator::new(&trajectory.tg, &trajectory.tnu)?;
            let tnp_of_tg = match &trajectory.t_np {
                Some(t_np) => Some(LinearInterpolator::new(&trajectory.tg, t_np)?),
                None => None,
            };
            let system = ScaleFactorSystem {
                model: &model,
                tnu_of_tg: &tnu_of_tg,
                tnp_of_tg: tnp_of_tg.as_ref(),
            };
            Some(Self::solve_scale_factor(&system, solver, n_sampling)?)
        } else {
            None
        };

        let mut background = Background {
            a_of_t: tg_of_t.clone(),
            model,
            trajectory,
            t_of_tg,
            tg_of_t,
            ln_a_of_ln_t,
            t_start: 0.0,
            t_weak: 0.0,
            t_nucl: 0.0,
            t_end: 0.0,
        };
        let a_vec: Vec<f64> = background.trajectory.tg.iter().map(|&t| background.a_of_T(t)).collect();
        background.a_of_t = LinearInterpolator::new(&background.trajectory.t, &a_vec)?;

        let c = &background.model.constants;
        let (ts, tw, tn, te) = (
            c.t_start / c.mev_to_kelvin,
            c.t_weak / c.mev_to_kelvin,
            c.t_nucl / c.mev_to_kelvin,
            c.t_end / c.mev_to_kelvin,
        );
        background.t_start = background.t_of_T(ts);
        background.t_weak = background.t_of_T(tw);
        background.t_nucl = background.t_of_T(tn);
        background.t_end = background.t_of_T(te);
        info!(
            "era times: t_start = {:.4e} s, t_weak = {:.4e} s, t_nucl = {:.4e} s, t_end = {:.4e} s",
            background.t_start, background.t_weak, background.t_nucl, background.t_end
        );
        Ok(background)
    }

    /// ln a on ln T, integrated upward from T_end where entropy conservation
    /// down to today fixes the boundary value.
    fn solve_scale_factor(
        system: &ScaleFactorSystem,
        solver: &IvpSolver,
        n_sampling: usize,
    ) -> Result<LinearInterpolator, BackgroundError> {
        let c = &system.model.constants;
        let t_end = system.model.t_end_mev();
        let t_start = system.model.t_start_mev();
        let z0 = c.t0_mev();
        let z_end = z0 / (system.sbar(t_end) / c.s0bar).powf(1.0 / 3.0);
        let ln_a_end = (z_end / t_end).ln();
        let ln_t_eval: Vec<f64> = logspace(t_end, t_start, n_sampling).iter().map(|t| t.ln()).collect();
        info!("solving ln a(ln T) with non-instantaneous neutrino decoupling");
        let traj = solver.solve(
            system,
            &DVector::from_element(1, ln_a_end),
            (t_end.ln(), t_start.ln()),
            &ln_t_eval,
            1e-6,
            1e-9,
        )?;
        Ok(LinearInterpolator::new(&traj.t, &traj.component(0))?)
    }

    #[allow(non_snake_case)]
    pub fn t_of_T(&self, t_mev: f64) -> f64 {
        self.t_of_tg.eval(t_mev)
    }

    #[allow(non_snake_case)]
    pub fn T_of_t(&self, t: f64) -> f64 {
        self.tg_of_t.eval(t)
    }

    /// Scale factor (a = 1 today) at photon temperature `t_mev`.
    #[allow(non_snake_case)]
    pub fn a_of_T(&self, t_mev: f64) -> f64 {
        match &self.ln_a_of_ln_t {
            Some(f) => f.eval(t_mev.ln()).exp(),
            None => (self.model.constants.s0_cmb / self.model.entropy(t_mev)).powf(1.0 / 3.0),
        }
    }

    /// Scale factor at time `t`, linearly extrapolated beyond the trajectory.
    pub fn a_of_t(&self, t: f64) -> f64 {
        self.a_of_t.eval(t)
    }

    pub fn hubble(&self, tg: f64, tnue: f64, tnumu: f64, t_np: f64) -> f64 {
        self.model.hubble(tg, tnue, tnumu, t_np)
    }

    /// Baryon number density, MeV³.
    pub fn n_b(&self, a: f64) -> f64 {
        let c = &self.model.constants;
        c.n0_cmb * c.eta0 / a.powi(3)
    }

    /// Baryon-to-photon ratio at a temperature given in Kelvin.
    #[allow(non_snake_case)]
    pub fn eta_of_T(&self, t_kelvin: f64) -> f64 {
        let t_mev = t_kelvin / self.model.constants.mev_to_kelvin;
        let n_gamma = 2.0 * ZETA3 / (PI * PI) * t_mev.powi(3);
        self.n_b(self.a_of_T(t_mev)) / n_gamma
    }

    /// Nucleonic mass density entering the network, g/cm³.
    pub fn rho_b(&self, a: f64) -> f64 {
        let c = &self.model.constants;
        crate::Cosmology::physical_constants::M_AMU * c.n0_cmb * c.eta0 * c.mev4_to_gcmm3 / a.powi(3)
    }

    /// Photon temperature in Kelvin at time `t`.
    pub fn temperature_kelvin(&self, t: f64) -> f64 {
        self.T_of_t(t) * self.model.constants.mev_to_kelvin
    }

    /// N_eff at the end of the trajectory.
    pub fn n_eff(&self) -> f64 {
        let (tg, tnu, t_np) = self.trajectory.final_temperatures();
        self.model.n_eff(tg, tnu, tnu, t_np)
    }

    /// neutrino temperature today, MeV
    fn tnu_today(&self) -> f64 {
        let (tg, tnu, _) = self.trajectory.final_temperatures();
        tnu / tg * self.model.constants.t0_mev()
    }

    /// Ω_ν h² of one relativistic neutrino species.
    pub fn omega_nu_h2_rel(&self) -> f64 {
        7.0 * PI * PI / 120.0 * self.tnu_today().powi(4) / self.model.constants.rhoc_over_h2
    }

    /// Ω_ν h² of non-relativistic neutrinos per unit Σm_ν, MeV⁻¹.
    pub fn omega_nu_h2_nr(&self) -> f64 {
        1.5 * ZETA3 / (PI * PI) * self.tnu_today().powi(3) / self.model.constants.rhoc_over_h2
    }
}

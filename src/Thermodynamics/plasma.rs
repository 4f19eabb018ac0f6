//! Energy densities, pressures and collision terms of the photon, e± and
//! neutrino components (natural units, temperatures and energies in MeV).
use crate::Cosmology::physical_constants::{G_F, M_E, PhysicalConstants};
use crate::Thermodynamics::thermo_tables::ThermoTables;
use crate::Utils::quadrature::{IntegrationError, QuadOptions, quad};
use log::warn;
use std::f64::consts::PI;

/// upper cutoff of the e± integrals, E/T
const E_OVER_T_MAX: f64 = 100.0;
/// e± contributions vanish for T < m_e/ELECTRON_THRESHOLD
const ELECTRON_THRESHOLD: f64 = 30.0;
/// Pauli blocking factors of the relativistic collision integrals
const F_ANN_FD: f64 = 0.884;
const F_SCAT_FD: f64 = 0.829;

pub fn rho_g(t: f64) -> f64 {
    2.0 * PI * PI / 30.0 * t.powi(4)
}

pub fn drho_g_dt(t: f64) -> f64 {
    4.0 * rho_g(t) / t
}

/// one neutrino flavour, ν + ν̄
pub fn rho_nu(t_nu: f64) -> f64 {
    2.0 * (7.0 / 8.0) * PI * PI / 30.0 * t_nu.powi(4)
}

pub fn drho_nu_dt(t_nu: f64) -> f64 {
    4.0 * rho_nu(t_nu) / t_nu
}

/// Fermi–Dirac integral over E/T ∈ [m_e/T, 100]. A failed quadrature keeps the
/// best estimate when there is one, so that the thermodynamic functions stay total.
fn electron_integral<F: Fn(f64) -> f64>(integrand: F, x: f64) -> f64 {
    let opts = QuadOptions::with_tolerances(1e-12, 1e-12);
    match quad(integrand, x, E_OVER_T_MAX, &opts) {
        Ok((value, _)) => value,
        Err(IntegrationError::MaxSubdivisions {
            estimate, error, ..
        }) => {
            warn!(
                "e± integral at m_e/T = {:.4e} not converged (error {:.3e})",
                x, error
            );
            estimate
        }
        Err(e) => {
            warn!("e± integral at m_e/T = {:.4e} failed: {}", x, e);
            f64::NAN
        }
    }
}

fn below_threshold(t: f64) -> bool {
    t < M_E / ELECTRON_THRESHOLD
}

/// e⁺ + e⁻ energy density
pub fn rho_e(t: f64) -> f64 {
    if below_threshold(t) {
        return 0.0;
    }
    let x = M_E / t;
    let integrand = |e: f64| e * e * (e * e - x * x).max(0.0).sqrt() / (e.exp() + 1.0);
    4.0 / (2.0 * PI * PI) * t.powi(4) * electron_integral(integrand, x)
}

pub fn drho_e_dt(t: f64) -> f64 {
    if below_threshold(t) {
        return 0.0;
    }
    let x = M_E / t;
    let integrand = |e: f64| e.powi(3) * (e * e - x * x).max(0.0).sqrt() / (e / 2.0).cosh().powi(2);
    1.0 / (2.0 * PI * PI) * t.powi(3) * electron_integral(integrand, x)
}

/// e⁺ + e⁻ pressure
pub fn p_e(t: f64) -> f64 {
    if below_threshold(t) {
        return 0.0;
    }
    let x = M_E / t;
    let integrand = |e: f64| (e * e - x * x).max(0.0).powf(1.5) / (e.exp() + 1.0);
    4.0 / (6.0 * PI * PI) * t.powi(4) * electron_integral(integrand, x)
}

/// Thermodynamics of the standard-model plasma with its correction tables.
#[derive(Debug, Clone)]
pub struct PlasmaThermo {
    pub tables: ThermoTables,
    /// MeV→s⁻¹ · G_F²/π⁵
    collision_prefactor: f64,
    ge2: f64,
    gmu2: f64,
}

impl PlasmaThermo {
    pub fn new(tables: ThermoTables, constants: &PhysicalConstants) -> Self {
        PlasmaThermo {
            tables,
            collision_prefactor: constants.mev_to_secm1 * G_F * G_F / PI.powi(5),
            ge2: constants.ge_l.powi(2) + constants.ge_r.powi(2),
            gmu2: constants.gmu_l.powi(2) + constants.gmu_r.powi(2),
        }
    }

    pub fn p_qed(&self, t: f64) -> f64 {
        self.tables.p_qed.eval(t)
    }

    pub fn dp_qed_dt(&self, t: f64) -> f64 {
        self.tables.dp_qed_dt.eval(t)
    }

    pub fn d2p_qed_dt2(&self, t: f64) -> f64 {
        self.tables.d2p_qed_dt2.eval(t)
    }

    /// QED shift of the plasma energy density, T dP/dT − P
    pub fn delta_rho_qed(&self, t: f64) -> f64 {
        t * self.dp_qed_dt(t) - self.p_qed(t)
    }

    /// Plasma entropy density s = (ρ + p)/T of photons and e±, QED included.
    pub fn spl(&self, t: f64) -> f64 {
        let rho_pl = rho_g(t) + rho_e(t);
        let p_pl = rho_g(t) / 3.0 + p_e(t);
        (rho_pl + p_pl + t * self.dp_qed_dt(t)) / t
    }

    fn f_nu_e(&self, t1: f64, t2: f64) -> f64 {
        32.0 * F_ANN_FD * (t1.powi(9) - t2.powi(9)) * self.tables.nue_ann.eval(t1)
            + 56.0 * F_SCAT_FD * self.tables.nue_scatt.eval(t1) * t1.powi(4) * t2.powi(4) * (t1 - t2)
    }

    fn f_nu_mu(&self, t1: f64, t2: f64) -> f64 {
        32.0 * F_ANN_FD * (t1.powi(9) - t2.powi(9)) * self.tables.numu_ann.eval(t1)
            + 56.0 * F_SCAT_FD * self.tables.numu_scatt.eval(t1) * t1.powi(4) * t2.powi(4) * (t1 - t2)
    }

    /// Energy transfer rate (MeV⁴/s) from the plasma into νe, including νμ ↔ νe exchange.
    pub fn delta_rho_nue(&self, tg: f64, tnue: f64, tnumu: f64) -> f64 {
        self.collision_prefactor
            * (4.0 * self.ge2 * self.f_nu_e(tg, tnue) + 2.0 * f_g(tnumu, tnue))
    }

    /// Energy transfer rate into one νμ (or ντ) flavour.
    pub fn delta_rho_numu(&self, tg: f64, tnue: f64, tnumu: f64) -> f64 {
        self.collision_prefactor * (4.0 * self.gmu2 * self.f_nu_mu(tg, tnue) - f_g(tnumu, tnue))
    }

    /// Total standard-model energy density
    pub fn rho_sm(&self, tg: f64, tnue: f64, tnumu: f64) -> f64 {
        rho_g(tg) + rho_e(tg) + rho_nu(tnue) + 2.0 * rho_nu(tnumu) + self.delta_rho_qed(tg)
    }

    pub fn p_sm(&self, tg: f64, tnue: f64, tnumu: f64) -> f64 {
        rho_g(tg) / 3.0 + p_e(tg) + (rho_nu(tnue) + 2.0 * rho_nu(tnumu)) / 3.0 + self.p_qed(tg)
    }
}

fn f_g(t1: f64, t2: f64) -> f64 {
    32.0 * F_ANN_FD * (t1.powi(9) - t2.powi(9))
        + 56.0 * F_SCAT_FD * t1.powi(4) * t2.powi(4) * (t1 - t2)
}

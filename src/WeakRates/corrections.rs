//! Zero-temperature corrections to the Born n↔p rates.
//!
//! - [`fermi_coulomb`]: Fermi function of the final-state Coulomb interaction
//!   with a finite proton radius;
//! - [`rad_corr_resum`]: Sirlin's universal function combined with the
//!   resummed short- and long-distance electroweak factors;
//! - [`FiniteMassFactors`]: the weak-magnetism/recoil form factors f₁, f₂, f₃;
//! - [`neutron_decay_phase_space`]: the integral F_n that fixes the rate
//!   normalization through the measured neutron lifetime.
//!
//! Energies and momenta are in units of the electron mass.
use crate::Cosmology::physical_constants::{
    ALPHA_EM, C_LIGHT, G_A, H_PLANCK, M_E, M_N, M_P, MEV, R_PROTON,
};
use crate::Utils::quadrature::{IntegrationError, integrate};
use crate::Utils::special_functions::{ln_gamma_complex, spence};
use num_complex::Complex64;
use std::f64::consts::PI;

/// axial mass, MeV
const M_AXIAL: f64 = 1.2e3;
const A_G: f64 = -0.34;
const C_NDECAY: f64 = 0.891;
const DELTA_NDECAY: f64 = -0.00043;
const L_NDECAY: f64 = 1.02094;
const S_NDECAY: f64 = 1.02248;
const NLL_NDECAY: f64 = -0.0001;
const PHASE_SPACE_EPSREL: f64 = 1e-9;

/// (n − p mass difference)/m_e
pub fn q_over_me() -> f64 {
    (M_N - M_P) / M_E
}

/// Coulomb correction for an electron of velocity `b` = p/E.
pub fn fermi_coulomb(b: f64) -> f64 {
    let gamma = (1.0 - ALPHA_EM * ALPHA_EM).sqrt() - 1.0;
    let gamma1 = 1.0 + gamma;
    let gamma2 = 3.0 + 2.0 * gamma;
    // electron Compton wavelength, cm
    let compton = H_PLANCK / (2.0 * PI) * C_LIGHT / (M_E * MEV);
    let eta = ALPHA_EM / b;
    // exp(πη)·|Γ(γ1 + iη)|² overflows separately at small velocity
    let ln_coulomb = PI * eta + 2.0 * ln_gamma_complex(Complex64::new(gamma1, eta)).re;
    let ln_gamma2 = ln_gamma_complex(Complex64::new(gamma2, 0.0)).re;
    (1.0 + gamma / 2.0)
        * 4.0
        * ((2.0 * R_PROTON * b) / compton).powf(2.0 * gamma)
        * (ln_coulomb - 2.0 * ln_gamma2).exp()
        / (1.0 - b * b).powf(gamma)
}

/// Radiative correction factor for electron velocity `b`, antineutrino
/// (or neutrino) energy `y` and electron energy `en`.
pub fn rad_corr_resum(b: f64, y: f64, en: f64) -> f64 {
    let q = M_N - M_P;
    let y = y.max(f64::MIN_POSITIVE);
    let rd = if b == 0.0 { 1.0 } else { b.atanh() / b };
    let spence_term = if b == 0.0 {
        -8.0
    } else {
        -(4.0 / b) * spence(1.0 - 2.0 * b / (1.0 + b))
    };
    let sirlin = 3.0 * (M_P / M_E).ln() - 0.75
        + 4.0 * (rd - 1.0) * (y / (3.0 * en) - 1.5 + (2.0 * y).ln())
        + rd * (2.0 * (1.0 + b * b) + y * y / (6.0 * en * en) - 4.0 * b * rd)
        + spence_term;
    let short_distance = 1.0 + ALPHA_EM / (2.0 * PI) * (sirlin - 3.0 * (M_P / (2.0 * q)).ln());
    let long_distance = L_NDECAY + ALPHA_EM / PI * C_NDECAY + DELTA_NDECAY;
    let resummed = S_NDECAY + 1.0 / (134.0 * 2.0 * PI) * ((M_P / M_AXIAL).ln() + A_G) + NLL_NDECAY;
    short_distance * long_distance * resummed
}

/// Form factors of the finite nucleon mass correction for one direction
/// (`sign` = +1 for n→p, −1 for p→n).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FiniteMassFactors {
    pub f1: f64,
    pub f2: f64,
    pub f3: f64,
}

impl FiniteMassFactors {
    pub fn new(sign: f64, delta_kappa: f64) -> Self {
        let norm = 1.0 + 3.0 * G_A * G_A;
        FiniteMassFactors {
            f1: ((1.0 + sign * G_A).powi(2) + 2.0 * delta_kappa * sign * G_A) / norm,
            f2: ((1.0 - sign * G_A).powi(2) - 2.0 * delta_kappa * sign * G_A) / norm,
            f3: (G_A * G_A - 1.0) / norm,
        }
    }

    pub fn sum(&self) -> f64 {
        self.f1 + self.f2 + self.f3
    }
}

/// Phase-space integral of free neutron decay.
///
/// `born_only` gives the plain Born value, otherwise the Coulomb and
/// radiatively corrected integral plus the finite nucleon mass piece.
pub fn neutron_decay_phase_space(delta_kappa: f64, born_only: bool) -> Result<f64, IntegrationError> {
    let q = q_over_me();
    let born = |e: f64| e * (e - q).powi(2) * (e * e - 1.0).max(0.0).sqrt();
    if born_only {
        return integrate(born, 1.0, q, 0.0, PHASE_SPACE_EPSREL);
    }
    let radiative = |e: f64| {
        let b = (e * e - 1.0).sqrt() / e;
        e * (e - q).powi(2) * e * b * fermi_coulomb(b) * rad_corr_resum(b, q - e, e)
    };
    let fn_rad = integrate(radiative, 1.0, q, 0.0, PHASE_SPACE_EPSREL)?;

    let ff = FiniteMassFactors::new(1.0, delta_kappa);
    let mn = M_N / M_E;
    let chi = |en: f64, pe: f64| {
        let d = en - q;
        ff.f1 * d * d * (pe * pe / (mn * en)) - ff.f2 / mn * d.powi(3)
            + ff.sum() / (2.0 * mn) * (4.0 * d.powi(3) + 2.0 * d * pe * pe)
            + ff.f3 / mn * d * d * pe * pe / en
    };
    let finite_mass = |pe: f64| {
        let en = (pe * pe + 1.0).sqrt();
        let b = pe / en;
        pe * pe * chi(en, pe) * rad_corr_resum(b, (en - q).abs(), en) * fermi_coulomb(b)
    };
    let fn_fm = integrate(finite_mass, 0.0, (q * q - 1.0).sqrt(), 0.0, PHASE_SPACE_EPSREL)?;
    Ok(fn_rad + fn_fm)
}

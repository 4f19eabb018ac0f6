//! Bulk n↔p rates as one-dimensional integrals over the electron momentum:
//! Born approximation, T = 0 radiative corrections and finite nucleon mass
//! corrections. The neutrino temperature enters through Tν/Tγ interpolated
//! from the background trajectory.
//!
//! Rates returned here are dimensionless; they become s⁻¹ after the global
//! normalization applied in [`crate::WeakRates::rate_tables`].
use crate::Cosmology::physical_constants::{M_E, M_N, M_P, PhysicalConstants};
use crate::Utils::interpolation::LinearInterpolator;
use crate::Utils::quadrature::{QuadOptions, quad};
use crate::WeakRates::WeakRateError;
use crate::WeakRates::corrections::{FiniteMassFactors, fermi_coulomb, q_over_me, rad_corr_resum};
use crate::WeakRates::fermi_dirac::*;

/// Direction of the weak conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// n → p, the "forward" rate
    NToP,
    /// p → n, the "backward" rate
    PToN,
}

impl Direction {
    pub fn sign(self) -> f64 {
        match self {
            Direction::NToP => 1.0,
            Direction::PToN => -1.0,
        }
    }
}

/// Coulomb factor only where electron and nucleon charges attract.
pub fn fermi_stat(sign_q: f64, sign_e: f64, b: f64) -> f64 {
    if sign_q * sign_e > 0.0 { fermi_coulomb(b) } else { 1.0 }
}

#[derive(Debug, Clone)]
pub struct WeakRateKernel {
    /// Q/m_e
    pub q: f64,
    pub xi_nu: f64,
    mev_to_kelvin: f64,
    delta_kappa: f64,
    /// Tν/Tγ over Tγ in Kelvin
    tnu_over_tg: LinearInterpolator,
    quad_opts: QuadOptions,
}

impl WeakRateKernel {
    /// `tg`, `tnu`: background temperatures in MeV.
    pub fn new(constants: &PhysicalConstants, tg: &[f64], tnu: &[f64]) -> Result<Self, WeakRateError> {
        let tg_kelvin: Vec<f64> = tg.iter().map(|t| t * constants.mev_to_kelvin).collect();
        let ratio: Vec<f64> = tnu.iter().zip(tg).map(|(n, g)| n / g).collect();
        Ok(WeakRateKernel {
            q: q_over_me(),
            xi_nu: constants.xi_nu,
            mev_to_kelvin: constants.mev_to_kelvin,
            delta_kappa: constants.delta_kappa,
            tnu_over_tg: LinearInterpolator::new(&tg_kelvin, &ratio)?,
            quad_opts: QuadOptions::with_tolerances(1.49e-8, 1e-6),
        })
    }

    /// m_e/T for photons and neutrinos at photon temperature `t_kelvin`.
    pub fn inverse_temperatures(&self, t_kelvin: f64) -> (f64, f64) {
        let x = M_E * self.mev_to_kelvin / t_kelvin;
        (x, x / self.tnu_over_tg.eval(t_kelvin))
    }

    /// upper momentum cut of the electron integrals
    fn p_max(x: f64) -> f64 {
        f64::max(7.0, 30.0 / x)
    }

    /// Born integrand weight for electron energy `e` (negative for positrons).
    pub fn chi(&self, e: f64, x: f64, znu: f64, dir: Direction) -> f64 {
        let s = dir.sign();
        let e_nu = e - s * self.q;
        fermi_dirac(znu * e_nu - s * self.xi_nu) * fermi_dirac(-e * x) * e_nu * e_nu
    }

    /// neutrino factor of `chi` without the electron occupation
    pub fn chi_tilde(&self, e: f64, znu: f64, dir: Direction) -> f64 {
        let s = dir.sign();
        let e_nu = e - s * self.q;
        fermi_dirac(znu * e_nu - s * self.xi_nu) * e_nu * e_nu
    }

    fn chi_finite_mass(&self, en: f64, pe: f64, x: f64, znu: f64, dir: Direction) -> f64 {
        let s = dir.sign();
        let m = (M_P + M_N - s * (M_N - M_P)) / (2.0 * M_E);
        let ff = FiniteMassFactors::new(s, self.delta_kappa);
        let fd_e = fermi_dirac(-en * x);
        let nu = en - s * self.q;
        let pe2 = pe * pe;
        ff.f1 * e2p0(nu, znu) * fd_e * (pe2 / (m * en)) - ff.f2 * e3p0(nu, znu) * fd_e / m
            + ff.sum() / (2.0 * x * m) * (e4p2(nu, znu) + e2p2(nu, znu) * pe2) * fd_e
            + ff.sum() / (2.0 * m) * (e4p1(nu, znu) + e2p1(nu, znu) * pe2) * fd_e
            - (ff.f1 + ff.f2) / (x * m) * (e3p1(nu, znu) + e2p1(nu, znu) * pe2 / (-en)) * fd_e
            - ff.f3 * 3.0 / (x * m) * e2p0(nu, znu) * fd_e
            + ff.f3 / (3.0 * m) * e3p1(nu, znu) * fd_e * pe2 / en
            + ff.f3 / (3.0 * x * m) * e3p2(nu, znu) * fd_e * pe2 / en
            - ff.sum() * 3.0 / (2.0 * x) * (1.0 - (M_N / M_P).powf(s)) * e2p1(nu, znu) * fd_e
    }

    fn momentum_integral<F: Fn(f64) -> f64>(&self, f: F, x: f64) -> Result<f64, WeakRateError> {
        Ok(quad(f, 0.0, Self::p_max(x), &self.quad_opts)?.0)
    }

    /// Born approximation.
    pub fn born(&self, t_kelvin: f64, dir: Direction) -> Result<f64, WeakRateError> {
        let (x, znu) = self.inverse_temperatures(t_kelvin);
        let integrand = |p: f64| {
            let e = (p * p + 1.0).sqrt();
            p * p * (self.chi(e, x, znu, dir) + self.chi(-e, x, znu, dir))
        };
        self.momentum_integral(integrand, x)
    }

    /// Born rate with Coulomb and T = 0 radiative corrections.
    pub fn radiative(&self, t_kelvin: f64, dir: Direction) -> Result<f64, WeakRateError> {
        let (x, znu) = self.inverse_temperatures(t_kelvin);
        let s = dir.sign();
        let integrand = |p: f64| {
            let e = (p * p + 1.0).sqrt();
            let b = p / e;
            p * p
                * (self.chi(e, x, znu, dir) * rad_corr_resum(b, (s * self.q - e).abs(), e) * fermi_stat(s, 1.0, b)
                    + self.chi(-e, x, znu, dir)
                        * rad_corr_resum(b, (s * self.q + e).abs(), e)
                        * fermi_stat(s, -1.0, b))
        };
        self.momentum_integral(integrand, x)
    }

    /// Finite nucleon mass correction, radiatively corrected.
    pub fn finite_mass(&self, t_kelvin: f64, dir: Direction) -> Result<f64, WeakRateError> {
        let (x, znu) = self.inverse_temperatures(t_kelvin);
        let s = dir.sign();
        let integrand = |p: f64| {
            let e = (p * p + 1.0).sqrt();
            let b = p / e;
            p * p
                * (self.chi_finite_mass(e, p, x, znu, dir)
                    * rad_corr_resum(b, (s * self.q - e).abs(), e)
                    * fermi_stat(s, 1.0, b)
                    + self.chi_finite_mass(-e, p, x, znu, dir)
                        * rad_corr_resum(b, (s * self.q + e).abs(), e)
                        * fermi_stat(s, -1.0, b))
        };
        self.momentum_integral(integrand, x)
    }
}

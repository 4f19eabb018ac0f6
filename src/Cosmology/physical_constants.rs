//! Physical constants and unit conversions (CGS, energies in MeV).
//!
//! Fundamental values are `const`; everything that depends on the run
//! configuration (baryon density, neutron lifetime, era temperatures) or needs
//! a non-const function to evaluate lives in [`PhysicalConstants`], built once
//! per run.
use crate::Utils::special_functions::ZETA3;
use crate::settings::BbnConfig;
use std::f64::consts::PI;

/// Boltzmann constant, erg/K
pub const K_B: f64 = 1.380649e-16;
/// speed of light, cm/s
pub const C_LIGHT: f64 = 2.99792458e10;
/// Planck constant, erg·s
pub const H_PLANCK: f64 = 6.62607015e-27;
pub const MPC_CM: f64 = 3.08567758149e24;
/// 1 MeV in erg
pub const MEV: f64 = 1.602176634e-6;
pub const KEV: f64 = 1e-3 * MEV;

pub const ALPHA_EM: f64 = 1.0 / 137.035999084;
/// Fermi constant, MeV⁻²
pub const G_F: f64 = 1.1663787e-11;
/// Z mass, MeV
pub const M_Z: f64 = 91187.6;
/// electron, neutron, proton masses, MeV
pub const M_E: f64 = 0.51099895;
pub const M_N: f64 = 939.56542052;
pub const M_P: f64 = 938.27208816;
/// Newton constant, MeV⁻²
pub const G_N: f64 = 6.70883e-45;
pub const G_A: f64 = 1.2756;
pub const KAPPA_P: f64 = 2.79284734463 - 1.0;
pub const KAPPA_N: f64 = -1.91304273;
/// proton charge radius, cm
pub const R_PROTON: f64 = 0.8409e-13;
pub const V_UD: f64 = 0.9738;

/// photon temperature today, K
pub const T0_CMB: f64 = 2.7255;
/// atomic mass unit, MeV
pub const M_AMU: f64 = 931.494061;
/// He4 and H atomic masses in amu
pub const HE4_OVER_AMU: f64 = 4.0026032541;
pub const H_OVER_AMU: f64 = 1.00782503223;
/// helium mass fraction used to convert Ω_b h² into a nucleon density
pub const PERCENT_HE: f64 = 0.247;

#[derive(Debug, Clone, PartialEq)]
pub struct PhysicalConstants {
    pub mev_to_kelvin: f64,
    pub mev_to_secm1: f64,
    pub mev_to_g: f64,
    pub mev_to_cmm1: f64,
    pub mev4_to_gcmm3: f64,

    pub sin2_theta_w: f64,
    pub ge_l: f64,
    pub ge_r: f64,
    pub gmu_l: f64,
    pub gmu_r: f64,
    /// Planck mass, MeV
    pub m_pl: f64,
    pub delta_kappa: f64,
    /// neutron lifetime, s
    pub tau_n: f64,

    pub s0bar: f64,
    /// photon entropy today, MeV³
    pub s0_cmb: f64,
    /// photon number density today, MeV³
    pub n0_cmb: f64,
    /// 100 km/s/Mpc in MeV
    pub hubble_over_h: f64,
    /// critical density over h², MeV⁴
    pub rhoc_over_h2: f64,
    /// mean baryon mass, MeV
    pub m_b: f64,
    /// baryon-to-photon ratio today
    pub eta0: f64,
    /// neutrino chemical potential over temperature
    pub xi_nu: f64,
    /// (7/8)(4/11)^(4/3)
    pub norm_delta_neff: f64,
    pub delta_neff: f64,

    /// era temperatures, K
    pub t_start: f64,
    pub t_weak: f64,
    pub t_nucl: f64,
    pub t_end: f64,
}

impl PhysicalConstants {
    pub fn new(config: &BbnConfig) -> Self {
        let hbar = H_PLANCK / (2.0 * PI);
        let mev_to_kelvin = MEV / K_B;
        let mev_to_secm1 = MEV / hbar;
        let mev_to_g = MEV / (C_LIGHT * C_LIGHT);
        let mev_to_cmm1 = MEV / (hbar * C_LIGHT);
        let mev4_to_gcmm3 = mev_to_g * mev_to_cmm1.powi(3);

        let sin2_theta_w =
            0.5 * (1.0 - (1.0 - 2.0 * 2f64.sqrt() * PI * ALPHA_EM / (G_F * M_Z * M_Z)).sqrt());

        let t0_mev = T0_CMB / mev_to_kelvin;
        let s0bar = 4.0 * PI * PI / 45.0;
        let s0_cmb = s0bar * t0_mev.powi(3);
        let n0_cmb = 2.0 * ZETA3 / (PI * PI) * t0_mev.powi(3);
        let hubble_over_h = 100.0 * (1e5 * mev_to_cmm1) / mev_to_secm1 / (MPC_CM * mev_to_cmm1);
        let rhoc_over_h2 = 3.0 / (8.0 * PI * G_N) * hubble_over_h * hubble_over_h;
        let m_b = ((1.0 - PERCENT_HE) * H_OVER_AMU + PERCENT_HE * HE4_OVER_AMU / 4.0) * M_AMU;
        // nucleonic density: CMB baryon density rescaled by m_amu/m_B
        let eta0 = (rhoc_over_h2 / n0_cmb) / (M_AMU / (M_AMU / m_b)) * config.omega_b_h2;

        Self {
            mev_to_kelvin,
            mev_to_secm1,
            mev_to_g,
            mev_to_cmm1,
            mev4_to_gcmm3,
            sin2_theta_w,
            ge_l: 0.5 + sin2_theta_w,
            ge_r: sin2_theta_w,
            gmu_l: -0.5 + sin2_theta_w,
            gmu_r: sin2_theta_w,
            m_pl: 1.0 / G_N.sqrt(),
            delta_kappa: KAPPA_P - KAPPA_N,
            tau_n: config.tau_n,
            s0bar,
            s0_cmb,
            n0_cmb,
            hubble_over_h,
            rhoc_over_h2,
            m_b,
            eta0,
            xi_nu: config.xi_nu,
            norm_delta_neff: (7.0 / 8.0) * (4.0f64 / 11.0).powf(4.0 / 3.0),
            delta_neff: config.delta_n_eff,
            t_start: config.t_start_mev * mev_to_kelvin,
            t_weak: config.t_weak_mev * mev_to_kelvin,
            t_nucl: config.t_nucl_mev * mev_to_kelvin,
            t_end: config.t_end_mev * mev_to_kelvin,
        }
    }

    /// today's photon temperature in MeV
    pub fn t0_mev(&self) -> f64 {
        T0_CMB / self.mev_to_kelvin
    }

    /// neutron-proton mass difference, MeV
    pub fn q_np(&self) -> f64 {
        M_N - M_P
    }
}

impl Default for PhysicalConstants {
    fn default() -> Self {
        Self::new(&BbnConfig::default())
    }
}

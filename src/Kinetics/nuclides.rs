//! The twelve tracked nuclides and their nuclear statistical equilibrium.
use crate::Cosmology::physical_constants::{K_B, KEV, M_AMU, M_E, M_N, M_P, MEV};
use crate::Utils::special_functions::ZETA3;
use std::f64::consts::PI;

/// Tracked species, in abundance-vector order. The small network uses the
/// first eight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Nuclide {
    N,
    P,
    D,
    T,
    He3,
    He4,
    Li7,
    Be7,
    He6,
    Li8,
    Li6,
    B8,
}

/// Static nuclear data of a nuclide.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NuclideData {
    pub neutrons: u32,
    pub protons: u32,
    /// mass excess, keV
    pub mass_excess_kev: f64,
    pub spin: f64,
}

impl Nuclide {
    pub const ALL: [Nuclide; 12] = [
        Nuclide::N,
        Nuclide::P,
        Nuclide::D,
        Nuclide::T,
        Nuclide::He3,
        Nuclide::He4,
        Nuclide::Li7,
        Nuclide::Be7,
        Nuclide::He6,
        Nuclide::Li8,
        Nuclide::Li6,
        Nuclide::B8,
    ];

    /// position in the abundance vector
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        match self {
            Nuclide::N => "n",
            Nuclide::P => "p",
            Nuclide::D => "d",
            Nuclide::T => "t",
            Nuclide::He3 => "He3",
            Nuclide::He4 => "a",
            Nuclide::Li7 => "Li7",
            Nuclide::Be7 => "Be7",
            Nuclide::He6 => "He6",
            Nuclide::Li8 => "Li8",
            Nuclide::Li6 => "Li6",
            Nuclide::B8 => "B8",
        }
    }

    pub fn data(self) -> NuclideData {
        let (neutrons, protons, mass_excess_kev, spin) = match self {
            Nuclide::N => (1, 0, 8071.3171, 0.5),
            Nuclide::P => (0, 1, 7288.9706, 0.5),
            Nuclide::D => (1, 1, 13135.722, 1.0),
            Nuclide::T => (2, 1, 14949.81, 0.5),
            Nuclide::He3 => (1, 2, 14931.218, 0.5),
            Nuclide::He4 => (2, 2, 2424.9156, 0.0),
            Nuclide::Li7 => (4, 3, 14907.105, 1.5),
            Nuclide::Be7 => (3, 4, 15769.0, 1.5),
            Nuclide::He6 => (4, 2, 17592.10, 0.0),
            Nuclide::Li8 => (5, 3, 20945.80, 2.0),
            Nuclide::Li6 => (3, 3, 14086.8789, 1.0),
            Nuclide::B8 => (3, 5, 22921.6, 2.0),
        };
        NuclideData {
            neutrons,
            protons,
            mass_excess_kev,
            spin,
        }
    }

    /// baryon number A
    pub fn mass_number(self) -> u32 {
        let d = self.data();
        d.neutrons + d.protons
    }

    pub fn charge(self) -> u32 {
        self.data().protons
    }

    /// Binding energy in keV from the mass excesses of the nucleus and of
    /// its free nucleons.
    pub fn binding_energy_kev(self) -> f64 {
        let d = self.data();
        let n = Nuclide::N.data().mass_excess_kev;
        let p = Nuclide::P.data().mass_excess_kev;
        d.neutrons as f64 * n + d.protons as f64 * p - d.mass_excess_kev
    }

    /// Nuclear mass in erg: atomic mass from the excess minus the electrons.
    pub fn mass_erg(self) -> f64 {
        let d = self.data();
        self.mass_number() as f64 * M_AMU * MEV + KEV * d.mass_excess_kev - d.protons as f64 * M_E * MEV
    }
}

/// Nuclear statistical equilibrium abundance of `nuclide` at temperature
/// `t_kelvin`, given the free nucleon abundances and the baryon-to-photon
/// ratio at that temperature. Evaluated in log space; the prefactors span
/// dozens of decades for the heavier nuclei.
pub fn nse_abundance(nuclide: Nuclide, yn: f64, yp: f64, t_kelvin: f64, eta: f64) -> f64 {
    let d = nuclide.data();
    let a = nuclide.mass_number() as f64;
    let z = d.protons as f64;
    let n = d.neutrons as f64;
    let kt = K_B * t_kelvin;
    let ln_norm = 1.5 * (nuclide.mass_erg().ln() - n * (M_N * MEV).ln() - z * (M_P * MEV).ln());
    let ln_y = (2.0 * d.spin + 1.0).ln()
        + (a - 1.0) * ZETA3.ln()
        + 0.5 * (1.0 - a) * PI.ln()
        + 0.5 * (3.0 * a - 5.0) * 2f64.ln()
        + ln_norm
        + 1.5 * (a - 1.0) * kt.ln()
        + (a - 1.0) * eta.ln()
        + z * yp.ln()
        + n * yn.ln()
        + nuclide.binding_energy_kev() * KEV / kt;
    ln_y.exp()
}

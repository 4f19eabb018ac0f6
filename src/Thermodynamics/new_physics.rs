//! Optional beyond-standard-model radiation sector.
//!
//! A sector is either decoupled, evolving with its own temperature T_NP and
//! exchanging energy with the plasma through `delta_rho`, or in thermal
//! equilibrium with the neutrinos (T_NP = Tν) or with the e±/γ plasma
//! (T_NP = Tγ). In every case it feeds the Friedmann equation and N_eff; the
//! coupled variants also enter the temperature equation of their bath, and
//! a plasma-coupled sector carries part of the plasma entropy.
use crate::settings::NewPhysicsConfig;
use enum_dispatch::enum_dispatch;
use std::f64::consts::PI;

/// Bath whose temperature the sector shares.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Coupling {
    /// no sector
    Absent,
    /// own temperature T_NP
    Decoupled,
    Neutrinos,
    Plasma,
}

#[enum_dispatch]
pub trait NewPhysicsSector {
    fn coupling(&self) -> Coupling;
    /// whether the sector adds its own temperature to the background ODE
    fn is_active(&self) -> bool {
        self.coupling() == Coupling::Decoupled
    }
    fn rho(&self, t_np: f64) -> f64;
    fn pressure(&self, t_np: f64) -> f64;
    fn drho_dt(&self, t_np: f64) -> f64;
    /// energy transfer rate from the plasma into the sector, MeV⁴/s
    fn delta_rho(&self, tg: f64, tnue: f64, tnumu: f64, t_np: f64) -> f64;
    /// T_NP at the photon temperature `t_start`
    fn initial_temperature(&self, t_start: f64) -> f64;
}

/// ρ = g π²/30 T⁴
fn radiation_rho(g_eff: f64, t: f64) -> f64 {
    g_eff * PI * PI / 30.0 * t.powi(4)
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct NoSector;

impl NewPhysicsSector for NoSector {
    fn coupling(&self) -> Coupling {
        Coupling::Absent
    }
    fn rho(&self, _t_np: f64) -> f64 {
        0.0
    }
    fn pressure(&self, _t_np: f64) -> f64 {
        0.0
    }
    fn drho_dt(&self, _t_np: f64) -> f64 {
        0.0
    }
    fn delta_rho(&self, _tg: f64, _tnue: f64, _tnumu: f64, _t_np: f64) -> f64 {
        0.0
    }
    fn initial_temperature(&self, _t_start: f64) -> f64 {
        0.0
    }
}

/// Relativistic bath decoupled from the plasma: ρ = g_eff π²/30 T⁴, p = ρ/3.
/// With `exchange_rate` Γ > 0 it relaxes toward the photon temperature,
/// `δρ = Γ·(ρ(Tγ) − ρ(T_NP))`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DecoupledRadiation {
    pub g_eff: f64,
    /// T_NP/Tγ at the start of the run
    pub xi: f64,
    /// s⁻¹
    pub exchange_rate: f64,
}

impl NewPhysicsSector for DecoupledRadiation {
    fn coupling(&self) -> Coupling {
        Coupling::Decoupled
    }
    fn rho(&self, t_np: f64) -> f64 {
        radiation_rho(self.g_eff, t_np)
    }
    fn pressure(&self, t_np: f64) -> f64 {
        self.rho(t_np) / 3.0
    }
    fn drho_dt(&self, t_np: f64) -> f64 {
        4.0 * self.rho(t_np) / t_np
    }
    fn delta_rho(&self, tg: f64, _tnue: f64, _tnumu: f64, t_np: f64) -> f64 {
        if self.exchange_rate == 0.0 {
            return 0.0;
        }
        self.exchange_rate * (self.rho(tg) - self.rho(t_np))
    }
    fn initial_temperature(&self, t_start: f64) -> f64 {
        self.xi * t_start
    }
}

/// Relativistic species in equilibrium with the neutrinos, T_NP = Tν.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NeutrinoCoupled {
    pub g_eff: f64,
}

impl NewPhysicsSector for NeutrinoCoupled {
    fn coupling(&self) -> Coupling {
        Coupling::Neutrinos
    }
    fn rho(&self, tnu: f64) -> f64 {
        radiation_rho(self.g_eff, tnu)
    }
    fn pressure(&self, tnu: f64) -> f64 {
        self.rho(tnu) / 3.0
    }
    fn drho_dt(&self, tnu: f64) -> f64 {
        4.0 * self.rho(tnu) / tnu
    }
    fn delta_rho(&self, _tg: f64, _tnue: f64, _tnumu: f64, _t_np: f64) -> f64 {
        0.0
    }
    fn initial_temperature(&self, t_start: f64) -> f64 {
        t_start
    }
}

/// Relativistic species in equilibrium with photons and e±, T_NP = Tγ.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlasmaCoupled {
    pub g_eff: f64,
}

impl NewPhysicsSector for PlasmaCoupled {
    fn coupling(&self) -> Coupling {
        Coupling::Plasma
    }
    fn rho(&self, tg: f64) -> f64 {
        radiation_rho(self.g_eff, tg)
    }
    fn pressure(&self, tg: f64) -> f64 {
        self.rho(tg) / 3.0
    }
    fn drho_dt(&self, tg: f64) -> f64 {
        4.0 * self.rho(tg) / tg
    }
    fn delta_rho(&self, _tg: f64, _tnue: f64, _tnumu: f64, _t_np: f64) -> f64 {
        0.0
    }
    fn initial_temperature(&self, t_start: f64) -> f64 {
        t_start
    }
}

#[derive(Debug, Clone, PartialEq)]
#[enum_dispatch(NewPhysicsSector)]
pub enum Sector {
    NoSector(NoSector),
    DecoupledRadiation(DecoupledRadiation),
    NeutrinoCoupled(NeutrinoCoupled),
    PlasmaCoupled(PlasmaCoupled),
}

impl Sector {
    /// Temperature the sector has given the bath temperatures.
    pub fn temperature(&self, tg: f64, tnu: f64, t_np: f64) -> f64 {
        match self.coupling() {
            Coupling::Absent => 0.0,
            Coupling::Decoupled => t_np,
            Coupling::Neutrinos => tnu,
            Coupling::Plasma => tg,
        }
    }
}

pub fn create_sector(config: &NewPhysicsConfig) -> Sector {
    match *config {
        NewPhysicsConfig::None => Sector::NoSector(NoSector),
        NewPhysicsConfig::DecoupledRadiation {
            g_eff,
            xi,
            exchange_rate,
        } => Sector::DecoupledRadiation(DecoupledRadiation {
            g_eff,
            xi,
            exchange_rate,
        }),
        NewPhysicsConfig::NeutrinoCoupled { g_eff } => Sector::NeutrinoCoupled(NeutrinoCoupled { g_eff }),
        NewPhysicsConfig::PlasmaCoupled { g_eff } => Sector::PlasmaCoupled(PlasmaCoupled { g_eff }),
    }
}

//! # Settings Module
//!
//! ## Purpose
//! One explicit, immutable configuration object for a BBN run. It is built once
//! (defaults, JSON file, or code) and passed by reference to every component
//! constructor; nothing reads ambient global state.
//!
//! ## Configuration Format
//! Every field has a default, so a JSON file only lists what differs:
//! ```json
//! {
//!   "data_dir": "PRyMrates",
//!   "network": "small",
//!   "weak_rates_born_only": true,
//!   "omega_b_h2": 0.0224,
//!   "nuisance": { "npdg": 1.0 }
//! }
//! ```
//!
//! ## Directory layout under `data_dir`
//! | path | content |
//! |------|---------|
//! | `thermo/*.txt` | neutrino collision and QED correction tables |
//! | `thermo/Tgamma_Tnu.txt` | persisted background trajectory |
//! | `nuclear/key_primat_rates/`, `nuclear/key_nacreii_rates/` | 12 key reactions |
//! | `nuclear/other_nucl_rates/` | remaining 51 reactions |
//! | `nTOp/*.txt` | persisted weak-rate and thermal-correction grids |
//!
//! ## Usage Pattern
//! ```rust, ignore
//! use NuCosmo::settings::{BbnConfig, NetworkSize};
//!
//! let mut config = BbnConfig::from_file("bbn_config.json")?;
//! config.network = NetworkSize::Small;
//! config.validate()?;
//! ```
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read or write config '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NetworkSize {
    /// 8 species, 12 key reactions
    Small,
    /// 12 species, 17 reactions in the mid era and 62 in the low era
    Large,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThermoTablesKind {
    /// matrix-element and QED corrections read from `data_dir/thermo`
    Tabulated,
    /// unit matrix-element factors, no QED correction; needs no files
    Ideal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThermalCorrections {
    /// evaluate with VEGAS over the thermal temperature grid
    Compute,
    /// read the persisted grids from `nTOp/`
    Load,
    /// leave the thermal piece out of the weak rates
    Skip,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SolverBackend {
    /// linearly implicit Rosenbrock method
    Default,
    /// singly diagonally implicit Runge-Kutta method
    Alternate,
}

/// Optional beyond-Standard-Model sector with its own temperature.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum NewPhysicsConfig {
    None,
    /// decoupled relativistic bath, ρ = g_eff π²/30 T⁴, starting at T_NP = xi·T_start;
    /// `exchange_rate` [s⁻¹] relaxes it toward the photon temperature
    DecoupledRadiation {
        g_eff: f64,
        xi: f64,
        #[serde(default)]
        exchange_rate: f64,
    },
    /// relativistic species in equilibrium with the neutrinos
    NeutrinoCoupled { g_eff: f64 },
    /// relativistic species in equilibrium with photons and e±
    PlasmaCoupled { g_eff: f64 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BbnConfig {
    pub data_dir: PathBuf,
    /// where recomputed grids are written; `data_dir` when absent
    pub output_dir: Option<PathBuf>,
    pub log_file: Option<PathBuf>,

    pub thermo_tables: ThermoTablesKind,
    pub network: NetworkSize,
    /// NACRE II instead of PRIMAT key rates
    pub nacre_ii: bool,

    pub compute_background: bool,
    pub save_background: bool,
    pub non_instantaneous_decoupling: bool,

    pub compute_weak_rates: bool,
    pub save_weak_rates: bool,
    pub weak_rates_born_only: bool,
    pub thermal_corrections: ThermalCorrections,
    pub save_thermal_corrections: bool,
    /// normalize weak rates by the measured neutron lifetime instead of G_F
    pub tau_n_normalization: bool,

    pub solver_backend: SolverBackend,
    /// explicit Dormand–Prince for the n↔p era; `false` uses `solver_backend` there too
    pub ht_explicit: bool,
    pub n_sampling: usize,
    pub weak_rate_samples: usize,
    pub thermal_samples: usize,
    pub vegas_evals: usize,
    pub vegas_iterations: usize,
    pub vegas_chi2_warn: f64,
    pub vegas_seed: u64,

    /// era boundaries, MeV
    pub t_start_mev: f64,
    pub t_weak_mev: f64,
    pub t_nucl_mev: f64,
    pub t_end_mev: f64,
    /// final time of the background integration, s
    pub t_final: f64,

    pub omega_b_h2: f64,
    /// neutron lifetime, s
    pub tau_n: f64,
    pub delta_n_eff: f64,
    /// neutrino chemical potential over temperature
    pub xi_nu: f64,

    /// log-normal nuisance parameter per reaction name
    pub nuisance: HashMap<String, f64>,
    /// fractional new-physics shift per reaction name
    pub np_nuclear_delta: HashMap<String, f64>,
    /// fractional shift of both weak rates, in units of the Born rate
    pub np_weak_rate_delta: f64,
    pub new_physics: NewPhysicsConfig,
}

impl Default for BbnConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("PRyMrates"),
            output_dir: None,
            log_file: None,
            thermo_tables: ThermoTablesKind::Tabulated,
            network: NetworkSize::Large,
            nacre_ii: false,
            compute_background: true,
            save_background: false,
            non_instantaneous_decoupling: true,
            compute_weak_rates: true,
            save_weak_rates: false,
            weak_rates_born_only: false,
            thermal_corrections: ThermalCorrections::Load,
            save_thermal_corrections: false,
            tau_n_normalization: true,
            solver_backend: SolverBackend::Default,
            ht_explicit: true,
            n_sampling: 1200,
            weak_rate_samples: 50,
            thermal_samples: 50,
            vegas_evals: 20_000,
            vegas_iterations: 20,
            vegas_chi2_warn: 5.0,
            vegas_seed: 12345,
            t_start_mev: 10.0,
            t_weak_mev: 1.0,
            t_nucl_mev: 0.1,
            t_end_mev: 1e-3,
            t_final: 1e7,
            omega_b_h2: 0.02230,
            tau_n: 879.6,
            delta_n_eff: 0.0,
            xi_nu: 0.0,
            nuisance: HashMap::new(),
            np_nuclear_delta: HashMap::new(),
            np_weak_rate_delta: 0.0,
            new_physics: NewPhysicsConfig::None,
        }
    }
}

impl BbnConfig {
    /// Loads a JSON config; missing fields take their defaults.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let config: BbnConfig = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let temps = [
            self.t_start_mev,
            self.t_weak_mev,
            self.t_nucl_mev,
            self.t_end_mev,
        ];
        if temps.iter().any(|t| !t.is_finite() || *t <= 0.0) {
            return Err(ConfigError::Invalid(
                "era temperatures must be finite and positive".to_string(),
            ));
        }
        if !temps.windows(2).all(|w| w[0] > w[1]) {
            return Err(ConfigError::Invalid(format!(
                "era temperatures must decrease: start {} > weak {} > nucl {} > end {} MeV",
                temps[0], temps[1], temps[2], temps[3]
            )));
        }
        if self.n_sampling < 2 {
            return Err(ConfigError::Invalid("n_sampling must be >= 2".to_string()));
        }
        if self.weak_rate_samples < 3 || self.thermal_samples < 3 {
            return Err(ConfigError::Invalid(
                "weak_rate_samples and thermal_samples must be >= 3".to_string(),
            ));
        }
        if self.vegas_evals < 2 || self.vegas_iterations == 0 {
            return Err(ConfigError::Invalid(
                "vegas_evals must be >= 2 and vegas_iterations >= 1".to_string(),
            ));
        }
        if !(self.omega_b_h2 > 0.0) || !(self.tau_n > 0.0) || !(self.t_final > 0.0) {
            return Err(ConfigError::Invalid(
                "omega_b_h2, tau_n and t_final must be positive".to_string(),
            ));
        }
        match self.new_physics {
            NewPhysicsConfig::None => {}
            NewPhysicsConfig::DecoupledRadiation {
                g_eff,
                xi,
                exchange_rate,
            } => {
                if !(g_eff > 0.0) || !(xi > 0.0) || !(exchange_rate >= 0.0) {
                    return Err(ConfigError::Invalid(
                        "decoupled sector needs g_eff > 0, xi > 0 and exchange_rate >= 0".to_string(),
                    ));
                }
            }
            NewPhysicsConfig::NeutrinoCoupled { g_eff } | NewPhysicsConfig::PlasmaCoupled { g_eff } => {
                if !(g_eff > 0.0) {
                    return Err(ConfigError::Invalid("new-physics sector needs g_eff > 0".to_string()));
                }
            }
        }
        Ok(())
    }

    pub fn output_dir(&self) -> &Path {
        self.output_dir.as_deref().unwrap_or(&self.data_dir)
    }

    pub fn thermo_dir(&self) -> PathBuf {
        self.data_dir.join("thermo")
    }

    pub fn key_rates_dir(&self) -> PathBuf {
        let sub = if self.nacre_ii {
            "key_nacreii_rates"
        } else {
            "key_primat_rates"
        };
        self.data_dir.join("nuclear").join(sub)
    }

    pub fn other_rates_dir(&self) -> PathBuf {
        self.data_dir.join("nuclear").join("other_nucl_rates")
    }

    /// persisted background trajectory, read from `data_dir` and written to `output_dir`
    pub fn background_file(&self, for_writing: bool) -> PathBuf {
        let root = if for_writing {
            self.output_dir()
        } else {
            &self.data_dir
        };
        let name = match self.new_physics {
            NewPhysicsConfig::DecoupledRadiation { .. } => "Tgamma_Tnu_TNP.txt",
            _ => "Tgamma_Tnu.txt",
        };
        root.join("thermo").join(name)
    }

    /// directory of persisted weak-rate grids
    pub fn weak_rates_dir(&self, for_writing: bool) -> PathBuf {
        let root = if for_writing {
            self.output_dir()
        } else {
            &self.data_dir
        };
        root.join("nTOp")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_partial_json_takes_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"network": "small", "omega_b_h2": 0.0224, "nuisance": {{"npdg": 1.5}},
                "new_physics": {{"kind": "DecoupledRadiation", "g_eff": 2.0, "xi": 0.8}}}}"#
        )
        .unwrap();
        let config = BbnConfig::from_file(file.path()).unwrap();
        assert_eq!(config.network, NetworkSize::Small);
        assert_eq!(config.omega_b_h2, 0.0224);
        assert_eq!(config.nuisance.get("npdg"), Some(&1.5));
        assert_eq!(config.n_sampling, 1200);
        assert!(config.ht_explicit);
        assert_eq!(config.thermal_corrections, ThermalCorrections::Load);
        assert!(config.background_file(false).ends_with("thermo/Tgamma_Tnu_TNP.txt"));
        assert_eq!(
            config.new_physics,
            NewPhysicsConfig::DecoupledRadiation {
                g_eff: 2.0,
                xi: 0.8,
                exchange_rate: 0.0
            }
        );
    }

    #[test]
    fn test_coupled_sectors_from_json() {
        let config: BbnConfig =
            serde_json::from_str(r#"{"new_physics": {"kind": "NeutrinoCoupled", "g_eff": 1.75}}"#).unwrap();
        assert_eq!(config.new_physics, NewPhysicsConfig::NeutrinoCoupled { g_eff: 1.75 });
        assert!(config.background_file(false).ends_with("thermo/Tgamma_Tnu.txt"));
        let mut config: BbnConfig =
            serde_json::from_str(r#"{"new_physics": {"kind": "PlasmaCoupled", "g_eff": -1.0}}"#).unwrap();
        assert!(config.validate().is_err());
        config.new_physics = NewPhysicsConfig::DecoupledRadiation {
            g_eff: 1.0,
            xi: 1.0,
            exchange_rate: -2.0,
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_save_and_reload() {
        let file = NamedTempFile::new().unwrap();
        let mut config = BbnConfig::default();
        config.output_dir = Some(PathBuf::from("out"));
        config.nacre_ii = true;
        config.save_to_file(file.path()).unwrap();
        let back = BbnConfig::from_file(file.path()).unwrap();
        assert_eq!(back, config);
        assert!(back.key_rates_dir().ends_with("nuclear/key_nacreii_rates"));
        assert!(back.weak_rates_dir(true).starts_with("out"));
        assert!(back.weak_rates_dir(false).starts_with("PRyMrates"));
    }

    #[test]
    fn test_validation() {
        let mut config = BbnConfig::default();
        assert!(config.validate().is_ok());
        config.t_weak_mev = 20.0;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
        let mut config = BbnConfig::default();
        config.weak_rate_samples = 2;
        assert!(config.validate().is_err());
        let mut bad = NamedTempFile::new().unwrap();
        write!(bad, "{{ not json").unwrap();
        assert!(matches!(
            BbnConfig::from_file(bad.path()),
            Err(ConfigError::Json(_))
        ));
    }
}

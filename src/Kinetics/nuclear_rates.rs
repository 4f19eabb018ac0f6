//! Tabulated thermonuclear rates: loading, nuisance and new-physics
//! modifiers, interpolation in T9 and backward rates by detailed balance.
use crate::Kinetics::NetworkError;
use crate::Kinetics::reaction_table::{ReactionSpec, find_reaction, reactions_needed};
use crate::Utils::interpolation::LinearInterpolator;
use crate::Utils::load_from_file::load_columns;
use crate::settings::{BbnConfig, NetworkSize};
use log::{info, warn};
use std::collections::HashMap;
use std::path::Path;

/// One rate file: T9 grid, median rate and its log-normal width factor.
#[derive(Debug, Clone, PartialEq)]
pub struct RateTable {
    pub name: String,
    pub t9: Vec<f64>,
    pub median: Vec<f64>,
    pub expsigma: Vec<f64>,
}

impl RateTable {
    pub fn new(name: &str, t9: Vec<f64>, median: Vec<f64>, expsigma: Vec<f64>) -> Result<Self, NetworkError> {
        if t9.len() != median.len() || t9.len() != expsigma.len() {
            return Err(NetworkError::MalformedTable {
                reaction: name.to_string(),
                reason: "columns of different lengths".to_string(),
            });
        }
        if expsigma.iter().any(|s| !(*s > 0.0)) {
            return Err(NetworkError::MalformedTable {
                reaction: name.to_string(),
                reason: "non-positive uncertainty factor".to_string(),
            });
        }
        Ok(Self {
            name: name.to_string(),
            t9,
            median,
            expsigma,
        })
    }

    /// Reads `<dir>/<name>.txt` with columns T9, median, expsigma.
    pub fn load(dir: &Path, name: &str) -> Result<Self, NetworkError> {
        let path = dir.join(format!("{}.txt", name));
        let mut columns = load_columns(&path, 3)?;
        let expsigma = columns.pop().unwrap_or_default();
        let median = columns.pop().unwrap_or_default();
        let t9 = columns.pop().unwrap_or_default();
        Self::new(name, t9, median, expsigma)
    }

    /// `median·exp(p·ln expsigma) + δ·median` on the table grid
    pub fn modified_rate(&self, nuisance: f64, np_delta: f64) -> Vec<f64> {
        self.median
            .iter()
            .zip(&self.expsigma)
            .map(|(m, s)| m * (nuisance * s.ln()).exp() + np_delta * m)
            .collect()
    }
}

/// Forward rate of one reaction, fixed for the whole run.
#[derive(Debug, Clone)]
pub struct NuclearRate {
    pub spec: &'static ReactionSpec,
    forward: LinearInterpolator,
}

impl NuclearRate {
    pub fn new(spec: &'static ReactionSpec, table: &RateTable, nuisance: f64, np_delta: f64) -> Result<Self, NetworkError> {
        let forward = LinearInterpolator::new(&table.t9, &table.modified_rate(nuisance, np_delta))?;
        Ok(Self { spec, forward })
    }

    pub fn name(&self) -> &'static str {
        self.spec.name
    }

    /// forward rate at `t_kelvin`, linear in T9 and extrapolated off the grid
    pub fn forward(&self, t_kelvin: f64) -> f64 {
        self.forward.eval(t_kelvin * 1e-9)
    }

    pub fn backward(&self, t_kelvin: f64) -> f64 {
        let f = self.forward(t_kelvin);
        if f == 0.0 {
            return 0.0;
        }
        self.spec.detailed_balance(t_kelvin * 1e-9) * f
    }
}

/// All rates a network needs, keyed by reaction name.
#[derive(Debug, Clone)]
pub struct NuclearRates {
    rates: HashMap<&'static str, NuclearRate>,
}

impl NuclearRates {
    /// Builds the rates from tables; `nuisance` and `np_delta` map reaction
    /// names to their modifiers, absent names meaning zero.
    pub fn from_tables(
        tables: &[RateTable],
        nuisance: &HashMap<String, f64>,
        np_delta: &HashMap<String, f64>,
    ) -> Result<Self, NetworkError> {
        for name in nuisance.keys().chain(np_delta.keys()) {
            if find_reaction(name).is_none() {
                return Err(NetworkError::UnknownReaction(name.clone()));
            }
        }
        let mut rates = HashMap::with_capacity(tables.len());
        for table in tables {
            let spec = find_reaction(&table.name).ok_or_else(|| NetworkError::UnknownReaction(table.name.clone()))?;
            let p = nuisance.get(spec.name).copied().unwrap_or(0.0);
            let delta = np_delta.get(spec.name).copied().unwrap_or(0.0);
            if p != 0.0 || delta != 0.0 {
                info!("{}: nuisance {} new-physics shift {}", spec.name, p, delta);
            }
            rates.insert(spec.name, NuclearRate::new(spec, table, p, delta)?);
        }
        Ok(Self { rates })
    }

    /// Loads the rate files the configured network needs: key reactions from
    /// the selected compilation, the rest from `other_nucl_rates`.
    pub fn load(config: &BbnConfig) -> Result<Self, NetworkError> {
        let key_dir = config.key_rates_dir();
        let other_dir = config.other_rates_dir();
        let needed = reactions_needed(config.network);
        info!(
            "loading {} nuclear rates from {} and {}",
            needed.len(),
            key_dir.display(),
            other_dir.display()
        );
        let mut tables = Vec::with_capacity(needed.len());
        for spec in needed {
            let dir = if spec.is_key() { &key_dir } else { &other_dir };
            tables.push(RateTable::load(dir, spec.name)?);
        }
        for name in config.nuisance.keys().chain(config.np_nuclear_delta.keys()) {
            if tables.iter().all(|t| t.name != *name) && find_reaction(name).is_some() {
                warn!("modifier for {} ignored, the reaction is not in this network", name);
            }
        }
        Self::from_tables(&tables, &config.nuisance, &config.np_nuclear_delta)
    }

    pub fn get(&self, name: &str) -> Option<&NuclearRate> {
        self.rates.get(name)
    }

    pub fn len(&self) -> usize {
        self.rates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }

    /// true when every reaction of the `size` network is present
    pub fn covers(&self, size: NetworkSize) -> bool {
        reactions_needed(size).iter().all(|r| self.rates.contains_key(r.name))
    }
}

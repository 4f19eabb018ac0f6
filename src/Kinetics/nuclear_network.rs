//! # Nuclear reaction network
//!
//! Maps (Y, T, ρ_B, weak rates) to dY/dt and its analytic Jacobian. Every
//! reaction contributes through the same bookkeeping:
//!
//! - forward flux  `F = f(T)·ρ_B^(n_R−1)·Π Y_r / Π k_r!`
//! - backward flux `B = b(T)·ρ_B^(n_P−1)·Π Y_p / Π k_p!`
//! - `dY_i/dt += (ν_i^prod − ν_i^react)·(F − B)`
//!
//! where `k` are the multiplicities of identical nuclei among reactants or
//! products. The n↔p weak rates enter on top of the nuclear reactions. The
//! high-temperature era is the same network with only n and p and no
//! nuclear reactions.
use crate::Kinetics::NetworkError;
use crate::Kinetics::nuclear_rates::{NuclearRate, NuclearRates};
use crate::Kinetics::nuclides::Nuclide;
use crate::Kinetics::reaction_table::{n_species, reactions_for};
use crate::ReactorsIVP::ivp_solvers::OdeSystem;
use crate::WeakRates::rate_tables::Era;
use crate::settings::NetworkSize;
use log::debug;
use nalgebra::{DMatrix, DVector};

/// Time-dependent environment of the network: temperature, baryon density
/// and weak rates along the background.
pub trait NetworkConditions {
    fn temperature_kelvin(&self, t: f64) -> f64;
    /// baryon mass density, g/cm³
    fn baryon_density(&self, t: f64) -> f64;
    /// (n→p, p→n) rates in s⁻¹
    fn weak_rates(&self, t_kelvin: f64) -> (f64, f64);
}

/// species index with its multiplicity in one side of a reaction
type Term = (usize, i32);

#[derive(Debug, Clone)]
struct CompiledReaction {
    rate: NuclearRate,
    reactants: Vec<Term>,
    products: Vec<Term>,
    /// nonzero net stoichiometric coefficients
    net: Vec<(usize, f64)>,
    /// density powers n_R − 1 and n_P − 1
    rho_power_r: i32,
    rho_power_p: i32,
    /// 1/Π k!
    symmetry_r: f64,
    symmetry_p: f64,
}

fn group(side: &[Nuclide]) -> Vec<Term> {
    let mut terms: Vec<Term> = Vec::new();
    for s in side {
        match terms.iter_mut().find(|(i, _)| *i == s.index()) {
            Some((_, k)) => *k += 1,
            None => terms.push((s.index(), 1)),
        }
    }
    terms
}

fn symmetry_factor(terms: &[Term]) -> f64 {
    terms
        .iter()
        .map(|&(_, k)| 1.0 / (1..=k).product::<i32>() as f64)
        .product()
}

/// Π Y^k over the terms
fn monomial(terms: &[Term], y: &DVector<f64>) -> f64 {
    terms.iter().map(|&(i, k)| y[i].powi(k)).product()
}

/// ∂(Π Y^k)/∂Y_j for every j among the terms
fn monomial_gradient(terms: &[Term], y: &DVector<f64>) -> Vec<(usize, f64)> {
    terms
        .iter()
        .enumerate()
        .map(|(m, &(j, kj))| {
            let others: f64 = terms
                .iter()
                .enumerate()
                .filter(|(l, _)| *l != m)
                .map(|(_, &(i, k))| y[i].powi(k))
                .product();
            (j, kj as f64 * y[j].powi(kj - 1) * others)
        })
        .collect()
}

impl CompiledReaction {
    fn new(rate: NuclearRate, n_species: usize) -> Self {
        let spec = rate.spec;
        let reactants = group(spec.reactants);
        let products = group(spec.products);
        let net = Nuclide::ALL
            .iter()
            .take(n_species)
            .filter_map(|s| {
                let nu = spec.net_change(*s);
                (nu != 0).then_some((s.index(), nu as f64))
            })
            .collect();
        Self {
            rho_power_r: spec.reactants.len() as i32 - 1,
            rho_power_p: spec.products.len() as i32 - 1,
            symmetry_r: symmetry_factor(&reactants),
            symmetry_p: symmetry_factor(&products),
            reactants,
            products,
            net,
            rate,
        }
    }

    /// rate coefficients multiplying the forward and backward monomials
    fn coefficients(&self, t_kelvin: f64, rho: f64) -> (f64, f64) {
        (
            self.rate.forward(t_kelvin) * rho.powi(self.rho_power_r) * self.symmetry_r,
            self.rate.backward(t_kelvin) * rho.powi(self.rho_power_p) * self.symmetry_p,
        )
    }
}

#[derive(Debug, Clone)]
pub struct ReactionNetwork {
    reactions: Vec<CompiledReaction>,
    n_species: usize,
    pub size: NetworkSize,
    pub era: Era,
}

impl ReactionNetwork {
    /// Network of `size` for `era`. The high-temperature era tracks n and p
    /// only, with the weak rates as the sole processes.
    pub fn new(rates: &NuclearRates, size: NetworkSize, era: Era) -> Result<Self, NetworkError> {
        let n_species = match era {
            Era::High => 2,
            _ => n_species(size),
        };
        let mut reactions = Vec::new();
        for spec in reactions_for(size, era) {
            let rate = rates
                .get(spec.name)
                .ok_or_else(|| NetworkError::MissingRate(spec.name.to_string()))?;
            reactions.push(CompiledReaction::new(rate.clone(), n_species));
        }
        debug!(
            "{:?} network for the {} era: {} species, {} reactions",
            size,
            era.tag(),
            n_species,
            reactions.len()
        );
        Ok(Self {
            reactions,
            n_species,
            size,
            era,
        })
    }

    pub fn n_species(&self) -> usize {
        self.n_species
    }

    pub fn n_reactions(&self) -> usize {
        self.reactions.len()
    }

    pub fn reaction_names(&self) -> Vec<&'static str> {
        self.reactions.iter().map(|r| r.rate.name()).collect()
    }

    /// Net flux F − B of every reaction.
    pub fn net_fluxes(&self, y: &DVector<f64>, t_kelvin: f64, rho: f64) -> Vec<f64> {
        self.reactions
            .iter()
            .map(|r| {
                let (cf, cb) = r.coefficients(t_kelvin, rho);
                cf * monomial(&r.reactants, y) - cb * monomial(&r.products, y)
            })
            .collect()
    }

    pub fn derivative(&self, y: &DVector<f64>, t_kelvin: f64, rho: f64, weak: (f64, f64), dydt: &mut DVector<f64>) {
        dydt.fill(0.0);
        let (frwrd, bkwrd) = weak;
        let n = Nuclide::N.index();
        let p = Nuclide::P.index();
        let weak_flux = frwrd * y[n] - bkwrd * y[p];
        dydt[n] -= weak_flux;
        dydt[p] += weak_flux;
        for (r, flux) in self.reactions.iter().zip(self.net_fluxes(y, t_kelvin, rho)) {
            for &(i, nu) in &r.net {
                dydt[i] += nu * flux;
            }
        }
    }

    pub fn jacobian(&self, y: &DVector<f64>, t_kelvin: f64, rho: f64, weak: (f64, f64), jac: &mut DMatrix<f64>) {
        jac.fill(0.0);
        let (frwrd, bkwrd) = weak;
        let n = Nuclide::N.index();
        let p = Nuclide::P.index();
        jac[(n, n)] -= frwrd;
        jac[(n, p)] += bkwrd;
        jac[(p, n)] += frwrd;
        jac[(p, p)] -= bkwrd;
        for r in &self.reactions {
            let (cf, cb) = r.coefficients(t_kelvin, rho);
            for (j, dm) in monomial_gradient(&r.reactants, y) {
                for &(i, nu) in &r.net {
                    jac[(i, j)] += nu * cf * dm;
                }
            }
            for (j, dm) in monomial_gradient(&r.products, y) {
                for &(i, nu) in &r.net {
                    jac[(i, j)] -= nu * cb * dm;
                }
            }
        }
    }
}

/// Σ A_i·Y_i over the abundance vector
pub fn baryon_number(y: &DVector<f64>) -> f64 {
    y.iter()
        .zip(Nuclide::ALL.iter())
        .map(|(yi, s)| s.mass_number() as f64 * yi)
        .sum()
}

/// A network driven along the background by its conditions.
pub struct NetworkOde<'a, C: NetworkConditions> {
    pub network: &'a ReactionNetwork,
    pub conditions: &'a C,
}

impl<'a, C: NetworkConditions> OdeSystem for NetworkOde<'a, C> {
    fn ndim(&self) -> usize {
        self.network.n_species()
    }

    fn rhs(&self, t: f64, y: &DVector<f64>, dydt: &mut DVector<f64>) {
        let t_k = self.conditions.temperature_kelvin(t);
        let rho = self.conditions.baryon_density(t);
        let weak = self.conditions.weak_rates(t_k);
        self.network.derivative(y, t_k, rho, weak, dydt);
    }

    fn jacobian(&self, t: f64, y: &DVector<f64>, jac: &mut DMatrix<f64>) {
        let t_k = self.conditions.temperature_kelvin(t);
        let rho = self.conditions.baryon_density(t);
        let weak = self.conditions.weak_rates(t_k);
        self.network.jacobian(y, t_k, rho, weak, jac);
    }
}

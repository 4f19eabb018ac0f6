//! Static table of the 63 tabulated reactions: stoichiometry, detailed
//! balance coefficients and the networks each reaction belongs to.
//!
//! Reactions are written as they are named in the rate files, e.g. `npdg`
//! for `n + p -> d + γ`. Photons are not tracked.
use crate::Kinetics::nuclides::Nuclide;
use crate::Kinetics::nuclides::Nuclide::*;
use crate::WeakRates::rate_tables::Era;
use crate::settings::NetworkSize;
use nalgebra::DMatrix;

/// Which networks use a reaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tier {
    /// the 12 key reactions, in every network
    Key,
    /// large network, mid and low eras
    MidEra,
    /// large network, low era only
    LowEra,
    /// tabulated twice under two names; only `Li7taann` enters the network
    Duplicate,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReactionSpec {
    pub name: &'static str,
    pub reactants: &'static [Nuclide],
    pub products: &'static [Nuclide],
    /// backward/forward = alpha·T9^beta·exp(gamma/T9)
    pub alpha: f64,
    pub beta: f64,
    pub gamma: f64,
    pub tier: Tier,
}

const fn reaction(
    name: &'static str,
    reactants: &'static [Nuclide],
    products: &'static [Nuclide],
    alpha: f64,
    beta: f64,
    gamma: f64,
    tier: Tier,
) -> ReactionSpec {
    ReactionSpec {
        name,
        reactants,
        products,
        alpha,
        beta,
        gamma,
        tier,
    }
}

use Tier::{Duplicate, Key, LowEra, MidEra};

pub const REACTIONS: [ReactionSpec; 63] = [
    reaction("npdg", &[N, P], &[D], 4.71614e9, 1.5, -25.815, Key),
    reaction("dpHe3g", &[D, P], &[He3], 1.6335e10, 1.5, -63.7491, Key),
    reaction("ddHe3n", &[D, D], &[He3, N], 1.73183, 0.0, -37.9341, Key),
    reaction("ddtp", &[D, D], &[T, P], 1.73492, 0.0, -46.7971, Key),
    reaction("tpag", &[T, P], &[He4], 2.61058e10, 1.5, -229.93, Key),
    reaction("tdan", &[T, D], &[He4, N], 5.5369, 0.0, -204.1236, Key),
    reaction("taLi7g", &[T, He4], &[Li7], 1.1133e10, 1.5, -28.6355, Key),
    reaction("He3ntp", &[He3, N], &[T, P], 1.00178, 0.0, -8.8630, Key),
    reaction("He3dap", &[He3, D], &[He4, P], 5.5438, 0.0, -212.987, Key),
    reaction("He3aBe7g", &[He3, He4], &[Be7], 1.11289e10, 1.5, -18.4179, Key),
    reaction("Be7nLi7p", &[Be7, N], &[Li7, P], 1.00215, 0.0, -19.0806, Key),
    reaction("Li7paa", &[Li7, P], &[He4, He4], 4.6898, 0.0, -201.295, Key),
    reaction("Li7paag", &[Li7, P], &[He4, He4], 4.6898, 0.0, -201.295, MidEra),
    reaction("Be7naa", &[Be7, N], &[He4, He4], 4.6982, 0.0, -220.3871, MidEra),
    reaction("Be7daap", &[Be7, D], &[He4, He4, P], 9.9579e-10, -1.5, -194.5722, MidEra),
    reaction("daLi6g", &[D, He4], &[Li6], 1.53053e10, 1.5, -17.1023, MidEra),
    reaction("Li6pBe7g", &[Li6, P], &[Be7], 1.18778e10, 1.5, -65.0648, MidEra),
    reaction("Li6pHe3a", &[Li6, P], &[He3, He4], 1.06729, 0.0, -46.6469, LowEra),
    reaction("B8naap", &[B8, N], &[He4, He4, P], 3.6007e-10, -1.5, -218.7915, LowEra),
    reaction("Li6He3aap", &[Li6, He3], &[He4, He4, P], 7.2413e-10, -1.5, -195.8748, LowEra),
    reaction("Li6taan", &[Li6, T], &[He4, He4, N], 7.2333e-10, -1.5, -187.0131, LowEra),
    reaction("Li6tLi8p", &[Li6, T], &[Li8, P], 2.0167, 0.0, -9.306, LowEra),
    reaction("Li7He3Li6a", &[Li7, He3], &[Li6, He4], 2.1972, 0.0, -154.6607, LowEra),
    reaction("Li8He3Li7a", &[Li8, He3], &[Li7, He4], 1.9994, 0.0, -215.2055, LowEra),
    reaction("Be7tLi6a", &[Be7, T], &[Li6, He4], 2.1977, 0.0, -164.8783, LowEra),
    reaction("B8tBe7a", &[B8, T], &[Be7, He4], 1.9999, 0.0, -228.3344, LowEra),
    reaction("B8nLi6He3", &[B8, N], &[Li6, He3], 0.49669, 0.0, -22.9167, LowEra),
    reaction("B8nBe7d", &[B8, N], &[Be7, D], 0.36119, 0.0, -24.2194, LowEra),
    reaction("Li6tLi7d", &[Li6, T], &[Li7, D], 0.72734, 0.0, -11.5332, LowEra),
    reaction("Li6He3Be7d", &[Li6, He3], &[Be7, D], 0.72719, 0.0, -1.3157, LowEra),
    reaction("Li7He3aad", &[Li7, He3], &[He4, He4, D], 2.8700e-10, -1.5, -137.5575, LowEra),
    reaction("Li8He3aat", &[Li8, He3], &[He4, He4, T], 3.5907e-10, -1.5, -186.5821, LowEra),
    reaction("Be7taad", &[Be7, T], &[He4, He4, D], 2.8706e-10, -1.5, -147.7751, LowEra),
    reaction("Be7tLi7He3", &[Be7, T], &[Li7, He3], 1.0002, 0.0, -10.2176, LowEra),
    reaction("B8dBe7He3", &[B8, D], &[Be7, He3], 1.2514, 0.0, -62.1535, LowEra),
    reaction("B8taaHe3", &[B8, T], &[He4, He4, He3], 3.5922e-10, -1.5, -209.9285, LowEra),
    reaction("Be7He3ppaa", &[Be7, He3], &[P, P, He4, He4], 1.2201e-19, -3.0, -130.8113, LowEra),
    reaction("ddag", &[D, D], &[He4], 4.5310e10, 1.5, -276.7271, LowEra),
    reaction("He3He3app", &[He3, He3], &[He4, P, P], 3.3915e-10, -1.5, -149.2290, LowEra),
    reaction("Be7pB8g", &[Be7, P], &[B8], 1.3063e10, 1.5, -1.5825, LowEra),
    reaction("Li7daan", &[Li7, D], &[He4, He4, N], 9.9435e-10, -1.5, -175.4916, LowEra),
    reaction("dntg", &[D, N], &[T], 1.6364262e10, 1.5, -72.612132, LowEra),
    reaction("ttann", &[T, T], &[He4, N, N], 3.3826187e-10, -1.5, -131.50322, LowEra),
    reaction("He3nag", &[He3, N], &[He4], 2.6152351e10, 1.5, -238.79338, LowEra),
    reaction("He3tad", &[He3, T], &[He4, D], 1.5981381, 0.0, -166.18124, LowEra),
    reaction("He3tanp", &[He3, T], &[He4, N, P], 3.3886566e-10, -1.5, -140.36623, LowEra),
    reaction("Li7taan", &[Li7, T], &[He4, He4, N, N], 1.2153497e-19, -3.0, -102.86767, Duplicate),
    reaction("Li7He3aanp", &[Li7, He3], &[He4, He4, N, P], 6.0875952e-20, -3.0, -111.73068, LowEra),
    reaction("Li8dLi7t", &[Li8, D], &[Li7, T], 1.2509926, 0.0, -49.02453, LowEra),
    reaction("Be7taanp", &[Be7, T], &[He4, He4, N, P], 6.0898077e-20, -3.0, -121.9483, LowEra),
    reaction("Be7He3aapp", &[Be7, He3], &[He4, He4, P, P], 1.2201356e-19, -3.0, -130.81131, LowEra),
    reaction("Li6nta", &[Li6, N], &[T, He4], 1.0691921, 0.0, -55.509875, LowEra),
    reaction("He3tLi6g", &[He3, T], &[Li6], 2.4459918e10, 1.5, -183.2835, LowEra),
    reaction("anpLi6g", &[He4, N, P], &[Li6], 7.2181753e19, 3.0, -42.917276, LowEra),
    reaction("Li6nLi7g", &[Li6, N], &[Li7], 1.1903305e10, 1.5, -84.145424, LowEra),
    reaction("Li6dLi7p", &[Li6, D], &[Li7, P], 2.5239503, 0.0, -58.330405, LowEra),
    reaction("Li6dBe7n", &[Li6, D], &[Be7, N], 2.5185377, 0.0, -39.249773, LowEra),
    reaction("Li7nLi8g", &[Li7, N], &[Li8], 1.3081022e10, 1.5, -23.587602, LowEra),
    reaction("Li7dLi8p", &[Li7, D], &[Li8, P], 2.7736709, 0.0, 2.2274166, LowEra),
    reaction("Li8paan", &[Li8, P], &[He4, He4, N], 3.5851946e-10, -1.5, -177.70722, LowEra),
    reaction("annHe6g", &[He4, N, N], &[He6], 1.0837999e20, 3.0, -11.319626, LowEra),
    reaction("ppndp", &[P, P, N], &[D, P], 2.3580703e9, 1.5, -25.815019, LowEra),
    reaction("Li7taann", &[Li7, T], &[He4, He4, N, N], 1.2153497e-19, -3.0, -102.86767, LowEra),
];

impl ReactionSpec {
    /// backward/forward rate ratio at `t9` (temperature in 10⁹ K)
    pub fn detailed_balance(&self, t9: f64) -> f64 {
        self.alpha * t9.powf(self.beta) * (self.gamma / t9).exp()
    }

    pub fn is_key(&self) -> bool {
        self.tier == Tier::Key
    }

    /// Whether the reaction enters the network of `size` during `era`.
    pub fn in_network(&self, size: NetworkSize, era: Era) -> bool {
        match (era, size, self.tier) {
            (Era::High, _, _) => false,
            (_, _, Tier::Duplicate) => false,
            (_, NetworkSize::Small, tier) => tier == Tier::Key,
            (Era::Mid, NetworkSize::Large, tier) => tier != Tier::LowEra,
            (Era::Low, NetworkSize::Large, _) => true,
        }
    }

    /// products minus reactants for `species`
    pub fn net_change(&self, species: Nuclide) -> i32 {
        let count = |list: &[Nuclide]| list.iter().filter(|&&s| s == species).count() as i32;
        count(self.products) - count(self.reactants)
    }

    /// Σ A over products minus Σ A over reactants; zero for every physical reaction
    pub fn baryon_imbalance(&self) -> i64 {
        let total = |list: &[Nuclide]| list.iter().map(|s| s.mass_number() as i64).sum::<i64>();
        total(self.products) - total(self.reactants)
    }

    pub fn charge_imbalance(&self) -> i64 {
        let total = |list: &[Nuclide]| list.iter().map(|s| s.charge() as i64).sum::<i64>();
        total(self.products) - total(self.reactants)
    }

    /// Largest species index the reaction touches.
    pub fn max_species_index(&self) -> usize {
        self.reactants
            .iter()
            .chain(self.products)
            .map(|s| s.index())
            .max()
            .unwrap_or(0)
    }
}

pub fn find_reaction(name: &str) -> Option<&'static ReactionSpec> {
    REACTIONS.iter().find(|r| r.name == name)
}

/// Reactions of a network in table order.
pub fn reactions_for(size: NetworkSize, era: Era) -> Vec<&'static ReactionSpec> {
    REACTIONS.iter().filter(|r| r.in_network(size, era)).collect()
}

/// Reactions used by any era of the network, i.e. the rate files to load.
pub fn reactions_needed(size: NetworkSize) -> Vec<&'static ReactionSpec> {
    REACTIONS
        .iter()
        .filter(|r| r.in_network(size, Era::Mid) || r.in_network(size, Era::Low))
        .collect()
}

pub fn n_species(size: NetworkSize) -> usize {
    match size {
        NetworkSize::Small => 8,
        NetworkSize::Large => Nuclide::ALL.len(),
    }
}

/// Stoichiometric matrix, one row per reaction and one column per species,
/// entries are products minus reactants.
pub fn stoichiometric_matrix(reactions: &[&ReactionSpec], n_species: usize) -> DMatrix<f64> {
    let mut matrix = DMatrix::zeros(reactions.len(), n_species);
    for (i, r) in reactions.iter().enumerate() {
        for species in Nuclide::ALL.iter().take(n_species) {
            matrix[(i, species.index())] = r.net_change(*species) as f64;
        }
    }
    matrix
}

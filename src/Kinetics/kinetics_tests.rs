#[cfg(test)]
mod tests {
    use crate::Kinetics::NetworkError;
    use crate::Kinetics::nuclear_network::*;
    use crate::Kinetics::nuclear_rates::*;
    use crate::Kinetics::nuclides::*;
    use crate::Kinetics::reaction_table::*;
    use crate::ReactorsIVP::ivp_solvers::{IvpSolve, OdeSystem, create_solver};
    use crate::Utils::interpolation::logspace;
    use crate::Utils::load_from_file::{TableError, save_columns};
    use crate::WeakRates::rate_tables::Era;
    use crate::settings::{BbnConfig, NetworkSize, SolverBackend};
    use approx::assert_relative_eq;
    use nalgebra::{DMatrix, DVector};
    use std::collections::HashMap;
    use std::path::Path;
    use tempfile::tempdir;

    /// median = 1 + T9 on a log grid, so linear interpolation is exact
    fn synthetic_table(name: &str) -> RateTable {
        let t9 = logspace(1e-3, 10.0, 40);
        let median: Vec<f64> = t9.iter().map(|t| 1.0 + t).collect();
        let expsigma = vec![1.2; t9.len()];
        RateTable::new(name, t9, median, expsigma).unwrap()
    }

    fn synthetic_rates(size: NetworkSize) -> NuclearRates {
        let tables: Vec<RateTable> = reactions_needed(size).iter().map(|r| synthetic_table(r.name)).collect();
        NuclearRates::from_tables(&tables, &HashMap::new(), &HashMap::new()).unwrap()
    }

    fn write_table(dir: &Path, table: &RateTable) {
        save_columns(
            &dir.join(format!("{}.txt", table.name)),
            &[&table.t9, &table.median, &table.expsigma],
        )
        .unwrap();
    }

    struct Constant {
        t_kelvin: f64,
        rho: f64,
        weak: (f64, f64),
    }
    impl NetworkConditions for Constant {
        fn temperature_kelvin(&self, _t: f64) -> f64 {
            self.t_kelvin
        }
        fn baryon_density(&self, _t: f64) -> f64 {
            self.rho
        }
        fn weak_rates(&self, _t_kelvin: f64) -> (f64, f64) {
            self.weak
        }
    }

    fn sample_abundances(n: usize) -> DVector<f64> {
        DVector::from_iterator(n, (0..n).map(|i| 0.05 + 0.07 * i as f64))
    }

    #[test]
    fn test_every_reaction_conserves_baryons_and_charge() {
        for r in REACTIONS.iter() {
            assert_eq!(r.baryon_imbalance(), 0, "{}", r.name);
            assert_eq!(r.charge_imbalance(), 0, "{}", r.name);
        }
        let mut names: Vec<&str> = REACTIONS.iter().map(|r| r.name).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), 63);
    }

    #[test]
    fn test_network_composition() {
        assert_eq!(reactions_for(NetworkSize::Small, Era::Mid).len(), 12);
        assert_eq!(reactions_for(NetworkSize::Small, Era::Low).len(), 12);
        assert_eq!(reactions_for(NetworkSize::Large, Era::Mid).len(), 17);
        assert_eq!(reactions_for(NetworkSize::Large, Era::Low).len(), 62);
        assert!(reactions_for(NetworkSize::Large, Era::High).is_empty());
        assert!(reactions_for(NetworkSize::Large, Era::Low).iter().all(|r| r.name != "Li7taan"));
        assert_eq!(reactions_needed(NetworkSize::Large).len(), 62);
        // the small network never touches species beyond Be7
        for r in reactions_for(NetworkSize::Small, Era::Low) {
            assert!(r.max_species_index() < 8, "{}", r.name);
        }
        let s = stoichiometric_matrix(&reactions_for(NetworkSize::Small, Era::Mid), 8);
        assert_eq!(s.shape(), (12, 8));
        // npdg: n + p -> d
        assert_eq!(s.row(0).iter().copied().collect::<Vec<_>>(), vec![-1.0, -1.0, 1.0, 0.0, 0.0, 0.0, 0.0, 0.0]);
        let masses = DVector::from_iterator(8, Nuclide::ALL.iter().take(8).map(|n| n.mass_number() as f64));
        assert!((s * masses).iter().all(|v| *v == 0.0));
    }

    #[test]
    fn test_detailed_balance_for_every_reaction() {
        let rates = synthetic_rates(NetworkSize::Large);
        for spec in reactions_needed(NetworkSize::Large) {
            let rate = rates.get(spec.name).unwrap();
            for t9 in [0.5, 1.0, 3.0] {
                let t = t9 * 1e9;
                let expected = spec.alpha * f64::powf(t9, spec.beta) * (spec.gamma / t9).exp();
                assert_relative_eq!(rate.backward(t) / rate.forward(t), expected, max_relative = 1e-12);
            }
        }
        let npdg = find_reaction("npdg").unwrap();
        assert_relative_eq!(npdg.detailed_balance(1.0), 4.71614e9 * (-25.815f64).exp(), max_relative = 1e-14);
    }

    #[test]
    fn test_rate_modifiers_and_extrapolation() {
        let table = synthetic_table("dpHe3g");
        let mut nuisance = HashMap::new();
        nuisance.insert("dpHe3g".to_string(), 1.0);
        let mut delta = HashMap::new();
        delta.insert("dpHe3g".to_string(), 0.1);
        let plain = NuclearRates::from_tables(&[table.clone()], &HashMap::new(), &HashMap::new()).unwrap();
        let shifted = NuclearRates::from_tables(&[table.clone()], &nuisance, &delta).unwrap();
        let t = 2.0e9;
        let base = plain.get("dpHe3g").unwrap().forward(t);
        assert_relative_eq!(base, 3.0, max_relative = 1e-12);
        assert_relative_eq!(shifted.get("dpHe3g").unwrap().forward(t), base * (1.2 + 0.1), max_relative = 1e-12);
        // linear extrapolation below and above the grid
        assert_relative_eq!(plain.get("dpHe3g").unwrap().forward(1e5), 1.0001, max_relative = 1e-10);
        assert_relative_eq!(plain.get("dpHe3g").unwrap().forward(2e10), 21.0, max_relative = 1e-10);

        let mut bad = HashMap::new();
        bad.insert("xyz".to_string(), 1.0);
        assert!(matches!(
            NuclearRates::from_tables(&[table], &bad, &HashMap::new()),
            Err(NetworkError::UnknownReaction(_))
        ));
        assert!(matches!(
            RateTable::new("npdg", vec![1.0, 2.0], vec![1.0, 1.0], vec![1.0, 0.0]),
            Err(NetworkError::MalformedTable { .. })
        ));
    }

    #[test]
    fn test_load_rate_files() {
        let dir = tempdir().unwrap();
        let mut config = BbnConfig::default();
        config.data_dir = dir.path().to_path_buf();
        config.network = NetworkSize::Small;
        // nothing on disk yet
        assert!(matches!(
            NuclearRates::load(&config),
            Err(NetworkError::Table(TableError::NotFound(_)))
        ));
        for spec in reactions_needed(NetworkSize::Small) {
            write_table(&config.key_rates_dir(), &synthetic_table(spec.name));
        }
        config.nuisance.insert("npdg".to_string(), -1.0);
        let rates = NuclearRates::load(&config).unwrap();
        assert_eq!(rates.len(), 12);
        assert!(rates.covers(NetworkSize::Small));
        assert!(!rates.covers(NetworkSize::Large));
        assert_relative_eq!(rates.get("npdg").unwrap().forward(1e9), 2.0 / 1.2, max_relative = 1e-12);
        assert!(matches!(
            ReactionNetwork::new(&rates, NetworkSize::Large, Era::Mid),
            Err(NetworkError::MissingRate(_))
        ));
    }

    #[test]
    fn test_flux_bookkeeping_against_hand_written_terms() {
        let rates = synthetic_rates(NetworkSize::Small);
        let net = ReactionNetwork::new(&rates, NetworkSize::Small, Era::Mid).unwrap();
        let y = sample_abundances(8);
        let (t, rho, weak) = (1.5e9, 0.7, (0.3, 0.2));
        let mut dy = DVector::zeros(8);
        net.derivative(&y, t, rho, weak, &mut dy);

        let r = |name: &str| rates.get(name).unwrap();
        let (yn, yp, yd, yt, yhe3, ya, yli7, ybe7) = (y[0], y[1], y[2], y[3], y[4], y[5], y[6], y[7]);
        let dyn_expected = -weak.0 * yn + weak.1 * yp
            + rho
                * (0.5 * r("ddHe3n").forward(t) * yd * yd - r("npdg").forward(t) * yp * yn
                    + r("He3ntp").backward(t) * yp * yt
                    + r("tdan").forward(t) * yd * yt
                    - (r("He3ntp").forward(t) + r("ddHe3n").backward(t)) * yn * yhe3
                    - r("tdan").backward(t) * yn * ya
                    + r("Be7nLi7p").backward(t) * yp * yli7
                    - r("Be7nLi7p").forward(t) * yn * ybe7)
            + r("npdg").backward(t) * yd;
        assert_relative_eq!(dy[0], dyn_expected, max_relative = 1e-12);

        let dya_expected = rho
            * (r("tpag").forward(t) * yt * yp
                + r("tdan").forward(t) * yt * yd
                - r("tdan").backward(t) * ya * yn
                + r("He3dap").forward(t) * yhe3 * yd
                - r("He3dap").backward(t) * ya * yp
                - r("taLi7g").forward(t) * yt * ya
                - r("He3aBe7g").forward(t) * yhe3 * ya
                + 2.0 * r("Li7paa").forward(t) * yli7 * yp
                - r("Li7paa").backward(t) * ya * ya)
            - r("tpag").backward(t) * ya
            + r("taLi7g").backward(t) * yli7
            + r("He3aBe7g").backward(t) * ybe7;
        assert_relative_eq!(dy[5], dya_expected, max_relative = 1e-12);
    }

    #[test]
    fn test_three_body_symmetry_factors() {
        let rates = synthetic_rates(NetworkSize::Large);
        let net = ReactionNetwork::new(&rates, NetworkSize::Large, Era::Low).unwrap();
        let names = net.reaction_names();
        let y = sample_abundances(12);
        let (t, rho) = (1e9, 2.0);
        let fluxes = net.net_fluxes(&y, t, rho);
        // p p n -> d p: F = f ρ² Y_n Y_p² / 2, B = b ρ Y_d Y_p
        let i = names.iter().position(|n| *n == "ppndp").unwrap();
        let r = rates.get("ppndp").unwrap();
        let expected = 0.5 * rho * rho * r.forward(t) * y[0] * y[1] * y[1] - rho * r.backward(t) * y[2] * y[1];
        assert_relative_eq!(fluxes[i], expected, max_relative = 1e-12);
        // Li7 t -> a a n n: B = b ρ³ Y_a² Y_n² / (2! 2!)
        let i = names.iter().position(|n| *n == "Li7taann").unwrap();
        let r = rates.get("Li7taann").unwrap();
        let expected =
            rho * r.forward(t) * y[6] * y[3] - 0.25 * rho.powi(3) * r.backward(t) * y[5] * y[5] * y[0] * y[0];
        assert_relative_eq!(fluxes[i], expected, max_relative = 1e-12);
    }

    #[test]
    fn test_derivative_conserves_baryon_number() {
        for (size, era) in [
            (NetworkSize::Small, Era::Mid),
            (NetworkSize::Large, Era::Mid),
            (NetworkSize::Large, Era::Low),
            (NetworkSize::Large, Era::High),
        ] {
            let rates = synthetic_rates(size);
            let net = ReactionNetwork::new(&rates, size, era).unwrap();
            let n = net.n_species();
            let y = sample_abundances(n);
            let mut dy = DVector::zeros(n);
            net.derivative(&y, 8e8, 1.3, (0.4, 0.1), &mut dy);
            let scale: f64 = dy.iter().enumerate().map(|(i, v)| Nuclide::ALL[i].mass_number() as f64 * v.abs()).sum();
            assert!(baryon_number(&dy).abs() <= 1e-13 * scale, "{:?} {:?}", size, era);
        }
    }

    #[test]
    fn test_analytic_jacobian_matches_finite_differences() {
        let rates = synthetic_rates(NetworkSize::Large);
        let net = ReactionNetwork::new(&rates, NetworkSize::Large, Era::Low).unwrap();
        let n = net.n_species();
        let y = sample_abundances(n);
        let (t, rho, weak) = (9e8, 1.1, (0.4, 0.1));
        let mut jac = DMatrix::zeros(n, n);
        net.jacobian(&y, t, rho, weak, &mut jac);
        let scale = jac.amax();
        let mut fp = DVector::zeros(n);
        let mut fm = DVector::zeros(n);
        for j in 0..n {
            let h = 1e-2 * y[j];
            let mut yp = y.clone();
            yp[j] += h;
            let mut ym = y.clone();
            ym[j] -= h;
            net.derivative(&yp, t, rho, weak, &mut fp);
            net.derivative(&ym, t, rho, weak, &mut fm);
            for i in 0..n {
                let fd = (fp[i] - fm[i]) / (2.0 * h);
                assert!(
                    (jac[(i, j)] - fd).abs() <= 1e-5 * (jac[(i, j)].abs() + 1e-5 * scale),
                    "J[{},{}] = {} vs {}",
                    i,
                    j,
                    jac[(i, j)],
                    fd
                );
            }
        }
    }

    #[test]
    fn test_integrated_network_conserves_baryons() {
        let rates = synthetic_rates(NetworkSize::Small);
        let net = ReactionNetwork::new(&rates, NetworkSize::Small, Era::Mid).unwrap();
        let conditions = Constant {
            t_kelvin: 1e9,
            rho: 1.0,
            weak: (0.05, 0.01),
        };
        let ode = NetworkOde {
            network: &net,
            conditions: &conditions,
        };
        assert_eq!(ode.ndim(), 8);
        let mut y0 = DVector::zeros(8);
        y0[0] = 0.2;
        y0[1] = 0.8;
        let solver = create_solver(SolverBackend::Default);
        let traj = solver.solve(&ode, &y0, (0.0, 10.0), &[], 1e-8, 1e-12).unwrap();
        let y = traj.last().unwrap();
        assert_relative_eq!(baryon_number(y), 1.0, epsilon = 1e-9);
        // deuterium is produced and burnt further
        assert!(y[2] > 0.0 && y[5] > 0.0);
    }

    #[test]
    fn test_nse_abundances() {
        let t_weak = 1.0 * crate::Cosmology::physical_constants::MEV / crate::Cosmology::physical_constants::K_B;
        let eta = 1.67e-9;
        let yd = nse_abundance(Nuclide::D, 0.17, 0.83, t_weak, eta);
        assert!(yd > 0.0 && yd < 1e-10, "Yd = {}", yd);
        assert_relative_eq!(yd, 6.1543e-13, max_relative = 1e-3);
        let ya = nse_abundance(Nuclide::He4, 0.17, 0.83, t_weak, eta);
        assert_relative_eq!(ya, 2.1127e-28, max_relative = 1e-3);
        let yb8 = nse_abundance(Nuclide::B8, 0.17, 0.83, t_weak, eta);
        assert!(yb8 > 0.0 && yb8 < 1e-70);
        // deuterium rises as the plasma cools
        assert!(nse_abundance(Nuclide::D, 0.15, 0.85, 0.1 * t_weak, eta) > 1e3 * yd);
        assert_relative_eq!(Nuclide::D.binding_energy_kev(), 2224.5657, max_relative = 1e-6);
        assert_eq!(Nuclide::Li7.mass_number(), 7);
        assert_eq!(Nuclide::B8.index(), 11);
    }
}

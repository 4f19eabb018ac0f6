#[cfg(test)]
mod tests {
    use crate::Cosmology::physical_constants::{HE4_OVER_AMU, H_OVER_AMU};
    use crate::Kinetics::nuclear_network::baryon_number;
    use crate::Kinetics::nuclides::Nuclide;
    use crate::Kinetics::reaction_table::reactions_needed;
    use crate::ReactorsIVP::staged_integrator::*;
    use crate::Utils::interpolation::logspace;
    use crate::Utils::load_from_file::save_columns;
    use crate::settings::{BbnConfig, NetworkSize, SolverBackend, ThermalCorrections, ThermoTablesKind};
    use approx::assert_relative_eq;
    use nalgebra::DVector;
    use std::path::Path;
    use tempfile::tempdir;

    /// Born-only rates, ideal plasma and synthetic nuclear tables under `data_dir`.
    fn fast_config(data_dir: &Path) -> BbnConfig {
        let key_dir = data_dir.join("nuclear").join("key_primat_rates");
        let t9 = logspace(1e-3, 100.0, 30);
        for spec in reactions_needed(NetworkSize::Small) {
            let median: Vec<f64> = t9.iter().map(|t| 1e3 * (1.0 + t)).collect();
            let expsigma = vec![1.1; t9.len()];
            save_columns(&key_dir.join(format!("{}.txt", spec.name)), &[&t9, &median, &expsigma]).unwrap();
        }
        BbnConfig {
            data_dir: data_dir.to_path_buf(),
            thermo_tables: ThermoTablesKind::Ideal,
            network: NetworkSize::Small,
            weak_rates_born_only: true,
            thermal_corrections: ThermalCorrections::Skip,
            n_sampling: 200,
            weak_rate_samples: 20,
            ..BbnConfig::default()
        }
    }

    #[test]
    fn test_results_from_abundances() {
        let mut y = DVector::zeros(12);
        y[Nuclide::P.index()] = 0.75;
        y[Nuclide::He4.index()] = 0.0617;
        y[Nuclide::D.index()] = 1.9e-5;
        y[Nuclide::T.index()] = 1e-7;
        y[Nuclide::He3.index()] = 7e-6;
        y[Nuclide::Li7.index()] = 1e-10;
        y[Nuclide::Be7.index()] = 3e-10;
        let r = BbnResults::from_abundances(&y, 3.044, 5.7, 2e-6);
        assert_relative_eq!(r.yp_bbn, 0.2468, max_relative = 1e-12);
        let he4 = HE4_OVER_AMU / 4.0 * 0.2468;
        assert_relative_eq!(r.yp_cmb, he4 / (he4 + H_OVER_AMU * (1.0 - 0.2468)), max_relative = 1e-12);
        assert!(r.yp_cmb < r.yp_bbn);
        assert_relative_eq!(r.d_over_h_1e5, 1.9e-5 / 0.75 * 1e5, max_relative = 1e-12);
        assert_relative_eq!(r.he3_over_h_1e5, 7.1e-6 / 0.75 * 1e5, max_relative = 1e-12);
        assert_relative_eq!(r.li7_over_h_1e10, 4e-10 / 0.75 * 1e10, max_relative = 1e-12);
        assert_relative_eq!(r.omega_nu_rel_1e6, 5.7e6, max_relative = 1e-12);
        assert_relative_eq!(r.one_over_omega_nu_nr, 1.0 / 2e-12, max_relative = 1e-12);

        let v = r.to_vec();
        assert_eq!(v.len(), BbnResults::LABELS.len());
        assert_eq!(v[0], 3.044);
        assert_eq!(v[3], r.yp_cmb);
        assert_eq!(v[4], r.yp_bbn);
    }

    #[test]
    fn test_steps_out_of_order() {
        let mut task = BbnTask::new(BbnConfig::default()).unwrap();
        match task.solve() {
            Err(BbnError::OutOfOrder { step, missing }) => {
                assert_eq!(step, "solve");
                assert_eq!(missing, "solve_background");
            }
            other => panic!("expected an ordering error, got {:?}", other.map(|_| ())),
        }
        assert!(matches!(task.build_network(), Err(BbnError::OutOfOrder { .. })));
        assert!(matches!(task.results(), Err(BbnError::OutOfOrder { .. })));
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let config = BbnConfig {
            t_weak_mev: 20.0,
            ..BbnConfig::default()
        };
        assert!(matches!(BbnTask::new(config), Err(BbnError::Config(_))));
    }

    #[test]
    fn test_missing_rate_files() {
        let dir = tempdir().unwrap();
        let config = BbnConfig {
            data_dir: dir.path().to_path_buf(),
            thermo_tables: ThermoTablesKind::Ideal,
            ..BbnConfig::default()
        };
        let mut task = BbnTask::new(config).unwrap();
        assert!(matches!(task.load_tables(), Err(BbnError::Network(_))));
    }

    #[test]
    fn test_synthetic_pipeline() {
        let dir = tempdir().unwrap();
        let config = fast_config(dir.path());
        let mut task = BbnTask::new(config).unwrap();
        task.load_tables().unwrap();
        task.solve_background().unwrap();
        task.build_weak_rates().unwrap();
        task.build_network().unwrap();
        task.solve().unwrap();

        let states = task.states.clone().unwrap();
        assert_eq!(states.high.len(), 2);
        assert_eq!(states.mid.len(), 8);
        assert_eq!(states.low.len(), 8);
        // n/p freeze-out leaves roughly one neutron in six at 1 MeV
        assert!(states.high[0] > 0.1 && states.high[0] < 0.3, "Y_n = {}", states.high[0]);
        assert_relative_eq!(states.high[0] + states.high[1], 1.0, epsilon = 1e-8);
        // nuclear reactions and decays move baryons between species only
        assert_relative_eq!(baryon_number(&states.low), 1.0, epsilon = 1e-6);

        let results = task.results().unwrap();
        assert!(results.to_vec().iter().all(|v| v.is_finite()));
        assert!(results.n_eff > 2.9 && results.n_eff < 3.2);
        assert!(results.yp_bbn >= 0.0 && results.yp_bbn < 0.5);
    }

    #[test]
    fn test_weak_era_on_stiff_backends() {
        let dir = tempdir().unwrap();
        let run = |ht_explicit: bool, solver_backend: SolverBackend| {
            let config = BbnConfig {
                ht_explicit,
                solver_backend,
                ..fast_config(dir.path())
            };
            let mut task = BbnTask::new(config).unwrap();
            task.load_tables().unwrap();
            task.solve_background().unwrap();
            task.build_weak_rates().unwrap();
            task.build_network().unwrap();
            task.solve().unwrap();
            task.states.clone().unwrap().high
        };
        let explicit = run(true, SolverBackend::Default);
        for backend in [SolverBackend::Default, SolverBackend::Alternate] {
            let stiff = run(false, backend);
            assert_relative_eq!(stiff[0], explicit[0], max_relative = 1e-3);
            assert_relative_eq!(stiff[0] + stiff[1], 1.0, epsilon = 1e-8);
        }
    }

    #[test]
    fn test_nse_deuterium_is_negligible_at_weak_freeze_out() {
        let dir = tempdir().unwrap();
        let mut task = BbnTask::new(fast_config(dir.path())).unwrap();
        task.load_tables().unwrap();
        task.solve_background().unwrap();
        let background = task.background.as_ref().unwrap();
        let t_weak = task.constants.t_weak;
        let eta = background.eta_of_T(t_weak);
        assert!(eta > 1e-10 && eta < 1e-8, "eta = {}", eta);
        let yd = crate::Kinetics::nuclides::nse_abundance(Nuclide::D, 0.17, 0.83, t_weak, eta);
        assert!(yd > 0.0 && yd < 1e-10);
    }

    /// Needs the full rate and correction tables under `PRyMrates/`.
    #[test]
    #[ignore]
    fn test_standard_run() {
        let results = compute_results(BbnConfig::default()).unwrap();
        assert_relative_eq!(results.n_eff, 3.044, max_relative = 5e-3);
        assert_relative_eq!(results.yp_bbn, 0.247, max_relative = 1e-2);
        assert_relative_eq!(results.d_over_h_1e5, 2.5, max_relative = 0.1);
        assert_relative_eq!(results.he3_over_h_1e5, 1.03, max_relative = 0.1);
        assert_relative_eq!(results.li7_over_h_1e10, 5.6, max_relative = 0.2);
    }
}

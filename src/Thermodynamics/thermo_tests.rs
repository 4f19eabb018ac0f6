#[cfg(test)]
mod tests {
    use crate::Cosmology::physical_constants::{M_E, PhysicalConstants};
    use crate::Thermodynamics::new_physics::{Coupling, NewPhysicsSector, Sector, create_sector};
    use crate::Thermodynamics::plasma::*;
    use crate::Thermodynamics::thermo_tables::ThermoTables;
    use crate::Utils::load_from_file::save_columns;
    use crate::settings::NewPhysicsConfig;
    use approx::assert_relative_eq;
    use std::f64::consts::PI;
    use tempfile::tempdir;

    fn ideal_plasma() -> PlasmaThermo {
        PlasmaThermo::new(ThermoTables::ideal(), &PhysicalConstants::default())
    }

    #[test]
    fn test_electron_ultrarelativistic_limit() {
        let t = 10.0;
        // 4 fermionic degrees of freedom: 7/8 · 4/2 of the photon value
        assert_relative_eq!(rho_e(t), 7.0 / 4.0 * rho_g(t), max_relative = 2e-3);
        assert_relative_eq!(p_e(t), rho_e(t) / 3.0, max_relative = 2e-3);
        assert_relative_eq!(rho_nu(t), 7.0 / 8.0 * rho_g(t), max_relative = 1e-14);
    }

    #[test]
    fn test_electron_terms_vanish_below_threshold() {
        let t = M_E / 31.0;
        assert_eq!(rho_e(t), 0.0);
        assert_eq!(p_e(t), 0.0);
        assert_eq!(drho_e_dt(t), 0.0);
        // just above threshold the Boltzmann tail is tiny but positive
        let t = M_E / 29.0;
        assert!(rho_e(t) > 0.0 && rho_e(t) < 1e-9 * rho_g(t));
    }

    #[test]
    fn test_drho_e_matches_finite_difference() {
        for t in [0.05, 0.3, 1.0, 5.0] {
            let h = 1e-5 * t;
            let fd = (rho_e(t + h) - rho_e(t - h)) / (2.0 * h);
            assert_relative_eq!(drho_e_dt(t), fd, max_relative = 1e-6);
        }
        assert_relative_eq!(drho_g_dt(2.0), 4.0 * rho_g(2.0) / 2.0);
    }

    #[test]
    fn test_entropy_high_temperature() {
        let plasma = ideal_plasma();
        let t: f64 = 10.0;
        // γ + e±: g_* = 2 + 7/8·4 = 11/2
        let expected = 2.0 * PI * PI / 45.0 * 5.5 * t.powi(3);
        assert_relative_eq!(plasma.spl(t), expected, max_relative = 2e-3);
        // after annihilation only photons remain
        let t: f64 = 1e-3;
        assert_relative_eq!(
            plasma.spl(t),
            2.0 * PI * PI / 45.0 * 2.0 * t.powi(3),
            max_relative = 1e-12
        );
    }

    #[test]
    fn test_collision_terms() {
        let plasma = ideal_plasma();
        assert_eq!(plasma.delta_rho_nue(1.0, 1.0, 1.0), 0.0);
        assert_eq!(plasma.delta_rho_numu(1.0, 1.0, 1.0), 0.0);
        // a hotter plasma heats both flavours, νe more strongly (charged current)
        let dnue = plasma.delta_rho_nue(1.0, 0.99, 0.99);
        let dnumu = plasma.delta_rho_numu(1.0, 0.99, 0.99);
        assert!(dnue > 0.0 && dnumu > 0.0);
        assert!(dnue > dnumu);
        // ideal tables carry no QED correction
        assert_eq!(plasma.p_qed(1.0), 0.0);
        assert_eq!(plasma.delta_rho_qed(1.0), 0.0);
        let t = 2.0;
        assert_relative_eq!(
            plasma.rho_sm(t, t, t),
            rho_g(t) + rho_e(t) + 3.0 * rho_nu(t),
            max_relative = 1e-14
        );
    }

    #[test]
    fn test_tables_load_from_directory() {
        let dir = tempdir().unwrap();
        let t = [0.01, 0.1, 1.0, 10.0];
        let ones = [1.0; 4];
        let f = [1.0, 1.1, 1.2, 1.3];
        for name in ["nue_scatt.txt", "numu_scatt.txt", "numu_ann.txt"] {
            save_columns(&dir.path().join(name), &[&t[..], &ones[..]]).unwrap();
        }
        save_columns(&dir.path().join("nue_ann.txt"), &[&t[..], &f[..]]).unwrap();
        let p1 = [1e-6, 1e-5, 1e-4, 1e-3];
        let p2 = [2e-6, 2e-5, 2e-4, 2e-3];
        for name in ["QED_P_int.txt", "QED_dP_intdT.txt", "QED_d2P_intdT2.txt"] {
            save_columns(&dir.path().join(name), &[&t[..], &p1[..], &p2[..]]).unwrap();
        }
        let tables = ThermoTables::load(dir.path()).unwrap();
        assert_relative_eq!(tables.nue_ann.eval(0.55), 1.15, max_relative = 1e-12);
        assert_relative_eq!(tables.p_qed.eval(1.0), 3e-4, max_relative = 1e-12);
        // linear extrapolation past the last node
        assert_relative_eq!(tables.nue_ann.eval(19.0), 1.4, max_relative = 1e-12);

        std::fs::remove_file(dir.path().join("QED_P_int.txt")).unwrap();
        assert!(ThermoTables::load(dir.path()).is_err());
    }

    #[test]
    fn test_new_physics_sector() {
        let none = create_sector(&NewPhysicsConfig::None);
        assert!(!none.is_active());
        assert_eq!(none.rho(1.0), 0.0);
        let sector = create_sector(&NewPhysicsConfig::DecoupledRadiation {
            g_eff: 2.0,
            xi: 0.5,
            exchange_rate: 0.0,
        });
        assert!(matches!(sector, Sector::DecoupledRadiation(_)));
        assert!(sector.is_active());
        assert_relative_eq!(sector.rho(3.0), rho_g(3.0), max_relative = 1e-14);
        assert_relative_eq!(sector.pressure(3.0), rho_g(3.0) / 3.0, max_relative = 1e-14);
        assert_relative_eq!(sector.drho_dt(3.0), drho_g_dt(3.0), max_relative = 1e-14);
        assert_eq!(sector.initial_temperature(10.0), 5.0);
    }

    #[test]
    fn test_sector_couplings() {
        let none = create_sector(&NewPhysicsConfig::None);
        assert_eq!(none.coupling(), Coupling::Absent);
        assert_eq!(none.temperature(2.0, 1.5, 1.0), 0.0);

        let nu = create_sector(&NewPhysicsConfig::NeutrinoCoupled { g_eff: 1.75 });
        assert_eq!(nu.coupling(), Coupling::Neutrinos);
        assert!(!nu.is_active());
        assert_eq!(nu.temperature(2.0, 1.5, 1.0), 1.5);
        assert_eq!(nu.initial_temperature(10.0), 10.0);
        // 7/4 bosonic-equivalent degrees of freedom are one neutrino flavour
        assert_relative_eq!(nu.rho(3.0), rho_nu(3.0), max_relative = 1e-14);
        assert_eq!(nu.delta_rho(2.0, 1.5, 1.5, 0.0), 0.0);

        let pl = create_sector(&NewPhysicsConfig::PlasmaCoupled { g_eff: 2.0 });
        assert_eq!(pl.coupling(), Coupling::Plasma);
        assert!(!pl.is_active());
        assert_eq!(pl.temperature(2.0, 1.5, 1.0), 2.0);
        assert_relative_eq!(pl.drho_dt(3.0), drho_g_dt(3.0), max_relative = 1e-14);

        let open = create_sector(&NewPhysicsConfig::DecoupledRadiation {
            g_eff: 2.0,
            xi: 0.5,
            exchange_rate: 3.0,
        });
        assert_eq!(open.coupling(), Coupling::Decoupled);
        assert_eq!(open.temperature(2.0, 1.5, 1.0), 1.0);
        // energy flows from the hotter plasma into the colder sector and back
        assert_relative_eq!(
            open.delta_rho(2.0, 1.5, 1.5, 1.0),
            3.0 * (rho_g(2.0) - rho_g(1.0)),
            max_relative = 1e-14
        );
        assert!(open.delta_rho(1.0, 1.0, 1.0, 2.0) < 0.0);
        assert_eq!(open.delta_rho(2.0, 2.0, 2.0, 2.0), 0.0);
    }
}

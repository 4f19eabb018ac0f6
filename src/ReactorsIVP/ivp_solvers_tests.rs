#[cfg(test)]
mod tests {
    use crate::ReactorsIVP::ivp_solvers::*;
    use crate::settings::SolverBackend;
    use approx::assert_relative_eq;
    use nalgebra::{DMatrix, DVector};

    struct Decay {
        k: f64,
    }
    impl OdeSystem for Decay {
        fn ndim(&self) -> usize {
            1
        }
        fn rhs(&self, _t: f64, y: &DVector<f64>, dydt: &mut DVector<f64>) {
            dydt[0] = -self.k * y[0];
        }
    }

    /// Robertson's chemical kinetics problem, the classic stiff benchmark
    struct Robertson;
    impl OdeSystem for Robertson {
        fn ndim(&self) -> usize {
            3
        }
        fn rhs(&self, _t: f64, y: &DVector<f64>, dydt: &mut DVector<f64>) {
            dydt[0] = -0.04 * y[0] + 1e4 * y[1] * y[2];
            dydt[1] = 0.04 * y[0] - 1e4 * y[1] * y[2] - 3e7 * y[1] * y[1];
            dydt[2] = 3e7 * y[1] * y[1];
        }
        fn jacobian(&self, _t: f64, y: &DVector<f64>, jac: &mut DMatrix<f64>) {
            jac[(0, 0)] = -0.04;
            jac[(0, 1)] = 1e4 * y[2];
            jac[(0, 2)] = 1e4 * y[1];
            jac[(1, 0)] = 0.04;
            jac[(1, 1)] = -1e4 * y[2] - 6e7 * y[1];
            jac[(1, 2)] = -1e4 * y[1];
            jac[(2, 0)] = 0.0;
            jac[(2, 1)] = 6e7 * y[1];
            jac[(2, 2)] = 0.0;
        }
    }

    /// forced, non-autonomous: y' = cos t, y(0) = 0
    struct Forced;
    impl OdeSystem for Forced {
        fn ndim(&self) -> usize {
            1
        }
        fn rhs(&self, t: f64, _y: &DVector<f64>, dydt: &mut DVector<f64>) {
            dydt[0] = t.cos();
        }
    }

    fn all_solvers() -> Vec<IvpSolver> {
        vec![
            create_solver(SolverBackend::Default),
            create_solver(SolverBackend::Alternate),
            IvpSolver::DormandPrince45(DormandPrince45::default()),
        ]
    }

    #[test]
    fn test_exponential_decay_all_methods() {
        let y0 = DVector::from_element(1, 1.0);
        for solver in all_solvers() {
            let traj = solver.solve(&Decay { k: 2.0 }, &y0, (0.0, 3.0), &[], 1e-8, 1e-12).unwrap();
            assert_eq!(*traj.t.last().unwrap(), 3.0);
            assert_relative_eq!(traj.last().unwrap()[0], (-6.0f64).exp(), max_relative = 1e-4);
            assert!(traj.n_steps > 0, "{}", solver.name());
        }
    }

    #[test]
    fn test_dense_output_at_requested_times() {
        let y0 = DVector::from_element(1, 1.0);
        let t_eval: Vec<f64> = (0..=20).map(|i| 0.25 * i as f64).collect();
        for solver in all_solvers() {
            let traj = solver.solve(&Decay { k: 0.7 }, &y0, (0.0, 5.0), &t_eval, 1e-9, 1e-12).unwrap();
            assert_eq!(traj.t, t_eval);
            for (t, y) in traj.t.iter().zip(&traj.y) {
                assert_relative_eq!(y[0], (-0.7 * t).exp(), max_relative = 1e-5);
            }
        }
    }

    #[test]
    fn test_non_autonomous_rhs() {
        let y0 = DVector::from_element(1, 0.0);
        for solver in all_solvers() {
            let traj = solver.solve(&Forced, &y0, (0.0, 2.0), &[1.0, 2.0], 1e-9, 1e-12).unwrap();
            assert_relative_eq!(traj.y[0][0], 1f64.sin(), epsilon = 1e-5);
            assert_relative_eq!(traj.y[1][0], 2f64.sin(), epsilon = 1e-5);
        }
    }

    #[test]
    fn test_robertson_stiff() {
        let y0 = DVector::from_vec(vec![1.0, 0.0, 0.0]);
        for backend in [SolverBackend::Default, SolverBackend::Alternate] {
            let solver = create_solver(backend);
            let traj = solver.solve(&Robertson, &y0, (0.0, 40.0), &[], 1e-6, 1e-10).unwrap();
            let y = traj.last().unwrap();
            assert_relative_eq!(y[0], 0.715_827_068_7, max_relative = 1e-3);
            assert_relative_eq!(y[1], 9.185_534_764e-6, max_relative = 1e-2);
            assert_relative_eq!(y[2], 0.284_163_745_7, max_relative = 3e-3);
            // mass conservation of the linear invariant
            assert_relative_eq!(y.sum(), 1.0, epsilon = 1e-8);
            // stiff methods must not need the explicit stability limit h ~ 1e-4
            assert!(traj.n_steps < 20_000, "{} steps", traj.n_steps);
        }
    }

    #[test]
    fn test_invalid_problems() {
        let solver = create_solver(SolverBackend::Default);
        let y0 = DVector::from_element(1, 1.0);
        assert_eq!(
            solver.solve(&Decay { k: 1.0 }, &y0, (1.0, 0.0), &[], 1e-6, 1e-9),
            Err(IvpError::InvalidSpan(1.0, 0.0))
        );
        assert_eq!(
            solver.solve(&Robertson, &y0, (0.0, 1.0), &[], 1e-6, 1e-9),
            Err(IvpError::DimensionMismatch { expected: 3, got: 1 })
        );
        assert_eq!(
            solver.solve(&Decay { k: 1.0 }, &y0, (0.0, 1.0), &[0.5, 0.2], 1e-6, 1e-9),
            Err(IvpError::InvalidOutputTimes)
        );
        assert!(matches!(
            solver.solve(&Decay { k: 1.0 }, &y0, (0.0, 1.0), &[], -1.0, 1e-9),
            Err(IvpError::InvalidTolerance { .. })
        ));
        let limited = IvpSolver::Rosenbrock23(Rosenbrock23 {
            control: StepControl {
                max_steps: 3,
                ..StepControl::default()
            },
        });
        assert!(matches!(
            limited.solve(&Decay { k: 1.0 }, &y0, (0.0, 100.0), &[], 1e-10, 1e-14),
            Err(IvpError::MaxSteps { max_steps: 3, .. })
        ));
    }

    #[test]
    fn test_dormand_prince_segments() {
        let solver = IvpSolver::DormandPrince45(DormandPrince45);
        let y0 = DVector::from_element(1, 1.0);
        let traj = solver.solve(&Decay { k: 1.5 }, &y0, (0.0, 2.0), &[], 1e-9, 1e-12).unwrap();
        assert_eq!(traj.t, vec![0.0, 2.0]);
        assert_relative_eq!(traj.y[1][0], (-3.0f64).exp(), max_relative = 1e-7);

        // log-spaced grid as the weak era uses, with a repeated time and the start point
        let mut t_eval = vec![0.1, 0.1];
        t_eval.extend((1..=30).map(|i| 0.1 * 1.2f64.powi(i)));
        let traj = solver
            .solve(&Decay { k: 1.5 }, &y0, (0.1, t_eval[31]), &t_eval, 1e-9, 1e-12)
            .unwrap();
        assert_eq!(traj.t, t_eval);
        assert_eq!(traj.y[0], y0);
        assert_eq!(traj.y[1], y0);
        for (t, y) in traj.t.iter().zip(&traj.y) {
            assert_relative_eq!(y[0], (-1.5 * (t - 0.1)).exp(), max_relative = 1e-7);
        }
        assert!(traj.n_steps >= 30);
    }
}

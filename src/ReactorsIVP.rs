/// Stiff and non-stiff initial value solvers with adaptive steps and dense
/// output: Rosenbrock, SDIRK and Dormand–Prince behind one `IvpSolve` trait.
pub mod ivp_solvers;
mod ivp_solvers_tests;
/// The BBN run: background, weak rates, networks and the three integration
/// eras chained into the final abundances.
/// ```rust, ignore
/// let results = compute_results(BbnConfig::default())?;
/// println!("YP = {}", results.yp_bbn);
/// ```
pub mod staged_integrator;
mod staged_integrator_tests;

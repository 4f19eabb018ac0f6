use crate::ReactorsIVP::staged_integrator::{BbnResults, BbnTask, compute_results};
use crate::settings::{BbnConfig, NetworkSize, NewPhysicsConfig, ThermalCorrections};
use log::error;

fn print_results(results: &BbnResults) {
    for (label, value) in BbnResults::LABELS.iter().zip(results.to_vec()) {
        println!("{:>28}: {:.6}", label, value);
    }
}

pub fn bbn_examples(task: usize, config: BbnConfig) {
    match task {
        0 => {
            // STANDARD RUN with the settings as given
            match compute_results(config) {
                Ok(results) => print_results(&results),
                Err(e) => error!("BBN run failed: {}", e),
            }
        }
        1 => {
            // fast run: 12 key reactions, Born weak rates, no thermal corrections
            let config = BbnConfig {
                network: NetworkSize::Small,
                weak_rates_born_only: true,
                thermal_corrections: ThermalCorrections::Skip,
                n_sampling: 400,
                ..config
            };
            match compute_results(config) {
                Ok(results) => print_results(&results),
                Err(e) => error!("BBN run failed: {}", e),
            }
        }
        2 => {
            // step by step, inspecting the state after each era
            let mut task = BbnTask::new(config).unwrap();
            task.load_tables().unwrap();
            task.solve_background().unwrap();
            let background = task.background.as_ref().unwrap();
            println!(
                "t_start = {:.4e} s, t_weak = {:.4e} s, t_nucl = {:.4e} s, t_end = {:.4e} s",
                background.t_start, background.t_weak, background.t_nucl, background.t_end
            );
            task.build_weak_rates().unwrap();
            task.build_network().unwrap();
            task.solve().unwrap();
            let states = task.states.as_ref().unwrap();
            println!("Y_n after the weak era: {:.6}", states.high[0]);
            println!("abundances after the mid era: {}", states.mid.transpose());
            println!("final abundances: {}", states.low.transpose());
            print_results(&task.results().unwrap());
        }
        3 => {
            // D/H response to the npdg rate uncertainty
            for p in [-1.0, 0.0, 1.0] {
                let mut config = config.clone();
                config.nuisance.insert("npdg".to_string(), p);
                match compute_results(config) {
                    Ok(results) => println!("p(npdg) = {:>4}: D/H x 1e5 = {:.5}", p, results.d_over_h_1e5),
                    Err(e) => error!("BBN run failed: {}", e),
                }
            }
        }
        4 => {
            // Ω_b h² scan
            for omega_b_h2 in [0.020, 0.0224, 0.025] {
                let config = BbnConfig {
                    omega_b_h2,
                    ..config.clone()
                };
                match compute_results(config) {
                    Ok(r) => println!(
                        "Ω_b h² = {:.4}: YP = {:.5}, D/H x 1e5 = {:.4}, Li7/H x 1e10 = {:.3}",
                        omega_b_h2, r.yp_bbn, r.d_over_h_1e5, r.li7_over_h_1e10
                    ),
                    Err(e) => error!("BBN run failed: {}", e),
                }
            }
        }
        5 => {
            // one extra relativistic species, decoupled or sharing a bath
            let sectors = [
                NewPhysicsConfig::DecoupledRadiation {
                    g_eff: 1.75,
                    xi: 1.0,
                    exchange_rate: 0.0,
                },
                NewPhysicsConfig::NeutrinoCoupled { g_eff: 1.75 },
                NewPhysicsConfig::PlasmaCoupled { g_eff: 1.75 },
            ];
            for new_physics in sectors {
                println!("{:?}", new_physics);
                let config = BbnConfig {
                    new_physics,
                    ..config.clone()
                };
                match compute_results(config) {
                    Ok(results) => print_results(&results),
                    Err(e) => error!("BBN run failed: {}", e),
                }
            }
        }
        _ => println!("unknown example {}, choose 0..=5", task),
    }
}

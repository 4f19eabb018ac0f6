use NuCosmo::Examples::bbn_examples::bbn_examples;
use NuCosmo::settings::BbnConfig;
use log::LevelFilter;
use simplelog::{ColorChoice, CombinedLogger, Config, SharedLogger, TermLogger, TerminalMode, WriteLogger};
use std::fs::File;

fn init_logging(config: &BbnConfig) {
    let mut loggers: Vec<Box<dyn SharedLogger>> = vec![TermLogger::new(
        LevelFilter::Info,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )];
    if let Some(path) = &config.log_file {
        match File::create(path) {
            Ok(file) => loggers.push(WriteLogger::new(LevelFilter::Debug, Config::default(), file)),
            Err(e) => eprintln!("cannot open log file {}: {}", path.display(), e),
        }
    }
    if let Err(e) = CombinedLogger::init(loggers) {
        eprintln!("cannot initialise logging: {}", e);
    }
}

pub fn main() {
    // optional JSON config as the first argument, example task as the second
    let args: Vec<String> = std::env::args().collect();
    let config = match args.get(1) {
        Some(path) => match BbnConfig::from_file(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("{}", e);
                std::process::exit(1);
            }
        },
        None => BbnConfig::default(),
    };
    init_logging(&config);
    let task: usize = args.get(2).and_then(|s| s.parse().ok()).unwrap_or(0);
    bbn_examples(task, config);
}

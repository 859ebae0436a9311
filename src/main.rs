use std::process::ExitCode;

use log::{error, info};
use sealed_chain::{Blockchain, ChainError, Config, ConfigError};

fn load_config() -> Result<Config, ConfigError> {
    let config = Config::from_env()?;
    config.validate()?;
    Ok(config)
}

fn run(config: &Config) -> Result<(), ChainError> {
    let mut blockchain = Blockchain::new(&config.key)?;
    for entry in &config.entries {
        blockchain.add_block(entry, &config.key)?;
    }
    blockchain.validate()?;
    info!("Built chain of {} block(s)", blockchain.len());

    for opened in blockchain.open_all(&config.key)? {
        print!("{}", opened);
    }
    Ok(())
}

fn main() -> ExitCode {
    env_logger::init();

    let config = match load_config() {
        Ok(config) => config,
        Err(e) => {
            error!("Invalid configuration: {}", e);
            return ExitCode::FAILURE;
        }
    };
    match run(&config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Failed to build chain: {}", e);
            ExitCode::FAILURE
        }
    }
}

// tarmac_sim/src/cli.rs

use bevy::prelude::Resource;
use clap::Parser;

/// Tarmac: drive a simulated vehicle on a flat test pad.
///
/// This struct defines the command-line arguments accepted by the
/// `tarmac_drive` binary.
#[derive(Parser, Debug, Resource, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Catalog key (e.g. `vehicles.sedan`) or path to a vehicle TOML file.
    #[arg(short, long, default_value = "vehicles.sedan")]
    pub vehicle: String,

    /// Simulated seconds to run before exiting.
    #[arg(short, long, default_value_t = 20.0)]
    pub duration: f64,

    /// Run without a window, stepping as fast as possible.
    #[arg(long, default_value_t = false)]
    pub headless: bool,

    /// Seed for the road-roughness generator. Random when omitted.
    #[arg(long)]
    pub seed: Option<u64>,

    /// Constant throttle applied by the scripted driver, [0, 1].
    #[arg(long, default_value_t = 0.6)]
    pub throttle: f64,

    /// Constant steering applied by the scripted driver, [-1, 1]. Positive turns left.
    #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
    pub steer: f64,

    /// Log the resolved vehicle configuration as TOML before driving.
    #[arg(long, default_value_t = false)]
    pub print_config: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_drive_the_stock_sedan() {
        let cli = Cli::parse_from(["tarmac_drive"]);
        assert_eq!(cli.vehicle, "vehicles.sedan");
        assert!(!cli.headless);
        assert!(cli.seed.is_none());
    }

    #[test]
    fn accepts_negative_steer() {
        let cli = Cli::parse_from(["tarmac_drive", "--headless", "--steer", "-0.5", "--seed", "7"]);
        assert!(cli.headless);
        assert_eq!(cli.steer, -0.5);
        assert_eq!(cli.seed, Some(7));
    }
}

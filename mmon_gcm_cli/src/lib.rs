//! Command line plumbing shared by the mmon-gcm binaries
use clap::Parser;

use mmon_gcm_core::supermodel::conditions::{
    parse_processes, parse_switch, LightColour, ValidationError,
};

/// Value parser for the light colour argument
pub fn light_colour(value: &str) -> Result<LightColour, ValidationError> {
    value.parse()
}

/// Value parser for the ATPase constraint switch
pub fn atpase_constraint(value: &str) -> Result<bool, ValidationError> {
    parse_switch("ATPase constraint", value)
}

/// Value parser for the starch knockout switch
pub fn starch_knockout(value: &str) -> Result<bool, ValidationError> {
    parse_switch("starch knockout", value)
}

/// Value parser for the number of cores
pub fn processes(value: &str) -> Result<usize, ValidationError> {
    parse_processes(value)
}

/// Parse the command line, exiting with code 1 on invalid arguments
///
/// Help and version requests exit with 0. Nothing has been loaded at this point.
pub fn parse_args<P: Parser>() -> P {
    match P::try_parse() {
        Ok(args) => args,
        Err(err) => {
            let code = if err.use_stderr() { 1 } else { 0 };
            let _ = err.print();
            std::process::exit(code)
        }
    }
}

/// Log to stderr at `info` unless `RUST_LOG` says otherwise
pub fn init_logging() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[derive(Parser, Debug)]
    struct Args {
        results_path: PathBuf,
        #[arg(value_parser = light_colour)]
        light_colour: LightColour,
        #[arg(value_parser = starch_knockout, action = clap::ArgAction::Set)]
        starch_knockout: bool,
        #[arg(value_parser = processes)]
        no_cores: usize,
    }

    #[test]
    fn parses_valid_arguments() {
        let args = Args::try_parse_from(["test", "out/results.csv", "nops", "True", "4"]).unwrap();
        assert_eq!(args.light_colour, LightColour::NoPhotosynthesisGc);
        assert!(args.starch_knockout);
        assert_eq!(args.no_cores, 4);
    }

    #[test]
    fn rejects_invalid_arguments() {
        let err = Args::try_parse_from(["test", "out/results.csv", "purple", "True", "4"]).unwrap_err();
        assert!(err.to_string().contains("purple"));
        assert!(Args::try_parse_from(["test", "out/results.csv", "blue", "yes", "4"]).is_err());
        assert!(Args::try_parse_from(["test", "out/results.csv", "blue", "False", "0"]).is_err());
    }
}

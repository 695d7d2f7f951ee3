//! CLI argument definitions.

use clap::Parser;
use in_toto_sign::signer::SignMode;
use in_toto_sign::workflow::{Config, Operator};
use std::path::PathBuf;

/// Add, replace or verify signatures on in-toto layout and link metadata.
#[derive(Parser, Debug)]
#[command(name = "in-toto-sign", version)]
#[command(
    about = "Signs link or layout metadata with or without replacing the existing signatures, \
             and dumps it with or without the signing key id infixed in the file name"
)]
pub struct Cli {
    /// Sign or verify
    #[arg(value_enum, ignore_case = true)]
    pub operator: Operator,

    /// Path to the signable file
    pub signablepath: PathBuf,

    /// Replace all the old signatures instead of adding to them
    #[arg(short = 'r', long)]
    pub replace_sig: bool,

    /// Infix the signing key id in the output file name:
    /// <name>.<keyid:8>.link|layout
    #[arg(short, long)]
    pub infix: bool,

    /// Base name of the output file when --infix is given
    #[arg(short, long, value_name = "NAME")]
    pub destination: Option<String>,

    /// Path to the key file(s). When signing with several keys, --infix
    /// names the output after the last one
    #[arg(short, long, required = true, num_args = 1.., value_name = "PATH")]
    pub keys: Vec<PathBuf>,

    /// Verbose execution
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    pub fn into_config(self) -> Config {
        let mut config = Config::new(self.operator, self.signablepath, self.keys);
        config.mode = if self.replace_sig {
            SignMode::Replace
        } else {
            SignMode::Append
        };
        config.infix = self.infix;
        config.destination = self.destination;
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Cli, clap::Error> {
        Cli::try_parse_from(std::iter::once("in-toto-sign").chain(args.iter().copied()))
    }

    #[test]
    fn test_required_args() {
        let cli = parse(&["sign", "root.layout", "-r", "--keys", "alice"]).unwrap();
        assert_eq!(cli.operator, Operator::Sign);
        assert!(cli.replace_sig);
        assert_eq!(cli.keys, vec![PathBuf::from("alice")]);

        let cli = parse(&["verify", "root.layout", "--keys", "alice.pub"]).unwrap();
        assert_eq!(cli.operator, Operator::Verify);
    }

    #[test]
    fn test_optional_args() {
        let cli = parse(&[
            "sign", "package.link", "-i", "-d", "out", "-v", "-k", "alice", "bob",
        ])
        .unwrap();
        assert!(cli.infix);
        assert!(cli.verbose);
        assert_eq!(cli.destination.as_deref(), Some("out"));
        assert_eq!(cli.keys, vec![PathBuf::from("alice"), PathBuf::from("bob")]);

        let config = cli.into_config();
        assert_eq!(config.mode, SignMode::Append);
        assert_eq!(config.output_dir, PathBuf::from("."));
    }

    #[test]
    fn test_operator_ignores_case() {
        let cli = parse(&["SIGN", "root.layout", "--keys", "alice"]).unwrap();
        assert_eq!(cli.operator, Operator::Sign);
    }

    #[test]
    fn test_wrong_args() {
        let wrong = [
            vec![],
            vec!["random"],
            vec!["sign", "--keys", "alice.pub"],
            vec!["verify", "root.layout"],
            vec!["sign", "-i", "-d", "out", "--keys", "alice"],
            vec!["publish", "root.layout", "--keys", "alice"],
        ];
        for args in wrong {
            assert!(parse(&args).is_err(), "{args:?} should not parse");
        }
    }
}

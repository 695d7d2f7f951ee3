//! One invocation of the tool: classify, sign or verify, then write or
//! report.
//!
//! [`run`] never exits the process. It returns an [`Outcome`] carrying the
//! exit code and the message to show.

use crate::document::{classify_and_load, DocumentKind};
use crate::error::{Result, SignError};
use crate::naming::{output_filename, Naming};
use crate::signer::{sign_document, SignMode};
use crate::verifier::Verifier;
use std::fmt;
use std::path::PathBuf;
use tracing::{debug, info, warn};

/// Exit status for a completed sign or a passed verification.
pub const EXIT_SUCCESS: i32 = 0;
/// Exit status when signing failed or a signature did not verify.
pub const EXIT_FAILURE: i32 = 1;
/// Exit status when verification could not be carried out.
pub const EXIT_ERROR: i32 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Operator {
    Sign,
    Verify,
}

/// Everything one invocation needs.
#[derive(Debug, Clone)]
pub struct Config {
    pub operator: Operator,
    pub signable_path: PathBuf,
    pub mode: SignMode,
    pub infix: bool,
    pub destination: Option<String>,
    pub key_paths: Vec<PathBuf>,
    /// Directory signed output is written to.
    pub output_dir: PathBuf,
}

impl Config {
    pub fn new(
        operator: Operator,
        signable_path: impl Into<PathBuf>,
        key_paths: Vec<PathBuf>,
    ) -> Self {
        Self {
            operator,
            signable_path: signable_path.into(),
            mode: SignMode::Append,
            infix: false,
            destination: None,
            key_paths,
            output_dir: PathBuf::from("."),
        }
    }
}

/// Result of one invocation.
#[derive(Debug)]
pub enum Outcome {
    Signed { kind: DocumentKind, path: PathBuf },
    SignFailed(SignError),
    Verified,
    VerificationFailed(SignError),
    VerifyError(SignError),
}

impl Outcome {
    pub fn exit_code(&self) -> i32 {
        match self {
            Outcome::Signed { .. } | Outcome::Verified => EXIT_SUCCESS,
            Outcome::SignFailed(_) | Outcome::VerificationFailed(_) => EXIT_FAILURE,
            Outcome::VerifyError(_) => EXIT_ERROR,
        }
    }

    pub fn is_success(&self) -> bool {
        self.exit_code() == EXIT_SUCCESS
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Signed { kind, path } => {
                write!(f, "Signed {kind} written to {}", path.display())
            }
            Outcome::SignFailed(e) => write!(f, "Unable to sign. Error occurred - {e}"),
            Outcome::Verified => f.write_str("Successfully verified."),
            Outcome::VerificationFailed(e) => write!(f, "Verification failed. {e}"),
            Outcome::VerifyError(e) => {
                write!(f, "The following error occurred while verification - {e}")
            }
        }
    }
}

/// Run the operation `config` asks for.
pub fn run(config: &Config) -> Outcome {
    let outcome = match config.operator {
        Operator::Sign => match sign(config) {
            Ok((kind, path)) => Outcome::Signed { kind, path },
            Err(e) => Outcome::SignFailed(e),
        },
        Operator::Verify => match verify(config) {
            Ok(()) => Outcome::Verified,
            Err(e) if e.is_verification_failure() => Outcome::VerificationFailed(e),
            Err(e) => Outcome::VerifyError(e),
        },
    };

    debug!(exit_code = outcome.exit_code(), "{outcome}");
    outcome
}

/// Sign path. The output file is written once, after every key is applied.
pub fn sign(config: &Config) -> Result<(DocumentKind, PathBuf)> {
    let document = classify_and_load(&config.signable_path)?;
    let signed = sign_document(document, &config.key_paths, config.mode)?;

    if config.destination.is_some() && !config.infix {
        warn!("--destination only applies together with --infix; ignoring it");
    }

    let naming = match (config.infix, signed.naming_key_id()) {
        (false, _) => Naming::Default,
        (true, Some(keyid)) => Naming::Infix {
            keyid,
            destination: config.destination.as_deref(),
        },
        (true, None) => {
            return Err(SignError::MalformedKey(
                "no signing key given to name the output after".to_string(),
            ))
        }
    };

    let filename = output_filename(&signed.document, &config.signable_path, naming)?;
    let path = config.output_dir.join(filename);
    signed.document.dump(&path)?;
    info!(
        path = %path.display(),
        signatures = signed.document.signatures().len(),
        "wrote signed document"
    );

    Ok((signed.document.kind(), path))
}

/// Verify path. Nothing is written.
pub fn verify(config: &Config) -> Result<()> {
    Verifier::verify_file(&config.signable_path, &config.key_paths)
}

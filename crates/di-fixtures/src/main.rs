//! Generates Data Integrity BIP-340 test vectors: key pairs, signed documents with
//! every intermediate value, and `previousProof` conformance chains.

use anyhow::{Context as _, Result, anyhow, bail};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand, ValueEnum};
use data_integrity_bip340::chain::conformance_fixtures;
use data_integrity_bip340::{
    AuxRandomness, ContextPolicy, CryptoSuite, CryptoSuiteName, Document, KeyPair,
    ProblemDetails as _, ProofField, ProofOptions, RdfcCanonicalizer, ReferencePolicy,
    SecuredDocument, StaticContextLoader, VerificationResult, VerifyOptions,
    instantiate_cryptosuite,
};
use normalizer::CommandNormalizer;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

mod normalizer;

/// Creation time used by the published test vectors
const FIXTURE_CREATED: &str = "2023-02-24T23:36:38Z";

#[derive(Parser, Debug)]
#[command(name = "di-fixtures", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// External RDF canonicalizer: reads JSON-LD on stdin, writes N-Quads to stdout.
    /// Required for bip340-rdfc-2025.
    #[arg(long, global = true)]
    normalizer: Option<String>,

    /// Preload a JSON-LD context as URL=PATH. Repeatable.
    #[arg(long = "context", value_name = "URL=PATH", global = true)]
    contexts: Vec<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Generate a secp256k1 key pair
    Keygen {
        /// Where to write the key pair JSON
        #[arg(long)]
        output: PathBuf,
    },

    /// Check that a key pair's public key matches its private key
    CheckKey {
        #[arg(long)]
        keys: PathBuf,
    },

    /// Sign a document and write every intermediate value
    Sign {
        /// Unsigned document
        #[arg(long)]
        input: PathBuf,

        /// Key pair JSON
        #[arg(long)]
        keys: PathBuf,

        #[arg(long, value_enum, default_value_t = Suite::Jcs)]
        suite: Suite,

        /// Directory for the artifacts
        #[arg(long)]
        output: PathBuf,

        #[command(flatten)]
        proof: ProofArgs,
    },

    /// Build the previousProof conformance chains
    Chain {
        /// Unsigned document
        #[arg(long)]
        input: PathBuf,

        /// Credential data model version used in file names, e.g. 2.0
        #[arg(long, default_value = "2.0")]
        data_model: String,

        /// Key pair JSON for each proof in the chain, in order
        #[arg(long = "keys", required = true)]
        keys: Vec<PathBuf>,

        #[arg(long, value_enum, default_value_t = Suite::Jcs)]
        suite: Suite,

        /// Directory for the signed documents
        #[arg(long)]
        output: PathBuf,

        #[command(flatten)]
        proof: ProofArgs,
    },

    /// Verify a signed document or proof set
    Verify {
        /// Signed document
        #[arg(long)]
        input: PathBuf,

        /// Fail when the document context differs from a JCS proof's context
        #[arg(long)]
        strict_context: bool,

        /// Match numeric previousProof references by their string form
        #[arg(long)]
        lenient_references: bool,
    },
}

#[derive(clap::Args, Debug)]
struct ProofArgs {
    /// Proof creation time (RFC 3339); defaults to the test vector time
    #[arg(long, default_value = FIXTURE_CREATED)]
    created: DateTime<Utc>,

    /// Use fresh auxiliary randomness instead of the all-0xFF fixture value
    #[arg(long)]
    secure_aux: bool,
}

impl ProofArgs {
    fn options(&self) -> ProofOptions {
        let aux_randomness = if self.secure_aux {
            AuxRandomness::Secure
        } else {
            AuxRandomness::fixture()
        };

        ProofOptions::new()
            .with_created(self.created)
            .with_aux_randomness(aux_randomness)
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Suite {
    Jcs,
    Rdfc,
}

impl From<Suite> for CryptoSuiteName {
    fn from(suite: Suite) -> Self {
        match suite {
            Suite::Jcs => Self::Jcs,
            Suite::Rdfc => Self::Rdfc,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("info"),
        _ => EnvFilter::new("debug"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<ExitCode> {
    match &cli.command {
        Commands::Keygen { output } => {
            let key_pair = KeyPair::generate();
            key_pair.to_file(output)?;

            println!("publicKeyMultibase: {}", key_pair.public_key_multibase);
            println!("x-only Multikey:    {}", key_pair.x_only_multikey()?);
            info!(path = %output.display(), "wrote key pair");
        }

        Commands::CheckKey { keys } => {
            let key_pair = KeyPair::from_file(keys)?;
            key_pair.check()?;

            println!("x-only public key: {}", hex::encode(key_pair.x_only_public_key()?));
            println!("key pair is consistent");
        }

        Commands::Sign {
            input,
            keys,
            suite,
            output,
            proof,
        } => {
            let suite = cli.cryptosuite((*suite).into())?;
            let document = Document::from_file(input)?;
            let key_pair = KeyPair::from_file(keys)?;

            let (secured, trace) =
                suite.create_proof_with_trace(&document, &key_pair, &proof.options())?;
            trace.write_to_dir(output, &secured)?;

            println!("{}", secured.to_json_string()?);
        }

        Commands::Chain {
            input,
            data_model,
            keys,
            suite,
            output,
            proof,
        } => {
            let suite = cli.cryptosuite((*suite).into())?;
            let document = Document::from_file(input)?;
            let chain_keys = keys
                .iter()
                .map(KeyPair::from_file)
                .collect::<Result<Vec<_>, _>>()?;

            std::fs::create_dir_all(output)?;

            for fixture in conformance_fixtures(data_model) {
                let secured = fixture.build(&suite, &document, &chain_keys, &proof.options())?;
                let path = output.join(format!("{}.json", fixture.name));
                secured.to_file(&path)?;

                info!(path = %path.display(), "wrote chain fixture");
            }
        }

        Commands::Verify {
            input,
            strict_context,
            lenient_references,
        } => {
            let secured = SecuredDocument::from_file(input)?;
            let name = secured
                .proofs()
                .first()
                .map(|proof| proof.config.cryptosuite)
                .ok_or_else(|| anyhow!("{} has an empty proof set", input.display()))?;
            let suite = cli.cryptosuite(name)?;

            let mut options = VerifyOptions::new();
            if *strict_context {
                options = options.with_context_policy(ContextPolicy::Strict);
            }
            if *lenient_references {
                options = options.with_reference_policy(ReferencePolicy::Lenient);
            }

            let results = match secured.proof() {
                ProofField::Single(_) => vec![suite.verify_proof(&secured, &options)],
                ProofField::Set(_) => match suite.verify_proof_set(&secured, &options) {
                    Ok(verification) => verification.results.into_iter().map(Ok).collect(),
                    Err(e) => vec![Err(e)],
                },
            };

            let mut verified = true;
            for result in results {
                match result {
                    Ok(result) => verified &= report(&result),
                    Err(e) => {
                        println!("error: {}", e.details().unwrap_or_default());
                        verified = false;
                    }
                }
            }

            if !verified {
                return Ok(ExitCode::FAILURE);
            }
        }
    }

    Ok(ExitCode::SUCCESS)
}

impl Cli {
    fn cryptosuite(&self, name: CryptoSuiteName) -> Result<CryptoSuite> {
        let rdfc = match (&self.normalizer, name) {
            (Some(command_line), CryptoSuiteName::Rdfc) => {
                let normalizer = CommandNormalizer::from_command_line(command_line)
                    .ok_or_else(|| anyhow!("--normalizer is empty"))?;
                Some(RdfcCanonicalizer::new(normalizer, self.context_loader()?))
            }
            _ => None,
        };

        Ok(instantiate_cryptosuite(name.as_str(), rdfc)?)
    }

    fn context_loader(&self) -> Result<StaticContextLoader> {
        let mut loader = StaticContextLoader::new();

        for entry in &self.contexts {
            let Some((url, path)) = entry.split_once('=') else {
                bail!("--context expects URL=PATH, got `{entry}`");
            };

            debug!(url, path, "preloading context");
            loader = loader
                .with_context_file(url, Path::new(path))
                .with_context(|| format!("loading context {url}"))?;
        }

        Ok(loader)
    }
}

fn report(result: &VerificationResult) -> bool {
    for mismatch in &result.context_mismatches {
        println!("context mismatch: {mismatch}");
    }

    if result.verified {
        println!("verified");
    } else {
        for failure in &result.failures {
            println!("not verified ({}): {failure}", failure.code());
        }
    }

    result.verified
}

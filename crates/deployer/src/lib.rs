pub mod arguments;
pub mod chain;
pub mod config;
pub mod deploy;

use {
    crate::{
        arguments::Arguments,
        chain::Node,
        config::Target,
        deploy::{Deployer, DeploymentResult},
    },
    anyhow::{Context, Result},
    clap::{Parser, error::ErrorKind},
    contracts::ArtifactStore,
    std::{io::Write, process::ExitCode},
};

/// Process exit status of a deployment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exit {
    Success,
    Failure,
}

impl Exit {
    pub fn code(self) -> u8 {
        match self {
            Self::Success => 0,
            Self::Failure => 1,
        }
    }
}

impl From<Exit> for ExitCode {
    fn from(exit: Exit) -> Self {
        ExitCode::from(exit.code())
    }
}

pub async fn start(args: impl Iterator<Item = String>) -> ExitCode {
    let args = match parse(args, &mut std::io::stderr()) {
        Ok(args) => args,
        Err(exit) => return exit.into(),
    };
    observe::tracing::initialize(&observe::Config::new(
        &args.logging.log_filter,
        args.logging.log_stderr_threshold,
        args.logging.use_json_logs,
    ));
    tracing::info!("running deployer with validated arguments:\n{}", args);

    let outcome = run(args).await;
    report(outcome, &mut std::io::stdout(), &mut std::io::stderr()).into()
}

/// Parses the command line. Invalid arguments are a failed deployment like
/// any other, only help and version requests exit through clap.
fn parse(
    args: impl Iterator<Item = String>,
    stderr: &mut impl Write,
) -> Result<Arguments, Exit> {
    Arguments::try_parse_from(args).map_err(|err| match err.kind() {
        ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => err.exit(),
        _ => {
            let _ = write!(stderr, "{err}");
            Exit::Failure
        }
    })
}

/// Resolves the contract, connects to the node and deploys.
pub async fn run(args: Arguments) -> Result<DeploymentResult> {
    let target = Target::from_arguments(&args).await?;
    let factory = ArtifactStore::new(args.artifacts.clone())
        .resolve(&args.contract)
        .context("failed to resolve contract factory")?;
    if let Some(network) = &target.network {
        tracing::info!(%network, "using configured network");
    }
    let node = Node::connect(&target.url, target.signer).await?;

    Deployer::new(node)
        .with_confirmations(args.confirmations)
        .with_timeout(args.confirmation_timeout)
        .with_expected_chain_id(target.chain_id)
        .deploy(&factory, &args.constructor_args)
        .await
}

/// Prints the outcome of a deployment. Only a deployment whose address was
/// printed results in [`Exit::Success`].
pub fn report(
    outcome: Result<DeploymentResult>,
    stdout: &mut impl Write,
    stderr: &mut impl Write,
) -> Exit {
    let err = match outcome {
        Ok(deployment) => match writeln!(
            stdout,
            "✅ {} deployed to: {}",
            deployment.contract, deployment.address
        ) {
            Ok(()) => return Exit::Success,
            Err(err) => anyhow::Error::new(err).context(format!(
                "{} was deployed to {} but the address could not be printed",
                deployment.contract, deployment.address
            )),
        },
        Err(err) => err,
    };
    // Nothing left to report to if stderr is gone as well.
    let _ = writeln!(stderr, "❌ Deployment failed: {err:#}");
    Exit::Failure
}

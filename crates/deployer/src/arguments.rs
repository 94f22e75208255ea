use {
    alloy::signers::local::PrivateKeySigner,
    std::{
        fmt::{self, Display, Formatter},
        path::PathBuf,
        time::Duration,
    },
    tracing::level_filters::LevelFilter,
    url::Url,
};

#[derive(clap::Parser)]
pub struct LoggingArguments {
    #[clap(long, env, default_value = "warn,deployer=debug,contracts=debug")]
    pub log_filter: String,

    /// Log events at this level or more severe are written to stderr.
    #[clap(long, env, default_value = "error")]
    pub log_stderr_threshold: LevelFilter,

    /// Output log events as JSON.
    #[clap(long, env, default_value = "false", action = clap::ArgAction::Set)]
    pub use_json_logs: bool,
}

impl Display for LoggingArguments {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let Self {
            log_filter,
            log_stderr_threshold,
            use_json_logs,
        } = self;

        writeln!(f, "log_filter: {log_filter}")?;
        writeln!(f, "log_stderr_threshold: {log_stderr_threshold}")?;
        writeln!(f, "use_json_logs: {use_json_logs}")?;
        Ok(())
    }
}

/// Deploy a compiled contract and print its address
#[derive(clap::Parser)]
#[command(version)]
pub struct Arguments {
    #[clap(flatten)]
    pub logging: LoggingArguments,

    /// The contract to deploy. Either a bare contract name or a fully
    /// qualified `path/To.sol:Name` if the name alone is ambiguous.
    #[clap(long, env, default_value = "UniVote")]
    pub contract: String,

    /// Root of the build artifacts tree (`artifacts` for Hardhat, `out` for
    /// Foundry).
    #[clap(long, env, default_value = "artifacts")]
    pub artifacts: PathBuf,

    /// Constructor arguments in the following format: `<ARG>,<ARG>`. Each one
    /// is parsed according to the constructor's parameter type.
    #[clap(long, env, use_value_delimiter = true)]
    pub constructor_args: Vec<String>,

    /// The Ethereum node URL to connect to.
    #[clap(long, env, default_value = "http://localhost:8545")]
    pub node_url: Url,

    /// Private key of the account paying for the deployment. Without one the
    /// first account unlocked on the node is used.
    #[clap(long, env)]
    pub private_key: Option<PrivateKeySigner>,

    /// Path to a network configuration file in TOML format.
    #[clap(long, env)]
    pub config: Option<PathBuf>,

    /// Network from the configuration file to deploy to. Overrides
    /// `--node-url` and `--private-key`.
    #[clap(long, env, requires = "config")]
    pub network: Option<String>,

    /// Number of confirmations to wait for before the contract counts as
    /// deployed.
    #[clap(
        long,
        env,
        default_value = "1",
        value_parser = clap::value_parser!(u64).range(1..),
    )]
    pub confirmations: u64,

    /// Give up waiting for the confirmations after this long, e.g. `5m`.
    #[clap(long, env, value_parser = humantime::parse_duration)]
    pub confirmation_timeout: Option<Duration>,
}

impl Display for Arguments {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let Self {
            logging,
            contract,
            artifacts,
            constructor_args,
            node_url,
            private_key,
            config,
            network,
            confirmations,
            confirmation_timeout,
        } = self;

        write!(f, "{logging}")?;
        writeln!(f, "contract: {contract}")?;
        writeln!(f, "artifacts: {}", artifacts.display())?;
        writeln!(f, "constructor_args: {constructor_args:?}")?;
        writeln!(f, "node_url: {node_url}")?;
        display_secret_option(f, "private_key", private_key)?;
        display_option(f, "config", &config.as_ref().map(|path| path.display()))?;
        display_option(f, "network", network)?;
        writeln!(f, "confirmations: {confirmations}")?;
        display_option(
            f,
            "confirmation_timeout",
            &confirmation_timeout.map(humantime::format_duration),
        )?;
        Ok(())
    }
}

pub fn display_secret_option<T>(
    f: &mut Formatter<'_>,
    name: &str,
    option: &Option<T>,
) -> fmt::Result {
    display_option(f, name, &option.as_ref().map(|_| "SECRET"))
}

pub fn display_option(
    f: &mut Formatter<'_>,
    name: &str,
    option: &Option<impl Display>,
) -> fmt::Result {
    write!(f, "{name}: ")?;
    match option {
        Some(display) => writeln!(f, "{display}"),
        None => writeln!(f, "None"),
    }
}

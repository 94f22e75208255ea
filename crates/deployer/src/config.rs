//! Network configuration file.
//!
//! ```toml
//! [networks.sepolia]
//! url = "https://rpc.sepolia.org"
//! chain-id = 11155111
//! private-key = "%SEPOLIA_PRIVATE_KEY"
//! ```

use {
    crate::arguments::Arguments,
    alloy::signers::local::PrivateKeySigner,
    anyhow::{Context, Result},
    serde::{Deserialize, Deserializer},
    std::{collections::BTreeMap, fmt, path::Path},
    url::Url,
};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub networks: BTreeMap<String, Network>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct Network {
    /// JSON-RPC endpoint of the network.
    pub url: Url,

    /// Chain ID the node at `url` is expected to report.
    pub chain_id: Option<u64>,

    /// Key of the deploying account. Values starting with `%` name an
    /// environment variable holding the key.
    #[serde(default, deserialize_with = "deserialize_private_key")]
    pub private_key: Option<PrivateKey>,
}

/// A private key as read from the configuration. Never printed.
#[derive(Clone)]
pub struct PrivateKey(String);

impl PrivateKey {
    pub fn signer(&self) -> Result<PrivateKeySigner> {
        // Not including the parse error, it could leak the key.
        self.0
            .trim()
            .parse::<PrivateKeySigner>()
            .ok()
            .context("configured private key is not a valid secp256k1 key")
    }
}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SECRET")
    }
}

fn deserialize_private_key<'de, D>(deserializer: D) -> Result<Option<PrivateKey>, D::Error>
where
    D: Deserializer<'de>,
{
    let Some(raw) = Option::<String>::deserialize(deserializer)? else {
        return Ok(None);
    };
    match raw.strip_prefix('%') {
        Some(env_var_name) => {
            let key = std::env::var(env_var_name).map_err(|err| {
                tracing::error!(%err, %env_var_name, "failed to load env var");
                serde::de::Error::invalid_value(
                    serde::de::Unexpected::Str(env_var_name),
                    &"expected environment variable to be available",
                )
            })?;
            Ok(Some(PrivateKey(key)))
        }
        None => Ok(Some(PrivateKey(raw))),
    }
}

impl Config {
    pub fn from_toml(data: &str) -> Result<Self> {
        // Not printing detailed error because it could leak private keys.
        toml::de::from_str::<Self>(data)
            .ok()
            .context("invalid network configuration")
    }

    pub async fn load(path: &Path) -> Result<Self> {
        let data = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("I/O error while reading {path:?}"))?;
        Self::from_toml(&data).with_context(|| format!("failed to load {path:?}"))
    }

    pub fn network(&self, name: &str) -> Result<&Network> {
        self.networks.get(name).with_context(|| {
            let known = self.networks.keys().cloned().collect::<Vec<_>>();
            format!("unknown network {name:?}, configured networks: {known:?}")
        })
    }
}

/// Where and as whom to deploy.
#[derive(Debug)]
pub struct Target {
    pub network: Option<String>,
    pub url: Url,
    pub signer: Option<PrivateKeySigner>,
    pub chain_id: Option<u64>,
}

impl Target {
    /// Combines the command line arguments with the selected network of the
    /// configuration file, if any.
    pub async fn from_arguments(args: &Arguments) -> Result<Self> {
        let Some(name) = &args.network else {
            return Ok(Self {
                network: None,
                url: args.node_url.clone(),
                signer: args.private_key.clone(),
                chain_id: None,
            });
        };
        let path = args
            .config
            .as_deref()
            .context("a network can only be selected together with a configuration file")?;
        let config = Config::load(path).await?;
        let network = config.network(name)?;
        let signer = match &network.private_key {
            Some(key) => Some(key.signer()?),
            None => args.private_key.clone(),
        };
        Ok(Self {
            network: Some(name.clone()),
            url: network.url.clone(),
            signer,
            chain_id: network.chain_id,
        })
    }
}

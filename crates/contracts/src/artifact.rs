use {
    crate::factory::ContractFactory,
    alloy::{json_abi::JsonAbi, primitives::hex::FromHexError},
    serde::Deserialize,
    std::{
        collections::BTreeMap,
        path::{Path, PathBuf},
    },
    walkdir::WalkDir,
};

/// Directory with the compiler's raw build info. Never contains contract
/// artifacts.
const BUILD_INFO_DIR: &str = "build-info";

#[derive(Debug, thiserror::Error)]
pub enum ArtifactError {
    #[error("artifact directory {0:?} does not exist, compile the contracts first")]
    MissingDirectory(PathBuf),
    #[error("artifact for contract {name} not found in {root:?}")]
    NotFound { name: String, root: PathBuf },
    #[error(
        "multiple artifacts for contract {name}, use one of the fully qualified names: {}",
        .candidates.join(", ")
    )]
    Ambiguous {
        name: String,
        candidates: Vec<String>,
    },
    #[error("failed to read {path:?}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed artifact {path:?}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid bytecode for contract {contract}")]
    Bytecode {
        contract: String,
        #[source]
        source: FromHexError,
    },
    #[error("contract {0} is abstract or an interface and can't be deployed")]
    NotDeployable(String),
    #[error(
        "contract {contract} is missing links for the following libraries: {}",
        .libraries.join(", ")
    )]
    UnlinkedLibraries {
        contract: String,
        libraries: Vec<String>,
    },
    #[error("invalid constructor arguments for contract {contract}: {reason}")]
    ConstructorArguments { contract: String, reason: String },
}

/// A compiled contract as found in a JSON build artifact.
#[derive(Debug, Clone)]
pub struct Artifact {
    pub contract_name: String,
    /// Path of the Solidity source the contract is defined in, relative to
    /// the project root.
    pub source_name: Option<String>,
    pub abi: JsonAbi,
    /// Creation bytecode as hex. Still contains placeholders if libraries
    /// need to be linked.
    pub bytecode: String,
    /// Fully qualified names of libraries the bytecode needs linked.
    pub unlinked_libraries: Vec<String>,
}

/// source name -> library name -> offsets
type LinkReferences = BTreeMap<String, BTreeMap<String, serde_json::Value>>;

#[derive(Deserialize)]
#[serde(untagged)]
enum RawBytecode {
    /// Hardhat
    Hex(String),
    /// Foundry
    Object {
        object: String,
        #[serde(default, rename = "linkReferences")]
        link_references: LinkReferences,
    },
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawArtifact {
    contract_name: Option<String>,
    source_name: Option<String>,
    abi: JsonAbi,
    bytecode: RawBytecode,
    #[serde(default)]
    link_references: LinkReferences,
    metadata: Option<serde_json::Value>,
}

impl RawArtifact {
    /// Foundry artifacts only name their contract in the compiler metadata:
    /// `settings.compilationTarget = { "<source>": "<name>" }`.
    fn compilation_target(&self) -> Option<(String, String)> {
        let targets = self
            .metadata
            .as_ref()?
            .get("settings")?
            .get("compilationTarget")?
            .as_object()?;
        let (source, name) = targets.iter().next()?;
        Some((source.clone(), name.as_str()?.to_owned()))
    }
}

impl Artifact {
    /// Parses an artifact. `fallback_name` is used as the contract name if
    /// the artifact itself doesn't carry one.
    pub fn from_json(json: &str, fallback_name: &str) -> Result<Self, serde_json::Error> {
        let raw: RawArtifact = serde_json::from_str(json)?;
        let target = raw.compilation_target();
        let contract_name = raw
            .contract_name
            .clone()
            .or_else(|| target.as_ref().map(|(_, name)| name.clone()))
            .unwrap_or_else(|| fallback_name.to_owned());
        let source_name = raw
            .source_name
            .clone()
            .or_else(|| target.map(|(source, _)| source));

        let (bytecode, mut link_references) = match raw.bytecode {
            RawBytecode::Hex(hex) => (hex, BTreeMap::new()),
            RawBytecode::Object {
                object,
                link_references,
            } => (object, link_references),
        };
        link_references.extend(raw.link_references);
        let unlinked_libraries = link_references
            .into_iter()
            .flat_map(|(source, libraries)| {
                libraries
                    .into_keys()
                    .map(move |library| format!("{source}:{library}"))
            })
            .collect();

        Ok(Self {
            contract_name,
            source_name,
            abi: raw.abi,
            bytecode,
            unlinked_libraries,
        })
    }

    pub fn from_file(path: &Path) -> Result<Self, ArtifactError> {
        let json = std::fs::read_to_string(path).map_err(|source| ArtifactError::Io {
            path: path.to_owned(),
            source,
        })?;
        let stem = path
            .file_stem()
            .map(|stem| stem.to_string_lossy())
            .unwrap_or_default();
        Self::from_json(&json, &stem).map_err(|source| ArtifactError::Json {
            path: path.to_owned(),
            source,
        })
    }

    /// `<source>:<name>` if the source is known, the bare name otherwise.
    pub fn qualified_name(&self) -> String {
        match &self.source_name {
            Some(source) => format!("{source}:{}", self.contract_name),
            None => self.contract_name.clone(),
        }
    }
}

/// A directory tree of build artifacts.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    root: PathBuf,
}

impl ArtifactStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Finds the artifact of a contract. `name` is either a bare contract
    /// name or a fully qualified `path/To.sol:Name`.
    pub fn find(&self, name: &str) -> Result<Artifact, ArtifactError> {
        if !self.root.is_dir() {
            return Err(ArtifactError::MissingDirectory(self.root.clone()));
        }

        let (source, contract) = match name.rsplit_once(':') {
            Some((source, contract)) => (Some(source), contract),
            None => (None, name),
        };
        let file_name = format!("{contract}.json");

        let mut candidates = Vec::new();
        let entries = WalkDir::new(&self.root)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| entry.file_name() != BUILD_INFO_DIR);
        for entry in entries {
            let entry = entry.map_err(|err| ArtifactError::Io {
                path: err
                    .path()
                    .map(Path::to_owned)
                    .unwrap_or_else(|| self.root.clone()),
                source: err.into(),
            })?;
            if !entry.file_type().is_file() || entry.file_name() != file_name.as_str() {
                continue;
            }
            let artifact = Artifact::from_file(entry.path())?;
            if artifact.contract_name != contract
                || source.is_some_and(|source| artifact.source_name.as_deref() != Some(source))
            {
                continue;
            }
            tracing::debug!(path = ?entry.path(), "found artifact");
            candidates.push(artifact);
        }

        match candidates.len() {
            0 => Err(ArtifactError::NotFound {
                name: name.to_owned(),
                root: self.root.clone(),
            }),
            1 => Ok(candidates.remove(0)),
            _ => Err(ArtifactError::Ambiguous {
                name: name.to_owned(),
                candidates: candidates.iter().map(Artifact::qualified_name).collect(),
            }),
        }
    }

    /// Resolves the contract factory for a contract name.
    pub fn resolve(&self, name: &str) -> Result<ContractFactory, ArtifactError> {
        self.find(name)?.try_into()
    }
}

#[cfg(test)]
mod tests {
    use {super::*, std::fs};

    const UNIVOTE: &str = r#"{
        "_format": "hh-sol-artifact-1",
        "contractName": "UniVote",
        "sourceName": "contracts/UniVote.sol",
        "abi": [],
        "bytecode": "0x6080604052348015600f57600080fd5b50",
        "deployedBytecode": "0x6080",
        "linkReferences": {},
        "deployedLinkReferences": {}
    }"#;

    fn write(root: &Path, relative: &str, contents: &str) {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
    }

    fn hardhat_artifact(source: &str, name: &str) -> String {
        format!(
            r#"{{
                "_format": "hh-sol-artifact-1",
                "contractName": "{name}",
                "sourceName": "{source}",
                "abi": [],
                "bytecode": "0x00",
                "linkReferences": {{}}
            }}"#
        )
    }

    #[test]
    fn parses_hardhat_artifact() {
        let artifact = Artifact::from_json(UNIVOTE, "ignored").unwrap();
        assert_eq!(artifact.contract_name, "UniVote");
        assert_eq!(artifact.source_name.as_deref(), Some("contracts/UniVote.sol"));
        assert_eq!(artifact.bytecode, "0x6080604052348015600f57600080fd5b50");
        assert!(artifact.unlinked_libraries.is_empty());
        assert_eq!(artifact.qualified_name(), "contracts/UniVote.sol:UniVote");
    }

    #[test]
    fn parses_foundry_artifact() {
        let json = r#"{
            "abi": [],
            "bytecode": {
                "object": "0x6080",
                "sourceMap": "",
                "linkReferences": {
                    "src/Tally.sol": { "Tally": [{ "start": 1, "length": 20 }] }
                }
            },
            "metadata": {
                "settings": { "compilationTarget": { "src/UniVote.sol": "UniVote" } }
            }
        }"#;
        let artifact = Artifact::from_json(json, "Fallback").unwrap();
        assert_eq!(artifact.contract_name, "UniVote");
        assert_eq!(artifact.source_name.as_deref(), Some("src/UniVote.sol"));
        assert_eq!(artifact.bytecode, "0x6080");
        assert_eq!(artifact.unlinked_libraries, vec!["src/Tally.sol:Tally"]);
    }

    #[test]
    fn uses_fallback_name_without_metadata() {
        let json = r#"{ "abi": [], "bytecode": { "object": "0x6080" } }"#;
        let artifact = Artifact::from_json(json, "UniVote").unwrap();
        assert_eq!(artifact.contract_name, "UniVote");
        assert_eq!(artifact.source_name, None);
    }

    #[test]
    fn finds_artifact_and_skips_debug_files() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "contracts/UniVote.sol/UniVote.json", UNIVOTE);
        write(
            dir.path(),
            "contracts/UniVote.sol/UniVote.dbg.json",
            r#"{ "_format": "hh-sol-dbg-1" }"#,
        );
        write(dir.path(), "build-info/UniVote.json", "not even json");

        let artifact = ArtifactStore::new(dir.path()).find("UniVote").unwrap();
        assert_eq!(artifact.contract_name, "UniVote");
    }

    #[test]
    fn ambiguous_names_need_qualification() {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            "contracts/UniVote.sol/UniVote.json",
            &hardhat_artifact("contracts/UniVote.sol", "UniVote"),
        );
        write(
            dir.path(),
            "contracts/legacy/UniVote.sol/UniVote.json",
            &hardhat_artifact("contracts/legacy/UniVote.sol", "UniVote"),
        );
        let store = ArtifactStore::new(dir.path());

        match store.find("UniVote") {
            Err(ArtifactError::Ambiguous { candidates, .. }) => assert_eq!(
                candidates,
                vec![
                    "contracts/UniVote.sol:UniVote",
                    "contracts/legacy/UniVote.sol:UniVote"
                ]
            ),
            other => panic!("unexpected result {other:?}"),
        }

        let artifact = store.find("contracts/legacy/UniVote.sol:UniVote").unwrap();
        assert_eq!(
            artifact.source_name.as_deref(),
            Some("contracts/legacy/UniVote.sol")
        );
    }

    #[test]
    fn missing_contract() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "contracts/UniVote.sol/UniVote.json", UNIVOTE);
        assert!(matches!(
            ArtifactStore::new(dir.path()).find("Ballot"),
            Err(ArtifactError::NotFound { .. })
        ));
    }

    #[test]
    fn missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            ArtifactStore::new(dir.path().join("artifacts")).find("UniVote"),
            Err(ArtifactError::MissingDirectory(_))
        ));
    }

    #[test]
    fn malformed_artifact() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "contracts/UniVote.sol/UniVote.json", "{");
        assert!(matches!(
            ArtifactStore::new(dir.path()).find("UniVote"),
            Err(ArtifactError::Json { .. })
        ));
    }

    #[test]
    fn resolves_factory() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "contracts/UniVote.sol/UniVote.json", UNIVOTE);
        let factory = ArtifactStore::new(dir.path()).resolve("UniVote").unwrap();
        assert_eq!(factory.name(), "UniVote");
        assert_eq!(factory.bytecode().len(), 17);
    }
}

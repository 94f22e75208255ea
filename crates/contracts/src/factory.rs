use {
    crate::artifact::{Artifact, ArtifactError},
    alloy::{
        dyn_abi::{JsonAbiExt, Specifier},
        json_abi::JsonAbi,
        primitives::{Bytes, hex},
    },
};

/// Produces creation transactions for a compiled contract.
#[derive(Debug, Clone)]
pub struct ContractFactory {
    name: String,
    abi: JsonAbi,
    bytecode: Bytes,
}

impl TryFrom<Artifact> for ContractFactory {
    type Error = ArtifactError;

    fn try_from(artifact: Artifact) -> Result<Self, Self::Error> {
        if !artifact.unlinked_libraries.is_empty() {
            return Err(ArtifactError::UnlinkedLibraries {
                contract: artifact.contract_name,
                libraries: artifact.unlinked_libraries,
            });
        }
        let bytecode =
            hex::decode(artifact.bytecode.trim()).map_err(|source| ArtifactError::Bytecode {
                contract: artifact.contract_name.clone(),
                source,
            })?;
        if bytecode.is_empty() {
            return Err(ArtifactError::NotDeployable(artifact.contract_name));
        }
        Ok(Self {
            name: artifact.contract_name,
            abi: artifact.abi,
            bytecode: bytecode.into(),
        })
    }
}

impl ContractFactory {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Creation bytecode without constructor arguments.
    pub fn bytecode(&self) -> &Bytes {
        &self.bytecode
    }

    /// Init code of the creation transaction: the creation bytecode followed
    /// by the ABI encoded constructor arguments. Arguments are coerced from
    /// their string representation to the parameter types of the
    /// constructor.
    pub fn deploy_code(&self, args: &[String]) -> Result<Bytes, ArtifactError> {
        let invalid = |reason: String| ArtifactError::ConstructorArguments {
            contract: self.name.clone(),
            reason,
        };

        let encoded = match &self.abi.constructor {
            None if args.is_empty() => Vec::new(),
            None => {
                return Err(invalid(format!(
                    "contract has no constructor but {} arguments were given",
                    args.len()
                )));
            }
            Some(constructor) => {
                if constructor.inputs.len() != args.len() {
                    return Err(invalid(format!(
                        "expected {} arguments, got {}",
                        constructor.inputs.len(),
                        args.len()
                    )));
                }
                let values = constructor
                    .inputs
                    .iter()
                    .zip(args)
                    .map(|(param, arg)| {
                        let ty = param
                            .resolve()
                            .map_err(|err| invalid(format!("parameter {}: {err}", param.name)))?;
                        ty.coerce_str(arg).map_err(|err| {
                            invalid(format!("parameter {} = {arg:?}: {err}", param.name))
                        })
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                constructor
                    .abi_encode_input(&values)
                    .map_err(|err| invalid(err.to_string()))?
            }
        };

        let mut code = self.bytecode.to_vec();
        code.extend(encoded);
        Ok(code.into())
    }
}

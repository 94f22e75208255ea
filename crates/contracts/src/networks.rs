pub const MAINNET: u64 = 1;
pub const OPTIMISM: u64 = 10;
pub const GNOSIS: u64 = 100;
pub const POLYGON: u64 = 137;
pub const BASE: u64 = 8453;
pub const HARDHAT: u64 = 31337;
pub const ARBITRUM_ONE: u64 = 42161;
pub const AMOY: u64 = 80002;
pub const HOLESKY: u64 = 17000;
pub const SEPOLIA: u64 = 11155111;

/// Human readable name of a well known chain.
pub fn name(chain_id: u64) -> Option<&'static str> {
    let name = match chain_id {
        MAINNET => "mainnet",
        OPTIMISM => "optimism",
        GNOSIS => "gnosis",
        POLYGON => "polygon",
        BASE => "base",
        HARDHAT => "hardhat",
        ARBITRUM_ONE => "arbitrum-one",
        AMOY => "amoy",
        HOLESKY => "holesky",
        SEPOLIA => "sepolia",
        _ => return None,
    };
    Some(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_known_chains() {
        assert_eq!(name(SEPOLIA), Some("sepolia"));
        assert_eq!(name(HARDHAT), Some("hardhat"));
        assert_eq!(name(123_456_789), None);
    }
}

// SPDX-License-Identifier: AGPL-3.0-or-later

//! Network and token configuration.

use std::time::Duration;

/// Environment variable naming the storage root directory.
pub const DATA_DIR_ENV: &str = "DATA_DIR";

/// Gas limit for a plain native transfer.
pub const NATIVE_TRANSFER_GAS: u64 = 21_000;

/// Default gas limit for an ERC-20 `transfer` call.
pub const TOKEN_TRANSFER_GAS: u64 = 200_000;

/// How long a cached nonce stays trusted before we re-sync against the chain.
pub const NONCE_RESYNC_AFTER: Duration = Duration::from_secs(300);

/// Chain connection settings.
#[derive(Debug, Clone)]
pub struct NetworkConfig {
    /// Network name for display
    pub name: String,
    /// Chain ID
    pub chain_id: u64,
    /// RPC endpoint URL
    pub rpc_url: String,
    /// Native asset ticker (e.g. "AVAX")
    pub native_symbol: String,
    /// Native asset display name
    pub native_name: String,
    /// Per-request timeout
    pub request_timeout: Duration,
    /// Retry attempts for read-only RPC calls
    pub max_retries: u32,
}

impl NetworkConfig {
    /// Settings for a custom RPC endpoint.
    pub fn new(name: impl Into<String>, chain_id: u64, rpc_url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            chain_id,
            rpc_url: rpc_url.into(),
            native_symbol: "AVAX".to_string(),
            native_name: "Avalanche".to_string(),
            request_timeout: Duration::from_secs(30),
            max_retries: 3,
        }
    }

    /// Override the native asset's labels for non-Avalanche chains.
    pub fn with_native_asset(
        mut self,
        symbol: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        self.native_symbol = symbol.into();
        self.native_name = name.into();
        self
    }

    /// Avalanche Fuji testnet.
    pub fn fuji() -> Self {
        Self::new(
            "Avalanche Fuji Testnet",
            43113,
            "https://api.avax-test.network/ext/bc/C/rpc",
        )
    }

    /// Avalanche C-Chain mainnet.
    pub fn mainnet() -> Self {
        Self::new(
            "Avalanche C-Chain",
            43114,
            "https://api.avax.network/ext/bc/C/rpc",
        )
    }
}

/// A token the service knows how to transfer.
#[derive(Debug, Clone, Copy)]
pub struct TokenInfo {
    pub symbol: &'static str,
    pub name: &'static str,
    pub decimals: u8,
    /// Contract address on the configured chain
    pub address: &'static str,
}

/// USDC on Fuji (Circle's test deployment).
pub const USDC_TOKEN: TokenInfo = TokenInfo {
    symbol: "USDC",
    name: "USD Coin",
    decimals: 6,
    address: "0x5425890298aed601595a70AB815c96711a31Bc65",
};

/// Relational Euro (`rEUR`) on Fuji.
pub const REUR_TOKEN: TokenInfo = TokenInfo {
    symbol: "rEUR",
    name: "Relational Euro",
    decimals: 6,
    address: "0x76568BEd5Acf1A5Cd888773C8cAe9ea2a9131A63",
};

/// Tokens available for `send` and balance aggregation.
pub const SUPPORTED_TOKENS: &[TokenInfo] = &[USDC_TOKEN, REUR_TOKEN];

/// Look up a supported token by symbol, case-insensitively.
pub fn lookup_token(symbol: &str) -> Option<&'static TokenInfo> {
    SUPPORTED_TOKENS
        .iter()
        .find(|t| t.symbol.eq_ignore_ascii_case(symbol.trim()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_lookup_ignores_case_and_whitespace() {
        assert!(lookup_token("usdc").is_some());
        assert!(lookup_token("  USDC  ").is_some());
        assert!(lookup_token("rEuR").is_some());
        assert!(lookup_token("DOGE").is_none());
    }

    #[test]
    fn default_network_settings() {
        let cfg = NetworkConfig::fuji();
        assert_eq!(cfg.chain_id, 43113);
        assert_eq!(cfg.max_retries, 3);
        assert_eq!(cfg.native_symbol, "AVAX");
    }

    #[test]
    fn native_asset_labels_are_overridable() {
        let cfg = NetworkConfig::new("Local Devnet", 1337, "http://localhost:8545")
            .with_native_asset("ETH", "Ether");
        assert_eq!(cfg.native_symbol, "ETH");
        assert_eq!(cfg.native_name, "Ether");
    }
}

// SPDX-License-Identifier: AGPL-3.0-or-later

//! Alloy-backed [`ChainClient`] implementation.

use std::future::Future;

use alloy::{
    network::Ethereum,
    primitives::{Address, TxHash, U256},
    providers::{
        fillers::{BlobGasFiller, ChainIdFiller, FillProvider, GasFiller, JoinFill, NonceFiller},
        Identity, Provider, ProviderBuilder, RootProvider,
    },
};
use async_trait::async_trait;

use super::erc20::Erc20Contract;
use super::{normalize_tx_hash, ChainClient, TokenMetadata, TxReceipt};
use crate::config::NetworkConfig;
use crate::error::ChainError;

/// HTTP provider type (with all fillers).
pub(crate) type HttpProvider = FillProvider<
    JoinFill<
        Identity,
        JoinFill<GasFiller, JoinFill<BlobGasFiller, JoinFill<NonceFiller, ChainIdFiller>>>,
    >,
    RootProvider<Ethereum>,
>;

/// JSON-RPC client for an EVM chain.
pub struct EvmClient {
    config: NetworkConfig,
    provider: HttpProvider,
}

impl EvmClient {
    /// Connect to the configured RPC endpoint.
    pub fn new(config: NetworkConfig) -> Result<Self, ChainError> {
        let url: url::Url = config
            .rpc_url
            .parse()
            .map_err(|e: url::ParseError| ChainError::InvalidRpcUrl(e.to_string()))?;

        let provider = ProviderBuilder::new().connect_http(url);

        Ok(Self { config, provider })
    }

    /// The network this client is connected to.
    pub fn config(&self) -> &NetworkConfig {
        &self.config
    }

    /// Run an RPC future under the configured timeout.
    async fn timed<T, F>(&self, fut: F) -> Result<T, ChainError>
    where
        F: Future<Output = Result<T, ChainError>>,
    {
        tokio::time::timeout(self.config.request_timeout, fut)
            .await
            .map_err(|_| {
                ChainError::Timeout(format!(
                    "no response within {:?}",
                    self.config.request_timeout
                ))
            })?
    }
}

#[async_trait]
impl ChainClient for EvmClient {
    async fn get_nonce(&self, address: Address) -> Result<u64, ChainError> {
        self.timed(async {
            self.provider
                .get_transaction_count(address)
                .await
                .map_err(|e| ChainError::Rpc(e.to_string()))
        })
        .await
    }

    async fn get_gas_price(&self) -> Result<u128, ChainError> {
        self.timed(async {
            self.provider
                .get_gas_price()
                .await
                .map_err(|e| ChainError::Rpc(e.to_string()))
        })
        .await
    }

    async fn get_native_balance(&self, address: Address) -> Result<U256, ChainError> {
        self.timed(async {
            self.provider
                .get_balance(address)
                .await
                .map_err(|e| ChainError::Rpc(e.to_string()))
        })
        .await
    }

    async fn get_token_balance(
        &self,
        token: Address,
        holder: Address,
    ) -> Result<U256, ChainError> {
        let contract = Erc20Contract::new(&self.provider, token);
        self.timed(contract.balance_of(holder)).await
    }

    async fn get_token_metadata(&self, token: Address) -> Result<TokenMetadata, ChainError> {
        let contract = Erc20Contract::new(&self.provider, token);
        self.timed(contract.metadata()).await
    }

    async fn broadcast(&self, raw: &[u8]) -> Result<String, ChainError> {
        // Broadcast is never retried; a timeout here leaves the outcome
        // unknown and reconciliation settles it later.
        self.timed(async {
            let pending = self
                .provider
                .send_raw_transaction(raw)
                .await
                .map_err(|e| ChainError::Rejected(e.to_string()))?;
            Ok(normalize_tx_hash(&format!("{:#x}", pending.tx_hash())))
        })
        .await
    }

    async fn get_receipt(&self, tx_hash: &str) -> Result<Option<TxReceipt>, ChainError> {
        let hash: TxHash = tx_hash
            .parse()
            .map_err(|_| ChainError::Rpc(format!("invalid tx hash: {tx_hash}")))?;

        self.timed(async {
            let receipt = self
                .provider
                .get_transaction_receipt(hash)
                .await
                .map_err(|e| ChainError::Rpc(e.to_string()))?;

            Ok(receipt.map(|r| TxReceipt {
                success: r.status(),
                block_number: r.block_number.unwrap_or(0),
                gas_used: r.gas_used as u64,
            }))
        })
        .await
    }
}

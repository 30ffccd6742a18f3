// SPDX-License-Identifier: AGPL-3.0-or-later

//! Caller-facing wallet service.
//!
//! Ties the registry, builder, sequencer, signer, and tracker together
//! behind the operations an API or CLI layer consumes. All input validation
//! happens here, before any chain traffic or key decryption.

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use alloy::primitives::Address;

use crate::chain::{ChainClient, TokenMetadata};
use crate::config::{lookup_token, NetworkConfig, TokenInfo, SUPPORTED_TOKENS};
use crate::error::{ChainError, WalletError};
use crate::registry::AccountRegistry;
use crate::storage::{AccountView, JsonStore, TransactionRecord, TransferKind};
use crate::tx::{
    format_amount, parse_address, sign_and_broadcast, NonceSequencer, TransactionBuilder,
    TransactionTracker,
};

/// Delay before the first retry of a transient read-only RPC failure.
const RETRY_BASE_DELAY: Duration = Duration::from_millis(250);

/// A transfer request from the caller.
#[derive(Debug, Clone)]
pub struct SendRequest {
    pub owner_id: String,
    pub credential_secret: String,
    pub kind: TransferKind,
    /// Recipient address
    pub to: String,
    /// Human-readable decimal amount
    pub amount: String,
    /// Required for token transfers, ignored otherwise
    pub token_symbol: Option<String>,
    /// Explicit gas price in gwei; network price when unset
    pub gas_price_gwei: Option<u128>,
    /// Explicit gas limit; kind-specific default when unset
    pub gas_limit: Option<u64>,
}

impl SendRequest {
    /// Native-asset transfer with default gas settings.
    pub fn native(owner_id: &str, secret: &str, to: &str, amount: &str) -> Self {
        Self {
            owner_id: owner_id.to_string(),
            credential_secret: secret.to_string(),
            kind: TransferKind::NativeTransfer,
            to: to.to_string(),
            amount: amount.to_string(),
            token_symbol: None,
            gas_price_gwei: None,
            gas_limit: None,
        }
    }

    /// Token transfer with default gas settings.
    pub fn token(owner_id: &str, secret: &str, to: &str, amount: &str, symbol: &str) -> Self {
        Self {
            token_symbol: Some(symbol.to_string()),
            kind: TransferKind::TokenTransfer,
            ..Self::native(owner_id, secret, to, amount)
        }
    }
}

/// One asset line in a balance summary.
#[derive(Debug, Clone)]
pub struct TokenBalance {
    pub symbol: String,
    pub name: String,
    /// Human-readable amount
    pub amount: String,
    pub decimals: u8,
    /// Contract address, `None` for the native asset
    pub contract_address: Option<String>,
}

/// Native plus token balances for one address.
#[derive(Debug, Clone)]
pub struct BalanceSummary {
    pub address: String,
    pub native: TokenBalance,
    pub tokens: Vec<TokenBalance>,
}

/// The wallet core's public surface.
pub struct WalletService {
    store: JsonStore,
    client: Arc<dyn ChainClient>,
    sequencer: NonceSequencer,
    builder: TransactionBuilder,
    config: NetworkConfig,
}

impl WalletService {
    /// Assemble the service over an initialized store and a chain client.
    pub fn new(
        mut store: JsonStore,
        client: Arc<dyn ChainClient>,
        config: NetworkConfig,
    ) -> Result<Self, WalletError> {
        store.initialize()?;
        Ok(Self {
            sequencer: NonceSequencer::new(client.clone()),
            builder: TransactionBuilder::new(client.clone(), config.chain_id),
            store,
            client,
            config,
        })
    }

    /// Create an account for an owner. One per owner, ever.
    pub fn create_account(
        &self,
        owner_id: &str,
        credential_secret: &str,
    ) -> Result<AccountView, WalletError> {
        AccountRegistry::new(&self.store).create_account(owner_id, credential_secret)
    }

    /// Look up an owner's account.
    pub fn get_account(&self, owner_id: &str) -> Result<AccountView, WalletError> {
        AccountRegistry::new(&self.store).get_account(owner_id)
    }

    /// Sign and submit a transfer. Returns the transaction hash.
    ///
    /// Validation runs first and touches neither the chain nor the vault.
    /// The nonce lease is committed only after the node accepted the
    /// broadcast; any earlier failure rolls the nonce back.
    pub async fn send(&self, request: &SendRequest) -> Result<String, WalletError> {
        let to = parse_address(&request.to)?;
        let token = match request.kind {
            TransferKind::NativeTransfer => None,
            TransferKind::TokenTransfer => {
                let symbol = request.token_symbol.as_deref().ok_or_else(|| {
                    WalletError::Validation("token transfer requires a token symbol".to_string())
                })?;
                Some(resolve_token(symbol)?)
            }
        };
        // Rejects malformed and below-minimum amounts before any RPC.
        crate::tx::parse_amount(
            &request.amount,
            token.map(|t| t.decimals).unwrap_or(crate::tx::builder::NATIVE_DECIMALS),
        )?;

        let registry = AccountRegistry::new(&self.store);
        let signer = registry.unlock(&request.owner_id, &request.credential_secret)?;
        let from = signer.address();

        let lease = self.sequencer.reserve(from).await?;

        let unsigned = match token {
            None => {
                self.builder
                    .build_native_transfer(
                        from,
                        to,
                        &request.amount,
                        lease.nonce(),
                        request.gas_price_gwei,
                        request.gas_limit,
                    )
                    .await?
            }
            Some(token) => {
                self.builder
                    .build_token_transfer(
                        from,
                        to,
                        token,
                        &request.amount,
                        lease.nonce(),
                        request.gas_price_gwei,
                        request.gas_limit,
                    )
                    .await?
            }
        };

        let tx_hash = match sign_and_broadcast(self.client.as_ref(), &unsigned, &signer).await {
            Ok(hash) => hash,
            Err(e) => {
                // Lease drops here: the nonce is reused by the next send.
                tracing::warn!(owner_id = %request.owner_id, error = %e, "broadcast failed");
                return Err(e);
            }
        };

        // The nonce is consumed on-chain from this point regardless of what
        // happens locally.
        lease.commit();

        let tracker = TransactionTracker::new(&self.store, self.client.clone());
        if let Err(e) = tracker.record_pending(&unsigned, &tx_hash, &request.owner_id) {
            tracing::error!(
                tx_hash = %tx_hash,
                error = %e,
                "broadcast succeeded but the pending record could not be written"
            );
            return Err(e);
        }

        Ok(tx_hash)
    }

    /// Native and supported-token balances for an address.
    ///
    /// A token whose balance call keeps failing is skipped with a warning;
    /// one flaky contract must not hide the rest of the summary.
    pub async fn get_balance(&self, address: &str) -> Result<BalanceSummary, WalletError> {
        let addr = parse_address(address)?;

        let native_units = self
            .with_retry(|| self.client.get_native_balance(addr))
            .await?;
        let native = TokenBalance {
            symbol: self.config.native_symbol.clone(),
            name: self.config.native_name.clone(),
            amount: format_amount(native_units, crate::tx::builder::NATIVE_DECIMALS),
            decimals: crate::tx::builder::NATIVE_DECIMALS,
            contract_address: None,
        };

        let mut tokens = Vec::new();
        for token in SUPPORTED_TOKENS {
            let contract = Address::from_str(token.address)
                .map_err(|e| WalletError::Validation(format!("bad token address: {e}")))?;
            match self
                .with_retry(|| self.client.get_token_balance(contract, addr))
                .await
            {
                Ok(units) => tokens.push(TokenBalance {
                    symbol: token.symbol.to_string(),
                    name: token.name.to_string(),
                    amount: format_amount(units, token.decimals),
                    decimals: token.decimals,
                    contract_address: Some(token.address.to_string()),
                }),
                Err(e) => {
                    tracing::warn!(token = token.symbol, error = %e, "skipping token balance");
                }
            }
        }

        Ok(BalanceSummary {
            address: crate::storage::format_address(addr),
            native,
            tokens,
        })
    }

    /// Transactions where the address is sender or recipient, newest first.
    /// `page` is 1-based. Returns the page plus the total match count.
    pub fn list_transactions(
        &self,
        address: &str,
        page: usize,
        page_size: usize,
    ) -> Result<(Vec<TransactionRecord>, usize), WalletError> {
        let addr = parse_address(address)?;
        if page_size == 0 || page_size > 100 {
            return Err(WalletError::Validation(
                "page_size must be between 1 and 100".to_string(),
            ));
        }
        let repo = crate::storage::TransactionRepository::new(&self.store);
        Ok(repo.list_by_address(&crate::storage::format_address(addr), page, page_size)?)
    }

    /// Current status of a broadcast transaction, reconciled against the
    /// chain when still pending.
    pub async fn transaction_status(
        &self,
        tx_hash: &str,
    ) -> Result<TransactionRecord, WalletError> {
        TransactionTracker::new(&self.store, self.client.clone())
            .reconcile(tx_hash)
            .await
    }

    /// On-chain metadata for a supported token symbol or a contract address.
    pub async fn token_metadata(&self, token: &str) -> Result<TokenMetadata, WalletError> {
        let address = if token.starts_with("0x") {
            parse_address(token)?
        } else {
            let info = resolve_token(token)?;
            Address::from_str(info.address)
                .map_err(|e| WalletError::Validation(format!("bad token address: {e}")))?
        };
        Ok(self
            .with_retry(|| self.client.get_token_metadata(address))
            .await?)
    }

    /// The network this service is wired to.
    pub fn network(&self) -> &NetworkConfig {
        &self.config
    }

    /// Retry a read-only chain call on transient failures, with linear
    /// backoff. Broadcasts never go through here.
    async fn with_retry<T, F, Fut>(&self, mut call: F) -> Result<T, ChainError>
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = Result<T, ChainError>>,
    {
        let mut attempt = 0;
        loop {
            match call().await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_transient() && attempt < self.config.max_retries => {
                    attempt += 1;
                    tracing::debug!(attempt, error = %e, "retrying transient RPC failure");
                    tokio::time::sleep(RETRY_BASE_DELAY * attempt).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

fn resolve_token(symbol: &str) -> Result<&'static TokenInfo, WalletError> {
    lookup_token(symbol)
        .ok_or_else(|| WalletError::Validation(format!("unsupported token `{symbol}`")))
}

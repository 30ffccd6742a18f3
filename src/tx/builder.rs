// SPDX-License-Identifier: AGPL-3.0-or-later

//! Unsigned transaction construction.
//!
//! Builds legacy (pre-EIP-1559) transfer payloads for the native asset and
//! for ERC-20 tokens. Amounts arrive as human-readable decimal strings and
//! are converted to base units here, rounding half-up past the asset's
//! precision.

use std::str::FromStr;
use std::sync::Arc;

use alloy::primitives::{Address, U256};

use crate::chain::erc20::transfer_calldata;
use crate::chain::ChainClient;
use crate::config::{TokenInfo, NATIVE_TRANSFER_GAS, TOKEN_TRANSFER_GAS};
use crate::error::WalletError;
use crate::storage::TransferKind;

/// Decimals of the chain's native asset.
pub const NATIVE_DECIMALS: u8 = 18;

/// A fully-specified transfer, ready to sign.
#[derive(Debug, Clone)]
pub struct UnsignedTx {
    /// Sending account
    pub from: Address,
    /// Transaction target: the recipient for native transfers, the token
    /// contract for token transfers
    pub to: Address,
    /// Asset recipient (equals `to` for native transfers)
    pub recipient: Address,
    /// Native value attached, in wei
    pub value: U256,
    /// Call payload, empty for native transfers
    pub input: Vec<u8>,
    pub nonce: u64,
    /// Gas price in wei
    pub gas_price: u128,
    pub gas_limit: u64,
    pub chain_id: u64,
    pub kind: TransferKind,
    /// Human-readable amount as supplied by the caller
    pub amount: String,
    pub token_address: Option<Address>,
    pub token_symbol: Option<String>,
}

/// Builds unsigned transfers, consulting the chain for the gas price when
/// the caller does not pin one.
pub struct TransactionBuilder {
    client: Arc<dyn ChainClient>,
    chain_id: u64,
}

impl TransactionBuilder {
    pub fn new(client: Arc<dyn ChainClient>, chain_id: u64) -> Self {
        Self { client, chain_id }
    }

    /// Build a native-asset transfer.
    ///
    /// `gas_price_gwei`, when set, is honored as-is (converted to wei);
    /// otherwise the current network price is fetched. `gas_limit` defaults
    /// to the fixed cost of a plain transfer.
    pub async fn build_native_transfer(
        &self,
        from: Address,
        to: Address,
        amount: &str,
        nonce: u64,
        gas_price_gwei: Option<u128>,
        gas_limit: Option<u64>,
    ) -> Result<UnsignedTx, WalletError> {
        let value = parse_amount(amount, NATIVE_DECIMALS)?;
        let gas_price = self.resolve_gas_price(gas_price_gwei).await?;

        Ok(UnsignedTx {
            from,
            to,
            recipient: to,
            value,
            input: Vec::new(),
            nonce,
            gas_price,
            gas_limit: gas_limit.unwrap_or(NATIVE_TRANSFER_GAS),
            chain_id: self.chain_id,
            kind: TransferKind::NativeTransfer,
            amount: amount.trim().to_string(),
            token_address: None,
            token_symbol: None,
        })
    }

    /// Build an ERC-20 `transfer` call.
    ///
    /// The on-chain payload carries the amount in base units; the record
    /// keeps the human-readable amount.
    pub async fn build_token_transfer(
        &self,
        from: Address,
        to: Address,
        token: &TokenInfo,
        amount: &str,
        nonce: u64,
        gas_price_gwei: Option<u128>,
        gas_limit: Option<u64>,
    ) -> Result<UnsignedTx, WalletError> {
        let base_units = parse_amount(amount, token.decimals)?;
        let token_address = Address::from_str(token.address).map_err(|e| {
            WalletError::Validation(format!("bad token contract address: {e}"))
        })?;
        let gas_price = self.resolve_gas_price(gas_price_gwei).await?;

        Ok(UnsignedTx {
            from,
            to: token_address,
            recipient: to,
            value: U256::ZERO,
            input: transfer_calldata(to, base_units),
            nonce,
            gas_price,
            gas_limit: gas_limit.unwrap_or(TOKEN_TRANSFER_GAS),
            chain_id: self.chain_id,
            kind: TransferKind::TokenTransfer,
            amount: amount.trim().to_string(),
            token_address: Some(token_address),
            token_symbol: Some(token.symbol.to_string()),
        })
    }

    async fn resolve_gas_price(&self, gas_price_gwei: Option<u128>) -> Result<u128, WalletError> {
        match gas_price_gwei {
            Some(gwei) => Ok(gwei
                .checked_mul(1_000_000_000)
                .ok_or_else(|| WalletError::Validation("gas price overflow".to_string()))?),
            None => Ok(self.client.get_gas_price().await?),
        }
    }
}

/// Parse an address, mapping failure to a validation error.
pub fn parse_address(address: &str) -> Result<Address, WalletError> {
    Address::from_str(address.trim())
        .map_err(|e| WalletError::Validation(format!("invalid address `{address}`: {e}")))
}

/// Parse a human-readable decimal amount into base units.
///
/// Both sides of the decimal point must be plain ASCII digits; signs,
/// exponents, and anything else fail validation. Fractional digits beyond
/// the asset's precision are rounded half-up. The minimum transfer is one
/// millionth of a unit: amounts below `10^(decimals-6)` base units, zero
/// included, fail validation.
pub fn parse_amount(amount: &str, decimals: u8) -> Result<U256, WalletError> {
    let amount = amount.trim();
    let (whole_str, frac_str) = match amount.split_once('.') {
        None => (amount, ""),
        Some((whole, frac)) => (whole, frac),
    };

    // Digit-only on both sides: `u128::from_str` would happily eat a `+`
    // and shift the value.
    let digits_only = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());
    if !digits_only(whole_str) || (amount.contains('.') && !digits_only(frac_str)) {
        return Err(WalletError::Validation(format!(
            "invalid amount format `{amount}`"
        )));
    }

    let whole = whole_str
        .parse::<u128>()
        .map_err(|_| WalletError::Validation(format!("invalid amount `{amount}`")))?;

    // Scale the fraction to `decimals` digits, rounding half-up on the
    // first dropped digit.
    let width = decimals as usize;
    let kept = &frac_str[..frac_str.len().min(width)];
    let dropped = &frac_str[kept.len()..];
    let mut frac = if kept.is_empty() {
        0u128
    } else {
        let padded = format!("{kept:0<width$}");
        padded
            .parse::<u128>()
            .map_err(|_| WalletError::Validation("amount overflow".to_string()))?
    };
    if dropped.bytes().next().is_some_and(|b| b >= b'5') {
        frac += 1;
    }

    let multiplier = 10u128
        .checked_pow(decimals as u32)
        .ok_or_else(|| WalletError::Validation("amount overflow".to_string()))?;
    let total = whole
        .checked_mul(multiplier)
        .and_then(|w| w.checked_add(frac))
        .ok_or_else(|| WalletError::Validation("amount overflow".to_string()))?;

    let min_units = 10u128.pow(decimals.saturating_sub(6) as u32);
    if total < min_units {
        return Err(WalletError::Validation(format!(
            "amount below minimum transfer of 0.000001 (`{amount}`)"
        )));
    }

    Ok(U256::from(total))
}

/// Format base units back into a human-readable decimal string.
pub fn format_amount(amount: U256, decimals: u8) -> String {
    if amount.is_zero() {
        return "0".to_string();
    }

    let divisor = U256::from(10u64).pow(U256::from(decimals));
    let whole = amount / divisor;
    let remainder = amount % divisor;

    if remainder.is_zero() {
        whole.to_string()
    } else {
        let decimal_str = format!("{:0>width$}", remainder, width = decimals as usize);
        let trimmed = decimal_str.trim_end_matches('0');
        if trimmed.is_empty() {
            whole.to_string()
        } else {
            format!("{}.{}", whole, trimmed)
        }
    }
}

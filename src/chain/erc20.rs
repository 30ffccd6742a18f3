// SPDX-License-Identifier: AGPL-3.0-or-later

//! ERC-20 contract reads and transfer calldata encoding.

use alloy::{
    primitives::{Address, U256},
    providers::Provider,
    sol,
    sol_types::SolCall,
};

use super::TokenMetadata;
use crate::error::ChainError;

sol! {
    #[sol(rpc)]
    interface IERC20 {
        function name() external view returns (string);
        function symbol() external view returns (string);
        function decimals() external view returns (uint8);
        function balanceOf(address account) external view returns (uint256);
        function transfer(address to, uint256 amount) external returns (bool);
    }
}

/// ABI-encode a `transfer(to, amount)` call for inclusion in a raw
/// transaction payload.
pub fn transfer_calldata(to: Address, amount: U256) -> Vec<u8> {
    IERC20::transferCall { to, amount }.abi_encode()
}

/// ERC-20 contract wrapper for read-only calls.
pub struct Erc20Contract<P> {
    contract: IERC20::IERC20Instance<P>,
}

impl<P: Provider + Clone> Erc20Contract<P> {
    pub fn new(provider: &P, address: Address) -> Self {
        Self {
            contract: IERC20::new(address, provider.clone()),
        }
    }

    /// Balance of `holder` in the token's base units.
    pub async fn balance_of(&self, holder: Address) -> Result<U256, ChainError> {
        self.contract
            .balanceOf(holder)
            .call()
            .await
            .map_err(|e| ChainError::Rpc(e.to_string()))
    }

    /// Read name, symbol, and decimals from the contract.
    pub async fn metadata(&self) -> Result<TokenMetadata, ChainError> {
        let name = self
            .contract
            .name()
            .call()
            .await
            .map_err(|e| ChainError::Rpc(e.to_string()))?;
        let symbol = self
            .contract
            .symbol()
            .call()
            .await
            .map_err(|e| ChainError::Rpc(e.to_string()))?;
        let decimals = self
            .contract
            .decimals()
            .call()
            .await
            .map_err(|e| ChainError::Rpc(e.to_string()))?;

        Ok(TokenMetadata {
            name,
            symbol,
            decimals,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn transfer_calldata_layout() {
        let to = Address::from_str("0x5425890298aed601595a70AB815c96711a31Bc65").unwrap();
        let amount = U256::from(1_500_000u64);
        let data = transfer_calldata(to, amount);

        // 4-byte selector + two 32-byte words.
        assert_eq!(data.len(), 68);
        // transfer(address,uint256) selector.
        assert_eq!(&data[..4], &[0xa9, 0x05, 0x9c, 0xbb]);
        // Address is right-aligned in the first word.
        assert_eq!(&data[16..36], to.as_slice());
        // Amount is right-aligned in the second word.
        assert_eq!(U256::from_be_slice(&data[36..68]), amount);
    }
}

// SPDX-License-Identifier: AGPL-3.0-or-later

//! Per-address nonce sequencing.
//!
//! Every send reserves a nonce through [`NonceSequencer::reserve`], which
//! hands back a [`NonceLease`] holding an exclusive per-address lock. The
//! lock is released only when the lease is committed or dropped, so at most
//! one send per address is in flight at a time and committed nonces are
//! strictly increasing with no gaps.
//!
//! A lease dropped without [`NonceLease::commit`] rolls back: the nonce is
//! reused by the next reservation, so a failed broadcast never burns a
//! nonce.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use alloy::primitives::Address;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tokio::time::Instant;

use crate::chain::ChainClient;
use crate::config::NONCE_RESYNC_AFTER;
use crate::error::ChainError;

struct NonceSlot {
    /// Next nonce to hand out, `None` until seeded from the chain
    next: Option<u64>,
    /// When the slot last committed a nonce
    last_commit: Option<Instant>,
}

/// Allocates gap-free, strictly increasing nonces per sending address.
pub struct NonceSequencer {
    client: Arc<dyn ChainClient>,
    slots: Mutex<HashMap<Address, Arc<Mutex<NonceSlot>>>>,
    resync_after: Duration,
}

impl NonceSequencer {
    pub fn new(client: Arc<dyn ChainClient>) -> Self {
        Self::with_resync_after(client, NONCE_RESYNC_AFTER)
    }

    /// Override the idle window after which the cached nonce is reconciled
    /// against the chain.
    pub fn with_resync_after(client: Arc<dyn ChainClient>, resync_after: Duration) -> Self {
        Self {
            client,
            slots: Mutex::new(HashMap::new()),
            resync_after,
        }
    }

    /// Reserve the next nonce for `address`.
    ///
    /// Blocks while another lease for the same address is outstanding. The
    /// first reservation for an address seeds from the chain's transaction
    /// count; after sitting idle past the re-sync window the cached value is
    /// reconciled by taking the larger of local and chain.
    pub async fn reserve(&self, address: Address) -> Result<NonceLease, ChainError> {
        let slot = {
            let mut slots = self.slots.lock().await;
            slots
                .entry(address)
                .or_insert_with(|| {
                    Arc::new(Mutex::new(NonceSlot {
                        next: None,
                        last_commit: None,
                    }))
                })
                .clone()
        };

        let mut guard = slot.lock_owned().await;

        let nonce = match guard.next {
            None => self.client.get_nonce(address).await?,
            Some(local) => {
                let stale = guard
                    .last_commit
                    .map(|at| at.elapsed() >= self.resync_after)
                    .unwrap_or(false);
                if stale {
                    // Another submitter may have advanced the account while
                    // we were idle; never go backwards.
                    let chain = self.client.get_nonce(address).await?;
                    local.max(chain)
                } else {
                    local
                }
            }
        };
        guard.next = Some(nonce);

        Ok(NonceLease { guard, nonce })
    }
}

/// An exclusive claim on one nonce for one address.
///
/// Dropping the lease without committing releases the lock and leaves the
/// nonce available for reuse.
pub struct NonceLease {
    guard: OwnedMutexGuard<NonceSlot>,
    nonce: u64,
}

impl NonceLease {
    /// The reserved nonce.
    pub fn nonce(&self) -> u64 {
        self.nonce
    }

    /// Mark the nonce consumed. The next reservation gets `nonce + 1`.
    pub fn commit(mut self) {
        self.guard.next = Some(self.nonce + 1);
        self.guard.last_commit = Some(Instant::now());
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::str::FromStr;

    use super::*;
    use crate::chain::mock::MockChainClient;

    fn addr(s: &str) -> Address {
        Address::from_str(s).unwrap()
    }

    const ALICE: &str = "0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266";
    const BOB: &str = "0x70997970c51812dc3a010c7d01b50e0d17dc79c8";

    #[tokio::test]
    async fn seeds_from_chain_on_first_reserve() {
        let client = Arc::new(MockChainClient::with_nonce(42));
        let seq = NonceSequencer::new(client);

        let lease = seq.reserve(addr(ALICE)).await.unwrap();
        assert_eq!(lease.nonce(), 42);
    }

    #[tokio::test]
    async fn commit_advances_rollback_reuses() {
        let client = Arc::new(MockChainClient::with_nonce(5));
        let seq = NonceSequencer::new(client);
        let alice = addr(ALICE);

        let lease = seq.reserve(alice).await.unwrap();
        assert_eq!(lease.nonce(), 5);
        lease.commit();

        // Dropped without commit: nonce 6 stays available.
        let lease = seq.reserve(alice).await.unwrap();
        assert_eq!(lease.nonce(), 6);
        drop(lease);

        let lease = seq.reserve(alice).await.unwrap();
        assert_eq!(lease.nonce(), 6);
        lease.commit();

        let lease = seq.reserve(alice).await.unwrap();
        assert_eq!(lease.nonce(), 7);
    }

    #[tokio::test]
    async fn concurrent_reservations_are_distinct_and_gap_free() {
        let client = Arc::new(MockChainClient::with_nonce(100));
        let seq = Arc::new(NonceSequencer::new(client));
        let alice = addr(ALICE);

        let mut handles = Vec::new();
        for _ in 0..16 {
            let seq = seq.clone();
            handles.push(tokio::spawn(async move {
                let lease = seq.reserve(alice).await.unwrap();
                let nonce = lease.nonce();
                lease.commit();
                nonce
            }));
        }

        let mut nonces = Vec::new();
        for handle in handles {
            nonces.push(handle.await.unwrap());
        }

        let unique: HashSet<_> = nonces.iter().copied().collect();
        assert_eq!(unique.len(), 16);
        nonces.sort_unstable();
        assert_eq!(nonces, (100..116).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn addresses_sequence_independently() {
        let client = Arc::new(MockChainClient::with_nonce(0));
        let seq = NonceSequencer::new(client);

        // Holding Alice's lease does not block Bob.
        let alice_lease = seq.reserve(addr(ALICE)).await.unwrap();
        let bob_lease = seq.reserve(addr(BOB)).await.unwrap();
        assert_eq!(alice_lease.nonce(), 0);
        assert_eq!(bob_lease.nonce(), 0);
        alice_lease.commit();
        bob_lease.commit();
    }

    #[tokio::test(start_paused = true)]
    async fn idle_slot_resyncs_forward_only() {
        let client = Arc::new(MockChainClient::with_nonce(10));
        let seq =
            NonceSequencer::with_resync_after(client.clone(), Duration::from_secs(60));
        let alice = addr(ALICE);

        seq.reserve(alice).await.unwrap().commit(); // nonce 10, next 11

        // Someone else advanced the account while we sat idle.
        tokio::time::advance(Duration::from_secs(120)).await;
        client.nonce.store(15, std::sync::atomic::Ordering::SeqCst);

        let lease = seq.reserve(alice).await.unwrap();
        assert_eq!(lease.nonce(), 15);
        lease.commit();

        // A stale chain view never drags the sequence backwards.
        tokio::time::advance(Duration::from_secs(120)).await;
        client.nonce.store(2, std::sync::atomic::Ordering::SeqCst);

        let lease = seq.reserve(alice).await.unwrap();
        assert_eq!(lease.nonce(), 16);
    }
}

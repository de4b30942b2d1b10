//! Relay submission loop.

use alloy::primitives::U256;
use std::time::Duration;
use tokio::sync::broadcast::error::TryRecvError as ShutdownTryRecvError;
use tokio::sync::mpsc::error::TryRecvError;
use tokio::sync::{broadcast, mpsc};
use tokio::time::sleep;

use crate::blockchain::types::ConfirmationStatus;
use crate::config::RelayLoopConfig;
use crate::observability::metrics;
use crate::queue::{PriorityNode, PriorityQueue};
use crate::relay::contract::RelayContract;
use crate::relay::types::{RelayCall, RelayOutcome, TransactionRecord};
use crate::relay::RelayError;

/// Serves resolved transactions highest bid first, one at a time.
///
/// The loop owns the priority queue. Records arriving on the channel are
/// moved into it at the start of every iteration, so a transaction that
/// shows up while another is in flight is only considered on the next pass.
pub struct RelayLoop<C> {
    contract: C,
    queue: PriorityQueue<U256, TransactionRecord>,
    incoming: mpsc::Receiver<TransactionRecord>,
    incoming_closed: bool,
    idle_interval: Duration,
}

impl<C: RelayContract> RelayLoop<C> {
    pub fn new(
        contract: C,
        incoming: mpsc::Receiver<TransactionRecord>,
        config: &RelayLoopConfig,
    ) -> Self {
        Self {
            contract,
            queue: PriorityQueue::new(),
            incoming,
            incoming_closed: false,
            idle_interval: Duration::from_millis(config.idle_interval_ms),
        }
    }

    /// Transactions queued and not yet attempted.
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Move everything waiting on the channel into the queue.
    fn drain_incoming(&mut self) -> Result<usize, RelayError> {
        let mut received = 0;
        loop {
            match self.incoming.try_recv() {
                Ok(record) => {
                    self.queue.enqueue(PriorityNode::new(record.bid(), record))?;
                    received += 1;
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    self.incoming_closed = true;
                    break;
                }
            }
        }
        if received > 0 {
            metrics::record_queue_depth(self.queue.len());
        }
        Ok(received)
    }

    /// Drain the channel, then relay the highest bid if there is one.
    ///
    /// Returns `None` when the queue is empty.
    pub async fn step(&mut self) -> Result<Option<RelayOutcome>, RelayError> {
        self.drain_incoming()?;

        let Some(node) = self.queue.dequeue()? else {
            return Ok(None);
        };
        metrics::record_queue_depth(self.queue.len());

        Ok(Some(self.relay_one(node.value).await))
    }

    /// Simulate, submit and await confirmation of a single transaction.
    ///
    /// Every failure discards the transaction; nothing is retried or
    /// requeued.
    pub async fn relay_one(&self, record: TransactionRecord) -> RelayOutcome {
        let from = record.from_address;
        let bid = record.bid();

        let outcome = match RelayCall::new(record) {
            Ok(call) => self.attempt(&call).await,
            Err(e) => RelayOutcome::Rejected(e.to_string()),
        };

        metrics::record_relay_outcome(outcome.label());
        match &outcome {
            RelayOutcome::Confirmed {
                tx_hash,
                block_number,
            } => tracing::info!(
                from = %from,
                bid = %bid,
                tx_hash = %tx_hash,
                block_number = block_number,
                "Relayed transaction confirmed"
            ),
            RelayOutcome::Reverted { tx_hash, reason } => tracing::warn!(
                from = %from,
                bid = %bid,
                tx_hash = %tx_hash,
                reason = %reason,
                "Relayed transaction reverted"
            ),
            RelayOutcome::Rejected(reason)
            | RelayOutcome::SimulationFailed(reason)
            | RelayOutcome::SubmissionFailed(reason) => tracing::warn!(
                from = %from,
                bid = %bid,
                outcome = outcome.label(),
                reason = %reason,
                "Discarding transaction"
            ),
        }

        outcome
    }

    async fn attempt(&self, call: &RelayCall) -> RelayOutcome {
        match self.contract.simulate(call).await {
            Ok(estimate) => tracing::debug!(
                kind = call.kind.as_str(),
                estimate = estimate,
                gas_limit = call.overrides.gas_limit,
                "Simulation succeeded"
            ),
            Err(e) => return RelayOutcome::SimulationFailed(e.to_string()),
        }

        let tx_hash = match self.contract.submit(call).await {
            Ok(tx_hash) => tx_hash,
            Err(e) => return RelayOutcome::SubmissionFailed(e.to_string()),
        };
        tracing::info!(tx_hash = %tx_hash, kind = call.kind.as_str(), "Transaction submitted");

        match self.contract.confirm(tx_hash).await {
            Ok(ConfirmationStatus::Confirmed { block_number }) => RelayOutcome::Confirmed {
                tx_hash,
                block_number,
            },
            Ok(ConfirmationStatus::Failed(reason)) => RelayOutcome::Reverted { tx_hash, reason },
            Ok(ConfirmationStatus::Confirming { current, required }) => {
                RelayOutcome::SubmissionFailed(format!(
                    "{tx_hash} stopped at {current}/{required} confirmations"
                ))
            }
            Err(e) => RelayOutcome::SubmissionFailed(format!("{tx_hash}: {e}")),
        }
    }

    /// Relay until shutdown, or until the channel is closed and the queue
    /// has been worked off.
    ///
    /// A heap invariant violation is the only error that ends the loop.
    pub async fn run(mut self, mut shutdown: broadcast::Receiver<()>) -> Result<(), RelayError> {
        tracing::info!(
            idle_interval_ms = self.idle_interval.as_millis() as u64,
            "Starting relay loop"
        );

        loop {
            if shutdown_requested(&mut shutdown) {
                tracing::info!(pending = self.queue.len(), "Relay loop shutting down");
                return Ok(());
            }

            if self.step().await?.is_some() {
                continue;
            }

            if self.incoming_closed {
                tracing::info!("Record channel closed and queue empty, relay loop stopped");
                return Ok(());
            }

            tokio::select! {
                _ = shutdown.recv() => {
                    tracing::info!("Relay loop shutting down");
                    return Ok(());
                }
                _ = sleep(self.idle_interval) => {}
            }
        }
    }
}

fn shutdown_requested(shutdown: &mut broadcast::Receiver<()>) -> bool {
    matches!(
        shutdown.try_recv(),
        Ok(()) | Err(ShutdownTryRecvError::Lagged(_))
    )
}

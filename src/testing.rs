//! In-memory chain for wrapper tests
//!
//! Answers `eth_call` from fixtures keyed by (contract, selector) and records
//! every interaction so tests can assert what did and did not reach the node.

use alloy_primitives::{Address, Bytes, Log, B256};
use alloy_sol_types::{SolCall, SolEvent};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::chain::{ChainClient, TxReceipt, TxRequest};
use crate::config::NetworkConfig;
use crate::error::{Result, SdkError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChainOp {
    Call { to: Address, selector: [u8; 4] },
    Estimate { to: Address, selector: [u8; 4] },
    GasPrice,
    Send(TxRequest),
}

#[derive(Debug)]
pub struct MockChain {
    signer: Address,
    chain_id: u64,
    gas_price: u128,
    gas_estimate: u64,
    responses: Mutex<HashMap<(Address, [u8; 4]), Bytes>>,
    receipt_logs: Mutex<Vec<Log>>,
    ops: Mutex<Vec<ChainOp>>,
}

impl MockChain {
    pub fn new(signer: Address) -> Arc<Self> {
        Arc::new(Self {
            signer,
            chain_id: 8996,
            gas_price: 20_000_000_000,
            gas_estimate: 100_000,
            responses: Mutex::new(HashMap::new()),
            receipt_logs: Mutex::new(Vec::new()),
            ops: Mutex::new(Vec::new()),
        })
    }

    /// Answer calls of `C` on `to` with the given ABI-encoded output
    pub fn on_call<C: SolCall>(&self, to: Address, output: Vec<u8>) {
        self.responses
            .lock()
            .unwrap()
            .insert((to, C::SELECTOR), Bytes::from(output));
    }

    /// Attach an event to every receipt returned by `send`
    pub fn emit<E: SolEvent>(&self, emitter: Address, event: &E) {
        self.receipt_logs.lock().unwrap().push(Log {
            address: emitter,
            data: event.encode_log_data(),
        });
    }

    pub fn ops(&self) -> Vec<ChainOp> {
        self.ops.lock().unwrap().clone()
    }

    pub fn estimates(&self) -> usize {
        self.ops().iter().filter(|op| matches!(op, ChainOp::Estimate { .. })).count()
    }

    pub fn sends(&self) -> Vec<TxRequest> {
        self.ops()
            .into_iter()
            .filter_map(|op| match op {
                ChainOp::Send(tx) => Some(tx),
                _ => None,
            })
            .collect()
    }

    /// Only read calls were made: no estimate, no gas price, no send
    pub fn only_reads(&self) -> bool {
        self.ops().iter().all(|op| matches!(op, ChainOp::Call { .. }))
    }

    fn record(&self, op: ChainOp) {
        self.ops.lock().unwrap().push(op);
    }
}

impl ChainClient for MockChain {
    fn signer_address(&self) -> Address {
        self.signer
    }

    async fn chain_id(&self) -> Result<u64> {
        Ok(self.chain_id)
    }

    async fn call(&self, tx: &TxRequest) -> Result<Bytes> {
        let selector = tx.selector().unwrap_or_default();
        self.record(ChainOp::Call { to: tx.to, selector });
        self.responses
            .lock()
            .unwrap()
            .get(&(tx.to, selector))
            .cloned()
            .ok_or_else(|| SdkError::ContractCall {
                method: "eth_call",
                reason: format!("no fixture for {:?} selector 0x{}", tx.to, hex::encode(selector)),
            })
    }

    async fn estimate_gas(&self, tx: &TxRequest) -> Result<u64> {
        let selector = tx.selector().unwrap_or_default();
        self.record(ChainOp::Estimate { to: tx.to, selector });
        Ok(self.gas_estimate)
    }

    async fn gas_price(&self) -> Result<u128> {
        self.record(ChainOp::GasPrice);
        Ok(self.gas_price)
    }

    async fn send(&self, tx: TxRequest) -> Result<TxReceipt> {
        self.record(ChainOp::Send(tx));
        Ok(TxReceipt {
            transaction_hash: B256::repeat_byte(0xab),
            block_number: Some(1),
            gas_used: self.gas_estimate,
            status: true,
            logs: self.receipt_logs.lock().unwrap().clone(),
        })
    }
}

/// A development-network config with a known gas multiplier
pub fn test_config() -> NetworkConfig {
    NetworkConfig {
        chain_id: 8996,
        network: "development".to_string(),
        gas_fee_multiplier: Some(1.05),
        ..NetworkConfig::default()
    }
}

pub fn addr(n: u8) -> Address {
    Address::with_last_byte(n)
}

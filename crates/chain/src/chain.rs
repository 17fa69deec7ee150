//! `Chain`: a single ledger — one of potentially many hanging off a
//! [`crate::nexus::Nexus`] — that appends blocks, executes their
//! transactions, and answers read queries against its own storage
//! (spec.md §3 "Chain", §4.3).

use num_bigint::BigInt;
use num_traits::Zero;
use std::collections::HashMap;
use std::rc::Rc;
use vela_core::{Address, Hash256, Timestamp};
use vela_io::Serializable;
use vela_runtime::{BlockContext, ContractRegistry, EventKind, NativeContract, Runtime};
use vela_storage::{ChangeSet, Storage, StorageMap};
use vela_vm::{ExecutionEngine, VMObject, VMState};

use crate::block::Block;
use crate::error::{ChainError, ChainResult};
use crate::transaction::Transaction;

fn seen_transactions() -> StorageMap {
    StorageMap::new(b"chain:txseen:".to_vec())
}

pub struct Chain {
    pub name: String,
    pub address: Address,
    /// The nexus owner, once bootstrapped — native contracts gate
    /// owner-only operations on this (spec.md §4.4, Token's `Create`).
    pub owner: Option<Address>,
    registry: Rc<ContractRegistry>,
    storage: Storage,
    blocks: Vec<Block>,
}

impl Chain {
    pub fn new(name: impl Into<String>, registry: Rc<ContractRegistry>) -> ChainResult<Self> {
        let name = name.into();
        let address = Address::for_contract(&name)?;
        Ok(Self {
            name,
            address,
            owner: None,
            registry,
            storage: Storage::new(),
            blocks: Vec::new(),
        })
    }

    pub fn height(&self) -> u32 {
        self.blocks.len() as u32
    }

    /// Direct storage access for genesis bootstrap and cross-chain
    /// settlement, which both need to commit a `ChangeSet` built outside
    /// `add_block`'s own transaction-execution pipeline.
    pub fn storage_mut(&mut self) -> &mut Storage {
        &mut self.storage
    }

    pub fn storage_ref(&self) -> &Storage {
        &self.storage
    }

    pub fn tip_hash(&self) -> Hash256 {
        self.blocks.last().map(|b| b.content_hash()).unwrap_or(Hash256::ZERO)
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn block_at(&self, height: u32) -> Option<&Block> {
        self.blocks.get(height as usize)
    }

    /// Executes and appends a block of transactions, as the sole producer
    /// of this chain's own height. Replays every transaction against one
    /// forked [`ChangeSet`] shared across the whole block (so a later
    /// transaction can observe an earlier one's same-block writes), and
    /// rejects the entire block atomically if any transaction faults
    /// (spec.md §4.3, "block-level atomicity").
    pub fn add_block(&mut self, producer: Address, timestamp: Timestamp, transactions: Vec<Transaction>) -> ChainResult<&Block> {
        let height = self.height();
        let previous_hash = self.tip_hash();
        let mut change_set = self.storage.fork_change_set();

        let mut transaction_hashes = Vec::with_capacity(transactions.len());
        let mut events = HashMap::with_capacity(transactions.len());

        for tx in &transactions {
            let tx_hash = tx.content_hash();
            if timestamp.secs() > tx.expiration.secs() {
                return Err(ChainError::TransactionExpired(tx_hash));
            }
            if seen_transactions().contains(&change_set, tx_hash.as_bytes()) {
                return Err(ChainError::DuplicateTransaction(tx_hash));
            }
            if !tx.is_fully_signed() {
                return Err(ChainError::MissingWitness(tx_hash));
            }
            let signers = tx.verify_witnesses();

            let block = BlockContext { chain_name: self.name.clone(), height: height as u64, timestamp, producer };
            let tx_events = self.execute_transaction(&mut change_set, block, tx_hash, signers, tx)?;

            seen_transactions().set_bytes(&mut change_set, tx_hash.as_bytes(), vec![1]);
            transaction_hashes.push(tx_hash);
            events.insert(tx_hash, tx_events);
        }

        let block = Block { height, timestamp, previous_hash, producer, transaction_hashes, events };
        self.storage.commit(change_set);
        self.blocks.push(block);
        Ok(self.blocks.last().expect("just pushed"))
    }

    /// Runs one transaction's gas escrow, script, and gas settlement
    /// against `change_set`, as spec.md §4.4's `AllowGas`/`SpendGas`
    /// bracket. `Gas.SpendGas` needs the VM's metered `used_gas` once the
    /// script has finished, so the bracket is applied here rather than
    /// compiled into the transaction's own bytecode.
    fn execute_transaction(
        &self,
        change_set: &mut ChangeSet,
        block: BlockContext,
        tx_hash: Hash256,
        signers: Vec<Address>,
        tx: &Transaction,
    ) -> ChainResult<Vec<vela_runtime::Event>> {
        let mut runtime = Runtime::new(change_set, self.registry.clone(), block, tx_hash, signers, tx.gas_limit, tx.gas_price);
        if let Some(owner) = self.owner {
            runtime.set_owner(owner);
        }

        let allow_args = vec![
            VMObject::Address(tx.payer),
            VMObject::from(tx.gas_price as i64),
            VMObject::from(tx.gas_limit as i64),
        ];
        vela_contracts::GasContract
            .invoke(&mut runtime, "AllowGas", allow_args)
            .map_err(|e| ChainError::TransactionFaulted { hash: tx_hash, reason: e.to_string() })?;

        let script: Rc<[u8]> = Rc::from(tx.script.clone().into_boxed_slice());
        let mut engine = ExecutionEngine::new(script, self.address, tx.gas_limit);
        // Gas metering is bypassed while the fuel token has not yet been
        // minted (spec.md §4.1, "pre-minting bootstrap").
        if vela_contracts::get_supply(runtime.change_set, vela_contracts::FUEL_TOKEN).is_zero() {
            engine.gas_metering_enabled = false;
        }
        let state = engine.run(&mut runtime);
        runtime.used_gas = engine.used_gas;

        if let VMState::Fault(reason) = &state {
            return Err(ChainError::TransactionFaulted { hash: tx_hash, reason: reason.clone() });
        }

        let spend_args = vec![VMObject::Address(tx.payer)];
        vela_contracts::GasContract
            .invoke(&mut runtime, "SpendGas", spend_args)
            .map_err(|e| ChainError::TransactionFaulted { hash: tx_hash, reason: e.to_string() })?;

        let final_state = runtime.finalize(state);
        if let VMState::Fault(reason) = final_state {
            return Err(ChainError::TransactionFaulted { hash: tx_hash, reason });
        }
        Ok(runtime.events)
    }

    /// Runs a read-only native contract call against a throwaway,
    /// discarded change set — for queries like `Token.GetBalance` that
    /// don't need to mutate state (spec.md §4.3, "read-only invocation").
    pub fn invoke_contract(&self, address: &Address, method: &str, args: Vec<VMObject>) -> ChainResult<VMObject> {
        let mut change_set = self.storage.fork_change_set();
        let block = BlockContext {
            chain_name: self.name.clone(),
            height: self.height() as u64,
            timestamp: self.blocks.last().map(|b| b.timestamp).unwrap_or(Timestamp::new(0)),
            producer: self.blocks.last().map(|b| b.producer).unwrap_or(self.address),
        };
        let mut runtime = Runtime::new(&mut change_set, self.registry.clone(), block, Hash256::ZERO, Vec::new(), u64::MAX, 0);
        if let Some(owner) = self.owner {
            runtime.set_owner(owner);
        }
        match self.registry.resolve(address) {
            Some(vela_runtime::Resolved::Native(contract)) => {
                contract.invoke(&mut runtime, method, args).map_err(|e| ChainError::TransactionFaulted {
                    hash: Hash256::ZERO,
                    reason: e.to_string(),
                })
            }
            _ => Err(ChainError::UnknownChain(address.to_hex())),
        }
    }

    pub fn get_token_balance(&self, symbol: &str, address: &Address) -> BigInt {
        let cs = self.storage.fork_change_set();
        vela_contracts::get_balance(&cs, symbol, address)
    }

    pub fn get_token_supply(&self, symbol: &str) -> BigInt {
        let cs = self.storage.fork_change_set();
        vela_contracts::get_supply(&cs, symbol)
    }

    pub fn get_token_ownerships(&self, symbol: &str) -> HashMap<Address, Vec<u64>> {
        let cs = self.storage.fork_change_set();
        vela_contracts::ownerships(&cs, symbol)
    }

    /// Total fee a settled transaction paid, read back from its
    /// `GasPayment` event (spec.md §4.4, `SpendGas`).
    pub fn get_transaction_fee(&self, tx_hash: &Hash256) -> Option<u64> {
        self.blocks.iter().find_map(|b| b.events.get(tx_hash)).and_then(|events| {
            events
                .iter()
                .find(|e| e.kind == EventKind::GasPayment)
                .and_then(|e| e.payload.get(0..8))
                .map(|bytes| u64::from_le_bytes(bytes.try_into().unwrap()))
        })
    }

    /// Releases escrows from expired `Token.SideChainSend` calls back to
    /// their sender without settling them on the destination chain
    /// (SPEC_FULL §3, "escrow-expiry sweep"). Returns how many were
    /// released.
    pub fn sweep_expired_escrows(&mut self, now: Timestamp) -> usize {
        let mut change_set = self.storage.fork_change_set();
        let mut released = 0;
        for block in &self.blocks {
            for (tx_hash, events) in &block.events {
                let Some(escrow_event) = events.iter().find(|e| e.kind == EventKind::TokenEscrow) else {
                    continue;
                };
                if vela_contracts::escrow::is_consumed(&change_set, tx_hash) {
                    continue;
                }
                let Some(record) = vela_contracts::escrow::read(&change_set, tx_hash) else {
                    continue;
                };
                if record.expiration.secs() > now.secs() {
                    continue;
                }
                match &record.nft {
                    Some(nft) => {
                        vela_contracts::unlock_nft(&mut change_set, &record.symbol, &escrow_event.address, nft.id);
                    }
                    None => {
                        vela_contracts::credit(&mut change_set, &record.symbol, &escrow_event.address, &(&record.amount + &record.cross_fee));
                    }
                }
                vela_contracts::escrow::clear_expired(&mut change_set, tx_hash);
                released += 1;
            }
        }
        self.storage.commit(change_set);
        released
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_traits::Zero;
    use vela_contracts::TokenFlags;
    use vela_core::crypto::KeyPair;

    fn setup() -> (Chain, KeyPair, Address) {
        let mut registry = ContractRegistry::new();
        vela_contracts::install_natives(&mut registry);
        let mut chain = Chain::new("main", Rc::new(registry)).unwrap();
        let kp = KeyPair::generate();
        let payer = Address::from_public_key(kp.compressed_public_key());
        chain.owner = Some(payer);

        let mut cs = chain.storage.fork_change_set();
        vela_contracts::create(&mut cs, "KCAL", "Fuel", 10, BigInt::zero(), TokenFlags::FUNGIBLE).unwrap();
        vela_contracts::mint(&mut cs, "KCAL", &payer, &BigInt::from(1_000_000)).unwrap();
        chain.storage.commit(cs);
        (chain, kp, payer)
    }

    fn sign(kp: &KeyPair, mut tx: Transaction) -> Transaction {
        let sig = kp.sign(tx.signing_hash().as_bytes());
        tx.add_signature(kp.compressed_public_key(), sig);
        tx
    }

    #[test]
    fn a_successful_transaction_advances_the_chain_and_pays_its_fee() {
        let (mut chain, kp, payer) = setup();
        let token_address = Address::for_contract("token").unwrap();
        let to = Address::for_contract("recipient").unwrap();

        let tx = Transaction::build_call(
            payer,
            "main",
            &token_address,
            "Mint",
            &[VMObject::Address(payer), VMObject::Address(to), VMObject::from("KCAL".to_string()), VMObject::from(100i64)],
            1,
            100_000,
            Timestamp::new(10_000),
            0,
        );
        let tx = sign(&kp, tx);
        let tx_hash = tx.content_hash();

        chain.add_block(payer, Timestamp::new(1000), vec![tx]).unwrap();
        assert_eq!(chain.height(), 1);
        assert_eq!(chain.get_token_balance("KCAL", &to), BigInt::from(100));
        assert!(chain.get_transaction_fee(&tx_hash).unwrap() > 0);
    }

    #[test]
    fn an_unsigned_transaction_is_rejected_without_mutating_the_chain() {
        let (mut chain, _kp, payer) = setup();
        let token_address = Address::for_contract("token").unwrap();
        let tx = Transaction::build_call(
            payer,
            "main",
            &token_address,
            "Mint",
            &[VMObject::Address(payer), VMObject::Address(payer), VMObject::from("KCAL".to_string()), VMObject::from(1i64)],
            1,
            100_000,
            Timestamp::new(10_000),
            0,
        );
        assert!(chain.add_block(payer, Timestamp::new(1000), vec![tx]).is_err());
        assert_eq!(chain.height(), 0);
    }

    #[test]
    fn a_faulting_transaction_rejects_the_whole_block() {
        let (mut chain, kp, payer) = setup();
        let token_address = Address::for_contract("token").unwrap();
        // Mint from an account not witnessed by the payer's own signature:
        // the Mint call requires the issuer `from` to be a witness, but
        // `from` here is some other, unsigned address.
        let stranger = Address::for_contract("stranger").unwrap();
        let tx = Transaction::build_call(
            payer,
            "main",
            &token_address,
            "Mint",
            &[VMObject::Address(stranger), VMObject::Address(payer), VMObject::from("KCAL".to_string()), VMObject::from(1i64)],
            1,
            100_000,
            Timestamp::new(10_000),
            0,
        );
        let tx = sign(&kp, tx);
        assert!(chain.add_block(payer, Timestamp::new(1000), vec![tx]).is_err());
        assert_eq!(chain.height(), 0);
        assert_eq!(chain.get_token_balance("KCAL", &payer), BigInt::from(1_000_000));
    }
}

//! In-memory test chain enforcing the adjudicator rules the protocol relies
//! on: signature recovery over state hashes, challenge expiry, idempotent
//! conclusion and merkle/pre-image checks for conditional transfers.

use hashlock_swap::channel::{funding_address, SupportedState};
use hashlock_swap::hashlock::lock_hash;
use hashlock_swap::ledger::{
    ChallengeRequest, Ledger, LedgerError, LedgerEvent, RevertReason, TxReceipt,
};
use hashlock_swap::sig::recover_signer;
use hashlock_swap::transfer::{verify_proof, ConditionalTransfer, TransferResolver};
use hashlock_swap::{Address, Bytes32, Hash, Signature, U256};
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Channel factory and mastercopy the simulated chain "deployed" at genesis.
const CHANNEL_FACTORY: Address = Address([0xfa; 20]);
const MASTERCOPY_INIT_CODE_HASH: Hash = Hash([0x3d; 32]);

const DEPOSIT_GAS: u64 = 45_000;
const CONCLUDE_GAS: u64 = 110_000;
const CHALLENGE_GAS: u64 = 95_000;
const PUSH_OUTCOME_GAS: u64 = 70_000;
const REGISTER_ROOT_GAS: u64 = 44_000;
const DEFUND_TRANSFER_GAS: u64 = 60_000;
const EXIT_GAS: u64 = 30_000;

struct ChallengeRecord {
    state_hash: Hash,
    turn_num: u64,
    expires_at: u64,
}

#[derive(Default)]
struct Chain {
    now: u64,
    balances: HashMap<Bytes32, U256>,
    holdings: HashMap<Hash, U256>,
    events: Vec<LedgerEvent>,
    challenges: HashMap<Hash, ChallengeRecord>,
    concluded: HashSet<Hash>,
    transfer_roots: HashMap<Hash, Hash>,
    defunded_transfers: HashSet<Hash>,
    exitable: HashMap<(Hash, Bytes32), U256>,
}

impl Chain {
    fn pay_out(&mut self, channel: Hash, outcome: &hashlock_swap::channel::Outcome) -> Result<(), LedgerError> {
        let held = self.holdings.get(&channel).copied().unwrap_or_default();
        if held < outcome.total() {
            return Err(LedgerError::Reverted(RevertReason::InsufficientBalance));
        }
        self.holdings.insert(channel, held - outcome.total());
        for alloc in &outcome.0 {
            let balance = self.balances.entry(alloc.destination).or_default();
            *balance += alloc.amount;
        }
        Ok(())
    }
}

pub struct SimulatedLedger {
    id: U256,
    chain: Mutex<Chain>,
}

impl SimulatedLedger {
    pub fn new(id: u64) -> Self {
        SimulatedLedger {
            id: id.into(),
            chain: Mutex::new(Chain {
                now: 1_000,
                ..Chain::default()
            }),
        }
    }

    /// Seed a destination with tokens, like preloading a ganache account.
    pub fn mint(&self, destination: Bytes32, amount: U256) {
        let mut chain = self.chain.lock().unwrap();
        *chain.balances.entry(destination).or_default() += amount;
    }

    fn wait_for_event<F>(
        &self,
        name: &'static str,
        timeout: Duration,
        matches: F,
    ) -> Result<LedgerEvent, LedgerError>
    where
        F: Fn(&LedgerEvent) -> bool,
    {
        let deadline = Instant::now() + timeout;
        loop {
            {
                let chain = self.chain.lock().unwrap();
                if let Some(event) = chain.events.iter().find(|e| matches(e)) {
                    return Ok(event.clone());
                }
            }
            if Instant::now() >= deadline {
                return Err(LedgerError::EventTimeout {
                    event: name,
                    timeout,
                });
            }
            std::thread::sleep(Duration::from_millis(2));
        }
    }
}

impl Ledger for SimulatedLedger {
    fn ledger_id(&self) -> U256 {
        self.id
    }

    fn block_timestamp(&self) -> u64 {
        self.chain.lock().unwrap().now
    }

    fn advance_time(&self, secs: u64) -> Result<(), LedgerError> {
        self.chain.lock().unwrap().now += secs;
        Ok(())
    }

    fn channel_address(&self, channel: Hash) -> Address {
        funding_address(CHANNEL_FACTORY, channel, MASTERCOPY_INIT_CODE_HASH)
    }

    fn holdings(&self, channel: Hash) -> U256 {
        self.chain
            .lock()
            .unwrap()
            .holdings
            .get(&channel)
            .copied()
            .unwrap_or_default()
    }

    fn balance_of(&self, destination: Bytes32) -> U256 {
        self.chain
            .lock()
            .unwrap()
            .balances
            .get(&destination)
            .copied()
            .unwrap_or_default()
    }

    fn deposit(
        &self,
        channel: Hash,
        expected_held: U256,
        amount: U256,
        from: Bytes32,
    ) -> Result<TxReceipt, LedgerError> {
        let mut chain = self.chain.lock().unwrap();
        let held = chain.holdings.get(&channel).copied().unwrap_or_default();
        if held != expected_held {
            return Err(LedgerError::Reverted(RevertReason::WrongExpectedHeld));
        }
        let balance = chain.balances.get(&from).copied().unwrap_or_default();
        if balance < amount {
            return Err(LedgerError::Reverted(RevertReason::InsufficientBalance));
        }
        chain.balances.insert(from, balance - amount);
        chain.holdings.insert(channel, held + amount);
        let event = LedgerEvent::Deposited {
            channel,
            amount,
            destination_holdings: held + amount,
        };
        chain.events.push(event.clone());
        Ok(TxReceipt {
            gas_used: DEPOSIT_GAS,
            events: vec![event],
        })
    }

    fn wait_for_deposit(
        &self,
        channel: Hash,
        timeout: Duration,
    ) -> Result<LedgerEvent, LedgerError> {
        self.wait_for_event("Deposited", timeout, |e| {
            matches!(e, LedgerEvent::Deposited { channel: c, .. } if *c == channel)
        })
    }

    fn conclude(&self, conclusion: &SupportedState) -> Result<TxReceipt, LedgerError> {
        let state = &conclusion.state;
        let channel = state.channel_id();
        let mut chain = self.chain.lock().unwrap();
        if !state.is_final {
            return Err(LedgerError::Reverted(RevertReason::NotFinal));
        }
        if chain.concluded.contains(&channel) {
            return Err(LedgerError::Reverted(RevertReason::AlreadyConcluded));
        }
        let hash = state.hash();
        for (idx, participant) in state.channel().participants.iter().enumerate() {
            let recovered = recover_signer(hash, conclusion.sigs[idx])
                .map_err(|_| LedgerError::Reverted(RevertReason::InvalidSignature))?;
            if recovered != *participant {
                return Err(LedgerError::Reverted(RevertReason::InvalidSignature));
            }
        }
        chain.pay_out(channel, &state.outcome)?;
        chain.concluded.insert(channel);
        let event = LedgerEvent::Concluded { channel };
        chain.events.push(event.clone());
        Ok(TxReceipt {
            gas_used: CONCLUDE_GAS,
            events: vec![event],
        })
    }

    fn wait_for_concluded(
        &self,
        channel: Hash,
        timeout: Duration,
    ) -> Result<LedgerEvent, LedgerError> {
        self.wait_for_event("Concluded", timeout, |e| {
            matches!(e, LedgerEvent::Concluded { channel: c } if *c == channel)
        })
    }

    fn challenge(&self, request: &ChallengeRequest) -> Result<TxReceipt, LedgerError> {
        let contested = &request.contested.state;
        let channel = contested.channel_id();
        let mut chain = self.chain.lock().unwrap();
        if chain.concluded.contains(&channel) {
            return Err(LedgerError::Reverted(RevertReason::AlreadyConcluded));
        }
        if request.precursor.state.channel_id() != channel
            || contested.turn_num() != request.precursor.state.turn_num() + 1
        {
            return Err(LedgerError::Reverted(RevertReason::UnsupportedChallenge));
        }
        let first = request
            .precursor
            .signer_idx()
            .map_err(|_| LedgerError::Reverted(RevertReason::InvalidSignature))?;
        let second = request
            .contested
            .signer_idx()
            .map_err(|_| LedgerError::Reverted(RevertReason::InvalidSignature))?;
        if first == second {
            return Err(LedgerError::Reverted(RevertReason::UnsupportedChallenge));
        }
        if let Some(existing) = chain.challenges.get(&channel) {
            if existing.turn_num >= contested.turn_num() {
                return Err(LedgerError::Reverted(RevertReason::StaleChallenge));
            }
        }
        let expires_at = chain.now + contested.challenge_duration;
        chain.challenges.insert(
            channel,
            ChallengeRecord {
                state_hash: contested.hash(),
                turn_num: contested.turn_num(),
                expires_at,
            },
        );
        let event = LedgerEvent::Challenged {
            channel,
            turn_num: contested.turn_num(),
            expires_at,
        };
        chain.events.push(event.clone());
        Ok(TxReceipt {
            gas_used: CHALLENGE_GAS,
            events: vec![event],
        })
    }

    fn push_outcome_and_transfer_all(
        &self,
        channel: Hash,
        state: &hashlock_swap::channel::ChannelState,
    ) -> Result<TxReceipt, LedgerError> {
        let mut chain = self.chain.lock().unwrap();
        let (expires_at, challenged_hash) = chain
            .challenges
            .get(&channel)
            .map(|record| (record.expires_at, record.state_hash))
            .ok_or(LedgerError::Reverted(RevertReason::NoChallenge))?;
        if chain.now < expires_at {
            return Err(LedgerError::Reverted(RevertReason::ChallengeNotExpired {
                remaining: expires_at - chain.now,
            }));
        }
        if chain.concluded.contains(&channel) {
            return Err(LedgerError::Reverted(RevertReason::AlreadyConcluded));
        }
        if state.hash() != challenged_hash {
            return Err(LedgerError::Reverted(RevertReason::WrongPushedState));
        }
        chain.pay_out(channel, &state.outcome)?;
        chain.concluded.insert(channel);
        let event = LedgerEvent::OutcomePushed { channel };
        chain.events.push(event.clone());
        Ok(TxReceipt {
            gas_used: PUSH_OUTCOME_GAS,
            events: vec![event],
        })
    }

    fn register_transfer_root(&self, channel: Hash, root: Hash) -> Result<TxReceipt, LedgerError> {
        let mut chain = self.chain.lock().unwrap();
        if chain.concluded.contains(&channel) {
            return Err(LedgerError::Reverted(RevertReason::AlreadyConcluded));
        }
        chain.transfer_roots.insert(channel, root);
        Ok(TxReceipt {
            gas_used: REGISTER_ROOT_GAS,
            events: vec![],
        })
    }

    fn defund_transfer(
        &self,
        transfer: &ConditionalTransfer,
        state_encoding: &[u8],
        resolver_encoding: &[u8],
        counter_sig: Signature,
        proof: &[Hash],
    ) -> Result<TxReceipt, LedgerError> {
        let channel = transfer.channel_id;
        let transfer_id = transfer.hash();
        let mut chain = self.chain.lock().unwrap();
        let root = *chain
            .transfer_roots
            .get(&channel)
            .ok_or(LedgerError::Reverted(RevertReason::NoTransferRoot))?;
        if state_encoding != transfer.encode_state() || !verify_proof(root, transfer_id, proof) {
            return Err(LedgerError::Reverted(RevertReason::InvalidProof));
        }
        if chain.defunded_transfers.contains(&transfer_id) {
            return Err(LedgerError::Reverted(
                RevertReason::TransferAlreadyDefunded,
            ));
        }
        let resolver = TransferResolver::decode(resolver_encoding)
            .map_err(|_| LedgerError::Reverted(RevertReason::InvalidResolver))?;
        if lock_hash(&resolver.pre_image) != transfer.lock_hash {
            return Err(LedgerError::Reverted(RevertReason::InvalidResolver));
        }
        let recovered = recover_signer(transfer_id, counter_sig)
            .map_err(|_| LedgerError::Reverted(RevertReason::InvalidSignature))?;
        if recovered != transfer.responder {
            return Err(LedgerError::Reverted(RevertReason::InvalidSignature));
        }

        let held = chain.holdings.get(&channel).copied().unwrap_or_default();
        if held < transfer.amount {
            return Err(LedgerError::Reverted(RevertReason::InsufficientBalance));
        }
        chain.holdings.insert(channel, held - transfer.amount);
        *chain
            .exitable
            .entry((channel, transfer.beneficiary))
            .or_default() += transfer.amount;
        chain.defunded_transfers.insert(transfer_id);
        let event = LedgerEvent::TransferDefunded {
            channel,
            transfer_id,
        };
        chain.events.push(event.clone());
        Ok(TxReceipt {
            gas_used: DEFUND_TRANSFER_GAS,
            events: vec![event],
        })
    }

    fn exit(&self, channel: Hash, destination: Bytes32) -> Result<TxReceipt, LedgerError> {
        let mut chain = self.chain.lock().unwrap();
        let amount = chain
            .exitable
            .remove(&(channel, destination))
            .ok_or(LedgerError::Reverted(RevertReason::NothingToExit))?;
        *chain.balances.entry(destination).or_default() += amount;
        let event = LedgerEvent::Exited {
            channel,
            destination,
            amount,
        };
        chain.events.push(event.clone());
        Ok(TxReceipt {
            gas_used: EXIT_GAS,
            events: vec![event],
        })
    }
}

/// Initialize the `log` sink once per test binary.
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

// Scripted collaborators shared by the integration tests.
#![allow(dead_code)]

use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicBool, AtomicU64, Ordering},
        Arc, Mutex,
    },
};

use async_trait::async_trait;
use candymint_client::{
    config::{MintConfig, Settings},
    error::{ClientError, RpcError, WalletSessionError},
    metadata::{MetadataResolver, MintedItem},
    orchestrator::{Orchestrator, SharedOrchestrator},
    rpc_gateway::LedgerRpc,
    transaction::{SignedTransaction, UnsignedTransaction},
    wallet_session::{AdapterKind, WalletSession},
};
use candymint_common::{
    api::TransactionStatus,
    crypto::{Address, Blockhash, Signature, KEY_SIZE},
    machine::MachineSnapshot,
    network::Network,
    serializer::Serializer,
};
use tokio::sync::Notify;

pub fn machine_address() -> Address {
    Address::new([42u8; KEY_SIZE])
}

pub fn snapshot(items_available: u64, items_redeemed: u64) -> MachineSnapshot {
    MachineSnapshot {
        authority: Address::new([1u8; KEY_SIZE]),
        treasury: Address::new([2u8; KEY_SIZE]),
        token_mint: None,
        items_redeemed,
        uuid: "cndy01".to_string(),
        price_lamports: 1_000_000_000,
        go_live_timestamp: None,
        whitelist: None,
        items_available,
    }
}

pub fn test_settings() -> Settings {
    Settings::load(&MintConfig {
        machine_address: Some(machine_address().to_string()),
        network: Some(Network::Devnet),
        rpc_url: Some("http://127.0.0.1:18899".to_string()),
        confirmation_timeout: 5_000,
        refresh_interval: 20,
        rpc_timeout: 1_000,
    })
    .expect("test settings must be valid")
}

pub fn build(
    ledger: &Arc<MockLedger>,
    wallet: &Arc<MockWallet>,
    resolver: &Arc<MockResolver>,
) -> SharedOrchestrator {
    Orchestrator::new(
        ledger.clone(),
        wallet.clone(),
        resolver.clone(),
        test_settings(),
    )
}

// ---- ledger ----

pub struct MockLedger {
    accounts: Mutex<HashMap<Address, Vec<u8>>>,
    // swapped into the machine account when a transaction is submitted
    post_mint_account: Mutex<Option<(Address, Vec<u8>)>>,
    status: Mutex<TransactionStatus>,
    read_count: AtomicU64,
    fail_reads: AtomicBool,
    read_gate: Mutex<Option<Arc<Notify>>>,
}

impl MockLedger {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            accounts: Mutex::new(HashMap::new()),
            post_mint_account: Mutex::new(None),
            status: Mutex::new(TransactionStatus::Confirmed),
            read_count: AtomicU64::new(0),
            fail_reads: AtomicBool::new(false),
            read_gate: Mutex::new(None),
        })
    }

    pub fn set_account(&self, address: Address, data: Vec<u8>) {
        self.accounts.lock().unwrap().insert(address, data);
    }

    pub fn set_machine(&self, snapshot: &MachineSnapshot) {
        self.set_account(machine_address(), snapshot.to_bytes());
    }

    pub fn set_post_mint_machine(&self, snapshot: &MachineSnapshot) {
        *self.post_mint_account.lock().unwrap() = Some((machine_address(), snapshot.to_bytes()));
    }

    pub fn set_status(&self, status: TransactionStatus) {
        *self.status.lock().unwrap() = status;
    }

    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    // every subsequent read blocks until the returned gate is notified
    pub fn gate_reads(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.read_gate.lock().unwrap() = Some(Arc::clone(&gate));
        gate
    }

    pub fn read_count(&self) -> u64 {
        self.read_count.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LedgerRpc for MockLedger {
    async fn read_account(&self, address: &Address) -> Result<Vec<u8>, RpcError> {
        self.read_count.fetch_add(1, Ordering::SeqCst);

        let gate = self.read_gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }

        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(RpcError::Node {
                code: -1,
                message: "account unavailable".to_string(),
            });
        }

        self.accounts
            .lock()
            .unwrap()
            .get(address)
            .cloned()
            .ok_or_else(|| RpcError::Node {
                code: -2,
                message: "account not found".to_string(),
            })
    }

    async fn send_transaction(
        &self,
        transaction: &SignedTransaction,
    ) -> Result<Signature, RpcError> {
        if let Some((address, data)) = self.post_mint_account.lock().unwrap().take() {
            self.accounts.lock().unwrap().insert(address, data);
        }
        Ok(*transaction.id())
    }

    async fn get_transaction_status(
        &self,
        _signature: &Signature,
    ) -> Result<TransactionStatus, RpcError> {
        Ok(self.status.lock().unwrap().clone())
    }

    async fn get_latest_blockhash(&self) -> Result<Blockhash, RpcError> {
        Ok(Blockhash::new([9u8; KEY_SIZE]))
    }
}

// ---- wallet ----

pub struct MockWallet {
    identity: Address,
    connected: AtomicBool,
    reject_connect: AtomicBool,
    reject_signing: AtomicBool,
    kind: Mutex<AdapterKind>,
    sign_gate: Mutex<Option<Arc<Notify>>>,
}

impl MockWallet {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            identity: Address::new([7u8; KEY_SIZE]),
            connected: AtomicBool::new(false),
            reject_connect: AtomicBool::new(false),
            reject_signing: AtomicBool::new(false),
            kind: Mutex::new(AdapterKind::Browser),
            sign_gate: Mutex::new(None),
        })
    }

    pub fn reject_connect(&self) {
        self.reject_connect.store(true, Ordering::SeqCst);
    }

    pub fn reject_signing(&self) {
        self.reject_signing.store(true, Ordering::SeqCst);
    }

    pub fn set_adapter_kind(&self, kind: AdapterKind) {
        *self.kind.lock().unwrap() = kind;
    }

    // every subsequent sign call blocks until the returned gate is notified
    pub fn gate_signing(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.sign_gate.lock().unwrap() = Some(Arc::clone(&gate));
        gate
    }
}

#[async_trait]
impl WalletSession for MockWallet {
    async fn connect(&self) -> Result<Address, WalletSessionError> {
        if self.reject_connect.load(Ordering::SeqCst) {
            return Err(WalletSessionError::Rejected);
        }
        self.connected.store(true, Ordering::SeqCst);
        Ok(self.identity)
    }

    async fn disconnect(&self) {
        self.connected.store(false, Ordering::SeqCst);
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    fn identity(&self) -> Option<Address> {
        self.is_connected().then_some(self.identity)
    }

    fn adapter_kind(&self) -> AdapterKind {
        *self.kind.lock().unwrap()
    }

    async fn sign(
        &self,
        transaction: &UnsignedTransaction,
    ) -> Result<SignedTransaction, WalletSessionError> {
        let gate = self.sign_gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }

        if self.reject_signing.load(Ordering::SeqCst) {
            return Err(WalletSessionError::Rejected);
        }

        Ok(SignedTransaction::new(
            transaction.clone(),
            Signature::new([7u8; SIGNATURE_BYTES]),
        ))
    }
}

const SIGNATURE_BYTES: usize = 64;

// ---- metadata ----

pub struct MockResolver {
    fail: AtomicBool,
}

impl MockResolver {
    pub fn ok() -> Arc<Self> {
        Arc::new(Self {
            fail: AtomicBool::new(false),
        })
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            fail: AtomicBool::new(true),
        })
    }
}

#[async_trait]
impl MetadataResolver for MockResolver {
    async fn resolve(&self, mint: &Address) -> Result<MintedItem, ClientError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(ClientError::MetadataUnavailable(
                "metadata account missing".to_string(),
            ));
        }
        Ok(MintedItem {
            mint_address: *mint,
            image_uri: Some("https://img.example/item.png".to_string()),
        })
    }
}

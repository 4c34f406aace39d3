//! Session state machine driving connect and mint attempts.
//!
//! All client-visible state lives in a single [`ClientView`] value
//! behind a watch channel: it is replaced atomically, never patched in
//! place, so a reader can never observe a torn update. Guarded
//! transitions run inside the channel's modify section, which is what
//! enforces the single-in-flight-mint rule — there is no separate
//! lock or flag to keep in sync.

use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};

use candymint_common::{
    crypto::{Address, Signature},
    machine::MachineSnapshot,
    serializer::Serializer,
    time::{
        get_current_time_in_millis, get_current_time_in_seconds, TimestampMillis, TimestampSeconds,
    },
};
use log::{debug, info, warn};
use tokio::sync::{broadcast, watch, Mutex};

use crate::{
    config::Settings,
    error::{ClientError, ErrorKind, ErrorRecord, RpcError, WalletSessionError},
    machine_reader::MachineReader,
    metadata::{MintedItem, SharedMetadataResolver},
    price::resolve_price_lamports,
    refresh::{RefreshScheduler, SharedRefreshScheduler},
    rpc_gateway::SharedLedgerRpc,
    transaction::build_mint_transaction,
    wallet_session::{AdapterKind, SharedWalletSession},
};

const EVENTS_CHANNEL_CAPACITY: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionStatus {
    #[default]
    Disconnected,
    Connecting,
    Connected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MintStatus {
    #[default]
    Idle,
    Submitting,
    AwaitingConfirmation,
    Succeeded,
    Failed,
}

impl MintStatus {
    pub fn is_in_flight(&self) -> bool {
        matches!(self, MintStatus::Submitting | MintStatus::AwaitingConfirmation)
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct SessionState {
    pub connection: ConnectionStatus,
    pub mint: MintStatus,
    pub last_error: Option<ErrorRecord>,
}

/// Read-only view exposed to the presentation layer. It is the single
/// source of truth: the renderer must not derive parallel state.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ClientView {
    pub snapshot: Option<MachineSnapshot>,
    pub session: SessionState,
    pub minted: Option<MintedItem>,
    pub refreshed_at: Option<TimestampMillis>,
}

#[derive(Debug, Clone)]
pub enum Event {
    Connected { identity: Address },
    Disconnected,
    SnapshotUpdated,
    MintSubmitted { signature: Signature },
    MintSucceeded { mint: Address },
    MintFailed { kind: ErrorKind },
}

/// Result of a connect intent. When `suppress_default_action` is set
/// the presentation layer must cancel the default action of the input
/// event that triggered the connect — remote adapters complete their
/// handshake through the connect call itself, and letting the default
/// action run would tear it down.
#[derive(Debug, Clone, Copy)]
pub struct ConnectOutcome {
    pub identity: Address,
    pub suppress_default_action: bool,
}

struct MintOutcome {
    minted: MintedItem,
    warning: Option<ClientError>,
}

pub type SharedOrchestrator = Arc<Orchestrator>;

pub struct Orchestrator {
    ledger: SharedLedgerRpc,
    wallet: SharedWalletSession,
    resolver: SharedMetadataResolver,
    reader: MachineReader,
    settings: Settings,
    view: watch::Sender<ClientView>,
    events: broadcast::Sender<Event>,
    // bumped whenever pending asynchronous results must be discarded
    generation: AtomicU64,
    refresh: Mutex<Option<SharedRefreshScheduler>>,
}

impl Orchestrator {
    pub fn new(
        ledger: SharedLedgerRpc,
        wallet: SharedWalletSession,
        resolver: SharedMetadataResolver,
        settings: Settings,
    ) -> SharedOrchestrator {
        let reader = MachineReader::new(Arc::clone(&ledger), settings.machine_address);
        let (view, _) = watch::channel(ClientView::default());
        let (events, _) = broadcast::channel(EVENTS_CHANNEL_CAPACITY);

        Arc::new(Self {
            ledger,
            wallet,
            resolver,
            reader,
            settings,
            view,
            events,
            generation: AtomicU64::new(0),
            refresh: Mutex::new(None),
        })
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn view(&self) -> watch::Receiver<ClientView> {
        self.view.subscribe()
    }

    pub fn current_view(&self) -> ClientView {
        self.view.borrow().clone()
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<Event> {
        self.events.subscribe()
    }

    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    fn propagate_event(&self, event: Event) {
        // losing events because nobody listens is fine
        let _ = self.events.send(event);
    }

    fn record_error(&self, error: &ClientError) {
        self.view.send_modify(|view| {
            view.session.last_error = Some(ErrorRecord::capture(error));
        });
    }

    // ---- connection ----

    pub async fn request_connect(self: &Arc<Self>) -> Result<ConnectOutcome, ClientError> {
        let mut busy = false;
        self.view.send_modify(|view| {
            if view.session.connection != ConnectionStatus::Disconnected {
                busy = true;
            } else {
                view.session.connection = ConnectionStatus::Connecting;
            }
        });
        if busy {
            return Err(ClientError::Precondition("a wallet session is already active"));
        }

        match self.wallet.connect().await {
            Ok(identity) => {
                info!("Wallet connected: {}", identity);
                self.view.send_modify(|view| {
                    view.session.connection = ConnectionStatus::Connected;
                    view.session.last_error = None;
                });
                self.propagate_event(Event::Connected { identity });
                self.start_refresh().await;

                Ok(ConnectOutcome {
                    identity,
                    suppress_default_action: matches!(
                        self.wallet.adapter_kind(),
                        AdapterKind::MobileRemote
                    ),
                })
            }
            Err(e) => {
                let error = ClientError::from(e);
                self.view.send_modify(|view| {
                    view.session.connection = ConnectionStatus::Disconnected;
                    view.session.last_error = Some(ErrorRecord::capture(&error));
                });
                Err(error)
            }
        }
    }

    // Tear the session down. Any refresh or mint result still in
    // flight is invalidated and will be discarded on arrival.
    pub async fn disconnect(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.stop_refresh().await;
        self.wallet.disconnect().await;
        self.view.send_modify(|view| *view = ClientView::default());
        self.propagate_event(Event::Disconnected);
        debug!("Session disconnected");
    }

    async fn start_refresh(self: &Arc<Self>) {
        let mut guard = self.refresh.lock().await;
        if guard.is_none() {
            let scheduler =
                RefreshScheduler::new(Arc::clone(self), self.settings.refresh_interval);
            if let Err(e) = scheduler.start().await {
                warn!("Could not start refresh scheduler: {}", e);
            }
            *guard = Some(scheduler);
        }
    }

    async fn stop_refresh(&self) {
        if let Some(scheduler) = self.refresh.lock().await.take() {
            scheduler.stop().await;
        }
    }

    // ---- snapshot path ----

    /// Fetch the machine state now and apply it, unless the session
    /// was invalidated in the meantime.
    pub async fn refresh_now(&self) -> Result<(), ClientError> {
        self.refresh_snapshot(self.generation()).await
    }

    pub(crate) async fn refresh_snapshot(&self, generation: u64) -> Result<(), ClientError> {
        let result = self.reader.fetch().await;
        match result {
            Ok(snapshot) => {
                let mut applied = false;
                self.view.send_modify(|view| {
                    if generation != self.generation.load(Ordering::SeqCst) {
                        return;
                    }
                    view.snapshot = Some(snapshot.clone());
                    view.refreshed_at = Some(get_current_time_in_millis());
                    applied = true;
                });

                if applied {
                    self.propagate_event(Event::SnapshotUpdated);
                } else {
                    debug!("Discarding stale machine state fetch");
                }
                Ok(())
            }
            Err(e) => {
                if generation == self.generation() {
                    self.record_error(&e);
                }
                Err(e)
            }
        }
    }

    // ---- mint ----

    /// Drive one mint attempt end-to-end. Guard violations fail fast
    /// with a precondition error and change no state; any later
    /// failure resolves the attempt to `Failed` with its error kind.
    /// Either way the machine state is refreshed immediately after,
    /// so displayed supply never lags a completed mint.
    pub async fn request_mint(&self) -> Result<(), ClientError> {
        let generation = self.generation();
        let (payer, snapshot) = self.begin_mint()?;

        let outcome = self.run_mint_pipeline(generation, payer, &snapshot).await;
        let result = self.finish_mint(generation, outcome);

        if generation == self.generation() {
            // refresh regardless of the outcome; its own errors are
            // already captured in the view
            let _ = self.refresh_snapshot(generation).await;
        }

        result
    }

    /// Leave a settled attempt: `Succeeded`/`Failed` back to `Idle`,
    /// clearing the acquired-item slot and the last error.
    pub fn reset_mint(&self) {
        self.view.send_modify(|view| {
            if matches!(view.session.mint, MintStatus::Succeeded | MintStatus::Failed) {
                view.session.mint = MintStatus::Idle;
                view.minted = None;
                view.session.last_error = None;
            }
        });
    }

    // Guarded `Idle/Succeeded/Failed -> Submitting` transition. Runs
    // inside the view modify section so no second intent can slip in
    // between the check and the transition.
    fn begin_mint(&self) -> Result<(Address, MachineSnapshot), ClientError> {
        let identity = self.wallet.identity();
        let now = get_current_time_in_seconds();

        let mut outcome: Result<(Address, MachineSnapshot), &'static str> =
            Err("guard evaluation did not run");
        self.view.send_modify(|view| {
            outcome = match check_mint_guards(view, identity, now) {
                Ok(context) => {
                    view.session.mint = MintStatus::Submitting;
                    view.session.last_error = None;
                    Ok(context)
                }
                Err(reason) => Err(reason),
            };
        });

        outcome.map_err(ClientError::Precondition)
    }

    async fn run_mint_pipeline(
        &self,
        generation: u64,
        payer: Address,
        snapshot: &MachineSnapshot,
    ) -> Result<MintOutcome, ClientError> {
        let price = resolve_price_lamports(snapshot)?;
        let blockhash = self.ledger.get_latest_blockhash().await?;

        let (transaction, mint_account) = build_mint_transaction(
            payer,
            *self.reader.address(),
            snapshot,
            price,
            blockhash,
        );

        // signing may require out-of-band user interaction; no state
        // lock is held across this await
        let mut signed = self.wallet.sign(&transaction).await.map_err(|e| match e {
            WalletSessionError::Rejected => ClientError::WalletRejected,
            other => ClientError::Wallet(other),
        })?;
        signed.push_signature(mint_account.sign(&transaction.to_bytes()));

        let signature = self.ledger.send_transaction(&signed).await?;
        info!("Mint transaction submitted: {}", signature);

        self.transition_mint(generation, MintStatus::AwaitingConfirmation);
        self.propagate_event(Event::MintSubmitted { signature });

        match self
            .ledger
            .confirm_transaction(&signature, self.settings.confirmation_timeout)
            .await
        {
            Ok(()) => {}
            // broadcast is irrevocable; an exhausted wait leaves the
            // final outcome unknown rather than failed on-chain
            Err(RpcError::Timeout) => {
                return Err(ClientError::Unconfirmed(
                    self.settings.confirmation_timeout.as_millis() as u64,
                ))
            }
            Err(e) => return Err(e.into()),
        }

        // the chain-level mint is done; metadata resolution is best
        // effort and only ever downgrades to a warning
        let mint = mint_account.address();
        match self.resolver.resolve(&mint).await {
            Ok(minted) => Ok(MintOutcome {
                minted,
                warning: None,
            }),
            Err(e) => Ok(MintOutcome {
                minted: MintedItem {
                    mint_address: mint,
                    image_uri: None,
                },
                warning: Some(e),
            }),
        }
    }

    fn transition_mint(&self, generation: u64, status: MintStatus) {
        self.view.send_modify(|view| {
            if generation != self.generation.load(Ordering::SeqCst) {
                return;
            }
            view.session.mint = status;
        });
    }

    fn finish_mint(
        &self,
        generation: u64,
        outcome: Result<MintOutcome, ClientError>,
    ) -> Result<(), ClientError> {
        if generation != self.generation() {
            debug!("Discarding mint outcome from an invalidated session");
            return outcome.map(|_| ());
        }

        match outcome {
            Ok(MintOutcome { minted, warning }) => {
                let mint = minted.mint_address;
                self.view.send_modify(|view| {
                    if generation != self.generation.load(Ordering::SeqCst) {
                        return;
                    }
                    view.session.mint = MintStatus::Succeeded;
                    view.session.last_error = warning.as_ref().map(ErrorRecord::capture);
                    view.minted = Some(minted.clone());
                });
                self.propagate_event(Event::MintSucceeded { mint });
                Ok(())
            }
            Err(e) => {
                self.view.send_modify(|view| {
                    if generation != self.generation.load(Ordering::SeqCst) {
                        return;
                    }
                    // never leave the attempt stuck in flight
                    view.session.mint = MintStatus::Failed;
                    view.session.last_error = Some(ErrorRecord::capture(&e));
                });
                self.propagate_event(Event::MintFailed { kind: e.kind() });
                Err(e)
            }
        }
    }
}

// Guard order matters for the sold-out case: it must reject even when
// no wallet is connected.
fn check_mint_guards(
    view: &ClientView,
    identity: Option<Address>,
    now: TimestampSeconds,
) -> Result<(Address, MachineSnapshot), &'static str> {
    if let Some(snapshot) = &view.snapshot {
        if snapshot.is_sold_out() {
            return Err("machine is sold out");
        }
    }

    if view.session.mint.is_in_flight() {
        return Err("another mint attempt is in flight");
    }

    if view.session.connection != ConnectionStatus::Connected {
        return Err("wallet is not connected");
    }

    let snapshot = match &view.snapshot {
        Some(snapshot) => snapshot.clone(),
        None => return Err("machine state is not loaded yet"),
    };

    if !snapshot.is_live(now) {
        return Err("mint has not gone live yet");
    }

    match identity {
        Some(payer) => Ok((payer, snapshot)),
        None => Err("wallet exposes no identity"),
    }
}

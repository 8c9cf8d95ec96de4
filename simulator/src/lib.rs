use axum::{
    body::Bytes,
    extract::{ws::WebSocketUpgrade, State as AxumState},
    http::{header, Method, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use clickfarm_execution::{nonce, views, Layer, Memory, State};
use clickfarm_types::{
    api::{
        AuctionView, FactoryView, QueueView, Submission, ToolView, Update, UpdatesFilter,
        UpgradeView,
    },
    execution::{Event, Key, Output, Transaction, Value},
    factory::{Asset, Catalog},
};
use commonware_codec::{DecodeExt, Encode};
use commonware_cryptography::{
    ed25519::{Batch, PublicKey},
    BatchVerifier,
};
use commonware_utils::from_hex;
use futures::{executor::block_on, SinkExt, StreamExt};
use std::{
    sync::{Arc, RwLock},
    time::{SystemTime, UNIX_EPOCH},
};
use tokio::sync::broadcast;
use tower_governor::{
    governor::GovernorConfigBuilder, key_extractor::SmartIpKeyExtractor, GovernorLayer,
};
use tower_http::cors::{Any, CorsLayer};

pub mod config;

pub use config::{Config, ConfigError, ValidatedConfig};

/// Seconds since the unix epoch.
pub fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs())
        .unwrap_or_default()
}

struct Chain {
    state: Memory,
    height: u64,
    timestamp: u64,
}

/// Single-process chain: every submission is executed immediately as its own block.
#[derive(Clone)]
pub struct Simulator {
    authority: PublicKey,
    chain: Arc<RwLock<Chain>>,
    update_tx: broadcast::Sender<Update>,
}

impl Simulator {
    /// Create a simulator and apply the configured genesis at `now`.
    ///
    /// Fails if any genesis instruction is rejected.
    pub fn new(config: &ValidatedConfig, now: u64) -> Result<Self, ConfigError> {
        let (update_tx, _) = broadcast::channel(1024);
        let chain = Arc::new(RwLock::new(Chain {
            state: Memory::default(),
            height: 0,
            timestamp: now,
        }));
        let simulator = Self {
            authority: config.authority.clone(),
            chain,
            update_tx,
        };

        let genesis = (0u64..)
            .zip(config.genesis.iter().cloned())
            .map(|(nonce, instruction)| Transaction::sign(&config.signer, nonce, instruction))
            .collect::<Vec<_>>();
        let count = genesis.len();
        if let Some(update) = simulator.execute(genesis, now) {
            for output in update.outputs {
                if let Output::Event(Event::Error { code, message, .. }) = output {
                    return Err(ConfigError::GenesisRejected { code, message });
                }
            }
        }
        tracing::info!(instructions = count, "applied genesis");

        Ok(simulator)
    }

    pub fn authority(&self) -> &PublicKey {
        &self.authority
    }

    /// Execute `transactions` as the next block.
    ///
    /// Block time never runs backwards: a `now` older than the previous block
    /// reuses the previous timestamp.
    pub fn execute(&self, transactions: Vec<Transaction>, now: u64) -> Option<Update> {
        let mut chain = match self.chain.write() {
            Ok(chain) => chain,
            Err(e) => {
                tracing::error!("Failed to acquire write lock in execute: {}", e);
                return None;
            }
        };
        let timestamp = now.max(chain.timestamp);
        let (outputs, changes) = block_on(async {
            let mut layer = Layer::new(&chain.state, self.authority.clone(), timestamp);
            let (outputs, _) = layer.execute(transactions).await;
            (outputs, layer.commit())
        });
        block_on(chain.state.apply(changes));
        chain.height += 1;
        chain.timestamp = timestamp;
        let update = Update {
            height: chain.height,
            timestamp,
            outputs,
        };
        drop(chain); // Release lock before broadcasting

        tracing::debug!(
            height = update.height,
            outputs = update.outputs.len(),
            "executed block"
        );
        if let Err(e) = self.update_tx.send(update.clone()) {
            tracing::warn!("Failed to broadcast update (no subscribers): {}", e);
        }
        Some(update)
    }

    /// Run `query` against committed state at `now` (clamped to the latest block time).
    fn read<T>(&self, now: u64, query: impl FnOnce(&Memory, u64) -> T) -> Option<T> {
        let chain = match self.chain.read() {
            Ok(chain) => chain,
            Err(e) => {
                tracing::error!("Failed to acquire read lock: {}", e);
                return None;
            }
        };
        Some(query(&chain.state, now.max(chain.timestamp)))
    }

    pub fn height(&self) -> u64 {
        match self.chain.read() {
            Ok(chain) => chain.height,
            Err(e) => {
                tracing::error!("Failed to acquire read lock in height: {}", e);
                0
            }
        }
    }

    pub fn query_state(&self, key: &Key) -> Option<Value> {
        self.read(0, |state, _| block_on(state.get(key))).flatten()
    }

    pub fn nonce(&self, public: &PublicKey) -> Option<u64> {
        self.read(0, |state, _| block_on(nonce(state, public)))
    }

    pub fn balance(&self, asset: Asset, account: &PublicKey) -> Option<u128> {
        self.read(0, |state, _| block_on(views::balance_of(state, asset, account)))
    }

    pub fn factory(&self, pass: u64, now: u64) -> Option<FactoryView> {
        self.read(now, |state, now| block_on(views::get_factory(state, pass, now)))
            .and_then(|view| match view {
                Ok(view) => view,
                Err(e) => {
                    tracing::warn!(pass, %e, "failed to compute factory view");
                    None
                }
            })
    }

    pub fn tools(&self, pass: u64) -> Option<Vec<ToolView>> {
        self.read(0, |state, _| block_on(views::get_tools(state, pass)))
            .and_then(|view| match view {
                Ok(view) => view,
                Err(e) => {
                    tracing::warn!(pass, %e, "failed to compute tool view");
                    None
                }
            })
    }

    pub fn upgrades(&self, pass: u64) -> Option<Vec<UpgradeView>> {
        self.read(0, |state, _| block_on(views::get_upgrades(state, pass)))
            .and_then(|view| match view {
                Ok(view) => view,
                Err(e) => {
                    tracing::warn!(pass, %e, "failed to compute upgrade view");
                    None
                }
            })
    }

    pub fn price(&self, now: u64) -> Option<u128> {
        self.read(now, |state, now| block_on(views::get_price(state, now)))
    }

    pub fn auction(&self, now: u64) -> Option<AuctionView> {
        self.read(now, |state, now| block_on(views::get_auction(state, now)))
    }

    pub fn catalog(&self) -> Option<Catalog> {
        self.read(0, |state, _| block_on(views::get_catalog(state)))
    }

    pub fn queue(&self) -> Option<QueueView> {
        self.read(0, |state, _| block_on(views::get_queue(state)))
    }

    pub fn queue_fragment(&self, offset: u64, limit: u64) -> Option<QueueView> {
        self.read(0, |state, _| {
            block_on(views::get_queue_fragment(state, offset, limit))
        })
    }

    pub fn update_subscriber(&self) -> broadcast::Receiver<Update> {
        self.update_tx.subscribe()
    }
}

pub struct Api {
    simulator: Arc<Simulator>,
}

impl Api {
    pub fn new(simulator: Arc<Simulator>) -> Self {
        Self { simulator }
    }

    pub fn router(&self) -> Router {
        // Configure CORS
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers([header::CONTENT_TYPE]);

        let router = Router::new()
            .route("/submit", post(submit))
            .route("/state/:key", get(query_state))
            .route("/nonce/:public", get(query_nonce))
            .route("/balance/:asset/:public", get(query_balance))
            .route("/factory/:pass", get(query_factory))
            .route("/tools/:pass", get(query_tools))
            .route("/upgrades/:pass", get(query_upgrades))
            .route("/catalog", get(query_catalog))
            .route("/price", get(query_price))
            .route("/auction", get(query_auction))
            .route("/queue", get(query_queue))
            .route("/queue/:offset/:limit", get(query_queue_fragment))
            .route("/updates/:filter", get(updates_ws))
            .layer(cors);

        // Rate limiting is effectively unlimited for local use
        let governor_conf = GovernorConfigBuilder::default()
            .per_nanosecond(1)
            .burst_size(2_000_000)
            .key_extractor(SmartIpKeyExtractor)
            .finish();
        let router = match governor_conf {
            Some(config) => router.layer(GovernorLayer {
                config: Arc::new(config),
            }),
            None => {
                tracing::warn!("invalid rate limit configuration, serving without one");
                router
            }
        };

        router.with_state(self.simulator.clone())
    }
}

fn decode_public(raw: &str) -> Option<PublicKey> {
    let raw = from_hex(raw)?;
    PublicKey::decode(raw.as_slice()).ok()
}

fn parse_asset(raw: &str) -> Option<Asset> {
    match raw {
        "resource" => Some(Asset::Resource),
        "settlement" => Some(Asset::Settlement),
        _ => None,
    }
}

async fn submit(AxumState(simulator): AxumState<Arc<Simulator>>, body: Bytes) -> impl IntoResponse {
    let submission = match Submission::decode(&mut body.as_ref()) {
        Ok(submission) => submission,
        Err(_) => return StatusCode::BAD_REQUEST.into_response(),
    };

    // Reject the whole submission if any signature is invalid
    let mut batcher = Batch::new();
    for tx in &submission.transactions {
        tx.verify_batch(&mut batcher);
    }
    if !batcher.verify(&mut rand::thread_rng()) {
        return StatusCode::BAD_REQUEST.into_response();
    }

    match simulator.execute(submission.transactions, unix_now()) {
        Some(update) => (StatusCode::OK, update.encode().to_vec()).into_response(),
        None => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
    }
}

async fn query_state(
    AxumState(simulator): AxumState<Arc<Simulator>>,
    axum::extract::Path(query): axum::extract::Path<String>,
) -> impl IntoResponse {
    let raw = match from_hex(&query) {
        Some(raw) => raw,
        None => return StatusCode::BAD_REQUEST.into_response(),
    };
    let key = match Key::decode(&mut raw.as_slice()) {
        Ok(key) => key,
        Err(_) => return StatusCode::BAD_REQUEST.into_response(),
    };
    match simulator.query_state(&key) {
        Some(value) => (StatusCode::OK, value.encode().to_vec()).into_response(),
        None => (StatusCode::NOT_FOUND, vec![]).into_response(),
    }
}

async fn query_nonce(
    AxumState(simulator): AxumState<Arc<Simulator>>,
    axum::extract::Path(public): axum::extract::Path<String>,
) -> impl IntoResponse {
    let Some(public) = decode_public(&public) else {
        return StatusCode::BAD_REQUEST.into_response();
    };
    match simulator.nonce(&public) {
        Some(nonce) => Json(serde_json::json!({ "nonce": nonce })).into_response(),
        None => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
    }
}

async fn query_balance(
    AxumState(simulator): AxumState<Arc<Simulator>>,
    axum::extract::Path((asset, public)): axum::extract::Path<(String, String)>,
) -> impl IntoResponse {
    let (Some(asset), Some(public)) = (parse_asset(&asset), decode_public(&public)) else {
        return StatusCode::BAD_REQUEST.into_response();
    };
    match simulator.balance(asset, &public) {
        Some(balance) => Json(serde_json::json!({ "balance": balance.to_string() })).into_response(),
        None => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
    }
}

async fn query_factory(
    AxumState(simulator): AxumState<Arc<Simulator>>,
    axum::extract::Path(pass): axum::extract::Path<u64>,
) -> impl IntoResponse {
    match simulator.factory(pass, unix_now()) {
        Some(view) => Json(view).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn query_tools(
    AxumState(simulator): AxumState<Arc<Simulator>>,
    axum::extract::Path(pass): axum::extract::Path<u64>,
) -> impl IntoResponse {
    match simulator.tools(pass) {
        Some(view) => Json(view).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn query_upgrades(
    AxumState(simulator): AxumState<Arc<Simulator>>,
    axum::extract::Path(pass): axum::extract::Path<u64>,
) -> impl IntoResponse {
    match simulator.upgrades(pass) {
        Some(view) => Json(view).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn query_catalog(AxumState(simulator): AxumState<Arc<Simulator>>) -> impl IntoResponse {
    match simulator.catalog() {
        Some(catalog) => (StatusCode::OK, catalog.encode().to_vec()).into_response(),
        None => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
    }
}

async fn query_price(AxumState(simulator): AxumState<Arc<Simulator>>) -> impl IntoResponse {
    match simulator.price(unix_now()) {
        Some(price) => Json(serde_json::json!({ "price": price.to_string() })).into_response(),
        None => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
    }
}

async fn query_auction(AxumState(simulator): AxumState<Arc<Simulator>>) -> impl IntoResponse {
    match simulator.auction(unix_now()) {
        Some(view) => Json(view).into_response(),
        None => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
    }
}

async fn query_queue(AxumState(simulator): AxumState<Arc<Simulator>>) -> impl IntoResponse {
    match simulator.queue() {
        Some(view) => Json(view).into_response(),
        None => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
    }
}

async fn query_queue_fragment(
    AxumState(simulator): AxumState<Arc<Simulator>>,
    axum::extract::Path((offset, limit)): axum::extract::Path<(u64, u64)>,
) -> impl IntoResponse {
    match simulator.queue_fragment(offset, limit) {
        Some(view) => Json(view).into_response(),
        None => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
    }
}

async fn updates_ws(
    AxumState(simulator): AxumState<Arc<Simulator>>,
    axum::extract::Path(filter): axum::extract::Path<String>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_updates_ws(socket, simulator, filter))
}

fn apply_filter(update: Update, subscription: &UpdatesFilter) -> Option<Update> {
    match subscription {
        UpdatesFilter::All => Some(update),
        UpdatesFilter::Account(account) => update.filter(account),
    }
}

async fn handle_updates_ws(
    socket: axum::extract::ws::WebSocket,
    simulator: Arc<Simulator>,
    filter: String,
) {
    tracing::info!("Updates WebSocket connected, filter: {}", filter);
    let (mut sender, mut receiver) = socket.split();
    let mut updates = simulator.update_subscriber();

    let subscription = match from_hex(&filter)
        .and_then(|raw| UpdatesFilter::decode(&mut raw.as_slice()).ok())
    {
        Some(subscription) => subscription,
        None => {
            tracing::warn!("Failed to parse UpdatesFilter");
            let _ = sender.close().await;
            return;
        }
    };

    loop {
        tokio::select! {
            msg = receiver.next() => {
                match msg {
                    Some(Ok(axum::extract::ws::Message::Close(_))) => {
                        tracing::info!("Client closed WebSocket connection");
                        break;
                    }
                    Some(Ok(axum::extract::ws::Message::Ping(data))) => {
                        if sender.send(axum::extract::ws::Message::Pong(data)).await.is_err() {
                            tracing::warn!("Failed to send pong, client disconnected");
                            break;
                        }
                    }
                    Some(Err(e)) => {
                        tracing::warn!("WebSocket error: {:?}", e);
                        break;
                    }
                    None => {
                        tracing::info!("WebSocket stream ended");
                        break;
                    }
                    _ => {}
                }
            }
            update_result = updates.recv() => {
                match update_result {
                    Ok(update) => {
                        let Some(update) = apply_filter(update, &subscription) else {
                            continue;
                        };
                        if sender
                            .send(axum::extract::ws::Message::Binary(update.encode().to_vec()))
                            .await
                            .is_err()
                        {
                            tracing::warn!("Failed to send update, client disconnected");
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!("WebSocket client lagged behind, skipped {} updates", skipped);
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        tracing::info!("Broadcast channel closed");
                        break;
                    }
                }
            }
        }
    }
    let _ = sender.close().await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::tests::sample;
    use clickfarm_execution::mocks::{create_account_keypair, error_codes, events, Actor};
    use clickfarm_types::{
        execution::Instruction,
        factory::{ERROR_NOT_AUTHORIZED, WAD},
    };

    const GENESIS: u64 = 1_000;

    fn setup() -> (Simulator, Actor) {
        let (admin, _) = create_account_keypair(0);
        let player = Actor::new(1);
        let config: Config = serde_yaml::from_str(&sample(&admin, &player.public)).unwrap();
        let simulator = Simulator::new(&config.validate().unwrap(), GENESIS).unwrap();
        (simulator, player)
    }

    #[test]
    fn test_genesis() {
        let (simulator, player) = setup();

        assert_eq!(simulator.height(), 1);
        assert_eq!(
            simulator.balance(Asset::Settlement, &player.public),
            Some(1_000 * WAD)
        );
        assert_eq!(
            simulator.balance(Asset::Resource, &player.public),
            Some(500 * WAD)
        );
        let Some(Value::Catalog(catalog)) = simulator.query_state(&Key::Catalog) else {
            panic!("catalog missing");
        };
        assert_eq!(catalog.tools.len(), 2);
        assert_eq!(simulator.catalog(), Some(catalog));
        assert_eq!(simulator.nonce(simulator.authority()), Some(9));
    }

    #[test]
    fn test_rejected_genesis() {
        let (admin, _) = create_account_keypair(0);
        let (_, player) = create_account_keypair(1);
        let config: Config = serde_yaml::from_str(&sample(&admin, &player)).unwrap();
        let mut validated = config.validate().unwrap();
        validated.genesis.push(Instruction::ConfigureDistribution {
            treasury: player.clone(),
            developer: player.clone(),
            rewards: player,
            treasury_bps: 9_000,
            developer_bps: 2_000,
        });

        assert!(matches!(
            Simulator::new(&validated, GENESIS),
            Err(ConfigError::GenesisRejected { .. })
        ));
    }

    #[test]
    fn test_execute_and_views() {
        let (simulator, mut player) = setup();
        let mut update_stream = simulator.update_subscriber();

        let txs = vec![
            player.sign(Instruction::MintPass),
            player.sign(Instruction::PurchaseTool {
                pass: 1,
                slot: 0,
                quantity: 2,
            }),
        ];
        let update = simulator.execute(txs, GENESIS + 10).unwrap();
        assert_eq!(update.height, 2);
        assert!(error_codes(&update.outputs).is_empty());
        let received = block_on(async { update_stream.recv().await.unwrap() });
        assert_eq!(received, update);

        // Two slot-0 tools at 0.1/s for 100 seconds
        let factory = simulator.factory(1, GENESIS + 110).unwrap();
        assert_eq!(factory.pending, 20 * WAD);
        assert_eq!(factory.rate, WAD / 5);
        assert_eq!(simulator.tools(1).unwrap()[0].amount, 2);
        assert_eq!(simulator.upgrades(1).unwrap().len(), 2);
        assert!(simulator.factory(2, GENESIS).is_none());
        assert_eq!(simulator.nonce(&player.public), Some(2));
    }

    #[test]
    fn test_block_time_is_monotonic() {
        let (simulator, mut player) = setup();
        simulator.execute(vec![player.sign(Instruction::MintPass)], GENESIS + 50);

        let update = simulator
            .execute(vec![player.sign(Instruction::Claim { pass: 1 })], GENESIS)
            .unwrap();
        assert_eq!(update.timestamp, GENESIS + 50);
    }

    #[test]
    fn test_click_through_simulator() {
        let (simulator, mut player) = setup();
        simulator.execute(vec![player.sign(Instruction::MintPass)], GENESIS);

        let now = GENESIS + 5;
        let price = simulator.price(now).unwrap();
        let auction = simulator.auction(now).unwrap();
        let update = simulator
            .execute(
                vec![player.sign(Instruction::Click {
                    pass: 1,
                    epoch_id: auction.epoch_id,
                    deadline: now + 60,
                    max_payment: price,
                    payment: price,
                    message: "hello".to_string(),
                })],
                now,
            )
            .unwrap();
        assert!(events(&update.outputs)
            .iter()
            .any(|event| matches!(event, Event::Clicked { .. })));

        let queue = simulator.queue().unwrap();
        assert_eq!(queue.entries.len(), 1);
        assert_eq!(queue.entries[0].message, "hello");
        assert_eq!(simulator.queue_fragment(1, 10).unwrap().entries.len(), 0);
        assert!(simulator.price(now).unwrap() > price);
    }

    #[test]
    fn test_filtered_updates() {
        let (simulator, mut player) = setup();
        let mut stranger = Actor::new(7);

        let update = simulator
            .execute(
                vec![
                    player.sign(Instruction::MintPass),
                    stranger.sign(Instruction::SetTools {
                        costs: vec![WAD],
                        yields: vec![WAD],
                    }),
                ],
                GENESIS,
            )
            .unwrap();
        assert_eq!(error_codes(&update.outputs), vec![ERROR_NOT_AUTHORIZED]);

        let filtered =
            apply_filter(update.clone(), &UpdatesFilter::Account(stranger.public.clone()))
                .unwrap();
        assert!(filtered.outputs.iter().all(|output| match output {
            Output::Event(event) => event.account() == Some(&stranger.public),
            Output::Transaction(tx) => tx.public == stranger.public,
        }));
        assert_eq!(apply_filter(update.clone(), &UpdatesFilter::All), Some(update));

        let (_, idle) = create_account_keypair(9);
        let update = simulator
            .execute(vec![player.sign(Instruction::Claim { pass: 1 })], GENESIS)
            .unwrap();
        assert!(apply_filter(update, &UpdatesFilter::Account(idle)).is_none());
    }
}

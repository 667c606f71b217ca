//! # REST + WebSocket API
//!
//! The axum router in front of the devnet. All handlers share one
//! [`Devnet`] behind a mutex; every request runs to completion under the
//! lock, so the API sees the chains the way a single relayer would.
//!
//! ## Endpoints
//!
//! | Method | Path                  | Description                               |
//! |--------|-----------------------|-------------------------------------------|
//! | GET    | `/health`             | Liveness probe                            |
//! | GET    | `/status`             | Network summary and leg counts            |
//! | GET    | `/vaults`             | Every vault's accounting snapshot         |
//! | GET    | `/accounts/:account`  | Balances, vault positions and refunds     |
//! | GET    | `/refunds/:account`   | Outstanding refund entries                |
//! | GET    | `/ws`                 | Live submissions and settled legs         |
//! | POST   | `/deposit`            | Deposit from any chain into any vault     |
//! | POST   | `/withdraw`           | Signed withdrawal to any chain            |
//! | POST   | `/deliver`            | Relay every pending leg now               |
//! | POST   | `/yield`              | Grow a vault's lending position           |
//! | POST   | `/claim`              | Pay out a refund balance on the hub chain |
//! | POST   | `/faults`             | Fail the next leg toward a chain          |
//!
//! Accounts are devnet key labels (`alice`) or `0x` hex addresses.

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Path, State,
    },
    http::{Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::broadcast;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use nexus_contracts::network::{DeliveryReport, Fault, NetworkError};
use nexus_contracts::vault::VaultSnapshot;
use nexus_protocol::types::{Address, AssetId, ChainId};

use crate::devnet::{
    AccountView, DepositRequest, Devnet, DevnetError, DevnetStatus, RefundEntry, SubmitReceipt,
    WithdrawRequest,
};
use crate::metrics::SharedMetrics;
use crate::topology::account_address;

// ---------------------------------------------------------------------------
// Application State
// ---------------------------------------------------------------------------

/// Shared application state. Cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub version: String,
    pub devnet: Arc<Mutex<Devnet>>,
    /// Live notifications for WebSocket subscribers.
    pub event_tx: broadcast::Sender<NodeEvent>,
    pub metrics: SharedMetrics,
}

/// Events pushed to WebSocket subscribers.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NodeEvent {
    /// A deposit or withdrawal was accepted on `chain`.
    Submitted { chain: ChainId, receipt: SubmitReceipt },
    /// A leg reached its destination, or failed trying.
    LegSettled { report: DeliveryReport },
}

// ---------------------------------------------------------------------------
// Router Construction
// ---------------------------------------------------------------------------

/// Builds the API router with CORS and request tracing.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_handler))
        .route("/status", get(status_handler))
        .route("/vaults", get(vaults_handler))
        .route("/accounts/:account", get(account_handler))
        .route("/refunds/:account", get(refunds_handler))
        .route("/ws", get(ws_handler))
        .route("/deposit", post(deposit_handler))
        .route("/withdraw", post(withdraw_handler))
        .route("/deliver", post(deliver_handler))
        .route("/yield", post(yield_handler))
        .route("/claim", post(claim_handler))
        .route("/faults", post(fault_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Request / Response Types
// ---------------------------------------------------------------------------

/// Response payload for `GET /status`.
#[derive(Debug, Serialize, Deserialize)]
pub struct StatusResponse {
    pub version: String,
    #[serde(flatten)]
    pub network: DevnetStatus,
    /// ISO-8601 timestamp of the response.
    pub timestamp: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct YieldRequest {
    pub chain: ChainId,
    pub amount: u64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ClaimRequest {
    pub user: String,
    /// Hub-side asset to claim.
    pub asset: AssetId,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ClaimResponse {
    pub owner: Address,
    pub asset: AssetId,
    pub amount: u64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct FaultRequest {
    pub chain: ChainId,
    pub fault: Fault,
}

/// Error body returned by every endpoint on failure.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// A failed request: status plus message.
#[derive(Debug)]
pub struct ApiError(StatusCode, String);

impl From<DevnetError> for ApiError {
    fn from(err: DevnetError) -> Self {
        let status = match &err {
            DevnetError::UnknownChain(_)
            | DevnetError::NoVault(_)
            | DevnetError::Network(NetworkError::UnknownChain(_)) => StatusCode::NOT_FOUND,
            DevnetError::Rejected(_) | DevnetError::Yield(_) => StatusCode::UNPROCESSABLE_ENTITY,
            DevnetError::Network(_) | DevnetError::Signing(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(error = %err, "request failed");
        } else {
            tracing::warn!(error = %err, "request refused");
        }
        ApiError(status, err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.0, Json(ErrorResponse { error: self.1 })).into_response()
    }
}

type ApiResult<T> = Result<Json<T>, ApiError>;

// ---------------------------------------------------------------------------
// Relaying
// ---------------------------------------------------------------------------

/// Brings the clocks forward and delivers every pending leg. Shared by
/// `POST /deliver` and the background relayer.
pub fn relay(state: &AppState) -> Result<Vec<DeliveryReport>, DevnetError> {
    let timer = state.metrics.delivery_seconds.start_timer();
    let reports = {
        let mut devnet = state.devnet.lock();
        devnet.tick();
        let reports = devnet.deliver()?;
        refresh_gauges(state, &devnet);
        reports
    };
    timer.observe_duration();

    state.metrics.record_deliveries(&reports);
    for report in &reports {
        // No subscribers is not an error.
        let _ = state.event_tx.send(NodeEvent::LegSettled {
            report: report.clone(),
        });
    }
    Ok(reports)
}

fn refresh_gauges(state: &AppState, devnet: &Devnet) {
    state
        .metrics
        .pending_legs
        .set(devnet.network().pending() as i64);
    if let Ok(status) = devnet.status() {
        state.metrics.refund_entries.set(status.refund_entries as i64);
    }
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// `GET /health` — 200 while the process is up.
async fn health_handler() -> impl IntoResponse {
    (StatusCode::OK, Json(serde_json::json!({ "status": "ok" })))
}

async fn status_handler(State(state): State<AppState>) -> ApiResult<StatusResponse> {
    let network = state.devnet.lock().status()?;
    Ok(Json(StatusResponse {
        version: state.version.clone(),
        network,
        timestamp: chrono::Utc::now().to_rfc3339(),
    }))
}

async fn vaults_handler(State(state): State<AppState>) -> ApiResult<Vec<VaultSnapshot>> {
    Ok(Json(state.devnet.lock().vaults()?))
}

async fn account_handler(
    Path(account): Path<String>,
    State(state): State<AppState>,
) -> ApiResult<AccountView> {
    let address = account_address(&account);
    Ok(Json(state.devnet.lock().account(address)?))
}

async fn refunds_handler(
    Path(account): Path<String>,
    State(state): State<AppState>,
) -> ApiResult<Vec<RefundEntry>> {
    let address = account_address(&account);
    Ok(Json(state.devnet.lock().refunds(&address)?))
}

/// `POST /deposit` — submits on `chain`. Cross-chain deposits return the
/// dispatched leg; relay it with `POST /deliver` or wait for the relayer.
async fn deposit_handler(
    State(state): State<AppState>,
    Json(req): Json<DepositRequest>,
) -> ApiResult<SubmitReceipt> {
    let receipt = {
        let mut devnet = state.devnet.lock();
        let receipt = devnet.deposit(&req)?;
        refresh_gauges(&state, &devnet);
        receipt
    };
    state.metrics.deposits_total.inc();
    let _ = state.event_tx.send(NodeEvent::Submitted {
        chain: req.chain,
        receipt: receipt.clone(),
    });
    Ok(Json(receipt))
}

/// `POST /withdraw` — the node signs the authorization with the user's
/// devnet key and submits on `chain`.
async fn withdraw_handler(
    State(state): State<AppState>,
    Json(req): Json<WithdrawRequest>,
) -> ApiResult<SubmitReceipt> {
    let receipt = {
        let mut devnet = state.devnet.lock();
        let receipt = devnet.withdraw(&req)?;
        refresh_gauges(&state, &devnet);
        receipt
    };
    state.metrics.withdrawals_total.inc();
    let _ = state.event_tx.send(NodeEvent::Submitted {
        chain: req.chain,
        receipt: receipt.clone(),
    });
    Ok(Json(receipt))
}

async fn deliver_handler(State(state): State<AppState>) -> ApiResult<Vec<DeliveryReport>> {
    Ok(Json(relay(&state)?))
}

async fn yield_handler(
    State(state): State<AppState>,
    Json(req): Json<YieldRequest>,
) -> ApiResult<VaultSnapshot> {
    Ok(Json(state.devnet.lock().add_yield(req.chain, req.amount)?))
}

async fn claim_handler(
    State(state): State<AppState>,
    Json(req): Json<ClaimRequest>,
) -> ApiResult<ClaimResponse> {
    let amount = {
        let mut devnet = state.devnet.lock();
        let amount = devnet.claim(&req.user, req.asset)?;
        refresh_gauges(&state, &devnet);
        amount
    };
    state.metrics.refunds_claimed_total.inc();
    Ok(Json(ClaimResponse {
        owner: account_address(&req.user),
        asset: req.asset,
        amount,
    }))
}

async fn fault_handler(
    State(state): State<AppState>,
    Json(req): Json<FaultRequest>,
) -> Result<StatusCode, ApiError> {
    state.devnet.lock().inject_fault(req.chain, req.fault)?;
    Ok(StatusCode::NO_CONTENT)
}

/// `GET /ws` — JSON [`NodeEvent`]s as they happen. Client messages are
/// ignored.
async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_ws_connection(socket, state))
}

async fn handle_ws_connection(mut socket: WebSocket, state: AppState) {
    let mut rx = state.event_tx.subscribe();

    loop {
        tokio::select! {
            event = rx.recv() => {
                match event {
                    Ok(ev) => {
                        let payload = match serde_json::to_string(&ev) {
                            Ok(s) => s,
                            Err(e) => {
                                tracing::warn!("failed to serialize ws event: {}", e);
                                continue;
                            }
                        };
                        if socket.send(Message::Text(payload)).await.is_err() {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        tracing::warn!("ws subscriber lagged by {} events", n);
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
            msg = socket.recv() => {
                match msg {
                    Some(Ok(_)) => {}
                    _ => break,
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use nexus_contracts::network::DeliveryOutcome;
    use nexus_protocol::config::{DEVNET_BSC, DEVNET_ETHEREUM, DEVNET_HUB_CHAIN};
    use tower::ServiceExt;

    use crate::metrics::NodeMetrics;
    use crate::topology::Topology;

    fn test_app_state() -> AppState {
        let devnet = Devnet::build(&Topology::devnet()).expect("devnet");
        let (event_tx, _) = broadcast::channel(16);
        AppState {
            version: "0.1.0-test".into(),
            devnet: Arc::new(Mutex::new(devnet)),
            event_tx,
            metrics: Arc::new(NodeMetrics::new().expect("metrics")),
        }
    }

    async fn send(router: &Router, req: Request<Body>) -> (StatusCode, Vec<u8>) {
        let resp = router.clone().oneshot(req).await.unwrap();
        let status = resp.status();
        let body = resp.into_body().collect().await.unwrap().to_bytes().to_vec();
        (status, body)
    }

    async fn get(router: &Router, uri: &str) -> (StatusCode, Vec<u8>) {
        send(router, Request::get(uri).body(Body::empty()).unwrap()).await
    }

    async fn post_json(router: &Router, uri: &str, body: serde_json::Value) -> (StatusCode, Vec<u8>) {
        let req = Request::post(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        send(router, req).await
    }

    fn deposit_body(chain: ChainId, user: &str, amount: u64, target: ChainId) -> serde_json::Value {
        serde_json::json!({
            "chain": chain.0,
            "user": user,
            "amount": amount,
            "target_chain": target.0,
            "gas_limit": 50
        })
    }

    #[tokio::test]
    async fn health_returns_ok() {
        let router = create_router(test_app_state());
        let (status, body) = get(&router, "/health").await;

        assert_eq!(status, StatusCode::OK);
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["status"], "ok");
    }

    #[tokio::test]
    async fn status_describes_the_network() {
        let router = create_router(test_app_state());
        let (status, body) = get(&router, "/status").await;

        assert_eq!(status, StatusCode::OK);
        let resp: StatusResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(resp.version, "0.1.0-test");
        assert_eq!(resp.network.name, "devnet");
        assert_eq!(resp.network.hub_chain, DEVNET_HUB_CHAIN);
        assert_eq!(resp.network.chains.len(), 3);
        assert_eq!(resp.network.pending_legs, 0);
    }

    #[tokio::test]
    async fn vaults_lists_every_vault() {
        let router = create_router(test_app_state());
        let (status, body) = get(&router, "/vaults").await;

        assert_eq!(status, StatusCode::OK);
        let vaults: Vec<VaultSnapshot> = serde_json::from_slice(&body).unwrap();
        let chains: Vec<ChainId> = vaults.iter().map(|v| v.chain).collect();
        assert_eq!(chains, vec![DEVNET_BSC, DEVNET_HUB_CHAIN]);
        assert!(vaults.iter().all(|v| v.total_shares == 0 && v.fee_bps == 1_000));
    }

    #[tokio::test]
    async fn cross_chain_deposit_settles_after_deliver() {
        let state = test_app_state();
        let router = create_router(state.clone());

        let (status, body) = post_json(
            &router,
            "/deposit",
            deposit_body(DEVNET_ETHEREUM, "alice", 2_500, DEVNET_BSC),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let receipt: SubmitReceipt = serde_json::from_slice(&body).unwrap();
        assert!(matches!(receipt, SubmitReceipt::Dispatched { .. }));
        assert_eq!(state.metrics.pending_legs.get(), 1);

        let (status, body) = post_json(&router, "/deliver", serde_json::json!({})).await;
        assert_eq!(status, StatusCode::OK);
        let reports: Vec<DeliveryReport> = serde_json::from_slice(&body).unwrap();
        assert_eq!(reports.len(), 2);
        assert!(reports.iter().all(|r| r.outcome == DeliveryOutcome::Delivered));

        let (status, body) = get(&router, "/accounts/alice").await;
        assert_eq!(status, StatusCode::OK);
        let view: AccountView = serde_json::from_slice(&body).unwrap();
        assert_eq!(view.positions.len(), 1);
        assert_eq!(view.positions[0].chain, DEVNET_BSC);
        assert_eq!(view.positions[0].shares, 2_500);

        assert_eq!(state.metrics.deposits_total.get(), 1);
        assert_eq!(state.metrics.legs_total.with_label_values(&["delivered"]).get(), 2);
        assert_eq!(state.metrics.pending_legs.get(), 0);
    }

    #[tokio::test]
    async fn same_chain_withdraw_pays_out_immediately() {
        let router = create_router(test_app_state());
        post_json(&router, "/deposit", deposit_body(DEVNET_BSC, "bob", 1_000, DEVNET_BSC)).await;

        let (status, body) = post_json(
            &router,
            "/withdraw",
            serde_json::json!({
                "chain": DEVNET_BSC.0,
                "user": "bob",
                "shares": 400,
                "target_chain": DEVNET_BSC.0,
                "destination_chain": DEVNET_BSC.0
            }),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        let receipt: SubmitReceipt = serde_json::from_slice(&body).unwrap();
        match receipt {
            SubmitReceipt::Withdrawn {
                shares,
                assets,
                forwarded,
                ..
            } => {
                assert_eq!((shares, assets), (400, 400));
                assert!(forwarded.is_none());
            }
            other => panic!("unexpected receipt: {other:?}"),
        }
    }

    #[tokio::test]
    async fn unknown_chain_is_not_found() {
        let router = create_router(test_app_state());
        let (status, body) = post_json(
            &router,
            "/deposit",
            deposit_body(ChainId(31337), "alice", 10, DEVNET_BSC),
        )
        .await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        let err: ErrorResponse = serde_json::from_slice(&body).unwrap();
        assert!(err.error.contains("31337"));
    }

    #[tokio::test]
    async fn refused_deposit_is_unprocessable() {
        let router = create_router(test_app_state());
        // Alice only holds 100_000.
        let (status, _) = post_json(
            &router,
            "/deposit",
            deposit_body(DEVNET_ETHEREUM, "alice", 100_001, DEVNET_BSC),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

        let (_, body) = get(&router, "/status").await;
        let resp: StatusResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(resp.network.pending_legs, 0);
    }

    #[tokio::test]
    async fn aborted_leg_shows_up_as_refund_and_can_be_claimed() {
        let state = test_app_state();
        let router = create_router(state.clone());

        let (status, _) = post_json(
            &router,
            "/faults",
            serde_json::json!({ "chain": DEVNET_HUB_CHAIN.0, "fault": "abort" }),
        )
        .await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        post_json(&router, "/deposit", deposit_body(DEVNET_ETHEREUM, "alice", 900, DEVNET_BSC)).await;
        let (_, body) = post_json(&router, "/deliver", serde_json::json!({})).await;
        let reports: Vec<DeliveryReport> = serde_json::from_slice(&body).unwrap();
        assert!(matches!(reports[0].outcome, DeliveryOutcome::Aborted { .. }));

        let (status, body) = get(&router, "/refunds/alice").await;
        assert_eq!(status, StatusCode::OK);
        let refunds: Vec<RefundEntry> = serde_json::from_slice(&body).unwrap();
        let zusdc_eth = Address::derive("zrc20.usdc.eth");
        assert_eq!(
            refunds,
            vec![RefundEntry {
                asset: zusdc_eth,
                amount: 900,
            }]
        );
        assert_eq!(state.metrics.refund_entries.get(), 1);

        let (status, body) = post_json(
            &router,
            "/claim",
            serde_json::json!({ "user": "alice", "asset": zusdc_eth }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let claim: ClaimResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(claim.amount, 900);
        assert_eq!(claim.owner, account_address("alice"));
        assert_eq!(state.metrics.refunds_claimed_total.get(), 1);
        assert_eq!(state.metrics.refund_entries.get(), 0);

        // Nothing left to claim.
        let (status, _) = post_json(
            &router,
            "/claim",
            serde_json::json!({ "user": "alice", "asset": zusdc_eth }),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn yield_needs_a_vault() {
        let router = create_router(test_app_state());

        let (status, _) = post_json(
            &router,
            "/yield",
            serde_json::json!({ "chain": DEVNET_ETHEREUM.0, "amount": 10 }),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, body) = post_json(
            &router,
            "/yield",
            serde_json::json!({ "chain": DEVNET_BSC.0, "amount": 10 }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let snapshot: VaultSnapshot = serde_json::from_slice(&body).unwrap();
        assert_eq!(snapshot.underlying, 10);
    }

    #[tokio::test]
    async fn submissions_are_broadcast() {
        let state = test_app_state();
        let mut rx = state.event_tx.subscribe();
        let router = create_router(state);

        post_json(&router, "/deposit", deposit_body(DEVNET_BSC, "bob", 300, DEVNET_BSC)).await;

        match rx.try_recv().unwrap() {
            NodeEvent::Submitted { chain, receipt } => {
                assert_eq!(chain, DEVNET_BSC);
                assert!(matches!(receipt, SubmitReceipt::Deposited { shares: 300, .. }));
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }
}

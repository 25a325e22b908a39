//! HTTP endpoints that turn JSON requests into unsigned transactions.
//!
//! Every handler follows the same steps: read the body, sanitize and
//! validate `base_req`, decode the sender, build the message, run
//! `validate_basic`, then either write the unsigned transaction or a gas
//! estimate.

use std::net::SocketAddr;

use anyhow::{Context, Result};
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use cosmos_sdk_proto::cosmos::base::v1beta1::Coin;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::json;

use crate::{
    address::HasAddressHrp,
    coins::{parse_amount, validate_coins},
    msgs::{
        IssueMsg, MsgApprove, MsgBurn, MsgBurnFrom, MsgDecreaseAllowance, MsgDescription,
        MsgFeatures, MsgFreeze, MsgIncreaseAllowance, MsgIssueCreate, MsgMint, MsgTransfer,
        MsgTransferFrom, MsgTransferOwnership, MsgUnfreeze,
    },
    txbuilder::DEFAULT_GAS_LIMIT,
    types::{validate_denom, FreezeOp, IssueFeatures, IssueParams},
    Address, AddressHrp, Cosmos, TxBuilder,
};

/// Shared state of the REST server.
#[derive(Clone)]
pub struct RestState {
    hrp: AddressHrp,
    cosmos: Option<Cosmos>,
}

impl RestState {
    /// Generate-only server, simulation requests are rejected.
    pub fn new(hrp: AddressHrp) -> Self {
        RestState { hrp, cosmos: None }
    }

    /// Server which can simulate against a node.
    pub fn with_cosmos(cosmos: Cosmos) -> Self {
        RestState {
            hrp: cosmos.get_address_hrp(),
            cosmos: Some(cosmos),
        }
    }
}

/// An error written as `{"error": message}`.
#[derive(Debug)]
pub struct RestError {
    status: StatusCode,
    message: String,
}

impl RestError {
    fn new(status: StatusCode, message: impl ToString) -> Self {
        RestError {
            status,
            message: message.to_string(),
        }
    }

    fn bad_request(message: impl ToString) -> Self {
        RestError::new(StatusCode::BAD_REQUEST, message)
    }
}

impl IntoResponse for RestError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

/// A gas price such as `0.025udarc`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GasPrice {
    pub denom: String,
    pub amount: String,
}

impl GasPrice {
    fn amount(&self) -> Option<f64> {
        self.amount.parse::<f64>().ok().filter(|x| x.is_finite() && *x >= 0.0)
    }
}

/// Fields shared by every transaction request.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BaseReq {
    pub from: String,
    pub memo: String,
    pub chain_id: String,
    pub account_number: String,
    pub sequence: String,
    #[serde(with = "crate::coins::vec")]
    pub fees: Vec<Coin>,
    pub gas_prices: Vec<GasPrice>,
    pub gas: String,
    pub gas_adjustment: String,
    pub simulate: bool,
}

impl BaseReq {
    pub fn sanitize(self) -> Self {
        BaseReq {
            from: self.from.trim().to_owned(),
            memo: self.memo.trim().to_owned(),
            chain_id: self.chain_id.trim().to_owned(),
            account_number: self.account_number.trim().to_owned(),
            sequence: self.sequence.trim().to_owned(),
            gas: self.gas.trim().to_owned(),
            gas_adjustment: self.gas_adjustment.trim().to_owned(),
            ..self
        }
    }

    pub fn validate_basic(&self) -> Result<(), RestError> {
        if !self.simulate {
            if self.chain_id.is_empty() {
                return Err(RestError::new(
                    StatusCode::UNAUTHORIZED,
                    "chain-id required but not specified",
                ));
            }
            if !fees_are_zero(&self.fees) && !gas_prices_are_zero(&self.gas_prices) {
                return Err(RestError::bad_request(
                    "cannot provide both fees and gas prices",
                ));
            }
            if !fees_are_valid(&self.fees) && !gas_prices_are_valid(&self.gas_prices) {
                return Err(RestError::new(
                    StatusCode::PAYMENT_REQUIRED,
                    "invalid fees or gas prices provided",
                ));
            }
        }
        if self.from.is_empty() {
            return Err(RestError::new(
                StatusCode::UNAUTHORIZED,
                "name or address required but not specified",
            ));
        }
        Ok(())
    }

    /// Gas limit and whether it should come from a simulation.
    fn parse_gas(&self) -> Result<(bool, u64), RestError> {
        match self.gas.as_str() {
            "" => Ok((false, DEFAULT_GAS_LIMIT)),
            "auto" => Ok((true, DEFAULT_GAS_LIMIT)),
            gas => gas
                .parse()
                .map(|gas| (false, gas))
                .map_err(|_| RestError::bad_request(format!("invalid gas value: {gas}"))),
        }
    }

    fn parse_gas_adjustment(&self, default: f64) -> Result<f64, RestError> {
        if self.gas_adjustment.is_empty() {
            return Ok(default);
        }
        self.gas_adjustment
            .parse()
            .ok()
            .filter(|x: &f64| x.is_finite() && *x > 0.0)
            .ok_or_else(|| {
                RestError::bad_request(format!(
                    "invalid gas adjustment: {}",
                    self.gas_adjustment
                ))
            })
    }

    /// Explicit fees, or the gas prices applied to the gas limit.
    fn fees_for_gas(&self, gas: u64) -> Vec<Coin> {
        if !self.fees.is_empty() {
            return self.fees.clone();
        }
        self.gas_prices
            .iter()
            .filter_map(|price| {
                let amount = (price.amount()? * gas as f64).ceil() as u128;
                Some(Coin {
                    denom: price.denom.clone(),
                    amount: amount.to_string(),
                })
            })
            .collect()
    }
}

fn fees_are_zero(fees: &[Coin]) -> bool {
    fees.iter().all(|coin| parse_amount(&coin.amount) == Some(0))
}

fn fees_are_valid(fees: &[Coin]) -> bool {
    fees.is_empty() || validate_coins(fees).is_ok()
}

fn gas_prices_are_zero(prices: &[GasPrice]) -> bool {
    prices.iter().all(|price| price.amount() == Some(0.0))
}

fn gas_prices_are_valid(prices: &[GasPrice]) -> bool {
    prices.iter().all(|price| {
        validate_denom(&price.denom).is_ok() && price.amount().map_or(false, |x| x > 0.0)
    })
}

/// A JSON request body: `base_req` plus the message fields.
trait RestRequest: DeserializeOwned + Send + 'static {
    type Msg: IssueMsg + Send;

    fn base_req_mut(&mut self) -> &mut BaseReq;

    fn into_msg(self, from: Address, hrp: AddressHrp) -> Result<Self::Msg, RestError>;
}

fn parse_address(value: &str, hrp: AddressHrp) -> Result<Address, RestError> {
    Address::parse_with_hrp(value, hrp).map_err(RestError::bad_request)
}

async fn handle<R: RestRequest>(
    State(state): State<RestState>,
    body: Result<Json<R>, JsonRejection>,
) -> Result<Json<serde_json::Value>, RestError> {
    let Json(mut req) = body.map_err(|e| RestError::bad_request(e.body_text()))?;

    let base_req = req.base_req_mut();
    *base_req = std::mem::take(base_req).sanitize();
    base_req.validate_basic()?;
    let base_req = base_req.clone();

    let from = parse_address(&base_req.from, state.hrp)?;

    let msg = req.into_msg(from, state.hrp)?;
    msg.validate_basic().map_err(RestError::bad_request)?;

    write_generate_tx_response(&state, &base_req, from, msg).await
}

async fn write_generate_tx_response(
    state: &RestState,
    base_req: &BaseReq,
    from: Address,
    msg: impl IssueMsg,
) -> Result<Json<serde_json::Value>, RestError> {
    let default_adjustment = state
        .cosmos
        .as_ref()
        .map_or(1.0, |cosmos| cosmos.get_gas_multiplier());
    let gas_adjustment = base_req.parse_gas_adjustment(default_adjustment)?;
    let (simulate_and_execute, mut gas) = base_req.parse_gas()?;

    let mut builder = TxBuilder::default();
    builder
        .add_message(msg)
        .map_err(RestError::bad_request)?;
    if !base_req.memo.is_empty() {
        builder.set_memo(base_req.memo.clone());
    }

    if base_req.simulate || simulate_and_execute {
        let cosmos = state.cosmos.as_ref().ok_or_else(|| {
            RestError::bad_request("simulation requires a connection to a node")
        })?;
        let simres = builder
            .simulate(cosmos, from)
            .await
            .map_err(|e| RestError::new(StatusCode::INTERNAL_SERVER_ERROR, format!("{e:#}")))?;
        let adjusted = (simres.gas_used as f64 * gas_adjustment) as u64;
        if base_req.simulate {
            return Ok(Json(json!({ "gas_estimate": adjusted.to_string() })));
        }
        gas = adjusted;
    }

    let fees = base_req.fees_for_gas(gas);
    if !fees.is_empty() {
        builder.set_fees(fees);
    }
    tracing::debug!("Generated unsigned transaction: {builder}");
    Ok(Json(builder.generate_unsigned(gas)))
}

//////////// REQUEST BODIES ////////////////

type FeatureMap = serde_json::Map<String, serde_json::Value>;

/// Feature flags are kept as a raw object so that unknown keys are reported
/// as [crate::IssueError::InvalidFeature].
fn parse_features(features: FeatureMap) -> Result<IssueFeatures, RestError> {
    IssueFeatures::from_map(features).map_err(RestError::bad_request)
}

#[derive(Default, Deserialize)]
#[serde(default)]
struct CreateParams {
    name: String,
    symbol: String,
    total_supply: String,
    decimals: u32,
    description: String,
    features: Option<FeatureMap>,
}

#[derive(Deserialize)]
struct CreateReq {
    #[serde(default)]
    base_req: BaseReq,
    #[serde(default)]
    params: CreateParams,
}

impl RestRequest for CreateReq {
    type Msg = MsgIssueCreate;
    fn base_req_mut(&mut self) -> &mut BaseReq {
        &mut self.base_req
    }
    fn into_msg(self, from: Address, _: AddressHrp) -> Result<Self::Msg, RestError> {
        let CreateParams {
            name,
            symbol,
            total_supply,
            decimals,
            description,
            features,
        } = self.params;
        let params = IssueParams {
            name,
            symbol,
            total_supply,
            decimals,
            description,
            features: features.map(parse_features).transpose()?,
        };
        Ok(MsgIssueCreate::new(from, from, params))
    }
}

#[derive(Deserialize)]
struct DescriptionReq {
    #[serde(default)]
    base_req: BaseReq,
    #[serde(default)]
    denom: String,
    #[serde(default)]
    description: String,
}

impl RestRequest for DescriptionReq {
    type Msg = MsgDescription;
    fn base_req_mut(&mut self) -> &mut BaseReq {
        &mut self.base_req
    }
    fn into_msg(self, from: Address, _: AddressHrp) -> Result<Self::Msg, RestError> {
        Ok(MsgDescription::new(from, self.denom, self.description))
    }
}

#[derive(Deserialize)]
struct FeaturesReq {
    #[serde(default)]
    base_req: BaseReq,
    #[serde(default)]
    denom: String,
    #[serde(default)]
    features: FeatureMap,
}

impl RestRequest for FeaturesReq {
    type Msg = MsgFeatures;
    fn base_req_mut(&mut self) -> &mut BaseReq {
        &mut self.base_req
    }
    fn into_msg(self, from: Address, _: AddressHrp) -> Result<Self::Msg, RestError> {
        Ok(MsgFeatures::new(from, self.denom, parse_features(self.features)?))
    }
}

#[derive(Deserialize)]
struct TransferOwnershipReq {
    #[serde(default)]
    base_req: BaseReq,
    #[serde(default)]
    to_address: String,
    #[serde(default)]
    denom: String,
}

impl RestRequest for TransferOwnershipReq {
    type Msg = MsgTransferOwnership;
    fn base_req_mut(&mut self) -> &mut BaseReq {
        &mut self.base_req
    }
    fn into_msg(self, from: Address, hrp: AddressHrp) -> Result<Self::Msg, RestError> {
        let to = parse_address(&self.to_address, hrp)?;
        Ok(MsgTransferOwnership::new(from, to, self.denom))
    }
}

#[derive(Deserialize)]
struct MintReq {
    #[serde(default)]
    base_req: BaseReq,
    /// Defaults to the sender
    #[serde(default)]
    to_address: String,
    #[serde(default, with = "crate::coins::vec")]
    amount: Vec<Coin>,
}

impl RestRequest for MintReq {
    type Msg = MsgMint;
    fn base_req_mut(&mut self) -> &mut BaseReq {
        &mut self.base_req
    }
    fn into_msg(self, from: Address, hrp: AddressHrp) -> Result<Self::Msg, RestError> {
        let to = if self.to_address.is_empty() {
            from
        } else {
            parse_address(&self.to_address, hrp)?
        };
        Ok(MsgMint::new(from, to, self.amount))
    }
}

#[derive(Deserialize)]
struct BurnReq {
    #[serde(default)]
    base_req: BaseReq,
    #[serde(default, with = "crate::coins::vec")]
    amount: Vec<Coin>,
}

impl RestRequest for BurnReq {
    type Msg = MsgBurn;
    fn base_req_mut(&mut self) -> &mut BaseReq {
        &mut self.base_req
    }
    fn into_msg(self, from: Address, _: AddressHrp) -> Result<Self::Msg, RestError> {
        Ok(MsgBurn::new(from, self.amount))
    }
}

#[derive(Deserialize)]
struct BurnFromReq {
    #[serde(default)]
    base_req: BaseReq,
    #[serde(default)]
    from_address: String,
    #[serde(default, with = "crate::coins::vec")]
    amount: Vec<Coin>,
}

impl RestRequest for BurnFromReq {
    type Msg = MsgBurnFrom;
    fn base_req_mut(&mut self) -> &mut BaseReq {
        &mut self.base_req
    }
    fn into_msg(self, from: Address, hrp: AddressHrp) -> Result<Self::Msg, RestError> {
        let holder = parse_address(&self.from_address, hrp)?;
        Ok(MsgBurnFrom::new(from, holder, self.amount))
    }
}

#[derive(Deserialize)]
struct FreezeReq {
    #[serde(default)]
    base_req: BaseReq,
    #[serde(default)]
    holder: String,
    #[serde(default)]
    denom: String,
    #[serde(default)]
    op: String,
}

impl FreezeReq {
    fn parts(self, hrp: AddressHrp) -> Result<(Address, String, FreezeOp), RestError> {
        let holder = parse_address(&self.holder, hrp)?;
        let op = self.op.parse().map_err(RestError::bad_request)?;
        Ok((holder, self.denom, op))
    }
}

/// Same body as [FreezeReq], producing [MsgUnfreeze].
#[derive(Deserialize)]
#[serde(transparent)]
struct UnfreezeReq(FreezeReq);

impl RestRequest for FreezeReq {
    type Msg = MsgFreeze;
    fn base_req_mut(&mut self) -> &mut BaseReq {
        &mut self.base_req
    }
    fn into_msg(self, from: Address, hrp: AddressHrp) -> Result<Self::Msg, RestError> {
        let (holder, denom, op) = self.parts(hrp)?;
        Ok(MsgFreeze::new(from, holder, denom, op))
    }
}

impl RestRequest for UnfreezeReq {
    type Msg = MsgUnfreeze;
    fn base_req_mut(&mut self) -> &mut BaseReq {
        &mut self.0.base_req
    }
    fn into_msg(self, from: Address, hrp: AddressHrp) -> Result<Self::Msg, RestError> {
        let (holder, denom, op) = self.0.parts(hrp)?;
        Ok(MsgUnfreeze::new(from, holder, denom, op))
    }
}

#[derive(Deserialize)]
struct TransferReq {
    #[serde(default)]
    base_req: BaseReq,
    #[serde(default)]
    to_address: String,
    #[serde(default, with = "crate::coins::vec")]
    amount: Vec<Coin>,
}

impl RestRequest for TransferReq {
    type Msg = MsgTransfer;
    fn base_req_mut(&mut self) -> &mut BaseReq {
        &mut self.base_req
    }
    fn into_msg(self, from: Address, hrp: AddressHrp) -> Result<Self::Msg, RestError> {
        let to = parse_address(&self.to_address, hrp)?;
        Ok(MsgTransfer::new(from, to, self.amount))
    }
}

#[derive(Deserialize)]
struct TransferFromReq {
    #[serde(default)]
    base_req: BaseReq,
    #[serde(default)]
    from_address: String,
    #[serde(default)]
    to_address: String,
    #[serde(default, with = "crate::coins::vec")]
    amount: Vec<Coin>,
}

impl RestRequest for TransferFromReq {
    type Msg = MsgTransferFrom;
    fn base_req_mut(&mut self) -> &mut BaseReq {
        &mut self.base_req
    }
    fn into_msg(self, sender: Address, hrp: AddressHrp) -> Result<Self::Msg, RestError> {
        let from = parse_address(&self.from_address, hrp)?;
        let to = parse_address(&self.to_address, hrp)?;
        Ok(MsgTransferFrom::new(sender, from, to, self.amount))
    }
}

#[derive(Deserialize)]
struct AllowanceReq {
    #[serde(default)]
    base_req: BaseReq,
    #[serde(default)]
    spender: String,
    #[serde(default, with = "crate::coins::vec")]
    amount: Vec<Coin>,
}

impl AllowanceReq {
    fn parts(self, hrp: AddressHrp) -> Result<(Address, Vec<Coin>), RestError> {
        Ok((parse_address(&self.spender, hrp)?, self.amount))
    }
}

#[derive(Deserialize)]
#[serde(transparent)]
struct IncreaseAllowanceReq(AllowanceReq);

#[derive(Deserialize)]
#[serde(transparent)]
struct DecreaseAllowanceReq(AllowanceReq);

impl RestRequest for AllowanceReq {
    type Msg = MsgApprove;
    fn base_req_mut(&mut self) -> &mut BaseReq {
        &mut self.base_req
    }
    fn into_msg(self, from: Address, hrp: AddressHrp) -> Result<Self::Msg, RestError> {
        let (spender, amount) = self.parts(hrp)?;
        Ok(MsgApprove::new(from, spender, amount))
    }
}

impl RestRequest for IncreaseAllowanceReq {
    type Msg = MsgIncreaseAllowance;
    fn base_req_mut(&mut self) -> &mut BaseReq {
        &mut self.0.base_req
    }
    fn into_msg(self, from: Address, hrp: AddressHrp) -> Result<Self::Msg, RestError> {
        let (spender, amount) = self.0.parts(hrp)?;
        Ok(MsgIncreaseAllowance::new(from, spender, amount))
    }
}

impl RestRequest for DecreaseAllowanceReq {
    type Msg = MsgDecreaseAllowance;
    fn base_req_mut(&mut self) -> &mut BaseReq {
        &mut self.0.base_req
    }
    fn into_msg(self, from: Address, hrp: AddressHrp) -> Result<Self::Msg, RestError> {
        let (spender, amount) = self.0.parts(hrp)?;
        Ok(MsgDecreaseAllowance::new(from, spender, amount))
    }
}

//////////// ROUTER ////////////////

pub fn router(state: RestState) -> Router {
    Router::new()
        .route("/issue/create", post(handle::<CreateReq>))
        .route("/issue/description", post(handle::<DescriptionReq>))
        .route("/issue/features", post(handle::<FeaturesReq>))
        .route(
            "/issue/transfer-ownership",
            post(handle::<TransferOwnershipReq>),
        )
        .route("/issue/mint", post(handle::<MintReq>))
        .route("/issue/burn", post(handle::<BurnReq>))
        .route("/issue/burn-from", post(handle::<BurnFromReq>))
        .route("/issue/freeze", post(handle::<FreezeReq>))
        .route("/issue/unfreeze", post(handle::<UnfreezeReq>))
        .route("/issue/transfer", post(handle::<TransferReq>))
        .route("/issue/transfer-from", post(handle::<TransferFromReq>))
        .route("/issue/approve", post(handle::<AllowanceReq>))
        .route(
            "/issue/increase-allowance",
            post(handle::<IncreaseAllowanceReq>),
        )
        .route(
            "/issue/decrease-allowance",
            post(handle::<DecreaseAllowanceReq>),
        )
        .with_state(state)
}

/// Serve the REST endpoints until the process is stopped.
pub async fn serve(laddr: SocketAddr, state: RestState) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(laddr)
        .await
        .with_context(|| format!("Unable to listen on {laddr}"))?;
    tracing::info!("REST server listening on {laddr}");
    axum::serve(listener, router(state))
        .await
        .context("REST server stopped")
}

mod query;

use std::{str::FromStr, sync::Arc, time::Duration};

use anyhow::{Context, Result};
use chrono::{DateTime, TimeZone, Utc};
use cosmos_sdk_proto::{
    cosmos::{
        auth::v1beta1::{BaseAccount, QueryAccountRequest},
        bank::v1beta1::QueryAllBalancesRequest,
        base::{
            abci::v1beta1::TxResponse, query::v1beta1::PageRequest,
            tendermint::v1beta1::GetLatestBlockRequest, v1beta1::Coin,
        },
        tx::v1beta1::{
            BroadcastMode, BroadcastTxRequest, GetTxRequest, SimulateRequest, SimulateResponse,
        },
    },
};
use tokio::time::error::Elapsed;
use tonic::{
    codegen::InterceptedService,
    service::Interceptor,
    transport::{Channel, Endpoint},
    Status,
};

use crate::{address::HasAddressHrp, AddressHrp, CosmosBuilder};

use self::query::GrpcRequest;

type GrpcService = InterceptedService<Channel, CosmosInterceptor>;

/// A connection to a Konstellation node over gRPC.
///
/// Cheap to clone, all clones share the underlying channel.
#[derive(Clone)]
pub struct Cosmos {
    builder: Arc<CosmosBuilder>,
    inner: CosmosInner,
}

/// Internal data structure containing gRPC clients.
#[derive(Clone)]
pub(crate) struct CosmosInner {
    auth_query_client: cosmos_sdk_proto::cosmos::auth::v1beta1::query_client::QueryClient<GrpcService>,
    bank_query_client: cosmos_sdk_proto::cosmos::bank::v1beta1::query_client::QueryClient<GrpcService>,
    tx_service_client: cosmos_sdk_proto::cosmos::tx::v1beta1::service_client::ServiceClient<GrpcService>,
    tendermint_client:
        cosmos_sdk_proto::cosmos::base::tendermint::v1beta1::service_client::ServiceClient<
            GrpcService,
        >,
}

#[derive(thiserror::Error, Debug)]
pub enum PerformQueryError {
    #[error("Error response from gRPC endpoint: {0:?}")]
    Tonic(tonic::Status),
    #[error("Query timed out, total elapsed time: {0}")]
    Timeout(Elapsed),
}

/// Status codes worth another attempt. Everything else is an answer from the node.
fn is_transient(status: &Status) -> bool {
    matches!(
        status.code(),
        tonic::Code::Unavailable
            | tonic::Code::Cancelled
            | tonic::Code::DeadlineExceeded
            | tonic::Code::ResourceExhausted
    )
}

#[derive(Clone)]
pub(crate) struct CosmosInterceptor(Option<String>);

impl Interceptor for CosmosInterceptor {
    fn call(&mut self, mut request: tonic::Request<()>) -> Result<tonic::Request<()>, Status> {
        let req = request.metadata_mut();
        if let Some(value) = &self.0 {
            let value = FromStr::from_str(value);
            if let Ok(header_value) = value {
                req.insert("referer", header_value);
            }
        }
        Ok(request)
    }
}

impl CosmosBuilder {
    /// Connect and check that the node serves the expected chain.
    pub async fn build(self) -> Result<Cosmos> {
        let cosmos = self.build_lazy()?;
        // Force strict connection
        cosmos.sanity_check().await?;
        Ok(cosmos)
    }

    /// Create the connection without contacting the node.
    ///
    /// The channel connects on first use.
    pub fn build_lazy(self) -> Result<Cosmos> {
        let grpc_url = self.grpc_url();
        let grpc_endpoint = grpc_url
            .parse::<Endpoint>()
            .with_context(|| format!("Invalid gRPC URL: {grpc_url}"))?
            .connect_timeout(self.connection_timeout());
        let grpc_endpoint = if grpc_url.starts_with("https://") {
            tls_endpoint(grpc_endpoint)?
        } else {
            grpc_endpoint
        };
        let grpc_channel = grpc_endpoint.connect_lazy();

        let interceptor = CosmosInterceptor(self.referer_header().map(ToOwned::to_owned));

        let inner = CosmosInner {
            auth_query_client:
                cosmos_sdk_proto::cosmos::auth::v1beta1::query_client::QueryClient::with_interceptor(
                    grpc_channel.clone(), interceptor.clone()
            ),
            bank_query_client:
                cosmos_sdk_proto::cosmos::bank::v1beta1::query_client::QueryClient::with_interceptor(
                    grpc_channel.clone(), interceptor.clone()
            ),
            tx_service_client:
                cosmos_sdk_proto::cosmos::tx::v1beta1::service_client::ServiceClient::with_interceptor(
                    grpc_channel.clone(), interceptor.clone()
            ),
            tendermint_client: cosmos_sdk_proto::cosmos::base::tendermint::v1beta1::service_client::ServiceClient::with_interceptor(grpc_channel, interceptor),
        };

        Ok(Cosmos {
            builder: Arc::new(self),
            inner,
        })
    }
}

#[cfg(feature = "rustls-tls")]
fn tls_endpoint(endpoint: Endpoint) -> Result<Endpoint> {
    Ok(endpoint.tls_config(tonic::transport::ClientTlsConfig::new())?)
}

#[cfg(not(feature = "rustls-tls"))]
fn tls_endpoint(endpoint: Endpoint) -> Result<Endpoint> {
    Err(anyhow::anyhow!(
        "{:?} requires TLS, enable the rustls-tls feature",
        endpoint.uri()
    ))
}

impl Cosmos {
    pub(crate) async fn perform_query<Request: GrpcRequest>(
        &self,
        req: Request,
    ) -> Result<tonic::Response<Request::Response>, PerformQueryError> {
        let mut attempt = 0;
        loop {
            let duration = Duration::from_secs(self.builder.query_timeout_seconds().into());
            let res = tokio::time::timeout(duration, req.clone().perform(&self.inner)).await;
            let e = match res {
                Ok(Ok(x)) => return Ok(x),
                Ok(Err(err)) if is_transient(&err) => PerformQueryError::Tonic(err),
                Ok(Err(err)) => return Err(PerformQueryError::Tonic(err)),
                Err(e) => PerformQueryError::Timeout(e),
            };
            if attempt >= self.builder.query_retries() {
                return Err(e);
            } else {
                attempt += 1;
                tracing::debug!(
                    "Error performing a query, retrying. Attempt {attempt} of {}. {e:?}",
                    self.builder.query_retries()
                );
            }
        }
    }

    pub fn get_builder(&self) -> &Arc<CosmosBuilder> {
        &self.builder
    }

    /// Sanity check the connection, ensuring that the chain ID we found matches what we expected.
    ///
    /// Called automatically by [CosmosBuilder::build], but not by [CosmosBuilder::build_lazy].
    pub async fn sanity_check(&self) -> Result<()> {
        let actual = &self.get_latest_block_info().await?.chain_id;
        let expected = self.builder.chain_id();
        if actual == expected {
            Ok(())
        } else {
            Err(anyhow::anyhow!(
                "Mismatched chain IDs. Actual: {actual}. Expected: {expected}."
            ))
        }
    }

    pub async fn get_base_account(&self, address: impl Into<String>) -> Result<BaseAccount> {
        let address = address.into();
        let res = self
            .perform_query(QueryAccountRequest {
                address: address.clone(),
            })
            .await
            .with_context(|| format!("Unable to load account {address}"))?
            .into_inner();

        let base_account =
            prost::Message::decode(res.account.context("no account found")?.value.as_ref())?;
        Ok(base_account)
    }

    pub async fn all_balances(&self, address: impl Into<String>) -> Result<Vec<Coin>> {
        let address = address.into();
        let mut coins = Vec::new();
        let mut pagination = None;
        loop {
            let mut res = self
                .perform_query(QueryAllBalancesRequest {
                    address: address.clone(),
                    pagination: pagination.take(),
                })
                .await?
                .into_inner();
            coins.append(&mut res.balances);
            match res.pagination {
                Some(x) if !x.next_key.is_empty() => {
                    pagination = Some(PageRequest {
                        key: x.next_key,
                        offset: 0,
                        limit: 0,
                        count_total: false,
                        reverse: false,
                    })
                }
                _ => break Ok(coins),
            }
        }
    }

    /// Run a serialized transaction through the node's simulator.
    pub async fn simulate(&self, tx_bytes: Vec<u8>) -> Result<SimulateResponse, PerformQueryError> {
        #[allow(deprecated)]
        let req = SimulateRequest { tx: None, tx_bytes };
        self.perform_query(req).await.map(|res| res.into_inner())
    }

    /// Broadcast in sync mode, returning once the transaction passed `CheckTx`.
    ///
    /// A non-zero code in the response is not turned into an error here.
    pub async fn broadcast(&self, tx_bytes: Vec<u8>) -> Result<TxResponse> {
        self.perform_query(BroadcastTxRequest {
            tx_bytes,
            mode: BroadcastMode::Sync as i32,
        })
        .await
        .context("Unable to broadcast transaction")?
        .into_inner()
        .tx_response
        .context("Missing inner tx_response")
    }

    /// Implements a retry loop waiting for a transaction to be ready
    pub async fn wait_for_transaction(&self, txhash: impl Into<String>) -> Result<TxResponse> {
        const DELAY_SECONDS: u64 = 2;
        let txhash = txhash.into();
        let attempts = self.builder.transaction_attempts();
        for attempt in 1..=attempts {
            let txres = self
                .perform_query(GetTxRequest {
                    hash: txhash.clone(),
                })
                .await;
            match txres {
                Ok(txres) => {
                    return txres
                        .into_inner()
                        .tx_response
                        .with_context(|| format!("Missing tx_response for transaction {txhash}"))
                }
                // Some nodes report a missing transaction with a generic code
                Err(PerformQueryError::Tonic(e))
                    if e.code() == tonic::Code::NotFound || e.message().contains("not found") =>
                {
                    tracing::debug!("Transaction {txhash} not ready, attempt #{attempt}/{attempts}");
                    tokio::time::sleep(Duration::from_secs(DELAY_SECONDS)).await;
                }
                Err(e) => {
                    return Err(e.into());
                }
            }
        }
        Err(anyhow::anyhow!(
            "Timed out waiting for {txhash} to be ready"
        ))
    }

    pub async fn get_latest_block_info(&self) -> Result<BlockInfo> {
        let res = self
            .perform_query(GetLatestBlockRequest {})
            .await?
            .into_inner();
        let block = res.block.context("get_latest_block_info: block is None")?;
        let header = block
            .header
            .context("get_latest_block_info: header is None")?;
        let time = header
            .time
            .context("get_latest_block_info: time is None")?;
        let timestamp = u32::try_from(time.nanos)
            .ok()
            .and_then(|nanos| Utc.timestamp_opt(time.seconds, nanos).single())
            .context("get_latest_block_info: invalid block time")?;
        Ok(BlockInfo {
            height: header.height,
            timestamp,
            chain_id: header.chain_id,
        })
    }

    pub fn get_gas_coin(&self) -> &str {
        self.builder.gas_coin()
    }

    pub fn get_gas_multiplier(&self) -> f64 {
        self.builder.gas_estimate_multiplier()
    }
}

impl HasAddressHrp for Cosmos {
    fn get_address_hrp(&self) -> AddressHrp {
        self.builder.hrp()
    }
}

#[derive(Debug)]
pub struct BlockInfo {
    pub height: i64,
    pub timestamp: DateTime<Utc>,
    pub chain_id: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transient_codes() {
        assert!(is_transient(&Status::unavailable("connection refused")));
        assert!(is_transient(&Status::deadline_exceeded("slow")));
        assert!(!is_transient(&Status::not_found("tx not found")));
        assert!(!is_transient(&Status::invalid_argument("bad tx")));
    }

    #[tokio::test]
    async fn lazy_build_does_not_connect() {
        let mut builder = CosmosBuilder::default();
        builder.set_grpc_url("http://127.0.0.1:1");
        let cosmos = builder.build_lazy().unwrap();
        assert_eq!(cosmos.get_gas_coin(), "udarc");
        assert_eq!(cosmos.get_address_hrp(), AddressHrp::DARC);
    }

    #[tokio::test]
    async fn unreachable_node_fails() {
        let mut builder = CosmosBuilder::default();
        builder.set_grpc_url("http://127.0.0.1:1");
        builder.set_query_retries(Some(0));
        builder.set_connection_timeout(Some(Duration::from_millis(200)));
        assert!(builder.build().await.is_err());
    }

    #[test]
    fn invalid_url() {
        let mut builder = CosmosBuilder::default();
        builder.set_grpc_url("not a url");
        assert!(builder.build_lazy().is_err());
    }
}

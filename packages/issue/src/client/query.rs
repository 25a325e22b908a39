use cosmos_sdk_proto::cosmos::{
    auth::v1beta1::{QueryAccountRequest, QueryAccountResponse},
    bank::v1beta1::{QueryAllBalancesRequest, QueryAllBalancesResponse},
    base::tendermint::v1beta1::{GetLatestBlockRequest, GetLatestBlockResponse},
    tx::v1beta1::{
        BroadcastTxRequest, BroadcastTxResponse, GetTxRequest, GetTxResponse, SimulateRequest,
        SimulateResponse,
    },
};
use tonic::async_trait;

use super::CosmosInner;

#[async_trait]
pub(crate) trait GrpcRequest: Clone + Send + Sync + 'static {
    type Response: Send;

    async fn perform(
        self,
        inner: &CosmosInner,
    ) -> Result<tonic::Response<Self::Response>, tonic::Status>;
}

#[async_trait]
impl GrpcRequest for QueryAccountRequest {
    type Response = QueryAccountResponse;
    async fn perform(
        self,
        inner: &CosmosInner,
    ) -> Result<tonic::Response<Self::Response>, tonic::Status> {
        inner.auth_query_client.clone().account(self).await
    }
}

#[async_trait]
impl GrpcRequest for QueryAllBalancesRequest {
    type Response = QueryAllBalancesResponse;
    async fn perform(
        self,
        inner: &CosmosInner,
    ) -> Result<tonic::Response<Self::Response>, tonic::Status> {
        inner.bank_query_client.clone().all_balances(self).await
    }
}

#[async_trait]
impl GrpcRequest for SimulateRequest {
    type Response = SimulateResponse;
    async fn perform(
        self,
        inner: &CosmosInner,
    ) -> Result<tonic::Response<Self::Response>, tonic::Status> {
        inner.tx_service_client.clone().simulate(self).await
    }
}

#[async_trait]
impl GrpcRequest for BroadcastTxRequest {
    type Response = BroadcastTxResponse;
    async fn perform(
        self,
        inner: &CosmosInner,
    ) -> Result<tonic::Response<Self::Response>, tonic::Status> {
        inner.tx_service_client.clone().broadcast_tx(self).await
    }
}

#[async_trait]
impl GrpcRequest for GetTxRequest {
    type Response = GetTxResponse;
    async fn perform(
        self,
        inner: &CosmosInner,
    ) -> Result<tonic::Response<Self::Response>, tonic::Status> {
        inner.tx_service_client.clone().get_tx(self).await
    }
}

#[async_trait]
impl GrpcRequest for GetLatestBlockRequest {
    type Response = GetLatestBlockResponse;
    async fn perform(
        self,
        inner: &CosmosInner,
    ) -> Result<tonic::Response<Self::Response>, tonic::Status> {
        inner.tendermint_client.clone().get_latest_block(self).await
    }
}

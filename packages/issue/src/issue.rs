use anyhow::Result;
use cosmos_sdk_proto::cosmos::base::{abci::v1beta1::TxResponse, v1beta1::Coin};

use crate::{
    msgs::{
        MsgApprove, MsgBurn, MsgBurnFrom, MsgDecreaseAllowance, MsgDescription, MsgFeatures,
        MsgFreeze, MsgIncreaseAllowance, MsgIssueCreate, MsgMint, MsgTransfer, MsgTransferFrom,
        MsgTransferOwnership, MsgUnfreeze,
    },
    types::{FreezeOp, IssueFeatures, IssueParams},
    Address, Cosmos, HasAddress, Wallet,
};

/// Event emitted by the module when a token is created.
const ISSUE_CREATE_EVENT: &str = "issue_create";

/// Issue module interface: one wallet signing against one node.
pub struct Issue {
    client: Cosmos,
    wallet: Wallet,
}

impl Issue {
    pub fn new(client: Cosmos, wallet: Wallet) -> Self {
        Self { client, wallet }
    }

    pub fn wallet(&self) -> &Wallet {
        &self.wallet
    }

    /// Create a new token owned and issued by this wallet, returning its denom.
    pub async fn create(&self, params: IssueParams) -> Result<(TxResponse, String)> {
        let fallback = params.denom();
        let msg = MsgIssueCreate::new(&self.wallet, &self.wallet, params);
        let res = self.wallet.broadcast_message(&self.client, msg).await?;
        let denom = denom_from_response(&res).unwrap_or_else(|| {
            tracing::debug!("No {ISSUE_CREATE_EVENT} event in {}, assuming {fallback}", res.txhash);
            fallback
        });
        Ok((res, denom))
    }

    pub async fn description(&self, denom: String, description: String) -> Result<TxResponse> {
        let msg = MsgDescription::new(&self.wallet, denom, description);
        self.wallet.broadcast_message(&self.client, msg).await
    }

    pub async fn features(&self, denom: String, features: IssueFeatures) -> Result<TxResponse> {
        let msg = MsgFeatures::new(&self.wallet, denom, features);
        self.wallet.broadcast_message(&self.client, msg).await
    }

    pub async fn transfer_ownership(&self, to: Address, denom: String) -> Result<TxResponse> {
        let msg = MsgTransferOwnership::new(&self.wallet, to, denom);
        self.wallet.broadcast_message(&self.client, msg).await
    }

    pub async fn mint(&self, to: Address, amount: Vec<Coin>) -> Result<TxResponse> {
        let msg = MsgMint::new(&self.wallet, to, amount);
        self.wallet.broadcast_message(&self.client, msg).await
    }

    pub async fn burn(&self, amount: Vec<Coin>) -> Result<TxResponse> {
        let msg = MsgBurn::new(&self.wallet, amount);
        self.wallet.broadcast_message(&self.client, msg).await
    }

    pub async fn burn_from(&self, from: Address, amount: Vec<Coin>) -> Result<TxResponse> {
        let msg = MsgBurnFrom::new(&self.wallet, from, amount);
        self.wallet.broadcast_message(&self.client, msg).await
    }

    pub async fn freeze(&self, holder: Address, denom: String, op: FreezeOp) -> Result<TxResponse> {
        let msg = MsgFreeze::new(&self.wallet, holder, denom, op);
        self.wallet.broadcast_message(&self.client, msg).await
    }

    pub async fn unfreeze(
        &self,
        holder: Address,
        denom: String,
        op: FreezeOp,
    ) -> Result<TxResponse> {
        let msg = MsgUnfreeze::new(&self.wallet, holder, denom, op);
        self.wallet.broadcast_message(&self.client, msg).await
    }

    pub async fn transfer(&self, to: Address, amount: Vec<Coin>) -> Result<TxResponse> {
        let msg = MsgTransfer::new(&self.wallet, to, amount);
        self.wallet.broadcast_message(&self.client, msg).await
    }

    pub async fn transfer_from(
        &self,
        from: Address,
        to: Address,
        amount: Vec<Coin>,
    ) -> Result<TxResponse> {
        let msg = MsgTransferFrom::new(&self.wallet, from, to, amount);
        self.wallet.broadcast_message(&self.client, msg).await
    }

    pub async fn approve(&self, spender: Address, amount: Vec<Coin>) -> Result<TxResponse> {
        let msg = MsgApprove::new(&self.wallet, spender, amount);
        self.wallet.broadcast_message(&self.client, msg).await
    }

    pub async fn increase_allowance(
        &self,
        spender: Address,
        amount: Vec<Coin>,
    ) -> Result<TxResponse> {
        let msg = MsgIncreaseAllowance::new(&self.wallet, spender, amount);
        self.wallet.broadcast_message(&self.client, msg).await
    }

    pub async fn decrease_allowance(
        &self,
        spender: Address,
        amount: Vec<Coin>,
    ) -> Result<TxResponse> {
        let msg = MsgDecreaseAllowance::new(&self.wallet, spender, amount);
        self.wallet.broadcast_message(&self.client, msg).await
    }
}

impl HasAddress for Issue {
    fn get_address(&self) -> Address {
        self.wallet.get_address()
    }
}

/// The `denom` attribute of the `issue_create` event, if present.
fn denom_from_response(res: &TxResponse) -> Option<String> {
    res.logs
        .iter()
        .flat_map(|log| &log.events)
        .filter(|event| event.r#type == ISSUE_CREATE_EVENT)
        .flat_map(|event| &event.attributes)
        .find(|attr| attr.key == "denom")
        .map(|attr| attr.value.clone())
}

#[cfg(test)]
mod tests {
    use cosmos_sdk_proto::cosmos::base::abci::v1beta1::{AbciMessageLog, Attribute, StringEvent};

    use super::*;

    fn event(r#type: &str, key: &str, value: &str) -> StringEvent {
        StringEvent {
            r#type: r#type.to_owned(),
            attributes: vec![Attribute {
                key: key.to_owned(),
                value: value.to_owned(),
            }],
        }
    }

    #[test]
    fn denom_from_events() {
        let res = TxResponse {
            logs: vec![AbciMessageLog {
                msg_index: 0,
                log: String::new(),
                events: vec![
                    event("message", "denom", "wrong"),
                    event(ISSUE_CREATE_EVENT, "denom", "tst"),
                ],
            }],
            ..Default::default()
        };
        assert_eq!(denom_from_response(&res).as_deref(), Some("tst"));
    }

    #[test]
    fn missing_event() {
        assert_eq!(denom_from_response(&TxResponse::default()), None);
    }
}

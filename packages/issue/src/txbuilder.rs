use std::fmt::Display;

use anyhow::{Context, Result};
use cosmos_sdk_proto::cosmos::{
    base::{abci::v1beta1::TxResponse, v1beta1::Coin},
    crypto::secp256k1::PubKey,
    tx::{
        signing::v1beta1::SignMode,
        v1beta1::{
            mode_info, AuthInfo, Fee, ModeInfo, SignDoc, SignerInfo, SimulateResponse, Tx, TxBody,
        },
    },
};
use prost::Message;
use serde_json::json;

use crate::{
    client::PerformQueryError, msgs::IssueMsg, Cosmos, HasAddress, TxFailure, Wallet,
};

/// Gas limit used when a transaction is generated without simulating it.
pub const DEFAULT_GAS_LIMIT: u64 = 200_000;

/// A message to include in a transaction, including the type URL string.
///
/// Only constructed from messages which passed `validate_basic`.
#[derive(Clone, Debug)]
pub struct TypedMessage {
    any: cosmos_sdk_proto::Any,
    json: serde_json::Value,
    description: String,
}

impl TypedMessage {
    pub fn new<T: IssueMsg>(msg: T) -> Result<Self> {
        msg.validate_basic()?;
        let type_url = T::type_url();
        let mut json = serde_json::to_value(&msg)?;
        if let serde_json::Value::Object(map) = &mut json {
            map.insert("@type".to_owned(), type_url.clone().into());
        }
        Ok(TypedMessage {
            any: cosmos_sdk_proto::Any {
                type_url,
                value: msg.encode_to_vec(),
            },
            json,
            description: msg.describe(),
        })
    }

    pub fn type_url(&self) -> &str {
        &self.any.type_url
    }

    /// JSON rendering with an `@type` key
    pub fn json(&self) -> &serde_json::Value {
        &self.json
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn into_inner(self) -> cosmos_sdk_proto::Any {
        self.any
    }
}

/// Transaction builder
///
/// This is the core interface for producing, simulating, and broadcasting transactions.
#[derive(Default, Clone, Debug)]
pub struct TxBuilder {
    messages: Vec<TypedMessage>,
    memo: Option<String>,
    fees: Option<Vec<Coin>>,
}

impl Display for TxBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        for (idx, msg) in self.messages.iter().enumerate() {
            if idx > 0 {
                write!(f, "; ")?;
            }
            write!(f, "{}", msg.description)?;
        }
        if let Some(memo) = &self.memo {
            write!(f, " (memo: {memo})")?;
        }
        Ok(())
    }
}

impl TxBuilder {
    /// Validate a message and add it to this transaction.
    pub fn add_message(&mut self, msg: impl IssueMsg) -> Result<&mut Self> {
        self.messages.push(TypedMessage::new(msg)?);
        Ok(self)
    }

    pub fn messages(&self) -> &[TypedMessage] {
        &self.messages
    }

    /// Set the memo field.
    pub fn set_memo(&mut self, memo: impl Into<String>) -> &mut Self {
        self.memo = Some(memo.into());
        self
    }

    /// Either set or clear the memo field.
    pub fn set_optional_memo(&mut self, memo: impl Into<Option<String>>) -> &mut Self {
        self.memo = memo.into();
        self
    }

    /// Pay exactly these fees instead of deriving them from the gas price.
    ///
    /// Disables gas price escalation.
    pub fn set_fees(&mut self, fees: impl Into<Option<Vec<Coin>>>) -> &mut Self {
        self.fees = fees.into();
        self
    }

    /// Make a [TxBody] for this builder
    fn make_tx_body(&self) -> TxBody {
        TxBody {
            messages: self.messages.iter().map(|msg| msg.any.clone()).collect(),
            memo: self.memo.as_deref().unwrap_or_default().to_owned(),
            timeout_height: 0,
            extension_options: vec![],
            non_critical_extension_options: vec![],
        }
    }

    /// JSON of the unsigned transaction, for signing elsewhere.
    ///
    /// Uses the explicit fees if set, otherwise leaves the fee amount empty.
    pub fn generate_unsigned(&self, gas_limit: u64) -> serde_json::Value {
        let fees = self
            .fees
            .iter()
            .flatten()
            .map(|Coin { denom, amount }| json!({ "denom": denom, "amount": amount }))
            .collect::<Vec<_>>();
        json!({
            "body": {
                "messages": self.messages.iter().map(|msg| msg.json.clone()).collect::<Vec<_>>(),
                "memo": self.memo.as_deref().unwrap_or_default(),
                "timeout_height": "0",
                "extension_options": [],
                "non_critical_extension_options": [],
            },
            "auth_info": {
                "signer_infos": [],
                "fee": {
                    "amount": fees,
                    "gas_limit": gas_limit.to_string(),
                    "payer": "",
                    "granter": "",
                },
            },
            "signatures": [],
        })
    }

    /// Simulate the amount of gas needed to run a transaction.
    pub async fn simulate(
        &self,
        cosmos: &Cosmos,
        sender: impl HasAddress,
    ) -> Result<FullSimulateResponse> {
        let sequence = match cosmos.get_base_account(sender.get_address_string()).await {
            Ok(account) => account.sequence,
            Err(err) if is_account_not_found(&err) => {
                tracing::warn!("Simulating with a non-existent wallet. Setting sequence number to 0");
                0
            }
            Err(err) => return Err(err),
        };

        // There may be a bug in Cosmos where simulating expects the wrong
        // sequence number. So: we simulate, trying out the suggested sequence
        // number if necessary, and then we broadcast, again trying the sequence
        // number they recommend if necessary.
        //
        // See: https://github.com/cosmos/cosmos-sdk/issues/11597

        Ok(match self.simulate_inner(cosmos, sequence).await {
            Ok(pair) => pair,
            Err(ExpectedSequenceError::RealError(e)) => return Err(e),
            Err(ExpectedSequenceError::NewNumber(x, e)) => {
                tracing::warn!("Received an account sequence error while simulating a transaction, retrying with new number {x}: {e:?}");
                self.simulate_inner(cosmos, x).await?
            }
        })
    }

    /// Sign transaction, broadcast, wait for it to complete, confirm that it was successful
    /// the gas amount is determined automatically by running a simulation first and padding by a multiplier
    /// the multiplier can by adjusted by calling [crate::CosmosBuilder::set_gas_estimate_multiplier]
    pub async fn sign_and_broadcast(&self, cosmos: &Cosmos, wallet: &Wallet) -> Result<TxResponse> {
        let simres = self.simulate(cosmos, wallet).await?;
        self.inner_sign_and_broadcast(
            cosmos,
            wallet,
            simres.body,
            // Gas estimation is not perfect, so we need to adjust it by a multiplier to account for drift
            cosmos.get_builder().adjust_gas(simres.gas_used),
        )
        .await
    }

    /// Sign transaction, broadcast, wait for it to complete, confirm that it was successful
    /// unlike sign_and_broadcast(), the gas amount is explicit here and therefore no simulation is run
    pub async fn sign_and_broadcast_with_gas(
        &self,
        cosmos: &Cosmos,
        wallet: &Wallet,
        gas_to_request: u64,
    ) -> Result<TxResponse> {
        self.inner_sign_and_broadcast(cosmos, wallet, self.make_tx_body(), gas_to_request)
            .await
    }

    async fn inner_sign_and_broadcast(
        &self,
        cosmos: &Cosmos,
        wallet: &Wallet,
        body: TxBody,
        gas_to_request: u64,
    ) -> Result<TxResponse> {
        let base_account = cosmos.get_base_account(wallet.get_address_string()).await?;

        match self
            .sign_and_broadcast_with(
                cosmos,
                wallet,
                base_account.account_number,
                base_account.sequence,
                body.clone(),
                gas_to_request,
            )
            .await
        {
            Ok(res) => Ok(res),
            Err(ExpectedSequenceError::RealError(e)) => Err(e),
            Err(ExpectedSequenceError::NewNumber(x, e)) => {
                tracing::warn!("Received an account sequence error while broadcasting a transaction, retrying with new number {x}: {e:?}");
                self.sign_and_broadcast_with(
                    cosmos,
                    wallet,
                    base_account.account_number,
                    x,
                    body,
                    gas_to_request,
                )
                .await
                .map_err(|x| x.into())
            }
        }
    }

    fn make_signer_infos(&self, sequence: u64, wallet: Option<&Wallet>) -> Vec<SignerInfo> {
        vec![SignerInfo {
            // The simulator substitutes a dummy key when none is given
            public_key: wallet.map(|wallet| cosmos_sdk_proto::Any {
                type_url: "/cosmos.crypto.secp256k1.PubKey".to_owned(),
                value: PubKey {
                    key: wallet.public_key_bytes().to_owned(),
                }
                .encode_to_vec(),
            }),
            mode_info: Some(ModeInfo {
                sum: Some(mode_info::Sum::Single(mode_info::Single {
                    mode: SignMode::Direct as i32,
                })),
            }),
            sequence,
        }]
    }

    /// Simulate to calculate the gas costs
    async fn simulate_inner(
        &self,
        cosmos: &Cosmos,
        sequence: u64,
    ) -> Result<FullSimulateResponse, ExpectedSequenceError> {
        let body = self.make_tx_body();

        // First simulate the request with no signature and fake gas
        let simulate_tx = Tx {
            auth_info: Some(AuthInfo {
                fee: Some(Fee {
                    amount: vec![],
                    gas_limit: 0,
                    payer: "".to_owned(),
                    granter: "".to_owned(),
                }),
                signer_infos: self.make_signer_infos(sequence, None),
                tip: None,
            }),
            signatures: vec![vec![]],
            body: Some(body.clone()),
        };

        let simres = match cosmos.simulate(simulate_tx.encode_to_vec()).await {
            Ok(simres) => simres,
            Err(PerformQueryError::Tonic(e)) => {
                let is_sequence = get_expected_sequence(e.message());
                let e = anyhow::Error::from(e).context("Unable to simulate transaction");
                return match is_sequence {
                    None => Err(ExpectedSequenceError::RealError(e)),
                    Some(number) => Err(ExpectedSequenceError::NewNumber(number, e)),
                };
            }
            Err(e) => return Err(ExpectedSequenceError::RealError(e.into())),
        };

        let gas_used = simres
            .gas_info
            .as_ref()
            .context("Missing gas_info in SimulateResponse")?
            .gas_used;

        Ok(FullSimulateResponse {
            body,
            simres,
            gas_used,
        })
    }

    async fn sign_and_broadcast_with(
        &self,
        cosmos: &Cosmos,
        wallet: &Wallet,
        account_number: u64,
        sequence: u64,
        body: TxBody,
        gas_to_request: u64,
    ) -> Result<TxResponse, ExpectedSequenceError> {
        let body_ref = &body;
        let retry_with_fees = |amount: Vec<Coin>| async move {
            let auth_info = AuthInfo {
                signer_infos: self.make_signer_infos(sequence, Some(wallet)),
                fee: Some(Fee {
                    amount,
                    gas_limit: gas_to_request,
                    payer: "".to_owned(),
                    granter: "".to_owned(),
                }),
                tip: None,
            };

            let sign_doc = SignDoc {
                body_bytes: body_ref.encode_to_vec(),
                auth_info_bytes: auth_info.encode_to_vec(),
                chain_id: cosmos.get_builder().chain_id().to_owned(),
                account_number,
            };
            let signature = wallet.sign_bytes(&sign_doc.encode_to_vec())?;

            let tx = Tx {
                body: Some(body_ref.clone()),
                auth_info: Some(auth_info),
                signatures: vec![signature.serialize_compact().to_vec()],
            };

            let res = cosmos.broadcast(tx.encode_to_vec()).await?;

            if let Some(failure) = TxFailure::from_response(&res) {
                if failure.is_insufficient_fee() {
                    return Err(AttemptError::InsufficientGas(failure.into()));
                }
                let is_sequence = get_expected_sequence(&failure.raw_log);
                let e =
                    anyhow::Error::from(failure).context("Initial transaction broadcast failed");
                return Err(AttemptError::Inner(match is_sequence {
                    None => ExpectedSequenceError::RealError(e),
                    Some(number) => ExpectedSequenceError::NewNumber(number, e),
                }));
            }

            tracing::debug!("Initial BroadcastTxResponse: {res:?}");

            let res = cosmos.wait_for_transaction(res.txhash).await?;
            // No sequence recovery once the transaction has landed on chain.
            if let Some(failure) = TxFailure::from_response(&res) {
                return Err(AttemptError::Inner(ExpectedSequenceError::RealError(
                    failure.into(),
                )));
            }

            tracing::debug!("TxResponse: {res:?}");
            tracing::info!("Transaction {} included at height {}", res.txhash, res.height);

            Ok(res)
        };

        let builder = cosmos.get_builder();
        let fees_for_attempt = |attempt_number| {
            vec![Coin {
                denom: cosmos.get_gas_coin().to_owned(),
                amount: builder
                    .gas_to_coins(gas_to_request, attempt_number)
                    .to_string(),
            }]
        };
        escalate_fees(
            self.fees.as_deref(),
            builder.gas_price_retry_attempts(),
            fees_for_attempt,
            retry_with_fees,
        )
        .await
    }
}

/// Outcome of a single signed broadcast.
enum AttemptError<E> {
    Inner(E),
    /// Rejected for paying too little, worth retrying at a higher gas price.
    InsufficientGas(anyhow::Error),
}

impl From<anyhow::Error> for AttemptError<ExpectedSequenceError> {
    fn from(e: anyhow::Error) -> Self {
        AttemptError::Inner(e.into())
    }
}

/// Pay `fees` in a single attempt when given. Otherwise make `attempts + 1`
/// attempts with the fees for each attempt number, moving on only after an
/// insufficient fee rejection.
async fn escalate_fees<T, E, Fut>(
    fees: Option<&[Coin]>,
    attempts: u64,
    fees_for_attempt: impl Fn(u64) -> Vec<Coin>,
    mut attempt: impl FnMut(Vec<Coin>) -> Fut,
) -> Result<T, E>
where
    Fut: std::future::Future<Output = Result<T, AttemptError<E>>>,
    E: From<anyhow::Error>,
{
    if let Some(fees) = fees {
        return match attempt(fees.to_vec()).await {
            Ok(x) => Ok(x),
            Err(AttemptError::InsufficientGas(e)) => Err(e.into()),
            Err(AttemptError::Inner(e)) => Err(e),
        };
    }

    for attempt_number in 0..attempts {
        match attempt(fees_for_attempt(attempt_number)).await {
            Ok(x) => return Ok(x),
            Err(AttemptError::InsufficientGas(e)) => {
                tracing::debug!(
                    "Insufficient gas in attempt #{attempt_number}, retrying. Error: {e:?}"
                );
            }
            Err(AttemptError::Inner(e)) => return Err(e),
        }
    }

    match attempt(fees_for_attempt(attempts)).await {
        Ok(x) => Ok(x),
        Err(AttemptError::InsufficientGas(e)) => Err(e.into()),
        Err(AttemptError::Inner(e)) => Err(e),
    }
}

fn is_account_not_found(err: &anyhow::Error) -> bool {
    match err.downcast_ref::<PerformQueryError>() {
        Some(PerformQueryError::Tonic(status)) => {
            status.code() == tonic::Code::NotFound || status.message().contains("not found")
        }
        _ => false,
    }
}

/// Returned the expected account sequence mismatch based on an error message, if present
fn get_expected_sequence(message: &str) -> Option<u64> {
    for line in message.lines() {
        if let Some(x) = get_expected_sequence_single(line) {
            return Some(x);
        }
    }
    None
}

fn get_expected_sequence_single(message: &str) -> Option<u64> {
    let s = message.strip_prefix("account sequence mismatch, expected ")?;
    let comma = s.find(',')?;
    s[..comma].parse().ok()
}

/// Either a real error that should be propagated, or a new account sequence number to try
enum ExpectedSequenceError {
    RealError(anyhow::Error),
    NewNumber(u64, anyhow::Error),
}

impl From<anyhow::Error> for ExpectedSequenceError {
    fn from(e: anyhow::Error) -> Self {
        ExpectedSequenceError::RealError(e)
    }
}

impl From<ExpectedSequenceError> for anyhow::Error {
    fn from(e: ExpectedSequenceError) -> Self {
        match e {
            ExpectedSequenceError::RealError(e) => e,
            ExpectedSequenceError::NewNumber(_, e) => e,
        }
    }
}

pub struct FullSimulateResponse {
    pub body: TxBody,
    pub simres: SimulateResponse,
    pub gas_used: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        msgs::{MsgFreeze, MsgMint},
        types::FreezeOp,
        AddressHrp, RawAddress,
    };

    #[test]
    fn get_expected_sequence_good() {
        assert_eq!(
            get_expected_sequence("account sequence mismatch, expected 5, got 0"),
            Some(5)
        );
        assert_eq!(
            get_expected_sequence("account sequence mismatch, expected 2, got 7"),
            Some(2)
        );
        assert_eq!(
            get_expected_sequence("account sequence mismatch, expected 20000001, got 7"),
            Some(20000001)
        );
    }

    #[test]
    fn get_expected_sequence_extra_prelude() {
        assert_eq!(
            get_expected_sequence("blah blah blah\n\naccount sequence mismatch, expected 5, got 0"),
            Some(5)
        );
        assert_eq!(
            get_expected_sequence(
                "iiiiiiiiiiiiii\n\naccount sequence mismatch, expected 20000001, got 7"
            ),
            Some(20000001)
        );
    }

    #[test]
    fn get_expected_sequence_bad() {
        assert_eq!(
            get_expected_sequence("Totally different error message"),
            None
        );
        assert_eq!(
            get_expected_sequence("account sequence mismatch, expected XXXXX, got 7"),
            None
        );
    }

    fn addr(byte: u8) -> crate::Address {
        RawAddress::from([byte; 20]).with_hrp(AddressHrp::DARC)
    }

    #[test]
    fn invalid_messages_rejected() {
        let mut builder = TxBuilder::default();
        let err = builder
            .add_message(MsgMint::new(addr(1), addr(2), vec![]))
            .unwrap_err();
        assert!(err.downcast_ref::<crate::IssueError>().is_some());
        assert!(builder.messages().is_empty());
    }

    #[test]
    fn unsigned_json() {
        let mut builder = TxBuilder::default();
        builder
            .add_message(MsgFreeze::new(addr(1), addr(2), "tst", FreezeOp::Out))
            .unwrap();
        builder.set_memo("hello").set_fees(vec![Coin {
            denom: "udarc".to_owned(),
            amount: "5000".to_owned(),
        }]);
        let json = builder.generate_unsigned(DEFAULT_GAS_LIMIT);

        let msg = &json["body"]["messages"][0];
        assert_eq!(msg["@type"], "/konstellation.issue.MsgFreeze");
        assert_eq!(msg["op"], "out");
        assert_eq!(msg["holder"], addr(2).to_string());
        assert_eq!(json["body"]["memo"], "hello");
        assert_eq!(json["auth_info"]["fee"]["gas_limit"], "200000");
        assert_eq!(json["auth_info"]["fee"]["amount"][0]["amount"], "5000");
        assert_eq!(json["signatures"], json!([]));
    }

    #[test]
    fn body_carries_type_urls() {
        let mut builder = TxBuilder::default();
        builder
            .add_message(MsgFreeze::new(addr(1), addr(2), "tst", FreezeOp::In))
            .unwrap();
        let body = builder.make_tx_body();
        assert_eq!(body.messages.len(), 1);
        assert_eq!(body.messages[0].type_url, "/konstellation.issue.MsgFreeze");
        assert_eq!(builder.to_string(), builder.messages()[0].description());
    }

    fn udarc(amount: u64) -> Vec<Coin> {
        vec![Coin {
            denom: "udarc".to_owned(),
            amount: amount.to_string(),
        }]
    }

    fn insufficient() -> AttemptError<anyhow::Error> {
        AttemptError::InsufficientGas(anyhow::anyhow!("insufficient fee"))
    }

    #[tokio::test]
    async fn gas_price_escalates_until_accepted() {
        let paid = std::cell::RefCell::new(vec![]);
        let res = escalate_fees(
            None,
            3,
            |attempt_number| udarc(100 + attempt_number * 50),
            |fees| {
                paid.borrow_mut().push(fees);
                let count = paid.borrow().len();
                async move {
                    if count < 3 {
                        Err(insufficient())
                    } else {
                        Ok(count)
                    }
                }
            },
        )
        .await
        .unwrap();
        assert_eq!(res, 3);
        assert_eq!(paid.into_inner(), vec![udarc(100), udarc(150), udarc(200)]);
    }

    #[tokio::test]
    async fn gas_price_escalation_gives_up() {
        let paid = std::cell::RefCell::new(vec![]);
        let res: Result<(), anyhow::Error> = escalate_fees(
            None,
            2,
            udarc,
            |fees| {
                paid.borrow_mut().push(fees);
                async { Err(insufficient()) }
            },
        )
        .await;
        assert!(res.is_err());
        assert_eq!(paid.into_inner(), vec![udarc(0), udarc(1), udarc(2)]);
    }

    #[tokio::test]
    async fn explicit_fees_single_attempt() {
        let explicit = udarc(5000);
        let paid = std::cell::RefCell::new(vec![]);
        let res: Result<(), anyhow::Error> = escalate_fees(
            Some(explicit.as_slice()),
            3,
            udarc,
            |fees| {
                paid.borrow_mut().push(fees);
                async { Err(insufficient()) }
            },
        )
        .await;
        assert!(res.is_err());
        assert_eq!(paid.into_inner(), vec![udarc(5000)]);
    }

    #[tokio::test]
    async fn other_failures_stop_escalation() {
        let paid = std::cell::RefCell::new(vec![]);
        let res: Result<(), anyhow::Error> = escalate_fees(
            None,
            3,
            udarc,
            |fees| {
                paid.borrow_mut().push(fees);
                async { Err(AttemptError::Inner(anyhow::anyhow!("out of gas"))) }
            },
        )
        .await;
        assert_eq!(res.unwrap_err().to_string(), "out of gas");
        assert_eq!(paid.into_inner().len(), 1);
    }
}

//! Messages understood by the issue module.
//!
//! Each message carries its protobuf encoding (via prost) and a stateless
//! `validate_basic` check that runs before anything is signed.

use cosmos_sdk_proto::cosmos::base::v1beta1::Coin;
use serde::Serialize;

use crate::{
    address::HasAddress,
    coins::{validate_coins, PrettyCoins},
    types::{validate_denom, validate_description, FreezeOp, IssueFeatures, IssueParams},
    Address, IssueError,
};

/// Protobuf package of the module's messages.
pub const PROTO_PACKAGE: &str = "konstellation.issue";

/// Common interface of every issue module message.
pub trait IssueMsg: prost::Message + Serialize + Clone + 'static {
    /// Protobuf message name, e.g. `MsgMint`
    const NAME: &'static str;

    fn type_url() -> String {
        format!("/{PROTO_PACKAGE}.{}", Self::NAME)
    }

    /// Address which must sign a transaction containing this message.
    fn signer(&self) -> &str;

    /// Stateless checks. Anything that requires chain state is left to the node.
    fn validate_basic(&self) -> Result<(), IssueError>;

    /// One-line summary used in logs.
    fn describe(&self) -> String;
}

fn validate_address(field: &str, value: &str) -> Result<Address, IssueError> {
    if value.is_empty() {
        return Err(IssueError::InvalidAddress(format!("missing {field} address")));
    }
    value
        .parse::<Address>()
        .map_err(|e| IssueError::InvalidAddress(format!("{field}: {e}")))
}

//////////// MESSAGE DEFINITIONS ////////////////

/// Create a new token owned by `owner`.
#[allow(clippy::derive_partial_eq_without_eq)]
#[derive(Clone, PartialEq, ::prost::Message, Serialize)]
pub struct MsgIssueCreate {
    #[prost(string, tag = "1")]
    pub owner: ::prost::alloc::string::String,
    #[prost(string, tag = "2")]
    pub issuer: ::prost::alloc::string::String,
    #[prost(message, optional, tag = "3")]
    pub params: ::core::option::Option<IssueParams>,
}

/// Replace the JSON description of a token.
#[allow(clippy::derive_partial_eq_without_eq)]
#[derive(Clone, PartialEq, ::prost::Message, Serialize)]
pub struct MsgDescription {
    #[prost(string, tag = "1")]
    pub owner: ::prost::alloc::string::String,
    #[prost(string, tag = "2")]
    pub denom: ::prost::alloc::string::String,
    #[prost(string, tag = "3")]
    pub description: ::prost::alloc::string::String,
}

/// Replace the disabled-feature flags of a token.
#[allow(clippy::derive_partial_eq_without_eq)]
#[derive(Clone, PartialEq, ::prost::Message, Serialize)]
pub struct MsgFeatures {
    #[prost(string, tag = "1")]
    pub owner: ::prost::alloc::string::String,
    #[prost(string, tag = "2")]
    pub denom: ::prost::alloc::string::String,
    #[prost(message, optional, tag = "3")]
    pub features: ::core::option::Option<IssueFeatures>,
}

#[allow(clippy::derive_partial_eq_without_eq)]
#[derive(Clone, PartialEq, ::prost::Message, Serialize)]
pub struct MsgTransferOwnership {
    #[prost(string, tag = "1")]
    pub owner: ::prost::alloc::string::String,
    #[prost(string, tag = "2")]
    pub to_address: ::prost::alloc::string::String,
    #[prost(string, tag = "3")]
    pub denom: ::prost::alloc::string::String,
}

#[allow(clippy::derive_partial_eq_without_eq)]
#[derive(Clone, PartialEq, ::prost::Message, Serialize)]
pub struct MsgMint {
    #[prost(string, tag = "1")]
    pub minter: ::prost::alloc::string::String,
    #[prost(string, tag = "2")]
    pub to_address: ::prost::alloc::string::String,
    #[prost(message, repeated, tag = "3")]
    #[serde(with = "crate::coins::vec")]
    pub amount: ::prost::alloc::vec::Vec<Coin>,
}

#[allow(clippy::derive_partial_eq_without_eq)]
#[derive(Clone, PartialEq, ::prost::Message, Serialize)]
pub struct MsgBurn {
    #[prost(string, tag = "1")]
    pub burner: ::prost::alloc::string::String,
    #[prost(message, repeated, tag = "2")]
    #[serde(with = "crate::coins::vec")]
    pub amount: ::prost::alloc::vec::Vec<Coin>,
}

#[allow(clippy::derive_partial_eq_without_eq)]
#[derive(Clone, PartialEq, ::prost::Message, Serialize)]
pub struct MsgBurnFrom {
    #[prost(string, tag = "1")]
    pub burner: ::prost::alloc::string::String,
    #[prost(string, tag = "2")]
    pub from_address: ::prost::alloc::string::String,
    #[prost(message, repeated, tag = "3")]
    #[serde(with = "crate::coins::vec")]
    pub amount: ::prost::alloc::vec::Vec<Coin>,
}

#[allow(clippy::derive_partial_eq_without_eq)]
#[derive(Clone, PartialEq, ::prost::Message, Serialize)]
pub struct MsgFreeze {
    #[prost(string, tag = "1")]
    pub freezer: ::prost::alloc::string::String,
    #[prost(string, tag = "2")]
    pub holder: ::prost::alloc::string::String,
    #[prost(string, tag = "3")]
    pub denom: ::prost::alloc::string::String,
    /// One of `in`, `out`, `in-out`
    #[prost(string, tag = "4")]
    pub op: ::prost::alloc::string::String,
}

#[allow(clippy::derive_partial_eq_without_eq)]
#[derive(Clone, PartialEq, ::prost::Message, Serialize)]
pub struct MsgUnfreeze {
    #[prost(string, tag = "1")]
    pub freezer: ::prost::alloc::string::String,
    #[prost(string, tag = "2")]
    pub holder: ::prost::alloc::string::String,
    #[prost(string, tag = "3")]
    pub denom: ::prost::alloc::string::String,
    #[prost(string, tag = "4")]
    pub op: ::prost::alloc::string::String,
}

#[allow(clippy::derive_partial_eq_without_eq)]
#[derive(Clone, PartialEq, ::prost::Message, Serialize)]
pub struct MsgTransfer {
    #[prost(string, tag = "1")]
    pub from_address: ::prost::alloc::string::String,
    #[prost(string, tag = "2")]
    pub to_address: ::prost::alloc::string::String,
    #[prost(message, repeated, tag = "3")]
    #[serde(with = "crate::coins::vec")]
    pub amount: ::prost::alloc::vec::Vec<Coin>,
}

/// Spend from another account's balance using an allowance.
#[allow(clippy::derive_partial_eq_without_eq)]
#[derive(Clone, PartialEq, ::prost::Message, Serialize)]
pub struct MsgTransferFrom {
    #[prost(string, tag = "1")]
    pub sender: ::prost::alloc::string::String,
    #[prost(string, tag = "2")]
    pub from_address: ::prost::alloc::string::String,
    #[prost(string, tag = "3")]
    pub to_address: ::prost::alloc::string::String,
    #[prost(message, repeated, tag = "4")]
    #[serde(with = "crate::coins::vec")]
    pub amount: ::prost::alloc::vec::Vec<Coin>,
}

#[allow(clippy::derive_partial_eq_without_eq)]
#[derive(Clone, PartialEq, ::prost::Message, Serialize)]
pub struct MsgApprove {
    #[prost(string, tag = "1")]
    pub owner: ::prost::alloc::string::String,
    #[prost(string, tag = "2")]
    pub spender: ::prost::alloc::string::String,
    #[prost(message, repeated, tag = "3")]
    #[serde(with = "crate::coins::vec")]
    pub amount: ::prost::alloc::vec::Vec<Coin>,
}

#[allow(clippy::derive_partial_eq_without_eq)]
#[derive(Clone, PartialEq, ::prost::Message, Serialize)]
pub struct MsgIncreaseAllowance {
    #[prost(string, tag = "1")]
    pub owner: ::prost::alloc::string::String,
    #[prost(string, tag = "2")]
    pub spender: ::prost::alloc::string::String,
    #[prost(message, repeated, tag = "3")]
    #[serde(with = "crate::coins::vec")]
    pub amount: ::prost::alloc::vec::Vec<Coin>,
}

#[allow(clippy::derive_partial_eq_without_eq)]
#[derive(Clone, PartialEq, ::prost::Message, Serialize)]
pub struct MsgDecreaseAllowance {
    #[prost(string, tag = "1")]
    pub owner: ::prost::alloc::string::String,
    #[prost(string, tag = "2")]
    pub spender: ::prost::alloc::string::String,
    #[prost(message, repeated, tag = "3")]
    #[serde(with = "crate::coins::vec")]
    pub amount: ::prost::alloc::vec::Vec<Coin>,
}

//////////// CONSTRUCTORS ////////////////

impl MsgIssueCreate {
    pub fn new(owner: impl HasAddress, issuer: impl HasAddress, params: IssueParams) -> Self {
        MsgIssueCreate {
            owner: owner.get_address_string(),
            issuer: issuer.get_address_string(),
            params: Some(params),
        }
    }
}

impl MsgDescription {
    pub fn new(owner: impl HasAddress, denom: impl Into<String>, description: impl Into<String>) -> Self {
        MsgDescription {
            owner: owner.get_address_string(),
            denom: denom.into(),
            description: description.into(),
        }
    }
}

impl MsgFeatures {
    pub fn new(owner: impl HasAddress, denom: impl Into<String>, features: IssueFeatures) -> Self {
        MsgFeatures {
            owner: owner.get_address_string(),
            denom: denom.into(),
            features: Some(features),
        }
    }
}

impl MsgTransferOwnership {
    pub fn new(owner: impl HasAddress, to_address: impl HasAddress, denom: impl Into<String>) -> Self {
        MsgTransferOwnership {
            owner: owner.get_address_string(),
            to_address: to_address.get_address_string(),
            denom: denom.into(),
        }
    }
}

impl MsgMint {
    pub fn new(minter: impl HasAddress, to_address: impl HasAddress, amount: Vec<Coin>) -> Self {
        MsgMint {
            minter: minter.get_address_string(),
            to_address: to_address.get_address_string(),
            amount,
        }
    }
}

impl MsgBurn {
    pub fn new(burner: impl HasAddress, amount: Vec<Coin>) -> Self {
        MsgBurn {
            burner: burner.get_address_string(),
            amount,
        }
    }
}

impl MsgBurnFrom {
    pub fn new(burner: impl HasAddress, from_address: impl HasAddress, amount: Vec<Coin>) -> Self {
        MsgBurnFrom {
            burner: burner.get_address_string(),
            from_address: from_address.get_address_string(),
            amount,
        }
    }
}

impl MsgFreeze {
    pub fn new(
        freezer: impl HasAddress,
        holder: impl HasAddress,
        denom: impl Into<String>,
        op: FreezeOp,
    ) -> Self {
        MsgFreeze {
            freezer: freezer.get_address_string(),
            holder: holder.get_address_string(),
            denom: denom.into(),
            op: op.to_string(),
        }
    }
}

impl MsgUnfreeze {
    pub fn new(
        freezer: impl HasAddress,
        holder: impl HasAddress,
        denom: impl Into<String>,
        op: FreezeOp,
    ) -> Self {
        MsgUnfreeze {
            freezer: freezer.get_address_string(),
            holder: holder.get_address_string(),
            denom: denom.into(),
            op: op.to_string(),
        }
    }
}

impl MsgTransfer {
    pub fn new(from_address: impl HasAddress, to_address: impl HasAddress, amount: Vec<Coin>) -> Self {
        MsgTransfer {
            from_address: from_address.get_address_string(),
            to_address: to_address.get_address_string(),
            amount,
        }
    }
}

impl MsgTransferFrom {
    pub fn new(
        sender: impl HasAddress,
        from_address: impl HasAddress,
        to_address: impl HasAddress,
        amount: Vec<Coin>,
    ) -> Self {
        MsgTransferFrom {
            sender: sender.get_address_string(),
            from_address: from_address.get_address_string(),
            to_address: to_address.get_address_string(),
            amount,
        }
    }
}

impl MsgApprove {
    pub fn new(owner: impl HasAddress, spender: impl HasAddress, amount: Vec<Coin>) -> Self {
        MsgApprove {
            owner: owner.get_address_string(),
            spender: spender.get_address_string(),
            amount,
        }
    }
}

impl MsgIncreaseAllowance {
    pub fn new(owner: impl HasAddress, spender: impl HasAddress, amount: Vec<Coin>) -> Self {
        MsgIncreaseAllowance {
            owner: owner.get_address_string(),
            spender: spender.get_address_string(),
            amount,
        }
    }
}

impl MsgDecreaseAllowance {
    pub fn new(owner: impl HasAddress, spender: impl HasAddress, amount: Vec<Coin>) -> Self {
        MsgDecreaseAllowance {
            owner: owner.get_address_string(),
            spender: spender.get_address_string(),
            amount,
        }
    }
}

//////////// VALIDATION ////////////////

impl IssueMsg for MsgIssueCreate {
    const NAME: &'static str = "MsgIssueCreate";

    fn signer(&self) -> &str {
        &self.owner
    }

    fn validate_basic(&self) -> Result<(), IssueError> {
        validate_address("owner", &self.owner)?;
        validate_address("issuer", &self.issuer)?;
        self.params
            .as_ref()
            .ok_or(IssueError::InvalidIssueParams)?
            .validate()
    }

    fn describe(&self) -> String {
        match &self.params {
            Some(params) => format!(
                "{} issuing {} {} ({} decimals)",
                self.owner, params.total_supply, params.symbol, params.decimals
            ),
            None => format!("{} issuing a token without params", self.owner),
        }
    }
}

impl IssueMsg for MsgDescription {
    const NAME: &'static str = "MsgDescription";

    fn signer(&self) -> &str {
        &self.owner
    }

    fn validate_basic(&self) -> Result<(), IssueError> {
        validate_address("owner", &self.owner)?;
        validate_denom(&self.denom)?;
        validate_description(&self.description)
    }

    fn describe(&self) -> String {
        format!("{} updating description of {}", self.owner, self.denom)
    }
}

impl IssueMsg for MsgFeatures {
    const NAME: &'static str = "MsgFeatures";

    fn signer(&self) -> &str {
        &self.owner
    }

    fn validate_basic(&self) -> Result<(), IssueError> {
        validate_address("owner", &self.owner)?;
        validate_denom(&self.denom)?;
        if self.features.is_none() {
            return Err(IssueError::InvalidFeature(String::new()));
        }
        Ok(())
    }

    fn describe(&self) -> String {
        format!("{} updating features of {}", self.owner, self.denom)
    }
}

impl IssueMsg for MsgTransferOwnership {
    const NAME: &'static str = "MsgTransferOwnership";

    fn signer(&self) -> &str {
        &self.owner
    }

    fn validate_basic(&self) -> Result<(), IssueError> {
        let owner = validate_address("owner", &self.owner)?;
        let to = validate_address("to", &self.to_address)?;
        validate_denom(&self.denom)?;
        if owner == to {
            return Err(IssueError::InvalidIssueParams);
        }
        Ok(())
    }

    fn describe(&self) -> String {
        format!(
            "{} transferring ownership of {} to {}",
            self.owner, self.denom, self.to_address
        )
    }
}

impl IssueMsg for MsgMint {
    const NAME: &'static str = "MsgMint";

    fn signer(&self) -> &str {
        &self.minter
    }

    fn validate_basic(&self) -> Result<(), IssueError> {
        validate_address("minter", &self.minter)?;
        validate_address("to", &self.to_address)?;
        validate_coins(&self.amount)
    }

    fn describe(&self) -> String {
        format!(
            "{} minting {} to {}",
            self.minter,
            PrettyCoins(&self.amount),
            self.to_address
        )
    }
}

impl IssueMsg for MsgBurn {
    const NAME: &'static str = "MsgBurn";

    fn signer(&self) -> &str {
        &self.burner
    }

    fn validate_basic(&self) -> Result<(), IssueError> {
        validate_address("burner", &self.burner)?;
        validate_coins(&self.amount)
    }

    fn describe(&self) -> String {
        format!("{} burning {}", self.burner, PrettyCoins(&self.amount))
    }
}

impl IssueMsg for MsgBurnFrom {
    const NAME: &'static str = "MsgBurnFrom";

    fn signer(&self) -> &str {
        &self.burner
    }

    fn validate_basic(&self) -> Result<(), IssueError> {
        validate_address("burner", &self.burner)?;
        validate_address("from", &self.from_address)?;
        validate_coins(&self.amount)
    }

    fn describe(&self) -> String {
        format!(
            "{} burning {} from {}",
            self.burner,
            PrettyCoins(&self.amount),
            self.from_address
        )
    }
}

fn validate_freeze(freezer: &str, holder: &str, denom: &str, op: &str) -> Result<(), IssueError> {
    validate_address("freezer", freezer)?;
    validate_address("holder", holder)?;
    validate_denom(denom)?;
    op.parse::<FreezeOp>().map(|_| ())
}

impl IssueMsg for MsgFreeze {
    const NAME: &'static str = "MsgFreeze";

    fn signer(&self) -> &str {
        &self.freezer
    }

    fn validate_basic(&self) -> Result<(), IssueError> {
        validate_freeze(&self.freezer, &self.holder, &self.denom, &self.op)
    }

    fn describe(&self) -> String {
        format!(
            "{} freezing {} of {} for {}",
            self.freezer, self.op, self.denom, self.holder
        )
    }
}

impl IssueMsg for MsgUnfreeze {
    const NAME: &'static str = "MsgUnfreeze";

    fn signer(&self) -> &str {
        &self.freezer
    }

    fn validate_basic(&self) -> Result<(), IssueError> {
        validate_freeze(&self.freezer, &self.holder, &self.denom, &self.op)
    }

    fn describe(&self) -> String {
        format!(
            "{} unfreezing {} of {} for {}",
            self.freezer, self.op, self.denom, self.holder
        )
    }
}

impl IssueMsg for MsgTransfer {
    const NAME: &'static str = "MsgTransfer";

    fn signer(&self) -> &str {
        &self.from_address
    }

    fn validate_basic(&self) -> Result<(), IssueError> {
        validate_address("from", &self.from_address)?;
        validate_address("to", &self.to_address)?;
        validate_coins(&self.amount)
    }

    fn describe(&self) -> String {
        format!(
            "{} sending {} to {}",
            self.from_address,
            PrettyCoins(&self.amount),
            self.to_address
        )
    }
}

impl IssueMsg for MsgTransferFrom {
    const NAME: &'static str = "MsgTransferFrom";

    fn signer(&self) -> &str {
        &self.sender
    }

    fn validate_basic(&self) -> Result<(), IssueError> {
        validate_address("sender", &self.sender)?;
        validate_address("from", &self.from_address)?;
        validate_address("to", &self.to_address)?;
        validate_coins(&self.amount)
    }

    fn describe(&self) -> String {
        format!(
            "{} sending {} from {} to {}",
            self.sender,
            PrettyCoins(&self.amount),
            self.from_address,
            self.to_address
        )
    }
}

fn validate_allowance(owner: &str, spender: &str, amount: &[Coin]) -> Result<(), IssueError> {
    validate_address("owner", owner)?;
    validate_address("spender", spender)?;
    validate_coins(amount)
}

impl IssueMsg for MsgApprove {
    const NAME: &'static str = "MsgApprove";

    fn signer(&self) -> &str {
        &self.owner
    }

    fn validate_basic(&self) -> Result<(), IssueError> {
        validate_allowance(&self.owner, &self.spender, &self.amount)
    }

    fn describe(&self) -> String {
        format!(
            "{} approving {} to spend {}",
            self.owner,
            self.spender,
            PrettyCoins(&self.amount)
        )
    }
}

impl IssueMsg for MsgIncreaseAllowance {
    const NAME: &'static str = "MsgIncreaseAllowance";

    fn signer(&self) -> &str {
        &self.owner
    }

    fn validate_basic(&self) -> Result<(), IssueError> {
        validate_allowance(&self.owner, &self.spender, &self.amount)
    }

    fn describe(&self) -> String {
        format!(
            "{} increasing allowance of {} by {}",
            self.owner,
            self.spender,
            PrettyCoins(&self.amount)
        )
    }
}

impl IssueMsg for MsgDecreaseAllowance {
    const NAME: &'static str = "MsgDecreaseAllowance";

    fn signer(&self) -> &str {
        &self.owner
    }

    fn validate_basic(&self) -> Result<(), IssueError> {
        validate_allowance(&self.owner, &self.spender, &self.amount)
    }

    fn describe(&self) -> String {
        format!(
            "{} decreasing allowance of {} by {}",
            self.owner,
            self.spender,
            PrettyCoins(&self.amount)
        )
    }
}

#[cfg(test)]
mod tests {
    use prost::Message;

    use super::*;
    use crate::{AddressHrp, RawAddress};

    fn addr(byte: u8) -> Address {
        RawAddress::from([byte; 20]).with_hrp(AddressHrp::DARC)
    }

    fn coins(amount: &str, denom: &str) -> Vec<Coin> {
        vec![Coin {
            denom: denom.to_owned(),
            amount: amount.to_owned(),
        }]
    }

    #[test]
    fn type_urls() {
        assert_eq!(MsgMint::type_url(), "/konstellation.issue.MsgMint");
        assert_eq!(
            MsgTransferOwnership::type_url(),
            "/konstellation.issue.MsgTransferOwnership"
        );
    }

    #[test]
    fn transfer_ownership() {
        let msg = MsgTransferOwnership::new(addr(1), addr(2), "tst");
        msg.validate_basic().unwrap();
        assert_eq!(msg.signer(), addr(1).to_string());

        let same = MsgTransferOwnership::new(addr(1), addr(1), "tst");
        assert_eq!(
            same.validate_basic().unwrap_err(),
            IssueError::InvalidIssueParams
        );

        let upper = MsgTransferOwnership {
            to_address: addr(1).to_string().to_uppercase(),
            ..same
        };
        assert_eq!(
            upper.validate_basic().unwrap_err(),
            IssueError::InvalidIssueParams
        );

        let bad_denom = MsgTransferOwnership::new(addr(1), addr(2), "T$T");
        assert_eq!(
            bad_denom.validate_basic().unwrap_err(),
            IssueError::InvalidDenom("T$T".to_owned())
        );

        let missing = MsgTransferOwnership {
            to_address: String::new(),
            ..msg
        };
        assert!(matches!(
            missing.validate_basic().unwrap_err(),
            IssueError::InvalidAddress(_)
        ));
    }

    #[test]
    fn description() {
        MsgDescription::new(addr(1), "tst", r#"{"site":"example.org"}"#)
            .validate_basic()
            .unwrap();
        assert_eq!(
            MsgDescription::new(addr(1), "tst", "not json")
                .validate_basic()
                .unwrap_err(),
            IssueError::CoinDescriptionNotValid
        );
    }

    #[test]
    fn amounts() {
        MsgMint::new(addr(1), addr(2), coins("5", "tst"))
            .validate_basic()
            .unwrap();
        assert_eq!(
            MsgBurn::new(addr(1), coins("0", "tst"))
                .validate_basic()
                .unwrap_err(),
            IssueError::AmountNotValid("0tst".to_owned())
        );
        MsgBurnFrom::new(addr(1), addr(3), vec![])
            .validate_basic()
            .unwrap_err();
        MsgTransferFrom::new(addr(1), addr(2), addr(3), coins("9", "tst"))
            .validate_basic()
            .unwrap();
        MsgDecreaseAllowance::new(addr(1), addr(2), coins("9", "tst"))
            .validate_basic()
            .unwrap();
    }

    #[test]
    fn freeze_op_checked() {
        MsgFreeze::new(addr(1), addr(2), "tst", FreezeOp::InOut)
            .validate_basic()
            .unwrap();
        let mut msg = MsgUnfreeze::new(addr(1), addr(2), "tst", FreezeOp::In);
        msg.op = "both".to_owned();
        assert_eq!(
            msg.validate_basic().unwrap_err(),
            IssueError::InvalidFreezeOp("both".to_owned())
        );
    }

    #[test]
    fn issue_create_requires_params() {
        let params = IssueParams {
            name: "Test Token".to_owned(),
            symbol: "TST".to_owned(),
            total_supply: "1000".to_owned(),
            decimals: 3,
            description: String::new(),
            features: Some(IssueFeatures::default()),
        };
        let msg = MsgIssueCreate::new(addr(1), addr(1), params);
        msg.validate_basic().unwrap();
        let no_params = MsgIssueCreate {
            params: None,
            ..msg
        };
        assert_eq!(
            no_params.validate_basic().unwrap_err(),
            IssueError::InvalidIssueParams
        );
    }

    #[test]
    fn protobuf_encoding_is_stable() {
        let msg = MsgBurn::new(addr(1), coins("5", "tst"));
        let decoded = MsgBurn::decode(msg.encode_to_vec().as_slice()).unwrap();
        assert_eq!(msg, decoded);
    }

    #[test]
    fn json_rendering() {
        let msg = MsgTransferOwnership::new(addr(1), addr(2), "tst");
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["denom"], "tst");
        assert_eq!(json["to_address"], addr(2).to_string());

        let mint = MsgMint::new(addr(1), addr(2), coins("5", "tst"));
        let json = serde_json::to_value(&mint).unwrap();
        assert_eq!(json["amount"][0]["amount"], "5");
    }
}

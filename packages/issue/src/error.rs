//! Error types exposed by this package.
//!
//! [IssueError] mirrors the error catalog registered by the on-chain module,
//! so that client-side validation reports the same codespace, code and
//! message the chain would.

use std::fmt::Display;

use cosmos_sdk_proto::cosmos::base::abci::v1beta1::TxResponse;

use crate::types::{
    COIN_DECIMALS_MAX_VALUE, COIN_DECIMALS_MULTIPLE, COIN_DESCRIPTION_MAX_LENGTH,
    COIN_MAX_TOTAL_SUPPLY,
};

/// Codespace used by every error registered by the issue module.
pub const DEFAULT_CODESPACE: &str = "issue";

/// Codespace of the framework errors returned from message validation.
pub const SDK_CODESPACE: &str = "sdk";

/// ABCI codes registered by the issue module.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash)]
pub enum IssueCode {
    InvalidGenesis,
    UnknownIssue,
    IssuerMismatch,
    InvalidDenom,
    AmountLowerAllowance,
    IssueExists,
    NotEnoughFee,
    InvalidFeature,
    CanNotMint,
    CanNotBurnOwner,
    CanNotBurnHolder,
    CanNotBurnFrom,
    CanNotFreeze,
    AmountNotValid,
    InvalidCoinDecimals,
    InvalidTotalSupply,
    InvalidDescription,
    InvalidSymbol,
    InvalidFreezeOp,
    NotTransferOut,
    NotTransferIn,
    InvalidInput,
    InvalidIssueFee,
    InvalidMintFee,
    // Shares 402 with InvalidMintFee on chain.
    InvalidBurnFee,
    InvalidBurnFromFee,
    InvalidFreezeFee,
    InvalidUnFreezeFee,
    InvalidTransferOwnerFee,
}

impl IssueCode {
    pub const ALL: [IssueCode; 29] = [
        IssueCode::InvalidGenesis,
        IssueCode::UnknownIssue,
        IssueCode::IssuerMismatch,
        IssueCode::InvalidDenom,
        IssueCode::AmountLowerAllowance,
        IssueCode::IssueExists,
        IssueCode::NotEnoughFee,
        IssueCode::InvalidFeature,
        IssueCode::CanNotMint,
        IssueCode::CanNotBurnOwner,
        IssueCode::CanNotBurnHolder,
        IssueCode::CanNotBurnFrom,
        IssueCode::CanNotFreeze,
        IssueCode::AmountNotValid,
        IssueCode::InvalidCoinDecimals,
        IssueCode::InvalidTotalSupply,
        IssueCode::InvalidDescription,
        IssueCode::InvalidSymbol,
        IssueCode::InvalidFreezeOp,
        IssueCode::NotTransferOut,
        IssueCode::NotTransferIn,
        IssueCode::InvalidInput,
        IssueCode::InvalidIssueFee,
        IssueCode::InvalidMintFee,
        IssueCode::InvalidBurnFee,
        IssueCode::InvalidBurnFromFee,
        IssueCode::InvalidFreezeFee,
        IssueCode::InvalidUnFreezeFee,
        IssueCode::InvalidTransferOwnerFee,
    ];

    pub fn value(self) -> u32 {
        match self {
            IssueCode::InvalidGenesis => 102,
            IssueCode::UnknownIssue => 1,
            IssueCode::IssuerMismatch => 2,
            IssueCode::InvalidDenom => 3,
            IssueCode::AmountLowerAllowance => 4,
            IssueCode::IssueExists => 5,
            IssueCode::NotEnoughFee => 6,
            IssueCode::InvalidFeature => 7,
            IssueCode::CanNotMint => 8,
            IssueCode::CanNotBurnOwner => 9,
            IssueCode::CanNotBurnHolder => 10,
            IssueCode::CanNotBurnFrom => 11,
            IssueCode::CanNotFreeze => 12,
            IssueCode::AmountNotValid => 13,
            IssueCode::InvalidCoinDecimals => 14,
            IssueCode::InvalidTotalSupply => 15,
            IssueCode::InvalidDescription => 16,
            IssueCode::InvalidSymbol => 17,
            IssueCode::InvalidFreezeOp => 18,
            IssueCode::NotTransferOut => 19,
            IssueCode::NotTransferIn => 20,
            IssueCode::InvalidInput => 400,
            IssueCode::InvalidIssueFee => 401,
            IssueCode::InvalidMintFee => 402,
            IssueCode::InvalidBurnFee => 402,
            IssueCode::InvalidBurnFromFee => 403,
            IssueCode::InvalidFreezeFee => 404,
            IssueCode::InvalidUnFreezeFee => 405,
            IssueCode::InvalidTransferOwnerFee => 406,
        }
    }

    /// Look up a code returned by the chain. Ambiguous values resolve to the first entry in [IssueCode::ALL].
    pub fn from_value(code: u32) -> Option<IssueCode> {
        IssueCode::ALL.into_iter().find(|x| x.value() == code)
    }
}

impl Display for IssueCode {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{self:?} ({})", self.value())
    }
}

/// Errors registered by the issue module, plus the framework validation errors its messages return.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum IssueError {
    #[error("Invalid issue params")]
    InvalidIssueParams,
    #[error("Invalid already exists")]
    IssueAlreadyExists,
    #[error("Not enough fee")]
    NotEnoughFee,
    #[error("Decimals max value is {}", COIN_DECIMALS_MAX_VALUE)]
    CoinDecimalsMaxValueNotValid,
    #[error("Decimals must be a multiple of {}", COIN_DECIMALS_MULTIPLE)]
    CoinDecimalsMultipleNotValid,
    #[error("Total supply max value is {}", COIN_MAX_TOTAL_SUPPLY)]
    CoinTotalSupplyMaxValueNotValid,
    #[error("Description is not valid json")]
    CoinDescriptionNotValid,
    #[error("Description max length is {}", COIN_DESCRIPTION_MAX_LENGTH)]
    CoinDescriptionMaxLengthNotValid,
    #[error("Invalid symbol")]
    CoinSymbolNotValid,
    #[error("Invalid genesis: {0}")]
    InvalidGenesis(String),
    #[error("Unknown issue {0}")]
    UnknownIssue(String),
    #[error("Owner mismatch with token {0}")]
    OwnerMismatch(String),
    #[error("Amount greater than allowance {amount} > {allowance}")]
    AmountGreaterThanAllowance { amount: String, allowance: String },
    #[error("Denom invalid {0}")]
    InvalidDenom(String),
    #[error("Invalid freeze type {0}")]
    InvalidFreezeOp(String),
    #[error("Feature invalid {0}")]
    InvalidFeature(String),
    #[error("Amount not valid {0}")]
    AmountNotValid(String),
    #[error("Can not mint the token {0}")]
    CanNotMint(String),
    #[error("Can not burn the token {0}")]
    CanNotBurnOwner(String),
    #[error("Can not burn the token {0}")]
    CanNotBurnHolder(String),
    #[error("Can not burn the token {0}")]
    CanNotBurnFrom(String),
    #[error("Can not freeze the token {0}")]
    CanNotFreeze(String),
    #[error("Can not transfer in {denom} to {address}")]
    CanNotTransferIn { denom: String, address: String },
    #[error("Can not transfer out {denom} from {address}")]
    CanNotTransferOut { denom: String, address: String },
    #[error("invalid issue fee: {0}")]
    InvalidIssueFee(String),
    #[error("invalid mint fee: {0}")]
    InvalidMintFee(String),
    #[error("invalid burn fee: {0}")]
    InvalidBurnFee(String),
    #[error("invalid burn from fee: {0}")]
    InvalidBurnFromFee(String),
    #[error("invalid freeze fee: {0}")]
    InvalidFreezeFee(String),
    #[error("invalid unfreeze fee: {0}")]
    InvalidUnfreezeFee(String),
    #[error("invalid transfer owner fee: {0}")]
    InvalidTransferOwnerFee(String),
    #[error("invalid address: {0}")]
    InvalidAddress(String),
}

impl IssueError {
    pub fn codespace(&self) -> &'static str {
        match self {
            IssueError::InvalidAddress(_) => SDK_CODESPACE,
            _ => DEFAULT_CODESPACE,
        }
    }

    /// The module code for this error, [None] for framework errors.
    pub fn issue_code(&self) -> Option<IssueCode> {
        Some(match self {
            IssueError::InvalidIssueParams => IssueCode::InvalidInput,
            IssueError::IssueAlreadyExists => IssueCode::IssueExists,
            IssueError::NotEnoughFee => IssueCode::NotEnoughFee,
            IssueError::CoinDecimalsMaxValueNotValid
            | IssueError::CoinDecimalsMultipleNotValid => IssueCode::InvalidCoinDecimals,
            IssueError::CoinTotalSupplyMaxValueNotValid => IssueCode::InvalidTotalSupply,
            IssueError::CoinDescriptionNotValid
            | IssueError::CoinDescriptionMaxLengthNotValid => IssueCode::InvalidDescription,
            IssueError::CoinSymbolNotValid => IssueCode::InvalidSymbol,
            IssueError::InvalidGenesis(_) => IssueCode::InvalidGenesis,
            IssueError::UnknownIssue(_) => IssueCode::UnknownIssue,
            IssueError::OwnerMismatch(_) => IssueCode::IssuerMismatch,
            IssueError::AmountGreaterThanAllowance { .. } => IssueCode::AmountLowerAllowance,
            IssueError::InvalidDenom(_) => IssueCode::InvalidDenom,
            IssueError::InvalidFreezeOp(_) => IssueCode::InvalidFreezeOp,
            IssueError::InvalidFeature(_) => IssueCode::InvalidFeature,
            IssueError::AmountNotValid(_) => IssueCode::AmountNotValid,
            IssueError::CanNotMint(_) => IssueCode::CanNotMint,
            IssueError::CanNotBurnOwner(_) => IssueCode::CanNotBurnOwner,
            IssueError::CanNotBurnHolder(_) => IssueCode::CanNotBurnHolder,
            IssueError::CanNotBurnFrom(_) => IssueCode::CanNotBurnFrom,
            IssueError::CanNotFreeze(_) => IssueCode::CanNotFreeze,
            IssueError::CanNotTransferIn { .. } => IssueCode::NotTransferIn,
            IssueError::CanNotTransferOut { .. } => IssueCode::NotTransferOut,
            IssueError::InvalidIssueFee(_) => IssueCode::InvalidIssueFee,
            IssueError::InvalidMintFee(_) => IssueCode::InvalidMintFee,
            IssueError::InvalidBurnFee(_) => IssueCode::InvalidBurnFee,
            IssueError::InvalidBurnFromFee(_) => IssueCode::InvalidBurnFromFee,
            IssueError::InvalidFreezeFee(_) => IssueCode::InvalidFreezeFee,
            IssueError::InvalidUnfreezeFee(_) => IssueCode::InvalidUnFreezeFee,
            IssueError::InvalidTransferOwnerFee(_) => IssueCode::InvalidTransferOwnerFee,
            IssueError::InvalidAddress(_) => return None,
        })
    }

    /// ABCI code as reported by the chain
    pub fn code(&self) -> u32 {
        match self.issue_code() {
            Some(code) => code.value(),
            // sdk ErrInvalidAddress
            None => 7,
        }
    }

    pub fn amount_greater_than_allowance(
        amount: impl Display,
        allowance: impl Display,
    ) -> IssueError {
        IssueError::AmountGreaterThanAllowance {
            amount: amount.to_string(),
            allowance: allowance.to_string(),
        }
    }

    pub fn can_not_transfer_in(denom: impl Into<String>, address: impl Display) -> IssueError {
        IssueError::CanNotTransferIn {
            denom: denom.into(),
            address: address.to_string(),
        }
    }

    pub fn can_not_transfer_out(denom: impl Into<String>, address: impl Display) -> IssueError {
        IssueError::CanNotTransferOut {
            denom: denom.into(),
            address: address.to_string(),
        }
    }
}

/// A transaction that reached a node but finished with a non-zero code.
#[derive(thiserror::Error, Debug, Clone)]
pub struct TxFailure {
    pub txhash: String,
    pub codespace: String,
    pub code: u32,
    pub raw_log: String,
}

impl Display for TxFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(
            f,
            "Transaction {} failed with code {} in codespace {:?}",
            self.txhash, self.code, self.codespace
        )?;
        if let Some(code) = self.issue_code() {
            write!(f, " ({code:?})")?;
        }
        write!(f, ". Raw log: {}", self.raw_log)
    }
}

impl TxFailure {
    /// Returns [None] if the response indicates success.
    pub fn from_response(res: &TxResponse) -> Option<TxFailure> {
        if res.code == 0 {
            None
        } else {
            Some(TxFailure {
                txhash: res.txhash.clone(),
                codespace: res.codespace.clone(),
                code: res.code,
                raw_log: res.raw_log.clone(),
            })
        }
    }

    pub fn issue_code(&self) -> Option<IssueCode> {
        if self.codespace == DEFAULT_CODESPACE {
            IssueCode::from_value(self.code)
        } else {
            None
        }
    }

    /// The framework's out-of-gas / insufficient fee code
    pub(crate) fn is_insufficient_fee(&self) -> bool {
        self.codespace == SDK_CODESPACE && self.code == 13
    }
}

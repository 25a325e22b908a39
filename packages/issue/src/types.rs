//! Token parameters and the stateless rules the module applies to them.

use std::{fmt::Display, str::FromStr};

use cosmos_sdk_proto::cosmos::base::v1beta1::Coin;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::{
    coins::{is_valid_coin, parse_amount, CoinDef},
    IssueError,
};

pub const COIN_DECIMALS_MAX_VALUE: u32 = 18;
pub const COIN_DECIMALS_MULTIPLE: u32 = 3;
pub const COIN_MAX_TOTAL_SUPPLY: u128 = 1_000_000_000_000_000_000_000_000_000_000_000_000;
pub const COIN_DESCRIPTION_MAX_LENGTH: usize = 1024;
pub const COIN_NAME_MIN_LENGTH: usize = 3;
pub const COIN_NAME_MAX_LENGTH: usize = 32;
pub const COIN_SYMBOL_MIN_LENGTH: usize = 2;
pub const COIN_SYMBOL_MAX_LENGTH: usize = 8;

static DENOM_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new("^[a-z][a-z0-9]{1,15}$").expect("denom regex is valid")
});

pub fn validate_denom(denom: &str) -> Result<(), IssueError> {
    if DENOM_REGEX.is_match(denom) {
        Ok(())
    } else {
        Err(IssueError::InvalidDenom(denom.to_owned()))
    }
}

/// Denom assigned to a newly issued token.
pub fn denom_for_symbol(symbol: &str) -> String {
    symbol.to_ascii_lowercase()
}

/// Empty descriptions are allowed. Anything else must be JSON within the length limit.
pub fn validate_description(description: &str) -> Result<(), IssueError> {
    if description.is_empty() {
        return Ok(());
    }
    if description.len() > COIN_DESCRIPTION_MAX_LENGTH {
        return Err(IssueError::CoinDescriptionMaxLengthNotValid);
    }
    serde_json::from_str::<serde_json::Value>(description)
        .map(|_| ())
        .map_err(|_| IssueError::CoinDescriptionNotValid)
}

/// Which owner capabilities are switched off for a token.
#[allow(clippy::derive_partial_eq_without_eq)]
#[derive(Clone, PartialEq, Eq, ::prost::Message, Serialize, Deserialize)]
#[serde(try_from = "serde_json::Map<String, serde_json::Value>")]
pub struct IssueFeatures {
    #[prost(bool, tag = "1")]
    pub burn_owner_disabled: bool,
    #[prost(bool, tag = "2")]
    pub burn_holder_disabled: bool,
    #[prost(bool, tag = "3")]
    pub burn_from_disabled: bool,
    #[prost(bool, tag = "4")]
    pub mint_disabled: bool,
    #[prost(bool, tag = "5")]
    pub freeze_disabled: bool,
}

impl IssueFeatures {
    fn flag_mut(&mut self, name: &str) -> Option<&mut bool> {
        match name {
            "burn_owner_disabled" => Some(&mut self.burn_owner_disabled),
            "burn_holder_disabled" => Some(&mut self.burn_holder_disabled),
            "burn_from_disabled" => Some(&mut self.burn_from_disabled),
            "mint_disabled" => Some(&mut self.mint_disabled),
            "freeze_disabled" => Some(&mut self.freeze_disabled),
            _ => None,
        }
    }

    /// Parse a JSON object of feature flags. Missing flags stay enabled.
    pub fn from_json(s: &str) -> Result<Self, IssueError> {
        let map: serde_json::Map<String, serde_json::Value> = serde_json::from_str(s)
            .map_err(|_| IssueError::InvalidFeature(s.to_owned()))?;
        IssueFeatures::from_map(map)
    }

    /// Unknown keys and non-boolean values are [IssueError::InvalidFeature].
    pub fn from_map(map: serde_json::Map<String, serde_json::Value>) -> Result<Self, IssueError> {
        let mut features = IssueFeatures::default();
        for (key, value) in map {
            let flag = features
                .flag_mut(&key)
                .ok_or_else(|| IssueError::InvalidFeature(key.clone()))?;
            *flag = value
                .as_bool()
                .ok_or_else(|| IssueError::InvalidFeature(key.clone()))?;
        }
        Ok(features)
    }
}

impl TryFrom<serde_json::Map<String, serde_json::Value>> for IssueFeatures {
    type Error = IssueError;

    fn try_from(map: serde_json::Map<String, serde_json::Value>) -> Result<Self, Self::Error> {
        IssueFeatures::from_map(map)
    }
}

impl FromStr for IssueFeatures {
    type Err = IssueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        IssueFeatures::from_json(s)
    }
}

/// Direction of a freeze: blocking incoming transfers, outgoing, or both.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash)]
pub enum FreezeOp {
    In,
    Out,
    InOut,
}

impl FreezeOp {
    pub fn as_str(self) -> &'static str {
        match self {
            FreezeOp::In => "in",
            FreezeOp::Out => "out",
            FreezeOp::InOut => "in-out",
        }
    }
}

impl Display for FreezeOp {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FreezeOp {
    type Err = IssueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "in" => Ok(FreezeOp::In),
            "out" => Ok(FreezeOp::Out),
            "in-out" => Ok(FreezeOp::InOut),
            _ => Err(IssueError::InvalidFreezeOp(s.to_owned())),
        }
    }
}

/// Parameters for creating a new token.
#[allow(clippy::derive_partial_eq_without_eq)]
#[derive(Clone, PartialEq, ::prost::Message, Serialize, Deserialize)]
pub struct IssueParams {
    #[prost(string, tag = "1")]
    pub name: ::prost::alloc::string::String,
    #[prost(string, tag = "2")]
    pub symbol: ::prost::alloc::string::String,
    /// Integer amount in the smallest unit, as a decimal string.
    #[prost(string, tag = "3")]
    pub total_supply: ::prost::alloc::string::String,
    #[prost(uint32, tag = "4")]
    pub decimals: u32,
    #[prost(string, tag = "5")]
    #[serde(default)]
    pub description: ::prost::alloc::string::String,
    #[prost(message, optional, tag = "6")]
    #[serde(default)]
    pub features: ::core::option::Option<IssueFeatures>,
}

impl IssueParams {
    pub fn validate(&self) -> Result<(), IssueError> {
        let name_len = self.name.chars().count();
        if !(COIN_NAME_MIN_LENGTH..=COIN_NAME_MAX_LENGTH).contains(&name_len) {
            return Err(IssueError::InvalidIssueParams);
        }

        if !(COIN_SYMBOL_MIN_LENGTH..=COIN_SYMBOL_MAX_LENGTH).contains(&self.symbol.len())
            || !self.symbol.bytes().all(|b| b.is_ascii_alphanumeric())
        {
            return Err(IssueError::CoinSymbolNotValid);
        }

        match parse_amount(&self.total_supply) {
            Some(supply) if supply > 0 => {
                if supply > COIN_MAX_TOTAL_SUPPLY {
                    return Err(IssueError::CoinTotalSupplyMaxValueNotValid);
                }
            }
            // Values too large for u128 are certainly over the limit.
            None if !self.total_supply.is_empty()
                && self.total_supply.bytes().all(|b| b.is_ascii_digit()) =>
            {
                return Err(IssueError::CoinTotalSupplyMaxValueNotValid)
            }
            _ => return Err(IssueError::AmountNotValid(self.total_supply.clone())),
        }

        if self.decimals > COIN_DECIMALS_MAX_VALUE {
            return Err(IssueError::CoinDecimalsMaxValueNotValid);
        }
        if self.decimals % COIN_DECIMALS_MULTIPLE != 0 {
            return Err(IssueError::CoinDecimalsMultipleNotValid);
        }

        validate_description(&self.description)
    }

    pub fn denom(&self) -> String {
        denom_for_symbol(&self.symbol)
    }
}

/// Fees charged by the module for each operation.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct Params {
    #[serde(with = "CoinDef")]
    pub issue_fee: Coin,
    #[serde(with = "CoinDef")]
    pub mint_fee: Coin,
    #[serde(with = "CoinDef")]
    pub burn_fee: Coin,
    #[serde(with = "CoinDef")]
    pub burn_from_fee: Coin,
    #[serde(with = "CoinDef")]
    pub freeze_fee: Coin,
    #[serde(with = "CoinDef")]
    pub unfreeze_fee: Coin,
    #[serde(with = "CoinDef")]
    pub transfer_owner_fee: Coin,
}

fn fee(denom: &str, amount: u128) -> Coin {
    Coin {
        denom: denom.to_owned(),
        amount: amount.to_string(),
    }
}

impl Default for Params {
    fn default() -> Self {
        Params {
            issue_fee: fee("udarc", 1_000_000_000),
            mint_fee: fee("udarc", 1_000_000),
            burn_fee: fee("udarc", 1_000_000),
            burn_from_fee: fee("udarc", 1_000_000),
            freeze_fee: fee("udarc", 2_000_000),
            unfreeze_fee: fee("udarc", 2_000_000),
            transfer_owner_fee: fee("udarc", 2_000_000),
        }
    }
}

impl Params {
    pub fn validate(&self) -> Result<(), IssueError> {
        let checks: [(&Coin, fn(String) -> IssueError); 7] = [
            (&self.issue_fee, IssueError::InvalidIssueFee),
            (&self.mint_fee, IssueError::InvalidMintFee),
            (&self.burn_fee, IssueError::InvalidBurnFee),
            (&self.burn_from_fee, IssueError::InvalidBurnFromFee),
            (&self.freeze_fee, IssueError::InvalidFreezeFee),
            (&self.unfreeze_fee, IssueError::InvalidUnfreezeFee),
            (&self.transfer_owner_fee, IssueError::InvalidTransferOwnerFee),
        ];
        for (coin, make_error) in checks {
            if !is_valid_coin(coin) {
                return Err(make_error(format!("{}{}", coin.amount, coin.denom)));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> IssueParams {
        IssueParams {
            name: "Test Token".to_owned(),
            symbol: "TST".to_owned(),
            total_supply: "1000000000".to_owned(),
            decimals: 6,
            description: String::new(),
            features: None,
        }
    }

    #[test]
    fn valid_params() {
        params().validate().unwrap();
        assert_eq!(params().denom(), "tst");
    }

    #[test]
    fn name_bounds() {
        let mut p = params();
        p.name = "ab".to_owned();
        assert_eq!(p.validate().unwrap_err(), IssueError::InvalidIssueParams);
        p.name = "x".repeat(33);
        assert_eq!(p.validate().unwrap_err(), IssueError::InvalidIssueParams);
    }

    #[test]
    fn symbol_rules() {
        let mut p = params();
        p.symbol = "T".to_owned();
        assert_eq!(p.validate().unwrap_err(), IssueError::CoinSymbolNotValid);
        p.symbol = "TOOLONGSYM".to_owned();
        assert_eq!(p.validate().unwrap_err(), IssueError::CoinSymbolNotValid);
        p.symbol = "T-T".to_owned();
        assert_eq!(p.validate().unwrap_err(), IssueError::CoinSymbolNotValid);
    }

    #[test]
    fn total_supply_rules() {
        let mut p = params();
        p.total_supply = COIN_MAX_TOTAL_SUPPLY.to_string();
        p.validate().unwrap();
        p.total_supply = (COIN_MAX_TOTAL_SUPPLY + 1).to_string();
        assert_eq!(
            p.validate().unwrap_err(),
            IssueError::CoinTotalSupplyMaxValueNotValid
        );
        p.total_supply = "9".repeat(60);
        assert_eq!(
            p.validate().unwrap_err(),
            IssueError::CoinTotalSupplyMaxValueNotValid
        );
        p.total_supply = "0".to_owned();
        assert_eq!(
            p.validate().unwrap_err(),
            IssueError::AmountNotValid("0".to_owned())
        );
        p.total_supply = "abc".to_owned();
        p.validate().unwrap_err();
    }

    #[test]
    fn decimals_rules() {
        let mut p = params();
        p.decimals = 21;
        assert_eq!(
            p.validate().unwrap_err(),
            IssueError::CoinDecimalsMaxValueNotValid
        );
        p.decimals = 4;
        assert_eq!(
            p.validate().unwrap_err(),
            IssueError::CoinDecimalsMultipleNotValid
        );
        p.decimals = 0;
        p.validate().unwrap();
    }

    #[test]
    fn description_rules() {
        validate_description("").unwrap();
        validate_description(r#"{"org":"Konstellation"}"#).unwrap();
        assert_eq!(
            validate_description("plain text").unwrap_err(),
            IssueError::CoinDescriptionNotValid
        );
        let long = format!("\"{}\"", "a".repeat(COIN_DESCRIPTION_MAX_LENGTH));
        assert_eq!(
            validate_description(&long).unwrap_err(),
            IssueError::CoinDescriptionMaxLengthNotValid
        );
    }

    #[test]
    fn denoms() {
        validate_denom("udarc").unwrap();
        validate_denom("tst").unwrap();
        validate_denom("ab").unwrap();
        validate_denom("a").unwrap_err();
        validate_denom("1abc").unwrap_err();
        validate_denom("UDARC").unwrap_err();
        validate_denom("abcdefghijklmnopq").unwrap_err();
    }

    #[test]
    fn features_json() {
        let f = IssueFeatures::from_json(r#"{"mint_disabled": true}"#).unwrap();
        assert!(f.mint_disabled);
        assert!(!f.freeze_disabled);
        assert_eq!(
            IssueFeatures::from_json(r#"{"teleport_disabled": true}"#).unwrap_err(),
            IssueError::InvalidFeature("teleport_disabled".to_owned())
        );
        assert_eq!(
            IssueFeatures::from_json(r#"{"mint_disabled": "yes"}"#).unwrap_err(),
            IssueError::InvalidFeature("mint_disabled".to_owned())
        );
        IssueFeatures::from_json("[]").unwrap_err();
    }

    #[test]
    fn features_deserialize_strictly() {
        let f: IssueFeatures = serde_json::from_str(r#"{"burn_from_disabled": true}"#).unwrap();
        assert!(f.burn_from_disabled);
        let err = serde_json::from_str::<IssueFeatures>(r#"{"teleport_disabled": true}"#)
            .unwrap_err();
        assert!(err.to_string().contains("Feature invalid teleport_disabled"));
    }

    #[test]
    fn freeze_ops() {
        assert_eq!("in".parse::<FreezeOp>().unwrap(), FreezeOp::In);
        assert_eq!("in-out".parse::<FreezeOp>().unwrap(), FreezeOp::InOut);
        assert_eq!(FreezeOp::Out.to_string(), "out");
        assert_eq!(
            "sideways".parse::<FreezeOp>().unwrap_err(),
            IssueError::InvalidFreezeOp("sideways".to_owned())
        );
    }

    #[test]
    fn fee_params() {
        Params::default().validate().unwrap();
        let mut p = Params::default();
        p.burn_fee.amount = "-1".to_owned();
        assert_eq!(
            p.validate().unwrap_err(),
            IssueError::InvalidBurnFee("-1udarc".to_owned())
        );
        let mut p = Params::default();
        p.transfer_owner_fee.denom = "X".to_owned();
        assert_eq!(
            p.validate().unwrap_err(),
            IssueError::InvalidTransferOwnerFee("2000000X".to_owned())
        );
    }
}

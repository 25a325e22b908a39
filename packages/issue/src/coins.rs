//! Helpers for the protobuf [Coin] type: validation, display and JSON.

use std::{collections::HashSet, fmt::Display};

use cosmos_sdk_proto::cosmos::base::v1beta1::Coin;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::{types::validate_denom, IssueError};

/// Render coins the way the chain does, e.g. `100udarc,5utoken`.
pub struct PrettyCoins<'a>(pub &'a [Coin]);

impl Display for PrettyCoins<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        for (idx, Coin { denom, amount }) in self.0.iter().enumerate() {
            if idx > 0 {
                write!(f, ",")?;
            }
            write!(f, "{amount}{denom}")?;
        }
        Ok(())
    }
}

pub(crate) fn parse_amount(amount: &str) -> Option<u128> {
    if amount.is_empty() || !amount.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    amount.parse().ok()
}

/// A single coin with a valid denom and an integer amount. Zero is allowed.
pub(crate) fn is_valid_coin(coin: &Coin) -> bool {
    validate_denom(&coin.denom).is_ok() && parse_amount(&coin.amount).is_some()
}

/// Non-empty, every amount positive, every denom valid and unique.
pub fn validate_coins(coins: &[Coin]) -> Result<(), IssueError> {
    let invalid = || IssueError::AmountNotValid(PrettyCoins(coins).to_string());
    if coins.is_empty() {
        return Err(invalid());
    }
    let mut seen = HashSet::new();
    for coin in coins {
        validate_denom(&coin.denom).map_err(|_| invalid())?;
        match parse_amount(&coin.amount) {
            Some(amount) if amount > 0 => (),
            _ => return Err(invalid()),
        }
        if !seen.insert(coin.denom.as_str()) {
            return Err(invalid());
        }
    }
    Ok(())
}

#[derive(Serialize, Deserialize)]
#[serde(remote = "Coin")]
pub(crate) struct CoinDef {
    pub denom: String,
    pub amount: String,
}

/// `#[serde(with = ...)]` support for `Vec<Coin>`.
pub(crate) mod vec {
    use super::*;

    struct Ser<'a>(&'a Coin);

    impl Serialize for Ser<'_> {
        fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
            CoinDef::serialize(self.0, serializer)
        }
    }

    #[derive(Deserialize)]
    struct De(#[serde(with = "CoinDef")] Coin);

    pub(crate) fn serialize<S: Serializer>(coins: &[Coin], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(coins.iter().map(Ser))
    }

    pub(crate) fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Vec<Coin>, D::Error> {
        Vec::<De>::deserialize(deserializer).map(|v| v.into_iter().map(|De(c)| c).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coin(amount: &str, denom: &str) -> Coin {
        Coin {
            denom: denom.to_owned(),
            amount: amount.to_owned(),
        }
    }

    #[test]
    fn pretty() {
        assert_eq!(
            PrettyCoins(&[coin("100", "udarc"), coin("5", "utoken")]).to_string(),
            "100udarc,5utoken"
        );
        assert_eq!(PrettyCoins(&[]).to_string(), "");
    }

    #[test]
    fn validation() {
        validate_coins(&[coin("1", "udarc")]).unwrap();
        validate_coins(&[coin("1", "udarc"), coin("7", "utoken")]).unwrap();
        assert_eq!(
            validate_coins(&[]).unwrap_err(),
            IssueError::AmountNotValid(String::new())
        );
        assert_eq!(
            validate_coins(&[coin("0", "udarc")]).unwrap_err(),
            IssueError::AmountNotValid("0udarc".to_owned())
        );
        validate_coins(&[coin("-3", "udarc")]).unwrap_err();
        validate_coins(&[coin("1.5", "udarc")]).unwrap_err();
        validate_coins(&[coin("1", "udarc"), coin("2", "udarc")]).unwrap_err();
        assert_eq!(
            validate_coins(&[coin("1", "U")]).unwrap_err(),
            IssueError::AmountNotValid("1U".to_owned())
        );
    }

    #[test]
    fn json_shape() {
        #[derive(Serialize, Deserialize)]
        struct Holder {
            #[serde(with = "vec")]
            amount: Vec<Coin>,
        }
        let json = serde_json::to_value(Holder {
            amount: vec![coin("10", "udarc")],
        })
        .unwrap();
        assert_eq!(
            json,
            serde_json::json!({"amount": [{"denom": "udarc", "amount": "10"}]})
        );
        let back: Holder = serde_json::from_value(json).unwrap();
        assert_eq!(back.amount, vec![coin("10", "udarc")]);
    }
}

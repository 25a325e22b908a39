use std::str::FromStr;

use anyhow::Context;
use issue::{types::validate_denom, Coin};

#[derive(PartialEq, Eq, Debug, Clone)]
pub(crate) struct ParsedCoin {
    denom: String,
    amount: u128,
}

impl From<ParsedCoin> for Coin {
    fn from(ParsedCoin { denom, amount }: ParsedCoin) -> Self {
        Coin {
            denom,
            amount: amount.to_string(),
        }
    }
}

impl FromStr for ParsedCoin {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        (|| {
            anyhow::ensure!(!s.is_empty(), "Cannot parse empty string");
            let idx = s
                .find(|c: char| !c.is_ascii_digit())
                .context("All characters are ASCII digits")?;
            let (amount, denom) = s.split_at(idx);
            anyhow::ensure!(!amount.is_empty(), "Must not have an empty amount");
            validate_denom(denom)?;
            Ok(ParsedCoin {
                denom: denom.to_owned(),
                amount: amount.parse()?,
            })
        })()
        .with_context(|| format!("Could not parse coin value {s:?}"))
    }
}

/// Comma separated coins, e.g. `100tst,5udarc`
#[derive(PartialEq, Eq, Debug, Clone)]
pub(crate) struct ParsedCoins(Vec<ParsedCoin>);

impl ParsedCoins {
    pub(crate) fn into_coins(self) -> Vec<Coin> {
        self.0.into_iter().map(Coin::from).collect()
    }
}

impl FromStr for ParsedCoins {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.split(',')
            .map(|coin| coin.trim().parse())
            .collect::<Result<_, _>>()
            .map(ParsedCoins)
    }
}

#[cfg(test)]
mod tests {
    use quickcheck::Arbitrary;

    use super::*;

    fn parse_coin(s: &str) -> anyhow::Result<ParsedCoin> {
        s.parse()
    }

    fn make_coin(amount: u128, denom: &str) -> ParsedCoin {
        ParsedCoin {
            denom: denom.to_owned(),
            amount,
        }
    }

    #[test]
    fn sanity() {
        assert_eq!(parse_coin("1udarc").unwrap(), make_coin(1, "udarc"));
        parse_coin("1.523udarc").unwrap_err();
        parse_coin("foobar").unwrap_err();
        parse_coin("5x").unwrap_err();
        parse_coin("12TST").unwrap_err();
        assert_eq!(parse_coin("123456tst2").unwrap(), make_coin(123456, "tst2"));
    }

    #[test]
    fn lists() {
        let coins: ParsedCoins = "10tst, 5udarc".parse().unwrap();
        assert_eq!(
            coins.into_coins(),
            vec![
                Coin {
                    denom: "tst".to_owned(),
                    amount: "10".to_owned()
                },
                Coin {
                    denom: "udarc".to_owned(),
                    amount: "5".to_owned()
                },
            ]
        );
        "10tst,".parse::<ParsedCoins>().unwrap_err();
    }

    #[derive(Clone, Debug)]
    struct DenomString(String);

    impl Arbitrary for DenomString {
        fn arbitrary(g: &mut quickcheck::Gen) -> Self {
            let sizes = (2..17).collect::<Vec<_>>();
            let letters = ('a'..='z').collect::<Vec<_>>();
            DenomString(
                (0..*g.choose(&sizes).unwrap())
                    .map(|_| *g.choose(&letters).unwrap())
                    .collect(),
            )
        }
    }

    quickcheck::quickcheck! {
        fn roundtrip(amount: u128, denom: DenomString) -> bool {
            let denom = denom.0;
            let expected = make_coin(amount, &denom);
            let actual = parse_coin(&format!("{amount}{denom}")).unwrap();
            assert_eq!(expected, actual);
            true
        }
    }
}

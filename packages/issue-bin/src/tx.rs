use std::str::FromStr;

use anyhow::{Context, Result};
use issue::{
    clap::CosmosOpt, msgs::IssueMsg, Address, AddressHrp, HasAddress, RawWallet, TxBuilder,
    TxFailure, Wallet, DEFAULT_GAS_LIMIT,
};

use crate::parsed_coin::ParsedCoins;

/// Gas limit requested by a transaction
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum GasSetting {
    /// Simulate first and apply the gas adjustment
    Auto,
    Fixed(u64),
}

impl FromStr for GasSetting {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "auto" {
            Ok(GasSetting::Auto)
        } else {
            s.parse()
                .map(GasSetting::Fixed)
                .with_context(|| format!("Invalid gas setting {s:?}, expected auto or an integer"))
        }
    }
}

#[derive(clap::Parser)]
pub(crate) struct TxOpt {
    /// Mnemonic phrase
    #[clap(long, env = "COSMOS_WALLET", hide_env_values = true)]
    wallet: Option<RawWallet>,
    /// Sender address, enough when only generating the transaction
    #[clap(long)]
    from: Option<Address>,
    /// Memo to put on transaction
    #[clap(long)]
    memo: Option<String>,
    /// Fees to pay, e.g. 5000udarc. Disables gas price escalation.
    #[clap(long)]
    fees: Option<ParsedCoins>,
    /// Gas limit, or auto to simulate first
    #[clap(long, default_value = "auto")]
    gas: GasSetting,
    /// Multiplier applied to the simulated gas
    #[clap(long)]
    gas_adjustment: Option<f64>,
    /// Print the unsigned transaction without contacting a node
    #[clap(long)]
    generate_only: bool,
    /// Simulate and print the gas estimate without broadcasting
    #[clap(long, conflicts_with = "generate_only")]
    dry_run: bool,
}

impl TxOpt {
    pub(crate) fn get_wallet(&self, hrp: AddressHrp) -> Result<Wallet> {
        self.wallet
            .as_ref()
            .context("No wallet provided, use --wallet or COSMOS_WALLET")?
            .for_chain(hrp)
    }

    /// The wallet's address if present, otherwise `--from`.
    pub(crate) fn get_sender(&self, hrp: AddressHrp) -> Result<Address> {
        match (&self.wallet, self.from) {
            (Some(_), from) => {
                let address = self.get_wallet(hrp)?.get_address();
                if let Some(from) = from {
                    anyhow::ensure!(
                        from == address,
                        "--from {from} does not match the wallet address {address}"
                    );
                }
                Ok(address)
            }
            (None, Some(from)) => {
                anyhow::ensure!(
                    from.hrp() == hrp,
                    "--from {from} does not use the address prefix {hrp}"
                );
                Ok(from)
            }
            (None, None) => Err(anyhow::anyhow!(
                "Either --wallet or --from must be provided"
            )),
        }
    }

    /// The sender and a transaction carrying the message, without contacting a node.
    fn prepare<M: IssueMsg>(
        &self,
        hrp: AddressHrp,
        make_msg: impl FnOnce(Address) -> Result<M>,
    ) -> Result<(Address, TxBuilder)> {
        let sender = self.get_sender(hrp)?;
        let mut txbuilder = TxBuilder::default();
        txbuilder.add_message(make_msg(sender)?)?;
        txbuilder.set_optional_memo(self.memo.clone());
        txbuilder.set_fees(self.fees.clone().map(ParsedCoins::into_coins));
        Ok((sender, txbuilder))
    }

    /// Unsigned JSON printed by `--generate-only`.
    fn unsigned(&self, txbuilder: &TxBuilder) -> serde_json::Value {
        let gas = match self.gas {
            GasSetting::Auto => DEFAULT_GAS_LIMIT,
            GasSetting::Fixed(gas) => gas,
        };
        txbuilder.generate_unsigned(gas)
    }

    /// Build a message from the sender and either print it unsigned, simulate it or broadcast it.
    pub(crate) async fn run<M: IssueMsg>(
        &self,
        cosmos_opt: &CosmosOpt,
        make_msg: impl FnOnce(Address) -> Result<M>,
    ) -> Result<()> {
        let mut builder = cosmos_opt.builder()?;
        if self.gas_adjustment.is_some() {
            builder.set_gas_estimate_multiplier(self.gas_adjustment);
        }
        let hrp = builder.hrp();
        let (sender, txbuilder) = self.prepare(hrp, make_msg)?;

        if self.generate_only {
            let tx = self.unsigned(&txbuilder);
            println!("{}", serde_json::to_string_pretty(&tx)?);
            return Ok(());
        }

        let cosmos = builder.build().await?;

        if self.dry_run {
            let simres = txbuilder.simulate(&cosmos, sender).await?;
            let estimate = (simres.gas_used as f64 * cosmos.get_gas_multiplier()) as u64;
            println!("gas estimate: {estimate}");
            return Ok(());
        }

        let wallet = self.get_wallet(hrp)?;
        tracing::debug!("Broadcasting {txbuilder} from {wallet}");
        let res = match self.gas {
            GasSetting::Auto => txbuilder.sign_and_broadcast(&cosmos, &wallet).await,
            GasSetting::Fixed(gas) => {
                txbuilder
                    .sign_and_broadcast_with_gas(&cosmos, &wallet, gas)
                    .await
            }
        };
        let res = res.map_err(|e| {
            if let Some(code) = e.downcast_ref::<TxFailure>().and_then(|f| f.issue_code()) {
                tracing::error!("Rejected by the issue module: {code}");
            }
            e
        })?;
        println!("{}", res.txhash);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use clap::Parser;
    use issue::{
        msgs::{MsgBurnFrom, MsgTransferOwnership},
        RawAddress,
    };

    use super::*;

    #[derive(Parser)]
    struct Cmd {
        #[clap(flatten)]
        tx_opt: TxOpt,
    }

    fn darc(byte: u8) -> Address {
        RawAddress::from([byte; 20]).with_hrp(AddressHrp::DARC)
    }

    #[test]
    fn gas_setting() {
        assert_eq!("auto".parse::<GasSetting>().unwrap(), GasSetting::Auto);
        assert_eq!(
            "250000".parse::<GasSetting>().unwrap(),
            GasSetting::Fixed(250000)
        );
        "lots".parse::<GasSetting>().unwrap_err();
    }

    #[test]
    fn sender_from_flag() {
        let from = darc(4).to_string();
        let cmd = Cmd::try_parse_from(["issue", "--from", from.as_str(), "--generate-only"]).unwrap();
        assert_eq!(cmd.tx_opt.get_sender(AddressHrp::DARC).unwrap(), darc(4));
        let other = AddressHrp::new("juno").unwrap();
        cmd.tx_opt.get_sender(other).unwrap_err();
    }

    #[test]
    fn generate_only_output() {
        let from = darc(4).to_string();
        let cmd = Cmd::try_parse_from([
            "issue",
            "--from",
            from.as_str(),
            "--memo",
            "hello",
            "--fees",
            "5000udarc",
            "--gas",
            "150000",
            "--generate-only",
        ])
        .unwrap();
        let (sender, txbuilder) = cmd
            .tx_opt
            .prepare(AddressHrp::DARC, |sender| {
                let amount = "7tst".parse::<ParsedCoins>()?.into_coins();
                Ok(MsgBurnFrom::new(sender, darc(5), amount))
            })
            .unwrap();
        assert_eq!(sender, darc(4));

        let tx = cmd.tx_opt.unsigned(&txbuilder);
        let msg = &tx["body"]["messages"][0];
        assert_eq!(msg["@type"], "/konstellation.issue.MsgBurnFrom");
        assert_eq!(msg["burner"], from);
        assert_eq!(msg["from_address"], darc(5).to_string());
        assert_eq!(msg["amount"][0]["amount"], "7");
        assert_eq!(tx["body"]["memo"], "hello");
        assert_eq!(tx["auth_info"]["fee"]["gas_limit"], "150000");
        assert_eq!(tx["auth_info"]["fee"]["amount"][0]["amount"], "5000");
    }

    #[test]
    fn generate_only_default_gas_and_invalid_message() {
        let from = darc(4).to_string();
        let cmd = Cmd::try_parse_from(["issue", "--from", from.as_str(), "--generate-only"]).unwrap();
        let (_, txbuilder) = cmd
            .tx_opt
            .prepare(AddressHrp::DARC, |sender| {
                Ok(MsgTransferOwnership::new(sender, darc(6), "tst"))
            })
            .unwrap();
        let tx = cmd.tx_opt.unsigned(&txbuilder);
        assert_eq!(tx["auth_info"]["fee"]["gas_limit"], "200000");
        assert_eq!(tx["auth_info"]["fee"]["amount"], serde_json::json!([]));

        assert!(cmd
            .tx_opt
            .prepare(AddressHrp::DARC, |sender| {
                Ok(MsgTransferOwnership::new(sender, sender, "tst"))
            })
            .is_err());
    }

    #[test]
    fn generate_only_conflicts_with_dry_run() {
        assert!(Cmd::try_parse_from(["issue", "--generate-only", "--dry-run"]).is_err());
    }
}

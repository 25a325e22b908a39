mod parsed_coin;
mod tx;

use std::{net::SocketAddr, path::PathBuf};

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use issue::{
    clap::CosmosOpt,
    genesis::{validate_genesis, GenesisState},
    msgs::{
        MsgApprove, MsgBurn, MsgBurnFrom, MsgDecreaseAllowance, MsgDescription, MsgFeatures,
        MsgFreeze, MsgIncreaseAllowance, MsgIssueCreate, MsgMint, MsgTransfer, MsgTransferFrom,
        MsgTransferOwnership, MsgUnfreeze,
    },
    rest::{self, RestState},
    types::{FreezeOp, IssueFeatures, IssueParams},
    Address, AddressHrp, HasAddressHrp, PrettyCoins, RawWallet, Wallet,
};
use parsed_coin::ParsedCoins;
use tx::TxOpt;

/// Command line tool for the Konstellation issue module
#[derive(clap::Parser)]
struct Cmd {
    #[clap(flatten)]
    opt: Opt,
    #[clap(subcommand)]
    subcommand: Subcommand,
}

#[derive(clap::Parser)]
struct Opt {
    #[clap(flatten)]
    network_opt: CosmosOpt,
    /// Turn on verbose output
    #[clap(long, short, global = true)]
    verbose: bool,
}

impl Opt {
    fn init_logger(&self) {
        let default = if self.verbose {
            format!("issue=debug,{}=debug,info", env!("CARGO_CRATE_NAME"))
        } else {
            "info".to_owned()
        };
        let filter = tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default));
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cmd = Cmd::parse();
    cmd.opt.init_logger();

    cmd.subcommand.go(cmd.opt).await
}

#[derive(clap::Parser)]
enum Subcommand {
    /// Issue a new token
    Create {
        #[clap(flatten)]
        tx_opt: TxOpt,
        /// Human readable name
        name: String,
        /// Ticker symbol, the lower-cased symbol becomes the denom
        symbol: String,
        /// Total supply in the smallest unit
        total_supply: String,
        #[clap(long, default_value_t = 18)]
        decimals: u32,
        /// JSON description
        #[clap(long, default_value = "")]
        description: String,
        #[clap(long)]
        burn_owner_disabled: bool,
        #[clap(long)]
        burn_holder_disabled: bool,
        #[clap(long)]
        burn_from_disabled: bool,
        #[clap(long)]
        mint_disabled: bool,
        #[clap(long)]
        freeze_disabled: bool,
    },
    /// Set the JSON description of a token
    Description {
        #[clap(flatten)]
        tx_opt: TxOpt,
        denom: String,
        description: String,
    },
    /// Replace the feature flags of a token
    Features {
        #[clap(flatten)]
        tx_opt: TxOpt,
        denom: String,
        /// JSON object, e.g. {"mint_disabled":true}
        features: IssueFeatures,
    },
    /// Transfers token from one owner to another
    TransferOwnership {
        #[clap(flatten)]
        tx_opt: TxOpt,
        to_address: String,
        denom: String,
    },
    /// Mint new tokens
    Mint {
        #[clap(flatten)]
        tx_opt: TxOpt,
        amount: ParsedCoins,
        /// Recipient, defaults to the sender
        #[clap(long)]
        to: Option<String>,
    },
    /// Burn tokens held by the sender
    Burn {
        #[clap(flatten)]
        tx_opt: TxOpt,
        amount: ParsedCoins,
    },
    /// Burn tokens held by another address
    BurnFrom {
        #[clap(flatten)]
        tx_opt: TxOpt,
        /// Holder whose tokens are used
        #[clap(value_name = "FROM")]
        from_address: String,
        amount: ParsedCoins,
    },
    /// Freeze transfers of a holder: in, out or in-out
    Freeze {
        #[clap(flatten)]
        tx_opt: TxOpt,
        op: FreezeOp,
        holder: String,
        denom: String,
    },
    /// Lift a freeze: in, out or in-out
    Unfreeze {
        #[clap(flatten)]
        tx_opt: TxOpt,
        op: FreezeOp,
        holder: String,
        denom: String,
    },
    /// Send tokens
    Transfer {
        #[clap(flatten)]
        tx_opt: TxOpt,
        to: String,
        amount: ParsedCoins,
    },
    /// Send tokens out of an allowance
    TransferFrom {
        #[clap(flatten)]
        tx_opt: TxOpt,
        /// Holder whose tokens are used
        #[clap(value_name = "FROM")]
        from_address: String,
        to: String,
        amount: ParsedCoins,
    },
    /// Set the allowance of a spender
    Approve {
        #[clap(flatten)]
        tx_opt: TxOpt,
        spender: String,
        amount: ParsedCoins,
    },
    /// Raise the allowance of a spender
    IncreaseAllowance {
        #[clap(flatten)]
        tx_opt: TxOpt,
        spender: String,
        amount: ParsedCoins,
    },
    /// Lower the allowance of a spender
    DecreaseAllowance {
        #[clap(flatten)]
        tx_opt: TxOpt,
        spender: String,
        amount: ParsedCoins,
    },
    /// Print balances
    PrintBalances {
        /// Address on the chain
        address: Address,
    },
    /// Show the latest block
    ShowBlock {},
    /// Serve the REST endpoints that generate unsigned transactions
    RestServer {
        /// Address to listen on
        #[clap(long, default_value = "127.0.0.1:1317")]
        laddr: SocketAddr,
        /// Only generate transactions, never connect to a node
        #[clap(long)]
        offline: bool,
    },
    /// Check a genesis file for the issue module
    ValidateGenesis { file: PathBuf },
    /// Generate wallet
    GenWallet {},
    /// Print the address for the given phrase
    PrintAddress {
        /// Phrase
        phrase: RawWallet,
    },
    /// Generate bash shell completion script
    GenerateShellCompletions {
        /// Which shell to generate for
        #[clap(default_value_t = clap_complete::Shell::Bash)]
        shell: clap_complete::Shell,
    },
}

fn parse_address(field: &str, value: &str, hrp: AddressHrp) -> Result<Address> {
    Address::parse_with_hrp(value, hrp).with_context(|| format!("Invalid {field} address"))
}

impl Subcommand {
    pub(crate) async fn go(self, opt: Opt) -> Result<()> {
        let hrp = opt.network_opt.builder()?.get_address_hrp();
        let cosmos_opt = &opt.network_opt;
        match self {
            Subcommand::Create {
                tx_opt,
                name,
                symbol,
                total_supply,
                decimals,
                description,
                burn_owner_disabled,
                burn_holder_disabled,
                burn_from_disabled,
                mint_disabled,
                freeze_disabled,
            } => {
                let params = IssueParams {
                    name,
                    symbol,
                    total_supply,
                    decimals,
                    description,
                    features: Some(IssueFeatures {
                        burn_owner_disabled,
                        burn_holder_disabled,
                        burn_from_disabled,
                        mint_disabled,
                        freeze_disabled,
                    }),
                };
                tracing::info!("Token denom will be {}", params.denom());
                tx_opt
                    .run(cosmos_opt, |sender| {
                        Ok(MsgIssueCreate::new(sender, sender, params))
                    })
                    .await?;
            }
            Subcommand::Description {
                tx_opt,
                denom,
                description,
            } => {
                tx_opt
                    .run(cosmos_opt, |sender| {
                        Ok(MsgDescription::new(sender, denom, description))
                    })
                    .await?;
            }
            Subcommand::Features {
                tx_opt,
                denom,
                features,
            } => {
                tx_opt
                    .run(cosmos_opt, |sender| {
                        Ok(MsgFeatures::new(sender, denom, features))
                    })
                    .await?;
            }
            Subcommand::TransferOwnership {
                tx_opt,
                to_address,
                denom,
            } => {
                let to = parse_address("to", &to_address, hrp)?;
                tx_opt
                    .run(cosmos_opt, |sender| {
                        Ok(MsgTransferOwnership::new(sender, to, denom))
                    })
                    .await?;
            }
            Subcommand::Mint { tx_opt, amount, to } => {
                let to = to.map(|to| parse_address("to", &to, hrp)).transpose()?;
                tx_opt
                    .run(cosmos_opt, |sender| {
                        Ok(MsgMint::new(sender, to.unwrap_or(sender), amount.into_coins()))
                    })
                    .await?;
            }
            Subcommand::Burn { tx_opt, amount } => {
                tx_opt
                    .run(cosmos_opt, |sender| {
                        Ok(MsgBurn::new(sender, amount.into_coins()))
                    })
                    .await?;
            }
            Subcommand::BurnFrom {
                tx_opt,
                from_address,
                amount,
            } => {
                let from = parse_address("from", &from_address, hrp)?;
                tx_opt
                    .run(cosmos_opt, |sender| {
                        Ok(MsgBurnFrom::new(sender, from, amount.into_coins()))
                    })
                    .await?;
            }
            Subcommand::Freeze {
                tx_opt,
                op,
                holder,
                denom,
            } => {
                let holder = parse_address("holder", &holder, hrp)?;
                tx_opt
                    .run(cosmos_opt, |sender| {
                        Ok(MsgFreeze::new(sender, holder, denom, op))
                    })
                    .await?;
            }
            Subcommand::Unfreeze {
                tx_opt,
                op,
                holder,
                denom,
            } => {
                let holder = parse_address("holder", &holder, hrp)?;
                tx_opt
                    .run(cosmos_opt, |sender| {
                        Ok(MsgUnfreeze::new(sender, holder, denom, op))
                    })
                    .await?;
            }
            Subcommand::Transfer { tx_opt, to, amount } => {
                let to = parse_address("to", &to, hrp)?;
                tx_opt
                    .run(cosmos_opt, |sender| {
                        Ok(MsgTransfer::new(sender, to, amount.into_coins()))
                    })
                    .await?;
            }
            Subcommand::TransferFrom {
                tx_opt,
                from_address,
                to,
                amount,
            } => {
                let from = parse_address("from", &from_address, hrp)?;
                let to = parse_address("to", &to, hrp)?;
                tx_opt
                    .run(cosmos_opt, |sender| {
                        Ok(MsgTransferFrom::new(sender, from, to, amount.into_coins()))
                    })
                    .await?;
            }
            Subcommand::Approve {
                tx_opt,
                spender,
                amount,
            } => {
                let spender = parse_address("spender", &spender, hrp)?;
                tx_opt
                    .run(cosmos_opt, |sender| {
                        Ok(MsgApprove::new(sender, spender, amount.into_coins()))
                    })
                    .await?;
            }
            Subcommand::IncreaseAllowance {
                tx_opt,
                spender,
                amount,
            } => {
                let spender = parse_address("spender", &spender, hrp)?;
                tx_opt
                    .run(cosmos_opt, |sender| {
                        Ok(MsgIncreaseAllowance::new(
                            sender,
                            spender,
                            amount.into_coins(),
                        ))
                    })
                    .await?;
            }
            Subcommand::DecreaseAllowance {
                tx_opt,
                spender,
                amount,
            } => {
                let spender = parse_address("spender", &spender, hrp)?;
                tx_opt
                    .run(cosmos_opt, |sender| {
                        Ok(MsgDecreaseAllowance::new(
                            sender,
                            spender,
                            amount.into_coins(),
                        ))
                    })
                    .await?;
            }
            Subcommand::PrintBalances { address } => {
                let cosmos = cosmos_opt.build().await?;
                let balances = cosmos.all_balances(address.to_string()).await?;
                if balances.is_empty() {
                    println!("0");
                } else {
                    println!("{}", PrettyCoins(&balances));
                }
            }
            Subcommand::ShowBlock {} => {
                let cosmos = cosmos_opt.build().await?;
                let block = cosmos.get_latest_block_info().await?;
                println!("Chain ID: {}", block.chain_id);
                println!("Height: {}", block.height);
                println!("Timestamp: {}", block.timestamp);
            }
            Subcommand::RestServer { laddr, offline } => {
                let state = if offline {
                    RestState::new(hrp)
                } else {
                    RestState::with_cosmos(cosmos_opt.build_lazy()?)
                };
                rest::serve(laddr, state).await?;
            }
            Subcommand::ValidateGenesis { file } => {
                let genesis: GenesisState = serde_json::from_str(&fs_err::read_to_string(&file)?)
                    .with_context(|| format!("Unable to parse genesis file {}", file.display()))?;
                validate_genesis(&genesis)?;
                println!(
                    "{} is valid, {} token(s)",
                    file.display(),
                    genesis.issues.len()
                );
            }
            Subcommand::GenWallet {} => {
                let (phrase, wallet) = Wallet::generate(hrp)?;
                println!("Mnemonic: {phrase}");
                println!("Address: {wallet}");
            }
            Subcommand::PrintAddress { phrase } => {
                println!("{}", phrase.for_chain(hrp)?);
            }
            Subcommand::GenerateShellCompletions { shell } => {
                clap_complete::generate(
                    shell,
                    &mut Cmd::command(),
                    "issue",
                    &mut std::io::stdout(),
                );
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_cli() {
        Cmd::command().debug_assert();
    }

    #[test]
    fn transfer_ownership_takes_two_args() {
        Cmd::try_parse_from(["issue", "transfer-ownership", "darc1abc", "tst"]).unwrap();
        assert!(Cmd::try_parse_from(["issue", "transfer-ownership", "darc1abc"]).is_err());
        assert!(
            Cmd::try_parse_from(["issue", "transfer-ownership", "darc1abc", "tst", "x"]).is_err()
        );
    }

    #[test]
    fn holder_positional_and_from_flag() {
        let sender = issue::RawAddress::from([1; 20])
            .with_hrp(AddressHrp::DARC)
            .to_string();
        let cmd = Cmd::try_parse_from([
            "issue",
            "burn-from",
            "darc1holder",
            "5tst",
            "--from",
            sender.as_str(),
            "--generate-only",
        ])
        .unwrap();
        match cmd.subcommand {
            Subcommand::BurnFrom { from_address, .. } => assert_eq!(from_address, "darc1holder"),
            _ => panic!("expected burn-from"),
        }

        let cmd = Cmd::try_parse_from([
            "issue",
            "transfer-from",
            "darc1holder",
            "darc1recipient",
            "5tst",
            "--generate-only",
        ])
        .unwrap();
        match cmd.subcommand {
            Subcommand::TransferFrom {
                from_address, to, ..
            } => {
                assert_eq!(from_address, "darc1holder");
                assert_eq!(to, "darc1recipient");
            }
            _ => panic!("expected transfer-from"),
        }
    }

    #[test]
    fn freeze_op_parsed() {
        Cmd::try_parse_from(["issue", "freeze", "in-out", "darc1abc", "tst"]).unwrap();
        assert!(Cmd::try_parse_from(["issue", "freeze", "sideways", "darc1abc", "tst"]).is_err());
    }
}

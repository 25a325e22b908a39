pub use address::{
    parse_raw_address, Address, AddressError, AddressHrp, HasAddress, HasAddressHrp, RawAddress,
};
pub use client::{BlockInfo, Cosmos, PerformQueryError};
pub use coins::{validate_coins, PrettyCoins};
pub use cosmos_builder::{CosmosBuilder, DEFAULT_CHAIN_ID, DEFAULT_GAS_COIN, DEFAULT_GRPC_URL};
pub use cosmos_sdk_proto as proto;
pub use cosmos_sdk_proto::cosmos::base::v1beta1::Coin;
pub use error::{IssueCode, IssueError, TxFailure, DEFAULT_CODESPACE, SDK_CODESPACE};
pub use issue::Issue;
pub use txbuilder::{TxBuilder, TypedMessage, DEFAULT_GAS_LIMIT};
pub use wallet::{RawWallet, SeedPhrase, Wallet};

mod address;
mod client;
mod coins;
mod cosmos_builder;
mod error;
pub mod genesis;
mod issue;
pub mod msgs;
pub mod rest;
mod txbuilder;
pub mod types;
mod wallet;

#[cfg(feature = "clap")]
pub mod clap;

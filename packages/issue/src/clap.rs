use anyhow::{Context, Result};

use crate::{AddressHrp, Cosmos, CosmosBuilder};

/// Command line options for connecting to a Konstellation node
#[derive(clap::Parser, Clone, Debug)]
pub struct CosmosOpt {
    /// Optional gRPC endpoint override
    #[clap(long, env = "COSMOS_GRPC", global = true)]
    pub cosmos_grpc: Option<String>,
    /// Optional chain ID override
    #[clap(long, env = "COSMOS_CHAIN_ID", global = true)]
    pub chain_id: Option<String>,
    /// Optional gas coin override
    #[clap(long, env = "COSMOS_GAS_COIN", global = true)]
    pub gas_coin: Option<String>,
    /// Optional address prefix override
    #[clap(long, env = "COSMOS_HRP", global = true)]
    pub hrp: Option<String>,
    /// Optional gas multiplier override
    #[clap(long, env = "COSMOS_GAS_MULTIPLIER", global = true)]
    pub gas_multiplier: Option<f64>,
    /// Referer header
    #[clap(long, short, global = true, env = "COSMOS_REFERER_HEADER")]
    referer_header: Option<String>,
}

impl CosmosOpt {
    pub fn builder(&self) -> Result<CosmosBuilder> {
        self.clone().into_builder()
    }

    pub fn into_builder(self) -> Result<CosmosBuilder> {
        let CosmosOpt {
            cosmos_grpc,
            chain_id,
            gas_coin,
            hrp,
            gas_multiplier,
            referer_header,
        } = self;

        let mut builder = CosmosBuilder::default();
        if let Some(grpc) = cosmos_grpc {
            builder.set_grpc_url(grpc);
        }
        if let Some(chain_id) = chain_id {
            builder.set_chain_id(chain_id);
        }
        if let Some(gas_coin) = gas_coin {
            builder.set_gas_coin(gas_coin);
        }
        if let Some(hrp) = hrp {
            builder.set_hrp(
                AddressHrp::new(&hrp).with_context(|| format!("Invalid address prefix {hrp}"))?,
            );
        }

        builder.set_gas_estimate_multiplier(gas_multiplier);
        builder.set_referer_header(referer_header);

        Ok(builder)
    }

    pub async fn build(&self) -> Result<Cosmos> {
        self.builder()?.build().await
    }

    pub fn build_lazy(&self) -> Result<Cosmos> {
        self.builder()?.build_lazy()
    }
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;

    #[derive(Parser)]
    struct Cmd {
        #[clap(flatten)]
        opt: CosmosOpt,
    }

    #[test]
    fn overrides() {
        let cmd = Cmd::parse_from([
            "issue",
            "--chain-id",
            "testnet",
            "--hrp",
            "juno",
            "--gas-multiplier",
            "1.5",
        ]);
        let builder = cmd.opt.builder().unwrap();
        assert_eq!(builder.chain_id(), "testnet");
        assert_eq!(builder.hrp().as_str(), "juno");
        assert_eq!(builder.gas_estimate_multiplier(), 1.5);
        assert_eq!(builder.gas_coin(), crate::cosmos_builder::DEFAULT_GAS_COIN);
    }

    #[test]
    fn bad_hrp() {
        let cmd = Cmd::parse_from(["issue", "--hrp", "UPPER case"]);
        assert!(cmd.opt.builder().is_err());
    }
}

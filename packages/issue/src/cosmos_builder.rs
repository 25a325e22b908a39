use std::time::Duration;

use crate::address::HasAddressHrp;
use crate::AddressHrp;

/// Chain ID of the Konstellation main network.
pub const DEFAULT_CHAIN_ID: &str = "darchub";
/// Fee and staking denom of Konstellation.
pub const DEFAULT_GAS_COIN: &str = "udarc";
/// gRPC endpoint of a locally running node.
pub const DEFAULT_GRPC_URL: &str = "http://localhost:9090";

/// Used to build a [crate::Cosmos].
#[derive(Clone, Debug)]
pub struct CosmosBuilder {
    grpc_url: String,
    chain_id: String,
    gas_coin: String,
    hrp: AddressHrp,

    // Values with defaults
    gas_estimate_multiplier: Option<f64>,
    gas_price_low: Option<f64>,
    gas_price_high: Option<f64>,
    gas_price_retry_attempts: Option<u64>,
    transaction_attempts: Option<usize>,
    referer_header: Option<String>,
    connection_timeout: Option<Duration>,
    query_timeout_seconds: Option<u32>,
    query_retries: Option<u32>,
}

impl Default for CosmosBuilder {
    /// A local Konstellation node.
    fn default() -> Self {
        CosmosBuilder::new(
            DEFAULT_CHAIN_ID,
            DEFAULT_GAS_COIN,
            AddressHrp::DARC,
            DEFAULT_GRPC_URL,
        )
    }
}

impl CosmosBuilder {
    /// Create a new [CosmosBuilder] with default options where possible.
    pub fn new(
        chain_id: impl Into<String>,
        gas_coin: impl Into<String>,
        hrp: AddressHrp,
        grpc_url: impl Into<String>,
    ) -> CosmosBuilder {
        Self {
            grpc_url: grpc_url.into(),
            chain_id: chain_id.into(),
            gas_coin: gas_coin.into(),
            hrp,
            gas_estimate_multiplier: None,
            gas_price_low: None,
            gas_price_high: None,
            gas_price_retry_attempts: None,
            transaction_attempts: None,
            referer_header: None,
            connection_timeout: None,
            query_timeout_seconds: None,
            query_retries: None,
        }
    }

    /// gRPC endpoint to connect to
    pub fn grpc_url(&self) -> &str {
        self.grpc_url.as_ref()
    }

    /// See [Self::grpc_url]
    pub fn set_grpc_url(&mut self, grpc_url: impl Into<String>) {
        self.grpc_url = grpc_url.into();
    }

    /// Chain ID we want to communicate with
    pub fn chain_id(&self) -> &str {
        self.chain_id.as_ref()
    }

    /// See [Self::chain_id]
    pub fn set_chain_id(&mut self, chain_id: String) {
        self.chain_id = chain_id;
    }

    /// Native coin used for gas payments
    pub fn gas_coin(&self) -> &str {
        self.gas_coin.as_ref()
    }

    /// See [Self::gas_coin]
    pub fn set_gas_coin(&mut self, gas_coin: String) {
        self.gas_coin = gas_coin;
    }

    /// Human-readable part (HRP) of chain addresses
    pub fn hrp(&self) -> AddressHrp {
        self.hrp
    }

    /// See [Self::hrp]
    pub fn set_hrp(&mut self, hrp: AddressHrp) {
        self.hrp = hrp;
    }

    /// Add a multiplier to the gas estimate to account for any gas fluctuations
    ///
    /// Defaults to 1.3 following cosmjs and osmojs.
    pub fn gas_estimate_multiplier(&self) -> f64 {
        self.gas_estimate_multiplier.unwrap_or(1.3)
    }

    /// See [Self::gas_estimate_multiplier]
    pub fn set_gas_estimate_multiplier(&mut self, gas_estimate_multiplier: Option<f64>) {
        self.gas_estimate_multiplier = gas_estimate_multiplier;
    }

    /// Amount of gas coin to send per unit of gas, at the low end.
    ///
    /// Default: 0.02
    pub fn gas_price_low(&self) -> f64 {
        self.gas_price_low.unwrap_or(0.02)
    }

    /// See [Self::gas_price_low]
    pub fn set_gas_price_low(&mut self, gas_price_low: Option<f64>) {
        self.gas_price_low = gas_price_low;
    }

    /// Amount of gas coin to send per unit of gas, at the high end.
    ///
    /// Default: 0.03
    pub fn gas_price_high(&self) -> f64 {
        self.gas_price_high.unwrap_or(0.03)
    }

    /// See [Self::gas_price_high]
    pub fn set_gas_price_high(&mut self, gas_price_high: Option<f64>) {
        self.gas_price_high = gas_price_high;
    }

    /// How many retries at different gas prices should we try before using high
    ///
    /// Default: 3
    ///
    /// If this is 0, we'll always go straight to high. 1 means we'll try the
    /// low and the high. 2 means we'll try low, midpoint, and high. And so on
    /// from there.
    pub fn gas_price_retry_attempts(&self) -> u64 {
        self.gas_price_retry_attempts.unwrap_or(3)
    }

    /// See [Self::gas_price_retry_attempts]
    pub fn set_gas_price_retry_attempts(&mut self, gas_price_retry_attempts: Option<u64>) {
        self.gas_price_retry_attempts = gas_price_retry_attempts;
    }

    /// How many attempts to give a transaction before giving up
    ///
    /// Default: 30
    pub fn transaction_attempts(&self) -> usize {
        self.transaction_attempts.unwrap_or(30)
    }

    /// See [Self::transaction_attempts]
    pub fn set_transaction_attempts(&mut self, transaction_attempts: Option<usize>) {
        self.transaction_attempts = transaction_attempts;
    }

    /// Referrer header sent to the server
    pub fn referer_header(&self) -> Option<&str> {
        self.referer_header.as_deref()
    }

    /// See [Self::referer_header]
    pub fn set_referer_header(&mut self, referer_header: Option<String>) {
        self.referer_header = referer_header;
    }

    /// Sets the duration to wait for a connection.
    ///
    /// Defaults to 5 seconds
    pub fn connection_timeout(&self) -> Duration {
        self.connection_timeout
            .unwrap_or_else(|| Duration::from_secs(5))
    }

    /// See [Self::connection_timeout]
    pub fn set_connection_timeout(&mut self, connection_timeout: Option<Duration>) {
        self.connection_timeout = connection_timeout;
    }

    /// Sets the number of seconds before timing out a gRPC query
    ///
    /// Defaults to 5 seconds
    pub fn query_timeout_seconds(&self) -> u32 {
        self.query_timeout_seconds.unwrap_or(5)
    }

    /// See [Self::query_timeout_seconds]
    pub fn set_query_timeout_seconds(&mut self, query_timeout_seconds: Option<u32>) {
        self.query_timeout_seconds = query_timeout_seconds;
    }

    /// Number of attempts to make at a query before giving up.
    ///
    /// Only retries if there is a tonic-level error.
    ///
    /// Defaults to 3
    pub fn query_retries(&self) -> u32 {
        self.query_retries.unwrap_or(3)
    }

    /// See [Self::query_retries]
    pub fn set_query_retries(&mut self, query_retries: Option<u32>) {
        self.query_retries = query_retries;
    }

    /// Gas coin amount for the given gas at the given attempt, starting at 0.
    ///
    /// Moves linearly from [Self::gas_price_low] to [Self::gas_price_high]
    /// over [Self::gas_price_retry_attempts] attempts.
    pub(crate) fn gas_to_coins(&self, gas: u64, attempt_number: u64) -> u64 {
        let low = self.gas_price_low();
        let high = self.gas_price_high();
        let attempts = self.gas_price_retry_attempts();

        let gas_price = if attempt_number >= attempts {
            high
        } else {
            let step = (high - low) / attempts as f64;
            low + step * attempt_number as f64
        };

        (gas as f64 * gas_price) as u64
    }

    /// Apply the gas estimate multiplier to a simulated gas amount.
    pub(crate) fn adjust_gas(&self, gas_used: u64) -> u64 {
        // Since we're already estimating and padding, the loss of precision from f64 to u64 is negligible
        (gas_used as f64 * self.gas_estimate_multiplier()) as u64
    }
}

impl HasAddressHrp for CosmosBuilder {
    fn get_address_hrp(&self) -> AddressHrp {
        self.hrp
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let builder = CosmosBuilder::default();
        assert_eq!(builder.chain_id(), "darchub");
        assert_eq!(builder.gas_coin(), "udarc");
        assert_eq!(builder.hrp(), AddressHrp::DARC);
        assert_eq!(builder.transaction_attempts(), 30);
        assert_eq!(builder.query_retries(), 3);
        assert_eq!(builder.connection_timeout(), Duration::from_secs(5));
        assert_eq!(builder.referer_header(), None);
    }

    #[test]
    fn gas_estimate_multiplier() {
        let mut builder = CosmosBuilder::default();
        assert_eq!(builder.adjust_gas(1234), 1604);
        builder.set_gas_estimate_multiplier(Some(4.2));
        assert_eq!(builder.adjust_gas(1234), 5182);
    }

    #[test]
    fn gas_price_escalation() {
        let mut builder = CosmosBuilder::default();
        builder.set_gas_price_low(Some(1.0));
        builder.set_gas_price_high(Some(4.0));
        let prices = (0..=4)
            .map(|attempt| builder.gas_to_coins(100, attempt))
            .collect::<Vec<_>>();
        assert_eq!(prices, vec![100, 200, 300, 400, 400]);

        builder.set_gas_price_retry_attempts(Some(0));
        assert_eq!(builder.gas_to_coins(100, 0), 400);
    }
}

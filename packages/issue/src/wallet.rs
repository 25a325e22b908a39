use std::fmt::Display;
use std::str::FromStr;
use std::sync::Arc;

use anyhow::{Context, Result};
use bitcoin::hashes::{ripemd160, sha256, Hash};
use bitcoin::secp256k1::ecdsa::Signature;
use bitcoin::secp256k1::{All, Message, Secp256k1};
use bitcoin::util::bip32::{DerivationPath, ExtendedPrivKey, ExtendedPubKey};
use cosmos_sdk_proto::cosmos::base::abci::v1beta1::TxResponse;
use once_cell::sync::OnceCell;
use rand::Rng;

use crate::address::{HasAddressHrp, RawAddress};
use crate::msgs::IssueMsg;
use crate::{Address, AddressHrp, Cosmos, HasAddress, TxBuilder};

/// Cosmos coin type 118, first account, first address.
pub const DEFAULT_DERIVATION_PATH: &str = "m/44'/118'/0'/0/0";

/// A seed phrase for a wallet
#[derive(Clone)]
pub struct SeedPhrase {
    mnemonic: bip39::Mnemonic,
}

impl SeedPhrase {
    /// 24 words
    fn random() -> Result<SeedPhrase> {
        let mut rng = rand::thread_rng();
        let mut entropy: [u8; 32] = [0; 32];
        for b in &mut entropy {
            *b = rng.gen();
        }
        Ok(SeedPhrase {
            mnemonic: bip39::Mnemonic::from_entropy(&entropy)
                .context("Unable to generate mnemonic from entropy")?,
        })
    }
}

impl Display for SeedPhrase {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.mnemonic)
    }
}

impl From<bip39::Mnemonic> for SeedPhrase {
    fn from(mnemonic: bip39::Mnemonic) -> Self {
        SeedPhrase { mnemonic }
    }
}

impl FromStr for SeedPhrase {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mnemonic = s
            .trim()
            .parse()
            .ok()
            .context("Unable to parse mnemonic from phrase")?;

        Ok(SeedPhrase { mnemonic })
    }
}

/// A private key for a wallet, without specifying the [AddressHrp].
#[derive(Clone)]
pub struct RawWallet {
    seed_phrase: SeedPhrase,
    derivation_path: Option<Arc<DerivationPath>>,
}

impl FromStr for RawWallet {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RawWallet::from_phrase(s)
    }
}

impl RawWallet {
    /// Parse a phrase, optionally prefixed by a derivation path such as `m/44'/118'/0'/0/1 `.
    pub fn from_phrase(phrase: &str) -> Result<Self> {
        let phrase = phrase.trim();
        let (derivation_path, phrase) = if phrase.starts_with("m/44") {
            match phrase.split_once(' ') {
                Some((path, phrase)) => {
                    let path = path
                        .parse()
                        .with_context(|| format!("Invalid derivation path: {path}"))?;
                    (Some(Arc::new(path)), phrase)
                }
                None => (None, phrase),
            }
        } else {
            (None, phrase)
        };

        let seed_phrase = SeedPhrase::from_str(phrase)?;
        Ok(RawWallet {
            seed_phrase,
            derivation_path,
        })
    }

    pub fn seed_phrase(&self) -> &SeedPhrase {
        &self.seed_phrase
    }

    pub fn for_chain(&self, hrp: impl HasAddressHrp) -> Result<Wallet> {
        let secp = global_secp();
        let derivation_path = match &self.derivation_path {
            Some(path) => path.clone(),
            None => Arc::new(DEFAULT_DERIVATION_PATH.parse()?),
        };

        let root_private_key = ExtendedPrivKey::new_master(
            bitcoin::Network::Bitcoin,
            &self.seed_phrase.mnemonic.to_seed(""),
        )?;
        let privkey = root_private_key.derive_priv(secp, &*derivation_path)?;
        let public_key = ExtendedPubKey::from_priv(secp, &privkey);

        let public_key_bytes = public_key.public_key.serialize();
        let raw_address = address_from_public_key(&public_key_bytes);
        let address = RawAddress::from(raw_address).with_hrp(hrp.get_address_hrp());

        Ok(Wallet {
            address,
            privkey,
            public_key_bytes,
        })
    }
}

/// A wallet capable of signing on a specific blockchain
#[derive(Clone)]
// Not deriving Copy since this is a pretty large data structure.
pub struct Wallet {
    address: Address,
    privkey: ExtendedPrivKey,
    public_key_bytes: [u8; 33],
}

fn global_secp() -> &'static Secp256k1<All> {
    static CELL: OnceCell<Secp256k1<All>> = OnceCell::new();
    CELL.get_or_init(Secp256k1::new)
}

impl Wallet {
    pub fn address(&self) -> &Address {
        &self.address
    }

    /// Generate a random mnemonic phrase
    pub fn generate_phrase() -> Result<String> {
        SeedPhrase::random().map(|phrase| phrase.to_string())
    }

    /// Generate a random wallet, returning its phrase too.
    pub fn generate(hrp: AddressHrp) -> Result<(SeedPhrase, Self)> {
        let raw = RawWallet {
            seed_phrase: SeedPhrase::random()?,
            derivation_path: None,
        };
        let wallet = raw.for_chain(hrp)?;
        Ok((raw.seed_phrase, wallet))
    }

    pub fn from_phrase(phrase: &str, hrp: impl HasAddressHrp) -> Result<Self> {
        RawWallet::from_phrase(phrase)?.for_chain(hrp)
    }

    /// Compressed secp256k1 public key
    pub fn public_key_bytes(&self) -> &[u8] {
        &self.public_key_bytes
    }

    pub fn sign_bytes(&self, msg: &[u8]) -> Result<Signature> {
        let msg = sha256::Hash::hash(msg);
        let msg = Message::from_slice(msg.as_ref())?;
        Ok(global_secp().sign_ecdsa(&msg, &self.privkey.private_key))
    }

    /// A simple helper function for signing and broadcasting a single message and waiting for a response.
    ///
    /// Generates an error if the transaction failed.
    pub async fn broadcast_message(&self, cosmos: &Cosmos, msg: impl IssueMsg) -> Result<TxResponse> {
        let mut builder = TxBuilder::default();
        builder.add_message(msg)?;
        builder.sign_and_broadcast(cosmos, self).await
    }
}

fn address_from_public_key(public_key: &[u8]) -> [u8; 20] {
    let sha = sha256::Hash::hash(public_key);
    ripemd160::Hash::hash(sha.as_ref()).into_inner()
}

impl Display for Wallet {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.address)
    }
}

impl HasAddress for Wallet {
    fn get_address(&self) -> Address {
        self.address
    }
}

impl HasAddressHrp for Wallet {
    fn get_address_hrp(&self) -> AddressHrp {
        self.address.hrp()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PHRASE: &str = "clip hire initial neck maid actor venue client foam budget lock catalog sweet steak waste crater broccoli pipe steak sister coyote moment obvious choose";

    #[test]
    fn phrase_is_deterministic() {
        let first = Wallet::from_phrase(PHRASE, AddressHrp::DARC).unwrap();
        let second = Wallet::from_phrase(&format!("  {PHRASE}\n"), AddressHrp::DARC).unwrap();
        assert_eq!(first.address(), second.address());
        assert_eq!(first.public_key_bytes().len(), 33);
    }

    #[test]
    fn same_key_other_chain() {
        let juno = Wallet::from_phrase(PHRASE, AddressHrp::new("juno").unwrap()).unwrap();
        let darc = Wallet::from_phrase(PHRASE, AddressHrp::DARC).unwrap();
        assert_eq!(juno.address().raw(), darc.address().raw());
        assert!(darc.to_string().starts_with("darc1"));
    }

    #[test]
    fn explicit_derivation_path() {
        let default = Wallet::from_phrase(PHRASE, AddressHrp::DARC).unwrap();
        let explicit =
            Wallet::from_phrase(&format!("m/44'/118'/0'/0/0 {PHRASE}"), AddressHrp::DARC).unwrap();
        let second =
            Wallet::from_phrase(&format!("m/44'/118'/0'/0/1 {PHRASE}"), AddressHrp::DARC).unwrap();
        assert_eq!(default.address(), explicit.address());
        assert_ne!(default.address(), second.address());
    }

    #[test]
    fn generated_phrase_roundtrips() {
        let phrase = Wallet::generate_phrase().unwrap();
        assert_eq!(phrase.split_whitespace().count(), 24);
        Wallet::from_phrase(&phrase, AddressHrp::DARC).unwrap();

        let (seed, wallet) = Wallet::generate(AddressHrp::DARC).unwrap();
        let again = Wallet::from_phrase(&seed.to_string(), AddressHrp::DARC).unwrap();
        assert_eq!(wallet.address(), again.address());
    }

    #[test]
    fn bad_phrase() {
        assert!(Wallet::from_phrase("not a real mnemonic", AddressHrp::DARC).is_err());
    }

    #[test]
    fn signatures_verify() {
        let wallet = Wallet::from_phrase(PHRASE, AddressHrp::DARC).unwrap();
        let sig = wallet.sign_bytes(b"sign doc").unwrap();
        let msg = Message::from_slice(sha256::Hash::hash(b"sign doc").as_ref()).unwrap();
        let pubkey = bitcoin::secp256k1::PublicKey::from_slice(wallet.public_key_bytes()).unwrap();
        global_secp().verify_ecdsa(&msg, &sig, &pubkey).unwrap();
    }
}

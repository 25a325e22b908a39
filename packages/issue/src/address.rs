use std::{
    collections::HashSet,
    fmt::{Debug, Display},
    str::FromStr,
};

use bech32::{FromBase32, ToBase32};
use once_cell::sync::Lazy;
use parking_lot::Mutex;
use serde::de::Visitor;

/// Errors that can occur while parsing or rendering addresses.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum AddressError {
    #[error("Invalid bech32 data in {address:?}: {source}")]
    InvalidBech32 {
        address: String,
        source: bech32::Error,
    },
    #[error("Address {address:?} uses Bech32m, must use Bech32")]
    Bech32mNotSupported { address: String },
    #[error("Invalid byte length {actual} in {address:?}, need either 20 or 32 bytes")]
    InvalidByteLength { address: String, actual: usize },
    #[error("Invalid human readable part {hrp:?}")]
    InvalidHrp { hrp: String },
    #[error("Address {address} has prefix {actual}, expected {expected}")]
    WrongHrp {
        address: String,
        actual: AddressHrp,
        expected: AddressHrp,
    },
}

/// A raw address value not connected to a specific blockchain. You usually want [Address].
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash)]
pub enum RawAddress {
    Twenty { raw_address: [u8; 20] },
    ThirtyTwo { raw_address: [u8; 32] },
}

impl AsRef<[u8]> for RawAddress {
    fn as_ref(&self) -> &[u8] {
        match self {
            RawAddress::Twenty { raw_address } => raw_address,
            RawAddress::ThirtyTwo { raw_address } => raw_address,
        }
    }
}

impl From<[u8; 20]> for RawAddress {
    fn from(raw_address: [u8; 20]) -> Self {
        RawAddress::Twenty { raw_address }
    }
}

impl From<[u8; 32]> for RawAddress {
    fn from(raw_address: [u8; 32]) -> Self {
        RawAddress::ThirtyTwo { raw_address }
    }
}

impl RawAddress {
    pub fn with_hrp(self, hrp: AddressHrp) -> Address {
        Address {
            raw_address: self,
            hrp,
        }
    }

    fn from_slice(address: &str, value: &[u8]) -> Result<Self, AddressError> {
        if let Ok(raw_address) = <[u8; 20]>::try_from(value) {
            Ok(RawAddress::Twenty { raw_address })
        } else if let Ok(raw_address) = <[u8; 32]>::try_from(value) {
            Ok(RawAddress::ThirtyTwo { raw_address })
        } else {
            Err(AddressError::InvalidByteLength {
                address: address.to_owned(),
                actual: value.len(),
            })
        }
    }
}

/// The human-readable part of a bech32 address, e.g. `darc` for Konstellation.
///
/// Values are interned, so this type is [Copy].
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct AddressHrp(&'static str);

static INTERNED_HRPS: Lazy<Mutex<HashSet<&'static str>>> = Lazy::new(Default::default);

impl AddressHrp {
    /// Konstellation mainnet prefix.
    pub const DARC: AddressHrp = AddressHrp("darc");

    /// Intern a new HRP. Must be 1 to 83 lowercase ASCII characters.
    pub fn new(hrp: &str) -> Result<Self, AddressError> {
        if hrp.is_empty()
            || hrp.len() > 83
            || !hrp.bytes().all(|b| b.is_ascii_lowercase() || b.is_ascii_digit())
        {
            return Err(AddressError::InvalidHrp {
                hrp: hrp.to_owned(),
            });
        }
        let mut guard = INTERNED_HRPS.lock();
        let interned = match guard.get(hrp) {
            Some(interned) => *interned,
            None => {
                let leaked: &'static str = Box::leak(hrp.to_owned().into_boxed_str());
                guard.insert(leaked);
                leaked
            }
        };
        Ok(AddressHrp(interned))
    }

    pub fn as_str(self) -> &'static str {
        self.0
    }
}

impl Display for AddressHrp {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.write_str(self.0)
    }
}

impl Debug for AddressHrp {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{:?}", self.0)
    }
}

impl FromStr for AddressHrp {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AddressHrp::new(s)
    }
}

/// Parse a raw address and its HRP from a string.
pub fn parse_raw_address(s: &str) -> Result<(AddressHrp, RawAddress), AddressError> {
    let (hrp, data, variant) =
        bech32::decode(s).map_err(|source| AddressError::InvalidBech32 {
            address: s.to_owned(),
            source,
        })?;
    match variant {
        bech32::Variant::Bech32 => (),
        bech32::Variant::Bech32m => {
            return Err(AddressError::Bech32mNotSupported {
                address: s.to_owned(),
            })
        }
    }
    let data =
        Vec::<u8>::from_base32(&data).map_err(|source| AddressError::InvalidBech32 {
            address: s.to_owned(),
            source,
        })?;
    let raw_address = RawAddress::from_slice(s, &data)?;
    Ok((AddressHrp::new(&hrp)?, raw_address))
}

/// An address on a Cosmos blockchain
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Address {
    raw_address: RawAddress,
    hrp: AddressHrp,
}

impl Address {
    pub fn raw(&self) -> &RawAddress {
        &self.raw_address
    }

    pub fn hrp(&self) -> AddressHrp {
        self.hrp
    }

    /// Parse an address and require that it belongs to the chain with the given prefix.
    pub fn parse_with_hrp(s: &str, expected: AddressHrp) -> Result<Self, AddressError> {
        let address: Address = s.parse()?;
        if address.hrp == expected {
            Ok(address)
        } else {
            Err(AddressError::WrongHrp {
                address: s.to_owned(),
                actual: address.hrp,
                expected,
            })
        }
    }
}

impl Display for Address {
    fn fmt(&self, fmt: &mut std::fmt::Formatter) -> std::fmt::Result {
        bech32::encode_to_fmt(
            fmt,
            self.hrp.as_str(),
            self.raw_address.to_base32(),
            bech32::Variant::Bech32,
        )
        .map_err(|_| std::fmt::Error)?
    }
}

impl Debug for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "\"{self}\"")
    }
}

impl From<Address> for String {
    fn from(address: Address) -> Self {
        address.to_string()
    }
}

impl FromStr for Address {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (hrp, raw_address) = parse_raw_address(s)?;
        Ok(Address { raw_address, hrp })
    }
}

pub trait HasAddress {
    fn get_address(&self) -> Address;

    fn get_address_string(&self) -> String {
        self.get_address().to_string()
    }
}

impl HasAddress for Address {
    fn get_address(&self) -> Address {
        *self
    }
}

impl<T: HasAddress> HasAddress for &T {
    fn get_address(&self) -> Address {
        HasAddress::get_address(*self)
    }
}

/// Anything which knows which address prefix its chain uses.
pub trait HasAddressHrp {
    fn get_address_hrp(&self) -> AddressHrp;
}

impl HasAddressHrp for AddressHrp {
    fn get_address_hrp(&self) -> AddressHrp {
        *self
    }
}

impl HasAddressHrp for Address {
    fn get_address_hrp(&self) -> AddressHrp {
        self.hrp
    }
}

impl serde::Serialize for Address {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> serde::Deserialize<'de> for Address {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        deserializer.deserialize_str(AddressVisitor)
    }
}

struct AddressVisitor;

impl<'de> Visitor<'de> for AddressVisitor {
    type Value = Address;

    fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
        formatter.write_str("Cosmos address")
    }

    fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
    where
        E: serde::de::Error,
    {
        v.parse().map_err(E::custom)
    }
}

//! Validators and validator sets.

use alloc::vec::Vec;
use alloy_primitives::{Address, B256, Bytes, keccak256};
use alloy_rlp::{BufMut, Encodable, Header};
use keel_mpt::ordered_root_with_encoder;
use serde::{Deserialize, Serialize};

/// A validator entitled to vote, with its voting weight.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Validator {
    /// The validator address, derived from its public key.
    pub address: Address,
    /// The validator's public key material.
    pub pub_key: Bytes,
    /// The voting power of the validator.
    pub voting_power: u64,
    /// The proposer priority. Not part of the validator's canonical encoding.
    pub proposer_priority: i64,
}

impl Validator {
    /// Creates a validator from its public key, deriving the address.
    pub fn new(pub_key: Bytes, voting_power: u64) -> Self {
        Self { address: Self::address_of(&pub_key), pub_key, voting_power, proposer_priority: 0 }
    }

    /// Returns the address of the validator owning `pub_key`.
    pub fn address_of(pub_key: &[u8]) -> Address {
        Address::from_slice(&keccak256(pub_key)[..20])
    }

    fn payload_length(&self) -> usize {
        self.pub_key.length() + self.voting_power.length()
    }
}

/// Validators are encoded as `rlp([pub_key, voting_power])`.
impl Encodable for Validator {
    fn encode(&self, out: &mut dyn BufMut) {
        Header { list: true, payload_length: self.payload_length() }.encode(out);
        self.pub_key.encode(out);
        self.voting_power.encode(out);
    }

    fn length(&self) -> usize {
        let payload_length = self.payload_length();
        Header { list: true, payload_length }.length() + payload_length
    }
}

/// An ordered set of validators. Order is significant for the set's hash.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ValidatorSet {
    validators: Vec<Validator>,
}

impl ValidatorSet {
    /// Creates a new set, keeping the given order.
    pub const fn new(validators: Vec<Validator>) -> Self {
        Self { validators }
    }

    /// Returns the ordered root of the canonical encoding of every validator.
    pub fn hash(&self) -> B256 {
        ordered_root_with_encoder(&self.validators, |v, buf| v.encode(buf))
    }

    /// Returns the sum of the voting power of all validators.
    pub fn total_voting_power(&self) -> u64 {
        self.validators.iter().map(|v| v.voting_power).sum()
    }

    /// Returns the validators in set order.
    pub fn validators(&self) -> &[Validator] {
        &self.validators
    }

    /// Consumes the set, returning the validators in set order.
    pub fn into_validators(self) -> Vec<Validator> {
        self.validators
    }

    /// Returns the validator with the given address.
    pub fn by_address(&self, address: &Address) -> Option<&Validator> {
        self.validators.iter().find(|v| &v.address == address)
    }

    /// Returns the number of validators.
    pub fn len(&self) -> usize {
        self.validators.len()
    }

    /// Returns `true` if the set has no validators.
    pub fn is_empty(&self) -> bool {
        self.validators.is_empty()
    }

    /// Returns an iterator over the validators in set order.
    pub fn iter(&self) -> core::slice::Iter<'_, Validator> {
        self.validators.iter()
    }
}

impl From<Vec<Validator>> for ValidatorSet {
    fn from(validators: Vec<Validator>) -> Self {
        Self::new(validators)
    }
}

impl FromIterator<Validator> for ValidatorSet {
    fn from_iter<I: IntoIterator<Item = Validator>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a ValidatorSet {
    type Item = &'a Validator;
    type IntoIter = core::slice::Iter<'a, Validator>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

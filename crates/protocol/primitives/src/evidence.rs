//! Evidence of validator misbehavior.

use crate::{
    Validator,
    abci::{Misbehavior, ValidatorInfo},
};
use alloc::vec::Vec;
use alloy_rlp::{BufMut, Encodable, RlpEncodable};
use serde::{Deserialize, Serialize};

/// The kind of misbehavior an [Evidence] entry proves.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MisbehaviorKind {
    /// Unknown misbehavior.
    #[default]
    Unknown,
    /// The validator signed two conflicting votes.
    DuplicateVote,
    /// The validator took part in a light client attack.
    LightClientAttack,
}

impl MisbehaviorKind {
    const fn as_u8(self) -> u8 {
        match self {
            Self::Unknown => 0,
            Self::DuplicateVote => 1,
            Self::LightClientAttack => 2,
        }
    }
}

impl Encodable for MisbehaviorKind {
    fn encode(&self, out: &mut dyn BufMut) {
        self.as_u8().encode(out)
    }

    fn length(&self) -> usize {
        self.as_u8().length()
    }
}

/// Evidence that one or more validators misbehaved at `height`.
#[derive(Debug, Clone, Default, PartialEq, Eq, RlpEncodable, Serialize, Deserialize)]
pub struct Evidence {
    /// The kind of misbehavior.
    pub kind: MisbehaviorKind,
    /// The height the misbehavior happened at.
    pub height: u64,
    /// The time of the block at `height`.
    pub time: u64,
    /// The validators that misbehaved.
    pub byzantine_validators: Vec<Validator>,
    /// The total voting power of the validator set at `height`.
    pub total_voting_power: u64,
}

impl Evidence {
    /// Converts the evidence into one ABCI [Misbehavior] per byzantine validator.
    pub fn abci(&self) -> Vec<Misbehavior> {
        self.byzantine_validators
            .iter()
            .map(|v| Misbehavior {
                kind: self.kind,
                validator: ValidatorInfo { address: v.address, power: v.voting_power },
                height: self.height,
                time: self.time,
                total_voting_power: self.total_voting_power,
            })
            .collect()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use alloc::vec;
    use alloy_primitives::Bytes;

    #[test]
    fn test_abci_one_entry_per_validator() {
        let evidence = Evidence {
            kind: MisbehaviorKind::DuplicateVote,
            height: 3,
            time: 30,
            byzantine_validators: vec![
                Validator::new(Bytes::from_static(&[1; 32]), 5),
                Validator::new(Bytes::from_static(&[2; 32]), 7),
            ],
            total_voting_power: 12,
        };
        let misbehavior = evidence.abci();
        assert_eq!(misbehavior.len(), 2);
        assert_eq!(misbehavior[1].validator.power, 7);
        assert_eq!(misbehavior[1].validator.address, evidence.byzantine_validators[1].address);
        assert!(misbehavior.iter().all(|m| m.height == 3 && m.total_voting_power == 12));
    }
}

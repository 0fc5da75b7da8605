//! Content-addressed deduplication of icon sources.
//!
//! Identical SVG bytes are packed once; every id that carried them keeps a
//! reference to the representative so the manifest can broadcast one placement.

use crate::error::{Result, SpriteError};
use crate::model::IconSource;
use std::collections::HashMap;
use std::fmt;

/// blake3 digest of an icon's raw bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Signature([u8; 32]);

impl Signature {
    pub fn of(bytes: &[u8]) -> Self {
        Self(*blake3::hash(bytes).as_bytes())
    }

    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_hex(self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", &self.to_hex()[..16])
    }
}

/// Ids whose sources hash to the same signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DedupGroup {
    pub signature: Signature,
    /// First member id in input order.
    pub representative: String,
    /// All member ids in input order, representative first.
    pub members: Vec<String>,
}

/// Signature -> member ids table for one run. Groups partition the input.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DedupTable {
    groups: Vec<DedupGroup>,
    by_id: HashMap<String, usize>,
}

impl DedupTable {
    /// Groups in order of first appearance.
    pub fn groups(&self) -> &[DedupGroup] {
        &self.groups
    }

    pub fn representatives(&self) -> impl Iterator<Item = &str> {
        self.groups.iter().map(|g| g.representative.as_str())
    }

    pub fn is_representative(&self, id: &str) -> bool {
        self.group_of(id).is_some_and(|g| g.representative == id)
    }

    pub fn group_of(&self, id: &str) -> Option<&DedupGroup> {
        self.by_id.get(id).map(|&g| &self.groups[g])
    }

    /// Member ids of the group `representative` leads; just `[representative]` for unknown ids.
    pub fn members_of<'a>(&'a self, representative: &'a str) -> Vec<&'a str> {
        match self.group_of(representative) {
            Some(g) => g.members.iter().map(String::as_str).collect(),
            None => vec![representative],
        }
    }
}

/// Hashes every source and groups identical ones.
///
/// Two sources with equal signatures but different bytes are reported as
/// `SignatureCollision` rather than merged.
pub fn deduplicate(sources: &[IconSource]) -> Result<DedupTable> {
    let mut table = DedupTable::default();
    let mut by_signature: HashMap<Signature, usize> = HashMap::new();
    // Bytes of each group's representative, to verify collisions.
    let mut bodies: Vec<&[u8]> = Vec::new();

    for src in sources {
        if table.by_id.contains_key(&src.id) {
            return Err(SpriteError::DuplicateId(src.id.clone()));
        }
        let signature = Signature::of(&src.svg);
        let slot = match by_signature.get(&signature) {
            Some(&slot) => {
                if bodies[slot] != src.svg.as_slice() {
                    return Err(SpriteError::SignatureCollision {
                        first: table.groups[slot].representative.clone(),
                        second: src.id.clone(),
                    });
                }
                table.groups[slot].members.push(src.id.clone());
                slot
            }
            None => {
                let slot = table.groups.len();
                table.groups.push(DedupGroup {
                    signature,
                    representative: src.id.clone(),
                    members: vec![src.id.clone()],
                });
                bodies.push(&src.svg);
                by_signature.insert(signature, slot);
                slot
            }
        };
        table.by_id.insert(src.id.clone(), slot);
    }

    Ok(table)
}

/// Keeps only the representative of every group, preserving input order.
pub fn representatives(sources: Vec<IconSource>, table: &DedupTable) -> Vec<IconSource> {
    sources
        .into_iter()
        .filter(|s| table.is_representative(&s.id))
        .collect()
}

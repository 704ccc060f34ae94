// Copyright 2025 RustFS Team
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Human-readable zone labels for layout roles.
//!
//! A label is an `adverb-noun` pair picked from the SHA-256 digest of the node
//! id, so the same node gets the same zone on every run.

use sha2::{Digest, Sha256};
use std::collections::BTreeSet;

const ADVERBS: [&str; 32] = [
    "boldly", "briskly", "calmly", "cheerfully", "deftly", "eagerly", "evenly", "fairly",
    "firmly", "freely", "gently", "gladly", "highly", "keenly", "kindly", "lightly", "loudly",
    "neatly", "nobly", "openly", "quickly", "quietly", "rarely", "safely", "sharply", "slowly",
    "smoothly", "softly", "steadily", "swiftly", "warmly", "wisely",
];

const NOUNS: [&str; 32] = [
    "anchor", "badger", "beacon", "birch", "canyon", "cedar", "comet", "coral", "delta",
    "ember", "falcon", "fjord", "glacier", "harbor", "heron", "island", "lagoon", "maple",
    "meadow", "mesa", "orchid", "otter", "pebble", "prairie", "quartz", "raven", "river",
    "summit", "thicket", "tundra", "valley", "willow",
];

/// Zone label derived from a node identifier.
pub fn zone_for(node_id: &str) -> String {
    let digest = Sha256::digest(node_id.as_bytes());
    let adverb = ADVERBS[usize::from(digest[0]) % ADVERBS.len()];
    let noun = NOUNS[usize::from(digest[1]) % NOUNS.len()];
    format!("{}-{}", adverb, noun)
}

/// Hands out zone labels that are unique within one layout.
#[derive(Default)]
pub struct ZoneAllocator {
    taken: BTreeSet<String>,
}

impl ZoneAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep a zone the node already holds in the cluster.
    ///
    /// Existing zones are shared as-is; only derived labels are de-duplicated.
    pub fn reserve(&mut self, zone: &str) -> String {
        self.taken.insert(zone.to_owned());
        zone.to_owned()
    }

    /// Derive a zone for `node_id`, suffixing `-2`, `-3`, ... on collision.
    pub fn allocate(&mut self, node_id: &str) -> String {
        let base = zone_for(node_id);
        let mut candidate = base.clone();
        let mut n = 2;
        while self.taken.contains(&candidate) {
            candidate = format!("{}-{}", base, n);
            n += 1;
        }
        self.taken.insert(candidate.clone());
        candidate
    }
}

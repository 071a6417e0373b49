//! Cross-source deduplication.

use std::cmp::Ordering;
use std::collections::HashMap;

use crate::models::Listing;

/// Merges listings that share a dedup key.
///
/// Within a group the representative is chosen by:
/// 1. a present `published_at` beats an absent one,
/// 2. the source registered first wins,
/// 3. the lexicographically smaller `url` wins.
///
/// Output keeps the order in which each group first appeared.
#[derive(Debug, Clone, Default)]
pub struct Deduplicator {
    rank: HashMap<String, usize>,
}

impl Deduplicator {
    /// `source_order` is the adapter registration order.
    pub fn new<I, S>(source_order: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut rank = HashMap::new();
        for (i, name) in source_order.into_iter().enumerate() {
            rank.entry(name.into()).or_insert(i);
        }
        Self { rank }
    }

    fn source_rank(&self, listing: &Listing) -> usize {
        self.rank
            .get(&listing.source_name)
            .copied()
            .unwrap_or(usize::MAX)
    }

    /// Ordering where `Less` means "better representative".
    fn preference(&self, a: &Listing, b: &Listing) -> Ordering {
        b.published_at
            .is_some()
            .cmp(&a.published_at.is_some())
            .then_with(|| self.source_rank(a).cmp(&self.source_rank(b)))
            .then_with(|| a.url.cmp(&b.url))
    }

    pub fn dedupe(&self, listings: Vec<Listing>) -> Vec<Listing> {
        let mut slot_of: HashMap<String, usize> = HashMap::new();
        let mut kept: Vec<Listing> = Vec::new();

        for listing in listings {
            match slot_of.get(&listing.dedup_key) {
                Some(&slot) => {
                    if self.preference(&listing, &kept[slot]) == Ordering::Less {
                        kept[slot] = listing;
                    }
                }
                None => {
                    slot_of.insert(listing.dedup_key.clone(), kept.len());
                    kept.push(listing);
                }
            }
        }
        kept
    }
}

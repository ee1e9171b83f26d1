use std::collections::{BTreeMap, HashMap};

use seqstore_types::{parse_address, PseudoAddress, RealDigest, Span};

/// Requester id to address text, as handed over by callers.
///
/// `None` or an empty string means the requester has no sequence yet.
pub type RequesterMap = BTreeMap<String, Option<String>>;

/// Requester id to parsed address; `None` where nothing can be fetched.
pub type ParsedRequests = BTreeMap<String, Option<PseudoAddress>>;

/// One fetch per distinct digest, in first-seen order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CoalescedRequests {
    order: Vec<RealDigest>,
    spans: HashMap<RealDigest, Span>,
}

impl CoalescedRequests {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one address into the plan.
    ///
    /// A bare address turns its digest's fetch into `Whole`, which then stays
    /// `Whole`. Ranged addresses widen the digest's interval to cover them.
    pub fn add(&mut self, address: &PseudoAddress) {
        let digest = address.digest();
        let span = address.span();
        match self.spans.get_mut(&digest) {
            Some(current) => *current = current.merge(span),
            None => {
                self.order.push(digest);
                self.spans.insert(digest, span);
            }
        }
    }

    pub fn get(&self, digest: &RealDigest) -> Option<Span> {
        self.spans.get(digest).copied()
    }

    /// Digests in the order they were first added.
    pub fn digests(&self) -> &[RealDigest] {
        &self.order
    }

    pub fn iter(&self) -> impl Iterator<Item = (RealDigest, Span)> + '_ {
        self.order.iter().map(|d| (*d, self.spans[d]))
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Order-free view, convenient for comparisons.
    pub fn as_map(&self) -> BTreeMap<RealDigest, Span> {
        self.iter().collect()
    }
}

impl<'a> FromIterator<&'a PseudoAddress> for CoalescedRequests {
    fn from_iter<I: IntoIterator<Item = &'a PseudoAddress>>(iter: I) -> Self {
        let mut plan = Self::new();
        for address in iter {
            plan.add(address);
        }
        plan
    }
}

/// Coalesce a batch of addresses into one fetch per digest.
pub fn coalesce<'a, I>(addresses: I) -> CoalescedRequests
where
    I: IntoIterator<Item = &'a PseudoAddress>,
{
    addresses.into_iter().collect()
}

/// Parse every requester's address.
///
/// Entries that are missing or do not parse become `None`; one bad entry
/// never fails the batch.
pub fn parse_requesters(requesters: &RequesterMap) -> ParsedRequests {
    requesters
        .iter()
        .map(|(id, address)| {
            let parsed = match parse_address(address.as_deref()) {
                Ok(parsed) => parsed,
                Err(e) => {
                    tracing::debug!(requester = %id, error = %e, "skipping unparseable address");
                    None
                }
            };
            (id.clone(), parsed)
        })
        .collect()
}

/// Coalesce the addresses present in `parsed`.
pub fn plan(parsed: &ParsedRequests) -> CoalescedRequests {
    coalesce(parsed.values().flatten())
}

use std::collections::{BTreeMap, HashMap};
use std::future::Future;

use bytes::Bytes;
use futures::future::try_join_all;
use seqstore_types::{ByteRange, RealDigest, Span};

use crate::coalesce::{parse_requesters, plan, CoalescedRequests, ParsedRequests, RequesterMap};

/// Content fetched per digest, holding whatever span the plan asked for.
pub type FetchedContent = HashMap<RealDigest, Bytes>;

/// Requester id to its resolved content; `None` where nothing was fetchable.
pub type ResolvedMap = BTreeMap<String, Option<Bytes>>;

/// Issue one fetch per planned digest, all concurrently.
///
/// The first failure fails the whole batch.
pub async fn fetch_coalesced<F, Fut, E>(
    requests: &CoalescedRequests,
    fetch: F,
) -> Result<FetchedContent, E>
where
    F: Fn(RealDigest, Span) -> Fut,
    Fut: Future<Output = Result<Bytes, E>>,
{
    let fetches = requests.iter().map(|(digest, span)| {
        let pending = fetch(digest, span);
        async move { pending.await.map(|content| (digest, content)) }
    });
    let fetched = try_join_all(fetches).await?;
    tracing::debug!(digests = fetched.len(), "fetched coalesced batch");
    Ok(fetched.into_iter().collect())
}

/// Cut a requester's content out of what was fetched for its digest.
///
/// `fetched` is the span the fragment was read with. A requester with its
/// own range always gets exactly that range back, even when the digest was
/// fetched whole for a sibling.
pub fn slice_for(wanted: Option<ByteRange>, fetched: Span, fragment: &Bytes) -> Bytes {
    match (wanted, fetched) {
        (None, _) => fragment.clone(),
        (Some(range), Span::Whole) => fragment.slice(range.clamp_to(fragment.len())),
        (Some(range), Span::Range(base)) => {
            let local = range.relative_to(base.start());
            fragment.slice(local.clamp_to(fragment.len()))
        }
    }
}

/// Hand every requester its own slice of the fetched content.
///
/// The result has exactly the keys of `parsed`.
pub fn remap(
    parsed: &ParsedRequests,
    requests: &CoalescedRequests,
    fetched: &FetchedContent,
) -> ResolvedMap {
    parsed
        .iter()
        .map(|(id, address)| {
            let content = address.as_ref().and_then(|address| {
                let digest = address.digest();
                let span = requests.get(&digest)?;
                let fragment = fetched.get(&digest)?;
                Some(slice_for(address.range(), span, fragment))
            });
            (id.clone(), content)
        })
        .collect()
}

/// Parse, coalesce, fetch and remap a whole requester map.
pub async fn resolve<F, Fut, E>(requesters: &RequesterMap, fetch: F) -> Result<ResolvedMap, E>
where
    F: Fn(RealDigest, Span) -> Fut,
    Fut: Future<Output = Result<Bytes, E>>,
{
    let parsed = parse_requesters(requesters);
    let requests = plan(&parsed);
    let fetched = fetch_coalesced(&requests, fetch).await?;
    Ok(remap(&parsed, &requests, &fetched))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use seqstore_crypto::ContentHasher;
    use seqstore_store::slice_span;
    use std::sync::Mutex;

    const SEQ: &[u8] = b"ACTAGCTAGCTAGCTGACTAGCTAGCTGATCGTAGCGATCTACTGATCAGCTACTGTACGTACGTGACTG";

    fn r(start: u64, end: u64) -> ByteRange {
        ByteRange::new(start, end).unwrap()
    }

    fn requesters(entries: &[(&str, Option<String>)]) -> RequesterMap {
        entries
            .iter()
            .map(|(id, a)| (id.to_string(), a.clone()))
            .collect()
    }

    /// Serves `SEQ` under its md5 and records every call.
    struct Recorder {
        digest: RealDigest,
        calls: Mutex<Vec<(RealDigest, Span)>>,
    }

    impl Recorder {
        fn new() -> Self {
            Self {
                digest: ContentHasher::MD5.hash(SEQ),
                calls: Mutex::new(Vec::new()),
            }
        }

        async fn fetch(&self, digest: RealDigest, span: Span) -> Result<Bytes, String> {
            self.calls.lock().unwrap().push((digest, span));
            if digest == self.digest {
                Ok(slice_span(&Bytes::from_static(SEQ), span))
            } else {
                Err(format!("missing {digest}"))
            }
        }
    }

    #[test]
    fn slice_for_whole_and_ranged_fetches() {
        let whole = Bytes::from_static(SEQ);
        assert_eq!(slice_for(None, Span::Whole, &whole), whole);
        assert_eq!(&slice_for(Some(r(20, 35)), Span::Whole, &whole)[..], &SEQ[20..35]);

        let fragment = whole.slice(10..40);
        assert_eq!(
            &slice_for(Some(r(20, 35)), Span::Range(r(10, 40)), &fragment)[..],
            &SEQ[20..35]
        );
        assert_eq!(
            &slice_for(Some(r(10, 40)), Span::Range(r(10, 40)), &fragment)[..],
            &SEQ[10..40]
        );
    }

    #[test]
    fn slice_for_clamps_short_fragment() {
        // Fetch asked for [60, 90) of 70 bytes and got 10 back.
        let fragment = Bytes::from_static(SEQ).slice(60..70);
        assert_eq!(
            &slice_for(Some(r(65, 90)), Span::Range(r(60, 90)), &fragment)[..],
            &SEQ[65..70]
        );
    }

    #[tokio::test]
    async fn one_fetch_per_digest_with_envelope() {
        let rec = Recorder::new();
        let h = rec.digest;
        let map = requesters(&[
            ("b1", Some(format!("{h}[0:10]"))),
            ("b2", Some(format!("{h}[30:40]"))),
        ]);

        let out = resolve(&map, |d, s| rec.fetch(d, s)).await.unwrap();
        assert_eq!(*rec.calls.lock().unwrap(), vec![(h, Span::Range(r(0, 40)))]);
        assert_eq!(out["b1"].as_deref(), Some(&SEQ[0..10]));
        assert_eq!(out["b2"].as_deref(), Some(&SEQ[30..40]));
    }

    #[tokio::test]
    async fn whole_fetch_still_reslices_each_requester() {
        let rec = Recorder::new();
        let h = rec.digest;
        let map = requesters(&[
            ("b1", Some(format!("{h}[0:10]"))),
            ("b2", Some(format!("{h}[5:20]"))),
            ("b3", Some(h.to_string())),
        ]);

        let out = resolve(&map, |d, s| rec.fetch(d, s)).await.unwrap();
        assert_eq!(*rec.calls.lock().unwrap(), vec![(h, Span::Whole)]);
        assert_eq!(out["b1"].as_deref(), Some(&SEQ[0..10]));
        assert_eq!(out["b2"].as_deref(), Some(&SEQ[5..20]));
        assert_eq!(out["b3"].as_deref(), Some(SEQ));
    }

    #[tokio::test]
    async fn missing_addresses_resolve_to_none() {
        let rec = Recorder::new();
        let h = rec.digest;
        let map = requesters(&[
            ("has", Some(format!("{h}[1:4]"))),
            ("null", None),
            ("empty", Some(String::new())),
            ("bad", Some("xyz".into())),
        ]);

        let out = resolve(&map, |d, s| rec.fetch(d, s)).await.unwrap();
        assert_eq!(out.len(), 4);
        assert_eq!(out["has"].as_deref(), Some(&SEQ[1..4]));
        assert_eq!(out["null"], None);
        assert_eq!(out["empty"], None);
        assert_eq!(out["bad"], None);
        assert_eq!(rec.calls.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn no_fetch_for_empty_plan() {
        let rec = Recorder::new();
        let map = requesters(&[("a", None)]);
        let out = resolve(&map, |d, s| rec.fetch(d, s)).await.unwrap();
        assert_eq!(out["a"], None);
        assert!(rec.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn fetch_failure_fails_batch() {
        let rec = Recorder::new();
        let other = ContentHasher::MD5.hash(b"absent");
        let map = requesters(&[
            ("ok", Some(rec.digest.to_string())),
            ("gone", Some(other.to_string())),
        ]);
        let err = resolve(&map, |d, s| rec.fetch(d, s)).await.unwrap_err();
        assert!(err.contains("missing"));
    }

    fn arb_case() -> impl Strategy<Value = (Vec<u8>, Vec<Option<(u64, u64)>>)> {
        prop::collection::vec(prop::sample::select(b"ACGT".to_vec()), 1..300).prop_flat_map(|content| {
            let len = content.len() as u64;
            let request = prop_oneof![
                1 => Just(None),
                5 => (0..len).prop_flat_map(move |s| (Just(s), s + 1..=len)).prop_map(Some),
            ];
            (Just(content), prop::collection::vec(request, 1..12))
        })
    }

    proptest! {
        #[test]
        fn prop_every_requester_gets_its_exact_slice((content, requests) in arb_case()) {
            let content = Bytes::from(content);
            let digest = ContentHasher::MD5.hash(&content);
            let map: RequesterMap = requests
                .iter()
                .enumerate()
                .map(|(i, req)| {
                    let address = match req {
                        None => digest.to_string(),
                        Some((s, e)) => format!("{digest}[{s}:{e}]"),
                    };
                    (format!("b{i}"), Some(address))
                })
                .collect();

            let fetch = |_: RealDigest, span: Span| {
                let content = content.clone();
                async move { Ok::<_, ()>(slice_span(&content, span)) }
            };
            let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
            let out = rt.block_on(resolve(&map, fetch)).unwrap();

            for (i, req) in requests.iter().enumerate() {
                let got = out[&format!("b{i}")].clone().unwrap();
                let want = match req {
                    None => content.clone(),
                    Some((s, e)) => content.slice(*s as usize..*e as usize),
                };
                prop_assert_eq!(got, want);
            }
        }
    }
}

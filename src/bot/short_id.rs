use md5::{Digest, Md5};

/// Length of a freshly minted short id, in hex characters
pub const SHORT_ID_LEN: usize = 8;

/// Derive the short id for a `(searchId, resultIndex)` pair.
///
/// Deterministic within and across runs; hex prefix of
/// `md5("{search_id}_{result_index}")`.
pub fn compress(search_id: &str, result_index: usize) -> String {
    digest_prefix(&format!("{search_id}_{result_index}"))
}

/// Mint a short id that does not alias another live batch.
///
/// `collides` reports whether a candidate is already registered to a
/// *different* batch. On collision the hash input is extended with a
/// rolling suffix until a free candidate appears, so two results never
/// silently share one id.
pub fn mint(search_id: &str, result_index: usize, collides: impl Fn(&str) -> bool) -> String {
    let candidate = compress(search_id, result_index);
    if !collides(&candidate) {
        return candidate;
    }

    for roll in 1u32.. {
        let candidate = digest_prefix(&format!("{search_id}_{result_index}_{roll}"));
        if !collides(&candidate) {
            return candidate;
        }
    }
    unreachable!("md5 candidate space exhausted");
}

fn digest_prefix(raw: &str) -> String {
    let digest = Md5::digest(raw.as_bytes());
    digest
        .iter()
        .take(SHORT_ID_LEN / 2)
        .map(|byte| format!("{byte:02x}"))
        .collect()
}

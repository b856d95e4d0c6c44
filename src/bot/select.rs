use std::collections::BTreeSet;

/// Widest span a single `start-end` fragment may cover. Anything wider is
/// treated as invalid instead of being enumerated.
const MAX_RANGE_SPAN: u32 = 10_000;

/// Outcome of parsing a free-text episode selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RangeSelection {
    /// Nothing but whitespace/commas; distinct from "nothing matched"
    Empty,
    /// Fragments were given but none resolved to a valid episode
    NoneValid { invalid: Vec<String> },
    /// At least one valid episode; `invalid` lists rejected fragments
    Selected {
        /// Ascending, de-duplicated episode indices
        indices: Vec<u32>,
        invalid: Vec<String>,
    },
}

/// Parse a selection expression like `"1-5,8,10-12"` against the set of
/// episode indices that actually exist.
///
/// Fragments are comma-separated; each is a single number or an inclusive
/// `start-end` range (bounds swapped when reversed). A fragment that fails
/// to parse is reported verbatim; a fragment that parses but reaches
/// outside `valid` contributes its valid subset and reports the rejected
/// indices alongside the fragment.
pub fn parse_selection(text: &str, valid: &BTreeSet<u32>) -> RangeSelection {
    let fragments: Vec<&str> = text
        .split(',')
        .map(str::trim)
        .filter(|frag| !frag.is_empty())
        .collect();

    if fragments.is_empty() {
        return RangeSelection::Empty;
    }

    let mut selected = BTreeSet::new();
    let mut invalid = Vec::new();

    for fragment in fragments {
        let Some((start, end)) = parse_fragment(fragment) else {
            invalid.push(fragment.to_string());
            continue;
        };

        if end - start > MAX_RANGE_SPAN {
            invalid.push(format!("{fragment} (range too large)"));
            continue;
        }

        let mut rejected = Vec::new();
        for index in start..=end {
            if valid.contains(&index) {
                selected.insert(index);
            } else {
                rejected.push(index.to_string());
            }
        }

        if !rejected.is_empty() {
            invalid.push(format!("{fragment} (invalid episodes: {})", rejected.join(", ")));
        }
    }

    if selected.is_empty() {
        RangeSelection::NoneValid { invalid }
    } else {
        RangeSelection::Selected {
            indices: selected.into_iter().collect(),
            invalid,
        }
    }
}

/// Parse one fragment into an inclusive `(start, end)` pair.
fn parse_fragment(fragment: &str) -> Option<(u32, u32)> {
    if let Some((left, right)) = fragment.split_once('-') {
        let start: u32 = left.trim().parse().ok()?;
        let end: u32 = right.trim().parse().ok()?;
        if start > end {
            Some((end, start))
        } else {
            Some((start, end))
        }
    } else {
        let single: u32 = fragment.parse().ok()?;
        Some((single, single))
    }
}

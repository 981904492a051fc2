use predictive_schemas::{BandedSuggestion, LearnEntry, PriorityBand};

/// Priority of the lowest score tier
pub const PRIORITY_LOW: u8 = 20;
/// Upper bound the tiers are spread towards
pub const PRIORITY_HIGH: u8 = 150;

/// Order one tag's learned entries and attach priority bands.
///
/// Output is descending by score, ties ascending by suggestion text. Each
/// distinct score is a tier; tier `i` (0 = lowest score) gets
/// `PRIORITY_LOW + i * ((PRIORITY_HIGH - PRIORITY_LOW) / tiers)`.
pub fn band_entries<'a, I>(entries: I) -> Vec<BandedSuggestion>
where
    I: IntoIterator<Item = &'a LearnEntry>,
{
    let mut entries: Vec<&LearnEntry> = entries.into_iter().collect();
    let scores = distinct_scores(entries.iter().map(|e| e.score));
    if scores.is_empty() {
        return Vec::new();
    }

    let tiers = scores.len();
    let step = usize::from(PRIORITY_HIGH - PRIORITY_LOW) / tiers;

    entries.sort_by(|a, b| {
        b.score
            .cmp(&a.score)
            .then_with(|| a.suggest.cmp(&b.suggest))
    });

    entries
        .into_iter()
        .map(|entry| {
            let tier = scores.partition_point(|&s| s < entry.score);
            let priority = usize::from(PRIORITY_LOW) + tier * step;
            BandedSuggestion {
                suggest: entry.suggest.clone(),
                score: entry.score,
                band: PriorityBand {
                    tier,
                    tiers,
                    priority: u8::try_from(priority).unwrap_or(PRIORITY_HIGH),
                },
            }
        })
        .collect()
}

/// Dense 1-based rank of each score among the distinct scores, in input order.
///
/// Equal scores share a rank and relative order is preserved.
pub fn dense_ranks(scores: &[u32]) -> Vec<u32> {
    let distinct = distinct_scores(scores.iter().copied());
    scores
        .iter()
        .map(|score| distinct.partition_point(|s| s < score) as u32 + 1)
        .collect()
}

fn distinct_scores(scores: impl Iterator<Item = u32>) -> Vec<u32> {
    let mut distinct: Vec<u32> = scores.collect();
    distinct.sort_unstable();
    distinct.dedup();
    distinct
}

/// Most frequent language in `languages`.
///
/// Ties go to the language whose first occurrence comes earliest, so the
/// result depends only on the input order.
pub fn majority_language<I, S>(languages: I) -> Option<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    // (language, count) in order of first occurrence
    let mut tally: Vec<(String, usize)> = Vec::new();
    for language in languages {
        let language = language.as_ref();
        match tally.iter_mut().find(|(seen, _)| seen == language) {
            Some((_, count)) => *count += 1,
            None => tally.push((language.to_string(), 1)),
        }
    }

    let mut best: Option<(String, usize)> = None;
    for (language, count) in tally {
        if best.as_ref().map_or(true, |(_, best_count)| count > *best_count) {
            best = Some((language, count));
        }
    }
    best.map(|(language, _)| language)
}

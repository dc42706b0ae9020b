//! Sentence boundary detection for English prose.
//!
//! A boundary is a run of `.`, `!` or `?` (optionally followed by closing
//! quotes or brackets) that is followed by whitespace or the end of the text.
//! A `.` does not end a sentence when:
//! - it belongs to a known abbreviation (`Dr.`, `vs.`, `Jan.`) or a dotted
//!   acronym (`U.S.`, `e.g.`);
//! - it follows a numbering prefix and a digit comes next (`No. 5`, `Fig. 3`);
//! - the next word starts with a lowercase letter (`... and so on`).
//!
//! Decimal numbers never split because no whitespace follows their dot.
//! Single newlines are not boundaries.

/// A sentence borrowed from the source document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sentence<'a> {
    /// Position in document order, starting at 0.
    pub index: usize,
    /// Sentence text with surrounding whitespace removed.
    pub text: &'a str,
    /// Byte offset of `text` within the original document.
    pub start: usize,
    /// Byte offset one past the end of `text`.
    pub end: usize,
}

const TERMINATORS: [char; 3] = ['.', '!', '?'];

const CLOSERS: [char; 9] = ['"', '\'', ')', ']', '}', '\u{201D}', '\u{2019}', '\u{BB}', '*'];

const OPENERS: [char; 8] = ['"', '\'', '(', '[', '{', '\u{201C}', '\u{2018}', '\u{AB}'];

/// Abbreviations that never end a sentence: titles, `vs`, and months.
const ABBREVIATIONS: &[&str] = &[
    "mr", "mrs", "ms", "dr", "prof", "sr", "jr", "st", "mt", "rev", "gen", "col", "lt", "sgt",
    "capt", "cmdr", "adm", "hon", "gov", "sen", "rep", "pres", "supt", "messrs", "vs", "jan",
    "feb", "apr", "jun", "jul", "aug", "sep", "sept", "oct", "nov", "dec", "approx", "dept",
    "univ", "est", "al", "cf",
];

/// Abbreviations that often close a sentence; they end one when a
/// capitalized word follows.
const SENTENCE_FINAL_ABBREVIATIONS: &[&str] = &["etc", "inc", "ltd", "co", "corp", "llc", "bros"];

/// Prefixes that do not end a sentence when a number follows.
const NUMBERING_PREFIXES: &[&str] = &[
    "no", "nos", "fig", "figs", "vol", "vols", "p", "pp", "ch", "sec", "art", "eq", "tab", "ref",
];

/// Split `text` into sentences.
///
/// Leading and trailing whitespace is ignored. Empty or whitespace-only input
/// yields an empty vector.
pub fn preprocess(text: &str) -> Vec<Sentence<'_>> {
    let lead = text.len() - text.trim_start().len();
    let body = text.trim();
    if body.is_empty() {
        return Vec::new();
    }

    let chars: Vec<(usize, char)> = body.char_indices().collect();
    let mut sentences = Vec::new();
    let mut start = 0usize;
    let mut i = 0usize;

    while i < chars.len() {
        let c = chars[i].1;
        if !TERMINATORS.contains(&c) {
            i += 1;
            continue;
        }

        // Extend over the terminator run and any closing punctuation.
        let run_start = i;
        let mut j = i + 1;
        while j < chars.len() && TERMINATORS.contains(&chars[j].1) {
            j += 1;
        }
        let run_end = j;
        while j < chars.len() && CLOSERS.contains(&chars[j].1) {
            j += 1;
        }

        if j >= chars.len() {
            // End of text; the trailing push below takes the remainder.
            break;
        }
        if !chars[j].1.is_whitespace() {
            i = j;
            continue;
        }

        let all_periods = chars[run_start..run_end].iter().all(|&(_, ch)| ch == '.');
        if all_periods && !is_boundary(body, &chars, run_start, run_end, j) {
            i = j;
            continue;
        }

        let cut = chars[j].0;
        push_sentence(&mut sentences, body, start, cut, lead);
        start = cut;
        i = j;
    }

    push_sentence(&mut sentences, body, start, body.len(), lead);
    sentences
}

/// Decide whether a run of periods at `run_start..run_end` ends a sentence.
/// `after` is the index of the whitespace following the run.
fn is_boundary(
    body: &str,
    chars: &[(usize, char)],
    run_start: usize,
    run_end: usize,
    after: usize,
) -> bool {
    let next = next_word_start(chars, after);

    if let Some(n) = next {
        if n.is_lowercase() {
            return false;
        }
    }

    // Ellipses only yield to the lowercase rule above.
    if run_end - run_start > 1 {
        return true;
    }

    let token = preceding_token(body, chars[run_start].0);
    if token.is_empty() {
        return true;
    }
    let lower = token.to_lowercase();

    if is_dotted_acronym(token) || ABBREVIATIONS.contains(&lower.as_str()) {
        return false;
    }
    if SENTENCE_FINAL_ABBREVIATIONS.contains(&lower.as_str()) {
        return next.is_some_and(|n| n.is_uppercase());
    }
    if NUMBERING_PREFIXES.contains(&lower.as_str()) && next.is_some_and(|n| n.is_ascii_digit()) {
        return false;
    }
    true
}

/// First character of the next word after position `from`, skipping
/// whitespace and opening punctuation.
fn next_word_start(chars: &[(usize, char)], from: usize) -> Option<char> {
    chars[from..]
        .iter()
        .map(|&(_, c)| c)
        .find(|c| !c.is_whitespace() && !OPENERS.contains(c))
}

/// The word immediately before byte offset `end`, without leading openers.
fn preceding_token(body: &str, end: usize) -> &str {
    let before = &body[..end];
    let start = before
        .rfind(char::is_whitespace)
        .map(|p| p + before[p..].chars().next().map_or(1, char::len_utf8))
        .unwrap_or(0);
    before[start..].trim_start_matches(|c: char| OPENERS.contains(&c))
}

/// `U.S`, `e.g`, `i.e`, `a.m`, `Ph.D`: dot-separated runs of one or two letters.
fn is_dotted_acronym(token: &str) -> bool {
    token.contains('.')
        && token.split('.').all(|part| {
            let n = part.chars().count();
            (1..=2).contains(&n) && part.chars().all(char::is_alphabetic)
        })
}

fn push_sentence<'a>(
    sentences: &mut Vec<Sentence<'a>>,
    body: &'a str,
    from: usize,
    to: usize,
    lead: usize,
) {
    let raw = &body[from..to];
    let text = raw.trim();
    if text.is_empty() {
        return;
    }
    let offset = from + (raw.len() - raw.trim_start().len());
    sentences.push(Sentence {
        index: sentences.len(),
        text,
        start: lead + offset,
        end: lead + offset + text.len(),
    });
}

use thiserror::Error;

/// The post text contains no `$<digits>` pattern, so no payment amount can
/// be derived. Terminal for the job.
#[derive(Error, Debug, PartialEq)]
#[error("no payment amount found in text")]
pub struct MalformedAmountError;

/// Extracts the payment amount from a post.
///
/// The amount is the first run of ASCII digits immediately following a `$`.
/// Whole units only; `$15.50` parses as 15. Later matches are ignored.
pub fn parse_amount(text: &str) -> Result<u64, MalformedAmountError> {
    let bytes = text.as_bytes();
    for (i, b) in bytes.iter().enumerate() {
        if *b != b'$' {
            continue;
        }
        let digits: &str = text[i + 1..]
            .split(|c: char| !c.is_ascii_digit())
            .next()
            .unwrap_or("");
        if !digits.is_empty() {
            return digits.parse().map_err(|_| MalformedAmountError);
        }
    }
    Err(MalformedAmountError)
}

/// Extracts candidate recipient handles from a post.
///
/// Splits on whitespace and strips the leading `@` from every token that
/// carries one. Order of appearance and duplicates are preserved. No syntax
/// validation happens here: trailing punctuation stays attached to the
/// handle, which is a known source of directory misses.
pub fn extract_handles(text: &str) -> Vec<String> {
    text.split_whitespace()
        .filter_map(|token| token.strip_prefix('@'))
        .map(str::to_string)
        .collect()
}

//! Input interpretation: keyword matching, number extraction, and the
//! `funds:` / `alloc:` widget payloads.
//!
//! No NLU happens here. Phrases are matched as substrings of the
//! lower-cased utterance, short tokens such as "yes" or "no" as whole words.

use std::collections::BTreeMap;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;

/// Prefix of the fund-picker payload, e.g. `funds:us-lg,bond-ag`.
pub const FUNDS_PREFIX: &str = "funds:";
/// Prefix of the allocation payload, e.g. `alloc:us-lg:60,bond-ag:40`.
pub const ALLOC_PREFIX: &str = "alloc:";

static NUMBER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(\d+(?:\.\d+)?)").unwrap());
static PERCENT_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+(?:\.\d+)?)\s*%").unwrap());

/// One user turn: the trimmed utterance and its lower-cased form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Utterance {
    /// Trimmed, original casing. Used for display values and payload ids.
    pub raw: String,
    /// Trimmed and lower-cased. Used for keyword matching.
    pub normalized: String,
}

impl Utterance {
    pub fn new(text: &str) -> Self {
        let raw = text.trim().to_string();
        let normalized = raw.to_lowercase();
        Self { raw, normalized }
    }

    /// True if any phrase occurs anywhere in the normalized input.
    pub fn contains_any(&self, phrases: &[&str]) -> bool {
        phrases.iter().any(|p| self.normalized.contains(p))
    }

    /// True if any of `words` appears as a whole word.
    pub fn has_any_word(&self, words: &[&str]) -> bool {
        self.words().any(|w| words.contains(&w))
    }

    fn words(&self) -> impl Iterator<Item = &str> {
        self.normalized
            .split(|c: char| !(c.is_alphanumeric() || c == '\''))
            .filter(|w| !w.is_empty())
    }

    /// Input with no letters or digits at all, e.g. `???`.
    pub fn is_noise(&self) -> bool {
        !self.normalized.chars().any(char::is_alphanumeric)
    }

    /// First decimal or integer found anywhere in the input.
    pub fn first_number(&self) -> Option<Decimal> {
        capture_decimal(&NUMBER, &self.normalized)
    }

    /// First number written with a percent sign, e.g. `8 %` or `8.5%`.
    pub fn percent_number(&self) -> Option<Decimal> {
        capture_decimal(&PERCENT_NUMBER, &self.normalized)
    }

    /// First number, truncated to a whole value. Used for ages.
    pub fn first_whole_number(&self) -> Option<i64> {
        self.first_number().and_then(|n| n.trunc().to_i64())
    }
}

fn capture_decimal(re: &Regex, text: &str) -> Option<Decimal> {
    let digits = re.captures(text)?.get(1)?.as_str();
    Decimal::from_str(digits).ok()
}

fn strip_prefix_ignore_case<'a>(text: &'a str, prefix: &str) -> Option<&'a str> {
    let head = text.get(..prefix.len())?;
    if head.eq_ignore_ascii_case(prefix) {
        text.get(prefix.len()..)
    } else {
        None
    }
}

/// Parse a `funds:` payload into fund ids.
///
/// Returns `None` when the prefix is missing. Blank ids are dropped, so a
/// payload like `funds: , ` yields an empty list.
pub fn parse_fund_ids(raw: &str) -> Option<Vec<String>> {
    let body = strip_prefix_ignore_case(raw.trim(), FUNDS_PREFIX)?;
    Some(
        body.split(',')
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(str::to_string)
            .collect(),
    )
}

/// Why an `alloc:` payload could not be read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PayloadError {
    MissingPrefix,
    /// A pair without an `id:value` shape or with a non-numeric value.
    MalformedPair(String),
    Empty,
}

/// Parse an `alloc:` payload into `(id, percentage)` pairs, in input order.
///
/// Each pair splits on its last colon; a trailing `%` on the value is
/// tolerated.
pub fn parse_allocations(raw: &str) -> Result<Vec<(String, Decimal)>, PayloadError> {
    let body = strip_prefix_ignore_case(raw.trim(), ALLOC_PREFIX).ok_or(PayloadError::MissingPrefix)?;

    let mut pairs = Vec::new();
    for pair in body.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let (id, value) = pair
            .rsplit_once(':')
            .ok_or_else(|| PayloadError::MalformedPair(pair.to_string()))?;
        let id = id.trim();
        let value = value.trim().trim_end_matches('%').trim();
        if id.is_empty() {
            return Err(PayloadError::MalformedPair(pair.to_string()));
        }
        let pct = Decimal::from_str(value)
            .map_err(|_| PayloadError::MalformedPair(pair.to_string()))?;
        pairs.push((id.to_string(), pct));
    }

    if pairs.is_empty() {
        return Err(PayloadError::Empty);
    }
    Ok(pairs)
}

/// Split 100% evenly across `ids` in whole percentages. The remainder goes
/// one point each to the first ids, so three funds get 34/33/33.
pub fn even_split(ids: &[String]) -> BTreeMap<String, Decimal> {
    if ids.is_empty() {
        return BTreeMap::new();
    }
    let count = ids.len() as u32;
    let base = 100 / count;
    let remainder = (100 % count) as usize;

    ids.iter()
        .enumerate()
        .map(|(i, id)| {
            let share = if i < remainder { base + 1 } else { base };
            (id.clone(), Decimal::from(share))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn utterance_trims_and_lowercases() {
        let u = Utterance::new("  I Want To ENROLL \n");
        assert_eq!(u.raw, "I Want To ENROLL");
        assert_eq!(u.normalized, "i want to enroll");
    }

    #[test]
    fn whole_word_matching_ignores_substrings() {
        let u = Utterance::new("I know, enroll me now");
        assert!(!u.has_any_word(&["no"]));
        assert!(u.has_any_word(&["now"]));
        assert!(Utterance::new("No, not yet").has_any_word(&["no"]));
        assert!(Utterance::new("yes!").has_any_word(&["yes"]));
    }

    #[test]
    fn noise_detection() {
        assert!(Utterance::new("???").is_noise());
        assert!(Utterance::new("   ").is_noise());
        assert!(!Utterance::new("ok").is_noise());
        assert!(!Utterance::new("42").is_noise());
    }

    #[test]
    fn first_number_takes_leftmost() {
        assert_eq!(Utterance::new("retire at 67 or 70").first_number(), Some(dec!(67)));
        assert_eq!(Utterance::new("about 8.5").first_number(), Some(dec!(8.5)));
        assert_eq!(Utterance::new("no idea").first_number(), None);
    }

    #[test]
    fn percent_number_prefers_suffixed_value() {
        let u = Utterance::new("in 2 years maybe 10%");
        assert_eq!(u.percent_number(), Some(dec!(10)));
        assert_eq!(u.first_number(), Some(dec!(2)));
        assert_eq!(Utterance::new("6 %").percent_number(), Some(dec!(6)));
        assert_eq!(Utterance::new("6").percent_number(), None);
    }

    #[test]
    fn whole_number_truncates() {
        assert_eq!(Utterance::new("34.9").first_whole_number(), Some(34));
        assert_eq!(Utterance::new("I'm 41").first_whole_number(), Some(41));
    }

    #[test]
    fn fund_ids_filter_blanks() {
        assert_eq!(
            parse_fund_ids("funds: us-lg , ,bond-ag,"),
            Some(vec!["us-lg".to_string(), "bond-ag".to_string()])
        );
        assert_eq!(parse_fund_ids("FUNDS:us-lg"), Some(vec!["us-lg".to_string()]));
        assert_eq!(parse_fund_ids("funds:"), Some(vec![]));
        assert_eq!(parse_fund_ids("us-lg,bond-ag"), None);
    }

    #[test]
    fn allocations_parse_pairs_in_order() {
        let pairs = parse_allocations("alloc:us-lg:60, bond-ag:40%").unwrap();
        assert_eq!(
            pairs,
            vec![
                ("us-lg".to_string(), dec!(60)),
                ("bond-ag".to_string(), dec!(40)),
            ]
        );
    }

    #[test]
    fn allocations_reject_malformed_payloads() {
        assert_eq!(parse_allocations("us-lg:60"), Err(PayloadError::MissingPrefix));
        assert_eq!(parse_allocations("alloc:"), Err(PayloadError::Empty));
        assert_eq!(
            parse_allocations("alloc:us-lg"),
            Err(PayloadError::MalformedPair("us-lg".to_string()))
        );
        assert_eq!(
            parse_allocations("alloc:us-lg:lots"),
            Err(PayloadError::MalformedPair("us-lg:lots".to_string()))
        );
        assert_eq!(
            parse_allocations("alloc::50"),
            Err(PayloadError::MalformedPair(":50".to_string()))
        );
    }

    #[test]
    fn even_split_distributes_remainder_first() {
        let two = even_split(&["us-lg".into(), "bond-ag".into()]);
        assert_eq!(two["us-lg"], dec!(50));
        assert_eq!(two["bond-ag"], dec!(50));

        let three = even_split(&["a".into(), "b".into(), "c".into()]);
        assert_eq!(three["a"], dec!(34));
        assert_eq!(three["b"], dec!(33));
        assert_eq!(three["c"], dec!(33));

        let six = even_split(&(1..=6).map(|i| i.to_string()).collect::<Vec<_>>());
        let total: Decimal = six.values().copied().sum();
        assert_eq!(total, dec!(100));
        assert_eq!(six["1"], dec!(17));
        assert_eq!(six["5"], dec!(16));
    }
}

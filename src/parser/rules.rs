// src/parser/rules.rs
//! Rule-table address parser.
//!
//! Works on normalized text (`normalize::normalize_str` output). Comma-separated segments
//! are classified left to right:
//! - whole-segment country / state / postcode matches
//! - trailing country, postcode and state peeled off a segment
//! - a leading number token followed by road words → `house_number` + `road`
//! - a road keyword with a trailing number ("rua augusta 10") → `road` + `house_number`
//!
//! Unlabeled ("free") segments are resolved last: free text before the road is a `house`
//! (building name), the last free text after it is the `city`, anything in between is a
//! `city_district`. Output is a pure function of the input.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;

use super::AddressParser;
use crate::components::{ComponentLabel, ParsedFragment};

static RE_HOUSE_NUMBER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\d{1,5}[a-z]?(?:[-/]\d{0,4}[a-z]?)?$").expect("house number regex")
});
static RE_POSTCODE_STRONG: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:\d{5}(?:-\d{4})?|\d{4}-\d{3}|\d{3}-\d{4}|\d{6})$").expect("postcode regex")
});
static RE_POSTCODE_WEAK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{4}$").expect("weak postcode regex"));
static RE_UK_OUTWARD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z]{1,2}\d[a-z\d]?$").expect("uk outward regex"));
static RE_UK_INWARD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d[a-z]{2}$").expect("uk inward regex"));
static RE_CA_FSA: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[a-z]\d[a-z]$").expect("ca fsa regex"));
static RE_CA_LDU: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d[a-z]\d$").expect("ca ldu regex"));

static COUNTRIES: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "usa", "us", "united states", "united states of america", "canada", "mexico", "uk",
        "united kingdom", "great britain", "england", "scotland", "wales", "ireland", "france",
        "germany", "deutschland", "spain", "espana", "portugal", "italy", "italia",
        "netherlands", "belgium", "switzerland", "schweiz", "austria", "poland", "sweden",
        "norway", "denmark", "finland", "japan", "china", "korea", "south korea",
        "republic of korea", "india", "australia", "new zealand", "brazil", "brasil",
        "argentina", "chile", "colombia", "peru", "south africa", "turkey", "greece",
        "russia", "ukraine", "czechia", "czech republic", "hungary", "romania",
    ]
    .into_iter()
    .collect()
});

static STATES: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        // US
        "al", "ak", "az", "ar", "ca", "co", "ct", "de", "fl", "ga", "hi", "id", "il", "in",
        "ia", "ks", "ky", "la", "me", "md", "ma", "mi", "mn", "ms", "mo", "mt", "ne", "nv",
        "nh", "nj", "nm", "ny", "nc", "nd", "oh", "ok", "or", "pa", "ri", "sc", "sd", "tn",
        "tx", "ut", "vt", "va", "wa", "wv", "wi", "wy", "dc", "alabama", "alaska", "arizona",
        "arkansas", "california", "colorado", "connecticut", "delaware", "florida", "georgia",
        "hawaii", "idaho", "illinois", "indiana", "iowa", "kansas", "kentucky", "louisiana",
        "maine", "maryland", "massachusetts", "michigan", "minnesota", "mississippi",
        "missouri", "montana", "nebraska", "nevada", "new hampshire", "new jersey",
        "new mexico", "north carolina", "north dakota", "ohio", "oklahoma", "oregon",
        "pennsylvania", "rhode island", "south carolina", "south dakota", "tennessee", "texas",
        "utah", "vermont", "virginia", "washington", "west virginia", "wisconsin", "wyoming",
        // Canada
        "on", "qc", "bc", "ab", "mb", "sk", "ns", "nb", "nl", "pe", "ontario", "quebec",
        "british columbia", "alberta", "manitoba", "saskatchewan", "nova scotia",
        "new brunswick",
    ]
    .into_iter()
    .collect()
});

/// Road words that close a road name ("main st").
const ROAD_SUFFIXES: &[&str] = &[
    "st", "street", "ave", "av", "avenue", "rd", "road", "blvd", "boulevard", "dr", "drive",
    "ln", "lane", "way", "ct", "court", "pl", "place", "sq", "square", "ter", "terrace", "hwy",
    "highway", "pkwy", "parkway", "cir", "circle", "row", "close", "crescent", "strasse",
    "straße", "str", "weg", "gasse", "allee", "platz", "ring", "damm", "ro", "gil", "daero",
];

/// Road words that open a road name ("rua augusta").
const ROAD_PREFIXES: &[&str] = &[
    "rua", "avenida", "calle", "carrer", "camino", "via", "viale", "rue", "chemin", "travessa",
    "largo", "praca", "plaza", "ulica", "ul",
];

/// Token endings that mark a fused road name ("bahnhofstrasse", "teheran-ro").
const ROAD_FUSED_ENDINGS: &[&str] = &[
    "strasse", "straße", "str", "weg", "gasse", "platz", "-ro", "-gil",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RoadWord {
    Prefix,
    Suffix,
}

fn road_word(token: &str) -> Option<RoadWord> {
    if ROAD_PREFIXES.contains(&token) {
        return Some(RoadWord::Prefix);
    }
    if ROAD_SUFFIXES.contains(&token) {
        return Some(RoadWord::Suffix);
    }
    if token.chars().count() > 5 && ROAD_FUSED_ENDINGS.iter().any(|e| token.ends_with(e)) {
        return Some(RoadWord::Suffix);
    }
    None
}

fn is_house_number(t: &str) -> bool {
    RE_HOUSE_NUMBER.is_match(t)
}

/// Number of trailing tokens forming a postcode (0 if none).
fn trailing_postcode_len(toks: &[&str], allow_weak: bool) -> usize {
    let n = toks.len();
    if n >= 2 {
        let (a, b) = (toks[n - 2], toks[n - 1]);
        if (RE_UK_OUTWARD.is_match(a) && RE_UK_INWARD.is_match(b))
            || (RE_CA_FSA.is_match(a) && RE_CA_LDU.is_match(b))
        {
            return 2;
        }
    }
    match toks.last() {
        Some(t) if RE_POSTCODE_STRONG.is_match(t) => 1,
        Some(t) if allow_weak && RE_POSTCODE_WEAK.is_match(t) => 1,
        _ => 0,
    }
}

fn is_postcode_segment(toks: &[&str]) -> bool {
    !toks.is_empty() && trailing_postcode_len(toks, true) == toks.len()
}

/// Number of trailing tokens naming a country (up to 4), 0 if none.
fn trailing_country_len(toks: &[&str]) -> usize {
    (1..=toks.len().min(4))
        .rev()
        .find(|&k| COUNTRIES.contains(toks[toks.len() - k..].join(" ").as_str()))
        .unwrap_or(0)
}

#[derive(Debug, Clone)]
struct Piece {
    label: Option<ComponentLabel>,
    value: String,
}

impl Piece {
    fn labeled(label: ComponentLabel, toks: &[&str]) -> Self {
        Self {
            label: Some(label),
            value: toks.join(" "),
        }
    }

    fn free(toks: &[&str]) -> Self {
        Self {
            label: None,
            value: toks.join(" "),
        }
    }
}

/// Deterministic heuristic parser backed by small keyword tables.
#[derive(Debug, Clone, Copy, Default)]
pub struct RuleParser;

impl RuleParser {
    pub fn new() -> Self {
        Self
    }

    fn analyze_segment(toks: &[&str], first: bool) -> Vec<Piece> {
        let joined = toks.join(" ");
        if COUNTRIES.contains(joined.as_str()) {
            return vec![Piece::labeled(ComponentLabel::Country, toks)];
        }
        if STATES.contains(joined.as_str()) && !first {
            return vec![Piece::labeled(ComponentLabel::State, toks)];
        }
        if is_postcode_segment(toks) && !(first && toks.len() == 1 && is_house_number(toks[0])) {
            return vec![Piece::labeled(ComponentLabel::Postcode, toks)];
        }

        let mut head: Vec<Piece> = Vec::new();
        let mut tail: Vec<Piece> = Vec::new();
        let mut rest = toks;

        let k = trailing_country_len(rest);
        if k > 0 && k < rest.len() {
            tail.push(Piece::labeled(ComponentLabel::Country, &rest[rest.len() - k..]));
            rest = &rest[..rest.len() - k];
        }

        let mut peeled_postcode = false;
        let k = trailing_postcode_len(rest, !first);
        if k > 0 && k < rest.len() {
            tail.push(Piece::labeled(ComponentLabel::Postcode, &rest[rest.len() - k..]));
            rest = &rest[..rest.len() - k];
            peeled_postcode = true;
        }

        if (rest.len() > 1 && !first) || (peeled_postcode && !rest.is_empty()) {
            if let Some(last) = rest.last() {
                if STATES.contains(*last) {
                    tail.push(Piece::labeled(ComponentLabel::State, &rest[rest.len() - 1..]));
                    rest = &rest[..rest.len() - 1];
                }
            }
        }

        if !first
            && rest.len() > 1
            && (RE_POSTCODE_STRONG.is_match(rest[0]) || RE_POSTCODE_WEAK.is_match(rest[0]))
        {
            head.push(Piece::labeled(ComponentLabel::Postcode, &rest[..1]));
            rest = &rest[1..];
        }

        head.extend(Self::street_pieces(rest, first));
        tail.reverse();
        head.extend(tail);
        head
    }

    /// House number / road split for what remains of a segment.
    fn street_pieces(toks: &[&str], first: bool) -> Vec<Piece> {
        if toks.is_empty() {
            return Vec::new();
        }
        let has_road_word = toks.iter().any(|t| road_word(t).is_some());

        if toks.len() > 1 && is_house_number(toks[0]) && (has_road_word || first) {
            let mut out = vec![Piece::labeled(ComponentLabel::HouseNumber, &toks[..1])];
            out.extend(Self::road_pieces(&toks[1..]));
            return out;
        }

        if has_road_word && toks.len() > 1 {
            if let Some(last) = toks.last() {
                if is_house_number(last) {
                    let mut out = Self::road_pieces(&toks[..toks.len() - 1]);
                    out.push(Piece::labeled(ComponentLabel::HouseNumber, &toks[toks.len() - 1..]));
                    return out;
                }
            }
        }

        if has_road_word {
            return Self::road_pieces(toks);
        }

        if toks.len() == 1 && is_house_number(toks[0]) {
            return vec![Piece::labeled(ComponentLabel::HouseNumber, toks)];
        }

        vec![Piece::free(toks)]
    }

    /// Road text, split after a closing road word so trailing words stay free (city).
    fn road_pieces(toks: &[&str]) -> Vec<Piece> {
        let first_road = toks.iter().position(|t| road_word(t).is_some());
        match first_road {
            Some(p) if road_word(toks[p]) == Some(RoadWord::Suffix) && p + 1 < toks.len() => {
                vec![
                    Piece::labeled(ComponentLabel::Road, &toks[..=p]),
                    Piece::free(&toks[p + 1..]),
                ]
            }
            _ => vec![Piece::labeled(ComponentLabel::Road, toks)],
        }
    }

    /// Assign labels to free pieces relative to the first road piece.
    fn resolve_free(pieces: &mut [Piece]) {
        let road_pos = pieces
            .iter()
            .position(|p| p.label == Some(ComponentLabel::Road));
        let after_start = road_pos.map(|r| r + 1).unwrap_or(0);

        if let Some(r) = road_pos {
            for p in pieces[..r].iter_mut().filter(|p| p.label.is_none()) {
                p.label = Some(ComponentLabel::House);
            }
        }

        let free_after: Vec<usize> = (after_start..pieces.len())
            .filter(|&i| pieces[i].label.is_none())
            .collect();
        if let Some((&last, earlier)) = free_after.split_last() {
            pieces[last].label = Some(ComponentLabel::City);
            for &i in earlier {
                pieces[i].label = Some(ComponentLabel::CityDistrict);
            }
        }
    }
}

impl AddressParser for RuleParser {
    fn parse(&self, normalized: &str) -> Vec<ParsedFragment> {
        let segments: Vec<Vec<&str>> = normalized
            .split(',')
            .map(|s| s.split_whitespace().collect::<Vec<_>>())
            .filter(|toks| !toks.is_empty())
            .collect();

        let mut pieces: Vec<Piece> = segments
            .iter()
            .enumerate()
            .flat_map(|(i, toks)| Self::analyze_segment(toks, i == 0))
            .filter(|p| !p.value.is_empty())
            .collect();

        Self::resolve_free(&mut pieces);

        pieces
            .into_iter()
            .filter_map(|p| p.label.map(|label| ParsedFragment::new(p.value, label)))
            .collect()
    }

    fn name(&self) -> &'static str {
        "rules"
    }
}

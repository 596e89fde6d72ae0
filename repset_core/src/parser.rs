//! Free-text exercise suggestion parser.
//!
//! Text from the generation service is loosely formatted, e.g.
//! `"1. Squats - 12-15 reps, 3 sets"` or `"Plank (30-45 seconds)"`. Each
//! non-blank line is run through an ordered list of [`Rule`]s that pull out
//! sets and reps and strip what they matched, then the remaining text is
//! cleaned into an exercise name. A line that matches nothing still yields a
//! best-effort suggestion with empty counts; no line can fail the batch.

use crate::Suggestion;
use once_cell::sync::Lazy;
use regex::Regex;

/// Substrings that mark a movement as bodyweight
///
/// Compared after folding both sides to lowercase alphanumerics, so
/// `"Push ups"` matches `"push-up"`.
pub static BODYWEIGHT_KEYWORDS: &[&str] = &[
    "push-up",
    "pull-up",
    "chin-up",
    "squat",
    "lunge",
    "plank",
    "burpee",
    "jumping jack",
    "jump jack",
    "mountain climber",
    "sit-up",
    "crunch",
    "leg raise",
    "dip",
    "wall sit",
    "calf raise",
    "glute bridge",
    "hip thrust",
    "pistol squat",
    "handstand",
    "muscle-up",
    "diamond push-up",
    "wide push-up",
    "pike push-up",
    "incline push-up",
    "decline push-up",
    "hindu push-up",
    "dive bomber",
    "superman",
    "bird dog",
    "dead bug",
    "reverse lunge",
    "walking lunge",
    "side lunge",
    "curtsy lunge",
    "jump squat",
    "box jump",
    "step-up",
    "single leg",
    "one leg",
    "bodyweight",
    "body weight",
];

fn compile(pattern: &str) -> Regex {
    Regex::new(pattern).expect("built-in pattern is valid")
}

static LIST_BULLET: Lazy<Regex> = Lazy::new(|| compile(r"^[-*+]\s*"));
static LIST_NUMBER: Lazy<Regex> = Lazy::new(|| compile(r"^\d+[.)]\s*"));
static SETS: Lazy<Regex> = Lazy::new(|| compile(r"(?i)\s*,?\s*(\d+)\s*sets?\b"));
static TIME_RANGE: Lazy<Regex> = Lazy::new(|| {
    compile(r"(?i)\s*(?:-\s*)?(\d+)\s*-\s*\d+\s*(?:seconds?|secs?|minutes?|mins?).*$")
});
static REPS_RANGE: Lazy<Regex> =
    Lazy::new(|| compile(r"(?i)\s*(?:[-:]\s*)?(\d+)\s*-\s*\d+\s*rep(?:etitions?|s)?\b"));
static REPS: Lazy<Regex> =
    Lazy::new(|| compile(r"(?i)\s*(?:[-:]\s*)?(\d+)\s*rep(?:etitions?|s)?\b"));
static PARENTHETICAL: Lazy<Regex> = Lazy::new(|| compile(r"\s*\(([^)]*)\)"));

static SEPARATORS: Lazy<Regex> = Lazy::new(|| compile(r"[-:()×]"));
static TIMES_TOKEN: Lazy<Regex> = Lazy::new(|| compile(r"(?i)\b\d*x\d*\b"));
static LONG_NUMBER: Lazy<Regex> = Lazy::new(|| compile(r"\b\d{3,}\b"));
static QUALIFIER: Lazy<Regex> =
    Lazy::new(|| compile(r"(?i)\bper\s+(?:leg|side|arm|hand|foot)s?\b"));
static TRAILING_NUMBERS: Lazy<Regex> = Lazy::new(|| compile(r"(?:\s+\d+)+\s*$"));
static WHITESPACE: Lazy<Regex> = Lazy::new(|| compile(r"\s+"));

/// Intermediate state of one line as it moves through the rules
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LineState {
    pub text: String,
    pub reps: Option<u32>,
    pub sets: Option<u32>,
    pub time_based: bool,
}

impl LineState {
    pub fn new(line: &str) -> Self {
        Self {
            text: line.trim().to_string(),
            ..Self::default()
        }
    }
}

/// One extraction-then-strip pass
#[derive(Clone, Copy)]
pub struct Rule {
    pub name: &'static str,
    pub apply: fn(&mut LineState),
}

/// Rules in the order they run against every line
pub const RULES: &[Rule] = &[
    Rule {
        name: "list_marker",
        apply: strip_list_marker,
    },
    Rule {
        name: "sets",
        apply: extract_sets,
    },
    Rule {
        name: "time_range",
        apply: extract_time_range,
    },
    Rule {
        name: "reps",
        apply: extract_reps,
    },
    Rule {
        name: "parenthetical",
        apply: extract_parenthetical,
    },
    Rule {
        name: "name_cleanup",
        apply: cleanup,
    },
];

/// Remove the first match of `re`, returning the remaining text and the
/// first capture group parsed as a number
fn cut_first(re: &Regex, text: &str) -> Option<(String, Option<u32>)> {
    let caps = re.captures(text)?;
    let whole = caps.get(0)?;
    let number = caps.get(1).and_then(|m| m.as_str().parse().ok());

    let mut rest = String::with_capacity(text.len());
    rest.push_str(&text[..whole.start()]);
    rest.push_str(&text[whole.end()..]);
    Some((rest, number))
}

fn first_number(re: &Regex, text: &str) -> Option<u32> {
    re.captures(text)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

fn strip_list_marker(state: &mut LineState) {
    let text = LIST_BULLET.replace(&state.text, "");
    let text = LIST_NUMBER.replace(&text, "");
    state.text = text.trim().to_string();
}

fn extract_sets(state: &mut LineState) {
    if let Some((rest, sets)) = cut_first(&SETS, &state.text) {
        state.sets = sets;
        state.text = rest;
    }
}

// The first number of the range stands in for reps.
fn extract_time_range(state: &mut LineState) {
    if let Some((rest, seconds)) = cut_first(&TIME_RANGE, &state.text) {
        state.time_based = true;
        state.reps = seconds;
        state.text = rest;
    }
}

fn extract_reps(state: &mut LineState) {
    if state.time_based {
        return;
    }
    let found = cut_first(&REPS_RANGE, &state.text).or_else(|| cut_first(&REPS, &state.text));
    if let Some((rest, reps)) = found {
        state.reps = reps;
        state.text = rest;
    }
}

fn extract_parenthetical(state: &mut LineState) {
    let Some(caps) = PARENTHETICAL.captures(&state.text) else {
        return;
    };
    let content = caps.get(1).map_or("", |m| m.as_str());

    if state.reps.is_none() && !state.time_based {
        state.reps = first_number(&REPS_RANGE, content).or_else(|| first_number(&REPS, content));
    }
    if state.sets.is_none() {
        state.sets = first_number(&SETS, content);
    }

    if let Some((rest, _)) = cut_first(&PARENTHETICAL, &state.text) {
        state.text = rest;
    }
}

fn cleanup(state: &mut LineState) {
    state.text = clean_name(&state.text);
}

/// Turn leftover line text into a display name
///
/// Separators and standalone multiplication tokens become spaces, run-on
/// numbers of three or more digits and per-side qualifiers are dropped,
/// trailing bare numbers are stripped, whitespace is collapsed, and the first
/// character is upper-cased. Applying it twice gives the same result.
///
/// Only an `x` standing alone or between digits (`x`, `3x10`, `x5`) counts as
/// a multiplication sign. A letter `x` inside a word is kept, so
/// `"Dumbbell Extensions"` and `"Box Jump"` survive intact rather than losing
/// every `x` in the name.
pub fn clean_name(raw: &str) -> String {
    let text = SEPARATORS.replace_all(raw, " ");
    let text = TIMES_TOKEN.replace_all(&text, " ");
    let mut text = LONG_NUMBER.replace_all(&text, " ").into_owned();
    while QUALIFIER.is_match(&text) {
        text = QUALIFIER.replace_all(&text, " ").into_owned();
    }
    let text = TRAILING_NUMBERS.replace(&text, "");
    let text = WHITESPACE.replace_all(&text, " ");
    capitalize_first(text.trim())
}

fn capitalize_first(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn fold(text: &str) -> String {
    text.chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

/// True when the name contains any bodyweight keyword
pub fn is_bodyweight(name: &str) -> bool {
    let name = fold(name);
    BODYWEIGHT_KEYWORDS
        .iter()
        .any(|keyword| name.contains(&fold(keyword)))
}

/// Run every rule over one line, keeping the state after each
pub fn trace_line(line: &str) -> Vec<(&'static str, LineState)> {
    let mut state = LineState::new(line);
    RULES
        .iter()
        .map(|rule| {
            (rule.apply)(&mut state);
            (rule.name, state.clone())
        })
        .collect()
}

/// Parse a single line; `None` when nothing usable remains of the name
pub fn parse_line(line: &str) -> Option<Suggestion> {
    let mut state = LineState::new(line);
    for rule in RULES {
        (rule.apply)(&mut state);
    }

    if state.text.is_empty() {
        tracing::debug!("Dropped line with no usable name: {:?}", line);
        return None;
    }

    Some(Suggestion {
        is_bodyweight: is_bodyweight(&state.text),
        name: state.text,
        reps: state.reps,
        sets: state.sets,
    })
}

/// Parse generated text into suggestions, one per usable line
///
/// Blank lines are ignored. Missing reps/sets stay `None`; filling them in is
/// the caller's job.
pub fn parse_suggestions(text: &str) -> Vec<Suggestion> {
    let suggestions: Vec<Suggestion> = text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter_map(parse_line)
        .collect();

    tracing::debug!("Parsed {} suggestions", suggestions.len());
    suggestions
}

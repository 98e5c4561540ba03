// src/process/fuzzy.rs

use rapidfuzz::distance::indel;

/// Normalized Indel similarity in `0.0..=100.0`.
pub fn ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    ratio_chars(&a, &b)
}

fn ratio_chars(a: &[char], b: &[char]) -> f64 {
    let lensum = a.len() + b.len();
    if lensum == 0 {
        return 100.0;
    }
    let dist = indel::distance(a.iter().copied(), b.iter().copied());
    100.0 * (1.0 - dist as f64 / lensum as f64)
}

/// Best `ratio` of `short` against every alignment of it over `long`,
/// including the windows that hang off either edge.
fn best_alignment(short: &[char], long: &[char]) -> f64 {
    let m = short.len();
    let n = long.len();
    let mut best: f64 = 0.0;

    let mut consider = |window: &[char]| {
        let score = ratio_chars(short, window);
        if score > best {
            best = score;
        }
        best >= 100.0
    };

    // prefixes shorter than `short`
    for end in 1..m.min(n + 1) {
        if consider(&long[..end]) {
            return 100.0;
        }
    }
    // full-width windows
    for start in 0..=(n - m) {
        if consider(&long[start..start + m]) {
            return 100.0;
        }
    }
    // suffixes shorter than `short`
    for start in (n - m + 1)..n {
        if consider(&long[start..]) {
            return 100.0;
        }
    }
    best
}

/// Partial-ratio similarity on a 0..=100 scale: how well the shorter string
/// matches its best-aligned substring of the longer one. Case-sensitive.
pub fn partial_ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();

    match (a.is_empty(), b.is_empty()) {
        (true, true) => return 100.0,
        (true, false) | (false, true) => return 0.0,
        _ => {}
    }

    if a.len() < b.len() {
        best_alignment(&a, &b)
    } else if a.len() > b.len() {
        best_alignment(&b, &a)
    } else {
        best_alignment(&a, &b).max(best_alignment(&b, &a))
    }
}

//! Human-natural ordering of page names.
//!
//! `page2.jpg` sorts before `page10.jpg`: digit runs compare by value,
//! everything else compares case-insensitively.

use std::cmp::Ordering;

use crate::models::PageImage;

/// One run of a split page name
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SortToken {
    /// Lower-cased non-digit run (may be empty at the edges)
    Text(String),
    /// Digit run, kept as its digits so arbitrarily long numbers still compare
    Number(String),
}

impl SortToken {
    fn as_str(&self) -> &str {
        match self {
            SortToken::Text(s) | SortToken::Number(s) => s,
        }
    }
}

fn compare_numeric(a: &str, b: &str) -> Ordering {
    let a = a.trim_start_matches('0');
    let b = b.trim_start_matches('0');
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}

impl Ord for SortToken {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (SortToken::Number(a), SortToken::Number(b)) => compare_numeric(a, b),
            _ => self.as_str().cmp(other.as_str()),
        }
    }
}

impl PartialOrd for SortToken {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Split a name on maximal digit runs.
///
/// The sequence always alternates text/number and starts and ends with a text
/// token, so two keys line up position by position.
pub fn sort_key(name: &str) -> Vec<SortToken> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_digits = false;

    for c in name.chars() {
        let is_digit = c.is_ascii_digit();
        if is_digit != in_digits {
            let run = std::mem::take(&mut current);
            tokens.push(if in_digits {
                SortToken::Number(run)
            } else {
                SortToken::Text(run.to_lowercase())
            });
            in_digits = is_digit;
        }
        current.push(c);
    }

    tokens.push(if in_digits {
        SortToken::Number(current)
    } else {
        SortToken::Text(current.to_lowercase())
    });
    if in_digits {
        tokens.push(SortToken::Text(String::new()));
    }

    tokens
}

/// Compare two names the way a reader expects
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    // Vec's Ord is element-wise with the shorter prefix first.
    sort_key(a).cmp(&sort_key(b))
}

/// Sort names in natural order. Names that compare equal keep their input order.
pub fn order_names<S: AsRef<str>>(names: &mut [S]) {
    names.sort_by_cached_key(|n| sort_key(n.as_ref()));
}

/// Return the pages in natural order of their names
pub fn order(pages: Vec<PageImage>) -> Vec<PageImage> {
    let mut pages = pages;
    pages.sort_by_cached_key(|p| sort_key(&p.name));
    pages
}

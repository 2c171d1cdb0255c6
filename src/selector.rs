//! Page selection parsing
//!
//! Users pick the pages to sign with one of three textual forms:
//! - `all` → every page
//! - `2-5` → pages 2 through 5 inclusive
//! - `1,3,5` → exactly those pages
//!
//! Page numbers are 1-based. Any integer is accepted here; zero, negative
//! numbers and numbers past the end of the document simply never match a page.

use std::collections::BTreeSet;
use std::fmt;
use std::num::IntErrorKind;
use std::str::FromStr;
use crate::error::{Error, Result};

/// Which pages of a document receive the signature
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum PageSelector {
    /// Every page
    #[default]
    All,
    /// Inclusive range of pages; empty when start > end
    Range(i64, i64),
    /// An explicit set of pages
    Specific(BTreeSet<i64>),
}

impl PageSelector {
    /// Check if a 1-based page number is selected
    pub fn includes(&self, page: u32) -> bool {
        let page = i64::from(page);
        match self {
            PageSelector::All => true,
            PageSelector::Range(start, end) => (*start..=*end).contains(&page),
            PageSelector::Specific(pages) => pages.contains(&page),
        }
    }

    /// Selected page numbers that exist in a document with `page_count` pages
    pub fn selected_pages(&self, page_count: u32) -> Vec<u32> {
        (1..=page_count).filter(|&page| self.includes(page)).collect()
    }

    /// Parse a `<start>-<end>` range such as `"1-5"`
    pub fn parse_range(text: &str) -> Result<Self> {
        let parts: Vec<&str> = text.trim().split('-').collect();
        if parts.len() != 2 {
            return Err(Error::InvalidPageSelector(format!(
                "expected a range like 1-5, got {:?}",
                text
            )));
        }

        let start = parse_page_number(parts[0])?;
        let end = parse_page_number(parts[1])?;
        Ok(PageSelector::Range(start, end))
    }

    /// Parse a comma-separated page list such as `"1,3,5"`
    pub fn parse_specific(text: &str) -> Result<Self> {
        let pages = text
            .split(',')
            .map(parse_page_number)
            .collect::<Result<BTreeSet<i64>>>()?;
        Ok(PageSelector::Specific(pages))
    }
}

/// Parse a single page number, ignoring surrounding whitespace
///
/// Integers too large for `i64` saturate.
fn parse_page_number(text: &str) -> Result<i64> {
    let text = text.trim();
    match text.parse::<i64>() {
        Ok(number) => Ok(number),
        Err(e) if *e.kind() == IntErrorKind::PosOverflow => Ok(i64::MAX),
        Err(e) if *e.kind() == IntErrorKind::NegOverflow => Ok(i64::MIN),
        Err(_) => Err(Error::InvalidPageSelector(format!("not a page number: {:?}", text))),
    }
}

impl FromStr for PageSelector {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();

        if s.eq_ignore_ascii_case("all") {
            return Ok(PageSelector::All);
        }

        // A list may hold negative numbers, so only comma-free text is a range
        if s.contains('-') && !s.contains(',') {
            return PageSelector::parse_range(s);
        }

        PageSelector::parse_specific(s)
    }
}

impl fmt::Display for PageSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PageSelector::All => write!(f, "all"),
            PageSelector::Range(start, end) => write!(f, "{}-{}", start, end),
            PageSelector::Specific(pages) => {
                let list: Vec<String> = pages.iter().map(|p| p.to_string()).collect();
                write!(f, "{}", list.join(","))
            }
        }
    }
}

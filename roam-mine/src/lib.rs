//! Roam daily-page mining library.
//! Modules keep the core pure: pages come in as plain data, outline text goes out.
//! Loading and printing live in `storage` and the binary.

pub mod core {
    use regex::Regex;
    use serde::{Deserialize, Serialize};

    /* ------------------------------ Input graph ------------------------------ */

    /// A page from a Roam JSON export. Day pages carry a date-like title.
    #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
    pub struct Page {
        pub title: String,
        /// Top-level blocks, in display order.
        #[serde(default)]
        pub children: Vec<Block>,
    }

    impl Page {
        pub fn new(title: impl Into<String>, children: Vec<Block>) -> Self {
            Self {
                title: title.into(),
                children,
            }
        }
    }

    /// A node in a page's block tree.
    #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
    pub struct Block {
        /// Stable block reference id assigned by Roam.
        pub uid: String,
        /// Block text.
        #[serde(default)]
        pub string: String,
        #[serde(default)]
        pub children: Vec<Block>,
    }

    impl Block {
        pub fn new(uid: impl Into<String>, string: impl Into<String>) -> Self {
            Self {
                uid: uid.into(),
                string: string.into(),
                children: vec![],
            }
        }

        pub fn with_children(mut self, children: Vec<Block>) -> Self {
            self.children = children;
            self
        }
    }

    /* -------------------------------- Pattern -------------------------------- */

    /// What a block's text is tested against.
    #[derive(Debug, Clone)]
    pub enum Pattern {
        /// Substring containment.
        Literal(String),
        /// Whole-text match. `compiled` is anchored at both ends.
        Regex { source: String, compiled: Regex },
    }

    impl Pattern {
        pub fn literal(text: impl Into<String>) -> Self {
            Pattern::Literal(text.into())
        }

        pub fn regex(source: &str) -> Result<Self, MineError> {
            let invalid = |e| MineError::InvalidRegex {
                pattern: source.to_string(),
                source: e,
            };
            Regex::new(source).map_err(invalid)?;
            // `(?x)` then a newline closes any trailing `(?x)` comment in `source`
            // and is inert otherwise.
            let compiled = Regex::new(&format!("\\A(?:{source}(?x)\n)\\z")).map_err(invalid)?;
            Ok(Pattern::Regex {
                source: source.to_string(),
                compiled,
            })
        }

        /// Library boundary for untyped callers: build a pattern from a kind tag
        /// (`literal`/`string` or `regex`/`regexp`). Any other tag is
        /// `InvalidPatternType`.
        pub fn from_kind(kind: &str, text: &str) -> Result<Self, MineError> {
            match kind.trim().to_ascii_lowercase().as_str() {
                "literal" | "string" => Ok(Pattern::literal(text)),
                "regex" | "regexp" => Pattern::regex(text),
                _ => Err(MineError::InvalidPatternType(kind.to_string())),
            }
        }

        pub fn matches(&self, text: &str) -> bool {
            match self {
                Pattern::Literal(needle) => text.contains(needle.as_str()),
                Pattern::Regex { compiled, .. } => compiled.is_match(text),
            }
        }

        /// Text used as the root line of a rendered month outline.
        pub fn title(&self) -> &str {
            match self {
                Pattern::Literal(text) => text,
                Pattern::Regex { source, .. } => source,
            }
        }
    }

    /* -------------------------------- Results -------------------------------- */

    /// First matching block of a day page.
    #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
    pub struct DayMatch {
        /// Page title, e.g. `August 1st, 2020`.
        pub day: String,
        pub uid: String,
    }

    impl DayMatch {
        pub fn new(day: impl Into<String>, uid: impl Into<String>) -> Self {
            Self {
                day: day.into(),
                uid: uid.into(),
            }
        }
    }

    /* ---------------------------- Errors (domain) ---------------------------- */

    #[derive(Debug, thiserror::Error)]
    pub enum MineError {
        #[error("unsupported pattern type {0:?} (expected \"literal\" or \"regex\")")]
        InvalidPatternType(String),
        #[error("invalid regular expression {pattern:?}")]
        InvalidRegex {
            pattern: String,
            #[source]
            source: regex::Error,
        },
        #[error("could not parse {0:?} as a date")]
        DateParse(String),
        #[error("cannot build a calendar from an empty set of dates")]
        EmptyInput,
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn literal_pattern_matches_substrings() {
            let p = Pattern::literal("bar");
            assert!(p.matches("foo bar baz"));
            assert!(!p.matches("foo"));
        }

        #[test]
        fn regex_pattern_requires_whole_text() {
            let p = Pattern::regex(r"#\[\[Journal\]\].*").unwrap();
            assert!(p.matches("#[[Journal]] went for a walk"));
            assert!(!p.matches("today #[[Journal]]"));
            assert_eq!(p.title(), r"#\[\[Journal\]\].*");
        }

        #[test]
        fn regex_alternation_is_anchored_as_a_group() {
            let p = Pattern::regex("foo|bar").unwrap();
            assert!(p.matches("bar"));
            assert!(!p.matches("foobar!"));
        }

        #[test]
        fn unknown_pattern_kind_is_rejected() {
            let err = Pattern::from_kind("glob", "*.md").unwrap_err();
            assert!(matches!(err, MineError::InvalidPatternType(k) if k == "glob"));
            assert!(matches!(
                Pattern::from_kind("Regex", "a+"),
                Ok(Pattern::Regex { .. })
            ));
            assert!(matches!(
                Pattern::from_kind("literal", "a+"),
                Ok(Pattern::Literal(_))
            ));
        }

        #[test]
        fn bad_regex_reports_pattern() {
            let err = Pattern::regex("(unclosed").unwrap_err();
            assert!(matches!(err, MineError::InvalidRegex { pattern, .. } if pattern == "(unclosed"));
        }

        #[test]
        fn unbalanced_regex_cannot_escape_the_anchors() {
            let err = Pattern::regex("a)|(b").unwrap_err();
            assert!(matches!(err, MineError::InvalidRegex { pattern, .. } if pattern == "a)|(b"));
        }

        #[test]
        fn verbose_regex_with_trailing_comment_is_accepted() {
            let p = Pattern::regex("(?x) foo # trailing comment").unwrap();
            assert!(p.matches("foo"));
            assert!(!p.matches("foo bar"));
            assert!(!p.matches("xfoo"));
        }

        #[test]
        fn spaces_in_plain_regex_stay_literal() {
            let p = Pattern::regex("foo bar").unwrap();
            assert!(p.matches("foo bar"));
            assert!(!p.matches("foobar"));
        }

        #[test]
        fn pages_deserialize_without_children_or_text() {
            let json = r#"[{"title":"August 1st, 2020","children":[{"uid":"a1","create-time":1}]},{"title":"Empty"}]"#;
            let pages: Vec<Page> = serde_json::from_str(json).unwrap();
            assert_eq!(pages[0].children[0], Block::new("a1", ""));
            assert!(pages[1].children.is_empty());
        }
    }
}

pub mod dates {
    //! Date formatting and parsing in Roam's daily-page conventions.
    //!
    //! Roam titles day pages as `August 1st, 2020` and links them as `[[August 1st, 2020]]`.
    //! Month keys (`August, 2020`) identify a calendar month.

    use crate::core::MineError;
    use chrono::{Datelike, Days, NaiveDate, Weekday};
    use nom::{
        IResult,
        branch::alt,
        bytes::complete::{tag, take_while_m_n},
        character::complete::{alpha1, char, satisfy, space0, space1},
        combinator::{all_consuming, map_opt, map_res, not, opt},
        error::VerboseError,
        sequence::{delimited, preceded, terminated, tuple},
    };

    /* ------------------------------ Name tables ------------------------------ */

    pub const MONTH_NAMES: [&str; 12] = [
        "January",
        "February",
        "March",
        "April",
        "May",
        "June",
        "July",
        "August",
        "September",
        "October",
        "November",
        "December",
    ];

    /// Sunday-first, matching calendar column order.
    pub const ABBR_DAY_NAMES: [&str; 7] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];

    pub fn month_name(date: NaiveDate) -> &'static str {
        MONTH_NAMES[date.month0() as usize]
    }

    /* ------------------------------- Formatting ------------------------------- */

    pub fn ordinal_suffix(n: u32) -> &'static str {
        if matches!(n, 11 | 12 | 13) {
            return "th";
        }
        match n % 10 {
            1 => "st",
            2 => "nd",
            3 => "rd",
            _ => "th",
        }
    }

    pub fn ordinal(n: u32) -> String {
        format!("{n}{}", ordinal_suffix(n))
    }

    /// `August 1st, 2020`
    pub fn format_date(date: NaiveDate) -> String {
        format!(
            "{} {}, {}",
            month_name(date),
            ordinal(date.day()),
            date.year()
        )
    }

    /// `[[August 1st, 2020]]`, or `[label]([[August 1st, 2020]])` when labelled.
    /// A missing date renders as an empty string.
    pub fn format_link(date: Option<NaiveDate>, label: Option<&str>) -> String {
        let Some(date) = date else {
            return String::new();
        };
        let date_text = format!("[[{}]]", format_date(date));
        match label {
            None => date_text,
            Some(label) => format!("[{label}]({date_text})"),
        }
    }

    /// `August, 2020`
    pub fn month_key(date: NaiveDate) -> String {
        format!("{}, {}", month_name(date), date.year())
    }

    /// Parse any supported date text and return its month key.
    pub fn month_for_date(text: &str) -> Result<String, MineError> {
        parse_date(text).map(month_key)
    }

    /* ------------------------------ Week bounds ------------------------------ */

    pub fn sunday_on_or_before(date: NaiveDate) -> NaiveDate {
        let mut day = date;
        while day.weekday() != Weekday::Sun {
            day = day - Days::new(1);
        }
        day
    }

    pub fn saturday_on_or_after(date: NaiveDate) -> NaiveDate {
        let mut day = date;
        while day.weekday() != Weekday::Sat {
            day = day + Days::new(1);
        }
        day
    }

    /* -------------------------------- Parsing -------------------------------- */

    type PResult<'a, T> = IResult<&'a str, T, VerboseError<&'a str>>;

    /// Parse a date as it appears in page titles, month keys or on the command line.
    ///
    /// Accepted forms:
    /// - `August 1st, 2020`, `August 1, 2020`, `Aug 1 2020`
    /// - `August, 2020` (day defaults to the 1st)
    /// - `2020-08-01`
    pub fn parse_date(text: &str) -> Result<NaiveDate, MineError> {
        all_consuming(delimited(space0, alt((iso_date, named_date)), space0))(text)
            .map(|(_, date)| date)
            .map_err(|_| MineError::DateParse(text.to_string()))
    }

    fn iso_date(i: &str) -> PResult<'_, NaiveDate> {
        map_opt(
            tuple((
                number::<i32>(4, 4),
                char('-'),
                number::<u32>(1, 2),
                char('-'),
                number::<u32>(1, 2),
            )),
            |(y, _, m, _, d)| NaiveDate::from_ymd_opt(y, m, d),
        )(i)
    }

    fn named_date(i: &str) -> PResult<'_, NaiveDate> {
        map_opt(
            tuple((
                month_number,
                opt(char('.')),
                opt(preceded(space1, day_of_month)),
                alt((preceded(char(','), space0), space1)),
                number::<i32>(4, 4),
            )),
            |(month, _, day, _, year)| NaiveDate::from_ymd_opt(year, month, day.unwrap_or(1)),
        )(i)
    }

    fn month_number(i: &str) -> PResult<'_, u32> {
        map_opt(alpha1, lookup_month)(i)
    }

    fn lookup_month(word: &str) -> Option<u32> {
        let word = word.to_ascii_lowercase();
        MONTH_NAMES
            .iter()
            .position(|name| {
                let name = name.to_ascii_lowercase();
                name == word || (word.len() >= 3 && name.starts_with(&word))
            })
            .map(|idx| idx as u32 + 1)
    }

    // A one or two digit day with an optional ordinal suffix. Refuses to eat
    // the front of a year (`August 2020`).
    fn day_of_month(i: &str) -> PResult<'_, u32> {
        terminated(
            number::<u32>(1, 2),
            tuple((
                opt(alt((tag("st"), tag("nd"), tag("rd"), tag("th")))),
                not(satisfy(|c: char| c.is_ascii_alphanumeric())),
            )),
        )(i)
    }

    fn number<'a, T: std::str::FromStr>(
        min: usize,
        max: usize,
    ) -> impl FnMut(&'a str) -> PResult<'a, T> {
        map_res(
            take_while_m_n(min, max, |c: char| c.is_ascii_digit()),
            |s: &str| s.parse::<T>(),
        )
    }

}

pub mod outline {
    //! Nested outline text, the shape Roam accepts when pasting.

    use serde::Serialize;

    const INDENT: &str = "  ";

    /// A block without a uid: text plus nested children.
    #[derive(Debug, Clone, PartialEq, Eq, Serialize)]
    pub struct OutlineNode {
        pub string: String,
        pub children: Vec<OutlineNode>,
    }

    impl OutlineNode {
        pub fn new(string: impl Into<String>, children: Vec<OutlineNode>) -> Self {
            Self {
                string: string.into(),
                children,
            }
        }

        pub fn leaf(string: impl Into<String>) -> Self {
            Self::new(string, vec![])
        }

        /// Nest `cells` so each is the only child of the one before it.
        /// Roam tables encode a row this way.
        pub fn chain(cells: impl IntoIterator<Item = String>) -> Option<Self> {
            let mut cells: Vec<String> = cells.into_iter().collect();
            let mut node = OutlineNode::leaf(cells.pop()?);
            while let Some(text) = cells.pop() {
                node = OutlineNode::new(text, vec![node]);
            }
            Some(node)
        }

        /// Two spaces per level, one line per node.
        pub fn render(&self) -> String {
            let mut out = String::new();
            self.render_into(&mut out, 0);
            out
        }

        fn render_into(&self, out: &mut String, depth: usize) {
            for _ in 0..depth {
                out.push_str(INDENT);
            }
            out.push_str(&self.string);
            out.push('\n');
            for child in &self.children {
                child.render_into(out, depth + 1);
            }
        }
    }

}

pub mod matcher {
    //! First-match search over a page's block tree.
    //!
    //! A sibling list is scanned in full before any of its children are visited, and
    //! the children of earlier siblings are searched (completely) before those of later
    //! siblings. This is not level-order across the whole tree: a shallow match under
    //! a later sibling loses to a deeper match under an earlier one.

    use crate::core::{Block, Pattern};

    /// Return the uid of the first block satisfying `pattern`, if any.
    pub fn find_first_match<'a>(pattern: &Pattern, blocks: &'a [Block]) -> Option<&'a str> {
        // Stack of sibling lists; children are pushed in reverse so the earliest
        // sibling's subtree is exhausted first.
        let mut pending: Vec<&'a [Block]> = vec![blocks];
        while let Some(siblings) = pending.pop() {
            if let Some(hit) = siblings.iter().find(|b| pattern.matches(&b.string)) {
                return Some(hit.uid.as_str());
            }
            for block in siblings.iter().rev() {
                if !block.children.is_empty() {
                    pending.push(&block.children);
                }
            }
        }
        None
    }

}

pub mod months {
    //! Group day pages by month and pick the first matching block of each day.

    use crate::core::{DayMatch, MineError, Page, Pattern};
    use crate::dates::{MONTH_NAMES, month_for_date, parse_date};
    use crate::matcher::find_first_match;
    use crate::outline::OutlineNode;
    use chrono::NaiveDate;
    use indexmap::IndexMap;
    use once_cell::sync::Lazy;
    use regex::Regex;

    /// Month key (`August, 2020`) → matches in chronological order.
    pub type MonthResults = IndexMap<String, Vec<DayMatch>>;

    // Month name somewhere before `, YYYY`. Also admits month-only titles such
    // as `August, 2020`.
    static DAY_PAGE_TITLE: Lazy<Regex> = Lazy::new(|| {
        Regex::new(&format!(r"^({}).*, [0-9]{{4}}", MONTH_NAMES.join("|")))
            .expect("day page regex is valid")
    });

    pub fn is_day_page(page: &Page) -> bool {
        DAY_PAGE_TITLE.is_match(&page.title)
    }

    pub fn day_pages(pages: &[Page]) -> Vec<&Page> {
        pages.iter().filter(|p| is_day_page(p)).collect()
    }

    /// Bucket pages by the month of their title. Any unparsable title fails the whole run.
    pub fn group_by_month<'a>(
        pages: impl IntoIterator<Item = &'a Page>,
    ) -> Result<IndexMap<String, Vec<&'a Page>>, MineError> {
        let mut out: IndexMap<String, Vec<&'a Page>> = IndexMap::new();
        for page in pages {
            let key = month_for_date(&page.title)?;
            out.entry(key).or_default().push(page);
        }
        Ok(out)
    }

    /// First match per page; pages without a match are left out.
    pub fn match_pages<'a>(
        pattern: &Pattern,
        pages: impl IntoIterator<Item = &'a Page>,
    ) -> Vec<DayMatch> {
        pages
            .into_iter()
            .filter_map(|page| {
                find_first_match(pattern, &page.children).map(|uid| DayMatch::new(&page.title, uid))
            })
            .collect()
    }

    /// Run the full pipeline: filter day pages, group, match, and sort.
    pub fn process(pattern: &Pattern, pages: &[Page]) -> Result<MonthResults, MineError> {
        let by_month = group_by_month(day_pages(pages))?;

        let mut months: Vec<(NaiveDate, String, Vec<DayMatch>)> = Vec::new();
        for (month, month_pages) in by_month {
            let matches = match_pages(pattern, month_pages);
            if matches.is_empty() {
                continue;
            }
            let mut dated = matches
                .into_iter()
                .map(|m| parse_date(&m.day).map(|date| (date, m)))
                .collect::<Result<Vec<_>, _>>()?;
            dated.sort_by_key(|(date, _)| *date);

            let month_start = parse_date(&month)?;
            months.push((month_start, month, dated.into_iter().map(|(_, m)| m).collect()));
        }
        months.sort_by_key(|(start, _, _)| *start);

        Ok(months
            .into_iter()
            .map(|(_, month, matches)| (month, matches))
            .collect())
    }

    /// Keep only `target` (an exact month key) when given.
    pub fn filter_months(target: Option<&str>, results: MonthResults) -> MonthResults {
        let Some(target) = target else {
            return results;
        };
        results
            .into_iter()
            .filter(|(month, _)| month == target)
            .collect()
    }

    /// Outline for one month: `title`, then each day as a link with its block embedded.
    pub fn month_outline(title: &str, matches: &[DayMatch]) -> OutlineNode {
        let children = matches
            .iter()
            .map(|m| {
                OutlineNode::new(
                    format!("[[{}]]", m.day),
                    vec![OutlineNode::leaf(format!("{{{{embed: (({}))}}}}", m.uid))],
                )
            })
            .collect();
        OutlineNode::new(title, children)
    }

    /// Rendered `month_outline`, or `None` when there is nothing to render.
    pub fn format_month(title: &str, matches: Option<&[DayMatch]>) -> Option<String> {
        matches.map(|m| month_outline(title, m).render())
    }

    #[cfg(test)]
    mod tests {
        use super::*;
        use crate::core::Block;

        fn scenario_pages() -> Vec<Page> {
            vec![
                Page::new("August 1st, 2020", vec![Block::new("a1", "foo bar")]),
                Page::new(
                    "August 6th, 2020",
                    vec![
                        Block::new("b2", "nothing")
                            .with_children(vec![Block::new("c3", "bar baz")]),
                    ],
                ),
            ]
        }

        #[test]
        fn day_page_filter_is_permissive_about_the_day() {
            assert!(is_day_page(&Page::new("August 1st, 2020", vec![])));
            assert!(is_day_page(&Page::new("August, 2020", vec![])));
            assert!(!is_day_page(&Page::new("august 1st, 2020", vec![])));
            assert!(!is_day_page(&Page::new("Journal", vec![])));
            assert!(!is_day_page(&Page::new("Notes on August 1st, 2020", vec![])));
            assert!(!is_day_page(&Page::new("August 1st 2020", vec![])));
        }

        #[test]
        fn groups_and_matches_scenario() {
            let results = process(&Pattern::literal("bar"), &scenario_pages()).unwrap();
            assert_eq!(results.len(), 1);
            assert_eq!(
                results["August, 2020"],
                vec![
                    DayMatch::new("August 1st, 2020", "a1"),
                    DayMatch::new("August 6th, 2020", "c3"),
                ]
            );
        }

        #[test]
        fn sorts_days_and_months_chronologically() {
            let pages = vec![
                Page::new("January 9th, 2021", vec![Block::new("j9", "hit")]),
                Page::new("December 2nd, 2020", vec![Block::new("d2", "hit")]),
                Page::new("January 3rd, 2021", vec![Block::new("j3", "hit")]),
                Page::new("April 10th, 2020", vec![Block::new("a10", "hit")]),
                Page::new("April 2nd, 2020", vec![Block::new("a2", "hit")]),
            ];
            let results = process(&Pattern::literal("hit"), &pages).unwrap();
            let months: Vec<&str> = results.keys().map(String::as_str).collect();
            assert_eq!(months, ["April, 2020", "December, 2020", "January, 2021"]);
            let uids: Vec<&str> = results["April, 2020"].iter().map(|m| m.uid.as_str()).collect();
            assert_eq!(uids, ["a2", "a10"]);
            let uids: Vec<&str> = results["January, 2021"].iter().map(|m| m.uid.as_str()).collect();
            assert_eq!(uids, ["j3", "j9"]);
        }

        #[test]
        fn months_without_matches_are_dropped() {
            let pages = vec![
                Page::new("July 4th, 2020", vec![Block::new("x", "fireworks")]),
                Page::new("August 1st, 2020", vec![Block::new("a1", "bar")]),
                Page::new("Reading list", vec![Block::new("r", "bar")]),
            ];
            let results = process(&Pattern::literal("bar"), &pages).unwrap();
            assert_eq!(results.keys().collect::<Vec<_>>(), ["August, 2020"]);
        }

        #[test]
        fn unparsable_day_page_aborts_grouping() {
            let pages = vec![
                Page::new("August 1st, 2020", vec![Block::new("a1", "bar")]),
                Page::new("August 45th, 2020", vec![]),
            ];
            let err = process(&Pattern::literal("bar"), &pages).unwrap_err();
            assert!(matches!(err, MineError::DateParse(t) if t == "August 45th, 2020"));
        }

        #[test]
        fn month_only_title_sorts_as_first_of_month() {
            let pages = vec![
                Page::new("August 6th, 2020", vec![Block::new("d6", "bar")]),
                Page::new("August, 2020", vec![Block::new("m", "bar")]),
            ];
            let results = process(&Pattern::literal("bar"), &pages).unwrap();
            let uids: Vec<&str> = results["August, 2020"].iter().map(|m| m.uid.as_str()).collect();
            assert_eq!(uids, ["m", "d6"]);
        }

        #[test]
        fn filter_months_uses_exact_keys() {
            let pages = vec![
                Page::new("July 4th, 2020", vec![Block::new("j", "bar")]),
                Page::new("August 1st, 2020", vec![Block::new("a", "bar")]),
            ];
            let results = process(&Pattern::literal("bar"), &pages).unwrap();

            let kept = filter_months(Some("July, 2020"), results.clone());
            assert_eq!(kept.keys().collect::<Vec<_>>(), ["July, 2020"]);

            assert!(filter_months(Some("july, 2020"), results.clone()).is_empty());
            assert_eq!(filter_months(None, results.clone()), results);
        }

        #[test]
        fn formats_month_outline() {
            let matches = vec![
                DayMatch::new("August 1st, 2020", "a1"),
                DayMatch::new("August 6th, 2020", "c3"),
            ];
            let text = format_month("bar", Some(matches.as_slice())).unwrap();
            assert_eq!(
                text,
                "bar\n  [[August 1st, 2020]]\n    {{embed: ((a1))}}\n  [[August 6th, 2020]]\n    {{embed: ((c3))}}\n"
            );
            assert_eq!(format_month("bar", None), None);
        }
    }
}

pub mod calendar {
    //! Calendar tables padded out to whole Sunday–Saturday weeks.

    use crate::core::MineError;
    use crate::dates::{ABBR_DAY_NAMES, format_link, saturday_on_or_after, sunday_on_or_before};
    use crate::outline::OutlineNode;
    use chrono::{Datelike, Days, Months, NaiveDate};
    use serde::{Deserialize, Serialize};
    use std::collections::BTreeSet;

    pub const TABLE_MARKER: &str = "{{table}}";

    /// Inclusive range of days.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
    pub struct DateRange {
        pub first: NaiveDate,
        pub last: NaiveDate, // inclusive
    }

    impl DateRange {
        pub fn contains(&self, date: NaiveDate) -> bool {
            date >= self.first && date <= self.last
        }

        /// Number of days covered; zero when `last` precedes `first`.
        pub fn len(&self) -> usize {
            ((self.last - self.first).num_days() + 1).max(0) as usize
        }

        pub fn is_empty(&self) -> bool {
            self.len() == 0
        }

        pub fn days(self) -> impl Iterator<Item = NaiveDate> {
            let last = self.last;
            self.first.iter_days().take_while(move |d| *d <= last)
        }
    }

    /// First through last day of the month containing `date`.
    pub fn month_range(date: NaiveDate) -> DateRange {
        let first = date - Days::new(u64::from(date.day0()));
        let last = first + Months::new(1) - Days::new(1);
        DateRange { first, last }
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
    pub enum CalendarCell {
        Empty,
        Day(NaiveDate),
    }

    impl CalendarCell {
        pub fn date(&self) -> Option<NaiveDate> {
            match self {
                CalendarCell::Empty => None,
                CalendarCell::Day(d) => Some(*d),
            }
        }

        /// Cell text: the day of month linked to its daily page, or nothing.
        pub fn label(&self) -> String {
            self.date()
                .map(|d| format_link(Some(d), Some(&d.day().to_string())))
                .unwrap_or_default()
        }
    }

    pub type Week = [CalendarCell; 7];

    #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
    pub struct CalendarTable {
        /// Padded range: starts on a Sunday, ends on a Saturday.
        pub range: DateRange,
        pub weeks: Vec<Week>,
    }

    impl CalendarTable {
        pub fn header() -> [String; 7] {
            ABBR_DAY_NAMES.map(|name| format!("**{name}**"))
        }

        /// Roam table encoding: `{{table}}` with one chained row per week,
        /// preceded by the day-name header row.
        pub fn to_outline(&self) -> OutlineNode {
            let header = OutlineNode::chain(Self::header());
            let weeks = self
                .weeks
                .iter()
                .filter_map(|week| OutlineNode::chain(week.iter().map(CalendarCell::label)));
            OutlineNode::new(TABLE_MARKER, header.into_iter().chain(weeks).collect())
        }
    }

    /// Sunday on or before the earliest date through the Saturday on or after the latest.
    pub fn padded_range(dates: &BTreeSet<NaiveDate>) -> Result<DateRange, MineError> {
        let (Some(&min), Some(&max)) = (dates.first(), dates.last()) else {
            return Err(MineError::EmptyInput);
        };
        Ok(DateRange {
            first: sunday_on_or_before(min),
            last: saturday_on_or_after(max),
        })
    }

    /// One cell per day of `padded_range`; days not in `dates` become `Empty`.
    pub fn pad_to_weeks(dates: &BTreeSet<NaiveDate>) -> Result<Vec<CalendarCell>, MineError> {
        Ok(cells_in(padded_range(dates)?, dates))
    }

    fn cells_in(range: DateRange, dates: &BTreeSet<NaiveDate>) -> Vec<CalendarCell> {
        range
            .days()
            .map(|d| {
                if dates.contains(&d) {
                    CalendarCell::Day(d)
                } else {
                    CalendarCell::Empty
                }
            })
            .collect()
    }

    pub fn build_calendar(dates: &BTreeSet<NaiveDate>) -> Result<CalendarTable, MineError> {
        let range = padded_range(dates)?;
        let weeks: Vec<Week> = cells_in(range, dates)
            .chunks_exact(7)
            .map(|chunk| std::array::from_fn(|i| chunk[i]))
            .collect();
        Ok(CalendarTable { range, weeks })
    }

}

pub mod storage {
    //! Loading pages from a Roam JSON export.

    use crate::core::Page;
    use anyhow::{Context, Result};
    use std::{fs, io::Read, path::Path};

    /// Parse an export document (a JSON array of pages) from a string.
    pub fn parse_pages_from_str(input: &str) -> Result<Vec<Page>> {
        serde_json::from_str(input).context("decoding Roam JSON export")
    }

    pub fn parse_pages_from_reader<R: Read>(mut reader: R) -> Result<Vec<Page>> {
        let mut text = String::new();
        reader
            .read_to_string(&mut text)
            .context("reading Roam JSON export")?;
        parse_pages_from_str(&text)
    }

    /// Separates where pages come from and how they are decoded.
    pub trait PageLoader {
        fn load_file(&self, abs_path: &Path) -> Result<Vec<Page>>;
    }

    pub struct JsonPageLoader;

    impl PageLoader for JsonPageLoader {
        fn load_file(&self, abs_path: &Path) -> Result<Vec<Page>> {
            let text =
                fs::read_to_string(abs_path).with_context(|| format!("reading {:?}", abs_path))?;
            let pages = parse_pages_from_str(&text)
                .with_context(|| format!("parsing {:?}", abs_path))?;
            log::debug!("loaded {} pages from {:?}", pages.len(), abs_path);
            Ok(pages)
        }
    }

}

pub use calendar::{build_calendar, month_range};
pub use matcher::find_first_match;
pub use months::{filter_months, format_month, process};

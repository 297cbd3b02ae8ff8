//! Correlates report entries with source symbols and source positions.
//!
//! Report names are fully qualified (`pkg.module.Class.test_foo`) while editors
//! see bare identifiers (`test_foo`), so a candidate symbol matches when it is
//! the trailing dotted segment of the report name. Several candidates can
//! match; the longest one wins and ties go to the first candidate seen.

use serde::{Deserialize, Serialize};

use crate::report::{Problem, Report};

/// A `file:line` position to jump to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceLocation {
    pub file: String,
    pub line: u32,
}

impl std::fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.file, self.line)
    }
}

/// The symbol a report test resolved to, if any.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymbolMatch {
    pub test: String,
    pub symbol: Option<String>,
}

/// Pick the candidate that `test_name` ends with (as `"." + candidate`).
///
/// Longest match wins; among equally long matches the first one in
/// `candidates` is returned.
pub fn match_symbol<'a, I>(test_name: &str, candidates: I) -> Option<&'a str>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut best: Option<&'a str> = None;
    for candidate in candidates {
        if !is_trailing_segment(test_name, candidate) {
            continue;
        }
        if best.map_or(true, |b| candidate.len() > b.len()) {
            best = Some(candidate);
        }
    }
    best
}

fn is_trailing_segment(test_name: &str, candidate: &str) -> bool {
    !candidate.is_empty()
        && test_name.len() > candidate.len()
        && test_name.ends_with(candidate)
        && test_name.as_bytes()[test_name.len() - candidate.len() - 1] == b'.'
}

/// Resolve every test of `report` against `candidates`, in report order.
pub fn match_report<S: AsRef<str>>(report: &Report, candidates: &[S]) -> Vec<SymbolMatch> {
    report
        .tests
        .iter()
        .map(|t| SymbolMatch {
            test: t.name.clone(),
            symbol: match_symbol(&t.name, candidates.iter().map(AsRef::as_ref))
                .map(str::to_string),
        })
        .collect()
}

/// The first frame of the problem's evidence trail, when it names a file and
/// a line. Later frames are never consulted: the first one is the application
/// frame closest to the query.
pub fn primary_frame(problem: &Problem) -> Option<SourceLocation> {
    let frame = problem.evidence.as_ref()?.top_stack.first()?;
    let file = frame.file.as_deref().filter(|f| !f.is_empty())?;
    Some(SourceLocation {
        file: file.to_string(),
        line: frame.line?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::{Evidence, Frame, ProblemType};

    fn problem_with_stack(stack: Vec<Frame>) -> Problem {
        Problem {
            problem_type: ProblemType::NPlusOne,
            id: "n+1:x".into(),
            sql: "SELECT 1".into(),
            count: None,
            evidence: Some(Evidence { top_stack: stack }),
            suggestion: None,
        }
    }

    #[test]
    fn longest_candidate_wins() {
        let got = match_symbol("pkg.mod.Class.test_foobar", ["test_foo", "test_foobar"]);
        assert_eq!(got, Some("test_foobar"));
    }

    #[test]
    fn qualified_candidate_beats_bare_identifier() {
        let got = match_symbol(
            "pkg.mod.Class.test_foo",
            ["test_foo", "Class.test_foo", "mod.Other.test_foo"],
        );
        assert_eq!(got, Some("Class.test_foo"));
    }

    #[test]
    fn ties_go_to_first_candidate() {
        // Identical candidates are the only way two matches can share a length.
        let candidates = vec![String::from("test_a"), String::from("test_a")];
        let got = match_symbol("m.test_a", candidates.iter().map(String::as_str));
        assert!(std::ptr::eq(got.unwrap(), candidates[0].as_str()));
    }

    #[test]
    fn suffix_must_start_at_a_segment_boundary() {
        assert_eq!(match_symbol("pkg.mod.test_foobar", ["foobar", "bar"]), None);
        assert_eq!(match_symbol("test_foo", ["test_foo"]), None);
        assert_eq!(match_symbol("pkg.test_foo", [""]), None);
    }

    #[test]
    fn match_report_preserves_order() {
        let report = crate::report::parse(
            r#"{"tests": [{"name": "a.B.test_two"}, {"name": "a.B.test_one"}, {"name": "a.B.helper"}]}"#,
        )
        .unwrap();
        let matches = match_report(&report, &["test_one", "test_two"]);
        let got: Vec<(&str, Option<&str>)> = matches
            .iter()
            .map(|m| (m.test.as_str(), m.symbol.as_deref()))
            .collect();
        assert_eq!(
            got,
            vec![
                ("a.B.test_two", Some("test_two")),
                ("a.B.test_one", Some("test_one")),
                ("a.B.helper", None),
            ]
        );
    }

    #[test]
    fn primary_frame_is_the_first_frame() {
        let p = problem_with_stack(vec![
            Frame::new("app/views.py", "book_list", 42),
            Frame::new("django/db/models/query.py", "__iter__", 300),
        ]);
        let loc = primary_frame(&p).unwrap();
        assert_eq!(loc.to_string(), "app/views.py:42");
    }

    #[test]
    fn incomplete_first_frame_yields_none() {
        let no_line = Frame {
            file: Some("app/views.py".into()),
            symbol: Some("book_list".into()),
            line: None,
        };
        let p = problem_with_stack(vec![no_line, Frame::new("app/other.py", "f", 1)]);
        assert_eq!(primary_frame(&p), None);

        let empty = problem_with_stack(vec![]);
        assert_eq!(primary_frame(&empty), None);

        let mut no_evidence = empty;
        no_evidence.evidence = None;
        assert_eq!(primary_frame(&no_evidence), None);
    }
}

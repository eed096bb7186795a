//! Contract clause extraction from doc-comments
//!
//! Clauses are matched line by line; the remainder of a matching line is
//! stored verbatim as opaque boolean-expression text. No semantic
//! evaluation happens here, assertions are reproduced into the synthesized
//! code as written.

use regex::Regex;

use crate::entities::AssertionList;

/// Extract every clause opened by `keyword` from a doc-comment.
///
/// A line matches if it starts with the keyword after leading whitespace
/// and doc-comment gutter markers (`/**`, `*`). Matching lines contribute
/// their trimmed remainder, in source order.
pub fn parse_clauses(doc_comment: &str, keyword: &str) -> AssertionList {
    // Gutter characters first, then the keyword, then the expression; a
    // trailing comment terminator on one-line doc-comments is not part of
    // the expression.
    let pattern = format!(
        r"(?m)^[\s/*]*{}\s+(.+?)\s*(?:\*+/)?\s*$",
        regex::escape(keyword)
    );
    let re = Regex::new(&pattern).expect("escaped keyword always forms a valid pattern");

    re.captures_iter(doc_comment)
        .map(|cap| cap[1].to_string())
        .collect()
}

/// True iff the literal keyword text occurs anywhere in the doc-comment.
///
/// This is a coarse textual scan, not a structural one: it cannot tell a
/// real reference apart from the keyword appearing inside prose or a
/// different clause.
pub fn uses_keyword(doc_comment: &str, keyword: &str) -> bool {
    doc_comment.contains(keyword)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{KEYWORD_OLD, KEYWORD_POST, KEYWORD_PRE};

    const DOC: &str = "/**\n * Pops an element.\n *\n * @requires $this->size > 0\n * @requires $this->open === true\n * @ensures $dbcResult !== null\n */";

    #[test]
    fn clauses_extracted_in_source_order() {
        let pre = parse_clauses(DOC, KEYWORD_PRE);
        let clauses: Vec<_> = pre.iter().collect();
        assert_eq!(clauses, vec!["$this->size > 0", "$this->open === true"]);
    }

    #[test]
    fn keywords_do_not_leak_across_clause_kinds() {
        let post = parse_clauses(DOC, KEYWORD_POST);
        assert_eq!(post.iter().collect::<Vec<_>>(), vec!["$dbcResult !== null"]);
    }

    #[test]
    fn no_matching_line_yields_empty_list() {
        let list = parse_clauses("/** just prose */", KEYWORD_PRE);
        assert!(list.is_empty());
    }

    #[test]
    fn gutter_markers_are_stripped() {
        let doc = "/** @requires $x > 0 */";
        let list = parse_clauses(doc, KEYWORD_PRE);
        assert_eq!(list.iter().collect::<Vec<_>>(), vec!["$x > 0"]);
    }

    #[test]
    fn uses_keyword_is_a_coarse_scan() {
        let doc = "/** @ensures $dbcResult >= $dbcOld->count */";
        assert!(uses_keyword(doc, KEYWORD_OLD));
        // Known limitation: prose mentions match too.
        assert!(uses_keyword("/** talks about $dbcOld in passing */", KEYWORD_OLD));
        assert!(!uses_keyword("/** nothing here */", KEYWORD_OLD));
    }
}

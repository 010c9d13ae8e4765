//! Domain-specific assertion macros for orgbook harnesses.
//!
//! These wrap `pretty_assertions` and add failure messages that say which
//! node or hit was wrong and what the tree looked like at the time.

use orgbook_core::{OrgTree, SearchOutcome};

/// Render `tree` as indented `code name` lines for failure messages.
pub fn dump_tree(tree: &OrgTree) -> String {
    let mut out = String::new();
    for (depth, id) in tree.walk() {
        let node = tree.node(id);
        out.push_str(&"  ".repeat(depth));
        if let Some(code) = &node.code {
            out.push_str(code);
            out.push(' ');
        }
        out.push_str(&node.name);
        out.push('\n');
    }
    out
}

/// Names of the hits, in rank order. Panics on `Browse`.
pub fn hit_names(outcome: &SearchOutcome) -> Vec<String> {
    match outcome {
        SearchOutcome::Hits(hits) => hits.iter().map(|h| h.member.name.clone()).collect(),
        SearchOutcome::Browse => panic!("expected search hits, got Browse"),
    }
}

/// Assert the breadcrumb of the node with `code`.
///
/// ```rust
/// assert_path!(tree, "KCQS101001", ["青山校區", "青山校長室", "青山教務處", "教學組"]);
/// ```
#[macro_export]
macro_rules! assert_path {
    ($tree:expr, $code:expr, [$($name:expr),* $(,)?]) => {{
        let tree: &orgbook_core::OrgTree = &$tree;
        let code: &str = $code;
        let Some(id) = tree.find_by_code(code) else {
            panic!(
                "assert_path! failed: no node with code {:?}\n  tree:\n{}",
                code,
                $crate::common::dump_tree(tree)
            );
        };
        let expected: Vec<&str> = vec![$($name),*];
        pretty_assertions::assert_eq!(tree.path(id), expected, "path of {code}");
    }};
}

/// Assert that the node with `child` code hangs directly under the node
/// with `parent` code.
#[macro_export]
macro_rules! assert_parent {
    ($tree:expr, $child:expr, $parent:expr) => {{
        let tree: &orgbook_core::OrgTree = &$tree;
        let child = tree
            .find_by_code($child)
            .unwrap_or_else(|| panic!("no node with code {:?}\n{}", $child, $crate::common::dump_tree(tree)));
        let parent = tree.node(child).parent.expect("non-root node has a parent");
        pretty_assertions::assert_eq!(
            tree.node(parent).code.as_deref(),
            Some($parent),
            "parent of {}\n  tree:\n{}",
            $child,
            $crate::common::dump_tree(tree)
        );
    }};
}

/// Assert that `report.dropped` lists `id` with `reason`.
#[macro_export]
macro_rules! assert_dropped {
    ($report:expr, $id:expr, $reason:expr) => {{
        let dropped = &$report.dropped;
        match dropped.iter().find(|d| d.id == $id) {
            Some(d) => pretty_assertions::assert_eq!(d.reason, $reason, "drop reason of {}", $id),
            None => panic!(
                "assert_dropped! failed: {:?} not dropped.\n  dropped: {:?}",
                $id,
                dropped.iter().map(|d| (&d.id, d.reason)).collect::<Vec<_>>()
            ),
        }
    }};
}

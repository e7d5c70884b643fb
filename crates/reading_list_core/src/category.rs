//! crates/reading_list_core/src/category.rs
//!
//! Builds the category hierarchy from the flat `" > "`-delimited paths stored
//! on each book. There is no category table: the tree is derived on every read.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use std::collections::BTreeMap;

use crate::validation::ValidationError;

/// Separator between segments of a stored category path.
pub const CATEGORY_SEPARATOR: &str = " > ";

/// One node of the category tree, shaped for a checkbox tree widget.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryNode {
    pub text: String,
    pub full_path: String,
    pub id: String,
    pub checked: bool,
    pub nodes: Vec<CategoryNode>,
}

impl CategoryNode {
    pub fn is_leaf(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Full paths of every leaf below (or at) this node, depth first.
    pub fn leaf_paths(&self) -> Vec<String> {
        if self.is_leaf() {
            return vec![self.full_path.clone()];
        }
        self.nodes.iter().flat_map(|n| n.leaf_paths()).collect()
    }
}

/// Splits a path on [`CATEGORY_SEPARATOR`] into trimmed, non-empty segments.
///
/// A `>` without the surrounding spaces belongs to the segment label.
pub fn split_category_path(path: &str) -> Vec<&str> {
    path.split(CATEGORY_SEPARATOR)
        .map(str::trim)
        .filter(|segment| !segment.is_empty())
        .collect()
}

/// Rewrites a path with canonical spacing, or `None` when it has no segments.
pub fn normalize_category_path(path: &str) -> Option<String> {
    let segments = split_category_path(path);
    if segments.is_empty() {
        None
    } else {
        Some(segments.join(CATEGORY_SEPARATOR))
    }
}

/// True when `path` is `selected` itself or lies anywhere beneath it.
pub fn is_within_category(path: &str, selected: &str) -> bool {
    match path.strip_prefix(selected) {
        Some("") => true,
        Some(rest) => rest.starts_with(CATEGORY_SEPARATOR),
        None => false,
    }
}

/// Encodes a full path as a URL-safe identifier.
pub fn encode_category_id(full_path: &str) -> String {
    STANDARD
        .encode(full_path.as_bytes())
        .replace('+', "-")
        .replace('/', "_")
        .replace('=', "*")
}

/// Reverses [`encode_category_id`].
pub fn decode_category_id(id: &str) -> Result<String, ValidationError> {
    let standard = id.replace('-', "+").replace('_', "/").replace('*', "=");
    let bytes = STANDARD
        .decode(standard.as_bytes())
        .map_err(|_| ValidationError::InvalidCategoryId(id.to_string()))?;
    String::from_utf8(bytes).map_err(|_| ValidationError::InvalidCategoryId(id.to_string()))
}

#[derive(Default)]
struct Branch(BTreeMap<String, Branch>);

impl Branch {
    fn insert(&mut self, segments: &[&str]) {
        if let Some((first, rest)) = segments.split_first() {
            self.0
                .entry((*first).to_string())
                .or_default()
                .insert(rest);
        }
    }

    fn into_nodes(self, context: Option<&str>) -> Vec<CategoryNode> {
        self.0
            .into_iter()
            .map(|(text, children)| {
                let full_path = match context {
                    Some(parent) => format!("{parent}{CATEGORY_SEPARATOR}{text}"),
                    None => text.clone(),
                };
                let nodes = children.into_nodes(Some(&full_path));
                CategoryNode {
                    id: encode_category_id(&full_path),
                    text,
                    full_path,
                    checked: false,
                    nodes,
                }
            })
            .collect()
    }
}

/// Assembles the category tree from every book's category path.
///
/// Blank paths are skipped, duplicates collapse, and siblings come out sorted
/// so the result does not depend on input order.
pub fn build_category_tree<I, S>(paths: I) -> Vec<CategoryNode>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut root = Branch::default();
    for path in paths {
        let segments = split_category_path(path.as_ref());
        root.insert(&segments);
    }
    root.into_nodes(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    const PATHS: &[&str] = &[
        "Fiction > Horror > Dark Fantasy",
        "Fiction > Horror",
        "Nonfiction > History",
        "Fiction > Science Fiction",
        "Fiction > Horror > Dark Fantasy",
        "",
        "   ",
    ];

    #[test]
    fn one_root_per_top_level_segment() {
        let tree = build_category_tree(PATHS);
        let roots: Vec<_> = tree.iter().map(|n| n.text.as_str()).collect();
        assert_eq!(roots, vec!["Fiction", "Nonfiction"]);
    }

    #[test]
    fn prefix_path_becomes_parent_not_sibling() {
        let tree = build_category_tree(PATHS);
        let fiction = &tree[0];
        let children: Vec<_> = fiction.nodes.iter().map(|n| n.text.as_str()).collect();
        assert_eq!(children, vec!["Horror", "Science Fiction"]);

        let horror = &fiction.nodes[0];
        assert_eq!(horror.full_path, "Fiction > Horror");
        assert_eq!(horror.nodes.len(), 1);
        assert_eq!(horror.nodes[0].full_path, "Fiction > Horror > Dark Fantasy");
        assert!(horror.nodes[0].is_leaf());
    }

    #[test]
    fn every_leaf_reconstructs_an_input_path() {
        let tree = build_category_tree(PATHS);
        let inputs: BTreeSet<&str> = PATHS
            .iter()
            .copied()
            .filter(|p| !p.trim().is_empty())
            .collect();
        for leaf in tree.iter().flat_map(CategoryNode::leaf_paths) {
            assert!(inputs.contains(leaf.as_str()), "unexpected leaf {leaf}");
        }
    }

    #[test]
    fn order_is_independent_of_input_order() {
        let mut reversed: Vec<&str> = PATHS.to_vec();
        reversed.reverse();
        assert_eq!(build_category_tree(PATHS), build_category_tree(reversed));
    }

    #[test]
    fn empty_input_gives_empty_tree() {
        assert!(build_category_tree(Vec::<String>::new()).is_empty());
        assert!(build_category_tree(["", " > "]).is_empty());
    }

    #[test]
    fn bare_angle_bracket_stays_inside_a_segment() {
        assert_eq!(split_category_path("Comics>Manga"), vec!["Comics>Manga"]);
        assert_eq!(
            split_category_path(" Fiction  >  Horror >  > "),
            vec!["Fiction", "Horror"]
        );

        let tree = build_category_tree(["Comics>Manga", "Comics > Graphic Novels"]);
        let roots: Vec<_> = tree.iter().map(|n| n.full_path.as_str()).collect();
        assert_eq!(roots, vec!["Comics", "Comics>Manga"]);
        assert_eq!(tree[0].leaf_paths(), vec!["Comics > Graphic Novels"]);
        assert_eq!(tree[1].leaf_paths(), vec!["Comics>Manga"]);
    }

    #[test]
    fn ids_are_url_safe_and_reversible() {
        let path = "Kids > Ages 3-5 > Sci-Fi?";
        let id = encode_category_id(path);
        assert!(!id.contains('+') && !id.contains('/') && !id.contains('='));
        assert_eq!(decode_category_id(&id).unwrap(), path);
        assert!(decode_category_id("not base64!").is_err());
    }

    #[test]
    fn nested_membership_respects_segment_boundaries() {
        assert!(is_within_category("Fiction > Horror", "Fiction"));
        assert!(is_within_category("Fiction", "Fiction"));
        assert!(!is_within_category("Fictional Biography", "Fiction"));
        assert!(!is_within_category("Fiction", "Fiction > Horror"));
    }
}

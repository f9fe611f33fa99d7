use std::collections::{BTreeMap, BTreeSet};

/// Board name mapped to the article ids found under it, both ordered.
pub type BoardGroups = BTreeMap<String, BTreeSet<String>>;

/// Collapse (board, article) pairs into one entry per board with the
/// distinct article ids it contains.
pub fn group_by_board<'a, I>(pairs: I) -> BoardGroups
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    let mut groups: BoardGroups = BTreeMap::new();
    for (board, article_id) in pairs {
        groups
            .entry(board.to_string())
            .or_default()
            .insert(article_id.to_string());
    }
    groups
}

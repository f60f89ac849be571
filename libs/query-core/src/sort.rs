use crate::split_fields;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SortDir {
    Asc,
    Desc,
}

/// One segment of a `sort_by` string.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SortKey {
    pub field: String,
    pub dir: SortDir,
}

/// Parse `sort_by` into keys, preserving order. Blank segments are skipped.
pub fn parse_sort(raw: Option<&str>) -> Vec<SortKey> {
    split_fields(raw)
        .into_iter()
        .filter_map(|seg| {
            let field = seg.trim_start_matches('-').trim();
            if field.is_empty() {
                return None;
            }
            let dir = if seg.starts_with('-') {
                SortDir::Desc
            } else {
                SortDir::Asc
            };
            Some(SortKey {
                field: field.to_string(),
                dir,
            })
        })
        .collect()
}

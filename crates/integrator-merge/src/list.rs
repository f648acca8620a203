//! Anchor-preserving list merge.

/// Merge `source` into `target` in place, keeping `target`'s existing order.
///
/// Items of `source` already present in `target` are anchors. New items are
/// held until the next anchor and inserted directly before it; new items
/// after the last anchor are appended. With no shared items this is a plain
/// append of `source` onto `target`.
///
/// Anchors are matched by first occurrence at or after the cursor, so the
/// cursor never moves backwards. An anchor that only occurs before the
/// cursor flushes the pending items at the cursor.
///
/// Returns the number of items inserted.
///
/// ```
/// use integrator_merge::merge_list;
///
/// let mut target = vec!["first", "one", "two"];
/// merge_list(&["nil", "one", "last"], &mut target);
/// assert_eq!(target, ["first", "nil", "one", "two", "last"]);
/// ```
pub fn merge_list<T: PartialEq + Clone>(source: &[T], target: &mut Vec<T>) -> usize {
    let mut cursor = 0;
    let mut pending: Vec<T> = Vec::new();
    let mut inserted = 0;

    for item in source {
        if let Some(offset) = target[cursor..].iter().position(|t| t == item) {
            let anchor = cursor + offset;
            let count = pending.len();
            target.splice(anchor..anchor, pending.drain(..));
            inserted += count;
            cursor = anchor + count + 1;
        } else if target[..cursor].contains(item) {
            let count = pending.len();
            target.splice(cursor..cursor, pending.drain(..));
            inserted += count;
            cursor += count;
        } else {
            pending.push(item.clone());
        }
    }

    inserted += pending.len();
    target.append(&mut pending);
    inserted
}

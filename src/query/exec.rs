use bson::{Bson, Document as BsonDocument};

use super::eval::{compare_docs, eval_filter};
use super::types::{Filter, FindOptions, UpdateDoc};

/// Filter, sort and limit an ordered sequence of documents.
///
/// Sorting is stable, so documents with equal keys keep the input order.
pub fn select<'a, I>(docs: I, filter: &Filter, opts: &FindOptions) -> Vec<BsonDocument>
where
    I: IntoIterator<Item = &'a BsonDocument>,
{
    let limit = opts.limit.unwrap_or(usize::MAX);
    if opts.sort.is_none() {
        return docs.into_iter().filter(|d| eval_filter(d, filter)).take(limit).cloned().collect();
    }
    let mut out: Vec<BsonDocument> =
        docs.into_iter().filter(|d| eval_filter(d, filter)).cloned().collect();
    if let Some(sort) = &opts.sort {
        out.sort_by(|a, b| compare_docs(a, b, sort));
    }
    out.truncate(limit);
    out
}

/// Apply a set-fields update in place. Returns whether any stored value changed.
pub fn apply_update(doc: &mut BsonDocument, upd: &UpdateDoc) -> bool {
    fn ensure_subdoc<'a>(root: &'a mut BsonDocument, key: &str) -> &'a mut BsonDocument {
        if !matches!(root.get(key), Some(Bson::Document(_))) {
            root.insert(key.to_string(), Bson::Document(BsonDocument::new()));
        }
        match root.get_mut(key) {
            Some(Bson::Document(d)) => d,
            _ => unreachable!(),
        }
    }
    fn set_path(root: &mut BsonDocument, path: &str, value: Bson) -> bool {
        let mut cur = root;
        let mut iter = path.split('.').peekable();
        while let Some(seg) = iter.next() {
            if iter.peek().is_none() {
                let old = cur.insert(seg.to_string(), value.clone());
                return old.as_ref() != Some(&value);
            }
            cur = ensure_subdoc(cur, seg);
        }
        false
    }

    let mut changed = false;
    for (k, v) in &upd.set {
        if set_path(doc, k, v.clone()) {
            changed = true;
        }
    }
    changed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::{Order, SortSpec};
    use bson::doc;

    #[test]
    fn update_set_reports_changes() {
        let mut d = doc! {"fee": 50, "info": {"pages": 1}};
        let upd = UpdateDoc {
            set: vec![("fee".into(), Bson::Int32(60)), ("info.pages".into(), Bson::Int32(2))],
        };
        assert!(apply_update(&mut d, &upd));
        assert_eq!(d.get_i32("fee").unwrap(), 60);
        assert_eq!(d.get_document("info").unwrap().get_i32("pages").unwrap(), 2);
        // Same values again: matched but nothing modified
        assert!(!apply_update(&mut d, &upd));
    }

    #[test]
    fn update_set_creates_missing_fields() {
        let mut d = doc! {};
        let upd = UpdateDoc { set: vec![("a.b".into(), Bson::Null)] };
        assert!(apply_update(&mut d, &upd));
        assert_eq!(d.get_document("a").unwrap().get("b"), Some(&Bson::Null));
    }

    #[test]
    fn select_sorts_then_limits() {
        let docs = vec![doc! {"k": 1, "v": 3}, doc! {"k": 2, "v": 1}, doc! {"k": 3, "v": 2}];
        let opts = FindOptions {
            sort: Some(vec![SortSpec { field: "v".into(), order: Order::Asc }]),
            limit: Some(2),
        };
        let out = select(&docs, &Filter::True, &opts);
        let ks: Vec<i32> = out.iter().map(|d| d.get_i32("k").unwrap()).collect();
        assert_eq!(ks, vec![2, 3]);
    }

    #[test]
    fn select_without_sort_keeps_input_order() {
        let docs = vec![doc! {"k": 3}, doc! {"k": 1}, doc! {"k": 2}];
        let out = select(&docs, &Filter::True, &FindOptions::default());
        let ks: Vec<i32> = out.iter().map(|d| d.get_i32("k").unwrap()).collect();
        assert_eq!(ks, vec![3, 1, 2]);
    }
}

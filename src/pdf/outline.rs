//! Document outline (bookmarks) pointing at the page where each category starts.

use lopdf::{Dictionary, Document, Object, ObjectId, StringFormat};

use super::RenderError;
use crate::document::OutlineEntry;

struct OutlineItem {
    object_id: ObjectId,
    page_ref: ObjectId,
    title: String,
}

/// Writes a flat outline tree and returns the id of its `/Outlines` root.
///
/// Each entry receives a `/Dest [page /Fit]` destination for the page recorded
/// in the display list.  Nothing is written when `entries` is empty.
pub(crate) fn write_outline(
    document: &mut Document,
    entries: &[OutlineEntry],
    page_ids: &[ObjectId],
) -> Result<Option<ObjectId>, RenderError> {
    if entries.is_empty() {
        return Ok(None);
    }

    let mut items = Vec::with_capacity(entries.len());
    for entry in entries {
        let page_ref = page_ids
            .get(entry.page)
            .copied()
            .ok_or_else(|| RenderError::MissingPage {
                title: entry.title.clone(),
                page: entry.page + 1,
            })?;
        items.push(OutlineItem {
            object_id: document.new_object_id(),
            page_ref,
            title: entry.title.clone(),
        });
    }

    let outlines_id = document.new_object_id();
    link_outline_items(outlines_id, document, &items);
    insert_outlines_root(outlines_id, document, &items);
    Ok(Some(outlines_id))
}

fn link_outline_items(outlines_id: ObjectId, document: &mut Document, items: &[OutlineItem]) {
    for (index, item) in items.iter().enumerate() {
        let mut dictionary = Dictionary::new();
        dictionary.set(
            "Title",
            Object::String(
                Document::encode_text(Some("WinAnsiEncoding"), &item.title),
                StringFormat::Literal,
            ),
        );
        dictionary.set(
            "Dest",
            Object::Array(vec![
                Object::Reference(item.page_ref),
                Object::Name("Fit".into()),
            ]),
        );
        dictionary.set("Parent", Object::Reference(outlines_id));

        if index > 0 {
            dictionary.set("Prev", Object::Reference(items[index - 1].object_id));
        }
        if let Some(next) = items.get(index + 1) {
            dictionary.set("Next", Object::Reference(next.object_id));
        }

        document
            .objects
            .insert(item.object_id, Object::Dictionary(dictionary));
    }
}

fn insert_outlines_root(outlines_id: ObjectId, document: &mut Document, items: &[OutlineItem]) {
    let mut dictionary = Dictionary::new();
    dictionary.set("Type", Object::Name("Outlines".into()));
    dictionary.set("Count", Object::Integer(items.len() as i64));
    if let Some(first) = items.first() {
        dictionary.set("First", Object::Reference(first.object_id));
    }
    if let Some(last) = items.last() {
        dictionary.set("Last", Object::Reference(last.object_id));
    }
    document
        .objects
        .insert(outlines_id, Object::Dictionary(dictionary));
}

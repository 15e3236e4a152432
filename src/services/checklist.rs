use std::collections::{BTreeMap, HashSet};

use serde::Serialize;
use serde_json::Value;

use crate::{
    error::FieldErrors,
    models::checklist::ChecklistItem,
    services::checklist_templates::{
        self, TemplateItem, COMPANION_ITEMS, EXTENDED_ABSENCE_ITEM, INTERNATIONAL_ITEMS,
        MAIL_HOLD_ITEM, UNIVERSAL_ITEMS,
    },
};

/// Builds a fresh checklist for a trip.
///
/// The base template for `trip_type` (leisure when the tag is unknown) is
/// followed by the universal items and whichever conditional groups apply.
/// Ids are renumbered `1..=n` over the final list, so they carry no meaning
/// across regenerations.
pub fn generate(
    trip_type: &str,
    duration_days: Option<i64>,
    travelers: i64,
    international: bool,
) -> Vec<ChecklistItem> {
    let mut entries: Vec<TemplateItem> = checklist_templates::template_for_tag(trip_type).to_vec();
    entries.extend_from_slice(UNIVERSAL_ITEMS);

    if let Some(days) = duration_days {
        if days > 7 {
            entries.push(MAIL_HOLD_ITEM);
        }
        if days > 14 {
            entries.push(EXTENDED_ABSENCE_ITEM);
        }
    }

    if international {
        entries.extend_from_slice(INTERNATIONAL_ITEMS);
    }

    if travelers > 1 && trip_type != "group" {
        entries.extend_from_slice(COMPANION_ITEMS);
    }

    entries
        .into_iter()
        .zip(1..)
        .map(|(entry, id)| ChecklistItem {
            id,
            text: entry.text.to_string(),
            category: entry.category.to_string(),
            completed: false,
            priority: Some(entry.priority),
        })
        .collect()
}

/// Reconciles a regenerated checklist with the one the user has been editing.
///
/// Without `merge_requested` the new list wins outright. Otherwise completion
/// carries over by exact text match, and existing items whose text is absent
/// from the new list are appended unchanged.
pub fn merge(
    mut fresh: Vec<ChecklistItem>,
    existing: &[ChecklistItem],
    merge_requested: bool,
) -> Vec<ChecklistItem> {
    if !merge_requested {
        return fresh;
    }

    let completed: HashSet<&str> = existing
        .iter()
        .filter(|item| item.completed)
        .map(|item| item.text.as_str())
        .collect();
    for item in &mut fresh {
        if completed.contains(item.text.as_str()) {
            item.completed = true;
        }
    }

    let fresh_texts: HashSet<String> = fresh.iter().map(|item| item.text.clone()).collect();
    fresh.extend(
        existing
            .iter()
            .filter(|item| !fresh_texts.contains(&item.text))
            .cloned(),
    );
    fresh
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ChecklistProgress {
    pub total: usize,
    pub completed: usize,
    pub percentage: u32,
    pub categories: BTreeMap<String, CategoryProgress>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CategoryProgress {
    pub name: &'static str,
    pub icon: &'static str,
    pub color: &'static str,
    pub total: usize,
    pub completed: usize,
    pub percentage: u32,
}

pub fn progress(items: &[ChecklistItem]) -> ChecklistProgress {
    let mut categories: BTreeMap<String, CategoryProgress> = BTreeMap::new();
    for item in items {
        let entry = categories.entry(item.category.clone()).or_insert_with(|| {
            let info = checklist_templates::category_info(&item.category)
                .unwrap_or(checklist_templates::UNKNOWN_CATEGORY);
            CategoryProgress {
                name: info.name,
                icon: info.icon,
                color: info.color,
                total: 0,
                completed: 0,
                percentage: 0,
            }
        });
        entry.total += 1;
        if item.completed {
            entry.completed += 1;
        }
    }
    for entry in categories.values_mut() {
        entry.percentage = percentage(entry.completed, entry.total);
    }

    let completed = items.iter().filter(|item| item.completed).count();
    ChecklistProgress {
        total: items.len(),
        completed,
        percentage: percentage(completed, items.len()),
        categories,
    }
}

fn percentage(completed: usize, total: usize) -> u32 {
    if total == 0 {
        return 0;
    }
    ((completed as f64 / total as f64) * 100.0).round() as u32
}

/// Parses a client-submitted checklist, reporting every malformed item.
pub fn parse_submitted(raw: Vec<Value>) -> Result<Vec<ChecklistItem>, FieldErrors> {
    const REQUIRED: [&str; 4] = ["id", "text", "category", "completed"];

    let mut errors = FieldErrors::new();
    let mut items = Vec::with_capacity(raw.len());
    for (index, value) in raw.into_iter().enumerate() {
        let field = format!("checklist_data[{index}]");
        let Some(object) = value.as_object() else {
            errors.add(field, "Checklist item must be an object.");
            continue;
        };
        let missing: Vec<&str> = REQUIRED
            .into_iter()
            .filter(|key| !object.contains_key(*key))
            .collect();
        if !missing.is_empty() {
            errors.add(
                field,
                format!("Checklist item is missing required fields: {}", missing.join(", ")),
            );
            continue;
        }
        match serde_json::from_value::<ChecklistItem>(value) {
            Ok(item) => items.push(item),
            Err(err) => errors.add(field, format!("Invalid checklist item: {err}")),
        }
    }

    if errors.is_empty() {
        Ok(items)
    } else {
        Err(errors)
    }
}

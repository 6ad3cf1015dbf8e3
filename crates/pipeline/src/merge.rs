//! The merge engine: prune, key, place, reorder.
//!
//! Runs strictly after classification fan-in, single-threaded, mutating the
//! cloned template in place. Per incoming item:
//!
//! 1. trust gate on confidence;
//! 2. duplicate merge into a keyed existing item;
//! 3. section placement, merging on description-identity collision;
//! 4. fallback into the single "Undetermined" subsection.

use std::collections::HashMap;

use tracing::debug;

use reportweave_core::report::{identity_key, Category, Item, Subsection, Template};
use reportweave_core::{ClassificationDecision, ExistingItem, SectionOption, Status, WorkItem};

/// Name of the catch-all subsection for unplaceable items.
pub const UNDETERMINED: &str = "Undetermined";

/// Where one keyed pre-existing item lives in the template.
#[derive(Debug, Clone, Copy)]
pub struct ItemLocation {
    pub category: usize,
    pub subsection: usize,
    pub item: usize,
}

/// Remove every carried-over item already marked done. Completed work is
/// not retained across periods.
pub fn prune_done(template: &mut Template) -> usize {
    let mut removed = 0;
    for cat in &mut template.categories {
        for sub in &mut cat.subsections {
            let before = sub.items.len();
            sub.items.retain(|item| !item.status.is_done());
            removed += before - sub.items.len();
        }
    }
    if removed > 0 {
        debug!(removed, "pruned completed carried-over items");
    }
    removed
}

/// Assign duplicate keys to every pre-existing item in one single-threaded
/// walk. Keys are indices into the returned arrays; they must be assigned
/// before any concurrent oracle dispatch and are only valid for this build.
pub fn assign_duplicate_keys(template: &Template) -> (Vec<ExistingItem>, Vec<ItemLocation>) {
    let mut existing = Vec::new();
    let mut locations = Vec::new();
    for (ci, cat) in template.categories.iter().enumerate() {
        for (si, sub) in cat.subsections.iter().enumerate() {
            for (ii, item) in sub.items.iter().enumerate() {
                existing.push(ExistingItem {
                    key: existing.len(),
                    section_id: SectionOption::derive_id(ci, si),
                    description: item.description.clone(),
                    status: item.status.clone(),
                });
                locations.push(ItemLocation {
                    category: ci,
                    subsection: si,
                    item: ii,
                });
            }
        }
    }
    (existing, locations)
}

/// Derive the per-build section options and the id → position index.
pub fn section_options(
    template: &Template,
) -> (Vec<SectionOption>, HashMap<String, (usize, usize)>) {
    let mut options = Vec::new();
    let mut positions = HashMap::new();
    for (ci, cat) in template.categories.iter().enumerate() {
        if cat.is_marker() {
            continue;
        }
        for (si, sub) in cat.subsections.iter().enumerate() {
            let id = SectionOption::derive_id(ci, si);
            let label = if sub.name.is_empty() {
                cat.name.clone()
            } else {
                format!("{} / {}", cat.name, sub.name)
            };
            positions.insert(id.clone(), (ci, si));
            options.push(SectionOption { id, label });
        }
    }
    (options, positions)
}

/// Merge all incoming items into the template.
pub fn merge_items(
    template: &mut Template,
    items: &[WorkItem],
    decisions: &HashMap<String, ClassificationDecision>,
    existing: &[ItemLocation],
    positions: &HashMap<String, (usize, usize)>,
    confidence_threshold: f32,
) {
    for item in items {
        let decision = decisions.get(&item.id);
        let trusted = decision.is_some_and(|d| d.confidence >= confidence_threshold);

        let own_status = Status::normalize(&item.status);
        let (status, tickets) = match decision {
            Some(d) if trusted => {
                let status = if d.status.is_normalized() {
                    d.status.clone()
                } else {
                    own_status
                };
                let tickets = if d.ticket_ids.trim().is_empty() {
                    item.ticket_ids.clone()
                } else {
                    d.ticket_ids.clone()
                };
                (status, tickets)
            }
            _ => (own_status, item.ticket_ids.clone()),
        };

        if trusted {
            let d = decision.expect("trusted implies a decision");
            if let Some(key) = d.duplicate_of_key {
                if let Some(loc) = existing.get(key) {
                    debug!(item = %item.id, key, "merging into duplicate target");
                    let target =
                        &mut template.categories[loc.category].subsections[loc.subsection].items
                            [loc.item];
                    overwrite(target, item, status, tickets);
                    continue;
                }
            }
            if let Some(&(ci, si)) = positions.get(&d.section_id) {
                place(&mut template.categories[ci].subsections[si], item, status, tickets);
                continue;
            }
        }

        let (ci, si) = undetermined_slot(template);
        debug!(item = %item.id, "routing to undetermined");
        place(&mut template.categories[ci].subsections[si], item, status, tickets);
    }
}

/// Overwrite a merge target with the incoming item's field values. The
/// target keeps its author when the incoming one is blank, and keeps its
/// carried-over timestamp.
fn overwrite(target: &mut Item, incoming: &WorkItem, status: Status, tickets: String) {
    target.description = incoming.description.clone();
    target.status = status;
    target.ticket_ids = tickets;
    if !incoming.author.trim().is_empty() {
        target.author = incoming.author.clone();
    }
    target.is_new = true;
}

/// Append into a subsection, merging in place when an item with the same
/// description identity already exists there.
fn place(sub: &mut Subsection, incoming: &WorkItem, status: Status, tickets: String) {
    let key = identity_key(&incoming.description);
    if let Some(target) = sub.items.iter_mut().find(|i| i.identity_key() == key) {
        overwrite(target, incoming, status, tickets);
        return;
    }
    sub.items.push(Item {
        author: incoming.author.clone(),
        description: incoming.description.clone(),
        ticket_ids: tickets,
        status,
        reported_at: incoming.reported_at,
        is_new: true,
    });
}

/// Position of the single "Undetermined" subsection, creating it on the
/// last real category when absent.
fn undetermined_slot(template: &mut Template) -> (usize, usize) {
    if let Some(found) = template.find_subsection(UNDETERMINED) {
        return found;
    }
    let ci = match template.categories.iter().rposition(|c| !c.is_marker()) {
        Some(ci) => ci,
        None => {
            template.categories.push(Category::new(UNDETERMINED));
            template.categories.len() - 1
        }
    };
    let cat = &mut template.categories[ci];
    cat.subsections.push(Subsection::new(
        UNDETERMINED,
        format!("- **{UNDETERMINED}**"),
    ));
    (ci, cat.subsections.len() - 1)
}

/// Stable per-subsection reorder: status bucket ascending, carried-over
/// items before timestamped ones, then ascending report time.
pub fn reorder(template: &mut Template) {
    for cat in &mut template.categories {
        for sub in &mut cat.subsections {
            sub.items.sort_by_key(|item| (item.status.bucket(), item.reported_at));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use reportweave_template::parse;

    const PRIOR: &str = "## Top Focus\n- **Platform**\n- **Pat** - old migration (in progress)\n- **Sam** - retire legacy queue (done)\n## Maintenance\n- **Kim** - rotate certs (in testing)\n";

    fn work_item(id: &str, description: &str) -> WorkItem {
        WorkItem {
            id: id.into(),
            description: description.into(),
            author: "New".into(),
            status: "wip".into(),
            ticket_ids: String::new(),
            reported_at: Some(Utc.with_ymd_and_hms(2026, 8, 3, 9, 0, 0).unwrap()),
        }
    }

    fn decision(section_id: &str, confidence: f32) -> ClassificationDecision {
        ClassificationDecision {
            section_id: section_id.into(),
            confidence,
            ..Default::default()
        }
    }

    #[test]
    fn prune_removes_only_done_items() {
        let mut t = parse(PRIOR).unwrap();
        assert_eq!(t.item_count(), 3);
        assert_eq!(prune_done(&mut t), 1);
        assert_eq!(t.item_count(), 2);
        let remaining: Vec<&str> = t
            .categories
            .iter()
            .flat_map(|c| &c.subsections)
            .flat_map(|s| &s.items)
            .map(|i| i.description.as_str())
            .collect();
        assert!(!remaining.contains(&"retire legacy queue"));
    }

    #[test]
    fn duplicate_keys_are_sequential_positions() {
        let mut t = parse(PRIOR).unwrap();
        prune_done(&mut t);
        let (existing, locations) = assign_duplicate_keys(&t);
        assert_eq!(existing.len(), 2);
        assert_eq!(existing[0].key, 0);
        assert_eq!(existing[0].description, "old migration");
        assert_eq!(existing[0].section_id, "s0-0");
        assert_eq!(existing[1].key, 1);
        assert_eq!(existing[1].section_id, "s1-0");
        assert_eq!(locations[1].category, 1);
        assert_eq!(locations[1].item, 0);
    }

    #[test]
    fn section_options_skip_markers_and_label_positions() {
        let t = parse("## A\n- **Sub**\n- x\n# Marker\n## B\n- y\n").unwrap();
        let (options, positions) = section_options(&t);
        assert_eq!(options.len(), 2);
        assert_eq!(options[0].id, "s0-0");
        assert_eq!(options[0].label, "A / Sub");
        assert_eq!(options[1].label, "B");
        assert_eq!(positions["s2-0"], (2, 0));
    }

    #[test]
    fn trusted_decision_places_item_in_section() {
        let mut t = parse(PRIOR).unwrap();
        prune_done(&mut t);
        let (_, locations) = assign_duplicate_keys(&t);
        let (_, positions) = section_options(&t);
        let decisions = HashMap::from([("n1".to_string(), decision("s1-0", 0.9))]);
        merge_items(
            &mut t,
            &[work_item("n1", "patch the bastion host")],
            &decisions,
            &locations,
            &positions,
            0.70,
        );
        let sub = &t.categories[1].subsections[0];
        assert_eq!(sub.items.len(), 2);
        let added = &sub.items[1];
        assert_eq!(added.description, "patch the bastion host");
        assert!(added.is_new);
        assert!(added.reported_at.is_some());
        assert_eq!(added.status, Status::InProgress);
    }

    #[test]
    fn untrusted_decision_falls_back_to_undetermined_with_own_fields() {
        let mut t = parse(PRIOR).unwrap();
        prune_done(&mut t);
        let (_, locations) = assign_duplicate_keys(&t);
        let (_, positions) = section_options(&t);
        let mut low = decision("s1-0", 0.4);
        low.status = Status::Done;
        low.ticket_ids = "ORACLE-1".into();
        let decisions = HashMap::from([("n1".to_string(), low)]);
        let mut item = work_item("n1", "mystery work");
        item.ticket_ids = "OWN-1".into();
        merge_items(&mut t, &[item], &decisions, &locations, &positions, 0.70);

        let (ci, si) = t.find_subsection(UNDETERMINED).expect("auto-created");
        let placed = &t.categories[ci].subsections[si].items[0];
        // The oracle's status and tickets are ignored below threshold.
        assert_eq!(placed.status, Status::InProgress);
        assert_eq!(placed.ticket_ids, "OWN-1");
    }

    #[test]
    fn duplicate_merge_overwrites_in_place_without_growth() {
        let mut t = parse(PRIOR).unwrap();
        prune_done(&mut t);
        let before = t.item_count();
        let (_, locations) = assign_duplicate_keys(&t);
        let (_, positions) = section_options(&t);
        let mut d = decision("s0-0", 0.95);
        d.duplicate_of_key = Some(0);
        d.status = Status::InTesting;
        let decisions = HashMap::from([("n1".to_string(), d)]);
        merge_items(
            &mut t,
            &[work_item("n1", "old migration, now with retries")],
            &decisions,
            &locations,
            &positions,
            0.70,
        );

        assert_eq!(t.item_count(), before);
        let target = &t.categories[0].subsections[0].items[0];
        assert_eq!(target.description, "old migration, now with retries");
        assert_eq!(target.status, Status::InTesting);
        assert_eq!(target.author, "New");
        // Still carried-over for ordering purposes.
        assert!(target.reported_at.is_none());
        assert!(target.is_new);
    }

    #[test]
    fn duplicate_merge_keeps_author_when_incoming_blank() {
        let mut t = parse(PRIOR).unwrap();
        prune_done(&mut t);
        let (_, locations) = assign_duplicate_keys(&t);
        let (_, positions) = section_options(&t);
        let mut d = decision("s0-0", 0.95);
        d.duplicate_of_key = Some(0);
        let decisions = HashMap::from([("n1".to_string(), d)]);
        let mut item = work_item("n1", "old migration continues");
        item.author = "  ".into();
        merge_items(&mut t, &[item], &decisions, &locations, &positions, 0.70);
        assert_eq!(t.categories[0].subsections[0].items[0].author, "Pat");
    }

    #[test]
    fn unresolvable_duplicate_key_falls_through_to_section() {
        let mut t = parse(PRIOR).unwrap();
        prune_done(&mut t);
        let (_, locations) = assign_duplicate_keys(&t);
        let (_, positions) = section_options(&t);
        let mut d = decision("s1-0", 0.95);
        d.duplicate_of_key = Some(99);
        let decisions = HashMap::from([("n1".to_string(), d)]);
        merge_items(
            &mut t,
            &[work_item("n1", "fresh ops work")],
            &decisions,
            &locations,
            &positions,
            0.70,
        );
        assert_eq!(t.categories[1].subsections[0].items.len(), 2);
    }

    #[test]
    fn same_identity_in_target_section_merges_with_later_values() {
        let mut t = parse(PRIOR).unwrap();
        prune_done(&mut t);
        let (_, locations) = assign_duplicate_keys(&t);
        let (_, positions) = section_options(&t);
        let decisions = HashMap::from([
            ("n1".to_string(), decision("s1-0", 0.9)),
            ("n2".to_string(), decision("s1-0", 0.9)),
        ]);
        let mut second = work_item("n2", "  Harden The Gateway ");
        second.ticket_ids = "OPS-2".into();
        merge_items(
            &mut t,
            &[work_item("n1", "harden the gateway"), second],
            &decisions,
            &locations,
            &positions,
            0.70,
        );
        let sub = &t.categories[1].subsections[0];
        // rotate certs + exactly one gateway item
        assert_eq!(sub.items.len(), 2);
        let merged = &sub.items[1];
        assert_eq!(merged.description, "  Harden The Gateway ");
        assert_eq!(merged.ticket_ids, "OPS-2");
    }

    #[test]
    fn undetermined_is_reused_not_duplicated() {
        let mut t = parse(PRIOR).unwrap();
        prune_done(&mut t);
        let (_, locations) = assign_duplicate_keys(&t);
        let (_, positions) = section_options(&t);
        let decisions = HashMap::new();
        merge_items(
            &mut t,
            &[work_item("n1", "first mystery"), work_item("n2", "second mystery")],
            &decisions,
            &locations,
            &positions,
            0.70,
        );
        let undetermined_count = t
            .categories
            .iter()
            .flat_map(|c| &c.subsections)
            .filter(|s| s.name == UNDETERMINED)
            .count();
        assert_eq!(undetermined_count, 1);
        let (ci, si) = t.find_subsection(UNDETERMINED).unwrap();
        assert_eq!(t.categories[ci].subsections[si].items.len(), 2);
    }

    #[test]
    fn reorder_buckets_then_carried_over_then_time() {
        let mut t = parse("## A\n- **Sub**\n").unwrap();
        let at = |day: u32| Some(Utc.with_ymd_and_hms(2026, 8, day, 0, 0, 0).unwrap());
        let mk = |desc: &str, status: Status, reported_at| Item {
            author: String::new(),
            description: desc.into(),
            ticket_ids: String::new(),
            status,
            reported_at,
            is_new: false,
        };
        let sub = &mut t.categories[0].subsections[0];
        sub.items = vec![
            mk("late wip", Status::InProgress, at(5)),
            mk("other", Status::Other("blocked".into()), None),
            mk("early wip", Status::InProgress, at(2)),
            mk("carried wip", Status::InProgress, None),
            mk("tested", Status::InTesting, at(3)),
            mk("shipped", Status::Done, at(4)),
        ];
        reorder(&mut t);
        let order: Vec<&str> = t.categories[0].subsections[0]
            .items
            .iter()
            .map(|i| i.description.as_str())
            .collect();
        assert_eq!(
            order,
            vec!["shipped", "tested", "carried wip", "early wip", "late wip", "other"]
        );
    }

    #[test]
    fn reorder_is_stable_for_equal_keys() {
        let mut t = parse("## A\n- **Sub**\n").unwrap();
        let mk = |desc: &str| Item {
            author: String::new(),
            description: desc.into(),
            ticket_ids: String::new(),
            status: Status::InProgress,
            reported_at: None,
            is_new: false,
        };
        let sub = &mut t.categories[0].subsections[0];
        sub.items = vec![mk("first"), mk("second"), mk("third")];
        reorder(&mut t);
        let order: Vec<&str> = t.categories[0].subsections[0]
            .items
            .iter()
            .map(|i| i.description.as_str())
            .collect();
        assert_eq!(order, vec!["first", "second", "third"]);
    }
}

//! Pure tree logic over flat rows fetched from Postgres.
//!
//! Collections form an arbitrary-depth tree via `parent_id`; the mega menu is
//! a second, independently-parented tree over the same collections. Both
//! builders work the same way: recursively collect the children of the
//! current node, starting from the rows with no parent. Cycles are prevented
//! at write time (see `would_create_cycle`), not detected at read time.

use std::collections::{HashMap, HashSet};

use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::Collection;

/// A collection with its subtree and aggregated product counts.
#[derive(Debug, Serialize, ToSchema)]
pub struct CollectionNode {
    #[serde(flatten)]
    pub collection: Collection,
    /// Products directly attached to this collection.
    pub products_count: i64,
    /// Direct count plus the totals of every descendant.
    pub total_products_count: i64,
    pub children: Vec<CollectionNode>,
}

/// Build the nested collection forest from flat rows.
///
/// `direct_counts` maps collection id to the number of directly attached
/// products; collections without an entry count as zero. Totals roll up
/// bottom-up while the tree is built. Children are ordered by name.
pub fn build_collection_tree(
    rows: &[Collection],
    direct_counts: &HashMap<Uuid, i64>,
) -> Vec<CollectionNode> {
    let mut by_parent: HashMap<Option<Uuid>, Vec<&Collection>> = HashMap::new();
    for row in rows {
        by_parent.entry(row.parent_id).or_default().push(row);
    }
    for children in by_parent.values_mut() {
        children.sort_by(|a, b| a.name.cmp(&b.name));
    }

    build_collection_level(None, &by_parent, direct_counts)
}

fn build_collection_level(
    parent: Option<Uuid>,
    by_parent: &HashMap<Option<Uuid>, Vec<&Collection>>,
    direct_counts: &HashMap<Uuid, i64>,
) -> Vec<CollectionNode> {
    let Some(rows) = by_parent.get(&parent) else {
        return Vec::new();
    };

    rows.iter()
        .map(|row| {
            let children = build_collection_level(Some(row.id), by_parent, direct_counts);
            let products_count = direct_counts.get(&row.id).copied().unwrap_or(0);
            let total_products_count = products_count
                + children
                    .iter()
                    .map(|c| c.total_products_count)
                    .sum::<i64>();
            CollectionNode {
                collection: (*row).clone(),
                products_count,
                total_products_count,
                children,
            }
        })
        .collect()
}

/// Walk the `parent_id` chain upward from `start`, excluding `start` itself.
/// Returned closest-first. A visited set guards the walk so corrupt data
/// cannot loop forever.
pub fn ancestor_chain(parents: &HashMap<Uuid, Option<Uuid>>, start: Uuid) -> Vec<Uuid> {
    let mut chain = Vec::new();
    let mut seen = HashSet::new();
    seen.insert(start);

    let mut current = parents.get(&start).copied().flatten();
    while let Some(id) = current {
        if !seen.insert(id) {
            break;
        }
        chain.push(id);
        current = parents.get(&id).copied().flatten();
    }
    chain
}

/// True when assigning `new_parent` as the parent of `id` would close a loop:
/// the node itself, or any node whose ancestor chain already contains `id`.
pub fn would_create_cycle(
    parents: &HashMap<Uuid, Option<Uuid>>,
    id: Uuid,
    new_parent: Uuid,
) -> bool {
    if id == new_parent {
        return true;
    }
    ancestor_chain(parents, new_parent).contains(&id)
}

/// All descendant ids of `root`, excluding `root` itself.
pub fn descendant_ids(parents: &HashMap<Uuid, Option<Uuid>>, root: Uuid) -> Vec<Uuid> {
    let mut children: HashMap<Uuid, Vec<Uuid>> = HashMap::new();
    for (id, parent) in parents {
        if let Some(parent) = parent {
            children.entry(*parent).or_default().push(*id);
        }
    }

    let mut out = Vec::new();
    let mut queue = vec![root];
    let mut seen = HashSet::new();
    seen.insert(root);
    while let Some(next) = queue.pop() {
        if let Some(kids) = children.get(&next) {
            for kid in kids {
                if seen.insert(*kid) {
                    out.push(*kid);
                    queue.push(*kid);
                }
            }
        }
    }
    out
}

/// A mega-menu row joined with the collection it points at.
#[derive(Debug, Clone, Serialize, ToSchema, sqlx::FromRow)]
pub struct MenuRow {
    pub id: Uuid,
    pub collection_id: Uuid,
    pub parent_menu_item_id: Option<Uuid>,
    pub position: i32,
    pub level: i32,
    pub is_active: bool,
    pub is_featured: bool,
    pub display_subcollections: bool,
    pub collection_name: String,
    pub collection_slug: String,
    pub collection_type: String,
}

/// A brand entry surfaced in a top-level category's flattened list.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct FeaturedBrand {
    pub menu_item_id: Uuid,
    pub collection_id: Uuid,
    pub name: String,
    pub slug: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MenuNode {
    #[serde(flatten)]
    pub row: MenuRow,
    pub children: Vec<MenuNode>,
    /// Featured brand descendants, flattened; only populated on top-level
    /// nodes.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub featured_brands: Vec<FeaturedBrand>,
}

/// Build the navigation forest. Same recursive shape as the collection tree
/// but keyed on `parent_menu_item_id` and ordered by `position`. Top-level
/// nodes additionally get every featured brand in their subtree flattened
/// into `featured_brands`.
pub fn build_menu_tree(rows: &[MenuRow]) -> Vec<MenuNode> {
    let mut by_parent: HashMap<Option<Uuid>, Vec<&MenuRow>> = HashMap::new();
    for row in rows {
        by_parent.entry(row.parent_menu_item_id).or_default().push(row);
    }
    for children in by_parent.values_mut() {
        children.sort_by_key(|r| r.position);
    }

    let mut roots = build_menu_level(None, &by_parent);
    for root in &mut roots {
        let mut brands = Vec::new();
        collect_featured_brands(&root.children, &mut brands);
        root.featured_brands = brands;
    }
    roots
}

fn build_menu_level(
    parent: Option<Uuid>,
    by_parent: &HashMap<Option<Uuid>, Vec<&MenuRow>>,
) -> Vec<MenuNode> {
    let Some(rows) = by_parent.get(&parent) else {
        return Vec::new();
    };

    rows.iter()
        .map(|row| MenuNode {
            row: (*row).clone(),
            children: build_menu_level(Some(row.id), by_parent),
            featured_brands: Vec::new(),
        })
        .collect()
}

fn collect_featured_brands(nodes: &[MenuNode], out: &mut Vec<FeaturedBrand>) {
    for node in nodes {
        if node.row.is_featured && node.row.collection_type == "brand" {
            out.push(FeaturedBrand {
                menu_item_id: node.row.id,
                collection_id: node.row.collection_id,
                name: node.row.collection_name.clone(),
                slug: node.row.collection_slug.clone(),
            });
        }
        collect_featured_brands(&node.children, out);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn uid(n: u128) -> Uuid {
        Uuid::from_u128(n)
    }

    fn collection(n: u128, parent: Option<u128>, name: &str) -> Collection {
        Collection {
            id: uid(n),
            name: name.to_string(),
            slug: name.to_lowercase().replace(' ', "-"),
            description: None,
            parent_id: parent.map(uid),
            collection_type: "category".to_string(),
            level: 0,
            is_active: true,
            is_featured: false,
            image_url: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn menu_row(n: u128, parent: Option<u128>, position: i32) -> MenuRow {
        MenuRow {
            id: uid(n),
            collection_id: uid(n + 100),
            parent_menu_item_id: parent.map(uid),
            position,
            level: 0,
            is_active: true,
            is_featured: false,
            display_subcollections: false,
            collection_name: format!("Collection {n}"),
            collection_slug: format!("collection-{n}"),
            collection_type: "category".to_string(),
        }
    }

    #[test]
    fn empty_input_builds_empty_forest() {
        let tree = build_collection_tree(&[], &HashMap::new());
        assert!(tree.is_empty());
    }

    #[test]
    fn single_root_builds_one_node_without_children() {
        let rows = vec![collection(1, None, "Electronics")];
        let tree = build_collection_tree(&rows, &HashMap::new());
        assert_eq!(tree.len(), 1);
        assert!(tree[0].children.is_empty());
        assert_eq!(tree[0].total_products_count, 0);
    }

    #[test]
    fn totals_roll_up_over_the_subtree() {
        // Electronics -> Phones -> Smartphones, Electronics -> Laptops
        let rows = vec![
            collection(1, None, "Electronics"),
            collection(2, Some(1), "Phones"),
            collection(3, Some(2), "Smartphones"),
            collection(4, Some(1), "Laptops"),
        ];
        let counts =
            HashMap::from([(uid(1), 2_i64), (uid(2), 3), (uid(3), 5), (uid(4), 7)]);

        let tree = build_collection_tree(&rows, &counts);
        assert_eq!(tree.len(), 1);
        let root = &tree[0];
        assert_eq!(root.products_count, 2);
        assert_eq!(root.total_products_count, 2 + 3 + 5 + 7);

        // For every node: total == direct + sum of child totals.
        fn check(node: &CollectionNode) {
            let child_sum: i64 = node.children.iter().map(|c| c.total_products_count).sum();
            assert_eq!(node.total_products_count, node.products_count + child_sum);
            node.children.iter().for_each(check);
        }
        tree.iter().for_each(check);

        let phones = root
            .children
            .iter()
            .find(|c| c.collection.name == "Phones")
            .unwrap();
        assert_eq!(phones.total_products_count, 3 + 5);
    }

    #[test]
    fn children_are_ordered_by_name() {
        let rows = vec![
            collection(1, None, "Electronics"),
            collection(2, Some(1), "Phones"),
            collection(3, Some(1), "Audio"),
            collection(4, Some(1), "Laptops"),
        ];
        let tree = build_collection_tree(&rows, &HashMap::new());
        let names: Vec<_> = tree[0]
            .children
            .iter()
            .map(|c| c.collection.name.as_str())
            .collect();
        assert_eq!(names, ["Audio", "Laptops", "Phones"]);
    }

    #[test]
    fn ancestor_chain_walks_to_the_root() {
        let parents = HashMap::from([
            (uid(1), None),
            (uid(2), Some(uid(1))),
            (uid(3), Some(uid(2))),
        ]);
        assert_eq!(ancestor_chain(&parents, uid(3)), vec![uid(2), uid(1)]);
        assert_eq!(ancestor_chain(&parents, uid(1)), Vec::<Uuid>::new());
    }

    #[test]
    fn ancestor_chain_survives_corrupt_cycles() {
        let parents = HashMap::from([(uid(1), Some(uid(2))), (uid(2), Some(uid(1)))]);
        let chain = ancestor_chain(&parents, uid(1));
        assert_eq!(chain, vec![uid(2)]);
    }

    #[test]
    fn reparenting_under_a_descendant_is_a_cycle() {
        let parents = HashMap::from([
            (uid(1), None),
            (uid(2), Some(uid(1))),
            (uid(3), Some(uid(2))),
        ]);
        assert!(would_create_cycle(&parents, uid(1), uid(3)));
        assert!(would_create_cycle(&parents, uid(1), uid(1)));
        assert!(!would_create_cycle(&parents, uid(3), uid(1)));
    }

    #[test]
    fn descendant_ids_cover_the_whole_subtree() {
        let parents = HashMap::from([
            (uid(1), None),
            (uid(2), Some(uid(1))),
            (uid(3), Some(uid(2))),
            (uid(4), Some(uid(1))),
            (uid(5), None),
        ]);
        let mut ids = descendant_ids(&parents, uid(1));
        ids.sort();
        assert_eq!(ids, vec![uid(2), uid(3), uid(4)]);
        assert!(descendant_ids(&parents, uid(5)).is_empty());
    }

    #[test]
    fn menu_children_are_ordered_by_position() {
        let rows = vec![
            menu_row(1, None, 0),
            menu_row(2, Some(1), 2),
            menu_row(3, Some(1), 1),
        ];
        let tree = build_menu_tree(&rows);
        assert_eq!(tree.len(), 1);
        let positions: Vec<_> = tree[0].children.iter().map(|c| c.row.position).collect();
        assert_eq!(positions, [1, 2]);
    }

    #[test]
    fn featured_brands_flatten_to_the_top_level() {
        let mut brand = menu_row(4, Some(3), 0);
        brand.is_featured = true;
        brand.collection_type = "brand".to_string();
        brand.collection_name = "Acme".to_string();
        brand.collection_slug = "acme".to_string();

        let mut unfeatured_brand = menu_row(5, Some(3), 1);
        unfeatured_brand.collection_type = "brand".to_string();

        let rows = vec![
            menu_row(1, None, 0),
            menu_row(3, Some(1), 0),
            brand,
            unfeatured_brand,
        ];
        let tree = build_menu_tree(&rows);
        assert_eq!(tree.len(), 1);
        let brands = &tree[0].featured_brands;
        assert_eq!(brands.len(), 1);
        assert_eq!(brands[0].name, "Acme");
        // Nested nodes carry no flattened list of their own.
        assert!(tree[0].children[0].featured_brands.is_empty());
    }
}

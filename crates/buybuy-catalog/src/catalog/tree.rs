//! Category store: an id-addressed arena holding the category tree.
//!
//! Parents are stored as `Option<CategoryId>` and a children index is kept
//! alongside, so ancestor and descendant walks are map lookups. Every walk is
//! iterative; descendant walks are bounded by the configured traversal budget.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::catalog::category::{
    Breadcrumb, Category, CategoryNode, NewCategory, MAX_NAME_LEN, MAX_SORT_ORDER,
};
use crate::config::CatalogConfig;
use crate::error::{CatalogError, CatalogResult, FieldErrors};
use crate::ids::CategoryId;
use crate::slug::slugify;

/// The category tree.
#[derive(Debug, Clone)]
pub struct CategoryStore {
    nodes: BTreeMap<CategoryId, Category>,
    children: HashMap<CategoryId, BTreeSet<CategoryId>>,
    slugs: HashMap<String, CategoryId>,
    next_id: CategoryId,
    max_depth: usize,
    traversal_budget: usize,
}

impl CategoryStore {
    /// Create an empty store.
    pub fn new(config: &CatalogConfig) -> Self {
        Self {
            nodes: BTreeMap::new(),
            children: HashMap::new(),
            slugs: HashMap::new(),
            next_id: CategoryId::new(1),
            max_depth: config.max_depth,
            traversal_budget: config.traversal_budget,
        }
    }

    /// Rebuild a store from persisted categories, re-checking every invariant.
    pub fn from_categories(
        config: &CatalogConfig,
        categories: Vec<Category>,
    ) -> CatalogResult<Self> {
        let mut store = Self::new(config);

        for category in categories {
            if store.nodes.contains_key(&category.id) {
                return Err(CatalogError::Snapshot(format!(
                    "duplicate category id {}",
                    category.id
                )));
            }
            if let Some(owner) = store.slugs.get(&category.slug) {
                return Err(CatalogError::Snapshot(format!(
                    "slug '{}' is used by categories {} and {}",
                    category.slug, owner, category.id
                )));
            }
            if category.id >= store.next_id {
                store.next_id = category.id.next().ok_or_else(|| {
                    CatalogError::Snapshot(format!("category id {} leaves no room for new ids", category.id))
                })?;
            }
            store.slugs.insert(category.slug.clone(), category.id);
            store.nodes.insert(category.id, category);
        }

        let links: Vec<(CategoryId, CategoryId)> = store
            .nodes
            .values()
            .filter_map(|c| c.parent_id.map(|parent| (parent, c.id)))
            .collect();
        for (parent, child) in links {
            if !store.nodes.contains_key(&parent) {
                return Err(CatalogError::Snapshot(format!(
                    "category {} references missing parent {}",
                    child, parent
                )));
            }
            store.children.entry(parent).or_default().insert(child);
        }

        let ids: Vec<CategoryId> = store.nodes.keys().copied().collect();
        for id in ids {
            let depth = store
                .ancestor_ids(id)
                .map_err(|e| CatalogError::Snapshot(e.to_string()))?
                .len();
            if depth >= store.max_depth {
                return Err(CatalogError::Snapshot(format!(
                    "category {} sits at level {}, deeper than the limit of {} levels",
                    id, depth, store.max_depth
                )));
            }
        }

        debug!(categories = store.nodes.len(), "category store loaded");
        Ok(store)
    }

    /// Number of categories.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Check if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Check whether an id is known.
    pub fn contains(&self, id: CategoryId) -> bool {
        self.nodes.contains_key(&id)
    }

    /// Look up a category, failing with `NotFound`.
    pub fn get(&self, id: CategoryId) -> CatalogResult<&Category> {
        self.nodes
            .get(&id)
            .ok_or_else(|| CatalogError::category_not_found(id))
    }

    /// Look up a category by slug.
    pub fn by_slug(&self, slug: &str) -> Option<&Category> {
        self.slugs.get(slug).and_then(|id| self.nodes.get(id))
    }

    /// All categories in id order.
    pub fn iter(&self) -> impl Iterator<Item = &Category> {
        self.nodes.values()
    }

    /// Owned copy of every category, in id order.
    pub fn to_vec(&self) -> Vec<Category> {
        self.nodes.values().cloned().collect()
    }

    /// Create a category.
    ///
    /// Rejects empty or overlong names, out-of-range sort positions, slug
    /// collisions, and parents that are unknown, inactive, or too deep.
    pub fn create(&mut self, input: NewCategory) -> CatalogResult<Category> {
        let mut errors = FieldErrors::new();

        let name = validate_name(&input.name, &mut errors);
        validate_sort_order(input.sort_order, &mut errors);
        let slug = name.as_deref().map(slugify);
        if let Some(slug) = slug.as_deref() {
            self.check_slug(slug, None, &mut errors);
        }
        if let Some(parent) = input.parent_id {
            self.check_parent(None, parent, &mut errors)?;
        }

        if let Err(e) = errors.into_result() {
            debug!(name = %input.name, error = %e, "category rejected");
            return Err(e);
        }

        // Both are Some once validation passed.
        let (Some(name), Some(slug)) = (name, slug) else {
            return Err(CatalogError::invalid("name", "must not be empty"));
        };

        let id = self.next_id;
        let next_id = id
            .next()
            .ok_or_else(|| CatalogError::Conflict("category ids are exhausted".to_string()))?;
        self.next_id = next_id;

        let now = Utc::now();
        let category = Category {
            id,
            name,
            slug,
            description: clean_optional(input.description),
            parent_id: input.parent_id,
            is_active: input.is_active,
            sort_order: input.sort_order,
            created_at: now,
            updated_at: now,
        };

        self.slugs.insert(category.slug.clone(), id);
        self.link(id, category.parent_id);
        self.nodes.insert(id, category.clone());

        info!(category_id = %id, slug = %category.slug, parent = ?category.parent_id, "category created");
        Ok(category)
    }

    /// Ancestors ordered from the root down to the immediate parent.
    pub fn ancestors(&self, id: CategoryId) -> CatalogResult<Vec<&Category>> {
        let mut ids = self.ancestor_ids(id)?;
        ids.reverse();
        ids.into_iter().map(|a| self.get(a)).collect()
    }

    /// Every category reachable through child links, in breadth-first order.
    ///
    /// The starting category is not included.
    pub fn descendants(&self, id: CategoryId) -> CatalogResult<Vec<CategoryId>> {
        self.get(id)?;

        let mut found = Vec::new();
        let mut queue = VecDeque::from([id]);
        while let Some(current) = queue.pop_front() {
            let Some(kids) = self.children.get(&current) else {
                continue;
            };
            for &kid in kids {
                if found.len() >= self.traversal_budget {
                    return Err(CatalogError::TraversalLimit {
                        id: id.to_string(),
                        budget: self.traversal_budget,
                    });
                }
                found.push(kid);
                queue.push_back(kid);
            }
        }

        Ok(found)
    }

    /// The category itself plus all of its descendants.
    pub fn subtree(&self, id: CategoryId) -> CatalogResult<HashSet<CategoryId>> {
        let mut ids: HashSet<CategoryId> = self.descendants(id)?.into_iter().collect();
        ids.insert(id);
        Ok(ids)
    }

    /// Breadcrumb path from the root to the category itself.
    pub fn full_path(&self, id: CategoryId) -> CatalogResult<Vec<Breadcrumb>> {
        let node = self.get(id)?;
        let mut path: Vec<Breadcrumb> = self.ancestors(id)?.iter().map(|c| c.crumb()).collect();
        path.push(node.crumb());
        Ok(path)
    }

    /// Human-readable path such as `Electronics > Phones > Smartphones`.
    pub fn full_path_label(&self, id: CategoryId) -> CatalogResult<String> {
        let names: Vec<String> = self.full_path(id)?.into_iter().map(|c| c.name).collect();
        Ok(names.join(" > "))
    }

    /// Level in the hierarchy (0 for roots).
    pub fn depth(&self, id: CategoryId) -> CatalogResult<usize> {
        Ok(self.ancestor_ids(id)?.len())
    }

    /// Direct children ordered by sort position, then name.
    pub fn children(&self, id: CategoryId) -> CatalogResult<Vec<&Category>> {
        self.get(id)?;
        Ok(self.ordered_children(id))
    }

    /// Root categories ordered by sort position, then name.
    pub fn roots(&self) -> Vec<&Category> {
        let mut roots: Vec<&Category> = self.nodes.values().filter(|c| c.is_root()).collect();
        sort_siblings(&mut roots);
        roots
    }

    /// Categories in sibling order, optionally only the children of
    /// `parent` (`Some(None)` selects the roots).
    pub fn listing(
        &self,
        parent: Option<Option<CategoryId>>,
        active_only: bool,
    ) -> CatalogResult<Vec<&Category>> {
        if let Some(Some(id)) = parent {
            self.get(id)?;
        }
        let mut listed: Vec<&Category> = self
            .nodes
            .values()
            .filter(|c| !active_only || c.is_active)
            .filter(|c| parent.map_or(true, |p| c.parent_id == p))
            .collect();
        sort_siblings(&mut listed);
        Ok(listed)
    }

    /// Check whether the category has no children.
    pub fn is_leaf(&self, id: CategoryId) -> CatalogResult<bool> {
        self.get(id)?;
        Ok(!self.children.contains_key(&id))
    }

    /// A category is visible when it and every ancestor are active.
    pub fn is_visible(&self, id: CategoryId) -> CatalogResult<bool> {
        if !self.get(id)?.is_active {
            return Ok(false);
        }
        for ancestor in self.ancestor_ids(id)? {
            if !self.get(ancestor)?.is_active {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Ids of every visible category, computed in one pass from the roots.
    pub fn visible_ids(&self) -> HashSet<CategoryId> {
        let mut visible = HashSet::new();
        let mut queue: VecDeque<CategoryId> = self
            .nodes
            .values()
            .filter(|c| c.is_root() && c.is_active)
            .map(|c| c.id)
            .collect();

        while let Some(id) = queue.pop_front() {
            visible.insert(id);
            if let Some(kids) = self.children.get(&id) {
                for kid in kids {
                    if self.nodes.get(kid).is_some_and(|c| c.is_active) {
                        queue.push_back(*kid);
                    }
                }
            }
        }

        visible
    }

    /// Nested tree of active categories; inactive subtrees are left out.
    pub fn tree(&self) -> Vec<CategoryNode> {
        self.roots()
            .into_iter()
            .filter(|c| c.is_active)
            .map(|c| self.build_node(c))
            .collect()
    }

    /// Flip the active flag of one category. Descendants are not touched.
    pub fn set_active(&mut self, id: CategoryId, active: bool) -> CatalogResult<Category> {
        let node = self.node_mut(id)?;
        if node.is_active != active {
            node.is_active = active;
            node.updated_at = Utc::now();
            info!(category_id = %id, active, "category activity changed");
        }
        Ok(node.clone())
    }

    /// Move a category under a new parent, or to the root when `None`.
    ///
    /// The move is rejected when the new parent is the category itself or one
    /// of its descendants, is inactive, or would push the subtree past the
    /// depth limit.
    pub fn reparent(
        &mut self,
        id: CategoryId,
        new_parent: Option<CategoryId>,
    ) -> CatalogResult<Category> {
        let old_parent = self.get(id)?.parent_id;

        if let Some(parent) = new_parent {
            let mut errors = FieldErrors::new();
            self.check_parent(Some(id), parent, &mut errors)?;
            if let Err(e) = errors.into_result() {
                warn!(category_id = %id, parent = %parent, error = %e, "reparent rejected");
                return Err(e);
            }
        }

        if old_parent != new_parent {
            self.unlink(id, old_parent);
            self.link(id, new_parent);
            let node = self.node_mut(id)?;
            node.parent_id = new_parent;
            node.updated_at = Utc::now();
            info!(category_id = %id, from = ?old_parent, to = ?new_parent, "category moved");
        }

        self.get(id).cloned()
    }

    /// Rename a category; the slug is derived again from the new name.
    pub fn rename(&mut self, id: CategoryId, name: &str) -> CatalogResult<Category> {
        let old_slug = self.get(id)?.slug.clone();

        let mut errors = FieldErrors::new();
        let name = validate_name(name, &mut errors);
        let slug = name.as_deref().map(slugify);
        if let Some(slug) = slug.as_deref() {
            self.check_slug(slug, Some(id), &mut errors);
        }
        errors.into_result()?;
        let (Some(name), Some(slug)) = (name, slug) else {
            return Err(CatalogError::invalid("name", "must not be empty"));
        };

        self.slugs.remove(&old_slug);
        self.slugs.insert(slug.clone(), id);
        let node = self.node_mut(id)?;
        node.name = name;
        node.slug = slug;
        node.updated_at = Utc::now();
        Ok(node.clone())
    }

    /// Change the display position of a category.
    pub fn set_sort_order(&mut self, id: CategoryId, sort_order: i32) -> CatalogResult<Category> {
        let mut errors = FieldErrors::new();
        validate_sort_order(sort_order, &mut errors);
        errors.into_result()?;

        let node = self.node_mut(id)?;
        node.sort_order = sort_order;
        node.updated_at = Utc::now();
        Ok(node.clone())
    }

    /// Remove a category, re-parenting its direct children to the root.
    ///
    /// `attached_products` is the number of products referencing the
    /// category directly; any attachment blocks the deletion.
    pub fn delete(&mut self, id: CategoryId, attached_products: usize) -> CatalogResult<Category> {
        let parent = self.get(id)?.parent_id;
        if attached_products > 0 {
            warn!(category_id = %id, attached_products, "category delete blocked");
            return Err(CatalogError::Conflict(format!(
                "category {} still has {} product(s) attached",
                id, attached_products
            )));
        }

        let orphans = self.children.remove(&id).unwrap_or_default();
        let now = Utc::now();
        for child in &orphans {
            if let Some(node) = self.nodes.get_mut(child) {
                node.parent_id = None;
                node.updated_at = now;
            }
        }

        self.unlink(id, parent);
        let removed = self
            .nodes
            .remove(&id)
            .ok_or_else(|| CatalogError::category_not_found(id))?;
        self.slugs.remove(&removed.slug);

        info!(category_id = %id, orphaned = orphans.len(), "category deleted");
        Ok(removed)
    }

    // === internals ===

    /// Ancestor ids, closest first.
    fn ancestor_ids(&self, id: CategoryId) -> CatalogResult<Vec<CategoryId>> {
        let mut current = self.get(id)?.parent_id;
        let mut ids = Vec::new();

        while let Some(parent) = current {
            if parent == id || ids.len() > self.nodes.len() {
                return Err(CatalogError::Conflict(format!(
                    "category {} is part of a parent cycle",
                    id
                )));
            }
            ids.push(parent);
            current = self.get(parent)?.parent_id;
        }

        Ok(ids)
    }

    /// Number of levels below a category (0 for a leaf).
    fn height(&self, id: CategoryId) -> CatalogResult<usize> {
        let mut level = vec![id];
        let mut height = 0;
        let mut visited = 0;

        loop {
            let next: Vec<CategoryId> = level
                .iter()
                .filter_map(|n| self.children.get(n))
                .flatten()
                .copied()
                .collect();
            if next.is_empty() {
                return Ok(height);
            }
            visited += next.len();
            if visited > self.traversal_budget {
                return Err(CatalogError::TraversalLimit {
                    id: id.to_string(),
                    budget: self.traversal_budget,
                });
            }
            height += 1;
            level = next;
        }
    }

    /// Validate a proposed parent for `node` (`None` while creating).
    fn check_parent(
        &self,
        node: Option<CategoryId>,
        parent: CategoryId,
        errors: &mut FieldErrors,
    ) -> CatalogResult<()> {
        let Some(parent_node) = self.nodes.get(&parent) else {
            errors.add("parent", format!("category {} does not exist", parent));
            return Ok(());
        };

        if let Some(node) = node {
            if node == parent {
                errors.add("parent", "a category cannot be its own parent");
                return Ok(());
            }
            if self.ancestor_ids(parent)?.contains(&node) {
                errors.add(
                    "parent",
                    format!(
                        "moving category {} under {} would create a cycle",
                        node, parent
                    ),
                );
                return Ok(());
            }
        }

        if !parent_node.is_active {
            errors.add("parent", "parent category must be active");
        }

        let subtree_height = match node {
            Some(node) => self.height(node)?,
            None => 0,
        };
        let deepest = self.depth(parent)? + 1 + subtree_height;
        if deepest >= self.max_depth {
            errors.add(
                "parent",
                format!(
                    "maximum nesting depth of {} levels would be exceeded",
                    self.max_depth
                ),
            );
        }

        Ok(())
    }

    fn check_slug(&self, slug: &str, owner: Option<CategoryId>, errors: &mut FieldErrors) {
        if slug.is_empty() {
            errors.add("name", "must contain at least one ASCII letter or digit");
            return;
        }
        if let Some(existing) = self.slugs.get(slug) {
            if Some(*existing) != owner {
                errors.add(
                    "slug",
                    format!("a category with slug '{}' already exists", slug),
                );
            }
        }
    }

    fn node_mut(&mut self, id: CategoryId) -> CatalogResult<&mut Category> {
        self.nodes
            .get_mut(&id)
            .ok_or_else(|| CatalogError::category_not_found(id))
    }

    fn link(&mut self, id: CategoryId, parent: Option<CategoryId>) {
        if let Some(parent) = parent {
            self.children.entry(parent).or_default().insert(id);
        }
    }

    fn unlink(&mut self, id: CategoryId, parent: Option<CategoryId>) {
        if let Some(parent) = parent {
            if let Some(set) = self.children.get_mut(&parent) {
                set.remove(&id);
                if set.is_empty() {
                    self.children.remove(&parent);
                }
            }
        }
    }

    fn ordered_children(&self, id: CategoryId) -> Vec<&Category> {
        let mut kids: Vec<&Category> = self
            .children
            .get(&id)
            .into_iter()
            .flatten()
            .filter_map(|kid| self.nodes.get(kid))
            .collect();
        sort_siblings(&mut kids);
        kids
    }

    fn build_node(&self, category: &Category) -> CategoryNode {
        let children = self
            .ordered_children(category.id)
            .into_iter()
            .filter(|c| c.is_active)
            .map(|c| self.build_node(c))
            .collect();
        CategoryNode {
            category: category.clone(),
            children,
        }
    }
}

fn sort_siblings(categories: &mut [&Category]) {
    categories.sort_by(|a, b| {
        a.sort_order
            .cmp(&b.sort_order)
            .then_with(|| a.name.cmp(&b.name))
            .then_with(|| a.id.cmp(&b.id))
    });
}

fn validate_name(name: &str, errors: &mut FieldErrors) -> Option<String> {
    let name = name.trim();
    if name.is_empty() {
        errors.add("name", "must not be empty");
        return None;
    }
    if name.chars().count() > MAX_NAME_LEN {
        errors.add("name", format!("must be at most {} characters", MAX_NAME_LEN));
        return None;
    }
    Some(name.to_string())
}

fn validate_sort_order(sort_order: i32, errors: &mut FieldErrors) {
    if !(0..=MAX_SORT_ORDER).contains(&sort_order) {
        errors.add(
            "sort_order",
            format!("must be between 0 and {}", MAX_SORT_ORDER),
        );
    }
}

fn clean_optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

//! End-to-end behaviour of the catalog: tree rules, query validation, listing.

use std::collections::HashSet;

use buybuy_catalog::prelude::*;

const SELLER: SellerId = SellerId::new(1);

fn params(pairs: &[(&str, &str)]) -> RawParams {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

fn price(s: &str) -> Money {
    s.parse().unwrap()
}

/// Electronics(1) > Smartphones(2), Laptops(3); P1 (999) in 2, P2 (2499) in 3.
fn electronics() -> Catalog {
    let catalog = Catalog::new(CatalogConfig::default()).unwrap();
    let root = catalog
        .create_category(NewCategory::new("Electronics"))
        .unwrap();
    let phones = catalog
        .create_category(NewCategory::new("Smartphones").with_parent(root.id))
        .unwrap();
    let laptops = catalog
        .create_category(NewCategory::new("Laptops").with_parent(root.id))
        .unwrap();
    catalog
        .create_product(&SELLER, NewProduct::new("P1", price("999"), phones.id))
        .unwrap();
    catalog
        .create_product(&SELLER, NewProduct::new("P2", price("2499"), laptops.id))
        .unwrap();
    catalog
}

fn names(results: &SearchResults<Product>) -> Vec<String> {
    results.items.iter().map(|p| p.name.clone()).collect()
}

#[test]
fn test_descendant_listing_sorted_by_price() {
    let catalog = electronics();
    let results = catalog
        .query(&params(&[
            ("category", "1"),
            ("include_descendants", "true"),
            ("sort", "price"),
            ("order", "asc"),
        ]))
        .unwrap();

    assert_eq!(names(&results), vec!["P1", "P2"]);
    assert_eq!(results.pagination.total, 2);
    assert_eq!(results.pagination.total_pages, 1);
}

#[test]
fn test_delete_parent_reparents_children() {
    let catalog = electronics();
    catalog.delete_category(CategoryId::new(1)).unwrap();

    assert!(matches!(
        catalog.category(CategoryId::new(1)),
        Err(CatalogError::NotFound { .. })
    ));
    assert_eq!(catalog.category(CategoryId::new(2)).unwrap().parent_id, None);
    assert_eq!(catalog.category(CategoryId::new(3)).unwrap().parent_id, None);
}

#[test]
fn test_delete_with_attached_products_conflicts() {
    let catalog = electronics();
    let err = catalog.delete_category(CategoryId::new(2)).unwrap_err();
    assert!(matches!(err, CatalogError::Conflict(_)));
    assert!(catalog.category(CategoryId::new(2)).is_ok());
}

#[test]
fn test_min_above_max_fails_before_store_access() {
    let catalog = electronics();
    let err = catalog
        .query(&params(&[("min_price", "100"), ("max_price", "50"), ("category", "404")]))
        .unwrap_err();
    let fields = err.field_errors().expect("validation error");
    assert!(fields.contains("min_price"));
}

#[test]
fn test_unknown_category_is_not_found() {
    let catalog = electronics();
    let err = catalog.query(&params(&[("category", "404")])).unwrap_err();
    assert_eq!(err.to_string(), "Category not found: 404");
}

#[test]
fn test_ancestors_and_full_path() {
    let catalog = electronics();
    let android = catalog
        .create_category(NewCategory::new("Android").with_parent(CategoryId::new(2)))
        .unwrap();

    let ancestors: Vec<String> = catalog
        .ancestors(android.id)
        .unwrap()
        .into_iter()
        .map(|c| c.name)
        .collect();
    assert_eq!(ancestors, vec!["Electronics", "Smartphones"]);

    let path = catalog.full_path(android.id).unwrap();
    assert_eq!(path.len(), 3);
    assert_eq!(path[0].slug, "electronics");
    assert_eq!(path[2].id, android.id);
}

#[test]
fn test_descendants_exclude_self_and_are_breadth_first() {
    let catalog = electronics();
    catalog
        .create_category(NewCategory::new("Android").with_parent(CategoryId::new(2)))
        .unwrap();
    let ids: Vec<u64> = catalog
        .descendants(CategoryId::new(1))
        .unwrap()
        .iter()
        .map(|c| c.id.get())
        .collect();
    assert_eq!(ids, vec![2, 3, 4]);
}

#[test]
fn test_reparent_into_own_subtree_is_rejected() {
    let catalog = electronics();
    let err = catalog
        .reparent_category(CategoryId::new(1), Some(CategoryId::new(2)))
        .unwrap_err();
    assert!(err.field_errors().unwrap().contains("parent"));
    assert!(catalog.category(CategoryId::new(1)).unwrap().is_root());
}

#[test]
fn test_deactivation_hides_subtree_without_writes() {
    let catalog = electronics();
    catalog.set_category_active(CategoryId::new(1), false).unwrap();

    // Children keep their own flag.
    assert!(catalog.category(CategoryId::new(2)).unwrap().is_active);

    let results = catalog.query(&RawParams::new()).unwrap();
    assert!(results.is_empty());
    assert!(results.facets.is_empty());

    let results = catalog.query(&params(&[("is_active", "false")])).unwrap();
    assert_eq!(results.pagination.total, 2);

    catalog.set_category_active(CategoryId::new(1), true).unwrap();
    assert_eq!(catalog.query(&RawParams::new()).unwrap().pagination.total, 2);
}

#[test]
fn test_inclusive_price_bounds() {
    let catalog = electronics();
    let results = catalog
        .query(&params(&[("min_price", "999.00"), ("max_price", "999")]))
        .unwrap();
    assert_eq!(names(&results), vec!["P1"]);
}

#[test]
fn test_search_is_case_insensitive_over_name_and_description() {
    let catalog = electronics();
    catalog
        .create_product(
            &SELLER,
            NewProduct::new("Budget Phone", price("199"), CategoryId::new(2))
                .with_description("Dual SIM, long BATTERY life"),
        )
        .unwrap();

    let results = catalog.query(&params(&[("search", "  battery ")])).unwrap();
    assert_eq!(names(&results), vec!["Budget Phone"]);

    let results = catalog.query(&params(&[("search", "phone sim")])).unwrap();
    assert_eq!(results.pagination.total, 1);

    let results = catalog.query(&params(&[("search", "   ")])).unwrap();
    assert_eq!(results.pagination.total, 3);
}

#[test]
fn test_ties_break_by_id_ascending() {
    let catalog = electronics();
    for name in ["Same A", "Same B", "Same C"] {
        catalog
            .create_product(&SELLER, NewProduct::new(name, price("50"), CategoryId::new(3)))
            .unwrap();
    }
    for order in ["asc", "desc"] {
        let results = catalog
            .query(&params(&[("sort", "price"), ("order", order), ("max_price", "50")]))
            .unwrap();
        let ids: Vec<u64> = results.items.iter().map(|p| p.id.get()).collect();
        assert_eq!(ids, vec![3, 4, 5], "order={order}");
    }
}

#[test]
fn test_pagination_and_page_size_clamp() {
    let catalog = electronics();
    for i in 0..150 {
        catalog
            .create_product(
                &SELLER,
                NewProduct::new(format!("Cable {i}"), price("5"), CategoryId::new(3)),
            )
            .unwrap();
    }

    let results = catalog.query(&params(&[("per_page", "1000")])).unwrap();
    assert_eq!(results.len(), 100);
    assert_eq!(results.pagination.per_page, 100);
    assert_eq!(results.pagination.total, 152);
    assert_eq!(results.pagination.total_pages, 2);

    let results = catalog.query(&params(&[("page", "9")])).unwrap();
    assert!(results.is_empty());
    assert_eq!(results.pagination.total, 152);
}

#[test]
fn test_category_facets_ignore_category_filter() {
    let catalog = electronics();
    let results = catalog
        .query(&params(&[("category", "2")]))
        .unwrap();
    assert_eq!(names(&results), vec!["P1"]);

    let facets: Vec<(u64, u64, bool)> = results
        .facets
        .categories
        .iter()
        .map(|f| (f.id.get(), f.count, f.selected))
        .collect();
    assert_eq!(facets, vec![(2, 1, true), (3, 1, false)]);

    let range = results.facets.price.unwrap();
    assert_eq!(range.min, price("999"));
    assert_eq!(range.max, price("999"));
}

#[test]
fn test_default_sort_is_newest_first() {
    let json = r#"{
        "categories": [
            {"id": 1, "name": "Books", "slug": "books",
             "created_at": "2024-01-01T00:00:00Z", "updated_at": "2024-01-01T00:00:00Z"}
        ],
        "products": [
            {"id": 1, "seller_id": 1, "category_id": 1, "name": "Old", "slug": "old",
             "price": "10.00",
             "created_at": "2024-01-01T00:00:00Z", "updated_at": "2024-01-01T00:00:00Z"},
            {"id": 2, "seller_id": 1, "category_id": 1, "name": "New", "slug": "new",
             "price": "10.00",
             "created_at": "2024-06-01T00:00:00Z", "updated_at": "2024-06-01T00:00:00Z"}
        ]
    }"#;
    let catalog = Catalog::from_snapshot(
        CatalogConfig::default(),
        CatalogSnapshot::from_json(json).unwrap(),
    )
    .unwrap();

    let results = catalog.query(&RawParams::new()).unwrap();
    assert_eq!(names(&results), vec!["New", "Old"]);

    let results = catalog.query(&params(&[("order", "asc")])).unwrap();
    assert_eq!(names(&results), vec!["Old", "New"]);
}

#[test]
fn test_sql_rendering_resolves_descendants() {
    let catalog = electronics();
    let plan = catalog
        .build_query(&params(&[("category", "1"), ("include_descendants", "1")]))
        .unwrap();
    let sql = catalog.to_sql(&plan).unwrap();
    assert!(sql.select.contains("category_id IN (?, ?, ?)"));
    assert!(sql.select.ends_with("LIMIT 20 OFFSET 0"));
}

#[test]
fn test_depth_limit() {
    let catalog = Catalog::new(CatalogConfig::default()).unwrap();
    let mut parent = None;
    for level in 0..5 {
        let mut input = NewCategory::new(format!("Level {level}"));
        input.parent_id = parent;
        parent = Some(catalog.create_category(input).unwrap().id);
    }
    let mut too_deep = NewCategory::new("Level 5");
    too_deep.parent_id = parent;
    let err = catalog.create_category(too_deep).unwrap_err();
    assert!(err.field_errors().unwrap().contains("parent"));
}

/// Electronics(1) > Phones(2) > Android(4), iOS(5); Electronics > Laptops(3) > Gaming(6);
/// Home(7). Eleven products with repeated prices and mixed-case names.
fn deep_catalog() -> Catalog {
    let catalog = Catalog::new(CatalogConfig::default()).unwrap();
    let electronics = catalog
        .create_category(NewCategory::new("Electronics"))
        .unwrap();
    let phones = catalog
        .create_category(NewCategory::new("Phones").with_parent(electronics.id))
        .unwrap();
    let laptops = catalog
        .create_category(NewCategory::new("Laptops").with_parent(electronics.id))
        .unwrap();
    let android = catalog
        .create_category(NewCategory::new("Android").with_parent(phones.id))
        .unwrap();
    let ios = catalog
        .create_category(NewCategory::new("iOS").with_parent(phones.id))
        .unwrap();
    let gaming = catalog
        .create_category(NewCategory::new("Gaming").with_parent(laptops.id))
        .unwrap();
    let home = catalog.create_category(NewCategory::new("Home")).unwrap();

    let items = [
        ("pixel 8", "699", android.id),
        ("Galaxy S24", "799", android.id),
        ("iPhone 15", "799", ios.id),
        ("iPhone SE", "429", ios.id),
        ("Feature Phone", "49", phones.id),
        ("ThinkPad X1", "1899", laptops.id),
        ("macbook air", "1099", laptops.id),
        ("Legion 7", "1899", gaming.id),
        ("ROG Zephyrus", "1999", gaming.id),
        ("Kettle", "49", home.id),
        ("lamp", "35", home.id),
    ];
    for (name, amount, category) in items {
        catalog
            .create_product(&SELLER, NewProduct::new(name, price(amount), category))
            .unwrap();
    }
    catalog
}

fn ids(results: &SearchResults<Product>) -> Vec<u64> {
    results.items.iter().map(|p| p.id.get()).collect()
}

#[test]
fn test_joined_pages_equal_full_listing() {
    let catalog = deep_catalog();

    for sort in ["name", "price", "created_at"] {
        for order in ["asc", "desc"] {
            let full = catalog
                .query(&params(&[("sort", sort), ("order", order), ("per_page", "100")]))
                .unwrap();
            let full_ids = ids(&full);
            assert_eq!(full_ids.len(), 11);
            assert_eq!(full_ids.iter().collect::<HashSet<_>>().len(), 11);

            for size in [1u32, 3, 7, 100] {
                let per_page = size.to_string();
                let first = catalog
                    .query(&params(&[("sort", sort), ("order", order), ("per_page", &per_page)]))
                    .unwrap();
                let total_pages = first.pagination.total_pages;
                assert_eq!(total_pages, 11u64.div_ceil(u64::from(size)));

                let mut joined = Vec::new();
                for page in 1..=total_pages {
                    let page = page.to_string();
                    let results = catalog
                        .query(&params(&[
                            ("sort", sort),
                            ("order", order),
                            ("per_page", &per_page),
                            ("page", &page),
                        ]))
                        .unwrap();
                    assert!(results.len() <= size as usize);
                    joined.extend(ids(&results));
                }
                assert_eq!(joined, full_ids, "sort={sort} order={order} per_page={size}");
            }
        }
    }
}

#[test]
fn test_sibling_subtrees_are_disjoint() {
    let catalog = deep_catalog();

    let subtree = |id: u64| -> HashSet<CategoryId> {
        let id = CategoryId::new(id);
        let mut ids: HashSet<CategoryId> = catalog
            .descendants(id)
            .unwrap()
            .into_iter()
            .map(|c| c.id)
            .collect();
        ids.insert(id);
        ids
    };

    let roots: Vec<u64> = catalog.roots().into_iter().map(|c| c.id.get()).collect();
    let sibling_groups = [roots, vec![2, 3], vec![4, 5]];
    for group in sibling_groups {
        for (i, &a) in group.iter().enumerate() {
            for &b in &group[i + 1..] {
                let shared: Vec<_> = subtree(a).intersection(&subtree(b)).copied().collect();
                assert!(shared.is_empty(), "{a} and {b} share {shared:?}");
            }
        }
    }

    assert_eq!(subtree(2).len(), 3);
    assert_eq!(subtree(3).len(), 2);
    assert_eq!(subtree(1).union(&subtree(7)).count(), 7);
}

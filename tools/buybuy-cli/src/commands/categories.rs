//! Category tree commands.

use anyhow::{bail, Result};
use buybuy_catalog::catalog::{Category, NewCategory};
use buybuy_catalog::{Catalog, CategoryId};
use dialoguer::Confirm;

use super::{CategoriesArgs, CategoriesCommand};
use crate::context::Context;
use crate::output::status_badge;

/// Run the categories command.
pub async fn run(args: CategoriesArgs, ctx: &Context) -> Result<()> {
    let catalog = ctx.open_catalog()?;

    match args.command {
        CategoriesCommand::List { parent, all } => list(&catalog, parent.as_deref(), all, ctx),
        CategoriesCommand::Tree => tree(&catalog, ctx),
        CategoriesCommand::Show { category } => show(&catalog, &category, ctx),
        CategoriesCommand::Create {
            name,
            parent,
            description,
            sort_order,
            inactive,
        } => {
            let mut input = NewCategory::new(name).with_sort_order(sort_order);
            if let Some(parent) = parent {
                input = input.with_parent(CategoryId::new(parent));
            }
            if let Some(description) = description {
                input = input.with_description(description);
            }
            if inactive {
                input = input.inactive();
            }
            let created = catalog.create_category(input)?;
            ctx.save_catalog(&catalog)?;
            report(ctx, "Created", &created);
            Ok(())
        }
        CategoriesCommand::Move { id, to } => {
            let moved = catalog.reparent_category(CategoryId::new(id), to.map(CategoryId::new))?;
            ctx.save_catalog(&catalog)?;
            let label = catalog.full_path_label(moved.id)?;
            ctx.output.success(&format!("Moved to {}", label));
            json_result(ctx, &moved);
            Ok(())
        }
        CategoriesCommand::Rename { id, name } => {
            let renamed = catalog.rename_category(CategoryId::new(id), &name)?;
            ctx.save_catalog(&catalog)?;
            report(ctx, "Renamed", &renamed);
            Ok(())
        }
        CategoriesCommand::Activate { id } => set_active(&catalog, id, true, ctx),
        CategoriesCommand::Deactivate { id } => set_active(&catalog, id, false, ctx),
        CategoriesCommand::Delete { id, yes } => delete(&catalog, id, yes, ctx),
    }
}

fn list(catalog: &Catalog, parent: Option<&str>, all: bool, ctx: &Context) -> Result<()> {
    let parent = match parent {
        None => None,
        Some(p) if p.eq_ignore_ascii_case("root") => Some(None),
        Some(p) => {
            let id: CategoryId = p
                .parse()
                .map_err(|_| anyhow::anyhow!("'{}' is not a category id", p))?;
            Some(Some(id))
        }
    };
    let categories = catalog.list_categories(parent, !all)?;

    if ctx.output.is_json() {
        ctx.output.json(&categories);
        return Ok(());
    }

    ctx.output.header("Categories");
    if categories.is_empty() {
        ctx.output.info("No categories");
        return Ok(());
    }

    let widths = [6, 40, 8];
    ctx.output.table_row(&["ID", "PATH", "STATUS"], &widths);
    for category in &categories {
        let id = category.id.to_string();
        let path = catalog.full_path_label(category.id)?;
        let status = status_badge(category.is_active);
        ctx.output
            .table_row(&[id.as_str(), path.as_str(), status.as_str()], &widths);
    }
    Ok(())
}

fn tree(catalog: &Catalog, ctx: &Context) -> Result<()> {
    let nodes = catalog.tree();
    if ctx.output.is_json() {
        ctx.output.json(&nodes);
        return Ok(());
    }

    ctx.output.header("Category tree");
    if nodes.is_empty() {
        ctx.output.info("No active categories");
    }
    ctx.output.tree(&nodes);
    Ok(())
}

fn show(catalog: &Catalog, key: &str, ctx: &Context) -> Result<()> {
    let id = match key.parse::<CategoryId>() {
        Ok(id) => id,
        Err(_) => match catalog.category_by_slug(key) {
            Some(category) => category.id,
            None => bail!("No category with id or slug '{}'", key),
        },
    };
    let detail = catalog.category_detail(id)?;

    if ctx.output.is_json() {
        ctx.output.json(&detail);
        return Ok(());
    }

    ctx.output.header(&detail.category.name);
    ctx.output.kv("id", &detail.category.id.to_string());
    ctx.output.kv("slug", &detail.category.slug);
    ctx.output.kv("path", &detail.full_path_label);
    ctx.output.kv("depth", &detail.depth_level.to_string());
    ctx.output.kv("status", &status_badge(detail.category.is_active));
    if !detail.is_visible {
        ctx.output.kv("visible", "no (an ancestor is inactive)");
    }
    if let Some(ref description) = detail.category.description {
        ctx.output.kv("description", description);
    }
    ctx.output.kv("children", &detail.children_count.to_string());
    ctx.output.kv(
        "products",
        &format!(
            "{} direct, {} in subtree",
            detail.product_count, detail.total_product_count
        ),
    );

    let children = catalog.children(id)?;
    if !children.is_empty() {
        ctx.output.info("Children:");
        for child in &children {
            ctx.output.list_item(&format!(
                "{} (#{}) {}",
                child.name,
                child.id,
                status_badge(child.is_active)
            ));
        }
    }
    Ok(())
}

fn set_active(catalog: &Catalog, id: u64, active: bool, ctx: &Context) -> Result<()> {
    let id = CategoryId::new(id);
    let updated = catalog.set_category_active(id, active)?;
    ctx.save_catalog(catalog)?;

    let verb = if active { "Activated" } else { "Deactivated" };
    report(ctx, verb, &updated);

    let descendants = catalog.descendants(id)?;
    if !active && !descendants.is_empty() {
        ctx.output.warn(&format!(
            "{} descendant categories are now hidden from listings",
            descendants.len()
        ));
    }
    Ok(())
}

fn delete(catalog: &Catalog, id: u64, yes: bool, ctx: &Context) -> Result<()> {
    let id = CategoryId::new(id);
    let detail = catalog.category_detail(id)?;
    if !detail.can_be_deleted {
        bail!(
            "Cannot delete '{}': {} products are still filed under it",
            detail.category.name,
            detail.product_count
        );
    }

    if !yes {
        if detail.children_count > 0 {
            ctx.output.warn(&format!(
                "{} child categories will become top-level categories",
                detail.children_count
            ));
        }
        let confirmed = Confirm::new()
            .with_prompt(format!("Delete category '{}'?", detail.full_path_label))
            .default(false)
            .interact()?;

        if !confirmed {
            ctx.output.warn("Delete cancelled");
            return Ok(());
        }
    }

    let deleted = catalog.delete_category(id)?;
    ctx.save_catalog(catalog)?;
    report(ctx, "Deleted", &deleted);
    Ok(())
}

fn report(ctx: &Context, verb: &str, category: &Category) {
    ctx.output
        .success(&format!("{} '{}' (#{})", verb, category.name, category.id));
    json_result(ctx, category);
}

fn json_result(ctx: &Context, category: &Category) {
    if ctx.output.is_json() {
        ctx.output.json(category);
    }
}

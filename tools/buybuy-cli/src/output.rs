//! Output formatting for the CLI.

use buybuy_catalog::catalog::{CategoryNode, Product};
use console::style;

/// Output handler for CLI messages.
#[derive(Clone)]
pub struct Output {
    verbose: bool,
    json: bool,
}

impl Output {
    /// Create a new output handler.
    pub fn new(verbose: bool, json: bool) -> Self {
        Self { verbose, json }
    }

    /// Print an info message.
    pub fn info(&self, msg: &str) {
        if self.json {
            return;
        }
        println!("{} {}", style("ℹ").blue(), msg);
    }

    /// Print a success message.
    pub fn success(&self, msg: &str) {
        if self.json {
            return;
        }
        println!("{} {}", style("✓").green(), msg);
    }

    /// Print a warning message.
    pub fn warn(&self, msg: &str) {
        if self.json {
            return;
        }
        eprintln!("{} {}", style("⚠").yellow(), msg);
    }

    /// Print an error message.
    pub fn error(&self, msg: &str) {
        if self.json {
            eprintln!("{}", serde_json::json!({ "error": msg }));
            return;
        }
        eprintln!("{} {}", style("✗").red(), style(msg).red());
    }

    /// Print a debug message (only in verbose mode).
    pub fn debug(&self, msg: &str) {
        if !self.verbose || self.json {
            return;
        }
        eprintln!("{} {}", style("→").dim(), style(msg).dim());
    }

    /// Print a header/title.
    pub fn header(&self, msg: &str) {
        if self.json {
            return;
        }
        println!("\n{}", style(msg).bold().underlined());
    }

    /// Print JSON output.
    pub fn json<T: serde::Serialize>(&self, value: &T) {
        if let Ok(json) = serde_json::to_string_pretty(value) {
            println!("{}", json);
        }
    }

    /// Print a key-value pair.
    pub fn kv(&self, key: &str, value: &str) {
        if self.json {
            return;
        }
        println!("  {}: {}", style(key).dim(), value);
    }

    /// Print a list item.
    pub fn list_item(&self, item: &str) {
        if self.json {
            return;
        }
        println!("  {} {}", style("•").dim(), item);
    }

    /// Print a table row.
    pub fn table_row(&self, cols: &[&str], widths: &[usize]) {
        if self.json {
            return;
        }
        let formatted: Vec<String> = cols
            .iter()
            .zip(widths.iter())
            .map(|(col, width)| format!("{:width$}", col, width = width))
            .collect();
        println!("  {}", formatted.join("  "));
    }

    /// Print a category tree with box-drawing guides.
    pub fn tree(&self, nodes: &[CategoryNode]) {
        if self.json {
            return;
        }
        for line in tree_lines(nodes) {
            println!("  {}", line);
        }
    }

    /// Check if JSON mode is enabled.
    pub fn is_json(&self) -> bool {
        self.json
    }
}

/// Status badge for active flags.
pub fn status_badge(active: bool) -> String {
    if active {
        style("active").green().to_string()
    } else {
        style("inactive").dim().to_string()
    }
}

/// Stock badge: out, low, or the count.
pub fn stock_badge(product: &Product, low_threshold: u32) -> String {
    let quantity = product.stock_quantity.quantity();
    if !product.is_in_stock() {
        style("out of stock").red().to_string()
    } else if product.is_low_stock(low_threshold) {
        style(format!("{} (low)", quantity)).yellow().to_string()
    } else {
        quantity.to_string()
    }
}

/// Render nodes as indented lines, `├─`/`└─` style.
pub fn tree_lines(nodes: &[CategoryNode]) -> Vec<String> {
    let mut lines = Vec::new();
    push_tree_lines(nodes, "", &mut lines);
    lines
}

fn push_tree_lines(nodes: &[CategoryNode], prefix: &str, lines: &mut Vec<String>) {
    for (i, node) in nodes.iter().enumerate() {
        let last = i + 1 == nodes.len();
        let branch = if last { "└─" } else { "├─" };
        lines.push(format!(
            "{}{} {} (#{})",
            prefix, branch, node.category.name, node.category.id
        ));
        let child_prefix = format!("{}{}", prefix, if last { "   " } else { "│  " });
        push_tree_lines(&node.children, &child_prefix, lines);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use buybuy_catalog::catalog::NewCategory;
    use buybuy_catalog::{Catalog, CatalogConfig};

    #[test]
    fn test_tree_lines() {
        let catalog = Catalog::new(CatalogConfig::default()).unwrap();
        let root = catalog.create_category(NewCategory::new("Electronics")).unwrap();
        let phones = catalog
            .create_category(NewCategory::new("Phones").with_parent(root.id))
            .unwrap();
        catalog
            .create_category(NewCategory::new("Cases").with_parent(phones.id))
            .unwrap();
        catalog
            .create_category(NewCategory::new("Laptops").with_parent(root.id))
            .unwrap();

        let lines = tree_lines(&catalog.tree());
        assert_eq!(
            lines,
            vec![
                "└─ Electronics (#1)",
                "   ├─ Laptops (#4)",
                "   └─ Phones (#2)",
                "      └─ Cases (#3)",
            ]
        );
    }
}

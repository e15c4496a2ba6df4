//! In-memory narrowing of aggregated listings.

use super::Product;

/// Products whose name contains `query`, ignoring case.
///
/// A blank query matches everything.
#[must_use]
pub fn search_by_name<'a>(items: &'a [Product], query: &str) -> Vec<&'a Product> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return items.iter().collect();
    }

    items
        .iter()
        .filter(|p| p.name.to_lowercase().contains(&needle))
        .collect()
}

/// Products whose category name is one of `names`.
#[must_use]
pub fn in_categories<'a, S: AsRef<str>>(items: &'a [Product], names: &[S]) -> Vec<&'a Product> {
    items
        .iter()
        .filter(|p| {
            p.category_name()
                .is_some_and(|category| names.iter().any(|n| n.as_ref() == category))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use nexus_core::{PriceInput, ProductId};

    use super::*;
    use crate::catalog::CategoryRef;

    fn product(id: i64, name: &str, category: Option<&str>) -> Product {
        Product {
            id: ProductId::new(id),
            name: name.to_string(),
            slug: String::new(),
            price: PriceInput::default(),
            primary_image: None,
            category: category.map(|c| CategoryRef {
                name: c.to_string(),
            }),
            description: None,
            quantity: None,
            compare_at_price: None,
            discount_percentage: None,
            inventory_status: None,
            is_featured: None,
            created_at: None,
        }
    }

    fn ids(items: &[&Product]) -> Vec<i64> {
        items.iter().map(|p| p.id.as_i64()).collect()
    }

    #[test]
    fn test_search_is_case_insensitive() {
        let items = vec![
            product(1, "Samsung Galaxy S23", None),
            product(2, "Wooden Chair", None),
            product(3, "galaxy buds", None),
        ];
        assert_eq!(ids(&search_by_name(&items, "GALAXY")), vec![1, 3]);
    }

    #[test]
    fn test_blank_search_matches_all() {
        let items = vec![product(1, "A", None), product(2, "B", None)];
        assert_eq!(search_by_name(&items, "   ").len(), 2);
    }

    #[test]
    fn test_in_categories() {
        let items = vec![
            product(1, "Phone", Some("Mobiles")),
            product(2, "Sofa", Some("Furniture")),
            product(3, "Loose", None),
            product(4, "Tablet", Some("Tablets")),
        ];
        let picked = in_categories(&items, &["Mobiles", "Tablets"]);
        assert_eq!(ids(&picked), vec![1, 4]);
        assert!(in_categories::<&str>(&items, &[]).is_empty());
    }
}

//! Plain-text output for the CLI subcommands.
//!
//! Every string that came from the catalog API passes through
//! [`single_line`] before it reaches the terminal, so remote text can
//! neither inject escape sequences nor break the column layout.
use crate::app::ItemDetail;
use crate::catalog::{CatalogStore, Category, Item, RefreshOutcome};
use crate::favorites::FavoritesSet;
use crate::util::{display_width, fit_to_width, single_line};

const HEART: &str = "♥";
const NO_HEART: &str = "♡";

/// Widest name column before names get truncated.
const MAX_NAME_WIDTH: usize = 32;

pub const NO_FAVORITES: &str = "No favorite items selected.";
pub const NO_CATEGORIES: &str = "No categories available.";

fn marker(is_favorite: bool) -> &'static str {
    if is_favorite {
        HEART
    } else {
        NO_HEART
    }
}

fn name_column_width<'a>(items: impl Iterator<Item = &'a Item>) -> usize {
    items
        .map(|item| display_width(&single_line(&item.name)))
        .max()
        .unwrap_or(0)
        .min(MAX_NAME_WIDTH)
}

/// Join lines with a trailing newline after the last one.
fn lines(parts: Vec<String>) -> String {
    let mut out = parts.join("\n");
    out.push('\n');
    out
}

/// Categories with their items; favorites are marked with a filled heart.
pub fn render_catalog(categories: &[Category], favorites: &FavoritesSet) -> String {
    if categories.is_empty() {
        return format!("{NO_CATEGORIES}\n");
    }

    let width = name_column_width(categories.iter().flat_map(|c| c.items.iter()));
    let mut out = Vec::new();

    for (i, category) in categories.iter().enumerate() {
        if i > 0 {
            out.push(String::new());
        }
        out.push(single_line(&category.name).into_owned());
        out.extend(category.items.iter().map(|item| {
            format!(
                "  {} {}  ${}",
                marker(favorites.contains(&item.name)),
                fit_to_width(&single_line(&item.name), width),
                item.price
            )
        }));
    }

    lines(out)
}

/// The detail view of one item.
pub fn render_detail(detail: &ItemDetail<'_>) -> String {
    let item = detail.item;
    let top = if item.is_top_of_the_week { "Yes" } else { "No" };
    let favorite = if detail.is_favorite {
        "In favorites"
    } else {
        "Not in favorites"
    };

    let mut out = vec![single_line(&item.name).into_owned()];
    if !item.image.is_empty() {
        out.push(format!("  Image:           {}", single_line(&item.image)));
    }
    out.extend([
        format!("  Weight:          {}g", item.weight),
        format!("  Rating:          {}", item.rating),
        format!("  Price:           ${}", item.price),
        format!("  Top of the week: {top}"),
        format!("  Color:           {}", single_line(&item.color)),
        format!("  Bonus:           {}", single_line(&item.bonus)),
        format!("  Origin:          {}", single_line(&item.origin)),
        format!("  {} {favorite}", marker(detail.is_favorite)),
    ]);
    lines(out)
}

/// The favorites view: joined items in catalog order.
pub fn render_favorites(items: &[&Item]) -> String {
    if items.is_empty() {
        return format!("{NO_FAVORITES}\n");
    }

    let width = name_column_width(items.iter().copied());
    lines(
        items
            .iter()
            .map(|item| {
                format!(
                    "{HEART} {}  ${}",
                    fit_to_width(&single_line(&item.name), width),
                    item.price
                )
            })
            .collect(),
    )
}

/// Result line for an explicit `refresh`.
pub fn render_refresh(outcome: &RefreshOutcome, catalog: &CatalogStore) -> String {
    match outcome {
        RefreshOutcome::Updated { categories } => {
            format!("Catalog updated: {categories} categories.\n")
        }
        RefreshOutcome::Unchanged => "Catalog unchanged.\n".to_string(),
        RefreshOutcome::Failed | RefreshOutcome::Stale => {
            let reason = single_line(catalog.last_error().unwrap_or("unknown error"));
            match catalog.fetched_at() {
                Some(at) if !catalog.categories().is_empty() => format!(
                    "Could not refresh the catalog ({reason}); keeping the copy from {}.\n",
                    at.format("%Y-%m-%d %H:%M UTC")
                ),
                _ => format!("Could not refresh the catalog ({reason}).\n"),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn item(value: serde_json::Value) -> Item {
        serde_json::from_value(value).unwrap()
    }

    fn categories() -> Vec<Category> {
        vec![
            Category {
                name: "Orchids".to_string(),
                items: vec![
                    item(serde_json::json!({"name": "Phalaenopsis", "price": 20})),
                    item(serde_json::json!({"name": "Cattleya", "price": 35.5})),
                ],
            },
            Category {
                name: "Garden".to_string(),
                items: vec![item(serde_json::json!({"name": "Rose", "price": 4}))],
            },
        ]
    }

    #[test]
    fn test_render_catalog_marks_favorites() {
        let favorites = FavoritesSet::from_iter(["Rose"]);
        let out = render_catalog(&categories(), &favorites);

        assert_eq!(
            out,
            "Orchids\n\
             \x20 ♡ Phalaenopsis  $20\n\
             \x20 ♡ Cattleya      $35.5\n\
             \n\
             Garden\n\
             \x20 ♥ Rose          $4\n"
        );
    }

    #[test]
    fn test_render_empty_catalog() {
        assert_eq!(
            render_catalog(&[], &FavoritesSet::new()),
            "No categories available.\n"
        );
    }

    #[test]
    fn test_render_detail() {
        let rose = item(serde_json::json!({
            "name": "Rose",
            "image": "https://example.com/rose.jpg",
            "weight": 30,
            "rating": 4.5,
            "price": 4,
            "isTopOfTheWeek": true,
            "color": "Red",
            "bonus": "Ribbon",
            "origin": "Ecuador"
        }));
        let out = render_detail(&ItemDetail {
            item: &rose,
            is_favorite: true,
        });

        assert_eq!(
            out,
            "Rose\n\
             \x20 Image:           https://example.com/rose.jpg\n\
             \x20 Weight:          30g\n\
             \x20 Rating:          4.5\n\
             \x20 Price:           $4\n\
             \x20 Top of the week: Yes\n\
             \x20 Color:           Red\n\
             \x20 Bonus:           Ribbon\n\
             \x20 Origin:          Ecuador\n\
             \x20 ♥ In favorites\n"
        );
    }

    #[test]
    fn test_render_detail_not_favorite() {
        let lily = item(serde_json::json!({"name": "Lily"}));
        let out = render_detail(&ItemDetail {
            item: &lily,
            is_favorite: false,
        });
        assert!(out.contains("Top of the week: No"));
        assert!(out.ends_with("♡ Not in favorites\n"));
        assert!(!out.contains("Image:"));
    }

    #[test]
    fn test_render_favorites_empty() {
        assert_eq!(render_favorites(&[]), "No favorite items selected.\n");
    }

    #[test]
    fn test_render_favorites() {
        let catalog = categories();
        let items: Vec<&Item> = catalog.iter().flat_map(|c| c.items.iter()).collect();
        let out = render_favorites(&items[1..]);
        assert_eq!(out, "♥ Cattleya  $35.5\n♥ Rose      $4\n");
    }

    #[test]
    fn test_render_keeps_names_on_one_line() {
        let catalog = vec![Category {
            name: "Gar\nden".to_string(),
            items: vec![
                item(serde_json::json!({"name": "Red\nRose", "price": 4})),
                item(serde_json::json!({"name": "Lily\t", "price": 6})),
            ],
        }];
        let out = render_catalog(&catalog, &FavoritesSet::new());
        assert_eq!(
            out,
            "Gar den\n\
             \x20 ♡ Red Rose  $4\n\
             \x20 ♡ Lily      $6\n"
        );
    }

    #[test]
    fn test_render_detail_keeps_fields_on_one_line() {
        let rose = item(serde_json::json!({"name": "Rose", "origin": "Ecua\ndor"}));
        let out = render_detail(&ItemDetail {
            item: &rose,
            is_favorite: false,
        });
        assert!(out.contains("  Origin:          Ecua dor\n"));
        assert_eq!(out.lines().count(), 9);
    }

    #[test]
    fn test_render_refresh_updated() {
        let out = render_refresh(
            &RefreshOutcome::Updated { categories: 3 },
            &CatalogStore::new(),
        );
        assert_eq!(out, "Catalog updated: 3 categories.\n");
    }

    #[test]
    fn test_render_refresh_failed_without_catalog() {
        let mut store = CatalogStore::new();
        let ticket = store.begin_refresh();
        let outcome = store.apply(ticket, Err(crate::catalog::FetchError::Timeout));
        assert_eq!(
            render_refresh(&outcome, &store),
            "Could not refresh the catalog (Request timed out).\n"
        );
    }

    #[test]
    fn test_render_refresh_failed_keeps_previous() {
        let mut store = CatalogStore::new();
        let ticket = store.begin_refresh();
        store.apply(ticket, Ok(categories()));
        let ticket = store.begin_refresh();
        let outcome = store.apply(ticket, Err(crate::catalog::FetchError::HttpStatus(503)));

        let out = render_refresh(&outcome, &store);
        assert!(out.starts_with(
            "Could not refresh the catalog (HTTP error: status 503); keeping the copy from "
        ));
    }

    #[test]
    fn test_render_strips_escape_sequences() {
        let evil = vec![Category {
            name: "\x1b[2JOrchids".to_string(),
            items: vec![item(serde_json::json!({"name": "Ro\x07se"}))],
        }];
        let out = render_catalog(&evil, &FavoritesSet::new());
        assert!(!out.contains('\x1b'));
        assert!(!out.contains('\x07'));
        assert!(out.starts_with("Orchids\n"));
    }
}

use crate::catalog::{Category, Item};
use crate::favorites::FavoritesSet;

/// Items whose name is in `favorites`, in catalog order.
///
/// Categories are walked in order, then items within each category. Names
/// are not de-duplicated: an item listed under two categories appears twice
/// if it is a favorite.
pub fn favorite_items<'a>(catalog: &'a [Category], favorites: &FavoritesSet) -> Vec<&'a Item> {
    if favorites.is_empty() {
        return Vec::new();
    }

    catalog
        .iter()
        .flat_map(|category| category.items.iter())
        .filter(|item| favorites.contains(&item.name))
        .collect()
}

/// First item named `name`, in catalog order.
pub fn find_item<'a>(catalog: &'a [Category], name: &str) -> Option<&'a Item> {
    catalog
        .iter()
        .flat_map(|category| category.items.iter())
        .find(|item| item.name == name)
}

pub fn is_favorite(item: &Item, favorites: &FavoritesSet) -> bool {
    favorites.contains(&item.name)
}

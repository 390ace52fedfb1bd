use std::fmt;

use indexmap::IndexSet;

use crate::category::{Category, UnknownCategory};
use crate::config::DEFAULT_PAGE_SIZE;
use crate::item::Item;

const ALL_LABEL: &str = "all";

/// Active category filter of the catalog view.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum CategoryFilter {
    #[default]
    All,
    Only(Category),
}

impl CategoryFilter {
    pub fn label(self) -> &'static str {
        match self {
            CategoryFilter::All => ALL_LABEL,
            CategoryFilter::Only(category) => category.label(),
        }
    }

    /// Parses a filter label: `"all"` (or `"todos"`) or any category label.
    pub fn parse(label: &str) -> Result<Self, UnknownCategory> {
        let trimmed = label.trim();
        if trimmed.eq_ignore_ascii_case(ALL_LABEL) || trimmed.eq_ignore_ascii_case("todos") {
            return Ok(CategoryFilter::All);
        }
        Category::parse(trimmed).map(CategoryFilter::Only)
    }

    pub fn matches(self, item: &Item) -> bool {
        match self {
            CategoryFilter::All => true,
            CategoryFilter::Only(category) => item.has_category(category),
        }
    }
}

impl fmt::Display for CategoryFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl From<Category> for CategoryFilter {
    fn from(category: Category) -> Self {
        CategoryFilter::Only(category)
    }
}

/// Pagination state: a 1-based page, or empty when nothing matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageState {
    Empty,
    Page(usize),
}

impl PageState {
    pub fn number(self) -> Option<usize> {
        match self {
            PageState::Empty => None,
            PageState::Page(n) => Some(n),
        }
    }
}

/// What the presentation layer renders.
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogView<'a> {
    /// Items of the current page.
    pub items: Vec<&'a Item>,
    /// `All` followed by every category present, in order of first appearance.
    pub categories: Vec<CategoryFilter>,
    pub current_page: PageState,
    pub total_pages: usize,
}

/// Filter and pagination state over a live item set.
///
/// The projector keeps only the user's choices; every view is derived
/// afresh from the items passed in, so it always reflects the latest set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogProjector {
    page_size: usize,
    filter: CategoryFilter,
    page: usize,
}

impl Default for CatalogProjector {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE)
    }
}

impl CatalogProjector {
    /// A page size of zero is treated as one.
    pub fn new(page_size: usize) -> Self {
        Self {
            page_size: page_size.max(1),
            filter: CategoryFilter::All,
            page: 1,
        }
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn filter(&self) -> CategoryFilter {
        self.filter
    }

    /// Switches the active filter and goes back to the first page.
    pub fn select(&mut self, filter: CategoryFilter) {
        self.filter = filter;
        self.page = 1;
    }

    pub fn next(&mut self, items: &[Item]) -> PageState {
        match self.clamp(items) {
            PageState::Empty => PageState::Empty,
            PageState::Page(n) => self.go_to(n + 1, items),
        }
    }

    pub fn previous(&mut self, items: &[Item]) -> PageState {
        match self.clamp(items) {
            PageState::Empty => PageState::Empty,
            PageState::Page(n) => self.go_to(n - 1, items),
        }
    }

    /// Moves to page `n`, clamped into the valid range.
    pub fn go_to(&mut self, n: usize, items: &[Item]) -> PageState {
        self.page = n;
        self.clamp(items)
    }

    /// Derives the view of `items` under the current filter and page.
    pub fn view<'a>(&self, items: &'a [Item]) -> CatalogView<'a> {
        let filtered: Vec<&Item> = items.iter().filter(|i| self.filter.matches(i)).collect();
        let total = total_pages(filtered.len(), self.page_size);
        let current_page = page_state(self.page, total);

        let page_items = match current_page {
            PageState::Empty => Vec::new(),
            PageState::Page(n) => filtered
                .into_iter()
                .skip((n - 1) * self.page_size)
                .take(self.page_size)
                .collect(),
        };

        CatalogView {
            items: page_items,
            categories: categories(items),
            current_page,
            total_pages: total,
        }
    }

    fn clamp(&mut self, items: &[Item]) -> PageState {
        let matching = items.iter().filter(|i| self.filter.matches(i)).count();
        let state = page_state(self.page, total_pages(matching, self.page_size));
        self.page = state.number().unwrap_or(1);
        state
    }
}

fn page_state(requested: usize, total: usize) -> PageState {
    if total == 0 {
        PageState::Empty
    } else {
        PageState::Page(requested.clamp(1, total))
    }
}

/// Number of pages needed for `count` items.
pub fn total_pages(count: usize, page_size: usize) -> usize {
    count.div_ceil(page_size.max(1))
}

/// `All` followed by every category of `items`, in order of first appearance.
pub fn categories<'a>(items: impl IntoIterator<Item = &'a Item>) -> Vec<CategoryFilter> {
    let seen: IndexSet<Category> = items
        .into_iter()
        .flat_map(|item| item.categories.iter())
        .collect();

    std::iter::once(CategoryFilter::All)
        .chain(seen.into_iter().map(CategoryFilter::Only))
        .collect()
}

/// Items whose name or one of whose categories contains `term`, ignoring
/// case. An empty term matches everything.
pub fn search<'a>(items: &'a [Item], term: &str) -> Vec<&'a Item> {
    let term = term.trim().to_lowercase();
    items
        .iter()
        .filter(|item| {
            term.is_empty()
                || item.name.to_lowercase().contains(&term)
                || item.categories.iter().any(|c| {
                    c.label().to_lowercase().contains(&term)
                        || c.display_name().to_lowercase().contains(&term)
                })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::category::CategorySet;
    use crate::encoder::EncodedImage;
    use crate::price::Price;
    use vitrine_core::RecordId;

    fn item(n: usize, categories: &[Category]) -> Item {
        Item {
            id: RecordId::new(format!("{n:03}")),
            name: format!("Item {n}"),
            description: "prata".into(),
            price: Price::new("R$ 10,00"),
            categories: categories.iter().copied().collect::<CategorySet>(),
            promotion: None,
            image: EncodedImage::from_stored("data:image/png;base64,AA=="),
        }
    }

    fn rings(count: usize) -> Vec<Item> {
        (0..count).map(|n| item(n, &[Category::Aneis])).collect()
    }

    #[test]
    fn seventeen_items_make_three_pages() {
        let items = rings(17);
        let projector = CatalogProjector::new(8);

        let view = projector.view(&items);
        assert_eq!(view.total_pages, 3);
        assert_eq!(view.current_page, PageState::Page(1));
        assert_eq!(view.items.len(), 8);
    }

    #[test]
    fn out_of_range_page_is_clamped() {
        let items = rings(17);
        let mut projector = CatalogProjector::new(8);

        assert_eq!(projector.go_to(5, &items), PageState::Page(3));
        let view = projector.view(&items);
        assert_eq!(view.current_page, PageState::Page(3));
        assert_eq!(view.items.len(), 1);
        assert_eq!(view.items[0].name, "Item 16");

        assert_eq!(projector.go_to(0, &items), PageState::Page(1));
    }

    #[test]
    fn next_and_previous_stop_at_the_ends() {
        let items = rings(17);
        let mut projector = CatalogProjector::new(8);

        assert_eq!(projector.previous(&items), PageState::Page(1));
        assert_eq!(projector.next(&items), PageState::Page(2));
        assert_eq!(projector.next(&items), PageState::Page(3));
        assert_eq!(projector.next(&items), PageState::Page(3));
        assert_eq!(projector.previous(&items), PageState::Page(2));
    }

    #[test]
    fn selecting_a_filter_resets_to_first_page() {
        let mut items = rings(17);
        items.push(item(17, &[Category::Brincos]));
        let mut projector = CatalogProjector::new(8);
        projector.go_to(3, &items);

        projector.select(CategoryFilter::Only(Category::Brincos));
        let view = projector.view(&items);
        assert_eq!(view.current_page, PageState::Page(1));
        assert_eq!(view.total_pages, 1);
        assert_eq!(view.items.len(), 1);
    }

    #[test]
    fn empty_selection_has_no_pages() {
        let items = rings(3);
        let mut projector = CatalogProjector::new(8);
        projector.select(CategoryFilter::Only(Category::Pingentes));

        let view = projector.view(&items);
        assert_eq!(view.total_pages, 0);
        assert_eq!(view.current_page, PageState::Empty);
        assert!(view.items.is_empty());
        assert_eq!(projector.next(&items), PageState::Empty);
        assert_eq!(projector.previous(&items), PageState::Empty);
    }

    #[test]
    fn shrinking_set_pulls_page_back_in_range() {
        let mut items = rings(17);
        let mut projector = CatalogProjector::new(8);
        projector.go_to(3, &items);

        items.truncate(9);
        assert_eq!(projector.view(&items).current_page, PageState::Page(2));
        assert_eq!(projector.previous(&items), PageState::Page(1));
    }

    #[test]
    fn filter_is_a_membership_test() {
        let items = vec![item(0, &[Category::Aneis, Category::Promocao])];
        let all = CategoryFilter::All;
        let rings = CategoryFilter::parse("aneis").unwrap();
        let promo = CategoryFilter::parse("Promoção").unwrap();
        let earrings = CategoryFilter::parse("brincos").unwrap();

        assert!(all.matches(&items[0]));
        assert!(rings.matches(&items[0]));
        assert!(promo.matches(&items[0]));
        assert!(!earrings.matches(&items[0]));
    }

    #[test]
    fn categories_follow_first_appearance() {
        let items = vec![
            item(0, &[Category::Brincos]),
            item(1, &[Category::Aneis, Category::Brincos]),
            item(2, &[Category::Promocao]),
        ];
        let labels: Vec<_> = categories(&items).into_iter().map(CategoryFilter::label).collect();
        assert_eq!(labels, vec!["all", "brincos", "aneis", "Promoção"]);
        assert_eq!(categories(&Vec::<Item>::new()), vec![CategoryFilter::All]);
    }

    #[test]
    fn filter_labels_parse() {
        assert_eq!(CategoryFilter::parse("all"), Ok(CategoryFilter::All));
        assert_eq!(CategoryFilter::parse(" Todos "), Ok(CategoryFilter::All));
        assert_eq!(
            CategoryFilter::parse("Alianças"),
            Ok(CategoryFilter::Only(Category::Aliancas))
        );
        assert!(CategoryFilter::parse("relogios").is_err());
        assert_eq!(CategoryFilter::All.to_string(), "all");
    }

    #[test]
    fn search_matches_name_or_category() {
        let items = vec![
            item(0, &[Category::Aneis]),
            item(1, &[Category::Aliancas]),
            item(2, &[Category::Brincos]),
        ];

        assert_eq!(search(&items, "").len(), 3);
        assert_eq!(search(&items, "ITEM 1").len(), 1);
        assert_eq!(search(&items, "alian")[0].name, "Item 1");
        assert_eq!(search(&items, "anéis")[0].name, "Item 0");
        assert!(search(&items, "colar").is_empty());
    }

    #[test]
    fn zero_page_size_is_one() {
        let items = rings(3);
        let projector = CatalogProjector::new(0);
        assert_eq!(projector.view(&items).total_pages, 3);
        assert_eq!(total_pages(0, 8), 0);
        assert_eq!(total_pages(16, 8), 2);
    }
}

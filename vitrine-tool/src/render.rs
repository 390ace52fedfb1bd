use std::fmt::Write;

use vitrine_catalog::{CatalogView, CategoryFilter, Item, PageState};

pub fn item_line(item: &Item) -> String {
    let mut line = format!("{}  {}  {}", item.id, item.name, item.price);
    if let Some(promotion) = &item.promotion {
        let _ = write!(
            line,
            " (was {}, {})",
            promotion.original_price,
            promotion.label()
        );
    }
    let labels: Vec<&str> = item.categories.iter().map(|c| c.display_name()).collect();
    let _ = write!(line, "  [{}]", labels.join(", "));
    line
}

pub fn item_detail(item: &Item) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "id:          {}", item.id);
    let _ = writeln!(out, "name:        {}", item.name);
    let _ = writeln!(out, "description: {}", item.description);
    let _ = writeln!(out, "price:       {}", item.price);
    if let Some(promotion) = &item.promotion {
        let _ = writeln!(out, "promotion:   {}", promotion.label());
        let _ = writeln!(out, "was:         {}", promotion.original_price);
    }
    let labels: Vec<&str> = item.categories.iter().map(|c| c.display_name()).collect();
    let _ = writeln!(out, "categories:  {}", labels.join(", "));
    let _ = write!(
        out,
        "image:       {} ({} bytes encoded)",
        item.image.mime_type().unwrap_or("unknown"),
        item.image.len()
    );
    out
}

pub fn view(view: &CatalogView<'_>, filter: CategoryFilter) -> String {
    let mut out = String::new();

    let tabs: Vec<String> = view
        .categories
        .iter()
        .map(|c| {
            if *c == filter {
                format!("*{}*", c.label())
            } else {
                c.label().to_string()
            }
        })
        .collect();
    let _ = writeln!(out, "{}", tabs.join(" | "));

    match view.current_page {
        PageState::Empty => {
            let _ = write!(out, "no items");
        }
        PageState::Page(n) => {
            for item in &view.items {
                let _ = writeln!(out, "{}", item_line(item));
            }
            let _ = write!(out, "page {} of {}", n, view.total_pages);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use vitrine_catalog::{CatalogProjector, Category, EncodedImage, ItemId, Price, Promotion};

    fn item(id: &str, categories: &[Category], promotion: Option<Promotion>) -> Item {
        Item {
            id: ItemId::new(id),
            name: "Anel".into(),
            description: "prata".into(),
            price: Price::new("R$ 10,00"),
            categories: categories.iter().copied().collect(),
            promotion,
            image: EncodedImage::from_stored("data:image/jpeg;base64,AA=="),
        }
    }

    #[test]
    fn line_shows_promotion_and_categories() {
        let promotion = Promotion {
            original_price: Price::new("R$ 12,00"),
            tag: None,
        };
        let line = item_line(&item(
            "a1",
            &[Category::Aneis, Category::Promocao],
            Some(promotion),
        ));
        assert_eq!(
            line,
            "a1  Anel  R$ 10,00 (was R$ 12,00, Promoção)  [Anéis, Promoção]"
        );
    }

    #[test]
    fn view_marks_active_filter() {
        let items = vec![item("a1", &[Category::Aneis], None)];
        let projector = CatalogProjector::default();
        let rendered = view(&projector.view(&items), projector.filter());
        assert!(rendered.starts_with("*all* | aneis\n"));
        assert!(rendered.ends_with("page 1 of 1"));
    }

    #[test]
    fn empty_view() {
        let rendered = view(&CatalogProjector::default().view(&[]), CategoryFilter::All);
        assert_eq!(rendered, "*all*\nno items");
    }
}

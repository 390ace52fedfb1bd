use std::fmt;
use std::str::FromStr;

use indexmap::IndexSet;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// Category labels that can appear on an item.
///
/// The set is fixed. Stored labels are the canonical ones returned by
/// [`Category::label`]; every way of spelling a label that shows up in old
/// records goes through [`Category::parse`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Category {
    Correntaria,
    Conjuntos,
    Aliancas,
    Aneis,
    Brincos,
    Pingentes,
    /// Reserved pseudo-category mirroring the promotion flag.
    Promocao,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown category: {0:?}")]
pub struct UnknownCategory(pub String);

impl Category {
    pub const ALL: [Category; 7] = [
        Category::Correntaria,
        Category::Conjuntos,
        Category::Aliancas,
        Category::Aneis,
        Category::Brincos,
        Category::Pingentes,
        Category::Promocao,
    ];

    pub const PROMOTION: Category = Category::Promocao;

    /// Canonical stored label.
    pub fn label(self) -> &'static str {
        match self {
            Category::Correntaria => "correntaria",
            Category::Conjuntos => "conjuntos",
            Category::Aliancas => "aliancas",
            Category::Aneis => "aneis",
            Category::Brincos => "brincos",
            Category::Pingentes => "pingentes",
            Category::Promocao => "Promoção",
        }
    }

    /// Human-facing name, with accents.
    pub fn display_name(self) -> &'static str {
        match self {
            Category::Correntaria => "Correntaria",
            Category::Conjuntos => "Conjuntos",
            Category::Aliancas => "Alianças",
            Category::Aneis => "Anéis",
            Category::Brincos => "Brincos",
            Category::Pingentes => "Pingentes",
            Category::Promocao => "Promoção",
        }
    }

    pub fn is_promotion(self) -> bool {
        self == Category::Promocao
    }

    /// Resolves any accepted spelling of a label.
    ///
    /// Matching ignores surrounding whitespace, case and Portuguese
    /// diacritics, so `"Alianças"`, `"aliancas"` and `" ALIANÇAS "` are the
    /// same category.
    pub fn parse(label: &str) -> Result<Self, UnknownCategory> {
        let folded = fold(label);
        Category::ALL
            .into_iter()
            .find(|category| fold(category.label()) == folded)
            .ok_or_else(|| UnknownCategory(label.to_string()))
    }
}

fn fold(label: &str) -> String {
    label
        .trim()
        .chars()
        .flat_map(char::to_lowercase)
        .map(|c| match c {
            'á' | 'à' | 'â' | 'ã' | 'ä' => 'a',
            'é' | 'è' | 'ê' | 'ë' => 'e',
            'í' | 'ì' | 'î' | 'ï' => 'i',
            'ó' | 'ò' | 'ô' | 'õ' | 'ö' => 'o',
            'ú' | 'ù' | 'û' | 'ü' => 'u',
            'ç' => 'c',
            other => other,
        })
        .collect()
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Category {
    type Err = UnknownCategory;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::parse(s)
    }
}

impl Serialize for Category {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.label())
    }
}

impl<'de> Deserialize<'de> for Category {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let label = String::deserialize(deserializer)?;
        Category::parse(&label).map_err(serde::de::Error::custom)
    }
}

/// The categories of one item.
///
/// Keeps insertion order for display, but compares as a set: two sets with
/// the same members are equal whatever their order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CategorySet(IndexSet<Category>);

impl CategorySet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a category. Returns false if it was already present.
    pub fn insert(&mut self, category: Category) -> bool {
        self.0.insert(category)
    }

    /// Removes a category, keeping the order of the rest.
    pub fn remove(&mut self, category: Category) -> bool {
        self.0.shift_remove(&category)
    }

    pub fn contains(&self, category: Category) -> bool {
        self.0.contains(&category)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = Category> + '_ {
        self.0.iter().copied()
    }

    /// Regular categories only, i.e. without the promotion pseudo-category.
    pub fn regular(&self) -> impl Iterator<Item = Category> + '_ {
        self.iter().filter(|c| !c.is_promotion())
    }

    /// Adds or strips the promotion pseudo-category to match `promoted`.
    pub fn sync_promotion(&mut self, promoted: bool) {
        if promoted {
            self.insert(Category::PROMOTION);
        } else {
            self.remove(Category::PROMOTION);
        }
    }

    pub fn labels(&self) -> Vec<&'static str> {
        self.iter().map(Category::label).collect()
    }
}

impl FromIterator<Category> for CategorySet {
    fn from_iter<I: IntoIterator<Item = Category>>(iter: I) -> Self {
        CategorySet(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a CategorySet {
    type Item = Category;
    type IntoIter = std::iter::Copied<indexmap::set::Iter<'a, Category>>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_canonical_labels() {
        for category in Category::ALL {
            assert_eq!(Category::parse(category.label()), Ok(category));
        }
    }

    #[test]
    fn parse_folds_case_and_accents() {
        assert_eq!(Category::parse("Alianças"), Ok(Category::Aliancas));
        assert_eq!(Category::parse("alianças"), Ok(Category::Aliancas));
        assert_eq!(Category::parse(" ALIANCAS "), Ok(Category::Aliancas));
        assert_eq!(Category::parse("Aneis"), Ok(Category::Aneis));
        assert_eq!(Category::parse("anéis"), Ok(Category::Aneis));
        assert_eq!(Category::parse("promocao"), Ok(Category::Promocao));
        assert_eq!(Category::parse("Promoção"), Ok(Category::Promocao));
    }

    #[test]
    fn parse_rejects_unknown() {
        assert_eq!(
            Category::parse("relogios"),
            Err(UnknownCategory("relogios".to_string()))
        );
        assert!(Category::parse("").is_err());
    }

    #[test]
    fn serde_uses_canonical_label() {
        let json = serde_json::to_string(&Category::Aliancas).unwrap();
        assert_eq!(json, "\"aliancas\"");

        let parsed: Category = serde_json::from_str("\"Alianças\"").unwrap();
        assert_eq!(parsed, Category::Aliancas);
    }

    #[test]
    fn set_ignores_duplicates() {
        let mut set = CategorySet::new();
        assert!(set.insert(Category::Aneis));
        assert!(!set.insert(Category::Aneis));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn set_equality_ignores_order() {
        let a: CategorySet = [Category::Aneis, Category::Brincos].into_iter().collect();
        let b: CategorySet = [Category::Brincos, Category::Aneis].into_iter().collect();
        assert_eq!(a, b);
    }

    #[test]
    fn sync_promotion_adds_once_and_strips() {
        let mut set: CategorySet = [Category::Aneis, Category::Promocao].into_iter().collect();
        set.sync_promotion(true);
        assert_eq!(set.len(), 2);

        set.sync_promotion(false);
        assert_eq!(set.labels(), vec!["aneis"]);
        assert_eq!(set.regular().count(), 1);
    }
}

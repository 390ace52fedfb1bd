use std::fmt;

use thiserror::Error;
use vitrine_core::Fields;

use crate::category::{Category, CategorySet};
use crate::encoder::EncodedImage;
use crate::item::{Item, ItemDraft, ItemId, Promotion, document_fields};
use crate::price::Price;

/// Draft field a violation refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Name,
    Description,
    Price,
    Categories,
    OriginalPrice,
    Image,
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Field::Name => "name",
            Field::Description => "description",
            Field::Price => "price",
            Field::Categories => "categories",
            Field::OriginalPrice => "originalPrice",
            Field::Image => "image",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    pub field: Field,
    pub reason: String,
}

impl Violation {
    fn new(field: Field, reason: impl Into<String>) -> Self {
        Violation {
            field,
            reason: reason.into(),
        }
    }
}

/// Every reason a draft was rejected. Never empty.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub struct ValidationError {
    pub violations: Vec<Violation>,
}

impl ValidationError {
    pub fn fields(&self) -> impl Iterator<Item = Field> + '_ {
        self.violations.iter().map(|v| v.field)
    }

    pub fn has(&self, field: Field) -> bool {
        self.fields().any(|f| f == field)
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, violation) in self.violations.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            f.write_str(&violation.reason)?;
        }
        Ok(())
    }
}

/// A draft that passed validation, normalized and ready to be written.
///
/// Only [`ItemDraft::validate_for_create`] and
/// [`ItemDraft::validate_for_update`] produce one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidDraft {
    name: String,
    description: String,
    price: Price,
    categories: CategorySet,
    promotion: Option<Promotion>,
}

impl ValidDraft {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn price(&self) -> &Price {
        &self.price
    }

    pub fn categories(&self) -> &CategorySet {
        &self.categories
    }

    pub fn promotion(&self) -> Option<&Promotion> {
        self.promotion.as_ref()
    }

    pub(crate) fn to_fields(&self, image: &EncodedImage) -> Fields {
        document_fields(
            &self.name,
            &self.description,
            &self.price,
            &self.categories,
            self.promotion.as_ref(),
            image,
        )
    }

    pub fn into_item(self, id: ItemId, image: EncodedImage) -> Item {
        Item {
            id,
            name: self.name,
            description: self.description,
            price: self.price,
            categories: self.categories,
            promotion: self.promotion,
            image,
        }
    }
}

fn required(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

impl ItemDraft {
    /// Checks a draft for creation. `image` is the raw upload, if any.
    pub fn validate_for_create(&self, image: Option<&[u8]>) -> Result<ValidDraft, ValidationError> {
        let mut violations = Vec::new();
        if image.is_none_or(<[u8]>::is_empty) {
            violations.push(Violation::new(Field::Image, "an image is required"));
        }
        self.check(violations)
    }

    /// Checks a draft replacing an existing item, whose image may be kept.
    pub fn validate_for_update(&self) -> Result<ValidDraft, ValidationError> {
        self.check(Vec::new())
    }

    pub fn is_valid_for_create(&self, image: Option<&[u8]>) -> bool {
        self.validate_for_create(image).is_ok()
    }

    pub fn is_valid_for_update(&self) -> bool {
        self.validate_for_update().is_ok()
    }

    fn check(&self, mut violations: Vec<Violation>) -> Result<ValidDraft, ValidationError> {
        let name = required(&self.name);
        if name.is_none() {
            violations.push(Violation::new(Field::Name, "name is required"));
        }
        let description = required(&self.description);
        if description.is_none() {
            violations.push(Violation::new(Field::Description, "description is required"));
        }
        let price = required(&self.price);
        if price.is_none() {
            violations.push(Violation::new(Field::Price, "price is required"));
        }

        let mut categories = CategorySet::new();
        for label in &self.categories {
            match Category::parse(label) {
                Ok(category) => {
                    categories.insert(category);
                }
                Err(e) => violations.push(Violation::new(Field::Categories, e.to_string())),
            }
        }
        categories.sync_promotion(self.is_promotion);
        if categories.regular().next().is_none() {
            violations.push(Violation::new(
                Field::Categories,
                "select at least one category",
            ));
        }

        let promotion = if self.is_promotion {
            match required(&self.original_price) {
                Some(original_price) => Some(Promotion {
                    original_price: Price::new(original_price),
                    tag: required(&self.promotion_tag),
                }),
                None => {
                    violations.push(Violation::new(
                        Field::OriginalPrice,
                        "original price is required for a promotion",
                    ));
                    None
                }
            }
        } else {
            None
        };

        match (name, description, price) {
            (Some(name), Some(description), Some(price)) if violations.is_empty() => {
                Ok(ValidDraft {
                    name,
                    description,
                    price: Price::new(price),
                    categories,
                    promotion,
                })
            }
            _ => Err(ValidationError { violations }),
        }
    }
}

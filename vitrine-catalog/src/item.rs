use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use vitrine_core::{Fields, Record, RecordId};

use crate::category::{Category, CategorySet, UnknownCategory};
use crate::encoder::EncodedImage;
use crate::price::Price;

/// Stable identifier of an item, assigned by the store on creation.
pub type ItemId = RecordId;

/// Label shown for a promotion that has no tag of its own.
pub const DEFAULT_PROMOTION_TAG: &str = "Promoção";

pub(crate) const IMAGE_FIELD: &str = "imageBase64";

/// Promotional state of an item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Promotion {
    pub original_price: Price,
    pub tag: Option<String>,
}

impl Promotion {
    pub fn label(&self) -> &str {
        self.tag.as_deref().unwrap_or(DEFAULT_PROMOTION_TAG)
    }
}

/// A catalog item as persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct Item {
    pub id: ItemId,
    pub name: String,
    pub description: String,
    pub price: Price,
    pub categories: CategorySet,
    pub promotion: Option<Promotion>,
    pub image: EncodedImage,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DocumentError {
    #[error("invalid document: {0}")]
    Shape(String),
    #[error("document has no image")]
    MissingImage,
    #[error(transparent)]
    UnknownCategory(#[from] UnknownCategory),
}

/// Stored document shape. Optional fields may be missing or null in
/// older records.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ItemDocument {
    name: String,
    price: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    categories: Option<Vec<String>>,
    #[serde(default)]
    image_base64: Option<String>,
    #[serde(default)]
    is_promotion: Option<bool>,
    #[serde(default)]
    original_price: Option<String>,
    #[serde(default)]
    promotion_tag: Option<String>,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

impl Item {
    pub fn is_promotion(&self) -> bool {
        self.promotion.is_some()
    }

    pub fn has_category(&self, category: Category) -> bool {
        self.categories.contains(category)
    }

    /// Decodes a stored record.
    ///
    /// Category labels must resolve to known categories. A promotion flag
    /// without an original price decodes as no promotion.
    pub fn from_record(record: Record) -> Result<Self, DocumentError> {
        let doc: ItemDocument = serde_json::from_value(Value::Object(record.fields))
            .map_err(|e| DocumentError::Shape(e.to_string()))?;

        let image = non_blank(doc.image_base64).ok_or(DocumentError::MissingImage)?;

        let categories = doc
            .categories
            .unwrap_or_default()
            .iter()
            .map(|label| Category::parse(label))
            .collect::<Result<CategorySet, _>>()?;

        let promotion = match (doc.is_promotion.unwrap_or(false), non_blank(doc.original_price)) {
            (true, Some(original_price)) => Some(Promotion {
                original_price: Price::new(original_price),
                tag: non_blank(doc.promotion_tag),
            }),
            _ => None,
        };

        Ok(Item {
            id: record.id,
            name: doc.name,
            description: doc.description.unwrap_or_default(),
            price: Price::new(doc.price),
            categories,
            promotion,
            image: EncodedImage::from_stored(image),
        })
    }

    /// Encodes the item as stored document fields (the id is not a field).
    pub fn to_fields(&self) -> Fields {
        document_fields(
            &self.name,
            &self.description,
            &self.price,
            &self.categories,
            self.promotion.as_ref(),
            &self.image,
        )
    }
}

pub(crate) fn document_fields(
    name: &str,
    description: &str,
    price: &Price,
    categories: &CategorySet,
    promotion: Option<&Promotion>,
    image: &EncodedImage,
) -> Fields {
    let mut fields = Fields::new();
    fields.insert("name".into(), Value::from(name));
    fields.insert("price".into(), Value::from(price.as_str()));
    fields.insert("description".into(), Value::from(description));
    fields.insert("categories".into(), Value::from(categories.labels()));
    fields.insert(IMAGE_FIELD.into(), Value::from(image.as_str()));
    fields.insert("isPromotion".into(), Value::from(promotion.is_some()));
    fields.insert(
        "originalPrice".into(),
        promotion.map_or(Value::Null, |p| Value::from(p.original_price.as_str())),
    );
    fields.insert(
        "promotionTag".into(),
        promotion
            .and_then(|p| p.tag.as_deref())
            .map_or(Value::Null, Value::from),
    );
    fields
}

/// Form state of an item being created or edited.
///
/// One draft is owned by whichever editor is active and handed to the
/// validation gate on submit. Fields are raw user input: nothing here is
/// trimmed, parsed or checked.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemDraft {
    pub name: String,
    pub description: String,
    pub price: String,
    pub categories: Vec<String>,
    pub is_promotion: bool,
    pub original_price: String,
    pub promotion_tag: String,
}

impl ItemDraft {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        price: impl Into<String>,
    ) -> Self {
        ItemDraft {
            name: name.into(),
            description: description.into(),
            price: price.into(),
            ..Self::default()
        }
    }

    pub fn with_category(mut self, label: impl Into<String>) -> Self {
        self.categories.push(label.into());
        self
    }

    pub fn with_promotion(mut self, original_price: impl Into<String>, tag: Option<&str>) -> Self {
        self.is_promotion = true;
        self.original_price = original_price.into();
        self.promotion_tag = tag.unwrap_or_default().to_string();
        self
    }

    /// Seeds an edit session from a stored item.
    ///
    /// Items tagged with the promotion category count as promotional even
    /// if their flag was never set.
    pub fn from_item(item: &Item) -> Self {
        let (original_price, promotion_tag) = item
            .promotion
            .as_ref()
            .map(|p| {
                (
                    p.original_price.as_str().to_string(),
                    p.tag.clone().unwrap_or_default(),
                )
            })
            .unwrap_or_default();

        ItemDraft {
            name: item.name.clone(),
            description: item.description.clone(),
            price: item.price.as_str().to_string(),
            categories: item
                .categories
                .regular()
                .map(|c| c.label().to_string())
                .collect(),
            is_promotion: item.is_promotion() || item.has_category(Category::PROMOTION),
            original_price,
            promotion_tag,
        }
    }
}

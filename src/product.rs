//! Product models and the create/edit form.
//!
//! [`ProductForm`] owns everything the product screens edit: the draft
//! fields, the category picker, the image gallery and the failing-field
//! set. Submitting validates first and never reaches the backend while any
//! required field is missing.

use serde::{Deserialize, Serialize};

use crate::backend::CatalogBackend;
use crate::category::{CategoryMap, CategoryPicker, SelectedCategory, generate_breadcrumbs};
use crate::error::{AdminError, Result};
use crate::fields::{Field, FieldCheckSet, FieldValue, check_fields};
use crate::notice::Notice;

/// Reference to a category as embedded in product payloads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryRef {
    pub id: String,
    pub name: String,
}

/// A colour or size option attached to a product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeOption {
    pub id: String,
    pub name: String,
}

/// One value of an attribute, e.g. "Red" under "colour".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeValue {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub public: bool,
}

/// Attribute definition as listed by `GET /variants`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attribute {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub code: String,
    pub name: String,
    #[serde(default)]
    pub variants: Vec<AttributeValue>,
    #[serde(default)]
    pub public: bool,
    #[serde(rename = "createdAt", default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductImage {
    pub image_url: String,
    pub order: u32,
}

/// Product as returned by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub seo_name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub overview: String,
    #[serde(default)]
    pub category: Option<CategoryRef>,
    #[serde(default)]
    pub categories: Vec<CategoryRef>,
    #[serde(default)]
    pub picture: Option<String>,
    #[serde(default)]
    pub colours: Vec<AttributeOption>,
    #[serde(default)]
    pub sizes: Vec<AttributeOption>,
    #[serde(default)]
    pub images: Vec<ProductImage>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub is_hot: bool,
    #[serde(default)]
    pub is_new: bool,
    #[serde(default)]
    pub is_show: bool,
    #[serde(default)]
    pub material: Option<String>,
    #[serde(default)]
    pub brand: Option<String>,
    #[serde(default)]
    pub sku: Option<String>,
    #[serde(default)]
    pub price: f64,
    #[serde(default)]
    pub special_price: f64,
    #[serde(default)]
    pub wholesale_price: f64,
    #[serde(default)]
    pub slug: String,
}

/// Body of `POST /product` and `PATCH /products/:id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateProduct {
    pub name: String,
    pub seo_name: String,
    pub description: String,
    pub overview: String,
    pub category: Option<CategoryRef>,
    pub categories: Vec<CategoryRef>,
    pub picture: Option<String>,
    pub colours: Vec<AttributeOption>,
    pub sizes: Vec<AttributeOption>,
    pub images: Vec<ProductImage>,
    pub tags: Vec<String>,
    pub is_hot: bool,
    pub is_new: bool,
    pub is_show: bool,
    pub material: Option<String>,
    pub brand: Option<String>,
    pub sku: Option<String>,
    pub price: f64,
    pub special_price: f64,
    pub wholesale_price: f64,
}

/// Colour and size choices offered by the product form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct VariantOptions {
    pub colours: Vec<AttributeOption>,
    pub sizes: Vec<AttributeOption>,
}

impl VariantOptions {
    /// Pick the colour and size attributes out of the variant listing.
    pub fn from_attributes(attributes: &[Attribute]) -> Self {
        let mut options = VariantOptions::default();
        for attribute in attributes {
            let target = match attribute.code.to_lowercase().as_str() {
                "colour" | "colours" | "color" | "colors" => &mut options.colours,
                "size" | "sizes" => &mut options.sizes,
                other => {
                    log::debug!("skipping attribute {}", other);
                    continue;
                }
            };
            target.extend(attribute.variants.iter().map(|value| AttributeOption {
                id: value.id.clone(),
                name: value.name.clone(),
            }));
        }
        options
    }
}

/// Query of the product listing search.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductFilter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
}

/// Editable product fields.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductDraft {
    pub name: String,
    pub seo_name: String,
    pub overview: String,
    pub description: String,
    pub brand: Option<String>,
    pub material: Option<String>,
    pub sku: Option<String>,
    pub picture: Option<String>,
    pub price: f64,
    pub special_price: f64,
    pub wholesale_price: f64,
    pub is_hot: bool,
    pub is_new: bool,
    pub is_show: bool,
    pub tags: Vec<String>,
    pub colours: Vec<AttributeOption>,
    pub sizes: Vec<AttributeOption>,
}

impl Default for ProductDraft {
    fn default() -> Self {
        ProductDraft {
            name: String::new(),
            seo_name: String::new(),
            overview: String::new(),
            description: String::new(),
            brand: None,
            material: None,
            sku: None,
            picture: None,
            price: 0.0,
            special_price: 0.0,
            wholesale_price: 0.0,
            is_hot: true,
            is_new: true,
            is_show: true,
            tags: Vec::new(),
            colours: Vec::new(),
            sizes: Vec::new(),
        }
    }
}

/// Names of the fields a product cannot be saved without, in form order.
pub const REQUIRED_FIELDS: [&str; 7] = [
    "name",
    "seoName",
    "overview",
    "description",
    "category",
    "brand",
    "material",
];

#[derive(Debug, Clone, Default)]
pub struct ProductForm {
    draft: ProductDraft,
    picker: CategoryPicker,
    gallery: Vec<String>,
    checks: FieldCheckSet,
}

impl ProductForm {
    pub fn new() -> Self {
        Self::default()
    }

    /// Form pre-filled from an existing product for the edit screen.
    pub fn from_product(product: Product, categories: &CategoryMap) -> Self {
        let mut refs = product.categories;
        if let Some(primary) = product.category {
            if !refs.iter().any(|r| r.id == primary.id) {
                refs.insert(0, primary);
            }
        }

        let selected = refs
            .into_iter()
            .map(|r| {
                let breadcrumbs = generate_breadcrumbs(&r.id, categories).unwrap_or_else(|err| {
                    log::warn!("dropping breadcrumbs for {}: {}", r.id, err);
                    Vec::new()
                });
                SelectedCategory {
                    node_id: r.id,
                    title: r.name,
                    breadcrumbs,
                }
            })
            .collect();

        let mut images = product.images;
        images.sort_by_key(|image| image.order);

        ProductForm {
            draft: ProductDraft {
                name: product.name,
                seo_name: product.seo_name,
                overview: product.overview,
                description: product.description,
                brand: product.brand,
                material: product.material,
                sku: product.sku,
                picture: product.picture,
                price: product.price,
                special_price: product.special_price,
                wholesale_price: product.wholesale_price,
                is_hot: product.is_hot,
                is_new: product.is_new,
                is_show: product.is_show,
                tags: product.tags,
                colours: product.colours,
                sizes: product.sizes,
            },
            picker: CategoryPicker::with_selected(selected),
            gallery: images.into_iter().map(|image| image.image_url).collect(),
            checks: FieldCheckSet::new(),
        }
    }

    /// Fetch a product and open it for editing.
    pub async fn load<B>(product_id: &str, categories: &CategoryMap, backend: &B) -> Result<Self>
    where
        B: CatalogBackend + ?Sized,
    {
        let product = backend.get_product(product_id).await?;
        Ok(Self::from_product(product, categories))
    }

    pub fn draft(&self) -> &ProductDraft {
        &self.draft
    }

    pub fn checks(&self) -> &FieldCheckSet {
        &self.checks
    }

    pub fn picker(&self) -> &CategoryPicker {
        &self.picker
    }

    pub fn picker_mut(&mut self) -> &mut CategoryPicker {
        &mut self.picker
    }

    pub fn gallery(&self) -> &[String] {
        &self.gallery
    }

    /// Update a text field and clear its check. Returns false for an unknown name.
    pub fn change_value(&mut self, name: &str, value: &str) -> bool {
        let optional = || (!value.is_empty()).then(|| value.to_string());
        match name {
            "name" => self.draft.name = value.to_string(),
            "seoName" => self.draft.seo_name = value.to_string(),
            "overview" => self.draft.overview = value.to_string(),
            "description" => self.draft.description = value.to_string(),
            "brand" => self.draft.brand = optional(),
            "material" => self.draft.material = optional(),
            "sku" => self.draft.sku = optional(),
            "picture" => self.draft.picture = optional(),
            _ => {
                log::debug!("ignoring edit of unknown field {}", name);
                return false;
            }
        }
        self.checks.remove(name);
        true
    }

    /// Update a price field.
    ///
    /// A special price at or above the regular price is refused: the field
    /// is flagged and the draft keeps its previous value.
    pub fn change_price(&mut self, name: &str, value: f64) -> std::result::Result<(), Notice> {
        match name {
            "specialPrice" => {
                if value >= self.draft.price {
                    self.checks.insert(name);
                    return Err(Notice::PromotionPriceTooHigh);
                }
                self.draft.special_price = value;
            }
            "price" => self.draft.price = value,
            "wholesalePrice" => self.draft.wholesale_price = value,
            _ => {
                log::debug!("ignoring edit of unknown price {}", name);
                return Ok(());
            }
        }
        self.checks.remove(name);
        Ok(())
    }

    pub fn set_flag(&mut self, name: &str, value: bool) {
        match name {
            "isHot" => self.draft.is_hot = value,
            "isNew" => self.draft.is_new = value,
            "isShow" => self.draft.is_show = value,
            _ => log::debug!("ignoring unknown flag {}", name),
        }
    }

    pub fn set_tags(&mut self, tags: Vec<String>) {
        self.draft.tags = tags;
    }

    pub fn set_colours(&mut self, colours: Vec<AttributeOption>) {
        self.draft.colours = colours;
    }

    pub fn set_sizes(&mut self, sizes: Vec<AttributeOption>) {
        self.draft.sizes = sizes;
    }

    /// Attach the picker's highlighted category and clear the category check.
    pub fn attach_category(&mut self, categories: &CategoryMap) -> std::result::Result<(), Notice> {
        self.picker.attach(categories)?;
        self.checks.remove("category");
        Ok(())
    }

    pub fn add_image_slot(&mut self) {
        self.gallery.push(String::new());
    }

    pub fn set_image(&mut self, index: usize, url: &str) {
        if let Some(slot) = self.gallery.get_mut(index) {
            *slot = url.to_string();
        }
    }

    pub fn remove_image(&mut self, index: usize) {
        if index < self.gallery.len() {
            self.gallery.remove(index);
        }
    }

    /// Non-empty gallery slots, ordered by their slot position.
    pub fn images_to_send(&self) -> Vec<ProductImage> {
        self.gallery
            .iter()
            .enumerate()
            .filter(|(_, url)| !url.is_empty())
            .map(|(index, url)| ProductImage {
                image_url: url.clone(),
                order: index as u32 + 1,
            })
            .collect()
    }

    pub fn required_fields(&self) -> Vec<Field> {
        let category_titles: Vec<String> = self
            .picker
            .selected()
            .iter()
            .map(|s| s.title.clone())
            .collect();

        vec![
            Field::new("name", self.draft.name.as_str()),
            Field::new("seoName", self.draft.seo_name.as_str()),
            Field::new("overview", self.draft.overview.as_str()),
            Field::new("description", self.draft.description.as_str()),
            Field::new("category", FieldValue::List(category_titles)),
            Field::new("brand", self.draft.brand.clone()),
            Field::new("material", self.draft.material.clone()),
        ]
    }

    /// Recompute the failing-field set from scratch.
    pub fn validate(&mut self) -> Result<()> {
        self.checks = check_fields(&self.required_fields());
        if self.checks.is_empty() {
            return Ok(());
        }
        log::debug!("product form failing fields: {:?}", self.checks.names());
        Err(AdminError::Validation {
            fields: self.checks.names().to_vec(),
        })
    }

    pub fn to_payload(&self) -> CreateProduct {
        let categories: Vec<CategoryRef> = self
            .picker
            .selected()
            .iter()
            .map(|s| CategoryRef {
                id: s.node_id.clone(),
                name: s.title.clone(),
            })
            .collect();

        CreateProduct {
            name: self.draft.name.clone(),
            seo_name: self.draft.seo_name.clone(),
            description: self.draft.description.clone(),
            overview: self.draft.overview.clone(),
            category: categories.first().cloned(),
            categories,
            picture: self.draft.picture.clone(),
            colours: self.draft.colours.clone(),
            sizes: self.draft.sizes.clone(),
            images: self.images_to_send(),
            tags: self.draft.tags.clone(),
            is_hot: self.draft.is_hot,
            is_new: self.draft.is_new,
            is_show: self.draft.is_show,
            material: self.draft.material.clone(),
            brand: self.draft.brand.clone(),
            sku: self.draft.sku.clone(),
            price: self.draft.price,
            special_price: self.draft.special_price,
            wholesale_price: self.draft.wholesale_price,
        }
    }

    /// Validate and create the product.
    pub async fn submit_create<B>(&mut self, backend: &B) -> Result<()>
    where
        B: CatalogBackend + ?Sized,
    {
        self.validate()?;
        backend.create_product(&self.to_payload()).await
    }

    /// Validate and update an existing product.
    pub async fn submit_update<B>(&mut self, product_id: &str, backend: &B) -> Result<()>
    where
        B: CatalogBackend + ?Sized,
    {
        self.validate()?;
        backend.update_product(product_id, &self.to_payload()).await
    }
}

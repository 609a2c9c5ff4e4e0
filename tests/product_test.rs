use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use shop_admin::backend::{CatalogBackend, Page};
use shop_admin::category::{CategoryMap, CategoryRecord};
use shop_admin::category_form::CreateCategory;
use shop_admin::error::Result;
use shop_admin::pagination::Pagination;
use shop_admin::product::{
    Attribute, AttributeOption, CategoryRef, CreateProduct, Product, ProductFilter, ProductForm,
    ProductImage, REQUIRED_FIELDS, VariantOptions,
};
use shop_admin::{AdminError, Notice};

/// Catalog stand-in that records every write.
#[derive(Default)]
struct RecordingCatalog {
    requests: AtomicUsize,
    stored: Option<Product>,
    created: Mutex<Vec<CreateProduct>>,
    updated: Mutex<Vec<(String, CreateProduct)>>,
}

impl RecordingCatalog {
    fn holding(product: Product) -> Self {
        RecordingCatalog {
            stored: Some(product),
            ..Default::default()
        }
    }

    fn request_count(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }

    fn empty_page<T>(&self) -> Result<Page<T>> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        Ok(Page {
            items: Vec::new(),
            pagination: Pagination::default(),
        })
    }
}

#[async_trait]
impl CatalogBackend for RecordingCatalog {
    async fn list_categories_page(&self, _page: u32) -> Result<Page<CategoryRecord>> {
        self.empty_page()
    }

    async fn search_categories(&self, _search: &str, _page: u32) -> Result<Page<CategoryRecord>> {
        self.empty_page()
    }

    async fn list_parent_categories(&self) -> Result<Vec<CategoryRecord>> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        Ok(Vec::new())
    }

    async fn create_category(&self, _category: &CreateCategory) -> Result<()> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn set_category_public(&self, _category_id: &str, _public: bool) -> Result<()> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn delete_category(&self, _category_id: &str) -> Result<()> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn get_product(&self, _product_id: &str) -> Result<Product> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        self.stored.clone().ok_or(AdminError::NotFound)
    }

    async fn create_product(&self, product: &CreateProduct) -> Result<()> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        self.created.lock().unwrap().push(product.clone());
        Ok(())
    }

    async fn update_product(&self, product_id: &str, product: &CreateProduct) -> Result<()> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        self.updated
            .lock()
            .unwrap()
            .push((product_id.to_string(), product.clone()));
        Ok(())
    }

    async fn delete_product(&self, _product_id: &str) -> Result<()> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn search_products(&self, _filter: &ProductFilter) -> Result<Vec<Product>> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        Ok(Vec::new())
    }

    async fn list_products(&self, _filter: &ProductFilter) -> Result<Page<Product>> {
        self.empty_page()
    }

    async fn list_variants(&self) -> Result<Vec<Attribute>> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        Ok(Vec::new())
    }
}

fn record(id: &str, parent: Option<&str>, title: &str) -> CategoryRecord {
    CategoryRecord {
        id: id.to_string(),
        parent_id: parent.map(str::to_string),
        title: title.to_string(),
        slug: title.to_lowercase(),
        public: true,
        thumbnail: None,
        created_at: None,
    }
}

fn categories() -> CategoryMap {
    CategoryMap::from_records(vec![
        record("A", None, "Home"),
        record("B", Some("A"), "Shoes"),
        record("C", Some("B"), "Sneakers"),
    ])
}

fn filled_form(categories: &CategoryMap) -> ProductForm {
    let mut form = ProductForm::new();
    for (name, value) in [
        ("name", "Air Max"),
        ("seoName", "air-max"),
        ("overview", "Running shoe"),
        ("description", "Light and fast"),
        ("brand", "Nike"),
        ("material", "Mesh"),
    ] {
        assert!(form.change_value(name, value), "unknown field {}", name);
    }
    form.picker_mut().highlight(categories.get("C").unwrap());
    form.attach_category(categories).unwrap();
    form
}

#[tokio::test]
async fn empty_form_never_reaches_backend() {
    let backend = RecordingCatalog::default();
    let mut form = ProductForm::new();

    let err = form.submit_create(&backend).await.unwrap_err();
    match err {
        AdminError::Validation { fields } => assert_eq!(fields, REQUIRED_FIELDS),
        other => panic!("expected validation error, got {:?}", other),
    }
    assert_eq!(backend.request_count(), 0);
    assert_eq!(form.checks().len(), REQUIRED_FIELDS.len());
    assert_eq!(form.checks().anchor().as_deref(), Some("#name"));
    println!("✓ Empty product form rejected with no request sent");
}

#[tokio::test]
async fn filled_form_creates_once() {
    let categories = categories();
    let backend = RecordingCatalog::default();
    let mut form = filled_form(&categories);

    form.submit_create(&backend).await.unwrap();

    assert_eq!(backend.request_count(), 1);
    assert!(form.checks().is_empty());

    let created = backend.created.lock().unwrap();
    let payload = &created[0];
    assert_eq!(payload.name, "Air Max");
    assert_eq!(
        payload.category,
        Some(CategoryRef {
            id: "C".to_string(),
            name: "Sneakers".to_string()
        })
    );
    assert_eq!(payload.categories.len(), 1);
    assert!(payload.is_hot && payload.is_new && payload.is_show);
}

#[tokio::test]
async fn update_targets_product_id() {
    let categories = categories();
    let backend = RecordingCatalog::default();
    let mut form = filled_form(&categories);

    form.submit_update("p-1", &backend).await.unwrap();

    let updated = backend.updated.lock().unwrap();
    assert_eq!(updated.len(), 1);
    assert_eq!(updated[0].0, "p-1");
}

#[tokio::test]
async fn single_missing_field_is_reported() {
    let categories = categories();
    let backend = RecordingCatalog::default();
    let mut form = filled_form(&categories);
    form.change_value("material", "");

    let err = form.submit_create(&backend).await.unwrap_err();
    assert!(matches!(err, AdminError::Validation { ref fields } if fields == &["material"]));
    assert_eq!(backend.request_count(), 0);

    // Editing the field clears its check
    form.change_value("material", "Leather");
    assert!(!form.checks().contains("material"));
}

#[test]
fn special_price_must_stay_below_price() {
    let mut form = ProductForm::new();
    form.change_price("price", 100.0).unwrap();

    assert_eq!(
        form.change_price("specialPrice", 120.0),
        Err(Notice::PromotionPriceTooHigh)
    );
    assert!(form.checks().contains("specialPrice"));
    assert_eq!(form.draft().special_price, 0.0);

    form.change_price("specialPrice", 80.0).unwrap();
    assert_eq!(form.draft().special_price, 80.0);
    assert!(!form.checks().contains("specialPrice"));
}

#[test]
fn duplicate_category_is_refused() {
    let categories = categories();
    let mut form = filled_form(&categories);

    form.picker_mut().highlight(categories.get("C").unwrap());
    assert!(matches!(
        form.attach_category(&categories),
        Err(Notice::AlreadySelected { .. })
    ));
    assert_eq!(form.picker().selected().len(), 1);
}

#[test]
fn gallery_skips_empty_slots() {
    let mut form = ProductForm::new();
    form.add_image_slot();
    form.add_image_slot();
    form.add_image_slot();
    form.set_image(0, "a.png");
    form.set_image(2, "c.png");
    form.set_image(7, "ignored.png");

    assert_eq!(
        form.images_to_send(),
        vec![
            ProductImage {
                image_url: "a.png".to_string(),
                order: 1
            },
            ProductImage {
                image_url: "c.png".to_string(),
                order: 3
            },
        ]
    );

    form.remove_image(0);
    assert_eq!(form.gallery(), ["", "c.png"]);
}

#[test]
fn edit_form_loads_product() {
    let categories = categories();
    let product: Product = serde_json::from_value(serde_json::json!({
        "id": "p-9",
        "name": "Court",
        "seoName": "court",
        "overview": "Classic",
        "description": "Leather tennis shoe",
        "category": { "id": "C", "name": "Sneakers" },
        "images": [
            { "imageUrl": "second.png", "order": 2 },
            { "imageUrl": "first.png", "order": 1 }
        ],
        "brand": "Adidas",
        "material": "Leather",
        "price": 90
    }))
    .unwrap();

    let mut form = ProductForm::from_product(product, &categories);

    assert_eq!(form.gallery(), ["first.png", "second.png"]);
    let selected = &form.picker().selected()[0];
    assert_eq!(selected.breadcrumbs, vec!["Home", "Shoes", "Sneakers"]);
    assert!(form.validate().is_ok());
}

#[tokio::test]
async fn load_fetches_product_for_editing() {
    let categories = categories();
    let product: Product = serde_json::from_value(serde_json::json!({
        "id": "p-3",
        "name": "Runner",
        "category": { "id": "B", "name": "Shoes" }
    }))
    .unwrap();
    let backend = RecordingCatalog::holding(product);

    let form = ProductForm::load("p-3", &categories, &backend).await.unwrap();

    assert_eq!(backend.request_count(), 1);
    assert_eq!(form.draft().name, "Runner");
    assert_eq!(form.picker().selected()[0].breadcrumbs, vec!["Home", "Shoes"]);
}

#[tokio::test]
async fn load_of_missing_product_fails() {
    let backend = RecordingCatalog::default();
    let err = ProductForm::load("gone", &categories(), &backend).await.unwrap_err();
    assert!(matches!(err, AdminError::NotFound));
}

#[test]
fn variant_options_split_colours_and_sizes() {
    let attributes: Vec<Attribute> = serde_json::from_value(serde_json::json!([
        { "code": "Colour", "name": "Colour", "variants": [
            { "_id": "c1", "name": "Red", "public": true },
            { "_id": "c2", "name": "Blue" }
        ] },
        { "code": "size", "name": "Size", "variants": [{ "_id": "s1", "name": "42" }] },
        { "code": "fabric", "name": "Fabric", "variants": [{ "_id": "f1", "name": "Wool" }] }
    ]))
    .unwrap();

    let options = VariantOptions::from_attributes(&attributes);

    let option = |id: &str, name: &str| AttributeOption {
        id: id.to_string(),
        name: name.to_string(),
    };
    assert_eq!(options.colours, vec![option("c1", "Red"), option("c2", "Blue")]);
    assert_eq!(options.sizes, vec![option("s1", "42")]);
}

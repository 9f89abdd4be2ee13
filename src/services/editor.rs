//! Admin product editor.
//!
//! One editor value covers one form session:
//! `Idle -> Editing -> Submitting -> Idle` on success, or back to `Editing`
//! with the form untouched when any step fails.

use chrono::Utc;

use crate::domain::product::{NewProduct, Product, ProductChanges, UpdateProduct, VariationChange};
use crate::forms::products::{ProductForm, ValidProduct};
use crate::repository::{ProductReader, ProductWriter, VariationWriter};
use crate::services::products::{self, UpdateOutcome};
use crate::services::{ServiceError, ServiceResult};
use crate::storage::{ImageStorage, PendingImage, generate_image_path};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditorMode {
    Create,
    /// Editing the boxed product as it was loaded.
    Edit(Box<Product>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorState {
    Idle,
    Editing,
    Submitting,
}

/// What a successful save wrote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    Created(Product),
    Updated(UpdateOutcome),
}

impl SaveOutcome {
    pub fn product(&self) -> &Product {
        match self {
            SaveOutcome::Created(product) => product,
            SaveOutcome::Updated(outcome) => &outcome.product,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ProductEditor {
    mode: EditorMode,
    state: EditorState,
    form: ProductForm,
    pending_images: Vec<PendingImage>,
    last_error: Option<String>,
}

impl Default for ProductEditor {
    fn default() -> Self {
        Self {
            mode: EditorMode::Create,
            state: EditorState::Idle,
            form: ProductForm::default(),
            pending_images: Vec::new(),
            last_error: None,
        }
    }
}

impl ProductEditor {
    /// Empty template with one blank variation row.
    pub fn open_create() -> Self {
        Self {
            state: EditorState::Editing,
            ..Self::default()
        }
    }

    /// Form pre-populated from `product`.
    pub fn open_edit(product: Product) -> Self {
        Self {
            form: ProductForm::from(&product),
            mode: EditorMode::Edit(Box::new(product)),
            state: EditorState::Editing,
            pending_images: Vec::new(),
            last_error: None,
        }
    }

    pub fn mode(&self) -> &EditorMode {
        &self.mode
    }

    pub fn state(&self) -> EditorState {
        self.state
    }

    pub fn is_editing(&self) -> bool {
        matches!(self.mode, EditorMode::Edit(_))
    }

    pub fn form(&self) -> &ProductForm {
        &self.form
    }

    pub fn form_mut(&mut self) -> &mut ProductForm {
        &mut self.form
    }

    /// Replace the form with the values the admin submitted.
    pub fn set_form(&mut self, form: ProductForm) {
        self.form = form;
    }

    pub fn attach_image(&mut self, image: PendingImage) {
        self.pending_images.push(image);
    }

    pub fn pending_images(&self) -> &[PendingImage] {
        &self.pending_images
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Pending files that already reached storage. A re-shown form posts
    /// them apart from the kept images so the next attempt still treats them
    /// as new uploads.
    pub fn uploaded_images(&self) -> Vec<String> {
        self.pending_images
            .iter()
            .filter_map(|image| image.uploaded_url.clone())
            .collect()
    }

    /// Discard the form session.
    pub fn close(&mut self) {
        *self = Self::default();
    }

    /// Validate, upload pending images, then create or update the product.
    /// On failure the editor goes back to `Editing` with the form preserved.
    pub fn submit<R, S>(&mut self, repo: &R, storage: &S) -> ServiceResult<SaveOutcome>
    where
        R: ProductReader + ProductWriter + VariationWriter + ?Sized,
        S: ImageStorage + ?Sized,
    {
        match self.state {
            EditorState::Editing => {}
            EditorState::Submitting => {
                return Err(ServiceError::Conflict(
                    "This product is already being saved".to_string(),
                ));
            }
            EditorState::Idle => {
                return Err(ServiceError::Internal(
                    "product editor is not open".to_string(),
                ));
            }
        }

        self.state = EditorState::Submitting;
        self.last_error = None;

        match self.save(repo, storage) {
            Ok(outcome) => {
                self.close();
                Ok(outcome)
            }
            Err(err) => {
                self.state = EditorState::Editing;
                self.last_error = Some(err.to_string());
                Err(err)
            }
        }
    }

    fn save<R, S>(&mut self, repo: &R, storage: &S) -> ServiceResult<SaveOutcome>
    where
        R: ProductReader + ProductWriter + VariationWriter + ?Sized,
        S: ImageStorage + ?Sized,
    {
        let valid = self
            .form
            .validate(self.pending_images.len())
            .map_err(|err| ServiceError::Form(err.to_string()))?;

        self.upload_pending(storage)?;
        let images = self.final_images()?;

        match &self.mode {
            EditorMode::Create => {
                let new_product =
                    NewProduct::new(valid.name.clone(), valid.description.clone(), valid.category, images)
                        .featured(valid.featured);
                let new_variations: Vec<_> = valid
                    .variations
                    .iter()
                    .map(|variation| variation.to_new_variation())
                    .collect();

                products::create_product(repo, &new_product, &new_variations)
                    .map(SaveOutcome::Created)
            }
            EditorMode::Edit(product) => {
                let changes = build_changes(&valid, images);
                products::update_product(repo, &product.id, &changes).map(SaveOutcome::Updated)
            }
        }
    }

    /// Upload every pending file that has no URL yet. Files uploaded by an
    /// earlier attempt are left alone.
    fn upload_pending<S>(&mut self, storage: &S) -> ServiceResult<()>
    where
        S: ImageStorage + ?Sized,
    {
        for image in self.pending_images.iter_mut().filter(|image| !image.is_uploaded()) {
            let path = generate_image_path(&image.file_name, Utc::now().timestamp_millis());
            storage.upload(&path, &image.bytes).map_err(|err| {
                log::error!("Failed to upload image {}: {err}", image.file_name);
                ServiceError::Storage(err)
            })?;
            image.uploaded_url = Some(storage.public_url(&path));
        }
        Ok(())
    }

    /// Newly uploaded URLs win; otherwise the kept images are used.
    fn final_images(&self) -> ServiceResult<Vec<String>> {
        let uploaded: Vec<String> = self
            .pending_images
            .iter()
            .filter_map(|image| image.uploaded_url.clone())
            .collect();

        let images = if uploaded.is_empty() {
            self.form.images.clone()
        } else {
            uploaded
        };

        if images.is_empty() {
            return Err(ServiceError::Form(
                "At least one image is required".to_string(),
            ));
        }
        Ok(images)
    }
}

fn build_changes(valid: &ValidProduct, images: Vec<String>) -> ProductChanges {
    let now = Utc::now().naive_utc();
    ProductChanges {
        product: UpdateProduct {
            name: valid.name.clone(),
            description: valid.description.clone(),
            images,
            category: valid.category,
            featured: valid.featured,
            updated_at: now,
        },
        variations: valid
            .variations
            .iter()
            .map(|variation| VariationChange {
                id: variation.id,
                update: variation.to_update_variation(now),
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::category::Category;
    use crate::domain::variation::Variation;
    use crate::forms::products::VariationRow;
    use crate::repository::errors::RepositoryError;
    use crate::repository::mock::FakeRepo;
    use crate::storage::StorageError;
    use crate::storage::mock::MockImageStorage;
    use chrono::NaiveDateTime;

    fn filled_form(images: Vec<String>) -> ProductForm {
        ProductForm {
            name: "Elegant Gold".to_string(),
            description: "Gold plated".to_string(),
            category: "elegant".to_string(),
            featured: false,
            images,
            variations: vec![VariationRow {
                id: None,
                color: "Gold".to_string(),
                size: "2.4".to_string(),
                price: "250".to_string(),
                stock: "3".to_string(),
                active: true,
            }],
        }
    }

    fn stored_product() -> Product {
        Product {
            id: "elegant-gold-1".to_string(),
            name: "Elegant Gold".to_string(),
            description: "Gold plated".to_string(),
            images: vec!["/uploads/products/old.jpg".to_string()],
            category: Category::Elegant,
            featured: false,
            variations: vec![Variation {
                id: 7,
                product_id: "elegant-gold-1".to_string(),
                color: "Gold".to_string(),
                size: "2.4".to_string(),
                price_cents: 25000,
                stock: 3,
                active: true,
            }],
            created_at: NaiveDateTime::default(),
            updated_at: NaiveDateTime::default(),
        }
    }

    fn storage_accepting_uploads(expected_uploads: usize) -> MockImageStorage {
        let mut storage = MockImageStorage::new();
        storage
            .expect_upload()
            .times(expected_uploads)
            .returning(|_, _| Ok(()));
        storage
            .expect_public_url()
            .returning(|path| format!("/uploads/{path}"));
        storage
    }

    #[test]
    fn open_create_starts_editing_with_blank_row() {
        let editor = ProductEditor::open_create();
        assert_eq!(editor.state(), EditorState::Editing);
        assert_eq!(editor.form().variations.len(), 1);
        assert!(!editor.is_editing());
    }

    #[test]
    fn open_edit_prepopulates_form() {
        let editor = ProductEditor::open_edit(stored_product());
        assert!(editor.is_editing());
        assert_eq!(editor.form().name, "Elegant Gold");
        assert_eq!(editor.form().variations[0].id, Some(7));
        assert_eq!(editor.form().variations[0].price, "250.00");
    }

    #[test]
    fn submit_requires_open_editor() {
        let repo = FakeRepo::new();
        let storage = MockImageStorage::new();
        let mut editor = ProductEditor::default();

        let result = editor.submit(&repo, &storage);

        assert!(matches!(result, Err(ServiceError::Internal(_))));
    }

    #[test]
    fn validation_failure_keeps_form_open() {
        let repo = FakeRepo::new();
        let storage = MockImageStorage::new();
        let mut editor = ProductEditor::open_create();
        let mut form = filled_form(vec![]);
        form.name = String::new();
        editor.set_form(form.clone());

        let result = editor.submit(&repo, &storage);

        assert!(matches!(result, Err(ServiceError::Form(ref msg)) if msg == "Product name is required"));
        assert_eq!(editor.state(), EditorState::Editing);
        assert_eq!(editor.form(), &form);
        assert_eq!(editor.last_error(), Some("Product name is required"));
    }

    #[test]
    fn create_uploads_images_and_closes() {
        let mut repo = FakeRepo::new();
        let storage = storage_accepting_uploads(1);

        repo.product_writer
            .expect_create_product()
            .times(1)
            .withf(|new| {
                assert!(new.id.starts_with("elegant-elegant-gold-"));
                assert_eq!(new.images.len(), 1);
                assert!(new.images[0].starts_with("/uploads/products/"));
                true
            })
            .returning(|new| {
                let mut product = stored_product();
                product.id = new.id.clone();
                product.variations.clear();
                Ok(product)
            });
        repo.variation_writer
            .expect_create_variations()
            .times(1)
            .returning(|_, _| Ok(stored_product().variations));

        let mut editor = ProductEditor::open_create();
        editor.set_form(filled_form(vec![]));
        editor.attach_image(PendingImage::new("gold.png", vec![1, 2, 3]));

        let outcome = editor.submit(&repo, &storage).expect("expected success");

        assert!(matches!(outcome, SaveOutcome::Created(_)));
        assert_eq!(editor.state(), EditorState::Idle);
        assert!(editor.pending_images().is_empty());
    }

    #[test]
    fn retry_does_not_upload_twice() {
        let mut repo = FakeRepo::new();
        let storage = storage_accepting_uploads(1);

        let mut attempts = 0;
        repo.product_writer
            .expect_create_product()
            .times(2)
            .returning(move |new| {
                attempts += 1;
                if attempts == 1 {
                    Err(RepositoryError::ConstraintViolation("UNIQUE".into()))
                } else {
                    let mut product = stored_product();
                    product.id = new.id.clone();
                    product.variations.clear();
                    Ok(product)
                }
            });
        repo.variation_writer
            .expect_create_variations()
            .times(1)
            .returning(|_, _| Ok(stored_product().variations));

        let mut editor = ProductEditor::open_create();
        editor.set_form(filled_form(vec![]));
        editor.attach_image(PendingImage::new("gold.png", vec![1]));

        assert!(editor.submit(&repo, &storage).is_err());
        assert_eq!(editor.state(), EditorState::Editing);
        assert_eq!(editor.uploaded_images().len(), 1);
        assert!(editor.form().images.is_empty());

        editor.submit(&repo, &storage).expect("second attempt succeeds");
    }

    #[test]
    fn edit_resubmitted_after_failure_stores_only_new_images() {
        let mut failing = FakeRepo::new();
        failing
            .product_reader
            .expect_get_product_by_id()
            .returning(|_| Ok(Some(stored_product())));
        failing
            .product_writer
            .expect_update_product()
            .times(1)
            .returning(|_, _| Err(RepositoryError::ConstraintViolation("UNIQUE".into())));

        let mut first = ProductEditor::open_edit(stored_product());
        first.attach_image(PendingImage::new("new.png", vec![1, 2]));
        assert!(first.submit(&failing, &storage_accepting_uploads(1)).is_err());

        let uploaded = first.uploaded_images();
        assert_eq!(uploaded.len(), 1);
        assert_eq!(
            first.form().images,
            vec!["/uploads/products/old.jpg".to_string()]
        );

        // The re-shown form posts the kept images and the uploaded ones apart.
        let mut repo = FakeRepo::new();
        repo.product_reader
            .expect_get_product_by_id()
            .returning(|_| Ok(Some(stored_product())));
        let expected = uploaded.clone();
        repo.product_writer
            .expect_update_product()
            .times(1)
            .withf(move |_, updates| updates.images == expected)
            .returning(|_, _| Ok(stored_product()));
        repo.variation_writer
            .expect_update_variation()
            .times(1)
            .returning(|_, _| Ok(stored_product().variations[0].clone()));

        let mut retry = ProductEditor::open_edit(stored_product());
        retry.set_form(first.form().clone());
        for url in uploaded {
            retry.attach_image(PendingImage::already_uploaded(url));
        }

        retry
            .submit(&repo, &MockImageStorage::new())
            .expect("retry succeeds without uploading again");
    }

    #[test]
    fn upload_failure_surfaces_storage_error() {
        let repo = FakeRepo::new();
        let mut storage = MockImageStorage::new();
        storage
            .expect_upload()
            .times(1)
            .returning(|path, _| Err(StorageError::InvalidPath(path.to_string())));

        let mut editor = ProductEditor::open_create();
        editor.set_form(filled_form(vec![]));
        editor.attach_image(PendingImage::new("gold.png", vec![1]));

        let result = editor.submit(&repo, &storage);

        assert!(matches!(result, Err(ServiceError::Storage(_))));
        assert_eq!(editor.state(), EditorState::Editing);
    }

    #[test]
    fn edit_without_new_images_keeps_existing_ones() {
        let mut repo = FakeRepo::new();
        let storage = MockImageStorage::new();

        repo.product_reader
            .expect_get_product_by_id()
            .returning(|_| Ok(Some(stored_product())));
        repo.product_writer
            .expect_update_product()
            .times(1)
            .withf(|id, updates| {
                assert_eq!(id, "elegant-gold-1");
                assert_eq!(updates.images, vec!["/uploads/products/old.jpg".to_string()]);
                assert_eq!(updates.name, "Elegant Gold Deluxe");
                true
            })
            .returning(|_, _| Ok(stored_product()));
        repo.variation_writer
            .expect_update_variation()
            .times(1)
            .returning(|_, _| Ok(stored_product().variations[0].clone()));

        let mut editor = ProductEditor::open_edit(stored_product());
        editor.form_mut().name = "Elegant Gold Deluxe".to_string();
        editor.form_mut().add_variation_row();
        let row = editor.form_mut().variations.last_mut().expect("row added");
        row.color = "Rose".to_string();
        row.size = "2.6".to_string();
        row.price = "260".to_string();

        let outcome = editor.submit(&repo, &storage).expect("expected success");

        match outcome {
            SaveOutcome::Updated(update) => assert_eq!(update.skipped_variations, 1),
            other => panic!("expected update, got {other:?}"),
        }
    }
}

use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard};

use super::domain::{
    ApplicationId, ApplicationRecord, NewApplication, NewProduct, Product, ProductId,
};
use super::repository::{RecordStore, RepositoryError};

/// Process-local record store. Every operation runs under one lock, so the uniqueness checks
/// and the inserts they guard are atomic with respect to each other.
#[derive(Debug, Default)]
pub struct InMemoryRecordStore {
    tables: Mutex<Tables>,
}

#[derive(Debug, Default)]
struct Tables {
    next_product_id: u64,
    next_application_id: u64,
    products: BTreeMap<ProductId, Product>,
    applications: BTreeMap<ApplicationId, ApplicationRecord>,
    id_number_index: HashMap<String, ApplicationId>,
}

impl InMemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn tables(&self) -> Result<MutexGuard<'_, Tables>, RepositoryError> {
        self.tables
            .lock()
            .map_err(|_| RepositoryError::Unavailable("record store lock poisoned".to_string()))
    }
}

impl RecordStore for InMemoryRecordStore {
    fn insert_product(&self, product: NewProduct) -> Result<Product, RepositoryError> {
        let mut tables = self.tables()?;
        if tables
            .products
            .values()
            .any(|existing| existing.model == product.model)
        {
            return Err(RepositoryError::Conflict("model"));
        }

        tables.next_product_id += 1;
        let id = ProductId(tables.next_product_id);
        let product = product.into_product(id);
        tables.products.insert(id, product.clone());
        Ok(product)
    }

    fn product(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        Ok(self.tables()?.products.get(&id).cloned())
    }

    fn products(&self) -> Result<Vec<Product>, RepositoryError> {
        Ok(self.tables()?.products.values().cloned().collect())
    }

    fn remove_product(&self, id: ProductId) -> Result<(), RepositoryError> {
        let mut tables = self.tables()?;
        if !tables.products.contains_key(&id) {
            return Err(RepositoryError::NotFound);
        }

        let references = tables
            .applications
            .values()
            .filter(|record| record.product_id == id)
            .count();
        if references > 0 {
            return Err(RepositoryError::Protected { references });
        }

        tables.products.remove(&id);
        Ok(())
    }

    fn insert_application(
        &self,
        application: NewApplication,
    ) -> Result<ApplicationRecord, RepositoryError> {
        let mut tables = self.tables()?;
        if !tables.products.contains_key(&application.product_id) {
            return Err(RepositoryError::NotFound);
        }
        if tables.id_number_index.contains_key(&application.id_number) {
            return Err(RepositoryError::Conflict("id_number"));
        }

        tables.next_application_id += 1;
        let id = ApplicationId(tables.next_application_id);
        let record = application.into_record(id);
        tables.id_number_index.insert(record.id_number.clone(), id);
        tables.applications.insert(id, record.clone());
        Ok(record)
    }

    fn application(&self, id: ApplicationId) -> Result<Option<ApplicationRecord>, RepositoryError> {
        Ok(self.tables()?.applications.get(&id).cloned())
    }

    fn id_number_exists(&self, id_number: &str) -> Result<bool, RepositoryError> {
        Ok(self.tables()?.id_number_index.contains_key(id_number))
    }

    fn remove_application(&self, id: ApplicationId) -> Result<(), RepositoryError> {
        let mut tables = self.tables()?;
        let record = tables
            .applications
            .remove(&id)
            .ok_or(RepositoryError::NotFound)?;
        tables.id_number_index.remove(&record.id_number);
        Ok(())
    }
}

use std::{io::ErrorKind, path::PathBuf};

use async_trait::async_trait;
use tracing::debug;

use crate::domain::customer::{Customer, CustomerForm, CustomerId, CustomerRepository};
use crate::domain::{DataAccessError, Entity};
use crate::infrastructure::csv;

/// CSVファイルに顧客を保存するリポジトリ
///
/// 操作のたびにファイル全体を読み直し、更新時はファイル全体を書き直す。
#[derive(Clone, Debug)]
pub struct CsvFileCustomerRepository {
    path: PathBuf,
}

impl CsvFileCustomerRepository {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    async fn read(&self) -> Result<Vec<Customer>, DataAccessError> {
        let text = match tokio::fs::read_to_string(&self.path).await {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(DataAccessError::ReadError(Box::new(e))),
        };
        csv::parse_customers(&text).map_err(|e| DataAccessError::ReadError(Box::new(e)))
    }

    async fn write(&self, customers: &[Customer]) -> Result<(), DataAccessError> {
        if let Some(dir) = self.path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(dir)
                .await
                .map_err(|e| DataAccessError::WriteError(Box::new(e)))?;
        }
        tokio::fs::write(&self.path, csv::write(customers))
            .await
            .map_err(|e| DataAccessError::WriteError(Box::new(e)))?;
        debug!("{}件の顧客を保存: {}", customers.len(), self.path.display());
        Ok(())
    }
}

#[async_trait]
impl CustomerRepository for CsvFileCustomerRepository {
    async fn find_all(&self) -> Result<Vec<Customer>, DataAccessError> {
        self.read().await
    }

    async fn find_by_id(&self, id: CustomerId) -> Result<Option<Customer>, DataAccessError> {
        Ok(self.read().await?.into_iter().find(|c| c.id() == id))
    }

    async fn create(&mut self, form: CustomerForm) -> Result<Customer, DataAccessError> {
        let mut customers = self.read().await?;
        // 末尾の行のIDに1を足して採番する
        let id = match customers.last() {
            Some(last) => last
                .id()
                .checked_add(1)
                .map(CustomerId::from)
                .ok_or_else(|| DataAccessError::WriteError("customer id overflow".into()))?,
            None => CustomerId::from(1),
        };
        let customer = Customer::create(id, form)
            .map_err(|e| DataAccessError::ClientSideError(Box::new(e)))?;
        customers.push(customer.clone());
        self.write(&customers).await?;
        Ok(customer)
    }

    async fn update(
        &mut self,
        id: CustomerId,
        form: CustomerForm,
    ) -> Result<bool, DataAccessError> {
        let mut customers = self.read().await?;
        match customers.iter_mut().find(|c| c.id() == id) {
            Some(customer) => customer
                .change(form)
                .map_err(|e| DataAccessError::ClientSideError(Box::new(e)))?,
            None => return Ok(false),
        }
        self.write(&customers).await?;
        Ok(true)
    }

    async fn delete(&mut self, id: CustomerId) -> Result<bool, DataAccessError> {
        let mut customers = self.read().await?;
        let len = customers.len();
        customers.retain(|c| c.id() != id);
        if customers.len() == len {
            return Ok(false);
        }
        self.write(&customers).await?;
        Ok(true)
    }
}

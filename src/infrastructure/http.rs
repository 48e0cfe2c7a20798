use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use tracing::debug;

use crate::domain::customer::{Customer, CustomerForm, CustomerId, CustomerRepository};
use crate::domain::DataAccessError;
use crate::infrastructure::csv;

pub const API_PATH: &str = "/api/customers";

impl From<reqwest::Error> for DataAccessError {
    fn from(value: reqwest::Error) -> Self {
        if value.is_connect() || value.is_timeout() {
            Self::ConnectionError(Box::new(value))
        } else if value.is_body() || value.is_decode() {
            Self::ReadError(Box::new(value))
        } else if value.is_builder() || value.is_request() {
            Self::ClientSideError(Box::new(value))
        } else {
            Self::QueryError(Box::new(value))
        }
    }
}

/// 想定外のステータスコード
#[derive(Debug, thiserror::Error)]
#[error("Unexpected response status {status}: {body}")]
pub struct UnexpectedStatus {
    pub status: StatusCode,
    pub body: String,
}

/// `/api/customers` を介して顧客を操作するリポジトリ
#[derive(Clone, Debug)]
pub struct HttpCustomerRepository {
    client: Client,
    endpoint: String,
}

impl HttpCustomerRepository {
    pub fn new(base_url: &str) -> Self {
        Self::with_client(Client::new(), base_url)
    }

    pub fn with_client(client: Client, base_url: &str) -> Self {
        Self {
            client,
            endpoint: format!("{}{}", base_url.trim_end_matches('/'), API_PATH),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn member(&self, id: CustomerId) -> String {
        format!("{}/{}", self.endpoint, id)
    }

    async fn customers(response: Response) -> Result<Vec<Customer>, DataAccessError> {
        let text = Self::success(response).await?.text().await?;
        csv::parse_customers(&text).map_err(|e| DataAccessError::ReadError(Box::new(e)))
    }

    async fn success(response: Response) -> Result<Response, DataAccessError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(DataAccessError::QueryError(Box::new(UnexpectedStatus {
            status,
            body,
        })))
    }
}

#[async_trait]
impl CustomerRepository for HttpCustomerRepository {
    async fn find_all(&self) -> Result<Vec<Customer>, DataAccessError> {
        debug!("GET {}", self.endpoint);
        let response = self.client.get(&self.endpoint).send().await?;
        Self::customers(response).await
    }

    async fn find_by_id(&self, id: CustomerId) -> Result<Option<Customer>, DataAccessError> {
        let url = self.member(id);
        debug!("GET {}", url);
        let response = self.client.get(&url).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        Ok(Self::customers(response).await?.into_iter().next())
    }

    async fn create(&mut self, form: CustomerForm) -> Result<Customer, DataAccessError> {
        debug!("POST {}", self.endpoint);
        let response = self.client.post(&self.endpoint).form(&form).send().await?;
        Self::customers(response)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| DataAccessError::ReadError("empty response to create".into()))
    }

    async fn update(
        &mut self,
        id: CustomerId,
        form: CustomerForm,
    ) -> Result<bool, DataAccessError> {
        let url = self.member(id);
        debug!("PUT {}", url);
        let response = self.client.put(&url).form(&form).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(false);
        }
        Self::success(response).await?;
        Ok(true)
    }

    async fn delete(&mut self, id: CustomerId) -> Result<bool, DataAccessError> {
        let url = self.member(id);
        debug!("DELETE {}", url);
        let response = self.client.delete(&url).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(false);
        }
        Self::success(response).await?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint() {
        let repo = HttpCustomerRepository::new("http://localhost:8080/");
        assert_eq!(repo.endpoint(), "http://localhost:8080/api/customers");
        assert_eq!(
            repo.member(CustomerId::from(5)),
            "http://localhost:8080/api/customers/5"
        );
    }

    #[tokio::test]
    async fn test_connection_error() {
        // 接続先が存在しない
        let repo = HttpCustomerRepository::new("http://127.0.0.1:9");
        assert!(matches!(
            repo.find_all().await,
            Err(DataAccessError::ConnectionError(_))
        ));
    }
}

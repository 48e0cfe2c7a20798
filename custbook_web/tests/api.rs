use std::net::TcpListener;

use custbook::domain::customer::{CustomerForm, CustomerId, CustomerRepository};
use custbook::domain::Entity;
use custbook::infrastructure::{CsvFileCustomerRepository, HttpCustomerRepository};
use reqwest::{Method, StatusCode};
use tempfile::TempDir;

const SEED: &str = "id,name,surname,email,phone\n\
                    1,Ada,Lovelace,ada@example.com,555-0100\n\
                    2,Alan,Turing,alan@example.com,555-0101\n\
                    3,Grace,Hopper,grace@example.com,555-0102\n";

struct TestServer {
    url: String,
    dir: TempDir,
}

impl TestServer {
    async fn start(seed: Option<&str>) -> Self {
        let dir = TempDir::new().unwrap();
        let data_file = dir.path().join("customers.csv");
        if let Some(seed) = seed {
            std::fs::write(&data_file, seed).unwrap();
        }
        let static_dir = dir.path().join("static");
        std::fs::create_dir_all(&static_dir).unwrap();
        std::fs::write(static_dir.join("index.html"), "<h1>Customers</h1>").unwrap();

        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        listener.set_nonblocking(true).unwrap();
        let url = format!("http://{}", listener.local_addr().unwrap());
        let app = custbook_web::app(CsvFileCustomerRepository::new(data_file), Some(static_dir));
        tokio::spawn(async move {
            axum::Server::from_tcp(listener)
                .unwrap()
                .serve(app.into_make_service())
                .await
                .unwrap();
        });
        Self { url, dir }
    }

    fn repository(&self) -> HttpCustomerRepository {
        HttpCustomerRepository::new(&self.url)
    }

    fn api(&self, path: &str) -> String {
        format!("{}/api{}", self.url, path)
    }

    fn stored(&self) -> String {
        std::fs::read_to_string(self.dir.path().join("customers.csv")).unwrap()
    }
}

#[tokio::test]
async fn test_list_rows_in_field_order() {
    let server = TestServer::start(Some(SEED)).await;

    let response = reqwest::get(server.api("/customers")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["content-type"], "text/csv");
    assert_eq!(response.text().await.unwrap(), SEED);

    let customers = server.repository().find_all().await.unwrap();
    assert_eq!(customers.len(), 3);
    let ids: Vec<_> = customers.iter().map(|c| *c.id()).collect();
    assert_eq!(ids, vec![1, 2, 3]);
    assert_eq!(customers[2].name(), "Grace");
    assert_eq!(customers[2].surname(), "Hopper");
    assert_eq!(customers[2].email(), "grace@example.com");
    assert_eq!(customers[2].phone(), "555-0102");
}

#[tokio::test]
async fn test_empty_list() {
    let server = TestServer::start(None).await;
    let text = reqwest::get(server.api("/customers"))
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert_eq!(text, "id,name,surname,email,phone\n");
    assert!(server.repository().find_all().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_create_then_list() {
    let server = TestServer::start(Some(SEED)).await;
    let mut repo = server.repository();

    let form = CustomerForm::new("Edsger", "Dijkstra", "ewd@example.com", "555-0103");
    let created = repo.create(form.clone()).await.unwrap();
    assert_eq!(created.id(), CustomerId::from(4));
    assert_eq!(created.form(), form);

    let customers = repo.find_all().await.unwrap();
    assert_eq!(customers.len(), 4);
    assert_eq!(customers.last(), Some(&created));
    assert!(server
        .stored()
        .ends_with("4,Edsger,Dijkstra,ewd@example.com,555-0103\n"));
}

#[tokio::test]
async fn test_create_response() {
    let server = TestServer::start(None).await;
    let response = reqwest::Client::new()
        .post(server.api("/customers"))
        .form(&[("name", "Ada"), ("email", "ada@example.com")])
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(
        response.text().await.unwrap(),
        "id,name,surname,email,phone\n1,Ada,,ada@example.com,\n"
    );
}

#[tokio::test]
async fn test_update_then_list() {
    let server = TestServer::start(Some(SEED)).await;
    let mut repo = server.repository();
    let id = CustomerId::from(2);

    let form = CustomerForm::new("Alan", "Turing", "turing@example.org", "555-0199");
    assert!(repo.update(id, form.clone()).await.unwrap());

    let customers = repo.find_all().await.unwrap();
    assert_eq!(customers.len(), 3);
    assert_eq!(customers[1].id(), id);
    assert_eq!(customers[1].form(), form);
    assert_eq!(repo.find_by_id(id).await.unwrap().unwrap().form(), form);

    let response = reqwest::Client::new()
        .put(server.api("/customers/2"))
        .form(&form)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.text().await.unwrap(), "updated");
}

#[tokio::test]
async fn test_delete_then_list() {
    let server = TestServer::start(Some(SEED)).await;
    let mut repo = server.repository();
    let id = CustomerId::from(1);

    assert!(repo.delete(id).await.unwrap());
    let customers = repo.find_all().await.unwrap();
    assert_eq!(customers.len(), 2);
    assert!(customers.iter().all(|c| c.id() != id));

    // 既に削除済み
    assert!(!repo.delete(id).await.unwrap());
    let response = reqwest::Client::new()
        .delete(server.api("/customers/2"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn test_missing_customer() {
    let server = TestServer::start(Some(SEED)).await;
    let mut repo = server.repository();
    let id = CustomerId::from(42);

    assert_eq!(repo.find_by_id(id).await.unwrap(), None);
    assert!(!repo.update(id, CustomerForm::default()).await.unwrap());
    assert!(!repo.delete(id).await.unwrap());

    let response = reqwest::get(server.api("/customers/42")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(response.text().await.unwrap(), "no such customer");
    assert_eq!(server.stored(), SEED);
}

#[tokio::test]
async fn test_edit_form_population_roundtrip() {
    let server = TestServer::start(Some(SEED)).await;
    let mut repo = server.repository();

    let row = repo.find_all().await.unwrap().remove(2);
    assert!(repo.update(row.id(), row.form()).await.unwrap());

    assert_eq!(repo.find_by_id(row.id()).await.unwrap(), Some(row));
    assert_eq!(server.stored(), SEED);
}

#[tokio::test]
async fn test_invalid_field_is_rejected() {
    let server = TestServer::start(Some(SEED)).await;
    let response = reqwest::Client::new()
        .post(server.api("/customers"))
        .form(&[("name", "Lovelace, Ada")])
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(server.stored(), SEED);

    let response = reqwest::get(server.api("/customers/abc")).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_bad_verb_and_endpoint() {
    let server = TestServer::start(Some(SEED)).await;
    let client = reqwest::Client::new();

    let response = client
        .request(Method::PATCH, server.api("/customers/1"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(response.text().await.unwrap(), "bad verb");

    let response = client.delete(server.api("/customers")).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);

    let response = client.get(server.api("/orders")).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(response.text().await.unwrap(), "Bad endpoint");
}

#[tokio::test]
async fn test_cors() {
    let server = TestServer::start(Some(SEED)).await;
    let client = reqwest::Client::new();

    let response = client
        .request(Method::OPTIONS, server.api("/customers"))
        .send()
        .await
        .unwrap();
    assert!(response.status().is_success());

    let response = client
        .request(Method::OPTIONS, server.api("/customers/1"))
        .header("Origin", "http://example.com")
        .header("Access-Control-Request-Method", "PUT")
        .send()
        .await
        .unwrap();
    assert!(response.status().is_success());
    assert_eq!(response.headers()["access-control-allow-origin"], "*");
    let methods = response.headers()["access-control-allow-methods"]
        .to_str()
        .unwrap()
        .to_owned();
    assert!(methods.contains("PUT"));
    assert!(methods.contains("DELETE"));

    let response = client
        .get(server.api("/customers"))
        .header("Origin", "http://example.com")
        .send()
        .await
        .unwrap();
    assert_eq!(response.headers()["access-control-allow-origin"], "*");

    // プリフライト以外の応答にも許可メソッドとヘッダを付ける
    let response = client.get(server.api("/customers/1")).send().await.unwrap();
    let headers = response.headers();
    assert_eq!(
        headers["access-control-allow-methods"],
        "GET,POST,PUT,DELETE,OPTIONS"
    );
    assert_eq!(headers["access-control-allow-headers"], "content-type");
}

#[tokio::test]
async fn test_trailing_slash_is_list() {
    let server = TestServer::start(Some(SEED)).await;
    let client = reqwest::Client::new();

    let response = client.get(server.api("/customers/")).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.text().await.unwrap(), SEED);

    let response = client
        .post(server.api("/customers/"))
        .form(&[("name", "Edsger")])
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = client.delete(server.api("/customers/")).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn test_static_files() {
    let server = TestServer::start(None).await;

    let response = reqwest::get(format!("{}/", server.url)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.text().await.unwrap(), "<h1>Customers</h1>");

    let response = reqwest::get(format!("{}/index.html", server.url))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = reqwest::get(format!("{}/app.js", server.url)).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

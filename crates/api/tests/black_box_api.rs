//! Black-box tests: the real router on an ephemeral port, Focus NFe mocked.

use std::sync::Arc;
use std::time::Duration;

use chrono::{TimeZone, Utc};
use reqwest::StatusCode;
use rust_decimal_macros::dec;
use serde_json::json;
use wiremock::matchers::{method, path, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

use fiscoerp_api::app::services::{SeedData, TenantEmitter, build_services};
use fiscoerp_core::{AggregateId, TenantId};
use fiscoerp_focus::FocusConfig;
use fiscoerp_infra::EmissionServiceConfig;
use fiscoerp_parties::{Address, Customer, Emitter, TaxId};
use fiscoerp_sales::{Sale, SaleId, SaleItem};

struct TestServer {
    base_url: String,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn(focus: &MockServer, seed: SeedData) -> Self {
        let services = build_services(
            FocusConfig::local_mock(&focus.uri(), "test-token").unwrap(),
            Arc::new(seed.into_source()),
            EmissionServiceConfig::default().with_status_poll_interval(Duration::from_millis(10)),
        )
        .unwrap();

        // Same router as prod, bound to an ephemeral port.
        let app = fiscoerp_api::app::build_app(Arc::new(services));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { base_url, handle }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn seed(tenant_id: TenantId) -> (SeedData, SaleId) {
    let sale_id = SaleId::new(AggregateId::new());
    let emitter = Emitter {
        legal_name: "Oficina Exemplo LTDA".into(),
        trade_name: None,
        cnpj: TaxId::parse("11222333000181").unwrap(),
        state_registration: "123456789".into(),
        municipal_registration: None,
        address: Address {
            street: Some("Rua das Flores".into()),
            number: Some("100".into()),
            complement: None,
            district: Some("Centro".into()),
            municipality: Some("Campinas".into()),
            state: Some("SP".into()),
            postal_code: Some("13010000".into()),
        },
        phone: None,
    };
    let sale = Sale {
        id: sale_id,
        tenant_id,
        customer: Customer::new("Maria Silva"),
        items: vec![SaleItem {
            product_code: "P1".into(),
            description: "Serviço de reparo".into(),
            ncm: None,
            cfop: None,
            unit: "UN".into(),
            quantity: dec!(2),
            unit_value: dec!(175.00),
            gross_value: None,
        }],
        freight: dec!(0),
        insurance: dec!(0),
        discount: dec!(0),
        total: dec!(350.00),
        notes: None,
        issued_at: Utc.with_ymd_and_hms(2026, 10, 15, 12, 0, 0).unwrap(),
    };

    let data = SeedData {
        emitters: vec![TenantEmitter { tenant_id, emitter }],
        sales: vec![sale],
    };
    (data, sale_id)
}

#[tokio::test]
async fn health_needs_no_tenant() {
    let focus = MockServer::start().await;
    let server = TestServer::spawn(&focus, SeedData::default()).await;

    let res = reqwest::get(format!("{}/health", server.base_url)).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn fiscal_routes_require_tenant_header() {
    let focus = MockServer::start().await;
    let server = TestServer::spawn(&focus, SeedData::default()).await;
    let client = reqwest::Client::new();

    let res = client
        .get(format!("{}/fiscal/nfe", server.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["error"], "missing_tenant");

    let res = client
        .get(format!("{}/fiscal/nfe", server.base_url))
        .header("X-Tenant-Id", "not-a-uuid")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn emit_then_download_danfe() {
    let focus = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v2/nfe"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "status": "autorizado",
            "numero": "123",
            "serie": "1",
            "chave_nfe": "NFe35261011222333000181550010000001231000001230"
        })))
        .expect(1)
        .mount(&focus)
        .await;
    Mock::given(method("GET"))
        .and(path_regex(r"\.pdf$"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"%PDF-1.4".to_vec()))
        .mount(&focus)
        .await;

    let tenant_id = TenantId::new();
    let (data, sale_id) = seed(tenant_id);
    let server = TestServer::spawn(&focus, data).await;
    let client = reqwest::Client::new();

    let res = client
        .post(format!("{}/fiscal/nfe", server.base_url))
        .header("X-Tenant-Id", tenant_id.to_string())
        .json(&json!({ "sale_id": sale_id.to_string() }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let created: serde_json::Value = res.json().await.unwrap();
    assert_eq!(created["status"], "emitida");
    assert_eq!(created["number"], "123");
    let reference = created["reference"].as_str().unwrap().to_string();

    let res = client
        .get(format!("{}/fiscal/nfe/{}/pdf", server.base_url, reference))
        .header("X-Tenant-Id", tenant_id.to_string())
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.headers()["content-type"], "application/pdf");
    assert_eq!(res.bytes().await.unwrap().as_ref(), b"%PDF-1.4");

    // Another tenant cannot see it.
    let res = client
        .get(format!("{}/fiscal/nfe/{}", server.base_url, reference))
        .header("X-Tenant-Id", TenantId::new().to_string())
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn rejection_returns_reference_for_retry() {
    let focus = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v2/nfe"))
        .respond_with(ResponseTemplate::new(422).set_body_json(json!({
            "codigo": "requisicao_invalida",
            "mensagem": "CFOP inválido"
        })))
        .mount(&focus)
        .await;

    let tenant_id = TenantId::new();
    let (data, sale_id) = seed(tenant_id);
    let server = TestServer::spawn(&focus, data).await;
    let client = reqwest::Client::new();

    let res = client
        .post(format!("{}/fiscal/nfe", server.base_url))
        .header("X-Tenant-Id", tenant_id.to_string())
        .json(&json!({ "sale_id": sale_id.to_string() }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["error"], "provider_rejected");
    assert!(body["message"].as_str().unwrap().contains("CFOP inválido"));
    let reference = body["reference"].as_str().unwrap().to_string();

    let res = client
        .get(format!("{}/fiscal/nfe/{}", server.base_url, reference))
        .header("X-Tenant-Id", tenant_id.to_string())
        .send()
        .await
        .unwrap();
    let record: serde_json::Value = res.json().await.unwrap();
    assert_eq!(record["status"], "erro");
    assert_eq!(record["message"], "CFOP inválido");
}

#[tokio::test]
async fn short_justification_is_a_bad_request() {
    let focus = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v2/nfe"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"status": "autorizado"})))
        .mount(&focus)
        .await;
    Mock::given(method("DELETE"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&focus)
        .await;

    let tenant_id = TenantId::new();
    let (data, sale_id) = seed(tenant_id);
    let server = TestServer::spawn(&focus, data).await;
    let client = reqwest::Client::new();

    let created: serde_json::Value = client
        .post(format!("{}/fiscal/nfe", server.base_url))
        .header("X-Tenant-Id", tenant_id.to_string())
        .json(&json!({ "sale_id": sale_id.to_string() }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let reference = created["reference"].as_str().unwrap();

    let res = client
        .post(format!("{}/fiscal/nfe/{}/cancel", server.base_url, reference))
        .header("X-Tenant-Id", tenant_id.to_string())
        .json(&json!({ "justificativa": "curta demais" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["error"], "validation_error");
}

#[tokio::test]
async fn unknown_sale_is_not_found() {
    let focus = MockServer::start().await;
    let tenant_id = TenantId::new();
    let (data, _) = seed(tenant_id);
    let server = TestServer::spawn(&focus, data).await;

    let res = reqwest::Client::new()
        .post(format!("{}/fiscal/nfe", server.base_url))
        .header("X-Tenant-Id", tenant_id.to_string())
        .json(&json!({ "sale_id": AggregateId::new().to_string() }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

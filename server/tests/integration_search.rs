use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use pagedex_core::{build_index, IndexConfig, IndexStore, PageRecord};
use serde_json::Value;
use tempfile::tempdir;
use tower::ServiceExt;

const BOUNDARY: &str = "pagedex-test-boundary";

fn build_tiny_index(dir: &std::path::Path) {
    let corpus = vec![
        PageRecord::new("rust.txt", 1, "Rust is great. rust systems programming."),
        PageRecord::new("rust.txt", 2, "Learning rust takes time."),
        PageRecord::new("cooking.txt", 1, "Bake the bread slowly."),
    ];
    let index = build_index(&corpus, &IndexConfig::default());
    IndexStore::new(dir).save(&index).unwrap();
}

fn open_app(dir: &std::path::Path) -> Router {
    pagedex_server::build_app(&dir.to_string_lossy(), IndexConfig::default()).unwrap()
}

async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
    let resp = app.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let body = resp.into_body().collect().await.unwrap().to_bytes();
    let json = serde_json::from_slice(&body).unwrap_or(Value::Null);
    (status, json)
}

async fn get(app: &Router, uri: &str) -> (StatusCode, Value) {
    send(app, Request::get(uri).body(Body::empty()).unwrap()).await
}

fn upload_request(file_name: &str, content: impl AsRef<[u8]>) -> Request<Body> {
    let mut body = format!(
        "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{file_name}\"\r\n\
         Content-Type: application/octet-stream\r\n\r\n"
    )
    .into_bytes();
    body.extend_from_slice(content.as_ref());
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
    Request::post("/upload")
        .header("content-type", format!("multipart/form-data; boundary={BOUNDARY}"))
        .body(Body::from(body))
        .unwrap()
}

#[tokio::test]
async fn search_returns_ranked_results() {
    let dir = tempdir().unwrap();
    build_tiny_index(dir.path());
    let app = open_app(dir.path());

    let (status, json) = get(&app, "/search?q=rust&k=2").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["query"], "rust");
    assert_eq!(json["total_pages"], 3);
    let arr = json["results"].as_array().unwrap();
    assert_eq!(arr.len(), 2);
    assert_eq!(arr[0]["document_id"], "rust.txt");
    assert_eq!(arr[0]["page_number"], 1);
    assert_eq!(arr[1]["page_number"], 2);
    assert!(arr[0]["score"].as_f64().unwrap() >= arr[1]["score"].as_f64().unwrap());
    assert!(arr[0]["snippet"].as_str().unwrap().contains("Rust"));
}

#[tokio::test]
async fn search_defaults_to_three_results() {
    let dir = tempdir().unwrap();
    build_tiny_index(dir.path());
    let app = open_app(dir.path());
    let (status, json) = get(&app, "/search?q=bread").await;
    assert_eq!(status, StatusCode::OK);
    let arr = json["results"].as_array().unwrap();
    assert_eq!(arr.len(), 3);
    assert_eq!(arr[0]["document_id"], "cooking.txt");
}

#[tokio::test]
async fn empty_index_searches_to_nothing() {
    let dir = tempdir().unwrap();
    let app = open_app(dir.path());
    let (status, json) = get(&app, "/search?q=anything").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["results"], serde_json::json!([]));
}

#[tokio::test]
async fn zero_k_is_rejected() {
    let dir = tempdir().unwrap();
    let app = open_app(dir.path());
    let (status, json) = get(&app, "/search?q=x&k=0").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].is_string());
}

#[tokio::test]
async fn upload_indexes_and_search_finds_it() {
    let dir = tempdir().unwrap();
    let app = open_app(dir.path());

    let (status, json) = send(&app, upload_request("cat.txt", "the cat sat on the mat\x0cno felines here")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["ok"], true);
    assert_eq!(json["pages"], 2);

    let (_, json) = get(&app, "/search?q=cat").await;
    let arr = json["results"].as_array().unwrap();
    assert_eq!(arr.len(), 2);
    assert_eq!(arr[0]["page_number"], 1);
    assert!(arr[0]["score"].as_f64().unwrap() > 0.0);

    let (status, json) = get(&app, "/documents/cat.txt/pages/2").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["text"], "no felines here");

    // persisted: a new app over the same directory serves the same corpus
    let (_, json) = get(&open_app(dir.path()), "/documents").await;
    assert_eq!(json["documents"][0]["document_id"], "cat.txt");
    assert_eq!(json["documents"][0]["pages"], 2);
}

#[tokio::test]
async fn unsupported_upload_is_rejected() {
    let dir = tempdir().unwrap();
    let app = open_app(dir.path());
    let (status, json) = send(&app, upload_request("book.docx", "PK")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].as_str().unwrap().contains("unsupported"));
    let (status, json) = send(&app, upload_request("book.pdf", "%PDF-1.7")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].as_str().unwrap().contains("cannot read"));
    let (_, json) = get(&app, "/documents").await;
    assert_eq!(json["documents"], serde_json::json!([]));
}

/// Single-page PDF with one line of Courier text.
fn one_page_pdf(text: &str) -> Vec<u8> {
    use lopdf::content::{Content, Operation};
    use lopdf::{dictionary, Document, Object, Stream};

    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
    });
    let content = Content {
        operations: vec![
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec!["F1".into(), 12.into()]),
            Operation::new("Td", vec![72.into(), 720.into()]),
            Operation::new("Tj", vec![Object::string_literal(text)]),
            Operation::new("ET", vec![]),
        ],
    };
    let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "Contents" => content_id,
        "Resources" => dictionary! { "Font" => dictionary! { "F1" => font_id } },
    });
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => vec![Object::from(page_id)],
            "Count" => 1,
            "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    let mut out = Vec::new();
    doc.save_to(&mut out).unwrap();
    out
}

#[tokio::test]
async fn pdf_upload_is_indexed() {
    let dir = tempdir().unwrap();
    let app = open_app(dir.path());
    let (status, json) = send(&app, upload_request("paper.pdf", one_page_pdf("sparse vectors everywhere"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["pages"], 1);

    let (_, json) = get(&app, "/search?q=vectors&k=1").await;
    assert_eq!(json["results"][0]["document_id"], "paper.pdf");
    assert!(json["results"][0]["score"].as_f64().unwrap() > 0.0);
}

#[tokio::test]
async fn delete_and_rebuild() {
    let dir = tempdir().unwrap();
    build_tiny_index(dir.path());
    let app = open_app(dir.path());

    let del = Request::delete("/documents/rust.txt").body(Body::empty()).unwrap();
    let (status, json) = send(&app, del).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["removed_pages"], 2);

    let del = Request::delete("/documents/rust.txt").body(Body::empty()).unwrap();
    let (status, _) = send(&app, del).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let rebuild = Request::post("/index/rebuild").body(Body::empty()).unwrap();
    let (status, json) = send(&app, rebuild).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["pages"], 1);
}

#[tokio::test]
async fn missing_page_is_not_found() {
    let dir = tempdir().unwrap();
    build_tiny_index(dir.path());
    let app = open_app(dir.path());
    let (status, _) = get(&app, "/documents/rust.txt/pages/9").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

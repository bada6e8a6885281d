//! Integration tests for the registry lifecycle as the middleware sees it.
//!
//! Tests cover: re-registration replacing a definition and refreshing its
//! validator, stale validators staying in effect until re-registration,
//! eviction happening only when a new form is added, and registries shared
//! across concurrent middleware invocations.

use std::sync::Arc;
use std::time::Duration;

use formflow_forms::{
    AddFormOptions, FieldSchema, FieldSpec, FieldType, FormDefinition, FormRegistry,
    FormStatus, FormsMiddleware, Middleware, ProcessedForm,
};
use formflow_http::HttpRequest;
use http::Method;

fn newsletter_definition(schema: FieldSchema) -> FormDefinition {
    FormDefinition::builder("newsletter")
        .action("/newsletter")
        .fields(schema)
        .build()
}

fn newsletter_request(body: &[u8]) -> HttpRequest {
    HttpRequest::builder()
        .method(Method::POST)
        .path("/newsletter")
        .content_type("application/x-www-form-urlencoded")
        .body(body.to_vec())
        .build()
}

#[tokio::test]
async fn reregistration_refreshes_the_validator() {
    let registry = Arc::new(FormRegistry::new());
    registry
        .add_form(
            "newsletter",
            newsletter_definition(
                FieldSchema::new().field("email", FieldSpec::new(FieldType::Email)),
            ),
            AddFormOptions::default(),
        )
        .unwrap();

    let middleware = FormsMiddleware::new(registry.clone());

    // The first schema accepts any valid address.
    let mut request = newsletter_request(b"email=user%40example.com");
    middleware.process_request(&mut request).await.unwrap();
    assert_eq!(
        request
            .extensions()
            .get::<ProcessedForm>()
            .unwrap()
            .status,
        FormStatus::Success
    );

    // Re-register with a stricter schema; the compiled validator follows.
    registry
        .add_form(
            "newsletter",
            newsletter_definition(
                FieldSchema::new()
                    .field("email", FieldSpec::new(FieldType::Email))
                    .field(
                        "consent",
                        FieldSpec::new(FieldType::Boolean),
                    ),
            ),
            AddFormOptions::default(),
        )
        .unwrap();

    let mut request = newsletter_request(b"email=user%40example.com");
    middleware.process_request(&mut request).await.unwrap();
    let form = request.extensions().get::<ProcessedForm>().unwrap();
    assert_eq!(form.status, FormStatus::Error);
    assert_eq!(form.errors["consent"][0].code, "required");
}

#[tokio::test]
async fn eviction_runs_only_when_a_form_is_added() {
    let registry = Arc::new(FormRegistry::with_timeout(Duration::ZERO));
    registry
        .add_form(
            "first",
            FormDefinition::builder("first").action("/first").build(),
            AddFormOptions::default(),
        )
        .unwrap();

    // Nothing sweeps between registrations, so the expired definition
    // still matches requests.
    assert!(registry
        .get_request_form_definition(&Method::POST, "/first", None)
        .is_some());

    registry
        .add_form(
            "second",
            FormDefinition::builder("second").action("/second").build(),
            AddFormOptions::default(),
        )
        .unwrap();

    // Adding a form swept the expired entry.
    assert!(registry
        .get_request_form_definition(&Method::POST, "/first", None)
        .is_none());
    assert!(registry
        .get_request_form_definition(&Method::POST, "/second", None)
        .is_some());
}

#[tokio::test]
async fn shared_registry_serves_concurrent_submissions() {
    let registry = Arc::new(FormRegistry::new());
    registry
        .add_form(
            "newsletter",
            newsletter_definition(
                FieldSchema::new().field("email", FieldSpec::new(FieldType::Email)),
            ),
            AddFormOptions::default(),
        )
        .unwrap();

    let mut tasks = Vec::new();
    for i in 0..8 {
        let registry = registry.clone();
        tasks.push(tokio::spawn(async move {
            let middleware = FormsMiddleware::new(registry);
            let body = format!("email=user{i}%40example.com");
            let mut request = newsletter_request(body.as_bytes());
            middleware.process_request(&mut request).await.unwrap();
            request
                .extensions()
                .get::<ProcessedForm>()
                .map(|form| form.status)
        }));
    }

    for task in tasks {
        assert_eq!(task.await.unwrap(), Some(FormStatus::Success));
    }
}

#[tokio::test]
async fn random_forms_are_flagged_on_registration() {
    let registry = Arc::new(FormRegistry::new());
    registry
        .add_form(
            "one-shot",
            FormDefinition::builder("one-shot").action("/one-shot").build(),
            AddFormOptions {
                is_random: true,
                ..AddFormOptions::default()
            },
        )
        .unwrap();

    let definition = registry
        .get_request_form_definition(&Method::POST, "/one-shot", None)
        .expect("random form still matches");
    assert!(definition.is_random);
}

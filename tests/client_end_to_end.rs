use std::net::SocketAddr;
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

use axum::{extract::Request, middleware::{self, Next}};
use taskflow::{
    application::record_service::{RecordServiceImpl, ValidationMode},
    client::{
        api::{ClientError, HttpApi, ResourceApi},
        resource_client::ResourceClient,
    },
    domain::{
        feedback::Feedback,
        record::{NewRecord, RecordId},
        todo::{Todo, TodoPatch},
    },
    http::routing,
    infrastructure::sqlite_store::SqliteStore,
};

/// A backend on an ephemeral port, counting the requests it receives.
struct Backend {
    addr: SocketAddr,
    requests: Arc<AtomicUsize>,
}

impl Backend {
    async fn start(mode: ValidationMode) -> Self {
        let store = SqliteStore::connect("sqlite::memory:").await.unwrap();
        store.init().await.unwrap();
        let requests = Arc::new(AtomicUsize::new(0));
        let counter = requests.clone();
        let router = routing::app(RecordServiceImpl::with_mode(store, mode)).layer(middleware::from_fn(move |req: Request, next: Next| {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                next.run(req).await
            }
        }));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, router).await.unwrap() });
        Self { addr, requests }
    }

    fn api(&self) -> HttpApi { HttpApi::new(format!("http://{}/api", self.addr)) }

    fn requests(&self) -> usize { self.requests.load(Ordering::SeqCst) }
}

#[tokio::test]
async fn todo_round_trip_through_the_client() {
    let backend = Backend::start(ValidationMode::Lenient).await;
    let mut client = ResourceClient::<Todo, _>::new(backend.api());
    client.load().await.unwrap();
    assert!(client.state().is_empty());

    client.state_mut().input = "Buy milk".into();
    client.add().await.unwrap();
    let todo = client.state().nth(0).unwrap().clone();
    assert_eq!(todo.text, "Buy milk");
    assert!(!todo.completed);

    client.toggle(&todo.id).await.unwrap();
    assert!(client.state().get(&todo.id).unwrap().completed);

    client.start_edit(&todo.id);
    *client.state_mut().edit_buffer_mut().unwrap() = "Buy oat milk".into();
    client.commit_edit().await.unwrap();

    // A fresh client sees exactly what the first one reconciled to.
    let mut observer = ResourceClient::<Todo, _>::new(backend.api());
    observer.load().await.unwrap();
    let seen: Vec<Todo> = observer.state().records().cloned().collect();
    let local: Vec<Todo> = client.state().records().cloned().collect();
    assert_eq!(seen, local);
    assert_eq!(seen[0].text, "Buy oat milk");
    assert!(seen[0].completed);
    assert_eq!(seen[0].created_at, todo.created_at);

    client.request_delete(&todo.id).unwrap();
    client.confirm_delete().await.unwrap();
    assert!(client.state().is_empty());
    observer.load().await.unwrap();
    assert!(observer.state().is_empty());
}

#[tokio::test]
async fn blank_input_never_reaches_the_backend() {
    let backend = Backend::start(ValidationMode::Lenient).await;
    let mut client = ResourceClient::<Feedback, _>::new(backend.api());
    client.load().await.unwrap();
    let before = backend.requests();

    client.state_mut().input = "".into();
    assert!(matches!(client.add().await, Err(ClientError::Validation)));
    assert_eq!(backend.requests(), before);

    // Bypassing the client, the lenient backend stores empty text.
    let created = ResourceApi::<Feedback>::create(&backend.api(), &NewRecord::new("")).await.unwrap();
    assert_eq!(created.text, "");
}

#[tokio::test]
async fn feedback_newest_first_across_clients() {
    let backend = Backend::start(ValidationMode::Lenient).await;
    let mut client = ResourceClient::<Feedback, _>::new(backend.api());
    client.load().await.unwrap();
    for text in ["first", "second", "third"] {
        client.state_mut().input = text.into();
        client.add().await.unwrap();
    }
    let mut other = ResourceClient::<Feedback, _>::new(backend.api());
    other.load().await.unwrap();
    let texts: Vec<&str> = other.state().records().map(|f| f.text.as_str()).collect();
    assert_eq!(texts, ["third", "second", "first"]);
}

#[tokio::test]
async fn feedback_edit_through_the_client() {
    let backend = Backend::start(ValidationMode::Lenient).await;
    let mut client = ResourceClient::<Feedback, _>::new(backend.api());
    client.load().await.unwrap();
    client.state_mut().input = "a".into();
    client.add().await.unwrap();
    let original = client.state().nth(0).unwrap().clone();

    assert!(client.start_edit(&original.id));
    *client.state_mut().edit_buffer_mut().unwrap() = "b".into();
    client.commit_edit().await.unwrap();
    assert!(client.state().editing().is_none());
    assert_eq!(client.state().last_notice().unwrap().message, "Feedback updated!");

    let edited = client.state().get(&original.id).unwrap().clone();
    assert_eq!(edited.text, "b");
    assert_eq!(edited.created_at, original.created_at);

    let mut observer = ResourceClient::<Feedback, _>::new(backend.api());
    observer.load().await.unwrap();
    let seen: Vec<Feedback> = observer.state().records().cloned().collect();
    assert_eq!(seen, vec![edited]);
}

#[tokio::test]
async fn update_of_unknown_id_depends_on_validation_mode() {
    let lenient = Backend::start(ValidationMode::Lenient).await;
    let answer = ResourceApi::<Todo>::update(&lenient.api(), &RecordId::from("missing"), &TodoPatch { text: None, completed: Some(true) })
        .await
        .unwrap();
    assert!(answer.is_none());

    let strict = Backend::start(ValidationMode::Strict).await;
    let err = ResourceApi::<Todo>::update(&strict.api(), &RecordId::from("missing"), &TodoPatch { text: None, completed: Some(true) })
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::Status(s) if s.as_u16() == 404));

    let err = ResourceApi::<Todo>::create(&strict.api(), &NewRecord::new(" ")).await.unwrap_err();
    assert!(matches!(err, ClientError::Status(s) if s.as_u16() == 400));
}

#[tokio::test]
async fn unreachable_backend_surfaces_load_failure() {
    // Bind and drop to get a port nothing listens on.
    let addr = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap().local_addr().unwrap();
    let mut client = ResourceClient::<Todo, _>::new(HttpApi::new(format!("http://{addr}/api")));
    assert!(matches!(client.load().await, Err(ClientError::Network(_))));
    assert!(client.state().is_empty());
    assert_eq!(client.state().last_notice().unwrap().message, "Failed to load todos");
}

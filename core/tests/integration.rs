//! End-to-end round trips against the live mock server.
//!
//! # Design
//! Starts the mock server on a random port, then dispatches real requests
//! through `UreqTransport`. Validates URL resolution, header merging, status
//! classification, credential handling and typed decoding over real HTTP.

use std::collections::HashMap;
use std::net::SocketAddr;

use mock_server::User;
use requests_core::{
    Configuration, ConfigurationHolder, Credential, DecodeError, DecodeExt, Error, Method,
    NetworkError, Perform, PerformExt, Persistence, TypedRequest,
};
use tokio::sync::oneshot;

/// Start the mock server on a random port in a background runtime.
fn start_server() -> SocketAddr {
    let std_listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = std_listener.local_addr().unwrap();
    std_listener.set_nonblocking(true).unwrap();

    std::thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async {
            let listener = tokio::net::TcpListener::from_std(std_listener).unwrap();
            mock_server::run(listener).await
        })
        .unwrap();
    });

    addr
}

fn holder_for(addr: SocketAddr) -> ConfigurationHolder {
    let mut configuration = Configuration::default();
    configuration.request_protocol = "http".to_string();
    configuration.base_url = addr.ip().to_string();
    configuration.port = addr.port();
    configuration.authentication_realm = mock_server::REALM.to_string();
    ConfigurationHolder::new(configuration)
}

#[tokio::test(flavor = "multi_thread")]
async fn user_lifecycle() {
    let holder = holder_for(start_server());

    // Step 1: create a user.
    let (created, response) = holder
        .request(Method::Post, "/users")
        .body(br#"{"username":"12345"}"#.to_vec())
        .build()
        .unwrap()
        .perform_decoding::<User>()
        .await
        .unwrap();
    assert_eq!(response.status, 201);
    assert_eq!(created.username, "12345");

    // Step 2: find it through a query parameter.
    let found = TypedRequest::<User, _>::new(
        holder
            .request(Method::Get, "/user")
            .parameter("user", "12345")
            .build()
            .unwrap(),
    )
    .perform()
    .await
    .unwrap();
    assert_eq!(found, created);

    // Step 3: fetch by id.
    let fetched = TypedRequest::<User, _>::new(
        holder
            .request(Method::Get, format!("/users/{}", created.id))
            .build()
            .unwrap(),
    )
    .perform()
    .await
    .unwrap();
    assert_eq!(fetched, created);

    // Step 4: delete; 204 with no body is a success.
    let response = holder
        .request(Method::Delete, format!("/users/{}", created.id))
        .build()
        .unwrap()
        .perform()
        .await
        .unwrap();
    assert_eq!(response.status, 204);
    assert!(response.body.is_none());

    // Step 5: fetch after delete is NotFound, not a decode error.
    let err = holder
        .request(Method::Get, format!("/users/{}", created.id))
        .build()
        .unwrap()
        .perform_decoding::<User>()
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Network(NetworkError::NotFound)));
}

#[tokio::test(flavor = "multi_thread")]
async fn status_codes_are_classified_over_http() {
    let holder = holder_for(start_server());

    for (code, expected) in [
        (400u16, NetworkError::BadRequest),
        (401, NetworkError::Unauthorized),
        (403, NetworkError::Forbidden),
        (404, NetworkError::NotFound),
        (500, NetworkError::InternalServerError),
        (418, NetworkError::Generic),
        (503, NetworkError::Generic),
    ] {
        let err = holder
            .request(Method::Get, format!("/status/{code}"))
            .build()
            .unwrap()
            .perform()
            .await
            .unwrap_err();
        assert_eq!(err.as_network(), Some(&expected), "status {code}");
    }

    let response = holder
        .request(Method::Get, "/status/202")
        .build()
        .unwrap()
        .perform()
        .await
        .unwrap();
    assert_eq!(response.status, 202);
}

#[tokio::test(flavor = "multi_thread")]
async fn empty_body_is_no_data() {
    let holder = holder_for(start_server());

    let err = holder
        .request(Method::Get, "/empty")
        .build()
        .unwrap()
        .perform_decoding::<User>()
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Decode(DecodeError::NoData)));
}

#[tokio::test(flavor = "multi_thread")]
async fn headers_and_body_reach_the_server() {
    let holder = holder_for(start_server());

    let (headers, _) = holder
        .request(Method::Get, "/echo/headers")
        .header("Accept", "application/json")
        .header("X-Client", "integration")
        .build()
        .unwrap()
        .perform_decoding::<HashMap<String, String>>()
        .await
        .unwrap();
    assert_eq!(headers.get("x-client").map(String::as_str), Some("integration"));
    assert_eq!(headers.get("content-type").map(String::as_str), Some("application/json"));

    let body = br#"{"testBody":"thisisatest"}"#;
    let response = holder
        .request(Method::Patch, "/echo")
        .body(body.to_vec())
        .build()
        .unwrap()
        .perform()
        .await
        .unwrap();
    assert_eq!(response.body.as_deref(), Some(&body[..]));
}

#[tokio::test(flavor = "multi_thread")]
async fn get_and_delete_bodies_reach_the_server() {
    let holder = holder_for(start_server());
    let body = br#"{"id":"12345"}"#;

    for method in [Method::Get, Method::Delete] {
        let response = holder
            .request(method, "/echo")
            .body(body.to_vec())
            .build()
            .unwrap()
            .perform()
            .await
            .unwrap();
        assert_eq!(response.body.as_deref(), Some(&body[..]), "{method}");
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn response_url_is_the_final_location() {
    let holder = holder_for(start_server());

    let response = holder
        .request(Method::Get, "/redirect")
        .build()
        .unwrap()
        .perform()
        .await
        .unwrap();
    assert_eq!(response.status, 200);
    assert_eq!(response.url.path(), "/empty");
}

#[tokio::test(flavor = "multi_thread")]
async fn stored_credential_stays_in_its_realm() {
    let addr = start_server();
    let alpha = {
        let mut configuration = holder_for(addr).configuration().as_ref().clone();
        configuration.authentication_realm = "Alpha".to_string();
        ConfigurationHolder::new(configuration)
    };
    // Same origin and same transport, different realm.
    let beta = {
        let mut configuration = alpha.configuration().as_ref().clone();
        configuration.authentication_realm = "Beta".to_string();
        ConfigurationHolder::new(configuration)
    };

    let authorization = |holder: &ConfigurationHolder, credential: Option<Credential>| {
        let mut builder = holder.request(Method::Get, "/echo/headers");
        if let Some(credential) = credential {
            builder = builder.credential(credential);
        }
        let request = builder.build().unwrap();
        async move {
            let (headers, _) = request
                .perform_decoding::<HashMap<String, String>>()
                .await
                .unwrap();
            headers.get("authorization").cloned()
        }
    };

    let alice = Credential::new("alice", "secret", Persistence::ForSession);
    let expected = alice.basic_authorization();
    assert_eq!(authorization(&alpha, Some(alice)).await, Some(expected.clone()));

    assert_eq!(authorization(&beta, None).await, None);
    assert_eq!(authorization(&alpha, None).await, Some(expected));
}

#[tokio::test(flavor = "multi_thread")]
async fn credentials_authorize_protected_resource() {
    let holder = holder_for(start_server());

    // Without a credential the server challenges.
    let err = holder
        .request(Method::Get, "/protected")
        .build()
        .unwrap()
        .perform()
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Network(NetworkError::Unauthorized)));

    // A wrong dispatch-only credential is rejected and not remembered.
    let err = holder
        .request(Method::Get, "/protected")
        .credential(Credential::new(mock_server::PROTECTED_USER, "wrong", Persistence::None))
        .build()
        .unwrap()
        .perform()
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Network(NetworkError::Unauthorized)));

    // A session credential authorizes this dispatch...
    let response = holder
        .request(Method::Get, "/protected")
        .credential(Credential::new(
            mock_server::PROTECTED_USER,
            mock_server::PROTECTED_PASSWORD,
            Persistence::ForSession,
        ))
        .build()
        .unwrap()
        .perform()
        .await
        .unwrap();
    assert_eq!(response.status, 200);

    // ...and later dispatches sharing the configuration's transport.
    let response = holder
        .request(Method::Get, "/protected")
        .build()
        .unwrap()
        .perform()
        .await
        .unwrap();
    assert_eq!(response.status, 200);
}

#[tokio::test(flavor = "multi_thread")]
async fn callback_style_over_http() {
    let holder = holder_for(start_server());
    let request = holder.request(Method::Get, "/status/404").build().unwrap();

    let (tx, rx) = oneshot::channel();
    request.perform_then(move |result| {
        tx.send(result).ok();
    });
    let err = rx.await.unwrap().unwrap_err();
    assert_eq!(err.as_network(), Some(&NetworkError::NotFound));
}

#[tokio::test(flavor = "multi_thread")]
async fn connection_refused_is_transport_error() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let err = holder_for(addr)
        .request(Method::Get, "/users")
        .build()
        .unwrap()
        .perform()
        .await
        .unwrap_err();
    assert!(err.is_transport());
    let Error::Transport(inner) = &err else {
        panic!("expected a transport error, got {err:?}");
    };
    assert!(!inner.get_ref().to_string().is_empty());
}

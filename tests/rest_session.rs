/*
 * Copyright (c) 2025 Craig Hamilton and Contributors.
 * Licensed under either of
 *  - Apache License, Version 2.0 <http://www.apache.org/licenses/LICENSE-2.0> OR
 *  - MIT license <http://opensource.org/licenses/MIT>
 *  at your option.
 */
mod helpers;

#[cfg(test)]
mod test {
    use crate::helpers::{self, DIGEST, SITE};
    use serde_json::json;
    use sharepoint::rest::{
        ClientOptions, Creds, Payload, Session, SharePointClient, SharePointError,
    };
    use reqwest::header::HeaderMap;
    use wiremock::matchers::{header, header_regex, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const DELETE_PATH: &str = "/site/_api/Web/GetFileByServerRelativeUrl('/site/Docs/a.txt')";

    #[tokio::test]
    async fn digest_requested_once_for_many_posts() {
        let server = MockServer::start().await;
        helpers::mount_digest(&server, 1).await;
        Mock::given(method("POST"))
            .and(path(DELETE_PATH))
            .and(header("x-requestdigest", DIGEST))
            .and(header("x-http-method", "DELETE"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"d": {"DeleteObject": null}})))
            .expect(3)
            .mount(&server)
            .await;

        let client = helpers::ntlm_client(&server);
        for _ in 0..3 {
            client.delete_file("/a.txt").await.unwrap();
        }
        assert_eq!(client.session().form_digest().await.unwrap(), DIGEST);
    }

    #[tokio::test]
    async fn digest_shared_between_clones() {
        let server = MockServer::start().await;
        helpers::mount_digest(&server, 1).await;
        Mock::given(method("POST"))
            .and(path(DELETE_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"d": {}})))
            .expect(2)
            .mount(&server)
            .await;

        let client = helpers::bearer_client(&server, ClientOptions::default());
        let clone = client.clone();
        client.delete_file("a.txt").await.unwrap();
        clone.delete_file("/a.txt").await.unwrap();
    }

    #[tokio::test]
    async fn bodiless_posts_send_zero_length() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/site/_api/contextinfo"))
            .and(header("content-length", "0"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"FormDigestValue": DIGEST})))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path(DELETE_PATH))
            .and(header("content-length", "0"))
            .and(header("x-requestdigest", DIGEST))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"d": {"DeleteObject": null}})))
            .expect(1)
            .mount(&server)
            .await;

        let client = helpers::ntlm_client(&server);
        client.delete_file("/a.txt").await.unwrap();
    }

    #[tokio::test]
    async fn verbose_context_info_digest() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/site/_api/contextinfo"))
            .and(header("accept", "application/json; odata=nometadata"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "d": {"GetContextWebInformation": {"FormDigestValue": "verbose-digest"}}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let session = Session::new(&helpers::mock_config(&server, Creds::bearer("t"))).unwrap();
        assert_eq!(session.form_digest().await.unwrap(), "verbose-digest");
        assert_eq!(session.form_digest().await.unwrap(), "verbose-digest");
    }

    #[tokio::test]
    async fn missing_digest_fails_without_posting() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/site/_api/contextinfo"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"d": {}})))
            .expect(2)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/site/_api/Web/Folders/add('Docs/new')"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let client = helpers::ntlm_client(&server);
        let err = client.create_folder("/new").await.unwrap_err();
        assert!(matches!(err, SharePointError::Auth(_)), "{err:?}");

        // A failed attempt is not cached
        assert!(client.session().form_digest().await.is_err());
    }

    #[tokio::test]
    async fn non_json_context_info_is_an_auth_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/site/_api/contextinfo"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>login</html>"))
            .mount(&server)
            .await;

        let session = Session::new(&helpers::mock_config(&server, Creds::bearer("t"))).unwrap();
        assert!(matches!(session.form_digest().await, Err(SharePointError::Auth(_))));
    }

    #[tokio::test]
    async fn bearer_and_accept_headers() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/site/_api/Web/lists"))
            .and(header("authorization", "Bearer token"))
            .and(header("accept", "application/json;odata=verbose"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"d": {"results": []}})))
            .expect(1)
            .mount(&server)
            .await;

        let client = helpers::bearer_client(&server, ClientOptions::default());
        assert!(client.get_lists().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn get_with_params_and_headers() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/site/_api/Web/lists"))
            .and(wiremock::matchers::query_param("$top", "5"))
            .and(header("accept", "application/json; odata=nometadata"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"value": []})))
            .expect(1)
            .mount(&server)
            .await;

        let session = Session::new(&helpers::mock_config(&server, Creds::bearer("t"))).unwrap();
        let mut headers = HeaderMap::new();
        headers.insert(
            reqwest::header::ACCEPT,
            "application/json; odata=nometadata".parse().unwrap(),
        );
        let url = format!("{}/{}/_api/Web/lists", server.uri(), SITE);
        let resp = session.get(&url, headers, Some(&[("$top", "5")])).await.unwrap();
        assert_eq!(resp.status(), 200);
    }

    #[tokio::test]
    async fn json_payload_gets_content_type() {
        let server = MockServer::start().await;
        helpers::mount_digest(&server, 1).await;
        Mock::given(method("POST"))
            .and(path("/site/echo"))
            .and(header("content-type", "application/json"))
            .and(wiremock::matchers::body_json(json!({"a": 1})))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let session = Session::new(&helpers::mock_config(&server, Creds::bearer("t"))).unwrap();
        let url = format!("{}/{}/echo", server.uri(), SITE);
        let resp = session
            .post(&url, HeaderMap::new(), Payload::Json(json!({"a": 1})))
            .await
            .unwrap();
        assert_eq!(resp.status(), 204);
    }

    #[tokio::test]
    async fn ntlm_challenge_round_trip() {
        let server = MockServer::start().await;
        let folders_path = "/site/_api/Web/GetFolderByServerRelativeUrl('/site/Docs')/Folders";
        Mock::given(method("GET"))
            .and(path(folders_path))
            .and(header_regex("authorization", "^NTLM TlRMTVNTUAABAAAA"))
            .respond_with(
                ResponseTemplate::new(401)
                    .insert_header("WWW-Authenticate", format!("NTLM {}", helpers::ntlm_challenge())),
            )
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path(folders_path))
            .and(header_regex("authorization", "^NTLM TlRMTVNTUAADAAAA"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"d": {"results": [
                {"Name": "Reports", "ServerRelativeUrl": "/site/Docs/Reports", "ItemCount": 2}
            ]}})))
            .expect(1)
            .mount(&server)
            .await;

        let client = helpers::ntlm_client(&server);
        let folders = client.get_folders("/").await.unwrap();
        assert_eq!(folders.len(), 1);
        assert_eq!(folders[0].name, "Reports");
        assert_eq!(folders[0].item_count, 2);
    }

    #[tokio::test]
    async fn ntlm_challenge_on_digest_request() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/site/_api/contextinfo"))
            .and(header("content-length", "0"))
            .and(header_regex("authorization", "^NTLM TlRMTVNTUAABAAAA"))
            .respond_with(
                ResponseTemplate::new(401)
                    .insert_header("WWW-Authenticate", format!("NTLM {}", helpers::ntlm_challenge())),
            )
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/site/_api/contextinfo"))
            .and(header("content-length", "0"))
            .and(header_regex("authorization", "^NTLM TlRMTVNTUAADAAAA"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"FormDigestValue": DIGEST})))
            .expect(1)
            .mount(&server)
            .await;

        let client = helpers::ntlm_client(&server);
        assert_eq!(client.session().form_digest().await.unwrap(), DIGEST);
    }

    #[tokio::test]
    async fn refused_ntlm_is_an_auth_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/site/_api/Web/lists"))
            .respond_with(ResponseTemplate::new(401).insert_header("WWW-Authenticate", "NTLM"))
            .expect(1)
            .mount(&server)
            .await;

        let client: SharePointClient = helpers::ntlm_client(&server);
        let err = client.get_lists().await.unwrap_err();
        assert!(matches!(err, SharePointError::Auth(_)), "{err:?}");
    }

    // Needs a reachable site, see helpers::live_config
    #[ignore]
    #[tokio::test]
    async fn live_form_digest() {
        let config = helpers::live_config().unwrap();
        let session = Session::new(&config).unwrap();
        let digest = session.form_digest().await.unwrap();
        println!("Form digest: {}", digest);
    }
}

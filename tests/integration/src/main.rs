fn main() {
    println!("Run `cargo test -p oort-integration` to execute the end-to-end upload tests.");
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::PathBuf;
    use std::sync::Arc;

    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    use oort_api::HttpClient;
    use oort_protocol::{DataFileMetadata, DataFileRecord, DatasetRecord, UploadStatus};
    use oort_uploader::{DataFileUploader, UploadContext};

    const DATASET: &str = "7d4a1c36-2f0b-4e49-8f55-9b8c1e0a6d21";

    /// Returns the path to the fixtures directory.
    fn fixtures_dir() -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("fixtures")
    }

    fn read_fixture(name: &str) -> String {
        let path = fixtures_dir().join(name);
        fs::read_to_string(&path)
            .unwrap_or_else(|e| panic!("failed to read fixture {}: {e}", path.display()))
    }

    fn load_fixture(name: &str) -> serde_json::Value {
        serde_json::from_str(&read_fixture(name))
            .unwrap_or_else(|e| panic!("failed to parse fixture {name}: {e}"))
    }

    /// Deserializes a fixture into a Rust type, re-serializes it, and compares
    /// the JSON values.
    fn roundtrip_test<T>(name: &str)
    where
        T: serde::de::DeserializeOwned + serde::Serialize,
    {
        let fixture = load_fixture(name);
        let parsed: T = serde_json::from_value(fixture.clone())
            .unwrap_or_else(|e| panic!("failed to deserialize {name}: {e}"));
        let reserialized = serde_json::to_value(&parsed)
            .unwrap_or_else(|e| panic!("failed to re-serialize {name}: {e}"));
        assert_eq!(fixture, reserialized, "roundtrip mismatch for {name}");
    }

    // --- Wire records ---

    #[test]
    fn fixture_dataset_record() {
        roundtrip_test::<DatasetRecord>("dataset_record.json");
    }

    #[test]
    fn fixture_datafile_record() {
        roundtrip_test::<DataFileRecord>("datafile_record.json");
    }

    #[test]
    fn fixture_datafile_metadata() {
        roundtrip_test::<DataFileMetadata>("datafile_metadata.json");
    }

    #[test]
    fn skipped_status_serializes_like_fixture() {
        let json = serde_json::to_value(UploadStatus::already_synced()).unwrap();
        assert_eq!(json, load_fixture("upload_status_skipped.json"));
    }

    // --- Mock server ---

    /// One request as received by the mock server.
    struct Captured {
        head: String,
        body: Vec<u8>,
    }

    impl Captured {
        fn request_line(&self) -> &str {
            self.head.lines().next().unwrap_or_default()
        }

        fn header(&self, name: &str) -> Option<String> {
            self.head.lines().find_map(|line| {
                let (k, v) = line.split_once(':')?;
                k.eq_ignore_ascii_case(name).then(|| v.trim().to_string())
            })
        }

        fn body_text(&self) -> String {
            String::from_utf8_lossy(&self.body).into_owned()
        }
    }

    fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
        haystack.windows(needle.len()).position(|w| w == needle)
    }

    /// Starts a server answering one connection per scripted response, in
    /// order, and returns everything it received.
    async fn scripted_server(
        responses: Vec<(u16, String)>,
    ) -> (String, tokio::task::JoinHandle<Vec<Captured>>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}", listener.local_addr().unwrap());

        let handle = tokio::spawn(async move {
            let mut received = Vec::new();
            for (status, body) in responses {
                let (mut stream, _) = listener.accept().await.unwrap();
                let mut buf = Vec::new();
                let mut chunk = [0u8; 8192];

                let header_end = loop {
                    let n = stream.read(&mut chunk).await.unwrap();
                    if n == 0 {
                        break buf.len();
                    }
                    buf.extend_from_slice(&chunk[..n]);
                    if let Some(pos) = find(&buf, b"\r\n\r\n") {
                        break pos + 4;
                    }
                };
                let mut captured = Captured {
                    head: String::from_utf8_lossy(&buf[..header_end]).into_owned(),
                    body: Vec::new(),
                };
                let content_length: usize = captured
                    .header("content-length")
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(0);
                while buf.len() - header_end < content_length {
                    let n = stream.read(&mut chunk).await.unwrap();
                    if n == 0 {
                        break;
                    }
                    buf.extend_from_slice(&chunk[..n]);
                }
                captured.body = buf[header_end..].to_vec();

                let resp = format!(
                    "HTTP/1.1 {status} Mock\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    body.len(),
                    body
                );
                let _ = stream.write_all(resp.as_bytes()).await;
                let _ = stream.shutdown().await;
                received.push(captured);
            }
            received
        });

        (url, handle)
    }

    fn observation(size: usize) -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("m31.fits");
        fs::write(&file, vec![b'F'; size]).unwrap();
        (dir, file)
    }

    fn uploader(url: &str, ctx: UploadContext, root: PathBuf, file: PathBuf) -> DataFileUploader {
        let mut ctx = ctx;
        ctx.validate().unwrap();
        let client = HttpClient::new(Some("test-key")).unwrap().with_base_url(url);
        DataFileUploader::new(ctx.into_shared(), Arc::new(client), root, file)
            .with_origin("observatory")
    }

    // --- End-to-end ---

    #[tokio::test]
    async fn m31_survey_over_http() {
        let (dir, file) = observation(1024);
        let (url, server) = scripted_server(vec![
            (
                201,
                format!(r#"{{"uuid":"{DATASET}","name":"M31-survey"}}"#),
            ),
            (
                201,
                format!(r#"{{"pk":1024,"dataset":"{DATASET}"}}"#),
            ),
            (200, r#"{"pk":1024}"#.to_string()),
        ])
        .await;

        let ctx = UploadContext::new("astro").with_dataset_name("M31-survey");
        let uploader = uploader(&url, ctx, dir.path().to_path_buf(), file);
        let status = uploader
            .upload_file(Some(true), Some(vec!["project:x".into()]))
            .await
            .unwrap();
        assert_eq!(status, UploadStatus::done());
        assert!(status.detail().is_none());
        assert_eq!(uploader.log_prefix(), "[m31.fits]");

        let requests = server.await.unwrap();
        assert_eq!(requests.len(), 3);

        let create = &requests[0];
        assert_eq!(create.request_line(), "POST /datasets/ HTTP/1.1");
        assert_eq!(
            create.header("x-arcsecond-api-authorization").as_deref(),
            Some("Key test-key")
        );
        let sent: serde_json::Value = serde_json::from_slice(&create.body).unwrap();
        assert_eq!(sent, serde_json::json!({"name": "M31-survey"}));

        let upload = &requests[1];
        assert_eq!(upload.request_line(), "POST /datafiles/ HTTP/1.1");
        assert!(
            upload
                .header("content-type")
                .is_some_and(|v| v.starts_with("multipart/form-data; boundary="))
        );
        let text = upload.body_text();
        assert!(text.contains(&format!("name=\"dataset\"\r\n\r\n{DATASET}\r\n")));
        assert!(text.contains("filename=\"m31.fits\""));
        assert!(text.contains(&"F".repeat(1024)));

        let tag = &requests[2];
        assert_eq!(tag.request_line(), "PATCH /datafiles/1024/ HTTP/1.1");
        let metadata: DataFileMetadata = serde_json::from_slice(&tag.body).unwrap();
        assert!(metadata.is_raw);
        assert_eq!(metadata.tags.last().map(String::as_str), Some("project:x"));
        assert_eq!(
            metadata.tags[0],
            format!("arcsecond|root|{}", dir.path().display())
        );
        assert_eq!(metadata.fsname, "observatory");
    }

    #[tokio::test]
    async fn duplicate_over_http_is_skipped() {
        let (dir, file) = observation(64);
        let (url, server) = scripted_server(vec![
            (200, format!(r#"{{"uuid":"{DATASET}","name":"M31-survey"}}"#)),
            (400, read_fixture("already_exists.json")),
        ])
        .await;

        let ctx = UploadContext::new("astro").with_dataset_uuid(DATASET);
        let uploader = uploader(&url, ctx, dir.path().to_path_buf(), file);
        let status = uploader.upload_file(None, None).await.unwrap();
        assert_eq!(status, UploadStatus::already_synced());

        let requests = server.await.unwrap();
        assert_eq!(requests.len(), 2);
        assert_eq!(
            requests[0].request_line(),
            format!("GET /datasets/{DATASET}/ HTTP/1.1")
        );
        assert_eq!(requests[1].request_line(), "POST /datafiles/ HTTP/1.1");
    }

    #[tokio::test]
    async fn organisation_scopes_every_request() {
        let (dir, file) = observation(8);
        let (url, server) = scripted_server(vec![
            (200, format!(r#"{{"uuid":"{DATASET}"}}"#)),
            (201, r#"{"pk":5}"#.to_string()),
            (200, r#"{"pk":5}"#.to_string()),
        ])
        .await;

        let mut ctx = UploadContext::new("astro")
            .with_dataset_uuid(DATASET)
            .with_organisation("saao");
        ctx.validate().unwrap();
        let client = HttpClient::new(None)
            .unwrap()
            .with_base_url(url.as_str())
            .with_organisation(ctx.organisation_subdomain().map(str::to_string));
        let uploader = DataFileUploader::new(
            ctx.into_shared(),
            Arc::new(client),
            dir.path().to_path_buf(),
            file,
        );

        uploader.upload_file(None, None).await.unwrap();

        let requests = server.await.unwrap();
        let lines: Vec<&str> = requests.iter().map(Captured::request_line).collect();
        assert_eq!(
            lines,
            vec![
                format!("GET /saao/datasets/{DATASET}/ HTTP/1.1"),
                "POST /saao/datafiles/ HTTP/1.1".to_string(),
                "PATCH /saao/datafiles/5/ HTTP/1.1".to_string(),
            ]
        );
    }
}

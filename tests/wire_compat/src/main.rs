fn main() {
    println!("Run `cargo test -p wire-compat` to execute wire compatibility tests.");
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::PathBuf;

    use covesync_protocol::constants::{file_content_route, file_route};
    use covesync_protocol::range::{
        UPLOAD_BEGIN_RANGE, UPLOAD_STATUS_RANGE, chunk_content_range, parse_received_range,
    };
    use covesync_protocol::types::{ErrorBody, File};
    use serde::Deserialize;

    /// Returns the path to the fixtures directory.
    fn fixtures_dir() -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("fixtures")
    }

    /// Loads a fixture JSON file and returns it as a `serde_json::Value`.
    fn load_fixture(name: &str) -> serde_json::Value {
        let path = fixtures_dir().join(name);
        let data = fs::read_to_string(&path)
            .unwrap_or_else(|e| panic!("failed to read fixture {}: {e}", path.display()));
        serde_json::from_str(&data)
            .unwrap_or_else(|e| panic!("failed to parse fixture {}: {e}", path.display()))
    }

    /// Deserializes a fixture, re-serializes it, and compares the JSON
    /// values (order-independent).
    fn roundtrip_test<T>(name: &str)
    where
        T: serde::de::DeserializeOwned + serde::Serialize,
    {
        let fixture = load_fixture(name);
        let parsed: T = serde_json::from_value(fixture.clone())
            .unwrap_or_else(|e| panic!("failed to deserialize {name}: {e}"));
        let reserialized = serde_json::to_value(&parsed)
            .unwrap_or_else(|e| panic!("failed to re-serialize {name}: {e}"));

        assert_eq!(
            fixture, reserialized,
            "roundtrip mismatch for {name}:\n  fixture: {fixture}\n  ours:    {reserialized}"
        );
    }

    /// Tiles a stream of `stream_length` bytes into `Content-Range` values,
    /// the way an upload sends them.
    fn tile(stream_length: i64, chunk_size: i64) -> Vec<String> {
        let mut ranges = Vec::new();
        let mut start = 0i64;
        loop {
            let remaining = stream_length - start;
            if remaining >= chunk_size {
                ranges.push(chunk_content_range(start, start + chunk_size - 1, None));
                start += chunk_size;
            } else {
                let end = stream_length - 1;
                ranges.push(chunk_content_range(start, end, Some(end)));
                return ranges;
            }
        }
    }

    // --- Entity fixtures ---

    #[test]
    fn fixture_file_metadata() {
        roundtrip_test::<File>("file_metadata.json");

        let file: File = serde_json::from_value(load_fixture("file_metadata.json")).unwrap();
        assert_eq!(file.id, "7b3a9d8ec4f1");
        assert_eq!(file.size, 2_500_000);
        assert_eq!(file.etag, "\"MjI1NTk3\"");
        assert!(file.last_modified.is_some());
    }

    #[test]
    fn fixture_file_field_subset() {
        // A `fields=id,etag` response; everything else takes its default.
        let file: File = serde_json::from_value(load_fixture("file_subset.json")).unwrap();
        assert_eq!(file.id, "7b3a9d8ec4f1");
        assert_eq!(file.etag, "\"MjI1NTk3\"");
        assert!(file.name.is_empty());
        assert_eq!(file.size, 0);
        assert!(file.last_modified.is_none());
    }

    #[test]
    fn fixture_error_body() {
        roundtrip_test::<ErrorBody>("error_body.json");

        let err: ErrorBody = serde_json::from_value(load_fixture("error_body.json")).unwrap();
        assert_eq!(err.kind, "CONFLICT");
    }

    // --- Header grammar fixtures ---

    #[derive(Deserialize)]
    struct ChunkRangeCase {
        stream_length: i64,
        chunk_size: i64,
        ranges: Vec<String>,
    }

    #[test]
    fn fixture_chunk_ranges() {
        let cases: Vec<ChunkRangeCase> =
            serde_json::from_value(load_fixture("chunk_ranges.json")).unwrap();
        assert!(!cases.is_empty());

        for case in cases {
            assert_eq!(
                tile(case.stream_length, case.chunk_size),
                case.ranges,
                "stream_length={} chunk_size={}",
                case.stream_length,
                case.chunk_size
            );
        }
    }

    #[derive(Deserialize)]
    struct StatusRangeCase {
        header: String,
        received: i64,
    }

    #[derive(Deserialize)]
    struct StatusRangeFixture {
        valid: Vec<StatusRangeCase>,
        invalid: Vec<String>,
    }

    #[test]
    fn fixture_status_ranges() {
        let fixture: StatusRangeFixture =
            serde_json::from_value(load_fixture("status_ranges.json")).unwrap();

        for case in fixture.valid {
            assert_eq!(
                parse_received_range(&case.header).unwrap(),
                case.received,
                "header {:?}",
                case.header
            );
        }
        for header in fixture.invalid {
            assert!(
                parse_received_range(&header).is_err(),
                "accepted {header:?}"
            );
        }
    }

    // --- Stable protocol strings ---

    #[test]
    fn control_headers_are_stable() {
        assert_eq!(UPLOAD_BEGIN_RANGE, "bytes */*");
        assert_eq!(UPLOAD_STATUS_RANGE, "bytes /*/");
    }

    #[test]
    fn routes_are_stable() {
        assert_eq!(file_route("7b3a9d8ec4f1"), "/files/7b3a9d8ec4f1");
        assert_eq!(
            file_content_route("7b3a9d8ec4f1"),
            "/files/7b3a9d8ec4f1/content"
        );
    }
}

use std::io::Write;

use tokenscope::{
    BatchConfig, CancelToken, FailureReason, Outcome, lines_from_iter, lines_from_reader,
};
use tokio::io::BufReader;

use crate::helpers::MockProvider;

#[tokio::test]
async fn test_file_source_preserves_line_order() {
    let provider = MockProvider::start().await;
    let validator = provider.validator(BatchConfig::default().with_concurrency(3));

    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "valid-a").unwrap();
    writeln!(file).unwrap();
    writeln!(file, "  rejected-b  ").unwrap();
    writeln!(file, "\t").unwrap();
    writeln!(file, "alt_scope-c\r").unwrap();
    write!(file, "valid-d").unwrap();
    file.flush().unwrap();

    let reader = tokio::fs::File::open(file.path()).await.unwrap();
    let result = validator
        .validate_batch(lines_from_reader(BufReader::new(reader)))
        .await
        .unwrap();

    let tokens: Vec<&str> = result.iter().map(Outcome::credential).collect();
    assert_eq!(tokens, ["valid-a", "rejected-b", "alt_scope-c", "valid-d"]);

    let validity: Vec<bool> = result.iter().map(Outcome::is_valid).collect();
    assert_eq!(validity, [true, false, true, true]);
}

#[tokio::test]
async fn test_undecodable_line_gets_its_own_outcome() {
    let provider = MockProvider::start().await;
    let validator = provider.validator(BatchConfig::default().with_concurrency(2));

    let input: &[u8] = b"valid-a\n\xff\xfebad\nvalid-b\n";
    let result = validator
        .validate_batch(lines_from_reader(input))
        .await
        .unwrap();

    assert_eq!(result.len(), 3);
    assert!(result.outcomes()[0].is_valid());
    assert_eq!(result.outcomes()[1].credential(), "\u{fffd}\u{fffd}bad");
    assert!(!result.outcomes()[1].is_valid());
    assert!(result.outcomes()[2].is_valid());
}

#[tokio::test]
async fn test_scenario_three_lines_one_blank() {
    let provider = MockProvider::start().await;
    let validator = provider.validator(BatchConfig::default());

    let result = validator
        .validate_batch(lines_from_iter(["valid-A", "", "valid-B"]))
        .await
        .unwrap();

    assert_eq!(result.len(), 2);
    assert_eq!(result.outcomes()[0].credential(), "valid-A");
    assert_eq!(result.outcomes()[1].credential(), "valid-B");
}

#[tokio::test]
async fn test_one_transport_failure_in_ten() {
    let provider = MockProvider::start().await;
    let validator = provider.validator(BatchConfig::default().with_concurrency(4));

    let input: Vec<String> = (0..10)
        .map(|i| {
            if i == 4 {
                "bad_gateway-4".to_string()
            } else {
                format!("valid-{i}")
            }
        })
        .collect();

    let result = validator
        .validate_batch(lines_from_iter(input.clone()))
        .await
        .unwrap();

    assert_eq!(result.len(), 10);
    for (i, (outcome, token)) in result.iter().zip(&input).enumerate() {
        assert_eq!(outcome.credential(), token.as_str());
        if i == 4 {
            assert_eq!(
                outcome.failure_reason().map(FailureReason::kind),
                Some("transport_failure")
            );
        } else {
            assert!(outcome.is_valid(), "slot {i} should be unaffected");
        }
    }
}

#[tokio::test]
async fn test_mixed_failures_reported_inline() {
    let provider = MockProvider::start().await;
    let validator = provider.validator(BatchConfig::default().with_concurrency(2));

    let result = validator
        .validate_batch(lines_from_iter([
            "garbage-1",
            "valid-2",
            "rejected-3",
            "oauth_error-4",
            "me_broken-5",
        ]))
        .await
        .unwrap();

    let kinds: Vec<&str> = result
        .iter()
        .map(|o| o.failure_reason().map(FailureReason::kind).unwrap_or("valid"))
        .collect();
    assert_eq!(
        kinds,
        [
            "invalid_response",
            "valid",
            "provider_rejected",
            "provider_rejected",
            "transport_failure"
        ]
    );
    assert_eq!(result.valid_count(), 1);
    assert_eq!(result.invalid_count(), 4);
}

#[tokio::test]
async fn test_cancelled_before_start_makes_no_calls() {
    let provider = MockProvider::start().await;
    let validator = provider.validator(BatchConfig::default());

    let cancel = CancelToken::new();
    cancel.cancel();
    let result = validator
        .validate_batch_with_cancel(lines_from_iter(["valid-1", "valid-2"]), cancel)
        .await
        .unwrap();

    assert_eq!(result.len(), 2);
    assert!(
        result
            .iter()
            .all(|o| o.failure_reason() == Some(&FailureReason::Cancelled))
    );
    assert_eq!(provider.calls(), 0);
}

#[tokio::test]
async fn test_batch_json_shape() {
    let provider = MockProvider::start().await;
    let validator = provider.validator(BatchConfig::default());

    let result = validator
        .validate_batch(lines_from_iter(["valid-x", "rejected-y"]))
        .await
        .unwrap();
    let value = serde_json::to_value(&result).unwrap();

    assert_eq!(value[0]["token"], "valid-x");
    assert_eq!(value[0]["valid"], true);
    assert_eq!(value[0]["user"]["id"], "id-valid-x");
    assert_eq!(value[1]["valid"], false);
    assert_eq!(value[1]["reason"]["kind"], "provider_rejected");
    assert_eq!(value[1]["reason"]["error"]["code"], 190);
}

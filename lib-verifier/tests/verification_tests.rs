//! End-to-end verification scenarios against mock collaborators

use lib_verifier::testing::{MockChain, MockCompilerLoader};
use lib_verifier::{CompilerCache, SourceMap, VerificationService, VerifyError};
use std::sync::Arc;

const VERSION: &str = "v0.4.24+commit.x";
const ADDRESS: &str = "0x00000000000000000000000000000000000000aa";
const PROLOGUE: &str = "6080604052";
const BODY: &str = "600436106049576000357c0100000000";
const METADATA: &str = "a165627a7a72305820";

fn sources() -> SourceMap {
    let mut sources = SourceMap::new();
    sources.insert("A.sol".to_string(), "contract A {}".to_string());
    sources
}

fn build(loader: MockCompilerLoader, chain: Arc<MockChain>) -> (VerificationService, Arc<MockCompilerLoader>) {
    let loader = Arc::new(loader);
    let cache = Arc::new(CompilerCache::new(loader.clone()));
    (VerificationService::new(cache, chain), loader)
}

#[tokio::test]
async fn test_metadata_difference_still_verifies() {
    let compiled = format!("{}{}{}{}", PROLOGUE, BODY, METADATA, "11".repeat(32));
    let deployed = format!("0x{}{}{}{}", PROLOGUE, BODY, METADATA, "22".repeat(32));

    let chain = Arc::new(MockChain::new());
    chain.set_code(ADDRESS, &deployed).await;
    let (service, _) = build(MockCompilerLoader::new().with_contract("A.sol:A", &compiled), chain);

    let verified = service
        .verify_bytecode(sources(), VERSION, "A", "A.sol", ADDRESS)
        .await
        .unwrap();
    assert!(verified);
}

#[tokio::test]
async fn test_difference_in_executable_region_fails() {
    let compiled = format!("{}{}{}{}", PROLOGUE, BODY, METADATA, "11".repeat(32));
    let tampered_body = BODY.replace("57", "56");
    let deployed = format!("0x{}{}{}{}", PROLOGUE, tampered_body, METADATA, "11".repeat(32));

    let chain = Arc::new(MockChain::new());
    chain.set_code(ADDRESS, &deployed).await;
    let (service, _) = build(MockCompilerLoader::new().with_contract("A.sol:A", &compiled), chain);

    let verified = service
        .verify_bytecode(sources(), VERSION, "A", "A.sol", ADDRESS)
        .await
        .unwrap();
    assert!(!verified);
}

#[tokio::test]
async fn test_hex_case_does_not_matter() {
    let compiled = format!("{}{}{}{}", PROLOGUE, BODY, METADATA, "ab".repeat(32));
    let deployed = format!("0x{}{}{}{}", PROLOGUE, BODY.to_uppercase(), METADATA, "CD".repeat(32));

    let chain = Arc::new(MockChain::new());
    chain.set_code(ADDRESS, &deployed).await;
    let (service, _) = build(MockCompilerLoader::new().with_contract("A.sol:A", &compiled), chain);

    assert!(service
        .verify_bytecode(sources(), VERSION, "A", "A.sol", ADDRESS)
        .await
        .unwrap());
}

#[tokio::test]
async fn test_old_compiler_requires_exact_match() {
    let compiled = format!("6060604052{}{}{}", BODY, METADATA, "11".repeat(32));
    let deployed = format!("0x6060604052{}{}{}", BODY, METADATA, "22".repeat(32));

    let chain = Arc::new(MockChain::new());
    chain.set_code(ADDRESS, &deployed).await;
    let (service, _) = build(MockCompilerLoader::new().with_contract("A.sol:A", &compiled), chain);

    // 0.4.6 predates the metadata trailer rules, so the full code is compared.
    let verified = service
        .verify_bytecode(sources(), "v0.4.6+commit.2dabbdf0", "A", "A.sol", ADDRESS)
        .await
        .unwrap();
    assert!(!verified);
}

#[tokio::test]
async fn test_repeated_verification_loads_compiler_once() {
    let compiled = format!("{}{}{}", PROLOGUE, BODY, METADATA);
    let chain = Arc::new(MockChain::new());
    chain.set_code(ADDRESS, &format!("0x{}", compiled)).await;
    let (service, loader) = build(MockCompilerLoader::new().with_contract("A.sol:A", &compiled), chain);

    for _ in 0..3 {
        assert!(service
            .verify_bytecode(sources(), VERSION, "A", "A.sol", ADDRESS)
            .await
            .unwrap());
    }

    assert_eq!(loader.load_count().await, 1);
    assert_eq!(service.compilers().stats().hits, 2);
}

#[tokio::test]
async fn test_concurrent_verifications_share_compiler_load() {
    let compiled = format!("{}{}{}", PROLOGUE, BODY, METADATA);
    let chain = Arc::new(MockChain::new());
    chain.set_code(ADDRESS, &format!("0x{}", compiled)).await;
    let (service, loader) = build(
        MockCompilerLoader::new()
            .with_contract("A.sol:A", &compiled)
            .with_delay(std::time::Duration::from_millis(25)),
        chain,
    );

    let (a, b, c) = tokio::join!(
        service.verify_bytecode(sources(), VERSION, "A", "A.sol", ADDRESS),
        service.verify_bytecode(sources(), VERSION, "A", "A.sol", ADDRESS),
        service.verify_bytecode(sources(), VERSION, "A", "A.sol", ADDRESS),
    );
    assert!(a.unwrap() && b.unwrap() && c.unwrap());
    assert_eq!(loader.load_count().await, 1);
}

#[tokio::test]
async fn test_errors_propagate_unchanged() {
    let chain = Arc::new(MockChain::new());
    let (service, _) = build(
        MockCompilerLoader::new()
            .with_contract("A.sol:A", PROLOGUE)
            .failing_on("v0.4.99+commit.missing"),
        chain,
    );

    let load_err = service
        .verify_bytecode(sources(), "v0.4.99+commit.missing", "A", "A.sol", ADDRESS)
        .await
        .unwrap_err();
    assert!(matches!(load_err, VerifyError::CompilerLoadError { .. }));

    // No code registered for the address in the mock chain.
    let chain_err = service
        .verify_bytecode(sources(), VERSION, "A", "A.sol", ADDRESS)
        .await
        .unwrap_err();
    assert!(matches!(chain_err, VerifyError::ChainFetchError { .. }));
}

#[tokio::test]
async fn test_malformed_version_is_reported() {
    let chain = Arc::new(MockChain::new());
    chain.set_code(ADDRESS, &format!("0x{}", PROLOGUE)).await;
    let (service, _) = build(MockCompilerLoader::new().with_contract("A.sol:A", PROLOGUE), chain);

    let err = service
        .verify_bytecode(sources(), "invalid", "A", "A.sol", ADDRESS)
        .await
        .unwrap_err();
    assert_eq!(err, VerifyError::MalformedVersionString("invalid".to_string()));
}

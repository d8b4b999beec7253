//! Exchanges that must fail, and how.

use eidas_core::event::EventType;
use eidas_core::ErrorKey;
use eidas_protocol::loa::LevelOfAssurance;
use eidas_protocol::processor::IdpResult;
use eidas_protocol::types::status_codes;
use eidas_protocol::{ErrorCategory, ProtocolError};

use crate::common::{spanish_citizen, NodesBuilder, PS_METADATA};
use crate::flows::{post, sp_request};

/// An identity provider that authenticates nobody still produces a signed
/// answer the service provider can read.
#[tokio::test]
async fn test_idp_failure_reaches_service_provider() -> anyhow::Result<()> {
    let nodes = NodesBuilder::new().build()?;
    let outbound = nodes
        .connector
        .process_sp_request(&post(), sp_request("_sp-1", vec![LevelOfAssurance::LOW])?)
        .await?;
    let accepted = nodes
        .proxy
        .process_connector_request(&post(), &outbound.bytes)
        .await?;

    let err = nodes
        .proxy
        .generate_response(&post(), &accepted.id, None)
        .await
        .expect_err("an empty identity provider result must be refused");
    let reply = match err {
        ProtocolError::Reply(reply) => reply,
        other => anyhow::bail!("expected a failure reply, got {other:?}"),
    };
    assert_eq!(reply.key, ErrorKey::InvalidAttributeList);
    assert_eq!(reply.relay_state.as_deref(), Some("sp-relay"));

    let exchange = nodes
        .connector
        .process_proxy_service_response(&post(), Some(&reply.bytes))
        .await?;
    let response = &exchange.response;
    assert!(response.is_failure());
    assert_eq!(response.in_response_to, "_sp-1");
    assert_eq!(response.status.status_code.value, status_codes::RESPONDER);
    assert_eq!(
        response.status.status_message,
        Some(ErrorKey::InvalidAttributeList.message())
    );
    assert_eq!(
        nodes.proxy_audit.types(),
        vec![
            EventType::ProxyRequestAccepted,
            EventType::ProxyResponseRejected
        ]
    );
    Ok(())
}

#[tokio::test]
async fn test_replayed_connector_request_is_refused() -> anyhow::Result<()> {
    let nodes = NodesBuilder::new().build()?;
    let outbound = nodes
        .connector
        .process_sp_request(&post(), sp_request("_sp-1", vec![LevelOfAssurance::LOW])?)
        .await?;

    nodes
        .proxy
        .process_connector_request(&post(), &outbound.bytes)
        .await?;
    let err = nodes
        .proxy
        .process_connector_request(&post(), &outbound.bytes)
        .await
        .expect_err("a replayed request must be refused");

    assert_eq!(err.category(), ErrorCategory::Security);
    assert!(nodes.proxy_audit.types().contains(&EventType::ReplayDetected));
    Ok(())
}

#[tokio::test]
async fn test_replayed_response_is_refused() -> anyhow::Result<()> {
    let nodes = NodesBuilder::new().build()?;
    let outbound = nodes
        .connector
        .process_sp_request(&post(), sp_request("_sp-1", vec![LevelOfAssurance::LOW])?)
        .await?;
    let accepted = nodes
        .proxy
        .process_connector_request(&post(), &outbound.bytes)
        .await?;
    let idp = IdpResult::success(spanish_citizen()?, LevelOfAssurance::HIGH.uri());
    let answer = nodes
        .proxy
        .generate_response(&post(), &accepted.id, Some(idp))
        .await?;

    nodes
        .connector
        .process_proxy_service_response(&post(), Some(&answer.bytes))
        .await?;
    let err = nodes
        .connector
        .process_proxy_service_response(&post(), Some(&answer.bytes))
        .await
        .expect_err("a replayed response must be refused");

    assert_eq!(err.category(), ErrorCategory::Security);
    assert_eq!(err.key(), ErrorKey::SproviderSelectorInvalidSaml);
    Ok(())
}

#[tokio::test]
async fn test_response_from_untrusted_signer_is_refused() -> anyhow::Result<()> {
    let nodes = NodesBuilder::new().rogue_proxy_signer()?.build()?;
    let outbound = nodes
        .connector
        .process_sp_request(&post(), sp_request("_sp-1", vec![LevelOfAssurance::LOW])?)
        .await?;
    let accepted = nodes
        .proxy
        .process_connector_request(&post(), &outbound.bytes)
        .await?;
    let idp = IdpResult::success(spanish_citizen()?, LevelOfAssurance::HIGH.uri());
    let answer = nodes
        .proxy
        .generate_response(&post(), &accepted.id, Some(idp))
        .await?;

    let err = nodes
        .connector
        .process_proxy_service_response(&post(), Some(&answer.bytes))
        .await
        .expect_err("an untrusted signer must be refused");

    assert_eq!(err.category(), ErrorCategory::Security);
    assert_eq!(err.key(), ErrorKey::SamlEngineUntrustedCertificate);
    assert!(nodes
        .connector_audit
        .types()
        .contains(&EventType::CertificateRejected));
    Ok(())
}

#[tokio::test]
async fn test_unreachable_proxy_metadata_is_a_configuration_error() -> anyhow::Result<()> {
    let nodes = NodesBuilder::new().build()?;
    nodes.metadata.remove(PS_METADATA);

    let err = nodes
        .connector
        .process_sp_request(&post(), sp_request("_sp-1", vec![LevelOfAssurance::LOW])?)
        .await
        .expect_err("missing metadata must fail the attempt");

    assert_eq!(err.category(), ErrorCategory::Configuration);
    assert_eq!(err.key(), ErrorKey::SamlEngineNoMetadata);
    Ok(())
}

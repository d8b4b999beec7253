//! Successful cross-border exchanges.

use eidas_core::event::EventType;
use eidas_protocol::attribute::{uris, AttributeValue};
use eidas_protocol::loa::{LevelOfAssurance, LevelsOfAssurance, LoaComparison};
use eidas_protocol::processor::{IdpResult, RequestContext};
use eidas_protocol::types::{AuthenticationRequest, HttpMethod, NameIdFormat};

use crate::common::{
    natural_person_request, spanish_citizen, NodesBuilder, CONNECTOR_METADATA, PS_POST, SP_ISSUER,
};

pub fn post() -> RequestContext {
    RequestContext::new(HttpMethod::Post).with_remote_ip("198.51.100.7")
}

pub fn sp_request(id: &str, levels: Vec<LevelOfAssurance>) -> anyhow::Result<AuthenticationRequest> {
    Ok(
        AuthenticationRequest::new(id, SP_ISSUER, "ES", natural_person_request()?)
            .with_service_provider_country_code(Some("BE".to_string()))
            .with_levels_of_assurance(LevelsOfAssurance::new(levels))
            .with_relay_state(Some("sp-relay".to_string())),
    )
}

/// A Belgian service provider authenticates a Spanish citizen at LOW and
/// gets the answer addressed to its own request.
#[tokio::test]
async fn test_citizen_authenticates_across_borders() -> anyhow::Result<()> {
    let nodes = NodesBuilder::new().build()?;

    let outbound = nodes
        .connector
        .process_sp_request(&post(), sp_request("_sp-1", vec![LevelOfAssurance::LOW])?)
        .await?;
    assert_eq!(outbound.destination, PS_POST);
    assert_eq!(outbound.request.issuer, CONNECTOR_METADATA);
    assert_eq!(outbound.request.original_issuer.as_deref(), Some(SP_ISSUER));
    assert_eq!(outbound.request.levels_of_assurance.comparison, LoaComparison::Minimum);
    assert_eq!(outbound.request.levels_of_assurance.levels, vec![LevelOfAssurance::LOW]);

    let accepted = nodes
        .proxy
        .process_connector_request(&post(), &outbound.bytes)
        .await?;
    assert_eq!(accepted.id, outbound.request.id);

    let idp = IdpResult::success(spanish_citizen()?, LevelOfAssurance::SUBSTANTIAL.uri());
    let answer = nodes
        .proxy
        .generate_response(&post(), &accepted.id, Some(idp))
        .await?;
    assert_eq!(
        answer.destination.as_deref(),
        Some("https://connector.example.be/acs")
    );

    let exchange = nodes
        .connector
        .process_proxy_service_response(&post(), Some(&answer.bytes))
        .await?;
    let response = &exchange.response;
    assert!(response.status.is_success());
    assert_eq!(response.in_response_to, "_sp-1");
    assert_eq!(response.issuer, CONNECTOR_METADATA);
    assert_eq!(exchange.sp_request.request.id, "_sp-1");
    assert_eq!(exchange.sp_request.request.relay_state.as_deref(), Some("sp-relay"));
    assert_eq!(
        response.level_of_assurance.as_deref(),
        Some(LevelOfAssurance::SUBSTANTIAL.uri())
    );
    assert_eq!(
        response
            .attributes
            .first_value(uris::PERSON_IDENTIFIER)
            .map(AttributeValue::marshal)
            .as_deref(),
        Some("ES/BE/02635542Y")
    );

    assert_eq!(
        nodes.connector_audit.types(),
        vec![
            EventType::ConnectorRequestGenerated,
            EventType::ConnectorResponseAccepted
        ]
    );
    assert_eq!(
        nodes.proxy_audit.types(),
        vec![
            EventType::ProxyRequestAccepted,
            EventType::ProxyResponseGenerated
        ]
    );
    Ok(())
}

/// A 1.1 ProxyService never sees non-notified levels and always gets a
/// NameID format.
#[tokio::test]
async fn test_legacy_proxy_service_receives_notified_levels_only() -> anyhow::Result<()> {
    let nodes = NodesBuilder::new()
        .ps_versions(&["1.1"])
        .ps_published(&[LevelOfAssurance::SUBSTANTIAL])
        .build()?;
    let gold = LevelOfAssurance::from_uri("http://loa.example.be/gold");

    let outbound = nodes
        .connector
        .process_sp_request(
            &post(),
            sp_request("_sp-2", vec![LevelOfAssurance::SUBSTANTIAL, gold])?,
        )
        .await?;
    assert_eq!(outbound.request.levels_of_assurance.comparison, LoaComparison::Minimum);
    assert_eq!(
        outbound.request.levels_of_assurance.levels,
        vec![LevelOfAssurance::SUBSTANTIAL]
    );
    assert_eq!(
        outbound.request.name_id_format.as_deref(),
        Some(NameIdFormat::Unspecified.uri())
    );

    let accepted = nodes
        .proxy
        .process_connector_request(&post(), &outbound.bytes)
        .await?;
    let idp = IdpResult::success(spanish_citizen()?, LevelOfAssurance::SUBSTANTIAL.uri());
    let answer = nodes
        .proxy
        .generate_response(&post(), &accepted.id, Some(idp))
        .await?;
    assert_eq!(
        answer.response.subject_name_id_format.as_deref(),
        Some(NameIdFormat::Unspecified.uri())
    );

    let exchange = nodes
        .connector
        .process_proxy_service_response(&post(), Some(&answer.bytes))
        .await?;
    assert!(exchange.response.status.is_success());
    assert_eq!(exchange.response.in_response_to, "_sp-2");
    Ok(())
}

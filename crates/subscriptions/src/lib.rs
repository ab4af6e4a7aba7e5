//! FHIR Subscription handling on top of the core search crate.
//!
//! A Subscription resource carries a search criteria string; this crate
//! parses it once into a [`lantern_search::ParsedQuery`], filters
//! change-stream records down to matchable resources, and matches
//! changed resources against active subscriptions with the in-memory
//! matcher, producing delivery notifications.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use lantern_search::matcher::MatchOptions;
use lantern_search::{
    InvalidSearchParameter, ParsedQuery, Result, SearchParameterRegistry, match_parsed_query,
    parse_query_string,
};

/// An active subscription with its criteria parsed up front.
#[derive(Debug, Clone, Serialize)]
pub struct Subscription {
    pub subscription_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tenant_id: Option<String>,
    pub channel_type: String,
    pub channel_header: Vec<String>,
    pub channel_payload: String,
    pub endpoint: String,
    pub parsed_criteria: ParsedQuery,
}

/// Identity of a resource that matched a subscription.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchedResource {
    pub id: String,
    pub resource_type: String,
    pub version_id: String,
    pub last_updated: String,
}

/// A delivery order for one (subscription, resource) match.
#[derive(Debug, Clone, Serialize)]
pub struct SubscriptionNotification {
    pub subscription_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tenant_id: Option<String>,
    pub channel_type: String,
    pub endpoint: String,
    pub channel_payload: String,
    pub channel_header: Vec<String>,
    pub matched_resource: MatchedResource,
}

/// Kind of change carried by a stream record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeEventKind {
    Create,
    Update,
    Delete,
}

/// One record of a data-change stream, vendor-agnostic: the event kind
/// plus the resource document after the change, when the stream
/// provides it.
#[derive(Debug, Clone)]
pub struct ChangeRecord {
    pub kind: ChangeEventKind,
    pub new_image: Option<Value>,
}

fn string_field(resource: &Value, field: &str) -> Option<String> {
    resource.get(field).and_then(Value::as_str).map(str::to_string)
}

/// Multi-tenant documents carry the tenant-scoped id under `_id`.
fn resource_id(resource: &Value) -> Option<String> {
    if resource.get("_tenantId").is_some() {
        string_field(resource, "_id")
    } else {
        string_field(resource, "id")
    }
}

/// Reads a Subscription resource and parses its criteria.
pub fn parse_subscription(
    registry: &dyn SearchParameterRegistry,
    resource: &Value,
) -> Result<Subscription> {
    let channel = resource.get("channel").ok_or_else(|| {
        InvalidSearchParameter::new("Subscription resource is missing channel")
    })?;
    let channel_field = |field: &str| {
        string_field(channel, field).ok_or_else(|| {
            InvalidSearchParameter::new(format!("Subscription resource is missing channel.{}", field))
        })
    };
    let criteria = string_field(resource, "criteria").ok_or_else(|| {
        InvalidSearchParameter::new("Subscription resource is missing criteria")
    })?;
    let subscription_id = resource_id(resource).ok_or_else(|| {
        InvalidSearchParameter::new("Subscription resource is missing id")
    })?;
    let channel_header = channel
        .get("header")
        .and_then(Value::as_array)
        .map(|headers| {
            headers
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();

    Ok(Subscription {
        subscription_id,
        tenant_id: string_field(resource, "_tenantId"),
        channel_type: channel_field("type")?,
        channel_header,
        channel_payload: channel_field("payload")?,
        endpoint: channel_field("endpoint")?,
        parsed_criteria: parse_query_string(registry, &criteria)?,
    })
}

/// Builds the notification for a resource that matched `subscription`.
pub fn build_notification(subscription: &Subscription, resource: &Value) -> SubscriptionNotification {
    let meta_field = |field: &str| {
        resource
            .get("meta")
            .and_then(|meta| meta.get(field))
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string()
    };
    SubscriptionNotification {
        subscription_id: subscription.subscription_id.clone(),
        tenant_id: string_field(resource, "_tenantId"),
        channel_type: subscription.channel_type.clone(),
        endpoint: subscription.endpoint.clone(),
        channel_payload: subscription.channel_payload.clone(),
        channel_header: subscription.channel_header.clone(),
        matched_resource: MatchedResource {
            id: resource_id(resource).unwrap_or_default(),
            resource_type: string_field(resource, "resourceType").unwrap_or_default(),
            version_id: meta_field("versionId"),
            last_updated: meta_field("lastUpdated"),
        },
    }
}

/// Filters stream records down to the resource documents subscriptions
/// can match.
///
/// Deletes never match. Create and update records must carry the new
/// document image with `documentStatus` of `AVAILABLE`; anything else
/// is still in flight or already superseded.
pub fn eligible_resources(records: &[ChangeRecord]) -> Vec<Value> {
    records
        .iter()
        .filter_map(|record| {
            if record.kind == ChangeEventKind::Delete {
                // Subscriptions never match deleted resources
                return None;
            }
            let Some(resource) = &record.new_image else {
                tracing::error!(
                    "new image is missing from change record. The record will be dropped. Is the stream correctly configured?"
                );
                return None;
            };
            if resource.get("documentStatus").and_then(Value::as_str) != Some("AVAILABLE") {
                return None;
            }
            Some(resource.clone())
        })
        .collect()
}

/// Matches one resource against every active subscription, returning a
/// notification per hit.
pub fn matching_subscriptions(
    subscriptions: &[Subscription],
    resource: &Value,
    options: &MatchOptions,
) -> Vec<SubscriptionNotification> {
    subscriptions
        .iter()
        .filter(|subscription| match_parsed_query(&subscription.parsed_criteria, resource, options))
        .map(|subscription| build_notification(subscription, resource))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use lantern_search::registry::{
        SearchParamType, SearchParameterDefinition, StaticSearchParameterRegistry,
    };
    use serde_json::json;

    fn registry() -> StaticSearchParameterRegistry {
        let mut registry = StaticSearchParameterRegistry::new();
        registry.register(SearchParameterDefinition::new(
            "http://hl7.org/fhir/SearchParameter/Patient-name",
            "name",
            "Patient",
            SearchParamType::String,
            "name",
        ));
        registry
    }

    fn subscription_resource() -> Value {
        json!({
            "resourceType": "Subscription",
            "id": "sub-1",
            "criteria": "Patient?name=John",
            "channel": {
                "type": "rest-hook",
                "endpoint": "https://endpoint.example.com/notify",
                "payload": "application/fhir+json",
                "header": ["Authorization: Bearer secret-token"],
            },
        })
    }

    #[test]
    fn test_parse_subscription() {
        let subscription = parse_subscription(&registry(), &subscription_resource()).unwrap();
        assert_eq!(subscription.subscription_id, "sub-1");
        assert_eq!(subscription.tenant_id, None);
        assert_eq!(subscription.channel_type, "rest-hook");
        assert_eq!(subscription.endpoint, "https://endpoint.example.com/notify");
        assert_eq!(subscription.channel_payload, "application/fhir+json");
        assert_eq!(
            subscription.channel_header,
            vec!["Authorization: Bearer secret-token".to_string()]
        );
        assert_eq!(subscription.parsed_criteria.resource_type, "Patient");
        assert_eq!(subscription.parsed_criteria.search_params.len(), 1);
    }

    #[test]
    fn test_parse_subscription_missing_criteria() {
        let mut resource = subscription_resource();
        resource.as_object_mut().unwrap().remove("criteria");
        let err = parse_subscription(&registry(), &resource).unwrap_err();
        assert!(err.to_string().contains("criteria"));
    }

    #[test]
    fn test_tenant_scoped_subscription_id() {
        let mut resource = subscription_resource();
        resource["_tenantId"] = json!("tenant-a");
        resource["_id"] = json!("tenant-a|sub-1");
        let subscription = parse_subscription(&registry(), &resource).unwrap();
        assert_eq!(subscription.subscription_id, "tenant-a|sub-1");
        assert_eq!(subscription.tenant_id.as_deref(), Some("tenant-a"));
    }

    #[test]
    fn test_build_notification() {
        let subscription = parse_subscription(&registry(), &subscription_resource()).unwrap();
        let resource = json!({
            "resourceType": "Patient",
            "id": "pat-1",
            "meta": { "versionId": "3", "lastUpdated": "2021-03-04T05:06:07.890Z" },
        });
        let notification = build_notification(&subscription, &resource);
        assert_eq!(
            notification.matched_resource,
            MatchedResource {
                id: "pat-1".to_string(),
                resource_type: "Patient".to_string(),
                version_id: "3".to_string(),
                last_updated: "2021-03-04T05:06:07.890Z".to_string(),
            }
        );
    }

    #[test]
    fn test_eligible_resources() {
        let available = json!({
            "resourceType": "Patient",
            "id": "pat-1",
            "documentStatus": "AVAILABLE",
        });
        let records = vec![
            ChangeRecord {
                kind: ChangeEventKind::Create,
                new_image: Some(available.clone()),
            },
            ChangeRecord {
                kind: ChangeEventKind::Delete,
                new_image: Some(available.clone()),
            },
            ChangeRecord {
                kind: ChangeEventKind::Update,
                new_image: None,
            },
            ChangeRecord {
                kind: ChangeEventKind::Update,
                new_image: Some(json!({
                    "resourceType": "Patient",
                    "id": "pat-2",
                    "documentStatus": "PENDING",
                })),
            },
        ];
        assert_eq!(eligible_resources(&records), vec![available]);
    }

    #[test]
    fn test_matching_subscriptions() {
        let subscription = parse_subscription(&registry(), &subscription_resource()).unwrap();
        let matching = json!({
            "resourceType": "Patient",
            "id": "pat-1",
            "name": [{ "given": ["John"] }],
        });
        let not_matching = json!({
            "resourceType": "Patient",
            "id": "pat-2",
            "name": [{ "given": ["Anna"] }],
        });
        let subscriptions = vec![subscription];
        let options = MatchOptions::default();
        let hits = matching_subscriptions(&subscriptions, &matching, &options);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].subscription_id, "sub-1");
        assert!(matching_subscriptions(&subscriptions, &not_matching, &options).is_empty());
    }
}

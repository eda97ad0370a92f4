extern crate serde;

use crate::cloudflare::requests::Request;
use crate::results::{ServerMetadata, NOT_AVAILABLE};
use chrono::Utc;
use serde::{Deserialize, Deserializer, Serialize};
use std::borrow::Cow;

/// Cloudflare datacenter (colo) information.
///
/// Older deployments send the bare IATA code, newer ones an object.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub(crate) enum Colo {
    Code(String),
    Detailed {
        /// IATA airport code for the datacenter location
        iata: String,
    },
}

impl Colo {
    pub fn into_iata(self) -> String {
        match self {
            Colo::Code(iata) | Colo::Detailed { iata } => iata,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct Meta {
    pub hostname: String,
    #[serde(rename = "clientIp")]
    pub client_ip: String,
    #[serde(rename = "httpProtocol")]
    pub http_protocol: String,
    pub asn: i64,
    #[serde(rename = "asOrganization")]
    pub as_organization: String,
    pub colo: Colo,
    pub country: String,
    #[serde(default = "not_available", deserialize_with = "or_not_available")]
    pub city: String,
    #[serde(default = "not_available", deserialize_with = "or_not_available")]
    pub region: String,
    #[serde(
        rename = "postalCode",
        default = "not_available",
        deserialize_with = "or_not_available"
    )]
    pub postal_code: String,
    #[serde(deserialize_with = "string_or_number")]
    pub latitude: String,
    #[serde(deserialize_with = "string_or_number")]
    pub longitude: String,
}

fn not_available() -> String {
    NOT_AVAILABLE.to_string()
}

fn or_not_available<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_else(not_available))
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Wire {
        Text(String),
        Number(f64),
    }

    Ok(match Wire::deserialize(deserializer)? {
        Wire::Text(text) => text,
        Wire::Number(number) => number.to_string(),
    })
}

impl From<Meta> for ServerMetadata {
    fn from(meta: Meta) -> Self {
        let is_ipv6 = meta.client_ip.contains(':');

        ServerMetadata {
            hostname: meta.hostname,
            client_ip: meta.client_ip,
            http_protocol: meta.http_protocol,
            asn: meta.asn,
            isp: meta.as_organization,
            colo: meta.colo.into_iata(),
            country: meta.country,
            city: meta.city,
            region: meta.region,
            postal_code: meta.postal_code,
            latitude: meta.latitude,
            longitude: meta.longitude,
            is_ipv6,
            date: Utc::now(),
        }
    }
}

pub(crate) struct MetaRequest {}

impl Request for MetaRequest {
    type Response = Meta;

    fn endpoint(&'_ self) -> Cow<'_, str> {
        "/meta".into()
    }
}

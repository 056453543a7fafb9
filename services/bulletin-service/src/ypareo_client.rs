//! Yparéo API Client
//!
//! Roster, group and absence lookups plus document import.

use bulletin_models::{Absence, Apprenant, Groupe, SisDocument};
use bulletin_utils::{BulletinError, BulletinResult, YpareoConfig};
use reqwest::{redirect::Policy, Client, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::time::Duration;

const SERVICE: &str = "Yparéo";
const AUTH_HEADER: &str = "X-Auth-Token";

/// Everything the merge stage reads from the SIS, fetched once per request.
#[derive(Debug, Clone, Default)]
pub struct SisSnapshot {
    pub apprenants: Vec<Apprenant>,
    pub groupes: Vec<Groupe>,
    pub absences: Vec<Absence>,
}

pub struct YpareoClient {
    client: Client,
    config: YpareoConfig,
}

impl YpareoClient {
    pub fn new(config: &YpareoConfig) -> BulletinResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .redirect(Policy::limited(10))
            .build()
            .map_err(|e| BulletinError::configuration(format!("HTTP client: {}", e)))?;

        Ok(Self {
            client,
            config: config.clone(),
        })
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), endpoint)
    }

    /// GETs an endpoint whose body must be a JSON object keyed by record id.
    async fn fetch_object(&self, endpoint: &str) -> BulletinResult<Map<String, Value>> {
        let response = self
            .client
            .get(self.url(endpoint))
            .header(AUTH_HEADER, &self.config.api_token)
            .header("Accept", "application/json")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(BulletinError::external_service(SERVICE, Some(status.as_u16()), body));
        }

        let body: Value = response.json().await.map_err(|e| {
            BulletinError::unexpected_response(format!("{} returned invalid JSON: {}", endpoint, e))
        })?;

        into_object(endpoint, body)
    }

    async fn fetch_records<T: DeserializeOwned>(&self, endpoint: &str) -> BulletinResult<Vec<T>> {
        let object = self.fetch_object(endpoint).await?;
        parse_records(endpoint, object)
    }

    pub async fn fetch_apprenants(&self) -> BulletinResult<Vec<Apprenant>> {
        let endpoint = format!(
            "/r/v1/formation-longue/apprenants?codesPeriode={}",
            self.config.period_code
        );
        self.fetch_records(&endpoint).await
    }

    pub async fn fetch_groupes(&self) -> BulletinResult<Vec<Groupe>> {
        self.fetch_records("/r/v1/formation-longue/groupes").await
    }

    pub async fn fetch_absences(&self) -> BulletinResult<Vec<Absence>> {
        let endpoint = format!(
            "/r/v1/absences/{}/{}",
            self.config.absences_from, self.config.absences_to
        );
        self.fetch_records(&endpoint).await
    }

    pub async fn fetch_snapshot(&self) -> BulletinResult<SisSnapshot> {
        let apprenants = self.fetch_apprenants().await?;
        let groupes = self.fetch_groupes().await?;
        let absences = self.fetch_absences().await?;

        tracing::info!(
            apprenants = apprenants.len(),
            groupes = groupes.len(),
            absences = absences.len(),
            "Fetched Yparéo data"
        );

        Ok(SisSnapshot {
            apprenants,
            groupes,
            absences,
        })
    }

    /// Attaches a document to a learner's file. Anything but 200 is a failure.
    pub async fn import_document(
        &self,
        code_apprenant: &str,
        document: &SisDocument,
    ) -> BulletinResult<()> {
        let endpoint = format!(
            "/r/v1/document/apprenant/{}/document?codeRepertoire={}",
            code_apprenant, self.config.document_directory
        );

        let response = self
            .client
            .post(self.url(&endpoint))
            .header(AUTH_HEADER, &self.config.api_token)
            .json(document)
            .send()
            .await?;

        let status = response.status();
        if status != StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            return Err(BulletinError::external_service(SERVICE, Some(status.as_u16()), body));
        }

        tracing::info!(code_apprenant, document = %document.nom_document, "Imported document");
        Ok(())
    }
}

fn into_object(endpoint: &str, body: Value) -> BulletinResult<Map<String, Value>> {
    match body {
        Value::Object(map) => Ok(map),
        other => Err(BulletinError::unexpected_response(format!(
            "{} returned {} instead of an object",
            endpoint,
            json_kind(&other)
        ))),
    }
}

fn parse_records<T: DeserializeOwned>(
    endpoint: &str,
    object: Map<String, Value>,
) -> BulletinResult<Vec<T>> {
    object
        .into_iter()
        .map(|(key, value)| {
            serde_json::from_value(value).map_err(|e| {
                BulletinError::unexpected_response(format!("{} record {}: {}", endpoint, key, e))
            })
        })
        .collect()
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_non_object_body_fails_loudly() {
        let err = into_object("/groupes", json!([{"codeGroupe": 1}])).unwrap_err();
        assert_eq!(err.http_status_code(), 400);
        assert_eq!(err.error_code(), "UNEXPECTED_RESPONSE");
        assert!(err.to_string().contains("an array"));
    }

    #[test]
    fn test_records_are_read_from_object_values() {
        let body = json!({
            "101": {
                "codeApprenant": 69992,
                "nomApprenant": "DUPONT",
                "prenomApprenant": "Marie",
                "inscriptions": [{"site": {"nomSite": "Paris"}}],
                "informationsCourantes": {"codeGroupe": "42"}
            }
        });
        let object = into_object("/apprenants", body).unwrap();
        let apprenants: Vec<Apprenant> = parse_records("/apprenants", object).unwrap();

        assert_eq!(apprenants.len(), 1);
        assert_eq!(apprenants[0].full_name(), "DUPONTMarie");
        assert_eq!(apprenants[0].site_name(), Some("Paris"));
        assert_eq!(apprenants[0].group_code().as_deref(), Some("42"));
    }

    #[test]
    fn test_malformed_record_is_reported() {
        let object = into_object("/absences", json!({"1": {"isJustifie": "yes"}})).unwrap();
        let err = parse_records::<Absence>("/absences", object).unwrap_err();
        assert_eq!(err.error_code(), "UNEXPECTED_RESPONSE");
    }

    #[test]
    fn test_url_joins_base_and_endpoint() {
        let config = YpareoConfig {
            base_url: "https://sis.example/index.php/".to_string(),
            ..bulletin_utils::AppConfig::default().ypareo
        };
        let client = YpareoClient::new(&config).unwrap();
        assert_eq!(
            client.url("/r/v1/formation-longue/groupes"),
            "https://sis.example/index.php/r/v1/formation-longue/groupes"
        );
    }
}

//! Records exchanged with the Yparéo student-information system.

use serde::{Deserialize, Serialize};
use std::fmt;
use validator::Validate;

/// Scalar as the SIS sends it: codes and durations arrive as numbers or strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SisValue {
    Int(i64),
    Float(f64),
    Text(String),
}

impl SisValue {
    /// Integer view used for durations; unparseable text counts as 0.
    pub fn as_i64(&self) -> i64 {
        match self {
            Self::Int(v) => *v,
            Self::Float(v) => *v as i64,
            Self::Text(s) => {
                let trimmed = s.trim();
                trimmed
                    .parse::<i64>()
                    .or_else(|_| trimmed.parse::<f64>().map(|f| f as i64))
                    .unwrap_or(0)
            }
        }
    }
}

impl fmt::Display for SisValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(v) => write!(f, "{}", v),
            Self::Float(v) if v.fract() == 0.0 => write!(f, "{}", *v as i64),
            Self::Float(v) => write!(f, "{}", v),
            Self::Text(s) => f.write_str(s),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Apprenant {
    #[serde(default)]
    pub code_apprenant: Option<SisValue>,
    #[serde(default)]
    pub nom_apprenant: Option<String>,
    #[serde(default)]
    pub prenom_apprenant: Option<String>,
    #[serde(default)]
    pub date_naissance: Option<String>,
    #[serde(default)]
    pub inscriptions: Option<Vec<Inscription>>,
    #[serde(default)]
    pub informations_courantes: Option<InformationsCourantes>,
}

impl Apprenant {
    /// Last name immediately followed by first name, as matched against sheet names.
    pub fn full_name(&self) -> String {
        format!(
            "{}{}",
            self.nom_apprenant.as_deref().unwrap_or(""),
            self.prenom_apprenant.as_deref().unwrap_or("")
        )
    }

    pub fn site_name(&self) -> Option<&str> {
        self.inscriptions
            .as_ref()
            .and_then(|i| i.first())
            .and_then(|i| i.site.as_ref())
            .and_then(|s| s.nom_site.as_deref())
    }

    pub fn group_code(&self) -> Option<String> {
        self.informations_courantes
            .as_ref()
            .and_then(|i| i.code_groupe.as_ref())
            .map(|c| c.to_string())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Inscription {
    #[serde(default)]
    pub site: Option<Site>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Site {
    #[serde(default)]
    pub nom_site: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InformationsCourantes {
    #[serde(default)]
    pub code_groupe: Option<SisValue>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Groupe {
    #[serde(default)]
    pub code_groupe: Option<SisValue>,
    #[serde(default)]
    pub nom_groupe: Option<String>,
    #[serde(default)]
    pub etendu_groupe: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Absence {
    #[serde(default)]
    pub code_apprenant: Option<SisValue>,
    /// Duration in minutes.
    #[serde(default)]
    pub duree: Option<SisValue>,
    #[serde(default)]
    pub is_justifie: Option<bool>,
    #[serde(default)]
    pub is_retard: Option<bool>,
}

/// Body accepted by the SIS document-import endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SisDocument {
    pub contenu: String,
    pub nom_document: String,
    pub type_mime: String,
    pub extension: String,
}

/// Direct import request received from a client.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ImportDocumentRequest {
    #[validate(length(min = 1))]
    pub contenu: String,
    #[validate(length(min = 1, max = 255))]
    pub nom_document: String,
    #[validate(length(min = 1))]
    pub mime_type: String,
    #[validate(length(min = 1, max = 16))]
    pub extension: String,
}

impl From<ImportDocumentRequest> for SisDocument {
    fn from(request: ImportDocumentRequest) -> Self {
        Self {
            contenu: request.contenu,
            nom_document: request.nom_document,
            type_mime: request.mime_type,
            extension: request.extension,
        }
    }
}

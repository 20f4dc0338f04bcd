use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::catalog::ColumnKey;

// Index values are expected to be strings, but older documents carry numbers
// and booleans in a few fields. Anything scalar is kept as text; null and
// missing both become `None`.
fn lenient<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        Some(Value::Bool(b)) => Some(b.to_string()),
        Some(Value::Array(items)) => {
            let parts: Vec<String> = items
                .into_iter()
                .filter_map(|v| match v {
                    Value::String(s) => Some(s),
                    Value::Number(n) => Some(n.to_string()),
                    _ => None,
                })
                .collect();
            Some(parts.join(", "))
        }
        Some(Value::Object(_)) => None,
    })
}

/// One antibody validation report as stored in the search index.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct Record {
    #[serde(default, deserialize_with = "lenient")]
    pub antibody_uuid: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub antibody_hubmap_id: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub target_symbol: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub target_aliases: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub uniprot_accession_number: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub clonality: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub clone_id: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub method: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub tissue_preservation: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub avr_pdf_filename: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub avr_pdf_uuid: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub omap_id: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub host: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub rrid: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub catalog_number: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub lot_number: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub vendor_name: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub vendor_affiliation: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub recombinant: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub organ: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub organ_uberon_id: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub author_orcids: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub hgnc_id: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub isotype: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub concentration_value: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub dilution_factor: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub conjugate: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub cycle_number: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub fluorescent_reporter: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub manuscript_doi: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub protocol_doi: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub antigen_retrieval: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub created_by_user_displayname: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub created_by_user_email: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub previous_version_id: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub previous_version_pdf_uuid: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub previous_version_pdf_filename: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub next_version_id: Option<String>,
}

fn text(slot: &Option<String>) -> &str {
    slot.as_deref().unwrap_or("")
}

impl Record {
    /// Value backing a table column, empty when the field is absent.
    pub fn field(&self, key: ColumnKey) -> &str {
        text(self.slot(key))
    }

    /// `true` when the field is present at all, even if empty.
    pub fn has(&self, key: ColumnKey) -> bool {
        self.slot(key).is_some()
    }

    fn slot(&self, key: ColumnKey) -> &Option<String> {
        match key {
            ColumnKey::TargetSymbol => &self.target_symbol,
            ColumnKey::UniprotAccessionNumber => &self.uniprot_accession_number,
            ColumnKey::Clonality => &self.clonality,
            ColumnKey::CloneId => &self.clone_id,
            ColumnKey::Method => &self.method,
            ColumnKey::TissuePreservation => &self.tissue_preservation,
            ColumnKey::AvrPdfFilename => &self.avr_pdf_filename,
            ColumnKey::OmapId => &self.omap_id,
            ColumnKey::AntibodyHubmapId => &self.antibody_hubmap_id,
            ColumnKey::Host => &self.host,
            ColumnKey::Rrid => &self.rrid,
            ColumnKey::CatalogNumber => &self.catalog_number,
            ColumnKey::LotNumber => &self.lot_number,
            ColumnKey::VendorName => &self.vendor_name,
            ColumnKey::Recombinant => &self.recombinant,
            ColumnKey::Organ => &self.organ,
            ColumnKey::AuthorOrcids => &self.author_orcids,
            ColumnKey::HgncId => &self.hgnc_id,
            ColumnKey::Isotype => &self.isotype,
            ColumnKey::ConcentrationValue => &self.concentration_value,
            ColumnKey::DilutionFactor => &self.dilution_factor,
            ColumnKey::Conjugate => &self.conjugate,
            ColumnKey::CycleNumber => &self.cycle_number,
            ColumnKey::FluorescentReporter => &self.fluorescent_reporter,
            ColumnKey::ManuscriptDoi => &self.manuscript_doi,
            ColumnKey::ProtocolDoi => &self.protocol_doi,
            ColumnKey::VendorAffiliation => &self.vendor_affiliation,
            ColumnKey::OrganUberonId => &self.organ_uberon_id,
            ColumnKey::AntigenRetrieval => &self.antigen_retrieval,
            ColumnKey::CreatedByUserEmail => &self.created_by_user_email,
            ColumnKey::PreviousVersionId => &self.previous_version_id,
        }
    }

    pub fn avr_pdf_uuid(&self) -> &str {
        text(&self.avr_pdf_uuid)
    }

    pub fn previous_version_pdf_uuid(&self) -> &str {
        text(&self.previous_version_pdf_uuid)
    }

    pub fn previous_version_pdf_filename(&self) -> Option<&str> {
        self.previous_version_pdf_filename.as_deref()
    }
}

/// A search hit: the backend's document id plus its source record.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct Hit {
    #[serde(rename = "_id", default)]
    pub id: String,
    #[serde(rename = "_source", default)]
    pub source: Record,
}

impl Hit {
    pub fn new(id: impl Into<String>, source: Record) -> Self {
        Self {
            id: id.into(),
            source,
        }
    }
}

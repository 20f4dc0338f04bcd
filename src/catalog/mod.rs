use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CatalogError {
    #[error("unknown column '{key}'")]
    UnknownColumn { key: String },

    #[error("column '{key}' is always shown and cannot be toggled")]
    CoreColumn { key: String },
}

// Every column the results table knows about. Declaration order is the
// canonical column order shared by the table and the export.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnKey {
    TargetSymbol,
    UniprotAccessionNumber,
    Clonality,
    CloneId,
    Method,
    TissuePreservation,
    AvrPdfFilename,
    OmapId,
    AntibodyHubmapId,
    Host,
    Rrid,
    CatalogNumber,
    LotNumber,
    VendorName,
    Recombinant,
    Organ,
    AuthorOrcids,
    HgncId,
    Isotype,
    ConcentrationValue,
    DilutionFactor,
    Conjugate,
    CycleNumber,
    FluorescentReporter,
    ManuscriptDoi,
    ProtocolDoi,
    VendorAffiliation,
    OrganUberonId,
    AntigenRetrieval,
    CreatedByUserEmail,
    PreviousVersionId,
}

impl ColumnKey {
    pub const ALL: [ColumnKey; 31] = [
        ColumnKey::TargetSymbol,
        ColumnKey::UniprotAccessionNumber,
        ColumnKey::Clonality,
        ColumnKey::CloneId,
        ColumnKey::Method,
        ColumnKey::TissuePreservation,
        ColumnKey::AvrPdfFilename,
        ColumnKey::OmapId,
        ColumnKey::AntibodyHubmapId,
        ColumnKey::Host,
        ColumnKey::Rrid,
        ColumnKey::CatalogNumber,
        ColumnKey::LotNumber,
        ColumnKey::VendorName,
        ColumnKey::Recombinant,
        ColumnKey::Organ,
        ColumnKey::AuthorOrcids,
        ColumnKey::HgncId,
        ColumnKey::Isotype,
        ColumnKey::ConcentrationValue,
        ColumnKey::DilutionFactor,
        ColumnKey::Conjugate,
        ColumnKey::CycleNumber,
        ColumnKey::FluorescentReporter,
        ColumnKey::ManuscriptDoi,
        ColumnKey::ProtocolDoi,
        ColumnKey::VendorAffiliation,
        ColumnKey::OrganUberonId,
        ColumnKey::AntigenRetrieval,
        ColumnKey::CreatedByUserEmail,
        ColumnKey::PreviousVersionId,
    ];

    /// The backend field name, which is also the export header and the
    /// persisted preference key.
    pub fn as_str(self) -> &'static str {
        match self {
            ColumnKey::TargetSymbol => "target_symbol",
            ColumnKey::UniprotAccessionNumber => "uniprot_accession_number",
            ColumnKey::Clonality => "clonality",
            ColumnKey::CloneId => "clone_id",
            ColumnKey::Method => "method",
            ColumnKey::TissuePreservation => "tissue_preservation",
            ColumnKey::AvrPdfFilename => "avr_pdf_filename",
            ColumnKey::OmapId => "omap_id",
            ColumnKey::AntibodyHubmapId => "antibody_hubmap_id",
            ColumnKey::Host => "host",
            ColumnKey::Rrid => "rrid",
            ColumnKey::CatalogNumber => "catalog_number",
            ColumnKey::LotNumber => "lot_number",
            ColumnKey::VendorName => "vendor_name",
            ColumnKey::Recombinant => "recombinant",
            ColumnKey::Organ => "organ",
            ColumnKey::AuthorOrcids => "author_orcids",
            ColumnKey::HgncId => "hgnc_id",
            ColumnKey::Isotype => "isotype",
            ColumnKey::ConcentrationValue => "concentration_value",
            ColumnKey::DilutionFactor => "dilution_factor",
            ColumnKey::Conjugate => "conjugate",
            ColumnKey::CycleNumber => "cycle_number",
            ColumnKey::FluorescentReporter => "fluorescent_reporter",
            ColumnKey::ManuscriptDoi => "manuscript_doi",
            ColumnKey::ProtocolDoi => "protocol_doi",
            ColumnKey::VendorAffiliation => "vendor_affiliation",
            ColumnKey::OrganUberonId => "organ_uberon_id",
            ColumnKey::AntigenRetrieval => "antigen_retrieval",
            ColumnKey::CreatedByUserEmail => "created_by_user_email",
            ColumnKey::PreviousVersionId => "previous_version_id",
        }
    }

    pub fn descriptor(self) -> &'static FieldDescriptor {
        &DESCRIPTORS[self as usize]
    }

    pub fn label(self) -> &'static str {
        self.descriptor().label
    }

    pub fn is_optional(self) -> bool {
        self.descriptor().optional
    }

    /// Parse a user-supplied key and require it to be a toggleable column.
    pub fn parse_optional(value: &str) -> Result<Self, CatalogError> {
        let key: ColumnKey = value.parse()?;
        if !key.is_optional() {
            return Err(CatalogError::CoreColumn {
                key: key.as_str().to_string(),
            });
        }
        Ok(key)
    }
}

impl fmt::Display for ColumnKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ColumnKey {
    type Err = CatalogError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let wanted = value.trim().to_lowercase();
        ColumnKey::ALL
            .iter()
            .copied()
            .find(|k| k.as_str() == wanted)
            .ok_or_else(|| CatalogError::UnknownColumn {
                key: value.trim().to_string(),
            })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LinkTemplate {
    pub prefix: &'static str,
    pub suffix: &'static str,
}

impl LinkTemplate {
    pub const fn new(prefix: &'static str, suffix: &'static str) -> Self {
        Self { prefix, suffix }
    }

    pub fn url(&self, value: &str) -> String {
        format!("{}{}{}", self.prefix, value, self.suffix)
    }
}

pub const UNIPROT_PROTEIN: LinkTemplate = LinkTemplate::new(
    "https://www.uniprot.org/uniprotkb?query=(protein_name:%22",
    "%22)",
);
pub const UNIPROT_ACCESSION: LinkTemplate =
    LinkTemplate::new("https://www.uniprot.org/uniprot/", "#section_general");
pub const SCICRUNCH_RRID: LinkTemplate =
    LinkTemplate::new("https://scicrunch.org/resolver/RRID:", "");
pub const ORCID: LinkTemplate = LinkTemplate::new("https://orcid.org/", "");
pub const GENENAMES: LinkTemplate =
    LinkTemplate::new("https://www.genenames.org/tools/search/#!/?query=", "");
pub const DOI: LinkTemplate = LinkTemplate::new("https://doi.org/", "");
pub const OLS_SEARCH: LinkTemplate = LinkTemplate::new("https://www.ebi.ac.uk/ols/search?q=", "");

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RenderMode {
    Plain,
    /// Comma separated values, one hyperlink per element.
    MultiLinkList(LinkTemplate),
    /// A single hyperlink, or nothing when the value is empty.
    ConditionalLink(LinkTemplate),
    /// Asset link built from `avr_pdf_uuid` + `avr_pdf_filename`.
    DerivedAssetLink,
    /// Asset link for the previous revision's report, labelled by the
    /// revision id. The legacy asset layout has no hyphens in the uuid.
    LegacyRevisionLink,
    EmailLink,
    /// Ontology ids: `:` is percent-encoded in the href only.
    IdentifierEscapedLink(LinkTemplate),
    /// Curated ids that link only when present in a fixed table.
    CatalogLink,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FieldDescriptor {
    pub key: ColumnKey,
    pub label: &'static str,
    pub mode: RenderMode,
    pub optional: bool,
    pub default_visible: bool,
}

const fn core(key: ColumnKey, label: &'static str, mode: RenderMode) -> FieldDescriptor {
    FieldDescriptor {
        key,
        label,
        mode,
        optional: false,
        default_visible: true,
    }
}

const fn optional(key: ColumnKey, label: &'static str, mode: RenderMode) -> FieldDescriptor {
    FieldDescriptor {
        key,
        label,
        mode,
        optional: true,
        default_visible: false,
    }
}

pub static DESCRIPTORS: [FieldDescriptor; 31] = [
    core(
        ColumnKey::TargetSymbol,
        "Target Symbol",
        RenderMode::MultiLinkList(UNIPROT_PROTEIN),
    ),
    core(
        ColumnKey::UniprotAccessionNumber,
        "UniProt#",
        RenderMode::MultiLinkList(UNIPROT_ACCESSION),
    ),
    core(ColumnKey::Clonality, "Clonality", RenderMode::Plain),
    optional(ColumnKey::CloneId, "Clone ID", RenderMode::Plain),
    core(ColumnKey::Method, "Method", RenderMode::Plain),
    core(
        ColumnKey::TissuePreservation,
        "Tissue Preservation",
        RenderMode::Plain,
    ),
    core(
        ColumnKey::AvrPdfFilename,
        "Validation Report",
        RenderMode::DerivedAssetLink,
    ),
    core(ColumnKey::OmapId, "OMAP ID", RenderMode::CatalogLink),
    core(ColumnKey::AntibodyHubmapId, "HuBMAP ID", RenderMode::Plain),
    optional(ColumnKey::Host, "Host", RenderMode::Plain),
    optional(
        ColumnKey::Rrid,
        "RRID",
        RenderMode::ConditionalLink(SCICRUNCH_RRID),
    ),
    optional(ColumnKey::CatalogNumber, "Catalog#", RenderMode::Plain),
    optional(ColumnKey::LotNumber, "Lot#", RenderMode::Plain),
    optional(ColumnKey::VendorName, "Vendor", RenderMode::Plain),
    optional(ColumnKey::Recombinant, "Recombinant", RenderMode::Plain),
    optional(ColumnKey::Organ, "Organ", RenderMode::Plain),
    optional(
        ColumnKey::AuthorOrcids,
        "Author ORCiDs",
        RenderMode::MultiLinkList(ORCID),
    ),
    optional(
        ColumnKey::HgncId,
        "HGNC ID",
        RenderMode::MultiLinkList(GENENAMES),
    ),
    optional(ColumnKey::Isotype, "Isotype", RenderMode::Plain),
    optional(
        ColumnKey::ConcentrationValue,
        "Concentration",
        RenderMode::Plain,
    ),
    optional(ColumnKey::DilutionFactor, "Dilution Factor", RenderMode::Plain),
    optional(ColumnKey::Conjugate, "Conjugate", RenderMode::Plain),
    optional(ColumnKey::CycleNumber, "Cycle#", RenderMode::Plain),
    optional(
        ColumnKey::FluorescentReporter,
        "Fluorescent Reporter",
        RenderMode::Plain,
    ),
    optional(
        ColumnKey::ManuscriptDoi,
        "Manuscript DOI",
        RenderMode::ConditionalLink(DOI),
    ),
    optional(
        ColumnKey::ProtocolDoi,
        "Protocol DOI",
        RenderMode::MultiLinkList(DOI),
    ),
    optional(
        ColumnKey::VendorAffiliation,
        "Vendor Affiliation",
        RenderMode::Plain,
    ),
    optional(
        ColumnKey::OrganUberonId,
        "Organ UBERON ID",
        RenderMode::IdentifierEscapedLink(OLS_SEARCH),
    ),
    optional(
        ColumnKey::AntigenRetrieval,
        "Antigen Retrieval",
        RenderMode::Plain,
    ),
    optional(
        ColumnKey::CreatedByUserEmail,
        "Submitter Email",
        RenderMode::EmailLink,
    ),
    core(
        ColumnKey::PreviousVersionId,
        "Previous Revision ID",
        RenderMode::LegacyRevisionLink,
    ),
];

pub fn descriptors() -> &'static [FieldDescriptor] {
    &DESCRIPTORS
}

pub fn optional_columns() -> impl Iterator<Item = ColumnKey> {
    ColumnKey::ALL.into_iter().filter(|k| k.is_optional())
}

pub fn core_columns() -> impl Iterator<Item = ColumnKey> {
    ColumnKey::ALL.into_iter().filter(|k| !k.is_optional())
}

/// Default visibility of every optional column.
pub fn default_visibility() -> impl Iterator<Item = (ColumnKey, bool)> {
    DESCRIPTORS
        .iter()
        .filter(|d| d.optional)
        .map(|d| (d.key, d.default_visible))
}

// Organ Mapping Antibody Panels and their persistent URLs (HRA 7th release).
pub const OMAP_LINKAGE: [(&str, &str); 30] = [
    ("OMAP-1", "https://purl.humanatlas.io/omap/1-human-lymph-node-ibex"),
    ("OMAP-2", "https://purl.humanatlas.io/omap/2-intestine-codex"),
    ("OMAP-3", "https://purl.humanatlas.io/omap/3-kidney-codex"),
    ("OMAP-4", "https://purl.humanatlas.io/omap/4-skin-cell-dive"),
    ("OMAP-5", "https://purl.humanatlas.io/omap/5-liver-sims"),
    ("OMAP-6", "https://purl.humanatlas.io/omap/6-pancreas-codex"),
    ("OMAP-7", "https://purl.humanatlas.io/omap/7-lung-cell-dive"),
    ("OMAP-8", "https://purl.humanatlas.io/omap/8-placenta-full-term-imc"),
    ("OMAP-9", "https://purl.humanatlas.io/omap/9-kidney-codex"),
    ("OMAP-10", "https://purl.humanatlas.io/omap/10-palatine-tonsil-mics"),
    ("OMAP-11", "https://purl.humanatlas.io/omap/11-spleen-ibex"),
    ("OMAP-12", "https://purl.humanatlas.io/omap/12-eye-retina-ibex"),
    ("OMAP-13", "https://purl.humanatlas.io/omap/13-pancreas-codex"),
    ("OMAP-14", "https://purl.humanatlas.io/omap/14-kidney-cycif"),
    ("OMAP-15", "https://purl.humanatlas.io/omap/15-intestine-codex"),
    ("OMAP-16", "https://purl.humanatlas.io/omap/16-lung-codex"),
    ("OMAP-17", "https://purl.humanatlas.io/omap/17-thymus-ibex"),
    ("OMAP-18", "https://purl.humanatlas.io/omap/18-lymph-node-cell-dive-ibex"),
    ("OMAP-19", "https://purl.humanatlas.io/omap/19-palatine-tonsil-ibex"),
    ("OMAP-20", "https://purl.humanatlas.io/omap/20-kidney-ims-cycif"),
    ("OMAP-21", "https://purl.humanatlas.io/omap/21-palatine-tonsil-mics"),
    ("OMAP-22", "https://purl.humanatlas.io/omap/22-skin-cell-dive"),
    ("OMAP-23", "https://purl.humanatlas.io/omap/23-vermiform-appendix-mics"),
    ("OMAP-24", "https://purl.humanatlas.io/omap/24-pancreas-cycif"),
    ("OMAP-25", "https://purl.humanatlas.io/omap/25-lung-codex"),
    ("OMAP-26", "https://purl.humanatlas.io/omap/26-kidney-codex"),
    ("OMAP-27", "https://purl.humanatlas.io/omap/27-kidney-ims-codex"),
    ("OMAP-28", "https://purl.humanatlas.io/omap/28-heart-codex"),
    ("OMAP-29", "https://purl.humanatlas.io/omap/29-mouth-mucosa-codex"),
    ("OMAP-30", "https://purl.humanatlas.io/omap/30-salivary-gland-codex"),
];

pub fn omap_purl(omap_id: &str) -> Option<&'static str> {
    OMAP_LINKAGE
        .iter()
        .find(|(id, _)| *id == omap_id)
        .map(|(_, url)| *url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn descriptors_follow_key_order() {
        for (idx, key) in ColumnKey::ALL.iter().enumerate() {
            assert_eq!(DESCRIPTORS[idx].key, *key);
            assert_eq!(*key as usize, idx);
        }
    }

    #[test]
    fn keys_round_trip_through_names() {
        for key in ColumnKey::ALL {
            assert_eq!(key.as_str().parse::<ColumnKey>().unwrap(), key);
        }
        assert_eq!(" Lot_Number ".parse::<ColumnKey>().unwrap(), ColumnKey::LotNumber);
    }

    #[test]
    fn unknown_key_is_rejected() {
        assert_eq!(
            "next_version_id".parse::<ColumnKey>(),
            Err(CatalogError::UnknownColumn {
                key: "next_version_id".to_string()
            })
        );
    }

    #[test]
    fn core_columns_cannot_be_parsed_as_optional() {
        assert!(matches!(
            ColumnKey::parse_optional("antibody_hubmap_id"),
            Err(CatalogError::CoreColumn { .. })
        ));
        assert_eq!(ColumnKey::parse_optional("rrid").unwrap(), ColumnKey::Rrid);
    }

    #[test]
    fn optional_and_core_partition_the_catalog() {
        assert_eq!(optional_columns().count(), 22);
        assert_eq!(core_columns().count(), 9);
        assert!(default_visibility().all(|(_, visible)| !visible));
    }

    #[test]
    fn omap_lookup() {
        assert_eq!(
            omap_purl("OMAP-3"),
            Some("https://purl.humanatlas.io/omap/3-kidney-codex")
        );
        assert_eq!(omap_purl("OMAP-99"), None);
    }
}

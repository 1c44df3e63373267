//! Column names of the bilingual tender feed, and the fallback order for
//! logical fields that exist in both languages.
//!
//! The feed uses `<english>-<french>[-eng|-fra]` column names. Anything not
//! named here is passed through opaquely.

/// A logical field backed by one or more columns, tried in order.
#[derive(Debug, Clone, Copy)]
pub struct FieldFallback {
    /// Human-readable name of the logical field.
    pub name: &'static str,
    /// Columns tried in order; the first non-blank value wins.
    pub columns: &'static [&'static str],
}

pub const REFERENCE_NUMBER: &str = "referenceNumber-numeroReference";
pub const AMENDMENT_NUMBER: &str = "amendmentNumber-numeroModification";
pub const SOLICITATION_NUMBER: &str = "solicitationNumber-numeroSollicitation";
pub const CLOSING_DATE: &str = "tenderClosingDate-appelOffresDateCloture";
pub const PROCUREMENT_CATEGORY: &str = "procurementCategory-categorieApprovisionnement";
pub const UNSPSC: &str = "unspsc";
pub const UNSPSC_DESCRIPTION: &str = "unspscDescription-eng";
pub const GSIN: &str = "gsin-nibs";
pub const GSIN_DESCRIPTION: &str = "gsinDescription-nibsDescription-eng";

pub const TITLE_EN: &str = "title-titre-eng";
pub const TITLE_FR: &str = "title-titre-fra";
pub const DESCRIPTION_EN: &str = "tenderDescription-descriptionAppelOffres-eng";
pub const DESCRIPTION_FR: &str = "tenderDescription-descriptionAppelOffres-fra";
pub const STATUS_EN: &str = "tenderStatus-appelOffresStatut-eng";
pub const STATUS_FR: &str = "tenderStatus-appelOffresStatut-fra";
pub const ENTITY_EN: &str = "contractingEntityName-nomEntitContractante-eng";
pub const ENTITY_FR: &str = "contractingEntityName-nomEntitContractante-fra";
pub const OPPORTUNITY_REGION_EN: &str = "regionsOfOpportunity-regionAppelOffres-eng";
pub const OPPORTUNITY_REGION_FR: &str = "regionsOfOpportunity-regionAppelOffres-fra";
pub const DELIVERY_REGION_EN: &str = "regionsOfDelivery-regionsLivraison-eng";
pub const DELIVERY_REGION_FR: &str = "regionsOfDelivery-regionsLivraison-fra";
pub const NOTICE_URL_EN: &str = "noticeURL-URLavis-eng";
pub const NOTICE_URL_FR: &str = "noticeURL-URLavis-fra";
pub const ATTACHMENT_EN: &str = "attachment-piecesJointes-eng";
pub const ATTACHMENT_FR: &str = "attachment-piecesJointes-fra";

/// Columns concatenated for the region gate.
pub const REGION_COLUMNS: &[&str] = &[
    OPPORTUNITY_REGION_EN,
    OPPORTUNITY_REGION_FR,
    DELIVERY_REGION_EN,
    DELIVERY_REGION_FR,
];

/// Columns concatenated for keyword matching.
pub const TEXT_COLUMNS: &[&str] = &[TITLE_EN, TITLE_FR, DESCRIPTION_EN, DESCRIPTION_FR];

/// Columns holding comma-delimited attachment URLs.
pub const ATTACHMENT_COLUMNS: &[&str] = &[ATTACHMENT_EN, ATTACHMENT_FR];

pub const TITLE: FieldFallback = FieldFallback {
    name: "title",
    columns: &[TITLE_EN, TITLE_FR],
};

pub const STATUS: FieldFallback = FieldFallback {
    name: "status",
    columns: &[STATUS_EN, STATUS_FR],
};

pub const CONTRACTING_ENTITY: FieldFallback = FieldFallback {
    name: "contracting entity",
    columns: &[ENTITY_EN, ENTITY_FR],
};

pub const DELIVERY_REGION: FieldFallback = FieldFallback {
    name: "delivery region",
    columns: &[DELIVERY_REGION_EN, DELIVERY_REGION_FR],
};

pub const OPPORTUNITY_REGION: FieldFallback = FieldFallback {
    name: "opportunity region",
    columns: &[OPPORTUNITY_REGION_EN, OPPORTUNITY_REGION_FR],
};

pub const NOTICE_URL: FieldFallback = FieldFallback {
    name: "notice URL",
    columns: &[NOTICE_URL_EN, NOTICE_URL_FR],
};

/// Record identifier candidates, before the positional fallback.
pub const RECORD_ID: FieldFallback = FieldFallback {
    name: "record id",
    columns: &[REFERENCE_NUMBER, SOLICITATION_NUMBER],
};

pub const MATCH_REGIONS: &str = "match_regions";
pub const MATCH_INDUSTRIES: &str = "match_industries";
pub const MATCH_CODES: &str = "match_codes";
pub const MATCH_CATEGORIES: &str = "match_categories";
pub const MATCH_SOURCES: &str = "match_sources";
pub const MATCH_KEYWORDS: &str = "match_keywords";
pub const ATTACHMENT_URLS: &str = "attachment_urls";
pub const ATTACHMENT_WORKING: &str = "attachment_working";
pub const ATTACHMENT_MISSING: &str = "attachment_missing";
pub const ATTACHMENT_UNCHECKED: &str = "attachment_unchecked";
pub const ATTACHMENT_DOWNLOADED: &str = "attachment_downloaded";

/// Columns appended to every matched row, in output order.
pub const DERIVED_COLUMNS: &[&str] = &[
    MATCH_REGIONS,
    MATCH_INDUSTRIES,
    MATCH_CODES,
    MATCH_CATEGORIES,
    MATCH_SOURCES,
    MATCH_KEYWORDS,
    ATTACHMENT_URLS,
    ATTACHMENT_WORKING,
    ATTACHMENT_MISSING,
    ATTACHMENT_UNCHECKED,
    ATTACHMENT_DOWNLOADED,
];

/// Separator for multi-valued derived columns.
pub const LIST_SEPARATOR: &str = ";";

//! Column role inference from free-text headers.
//!
//! Headers are matched against an ordered list of [`ColumnRule`]s. Each
//! column is classified by the first rule whose tokens it contains
//! (lower-cased, trimmed substring match), so the rule order is the
//! priority order:
//!
//! ```text
//! patient id  →  latitude  →  longitude  →  strain indicator
//! ```
//!
//! Single-slot roles keep the first column that claims them; a later column
//! classified under an already-filled role is left unassigned. Every column
//! classified as a strain indicator is kept, in table order.

use std::fmt;

use serde::Serialize;

use crate::error::ColumnResolutionError;

/// Role a column plays in the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnRole {
    PatientId,
    Latitude,
    Longitude,
    StrainIndicator,
}

impl ColumnRole {
    pub const ALL: [ColumnRole; 4] = [
        ColumnRole::PatientId,
        ColumnRole::Latitude,
        ColumnRole::Longitude,
        ColumnRole::StrainIndicator,
    ];
}

impl fmt::Display for ColumnRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::PatientId => "patient id",
            Self::Latitude => "latitude",
            Self::Longitude => "longitude",
            Self::StrainIndicator => "strain indicator",
        })
    }
}

/// A `(role, predicate)` pair: the header matches when it contains any token.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnRule {
    pub role: ColumnRole,
    tokens: Vec<String>,
}

impl ColumnRule {
    pub fn new<I, S>(role: ColumnRole, tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            role,
            tokens: tokens
                .into_iter()
                .map(|t| t.as_ref().trim().to_lowercase())
                .filter(|t| !t.is_empty())
                .collect(),
        }
    }

    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    pub fn matches(&self, header: &str) -> bool {
        let normalized = normalize_header(header);
        self.tokens.iter().any(|t| normalized.contains(t.as_str()))
    }
}

/// Lower-cased, trimmed header used for matching.
pub fn normalize_header(header: &str) -> String {
    header.trim().to_lowercase()
}

/// Ordered rule list used by [`resolve_columns`].
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnRules {
    rules: Vec<ColumnRule>,
}

impl ColumnRules {
    pub fn new(rules: Vec<ColumnRule>) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &[ColumnRule] {
        &self.rules
    }

    /// Add a header token to the rule for `role`, appending a rule if none exists.
    pub fn with_token(mut self, role: ColumnRole, token: &str) -> Self {
        let extra = ColumnRule::new(role, [token]);
        match self.rules.iter_mut().find(|r| r.role == role) {
            Some(rule) => rule.tokens.extend(extra.tokens),
            None => self.rules.push(extra),
        }
        self
    }

    /// Role of the first rule matching `header`, if any.
    pub fn classify(&self, header: &str) -> Option<ColumnRole> {
        self.rules.iter().find(|r| r.matches(header)).map(|r| r.role)
    }
}

impl Default for ColumnRules {
    fn default() -> Self {
        Self::new(vec![
            ColumnRule::new(ColumnRole::PatientId, ["id", "患者"]),
            ColumnRule::new(ColumnRole::Latitude, ["lat", "纬度"]),
            ColumnRule::new(ColumnRole::Longitude, ["lon", "lng", "经度"]),
            ColumnRule::new(
                ColumnRole::StrainIndicator,
                ["strain", "菌种", "mrsa", "esble", "cro"],
            ),
        ])
    }
}

/// A concrete input column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnRef {
    pub index: usize,
    pub name: String,
}

/// Mapping from role to the columns that carry it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedColumns {
    pub patient_id: ColumnRef,
    pub latitude: ColumnRef,
    pub longitude: ColumnRef,
    /// Never empty; table order.
    pub strain_indicators: Vec<ColumnRef>,
}

/// Infer column roles from headers, or fail naming every unresolved role.
pub fn resolve_columns(
    headers: &[String],
    rules: &ColumnRules,
) -> Result<ResolvedColumns, ColumnResolutionError> {
    let mut patient_id = None;
    let mut latitude = None;
    let mut longitude = None;
    let mut strain_indicators = Vec::new();

    for (index, name) in headers.iter().enumerate() {
        let column = ColumnRef {
            index,
            name: name.clone(),
        };
        match rules.classify(name) {
            Some(ColumnRole::PatientId) => claim(&mut patient_id, column),
            Some(ColumnRole::Latitude) => claim(&mut latitude, column),
            Some(ColumnRole::Longitude) => claim(&mut longitude, column),
            Some(ColumnRole::StrainIndicator) => strain_indicators.push(column),
            None => {}
        }
    }

    match (patient_id, latitude, longitude) {
        (Some(patient_id), Some(latitude), Some(longitude)) if !strain_indicators.is_empty() => {
            Ok(ResolvedColumns {
                patient_id,
                latitude,
                longitude,
                strain_indicators,
            })
        }
        (patient_id, latitude, longitude) => {
            let found = [
                patient_id.is_some(),
                latitude.is_some(),
                longitude.is_some(),
                !strain_indicators.is_empty(),
            ];
            let missing = ColumnRole::ALL
                .into_iter()
                .zip(found)
                .filter(|(_, ok)| !ok)
                .map(|(role, _)| role)
                .collect();
            Err(ColumnResolutionError {
                missing,
                headers: headers.to_vec(),
            })
        }
    }
}

fn claim(slot: &mut Option<ColumnRef>, column: ColumnRef) {
    if slot.is_none() {
        *slot = Some(column);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_resolve_english_headers() {
        let cols = headers(&["Patient_ID", "Latitude", "Longitude", "MRSA", "ESBLE", "CRO"]);
        let resolved = resolve_columns(&cols, &ColumnRules::default()).unwrap();

        assert_eq!(resolved.patient_id.name, "Patient_ID");
        assert_eq!(resolved.latitude.index, 1);
        assert_eq!(resolved.longitude.index, 2);
        let names: Vec<_> = resolved.strain_indicators.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["MRSA", "ESBLE", "CRO"]);
    }

    #[test]
    fn test_resolve_regional_headers() {
        let cols = headers(&["患者编号", "纬度", "经度", "菌种类型"]);
        let resolved = resolve_columns(&cols, &ColumnRules::default()).unwrap();

        assert_eq!(resolved.patient_id.name, "患者编号");
        assert_eq!(resolved.latitude.name, "纬度");
        assert_eq!(resolved.longitude.name, "经度");
        assert_eq!(resolved.strain_indicators.len(), 1);
    }

    #[test]
    fn test_abbreviated_coordinate_headers() {
        let cols = headers(&[" ID ", "lat_84", "lng", "strain"]);
        let resolved = resolve_columns(&cols, &ColumnRules::default()).unwrap();

        assert_eq!(resolved.latitude.name, "lat_84");
        assert_eq!(resolved.longitude.name, "lng");
    }

    #[test]
    fn test_first_match_wins_per_slot() {
        let cols = headers(&["id", "lat", "lon", "record_id", "lat_gcj", "MRSA"]);
        let resolved = resolve_columns(&cols, &ColumnRules::default()).unwrap();

        assert_eq!(resolved.patient_id.index, 0);
        assert_eq!(resolved.latitude.index, 1);
        // "record_id" is an identifier column, never an indicator
        assert_eq!(resolved.strain_indicators.len(), 1);
        assert_eq!(resolved.strain_indicators[0].name, "MRSA");
    }

    #[test]
    fn test_earlier_rule_takes_priority() {
        // Contains both "id" and "mrsa": classified as identifier
        let cols = headers(&["mrsa_id", "lat", "lon", "CRO"]);
        let resolved = resolve_columns(&cols, &ColumnRules::default()).unwrap();

        assert_eq!(resolved.patient_id.name, "mrsa_id");
        assert_eq!(resolved.strain_indicators[0].name, "CRO");
    }

    #[test]
    fn test_missing_longitude() {
        let cols = headers(&["id", "lat", "MRSA"]);
        let err = resolve_columns(&cols, &ColumnRules::default()).unwrap_err();

        assert_eq!(err.missing, vec![ColumnRole::Longitude]);
        assert_eq!(err.headers, cols);
    }

    #[test]
    fn test_reports_every_missing_role() {
        let cols = headers(&["name", "address"]);
        let err = resolve_columns(&cols, &ColumnRules::default()).unwrap_err();

        assert_eq!(err.missing, ColumnRole::ALL.to_vec());
    }

    #[test]
    fn test_no_indicator_columns() {
        let cols = headers(&["id", "lat", "lon", "ward"]);
        let err = resolve_columns(&cols, &ColumnRules::default()).unwrap_err();

        assert_eq!(err.missing, vec![ColumnRole::StrainIndicator]);
    }

    #[test]
    fn test_extra_token() {
        let rules = ColumnRules::default().with_token(ColumnRole::StrainIndicator, "CRAB");
        assert_eq!(rules.classify("crab_positive"), Some(ColumnRole::StrainIndicator));
        assert_eq!(ColumnRules::default().classify("crab_positive"), None);
    }

    #[test]
    fn test_rule_tokens_normalized() {
        let rule = ColumnRule::new(ColumnRole::Latitude, [" LAT ", ""]);
        assert_eq!(rule.tokens(), ["lat"]);
        assert!(rule.matches("  Latitude (WGS84) "));
    }
}

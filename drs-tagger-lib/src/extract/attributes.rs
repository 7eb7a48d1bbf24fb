use regex::Regex;

use crate::types::Facet;

/// Splits a global attribute into the individual vocabulary values it lists.
///
/// With `corrections` on, the known irregularities of CCI attribute values are
/// repaired first: `Long Name (CODE)` lists are reduced to their codes, a
/// `merged: ` prefix is dropped and a few run-together sensor names split.
#[derive(Debug, Clone)]
pub struct AttributeSplitter {
    range: Regex,
    corrections: bool,
}

impl AttributeSplitter {
    pub fn new(corrections: bool) -> Self {
        Self {
            range: Regex::new(r"^(?P<prefix>[^<]*)<(?P<items>[^>]+)>(?P<suffix>.*)$")
                .expect("valid range pattern"),
            corrections,
        }
    }

    pub fn split(&self, facet: Facet, value: &str) -> Vec<String> {
        let mut value = value.to_string();
        if self.corrections {
            if facet != Facet::Institution && value.contains('(') {
                value = parenthesised_codes(&value);
            }
            value = value.replace("merged: ", "");
        }

        let separator = if value.contains('<') { ", " } else { "," };
        let mut bits: Vec<String> = value.split(separator).map(str::to_string).collect();

        if facet == Facet::Platform {
            bits = bits.into_iter().flat_map(|bit| self.expand_range(&bit)).collect();
        }

        if self.corrections {
            match facet {
                Facet::Sensor => {
                    bits = bits.into_iter().flat_map(|bit| split_sensor(&bit)).collect();
                }
                Facet::Institution => {
                    // "University of Leicester, UK" names one institution, not two.
                    if value.contains("University of Leicester") {
                        bits.retain(|bit| bit.trim() != "UK");
                    }
                }
                _ => {}
            }
        }

        let mut values: Vec<String> = Vec::new();
        for bit in bits {
            let bit = bit.trim().to_string();
            if !bit.is_empty() && !values.contains(&bit) {
                values.push(bit);
            }
        }
        values
    }

    /// `NOAA-<12,14>` becomes `NOAA-12`, `NOAA-14`.
    fn expand_range(&self, bit: &str) -> Vec<String> {
        match self.range.captures(bit.trim()) {
            Some(captures) => captures["items"]
                .split(',')
                .map(|item| {
                    format!("{}{}{}", &captures["prefix"], item.trim(), &captures["suffix"])
                })
                .collect(),
            None => vec![bit.to_string()],
        }
    }
}

/// "Medium Resolution Imaging Spectrometer (MERIS), Advanced ATSR (AATSR)" -> "MERIS,AATSR"
fn parenthesised_codes(value: &str) -> String {
    value
        .split(')')
        .filter(|chunk| !chunk.trim().is_empty())
        .map(|chunk| match chunk.split_once('(') {
            Some((_, code)) => code.trim(),
            None => chunk.trim_matches(|c: char| c == ',' || c.is_whitespace()),
        })
        .collect::<Vec<_>>()
        .join(",")
}

fn split_sensor(bit: &str) -> Vec<String> {
    match bit.trim() {
        "MERISAATSR" => vec!["MERIS".into(), "AATSR".into()],
        "OMI and GOME-2." => vec!["OMI".into(), "GOME-2".into()],
        other => vec![other.to_string()],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_comma_list() {
        let splitter = AttributeSplitter::new(false);
        assert_eq!(
            splitter.split(Facet::Sensor, "MERIS, MODIS,,SeaWiFS"),
            vec!["MERIS", "MODIS", "SeaWiFS"]
        );
    }

    #[test]
    fn test_parenthesised_codes_only_with_corrections() {
        let value = "Medium Resolution Imaging Spectrometer (MERIS), Advanced ATSR (AATSR)";
        assert_eq!(
            AttributeSplitter::new(true).split(Facet::Sensor, value),
            vec!["MERIS", "AATSR"]
        );
        assert_eq!(
            AttributeSplitter::new(false).split(Facet::Sensor, value),
            vec!["Medium Resolution Imaging Spectrometer (MERIS)", "Advanced ATSR (AATSR)"]
        );
        assert_eq!(
            AttributeSplitter::new(true).split(Facet::Sensor, "merged: MERISAATSR"),
            vec!["MERIS", "AATSR"]
        );
    }

    #[test]
    fn test_platform_ranges() {
        let splitter = AttributeSplitter::new(false);
        assert_eq!(
            splitter.split(Facet::Platform, "NOAA-<12,14,15>, ERS-<1,2>, Envisat"),
            vec!["NOAA-12", "NOAA-14", "NOAA-15", "ERS-1", "ERS-2", "Envisat"]
        );
    }

    #[test]
    fn test_institution_keeps_parentheses() {
        let splitter = AttributeSplitter::new(true);
        assert_eq!(
            splitter.split(Facet::Institution, "University of Leicester (UoL), UK"),
            vec!["University of Leicester (UoL)"]
        );
    }
}

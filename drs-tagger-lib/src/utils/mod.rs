use crate::types::Facet;

/// Normalize a vocabulary label into a DRS component.
///
/// `.` separates DRS components and spaces are not allowed, so both become `-`.
/// Frequencies use the short CMIP-style units.
pub fn drs_component(facet: Facet, label: &str) -> String {
    let component = label.trim().replace(['.', ' '], "-");
    if facet == Facet::Frequency {
        component.replace("month", "mon").replace("year", "yr")
    } else {
        component
    }
}

/// Check whether a dataset-list line names a dataset.
pub fn is_dataset_line(line: &str) -> bool {
    let line = line.trim();
    !line.is_empty() && !line.starts_with('#')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drs_component() {
        assert_eq!(drs_component(Facet::ProductVersion, "2.0"), "2-0");
        assert_eq!(drs_component(Facet::Sensor, " AVHRR 3 "), "AVHRR-3");
        assert_eq!(drs_component(Facet::Frequency, "month"), "mon");
        assert_eq!(drs_component(Facet::Frequency, "multi-year"), "multi-yr");
        assert_eq!(drs_component(Facet::Project, "month"), "month");
    }

    #[test]
    fn test_dataset_lines() {
        assert!(is_dataset_line("/neodc/esacci/ocean_colour"));
        assert!(!is_dataset_line("   "));
        assert!(!is_dataset_line("# retired"));
    }
}

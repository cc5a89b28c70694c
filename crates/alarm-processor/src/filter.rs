//! Alarm name filtering

use regex::Regex;

/// Excludes alarms whose name matches a blacklist pattern
#[derive(Debug, Clone, Default)]
pub struct AlarmNameFilter {
    blacklist: Option<Regex>,
}

impl AlarmNameFilter {
    /// Filter for `pattern`; `None` lets every alarm through
    pub fn new(pattern: Option<&str>) -> Result<Self, regex::Error> {
        let blacklist = pattern.map(Regex::new).transpose()?;
        Ok(Self { blacklist })
    }

    pub fn allows(&self, alarm_name: &str) -> bool {
        self.blacklist
            .as_ref()
            .map_or(true, |pattern| !pattern.is_match(alarm_name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const AUTOSCALING_PATTERN: &str = r"(-AlarmHigh|-AlarmLow|-ProvisionedCapacityHigh|-ProvisionedCapacityLow)-(\{){0,1}[0-9a-fA-F]{8}\-[0-9a-fA-F]{4}\-[0-9a-fA-F]{4}\-[0-9a-fA-F]{4}\-[0-9a-fA-F]{12}(\}){0,1}";

    #[test]
    fn test_no_pattern_allows_all() {
        let filter = AlarmNameFilter::new(None).unwrap();
        assert!(filter.allows("flaky-service"));
    }

    #[test]
    fn test_blacklist_pattern() {
        let filter = AlarmNameFilter::new(Some(AUTOSCALING_PATTERN)).unwrap();
        assert!(!filter.allows(
            "TargetTracking-table/orders-AlarmHigh-3b5a8f4e-1c2d-4e5f-9a8b-7c6d5e4f3a2b"
        ));
        assert!(filter.allows("flaky-service"));
    }

    #[test]
    fn test_invalid_pattern() {
        assert!(AlarmNameFilter::new(Some("(unclosed")).is_err());
    }
}

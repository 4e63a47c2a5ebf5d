use serde::{Deserialize, Serialize};

/// One row of the manual override table: a BuildCookRun switch and its value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManualOverride {
    pub switch: String,
    #[serde(default)]
    pub value: String,
}

/// Extra switches appended to AutomationTool invocations.
///
/// Entries keep insertion order. Switch case is preserved as typed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManualOverrideSet {
    entries: Vec<ManualOverride>,
}

impl ManualOverrideSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, switch: impl Into<String>, value: impl Into<String>) {
        self.entries.push(ManualOverride {
            switch: switch.into(),
            value: value.into(),
        });
    }

    /// Parse a `SWITCH[=VALUE]` string as typed on a command line.
    pub fn add_raw(&mut self, raw: &str) {
        self.add(raw, "");
    }

    pub fn remove(&mut self, index: usize) -> Option<ManualOverride> {
        (index < self.entries.len()).then(|| self.entries.remove(index))
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ManualOverride> {
        self.entries.iter()
    }

    /// Serialize the table into CLI arguments.
    ///
    /// Blank switches are skipped. A `switch=value` typed into the switch
    /// column supplies the value when the value column is blank.
    pub fn manual_args(&self) -> Vec<String> {
        let mut args = Vec::with_capacity(self.entries.len());
        for entry in &self.entries {
            let switch_text = entry.switch.trim();
            if switch_text.is_empty() {
                continue;
            }

            let (switch_part, inline_value) = match switch_text.split_once('=') {
                Some((s, v)) => (s, v),
                None => (switch_text, ""),
            };
            let switch = format!("-{}", switch_part.trim_start_matches('-'));

            let mut value = entry.value.trim();
            if value.is_empty() {
                value = inline_value.trim();
            }

            if value.is_empty() {
                args.push(switch);
            } else {
                args.push(format!("{switch}={value}"));
            }
        }
        args
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn value_column_is_joined_with_equals() {
        let mut set = ManualOverrideSet::new();
        set.add("cook", "Dir");
        assert_eq!(set.manual_args(), vec!["-cook=Dir"]);
    }

    #[test]
    fn inline_value_is_used_when_value_column_is_blank() {
        let mut set = ManualOverrideSet::new();
        set.add("cook=Dir", "");
        set.add("--Pak=ignored", "Kept");
        assert_eq!(set.manual_args(), vec!["-cook=Dir", "-Pak=Kept"]);
    }

    #[test]
    fn dashes_collapse_and_case_is_preserved() {
        let mut set = ManualOverrideSet::new();
        set.add("---IterativeCooking", "");
        set.add("  ", "orphan");
        set.add("-NoSign", "  ");
        assert_eq!(set.manual_args(), vec!["-IterativeCooking", "-NoSign"]);
    }

    #[test]
    fn remove_out_of_range_is_none() {
        let mut set = ManualOverrideSet::new();
        set.add_raw("-pak");
        assert!(set.remove(3).is_none());
        assert_eq!(set.remove(0).map(|o| o.switch), Some("-pak".to_string()));
        assert!(set.is_empty());
    }
}

//! Naming convention conversion
//!
//! The convention is lower case words joined by `_`. Words are split on `_`,
//! on the start of each upper case run and on the start of each digit run:
//! `myGroupName` → `my_group_name`, `pCube1` → `pcube_1`.

use super::path::base_name;

/// Convert the base name of `name` to the naming convention
pub fn to_naming_convention(name: &str) -> String {
    let sections: Vec<String> = base_name(name)
        .split('_')
        .filter(|s| !s.is_empty())
        .map(capitalize)
        .collect();

    let sections = split_on(sections, |c| c.is_ascii_uppercase());
    let sections = split_on(sections, |c| c.is_ascii_digit());

    sections
        .iter()
        .map(|s| s.to_lowercase())
        .collect::<Vec<_>>()
        .join("_")
}

/// Whether the base name of `name` already follows the convention
pub fn follows_naming_convention(name: &str) -> bool {
    base_name(name) == to_naming_convention(name)
}

fn capitalize(section: &str) -> String {
    let mut chars = section.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Split every section at the first character of each run matching `split`
fn split_on(sections: Vec<String>, split: impl Fn(char) -> bool) -> Vec<String> {
    let mut result = Vec::with_capacity(sections.len());

    for section in sections {
        let chars: Vec<char> = section.chars().collect();
        let hits: Vec<usize> = (0..chars.len()).filter(|&i| split(chars[i])).collect();
        let mut starts: Vec<usize> = hits
            .iter()
            .copied()
            .filter(|&i| i == 0 || !hits.contains(&(i - 1)))
            .collect();

        if starts.is_empty() {
            result.push(section);
            continue;
        }
        if starts[0] != 0 {
            starts.insert(0, 0);
        }

        for (n, &start) in starts.iter().enumerate() {
            let end = starts.get(n + 1).copied().unwrap_or(chars.len());
            result.push(chars[start..end].iter().collect());
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_camel_case_is_split() {
        assert_eq!(to_naming_convention("myGroupName"), "my_group_name");
        assert_eq!(to_naming_convention("|grp|L_armCtrl"), "l_arm_ctrl");
    }

    #[test]
    fn test_digits_are_split() {
        assert_eq!(to_naming_convention("pCube1"), "pcube_1");
        assert_eq!(to_naming_convention("joint12a"), "joint_12a");
    }

    #[test]
    fn test_upper_case_runs_stay_together() {
        assert_eq!(to_naming_convention("headGEO"), "head_geo");
    }

    #[test]
    fn test_namespace_and_empty_sections_dropped() {
        assert_eq!(to_naming_convention("ns:arm__left"), "arm_left");
    }

    #[test]
    fn test_follows_naming_convention() {
        assert!(follows_naming_convention("|rig|arm_left_01"));
        assert!(!follows_naming_convention("|rig|armLeft"));
    }
}

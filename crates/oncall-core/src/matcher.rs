//! Heuristic department-name matching.
//!
//! Department names from the schedule source are long compound strings such
//! as `외과(ER call only)` or `순환기내과 병동`. Users type shorthand, so names
//! are normalized (parenthetical and role suffix removed) before substring
//! comparison. This over-matches short common substrings and does not know
//! synonyms; callers rely on exactly this behavior to choose between asking
//! directly and asking the user to disambiguate.

use once_cell::sync::Lazy;
use regex::Regex;

/// Minimum length, in characters, of a keyword worth comparing
const MIN_KEYWORD_CHARS: usize = 2;

static PARENTHETICAL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\([^)]*\)").expect("valid parenthetical pattern"));

static ROLE_SUFFIX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\s+(당직의|수술의|병동|응급내시경|ER|NICU|중환자실|on call)")
        .expect("valid role suffix pattern")
});

static GENERIC_QUERY_WORDS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(당직|연락처|번호|누구|의사|담당의|오늘|내일|지금|현재|알려줘|알려주세요)")
        .expect("valid query word pattern")
});

/// Department name with parentheticals and role qualifiers removed.
///
/// `"외과(ER call only)"` becomes `"외과"`, `"순환기내과 병동"` becomes `"순환기내과"`.
pub fn core_name(department: &str) -> String {
    let without_parens = PARENTHETICAL.replace_all(department, "");
    ROLE_SUFFIX
        .replace_all(&without_parens, "")
        .trim()
        .to_string()
}

/// Question asked when a department is picked from the list
pub fn department_question(department: &str) -> String {
    format!("오늘 {} 당직 누구야?", department)
}

fn long_enough(word: &str) -> bool {
    word.chars().count() >= MIN_KEYWORD_CHARS
}

/// Matching predicates over the currently known department names
#[derive(Debug, Clone, Copy)]
pub struct DepartmentMatcher<'a> {
    departments: &'a [String],
}

impl<'a> DepartmentMatcher<'a> {
    pub fn new(departments: &'a [String]) -> Self {
        Self { departments }
    }

    /// Whole name contained, or any core keyword (2+ chars) contained
    pub fn has_department_name(&self, text: &str) -> bool {
        self.departments.iter().any(|dept| {
            if text.contains(dept.as_str()) {
                return true;
            }
            core_name(dept)
                .split_whitespace()
                .any(|keyword| long_enough(keyword) && text.contains(keyword))
        })
    }

    /// Only a full raw department name counts
    pub fn has_exact_department_match(&self, text: &str) -> bool {
        self.departments
            .iter()
            .any(|dept| text.contains(dept.as_str()))
    }

    /// Departments plausibly meant by `text`, in department order, without duplicates
    pub fn find_similar_departments(&self, text: &str) -> Vec<String> {
        if self.departments.is_empty() {
            return Vec::new();
        }

        let stripped = GENERIC_QUERY_WORDS.replace_all(text, "");
        let user_keywords: Vec<&str> = stripped
            .split_whitespace()
            .filter(|keyword| long_enough(keyword))
            .collect();

        let mut similar: Vec<String> = Vec::new();
        for dept in self.departments {
            let core = core_name(dept);
            let hit = user_keywords
                .iter()
                .any(|keyword| core.contains(keyword) || dept.contains(keyword));
            if hit && !similar.contains(dept) {
                similar.push(dept.clone());
            }
        }
        similar
    }

    /// More than one candidate: ask the user which department was meant
    pub fn has_ambiguous_match(&self, text: &str) -> bool {
        self.find_similar_departments(text).len() > 1
    }
}

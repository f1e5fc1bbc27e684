//! Domain gate for free-text input.
//!
//! A message is forwarded to the backend only when it looks like an on-call
//! question: it contains a domain keyword, a date, a short follow-up phrase
//! referring to an earlier turn, or a contact request.

use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::Regex;

/// Version of the canonical pattern table.
///
/// Bump whenever a keyword or pattern is added, removed or changed.
pub const PATTERN_TABLE_VERSION: u32 = 5;

const KEYWORDS: &[&str] = &[
    "당직", "의사", "병원", "스케줄", "일정", "연락처", "번호",
    "순환기내과", "외과", "정형외과", "응급의학과", "내과", "소아과",
    "오늘", "내일", "명일", "익일", "모레", "어제", "글피", "누구", "언제", "몇시", "시간",
    // people and schedules
    "교수", "교수님", "선생님", "며칠", "몇일", "근무",
    // weeks and weekdays
    "이번주", "다음주", "다다음주", "저번주", "지난주",
    "월요일", "화요일", "수요일", "목요일", "금요일", "토요일", "일요일",
    "담당의", "주치의", "진료", "의료진",
    // department listing questions
    "어떤 과", "무슨 과", "어떤 부서", "무슨 부서", "어느 과", "어느 부서",
    "과 목록", "부서 목록", "과 리스트", "부서 리스트",
    "과가 있", "부서가 있", "과가 뭐", "부서가 뭐",
    "과를 알려", "부서를 알려", "과 알려", "부서 알려",
    "과 종류", "부서 종류", "과명", "부서명",
    "진료과", "진료부서", "어떤 진료과", "무슨 진료과",
    "과 전체", "부서 전체", "모든 과", "모든 부서",
    "과는 뭐", "부서는 뭐", "과는 무엇", "부서는 무엇",
];

// Evaluated against the raw text. `[0-9]` rather than `\d` keeps digits ASCII.
const DATE_PATTERNS: &[&str] = &[
    r"[0-9]{4}-[0-9]{1,2}-[0-9]{1,2}",
    r"[0-9]{4}/[0-9]{1,2}/[0-9]{1,2}",
    r"[0-9]{1,2}-[0-9]{1,2}",
    r"[0-9]{1,2}/[0-9]{1,2}",
    r"[0-9]{1,2}월\s*[0-9]{1,2}일",
    r"[0-9]{1,2}일",
    r"[0-9]+일\s*(?:후|뒤)",
];

const RELATIVE: &str = "내일|다음주|이번주|저번주|지난주|어제|모레|글피|다다음주";
const WEEKDAYS: &str = "월요일|화요일|수요일|목요일|금요일|토요일|일요일";
const WEEKS: &str = "이번주|다음주|저번주|지난주|다다음주";

// Evaluated against the trimmed text.
static FOLLOW_UP_PATTERNS: Lazy<Vec<String>> = Lazy::new(|| {
    vec![
        r"^내일은\?*$".to_string(),
        r"^내일모레는\?*$".to_string(),
        r"^내일모레\?*$".to_string(),
        r"^다음주는\?*$".to_string(),
        r"^이번주는\?*$".to_string(),
        r"^저번주는\?*$".to_string(),
        r"^지난주는\?*$".to_string(),
        r"^어제는\?*$".to_string(),
        r"^모레는\?*$".to_string(),
        r"^글피는\?*$".to_string(),
        r"^다다음주는\?*$".to_string(),
        // "그럼 / 그러면" prefixed
        format!(r"^그럼\s*({RELATIVE})는\?*"),
        format!(r"^그러면\s*({RELATIVE})는\?*"),
        // "당직은" suffixed and bare relative dates
        format!(r"^({RELATIVE})\s*당직은\?*"),
        format!(r"^({RELATIVE})은\?*"),
        format!(r"^({RELATIVE})\?*$"),
        // n days later
        r"^[0-9]+일\s*(?:후|뒤).*\?*$".to_string(),
        r"^그럼\s*[0-9]+일\s*(?:후|뒤).*\?*$".to_string(),
        r"^그러면\s*[0-9]+일\s*(?:후|뒤).*\?*$".to_string(),
        // weekdays
        format!(r"^({WEEKDAYS})은\?*$"),
        format!(r"^({WEEKDAYS})\?*$"),
        format!(r"^그럼\s*({WEEKDAYS})은\?*"),
        format!(r"^그러면\s*({WEEKDAYS})은\?*"),
        // week + weekday
        format!(r"^({WEEKS})\s*({WEEKDAYS})은\?*$"),
        format!(r"^({WEEKS})\s*({WEEKDAYS})\?*$"),
        // bare questions
        r"^그날은\?*$".to_string(),
        r"^언제\?*$".to_string(),
        r"^몇일\?*$".to_string(),
        r"^며칠\?*$".to_string(),
    ]
});

// Evaluated against the trimmed text.
const CONTACT_PATTERNS: &[&str] = &[
    r"([가-힣]{2,4})\s*(?:의사|선생님|박사)?\s*(?:연락처|전화번호)\s*(?:알려줘|뭐야|는)",
    r"([가-힣]{2,4})\s*(?:연락처|전화번호)",
    r"^연락처\s*알려줘\?*$",
    r"^연락처\s*뭐야\?*$",
    r"^연락처는\?*$",
    r"^전화번호\s*알려줘\?*$",
    r"^전화번호\s*뭐야\?*$",
    r"^전화번호는\?*$",
];

// Narrower duty-question vocabulary, used to annotate accepted queries.
const DUTY_KEYWORDS: &[&str] = &["당직", "담당의", "의료진"];
const TIME_KEYWORDS: &[&str] = &["오늘", "내일", "명일", "익일", "모레", "어제", "글피", "지금", "현재"];
const QUESTION_KEYWORDS: &[&str] = &["누구", "누가", "의사", "연락처", "번호"];

static CANONICAL: Lazy<Arc<PatternTable>> = Lazy::new(|| {
    let follow_up: Vec<&str> = FOLLOW_UP_PATTERNS.iter().map(String::as_str).collect();
    Arc::new(
        PatternTable::compile(
            PATTERN_TABLE_VERSION,
            KEYWORDS.iter().map(|k| k.to_string()).collect(),
            DATE_PATTERNS,
            &follow_up,
            CONTACT_PATTERNS,
        )
        .expect("built-in classifier patterns must compile"),
    )
});

/// Compiled keyword and pattern table consulted by [`QueryClassifier`].
#[derive(Debug, Clone)]
pub struct PatternTable {
    pub version: u32,
    keywords: Vec<String>,
    date_patterns: Vec<Regex>,
    follow_up_patterns: Vec<Regex>,
    contact_patterns: Vec<Regex>,
}

impl PatternTable {
    /// Compile a table from raw pattern sources
    pub fn compile(
        version: u32,
        keywords: Vec<String>,
        date_patterns: &[&str],
        follow_up_patterns: &[&str],
        contact_patterns: &[&str],
    ) -> Result<Self, regex::Error> {
        let compile_all = |sources: &[&str]| -> Result<Vec<Regex>, regex::Error> {
            sources.iter().map(|src| Regex::new(src)).collect()
        };

        Ok(Self {
            version,
            keywords,
            date_patterns: compile_all(date_patterns)?,
            follow_up_patterns: compile_all(follow_up_patterns)?,
            contact_patterns: compile_all(contact_patterns)?,
        })
    }

    /// The shared canonical table
    pub fn canonical() -> Arc<PatternTable> {
        Arc::clone(&CANONICAL)
    }

    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }
}

/// Which check accepted (or that none accepted) a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    Keyword(String),
    DatePattern,
    FollowUp,
    ContactRequest,
    Rejected,
}

impl Classification {
    pub fn is_valid(&self) -> bool {
        !matches!(self, Classification::Rejected)
    }
}

/// Decides whether a message is in the on-call domain.
///
/// Pure: the verdict depends only on the text and the pattern table.
#[derive(Debug, Clone)]
pub struct QueryClassifier {
    table: Arc<PatternTable>,
}

impl Default for QueryClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl QueryClassifier {
    pub fn new() -> Self {
        Self {
            table: PatternTable::canonical(),
        }
    }

    pub fn with_table(table: Arc<PatternTable>) -> Self {
        Self { table }
    }

    pub fn table_version(&self) -> u32 {
        self.table.version
    }

    pub fn is_valid_query(&self, text: &str) -> bool {
        self.classify(text).is_valid()
    }

    /// Run the four checks in order and report the first that fires
    pub fn classify(&self, text: &str) -> Classification {
        let trimmed = text.trim();

        if let Some(keyword) = self.matching_keyword(text) {
            return Classification::Keyword(keyword.to_string());
        }
        if self.table.date_patterns.iter().any(|re| re.is_match(text)) {
            return Classification::DatePattern;
        }
        if self.table.follow_up_patterns.iter().any(|re| re.is_match(trimmed)) {
            return Classification::FollowUp;
        }
        if self.table.contact_patterns.iter().any(|re| re.is_match(trimmed)) {
            return Classification::ContactRequest;
        }
        Classification::Rejected
    }

    /// Case-sensitive substring containment; not tokenized
    pub fn matching_keyword(&self, text: &str) -> Option<&str> {
        self.table
            .keywords
            .iter()
            .find(|keyword| text.contains(keyword.as_str()))
            .map(String::as_str)
    }

    /// A duty keyword, or a time word together with a question word
    pub fn is_duty_related(&self, text: &str) -> bool {
        let has = |words: &[&str]| words.iter().any(|w| text.contains(w));
        has(DUTY_KEYWORDS) || (has(TIME_KEYWORDS) && has(QUESTION_KEYWORDS))
    }
}

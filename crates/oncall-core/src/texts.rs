//! Canned user-facing texts.

/// First bot message of a fresh transcript
pub const WELCOME: &str =
    "안녕하세요! 궁금한 당직 정보를 입력해 주세요. 예: \"오늘 순환기내과 당직 누구야?\"";

/// Reply for input rejected by the classifier
pub const OUT_OF_DOMAIN_GUIDANCE: &str = "💡 저는 병원 당직 의료진 정보를 안내하는 챗봇입니다.

다음과 같은 정보를 제공할 수 있습니다:
• 특정 날짜의 당직 의사 확인
• 진료과별 당직의 연락처 조회
• 당직 시간 및 근무 일정 안내

예시 질문:
• \"오늘 순환기내과 당직 누구야?\"
• \"내일 외과 당직의 연락처는?\"
• \"정형외과 당직의 번호 알려줘\"";

/// Phrases by which the backend says it found nothing
pub const NO_RESULT_PHRASES: &[&str] = &[
    "모르겠습니다",
    "찾을 수 없습니다",
    "관련 정보가 없습니다",
    "답변할 수 없습니다",
    "정보가 부족합니다",
    "해당하는 정보가 없습니다",
];

pub const RETRY_GUIDANCE: &str = "💡 다시 시도해보세요:

📅 날짜를 명확히 해주세요:
• \"7월 25일 순환기내과 당직 누구야?\"
• \"오늘 외과 당직의 연락처는?\"
• \"내일 정형외과 당직 누구인가요?\"

🏥 정확한 과명을 사용해주세요:
• 순환기내과, 외과, 정형외과, 응급의학과
• 소아과, 내과, 산부인과, 신경외과
• 진료과 목록을 참고하세요

📝 질문 예시:
• \"지금 순환기내과 병동 당직 누구야?\"
• \"2025년 7월 25일 외과 수술의 연락처 알려줘\"
• \"내일 응급의학과 당직의 번호는?\"";

/// Sample questions offered to the user
pub const EXAMPLE_QUESTIONS: &[&str] = &[
    "오늘 순환기내과 당직 누구야?",
    "내일 외과 당직의 연락처 알려줘",
    "정형외과 당직의 번호는?",
    "지금 순환기내과 병동 당직 누구야?",
    "조준환 교수님 당직 언제야?",
];

pub fn is_no_result_answer(answer: &str) -> bool {
    NO_RESULT_PHRASES.iter().any(|phrase| answer.contains(phrase))
}

/// Backend answer followed by the retry-guidance block
pub fn with_retry_guidance(answer: &str) -> String {
    format!("{}\n\n{}", answer, RETRY_GUIDANCE)
}

/// Diagnostic for a backend that cannot be reached at all
pub fn unreachable_backend(base_url: &str) -> String {
    format!(
        "🚨 서버에 연결할 수 없습니다 ({base_url})\n\n📋 해결 방법:\n1. 백엔드 서버가 실행 중인지 확인하세요\n2. 브라우저나 curl로 {base_url}/departments 에 접속해보세요\n3. 서버 실행 시 오류 메시지가 나오면 로그를 확인하세요\n\n💡 서버 정상 실행 후 재연결을 시도하세요."
    )
}

/// Diagnostic for a backend that answered with an error status
pub fn server_error(status: u16) -> String {
    server_error_detail(&format!("HTTP {}", status))
}

/// Diagnostic for a reachable backend whose reply could not be used
pub fn server_error_detail(detail: &str) -> String {
    format!("서버 오류: {}", detail)
}

pub const MALFORMED_RESPONSE: &str = "응답 형식이 올바르지 않습니다";

pub const UPDATE_STARTING: &str = "업데이트 시작...";
pub const UPDATE_COMPLETED: &str = "✅ 업데이트 완료!";
pub const UPDATE_CONNECTION_FAILED: &str = "❌ 서버 연결 실패";
pub const UPDATE_UNREACHABLE: &str = "❌ 서버에 연결할 수 없습니다. 서버를 실행해주세요.";

pub fn update_in_progress(year: i32, month: u32) -> String {
    format!("{}년 {}월 데이터 업데이트 중...", year, month)
}

pub fn update_failed(message: &str) -> String {
    format!("❌ 업데이트 실패: {}", message)
}

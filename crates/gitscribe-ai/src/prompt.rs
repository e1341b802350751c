//! Prompt templates
//!
//! Commit-message and review prompts in the two supported output languages.
//! Template text is deliberately short; small local models drift when the
//! instructions get long.

const COMMIT_SYSTEM_ENGLISH: &str = "\
Generate the text for a Conventional Commit message based on the code changes.
### Example Output ###
feat: add user authentication endpoint
- Implemented JWT-based user login and registration API.
- Includes `/auth/login` and `/auth/register` endpoints.";

const COMMIT_SYSTEM_KOREAN: &str = "\
코드 변경을 감지하고 Conventional Commit 형식의 커밋 메시지 텍스트 생성.
### 출력 예시 ###
feat: 사용자 인증 엔드포인트 추가
- JWT 기반의 사용자 로그인 및 회원가입 API를 구현했습니다.
- `/auth/login`, `/auth/register` 엔드포인트를 포함합니다.";

const REVIEW_SYSTEM_ENGLISH: &str = "\
You are an automated tool that performs code reviews. Your sole task is to \
generate a review in the specified format for the provided code change. Do \
not include any other text.

### Review Format ###
**💡 Suggestions for Improvement:**
(Better code, refactoring ideas, etc.)

**🐛 Potential Issues:**
(Bugs, performance degradations, security concerns, etc.)

**👍 Positive Feedback:**
(Praise for good code, well-implemented patterns, etc.)

Omit sections if they are not applicable.";

const REVIEW_SYSTEM_KOREAN: &str = "\
당신은 코드 리뷰를 수행하는 자동화된 도구입니다. 당신의 유일한 임무는 제공된 \
코드 변경사항에 대해 지정된 형식으로 리뷰를 생성하는 것입니다. 다른 텍스트를 \
포함하지 마세요.

### 리뷰 형식 ###
**💡 개선 제안:**
(더 나은 코드, 리팩토링 아이디어 등)

**🐛 잠재적 문제:**
(버그, 성능 저하, 보안 이슈 등)

**👍 좋은 점:**
(칭찬할 부분, 잘 구현된 패턴 등)

해당 사항이 없으면 섹션을 생략하세요.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Language {
    English,
    Korean,
}

/// Language-resolved prompt builder. Unknown language names fall back to
/// English.
#[derive(Debug, Clone, Copy)]
pub struct PromptSet {
    language: Language,
}

impl PromptSet {
    pub fn for_language(name: &str) -> Self {
        let language = match name.to_lowercase().as_str() {
            "korean" => Language::Korean,
            "english" => Language::English,
            other => {
                tracing::warn!("Unsupported message language {:?}; using english", other);
                Language::English
            }
        };
        Self { language }
    }

    pub fn commit_system(&self) -> &'static str {
        match self.language {
            Language::English => COMMIT_SYSTEM_ENGLISH,
            Language::Korean => COMMIT_SYSTEM_KOREAN,
        }
    }

    pub fn commit_user(&self, changes_summary: &str) -> String {
        match self.language {
            Language::English => format!(
                "### Change Summary ###\n{changes_summary}\n### Instructions ###\n\
                 Generate a Conventional Commit message for the changes above."
            ),
            Language::Korean => format!(
                "### 변경사항 요약 ###\n{changes_summary}\n### 지시사항 ###\n\
                 위 변경사항에 대한 Conventional Commit 형식의 커밋 메시지를 생성하세요."
            ),
        }
    }

    pub fn review_system(&self) -> &'static str {
        match self.language {
            Language::English => REVIEW_SYSTEM_ENGLISH,
            Language::Korean => REVIEW_SYSTEM_KOREAN,
        }
    }

    pub fn review_user(&self, file_path: &str, change_type: &str, diff: &str) -> String {
        match self.language {
            Language::English => format!(
                "### Code Change ###\n**File:** `{file_path}`\n**Change Type:** \
                 `{change_type}`\n\n```diff\n{diff}\n```\n\n### Instructions ###\n\
                 Generate a code review for the change above."
            ),
            Language::Korean => format!(
                "### 코드 변경사항 ###\n**파일:** `{file_path}`\n**변경 종류:** \
                 `{change_type}`\n\n```diff\n{diff}\n```\n\n### 지시사항 ###\n\
                 위 코드 변경사항에 대한 리뷰를 생성하세요."
            ),
        }
    }
}
